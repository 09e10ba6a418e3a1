use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::rate_limit::now_ms;

// Hidden input the landing page renders off-screen; humans leave it empty
pub const HONEYPOT_FIELD: &str = "_hp_website";
// Epoch ms at which the form was rendered in the browser
pub const RENDERED_AT_FIELD: &str = "_hp_ts";
pub const MIN_SUBMISSION_TIME_MS: i64 = 2000;

/// A single submitted form value.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Flag(b) => *b,
            FieldValue::Number(n) => *n != 0.0 && !n.is_nan(),
            FieldValue::Text(s) => !s.is_empty(),
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Flag(_) => None,
        }
    }
}

pub type FormFields = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotSignal {
    Honeypot,
    TooFast,
}

impl BotSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            BotSignal::Honeypot => "honeypot",
            BotSignal::TooFast => "too_fast",
        }
    }
}

/// Honeypot + minimum fill time check for public forms.
///
/// Both signals default to innocent: a missing honeypot or a missing,
/// non-numeric or non-positive render timestamp never flags a submission.
#[derive(Debug, Clone, Copy)]
pub struct BotHeuristic {
    min_submission_time_ms: i64,
}

impl Default for BotHeuristic {
    fn default() -> Self {
        Self::new(MIN_SUBMISSION_TIME_MS)
    }
}

impl BotHeuristic {
    pub fn new(min_submission_time_ms: i64) -> Self {
        Self {
            min_submission_time_ms,
        }
    }

    pub fn is_bot_submission(&self, fields: &FormFields) -> bool {
        self.is_bot_submission_at(fields, now_ms())
    }

    pub fn is_bot_submission_at(&self, fields: &FormFields, now: i64) -> bool {
        self.detect(fields, now).is_some()
    }

    // First signal that fired, honeypot wins
    pub fn detect(&self, fields: &FormFields, now: i64) -> Option<BotSignal> {
        if fields.get(HONEYPOT_FIELD).is_some_and(FieldValue::is_truthy) {
            return Some(BotSignal::Honeypot);
        }

        let rendered_at = fields
            .get(RENDERED_AT_FIELD)
            .and_then(FieldValue::as_number)
            .filter(|ts| ts.is_finite() && *ts > 0.0)?;

        if (now as f64) - rendered_at < self.min_submission_time_ms as f64 {
            return Some(BotSignal::TooFast);
        }
        None
    }
}

/// Copy of `fields` without the honeypot and render timestamp entries.
pub fn strip_bot_fields(fields: &FormFields) -> FormFields {
    fields
        .iter()
        .filter(|(name, _)| name.as_str() != HONEYPOT_FIELD && name.as_str() != RENDERED_AT_FIELD)
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}
