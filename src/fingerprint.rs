use sha2::{Digest, Sha256};

// Salted hash of the client IP, stored with a lead instead of the raw address
pub fn hash_ip(ip: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(b":");
    hasher.update(ip);
    format!("{:x}", hasher.finalize())
}
