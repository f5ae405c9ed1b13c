use std::hash::Hasher;

use siphasher::sip::SipHasher13;

/// Hash a string so that the result is identical across runs, builds and
/// platforms.
///
/// [std::collections::hash_map::DefaultHasher] gives no such guarantee, and
/// these values end up in checkpoint files that outlive the process.
pub fn stable_hash(value: &str) -> u64 {
    let mut hasher = SipHasher13::new();
    hasher.write(value.as_bytes());
    hasher.finish()
}

/// Combine hashes so that the order they come in does not matter.
pub fn xor_combine(hashes: impl IntoIterator<Item = u64>) -> u64 {
    hashes.into_iter().fold(0, |acc, h| acc ^ h)
}
