/// Identifier and timestamp helpers.
///
/// Ids combine a prefix, a process-wide sequence number and a short SHA-256
/// digest of (sequence, nanosecond clock), so they are unique within the
/// process and practically unique across sessions.
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Generate a new id such as `card-1f-3a9c01d2e4b7`.
pub fn generate_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut hasher = Sha256::new();
    hasher.update(seq.to_le_bytes());
    hasher.update(ts.to_le_bytes());
    let hash = hasher.finalize();
    format!("{}-{:x}-{}", prefix, seq, hex::encode(&hash[..6]))
}

/// Current UTC time as an ISO-8601 string with millisecond precision.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_id_format() {
        let id = generate_id("card");
        assert!(id.starts_with("card-"));
        let digest = id.rsplit('-').next().unwrap();
        assert_eq!(digest.len(), 12);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_id_unique() {
        let ids: HashSet<String> = (0..500).map(|_| generate_id("card")).collect();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn test_timestamp_is_utc_millis() {
        let ts = timestamp_now();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
        assert_eq!(ts.split('.').nth(1).map(str::len), Some(4));
    }
}
