//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A single cached value together with its expiry metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The stored value
    pub value: T,
    /// Instant at which the entry stops being visible, `None` if the TTL
    /// reaches past what `Instant` can represent
    pub expires_at: Option<Instant>,
    /// Recency stamp used to pick eviction victims, larger is newer
    pub touched: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates an entry that expires `ttl` after `now`, or never if that
    /// instant cannot be represented.
    pub fn new(value: T, now: Instant, ttl: Duration, touched: u64) -> Self {
        Self {
            value,
            expires_at: now.checked_add(ttl),
            touched,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// An entry is expired once `now >= expires_at`, so a TTL of zero is
    /// expired immediately.
    pub fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(expires_at) if now >= expires_at)
    }

    // == Expire ==
    /// Pulls the expiry back to `now` unless it is already earlier.
    ///
    /// The expiry is only ever moved earlier. An entry that expired on its
    /// own keeps its original expiry.
    pub fn expire(&mut self, now: Instant) {
        self.expires_at = Some(self.expires_at.map_or(now, |expires_at| expires_at.min(now)));
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let now = Instant::now();
        let entry = CacheEntry::new("test_value", now, Duration::from_secs(60), 1);

        assert_eq!(entry.value, "test_value");
        assert_eq!(entry.expires_at, Some(now + Duration::from_secs(60)));
        assert!(!entry.is_expired(now));
    }

    #[test]
    fn test_entry_expiration() {
        let now = Instant::now();
        let entry = CacheEntry::new(1u32, now, Duration::from_secs(1), 1);

        assert!(!entry.is_expired(now + Duration::from_millis(999)));
        assert!(entry.is_expired(now + Duration::from_secs(1)));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Instant::now();
        let entry = CacheEntry::new("test", now, Duration::ZERO, 1);

        assert!(entry.is_expired(now), "Entry should be expired at boundary");
    }

    #[test]
    fn test_expire_live_entry() {
        let now = Instant::now();
        let mut entry = CacheEntry::new("test", now, Duration::from_secs(60), 1);

        entry.expire(now);

        assert!(entry.is_expired(now));
        assert_eq!(entry.expires_at, Some(now));
    }

    #[test]
    fn test_expire_never_moves_expiry_later() {
        let start = Instant::now();
        let mut entry = CacheEntry::new("test", start, Duration::from_secs(1), 1);
        let later = start + Duration::from_secs(10);

        entry.expire(later);

        assert_eq!(entry.expires_at, Some(start + Duration::from_secs(1)));
        assert!(entry.is_expired(later));
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        let now = Instant::now();
        let entry = CacheEntry::new("forever", now, Duration::MAX, 1);

        assert_eq!(entry.expires_at, None);
        assert!(!entry.is_expired(now + Duration::from_secs(365 * 24 * 60 * 60)));
    }

    #[test]
    fn test_expire_entry_without_deadline() {
        let now = Instant::now();
        let mut entry = CacheEntry::new("forever", now, Duration::MAX, 1);

        entry.expire(now);

        assert_eq!(entry.expires_at, Some(now));
        assert!(entry.is_expired(now));
    }
}
