//! High score persistence
//!
//! A single scalar, stored as a decimal string. Read once when the engine
//! starts and written only when a finished session beats it.

use crate::error::GameError;
use crate::platform::storage::KeyValueStore;

/// Best score ever achieved on this device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HighScore {
    pub value: u64,
}

impl HighScore {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "spaceShooter-highScore";

    pub fn new(value: u64) -> Self {
        Self { value }
    }

    /// Parse a stored value
    pub fn parse(raw: &str) -> Result<Self, GameError> {
        raw.trim()
            .parse::<u64>()
            .map(Self::new)
            .map_err(|_| GameError::CorruptValue {
                key: Self::STORAGE_KEY.to_string(),
                value: raw.to_string(),
            })
    }

    /// Load the high score; 0 when missing, unreadable or storage is off
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(Self::STORAGE_KEY).and_then(|raw| raw.map(|r| Self::parse(&r)).transpose()) {
            Ok(Some(score)) => {
                log::info!("Loaded high score {}", score.value);
                score
            }
            Ok(None) => {
                log::info!("No high score found, starting fresh");
                Self::default()
            }
            Err(e) => {
                log::warn!("High score unavailable ({}), starting at 0", e);
                Self::default()
            }
        }
    }

    /// Store `score` if it beats the current value. Returns whether it did.
    ///
    /// The in-memory value is raised even when the write fails, so the
    /// session still shows the new record.
    pub fn commit_if_beaten(&mut self, score: u64, store: &mut dyn KeyValueStore) -> bool {
        if score <= self.value {
            return false;
        }
        self.value = score;
        match store.set(Self::STORAGE_KEY, &score.to_string()) {
            Ok(()) => log::info!("New high score {} saved", score),
            Err(e) => log::warn!("New high score {} not saved: {}", score, e),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::storage::MemoryStore;
    use proptest::prelude::*;

    #[test]
    fn test_missing_key_loads_zero() {
        let store = MemoryStore::new();
        assert_eq!(HighScore::load(&store).value, 0);
    }

    #[test]
    fn test_corrupt_value_loads_zero() {
        let mut store = MemoryStore::new();
        store.set(HighScore::STORAGE_KEY, "lots").unwrap();
        assert_eq!(HighScore::load(&store).value, 0);
        store.set(HighScore::STORAGE_KEY, "-5").unwrap();
        assert_eq!(HighScore::load(&store).value, 0);
    }

    #[test]
    fn test_unavailable_storage_loads_zero() {
        assert_eq!(HighScore::load(&MemoryStore::unavailable()).value, 0);
    }

    #[test]
    fn test_commit_only_when_beaten() {
        let mut store = MemoryStore::new();
        store.set(HighScore::STORAGE_KEY, "1200").unwrap();
        let mut high = HighScore::load(&store);
        assert_eq!(high.value, 1200);

        assert!(!high.commit_if_beaten(1200, &mut store));
        assert!(!high.commit_if_beaten(800, &mut store));
        assert!(high.commit_if_beaten(1500, &mut store));
        assert_eq!(store.get(HighScore::STORAGE_KEY).unwrap().as_deref(), Some("1500"));
    }

    #[test]
    fn test_failed_write_still_raises_in_memory() {
        let mut store = MemoryStore::unavailable();
        let mut high = HighScore::new(10);
        assert!(high.commit_if_beaten(20, &mut store));
        assert_eq!(high.value, 20);
    }

    proptest! {
        #[test]
        fn prop_high_score_never_decreases(scores in prop::collection::vec(0u64..100_000, 0..50)) {
            let mut store = MemoryStore::new();
            let mut high = HighScore::default();
            for score in scores {
                let before = high.value;
                let beaten = high.commit_if_beaten(score, &mut store);
                prop_assert!(high.value >= before);
                prop_assert_eq!(beaten, score > before);
                prop_assert_eq!(high.value, before.max(score));
            }
        }
    }
}
