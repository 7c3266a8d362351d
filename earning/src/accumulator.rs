//! The fractional accumulator (spec.md §4.3): an in-memory, unpersisted
//! map from `(user, channel, trigger)` to a running fractional remainder.
//! Deliberately volatile (design notes §9) — at most one Z per key is
//! forfeited on restart, which is accepted rather than worth a hot write
//! path to persist.

use economy_core::keys::TriggerKey;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct FractionalAccumulator {
    remainders: Mutex<HashMap<TriggerKey, f64>>,
}

impl FractionalAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` to the running remainder for `key`, floors it, and
    /// returns the whole part to credit while retaining the new remainder.
    pub fn add_and_take_whole(&self, key: &TriggerKey, amount: f64) -> i64 {
        let mut remainders = self.remainders.lock();
        let entry = remainders.entry(key.clone()).or_insert(0.0);
        *entry += amount;
        let whole = entry.floor();
        *entry -= whole;
        whole as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_and_truncates() {
        let acc = FractionalAccumulator::new();
        let key = TriggerKey::new("alice", "c1", "content.comment_during_media");
        assert_eq!(acc.add_and_take_whole(&key, 0.4), 0);
        assert_eq!(acc.add_and_take_whole(&key, 0.4), 0);
        assert_eq!(acc.add_and_take_whole(&key, 0.4), 1);
    }

    #[test]
    fn preserves_total_modulo_residual() {
        let acc = FractionalAccumulator::new();
        let key = TriggerKey::new("alice", "c1", "content.comment_during_media");
        let mut credited = 0i64;
        for _ in 0..10 {
            credited += acc.add_and_take_whole(&key, 0.33);
        }
        // 10 * 0.33 = 3.3, floor-credited total must be 3 (residual 0.3 kept).
        assert_eq!(credited, 3);
    }
}
