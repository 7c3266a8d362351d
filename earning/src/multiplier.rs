//! Stacked multiplier resolution (spec.md §4.3, §4.5, §5): time-of-day,
//! population, holiday, cron-scheduled, and admin ad-hoc sources combine
//! multiplicatively. The scheduled and ad-hoc slots are written only by the
//! scheduler / admin command handler; reads are lock-free snapshot reads
//! (the stored value is replaced, never partially observed), matching the
//! corpus's `parking_lot`-guarded swap pattern used for the config handle.

use chrono::{DateTime, Datelike, Timelike, Utc};
use economy_core::config::MultipliersConfig;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct MultiplierSource {
    pub source: String,
    pub multiplier: f64,
}

#[derive(Debug, Clone)]
pub struct ActiveWindow {
    pub source: String,
    pub multiplier: f64,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Slots {
    scheduled: HashMap<String, ActiveWindow>,
    ad_hoc: HashMap<String, ActiveWindow>,
}

#[derive(Debug)]
pub struct MultiplierEngine {
    config: RwLock<Arc<MultipliersConfig>>,
    slots: RwLock<Slots>,
}

impl MultiplierEngine {
    pub fn new(config: MultipliersConfig) -> Self {
        Self {
            config: RwLock::new(Arc::new(config)),
            slots: RwLock::new(Slots::default()),
        }
    }

    pub fn on_config_update(&self, config: MultipliersConfig) {
        *self.config.write() = Arc::new(config);
    }

    /// Registers (or replaces) the cron-driven scheduled window for a
    /// channel. Called by the scheduler on cron activation.
    pub fn activate_scheduled(&self, channel: &str, source: String, multiplier: f64, expires_at: DateTime<Utc>) {
        self.slots.write().scheduled.insert(
            channel.to_string(),
            ActiveWindow { source, multiplier, expires_at },
        );
    }

    /// Registers an admin-triggered ad-hoc event window for a channel
    /// (`event start` command).
    pub fn activate_ad_hoc(&self, channel: &str, source: String, multiplier: f64, expires_at: DateTime<Utc>) {
        self.slots.write().ad_hoc.insert(
            channel.to_string(),
            ActiveWindow { source, multiplier, expires_at },
        );
    }

    pub fn deactivate_ad_hoc(&self, channel: &str) {
        self.slots.write().ad_hoc.remove(channel);
    }

    /// The combined multiplier and the list of contributing sources for a
    /// channel at `now`, given the channel's current connected population.
    /// Expired scheduled/ad-hoc windows are treated as inactive (lazily
    /// pruned here rather than by a separate sweep task).
    pub fn combined(&self, channel: &str, population: usize, now: DateTime<Utc>) -> (f64, Vec<MultiplierSource>) {
        let config = self.config.read().clone();
        let mut sources = Vec::new();
        let mut combined = 1.0_f64;

        if config.off_peak_hours.contains(&now.hour()) && config.off_peak_multiplier > 0.0 {
            sources.push(MultiplierSource {
                source: "off_peak".to_string(),
                multiplier: config.off_peak_multiplier,
            });
            combined *= config.off_peak_multiplier;
        }

        if let Some((_, mult)) = config
            .population_thresholds
            .iter()
            .filter(|(min_pop, _)| (population as u32) >= *min_pop)
            .max_by_key(|(min_pop, _)| *min_pop)
        {
            sources.push(MultiplierSource {
                source: "population".to_string(),
                multiplier: *mult,
            });
            combined *= mult;
        }

        let today = now.date_naive().format("%Y-%m-%d").to_string();
        if config.holiday_dates.iter().any(|d| d == &today) && config.holiday_multiplier > 0.0 {
            sources.push(MultiplierSource {
                source: "holiday".to_string(),
                multiplier: config.holiday_multiplier,
            });
            combined *= config.holiday_multiplier;
        }

        let slots = self.slots.read();
        if let Some(window) = slots.scheduled.get(channel) {
            if window.expires_at > now {
                sources.push(MultiplierSource {
                    source: window.source.clone(),
                    multiplier: window.multiplier,
                });
                combined *= window.multiplier;
            }
        }
        if let Some(window) = slots.ad_hoc.get(channel) {
            if window.expires_at > now {
                sources.push(MultiplierSource {
                    source: window.source.clone(),
                    multiplier: window.multiplier,
                });
                combined *= window.multiplier;
            }
        }

        (combined, sources)
    }

    /// Convenience for callers (presence tick) that just want an integer
    /// credited amount rather than the raw factor; rounds to the nearest
    /// whole Z. Trigger firings that need sub-integer precision should use
    /// [`Self::combined`] directly with the fractional accumulator.
    pub fn apply(&self, base: i64, channel: &str, population: usize, now: DateTime<Utc>) -> (i64, Vec<MultiplierSource>) {
        let (combined, sources) = self.combined(channel, population, now);
        (((base as f64) * combined).round() as i64, sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MultipliersConfig {
        MultipliersConfig::default()
    }

    #[test]
    fn no_active_sources_is_identity() {
        let engine = MultiplierEngine::new(config());
        let (combined, sources) = engine.combined("c1", 5, Utc::now());
        assert_eq!(combined, 1.0);
        assert!(sources.is_empty());
    }

    #[test]
    fn stacks_scheduled_and_ad_hoc_multiplicatively() {
        let engine = MultiplierEngine::new(config());
        let now = Utc::now();
        engine.activate_scheduled("c1", "off_peak".into(), 2.0, now + chrono::Duration::minutes(5));
        engine.activate_ad_hoc("c1", "population".into(), 1.5, now + chrono::Duration::minutes(5));
        let (combined, sources) = engine.combined("c1", 5, now);
        assert!((combined - 3.0).abs() < 1e-9);
        assert_eq!(sources.len(), 2);
    }

    #[test]
    fn expired_window_drops_out() {
        let engine = MultiplierEngine::new(config());
        let now = Utc::now();
        engine.activate_ad_hoc("c1", "event".into(), 5.0, now - chrono::Duration::seconds(1));
        let (combined, sources) = engine.combined("c1", 5, now);
        assert_eq!(combined, 1.0);
        assert!(sources.is_empty());
    }

    #[test]
    fn removing_last_source_returns_to_identity() {
        let engine = MultiplierEngine::new(config());
        let now = Utc::now();
        engine.activate_ad_hoc("c1", "event".into(), 5.0, now + chrono::Duration::minutes(5));
        assert!(engine.combined("c1", 5, now).0 > 1.0);
        engine.deactivate_ad_hoc("c1");
        assert_eq!(engine.combined("c1", 5, now).0, 1.0);
    }
}
