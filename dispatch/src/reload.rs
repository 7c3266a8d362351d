//! Config hot-reload (spec.md §4.7 `reload` admin command): re-read and
//! validate the YAML file, swap it into the live [`ConfigHandle`] only on
//! success, then push the new config into every component that caches
//! derived state. No component implements the generic `OnConfigUpdate`
//! trait; each has its own ad hoc update method, so this module calls them
//! by hand in a fixed order.

use std::sync::Arc;

use economy_core::config::{ConfigError, ConfigHandle, EconomyConfig};
use economy_core::ignored::IgnoredUsers;
use economy_earning::{EarningEngine, MultiplierEngine};
use economy_presence::PresenceTracker;

pub struct ReloadTargets {
    pub config: ConfigHandle,
    pub earning: Arc<EarningEngine>,
    pub multiplier: Arc<MultiplierEngine>,
    pub presence: Arc<PresenceTracker>,
}

/// Re-reads the config file at `path`, validates it, and on success swaps
/// it in and notifies every component. On failure the live config is left
/// untouched and the error is returned for the initiator to see.
pub fn reload(targets: &ReloadTargets, path: &str) -> Result<(), ConfigError> {
    let new_config = EconomyConfig::load_from_path(path)?;
    new_config.validate()?;

    targets.config.swap(new_config);
    let current = targets.config.current();

    targets.earning.on_config_update(&current);
    targets.multiplier.on_config_update(current.multipliers.clone());
    targets.presence.on_config_update(
        IgnoredUsers::new(current.ignored_users.iter().cloned()),
        current.presence.join_debounce_minutes,
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_rejects_invalid_yaml() {
        let result = EconomyConfig::load_from_path("/nonexistent/path/economy.yaml");
        assert!(result.is_err());
    }
}
