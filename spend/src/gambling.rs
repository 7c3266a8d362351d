//! Slot machine and coin flip (spec.md §4.4): the two stateless gambling
//! games (no escrow, no persistent lifecycle beyond [`GamblingStatsRepo`]).

use economy_core::config::{CoinFlipConfig, SlotConfig};
use rand::Rng;

use crate::error::SpendError;

#[derive(Debug, Clone, PartialEq)]
pub struct SlotOutcome {
    pub symbols: String,
    pub multiplier: f64,
    pub payout: i64,
}

/// Validates `Σ probability ≤ 1` at startup, per spec.md §4.4.
pub fn validate_slot_config(config: &SlotConfig) -> Result<(), SpendError> {
    let total: f64 = config.entries.iter().map(|e| e.probability).sum();
    if total > 1.0 + 1e-9 {
        return Err(economy_core::error::UserFacingError::Config(format!(
            "slot probabilities sum to {total}, must be <= 1.0"
        ))
        .into());
    }
    Ok(())
}

/// House edge: `1 - Σ(p·m)` over the configured table.
pub fn slot_house_edge(config: &SlotConfig) -> f64 {
    1.0 - config.entries.iter().map(|e| e.probability * e.multiplier).sum::<f64>()
}

/// Draws from the weighted categorical distribution. A draw falling in the
/// unallocated remainder (the house-edge gap) is a loss: zero multiplier.
pub fn draw_slot(config: &SlotConfig, wager: i64) -> SlotOutcome {
    let roll: f64 = rand::rng().random_range(0.0..1.0);
    let mut cumulative = 0.0;
    for entry in &config.entries {
        cumulative += entry.probability;
        if roll < cumulative {
            return SlotOutcome {
                symbols: entry.symbols.clone(),
                multiplier: entry.multiplier,
                payout: (wager as f64 * entry.multiplier).round() as i64,
            };
        }
    }
    SlotOutcome {
        symbols: "---".to_string(),
        multiplier: 0.0,
        payout: 0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinFlipOutcome {
    pub won: bool,
    pub payout: i64,
}

pub fn flip_coin(config: &CoinFlipConfig, wager: i64) -> CoinFlipOutcome {
    let won = rand::rng().random_bool(config.win_probability.clamp(0.0, 1.0));
    CoinFlipOutcome {
        won,
        payout: if won { wager * 2 } else { 0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use economy_core::config::SlotSymbol;

    fn config(entries: Vec<(&str, f64, f64)>) -> SlotConfig {
        SlotConfig {
            enabled: true,
            entries: entries
                .into_iter()
                .map(|(symbols, multiplier, probability)| SlotSymbol {
                    symbols: symbols.to_string(),
                    multiplier,
                    probability,
                })
                .collect(),
            announce_threshold: 0,
        }
    }

    #[test]
    fn rejects_overallocated_probability() {
        let cfg = config(vec![("777", 10.0, 0.6), ("bar", 2.0, 0.6)]);
        assert!(validate_slot_config(&cfg).is_err());
    }

    #[test]
    fn accepts_exact_allocation() {
        let cfg = config(vec![("777", 10.0, 0.1), ("bar", 2.0, 0.4)]);
        assert!(validate_slot_config(&cfg).is_ok());
    }

    #[test]
    fn house_edge_is_one_minus_expected_value() {
        let cfg = config(vec![("777", 10.0, 0.05), ("bar", 2.0, 0.2)]);
        let edge = slot_house_edge(&cfg);
        assert!((edge - (1.0 - (0.05 * 10.0 + 0.2 * 2.0))).abs() < 1e-9);
    }

    #[test]
    fn coin_flip_loss_pays_nothing() {
        let cfg = CoinFlipConfig { enabled: true, win_probability: 0.0 };
        let outcome = flip_coin(&cfg, 100);
        assert_eq!(outcome, CoinFlipOutcome { won: false, payout: 0 });
    }

    #[test]
    fn coin_flip_win_doubles_wager() {
        let cfg = CoinFlipConfig { enabled: true, win_probability: 1.0 };
        let outcome = flip_coin(&cfg, 100);
        assert_eq!(outcome, CoinFlipOutcome { won: true, payout: 200 });
    }
}
