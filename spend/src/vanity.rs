//! The vanity shop (spec.md §4.4): one-shot cosmetic purchases
//! (`chat_color`, `greeting`, `currency_name`) applied directly to the
//! account row. Purchases are idempotent per `(username, channel, item_id)`.

use economy_core::config::{VanityItemDef, VanityShopConfig};
use economy_core::error::UserFacingError;
use economy_core::keys::AccountKey;
use economy_ledger::{CosmeticField, Ledger};

use crate::error::SpendError;

#[derive(Debug)]
pub struct VanityEngine {
    ledger: Ledger,
}

impl VanityEngine {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    /// Buys `item_id` and applies its cosmetic value. `value` is ignored for
    /// items whose kind doesn't take a caller-supplied value.
    pub async fn buy(
        &self,
        config: &VanityShopConfig,
        username: &str,
        channel: &str,
        item_id: &str,
        value: Option<String>,
    ) -> Result<(), SpendError> {
        let Some(item) = config.items.iter().find(|i| i.id == item_id) else {
            return Err(UserFacingError::NotFound("that item".to_string()).into());
        };
        let field = cosmetic_field(item)?;

        let key = AccountKey::new(username, channel);
        crate::pipeline::require_spendable_account(&self.ledger, &key).await?;
        let debited = self.ledger.atomic_debit(&key, item.cost, "spend", "vanity.purchase", item_id).await?;
        if !debited {
            return Err(UserFacingError::InsufficientFunds.into());
        }

        let newly_purchased = self.ledger.record_vanity_purchase(&key, item_id).await?;
        if !newly_purchased {
            self.ledger
                .credit(&key, item.cost, "refund", "vanity.already_owned", "you already own that", None, None)
                .await?;
            return Err(UserFacingError::Validation("you already own that item".to_string()).into());
        }

        self.ledger.set_cosmetic(&key, field, value).await?;
        Ok(())
    }
}

fn cosmetic_field(item: &VanityItemDef) -> Result<CosmeticField, SpendError> {
    match item.kind.as_str() {
        "chat_color" => Ok(CosmeticField::ChatColor),
        "greeting" => Ok(CosmeticField::CustomGreeting),
        "currency_name" => Ok(CosmeticField::CurrencyName),
        other => Err(UserFacingError::Config(format!("unknown vanity item kind '{other}'")).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kind_is_rejected() {
        let item = VanityItemDef { id: "x".to_string(), kind: "wallpaper".to_string(), cost: 10 };
        assert!(cosmetic_field(&item).is_err());
    }

    #[test]
    fn known_kinds_map_to_fields() {
        let item = VanityItemDef { id: "x".to_string(), kind: "chat_color".to_string(), cost: 10 };
        assert_eq!(cosmetic_field(&item).unwrap(), CosmeticField::ChatColor);
    }
}
