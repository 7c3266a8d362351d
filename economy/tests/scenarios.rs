//! End-to-end scenario tests (spec.md §8's lettered scenarios), driven
//! directly against the crate APIs `economy::router` wires together,
//! using an in-memory SQLite store per test.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use economy_core::config::{ConfigHandle, EconomyConfig};
use economy_core::events::ChatMsgEvent;
use economy_core::ignored::IgnoredUsers;
use economy_core::keys::AccountKey;
use economy_earning::{EarningEngine, MultiplierEngine};
use economy_ledger::{Ledger, Store};
use economy_presence::{ArrivalOutcome, PresenceTracker};
use economy_spend::pipeline::QueueCollaborator;
use economy_spend::{QueueEngine, SpendError};

fn config(yaml: &str) -> EconomyConfig {
    EconomyConfig::from_yaml_str(yaml).expect("valid scenario config")
}

async fn memory_ledger() -> Ledger {
    let store = Store::open(":memory:", 5000, 1).unwrap();
    Ledger::new(Arc::new(store))
}

const BASE_YAML: &str = r#"
nats:
  url: "nats://localhost:4222"
database:
  path: ":memory:"
bot:
  username: "economybot"
"#;

// Scenario A — presence accumulates one Z per minute across three ticks.
#[tokio::test]
async fn scenario_a_presence_accumulates() {
    let ledger = memory_ledger().await;
    let ignored = IgnoredUsers::new(std::iter::empty());
    let presence = PresenceTracker::new(ledger.clone(), ignored, 5);

    let t0 = Utc::now();
    let outcome = presence.handle_join("alice", "c1", t0).await;
    assert_eq!(outcome, ArrivalOutcome::GenuineArrival);

    let key = AccountKey::new("alice", "c1");
    for minute in 1..=3 {
        let now = t0 + Duration::seconds(60 * minute);
        let ticked = presence.tick(now);
        assert_eq!(ticked.len(), 1);
        let credits = ticked.into_iter().map(|(k, _)| (k, 1, now.date_naive())).collect();
        ledger.batch_credit_presence(credits, "presence.base").await.unwrap();
    }

    let account = ledger.get_account(&key).await.unwrap().unwrap();
    assert_eq!(account.balance, 3);
    assert_eq!(account.lifetime_earned, 3);

    let txs = ledger.list_transactions(&key, 10).await.unwrap();
    assert_eq!(txs.len(), 3);
    assert!(txs.iter().all(|tx| tx.amount == 1 && tx.tx_type == "earn" && tx.trigger == "presence.base"));
}

// Scenario B — a rejoin within the debounce window is not a genuine
// arrival, so the welcome wallet is credited at most once.
#[tokio::test]
async fn scenario_b_join_debounce_suppresses_duplicate_welcome() {
    let ledger = memory_ledger().await;
    let ignored = IgnoredUsers::new(std::iter::empty());
    let presence = PresenceTracker::new(ledger.clone(), ignored, 5);
    let key = AccountKey::new("alice", "c1");
    let welcome_wallet = 100;

    let t0 = Utc::now();
    let first = presence.handle_join("alice", "c1", t0).await;
    assert_eq!(first, ArrivalOutcome::GenuineArrival);
    ledger.credit(&key, welcome_wallet, "earn", "onboarding.welcome_wallet", "welcome", None, None).await.unwrap();
    assert_eq!(ledger.get_account(&key).await.unwrap().unwrap().balance, 100);

    presence.handle_leave("alice", "c1", t0 + Duration::seconds(60));
    let rejoin = presence.handle_join("alice", "c1", t0 + Duration::seconds(120)).await;
    assert_eq!(rejoin, ArrivalOutcome::Bounce);
    // A bounce never reaches the onboarding credit path in the router,
    // so no second welcome-wallet credit is issued here either.

    let account = ledger.get_account(&key).await.unwrap().unwrap();
    assert_eq!(account.balance, 100);
    let txs = ledger.list_transactions(&key, 10).await.unwrap();
    assert_eq!(txs.iter().filter(|tx| tx.trigger == "onboarding.welcome_wallet").count(), 1);
}

// Scenario C — concurrent spend and grant never produce a negative
// balance or a lost write: one debit row and one credit row land
// regardless of ordering, and the account balance reflects both.
#[tokio::test]
async fn scenario_c_concurrent_spend_and_grant_race() {
    let ledger = memory_ledger().await;
    let key = AccountKey::new("alice", "c1");
    ledger.credit(&key, 500, "earn", "presence.base", "seed", None, None).await.unwrap();

    let debit_ledger = ledger.clone();
    let debit_key = key.clone();
    let debit = tokio::spawn(async move { debit_ledger.atomic_debit(&debit_key, 600, "spend", "gambling.spin", "spin").await.unwrap() });

    let credit_ledger = ledger.clone();
    let credit_key = key.clone();
    let credit = tokio::spawn(async move { credit_ledger.credit(&credit_key, 100, "earn", "admin.grant", "grant", None, None).await });

    let debited = debit.await.unwrap();
    credit.await.unwrap().unwrap();

    let account = ledger.get_account(&key).await.unwrap().unwrap();
    assert!(account.balance >= 0);

    let txs = ledger.list_transactions(&key, 10).await.unwrap();
    let debit_rows = txs.iter().filter(|tx| tx.amount == -600).count();
    let credit_rows = txs.iter().filter(|tx| tx.amount == 100).count();
    assert_eq!(credit_rows, 1);
    if debited {
        assert_eq!(debit_rows, 1);
        assert_eq!(account.balance, 500 - 600 + 100);
    } else {
        assert_eq!(debit_rows, 0);
        assert_eq!(account.balance, 500 + 100);
    }
}

// Scenario D — kudos credits the target, not the sender, and a user
// cannot kudo themselves.
#[tokio::test]
async fn scenario_d_kudos_credits_target_not_sender() {
    let yaml = format!(
        "{BASE_YAML}\nchat_triggers:\n  kudos_received:\n    enabled: true\n    reward: 3\n  kudos_self_excluded: true\n"
    );
    let config_handle = ConfigHandle::new(config(&yaml));
    let ledger = memory_ledger().await;
    let ignored = IgnoredUsers::new(std::iter::empty());
    let presence = Arc::new(PresenceTracker::new(ledger.clone(), ignored, 5));
    let multiplier = Arc::new(MultiplierEngine::new(config_handle.current().multipliers.clone()));
    let earning = EarningEngine::new(ledger.clone(), presence, config_handle, multiplier);

    let now = Utc::now();
    earning
        .handle_chat_message(&ChatMsgEvent { username: "alice".into(), channel: "c1".into(), message: "nice work bob++".into(), timestamp: now, rank: None })
        .await
        .unwrap();

    let alice = AccountKey::new("alice", "c1");
    let bob = AccountKey::new("bob", "c1");
    assert_eq!(ledger.get_account(&bob).await.unwrap().unwrap().balance, 3);
    assert!(ledger.get_account(&alice).await.unwrap().is_none());

    let bob_txs = ledger.list_transactions(&bob, 10).await.unwrap();
    assert_eq!(bob_txs.len(), 1);
    assert_eq!(bob_txs[0].trigger, "chat.kudos_received");
    assert_eq!(bob_txs[0].related_user.as_deref(), Some("alice"));

    // Self-kudo produces no credit at all.
    earning
        .handle_chat_message(&ChatMsgEvent { username: "alice".into(), channel: "c1".into(), message: "alice++".into(), timestamp: now, rank: None })
        .await
        .unwrap();
    assert_eq!(ledger.get_account(&alice).await.unwrap().unwrap().balance, 0);
}

struct FailingQueue;

#[async_trait]
impl QueueCollaborator for FailingQueue {
    async fn add_media(&self, _channel: &str, _media_id: &str, _play_next: bool) -> Result<(), SpendError> {
        Err(economy_core::error::UserFacingError::Collaborator.into())
    }
}

// Scenario E — rank discount applies, and a failed AddMedia call refunds
// the debit in full so the net balance change is zero.
#[tokio::test]
async fn scenario_e_queue_discount_and_refund_on_media_failure() {
    let yaml = format!(
        "{BASE_YAML}\nspending:\n  queue_tiers:\n    - id: \"standard\"\n      cost: 500\n      min_rank: 1\n  spend_discount_per_rank: 0.02\nranks:\n  tiers:\n    - {{label: \"t1\", min_lifetime_earned: 100}}\n    - {{label: \"t2\", min_lifetime_earned: 200}}\n    - {{label: \"t3\", min_lifetime_earned: 300}}\n    - {{label: \"t4\", min_lifetime_earned: 400}}\n    - {{label: \"t5\", min_lifetime_earned: 500}}\n"
    );
    let config = config(&yaml);
    let ledger = memory_ledger().await;
    let key = AccountKey::new("alice", "c1");
    ledger.credit(&key, 1000, "earn", "presence.base", "seed", None, None).await.unwrap();

    // lifetime_earned must reach the 5th tier's threshold (500) — the
    // above credit already put lifetime_earned at 1000.
    let account = ledger.get_account(&key).await.unwrap().unwrap();
    assert!(account.lifetime_earned >= 500);

    let engine = QueueEngine::new(ledger.clone(), Arc::new(FailingQueue));
    let result = engine.enqueue(&config.spending, &config.ranks, "c1", "alice", "standard", "media-1", false).await;
    assert!(result.is_err());

    let after = ledger.get_account(&key).await.unwrap().unwrap();
    assert_eq!(after.balance, account.balance);

    let txs = ledger.list_transactions(&key, 10).await.unwrap();
    let debit = txs.iter().find(|tx| tx.trigger == "spend.queue" && tx.amount < 0).expect("debit row");
    assert_eq!(debit.amount, -450);
    assert_eq!(debit.reason, "standard");
    let refund = txs.iter().find(|tx| tx.trigger == "refund.queue_failed").expect("refund row");
    assert_eq!(refund.amount, 450);
}

// Scenario F — stacked multipliers apply multiplicatively and the
// resulting transaction metadata records base, combined multiplier, and
// each contributing source.
#[tokio::test]
async fn scenario_f_multiplier_stacking_and_metadata() {
    let yaml = format!("{BASE_YAML}\nchat_triggers:\n  conversation_starter:\n    enabled: true\n    reward: 5\n");
    let config_handle = ConfigHandle::new(config(&yaml));
    let ledger = memory_ledger().await;
    let ignored = IgnoredUsers::new(std::iter::empty());
    let presence = Arc::new(PresenceTracker::new(ledger.clone(), ignored, 5));
    let multiplier = Arc::new(MultiplierEngine::new(config_handle.current().multipliers.clone()));

    let now = Utc::now();
    multiplier.activate_scheduled("c1", "off_peak".into(), 2.0, now + Duration::minutes(5));
    multiplier.activate_ad_hoc("c1", "population".into(), 1.5, now + Duration::minutes(5));

    let earning = EarningEngine::new(ledger.clone(), presence, config_handle, multiplier);
    earning
        .handle_chat_message(&ChatMsgEvent { username: "alice".into(), channel: "c1".into(), message: "hello".into(), timestamp: now, rank: None })
        .await
        .unwrap();

    let key = AccountKey::new("alice", "c1");
    let account = ledger.get_account(&key).await.unwrap().unwrap();
    assert_eq!(account.balance, 15);

    let txs = ledger.list_transactions(&key, 10).await.unwrap();
    let tx = txs.iter().find(|tx| tx.trigger == "chat.conversation_starter").expect("conversation_starter row");
    assert_eq!(tx.amount, 15);
    let metadata = tx.metadata.as_ref().expect("metadata recorded");
    assert_eq!(metadata["base"], 5.0);
    assert_eq!(metadata["multiplier"], 3.0);
    let sources = metadata["sources"].as_array().unwrap();
    assert_eq!(sources.len(), 2);
}
