//! The earning engine: per-event trigger evaluation (spec.md §4.3). Given a
//! chat message, evaluates every configured trigger in catalog order,
//! applying cooldowns/caps/conditions, crediting through the multiplier
//! stack, recording analytics, and updating daily-activity counters.

use chrono::{DateTime, Utc};
use economy_core::config::{ConfigHandle, EconomyConfig};
use economy_core::events::{ChangeMediaEvent, ChatMsgEvent};
use economy_core::ignored::IgnoredUsers;
use economy_core::keys::{AccountKey, AnalyticsKey, DailyKey, TriggerKey};
use economy_ledger::{DailyActivityField, Ledger};
use economy_presence::PresenceTracker;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::instrument;

use crate::accumulator::FractionalAccumulator;
use crate::detect;
use crate::error::EarningError;
use crate::multiplier::MultiplierEngine;
use crate::outcome::{EarningSummary, TriggerOutcome};
use crate::state::EngineState;

#[derive(Debug)]
pub struct EarningEngine {
    ledger: Ledger,
    presence: Arc<PresenceTracker>,
    config: ConfigHandle,
    ignored: RwLock<IgnoredUsers>,
    multiplier: Arc<MultiplierEngine>,
    accumulator: FractionalAccumulator,
    state: parking_lot::Mutex<EngineState>,
    known_emotes: RwLock<HashSet<String>>,
}

impl EarningEngine {
    pub fn new(
        ledger: Ledger,
        presence: Arc<PresenceTracker>,
        config: ConfigHandle,
        multiplier: Arc<MultiplierEngine>,
    ) -> Self {
        let ignored = IgnoredUsers::new(config.current().ignored_users.iter().cloned());
        Self {
            ledger,
            presence,
            config,
            ignored: RwLock::new(ignored),
            multiplier,
            accumulator: FractionalAccumulator::new(),
            state: parking_lot::Mutex::new(EngineState::default()),
            known_emotes: RwLock::new(HashSet::new()),
        }
    }

    pub fn on_config_update(&self, new_config: &EconomyConfig) {
        *self.ignored.write() = IgnoredUsers::new(new_config.ignored_users.iter().cloned());
    }

    pub fn set_known_emotes(&self, emotes: HashSet<String>) {
        *self.known_emotes.write() = emotes;
    }

    pub fn note_arrival(&self, channel: &str, user: &str, now: DateTime<Utc>) {
        self.state.lock().note_arrival(channel, user, now);
    }

    /// Evaluates every configured trigger against a chat message, in
    /// catalog order, and applies the always-on daily activity update.
    #[instrument(skip(self, event))]
    pub async fn handle_chat_message(&self, event: &ChatMsgEvent) -> Result<EarningSummary, EarningError> {
        let mut summary = EarningSummary::default();
        if self.ignored.read().contains(&event.username) {
            return Ok(summary);
        }

        let config = self.config.current();
        let key = AccountKey::new(&event.username, &event.channel);
        let population = self.presence.population(&event.channel);
        let now = event.timestamp;

        // conversation_starter must be evaluated before we record this
        // message's timestamp as the channel's `last_message`.
        if config.chat_triggers.conversation_starter.enabled {
            if let Some(outcome) = self
                .eval_conversation_starter(&config, &key, &event.channel, population, now)
                .await?
            {
                summary.results.push(outcome);
            }
        }

        if config.chat_triggers.laugh_received.enabled {
            if let Some(outcome) = self
                .eval_laugh_received(&config, &event.username, &event.channel, &event.message, population, now)
                .await?
            {
                summary.results.push(outcome);
            }
        }

        if config.chat_triggers.long_message.enabled {
            if let Some(outcome) = self
                .eval_long_message(&config, &key, &event.channel, &event.message, population, now)
                .await?
            {
                summary.results.push(outcome);
            }
        }

        if config.chat_triggers.first_message_of_day.enabled {
            if let Some(outcome) = self.eval_first_message_of_day(&config, &key, now).await? {
                summary.results.push(outcome);
            }
        }

        if config.chat_triggers.kudos_received.enabled {
            summary.results.extend(
                self.eval_kudos_received(&config, &event.username, &event.channel, &event.message, population, now)
                    .await?,
            );
        }

        if config.content_triggers.first_after_media_change.enabled
            || config.content_triggers.comment_during_media.enabled
        {
            summary.results.extend(
                self.eval_content_triggers(&config, &key, &event.channel, population, now)
                    .await?,
            );
        }

        if config.social_triggers.greeted_newcomer.enabled {
            if let Some(outcome) = self
                .eval_greeted_newcomer(&config, &event.username, &event.channel, &event.message, population, now)
                .await?
            {
                summary.results.push(outcome);
            }
        }

        if config.social_triggers.mentioned_by_other.enabled {
            summary.results.extend(
                self.eval_mentioned_by_other(&config, &event.username, &event.channel, &event.message, population, now)
                    .await?,
            );
        }

        self.record_daily_activity(&key, &event.message, now).await?;

        {
            let mut state = self.state.lock();
            let channel_state = state.channel_mut(&event.channel);
            channel_state.last_message = Some(crate::state::LastMessage {
                username: event.username.clone(),
                timestamp: now,
            });
        }

        Ok(summary)
    }

    async fn credit_trigger(
        &self,
        key: &AccountKey,
        trigger: &str,
        base_reward: f64,
        channel: &str,
        population: usize,
        now: DateTime<Utc>,
        reason: &str,
        related_user: Option<&str>,
    ) -> Result<TriggerOutcome, EarningError> {
        let (combined, sources) = self.multiplier.combined(channel, population, now);
        let scaled = base_reward * combined;
        let tkey = TriggerKey::new(&key.username, channel, trigger);
        let credited = self.accumulator.add_and_take_whole(&tkey, scaled);

        if credited > 0 {
            let metadata = serde_json::json!({
                "base": base_reward,
                "multiplier": combined,
                "sources": sources.iter().map(|s| serde_json::json!({"source": s.source, "mult": s.multiplier})).collect::<Vec<_>>(),
            });
            self.ledger
                .credit(key, credited, "earn", trigger, reason, related_user, Some(metadata))
                .await?;
        }

        let analytics_key = AnalyticsKey {
            channel: channel.to_string(),
            trigger: trigger.to_string(),
            date: now.date_naive(),
        };
        self.ledger.record_trigger_analytics(&analytics_key, credited).await?;

        Ok(TriggerOutcome::fired(trigger, credited))
    }

    async fn eval_long_message(
        &self,
        config: &EconomyConfig,
        key: &AccountKey,
        channel: &str,
        text: &str,
        population: usize,
        now: DateTime<Utc>,
    ) -> Result<Option<TriggerOutcome>, EarningError> {
        let trigger_config = &config.chat_triggers.long_message;
        if text.len() < trigger_config.min_chars {
            return Ok(None);
        }
        let cooldown_key = TriggerKey::new(&key.username, channel, "chat.long_message");
        let allowed = self
            .ledger
            .check_and_claim(&cooldown_key, trigger_config.max_per_window, trigger_config.window_seconds, now)
            .await?;
        if !allowed {
            return Ok(Some(TriggerOutcome::blocked("chat.long_message", "cap")));
        }
        Ok(Some(
            self.credit_trigger(key, "chat.long_message", trigger_config.reward, channel, population, now, "long message", None)
                .await?,
        ))
    }

    async fn eval_first_message_of_day(
        &self,
        config: &EconomyConfig,
        key: &AccountKey,
        now: DateTime<Utc>,
    ) -> Result<Option<TriggerOutcome>, EarningError> {
        let daily_key = DailyKey::new(&key.username, &key.channel, now.date_naive());
        if !self.ledger.mark_first_message_claimed(&daily_key).await? {
            return Ok(None);
        }
        let trigger_config = &config.chat_triggers.first_message_of_day;
        let population = self.presence.population(&key.channel);
        Ok(Some(
            self.credit_trigger(key, "chat.first_message_of_day", trigger_config.reward, &key.channel, population, now, "first message of the day", None)
                .await?,
        ))
    }

    async fn eval_conversation_starter(
        &self,
        config: &EconomyConfig,
        key: &AccountKey,
        channel: &str,
        population: usize,
        now: DateTime<Utc>,
    ) -> Result<Option<TriggerOutcome>, EarningError> {
        let trigger_config = &config.chat_triggers.conversation_starter;
        let silent_long_enough = {
            let state = self.state.lock();
            match state.channels.get(channel).and_then(|c| c.last_message.as_ref()) {
                None => true,
                Some(last) => (now - last.timestamp).num_seconds() >= trigger_config.window_seconds,
            }
        };
        if !silent_long_enough {
            return Ok(None);
        }
        Ok(Some(
            self.credit_trigger(key, "chat.conversation_starter", trigger_config.reward, channel, population, now, "broke the silence", None)
                .await?,
        ))
    }

    async fn eval_laugh_received(
        &self,
        config: &EconomyConfig,
        username: &str,
        channel: &str,
        text: &str,
        population: usize,
        now: DateTime<Utc>,
    ) -> Result<Option<TriggerOutcome>, EarningError> {
        if !detect::contains_laugh(text) {
            return Ok(None);
        }
        let joke_teller = {
            let state = self.state.lock();
            state.channels.get(channel).and_then(|c| c.last_message.as_ref()).map(|m| m.username.clone())
        };
        let Some(joke_teller) = joke_teller else {
            return Ok(None);
        };
        if joke_teller.eq_ignore_ascii_case(username) {
            return Ok(None);
        }
        if self.ignored.read().contains(&joke_teller) {
            return Ok(None);
        }
        let trigger_config = &config.chat_triggers.laugh_received;
        let cooldown_key = TriggerKey::new(&joke_teller, channel, "chat.laugh_received");
        let allowed = self
            .ledger
            .check_and_claim(&cooldown_key, trigger_config.max_per_window, trigger_config.window_seconds, now)
            .await?;
        if !allowed {
            return Ok(Some(TriggerOutcome::blocked("chat.laugh_received", "cap")));
        }
        let target_key = AccountKey::new(&joke_teller, channel);
        Ok(Some(
            self.credit_trigger(&target_key, "chat.laugh_received", trigger_config.reward, channel, population, now, "made someone laugh", Some(username))
                .await?,
        ))
    }

    async fn eval_kudos_received(
        &self,
        config: &EconomyConfig,
        sender: &str,
        channel: &str,
        text: &str,
        population: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<TriggerOutcome>, EarningError> {
        let trigger_config = &config.chat_triggers.kudos_received;
        let mut outcomes = Vec::new();
        for target in detect::kudos_targets(text) {
            if config.chat_triggers.kudos_self_excluded && target.eq_ignore_ascii_case(sender) {
                continue;
            }
            if self.ignored.read().contains(&target) {
                continue;
            }
            let target_key = AccountKey::new(&target, channel);
            let outcome = self
                .credit_trigger(&target_key, "chat.kudos_received", trigger_config.reward, channel, population, now, "received kudos", Some(sender))
                .await?;
            outcomes.push(outcome);

            let sender_daily = DailyKey::new(sender, channel, now.date_naive());
            let target_daily = DailyKey::new(&target, channel, now.date_naive());
            self.ledger.increment_daily_activity(&sender_daily, DailyActivityField::KudosGiven, 1).await?;
            self.ledger.increment_daily_activity(&target_daily, DailyActivityField::KudosReceived, 1).await?;
        }
        Ok(outcomes)
    }

    async fn eval_content_triggers(
        &self,
        config: &EconomyConfig,
        key: &AccountKey,
        channel: &str,
        population: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<TriggerOutcome>, EarningError> {
        let mut outcomes = Vec::new();
        let has_media = {
            let state = self.state.lock();
            state.channels.get(channel).and_then(|c| c.current_media.as_ref()).is_some()
        };
        if !has_media {
            return Ok(outcomes);
        }

        if config.content_triggers.first_after_media_change.enabled {
            let claimed = {
                let mut state = self.state.lock();
                let media = state.channel_mut(channel).current_media.as_mut().expect("checked above");
                if media.first_after_claimed {
                    false
                } else {
                    media.first_after_claimed = true;
                    true
                }
            };
            if claimed {
                let trigger_config = &config.content_triggers.first_after_media_change;
                outcomes.push(
                    self.credit_trigger(key, "content.first_after_media_change", trigger_config.reward, channel, population, now, "first comment on new media", None)
                        .await?,
                );
            }
        }

        if config.content_triggers.comment_during_media.enabled {
            let (media_id, duration_seconds) = {
                let state = self.state.lock();
                let media = state.channels.get(channel).and_then(|c| c.current_media.as_ref()).expect("checked above");
                (media.media_id.clone(), media.duration_seconds)
            };
            let trigger_config = &config.content_triggers.comment_during_media;
            let base_cap = trigger_config.max_per_window;
            let scaled_cap = if trigger_config.window_seconds > 0 {
                let scale = duration_seconds as f64 / trigger_config.window_seconds as f64;
                ((base_cap as f64) * scale).floor().max(base_cap as f64) as u32
            } else {
                base_cap
            };
            let cooldown_key = TriggerKey::new(&key.username, channel, &format!("content.comment_during_media:{media_id}"));
            let allowed = self
                .ledger
                .check_and_claim(&cooldown_key, scaled_cap, duration_seconds.max(1), now)
                .await?;
            if allowed {
                outcomes.push(
                    self.credit_trigger(key, "content.comment_during_media", trigger_config.reward, channel, population, now, "commenting during media", None)
                        .await?,
                );
            } else {
                outcomes.push(TriggerOutcome::blocked("content.comment_during_media", "cap"));
            }
        }

        Ok(outcomes)
    }

    async fn eval_greeted_newcomer(
        &self,
        config: &EconomyConfig,
        username: &str,
        channel: &str,
        text: &str,
        population: usize,
        now: DateTime<Utc>,
    ) -> Result<Option<TriggerOutcome>, EarningError> {
        let greeted = {
            let mut state = self.state.lock();
            state.try_consume_greeting(channel, text)
        };
        let Some(greeted) = greeted else {
            return Ok(None);
        };
        if greeted.eq_ignore_ascii_case(username) {
            return Ok(None);
        }
        let trigger_config = &config.social_triggers.greeted_newcomer;
        let key = AccountKey::new(username, channel);
        Ok(Some(
            self.credit_trigger(&key, "social.greeted_newcomer", trigger_config.reward, channel, population, now, "greeted a newcomer", Some(&greeted))
                .await?,
        ))
    }

    async fn eval_mentioned_by_other(
        &self,
        config: &EconomyConfig,
        sender: &str,
        channel: &str,
        text: &str,
        population: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<TriggerOutcome>, EarningError> {
        let trigger_config = &config.social_triggers.mentioned_by_other;
        let mut outcomes = Vec::new();
        for target in detect::mentions(text) {
            if target.eq_ignore_ascii_case(sender) {
                continue;
            }
            if self.ignored.read().contains(&target) {
                continue;
            }
            if !self.presence.is_connected(&target, channel) {
                continue;
            }
            let cooldown_key = TriggerKey::new(sender, channel, &format!("social.mentioned_by_other:{}", target.to_lowercase()));
            let allowed = self
                .ledger
                .check_and_claim(&cooldown_key, trigger_config.max_per_window, trigger_config.window_seconds, now)
                .await?;
            if !allowed {
                continue;
            }
            let target_key = AccountKey::new(&target, channel);
            outcomes.push(
                self.credit_trigger(&target_key, "social.mentioned_by_other", trigger_config.reward, channel, population, now, "mentioned by another user", Some(sender))
                    .await?,
            );
        }
        Ok(outcomes)
    }

    /// `content.like_current`: PM-triggered, one award per (user, media).
    pub async fn record_like(&self, username: &str, channel: &str, now: DateTime<Utc>) -> Result<Option<TriggerOutcome>, EarningError> {
        if self.ignored.read().contains(username) {
            return Ok(None);
        }
        let config = self.config.current();
        if !config.content_triggers.like_current.enabled {
            return Ok(None);
        }
        let media_id = {
            let state = self.state.lock();
            state.channels.get(channel).and_then(|c| c.current_media.as_ref()).map(|m| m.media_id.clone())
        };
        let Some(media_id) = media_id else {
            return Ok(None);
        };
        let key = AccountKey::new(username, channel);
        let first = self.ledger.record_vanity_purchase(&key, &format!("like_current:{media_id}")).await?;
        if !first {
            return Ok(Some(TriggerOutcome::blocked("content.like_current", "already liked")));
        }
        let population = self.presence.population(channel);
        Ok(Some(
            self.credit_trigger(&key, "content.like_current", config.content_triggers.like_current.reward, channel, population, now, "liked the current media", None)
                .await?,
        ))
    }

    /// `social.bot_interaction`: invoked externally when the bot's own
    /// message is observed; credits the previous human speaker.
    pub async fn record_bot_interaction(&self, channel: &str, now: DateTime<Utc>) -> Result<Option<TriggerOutcome>, EarningError> {
        let config = self.config.current();
        if !config.social_triggers.bot_interaction.enabled {
            return Ok(None);
        }
        let previous_speaker = {
            let state = self.state.lock();
            state.channels.get(channel).and_then(|c| c.last_message.as_ref()).map(|m| m.username.clone())
        };
        let Some(previous_speaker) = previous_speaker else {
            return Ok(None);
        };
        if self.ignored.read().contains(&previous_speaker) {
            return Ok(None);
        }
        let daily_key = DailyKey::new(&previous_speaker, channel, now.date_naive());
        let daily = self.ledger.get_daily_activity(&daily_key).await?;
        let trigger_config = &config.social_triggers.bot_interaction;
        if daily.bot_interactions >= trigger_config.max_per_window as i64 {
            return Ok(Some(TriggerOutcome::blocked("social.bot_interaction", "daily cap")));
        }
        self.ledger.increment_daily_activity(&daily_key, DailyActivityField::BotInteractions, 1).await?;
        let key = AccountKey::new(&previous_speaker, channel);
        let population = self.presence.population(channel);
        Ok(Some(
            self.credit_trigger(&key, "social.bot_interaction", trigger_config.reward, channel, population, now, "interacted with the bot", None)
                .await?,
        ))
    }

    /// `content.survived_full_media`: evaluated on media change, not per
    /// message. Awards every user who was present at the previous media's
    /// start AND is still connected, provided elapsed/duration meets the
    /// configured minimum presence percentage.
    #[instrument(skip(self, event))]
    pub async fn handle_media_change(&self, event: &ChangeMediaEvent) -> Result<Vec<TriggerOutcome>, EarningError> {
        let config = self.config.current();
        let mut outcomes = Vec::new();

        let previous = {
            let mut state = self.state.lock();
            let channel_state = state.channel_mut(&event.channel);
            let previous = channel_state.current_media.take();
            channel_state.previous_media = previous.clone();
            previous
        };

        if let (Some(previous), true) = (&previous, config.content_triggers.survived_full_media.enabled) {
            let elapsed = (event.timestamp - previous.started_at).num_seconds().max(0);
            let fraction = if previous.duration_seconds > 0 {
                elapsed as f64 / previous.duration_seconds as f64
            } else {
                1.0
            };
            if fraction >= config.content_triggers.min_presence_percent {
                let trigger_config = &config.content_triggers.survived_full_media;
                for username in &previous.present_at_start {
                    if !self.presence.is_connected(username, &event.channel) {
                        continue;
                    }
                    if self.ignored.read().contains(username) {
                        continue;
                    }
                    let key = AccountKey::new(username.as_str(), &event.channel);
                    let population = self.presence.population(&event.channel);
                    outcomes.push(
                        self.credit_trigger(&key, "content.survived_full_media", trigger_config.reward, &event.channel, population, event.timestamp, "stayed through the whole media", None)
                            .await?,
                    );
                }
            }
        }

        let present_at_start: HashSet<String> = self.presence.connected_users(&event.channel).into_iter().collect();
        let mut state = self.state.lock();
        state.channel_mut(&event.channel).current_media = Some(crate::state::MediaState {
            media_id: event.media_id.clone(),
            started_at: event.timestamp,
            duration_seconds: event.duration_seconds,
            first_after_claimed: false,
            present_at_start,
        });

        Ok(outcomes)
    }

    async fn record_daily_activity(&self, key: &AccountKey, text: &str, now: DateTime<Utc>) -> Result<(), EarningError> {
        let config = self.config.current();
        let daily_key = DailyKey::new(&key.username, &key.channel, now.date_naive());
        self.ledger.increment_daily_activity(&daily_key, DailyActivityField::MessagesSent, 1).await?;

        if text.len() >= config.chat_triggers.long_message.min_chars {
            self.ledger.increment_daily_activity(&daily_key, DailyActivityField::LongMessages, 1).await?;
        }
        if detect::contains_gif_url(text) {
            self.ledger.increment_daily_activity(&daily_key, DailyActivityField::GifsSent, 1).await?;
        }

        let tokens: Vec<String> = {
            let known = self.known_emotes.read();
            if known.is_empty() {
                Vec::new()
            } else {
                detect::extract_emotes(text, &known).into_iter().map(str::to_string).collect()
            }
        };
        if !tokens.is_empty() {
            let refs: Vec<&str> = tokens.iter().map(String::as_str).collect();
            let new_total = {
                let mut state = self.state.lock();
                state.record_emotes(&key.username, &key.channel, now.date_naive(), &refs)
            };
            let previous_total = self.ledger.get_daily_activity(&daily_key).await?.unique_emotes;
            let delta = new_total as i64 - previous_total;
            if delta != 0 {
                self.ledger.increment_daily_activity(&daily_key, DailyActivityField::UniqueEmotes, delta).await?;
            }
        }

        Ok(())
    }
}
