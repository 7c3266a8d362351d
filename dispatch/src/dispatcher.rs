//! The PM intake pipeline (spec.md §4.7): ignored/self-drop, rate limit,
//! tokenize, admin gate, economy-ban gate, handler dispatch, and a blanket
//! error catch that turns any handler failure into a safe PM reply instead
//! of propagating into the per-channel writer task.

use economy_core::collaborator::PmSender;
use economy_core::events::PmEvent;
use economy_core::ignored::IgnoredUsers;
use parking_lot::Mutex;
use tracing::{instrument, warn};

use crate::commands::{admin, user, CommandReply, Invocation};
use crate::context::DispatchContext;
use crate::ratelimit::UserRateLimiter;
use crate::reload::ReloadTargets;
use crate::tokenizer::tokenize;

const MAX_COMMANDS_PER_MINUTE: usize = 10;

pub struct Dispatcher {
    ctx: DispatchContext,
    reload_targets: ReloadTargets,
    rate_limiter: Mutex<UserRateLimiter>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(ctx: DispatchContext, reload_targets: ReloadTargets) -> Self {
        Self { ctx, reload_targets, rate_limiter: Mutex::new(UserRateLimiter::default()) }
    }

    /// Handles one inbound PM event end-to-end, sending the reply (and any
    /// chat side effect) back out through the configured [`PmSender`].
    /// Never returns an error: every failure is logged and converted into
    /// a PM back to the user.
    #[instrument(skip(self, event), fields(user = %event.username, channel = %event.channel))]
    pub async fn handle_pm(&self, event: PmEvent) {
        let config = self.ctx.config.current();

        let ignored = IgnoredUsers::new(config.ignored_users.iter().cloned());
        if ignored.contains(&event.username) {
            return;
        }

        if !self.rate_limiter.lock().allow(&event.username, MAX_COMMANDS_PER_MINUTE, event.timestamp) {
            let _ = self.ctx.pm.send_pm(&event.channel, &event.username, "you're sending commands too fast, slow down").await;
            return;
        }

        let Some((command, args)) = tokenize(&event.message) else {
            return;
        };

        let cytube_rank = event.rank.unwrap_or(0);
        let is_admin = cytube_rank >= config.admin.owner_level && config.admin.commands.contains(&command);
        let is_user_command = USER_COMMANDS.iter().any(|(name, _)| *name == command);

        if !is_admin && !is_user_command {
            return;
        }

        if !is_admin {
            match self.ctx.ledger.is_banned(&economy_core::keys::AccountKey::new(&event.username, &event.channel)).await {
                Ok(true) => {
                    let _ = self.ctx.pm.send_pm(&event.channel, &event.username, "you're currently suspended from the economy").await;
                    return;
                }
                Ok(false) => {}
                Err(error) => {
                    warn!(%error, "ban check failed");
                    let _ = self.ctx.pm.send_pm(&event.channel, &event.username, "something went wrong, please try again").await;
                    return;
                }
            }
        }

        let invocation = Invocation { channel: event.channel.clone(), username: event.username.clone(), cytube_rank, args };

        let reply = if is_admin {
            self.run_admin(&command, &invocation).await
        } else {
            self.run_user(&command, &invocation).await
        };

        match reply {
            Some(Ok(reply)) => {
                let _ = self.ctx.pm.send_pm(&event.channel, &event.username, &reply.pm).await;
                if let Some(chat) = reply.chat {
                    use economy_core::collaborator::ChatSender;
                    let _ = self.ctx.broker.send_chat(&event.channel, &chat).await;
                }
            }
            Some(Err(error)) => {
                warn!(%error, command = %command, "command handler failed");
                let _ = self.ctx.pm.send_pm(&event.channel, &event.username, &error.user_message()).await;
            }
            None => {
                let _ = self.ctx.pm.send_pm(&event.channel, &event.username, "unknown command, try 'help'").await;
            }
        }
    }

    async fn run_user(&self, command: &str, inv: &Invocation) -> Option<Result<CommandReply, crate::error::DispatchError>> {
        let result = match command {
            "help" => user::help(&self.ctx, inv).await,
            "balance" | "bal" => user::balance(&self.ctx, inv).await,
            "rewards" => user::rewards(&self.ctx, inv).await,
            "history" => user::history(&self.ctx, inv).await,
            "rank" => user::rank(&self.ctx, inv).await,
            "profile" => user::profile(&self.ctx, inv).await,
            "achievements" => user::achievements(&self.ctx, inv).await,
            "top" => user::top(&self.ctx, inv).await,
            "search" => user::search(&self.ctx, inv).await,
            "queue" => user::queue(&self.ctx, inv).await,
            "playnext" => user::playnext(&self.ctx, inv).await,
            "forcenow" => user::forcenow(&self.ctx, inv).await,
            "tip" => user::tip(&self.ctx, inv).await,
            "shop" => user::shop(&self.ctx, inv).await,
            "buy" => user::buy(&self.ctx, inv).await,
            "fortune" => user::fortune(&self.ctx, inv).await,
            "spin" => user::spin(&self.ctx, inv).await,
            "flip" => user::flip(&self.ctx, inv).await,
            "challenge" => user::challenge(&self.ctx, inv).await,
            "accept" => user::accept(&self.ctx, inv).await,
            "decline" => user::decline(&self.ctx, inv).await,
            "gambling" | "stats" => user::gambling_stats(&self.ctx, inv).await,
            "bounty" => user::bounty(&self.ctx, inv).await,
            "bounties" => user::bounties(&self.ctx, inv).await,
            "heist" => user::heist(&self.ctx, inv).await,
            "events" | "multipliers" => user::events(&self.ctx, inv).await,
            _ => return None,
        };
        Some(result)
    }

    async fn run_admin(&self, command: &str, inv: &Invocation) -> Option<Result<CommandReply, crate::error::DispatchError>> {
        let result = match command {
            "grant" => admin::grant(&self.ctx, inv).await,
            "deduct" => admin::deduct(&self.ctx, inv).await,
            "rain" => admin::rain(&self.ctx, inv).await,
            "set_balance" => admin::set_balance(&self.ctx, inv).await,
            "set_rank" => admin::set_rank(&self.ctx, inv).await,
            "ban" => admin::ban(&self.ctx, inv).await,
            "unban" => admin::unban(&self.ctx, inv).await,
            "reload" => admin::reload_command(&self.ctx, &self.reload_targets, inv).await,
            "econ:stats" => admin::econ_stats(&self.ctx, inv).await,
            "econ:user" => admin::econ_user(&self.ctx, inv).await,
            "econ:health" => admin::econ_health(&self.ctx, inv).await,
            "econ:triggers" => admin::econ_triggers(&self.ctx, inv).await,
            "econ:gambling" => admin::econ_gambling(&self.ctx, inv).await,
            "approve_gif" => admin::approve_gif(&self.ctx, inv).await,
            "reject_gif" => admin::reject_gif(&self.ctx, inv).await,
            "announce" => admin::announce(&self.ctx, inv).await,
            "claim_bounty" => admin::claim_bounty(&self.ctx, inv).await,
            "event" => match inv.args.first().map(|s| s.as_str()) {
                Some("start") => admin::event_start(&self.ctx, &shift(inv)).await,
                Some("stop") => admin::event_stop(&self.ctx, &shift(inv)).await,
                _ => return Some(Ok(CommandReply::pm("usage: event start <multiplier> <minutes> | event stop"))),
            },
            _ => return None,
        };
        Some(result)
    }
}

/// Drops the first argument (the `start`/`stop` sub-verb) before handing
/// the invocation to the specific `event` handler.
fn shift(inv: &Invocation) -> Invocation {
    Invocation { channel: inv.channel.clone(), username: inv.username.clone(), cytube_rank: inv.cytube_rank, args: inv.args[1..].to_vec() }
}

const USER_COMMANDS: &[(&str, ())] = &[
    ("help", ()),
    ("balance", ()),
    ("bal", ()),
    ("rewards", ()),
    ("history", ()),
    ("rank", ()),
    ("profile", ()),
    ("achievements", ()),
    ("top", ()),
    ("search", ()),
    ("queue", ()),
    ("playnext", ()),
    ("forcenow", ()),
    ("tip", ()),
    ("shop", ()),
    ("buy", ()),
    ("fortune", ()),
    ("spin", ()),
    ("flip", ()),
    ("challenge", ()),
    ("accept", ()),
    ("decline", ()),
    ("gambling", ()),
    ("stats", ()),
    ("bounty", ()),
    ("bounties", ()),
    ("heist", ()),
    ("events", ()),
    ("multipliers", ()),
];
