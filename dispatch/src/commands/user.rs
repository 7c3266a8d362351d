//! User-facing PM commands (spec.md §6). Every handler takes the shared
//! [`DispatchContext`] plus the parsed [`Invocation`] and returns a
//! [`CommandReply`] or a [`DispatchError`].

use chrono::{Datelike, Utc};
use economy_core::keys::AccountKey;
use economy_ledger::ProgressionRepo;

use crate::commands::{CommandReply, Invocation};
use crate::context::DispatchContext;
use crate::error::DispatchError;

pub const HELP_TEXT: &str = "commands: balance, rewards, history, rank, profile, achievements, \
top [earners|rich|lifetime|ranks], search <query>, queue/playnext/forcenow <id>, tip @user <amount>, \
shop, buy <item> [value], fortune, spin [wager], flip <wager>, challenge @user <wager>, accept, decline, \
gambling, bounty <amount> \"<description>\", bounties, events";

pub async fn help(_ctx: &DispatchContext, _inv: &Invocation) -> Result<CommandReply, DispatchError> {
    Ok(CommandReply::pm(HELP_TEXT))
}

pub async fn balance(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let key = AccountKey::new(&inv.username, &inv.channel);
    let account = ctx.ledger.get_or_create_account(&key).await?;
    let currency = ctx.config.current().currency.name.clone();
    Ok(CommandReply::pm(format!("balance: {} {currency}", account.balance)))
}

pub async fn rewards(ctx: &DispatchContext, _inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let config = ctx.config.current();
    let mut lines = Vec::new();
    if config.chat_triggers.long_message.enabled {
        lines.push(format!("long message: +{}", config.chat_triggers.long_message.reward));
    }
    if config.chat_triggers.first_message_of_day.enabled {
        lines.push(format!("first message of day: +{}", config.chat_triggers.first_message_of_day.reward));
    }
    if config.content_triggers.like_current.enabled {
        lines.push(format!("liking current media: +{}", config.content_triggers.like_current.reward));
    }
    if config.social_triggers.greeted_newcomer.enabled {
        lines.push(format!("greeting a newcomer: +{}", config.social_triggers.greeted_newcomer.reward));
    }
    if lines.is_empty() {
        lines.push("no earning triggers are currently active".to_string());
    }
    Ok(CommandReply::pm(lines.join(" | ")))
}

pub async fn history(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let limit = inv.args.first().and_then(|a| a.parse::<i64>().ok()).unwrap_or(10).clamp(1, 25);
    let rows = ctx.ledger.list_transactions(&inv.username, &inv.channel, limit).await?;
    if rows.is_empty() {
        return Ok(CommandReply::pm("no transactions yet"));
    }
    let lines: Vec<String> = rows.iter().map(|t| format!("{:+} {} ({})", t.amount, t.reason, t.tx_type)).collect();
    Ok(CommandReply::pm(lines.join(" | ")))
}

pub async fn rank(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let key = AccountKey::new(&inv.username, &inv.channel);
    let account = ctx.ledger.get_or_create_account(&key).await?;
    let tiers = &ctx.config.current().ranks.tiers;
    let tier = ProgressionRepo::resolve_rank(tiers, account.lifetime_earned);
    match tier {
        Some(t) => Ok(CommandReply::pm(format!(
            "rank: {} (lifetime earned: {}, next discount: {:.0}%)",
            t.label, account.lifetime_earned, t.discount_percent
        ))),
        None => Ok(CommandReply::pm(format!("rank: newcomer (lifetime earned: {})", account.lifetime_earned))),
    }
}

pub async fn profile(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let key = AccountKey::new(&inv.username, &inv.channel);
    let account = ctx.ledger.get_or_create_account(&key).await?;
    let streak = ctx.streaks.get(&inv.username, &inv.channel).await?;
    Ok(CommandReply::pm(format!(
        "{}: balance {}, lifetime earned {}, lifetime spent {}, streak {} day(s)",
        account.username, account.balance, account.lifetime_earned, account.lifetime_spent, streak.current_streak
    )))
}

pub async fn achievements(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let key = AccountKey::new(&inv.username, &inv.channel);
    let earned = ctx.progression.list_achievements(&key).await?;
    if earned.is_empty() {
        return Ok(CommandReply::pm("no achievements yet"));
    }
    Ok(CommandReply::pm(earned.join(", ")))
}

pub async fn top(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let kind = inv.args.first().map(|s| s.as_str()).unwrap_or("earners");
    let rows = match kind {
        "rich" => ctx.ledger.top_by_balance(&inv.channel, 10).await?,
        "lifetime" => ctx.ledger.top_by_lifetime_earned(&inv.channel, 10).await?,
        "ranks" => {
            let ranks = ctx.ledger.rank_distribution(&inv.channel).await?;
            let lines: Vec<String> = ranks.iter().map(|r| format!("{}: {}", r.rank_label, r.count)).collect();
            return Ok(CommandReply::pm(if lines.is_empty() { "no data yet".to_string() } else { lines.join(" | ") }));
        }
        _ => ctx.ledger.top_earners_over_days(&inv.channel, 7, 10).await?,
    };
    if rows.is_empty() {
        return Ok(CommandReply::pm("no data yet"));
    }
    let lines: Vec<String> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| format!("{}. {} — {}", i + 1, row.username, row.value))
        .collect();
    Ok(CommandReply::pm(lines.join(" | ")))
}

pub async fn search(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    if inv.args.is_empty() {
        return Ok(CommandReply::pm("usage: search <query>"));
    }
    let query = inv.args.join(" ");
    let results = ctx.media.search(&query).await.map_err(|e| DispatchError::Config(e.to_string()))?;
    if results.is_empty() {
        return Ok(CommandReply::pm("no results"));
    }
    let lines: Vec<String> = results.iter().take(5).map(|r| format!("{} ({})", r.title, r.id)).collect();
    Ok(CommandReply::pm(lines.join(" | ")))
}

async fn queue_like(ctx: &DispatchContext, inv: &Invocation, tier_arg_index: usize, play_next: bool) -> Result<CommandReply, DispatchError> {
    let config = ctx.config.current();
    let Some(media_id) = inv.args.first() else {
        return Ok(CommandReply::pm("usage: queue <media id>"));
    };
    let tier_id = config
        .spending
        .queue_tiers
        .get(tier_arg_index)
        .map(|t| t.id.clone())
        .unwrap_or_default();
    let cost = ctx
        .queue
        .enqueue(&config.spending, &config.ranks, &inv.channel, &inv.username, &tier_id, media_id, play_next)
        .await?;
    Ok(CommandReply::pm(format!("queued for {cost} {}", config.currency.name)))
}

pub async fn queue(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    queue_like(ctx, inv, 0, false).await
}

pub async fn playnext(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    queue_like(ctx, inv, 0, true).await
}

/// `forcenow` maps onto the same front-of-queue collaborator call as
/// `playnext`; the queue collaborator interface has no separate
/// immediate-play verb.
pub async fn forcenow(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    queue_like(ctx, inv, 0, true).await
}

pub async fn tip(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let config = ctx.config.current();
    let (Some(recipient), Some(amount_str)) = (inv.args.first(), inv.args.get(1)) else {
        return Ok(CommandReply::pm("usage: tip @user <amount>"));
    };
    let recipient = recipient.trim_start_matches('@');
    let Ok(amount) = amount_str.parse::<i64>() else {
        return Ok(CommandReply::pm("amount must be a whole number"));
    };
    ctx.tip.tip(&config.tipping, &inv.channel, &inv.username, recipient, amount).await?;
    Ok(CommandReply::pm(format!("tipped {recipient} {amount} {}", config.currency.name)))
}

pub async fn shop(ctx: &DispatchContext, _inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let config = ctx.config.current();
    if config.vanity_shop.items.is_empty() {
        return Ok(CommandReply::pm("the shop is empty"));
    }
    let lines: Vec<String> = config.vanity_shop.items.iter().map(|i| format!("{} ({}): {}", i.id, i.kind, i.cost)).collect();
    Ok(CommandReply::pm(lines.join(" | ")))
}

pub async fn buy(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let config = ctx.config.current();
    let Some(item_id) = inv.args.first() else {
        return Ok(CommandReply::pm("usage: buy <item> [value]"));
    };
    let value = inv.args.get(1).cloned();
    ctx.vanity.buy(&config.vanity_shop, &inv.username, &inv.channel, item_id, value).await?;
    Ok(CommandReply::pm(format!("purchased {item_id}")))
}

const FORTUNES: &[&str] = &[
    "a quiet stream today, a loud one tomorrow.",
    "your next tip will land exactly when you need it.",
    "the queue favors the patient.",
    "luck follows whoever helps a newcomer.",
];

pub async fn fortune(_ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let index = (inv.username.bytes().map(|b| b as usize).sum::<usize>() + Utc::now().ordinal0() as usize) % FORTUNES.len();
    Ok(CommandReply::pm(FORTUNES[index]))
}

pub async fn spin(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let config = ctx.config.current();
    if !config.gambling.slot.enabled {
        return Ok(CommandReply::pm("the slots are not active here"));
    }
    let wager = inv.args.first().and_then(|a| a.parse::<i64>().ok()).unwrap_or(1);
    if wager <= 0 {
        return Ok(CommandReply::pm("wager must be positive"));
    }
    let outcome = economy_spend::draw_slot(&config.gambling.slot, wager);
    let key = AccountKey::new(&inv.username, &inv.channel);
    let covered = ctx.ledger.resolve_gamble(&key, "slot", wager, outcome.payout).await?;
    if !covered {
        return Ok(CommandReply::pm("you don't have enough to cover that wager"));
    }
    ctx.gambling_stats.record_play(&inv.username, &inv.channel, "slot", wager, outcome.payout).await?;
    let reply = CommandReply::pm(format!("{} → payout {}", outcome.symbols, outcome.payout));
    if outcome.payout >= config.gambling.slot.announce_threshold && config.gambling.slot.announce_threshold > 0 {
        ctx.announcer.announce(
            &inv.channel,
            "slot_big_win",
            [("user".to_string(), inv.username.clone()), ("payout".to_string(), outcome.payout.to_string())].into(),
        );
    }
    Ok(reply)
}

pub async fn flip(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let config = ctx.config.current();
    if !config.gambling.coin_flip.enabled {
        return Ok(CommandReply::pm("coin flip is not active here"));
    }
    let Some(wager) = inv.args.first().and_then(|a| a.parse::<i64>().ok()) else {
        return Ok(CommandReply::pm("usage: flip <wager>"));
    };
    if wager <= 0 {
        return Ok(CommandReply::pm("wager must be positive"));
    }
    let outcome = economy_spend::flip_coin(&config.gambling.coin_flip, wager);
    let key = AccountKey::new(&inv.username, &inv.channel);
    let covered = ctx.ledger.resolve_gamble(&key, "coin_flip", wager, outcome.payout).await?;
    if !covered {
        return Ok(CommandReply::pm("you don't have enough to cover that wager"));
    }
    ctx.gambling_stats.record_play(&inv.username, &inv.channel, "coin_flip", wager, outcome.payout).await?;
    Ok(CommandReply::pm(if outcome.won {
        format!("heads! you won {}", outcome.payout)
    } else {
        "tails, you lost the flip".to_string()
    }))
}

pub async fn gambling_stats(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let rows = ctx.gambling_stats.list_for_user(&inv.username, &inv.channel).await?;
    if rows.is_empty() {
        return Ok(CommandReply::pm("no gambling history yet"));
    }
    let lines: Vec<String> = rows.iter().map(|(game, stats)| format!("{game}: {} plays, wagered {}, won {}", stats.plays, stats.wagered, stats.won)).collect();
    Ok(CommandReply::pm(lines.join(" | ")))
}

pub async fn challenge(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let config = ctx.config.current();
    if !config.gambling.challenge.enabled {
        return Ok(CommandReply::pm("challenges are not active here"));
    }
    let (Some(target), Some(wager_str)) = (inv.args.first(), inv.args.get(1)) else {
        return Ok(CommandReply::pm("usage: challenge @user <wager>"));
    };
    let target = target.trim_start_matches('@');
    let Ok(wager) = wager_str.parse::<i64>() else {
        return Ok(CommandReply::pm("wager must be a whole number"));
    };
    let id = ctx.challenge.issue(&config.gambling.challenge, &inv.channel, &inv.username, target, wager, Utc::now()).await?;
    Ok(CommandReply::pm(format!("challenge #{id} issued to {target} for {wager} {}", config.currency.name)))
}

async fn resolve_pending_id(ctx: &DispatchContext, inv: &Invocation) -> Result<Option<i64>, DispatchError> {
    if let Some(id) = inv.args.first().and_then(|a| a.parse::<i64>().ok()) {
        return Ok(Some(id));
    }
    Ok(ctx.challenge_repo.latest_pending_for_target(&inv.channel, &inv.username).await?.map(|c| c.id))
}

pub async fn accept(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let config = ctx.config.current();
    let Some(id) = resolve_pending_id(ctx, inv).await? else {
        return Ok(CommandReply::pm("you have no pending challenge to accept"));
    };
    let resolution = ctx.challenge.accept(&config.gambling.challenge, id, &inv.channel, &inv.username).await?;
    Ok(CommandReply::pm_and_chat(
        format!("challenge #{id} resolved: {} won {}", resolution.winner, resolution.payout),
        format!("{} beat {} in a challenge and won {}!", resolution.winner, resolution.loser, resolution.payout),
    ))
}

pub async fn decline(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let Some(id) = resolve_pending_id(ctx, inv).await? else {
        return Ok(CommandReply::pm("you have no pending challenge to decline"));
    };
    ctx.challenge.decline(id, &inv.channel, &inv.username).await?;
    Ok(CommandReply::pm(format!("challenge #{id} declined")))
}

pub async fn bounty(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let config = ctx.config.current();
    let (Some(amount_str), Some(description)) = (inv.args.first(), inv.args.get(1)) else {
        return Ok(CommandReply::pm("usage: bounty <amount> \"<description>\""));
    };
    let Ok(amount) = amount_str.parse::<i64>() else {
        return Ok(CommandReply::pm("amount must be a whole number"));
    };
    let id = ctx.bounty.create(&config.bounties, &inv.channel, &inv.username, amount, description, Utc::now()).await?;
    Ok(CommandReply::pm(format!("bounty #{id} posted for {amount} {}", config.currency.name)))
}

pub async fn bounties(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let pending = ctx.bounty_repo.list_open(&inv.channel).await?;
    if pending.is_empty() {
        return Ok(CommandReply::pm("no open bounties"));
    }
    let lines: Vec<String> = pending.iter().map(|b| format!("#{} {} ({} by {})", b.id, b.description, b.amount, b.creator)).collect();
    Ok(CommandReply::pm(lines.join(" | ")))
}

pub async fn heist(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let config = ctx.config.current();
    if !config.gambling.heist.enabled {
        return Ok(CommandReply::pm("heists are not active here"));
    }
    let Some(wager) = inv.args.first().and_then(|a| a.parse::<i64>().ok()) else {
        return Ok(CommandReply::pm("usage: heist <wager>"));
    };
    ctx.heist.join(&config.gambling.heist, &inv.channel, &inv.username, wager, Utc::now()).await?;
    Ok(CommandReply::pm_and_chat(
        format!("you've joined the heist with {wager} {}", config.currency.name),
        format!("{} joined the heist! `heist <wager>` to get in before the window closes", inv.username),
    ))
}

pub async fn events(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let population = ctx.presence.population(&inv.channel);
    let (multiplier, sources) = ctx.multiplier.combined(&inv.channel, population, Utc::now());
    if sources.is_empty() {
        return Ok(CommandReply::pm("no active multipliers right now"));
    }
    Ok(CommandReply::pm(format!("combined multiplier: {multiplier:.2}x ({} active)", sources.len())))
}
