//! Admin PM commands (spec.md §6), gated behind `cytube_rank >=
//! admin.owner_level` by the dispatcher before any of these run.

use chrono::Utc;
use economy_core::collaborator::ChatSender;
use economy_core::keys::AccountKey;

use crate::commands::{CommandReply, Invocation};
use crate::context::DispatchContext;
use crate::error::DispatchError;
use crate::reload::{reload, ReloadTargets};

pub async fn grant(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let (Some(user), Some(amount_str)) = (inv.args.first(), inv.args.get(1)) else {
        return Ok(CommandReply::pm("usage: grant <user> <amount>"));
    };
    let Ok(amount) = amount_str.parse::<i64>() else {
        return Ok(CommandReply::pm("amount must be a whole number"));
    };
    let key = AccountKey::new(user, &inv.channel);
    ctx.ledger.credit(&key, amount, "admin", "admin.grant", "admin grant", Some(&inv.username), None).await?;
    Ok(CommandReply::pm(format!("granted {amount} to {user}")))
}

pub async fn deduct(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let (Some(user), Some(amount_str)) = (inv.args.first(), inv.args.get(1)) else {
        return Ok(CommandReply::pm("usage: deduct <user> <amount>"));
    };
    let Ok(amount) = amount_str.parse::<i64>() else {
        return Ok(CommandReply::pm("amount must be a whole number"));
    };
    let key = AccountKey::new(user, &inv.channel);
    let debited = ctx.ledger.atomic_debit(&key, amount, "admin", "admin.deduct", "admin deduction").await?;
    if !debited {
        return Ok(CommandReply::pm(format!("{user} doesn't have enough to deduct that much")));
    }
    Ok(CommandReply::pm(format!("deducted {amount} from {user}")))
}

pub async fn set_balance(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let (Some(user), Some(amount_str)) = (inv.args.first(), inv.args.get(1)) else {
        return Ok(CommandReply::pm("usage: set_balance <user> <amount>"));
    };
    let Ok(amount) = amount_str.parse::<i64>() else {
        return Ok(CommandReply::pm("amount must be a whole number"));
    };
    let key = AccountKey::new(user, &inv.channel);
    ctx.ledger.set_balance(&key, amount).await?;
    Ok(CommandReply::pm(format!("set {user}'s balance to {amount}")))
}

pub async fn set_rank(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let (Some(user), Some(label)) = (inv.args.first(), inv.args.get(1)) else {
        return Ok(CommandReply::pm("usage: set_rank <user> <label>"));
    };
    let key = AccountKey::new(user, &inv.channel);
    ctx.ledger.set_rank_label(&key, label).await?;
    Ok(CommandReply::pm(format!("set {user}'s rank to {label}")))
}

pub async fn ban(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let Some(user) = inv.args.first() else {
        return Ok(CommandReply::pm("usage: ban <user>"));
    };
    let key = AccountKey::new(user, &inv.channel);
    ctx.ledger.set_banned(&key, true).await?;
    Ok(CommandReply::pm(format!("{user} is now banned from the economy")))
}

pub async fn unban(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let Some(user) = inv.args.first() else {
        return Ok(CommandReply::pm("usage: unban <user>"));
    };
    let key = AccountKey::new(user, &inv.channel);
    ctx.ledger.set_banned(&key, false).await?;
    Ok(CommandReply::pm(format!("{user} is unbanned")))
}

/// A one-off admin-triggered rain, independent of the scheduler's periodic
/// `RainTask` — splits `amount` evenly across everyone currently connected.
pub async fn rain(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let Some(amount) = inv.args.first().and_then(|a| a.parse::<i64>().ok()) else {
        return Ok(CommandReply::pm("usage: rain <amount>"));
    };
    let recipients = ctx.presence.connected_users(&inv.channel);
    if recipients.is_empty() {
        return Ok(CommandReply::pm("nobody is connected to rain on"));
    }
    let share = amount / recipients.len() as i64;
    if share <= 0 {
        return Ok(CommandReply::pm("that amount doesn't split evenly across anyone"));
    }
    for user in &recipients {
        let key = AccountKey::new(user, &inv.channel);
        ctx.ledger.credit(&key, share, "earn", "rain.admin", "admin rain", None, None).await?;
        let _ = ctx.pm.send_pm(&inv.channel, user, &format!("it's raining! you received {share}")).await;
    }
    Ok(CommandReply::pm(format!("rained {share} each on {} user(s)", recipients.len())))
}

pub async fn reload_command(_ctx: &DispatchContext, targets: &ReloadTargets, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let Some(path) = inv.args.first() else {
        return Ok(CommandReply::pm("usage: reload <config path>"));
    };
    match reload(targets, path) {
        Ok(()) => Ok(CommandReply::pm("config reloaded")),
        Err(error) => Ok(CommandReply::pm(format!("reload failed, keeping the previous config: {error}"))),
    }
}

pub async fn econ_stats(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let circulation = ctx.ledger.total_circulation(&inv.channel).await?;
    let median = ctx.ledger.median_balance(&inv.channel).await?;
    let active = ctx.ledger.active_economy_users_today(&inv.channel).await?;
    Ok(CommandReply::pm(format!(
        "circulation: {circulation}, median balance: {median}, active today: {active}"
    )))
}

pub async fn econ_user(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let Some(user) = inv.args.first() else {
        return Ok(CommandReply::pm("usage: econ:user <user>"));
    };
    let key = AccountKey::new(user, &inv.channel);
    let account = ctx.ledger.get_or_create_account(&key).await?;
    Ok(CommandReply::pm(format!(
        "{user}: balance {}, earned {}, spent {}, gambled {}, banned {}",
        account.balance, account.lifetime_earned, account.lifetime_spent, account.lifetime_gambled, account.economy_banned
    )))
}

pub async fn econ_health(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let snapshot = ctx.ledger.get_latest_snapshot(&inv.channel).await?;
    match snapshot {
        Some(s) => Ok(CommandReply::pm(format!(
            "last snapshot at {}: circulation {}, median {}, active {}/{}",
            s.taken_at, s.total_circulation, s.median_balance, s.active_users, s.total_accounts
        ))),
        None => Ok(CommandReply::pm("no snapshot has been taken yet")),
    }
}

pub async fn econ_triggers(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let Some(trigger) = inv.args.first() else {
        return Ok(CommandReply::pm("usage: econ:triggers <trigger name>"));
    };
    let key = economy_core::keys::AnalyticsKey { channel: inv.channel.clone(), trigger: trigger.clone(), date: Utc::now().date_naive() };
    let Some(analytics) = ctx.ledger.get_trigger_analytics(&key).await? else {
        return Ok(CommandReply::pm(format!("{trigger}: no hits today")));
    };
    Ok(CommandReply::pm(format!(
        "{trigger}: {} hits, ~{} unique users, {} awarded today",
        analytics.hit_count, analytics.approx_unique_users, analytics.total_awarded
    )))
}

pub async fn econ_gambling(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let Some(user) = inv.args.first() else {
        return Ok(CommandReply::pm("usage: econ:gambling <user>"));
    };
    let rows = ctx.gambling_stats.list_for_user(user, &inv.channel).await?;
    if rows.is_empty() {
        return Ok(CommandReply::pm(format!("{user} has no gambling history")));
    }
    let lines: Vec<String> = rows.iter().map(|(game, s)| format!("{game}: {} plays, wagered {}, won {}", s.plays, s.wagered, s.won)).collect();
    Ok(CommandReply::pm(lines.join(" | ")))
}

pub async fn approve_gif(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let Some(id) = inv.args.first().and_then(|a| a.parse::<i64>().ok()) else {
        return Ok(CommandReply::pm("usage: approve_gif <request id>"));
    };
    let approval = ctx.approval.approve(id, false).await?;
    Ok(CommandReply::pm(format!("approved request #{id} for {}", approval.username)))
}

pub async fn reject_gif(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let Some(id) = inv.args.first().and_then(|a| a.parse::<i64>().ok()) else {
        return Ok(CommandReply::pm("usage: reject_gif <request id>"));
    };
    ctx.approval.reject(id).await?;
    Ok(CommandReply::pm(format!("rejected request #{id}, refunded")))
}

pub async fn announce(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    if inv.args.is_empty() {
        return Ok(CommandReply::pm("usage: announce <message>"));
    }
    let message = inv.args.join(" ");
    let _ = ctx.broker.send_chat(&inv.channel, &message).await;
    Ok(CommandReply::pm("announced"))
}

pub async fn event_start(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let (Some(multiplier_str), Some(minutes_str)) = (inv.args.first(), inv.args.get(1)) else {
        return Ok(CommandReply::pm("usage: event start <multiplier> <minutes>"));
    };
    let (Ok(multiplier), Ok(minutes)) = (multiplier_str.parse::<f64>(), minutes_str.parse::<i64>()) else {
        return Ok(CommandReply::pm("multiplier must be a number and minutes a whole number"));
    };
    let expires_at = Utc::now() + chrono::Duration::minutes(minutes);
    ctx.multiplier.activate_ad_hoc(&inv.channel, format!("admin:{}", inv.username), multiplier, expires_at);
    ctx.announcer.announce(
        &inv.channel,
        "event_started",
        [("multiplier".to_string(), multiplier.to_string()), ("minutes".to_string(), minutes.to_string())].into(),
    );
    Ok(CommandReply::pm(format!("started a {multiplier:.1}x event for {minutes} minute(s)")))
}

pub async fn event_stop(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    ctx.multiplier.deactivate_ad_hoc(&inv.channel);
    ctx.announcer.announce(&inv.channel, "event_stopped", Default::default());
    Ok(CommandReply::pm("event stopped"))
}

pub async fn claim_bounty(ctx: &DispatchContext, inv: &Invocation) -> Result<CommandReply, DispatchError> {
    let (Some(id), Some(claimant)) = (inv.args.first().and_then(|a| a.parse::<i64>().ok()), inv.args.get(1)) else {
        return Ok(CommandReply::pm("usage: claim_bounty <id> <user>"));
    };
    let bounty = ctx.bounty.claim(id, &inv.channel, claimant).await?;
    let currency = ctx.config.current().currency.name.clone();
    Ok(CommandReply::pm(format!("bounty #{id} awarded to {} ({} {currency})", bounty.claimant.unwrap_or_default(), bounty.amount)))
}
