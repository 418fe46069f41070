use serenity::model::channel::GuildChannel;
use serenity::model::guild::Role;
use serenity::model::user::User as DiscordUser;
use tracing::info;

use crate::commands::Context;
use crate::commands::giveaway::eligibility::MemberRoleSet;
use crate::commands::giveaway::manager::CloseOutcome;
use crate::commands::giveaway::models::{GiveawayConfig, Participant};
use crate::commands::giveaway::utils::parse_duration;
use crate::error::Result;

async fn reply_ephemeral(ctx: &Context<'_>, content: String) -> Result<()> {
    ctx.send(
        poise::CreateReply::default()
            .content(content)
            .ephemeral(true),
    )
    .await?;

    Ok(())
}

/// Create a giveaway (admin only)
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn create_giveaway(
    ctx: Context<'_>,
    #[description = "Channel for the giveaway post"] channel: GuildChannel,
    #[description = "Title"] title: String,
    #[description = "Description"] description: String,
    #[description = "Prize"] prize: String,
    #[description = "Number of winners"]
    #[min = 1]
    winners: u32,
    #[description = "Duration, e.g. 1h30m"] duration: String,
    #[description = "Role required to enter"] role: Option<Role>,
    #[description = "Role to ping"] ping_role: Option<Role>,
    #[description = "Forced winner"] forced_winner: Option<DiscordUser>,
) -> Result<()> {
    let duration = match parse_duration(&duration) {
        Some(duration) => duration,
        None => {
            let message = format!("❌ Can't read the duration. Use the `1h30m15s` format.");
            return reply_ephemeral(&ctx, message).await;
        }
    };

    let config = GiveawayConfig::new(&title, &prize, winners as usize, duration, channel.id)
        .with_description(&description)
        .with_required_roles(role.into_iter().map(|role| role.id).collect())
        .with_notify_role(ping_role.map(|role| role.id))
        .with_forced_winner(forced_winner.map(|user| user.id));

    match ctx.data().giveaways.create_giveaway(config).await {
        Ok(giveaway) => {
            info!(
                "Giveaway {} created by {}",
                giveaway.code(),
                ctx.author().name
            );
            reply_ephemeral(&ctx, format!("✅ Giveaway `{}` created.", giveaway.code())).await
        }
        Err(err) => reply_ephemeral(&ctx, format!("❌ {}", err)).await,
    }
}

/// Enter a giveaway by its code
#[poise::command(slash_command, guild_only)]
pub async fn join(
    ctx: Context<'_>,
    #[description = "Giveaway code"] code: String,
) -> Result<()> {
    let manager = &ctx.data().giveaways;
    let giveaway = match manager.registry().get_by_code(&code) {
        Ok(giveaway) => giveaway,
        Err(err) => return reply_ephemeral(&ctx, format!("❌ {}", err)).await,
    };

    // The member's roles are read out at call time so that eligibility
    // always reflects the current state of the guild.
    let roles = match ctx.author_member().await {
        Some(member) => member.roles.clone(),
        None => Vec::new(),
    };
    let membership = MemberRoleSet::new(roles);

    let participant = Participant::from(ctx.author().clone());
    match manager.register(giveaway.id(), participant, &membership).await {
        Ok(total) => {
            reply_ephemeral(&ctx, format!("🎉 You're in! {} entries so far.", total)).await
        }
        Err(err) => reply_ephemeral(&ctx, format!("❌ {}", err)).await,
    }
}

/// End a giveaway early (admin only)
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn end_giveaway(
    ctx: Context<'_>,
    #[description = "Giveaway code"] code: String,
) -> Result<()> {
    let manager = &ctx.data().giveaways;
    let giveaway = match manager.registry().get_by_code(&code) {
        Ok(giveaway) => giveaway,
        Err(err) => return reply_ephemeral(&ctx, format!("❌ {}", err)).await,
    };

    match manager.end_giveaway(giveaway.id()).await {
        Ok(CloseOutcome::Closed(winners)) => {
            let message = format!(
                "✅ Giveaway `{}` ended with {} winner(s).",
                giveaway.code(),
                winners.len()
            );
            reply_ephemeral(&ctx, message).await
        }
        Ok(CloseOutcome::NoOp) => {
            reply_ephemeral(&ctx, format!("The giveaway has already ended.")).await
        }
        Err(err) => reply_ephemeral(&ctx, format!("❌ {}", err)).await,
    }
}

/// Reroll a giveaway (admin only)
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn reroll(
    ctx: Context<'_>,
    #[description = "Giveaway code"] code: String,
) -> Result<()> {
    let manager = &ctx.data().giveaways;
    let giveaway = match manager.registry().get_by_code(&code) {
        Ok(giveaway) => giveaway,
        Err(err) => return reply_ephemeral(&ctx, format!("❌ {}", err)).await,
    };

    match manager.reroll(giveaway.id()).await {
        Ok(_) => reply_ephemeral(&ctx, format!("✅ Rerolled successfully.")).await,
        Err(err) => reply_ephemeral(&ctx, format!("❌ {}", err)).await,
    }
}

/// Get a list of known giveaways
#[poise::command(slash_command, guild_only)]
pub async fn giveaways(ctx: Context<'_>) -> Result<()> {
    let listed = ctx
        .data()
        .giveaways
        .registry()
        .get_giveaways()
        .iter()
        .enumerate()
        .map(|(index, giveaway)| format!("{}. {}", index + 1, giveaway.pretty_print()))
        .collect::<Vec<String>>();

    let content = match listed.len() {
        0 => "There are no giveaways yet.".to_string(),
        _ => listed.join("\n"),
    };
    ctx.say(content).await?;

    Ok(())
}
