use std::sync::Arc;

use serenity::async_trait;
use serenity::builder::{CreateEmbed, CreateEmbedFooter, CreateMessage, EditMessage};
use serenity::http::Http;
use serenity::model::id::UserId;

use crate::commands::giveaway::formatters::{AnnouncementFormatter, DefaultAnnouncementFormatter};
use crate::commands::giveaway::models::Giveaway;
use crate::error::Result;

pub const GIVEAWAY_OPEN_COLOUR: u32 = 0x2ecc71;
pub const GIVEAWAY_ENDED_COLOUR: u32 = 0xf1c40f;
pub const GIVEAWAY_REROLL_COLOUR: u32 = 0x3498db;

// Delivery side of the lifecycle engine: everything the outside world
// hears about a giveaway goes through this trait. A failed delivery never
// rolls back a transition that was already committed; the manager logs it
// and moves on.
#[async_trait]
pub trait GiveawayNotifier: Send + Sync {
    async fn giveaway_created(&self, giveaway: &Giveaway) -> Result<()>;
    async fn entries_changed(&self, giveaway: &Giveaway, total: usize) -> Result<()>;
    async fn giveaway_ended(&self, giveaway: &Giveaway, winners: &[UserId]) -> Result<()>;
    async fn giveaway_rerolled(&self, giveaway: &Giveaway, winners: &[UserId]) -> Result<()>;
}

pub struct DiscordNotifier {
    http: Arc<Http>,
    formatter: Box<dyn AnnouncementFormatter + Send + Sync>,
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>) -> Self {
        DiscordNotifier {
            http,
            formatter: Box::new(DefaultAnnouncementFormatter::new()),
        }
    }

    fn giveaway_embed(&self, giveaway: &Giveaway, total: usize) -> CreateEmbed {
        CreateEmbed::new()
            .title(format!("🎉 {}", giveaway.config().title))
            .description(self.formatter.giveaway_body(giveaway, total))
            .colour(GIVEAWAY_OPEN_COLOUR)
            .footer(CreateEmbedFooter::new(format!("Code: {}", giveaway.code())))
    }
}

#[async_trait]
impl GiveawayNotifier for DiscordNotifier {
    // Posts the announcement embed and remembers the message for the
    // live entry counter updates.
    async fn giveaway_created(&self, giveaway: &Giveaway) -> Result<()> {
        let mut message = CreateMessage::new().embed(self.giveaway_embed(giveaway, 0));
        if let Some(role_id) = giveaway.config().notify_role {
            message = message.content(format!("<@&{}>", role_id.get()));
        }

        let posted = giveaway
            .config()
            .channel_id
            .send_message(&self.http, message)
            .await?;
        giveaway.set_message_id(Some(posted.id));

        Ok(())
    }

    // Refreshes the entry counter on the original announcement post.
    async fn entries_changed(&self, giveaway: &Giveaway, total: usize) -> Result<()> {
        let message_id = match giveaway.message_id() {
            Some(message_id) => message_id,
            // Without a posted announcement there is nothing to refresh.
            None => return Ok(()),
        };

        giveaway
            .config()
            .channel_id
            .edit_message(
                &self.http,
                message_id,
                EditMessage::new().embed(self.giveaway_embed(giveaway, total)),
            )
            .await?;

        Ok(())
    }

    async fn giveaway_ended(&self, giveaway: &Giveaway, winners: &[UserId]) -> Result<()> {
        let embed = CreateEmbed::new()
            .title("🎊 Giveaway Ended!")
            .description(self.formatter.winners_summary(winners))
            .colour(GIVEAWAY_ENDED_COLOUR)
            .footer(CreateEmbedFooter::new(format!("Code: {}", giveaway.code())));

        giveaway
            .config()
            .channel_id
            .send_message(&self.http, CreateMessage::new().embed(embed))
            .await?;

        Ok(())
    }

    async fn giveaway_rerolled(&self, giveaway: &Giveaway, winners: &[UserId]) -> Result<()> {
        let embed = CreateEmbed::new()
            .title("🔄 Giveaway Rerolled")
            .description(self.formatter.winners_summary(winners))
            .colour(GIVEAWAY_REROLL_COLOUR)
            .footer(CreateEmbedFooter::new(format!("Code: {}", giveaway.code())));

        giveaway
            .config()
            .channel_id
            .send_message(&self.http, CreateMessage::new().embed(embed))
            .await?;

        Ok(())
    }
}
