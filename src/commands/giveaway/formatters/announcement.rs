// Special module that contains the text bodies
// for the giveaway announcement embeds
use serenity::model::id::UserId;

use crate::commands::giveaway::formatters::base::AnnouncementFormatter;
use crate::commands::giveaway::models::Giveaway;

pub struct DefaultAnnouncementFormatter;

impl DefaultAnnouncementFormatter {
    pub fn new() -> Self {
        DefaultAnnouncementFormatter {}
    }

    fn mention(&self, user_id: &UserId) -> String {
        format!("<@{}>", user_id.get())
    }
}

impl AnnouncementFormatter for DefaultAnnouncementFormatter {
    // Body of the live giveaway post, refreshed while entries come in.
    fn giveaway_body(&self, giveaway: &Giveaway, total_entries: usize) -> String {
        format!(
            "{}\n\n🏆 **Prize:** {}\n👥 **Winners:** {}\n⏰ **Ends:** <t:{}:R>\n🎟️ **Entries:** {}",
            giveaway.config().description,
            giveaway.config().prize,
            giveaway.config().winner_count,
            giveaway.ends_at_unix(),
            total_entries,
        )
    }

    // Winner mentions for the closing and reroll announcements.
    fn winners_summary(&self, winners: &[UserId]) -> String {
        match winners.is_empty() {
            true => "Nobody entered this giveaway.".to_string(),
            false => {
                let mentions = winners
                    .iter()
                    .map(|winner| self.mention(winner))
                    .collect::<Vec<String>>()
                    .join(", ");
                format!("🏆 **Winner(s):** {}", mentions)
            }
        }
    }
}
