use serenity::model::id::UserId;

use crate::commands::giveaway::models::Giveaway;

pub trait AnnouncementFormatter {
    // Body of the live giveaway post, refreshed while entries come in.
    fn giveaway_body(&self, giveaway: &Giveaway, total_entries: usize) -> String;
    // Winner mentions for the closing and reroll announcements.
    fn winners_summary(&self, winners: &[UserId]) -> String;
}
