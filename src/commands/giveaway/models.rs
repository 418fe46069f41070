use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crossbeam::atomic::AtomicCell;
use serenity::model::id::{ChannelId, MessageId, RoleId, UserId};
use serenity::model::user::User as DiscordUser;
use uuid::Uuid;

use crate::commands::giveaway::eligibility::MembershipCheck;
use crate::commands::giveaway::strategies::{DrawOptions, WinnerStrategy};
use crate::commands::giveaway::utils::generate_code;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Participant {
    user_id: UserId,
    username: String,
}

impl Participant {
    pub fn new(user_id: UserId, username: &str) -> Self {
        Participant {
            user_id,
            username: username.to_owned(),
        }
    }

    // Returns a unique identifier in Discord
    pub fn get_user_id(&self) -> UserId {
        self.user_id
    }

    // Returns a username in the Discord room
    pub fn get_username(&self) -> String {
        self.username.clone()
    }
}

impl From<DiscordUser> for Participant {
    fn from(discord_user: DiscordUser) -> Self {
        Participant {
            user_id: discord_user.id,
            username: discord_user.name,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GiveawayState {
    // Accepts registrations until the deadline or an explicit end command.
    Open,
    // Winners have been drawn; entries are frozen.
    Ended,
}

impl GiveawayState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GiveawayState::Open => "open",
            GiveawayState::Ended => "ended",
        }
    }
}

// Everything the command surface decides at creation time, decoded once at
// the boundary into named, typed fields.
#[readonly::make]
#[derive(Clone, Debug)]
pub struct GiveawayConfig {
    pub title: String,
    pub description: String,
    pub prize: String,
    pub winner_count: usize,
    pub duration: Duration,
    pub channel_id: ChannelId,
    pub required_roles: Vec<RoleId>,
    pub notify_role: Option<RoleId>,
    pub forced_winner: Option<UserId>,
}

impl GiveawayConfig {
    pub fn new(
        title: &str,
        prize: &str,
        winner_count: usize,
        duration: Duration,
        channel_id: ChannelId,
    ) -> Self {
        GiveawayConfig {
            title: title.to_owned(),
            description: String::from(""),
            prize: prize.to_owned(),
            winner_count,
            duration,
            channel_id,
            required_roles: Vec::new(),
            notify_role: None,
            forced_winner: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    // Restricts registration to members holding any of the given roles.
    pub fn with_required_roles(mut self, roles: Vec<RoleId>) -> Self {
        self.required_roles = roles;
        self
    }

    pub fn with_notify_role(mut self, role: Option<RoleId>) -> Self {
        self.notify_role = role;
        self
    }

    // Overrides the draw entirely: the given user is returned as the sole
    // winner regardless of the entries.
    pub fn with_forced_winner(mut self, user: Option<UserId>) -> Self {
        self.forced_winner = user;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.winner_count < 1 {
            let message = format!("The number of winners must be at least 1.");
            return Err(Error::Validation(message));
        }

        if self.duration.is_zero() {
            let message = format!("The giveaway duration must be positive.");
            return Err(Error::Validation(message));
        }

        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct Giveaway {
    // A unique identifier of the giveaway.
    id: Uuid,
    // A short human-facing code, printed in announcements and accepted
    // by the commands.
    code: String,
    // Creation-time settings for this giveaway.
    config: GiveawayConfig,
    // The instant the giveaway was created; the deadline is derived
    // from it.
    started_at: Instant,
    // Unix timestamp of the deadline, used for the Discord relative
    // timestamp markup.
    ends_at_unix: u64,
    // The current lifecycle phase. Transitions Open -> Ended exactly once
    // and never reverses.
    state: Arc<AtomicCell<GiveawayState>>,
    // Registered participants, unique by user id. The mutex around this
    // ledger is the synchronization point between registration and the
    // closing transition.
    entries: Arc<Mutex<HashMap<UserId, Participant>>>,
    // The winners recorded by the closing draw.
    winners: Arc<Mutex<Vec<UserId>>>,
    // A reference to the announcement message which is updated during the
    // open phase.
    message_id: Arc<AtomicCell<Option<MessageId>>>,
}

impl Giveaway {
    pub fn new(config: GiveawayConfig) -> Self {
        let ends_at_unix = SystemTime::now()
            .checked_add(config.duration)
            .and_then(|instant| instant.duration_since(UNIX_EPOCH).ok())
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();

        Giveaway {
            id: Uuid::new_v4(),
            code: generate_code(),
            config,
            started_at: Instant::now(),
            ends_at_unix,
            state: Arc::new(AtomicCell::new(GiveawayState::Open)),
            entries: Arc::new(Mutex::new(HashMap::new())),
            winners: Arc::new(Mutex::new(Vec::new())),
            message_id: Arc::new(AtomicCell::new(None)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn config(&self) -> &GiveawayConfig {
        &self.config
    }

    // Returns the current phase of the giveaway.
    pub fn state(&self) -> GiveawayState {
        self.state.load()
    }

    pub fn is_open(&self) -> bool {
        self.state.load() == GiveawayState::Open
    }

    // Returns the instant at which the close trigger must fire.
    pub fn deadline(&self) -> Instant {
        self.started_at + self.config.duration
    }

    pub fn ends_at_unix(&self) -> u64 {
        self.ends_at_unix
    }

    // Returns a reference to the announcement message that gets updated
    // while the giveaway stays open.
    pub fn message_id(&self) -> Option<MessageId> {
        self.message_id.load()
    }

    // Overrides the announcement message reference.
    pub fn set_message_id(&self, message_id: Option<MessageId>) {
        self.message_id.store(message_id)
    }

    // Adds the participant to the entries unless the giveaway is closed,
    // the participant doesn't pass the role requirements, or the entry is
    // a duplicate. Eligibility is re-evaluated on every call: the check
    // receives the roles held by the member right now, not at some earlier
    // instant. Returns the updated entry count.
    pub fn register(
        &self,
        participant: Participant,
        membership: &dyn MembershipCheck,
    ) -> Result<usize> {
        let mut guard_entries = self.entries.lock().unwrap();

        if self.state.load() != GiveawayState::Open {
            return Err(Error::NotOpen);
        }

        let requirements = &self.config.required_roles;
        if !requirements.is_empty() && !membership.has_any_role(&participant, requirements) {
            return Err(Error::Ineligible);
        }

        match guard_entries.contains_key(&participant.get_user_id()) {
            true => Err(Error::AlreadyEntered),
            false => {
                guard_entries.insert(participant.get_user_id(), participant);
                Ok(guard_entries.len())
            }
        }
    }

    // Flips the giveaway into the Ended state and records the winners
    // drawn by the given strategy. Exactly one caller observes Some; any
    // later call gets None. The draw and the record happen under the
    // entries lock, so a losing caller always reads the winners the first
    // one recorded.
    pub fn finish(&self, strategy: &dyn WinnerStrategy) -> Option<Vec<UserId>> {
        let guard_entries = self.entries.lock().unwrap();

        let transition = self
            .state
            .compare_exchange(GiveawayState::Open, GiveawayState::Ended);
        if transition.is_err() {
            return None;
        }

        let pool = guard_entries.keys().copied().collect::<Vec<UserId>>();
        let options = DrawOptions::new(pool, self.config.winner_count, self.config.forced_winner);
        let winners = strategy.roll(&options);
        *self.winners.lock().unwrap() = winners.clone();

        Some(winners)
    }

    pub fn entry_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    // Returns the entrant ids as of the read instant. After the giveaway
    // has ended the ledger is frozen, so this doubles as the stored
    // snapshot rerolls draw from.
    pub fn entries_snapshot(&self) -> Vec<UserId> {
        self.entries
            .lock()
            .unwrap()
            .keys()
            .copied()
            .collect::<Vec<UserId>>()
    }

    // Returns the winners recorded when the giveaway was closed.
    pub fn winners(&self) -> Vec<UserId> {
        self.winners.lock().unwrap().to_vec()
    }

    // Pretty-print of the giveaway in the text messages.
    pub fn pretty_print(&self) -> String {
        format!(
            "`{}` — {} [{}] ({} entries)",
            self.code,
            self.config.prize,
            self.state.load().as_str(),
            self.entry_count(),
        )
    }
}
