use std::sync::Arc;

use serenity::model::id::UserId;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::commands::giveaway::eligibility::MembershipCheck;
use crate::commands::giveaway::models::{Giveaway, GiveawayConfig, GiveawayState, Participant};
use crate::commands::giveaway::notifier::GiveawayNotifier;
use crate::commands::giveaway::registry::GiveawayRegistry;
use crate::commands::giveaway::scheduler::Scheduler;
use crate::commands::giveaway::strategies::{DrawOptions, UniformDrawStrategy, WinnerStrategy};
use crate::error::{Error, Result};

// Outcome of a close request. The timer trigger and an explicit end
// command race for the transition: exactly one of them gets the winners,
// every later caller lands on NoOp.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CloseOutcome {
    Closed(Vec<UserId>),
    NoOp,
}

#[non_exhaustive]
pub struct GiveawayManager {
    registry: GiveawayRegistry,
    scheduler: Scheduler,
    strategy: Box<dyn WinnerStrategy>,
    notifier: Box<dyn GiveawayNotifier>,
}

impl GiveawayManager {
    pub fn new(notifier: Box<dyn GiveawayNotifier>) -> Self {
        GiveawayManager {
            registry: GiveawayRegistry::new(),
            scheduler: Scheduler::new(),
            strategy: Box::new(UniformDrawStrategy::new()),
            notifier,
        }
    }

    pub fn registry(&self) -> &GiveawayRegistry {
        &self.registry
    }

    // Validates the config, stores the new giveaway, announces it and
    // arms the close timer. The giveaway never exists without its timer.
    pub async fn create_giveaway(self: &Arc<Self>, config: GiveawayConfig) -> Result<Arc<Giveaway>> {
        config.validate()?;

        let giveaway = Arc::new(Giveaway::new(config));
        self.registry.add(giveaway.clone());

        if let Err(err) = self.notifier.giveaway_created(&giveaway).await {
            error!(
                "Can't announce the new giveaway {}: {}",
                giveaway.code(),
                err
            );
        }

        self.scheduler
            .arm(self.clone(), giveaway.id(), giveaway.deadline());
        info!(
            "Giveaway {} created, closing in {:?}",
            giveaway.code(),
            giveaway.config().duration
        );

        Ok(giveaway)
    }

    // Registers the participant and pushes the updated entry counter to
    // the notifier. The membership check must reflect the participant's
    // roles at call time.
    pub async fn register(
        &self,
        id: Uuid,
        participant: Participant,
        membership: &dyn MembershipCheck,
    ) -> Result<usize> {
        let giveaway = self.registry.get(id)?;
        let username = participant.get_username();
        let total = giveaway.register(participant, membership)?;
        debug!(
            "{} entered giveaway {} ({} entries total)",
            username,
            giveaway.code(),
            total
        );

        if let Err(err) = self.notifier.entries_changed(&giveaway, total).await {
            error!(
                "Can't refresh the entry counter for giveaway {}: {}",
                giveaway.code(),
                err
            );
        }

        Ok(total)
    }

    // Performs the Open -> Ended transition at most once per giveaway.
    // Whichever trigger gets here first draws and records the winners;
    // everyone else gets NoOp. A failed announcement is logged and never
    // rolls the transition back.
    pub async fn close(&self, id: Uuid) -> Result<CloseOutcome> {
        let giveaway = self.registry.get(id)?;

        match giveaway.finish(self.strategy.as_ref()) {
            Some(winners) => {
                info!(
                    "Giveaway {} ended with {} winner(s)",
                    giveaway.code(),
                    winners.len()
                );

                if let Err(err) = self.notifier.giveaway_ended(&giveaway, &winners).await {
                    error!(
                        "Can't deliver the winners announcement for giveaway {}: {}",
                        giveaway.code(),
                        err
                    );
                }

                Ok(CloseOutcome::Closed(winners))
            }
            None => Ok(CloseOutcome::NoOp),
        }
    }

    // The explicit command path. Disarming the timer after a won close is
    // an optimization only: a timer that fires anyway hits the NoOp
    // branch of `close`.
    pub async fn end_giveaway(&self, id: Uuid) -> Result<CloseOutcome> {
        let outcome = self.close(id).await?;
        if let CloseOutcome::Closed(_) = outcome {
            self.scheduler.disarm(id);
        }

        Ok(outcome)
    }

    // Draws a fresh winners list from the frozen entries of an ended
    // giveaway. The forced override is not reapplied and the close-time
    // winner record stays untouched; every call is an independent draw.
    pub async fn reroll(&self, id: Uuid) -> Result<Vec<UserId>> {
        let giveaway = self.registry.get(id)?;
        if giveaway.state() != GiveawayState::Ended {
            return Err(Error::NotEnded);
        }

        let options = DrawOptions::new(
            giveaway.entries_snapshot(),
            giveaway.config().winner_count,
            None,
        );
        let winners = self.strategy.roll(&options);

        if let Err(err) = self.notifier.giveaway_rerolled(&giveaway, &winners).await {
            error!(
                "Can't deliver the reroll announcement for giveaway {}: {}",
                giveaway.code(),
                err
            );
        }

        Ok(winners)
    }

    // Entry point for the scheduler task once the deadline is reached.
    pub(crate) async fn timer_fired(&self, id: Uuid) {
        match self.close(id).await {
            Ok(CloseOutcome::Closed(_)) => (),
            Ok(CloseOutcome::NoOp) => {
                debug!("Close timer for giveaway {} fired after an explicit end", id)
            }
            Err(err) => error!("Close timer for giveaway {} failed: {}", id, err),
        }
        self.scheduler.release(id);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use serenity::async_trait;
    use serenity::model::id::{ChannelId, RoleId, UserId};
    use uuid::Uuid;

    use crate::commands::giveaway::eligibility::MemberRoleSet;
    use crate::commands::giveaway::manager::{CloseOutcome, GiveawayManager};
    use crate::commands::giveaway::models::{Giveaway, GiveawayConfig, GiveawayState, Participant};
    use crate::commands::giveaway::notifier::GiveawayNotifier;
    use crate::error::{Error, Result};

    #[derive(Debug, Clone, Eq, PartialEq)]
    enum NotifierEvent {
        Created(String),
        EntriesChanged(usize),
        Ended(Vec<UserId>),
        Rerolled(Vec<UserId>),
    }

    struct RecordingNotifier {
        events: Arc<Mutex<Vec<NotifierEvent>>>,
    }

    #[async_trait]
    impl GiveawayNotifier for RecordingNotifier {
        async fn giveaway_created(&self, giveaway: &Giveaway) -> Result<()> {
            let event = NotifierEvent::Created(giveaway.code().to_owned());
            self.events.lock().unwrap().push(event);
            Ok(())
        }

        async fn entries_changed(&self, _giveaway: &Giveaway, total: usize) -> Result<()> {
            let event = NotifierEvent::EntriesChanged(total);
            self.events.lock().unwrap().push(event);
            Ok(())
        }

        async fn giveaway_ended(&self, _giveaway: &Giveaway, winners: &[UserId]) -> Result<()> {
            let event = NotifierEvent::Ended(winners.to_vec());
            self.events.lock().unwrap().push(event);
            Ok(())
        }

        async fn giveaway_rerolled(&self, _giveaway: &Giveaway, winners: &[UserId]) -> Result<()> {
            let event = NotifierEvent::Rerolled(winners.to_vec());
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    fn get_manager() -> (Arc<GiveawayManager>, Arc<Mutex<Vec<NotifierEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let notifier = RecordingNotifier {
            events: events.clone(),
        };
        (Arc::new(GiveawayManager::new(Box::new(notifier))), events)
    }

    fn get_config(winner_count: usize, duration: Duration) -> GiveawayConfig {
        GiveawayConfig::new(
            "Summer drop",
            "A game key",
            winner_count,
            duration,
            ChannelId::new(10),
        )
    }

    fn get_participant(user_id: u64) -> Participant {
        Participant::new(UserId::new(user_id), &format!("user-{}", user_id))
    }

    fn everyone() -> MemberRoleSet {
        MemberRoleSet::new(Vec::new())
    }

    fn ended_announcements(events: &Arc<Mutex<Vec<NotifierEvent>>>) -> Vec<Vec<UserId>> {
        events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                NotifierEvent::Ended(winners) => Some(winners.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_created_giveaway_starts_open_and_accepts_entries() {
        let (manager, events) = get_manager();

        let giveaway = manager
            .create_giveaway(get_config(1, Duration::from_secs(60)))
            .await
            .unwrap();
        assert_eq!(giveaway.state(), GiveawayState::Open);
        assert_eq!(giveaway.entry_count(), 0);

        let total = manager
            .register(giveaway.id(), get_participant(1), &everyone())
            .await
            .unwrap();
        assert_eq!(total, 1);

        let recorded = events.lock().unwrap().clone();
        assert_eq!(
            recorded.contains(&NotifierEvent::Created(giveaway.code().to_owned())),
            true
        );
        assert_eq!(recorded.contains(&NotifierEvent::EntriesChanged(1)), true);
    }

    #[tokio::test]
    async fn test_create_giveaway_rejects_invalid_winner_count() {
        let (manager, _) = get_manager();

        let result = manager
            .create_giveaway(get_config(0, Duration::from_secs(60)))
            .await;
        assert_eq!(result.is_err(), true);
        assert_eq!(
            result.unwrap_err(),
            Error::Validation(format!("The number of winners must be at least 1."))
        );
    }

    #[tokio::test]
    async fn test_create_giveaway_rejects_zero_duration() {
        let (manager, _) = get_manager();

        let result = manager
            .create_giveaway(get_config(1, Duration::from_secs(0)))
            .await;
        assert_eq!(result.is_err(), true);
        assert_eq!(
            result.unwrap_err(),
            Error::Validation(format!("The giveaway duration must be positive."))
        );
    }

    #[tokio::test]
    async fn test_register_for_unknown_giveaway() {
        let (manager, _) = get_manager();

        let result = manager
            .register(Uuid::new_v4(), get_participant(1), &everyone())
            .await;
        assert_eq!(result, Err(Error::NotFound));
    }

    #[tokio::test]
    async fn test_register_duplicate_entry() {
        let (manager, _) = get_manager();
        let giveaway = manager
            .create_giveaway(get_config(1, Duration::from_secs(60)))
            .await
            .unwrap();

        manager
            .register(giveaway.id(), get_participant(1), &everyone())
            .await
            .unwrap();
        let result = manager
            .register(giveaway.id(), get_participant(1), &everyone())
            .await;

        assert_eq!(result, Err(Error::AlreadyEntered));
        assert_eq!(giveaway.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_register_checks_roles_on_every_call() {
        let (manager, _) = get_manager();
        let config =
            get_config(1, Duration::from_secs(60)).with_required_roles(vec![RoleId::new(7)]);
        let giveaway = manager.create_giveaway(config).await.unwrap();

        let without_role = manager
            .register(
                giveaway.id(),
                get_participant(1),
                &MemberRoleSet::new(Vec::new()),
            )
            .await;
        assert_eq!(without_role, Err(Error::Ineligible));

        // The same user re-tries after getting the role assigned.
        let with_role = manager
            .register(
                giveaway.id(),
                get_participant(1),
                &MemberRoleSet::new(vec![RoleId::new(7)]),
            )
            .await;
        assert_eq!(with_role, Ok(1));
    }

    #[tokio::test]
    async fn test_explicit_end_computes_winners_once() {
        let (manager, events) = get_manager();
        let giveaway = manager
            .create_giveaway(get_config(2, Duration::from_secs(60)))
            .await
            .unwrap();
        for user_id in 1..=3 {
            manager
                .register(giveaway.id(), get_participant(user_id), &everyone())
                .await
                .unwrap();
        }

        let first = manager.end_giveaway(giveaway.id()).await.unwrap();
        let winners = match first {
            CloseOutcome::Closed(winners) => winners,
            CloseOutcome::NoOp => panic!("the first close must win the transition"),
        };
        assert_eq!(winners.len(), 2);
        let distinct = winners.iter().collect::<HashSet<&UserId>>();
        assert_eq!(distinct.len(), 2);

        let second = manager.end_giveaway(giveaway.id()).await.unwrap();
        assert_eq!(second, CloseOutcome::NoOp);

        // Both call sites observe the same recorded winners.
        assert_eq!(giveaway.winners(), winners);
        assert_eq!(ended_announcements(&events).len(), 1);
    }

    #[tokio::test]
    async fn test_timer_closes_the_giveaway_at_the_deadline() {
        let (manager, events) = get_manager();
        let giveaway = manager
            .create_giveaway(get_config(2, Duration::from_millis(100)))
            .await
            .unwrap();
        for user_id in 1..=3 {
            manager
                .register(giveaway.id(), get_participant(user_id), &everyone())
                .await
                .unwrap();
        }

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(giveaway.state(), GiveawayState::Ended);
        let snapshot = giveaway.entries_snapshot();
        let winners = giveaway.winners();
        assert_eq!(winners.len(), 2);
        assert_eq!(winners.iter().all(|winner| snapshot.contains(winner)), true);
        assert_eq!(ended_announcements(&events), vec![winners]);
    }

    #[tokio::test]
    async fn test_forced_winner_with_zero_entries() {
        let (manager, _) = get_manager();
        let config = get_config(1, Duration::from_secs(60))
            .with_forced_winner(Some(UserId::new(999)));
        let giveaway = manager.create_giveaway(config).await.unwrap();

        let outcome = manager.end_giveaway(giveaway.id()).await.unwrap();
        assert_eq!(outcome, CloseOutcome::Closed(vec![UserId::new(999)]));
        assert_eq!(giveaway.winners(), vec![UserId::new(999)]);
    }

    #[tokio::test]
    async fn test_explicit_end_shortly_before_the_timer() {
        let (manager, events) = get_manager();
        let giveaway = manager
            .create_giveaway(get_config(1, Duration::from_millis(150)))
            .await
            .unwrap();
        manager
            .register(giveaway.id(), get_participant(1), &everyone())
            .await
            .unwrap();

        let outcome = manager.end_giveaway(giveaway.id()).await.unwrap();
        assert_eq!(outcome, CloseOutcome::Closed(vec![UserId::new(1)]));

        // Wait long enough for the (possibly undisarmed) timer to fire.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(ended_announcements(&events).len(), 1);
    }

    #[tokio::test]
    async fn test_explicit_end_after_the_timer_is_a_noop() {
        let (manager, events) = get_manager();
        let giveaway = manager
            .create_giveaway(get_config(1, Duration::from_millis(100)))
            .await
            .unwrap();
        manager
            .register(giveaway.id(), get_participant(1), &everyone())
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;

        let outcome = manager.end_giveaway(giveaway.id()).await.unwrap();
        assert_eq!(outcome, CloseOutcome::NoOp);
        assert_eq!(ended_announcements(&events).len(), 1);
    }

    #[tokio::test]
    async fn test_reroll_before_the_end() {
        let (manager, _) = get_manager();
        let giveaway = manager
            .create_giveaway(get_config(1, Duration::from_secs(60)))
            .await
            .unwrap();

        let result = manager.reroll(giveaway.id()).await;
        assert_eq!(result, Err(Error::NotEnded));
    }

    #[tokio::test]
    async fn test_reroll_for_unknown_giveaway() {
        let (manager, _) = get_manager();

        let result = manager.reroll(Uuid::new_v4()).await;
        assert_eq!(result, Err(Error::NotFound));
    }

    #[tokio::test]
    async fn test_reroll_draws_fresh_winners_from_the_same_entries() {
        let (manager, events) = get_manager();
        let giveaway = manager
            .create_giveaway(get_config(1, Duration::from_secs(60)))
            .await
            .unwrap();
        manager
            .register(giveaway.id(), get_participant(1), &everyone())
            .await
            .unwrap();
        manager
            .register(giveaway.id(), get_participant(2), &everyone())
            .await
            .unwrap();

        let outcome = manager.end_giveaway(giveaway.id()).await.unwrap();
        let recorded = giveaway.winners();

        let mut seen = HashSet::new();
        for _ in 0..40 {
            let winners = manager.reroll(giveaway.id()).await.unwrap();
            assert_eq!(winners.len(), 1);
            assert_eq!(giveaway.entries_snapshot().contains(&winners[0]), true);
            seen.insert(winners[0]);
        }

        // Independent draws over two entrants: both must show up.
        assert_eq!(seen.len(), 2);
        // The close-time record is left untouched by rerolls.
        assert_eq!(CloseOutcome::Closed(giveaway.winners()), outcome);
        assert_eq!(giveaway.winners(), recorded);

        let rerolls = events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| matches!(event, NotifierEvent::Rerolled(_)))
            .count();
        assert_eq!(rerolls, 40);
    }

    #[tokio::test]
    async fn test_reroll_does_not_reapply_the_forced_override() {
        let (manager, _) = get_manager();
        let config = get_config(1, Duration::from_secs(60))
            .with_forced_winner(Some(UserId::new(999)));
        let giveaway = manager.create_giveaway(config).await.unwrap();
        manager
            .register(giveaway.id(), get_participant(1), &everyone())
            .await
            .unwrap();
        manager
            .register(giveaway.id(), get_participant(2), &everyone())
            .await
            .unwrap();

        let outcome = manager.end_giveaway(giveaway.id()).await.unwrap();
        assert_eq!(outcome, CloseOutcome::Closed(vec![UserId::new(999)]));

        for _ in 0..20 {
            let winners = manager.reroll(giveaway.id()).await.unwrap();
            assert_eq!(winners.len(), 1);
            // Rerolls draw from the real entrant pool.
            assert_eq!(winners[0] == UserId::new(999), false);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registers_produce_no_duplicates() {
        let (manager, _) = get_manager();
        let giveaway = manager
            .create_giveaway(get_config(1, Duration::from_secs(60)))
            .await
            .unwrap();

        // Every user registers twice, concurrently with everyone else.
        let mut tasks = Vec::new();
        for user_id in 1..=20 {
            for _ in 0..2 {
                let manager = manager.clone();
                let giveaway_id = giveaway.id();
                tasks.push(tokio::spawn(async move {
                    manager
                        .register(giveaway_id, get_participant(user_id), &everyone())
                        .await
                }));
            }
        }

        let mut accepted = 0;
        let mut duplicates = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(Error::AlreadyEntered) => duplicates += 1,
                Err(err) => panic!("unexpected registration error: {}", err),
            }
        }

        assert_eq!(accepted, 20);
        assert_eq!(duplicates, 20);
        assert_eq!(giveaway.entry_count(), 20);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_close_calls_pick_a_single_winner_set() {
        let (manager, events) = get_manager();
        let giveaway = manager
            .create_giveaway(get_config(1, Duration::from_secs(60)))
            .await
            .unwrap();
        manager
            .register(giveaway.id(), get_participant(1), &everyone())
            .await
            .unwrap();
        manager
            .register(giveaway.id(), get_participant(2), &everyone())
            .await
            .unwrap();

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let manager = manager.clone();
            let giveaway_id = giveaway.id();
            tasks.push(tokio::spawn(
                async move { manager.end_giveaway(giveaway_id).await },
            ));
        }

        let mut closed = 0;
        let mut noops = 0;
        for task in tasks {
            match task.await.unwrap().unwrap() {
                CloseOutcome::Closed(winners) => {
                    assert_eq!(winners, giveaway.winners());
                    closed += 1;
                }
                CloseOutcome::NoOp => noops += 1,
            }
        }

        assert_eq!(closed, 1);
        assert_eq!(noops, 7);
        assert_eq!(ended_announcements(&events).len(), 1);
    }
}
