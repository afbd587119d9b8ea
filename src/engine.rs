use crate::clock::Clock;
use crate::images::resolve_image_seeded;
use crate::model::{PetState, Rules, STAT_MAX};
use crate::scheduler::{Fired, Scheduler, TimerId, TimerKind};
use crate::sim::{hunger_watch, sleep_watch, PlayerAction};
use crate::sound::Sound;
use crate::storage::{load_or_init, save_record, KeyValueStore};
use rand::rngs::StdRng;
use rand::Rng;

/// Owns the pet and every rule that changes it.
///
/// All mutations funnel through [`Engine::update`], which clamps the stats,
/// persists the new state, re-rolls the image when the action changed and
/// re-runs the hunger watcher when hunger changed. Timer callbacks are
/// scheduler events drained by [`Engine::advance`], each one handled at its
/// own due time.
pub(crate) struct Engine<C: Clock, S: KeyValueStore, A: Sound> {
    clock: C,
    store: S,
    sound: A,
    rules: Rules,
    rng: StdRng,
    state: PetState,
    in_progress: bool,
    scheduler: Scheduler,
    decay_timers: Option<[TimerId; 2]>,
    image: &'static str,
    last_advance: i64,
}

impl<C: Clock, S: KeyValueStore, A: Sound> Engine<C, S, A> {
    pub(crate) fn start(
        clock: C,
        store: S,
        sound: A,
        rules: Rules,
        mut rng: StdRng,
        fresh_name: &str,
    ) -> Self {
        let now = clock.now_ms();
        let (state, summary) = load_or_init(&store, now, &rules, fresh_name);
        if let Some(s) = summary {
            log::info!(
                "welcome back {}: away {}s, hunger -{}, happiness -{}",
                state.name,
                s.elapsed_ms / 1000,
                s.hunger_lost,
                s.happiness_lost
            );
        }
        let image = resolve_image_seeded(state.action, rng.gen());

        let mut engine = Self {
            clock,
            store,
            sound,
            rules,
            rng,
            state,
            in_progress: false,
            scheduler: Scheduler::new(),
            decay_timers: None,
            image,
            last_advance: now,
        };
        engine
            .scheduler
            .every_latest(now, engine.rules.clock_sample_ms, TimerKind::ClockSample);
        engine.restart_decay(now);
        engine.persist(now);
        engine.watch_time(now);
        engine.watch_hunger(now);
        engine
    }

    pub(crate) fn state(&self) -> &PetState {
        &self.state
    }

    pub(crate) fn image(&self) -> &'static str {
        self.image
    }

    pub(crate) fn in_progress(&self) -> bool {
        self.in_progress
    }

    pub(crate) fn feed(&mut self) -> bool {
        self.trigger(PlayerAction::Feed)
    }

    pub(crate) fn play(&mut self) -> bool {
        self.trigger(PlayerAction::Play)
    }

    /// Starts `action` unless one is already running or its stat is full.
    /// Returns whether anything happened.
    pub(crate) fn trigger(&mut self, action: PlayerAction) -> bool {
        self.advance();
        if self.in_progress || action.stat(&self.state) >= STAT_MAX {
            log::debug!("{action:?} ignored");
            return false;
        }

        let now = self.clock.now_ms();
        self.sound.play_click();
        self.set_in_progress(true, now);
        self.update(now, |st| st.action = action.busy_action());
        self.scheduler.after(
            now,
            self.rules.action_duration_ms,
            TimerKind::ActionDone(action),
        );
        log::info!("{action:?} started");
        true
    }

    /// Runs every timer due at the current clock reading, oldest first, and
    /// returns how many fired. Clock samples do not pile up, and a jump
    /// longer than `max_replay_ms` only replays its last `max_replay_ms`.
    pub(crate) fn advance(&mut self) -> usize {
        let now = self.clock.now_ms();
        let gap = now - self.last_advance;
        if gap > self.rules.max_replay_ms {
            log::warn!(
                "clock jumped {}s ahead, replaying only the last {}s",
                gap / 1000,
                self.rules.max_replay_ms / 1000
            );
            self.scheduler.postpone(gap - self.rules.max_replay_ms);
        }
        self.last_advance = now;

        let mut fired_count = 0;
        while let Some(fired) = self.scheduler.pop_due(now) {
            self.handle(fired);
            fired_count += 1;
        }
        fired_count
    }

    /// Writes the current state stamped with the current time.
    pub(crate) fn persist_now(&mut self) {
        let now = self.clock.now_ms();
        self.persist(now);
    }

    fn handle(&mut self, fired: Fired) {
        let at = fired.at;
        match fired.kind {
            TimerKind::HungerDecay => self.update(at, PetState::decay_hunger),
            TimerKind::HappinessDecay => self.update(at, PetState::decay_happiness),
            TimerKind::ClockSample => self.watch_time(at),
            TimerKind::ActionDone(action) => {
                self.set_in_progress(false, at);
                self.update(at, |st| action.complete(st));
                log::info!("{action:?} finished");
            }
        }
    }

    fn update(&mut self, at: i64, f: impl FnOnce(&mut PetState)) {
        let before = self.state.clone();
        f(&mut self.state);
        self.state.clamp_stats();
        if self.state == before {
            return;
        }

        if self.state.action != before.action {
            self.image = resolve_image_seeded(self.state.action, self.rng.gen());
            log::debug!(
                "action {} -> {} ({})",
                before.action.label(),
                self.state.action.label(),
                self.image
            );
        }
        self.persist(at);
        if self.state.hunger != before.hunger {
            self.watch_hunger(at);
        }
    }

    fn persist(&mut self, at: i64) {
        if let Err(e) = save_record(&mut self.store, &self.state, at) {
            log::error!("failed to save state: {e}");
        }
    }

    /// Decay timers only exist while no action runs. Any flip of the flag
    /// throws them away; clearing it starts fresh ones from `at`.
    fn set_in_progress(&mut self, flag: bool, at: i64) {
        if self.in_progress == flag {
            return;
        }
        self.in_progress = flag;
        if let Some(ids) = self.decay_timers.take() {
            for id in ids {
                self.scheduler.cancel(id);
            }
        }
        if !flag {
            self.restart_decay(at);
        }
    }

    fn restart_decay(&mut self, at: i64) {
        let hunger = self
            .scheduler
            .every(at, self.rules.hunger_interval_ms, TimerKind::HungerDecay);
        let happiness = self.scheduler.every(
            at,
            self.rules.happiness_interval_ms,
            TimerKind::HappinessDecay,
        );
        self.decay_timers = Some([hunger, happiness]);
    }

    fn watch_time(&mut self, at: i64) {
        if self.in_progress {
            return;
        }
        let hour = self.clock.local_hour(at);
        if let Some(action) = sleep_watch(hour, &self.rules) {
            self.update(at, |st| st.action = action);
        }
    }

    fn watch_hunger(&mut self, at: i64) {
        if self.in_progress {
            return;
        }
        let hour = self.clock.local_hour(at);
        if let Some(action) = hunger_watch(self.state.hunger, hour, &self.rules) {
            self.update(at, |st| st.action = action);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::images::{IDLE_IMAGES, SLEEP_IMAGES};
    use crate::model::{Action, PersistedRecord, STORAGE_KEY};
    use crate::sound::RecordingSound;
    use crate::storage::MemoryStore;
    use rand::SeedableRng;

    const T0: i64 = 1_700_000_000_000;
    const MINUTE: i64 = 60_000;
    const HOUR: i64 = 60 * MINUTE;
    const NOON: u32 = 12;

    type TestEngine = Engine<ManualClock, MemoryStore, RecordingSound>;

    struct Rig {
        engine: TestEngine,
        clock: ManualClock,
        store: MemoryStore,
        sound: RecordingSound,
    }

    impl Rig {
        fn new(saved: Option<(PetState, i64)>, hour: u32) -> Self {
            let clock = ManualClock::new(T0, hour);
            let mut store = MemoryStore::default();
            if let Some((st, at)) = saved {
                save_record(&mut store, &st, at).unwrap();
            }
            let sound = RecordingSound::default();
            let engine = Engine::start(
                clock.clone(),
                store.clone(),
                sound.clone(),
                Rules::default(),
                StdRng::seed_from_u64(7),
                "Beannie-tchi",
            );
            Self {
                engine,
                clock,
                store,
                sound,
            }
        }

        fn with_stats(hunger: i32, happiness: i32, hour: u32) -> Self {
            let mut st = PetState::default();
            st.hunger = hunger;
            st.happiness = happiness;
            Self::new(Some((st, T0)), hour)
        }

        fn wait(&mut self, ms: i64) {
            self.clock.advance(ms);
            self.engine.advance();
        }

        fn saved(&self) -> PersistedRecord {
            serde_json::from_str(&self.store.raw(STORAGE_KEY).unwrap()).unwrap()
        }

        /// Every record saved so far, as (action, timestamp).
        fn save_log(&self) -> Vec<(Action, i64)> {
            self.store
                .written(STORAGE_KEY)
                .iter()
                .map(|raw| {
                    let record: PersistedRecord = serde_json::from_str(raw).unwrap();
                    (record.state.action, record.timestamp)
                })
                .collect()
        }
    }

    #[test]
    fn fresh_start_is_idle_and_saved() {
        let rig = Rig::new(None, NOON);
        let st = rig.engine.state();
        assert_eq!(*st, PetState::default());
        assert!(IDLE_IMAGES.contains(&rig.engine.image()));
        assert_eq!(rig.saved().timestamp, T0);
        assert_eq!(rig.saved().state, *st);
    }

    #[test]
    fn feed_at_fifty() {
        let mut rig = Rig::with_stats(50, 100, NOON);
        assert_eq!(rig.engine.state().action, Action::Hungry);

        assert!(rig.engine.feed());
        assert_eq!(rig.engine.state().action, Action::Eat);
        assert_eq!(rig.engine.image(), "eating.png");
        assert_eq!(rig.sound.clicks(), 1);
        assert!(rig.engine.in_progress());

        rig.wait(4_999);
        assert_eq!(rig.engine.state().action, Action::Eat);
        assert_eq!(rig.engine.state().hunger, 50);

        rig.wait(1);
        assert_eq!(rig.engine.state().hunger, 100);
        assert_eq!(rig.engine.state().action, Action::Idle);
        assert!(!rig.engine.in_progress());
        assert_eq!(rig.saved().state.hunger, 100);
    }

    #[test]
    fn play_refills_happiness() {
        let mut rig = Rig::with_stats(90, 40, NOON);
        assert!(rig.engine.play());
        assert_eq!(rig.engine.state().action, Action::Play);
        assert!(["playing.png", "playing2.png"].contains(&rig.engine.image()));
        rig.wait(5_000);
        assert_eq!(rig.engine.state().happiness, 100);
        assert_eq!(rig.engine.state().hunger, 90);
        assert_eq!(rig.engine.state().action, Action::Idle);
    }

    #[test]
    fn feeding_a_full_pet_does_nothing() {
        let mut rig = Rig::with_stats(100, 60, NOON);
        let before = rig.engine.state().clone();
        let writes = rig.store.write_count();

        assert!(!rig.engine.feed());
        assert_eq!(*rig.engine.state(), before);
        assert_eq!(rig.sound.clicks(), 0);
        assert!(!rig.engine.in_progress());
        assert_eq!(rig.store.write_count(), writes);
    }

    #[test]
    fn second_trigger_while_busy_is_ignored() {
        let mut rig = Rig::with_stats(60, 60, NOON);
        assert!(rig.engine.feed());
        rig.wait(1_000);
        assert!(!rig.engine.play());
        assert!(!rig.engine.feed());
        assert_eq!(rig.sound.clicks(), 1);
        assert_eq!(rig.engine.state().action, Action::Eat);

        rig.wait(4_000);
        assert_eq!(rig.engine.state().happiness, 60);
        assert!(rig.engine.play());
    }

    #[test]
    fn reload_after_fifteen_minutes() {
        let rig = Rig::new(Some((PetState::default(), T0 - 15 * MINUTE)), NOON);
        assert_eq!(rig.engine.state().hunger, 95);
        assert_eq!(rig.engine.state().happiness, 97);
        assert_eq!(rig.engine.state().action, Action::Idle);
        assert_eq!(rig.saved().timestamp, T0);
    }

    #[test]
    fn reload_into_hunger_turns_hungry() {
        // 30 minutes: hunger 80 -> 70
        let mut st = PetState::default();
        st.hunger = 80;
        let rig = Rig::new(Some((st, T0 - 30 * MINUTE)), NOON);
        assert_eq!(rig.engine.state().hunger, 70);
        assert_eq!(rig.engine.state().action, Action::Hungry);
        assert_eq!(rig.engine.image(), "hungry.png");
    }

    #[test]
    fn corrupt_save_starts_fresh() {
        let clock = ManualClock::new(T0, NOON);
        let mut store = MemoryStore::default();
        store.set(STORAGE_KEY, "[1,2,").unwrap();
        let engine = Engine::start(
            clock,
            store.clone(),
            RecordingSound::default(),
            Rules::default(),
            StdRng::seed_from_u64(1),
            "Bean",
        );
        assert_eq!(*engine.state(), PetState::new("Bean"));
        let raw = store.raw(STORAGE_KEY).unwrap();
        let record: PersistedRecord = serde_json::from_str(&raw).unwrap();
        assert_eq!(record.state.name, "Bean");
    }

    #[test]
    fn night_puts_the_pet_to_sleep() {
        let rig = Rig::with_stats(90, 100, 22);
        assert_eq!(rig.engine.state().action, Action::Sleep);
        assert!(SLEEP_IMAGES.contains(&rig.engine.image()));
    }

    #[test]
    fn nightfall_is_noticed_within_a_second() {
        let mut rig = Rig::with_stats(90, 100, 19);
        assert_eq!(rig.engine.state().action, Action::Idle);
        rig.clock.set_hour(20);
        rig.wait(999);
        assert_eq!(rig.engine.state().action, Action::Idle);
        rig.wait(1);
        assert_eq!(rig.engine.state().action, Action::Sleep);
    }

    #[test]
    fn replay_across_nightfall_uses_each_firing_time() {
        // 19:00, one hunger tick away from the threshold
        let mut rig = Rig::with_stats(76, 100, 19);
        assert_eq!(rig.engine.state().action, Action::Idle);
        rig.wait(2 * HOUR);

        let saves = rig.save_log();
        let first = |action: Action| saves.iter().find(|(a, _)| *a == action).map(|(_, at)| *at);
        // the 19:03 tick still sees daytime
        assert_eq!(first(Action::Hungry), Some(T0 + 180_000));
        // the 20:00 sample is the first to see night
        assert_eq!(first(Action::Sleep), Some(T0 + HOUR));
        assert!(saves
            .iter()
            .filter(|(_, at)| *at >= T0 + HOUR)
            .all(|(a, _)| *a == Action::Sleep));
        assert_eq!(rig.engine.state().action, Action::Sleep);
        assert_eq!(rig.engine.state().hunger, 36);
    }

    #[test]
    fn long_clock_jump_replays_a_bounded_backlog() {
        let mut rig = Rig::new(None, NOON);
        let rules = Rules::default();
        rig.clock.advance(30 * 24 * HOUR);
        let fired = rig.engine.advance();

        // decay firings of the capped window plus at most one sample before each
        let decay = rules.max_replay_ms / rules.hunger_interval_ms
            + rules.max_replay_ms / rules.happiness_interval_ms;
        assert!(fired <= 2 * decay as usize + 1, "{fired} timers fired");
        assert!(rig.store.write_count() < 300);
        assert_eq!(rig.engine.state().hunger, 0);
        assert_eq!(rig.engine.state().happiness, 0);
        assert!(rig.saved().timestamp <= T0 + 30 * 24 * HOUR);

        // back to one sample per second afterwards
        rig.clock.advance(1_000);
        assert_eq!(rig.engine.advance(), 1);
    }

    #[test]
    fn sleep_beats_hunger() {
        let mut rig = Rig::with_stats(40, 100, 23);
        assert_eq!(rig.engine.state().action, Action::Sleep);
        // a hunger tick at night must not wake it up hungry
        rig.wait(180_000);
        assert_eq!(rig.engine.state().hunger, 39);
        assert_eq!(rig.engine.state().action, Action::Sleep);
    }

    #[test]
    fn morning_does_not_clear_sleep() {
        let mut rig = Rig::with_stats(90, 100, 5);
        assert_eq!(rig.engine.state().action, Action::Sleep);
        rig.clock.set_hour(6);
        rig.wait(10_000);
        assert_eq!(rig.engine.state().action, Action::Sleep);
    }

    #[test]
    fn action_suppresses_watchers() {
        let mut rig = Rig::with_stats(80, 100, NOON);
        assert!(rig.engine.feed());
        rig.clock.set_hour(22);
        rig.wait(4_000);
        assert_eq!(rig.engine.state().action, Action::Eat);

        // the clock sample due at the same instant runs first and is ignored
        rig.wait(1_000);
        assert_eq!(rig.engine.state().action, Action::Idle);
        rig.wait(1_000);
        assert_eq!(rig.engine.state().action, Action::Sleep);
    }

    #[test]
    fn stats_decay_on_schedule() {
        let mut rig = Rig::new(None, NOON);
        rig.wait(179_999);
        assert_eq!(rig.engine.state().hunger, 100);
        rig.wait(1);
        assert_eq!(rig.engine.state().hunger, 99);
        assert_eq!(rig.saved().timestamp, T0 + 180_000);
        rig.wait(120_000);
        assert_eq!(rig.engine.state().hunger, 99);
        assert_eq!(rig.engine.state().happiness, 99);
        assert_eq!(rig.engine.state().action, Action::Idle);
    }

    #[test]
    fn long_decay_makes_the_pet_hungry() {
        let mut rig = Rig::new(None, NOON);
        rig.wait(24 * 180_000);
        assert_eq!(rig.engine.state().hunger, 76);
        assert_eq!(rig.engine.state().action, Action::Idle);
        rig.wait(180_000);
        assert_eq!(rig.engine.state().hunger, 75);
        assert_eq!(rig.engine.state().action, Action::Hungry);
    }

    #[test]
    fn no_decay_during_an_action_and_timers_restart_after() {
        let mut rig = Rig::with_stats(100, 90, NOON);
        rig.wait(170_000);
        assert!(rig.engine.play());
        rig.wait(5_000);
        assert_eq!(rig.engine.state().action, Action::Idle);

        // old timer would have fired at 180s; the new one counts from 175s
        rig.wait(179_999);
        assert_eq!(rig.engine.state().hunger, 100);
        rig.wait(1);
        assert_eq!(rig.engine.state().hunger, 99);
    }

    #[test]
    fn image_is_stable_while_action_is_unchanged() {
        let mut rig = Rig::new(None, NOON);
        let first = rig.engine.image();
        for _ in 0..30 {
            rig.wait(1_000);
            assert_eq!(rig.engine.image(), first);
        }
    }

    #[test]
    fn quiet_ticks_do_not_write() {
        let mut rig = Rig::with_stats(90, 100, 22);
        let writes = rig.store.write_count();
        rig.wait(60_000);
        assert_eq!(rig.store.write_count(), writes);
    }

    #[test]
    fn persist_now_stamps_current_time() {
        let mut rig = Rig::new(None, NOON);
        rig.clock.advance(42_000);
        rig.engine.persist_now();
        assert_eq!(rig.saved().timestamp, T0 + 42_000);
    }

    #[test]
    fn stats_stay_in_range_under_random_play() {
        let mut rig = Rig::with_stats(3, 2, NOON);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..2_000 {
            match rng.gen_range(0..4) {
                0 => {
                    rig.engine.feed();
                }
                1 => {
                    rig.engine.play();
                }
                _ => rig.wait(rng.gen_range(0..400_000)),
            }
            let st = rig.engine.state();
            assert!((0..=100).contains(&st.hunger));
            assert!((0..=100).contains(&st.happiness));
            if rig.engine.in_progress() {
                assert!(matches!(st.action, Action::Eat | Action::Play));
            }
        }
    }
}
