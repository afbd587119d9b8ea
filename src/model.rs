use serde::{Deserialize, Serialize};

pub(crate) const STORAGE_KEY: &str = "beannie-tchi-state";
pub(crate) const DEFAULT_NAME: &str = "Beannie-tchi";
pub(crate) const STAT_MAX: i32 = 100;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) enum Action {
    // older saves wrote the fresh-pet action in lowercase
    #[default]
    #[serde(alias = "idle")]
    Idle,
    Hungry,
    Sleep,
    Eat,
    Play,
}

impl Action {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Action::Idle => "Idle",
            Action::Hungry => "Hungry",
            Action::Sleep => "Sleep",
            Action::Eat => "Eat",
            Action::Play => "Play",
        }
    }
}

/// The pet as persisted. `sleep`, `age`, `is_asleep` and `is_dead` are carried
/// through saves but no rule reads or writes them.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PetState {
    pub(crate) name: String,
    pub(crate) hunger: i32,
    pub(crate) happiness: i32,
    pub(crate) sleep: i32,
    pub(crate) age: u32,
    pub(crate) is_asleep: bool,
    pub(crate) is_dead: bool,
    pub(crate) action: Action,
}

impl PetState {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            hunger: STAT_MAX,
            happiness: STAT_MAX,
            sleep: STAT_MAX,
            age: 0,
            is_asleep: false,
            is_dead: false,
            action: Action::Idle,
        }
    }

    pub(crate) fn clamp_stats(&mut self) {
        self.hunger = self.hunger.clamp(0, STAT_MAX);
        self.happiness = self.happiness.clamp(0, STAT_MAX);
    }
}

impl Default for PetState {
    fn default() -> Self {
        Self::new(DEFAULT_NAME)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct PersistedRecord {
    pub(crate) state: PetState,
    /// Epoch milliseconds at the moment of the write.
    pub(crate) timestamp: i64,
}

#[derive(Clone, Debug)]
pub(crate) struct Rules {
    pub(crate) hunger_interval_ms: i64,
    pub(crate) happiness_interval_ms: i64,
    pub(crate) action_duration_ms: i64,
    pub(crate) clock_sample_ms: i64,
    /// Longest stretch of missed timer firings replayed after a clock jump.
    pub(crate) max_replay_ms: i64,
    pub(crate) hungry_threshold: i32,
    pub(crate) night_start_hour: u32, // inclusive
    pub(crate) night_end_hour: u32,   // exclusive, next morning
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            hunger_interval_ms: 180_000,
            happiness_interval_ms: 300_000,
            action_duration_ms: 5_000,
            clock_sample_ms: 1_000,
            max_replay_ms: 7 * 24 * 3_600_000,
            hungry_threshold: 75,
            night_start_hour: 20,
            night_end_hour: 6,
        }
    }
}

impl Rules {
    pub(crate) fn is_night(&self, hour: u32) -> bool {
        hour >= self.night_start_hour || hour < self.night_end_hour
    }
}
