use crate::model::{Action, PetState, Rules, STAT_MAX};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PlayerAction {
    Feed,
    Play,
}

impl PlayerAction {
    /// The stat this action refills.
    pub(crate) fn stat(self, st: &PetState) -> i32 {
        match self {
            PlayerAction::Feed => st.hunger,
            PlayerAction::Play => st.happiness,
        }
    }

    /// Shown for the whole action duration.
    pub(crate) fn busy_action(self) -> Action {
        match self {
            PlayerAction::Feed => Action::Eat,
            PlayerAction::Play => Action::Play,
        }
    }

    pub(crate) fn complete(self, st: &mut PetState) {
        match self {
            PlayerAction::Feed => st.hunger = STAT_MAX,
            PlayerAction::Play => st.happiness = STAT_MAX,
        }
        st.action = Action::Idle;
    }
}

impl PetState {
    pub(crate) fn decay_hunger(&mut self) {
        self.hunger = (self.hunger - 1).max(0);
    }

    pub(crate) fn decay_happiness(&mut self) {
        self.happiness = (self.happiness - 1).max(0);
    }
}

/// Night beats hunger: a hungry pet still falls asleep.
pub(crate) fn sleep_watch(hour: u32, rules: &Rules) -> Option<Action> {
    rules.is_night(hour).then_some(Action::Sleep)
}

pub(crate) fn hunger_watch(hunger: i32, hour: u32, rules: &Rules) -> Option<Action> {
    if hunger <= rules.hungry_threshold && !rules.is_night(hour) {
        Some(Action::Hungry)
    } else {
        None
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct CatchupSummary {
    pub(crate) elapsed_ms: i64,
    pub(crate) hunger_lost: i32,
    pub(crate) happiness_lost: i32,
}

/// Applies the decay the pet would have suffered while nothing was running.
/// One point of hunger per full hunger interval, one point of happiness per
/// full happiness interval. A clock that went backwards counts as no time.
pub(crate) fn catch_up(
    state: &mut PetState,
    last_seen_ms: i64,
    now_ms: i64,
    rules: &Rules,
) -> CatchupSummary {
    let elapsed_ms = now_ms.saturating_sub(last_seen_ms).max(0);
    let hunger_decay = elapsed_ms / rules.hunger_interval_ms.max(1);
    let happiness_decay = elapsed_ms / rules.happiness_interval_ms.max(1);

    let before = (state.hunger, state.happiness);
    state.hunger = (state.hunger as i64 - hunger_decay).max(0) as i32;
    state.happiness = (state.happiness as i64 - happiness_decay).max(0) as i32;
    state.clamp_stats();

    CatchupSummary {
        elapsed_ms,
        hunger_lost: before.0 - state.hunger,
        happiness_lost: before.1 - state.happiness,
    }
}
