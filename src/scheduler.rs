use crate::sim::PlayerAction;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct TimerId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TimerKind {
    HungerDecay,
    HappinessDecay,
    ClockSample,
    ActionDone(PlayerAction),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Fired {
    pub(crate) kind: TimerKind,
    /// The instant the timer was due, not the instant it was noticed.
    pub(crate) at: i64,
}

struct Timer {
    kind: TimerKind,
    period: Option<i64>,
    coalesce: bool,
}

/// Discrete timer queue on a caller-supplied millisecond timeline.
///
/// Timers never pause. Cancelling drops a timer together with whatever part
/// of its interval had already elapsed; a replacement starts from zero.
#[derive(Default)]
pub(crate) struct Scheduler {
    next_id: u64,
    queue: BinaryHeap<Reverse<(i64, u64)>>,
    live: HashMap<u64, Timer>,
}

impl Scheduler {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Repeating timer, first due one period after `start_ms`.
    pub(crate) fn every(&mut self, start_ms: i64, period_ms: i64, kind: TimerKind) -> TimerId {
        let period = period_ms.max(1);
        self.insert(start_ms + period, Some(period), false, kind)
    }

    /// Repeating timer that does not report a backlog. When several of its
    /// firings are overdue at once, only the latest one that still comes
    /// before the next other timer is delivered.
    pub(crate) fn every_latest(
        &mut self,
        start_ms: i64,
        period_ms: i64,
        kind: TimerKind,
    ) -> TimerId {
        let period = period_ms.max(1);
        self.insert(start_ms + period, Some(period), true, kind)
    }

    /// One-shot timer.
    pub(crate) fn after(&mut self, start_ms: i64, delay_ms: i64, kind: TimerKind) -> TimerId {
        self.insert(start_ms + delay_ms.max(0), None, false, kind)
    }

    fn insert(
        &mut self,
        due: i64,
        period: Option<i64>,
        coalesce: bool,
        kind: TimerKind,
    ) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(
            id,
            Timer {
                kind,
                period,
                coalesce,
            },
        );
        self.queue.push(Reverse((due, id)));
        TimerId(id)
    }

    pub(crate) fn cancel(&mut self, id: TimerId) -> bool {
        self.live.remove(&id.0).is_some()
    }

    /// Moves every pending timer `delta_ms` later.
    pub(crate) fn postpone(&mut self, delta_ms: i64) {
        self.queue = self
            .queue
            .drain()
            .map(|Reverse((due, id))| Reverse((due + delta_ms, id)))
            .collect();
    }

    /// Pops the earliest timer due at or before `now_ms`. Ties go to the
    /// timer created first. Repeating timers are re-armed one period after
    /// the firing they report, so a large jump yields every missed firing in
    /// order, except the skipped ones of an [`every_latest`] timer.
    ///
    /// [`every_latest`]: Scheduler::every_latest
    pub(crate) fn pop_due(&mut self, now_ms: i64) -> Option<Fired> {
        while let Some(&Reverse((due, id))) = self.queue.peek() {
            if due > now_ms {
                return None;
            }
            self.queue.pop();

            let Some(timer) = self.live.get(&id) else {
                // cancelled
                continue;
            };
            let (kind, period, coalesce) = (timer.kind, timer.period, timer.coalesce);
            let mut at = due;
            match period {
                Some(period) => {
                    if coalesce {
                        let limit = match self.peek_live() {
                            // an older timer due at the same instant goes first
                            Some((next, next_id)) if next_id < id => (next - 1).min(now_ms),
                            Some((next, _)) => next.min(now_ms),
                            None => now_ms,
                        };
                        at += (limit - due).max(0) / period * period;
                    }
                    self.queue.push(Reverse((at + period, id)));
                }
                None => {
                    self.live.remove(&id);
                }
            }
            return Some(Fired { kind, at });
        }
        None
    }

    /// Earliest live entry, dropping cancelled ones on the way.
    fn peek_live(&mut self) -> Option<(i64, u64)> {
        while let Some(&Reverse((due, id))) = self.queue.peek() {
            if self.live.contains_key(&id) {
                return Some((due, id));
            }
            self.queue.pop();
        }
        None
    }
}
