//! Reusable generational barrier with a leader action.
//!
//! `std::sync::Barrier` elects a leader but gives it no way to run code while
//! the other participants are still parked. [`RoundBarrier`] owns a completion
//! action and runs it on the last arriving thread, under the barrier lock,
//! before any participant of that round is released. Everything every
//! participant did before [`wait`](RoundBarrier::wait) therefore happens before
//! the action, and the action happens before anything a participant does after
//! returning from `wait`.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

struct RoundState<F> {
    arrived: usize,
    generation: u64,
    action: F,
}

/// Barrier for a fixed number of participants that runs `action` exactly once per round.
pub struct RoundBarrier<F> {
    parties: usize,
    state: Mutex<RoundState<F>>,
    released: Condvar,
}

impl<F: FnMut()> RoundBarrier<F> {
    /// Creates a barrier for `parties` participants.
    ///
    /// # Panics
    ///
    /// Panics if `parties` is zero.
    pub fn new(parties: usize, action: F) -> Self {
        assert!(parties > 0, "a barrier needs at least one participant");
        Self {
            parties,
            state: Mutex::new(RoundState {
                arrived: 0,
                generation: 0,
                action,
            }),
            released: Condvar::new(),
        }
    }

    /// Number of participants per round.
    pub fn parties(&self) -> usize {
        self.parties
    }

    /// Blocks until every participant has arrived for the current round.
    ///
    /// The last thread to arrive runs the action and returns `true`; every
    /// other participant returns `false` once the action has finished.
    pub fn wait(&self) -> bool {
        let mut guard = self.lock();
        let generation = guard.generation;
        guard.arrived += 1;

        if guard.arrived == self.parties {
            let state = &mut *guard;
            (state.action)();
            state.arrived = 0;
            state.generation = state.generation.wrapping_add(1);
            self.released.notify_all();
            return true;
        }

        while guard.generation == generation {
            guard = self
                .released
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
        false
    }

    /// Number of completed rounds.
    pub fn rounds(&self) -> u64 {
        self.lock().generation
    }

    fn lock(&self) -> MutexGuard<'_, RoundState<F>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use super::*;

    #[test]
    fn single_party_runs_action_every_wait() {
        let mut count = 0;
        let barrier = RoundBarrier::new(1, || count += 1);
        assert!(barrier.wait());
        assert!(barrier.wait());
        assert_eq!(barrier.rounds(), 2);
        drop(barrier);
        assert_eq!(count, 2);
    }

    #[test]
    fn action_runs_once_per_round_after_all_arrivals() {
        const PARTIES: usize = 4;
        const ROUNDS: usize = 50;

        let arrivals = AtomicUsize::new(0);
        let mut observed = Vec::new();
        let barrier = RoundBarrier::new(PARTIES, || {
            observed.push(arrivals.load(Ordering::SeqCst));
        });

        let leaders = AtomicUsize::new(0);
        thread::scope(|scope| {
            for _ in 0..PARTIES {
                scope.spawn(|| {
                    for _ in 0..ROUNDS {
                        arrivals.fetch_add(1, Ordering::SeqCst);
                        if barrier.wait() {
                            leaders.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                });
            }
        });

        assert_eq!(leaders.load(Ordering::SeqCst), ROUNDS);
        assert_eq!(barrier.rounds(), ROUNDS as u64);
        drop(barrier);
        // Every action saw exactly the arrivals of its own round and all earlier ones.
        let expected: Vec<usize> = (1..=ROUNDS).map(|round| round * PARTIES).collect();
        assert_eq!(observed, expected);
    }
}
