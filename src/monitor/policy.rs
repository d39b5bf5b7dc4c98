// src/monitor/policy.rs

//! Pure timeout-with-grace-period policy.
//!
//! Given a snapshot of what the monitor has observed about one worker, decide
//! the next transition. No processes, clocks or files are touched here.

use std::time::{Duration, Instant};

use crate::exec::WorkerState;

/// What the monitor knows about one worker at a single poll tick.
#[derive(Debug, Clone, Copy)]
pub struct PollView {
    pub state: WorkerState,
    /// `Some(exit_code)` if the process has ended on its own.
    pub exited: Option<Option<i32>>,
    pub age: Duration,
    pub timeout: Duration,
    pub signature_seen: bool,
    pub grace_deadline: Option<Instant>,
    pub now: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stay,
    Exited { exit_code: Option<i32> },
    /// `deadline` is `None` when `now + grace` is not representable; such a
    /// grace window never runs out.
    EnterGrace { deadline: Option<Instant> },
    Terminate,
}

/// Decide what happens to a worker on this tick.
///
/// - A natural exit always wins, including during the grace window.
/// - At `age >= timeout`, a worker that has shown its signature gets
///   `grace` more time; any other worker is terminated.
/// - A worker in its grace window is terminated once the deadline passes.
pub fn next_transition(view: &PollView, grace: Duration) -> Transition {
    if view.state.is_terminal() {
        return Transition::Stay;
    }

    if let Some(exit_code) = view.exited {
        return Transition::Exited { exit_code };
    }

    match view.state {
        WorkerState::GracePeriod => match view.grace_deadline {
            Some(deadline) if view.now >= deadline => Transition::Terminate,
            _ => Transition::Stay,
        },
        WorkerState::Running | WorkerState::SucceededSignal if view.age >= view.timeout => {
            if view.signature_seen && !grace.is_zero() {
                Transition::EnterGrace {
                    deadline: view.now.checked_add(grace),
                }
            } else {
                Transition::Terminate
            }
        }
        _ => Transition::Stay,
    }
}
