// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The trigger state machine (spec §4.4) — a pure module. Nothing here
//! touches storage; `schedstore-engine`'s storage managers and fire manager
//! call `transition` and translate the result into conditional repository
//! updates (compare-and-set on `old_state`).

use serde::{Deserialize, Serialize};

/// Trigger lifecycle states (spec §3). The source calls `Executing`
/// "Blocked" — spec §9 prefers `Executing` externally to avoid confusion
/// with the distributed locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerState {
    Waiting,
    Acquired,
    Executing,
    Paused,
    PausedBlocked,
    Complete,
    Error,
    Deleted,
}

crate::simple_display! {
    TriggerState {
        Waiting => "waiting",
        Acquired => "acquired",
        Executing => "executing",
        Paused => "paused",
        PausedBlocked => "paused_blocked",
        Complete => "complete",
        Error => "error",
        Deleted => "deleted",
    }
}

/// What to do with a trigger when `TriggeredJobComplete` is called
/// (spec §4.4, §4.6.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionInstruction {
    Delete,
    SetComplete,
    SetError,
    SetAllGroupComplete,
    /// No explicit instruction: `Executing -> Waiting`.
    Default,
}

/// Events the state machine accepts. `Store` carries the two policy bits
/// that override the otherwise-Waiting initial state (spec §4.4 row 1):
/// whether the enclosing job is currently blocked by a concurrent,
/// non-reentrant execution, and whether the trigger's group is paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEvent {
    Store { job_is_blocked: bool, group_is_paused: bool },
    Acquire,
    Release,
    Fire,
    Pause,
    Resume,
    Complete(CompletionInstruction),
    /// The misfire sweep detected this trigger missed its window
    /// (spec §4.6.5); `has_next_fire` reflects whether the recomputed
    /// `next_fire_time` is `Some` (stay `Waiting`) or `None` (-> `Complete`).
    Misfire { has_next_fire: bool },
    ResetFromError,
}

/// A transition was attempted from a state that doesn't permit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal transition: {event:?} from {from:?}")]
pub struct IllegalTransition {
    pub from: TriggerState,
    pub event: TransitionEventKind,
}

/// `TransitionEvent` without its payload, for error reporting (so
/// `IllegalTransition` can derive `PartialEq`/`Eq` without requiring
/// `CompletionInstruction`/bools to matter for equality of the error site).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEventKind {
    Store,
    Acquire,
    Release,
    Fire,
    Pause,
    Resume,
    Complete,
    Misfire,
    ResetFromError,
}

impl TransitionEvent {
    fn kind(&self) -> TransitionEventKind {
        match self {
            TransitionEvent::Store { .. } => TransitionEventKind::Store,
            TransitionEvent::Acquire => TransitionEventKind::Acquire,
            TransitionEvent::Release => TransitionEventKind::Release,
            TransitionEvent::Fire => TransitionEventKind::Fire,
            TransitionEvent::Pause => TransitionEventKind::Pause,
            TransitionEvent::Resume => TransitionEventKind::Resume,
            TransitionEvent::Complete(_) => TransitionEventKind::Complete,
            TransitionEvent::Misfire { .. } => TransitionEventKind::Misfire,
            TransitionEvent::ResetFromError => TransitionEventKind::ResetFromError,
        }
    }
}

/// The authoritative transition table (spec §4.4). Pure: given a current
/// state and an event, returns the new state or rejects.
///
/// `SetAllGroupComplete` is the one event whose legality doesn't depend on
/// `current` at all ("any in group" per the spec table) — callers apply it
/// to every trigger in a group without consulting this function per-trigger
/// beyond excluding already-terminal (`Deleted`) rows, which the repository
/// layer does by construction (deleted rows don't exist to update).
pub fn transition(current: TriggerState, event: TransitionEvent) -> Result<TriggerState, IllegalTransition> {
    use TriggerState::*;

    let illegal = || IllegalTransition { from: current, event: event.kind() };

    match event {
        TransitionEvent::Store { job_is_blocked, group_is_paused } => {
            if group_is_paused {
                Ok(Paused)
            } else if job_is_blocked {
                Ok(PausedBlocked)
            } else {
                Ok(Waiting)
            }
        }
        TransitionEvent::Acquire => match current {
            Waiting => Ok(Acquired),
            _ => Err(illegal()),
        },
        TransitionEvent::Release => match current {
            Acquired => Ok(Waiting),
            _ => Err(illegal()),
        },
        TransitionEvent::Fire => match current {
            Acquired => Ok(Executing),
            _ => Err(illegal()),
        },
        TransitionEvent::Pause => match current {
            Waiting | Acquired => Ok(Paused),
            Executing => Ok(PausedBlocked),
            _ => Err(illegal()),
        },
        TransitionEvent::Resume => match current {
            Paused => Ok(Waiting),
            // NOT back to Waiting — PausedBlocked preserves the "job is
            // currently executing" signal (spec §4.4 table, §9 design note).
            PausedBlocked => Ok(Executing),
            _ => Err(illegal()),
        },
        TransitionEvent::Complete(instruction) => match (current, instruction) {
            (Executing, CompletionInstruction::Delete) => Ok(Deleted),
            (Executing, CompletionInstruction::SetComplete) => Ok(Complete),
            (Executing, CompletionInstruction::SetError) => Ok(Error),
            (Executing, CompletionInstruction::Default) => Ok(Waiting),
            (_, CompletionInstruction::SetAllGroupComplete) => Ok(Complete),
            _ => Err(illegal()),
        },
        TransitionEvent::Misfire { has_next_fire } => match current {
            Waiting => Ok(if has_next_fire { Waiting } else { Complete }),
            Paused => Ok(if has_next_fire { Paused } else { Complete }),
            PausedBlocked => Ok(if has_next_fire { PausedBlocked } else { Complete }),
            _ => Err(illegal()),
        },
        TransitionEvent::ResetFromError => match current {
            Error => Ok(Waiting),
            _ => Err(illegal()),
        },
    }
}

#[cfg(test)]
#[path = "state_machine_tests.rs"]
mod tests;
