//! Game phase state machine
//!
//! Gates when a trajectory may be attached and played back. Every transition
//! reads the current state and context and builds a complete replacement, so a
//! renderer holding an old `GameMachine` keeps seeing a consistent snapshot.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::prize::{Prize, PrizeError, PrizeSelection};
use crate::sim::{DropZone, Outcome, Trajectory, TrajectoryPoint};

/// Game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    #[default]
    Idle,
    /// Prize chosen, waiting for the player
    Ready,
    /// Player is picking a drop zone
    SelectingPosition,
    Countdown,
    /// Trajectory playback in progress
    Dropping,
    Landed,
    Revealed,
    Claimed,
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameState::Idle => "idle",
            GameState::Ready => "ready",
            GameState::SelectingPosition => "selecting_position",
            GameState::Countdown => "countdown",
            GameState::Dropping => "dropping",
            GameState::Landed => "landed",
            GameState::Revealed => "revealed",
            GameState::Claimed => "claimed",
        };
        f.write_str(name)
    }
}

/// Events fed to the machine by UI glue
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Attach the prize draw, and optionally a precomputed drop
    Initialize {
        selection: PrizeSelection,
        prize: Option<Prize>,
        outcome: Option<Outcome>,
    },
    ShowPositionSelection,
    /// Drop zone chosen along with the drop computed for it
    SelectPosition { zone: DropZone, outcome: Outcome },
    DropBall,
    CountdownComplete,
    /// Advance the playback cursor one frame
    AdvanceFrame,
    LandingComplete,
    Reveal,
    Claim,
    Reset,
}

impl GameEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::Initialize { .. } => "initialize",
            GameEvent::ShowPositionSelection => "show_position_selection",
            GameEvent::SelectPosition { .. } => "select_position",
            GameEvent::DropBall => "drop_ball",
            GameEvent::CountdownComplete => "countdown_complete",
            GameEvent::AdvanceFrame => "advance_frame",
            GameEvent::LandingComplete => "landing_complete",
            GameEvent::Reveal => "reveal",
            GameEvent::Claim => "claim",
            GameEvent::Reset => "reset",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TransitionError {
    #[error("event '{event}' is not accepted in state '{state}'")]
    Illegal {
        state: GameState,
        event: &'static str,
    },
    #[error("invalid prize selection: {0}")]
    InvalidSelection(#[from] PrizeError),
    #[error("landed slot {slot} is out of range ({slot_count} slots)")]
    SlotOutOfRange { slot: usize, slot_count: usize },
    #[error("no trajectory attached; cannot drop")]
    MissingTrajectory,
}

/// Data carried alongside the state
///
/// Never mutated in place; transitions clone and replace it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameContext {
    pub selected_index: usize,
    pub prize: Option<Prize>,
    pub seed: u64,
    pub prize_count: usize,
    pub trajectory: Option<Arc<Trajectory>>,
    pub landed_slot: Option<usize>,
    pub drop_zone: Option<DropZone>,
    /// Playback cursor into `trajectory`
    pub current_frame: usize,
}

impl GameContext {
    fn with_outcome(mut self, outcome: Outcome) -> Result<Self, TransitionError> {
        if outcome.landed_slot >= self.prize_count {
            return Err(TransitionError::SlotOutOfRange {
                slot: outcome.landed_slot,
                slot_count: self.prize_count,
            });
        }
        self.landed_slot = Some(outcome.landed_slot);
        self.trajectory = Some(Arc::new(outcome.trajectory));
        self.current_frame = 0;
        Ok(self)
    }

    fn last_frame(&self) -> usize {
        self.trajectory
            .as_ref()
            .map_or(0, |t| t.len().saturating_sub(1))
    }
}

/// State plus shared, immutable context
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameMachine {
    state: GameState,
    context: Arc<GameContext>,
}

impl GameMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn context(&self) -> &Arc<GameContext> {
        &self.context
    }

    /// Trajectory point under the playback cursor
    pub fn current_point(&self) -> Option<&TrajectoryPoint> {
        self.context
            .trajectory
            .as_ref()
            .and_then(|t| t.point(self.context.current_frame))
    }

    /// Whether playback has reached the final frame
    pub fn playback_finished(&self) -> bool {
        self.context.trajectory.is_some() && self.context.current_frame >= self.context.last_frame()
    }

    /// Compute the machine that results from `event`, leaving `self` untouched
    pub fn transition(&self, event: GameEvent) -> Result<GameMachine, TransitionError> {
        let event_name = event.name();
        let (state, context) = match (self.state, event) {
            (_, GameEvent::Reset) => (GameState::Idle, Arc::new(GameContext::default())),

            (
                GameState::Idle,
                GameEvent::Initialize {
                    selection,
                    prize,
                    outcome,
                },
            ) => {
                selection.validate()?;
                let mut context = GameContext {
                    selected_index: selection.winning_index,
                    prize,
                    seed: selection.seed,
                    prize_count: selection.prize_count,
                    ..Default::default()
                };
                if let Some(outcome) = outcome {
                    context = context.with_outcome(outcome)?;
                }
                (GameState::Ready, Arc::new(context))
            }

            (GameState::Ready, GameEvent::ShowPositionSelection) => {
                (GameState::SelectingPosition, self.context.clone())
            }

            (GameState::SelectingPosition, GameEvent::SelectPosition { zone, outcome }) => {
                let mut context = (*self.context).clone().with_outcome(outcome)?;
                context.drop_zone = Some(zone);
                (GameState::Countdown, Arc::new(context))
            }

            (GameState::Ready, GameEvent::DropBall) => {
                if self.context.trajectory.is_none() {
                    return Err(TransitionError::MissingTrajectory);
                }
                (GameState::Countdown, self.context.clone())
            }

            (GameState::Countdown, GameEvent::CountdownComplete) => {
                let context = GameContext {
                    current_frame: 0,
                    ..(*self.context).clone()
                };
                (GameState::Dropping, Arc::new(context))
            }

            (GameState::Dropping, GameEvent::AdvanceFrame) => {
                let last = self.context.last_frame();
                let context = GameContext {
                    current_frame: (self.context.current_frame + 1).min(last),
                    ..(*self.context).clone()
                };
                (GameState::Dropping, Arc::new(context))
            }

            (GameState::Dropping, GameEvent::LandingComplete) => {
                let context = GameContext {
                    current_frame: self.context.last_frame(),
                    ..(*self.context).clone()
                };
                (GameState::Landed, Arc::new(context))
            }

            (GameState::Landed, GameEvent::Reveal) => (GameState::Revealed, self.context.clone()),
            (GameState::Revealed, GameEvent::Claim) => (GameState::Claimed, self.context.clone()),

            (state, _) => {
                log::error!("Rejected event '{}' in state '{}'", event_name, state);
                return Err(TransitionError::Illegal {
                    state,
                    event: event_name,
                });
            }
        };

        if state != self.state {
            log::debug!("Game: {} -> {} ({})", self.state, state, event_name);
        }
        Ok(GameMachine { state, context })
    }

    /// Apply `event` in place; on error the machine is unchanged
    pub fn send(&mut self, event: GameEvent) -> Result<GameState, TransitionError> {
        *self = self.transition(event)?;
        Ok(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::EngineSettings;
    use crate::sim::OutcomeSearch;

    fn outcome(target: usize) -> Outcome {
        let engine = OutcomeSearch::new(&EngineSettings::default()).unwrap();
        engine.search(target, 5).unwrap()
    }

    fn initialized(target: usize) -> GameMachine {
        let mut machine = GameMachine::new();
        machine
            .send(GameEvent::Initialize {
                selection: PrizeSelection::new(target, 5, 7),
                prize: Some(Prize::new("gold", "Gold")),
                outcome: Some(outcome(target)),
            })
            .unwrap();
        machine
    }

    #[test]
    fn test_full_game_flow() {
        let mut machine = initialized(2);
        assert_eq!(machine.state(), GameState::Ready);
        assert_eq!(machine.send(GameEvent::DropBall), Ok(GameState::Countdown));
        assert_eq!(machine.send(GameEvent::CountdownComplete), Ok(GameState::Dropping));

        while !machine.playback_finished() {
            machine.send(GameEvent::AdvanceFrame).unwrap();
        }
        let last = *machine.current_point().unwrap();
        assert_eq!(machine.send(GameEvent::LandingComplete), Ok(GameState::Landed));
        assert_eq!(machine.current_point(), Some(&last));
        assert_eq!(machine.send(GameEvent::Reveal), Ok(GameState::Revealed));
        assert_eq!(machine.send(GameEvent::Claim), Ok(GameState::Claimed));
        assert_eq!(machine.context().landed_slot, Some(2));
    }

    #[test]
    fn test_illegal_event_is_reported() {
        let machine = GameMachine::new();
        let err = machine.transition(GameEvent::DropBall).unwrap_err();
        assert_eq!(
            err,
            TransitionError::Illegal {
                state: GameState::Idle,
                event: "drop_ball",
            }
        );

        let mut machine = initialized(1);
        assert!(machine.send(GameEvent::Claim).is_err());
        // A rejected event leaves the machine where it was
        assert_eq!(machine.state(), GameState::Ready);
    }

    #[test]
    fn test_reset_from_any_state() {
        let mut machine = initialized(4);
        machine.send(GameEvent::DropBall).unwrap();
        machine.send(GameEvent::CountdownComplete).unwrap();
        assert_eq!(machine.send(GameEvent::Reset), Ok(GameState::Idle));
        assert!(machine.context().trajectory.is_none());
        assert_eq!(GameMachine::new().send(GameEvent::Reset), Ok(GameState::Idle));
    }

    #[test]
    fn test_transition_does_not_touch_old_snapshot() {
        let ready = initialized(3);
        let dropping = ready
            .transition(GameEvent::DropBall)
            .and_then(|m| m.transition(GameEvent::CountdownComplete))
            .and_then(|m| m.transition(GameEvent::AdvanceFrame))
            .unwrap();
        assert_eq!(ready.state(), GameState::Ready);
        assert_eq!(ready.context().current_frame, 0);
        assert_eq!(dropping.context().current_frame, 1);
        // Playback shares the same trajectory allocation
        let a = ready.context().trajectory.as_ref().unwrap();
        let b = dropping.context().trajectory.as_ref().unwrap();
        assert!(Arc::ptr_eq(a, b));
    }

    #[test]
    fn test_position_selection_attaches_trajectory() {
        let mut machine = GameMachine::new();
        machine
            .send(GameEvent::Initialize {
                selection: PrizeSelection::new(0, 9, 7),
                prize: None,
                outcome: None,
            })
            .unwrap();
        assert_eq!(machine.send(GameEvent::DropBall), Err(TransitionError::MissingTrajectory));
        assert_eq!(
            machine.send(GameEvent::ShowPositionSelection),
            Ok(GameState::SelectingPosition)
        );
        let zone = DropZone {
            index: 0,
            min_x: 15.0,
            max_x: 130.0,
        };
        let next = machine.send(GameEvent::SelectPosition {
            zone,
            outcome: outcome(0),
        });
        assert_eq!(next, Ok(GameState::Countdown));
        assert_eq!(machine.context().drop_zone, Some(zone));
        assert!(machine.context().trajectory.is_some());
    }

    #[test]
    fn test_invalid_initialization() {
        let machine = GameMachine::new();
        let err = machine
            .transition(GameEvent::Initialize {
                selection: PrizeSelection::new(9, 1, 7),
                prize: None,
                outcome: None,
            })
            .unwrap_err();
        assert!(matches!(err, TransitionError::InvalidSelection(_)));

        let err = machine
            .transition(GameEvent::Initialize {
                selection: PrizeSelection::new(0, 1, 3),
                prize: None,
                outcome: Some(outcome(5)),
            })
            .unwrap_err();
        assert_eq!(err, TransitionError::SlotOutOfRange { slot: 5, slot_count: 3 });
    }
}
