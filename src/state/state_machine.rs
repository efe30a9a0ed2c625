use thiserror::Error;

use crate::state::stage::{GameStage, StarType, collect_stage, deliver_stage};

/// Events that can move a player through the quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestEvent {
    /// Player enters the game screen (also restarts an unfinished run).
    StartGame,
    /// Player picks up a star.
    Collect(StarType),
    /// Player hands a star over.
    Deliver(StarType),
    /// Explicit stage change, used for the stages no star action reaches.
    SetStage(GameStage),
    /// Request submitted and recipient picked; the quest is over.
    Complete,
}

/// Error returned when an event cannot be applied from the current stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The stage the player was in when the event was received.
    pub from: GameStage,
    /// The event that cannot be applied from this stage.
    pub event: QuestEvent,
}

/// Compute the stage reached by applying `event` from `from`.
///
/// Star events are not ordered against each other: players may act on
/// several stars concurrently and the collect/deliver invariants are checked
/// on the item flags, not here.
pub fn next_stage(from: GameStage, event: QuestEvent) -> Result<GameStage, InvalidTransition> {
    let next = match (from, event) {
        (GameStage::GameComplete, _) => return Err(InvalidTransition { from, event }),
        (_, QuestEvent::StartGame) => GameStage::GameStart,
        (_, QuestEvent::Collect(star)) => collect_stage(star),
        (_, QuestEvent::Deliver(star)) => deliver_stage(star),
        (_, QuestEvent::SetStage(GameStage::GameComplete | GameStage::Intro)) => {
            return Err(InvalidTransition { from, event });
        }
        (_, QuestEvent::SetStage(stage)) => stage,
        (_, QuestEvent::Complete) => GameStage::GameComplete,
    };

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(stage: GameStage, event: QuestEvent) -> GameStage {
        next_stage(stage, event).unwrap()
    }

    #[test]
    fn full_happy_path_through_quest() {
        let mut stage = GameStage::INITIAL;

        stage = apply(stage, QuestEvent::StartGame);
        assert_eq!(stage, GameStage::GameStart);
        stage = apply(stage, QuestEvent::Collect(StarType::Pride));
        assert_eq!(stage, GameStage::CollectPride);
        stage = apply(stage, QuestEvent::Deliver(StarType::Pride));
        assert_eq!(stage, GameStage::CollectEnvy);
        stage = apply(stage, QuestEvent::Collect(StarType::Envy));
        stage = apply(stage, QuestEvent::Deliver(StarType::Envy));
        assert_eq!(stage, GameStage::DeliverEnvy);
        stage = apply(stage, QuestEvent::Collect(StarType::Lonely));
        stage = apply(stage, QuestEvent::Deliver(StarType::Lonely));
        stage = apply(stage, QuestEvent::Collect(StarType::Sad));
        stage = apply(stage, QuestEvent::Deliver(StarType::Sad));
        assert_eq!(stage, GameStage::DeliverSad);
        stage = apply(stage, QuestEvent::SetStage(GameStage::RequestInput));
        stage = apply(stage, QuestEvent::SetStage(GameStage::NpcSelection));
        assert_eq!(stage, GameStage::NpcSelection);
        assert_eq!(apply(stage, QuestEvent::Complete), GameStage::GameComplete);
    }

    #[test]
    fn complete_is_terminal() {
        let events = [
            QuestEvent::StartGame,
            QuestEvent::Collect(StarType::Envy),
            QuestEvent::Deliver(StarType::Sad),
            QuestEvent::SetStage(GameStage::RequestInput),
            QuestEvent::Complete,
        ];

        for event in events {
            let err = next_stage(GameStage::GameComplete, event).unwrap_err();
            assert_eq!(err.from, GameStage::GameComplete);
            assert_eq!(err.event, event);
        }
    }

    #[test]
    fn completion_cannot_be_forced_through_set_stage() {
        let err = next_stage(
            GameStage::NpcSelection,
            QuestEvent::SetStage(GameStage::GameComplete),
        )
        .unwrap_err();
        assert_eq!(err.event, QuestEvent::SetStage(GameStage::GameComplete));
    }

    #[test]
    fn intro_is_not_reachable_again() {
        assert!(next_stage(GameStage::GameStart, QuestEvent::SetStage(GameStage::Intro)).is_err());
    }

    #[test]
    fn star_events_do_not_depend_on_order() {
        assert_eq!(
            apply(GameStage::CollectPride, QuestEvent::Collect(StarType::Sad)),
            GameStage::CollectSad
        );
        assert_eq!(
            apply(GameStage::DeliverSad, QuestEvent::Collect(StarType::Envy)),
            GameStage::CollectEnvy
        );
    }
}
