//! Narrative stages, collectible stars and the pure rules mapping star actions to stages.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One discrete step of the quest, in narrative order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStage {
    /// Title screen, before the player enters the game.
    Intro,
    /// Player entered the game screen.
    GameStart,
    /// Pride star picked up.
    CollectPride,
    /// Pride star handed over (never reached: folded into [`GameStage::CollectEnvy`]).
    DeliverPride,
    /// Envy star picked up.
    CollectEnvy,
    /// Envy star handed over.
    DeliverEnvy,
    /// Lonely star picked up.
    CollectLonely,
    /// Lonely star handed over.
    DeliverLonely,
    /// Sad star picked up.
    CollectSad,
    /// Sad star handed over; the request form becomes available.
    DeliverSad,
    /// Player writes down their request.
    RequestInput,
    /// Player picks the character who answers the request.
    NpcSelection,
    /// Terminal stage.
    GameComplete,
}

impl GameStage {
    /// Stage every new player starts from.
    pub const INITIAL: GameStage = GameStage::Intro;

    /// Whether no further transition is defined out of this stage.
    pub fn is_terminal(self) -> bool {
        matches!(self, GameStage::GameComplete)
    }
}

/// The four symbolic stars a player collects and delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StarType {
    /// Collected and delivered in a single action.
    Pride,
    /// Second star.
    Envy,
    /// Third star.
    Lonely,
    /// Fourth star; delivering it activates the request form.
    Sad,
}

impl StarType {
    /// Number of stars in the closed set.
    pub const COUNT: usize = 4;

    /// Every star, in narrative order.
    pub const ALL: [StarType; StarType::COUNT] = [
        StarType::Pride,
        StarType::Envy,
        StarType::Lonely,
        StarType::Sad,
    ];

    /// Position of the star in [`StarType::ALL`].
    pub const fn index(self) -> usize {
        match self {
            StarType::Pride => 0,
            StarType::Envy => 1,
            StarType::Lonely => 2,
            StarType::Sad => 3,
        }
    }

    /// The star that may be collected and delivered again without error.
    ///
    /// Its collect action also performs its delivery.
    pub fn is_repeatable(self) -> bool {
        matches!(self, StarType::Pride)
    }

    /// The star whose delivery completes the set.
    pub fn completes_set(self) -> bool {
        matches!(self, StarType::Sad)
    }
}

/// Optional in-game objects a player can interact with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InteractiveObjectType {
    /// Star encyclopedia.
    StarGuide,
    /// Character profiles.
    CharacterProfile,
    /// Request form, locked until the last star is delivered.
    RequestForm,
}

impl InteractiveObjectType {
    /// Every interactive object.
    pub const ALL: [InteractiveObjectType; 3] = [
        InteractiveObjectType::StarGuide,
        InteractiveObjectType::CharacterProfile,
        InteractiveObjectType::RequestForm,
    ];

    /// Whether the object is usable right after a game starts.
    pub fn starts_active(self) -> bool {
        !matches!(self, InteractiveObjectType::RequestForm)
    }
}

/// Stage reached when `star` is collected.
pub fn collect_stage(star: StarType) -> GameStage {
    match star {
        StarType::Pride => GameStage::CollectPride,
        StarType::Envy => GameStage::CollectEnvy,
        StarType::Lonely => GameStage::CollectLonely,
        StarType::Sad => GameStage::CollectSad,
    }
}

/// Stage reached when `star` is delivered.
///
/// The pride star is consumed by its collect action, so its delivery moves
/// straight on to the envy star's collect stage.
pub fn deliver_stage(star: StarType) -> GameStage {
    match star {
        StarType::Pride => collect_stage(StarType::Envy),
        StarType::Envy => GameStage::DeliverEnvy,
        StarType::Lonely => GameStage::DeliverLonely,
        StarType::Sad => GameStage::DeliverSad,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_stage_maps_each_star_to_its_own_stage() {
        assert_eq!(collect_stage(StarType::Pride), GameStage::CollectPride);
        assert_eq!(collect_stage(StarType::Envy), GameStage::CollectEnvy);
        assert_eq!(collect_stage(StarType::Lonely), GameStage::CollectLonely);
        assert_eq!(collect_stage(StarType::Sad), GameStage::CollectSad);
    }

    #[test]
    fn pride_delivery_folds_into_next_collect_stage() {
        assert_eq!(deliver_stage(StarType::Pride), GameStage::CollectEnvy);
        assert_ne!(deliver_stage(StarType::Pride), GameStage::DeliverPride);
    }

    #[test]
    fn regular_stars_deliver_to_their_own_stage() {
        assert_eq!(deliver_stage(StarType::Envy), GameStage::DeliverEnvy);
        assert_eq!(deliver_stage(StarType::Lonely), GameStage::DeliverLonely);
        assert_eq!(deliver_stage(StarType::Sad), GameStage::DeliverSad);
    }

    #[test]
    fn star_indexes_follow_narrative_order() {
        for (position, star) in StarType::ALL.iter().enumerate() {
            assert_eq!(star.index(), position);
        }
    }

    #[test]
    fn stages_serialize_in_screaming_snake_case() {
        let json = serde_json::to_string(&GameStage::CollectPride).unwrap();
        assert_eq!(json, "\"COLLECT_PRIDE\"");
        let star: StarType = serde_json::from_str("\"LONELY\"").unwrap();
        assert_eq!(star, StarType::Lonely);
    }

    #[test]
    fn only_request_form_starts_locked() {
        assert!(InteractiveObjectType::StarGuide.starts_active());
        assert!(InteractiveObjectType::CharacterProfile.starts_active());
        assert!(!InteractiveObjectType::RequestForm.starts_active());
    }
}
