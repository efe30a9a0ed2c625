//! Application-level configuration loading: background write concurrency, the NPC roster, the
//! star guide and the dialogue catalog.

use std::{collections::HashMap, env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::stage::StarType;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "STAR_QUEST_CONFIG_PATH";
/// Background write tasks allowed to run at the same time.
const DEFAULT_WRITE_WORKERS: usize = 8;

/// Character a player can pick to answer their request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NpcProfile {
    /// Display name, also the value clients send as `selected_npc`.
    pub name: String,
    /// Address the completion email is sent from.
    pub sender_email: String,
    /// Star this character is associated with.
    pub star: StarType,
    /// Text shown on the character profile page.
    #[serde(default)]
    pub description: String,
}

/// One page entry of the star guide.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StarGuideEntry {
    /// Name of the star.
    pub name: String,
    /// Feeling the star was born from.
    pub source: String,
    /// Entry text.
    pub description: String,
}

/// One line of dialogue shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DialogueEntry {
    /// Who speaks the line.
    pub speaker: String,
    /// Line content, shown as is.
    pub text: String,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    write_workers: usize,
    npcs: Vec<NpcProfile>,
    star_guide: Vec<StarGuideEntry>,
    dialogues: HashMap<String, Vec<DialogueEntry>>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        npcs = app_config.npcs.len(),
                        star_guide_entries = app_config.star_guide.len(),
                        dialogue_types = app_config.dialogues.len(),
                        write_workers = app_config.write_workers,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Maximum number of background write tasks running at once.
    pub fn write_workers(&self) -> usize {
        self.write_workers
    }

    /// Characters available for selection at the end of the quest.
    pub fn npcs(&self) -> &[NpcProfile] {
        &self.npcs
    }

    /// Look up a character by its display name.
    pub fn find_npc(&self, name: &str) -> Option<&NpcProfile> {
        self.npcs.iter().find(|npc| npc.name == name)
    }

    /// Star guide entries in display order.
    pub fn star_guide(&self) -> &[StarGuideEntry] {
        &self.star_guide
    }

    /// Dialogue catalog keyed by dialogue type.
    pub fn dialogues(&self) -> &HashMap<String, Vec<DialogueEntry>> {
        &self.dialogues
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            write_workers: DEFAULT_WRITE_WORKERS,
            npcs: default_npcs(),
            star_guide: default_star_guide(),
            dialogues: default_dialogues(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    write_workers: Option<usize>,
    #[serde(default)]
    npcs: Option<Vec<NpcProfile>>,
    #[serde(default)]
    star_guide: Option<Vec<StarGuideEntry>>,
    #[serde(default)]
    dialogues: Option<HashMap<String, Vec<DialogueEntry>>>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            write_workers: value
                .write_workers
                .filter(|workers| *workers > 0)
                .unwrap_or(DEFAULT_WRITE_WORKERS),
            npcs: value.npcs.unwrap_or_else(default_npcs),
            star_guide: value.star_guide.unwrap_or_else(default_star_guide),
            dialogues: value.dialogues.unwrap_or_else(default_dialogues),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn npc(name: &str, sender_email: &str, star: StarType, description: &str) -> NpcProfile {
    NpcProfile {
        name: name.to_owned(),
        sender_email: sender_email.to_owned(),
        star,
        description: description.to_owned(),
    }
}

/// Built-in roster shipped with the binary.
fn default_npcs() -> Vec<NpcProfile> {
    vec![
        npc(
            "어린왕자",
            "little_p@b612.rose.com",
            StarType::Pride,
            "Keeper of B612. Proud of his rose, and a little ashamed of it.",
        ),
        npc(
            "장미",
            "rose@b612.rose.com",
            StarType::Envy,
            "The only rose on the planet. Sharp thorns, soft petals.",
        ),
        npc(
            "여우",
            "prettycutyfox@b612.rose.com",
            StarType::Sad,
            "Knows that what is essential is invisible to the eye.",
        ),
        npc(
            "바오밥",
            "baobob123@b612.rose.com",
            StarType::Lonely,
            "Grows too big when nobody looks after it.",
        ),
    ]
}

/// Built-in star guide shipped with the binary.
fn default_star_guide() -> Vec<StarGuideEntry> {
    let entry = |name: &str, source: &str, description: &str| StarGuideEntry {
        name: name.to_owned(),
        source: source.to_owned(),
        description: description.to_owned(),
    };

    vec![
        entry(
            "Star of Pride",
            "pride",
            "Shines brightest when nobody else is around.",
        ),
        entry(
            "Star of Envy",
            "envy",
            "Keeps turning towards the other stars.",
        ),
        entry(
            "Star of Loneliness",
            "loneliness",
            "Drifts far from every constellation.",
        ),
        entry(
            "Star of Sadness",
            "sadness",
            "Its light flickers like a held-back tear.",
        ),
        entry(
            "Star of Humility",
            "pride, once returned",
            "What the star of pride becomes after it finds its owner.",
        ),
        entry(
            "Star of Admiration",
            "envy, once returned",
            "What the star of envy becomes after it finds its owner.",
        ),
        entry(
            "Star of Friendship",
            "loneliness, once returned",
            "What the star of loneliness becomes after it finds its owner.",
        ),
        entry(
            "Star of Comfort",
            "sadness, once returned",
            "What the star of sadness becomes after it finds its owner.",
        ),
        entry(
            "Rose's Star",
            "love",
            "The one star that was never lost.",
        ),
    ]
}

/// Built-in dialogue catalog shipped with the binary.
fn default_dialogues() -> HashMap<String, Vec<DialogueEntry>> {
    let line = |speaker: &str, text: &str| DialogueEntry {
        speaker: speaker.to_owned(),
        text: text.to_owned(),
    };

    HashMap::from([
        (
            "tutorial".to_owned(),
            vec![
                line("장미", "You came all the way to B612. Four stars have gone astray."),
                line("장미", "Click a glowing star to pick it up, then bring it to its owner."),
            ],
        ),
        (
            "click_pride".to_owned(),
            vec![line("어린왕자", "That one is mine. I will keep it right away.")],
        ),
        (
            "click_envy".to_owned(),
            vec![line("장미", "This star keeps looking at the others. Bring it to me.")],
        ),
        (
            "deliver_envy".to_owned(),
            vec![line("장미", "Thank you. It feels lighter already.")],
        ),
        (
            "click_lonely".to_owned(),
            vec![line("바오밥", "A lonely star... I know the feeling.")],
        ),
        (
            "deliver_lonely".to_owned(),
            vec![line("바오밥", "It can stay with me now.")],
        ),
        (
            "click_sad".to_owned(),
            vec![line("여우", "This one has been crying for a while.")],
        ),
        (
            "deliver_sad".to_owned(),
            vec![line("여우", "All four stars are home. The request form is open.")],
        ),
        (
            "quest_end".to_owned(),
            vec![line("장미", "Tell us what weighs on you.")],
        ),
        (
            "pick_npc".to_owned(),
            vec![line("장미", "Who should answer your letter?")],
        ),
        (
            "star_guide".to_owned(),
            vec![line("어린왕자", "Every star that ever fell on B612 is written down here.")],
        ),
        (
            "character_profile".to_owned(),
            vec![line("장미", "These are the ones who live on the planet.")],
        ),
        (
            "game_clear".to_owned(),
            vec![line("어린왕자", "Your letter is on its way. Check your inbox.")],
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_one_npc_per_star() {
        let config = AppConfig::default();
        for star in StarType::ALL {
            assert_eq!(
                config.npcs().iter().filter(|npc| npc.star == star).count(),
                1
            );
        }
        assert_eq!(config.write_workers(), DEFAULT_WRITE_WORKERS);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let raw: RawConfig = serde_json::from_str(r#"{ "write_workers": 2 }"#).unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.write_workers(), 2);
        assert!(config.find_npc("여우").is_some());
        assert!(config.dialogues().contains_key("tutorial"));
        assert_eq!(config.star_guide(), default_star_guide().as_slice());
    }

    #[test]
    fn custom_star_guide_replaces_defaults() {
        let raw: RawConfig = serde_json::from_str(
            r#"{ "star_guide": [{ "name": "North", "source": "hope", "description": "Points home." }] }"#,
        )
        .unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.star_guide().len(), 1);
        assert_eq!(config.star_guide()[0].source, "hope");
        assert_eq!(config.npcs().len(), default_npcs().len());
    }

    #[test]
    fn zero_workers_is_ignored() {
        let raw: RawConfig = serde_json::from_str(r#"{ "write_workers": 0 }"#).unwrap();
        assert_eq!(AppConfig::from(raw).write_workers(), DEFAULT_WRITE_WORKERS);
    }

    #[test]
    fn custom_roster_replaces_defaults() {
        let raw: RawConfig = serde_json::from_str(
            r#"{ "npcs": [{ "name": "fox", "sender_email": "fox@example.com", "star": "SAD" }] }"#,
        )
        .unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.npcs().len(), 1);
        let fox = config.find_npc("fox").unwrap();
        assert_eq!(fox.star, StarType::Sad);
        assert!(fox.description.is_empty());
        assert!(config.find_npc("여우").is_none());
    }
}
