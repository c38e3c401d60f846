//! The subset of the live-client payload this crate reads
//!
//! Every field is optional or defaulted; anything absent or of an unexpected
//! shape reads as missing rather than failing the whole document.

use serde::{Deserialize, Deserializer};

/// `GET /liveclientdata/allgamedata`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AllGameData {
    #[serde(deserialize_with = "lenient")]
    pub active_player: Option<ActivePlayer>,
    #[serde(deserialize_with = "lenient_vec")]
    pub all_players: Vec<PlayerInfo>,
    #[serde(deserialize_with = "lenient")]
    pub events: Option<EventLog>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivePlayer {
    #[serde(deserialize_with = "lenient")]
    pub summoner_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerInfo {
    #[serde(deserialize_with = "lenient")]
    pub summoner_name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub champion_name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub raw_champion_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventLog {
    #[serde(rename = "Events", deserialize_with = "lenient_vec")]
    pub events: Vec<GameEvent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GameEvent {
    #[serde(rename = "EventID", deserialize_with = "lenient")]
    pub event_id: Option<i64>,
    #[serde(rename = "EventName", deserialize_with = "lenient")]
    pub event_name: Option<String>,
    #[serde(rename = "KillStreak", deserialize_with = "lenient")]
    pub kill_streak: Option<i64>,
    #[serde(rename = "KillerName", deserialize_with = "lenient")]
    pub killer_name: Option<String>,
    #[serde(rename = "Killer", deserialize_with = "lenient")]
    pub killer: Option<String>,
    #[serde(rename = "PlayerName", deserialize_with = "lenient")]
    pub player_name: Option<String>,
}

impl AllGameData {
    /// Parse a payload. `None` if it is not a JSON object at all.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }

    /// Name of the locally controlled player, if reported and non-empty
    pub fn active_name(&self) -> Option<&str> {
        self.active_player
            .as_ref()
            .and_then(|p| p.summoner_name.as_deref())
            .filter(|name| !name.is_empty())
    }

    /// Roster entry of the locally controlled player
    pub fn active_player_info(&self) -> Option<&PlayerInfo> {
        let name = self.active_name()?;
        self.all_players
            .iter()
            .find(|p| p.summoner_name.as_deref() == Some(name))
    }

    pub fn events(&self) -> &[GameEvent] {
        self.events.as_ref().map(|log| log.events.as_slice()).unwrap_or(&[])
    }
}

impl GameEvent {
    /// Actor credited with the event, trying the known key variants in order
    pub fn actor(&self) -> Option<&str> {
        self.killer_name
            .as_deref()
            .or(self.killer.as_deref())
            .or(self.player_name.as_deref())
    }
}

/// Deserialize, turning a value of the wrong shape into `None`
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Deserialize a list, dropping elements that do not parse
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}
