//! Platform abstraction layer
//!
//! Capabilities the run needs from the outside world:
//! - Key-value storage for progress and tuning
//! - Leaderboard submit / top-N
//! - Interstitial and rewarded ads, polled for completion
//! - Scene transitions with an "is it active yet" probe
//! - Gameplay start/stop markers for the host platform
//!
//! They are injected through [`Services`] so the run can be driven headless.

pub mod memory;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::persistence::ProgressStore;
use crate::session::RunSummary;

/// Collaborator failures
#[derive(Clone, Debug, PartialEq)]
pub enum PlatformError {
    /// Backend not reachable or not initialised
    Unavailable(String),
    /// Backend answered but refused the request
    Rejected(String),
    /// Record could not be encoded or decoded
    Serialization(String),
}

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformError::Unavailable(what) => write!(f, "Unavailable: {}", what),
            PlatformError::Rejected(why) => write!(f, "Rejected: {}", why),
            PlatformError::Serialization(msg) => write!(f, "Serialization failed: {}", msg),
        }
    }
}

impl std::error::Error for PlatformError {}

impl From<serde_json::Error> for PlatformError {
    fn from(err: serde_json::Error) -> Self {
        PlatformError::Serialization(err.to_string())
    }
}

/// Flat key-value store of JSON records
pub trait Storage {
    /// `Ok(None)` when nothing is stored under `key`
    fn load_json(&mut self, key: &str) -> Result<Option<Value>, PlatformError>;
    fn save_json(&mut self, key: &str, value: &Value) -> Result<(), PlatformError>;
}

/// One leaderboard line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub rank: u32,
    pub name: String,
    pub score: u64,
}

pub trait Leaderboard {
    fn submit_score(&mut self, score: u64) -> Result<(), PlatformError>;
    fn top(&self, count: usize) -> Result<Vec<LeaderboardRow>, PlatformError>;
}

/// Top rows, or an empty list when the leaderboard is unavailable
pub fn fetch_top(leaderboard: &dyn Leaderboard, count: usize) -> Vec<LeaderboardRow> {
    leaderboard.top(count).unwrap_or_else(|err| {
        log::warn!("Leaderboard unavailable: {}", err);
        Vec::new()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdKind {
    Interstitial,
    Rewarded,
}

/// Identifies one ad request; completions for other tickets are stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdTicket(pub u64);

/// Ads run asynchronously: `begin` starts one, `poll` reports completion
pub trait AdGate {
    fn begin(&mut self, kind: AdKind) -> Result<AdTicket, PlatformError>;
    /// `None` while the ad is still showing. `Some(true)` means shown/rewarded.
    fn poll(&mut self, ticket: AdTicket) -> Option<bool>;
}

/// Scenes the run can hand over to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SceneKey {
    MainMenu,
    Game,
    Win,
    GameOver,
}

impl SceneKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SceneKey::MainMenu => "MainMenu",
            SceneKey::Game => "Game",
            SceneKey::Win => "Win",
            SceneKey::GameOver => "GameOver",
        }
    }
}

impl std::str::FromStr for SceneKey {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainmenu" | "menu" => Ok(SceneKey::MainMenu),
            "game" => Ok(SceneKey::Game),
            "win" => Ok(SceneKey::Win),
            "gameover" => Ok(SceneKey::GameOver),
            _ => Err(PlatformError::Rejected(format!("unknown scene {}", s))),
        }
    }
}

pub trait SceneDirector {
    fn start_scene(&mut self, key: SceneKey, payload: Option<&RunSummary>) -> Result<(), PlatformError>;
    /// Whether `key` has reported itself active
    fn is_active(&self, key: SceneKey) -> bool;
}

/// Tells the host when live gameplay starts and stops. Callers only send
/// transitions, never the same mark twice in a row.
pub trait GameplayMarker {
    fn gameplay_start(&mut self);
    fn gameplay_stop(&mut self);
}

/// Everything a run talks to, passed explicitly into each session call
pub struct Services<'a> {
    pub storage: &'a mut dyn Storage,
    pub leaderboard: &'a mut dyn Leaderboard,
    pub ads: &'a mut dyn AdGate,
    pub scenes: &'a mut dyn SceneDirector,
    pub gameplay: &'a mut dyn GameplayMarker,
    pub progress: &'a mut ProgressStore,
}
