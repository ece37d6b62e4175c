//! In-memory collaborators
//!
//! Used by the native demo and as test doubles: storage with injectable
//! failures, scripted ads, and recorders for scene changes and gameplay marks.

use std::collections::HashMap;

use serde_json::Value;

use super::{AdGate, AdKind, AdTicket, GameplayMarker, PlatformError, SceneDirector, SceneKey, Storage};
use crate::session::RunSummary;

/// HashMap-backed storage
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    records: HashMap<String, Value>,
    pub fail_loads: bool,
    pub fail_saves: bool,
    /// Successful writes
    pub writes: u32,
}

impl MemoryStorage {
    /// Storage whose loads and saves all fail
    pub fn failing() -> Self {
        Self {
            fail_loads: true,
            fail_saves: true,
            ..Default::default()
        }
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.records.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.records.get(key)
    }
}

impl Storage for MemoryStorage {
    fn load_json(&mut self, key: &str) -> Result<Option<Value>, PlatformError> {
        if self.fail_loads {
            return Err(PlatformError::Unavailable("storage".into()));
        }
        Ok(self.records.get(key).cloned())
    }

    fn save_json(&mut self, key: &str, value: &Value) -> Result<(), PlatformError> {
        if self.fail_saves {
            return Err(PlatformError::Unavailable("storage".into()));
        }
        self.records.insert(key.to_string(), value.clone());
        self.writes += 1;
        Ok(())
    }
}

/// How a scripted ad behaves once requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdScript {
    /// Completes on the first poll with this result
    Immediate(bool),
    /// Never completes unless settled by hand
    Hang,
    /// `begin` itself fails
    Fail,
}

/// Ad gate answering from a fixed script per ad kind
#[derive(Debug, Clone)]
pub struct ScriptedAdGate {
    pub interstitial: AdScript,
    pub rewarded: AdScript,
    /// Every requested kind, in order
    pub requests: Vec<AdKind>,
    outcomes: HashMap<AdTicket, Option<bool>>,
    next_ticket: u64,
}

impl Default for ScriptedAdGate {
    fn default() -> Self {
        Self::new(AdScript::Immediate(true), AdScript::Immediate(true))
    }
}

impl ScriptedAdGate {
    pub fn new(interstitial: AdScript, rewarded: AdScript) -> Self {
        Self {
            interstitial,
            rewarded,
            requests: Vec::new(),
            outcomes: HashMap::new(),
            next_ticket: 1,
        }
    }

    /// Complete a hanging ad
    pub fn settle(&mut self, ticket: AdTicket, result: bool) {
        if let Some(outcome) = self.outcomes.get_mut(&ticket) {
            *outcome = Some(result);
        }
    }

    pub fn last_ticket(&self) -> Option<AdTicket> {
        self.next_ticket.checked_sub(1).filter(|t| *t > 0).map(AdTicket)
    }

    pub fn count(&self, kind: AdKind) -> usize {
        self.requests.iter().filter(|k| **k == kind).count()
    }
}

impl AdGate for ScriptedAdGate {
    fn begin(&mut self, kind: AdKind) -> Result<AdTicket, PlatformError> {
        self.requests.push(kind);
        let script = match kind {
            AdKind::Interstitial => self.interstitial,
            AdKind::Rewarded => self.rewarded,
        };
        let outcome = match script {
            AdScript::Immediate(result) => Some(result),
            AdScript::Hang => None,
            AdScript::Fail => return Err(PlatformError::Unavailable("ads".into())),
        };
        let ticket = AdTicket(self.next_ticket);
        self.next_ticket += 1;
        self.outcomes.insert(ticket, outcome);
        Ok(ticket)
    }

    fn poll(&mut self, ticket: AdTicket) -> Option<bool> {
        self.outcomes.get(&ticket).copied().flatten()
    }
}

/// Scene director that records calls and optionally activates scenes
#[derive(Debug, Clone)]
pub struct RecordingSceneDirector {
    /// Every started scene, in order
    pub calls: Vec<SceneKey>,
    /// Mark a scene active as soon as it is started
    pub activate_on_start: bool,
    /// Scenes whose start fails
    pub fail_on: Vec<SceneKey>,
    pub last_payload: Option<RunSummary>,
    active: Option<SceneKey>,
}

impl Default for RecordingSceneDirector {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            activate_on_start: true,
            fail_on: Vec::new(),
            last_payload: None,
            active: None,
        }
    }
}

impl RecordingSceneDirector {
    /// A director whose scenes never report active
    pub fn unresponsive() -> Self {
        Self {
            activate_on_start: false,
            ..Default::default()
        }
    }

    /// A director that refuses to start any of `keys`
    pub fn failing_on(keys: &[SceneKey]) -> Self {
        Self {
            fail_on: keys.to_vec(),
            ..Default::default()
        }
    }

    /// Report a scene active
    pub fn activate(&mut self, key: SceneKey) {
        self.active = Some(key);
    }

    pub fn starts_of(&self, key: SceneKey) -> usize {
        self.calls.iter().filter(|k| **k == key).count()
    }
}

impl SceneDirector for RecordingSceneDirector {
    fn start_scene(&mut self, key: SceneKey, payload: Option<&RunSummary>) -> Result<(), PlatformError> {
        self.calls.push(key);
        if self.fail_on.contains(&key) {
            return Err(PlatformError::Rejected(format!("scene {} failed to start", key.as_str())));
        }
        self.last_payload = payload.cloned();
        if self.activate_on_start {
            self.active = Some(key);
        }
        Ok(())
    }

    fn is_active(&self, key: SceneKey) -> bool {
        self.active == Some(key)
    }
}

/// A gameplay start or stop sent to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameplayMark {
    Start,
    Stop,
}

/// Records every gameplay mark in order
#[derive(Debug, Clone, Default)]
pub struct RecordingGameplayMarker {
    pub marks: Vec<GameplayMark>,
}

impl RecordingGameplayMarker {
    /// Whether the last mark left gameplay running
    pub fn is_live(&self) -> bool {
        self.marks.last() == Some(&GameplayMark::Start)
    }
}

impl GameplayMarker for RecordingGameplayMarker {
    fn gameplay_start(&mut self) {
        self.marks.push(GameplayMark::Start);
    }

    fn gameplay_stop(&mut self) {
        self.marks.push(GameplayMark::Stop);
    }
}
