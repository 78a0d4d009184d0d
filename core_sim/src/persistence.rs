use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::world::WorldState;

/// Persisted form of a [`WorldState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveBlob {
    #[serde(default)]
    pub version: String,
    /// Unix seconds at save time.
    #[serde(default)]
    pub timestamp: u64,
    pub state: WorldState,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("invalid save format: {0}")]
    InvalidFormat(String),
    #[error("save file i/o failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode save blob: {0}")]
    Encode(#[source] serde_json::Error),
}

impl PersistenceError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PersistenceGateway {
    version: String,
}

impl Default for PersistenceGateway {
    fn default() -> Self {
        Self::new("1.0")
    }
}

impl PersistenceGateway {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn save(&self, state: &WorldState) -> SaveBlob {
        SaveBlob {
            version: self.version.clone(),
            timestamp: unix_seconds(),
            state: state.clone(),
        }
    }

    /// Validate a blob and hand back its state. The blob itself is left untouched.
    pub fn load(&self, blob: &SaveBlob) -> Result<WorldState, PersistenceError> {
        blob.state
            .validate()
            .map_err(|err| PersistenceError::InvalidFormat(err.to_string()))?;
        if blob.version != self.version {
            warn!(
                target: "concord::persistence",
                expected = %self.version,
                found = %blob.version,
                "save.version_mismatch"
            );
        }
        Ok(blob.state.clone())
    }

    pub fn load_value(&self, value: &Value) -> Result<WorldState, PersistenceError> {
        let object = value.as_object().ok_or_else(|| {
            PersistenceError::InvalidFormat("save blob must be a JSON object".to_string())
        })?;
        if !object.contains_key("state") {
            return Err(PersistenceError::InvalidFormat(
                "save blob has no `state` field".to_string(),
            ));
        }
        let blob = SaveBlob::deserialize(value)
            .map_err(|err| PersistenceError::InvalidFormat(err.to_string()))?;
        self.load(&blob)
    }

    pub fn load_str(&self, json: &str) -> Result<WorldState, PersistenceError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|err| PersistenceError::InvalidFormat(err.to_string()))?;
        self.load_value(&value)
    }

    /// Write a save for `state` to `path`.
    ///
    /// The blob is written to a sibling temporary file and renamed into place, so a reader
    /// of `path` sees either the previous save or the complete new one.
    pub fn save_to_path(&self, state: &WorldState, path: &Path) -> Result<SaveBlob, PersistenceError> {
        let blob = self.save(state);
        let encoded = serde_json::to_vec_pretty(&blob).map_err(PersistenceError::Encode)?;

        let staging = staging_path(path);
        let written = File::create(&staging).and_then(|mut file| {
            file.write_all(&encoded)?;
            file.sync_all()
        });
        if let Err(source) = written {
            let _ = fs::remove_file(&staging);
            return Err(PersistenceError::io(&staging, source));
        }
        if let Err(source) = fs::rename(&staging, path) {
            let _ = fs::remove_file(&staging);
            return Err(PersistenceError::io(path, source));
        }

        info!(
            target: "concord::persistence",
            path = %path.display(),
            turn = blob.state.turn,
            bytes = encoded.len(),
            "save.written"
        );
        Ok(blob)
    }

    pub fn load_from_path(&self, path: &Path) -> Result<WorldState, PersistenceError> {
        let contents = fs::read_to_string(path).map_err(|source| PersistenceError::io(path, source))?;
        let state = self.load_str(&contents)?;
        info!(
            target: "concord::persistence",
            path = %path.display(),
            turn = state.turn,
            "save.read"
        );
        Ok(state)
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "save".into());
    name.push(".tmp");
    path.with_file_name(name)
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ids::FactionId;

    fn sample_state() -> WorldState {
        let mut state = WorldState::new(42);
        state.turn = 6;
        state.day = 12;
        state.provinces.set_owner("p1".into(), "red".into());
        state
            .relations
            .set_relation(FactionId::new("red"), FactionId::new("blue"), -12.5);
        state
    }

    #[test]
    fn save_then_load_preserves_state() {
        let gateway = PersistenceGateway::default();
        let state = sample_state();
        let blob = gateway.save(&state);
        assert_eq!(blob.version, "1.0");
        assert!(blob.timestamp > 0);
        assert_eq!(gateway.load(&blob).expect("valid blob"), state);
    }

    #[test]
    fn json_round_trip_through_text() {
        let gateway = PersistenceGateway::default();
        let state = sample_state();
        let text = serde_json::to_string(&gateway.save(&state)).expect("encode");
        assert_eq!(gateway.load_str(&text).expect("decode"), state);
    }

    #[test]
    fn missing_state_field_is_rejected() {
        let gateway = PersistenceGateway::default();
        let err = gateway
            .load_value(&json!({"version": "1.0", "timestamp": 1}))
            .expect_err("no state");
        assert!(matches!(err, PersistenceError::InvalidFormat(_)));
    }

    #[test]
    fn non_object_blob_is_rejected() {
        let gateway = PersistenceGateway::default();
        assert!(gateway.load_value(&json!([1, 2, 3])).is_err());
        assert!(gateway.load_str("not json").is_err());
    }

    #[test]
    fn undecodable_state_is_rejected() {
        let gateway = PersistenceGateway::default();
        let err = gateway
            .load_value(&json!({"state": {"turn": "soon"}}))
            .expect_err("bad state");
        assert!(matches!(err, PersistenceError::InvalidFormat(_)));
    }

    #[test]
    fn zero_turn_fails_validation() {
        let gateway = PersistenceGateway::default();
        let err = gateway
            .load_value(&json!({"state": {"turn": 0, "day": 1, "seed": 3}}))
            .expect_err("turn zero");
        assert!(matches!(err, PersistenceError::InvalidFormat(_)));
    }

    #[test]
    fn version_mismatch_still_loads() {
        let gateway = PersistenceGateway::new("2.0");
        let blob = PersistenceGateway::new("1.0").save(&sample_state());
        assert_eq!(gateway.load(&blob).expect("accepted").turn, 6);
    }

    #[test]
    fn disk_round_trip_leaves_no_staging_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("campaign.json");
        let gateway = PersistenceGateway::default();
        let state = sample_state();

        gateway.save_to_path(&state, &path).expect("save");
        assert!(!staging_path(&path).exists());
        assert_eq!(gateway.load_from_path(&path).expect("load"), state);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = PersistenceGateway::default()
            .load_from_path(&dir.path().join("absent.json"))
            .expect_err("missing");
        assert!(matches!(err, PersistenceError::Io { .. }));
    }
}
