use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Explicit skeleton binding for the player avatar. Every animated bone is
/// named in the descriptor; nothing is inferred from whatever bone names a
/// model happens to ship with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerModelConfig {
    /// Model file the descriptor describes, relative to the assets dir.
    pub source: String,
    pub scale: f32,
    pub bones: BoneBindings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneBindings {
    pub left_arm: String,
    pub right_arm: String,
    pub left_leg: String,
    pub right_leg: String,
    #[serde(default)]
    pub hair: Option<String>,
}

#[derive(Debug, Error)]
pub enum ModelConfigError {
    #[error("failed to read model descriptor at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse model descriptor at {path} ({json_path}): {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Callers treat a failed load as "no avatar model"; this never aborts
/// startup.
pub fn load_player_model(path: &Path) -> Result<PlayerModelConfig, ModelConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ModelConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut deserializer = serde_json::Deserializer::from_str(&raw);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let json_path = error.path().to_string();
        ModelConfigError::Parse {
            path: path.to_path_buf(),
            json_path,
            source: error.into_inner(),
        }
    })
}
