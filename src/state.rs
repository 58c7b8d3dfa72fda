//! Saved list view (status view plus filter and sort settings)
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::query::{QueryOptions, ViewFilter};

/// What `list` showed last time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    pub filter: ViewFilter,
    pub options: QueryOptions,
}

/// The view file lives next to the database it describes
pub fn get_state_file_path(database_path: &Path) -> PathBuf {
    database_path.with_file_name("view.json")
}

pub fn save_state(state: &ViewState, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(path, json)?;

    Ok(())
}

/// Load the saved view; no file means the default view
pub fn load_state(path: &Path) -> Result<ViewState> {
    if !path.exists() {
        return Ok(ViewState::default());
    }

    let content = std::fs::read_to_string(path)?;
    let state: ViewState = serde_json::from_str(&content)?;

    Ok(state)
}
