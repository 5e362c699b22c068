//! Save-file projection of the budget state and a JSON save store
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

use crate::budget::BudgetState;
use crate::errors::BudgetError;

/// The three budget fields as stored in a save
///
/// Every field is optional on load. A save written before the budget existed
/// has none of them, and the engine falls back to fresh values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedBudget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_due_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_counter: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banked_reputation: Option<f64>,
}

impl PersistedBudget {
    /// Capture all three fields verbatim
    pub fn from_state(state: &BudgetState) -> Self {
        Self {
            next_due_time: Some(state.next_due_time),
            period_counter: Some(state.period_counter),
            banked_reputation: Some(state.banked_reputation),
        }
    }

    /// Rebuild engine state, filling gaps with fresh-state defaults
    ///
    /// Missing reputation is seeded from the host's current reputation.
    pub fn restore(&self, now: f64, current_reputation: f64) -> BudgetState {
        let fresh = BudgetState::new(now, current_reputation);
        BudgetState {
            next_due_time: self.next_due_time.unwrap_or(fresh.next_due_time),
            period_counter: self.period_counter.unwrap_or(fresh.period_counter),
            banked_reputation: self.banked_reputation.unwrap_or(fresh.banked_reputation),
        }
    }

    /// True if no budget field was stored
    pub fn is_empty(&self) -> bool {
        self.next_due_time.is_none() && self.period_counter.is_none() && self.banked_reputation.is_none()
    }
}

/// A minimal host save: clock, wallet and the embedded budget fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveGame {
    pub id: Uuid,
    pub name: String,
    pub saved_at: DateTime<Utc>,
    /// Seconds since the epoch
    pub universal_time: f64,
    pub funds: f64,
    pub reputation: f64,
    #[serde(default)]
    pub budget: PersistedBudget,
}

impl SaveGame {
    /// New save at the given clock with no budget fields yet
    pub fn new(name: impl Into<String>, universal_time: f64, funds: f64, reputation: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            saved_at: Utc::now(),
            universal_time,
            funds,
            reputation,
            budget: PersistedBudget::default(),
        }
    }
}

/// JSON save store rooted at a directory
pub struct SaveStore {
    storage_dir: PathBuf,
}

impl SaveStore {
    /// Open store, creating the directory if needed
    pub fn new(storage_dir: impl Into<PathBuf>) -> Result<Self> {
        let storage_dir = storage_dir.into();
        if !storage_dir.exists() {
            fs::create_dir_all(&storage_dir)
                .context("Failed to create save directory")?;
        }
        Ok(Self { storage_dir })
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            bail!("Invalid save name '{}': use letters, digits, '-' or '_'", name);
        }
        Ok(self.storage_dir.join(format!("{}.json", name)))
    }

    /// Write save to disk, stamping the save time
    pub fn save(&self, save: &mut SaveGame) -> Result<PathBuf> {
        let path = self.path_for(&save.name)?;
        save.saved_at = Utc::now();

        let json = serde_json::to_string_pretty(save)
            .context("Failed to serialize save")?;
        fs::write(&path, json)
            .context("Failed to write save file")?;

        Ok(path)
    }

    /// Load save if present
    pub fn load(&self, name: &str) -> Result<Option<SaveGame>> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path)
            .context("Failed to read save file")?;
        let save: SaveGame = serde_json::from_str(&json)
            .context("Failed to deserialize save")?;

        Ok(Some(save))
    }

    /// Load save, failing if it does not exist
    pub fn load_required(&self, name: &str) -> Result<SaveGame> {
        self.load(name)?
            .ok_or_else(|| BudgetError::SaveNotFound(name.to_string()).into())
    }

    /// List saved names
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();

        for entry in fs::read_dir(&self.storage_dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// Delete save
    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        if path.exists() {
            fs::remove_file(&path)
                .context("Failed to delete save file")?;
        }
        Ok(())
    }

    /// Get storage directory
    pub fn storage_dir(&self) -> &PathBuf {
        &self.storage_dir
    }
}
