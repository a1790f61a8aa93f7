use crate::cost_item::CostItem;
use crate::snapshot::ProjectSnapshot;
use site_schedule::task_validation;
use std::collections::HashSet;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("no project stored")]
    NotFound,
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Somewhere a whole project snapshot can be kept between sessions.
pub trait SnapshotStore {
    fn save_snapshot(&self, snapshot: &ProjectSnapshot) -> PersistenceResult<()>;
    fn load_snapshot(&self) -> PersistenceResult<Option<ProjectSnapshot>>;
}

fn validate_cost_items(items: &[CostItem]) -> PersistenceResult<()> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(item.id) {
            return Err(PersistenceError::InvalidData(format!(
                "duplicate cost item id {}",
                item.id
            )));
        }
        item.validate()
            .map_err(|err| PersistenceError::InvalidData(err.to_string()))?;
    }
    Ok(())
}

/// Record-level checks only; structural problems surface on recompute.
pub fn validate_snapshot(snapshot: &ProjectSnapshot) -> PersistenceResult<()> {
    snapshot
        .metadata
        .validate()
        .map_err(|err| PersistenceError::InvalidData(err.to_string()))?;
    task_validation::validate_task_collection(&snapshot.tasks)
        .map_err(|err| PersistenceError::InvalidData(err.to_string()))?;
    validate_cost_items(&snapshot.cost_items)
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    load_snapshot_from_csv, load_snapshot_from_json, save_snapshot_to_csv, save_snapshot_to_json,
};
