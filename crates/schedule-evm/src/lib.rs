pub mod cost_item;
pub mod engine;
pub mod error;
pub mod evm;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod linker;
pub mod persistence;
pub mod report;
pub mod session;
pub mod snapshot;

pub use cost_item::{CostItem, CostItemId};
pub use engine::{recompute, recompute_batch};
pub use error::EngineError;
pub use evm::{EvmMetrics, EvmTotals, aggregate, round_money, round_ratio};
pub use linker::{FinancialLinker, LinkChange, LinkError, WindowPolicy};
pub use persistence::{
    PersistenceError, PersistenceResult, SnapshotStore, load_snapshot_from_csv,
    load_snapshot_from_json, save_snapshot_to_csv, save_snapshot_to_json, validate_snapshot,
};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteSnapshotStore;
pub use report::{cash_flow_buckets, task_table};
pub use session::ProjectSession;
pub use snapshot::{EngineSettings, ProjectSnapshot, RecomputeOutput};
