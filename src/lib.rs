pub mod api;
pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::Config;
pub use datasource::{
    ChainSnapshotReader, DataSourceError, IndexerClient, LivePriceFeed, MockDataSource,
};
pub use domain::{Address, Asset, Fixed18, Fixed6, PositionSide, TimeMs, Version};
pub use engine::{live_overlay, reconcile, LivePnl, PositionPnl, ReconcileInput};
pub use error::{AppError, EngineError, IntegrityViolation};
