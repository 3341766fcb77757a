pub mod config;
pub mod metrics_export;
pub mod observability;
pub mod pipeline;
pub mod repository;
pub mod session;
pub mod sinks;
pub mod sources;
pub mod store;
pub mod transform;

pub use pipeline::{Envelope, Pipeline};
pub use repository::{LookupError, RoomLocation, RoomRepository};
pub use session::{BillingService, RoomState, RoomSummary, Session};
pub use store::{DocumentStore, JsonSnapshotStore, StoreError};
