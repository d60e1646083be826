//! Services Layer
//!
//! Screen-level coordination on top of the stores. Services own no data of
//! their own beyond transient flow state; everything durable lives in the
//! stores on [`AppState`](crate::state::AppState).
//!
//! # Architecture
//!
//! ```text
//! Rendering layer --> Services --> Stores --> Storage / Stocks API
//! ```
//!
//! # Services
//!
//! - `StocksService` - Listing view model, filter and pagination actions
//! - `SyncService` - Sync limit validation, confirmation and status

pub mod format;
pub mod stocks_service;
pub mod sync_service;

pub use format::relative_time_key;
pub use stocks_service::{FilterFormValues, StocksService, StocksViewModel};
pub use sync_service::{SyncLimitInput, SyncLimitPolicy, SyncPhase, SyncService, SyncStatusView};
