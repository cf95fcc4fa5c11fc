//! kristx - Krist block explorer table
//!
//! A paginated, sortable, server-backed table of Krist blocks. The interesting part is
//! the lookup core that keeps the table in step with the remote lookup API:
//!
//! - [`options`]: immutable `LookupOptions` and the pure `apply_change` transition
//! - [`coordinator`]: issues lookups, tags them with a generation, and applies only the
//!   current one when it settles
//! - [`table`]: both wired to a refresh epoch and a settlement channel
//!
//! The rest is plumbing around it: the Krist HTTP client, column and pagination
//! declarations, and a terminal view.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --features native -- --node-url https://krist.dev
//! ```

// Lookup core
pub mod coordinator;
pub mod endpoint;
pub mod options;
pub mod table;

pub mod config;
pub mod types;
pub mod util_text;

// Krist lookup API client
pub mod krist_api;
pub mod net;

// Presentation
pub mod app;
pub mod columns;
pub mod pagination;
pub mod ui;

// Diagnostic logging
pub mod debug;

// Re-export commonly used types
pub use app::App;
pub use config::Config;
pub use coordinator::{Generation, LookupCoordinator, LookupState, Phase, RefreshEpoch, SettleOutcome};
pub use endpoint::{LookupEndpoint, LookupError};
pub use options::{apply_change, LookupOptions, QueryOptionsStore, SortField, SortOrder, TableChange};
pub use table::{BlocksTable, LookupTable};
pub use types::{KristBlock, LookupResult};
