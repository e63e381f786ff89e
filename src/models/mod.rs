//! Data transfer objects (DTOs) for API responses.
//!
//! These structs are serialized to JSON for frontend consumption.
//! - `depot`: Depot, DepotSummary, BranchInfo, CommitInfo
//! - `picker`: PanelView and the partial-update payloads of the branch picker
//! - `session`: LoginRequest, SessionInfo, AppInfo

pub mod depot;
pub mod picker;
pub mod session;

pub use depot::*;
pub use picker::*;
pub use session::*;
