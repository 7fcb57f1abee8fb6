pub mod api;
pub mod artifact;
pub mod bisect;
pub mod bug;
pub mod config;
pub mod error;
pub mod events;
pub mod ingest;
pub mod ledger;
pub mod model;
pub mod render;

pub use api::dashboard::{Dashboard, JsonResponse};
pub use api::wire::BugId;
pub use error::{DashboardError, Result};
