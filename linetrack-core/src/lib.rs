#![forbid(unsafe_code)]

pub mod calc;
pub mod controller;
pub mod domain;
pub mod error;
pub mod policy;
pub mod schema;
pub mod store;
pub mod store_csv;
pub mod store_factory;

// Re-exports: stable API surface
pub use calc::{compute_line_progress, compute_total_progress, recompute};
pub use controller::{Command, Controller, LoadOutcome, RenderPayload, Status, StatusKind};
pub use domain::{ProgressRecord, ProgressTable};
pub use policy::LoadPolicy;
pub use schema::{Schema, SchemaVariant};
