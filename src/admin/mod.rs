//! Admin change-lists over the ERP entities.

pub mod export;
pub mod listing;
pub mod registry;

pub use listing::{ListParams, Page};
pub use registry::{Column, ColumnKind, MODEL_ADMINS, ModelAdmin, SortDirection, find_by_slug};
