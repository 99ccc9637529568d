// crates/types/src/lib.rs
//! Shared serializable types for the houseview console.
//!
//! Everything in this crate crosses the wire to the browser frontend (the
//! `#[ts(export)]` attributes generate the matching TypeScript definitions)
//! or is part of the panel engine's public vocabulary.

pub mod connection;
pub mod descriptor;
pub mod options;
pub mod result_set;
pub mod settings;
pub mod time_span;
pub mod visual;

pub use connection::ConnectionConfig;
pub use descriptor::{FieldHints, PaginationMode, PanelDescriptor, PanelKind, SortDirection, SortSpec};
pub use options::RefreshOptions;
pub use result_set::{ColumnMeta, QueryStatistics, ResultSet, Row};
pub use settings::QuerySettings;
pub use time_span::{TimeSpan, TimeSpanError};
pub use visual::PanelVisualState;
