// crates/core/src/lib.rs
//! The houseview panel engine.
//!
//! Everything a refreshable visualization panel needs between a descriptor
//! and rendered data: time-span placeholder substitution, SQL sort/pagination
//! rewriting, the refresh state machine with dedup and deferral, in-flight
//! request cancellation, per-kind response shaping, and the query transport
//! seam the HTTP implementation plugs into.

pub mod context;
pub mod error;
pub mod fetcher;
pub mod refresh;
pub mod shape;
pub mod slot;
pub mod sqlrw;
pub mod timespan;
pub mod transport;
pub mod visibility;

pub use context::ConnectionStore;
pub use error::PanelError;
pub use fetcher::{PanelFetcher, RefreshOutcome};
pub use refresh::{PanelPhase, RefreshController, RefreshDecision};
pub use shape::PanelData;
pub use slot::RequestSlot;
pub use sqlrw::{apply_limit_offset, replace_order_by};
pub use timespan::substitute_time_span;
pub use transport::{PendingQuery, QueryResponse, QueryTransport, TransportError};
pub use visibility::{
    is_component_in_view, AlwaysVisible, AncestorStyle, NodeRect, NodeSnapshot, SharedVisibility,
    VisibilityProvider,
};
