//! Data models shared across the pipeline.

mod cluster;
mod plan;
mod span;

pub use cluster::{EntityCluster, EntityKind};
pub use plan::PlanEntry;
pub use span::{AccountSubtype, AddressLineKind, DateFormat, EntityLabel, Span, SpanAttrs};
