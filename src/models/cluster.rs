//! Entity clusters produced by the linker.

use serde::{Deserialize, Serialize};

/// What kind of real-world subject a cluster refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Person,
    Org,
    Bank,
    Address,
    Other,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Person => "person",
            EntityKind::Org => "org",
            EntityKind::Bank => "bank",
            EntityKind::Address => "address",
            EntityKind::Other => "other",
        }
    }
}

/// A stable grouping of spans referring to the same real-world subject.
///
/// Clusters are created by the linker and immutable afterwards. The id is
/// derived from the keyed seed so two runs over the same document with the
/// same secret produce identical ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityCluster {
    /// Stable cluster identifier
    pub cluster_id: String,

    /// Subject kind
    pub kind: EntityKind,

    /// Longest / most specific mention surface
    pub canonical_form: String,

    /// Cluster anchored on a role-only alias ("Buyer", "Tenant", ...)
    pub is_role: bool,

    /// Alias surfaces linked to this cluster, in definition order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl EntityCluster {
    pub fn new(
        cluster_id: impl Into<String>,
        kind: EntityKind,
        canonical_form: impl Into<String>,
    ) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            kind,
            canonical_form: canonical_form.into(),
            is_role: false,
            aliases: Vec::new(),
        }
    }
}
