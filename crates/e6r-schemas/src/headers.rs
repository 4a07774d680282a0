use crate::tag::DeploymentTag;

/// Metadata key carrying the deployment tag. Omitted when no tag is known.
pub const HEADER_STRATEGY: &str = "strategy";

/// Metadata key carrying the engine endpoint for per-query follow-up calls.
pub const HEADER_PLANNER_IP: &str = "plannerip";

/// Metadata key selecting a cluster when the caller targets a multi-cluster
/// control plane.
pub const HEADER_CLUSTER_UUID: &str = "cluster-uuid";

/// Trailer key on which failed responses may still carry a next-tag hint.
pub const TRAILER_NEW_STRATEGY: &str = "new-strategy";

// ---------------------------------------------------------------------------
// CallHeaders
// ---------------------------------------------------------------------------

/// Request metadata attached to every outbound RPC.
///
/// `strategy` is `None` only while no tag has been discovered yet (or the
/// coordinator was invalidated); the header is then omitted entirely rather
/// than sent empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallHeaders {
    pub strategy: Option<DeploymentTag>,
    /// Engine endpoint (`host:port`) returned at prepare time; set on every
    /// follow-up call for that query.
    pub planner_ip: Option<String>,
    pub cluster_uuid: Option<String>,
}

impl CallHeaders {
    pub fn with_strategy(tag: DeploymentTag) -> Self {
        CallHeaders {
            strategy: Some(tag),
            planner_ip: None,
            cluster_uuid: None,
        }
    }
}
