use e6r_schemas::{DeploymentTag, FieldInfo};

// ---------------------------------------------------------------------------
// QueryHandle
// ---------------------------------------------------------------------------

/// Everything the connector tracks about one prepared query.
///
/// `engine_ip` is the endpoint the prepare response nominated for this query
/// — it may differ from the session endpoint, and every follow-up RPC
/// targets it via the `plannerip` header. `tag` is the deployment tag the
/// query was prepared under (also pinned in the strategy coordinator's
/// registry until clear/cancel).
///
/// `columns` and `row_count_hint` start empty; callers fill them from the
/// decoded result metadata when they fetch it.
#[derive(Debug, Clone)]
pub struct QueryHandle {
    pub query_id: String,
    pub engine_ip: Option<String>,
    pub tag: Option<DeploymentTag>,
    pub columns: Vec<FieldInfo>,
    pub row_count_hint: Option<i64>,
}

impl QueryHandle {
    pub(crate) fn new(
        query_id: String,
        engine_ip: Option<String>,
        tag: Option<DeploymentTag>,
    ) -> Self {
        QueryHandle {
            query_id,
            engine_ip,
            tag,
            columns: Vec::new(),
            row_count_hint: None,
        }
    }
}
