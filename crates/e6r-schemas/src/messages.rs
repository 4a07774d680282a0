//! Request/response payloads for every engine RPC.
//!
//! One struct pair per operation, carrying exactly the fields the connector
//! core consumes. v1/v2 operation pairs share payload types — the stubs
//! diverge, the contract does not. Every response exposes its optional
//! next-tag hint through [`ResponseHint`] so the invoker can feed the
//! strategy coordinator from a single site.

use serde::{Deserialize, Serialize};

use crate::vector::Chunk;

// ---------------------------------------------------------------------------
// ResponseHint
// ---------------------------------------------------------------------------

/// Access to the optional `new_strategy` field present on most responses.
///
/// The raw string is surfaced untouched; normalization (lower-casing,
/// rejecting values outside blue/green) happens at the single invoker-side
/// intake, not here.
pub trait ResponseHint {
    fn new_strategy_hint(&self) -> Option<&str>;
}

macro_rules! impl_response_hint {
    ($($ty:ty),+ $(,)?) => {
        $(impl ResponseHint for $ty {
            fn new_strategy_hint(&self) -> Option<&str> {
                self.new_strategy.as_deref()
            }
        })+
    };
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticateRequest {
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticateResponse {
    pub session_id: String,
    pub new_strategy: Option<String>,
}

// ---------------------------------------------------------------------------
// Prepare / execute
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareStatementRequest {
    pub session_id: String,
    pub schema: Option<String>,
    /// v2 only; v1 stubs drop it.
    pub catalog: Option<String>,
    pub query_string: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareStatementResponse {
    pub query_id: String,
    /// Engine endpoint (`host:port`) all follow-up calls for this query must
    /// target. May differ from the session endpoint.
    pub engine_ip: Option<String>,
    pub new_strategy: Option<String>,
}

/// A positional statement parameter. `value = None` binds SQL NULL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcParameter {
    pub field_type: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteStatementRequest {
    pub session_id: String,
    pub query_id: String,
    /// v2 only; v1 stubs send an empty list.
    pub params: Vec<RpcParameter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteStatementResponse {
    pub new_strategy: Option<String>,
}

// ---------------------------------------------------------------------------
// Result retrieval
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetResultMetadataRequest {
    pub session_id: String,
    pub query_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetResultMetadataResponse {
    /// Big-endian row-metadata stream (row count + field descriptors).
    pub result_meta: Vec<u8>,
    pub new_strategy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetNextResultBatchRequest {
    pub session_id: String,
    pub query_id: String,
}

/// One batch of results. The engine delivers either a columnar [`Chunk`] or
/// a raw big-endian row blob, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetNextResultBatchResponse {
    pub chunk: Option<Chunk>,
    pub row_batch: Option<Vec<u8>>,
    pub is_end_of_results: bool,
    pub new_strategy: Option<String>,
}

// ---------------------------------------------------------------------------
// Query lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRequest {
    pub session_id: String,
    pub query_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub row_count: i64,
    pub new_strategy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearRequest {
    pub session_id: String,
    pub query_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearResponse {
    pub new_strategy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelQueryRequest {
    pub session_id: String,
    pub query_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelQueryResponse {
    pub new_strategy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearOrCancelRequest {
    pub session_id: String,
    pub query_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearOrCancelResponse {
    pub new_strategy: Option<String>,
}

// ---------------------------------------------------------------------------
// Plan inspection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainRequest {
    pub session_id: String,
    pub query_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainResponse {
    pub explain: String,
    pub new_strategy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainAnalyzeRequest {
    pub session_id: String,
    pub query_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainAnalyzeResponse {
    pub explain_analyze: String,
    pub new_strategy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DryRunRequest {
    pub session_id: String,
    pub schema: Option<String>,
    /// v2 only; v1 stubs drop it.
    pub catalog: Option<String>,
    pub query_string: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DryRunResponse {
    pub dry_run_result: String,
    pub new_strategy: Option<String>,
}

// ---------------------------------------------------------------------------
// Introspection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaNamesRequest {
    pub session_id: String,
    /// v2 only; v1 stubs drop it.
    pub catalog: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaNamesResponse {
    pub schemas: Vec<String>,
    pub new_strategy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablesRequest {
    pub session_id: String,
    pub schema: String,
    /// v2 only; v1 stubs drop it.
    pub catalog: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablesResponse {
    pub tables: Vec<String>,
    pub new_strategy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub field_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnsRequest {
    pub session_id: String,
    pub schema: String,
    pub table: String,
    /// v2 only; v1 stubs drop it.
    pub catalog: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnsResponse {
    pub columns: Vec<ColumnInfo>,
    pub new_strategy: Option<String>,
}

// ---------------------------------------------------------------------------
// Catalog management
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCatalogsRequest {
    pub session_id: String,
    /// Catalog definitions as a JSON document; the engine validates shape.
    pub catalogs_json: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCatalogsResponse {
    pub status: String,
    pub new_strategy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetAddCatalogsResultRequest {
    pub session_id: String,
}

/// A schema the engine could not attach during add-catalogs. Surfaced as
/// data, not as an RPC failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedSchemaElement {
    pub catalog: String,
    pub schema: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetAddCatalogsResultResponse {
    pub status: String,
    pub failures: Vec<FailedSchemaElement>,
    pub new_strategy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetCatalogsRequest {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetCatalogsResponse {
    pub catalogs: Vec<String>,
    pub new_strategy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshCatalogsRequest {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshCatalogsResponse {
    pub status: String,
    pub new_strategy: Option<String>,
}

// ---------------------------------------------------------------------------
// Session administration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetPropsRequest {
    pub session_id: String,
    /// Session properties as a JSON document.
    pub props_json: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetPropsResponse {
    pub status: String,
    pub new_strategy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUsersRequest {
    pub session_id: String,
    /// User update payload as a JSON document.
    pub users_json: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUsersResponse {
    pub status: String,
    pub new_strategy: Option<String>,
}

impl_response_hint!(
    AuthenticateResponse,
    PrepareStatementResponse,
    ExecuteStatementResponse,
    GetResultMetadataResponse,
    GetNextResultBatchResponse,
    StatusResponse,
    ClearResponse,
    CancelQueryResponse,
    ClearOrCancelResponse,
    ExplainResponse,
    ExplainAnalyzeResponse,
    DryRunResponse,
    SchemaNamesResponse,
    TablesResponse,
    ColumnsResponse,
    AddCatalogsResponse,
    GetAddCatalogsResultResponse,
    GetCatalogsResponse,
    RefreshCatalogsResponse,
    SetPropsResponse,
    UpdateUsersResponse,
);
