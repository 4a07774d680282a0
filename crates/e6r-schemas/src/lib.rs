//! e6r-schemas
//!
//! Shared wire contracts for the engine connector: the deployment tag, the
//! per-call metadata headers, the request/response payload for every engine
//! RPC, and the columnar chunk model delivered by result fetches.
//!
//! This crate is plain data only. No transport, no IO, no locking — those
//! live in e6r-session / e6r-invoker / e6r-pool. The generated gRPC stubs
//! convert these structs to and from their protobuf counterparts
//! mechanically; everything above the stub layer works in terms of the types
//! defined here.

mod headers;
mod messages;
mod tag;
mod vector;

pub use headers::{
    CallHeaders, HEADER_CLUSTER_UUID, HEADER_PLANNER_IP, HEADER_STRATEGY, TRAILER_NEW_STRATEGY,
};
pub use messages::{
    AddCatalogsRequest, AddCatalogsResponse, AuthenticateRequest, AuthenticateResponse,
    CancelQueryRequest, CancelQueryResponse, ClearOrCancelRequest, ClearOrCancelResponse,
    ClearRequest, ClearResponse, ColumnInfo, ColumnsRequest, ColumnsResponse, DryRunRequest,
    DryRunResponse, ExecuteStatementRequest, ExecuteStatementResponse, ExplainAnalyzeRequest,
    ExplainAnalyzeResponse, ExplainRequest, ExplainResponse, FailedSchemaElement,
    GetAddCatalogsResultRequest, GetAddCatalogsResultResponse, GetCatalogsRequest,
    GetCatalogsResponse, GetNextResultBatchRequest, GetNextResultBatchResponse,
    GetResultMetadataRequest, GetResultMetadataResponse, PrepareStatementRequest,
    PrepareStatementResponse, RefreshCatalogsRequest, RefreshCatalogsResponse, ResponseHint,
    RpcParameter, SchemaNamesRequest, SchemaNamesResponse, SetPropsRequest, SetPropsResponse,
    StatusRequest, StatusResponse, TablesRequest, TablesResponse, UpdateUsersRequest,
    UpdateUsersResponse,
};
pub use tag::{DeploymentTag, ParseTagError};
pub use vector::{Chunk, FieldInfo, Vector, VectorData, VectorType};

/// Marker embedded in the detail text of an RPC error when the request
/// carried a deployment tag the server no longer serves.
pub const WRONG_STRATEGY_MARKER: &str = "456";

/// Marker embedded in the detail text of an RPC error when the session id
/// (or the credentials behind it) has been rejected.
pub const ACCESS_DENIED_MARKER: &str = "Access denied";
