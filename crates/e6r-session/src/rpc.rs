//! Transport seam.
//!
//! [`EngineRpc`] is the full engine service surface as the connector core
//! sees it: one async method per RPC, each taking the per-call metadata
//! headers alongside the payload and returning the raw [`tonic::Status`] on
//! failure. The generated stubs implement it over a real channel (mapping
//! [`e6r_schemas::CallHeaders`] onto request metadata and the message size
//! caps onto the codec); the test kit implements it in memory.
//!
//! v1/v2 pairs are distinct methods over shared payload types — the stubs
//! diverge mechanically, the contract does not.

use std::sync::Arc;

use async_trait::async_trait;
use tonic::Status;

use e6r_schemas::*;

use crate::channel::ChannelOptions;
use crate::error::SessionError;

#[async_trait]
pub trait EngineRpc: Send + Sync + 'static {
    async fn authenticate(
        &self,
        headers: &CallHeaders,
        req: AuthenticateRequest,
    ) -> Result<AuthenticateResponse, Status>;

    async fn prepare_statement(
        &self,
        headers: &CallHeaders,
        req: PrepareStatementRequest,
    ) -> Result<PrepareStatementResponse, Status>;

    async fn prepare_statement_v2(
        &self,
        headers: &CallHeaders,
        req: PrepareStatementRequest,
    ) -> Result<PrepareStatementResponse, Status>;

    async fn execute_statement(
        &self,
        headers: &CallHeaders,
        req: ExecuteStatementRequest,
    ) -> Result<ExecuteStatementResponse, Status>;

    async fn execute_statement_v2(
        &self,
        headers: &CallHeaders,
        req: ExecuteStatementRequest,
    ) -> Result<ExecuteStatementResponse, Status>;

    async fn get_result_metadata(
        &self,
        headers: &CallHeaders,
        req: GetResultMetadataRequest,
    ) -> Result<GetResultMetadataResponse, Status>;

    async fn get_next_result_batch(
        &self,
        headers: &CallHeaders,
        req: GetNextResultBatchRequest,
    ) -> Result<GetNextResultBatchResponse, Status>;

    async fn status(&self, headers: &CallHeaders, req: StatusRequest)
        -> Result<StatusResponse, Status>;

    async fn clear(&self, headers: &CallHeaders, req: ClearRequest)
        -> Result<ClearResponse, Status>;

    async fn cancel_query(
        &self,
        headers: &CallHeaders,
        req: CancelQueryRequest,
    ) -> Result<CancelQueryResponse, Status>;

    async fn clear_or_cancel(
        &self,
        headers: &CallHeaders,
        req: ClearOrCancelRequest,
    ) -> Result<ClearOrCancelResponse, Status>;

    async fn explain(&self, headers: &CallHeaders, req: ExplainRequest)
        -> Result<ExplainResponse, Status>;

    async fn explain_analyze(
        &self,
        headers: &CallHeaders,
        req: ExplainAnalyzeRequest,
    ) -> Result<ExplainAnalyzeResponse, Status>;

    async fn dry_run(&self, headers: &CallHeaders, req: DryRunRequest)
        -> Result<DryRunResponse, Status>;

    async fn dry_run_v2(
        &self,
        headers: &CallHeaders,
        req: DryRunRequest,
    ) -> Result<DryRunResponse, Status>;

    async fn schema_names(
        &self,
        headers: &CallHeaders,
        req: SchemaNamesRequest,
    ) -> Result<SchemaNamesResponse, Status>;

    async fn schema_names_v2(
        &self,
        headers: &CallHeaders,
        req: SchemaNamesRequest,
    ) -> Result<SchemaNamesResponse, Status>;

    async fn tables(&self, headers: &CallHeaders, req: TablesRequest)
        -> Result<TablesResponse, Status>;

    async fn tables_v2(
        &self,
        headers: &CallHeaders,
        req: TablesRequest,
    ) -> Result<TablesResponse, Status>;

    async fn columns(&self, headers: &CallHeaders, req: ColumnsRequest)
        -> Result<ColumnsResponse, Status>;

    async fn columns_v2(
        &self,
        headers: &CallHeaders,
        req: ColumnsRequest,
    ) -> Result<ColumnsResponse, Status>;

    async fn add_catalogs(
        &self,
        headers: &CallHeaders,
        req: AddCatalogsRequest,
    ) -> Result<AddCatalogsResponse, Status>;

    async fn get_add_catalogs_result(
        &self,
        headers: &CallHeaders,
        req: GetAddCatalogsResultRequest,
    ) -> Result<GetAddCatalogsResultResponse, Status>;

    async fn get_catalogs(
        &self,
        headers: &CallHeaders,
        req: GetCatalogsRequest,
    ) -> Result<GetCatalogsResponse, Status>;

    async fn refresh_catalogs(
        &self,
        headers: &CallHeaders,
        req: RefreshCatalogsRequest,
    ) -> Result<RefreshCatalogsResponse, Status>;

    async fn set_props(
        &self,
        headers: &CallHeaders,
        req: SetPropsRequest,
    ) -> Result<SetPropsResponse, Status>;

    async fn update_users(
        &self,
        headers: &CallHeaders,
        req: UpdateUsersRequest,
    ) -> Result<UpdateUsersResponse, Status>;

    /// Cheap liveness check used by the pool's optional pre-ping. Transport
    /// implementations map this to channel readiness; the default says alive.
    async fn probe(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// EngineDial
// ---------------------------------------------------------------------------

/// Factory that turns an endpoint plus channel options into a live
/// [`EngineRpc`]. Production dials call [`crate::channel::build_channel`] and
/// attach the generated stubs; the test kit hands out in-memory engines.
#[async_trait]
pub trait EngineDial: Send + Sync + 'static {
    async fn dial(
        &self,
        endpoint: &str,
        options: &ChannelOptions,
    ) -> Result<Arc<dyn EngineRpc>, SessionError>;
}
