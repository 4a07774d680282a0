//! Scriptable in-memory engine.
//!
//! `MockEngine` implements the full RPC surface with a small amount of
//! server-shaped behavior: it serves a configurable set of deployment tags
//! (anything else is rejected with the distinguished wrong-tag error),
//! issues session ids from `authenticate` and rejects stale ones with the
//! distinguished access-denied error, attaches queued next-tag hints to
//! successful responses, and records every call (operation, strategy
//! header, planner endpoint, session id) for assertions.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tonic::{Code, Status};

use e6r_schemas::*;
use e6r_session::{ChannelOptions, EngineDial, EngineRpc, SessionError};

fn wrong_strategy_status() -> Status {
    Status::with_details(
        Code::PermissionDenied,
        "engine rejected deployment tag",
        "status: 456".as_bytes().to_vec().into(),
    )
}

fn access_denied_status() -> Status {
    Status::new(Code::PermissionDenied, "Access denied: invalid session")
}

// ---------------------------------------------------------------------------
// CallRecord
// ---------------------------------------------------------------------------

/// One observed RPC, as the server saw it.
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub op: String,
    pub strategy: Option<String>,
    pub planner_ip: Option<String>,
    pub session_id: String,
}

// ---------------------------------------------------------------------------
// MockEngine
// ---------------------------------------------------------------------------

struct MockState {
    /// Tags the server currently accepts. During a blue/green handover both
    /// deployments serve, so this is a set, not a single tag.
    serving: Vec<DeploymentTag>,
    /// Hints handed out on successive successful responses.
    hints: VecDeque<String>,
    /// Scripted outright failures, consumed before any other behavior.
    failures: VecDeque<Status>,
    /// When set, every non-auth call is denied even with a valid session.
    always_deny: bool,
    valid_session: Option<String>,
    auth_count: u32,
    last_auth: Option<(String, String)>,
    prepared: u32,
    engine_ip: Option<String>,
    meta_payload: Vec<u8>,
    batches: VecDeque<GetNextResultBatchResponse>,
    probe_ok: bool,
    calls: Vec<CallRecord>,
}

pub struct MockEngine {
    state: Mutex<MockState>,
    probe_count: AtomicU32,
}

impl MockEngine {
    pub fn new(serving: &[DeploymentTag]) -> Arc<MockEngine> {
        Arc::new(MockEngine {
            state: Mutex::new(MockState {
                serving: serving.to_vec(),
                hints: VecDeque::new(),
                failures: VecDeque::new(),
                always_deny: false,
                valid_session: None,
                auth_count: 0,
                last_auth: None,
                prepared: 0,
                engine_ip: None,
                meta_payload: Vec::new(),
                batches: VecDeque::new(),
                probe_ok: true,
                calls: Vec::new(),
            }),
            probe_count: AtomicU32::new(0),
        })
    }

    // -- scripting ----------------------------------------------------------

    pub fn set_serving(&self, serving: &[DeploymentTag]) {
        self.lock().serving = serving.to_vec();
    }

    pub fn push_hint(&self, hint: &str) {
        self.lock().hints.push_back(hint.to_string());
    }

    pub fn push_failure(&self, status: Status) {
        self.lock().failures.push_back(status);
    }

    /// Invalidate the current session id: the next non-auth call is denied.
    pub fn expire_session(&self) {
        self.lock().valid_session = None;
    }

    pub fn set_always_deny(&self, deny: bool) {
        self.lock().always_deny = deny;
    }

    pub fn set_engine_ip(&self, ip: Option<&str>) {
        self.lock().engine_ip = ip.map(str::to_string);
    }

    pub fn set_meta_payload(&self, payload: Vec<u8>) {
        self.lock().meta_payload = payload;
    }

    pub fn push_batch(&self, batch: GetNextResultBatchResponse) {
        self.lock().batches.push_back(batch);
    }

    pub fn set_probe_ok(&self, ok: bool) {
        self.lock().probe_ok = ok;
    }

    // -- observation --------------------------------------------------------

    pub fn calls(&self) -> Vec<CallRecord> {
        self.lock().calls.clone()
    }

    pub fn calls_for(&self, op: &str) -> Vec<CallRecord> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.op == op)
            .cloned()
            .collect()
    }

    pub fn auth_count(&self) -> u32 {
        self.lock().auth_count
    }

    pub fn last_auth(&self) -> Option<(String, String)> {
        self.lock().last_auth.clone()
    }

    pub fn probe_count(&self) -> u32 {
        self.probe_count.load(Ordering::Relaxed)
    }

    // -- internals ----------------------------------------------------------

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock mutex poisoned")
    }

    /// Common entry for every non-auth call: record, apply scripted
    /// failures, enforce the tag and session, pop a hint for the response.
    fn begin(
        &self,
        op: &'static str,
        headers: &CallHeaders,
        session_id: &str,
    ) -> Result<Option<String>, Status> {
        let mut state = self.lock();
        state.calls.push(CallRecord {
            op: op.to_string(),
            strategy: headers.strategy.map(|t| t.as_str().to_string()),
            planner_ip: headers.planner_ip.clone(),
            session_id: session_id.to_string(),
        });
        if let Some(status) = state.failures.pop_front() {
            return Err(status);
        }
        match headers.strategy {
            Some(tag) if state.serving.contains(&tag) => {}
            _ => return Err(wrong_strategy_status()),
        }
        if state.always_deny || state.valid_session.as_deref() != Some(session_id) {
            return Err(access_denied_status());
        }
        Ok(state.hints.pop_front())
    }
}

// ---------------------------------------------------------------------------
// EngineRpc implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl EngineRpc for MockEngine {
    async fn authenticate(
        &self,
        headers: &CallHeaders,
        req: AuthenticateRequest,
    ) -> Result<AuthenticateResponse, Status> {
        let mut state = self.lock();
        state.calls.push(CallRecord {
            op: "authenticate".to_string(),
            strategy: headers.strategy.map(|t| t.as_str().to_string()),
            planner_ip: headers.planner_ip.clone(),
            session_id: String::new(),
        });
        if let Some(status) = state.failures.pop_front() {
            return Err(status);
        }
        match headers.strategy {
            Some(tag) if state.serving.contains(&tag) => {}
            _ => return Err(wrong_strategy_status()),
        }
        state.auth_count += 1;
        state.last_auth = Some((req.user, req.password));
        let session_id = format!("s{}", state.auth_count);
        state.valid_session = Some(session_id.clone());
        Ok(AuthenticateResponse {
            session_id,
            new_strategy: state.hints.pop_front(),
        })
    }

    async fn prepare_statement(
        &self,
        headers: &CallHeaders,
        req: PrepareStatementRequest,
    ) -> Result<PrepareStatementResponse, Status> {
        let hint = self.begin("prepare", headers, &req.session_id)?;
        let mut state = self.lock();
        state.prepared += 1;
        Ok(PrepareStatementResponse {
            query_id: format!("q{}", state.prepared),
            engine_ip: state.engine_ip.clone(),
            new_strategy: hint,
        })
    }

    async fn prepare_statement_v2(
        &self,
        headers: &CallHeaders,
        req: PrepareStatementRequest,
    ) -> Result<PrepareStatementResponse, Status> {
        self.prepare_statement(headers, req).await
    }

    async fn execute_statement(
        &self,
        headers: &CallHeaders,
        req: ExecuteStatementRequest,
    ) -> Result<ExecuteStatementResponse, Status> {
        let hint = self.begin("execute", headers, &req.session_id)?;
        Ok(ExecuteStatementResponse { new_strategy: hint })
    }

    async fn execute_statement_v2(
        &self,
        headers: &CallHeaders,
        req: ExecuteStatementRequest,
    ) -> Result<ExecuteStatementResponse, Status> {
        self.execute_statement(headers, req).await
    }

    async fn get_result_metadata(
        &self,
        headers: &CallHeaders,
        req: GetResultMetadataRequest,
    ) -> Result<GetResultMetadataResponse, Status> {
        let hint = self.begin("get-result-metadata", headers, &req.session_id)?;
        Ok(GetResultMetadataResponse {
            result_meta: self.lock().meta_payload.clone(),
            new_strategy: hint,
        })
    }

    async fn get_next_result_batch(
        &self,
        headers: &CallHeaders,
        req: GetNextResultBatchRequest,
    ) -> Result<GetNextResultBatchResponse, Status> {
        let hint = self.begin("get-next-result-batch", headers, &req.session_id)?;
        let mut response = self.lock().batches.pop_front().unwrap_or(
            GetNextResultBatchResponse {
                chunk: None,
                row_batch: None,
                is_end_of_results: true,
                new_strategy: None,
            },
        );
        response.new_strategy = hint;
        Ok(response)
    }

    async fn status(
        &self,
        headers: &CallHeaders,
        req: StatusRequest,
    ) -> Result<StatusResponse, Status> {
        let hint = self.begin("status", headers, &req.session_id)?;
        Ok(StatusResponse {
            status: "completed".to_string(),
            row_count: 0,
            new_strategy: hint,
        })
    }

    async fn clear(
        &self,
        headers: &CallHeaders,
        req: ClearRequest,
    ) -> Result<ClearResponse, Status> {
        let hint = self.begin("clear", headers, &req.session_id)?;
        Ok(ClearResponse { new_strategy: hint })
    }

    async fn cancel_query(
        &self,
        headers: &CallHeaders,
        req: CancelQueryRequest,
    ) -> Result<CancelQueryResponse, Status> {
        let hint = self.begin("cancel", headers, &req.session_id)?;
        Ok(CancelQueryResponse { new_strategy: hint })
    }

    async fn clear_or_cancel(
        &self,
        headers: &CallHeaders,
        req: ClearOrCancelRequest,
    ) -> Result<ClearOrCancelResponse, Status> {
        let hint = self.begin("clear-or-cancel", headers, &req.session_id)?;
        Ok(ClearOrCancelResponse { new_strategy: hint })
    }

    async fn explain(
        &self,
        headers: &CallHeaders,
        req: ExplainRequest,
    ) -> Result<ExplainResponse, Status> {
        let hint = self.begin("explain", headers, &req.session_id)?;
        Ok(ExplainResponse {
            explain: "plan".to_string(),
            new_strategy: hint,
        })
    }

    async fn explain_analyze(
        &self,
        headers: &CallHeaders,
        req: ExplainAnalyzeRequest,
    ) -> Result<ExplainAnalyzeResponse, Status> {
        let hint = self.begin("explain-analyze", headers, &req.session_id)?;
        Ok(ExplainAnalyzeResponse {
            explain_analyze: "plan+stats".to_string(),
            new_strategy: hint,
        })
    }

    async fn dry_run(
        &self,
        headers: &CallHeaders,
        req: DryRunRequest,
    ) -> Result<DryRunResponse, Status> {
        let hint = self.begin("dry-run", headers, &req.session_id)?;
        Ok(DryRunResponse {
            dry_run_result: "ok".to_string(),
            new_strategy: hint,
        })
    }

    async fn dry_run_v2(
        &self,
        headers: &CallHeaders,
        req: DryRunRequest,
    ) -> Result<DryRunResponse, Status> {
        self.dry_run(headers, req).await
    }

    async fn schema_names(
        &self,
        headers: &CallHeaders,
        req: SchemaNamesRequest,
    ) -> Result<SchemaNamesResponse, Status> {
        let hint = self.begin("schema-names", headers, &req.session_id)?;
        Ok(SchemaNamesResponse {
            schemas: vec!["default".to_string()],
            new_strategy: hint,
        })
    }

    async fn schema_names_v2(
        &self,
        headers: &CallHeaders,
        req: SchemaNamesRequest,
    ) -> Result<SchemaNamesResponse, Status> {
        self.schema_names(headers, req).await
    }

    async fn tables(
        &self,
        headers: &CallHeaders,
        req: TablesRequest,
    ) -> Result<TablesResponse, Status> {
        let hint = self.begin("tables", headers, &req.session_id)?;
        Ok(TablesResponse {
            tables: vec!["t1".to_string()],
            new_strategy: hint,
        })
    }

    async fn tables_v2(
        &self,
        headers: &CallHeaders,
        req: TablesRequest,
    ) -> Result<TablesResponse, Status> {
        self.tables(headers, req).await
    }

    async fn columns(
        &self,
        headers: &CallHeaders,
        req: ColumnsRequest,
    ) -> Result<ColumnsResponse, Status> {
        let hint = self.begin("columns", headers, &req.session_id)?;
        Ok(ColumnsResponse {
            columns: vec![ColumnInfo {
                name: "c1".to_string(),
                field_type: "LONG".to_string(),
            }],
            new_strategy: hint,
        })
    }

    async fn columns_v2(
        &self,
        headers: &CallHeaders,
        req: ColumnsRequest,
    ) -> Result<ColumnsResponse, Status> {
        self.columns(headers, req).await
    }

    async fn add_catalogs(
        &self,
        headers: &CallHeaders,
        req: AddCatalogsRequest,
    ) -> Result<AddCatalogsResponse, Status> {
        let hint = self.begin("add-catalogs", headers, &req.session_id)?;
        Ok(AddCatalogsResponse {
            status: "submitted".to_string(),
            new_strategy: hint,
        })
    }

    async fn get_add_catalogs_result(
        &self,
        headers: &CallHeaders,
        req: GetAddCatalogsResultRequest,
    ) -> Result<GetAddCatalogsResultResponse, Status> {
        let hint = self.begin("get-add-catalogs-result", headers, &req.session_id)?;
        Ok(GetAddCatalogsResultResponse {
            status: "done".to_string(),
            failures: Vec::new(),
            new_strategy: hint,
        })
    }

    async fn get_catalogs(
        &self,
        headers: &CallHeaders,
        req: GetCatalogsRequest,
    ) -> Result<GetCatalogsResponse, Status> {
        let hint = self.begin("get-catalogs", headers, &req.session_id)?;
        Ok(GetCatalogsResponse {
            catalogs: vec!["glue".to_string()],
            new_strategy: hint,
        })
    }

    async fn refresh_catalogs(
        &self,
        headers: &CallHeaders,
        req: RefreshCatalogsRequest,
    ) -> Result<RefreshCatalogsResponse, Status> {
        let hint = self.begin("refresh-catalogs", headers, &req.session_id)?;
        Ok(RefreshCatalogsResponse {
            status: "refreshed".to_string(),
            new_strategy: hint,
        })
    }

    async fn set_props(
        &self,
        headers: &CallHeaders,
        req: SetPropsRequest,
    ) -> Result<SetPropsResponse, Status> {
        let hint = self.begin("set-props", headers, &req.session_id)?;
        Ok(SetPropsResponse {
            status: "ok".to_string(),
            new_strategy: hint,
        })
    }

    async fn update_users(
        &self,
        headers: &CallHeaders,
        req: UpdateUsersRequest,
    ) -> Result<UpdateUsersResponse, Status> {
        let hint = self.begin("update-users", headers, &req.session_id)?;
        Ok(UpdateUsersResponse {
            status: "ok".to_string(),
            new_strategy: hint,
        })
    }

    async fn probe(&self) -> bool {
        self.probe_count.fetch_add(1, Ordering::Relaxed);
        self.lock().probe_ok
    }
}

// ---------------------------------------------------------------------------
// MockDial
// ---------------------------------------------------------------------------

/// Hands the same [`MockEngine`] to every channel the pool creates, and can
/// be scripted to fail the next N dials.
pub struct MockDial {
    engine: Arc<MockEngine>,
    dial_count: AtomicU32,
    fail_dials: AtomicU32,
}

impl MockDial {
    pub fn new(engine: Arc<MockEngine>) -> Arc<MockDial> {
        Arc::new(MockDial {
            engine,
            dial_count: AtomicU32::new(0),
            fail_dials: AtomicU32::new(0),
        })
    }

    pub fn fail_next_dials(&self, n: u32) {
        self.fail_dials.store(n, Ordering::SeqCst);
    }

    pub fn dial_count(&self) -> u32 {
        self.dial_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EngineDial for MockDial {
    async fn dial(
        &self,
        _endpoint: &str,
        _options: &ChannelOptions,
    ) -> Result<Arc<dyn EngineRpc>, SessionError> {
        let pending = self.fail_dials.load(Ordering::SeqCst);
        if pending > 0 {
            self.fail_dials.store(pending - 1, Ordering::SeqCst);
            return Err(SessionError::Config("scripted dial failure".to_string()));
        }
        self.dial_count.fetch_add(1, Ordering::SeqCst);
        let rpc: Arc<dyn EngineRpc> = self.engine.clone();
        Ok(rpc)
    }
}
