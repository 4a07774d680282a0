//! Typed wrappers — one per engine operation.
//!
//! Each wrapper builds the payload with the current session id, routes the
//! call through the recovery loop, and performs the operation's strategy
//! bookkeeping: prepare registers the new query under the tag it carried,
//! clear/cancel (and clear-or-cancel) forget the query and then promote any
//! pending tag — that moment is the safe point of the whole protocol.

use e6r_schemas::{
    AddCatalogsRequest, CancelQueryRequest, ClearOrCancelRequest, ClearRequest, ColumnInfo,
    ColumnsRequest, DryRunRequest, ExecuteStatementRequest, ExecuteStatementResponse,
    ExplainAnalyzeRequest, ExplainRequest, GetAddCatalogsResultRequest,
    GetAddCatalogsResultResponse, GetCatalogsRequest, GetNextResultBatchRequest,
    GetNextResultBatchResponse, GetResultMetadataRequest, PrepareStatementRequest,
    RefreshCatalogsRequest, RpcParameter, SchemaNamesRequest, SetPropsRequest, StatusRequest,
    StatusResponse, TablesRequest, UpdateUsersRequest,
};

use crate::error::InvokerError;
use crate::handle::QueryHandle;
use crate::Invoker;

impl Invoker {
    // -----------------------------------------------------------------------
    // Prepare / execute
    // -----------------------------------------------------------------------

    pub async fn prepare(
        &self,
        query: &str,
        schema: Option<&str>,
    ) -> Result<QueryHandle, InvokerError> {
        self.prepare_inner(query, schema, None, false).await
    }

    /// v2: catalog-qualified prepare.
    pub async fn prepare_v2(
        &self,
        query: &str,
        schema: Option<&str>,
        catalog: Option<&str>,
    ) -> Result<QueryHandle, InvokerError> {
        self.prepare_inner(query, schema, catalog, true).await
    }

    async fn prepare_inner(
        &self,
        query: &str,
        schema: Option<&str>,
        catalog: Option<&str>,
        v2: bool,
    ) -> Result<QueryHandle, InvokerError> {
        let query = query.to_string();
        let schema = schema.map(str::to_string);
        let catalog = catalog.map(str::to_string);
        let (resp, tag) = self
            .call_tagged("prepare", None, None, |rpc, session_id, headers| {
                let req = PrepareStatementRequest {
                    session_id,
                    schema: schema.clone(),
                    catalog: catalog.clone(),
                    query_string: query.clone(),
                };
                async move {
                    if v2 {
                        rpc.prepare_statement_v2(&headers, req).await
                    } else {
                        rpc.prepare_statement(&headers, req).await
                    }
                }
            })
            .await?;

        if let Some(t) = tag {
            self.coordinator().register_query(&resp.query_id, t);
        }
        Ok(QueryHandle::new(resp.query_id, resp.engine_ip, tag))
    }

    pub async fn execute(
        &self,
        handle: &QueryHandle,
    ) -> Result<ExecuteStatementResponse, InvokerError> {
        self.execute_inner(handle, Vec::new(), false).await
    }

    /// v2: parameterized execute. `value = None` in a parameter binds NULL.
    pub async fn execute_v2(
        &self,
        handle: &QueryHandle,
        params: Vec<RpcParameter>,
    ) -> Result<ExecuteStatementResponse, InvokerError> {
        self.execute_inner(handle, params, true).await
    }

    async fn execute_inner(
        &self,
        handle: &QueryHandle,
        params: Vec<RpcParameter>,
        v2: bool,
    ) -> Result<ExecuteStatementResponse, InvokerError> {
        let query_id = handle.query_id.clone();
        self.call(
            "execute",
            Some(&handle.query_id),
            handle.engine_ip.as_deref(),
            |rpc, session_id, headers| {
                let req = ExecuteStatementRequest {
                    session_id,
                    query_id: query_id.clone(),
                    params: params.clone(),
                };
                async move {
                    if v2 {
                        rpc.execute_statement_v2(&headers, req).await
                    } else {
                        rpc.execute_statement(&headers, req).await
                    }
                }
            },
        )
        .await
    }

    // -----------------------------------------------------------------------
    // Result retrieval
    // -----------------------------------------------------------------------

    /// Raw big-endian result-metadata stream (row count + field
    /// descriptors); callers decode it with the chunk decoder crate.
    pub async fn result_metadata(&self, handle: &QueryHandle) -> Result<Vec<u8>, InvokerError> {
        let query_id = handle.query_id.clone();
        let resp = self
            .call(
                "get-result-metadata",
                Some(&handle.query_id),
                handle.engine_ip.as_deref(),
                |rpc, session_id, headers| {
                    let req = GetResultMetadataRequest {
                        session_id,
                        query_id: query_id.clone(),
                    };
                    async move { rpc.get_result_metadata(&headers, req).await }
                },
            )
            .await?;
        Ok(resp.result_meta)
    }

    pub async fn next_batch(
        &self,
        handle: &QueryHandle,
    ) -> Result<GetNextResultBatchResponse, InvokerError> {
        let query_id = handle.query_id.clone();
        self.call(
            "get-next-result-batch",
            Some(&handle.query_id),
            handle.engine_ip.as_deref(),
            |rpc, session_id, headers| {
                let req = GetNextResultBatchRequest {
                    session_id,
                    query_id: query_id.clone(),
                };
                async move { rpc.get_next_result_batch(&headers, req).await }
            },
        )
        .await
    }

    pub async fn status(&self, handle: &QueryHandle) -> Result<StatusResponse, InvokerError> {
        let query_id = handle.query_id.clone();
        self.call(
            "status",
            Some(&handle.query_id),
            handle.engine_ip.as_deref(),
            |rpc, session_id, headers| {
                let req = StatusRequest {
                    session_id,
                    query_id: query_id.clone(),
                };
                async move { rpc.status(&headers, req).await }
            },
        )
        .await
    }

    // -----------------------------------------------------------------------
    // Query termination (the safe points)
    // -----------------------------------------------------------------------

    pub async fn clear(&self, handle: &QueryHandle) -> Result<(), InvokerError> {
        let query_id = handle.query_id.clone();
        self.call(
            "clear",
            Some(&handle.query_id),
            handle.engine_ip.as_deref(),
            |rpc, session_id, headers| {
                let req = ClearRequest {
                    session_id,
                    query_id: query_id.clone(),
                };
                async move { rpc.clear(&headers, req).await }
            },
        )
        .await?;
        self.finish_query(&handle.query_id);
        Ok(())
    }

    /// Best-effort and idempotent: the coordinator bookkeeping runs on any
    /// success, and a repeat cancel simply finds nothing left to forget.
    pub async fn cancel(&self, handle: &QueryHandle) -> Result<(), InvokerError> {
        let query_id = handle.query_id.clone();
        self.call(
            "cancel",
            Some(&handle.query_id),
            handle.engine_ip.as_deref(),
            |rpc, session_id, headers| {
                let req = CancelQueryRequest {
                    session_id,
                    query_id: query_id.clone(),
                };
                async move { rpc.cancel_query(&headers, req).await }
            },
        )
        .await?;
        self.finish_query(&handle.query_id);
        Ok(())
    }

    pub async fn clear_or_cancel(&self, handle: &QueryHandle) -> Result<(), InvokerError> {
        let query_id = handle.query_id.clone();
        self.call(
            "clear-or-cancel",
            Some(&handle.query_id),
            handle.engine_ip.as_deref(),
            |rpc, session_id, headers| {
                let req = ClearOrCancelRequest {
                    session_id,
                    query_id: query_id.clone(),
                };
                async move { rpc.clear_or_cancel(&headers, req).await }
            },
        )
        .await?;
        self.finish_query(&handle.query_id);
        Ok(())
    }

    fn finish_query(&self, query_id: &str) {
        self.coordinator().forget_query(query_id);
        self.coordinator().apply_pending_at_safe_point();
    }

    // -----------------------------------------------------------------------
    // Plan inspection
    // -----------------------------------------------------------------------

    pub async fn explain(&self, handle: &QueryHandle) -> Result<String, InvokerError> {
        let query_id = handle.query_id.clone();
        let resp = self
            .call(
                "explain",
                Some(&handle.query_id),
                handle.engine_ip.as_deref(),
                |rpc, session_id, headers| {
                    let req = ExplainRequest {
                        session_id,
                        query_id: query_id.clone(),
                    };
                    async move { rpc.explain(&headers, req).await }
                },
            )
            .await?;
        Ok(resp.explain)
    }

    pub async fn explain_analyze(&self, handle: &QueryHandle) -> Result<String, InvokerError> {
        let query_id = handle.query_id.clone();
        let resp = self
            .call(
                "explain-analyze",
                Some(&handle.query_id),
                handle.engine_ip.as_deref(),
                |rpc, session_id, headers| {
                    let req = ExplainAnalyzeRequest {
                        session_id,
                        query_id: query_id.clone(),
                    };
                    async move { rpc.explain_analyze(&headers, req).await }
                },
            )
            .await?;
        Ok(resp.explain_analyze)
    }

    pub async fn dry_run(
        &self,
        query: &str,
        schema: Option<&str>,
    ) -> Result<String, InvokerError> {
        self.dry_run_inner(query, schema, None, false).await
    }

    pub async fn dry_run_v2(
        &self,
        query: &str,
        schema: Option<&str>,
        catalog: Option<&str>,
    ) -> Result<String, InvokerError> {
        self.dry_run_inner(query, schema, catalog, true).await
    }

    async fn dry_run_inner(
        &self,
        query: &str,
        schema: Option<&str>,
        catalog: Option<&str>,
        v2: bool,
    ) -> Result<String, InvokerError> {
        let query = query.to_string();
        let schema = schema.map(str::to_string);
        let catalog = catalog.map(str::to_string);
        let resp = self
            .call("dry-run", None, None, |rpc, session_id, headers| {
                let req = DryRunRequest {
                    session_id,
                    schema: schema.clone(),
                    catalog: catalog.clone(),
                    query_string: query.clone(),
                };
                async move {
                    if v2 {
                        rpc.dry_run_v2(&headers, req).await
                    } else {
                        rpc.dry_run(&headers, req).await
                    }
                }
            })
            .await?;
        Ok(resp.dry_run_result)
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    pub async fn schema_names(&self) -> Result<Vec<String>, InvokerError> {
        self.schema_names_inner(None, false).await
    }

    pub async fn schema_names_v2(&self, catalog: Option<&str>) -> Result<Vec<String>, InvokerError> {
        self.schema_names_inner(catalog, true).await
    }

    async fn schema_names_inner(
        &self,
        catalog: Option<&str>,
        v2: bool,
    ) -> Result<Vec<String>, InvokerError> {
        let catalog = catalog.map(str::to_string);
        let resp = self
            .call("schema-names", None, None, |rpc, session_id, headers| {
                let req = SchemaNamesRequest {
                    session_id,
                    catalog: catalog.clone(),
                };
                async move {
                    if v2 {
                        rpc.schema_names_v2(&headers, req).await
                    } else {
                        rpc.schema_names(&headers, req).await
                    }
                }
            })
            .await?;
        Ok(resp.schemas)
    }

    pub async fn tables(&self, schema: &str) -> Result<Vec<String>, InvokerError> {
        self.tables_inner(schema, None, false).await
    }

    pub async fn tables_v2(
        &self,
        schema: &str,
        catalog: Option<&str>,
    ) -> Result<Vec<String>, InvokerError> {
        self.tables_inner(schema, catalog, true).await
    }

    async fn tables_inner(
        &self,
        schema: &str,
        catalog: Option<&str>,
        v2: bool,
    ) -> Result<Vec<String>, InvokerError> {
        let schema = schema.to_string();
        let catalog = catalog.map(str::to_string);
        let resp = self
            .call("tables", None, None, |rpc, session_id, headers| {
                let req = TablesRequest {
                    session_id,
                    schema: schema.clone(),
                    catalog: catalog.clone(),
                };
                async move {
                    if v2 {
                        rpc.tables_v2(&headers, req).await
                    } else {
                        rpc.tables(&headers, req).await
                    }
                }
            })
            .await?;
        Ok(resp.tables)
    }

    pub async fn columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnInfo>, InvokerError> {
        self.columns_inner(schema, table, None, false).await
    }

    pub async fn columns_v2(
        &self,
        schema: &str,
        table: &str,
        catalog: Option<&str>,
    ) -> Result<Vec<ColumnInfo>, InvokerError> {
        self.columns_inner(schema, table, catalog, true).await
    }

    async fn columns_inner(
        &self,
        schema: &str,
        table: &str,
        catalog: Option<&str>,
        v2: bool,
    ) -> Result<Vec<ColumnInfo>, InvokerError> {
        let schema = schema.to_string();
        let table = table.to_string();
        let catalog = catalog.map(str::to_string);
        let resp = self
            .call("columns", None, None, |rpc, session_id, headers| {
                let req = ColumnsRequest {
                    session_id,
                    schema: schema.clone(),
                    table: table.clone(),
                    catalog: catalog.clone(),
                };
                async move {
                    if v2 {
                        rpc.columns_v2(&headers, req).await
                    } else {
                        rpc.columns(&headers, req).await
                    }
                }
            })
            .await?;
        Ok(resp.columns)
    }

    // -----------------------------------------------------------------------
    // Catalog management / session administration
    // -----------------------------------------------------------------------

    pub async fn add_catalogs(&self, catalogs_json: &str) -> Result<String, InvokerError> {
        let catalogs_json = catalogs_json.to_string();
        let resp = self
            .call("add-catalogs", None, None, |rpc, session_id, headers| {
                let req = AddCatalogsRequest {
                    session_id,
                    catalogs_json: catalogs_json.clone(),
                };
                async move { rpc.add_catalogs(&headers, req).await }
            })
            .await?;
        Ok(resp.status)
    }

    /// Per-schema attach failures come back as data, not as an RPC error.
    pub async fn add_catalogs_result(
        &self,
    ) -> Result<GetAddCatalogsResultResponse, InvokerError> {
        self.call(
            "get-add-catalogs-result",
            None,
            None,
            |rpc, session_id, headers| {
                let req = GetAddCatalogsResultRequest { session_id };
                async move { rpc.get_add_catalogs_result(&headers, req).await }
            },
        )
        .await
    }

    pub async fn catalogs(&self) -> Result<Vec<String>, InvokerError> {
        let resp = self
            .call("get-catalogs", None, None, |rpc, session_id, headers| {
                let req = GetCatalogsRequest { session_id };
                async move { rpc.get_catalogs(&headers, req).await }
            })
            .await?;
        Ok(resp.catalogs)
    }

    pub async fn refresh_catalogs(&self) -> Result<String, InvokerError> {
        let resp = self
            .call("refresh-catalogs", None, None, |rpc, session_id, headers| {
                let req = RefreshCatalogsRequest { session_id };
                async move { rpc.refresh_catalogs(&headers, req).await }
            })
            .await?;
        Ok(resp.status)
    }

    pub async fn set_props(&self, props_json: &str) -> Result<String, InvokerError> {
        let props_json = props_json.to_string();
        let resp = self
            .call("set-props", None, None, |rpc, session_id, headers| {
                let req = SetPropsRequest {
                    session_id,
                    props_json: props_json.clone(),
                };
                async move { rpc.set_props(&headers, req).await }
            })
            .await?;
        Ok(resp.status)
    }

    pub async fn update_users(&self, users_json: &str) -> Result<String, InvokerError> {
        let users_json = users_json.to_string();
        let resp = self
            .call("update-users", None, None, |rpc, session_id, headers| {
                let req = UpdateUsersRequest {
                    session_id,
                    users_json: users_json.clone(),
                };
                async move { rpc.update_users(&headers, req).await }
            })
            .await?;
        Ok(resp.status)
    }
}
