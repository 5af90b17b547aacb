use crate::cleaner::ConfirmRequest;
use crate::error::Error;
use crate::model::Handle;
use crate::scanner::ScanCriteria;
use crate::service::AdminService;
use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars::{self, JsonSchema},
    tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CriteriaInput {
    #[serde(default)]
    pub inactive_days: Option<u32>,
    #[serde(default)]
    pub require_unused: Option<bool>,
    #[serde(default)]
    pub max_storage_bytes: Option<u64>,
    /// Ignore the configured storage cap when `max_storage_bytes` is not given.
    #[serde(default)]
    pub no_storage_cap: bool,
    #[serde(default)]
    pub exclude_active_subscriptions: Option<bool>,
}

impl CriteriaInput {
    fn resolve(&self, defaults: &ScanCriteria) -> ScanCriteria {
        ScanCriteria {
            inactive_days: self.inactive_days.unwrap_or(defaults.inactive_days),
            require_unused: self.require_unused.unwrap_or(defaults.require_unused),
            max_storage_bytes: match self.max_storage_bytes {
                Some(cap) => Some(cap),
                None if self.no_storage_cap => None,
                None => defaults.max_storage_bytes,
            },
            exclude_active_subscriptions: self
                .exclude_active_subscriptions
                .unwrap_or(defaults.exclude_active_subscriptions),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConfirmInput {
    #[serde(flatten)]
    pub criteria: CriteriaInput,
    /// Token returned by `scan_inactive_users` for the same criteria.
    #[serde(default)]
    pub confirmation_token: Option<String>,
    /// Number of candidates shown in the preview.
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default)]
    pub handles: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HandleInput {
    pub handle: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HistoryInput {
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_history_limit() -> usize {
    50
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HistoryOutput {
    pub entries: Vec<HistoryEntryOutput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HistoryEntryOutput {
    pub timestamp: String,
    pub action: String,
    pub handle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

fn to_mcp_error(error: Error) -> McpError {
    match error {
        Error::Validation(reason) => {
            McpError::invalid_params(reason.to_string(), serde_json::to_value(&reason).ok())
        }
        e @ (Error::NotFound(_) | Error::Protected { .. }) => {
            McpError::invalid_params(e.to_string(), None)
        }
        e => McpError::internal_error(e.to_string(), None),
    }
}

fn parse_handle(value: &str) -> Result<Handle, McpError> {
    Handle::parse(value).map_err(to_mcp_error)
}

#[derive(Clone)]
pub struct DormantServer {
    service: Arc<AdminService>,
    caller: Option<Handle>,
    defaults: ScanCriteria,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl DormantServer {
    pub fn new(service: Arc<AdminService>, caller: Option<Handle>, defaults: ScanCriteria) -> Self {
        Self {
            service,
            caller,
            defaults,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Preview inactive users that could be deleted. Returns candidates, total storage and a confirmation token. Nothing is deleted."
    )]
    pub async fn scan_inactive_users(
        &self,
        input: Parameters<CriteriaInput>,
    ) -> Result<CallToolResult, McpError> {
        let criteria = input.0.resolve(&self.defaults);
        let preview = self
            .service
            .scan_inactive_users(self.caller.as_ref(), criteria)
            .await
            .map_err(to_mcp_error)?;

        Ok(CallToolResult::success(vec![Content::json(preview)?]))
    }

    #[tool(
        description = "Delete the users of a previous preview. Requires the preview's confirmation token and candidate count with identical criteria; aborts without deleting anything if the candidate set changed."
    )]
    pub async fn confirm_delete_inactive_users(
        &self,
        input: Parameters<ConfirmInput>,
    ) -> Result<CallToolResult, McpError> {
        let input = input.0;
        let handles = input
            .handles
            .as_deref()
            .map(|handles| handles.iter().map(|h| parse_handle(h)).collect::<Result<Vec<_>, _>>())
            .transpose()?;

        let request = ConfirmRequest {
            criteria: input.criteria.resolve(&self.defaults),
            token: input.confirmation_token,
            count: input.count,
            handles,
        };

        let report = self
            .service
            .confirm_delete_inactive_users(self.caller.as_ref(), &request)
            .await
            .map_err(to_mcp_error)?;

        Ok(CallToolResult::success(vec![Content::json(report)?]))
    }

    #[tool(description = "Check whether a user's content differs from the default template")]
    pub async fn audit_user_usage(
        &self,
        input: Parameters<HandleInput>,
    ) -> Result<CallToolResult, McpError> {
        let handle = parse_handle(&input.0.handle)?;
        let report = self
            .service
            .audit_user_usage(&handle)
            .await
            .map_err(to_mcp_error)?;

        Ok(CallToolResult::success(vec![Content::json(report)?]))
    }

    #[tool(description = "Compute the storage used by a user's data directory")]
    pub async fn compute_storage_size(
        &self,
        input: Parameters<HandleInput>,
    ) -> Result<CallToolResult, McpError> {
        let handle = parse_handle(&input.0.handle)?;
        let report = self
            .service
            .compute_storage_size(&handle)
            .await
            .map_err(to_mcp_error)?;

        Ok(CallToolResult::success(vec![Content::json(report)?]))
    }

    #[tool(description = "List all user accounts with activity and subscription state")]
    pub async fn list_users(&self) -> Result<CallToolResult, McpError> {
        let users = self.service.list_users().await.map_err(to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::json(users)?]))
    }

    #[tool(description = "Get deletion history, newest first")]
    pub async fn get_history(
        &self,
        input: Parameters<HistoryInput>,
    ) -> Result<CallToolResult, McpError> {
        let entries = self
            .service
            .history(Some(input.0.limit))
            .map_err(to_mcp_error)?;

        let output = HistoryOutput {
            entries: entries
                .into_iter()
                .map(|e| HistoryEntryOutput {
                    timestamp: e.timestamp.to_rfc3339(),
                    action: e.action.to_string(),
                    handle: e.handle.to_string(),
                    size: e.size,
                })
                .collect(),
        };

        Ok(CallToolResult::success(vec![Content::json(output)?]))
    }
}

#[tool_handler]
impl ServerHandler for DormantServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_mcp_server(
    service: AdminService,
    caller: Option<Handle>,
    defaults: ScanCriteria,
) -> anyhow::Result<()> {
    use rmcp::transport::stdio;

    tracing::info!("starting MCP server on stdio");
    let server = DormantServer::new(Arc::new(service), caller, defaults);
    let service = server.serve(stdio()).await?;

    service.waiting().await?;

    Ok(())
}
