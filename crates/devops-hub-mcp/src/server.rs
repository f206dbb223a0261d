//! MCP server implementation.
//!
//! The server handles the MCP protocol lifecycle:
//! 1. Initialize - exchange capabilities
//! 2. Serve tools, resources and prompts against the hub
//! 3. Stop at end of input

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::handlers::ToolHandler;
use crate::hub::Hub;
use crate::prompts::PromptHandler;
use crate::protocol::{
    GetPromptParams, Implementation, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListChanged, PromptsListResult, ReadResourceParams,
    RequestId, ResourcesCapability, ResourcesListResult, ResourceTemplatesListResult,
    ServerCapabilities, ToolCallParams, ToolsListResult, MCP_VERSION,
};
use crate::resources::ResourceHandler;
use crate::transport::{IncomingMessage, LineTransport, StdioTransport};

/// Name reported in `serverInfo`.
pub const SERVER_NAME: &str = "DevOps Visibility Hub";

const INSTRUCTIONS: &str =
    "Provides tools, resources, and prompts for development lifecycle visibility.";

/// MCP server for mcp-devops-hub.
pub struct McpServer {
    hub: Arc<Hub>,
    tools: ToolHandler,
    resources: ResourceHandler,
    prompts: PromptHandler,
    initialized: bool,
}

/// Deserialize request params, mapping absence and shape errors to -32602.
fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
    let params = params.ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;
    serde_json::from_value(params).map_err(|e| JsonRpcError::invalid_params(&e.to_string()))
}

impl McpServer {
    /// Create a new MCP server.
    pub fn new(hub: Arc<Hub>) -> Self {
        Self {
            tools: ToolHandler::new(hub.clone()),
            resources: ResourceHandler::new(hub.clone()),
            prompts: PromptHandler::new(hub.clone()),
            hub,
            initialized: false,
        }
    }

    /// Run the MCP server over stdin/stdout.
    pub async fn run(&mut self) -> devops_hub_core::Result<()> {
        let mut transport = StdioTransport::stdio();
        self.serve(&mut transport).await
    }

    /// Serve messages from `transport` until EOF.
    pub async fn serve<R, W>(
        &mut self,
        transport: &mut LineTransport<R, W>,
    ) -> devops_hub_core::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!(
            integrations = ?self.hub.enabled(),
            "Starting MCP server"
        );

        loop {
            match transport.read_message().await {
                Ok(Some(msg)) => {
                    if let Some(resp) = self.handle_message(msg).await {
                        if let Err(e) = transport.write_response(&resp).await {
                            tracing::error!("Failed to write response: {}", e);
                            return Err(devops_hub_core::Error::Other(e.into()));
                        }
                    }
                }
                Ok(None) => {
                    tracing::info!("EOF received, shutting down");
                    break;
                }
                Err(e) => {
                    tracing::error!("Transport error: {}", e);
                    return Err(devops_hub_core::Error::Other(e.into()));
                }
            }
        }

        tracing::info!("MCP server stopped");
        Ok(())
    }

    /// Handle an incoming message.
    async fn handle_message(&mut self, msg: IncomingMessage) -> Option<JsonRpcResponse> {
        match msg {
            IncomingMessage::Request(req) => Some(self.handle_request(req).await),
            IncomingMessage::Notification(notif) => {
                self.handle_notification(&notif.method);
                None
            }
            IncomingMessage::Malformed(error) => {
                Some(JsonRpcResponse::error(RequestId::Null, error))
            }
        }
    }

    /// Handle a JSON-RPC request.
    async fn handle_request(&mut self, req: JsonRpcRequest) -> JsonRpcResponse {
        tracing::debug!("Handling request: {} (id: {:?})", req.method, req.id);

        match req.method.as_str() {
            "initialize" => self.handle_initialize(req.id, req.params),
            "ping" => self.handle_ping(req.id),
            "tools/list" => JsonRpcResponse::from_result(
                req.id,
                &ToolsListResult {
                    tools: self.tools.available_tools(),
                },
            ),
            "tools/call" => self.handle_tools_call(req.id, req.params).await,
            "resources/list" => {
                JsonRpcResponse::from_result(req.id, &ResourcesListResult { resources: vec![] })
            }
            "resources/templates/list" => JsonRpcResponse::from_result(
                req.id,
                &ResourceTemplatesListResult {
                    resource_templates: self.resources.templates(),
                },
            ),
            "resources/read" => self.handle_resources_read(req.id, req.params).await,
            "prompts/list" => JsonRpcResponse::from_result(
                req.id,
                &PromptsListResult {
                    prompts: self.prompts.available_prompts(),
                },
            ),
            "prompts/get" => self.handle_prompts_get(req.id, req.params).await,
            method => {
                tracing::warn!("Unknown method: {}", method);
                JsonRpcResponse::error(req.id, JsonRpcError::method_not_found(method))
            }
        }
    }

    /// Handle notifications (no response).
    fn handle_notification(&mut self, method: &str) {
        match method {
            "initialized" | "notifications/initialized" => {
                tracing::info!("Client initialized");
            }
            "notifications/cancelled" => {
                tracing::debug!("Request cancelled by client");
            }
            _ => {
                tracing::debug!("Ignoring notification: {}", method);
            }
        }
    }

    /// Handle initialize request.
    fn handle_initialize(&mut self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        if self.initialized {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request("Server already initialized"),
            );
        }

        if let Some(params) = params {
            match serde_json::from_value::<InitializeParams>(params) {
                Ok(init_params) => {
                    tracing::info!(
                        "Client: {} v{} (protocol: {})",
                        init_params.client_info.name,
                        init_params.client_info.version,
                        init_params.protocol_version
                    );
                }
                Err(e) => {
                    tracing::warn!("Failed to parse initialize params: {}", e);
                }
            }
        }

        self.initialized = true;

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ListChanged::default()),
                resources: Some(ResourcesCapability::default()),
                prompts: Some(ListChanged::default()),
            },
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        };

        JsonRpcResponse::from_result(id, &result)
    }

    /// Handle tools/call request.
    async fn handle_tools_call(&self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match parse_params(params) {
            Ok(params) => params,
            Err(e) => return JsonRpcResponse::error(id, e),
        };

        tracing::info!("Calling tool: {}", params.name);

        let result = self.tools.execute(&params.name, params.arguments).await;
        JsonRpcResponse::from_result(id, &result)
    }

    /// Handle resources/read request.
    async fn handle_resources_read(
        &self,
        id: RequestId,
        params: Option<Value>,
    ) -> JsonRpcResponse {
        let params: ReadResourceParams = match parse_params(params) {
            Ok(params) => params,
            Err(e) => return JsonRpcResponse::error(id, e),
        };

        match self.resources.read(&params.uri).await {
            Some(result) => JsonRpcResponse::from_result(id, &result),
            None => JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_params(&format!("Unknown resource: {}", params.uri)),
            ),
        }
    }

    /// Handle prompts/get request.
    async fn handle_prompts_get(&self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        let params: GetPromptParams = match parse_params(params) {
            Ok(params) => params,
            Err(e) => return JsonRpcResponse::error(id, e),
        };

        match self.prompts.get(params).await {
            Ok(result) => JsonRpcResponse::from_result(id, &result),
            Err(message) => JsonRpcResponse::error(id, JsonRpcError::invalid_params(&message)),
        }
    }

    /// Handle ping request.
    fn handle_ping(&self, id: RequestId) -> JsonRpcResponse {
        JsonRpcResponse::success(id, serde_json::json!({}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{GetPromptResult, ReadResourceResult, ToolCallResult};
    use devops_hub_core::{BuildInfo, MockBuildProvider};
    use serde_json::json;

    fn server() -> McpServer {
        McpServer::new(Arc::new(Hub::default()))
    }

    fn request(id: i64, method: &str, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest::new(id, method, params)
    }

    fn init_params() -> Value {
        json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {
                "name": "test-client",
                "version": "1.0.0"
            }
        })
    }

    #[tokio::test]
    async fn test_initialize_response() {
        let mut server = server();
        let resp = server
            .handle_request(request(1, "initialize", Some(init_params())))
            .await;

        assert!(resp.error.is_none());
        assert!(server.initialized);

        let result: InitializeResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.protocol_version, "2024-11-05");
        assert_eq!(result.server_info.name, "DevOps Visibility Hub");
        assert!(result.capabilities.tools.is_some());
        assert!(result.capabilities.resources.is_some());
        assert!(result.capabilities.prompts.is_some());
        let instructions = result.instructions.unwrap();
        assert!(instructions.contains("development lifecycle"));
    }

    #[test]
    fn test_double_initialize_error() {
        let mut server = server();
        server.initialized = true;

        let resp = server.handle_initialize(RequestId::Number(1), None);

        assert!(resp.result.is_none());
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_REQUEST);
    }

    #[test]
    fn test_ping() {
        let server = server();
        let resp = server.handle_ping(RequestId::String("ping-1".to_string()));

        assert_eq!(resp.result, Some(json!({})));
        assert!(resp.error.is_none());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let mut server = server();
        let resp = server
            .handle_request(request(1, "unknown/method", None))
            .await;

        assert_eq!(resp.error.unwrap().code, JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_methods() {
        let mut server = server();

        let resp = server.handle_request(request(1, "tools/list", None)).await;
        let tools: ToolsListResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(tools.tools.len(), 7);

        let resp = server
            .handle_request(request(2, "resources/list", None))
            .await;
        assert_eq!(resp.result.unwrap(), json!({"resources": []}));

        let resp = server
            .handle_request(request(3, "resources/templates/list", None))
            .await;
        let templates: ResourceTemplatesListResult =
            serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(templates.resource_templates.len(), 4);

        let resp = server
            .handle_request(request(4, "prompts/list", None))
            .await;
        let prompts: PromptsListResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(prompts.prompts[0].name, "sprint_retrospective_guidance");
    }

    #[tokio::test]
    async fn test_tools_call_missing_params() {
        let mut server = server();
        let resp = server.handle_request(request(1, "tools/call", None)).await;

        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_tools_call_not_configured() {
        let mut server = server();
        let resp = server
            .handle_request(request(
                1,
                "tools/call",
                Some(json!({
                    "name": "get_build_status",
                    "arguments": {"pipeline_name": "api", "build_number": 3}
                })),
            ))
            .await;

        let result: ToolCallResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert!(result.is_error());
        let text = result.first_text();
        assert!(text.contains("Jenkins integration is not configured"));
    }

    #[tokio::test]
    async fn test_resources_read() {
        let mut jenkins = MockBuildProvider::new();
        jenkins.expect_get_build_info().returning(|pipeline, build| {
            Ok(Some(BuildInfo {
                pipeline: pipeline.to_string(),
                build: build.to_string(),
                result: Some("SUCCESS".to_string()),
                building: false,
                timestamp: None,
                duration: None,
                url: None,
            }))
        });
        let mut server = McpServer::new(Arc::new(Hub::default().with_jenkins(Arc::new(jenkins))));

        let resp = server
            .handle_request(request(
                1,
                "resources/read",
                Some(json!({"uri": "cicd://api/build/12/status"})),
            ))
            .await;
        let result: ReadResourceResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        let body: Value = serde_json::from_str(&result.contents[0].text).unwrap();
        assert_eq!(body["status"], "SUCCESS");

        let resp = server
            .handle_request(request(
                2,
                "resources/read",
                Some(json!({"uri": "ftp://nowhere"})),
            ))
            .await;
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_prompts_get() {
        let mut server = server();

        let resp = server
            .handle_request(request(
                1,
                "prompts/get",
                Some(json!({
                    "name": "sprint_retrospective_guidance",
                    "arguments": {"project_key": "PROJ", "sprint_id": "3"}
                })),
            ))
            .await;
        // No Jira configured: the prompt falls back to the error messages
        let result: GetPromptResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.messages.len(), 2);

        let resp = server
            .handle_request(request(
                2,
                "prompts/get",
                Some(json!({"name": "sprint_retrospective_guidance", "arguments": {}})),
            ))
            .await;
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_PARAMS);

        let resp = server
            .handle_request(request(3, "prompts/get", Some(json!({"name": "nope"}))))
            .await;
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }

    #[test]
    fn test_handle_notifications() {
        let mut server = server();
        server.handle_notification("notifications/initialized");
        server.handle_notification("notifications/cancelled");
        server.handle_notification("notifications/unknown");
        assert!(!server.initialized);
    }

    #[tokio::test]
    async fn test_serve_session() {
        let input = [
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": init_params()})
                .to_string(),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string(),
            String::new(),
            "{not json".to_string(),
            json!({"jsonrpc": "2.0", "id": "p", "method": "ping"}).to_string(),
        ]
        .join("\n");

        let mut transport = LineTransport::new(input.as_bytes(), Vec::new());
        server().serve(&mut transport).await.unwrap();

        let output = String::from_utf8(transport.into_writer()).unwrap();
        let responses: Vec<JsonRpcResponse> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0].id, RequestId::Number(1));
        assert!(responses[0].result.is_some());
        assert_eq!(responses[1].id, RequestId::Null);
        assert_eq!(
            responses[1].error.as_ref().unwrap().code,
            JsonRpcError::PARSE_ERROR
        );
        assert_eq!(responses[2].id, RequestId::String("p".to_string()));
        assert_eq!(responses[2].result, Some(json!({})));
    }

    #[tokio::test]
    async fn test_serve_continues_after_invalid_utf8() {
        let input: &[u8] = b"\xff\xfe\n{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"ping\"}\n";

        let mut transport = LineTransport::new(input, Vec::new());
        server().serve(&mut transport).await.unwrap();

        let output = String::from_utf8(transport.into_writer()).unwrap();
        let responses: Vec<JsonRpcResponse> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].id, RequestId::Null);
        assert_eq!(
            responses[0].error.as_ref().unwrap().code,
            JsonRpcError::PARSE_ERROR
        );
        assert_eq!(responses[1].id, RequestId::Number(7));
        assert_eq!(responses[1].result, Some(json!({})));
    }
}
