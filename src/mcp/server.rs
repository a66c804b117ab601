//! MCP server implementation

use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use super::types::*;
use crate::tools::ToolRegistry;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TransportMode {
    Lsp,
    Line,
}

pub fn is_header_line(line: &str) -> bool {
    match line.split_once(':') {
        Some((name, _)) => {
            let name = name.trim();
            name.eq_ignore_ascii_case("content-length") || name.eq_ignore_ascii_case("content-type")
        }
        None => false,
    }
}

pub fn parse_content_length(line: &str) -> Result<Option<usize>> {
    let Some((name, value)) = line.split_once(':') else {
        return Ok(None);
    };

    if !name.trim().eq_ignore_ascii_case("content-length") {
        return Ok(None);
    }

    let length = value
        .trim()
        .parse::<usize>()
        .map_err(|e| anyhow!("Invalid Content-Length header: {}", e))?;
    Ok(Some(length))
}

/// Upper bound for a line-mode message or an LSP body (10MB)
pub const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;
/// Upper bound for one LSP header line
const MAX_HEADER_LENGTH: usize = 1024;
/// Header lines (including skipped blank lines) accepted before a body
pub const MAX_HEADER_COUNT: usize = 100;

/// Read one raw line, `None` on EOF
async fn read_raw_line<R>(reader: &mut R, limit: usize) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let bytes = reader.read_line(&mut line).await?;
    if bytes == 0 {
        return Ok(None);
    }
    if line.len() > limit {
        return Err(anyhow!(
            "Line length {} exceeds maximum allowed size of {} bytes",
            line.len(),
            limit
        ));
    }
    Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
}

async fn read_lsp_message<R>(reader: &mut R, first_line: Option<String>) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length: Option<usize> = None;
    let mut pending = first_line;
    let mut seen_header = false;
    let mut line_count = 0;

    loop {
        let line = match pending.take() {
            Some(line) => line,
            None => match read_raw_line(reader, MAX_HEADER_LENGTH).await? {
                Some(line) => line,
                None => return Ok(None),
            },
        };

        line_count += 1;
        if line_count > MAX_HEADER_COUNT {
            return Err(anyhow!(
                "Too many header lines or skipped blank lines (limit {})",
                MAX_HEADER_COUNT
            ));
        }

        if line.is_empty() {
            // Blank lines before the first header are noise; after it they end the headers
            if seen_header {
                break;
            }
            continue;
        }

        seen_header = true;
        if let Some(len) = parse_content_length(&line)? {
            content_length = Some(len);
        }
    }

    let length =
        content_length.ok_or_else(|| anyhow!("Missing Content-Length header in LSP message"))?;

    if length > MAX_MESSAGE_SIZE {
        return Err(anyhow!(
            "Content-Length {} exceeds maximum allowed size of {} bytes",
            length,
            MAX_MESSAGE_SIZE
        ));
    }

    let mut buf = vec![0u8; length];
    reader.read_exact(&mut buf).await?;
    let message = String::from_utf8(buf).map_err(|e| anyhow!("Invalid UTF-8 payload: {}", e))?;
    Ok(Some(message))
}

/// Read the next message, detecting the framing from the first one when `mode` is unset
pub async fn read_message<R>(
    reader: &mut R,
    mode: &mut Option<TransportMode>,
) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    if *mode == Some(TransportMode::Lsp) {
        return read_lsp_message(reader, None).await;
    }

    loop {
        let Some(line) = read_raw_line(reader, MAX_MESSAGE_SIZE).await? else {
            return Ok(None);
        };
        if line.is_empty() {
            continue;
        }

        if mode.is_none() && (parse_content_length(&line)?.is_some() || is_header_line(&line)) {
            *mode = Some(TransportMode::Lsp);
            return read_lsp_message(reader, Some(line)).await;
        }

        *mode = Some(TransportMode::Line);
        return Ok(Some(line));
    }
}

pub async fn write_message<W>(writer: &mut W, mode: TransportMode, payload: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut buffer = Vec::with_capacity(payload.len() + 32);

    match mode {
        TransportMode::Line => {
            buffer.extend_from_slice(payload.as_bytes());
            buffer.push(b'\n');
        }
        TransportMode::Lsp => {
            let header = format!("Content-Length: {}\r\n\r\n", payload.len());
            buffer.extend_from_slice(header.as_bytes());
            buffer.extend_from_slice(payload.as_bytes());
        }
    }

    writer.write_all(&buffer).await?;
    writer.flush().await?;
    Ok(())
}

/// MCP Server
pub struct McpServer {
    name: String,
    registry: Arc<ToolRegistry>,
    transport_mode: Option<TransportMode>,
}

impl McpServer {
    pub fn new(
        name: &str,
        registry: Arc<ToolRegistry>,
        transport_mode: Option<TransportMode>,
    ) -> Self {
        Self {
            name: name.to_string(),
            registry,
            transport_mode,
        }
    }

    /// Run the MCP server (stdio transport)
    pub async fn run(&self) -> Result<()> {
        let mut reader = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        self.serve(&mut reader, &mut stdout).await
    }

    /// Serve requests from `reader` until EOF, one at a time
    pub async fn serve<R, W>(&self, reader: &mut R, writer: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut transport_mode = self.transport_mode;

        info!(
            "MCP server '{}' started with tools: {}",
            self.name,
            self.registry.names().join(", ")
        );

        loop {
            let message = match read_message(reader, &mut transport_mode).await {
                Ok(Some(message)) => message,
                Ok(None) => break,
                Err(e) => {
                    error!("Failed to read message: {}", e);
                    continue;
                }
            };

            debug!("Received: {}", message);

            let response = match serde_json::from_str::<JsonRpcRequest>(&message) {
                Ok(request) => self.handle_request(request).await,
                Err(e) => {
                    error!("Failed to parse request: {}", e);
                    Some(JsonRpcResponse::error(None, -32700, format!("Parse error: {}", e)))
                }
            };

            if let Some(resp) = response {
                let resp_json = serde_json::to_string(&resp)?;
                debug!("Sending: {}", resp_json);
                let mode = transport_mode.unwrap_or(TransportMode::Line);
                write_message(writer, mode, &resp_json).await?;
            }
        }

        info!("Input closed, shutting down");
        Ok(())
    }

    /// Handle a JSON-RPC request; notifications get no response
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.id.is_none() {
            debug!("Received notification: {}", request.method);
            return None;
        }

        match request.method.as_str() {
            "initialize" => Some(self.handle_initialize(request.id)),
            "tools/list" => Some(self.handle_list_tools(request.id)),
            "tools/call" => Some(self.handle_call_tool(request.id, request.params).await),
            "ping" => Some(JsonRpcResponse::success(request.id, json!({}))),
            _ => Some(JsonRpcResponse::error(
                request.id,
                -32601,
                format!("Method not found: {}", request.method),
            )),
        }
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {}),
                logging: None,
            },
            server_info: ServerInfo {
                name: self.name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        to_response(id, &result)
    }

    fn handle_list_tools(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = ListToolsResult {
            tools: self.registry.definitions(),
        };

        to_response(id, &result)
    }

    async fn handle_call_tool(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let Some(params) = params else {
            return JsonRpcResponse::error(id, -32602, "Missing params".to_string());
        };

        let call_params: CallToolParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                return JsonRpcResponse::error(id, -32602, format!("Invalid params: {}", e));
            }
        };

        let Some(handler) = self.registry.get(&call_params.name) else {
            return JsonRpcResponse::error(
                id,
                -32602,
                format!("Unknown tool: {}", call_params.name),
            );
        };

        let outcome = handler.call(call_params.arguments).await;
        if let Err(e) = &outcome {
            error!("Tool {} failed: {}", call_params.name, e);
        }

        to_response(id, &CallToolResult::from_outcome(outcome))
    }
}

fn to_response<T: serde::Serialize>(id: Option<Value>, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, -32603, format!("Internal error: {}", e)),
    }
}
