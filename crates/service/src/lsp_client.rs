//! Language server client speaking JSON-RPC over a child process's stdio

use crate::service::{CompletionListResult, CompletionResult, LanguageService};
use lsp_types::{
    CompletionItem, GotoDefinitionResponse, Hover, Location, Position, Range, SignatureHelp, Uri,
};
use markcheck_core::{Error, PositionEncoding, Result, ServerConfig};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tracing::{debug, trace, warn};

/// JSON-RPC request structure
#[derive(Debug, Serialize)]
struct JsonRpcRequest<T: Serialize> {
    jsonrpc: &'static str,
    id: i64,
    method: &'static str,
    params: T,
}

/// JSON-RPC notification structure (no id)
#[derive(Debug, Serialize)]
struct JsonRpcNotification<T: Serialize> {
    jsonrpc: &'static str,
    method: &'static str,
    params: T,
}

/// Reply to a request the server sent us
#[derive(Debug, Serialize)]
struct JsonRpcReply {
    jsonrpc: &'static str,
    id: Value,
    result: Value,
}

/// Convert a virtual path to an LSP URI
pub fn path_to_uri(path: &str) -> Result<Uri> {
    let mut encoded = String::with_capacity(path.len() + 8);
    encoded.push_str("file://");
    if !path.starts_with('/') {
        encoded.push('/');
    }
    for ch in path.chars() {
        match ch {
            ' ' => encoded.push_str("%20"),
            '%' => encoded.push_str("%25"),
            '#' => encoded.push_str("%23"),
            '?' => encoded.push_str("%3F"),
            other => encoded.push(other),
        }
    }
    encoded
        .parse()
        .map_err(|e| Error::service(format!("Invalid URI {encoded}: {e}")))
}

/// Convert an LSP URI back to a virtual path
pub fn uri_to_path(uri: &Uri) -> Result<String> {
    let uri_str = uri.as_str();
    let path_str = uri_str
        .strip_prefix("file://")
        .ok_or_else(|| Error::service(format!("Not a file URI: {uri_str}")))?;
    percent_decode_str(path_str)
}

/// Percent-decode a string (handle URL encoding like %20 for space)
fn percent_decode_str(s: &str) -> Result<String> {
    let mut result = Vec::new();
    let bytes = s.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(h1), Some(h2)) = (
                char::from(bytes[i + 1]).to_digit(16),
                char::from(bytes[i + 2]).to_digit(16),
            ) {
                result.push((h1 * 16 + h2) as u8);
                i += 3;
                continue;
            }
        }
        result.push(bytes[i]);
        i += 1;
    }

    String::from_utf8(result).map_err(|e| Error::service(format!("Invalid UTF-8 in path: {e}")))
}

fn to_service_error(context: &str) -> impl Fn(serde_json::Error) -> Error + '_ {
    move |e| Error::service(format!("{context}: {e}"))
}

/// Client for a language server driven synchronously from the test thread
pub struct LspClient {
    process: Child,
    stdin: BufWriter<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    request_id: i64,
    encoding: PositionEncoding,
    shut_down: bool,
}

impl LspClient {
    /// Spawn the server named by `config` and run the initialize handshake
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        Self::spawn(
            &config.command,
            &config.root_dir,
            config.position_encoding,
            config.initialization_options.clone(),
        )
    }

    pub fn spawn(
        command: &[String],
        root_dir: &str,
        preferred: PositionEncoding,
        init_options: Option<Value>,
    ) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| Error::config("server.command is empty"))?;

        debug!("Spawning language server: {:?}", command);

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::with_context(format!("Failed to spawn {program}"), e))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::service("Failed to get stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::service("Failed to get stdout"))?;

        let mut client = Self {
            process: child,
            stdin: BufWriter::new(stdin),
            stdout: BufReader::new(stdout),
            request_id: 0,
            // Protocol default until the server says otherwise
            encoding: PositionEncoding::Utf16,
            shut_down: false,
        };

        client.initialize(root_dir, preferred, init_options)?;
        Ok(client)
    }

    fn initialize(
        &mut self,
        root_dir: &str,
        preferred: PositionEncoding,
        init_options: Option<Value>,
    ) -> Result<()> {
        let root_uri = path_to_uri(root_dir)?;
        let mut encodings = vec![preferred.as_protocol()];
        if preferred != PositionEncoding::Utf16 {
            encodings.push(PositionEncoding::Utf16.as_protocol());
        }

        let params = json!({
            "processId": std::process::id(),
            "rootUri": root_uri.as_str(),
            "workspaceFolders": [{ "uri": root_uri.as_str(), "name": "markcheck" }],
            "initializationOptions": init_options,
            "capabilities": Self::client_capabilities(&encodings),
        });

        let response: Value = self.send_request("initialize", params)?;
        let negotiated = response
            .pointer("/capabilities/positionEncoding")
            .and_then(Value::as_str)
            .and_then(PositionEncoding::from_protocol)
            .unwrap_or(PositionEncoding::Utf16);
        self.encoding = negotiated;
        debug!(encoding = negotiated.as_protocol(), "Language server initialized");

        self.send_notification("initialized", json!({}))?;
        Ok(())
    }

    /// Capabilities the verifier relies on
    fn client_capabilities(encodings: &[&str]) -> Value {
        json!({
            "general": { "positionEncodings": encodings },
            "textDocument": {
                "synchronization": { "dynamicRegistration": false },
                "completion": {
                    "completionItem": {
                        "snippetSupport": true,
                        "commitCharactersSupport": true,
                        "preselectSupport": true,
                        "labelDetailsSupport": true,
                        "insertReplaceSupport": true,
                        "documentationFormat": ["markdown", "plaintext"],
                        "resolveSupport": { "properties": ["detail", "documentation"] }
                    },
                    "completionList": {
                        "itemDefaults": ["commitCharacters", "editRange"]
                    }
                },
                "hover": { "contentFormat": ["markdown", "plaintext"] },
                "signatureHelp": {
                    "signatureInformation": {
                        "documentationFormat": ["markdown", "plaintext"],
                        "parameterInformation": { "labelOffsetSupport": true },
                        "activeParameterSupport": true
                    }
                },
                "definition": { "dynamicRegistration": false, "linkSupport": true },
                "references": { "dynamicRegistration": false }
            },
            "workspace": { "configuration": true }
        })
    }

    fn write_message(&mut self, body: &str) -> Result<()> {
        let message = format!("Content-Length: {}\r\n\r\n{}", body.len(), body);
        self.stdin.write_all(message.as_bytes())?;
        self.stdin.flush()?;
        Ok(())
    }

    /// Send a request and wait for response
    fn send_request<P: Serialize, R: DeserializeOwned>(
        &mut self,
        method: &'static str,
        params: P,
    ) -> Result<R> {
        self.request_id += 1;
        let id = self.request_id;

        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        let body = serde_json::to_string(&request).map_err(to_service_error(method))?;
        trace!("Sending request: {}", body);
        self.write_message(&body)?;

        let mut response = self.read_response(id)?;
        if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(Error::service(format!("{method} failed ({code}): {message}")));
        }

        let result = response
            .get_mut("result")
            .map(Value::take)
            .unwrap_or(Value::Null);
        serde_json::from_value(result).map_err(to_service_error(method))
    }

    /// Send a notification (no response expected)
    fn send_notification<P: Serialize>(&mut self, method: &'static str, params: P) -> Result<()> {
        let notification = JsonRpcNotification {
            jsonrpc: "2.0",
            method,
            params,
        };

        let body = serde_json::to_string(&notification).map_err(to_service_error(method))?;
        trace!("Sending notification: {}", body);
        self.write_message(&body)
    }

    fn read_message(&mut self) -> Result<Value> {
        let mut content_length = 0;
        loop {
            let mut header = String::new();
            if self.stdout.read_line(&mut header)? == 0 {
                return Err(Error::service("Language server closed its output"));
            }
            let header = header.trim();

            if header.is_empty() {
                break;
            }

            if let Some(len) = header.strip_prefix("Content-Length: ") {
                content_length = len
                    .parse()
                    .map_err(|_| Error::service(format!("Bad Content-Length header: {header}")))?;
            }
        }

        if content_length == 0 {
            return Err(Error::service("No Content-Length in response"));
        }

        let mut body = vec![0u8; content_length];
        self.stdout.read_exact(&mut body)?;
        trace!("Received: {}", String::from_utf8_lossy(&body));
        serde_json::from_slice(&body).map_err(to_service_error("malformed message"))
    }

    /// Reads until the response to `expected_id` arrives
    ///
    /// Notifications are dropped. Requests from the server are answered
    /// with an empty result so it never blocks on us.
    fn read_response(&mut self, expected_id: i64) -> Result<Value> {
        loop {
            let message = self.read_message()?;
            let id = message.get("id").cloned();

            if let Some(method) = message.get("method").and_then(Value::as_str) {
                if let Some(id) = id {
                    let result = match method {
                        "workspace/configuration" => {
                            let count = message
                                .pointer("/params/items")
                                .and_then(Value::as_array)
                                .map_or(0, Vec::len);
                            Value::Array(vec![Value::Null; count])
                        }
                        _ => Value::Null,
                    };
                    trace!(method, "Answering server request");
                    let reply = JsonRpcReply {
                        jsonrpc: "2.0",
                        id,
                        result,
                    };
                    let body = serde_json::to_string(&reply).map_err(to_service_error(method))?;
                    self.write_message(&body)?;
                }
                continue;
            }

            if id.as_ref().and_then(Value::as_i64) == Some(expected_id) {
                return Ok(message);
            }
        }
    }

    fn text_document_position(path: &str, position: Position) -> Result<Value> {
        Ok(json!({
            "textDocument": { "uri": path_to_uri(path)?.as_str() },
            "position": position,
        }))
    }
}

impl LanguageService for LspClient {
    fn position_encoding(&self) -> PositionEncoding {
        self.encoding
    }

    fn configure(&mut self, options: &BTreeMap<String, String>) -> Result<()> {
        self.send_notification(
            "workspace/didChangeConfiguration",
            json!({ "settings": { "markcheck": { "options": options } } }),
        )
    }

    fn did_open(&mut self, path: &str, language_id: &str, version: i32, text: &str) -> Result<()> {
        let uri = path_to_uri(path)?;
        self.send_notification(
            "textDocument/didOpen",
            json!({
                "textDocument": {
                    "uri": uri.as_str(),
                    "languageId": language_id,
                    "version": version,
                    "text": text,
                }
            }),
        )
    }

    fn did_change(&mut self, path: &str, version: i32, range: Range, text: &str) -> Result<()> {
        let uri = path_to_uri(path)?;
        self.send_notification(
            "textDocument/didChange",
            json!({
                "textDocument": { "uri": uri.as_str(), "version": version },
                "contentChanges": [{ "range": range, "text": text }],
            }),
        )
    }

    fn completion(&mut self, path: &str, position: Position) -> Result<Option<CompletionListResult>> {
        let params = Self::text_document_position(path, position)?;
        let response: Option<CompletionResult> =
            self.send_request("textDocument/completion", params)?;
        Ok(response.map(CompletionListResult::from))
    }

    fn resolve_completion(&mut self, item: CompletionItem) -> Result<CompletionItem> {
        self.send_request("completionItem/resolve", item)
    }

    fn hover(&mut self, path: &str, position: Position) -> Result<Option<Hover>> {
        let params = Self::text_document_position(path, position)?;
        self.send_request("textDocument/hover", params)
    }

    fn definition(&mut self, path: &str, position: Position) -> Result<Vec<Location>> {
        let params = Self::text_document_position(path, position)?;
        let response: Option<GotoDefinitionResponse> =
            self.send_request("textDocument/definition", params)?;

        match response {
            Some(GotoDefinitionResponse::Scalar(loc)) => Ok(vec![loc]),
            Some(GotoDefinitionResponse::Array(locs)) => Ok(locs),
            Some(GotoDefinitionResponse::Link(links)) => Ok(links
                .into_iter()
                .map(|l| Location {
                    uri: l.target_uri,
                    range: l.target_selection_range,
                })
                .collect()),
            None => Ok(vec![]),
        }
    }

    fn references(
        &mut self,
        path: &str,
        position: Position,
        include_declaration: bool,
    ) -> Result<Vec<Location>> {
        let mut params = Self::text_document_position(path, position)?;
        params["context"] = json!({ "includeDeclaration": include_declaration });
        let response: Option<Vec<Location>> =
            self.send_request("textDocument/references", params)?;
        Ok(response.unwrap_or_default())
    }

    fn signature_help(&mut self, path: &str, position: Position) -> Result<Option<SignatureHelp>> {
        let params = Self::text_document_position(path, position)?;
        self.send_request("textDocument/signatureHelp", params)
    }

    fn shutdown(&mut self) -> Result<()> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;

        let _: Value = self.send_request("shutdown", Value::Null)?;
        self.send_notification("exit", Value::Null)?;
        self.process.wait()?;
        Ok(())
    }
}

impl Drop for LspClient {
    fn drop(&mut self) {
        if !self.shut_down {
            warn!("Language server dropped without shutdown");
        }
        let _ = self.process.kill();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_uri_round_trip() {
        let uri = path_to_uri("/src/my file#1.ts").expect("uri");
        assert_eq!(uri.as_str(), "file:///src/my%20file%231.ts");
        assert_eq!(uri_to_path(&uri).expect("path"), "/src/my file#1.ts");
    }

    #[test]
    fn test_non_file_uri_rejected() {
        let uri: Uri = "untitled:Untitled-1".parse().expect("uri");
        assert!(uri_to_path(&uri).is_err());
    }

    #[test]
    fn test_percent_decode_keeps_stray_percent() {
        assert_eq!(percent_decode_str("a%2").expect("decode"), "a%2");
        assert_eq!(percent_decode_str("%41b").expect("decode"), "Ab");
    }

    #[test]
    fn test_capabilities_advertise_item_defaults() {
        let caps = LspClient::client_capabilities(&["utf-8", "utf-16"]);
        assert_eq!(
            caps.pointer("/general/positionEncodings"),
            Some(&json!(["utf-8", "utf-16"]))
        );
        assert_eq!(
            caps.pointer("/textDocument/completion/completionList/itemDefaults"),
            Some(&json!(["commitCharacters", "editRange"]))
        );
    }
}
