//! Turning raw traffic into call descriptors.
//!
//! Everything here is best-effort: a body that isn't JSON, isn't an object,
//! or carries no provider marker simply yields `None`. Nothing in this module
//! panics or returns an error, since it runs inside the host's own network
//! path.

use crate::intercept::transport::OutgoingRequest;
use crate::policy::types::{CallDescriptor, Operation};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// URL fragments that identify MCP-bound requests.
pub const MCP_URL_MARKERS: &[&str] = &["/api/mcp", "/copilot", "/tools", "/agent"];

/// Providers recognized in request bodies.
pub const KNOWN_PROVIDERS: &[&str] = &["github"];

/// Whether a request URL is likely to carry an MCP call.
pub fn is_mcp_url(url: &str) -> bool {
    MCP_URL_MARKERS.iter().any(|m| url.contains(m))
}

/// `"@GitHub"` → `"github"`.
pub fn normalize_provider(raw: &str) -> String {
    raw.trim().trim_start_matches('@').to_lowercase()
}

/// Build a descriptor from an outgoing request, if it is an MCP call for a
/// known provider.
pub fn descriptor_from_request(request: &OutgoingRequest) -> Option<CallDescriptor> {
    if !is_mcp_url(&request.url) {
        return None;
    }

    let body = parse_object(request.body.as_deref()?)?;
    let provider = request_provider(&body)?;

    let operation = ["operation", "action", "method"]
        .iter()
        .filter_map(|field| str_field(&body, field))
        .find_map(Operation::from_str_loose)
        .or_else(|| Operation::from_str_loose(&request.method))
        .unwrap_or(Operation::Read);

    Some(build(provider, operation, body))
}

/// Build a descriptor from an outgoing socket text frame.
pub fn descriptor_from_socket_message(payload: &str) -> Option<CallDescriptor> {
    let body = parse_object(payload)?;

    let is_call = str_field(&body, "type") == Some("mcp_call");
    let marker = str_field(&body, "tool").or_else(|| str_field(&body, "provider"));
    if !is_call && marker.is_none() {
        return None;
    }

    let provider = marker
        .map(normalize_provider)
        .unwrap_or_else(|| "unknown".to_string());

    let operation = str_field(&body, "operation")
        .or_else(|| str_field(&body, "action"))
        .and_then(Operation::from_str_loose)
        .unwrap_or(Operation::Unknown);

    Some(build(provider, operation, body))
}

/// Extract `owner/repo` from a raw identifier or from a URL that embeds one.
pub fn extract_repository(input: &str) -> Option<String> {
    let input = input.trim();

    let found = if repo_identifier().is_match(input) {
        input
    } else {
        host_qualified_repo()
            .captures(input)
            .and_then(|c| c.get(1))?
            .as_str()
    };

    Some(found.strip_suffix(".git").unwrap_or(found).to_string())
}

fn repo_identifier() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w.-]+/[\w.-]+$").expect("static regex"))
}

fn host_qualified_repo() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:[\w-]+\.)+[A-Za-z]{2,}(?::\d+)?/([\w.-]+/[\w.-]+)").expect("static regex")
    })
}

fn request_provider(body: &Map<String, Value>) -> Option<String> {
    ["tool", "provider"]
        .iter()
        .filter_map(|field| str_field(body, field))
        .map(normalize_provider)
        .find(|p| KNOWN_PROVIDERS.contains(&p.as_str()))
}

fn build(provider: String, operation: Operation, body: Map<String, Value>) -> CallDescriptor {
    let repository = ["repository", "repo", "url"]
        .iter()
        .filter_map(|field| str_field(&body, field))
        .find_map(extract_repository);

    let file_path = str_field(&body, "path")
        .or_else(|| str_field(&body, "filePath"))
        .map(str::to_string);

    let resource = str_field(&body, "resource").unwrap_or("file").to_string();

    let mut call = CallDescriptor::new(provider, operation).with_resource(resource);
    call.repository = repository;
    call.file_path = file_path;
    call.with_metadata(Value::Object(body))
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn str_field<'a>(body: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    body.get(field).and_then(Value::as_str)
}
