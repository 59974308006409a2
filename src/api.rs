// Request runner: turns one saved `ApiConfig` into a single blocking HTTP
// call and renders what came back. No retries, no timeout, and no
// special handling of 4xx/5xx: every response is rendered the same way.

use crate::error::RunError;
use crate::models::ApiConfig;
use anyhow::{Context, Result};
use reqwest::blocking::{Client, Request};
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde_json::value::RawValue;
use std::borrow::Cow;
use std::io::{self, Write};
use std::time::Duration;
use tracing::{debug, info};

const RULE_WIDTH: usize = 60;

/// Thin wrapper over a reqwest blocking client. The client waits for the
/// remote as long as it takes.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
}

/// A fully buffered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// Status line such as `200 OK`.
    pub status: String,
    /// One entry per header name; repeated values are joined with `", "`.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ApiClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient { client })
    }

    /// Build the request for `cfg` without sending it.
    pub fn build_request(&self, cfg: &ApiConfig) -> Result<Request, RunError> {
        let method = parse_method(&cfg.method)?;
        let mut builder = self
            .client
            .request(method, cfg.url.as_str())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if !cfg.token.is_empty() {
            let value = HeaderValue::from_str(&format!("Bearer {}", cfg.token))
                .map_err(|_| RunError::InvalidHeader("Authorization"))?;
            builder = builder.header(AUTHORIZATION, value);
        }
        if !cfg.body.is_empty() {
            builder = builder.body(cfg.body.clone());
        }

        builder.build().map_err(RunError::RequestBuild)
    }

    /// Send the request for `cfg` and read the whole body into memory.
    pub fn execute(&self, cfg: &ApiConfig) -> Result<ApiResponse, RunError> {
        let request = self.build_request(cfg)?;
        info!(method = %request.method(), url = %request.url(), "sending request");

        let resp = self.client.execute(request).map_err(RunError::Transport)?;
        let status = resp.status().to_string();

        let headers = resp
            .headers()
            .keys()
            .map(|name| {
                let joined = resp
                    .headers()
                    .get_all(name)
                    .iter()
                    .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                    .collect::<Vec<_>>()
                    .join(", ");
                (name.to_string(), joined)
            })
            .collect();

        let body = resp.bytes().map_err(RunError::Transport)?.to_vec();
        debug!(status = %status, bytes = body.len(), "response received");

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

// An empty method means GET, like most HTTP clients.
fn parse_method(method: &str) -> Result<Method, RunError> {
    if method.is_empty() {
        return Ok(Method::GET);
    }
    Method::from_bytes(method.as_bytes()).map_err(|_| RunError::InvalidMethod(method.to_string()))
}

/// Body re-indented with 2 spaces when it is valid JSON, otherwise the
/// raw bytes. Tokens are copied as received: number literals, string
/// escapes and duplicate keys are left alone.
pub fn pretty_body(body: &[u8]) -> Cow<'_, [u8]> {
    match serde_json::from_slice::<&RawValue>(body) {
        Ok(raw) => Cow::Owned(indent_json(raw.get().as_bytes())),
        Err(_) => Cow::Borrowed(body),
    }
}

// Expects syntactically valid JSON. Whitespace outside strings is
// dropped and replaced by newlines and indentation.
fn indent_json(json: &[u8]) -> Vec<u8> {
    fn newline(out: &mut Vec<u8>, depth: usize) {
        out.push(b'\n');
        out.extend(std::iter::repeat(b' ').take(depth * 2));
    }

    let mut out = Vec::with_capacity(json.len() * 2);
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    // Set right after `{` or `[` so empty containers stay `{}` / `[]`.
    let mut opened = false;

    for &c in json {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == b'\\' {
                escaped = true;
            } else if c == b'"' {
                in_string = false;
            }
            continue;
        }
        if matches!(c, b' ' | b'\t' | b'\n' | b'\r') {
            continue;
        }
        if opened {
            opened = false;
            if c == b'}' || c == b']' {
                depth -= 1;
                out.push(c);
                continue;
            }
            newline(&mut out, depth);
        }
        match c {
            b'"' => {
                in_string = true;
                out.push(c);
            }
            b'{' | b'[' => {
                out.push(c);
                depth += 1;
                opened = true;
            }
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                newline(&mut out, depth);
                out.push(c);
            }
            b',' => {
                out.push(c);
                newline(&mut out, depth);
            }
            b':' => out.extend_from_slice(b": "),
            _ => out.push(c),
        }
    }
    out
}

/// Write status, headers and body between separator rules.
pub fn write_response(resp: &ApiResponse, out: &mut dyn Write) -> io::Result<()> {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);

    writeln!(out, "\n✅ Response:")?;
    writeln!(out, "{}", heavy)?;
    writeln!(out, "📡 Status: {}", resp.status)?;
    for (name, value) in &resp.headers {
        writeln!(out, "🔸 {}: {}", name, value)?;
    }
    writeln!(out, "{}", light)?;
    out.write_all(&pretty_body(&resp.body))?;
    writeln!(out)?;
    writeln!(out, "{}", heavy)
}
