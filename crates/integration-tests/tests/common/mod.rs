//! In-process stand-in for Moonraker's two endpoints
//!
//! Holds one macro group's variables, applies `SET_GCODE_VARIABLE` commands
//! to them, and records every request so tests can assert on the wire.

#![allow(dead_code)]

use axum::extract::{RawQuery, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use penguin_bridge_core::domain::{BridgeConfig, DEFAULT_MACRO_NAME};

#[derive(Default)]
struct MockState {
    macro_name: String,
    variables: Map<String, Value>,
    queries: Vec<Option<String>>,
    commands: Vec<String>,
    accept_headers: Vec<Option<String>>,
    query_status: Option<StatusCode>,
    malformed: bool,
    delay: Option<Duration>,
    rejected: HashSet<String>,
}

type Shared = Arc<Mutex<MockState>>;

pub struct MockMoonraker {
    addr: SocketAddr,
    state: Shared,
    server: JoinHandle<()>,
}

impl MockMoonraker {
    /// Serve `variables` under the default macro group on an ephemeral port
    pub async fn start(variables: Value) -> Self {
        let variables = match variables {
            Value::Object(map) => map,
            other => panic!("variables must be an object, got {}", other),
        };
        let state = Arc::new(Mutex::new(MockState {
            macro_name: DEFAULT_MACRO_NAME.to_string(),
            variables,
            ..Default::default()
        }));

        let router = Router::new()
            .route("/printer/objects/query", get(query))
            .route("/api/printer/command", post(command))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            addr,
            state,
            server,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Bridge config pointing at this server
    pub fn config(&self, tasks: Value) -> BridgeConfig {
        let document = json!({
            "moonrakerHost": self.addr.ip().to_string(),
            "moonrakerPort": self.addr.port(),
            "apiTimeout": 2,
            "updateInterval": 1,
            "taskList": tasks,
        });
        BridgeConfig::from_value(&document).unwrap()
    }

    pub fn variable(&self, name: &str) -> Option<Value> {
        self.state.lock().unwrap().variables.get(name).cloned()
    }

    pub fn queries(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().queries.clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn accept_headers(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().accept_headers.clone()
    }

    /// Answer every query with `status` and an empty body
    pub fn fail_queries_with(&self, status: StatusCode) {
        self.state.lock().unwrap().query_status = Some(status);
    }

    /// Answer every query with a body that is not JSON
    pub fn serve_malformed(&self) {
        self.state.lock().unwrap().malformed = true;
    }

    /// Hold every response for `delay`
    pub fn delay_responses(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    /// Answer 500 to commands targeting `variable` (still recorded)
    pub fn reject_variable(&self, variable: &str) {
        self.state
            .lock()
            .unwrap()
            .rejected
            .insert(variable.to_string());
    }
}

impl Drop for MockMoonraker {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn hold(state: &Shared) {
    let delay = state.lock().unwrap().delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

async fn query(State(state): State<Shared>, RawQuery(raw): RawQuery) -> Response {
    hold(&state).await;

    let mut state = state.lock().unwrap();
    state.queries.push(raw);

    if let Some(status) = state.query_status {
        return status.into_response();
    }
    if state.malformed {
        return (StatusCode::OK, "<html>moonraker</html>").into_response();
    }

    let mut status = Map::new();
    status.insert(
        format!("gcode_macro {}", state.macro_name),
        Value::Object(state.variables.clone()),
    );
    Json(json!({
        "result": {
            "eventtime": 12345.6,
            "status": status
        }
    }))
    .into_response()
}

async fn command(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    hold(&state).await;

    let mut state = state.lock().unwrap();
    state.accept_headers.push(
        headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );

    let Some(commands) = body.get("commands").and_then(Value::as_array) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    for line in commands.iter().filter_map(Value::as_str) {
        state.commands.push(line.to_string());

        let Some((variable, value)) = parse_set_variable(line, &state.macro_name) else {
            return StatusCode::BAD_REQUEST.into_response();
        };
        if state.rejected.contains(&variable) {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        state.variables.insert(variable, value);
    }

    Json(json!({"result": "ok"})).into_response()
}

/// `SET_GCODE_VARIABLE MACRO=<m> VARIABLE=<v> VALUE=<literal>` -> (v, value)
///
/// Follows Klipper's extended command handling: arguments end at the first
/// `#`, `*` or `;`, are split shell-style, and VALUE is evaluated as a
/// Python literal.
fn parse_set_variable(line: &str, macro_name: &str) -> Option<(String, Value)> {
    let line = line.trim_start();
    let cmd_end = line
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(line.len());
    let (cmd, rest) = line.split_at(cmd_end);
    if cmd != "SET_GCODE_VARIABLE" {
        return None;
    }
    let args = match rest.find(&['#', '*', ';'][..]) {
        Some(cut) => &rest[..cut],
        None => rest,
    };

    let mut macro_arg = None;
    let mut variable = None;
    let mut literal = None;
    for word in shell_split(args)? {
        let (key, value) = word.split_once('=')?;
        match key.to_ascii_uppercase().as_str() {
            "MACRO" => macro_arg = Some(value.to_string()),
            "VARIABLE" => variable = Some(value.to_string()),
            "VALUE" => literal = Some(value.to_string()),
            _ => {}
        }
    }

    if !macro_arg?.eq_ignore_ascii_case(macro_name) {
        return None;
    }
    Some((variable?, eval_literal(&literal?)?))
}

/// POSIX shell word splitting; None on an unterminated quote
fn shell_split(s: &str) -> Option<Vec<String>> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next()? {
                        '\'' => break,
                        c => word.push(c),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next()? {
                        '"' => break,
                        '\\' => match chars.next()? {
                            c @ ('\\' | '"' | '$' | '`') => word.push(c),
                            '\n' => {}
                            c => {
                                word.push('\\');
                                word.push(c);
                            }
                        },
                        c => word.push(c),
                    }
                }
            }
            '\\' => {
                in_word = true;
                word.push(chars.next()?);
            }
            c => {
                in_word = true;
                word.push(c);
            }
        }
    }
    if in_word {
        words.push(word);
    }
    Some(words)
}

/// Python literal evaluation limited to strings and numbers
fn eval_literal(s: &str) -> Option<Value> {
    let quote = match s.chars().next()? {
        q @ ('"' | '\'') => q,
        _ => return Some(json!(s.parse::<f64>().ok()?)),
    };
    let body = s.strip_prefix(quote)?.strip_suffix(quote)?;

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'x' => {
                    let hex: String = chars.by_ref().take(2).collect();
                    out.push(char::from(u8::from_str_radix(&hex, 16).ok()?));
                }
                c @ ('\\' | '\'' | '"') => out.push(c),
                c => {
                    out.push('\\');
                    out.push(c);
                }
            },
            // An unescaped closing quote ends the literal early
            c if c == quote => return None,
            c => out.push(c),
        }
    }
    Some(Value::String(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_rejects_unprotected_delimiters() {
        let macro_name = DEFAULT_MACRO_NAME;
        let line = |literal: &str| {
            format!(
                "SET_GCODE_VARIABLE MACRO={} VARIABLE=v VALUE={}",
                macro_name, literal
            )
        };

        assert_eq!(
            parse_set_variable(&line("'\"Bob\\x27s\"'"), macro_name),
            Some(("v".to_string(), json!("Bob's")))
        );
        assert_eq!(parse_set_variable(&line("'\"Bob\\'s\"'"), macro_name), None);
        assert_eq!(parse_set_variable(&line("'\"net#5\"'"), macro_name), None);
        assert_eq!(
            parse_set_variable(&line("48.2"), macro_name),
            Some(("v".to_string(), json!(48.2)))
        );
    }
}
