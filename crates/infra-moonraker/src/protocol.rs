//! Moonraker wire format
//!
//! Read: `GET /printer/objects/query?gcode_macro <MACRO>` answers
//! `{"result": {"status": {"gcode_macro <MACRO>": {<var>: <value>, ...}}}}`.
//!
//! Write: `POST /api/printer/command` with
//! `{"commands": ["SET_GCODE_VARIABLE MACRO=<MACRO> VARIABLE=<var> VALUE=<literal>"]}`.

use penguin_bridge_core::domain::{Snapshot, ValueKind};
use penguin_bridge_core::port::RemoteError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const QUERY_PATH: &str = "/printer/objects/query";
pub const COMMAND_PATH: &str = "/api/printer/command";

#[derive(Debug, Deserialize)]
struct QueryResponse {
    result: QueryResult,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    status: HashMap<String, serde_json::Value>,
}

/// Body of a write request
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CommandRequest {
    pub commands: Vec<String>,
}

/// Printer object name of a macro group, e.g. `gcode_macro KLIPPER_PENGUIN_BRIDGE`
pub fn macro_object(macro_name: &str) -> String {
    format!("gcode_macro {}", macro_name)
}

/// Full query URL; the space is percent-encoded when the URL is parsed
pub fn query_url(base_url: &str, macro_name: &str) -> String {
    format!("{}{}?{}", base_url, QUERY_PATH, macro_object(macro_name))
}

pub fn command_url(base_url: &str) -> String {
    format!("{}{}", base_url, COMMAND_PATH)
}

/// Extract the macro group's variables from a query response body
pub fn parse_snapshot(body: &str, macro_name: &str) -> Result<Snapshot, RemoteError> {
    let response: QueryResponse = serde_json::from_str(body)
        .map_err(|e| RemoteError::MalformedResponse(format!("failed to parse response: {}", e)))?;

    let object = macro_object(macro_name);
    let variables = response
        .result
        .status
        .get(&object)
        .ok_or_else(|| RemoteError::MalformedResponse(format!("'{}' missing from status", object)))?;

    if !variables.is_object() {
        return Err(RemoteError::MalformedResponse(format!(
            "'{}' is not an object",
            object
        )));
    }

    serde_json::from_value(variables.clone())
        .map_err(|e| RemoteError::MalformedResponse(e.to_string()))
}

/// Render a value so the printer parses it as one token of the right type
///
/// Numbers go out bare. Text is wrapped as `'"..."'`: the outer single quotes
/// keep the token whole through shell-style argument splitting, the inner
/// double quotes make Klipper evaluate it as a Python string literal.
///
/// Inside single quotes the splitter honors no escapes, and the G-code line
/// is cut at the first `#`, `*` or `;`. Those characters and `'` are written
/// as `\xNN` escapes, which only the literal evaluation decodes.
pub fn format_literal(kind: ValueKind, value: &str) -> String {
    match kind {
        ValueKind::Number => value.trim().to_string(),
        ValueKind::Text => {
            let mut escaped = String::with_capacity(value.len() + 4);
            for c in value.chars() {
                match c {
                    '\\' => escaped.push_str("\\\\"),
                    '"' => escaped.push_str("\\\""),
                    '\'' | '#' | '*' | ';' => {
                        escaped.push_str(&format!("\\x{:02x}", c as u32))
                    }
                    _ => escaped.push(c),
                }
            }
            format!("'\"{}\"'", escaped)
        }
    }
}

/// G-code line setting one macro variable
pub fn set_variable_command(macro_name: &str, variable_name: &str, kind: ValueKind, value: &str) -> String {
    format!(
        "SET_GCODE_VARIABLE MACRO={} VARIABLE={} VALUE={}",
        macro_name,
        variable_name,
        format_literal(kind, value)
    )
}
