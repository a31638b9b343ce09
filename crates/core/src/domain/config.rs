// Bridge Configuration (startup document)
//
// The document is JSON with camelCase keys. Typing is strict:
// integers must be JSON integers and booleans JSON booleans, no coercion.

use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;

use super::error::{ConfigError, Result};
use super::task::{TaskDefinition, ValueKind};

/// Macro group holding the bridged variables on the printer side
pub const DEFAULT_MACRO_NAME: &str = "KLIPPER_PENGUIN_BRIDGE";

const KEY_HOST: &str = "moonrakerHost";
const KEY_HOST_ALIAS: &str = "remoteHost";
const KEY_PORT: &str = "moonrakerPort";
const KEY_PORT_ALIAS: &str = "remotePort";
const KEY_API_TIMEOUT: &str = "apiTimeout";
const KEY_UPDATE_INTERVAL: &str = "updateInterval";
const KEY_MACRO_NAME: &str = "macroName";
const KEY_TASK_LIST: &str = "taskList";

const KEY_COMMAND: &str = "command";
const KEY_EXEC_TIMEOUT: &str = "execTimeout";
const KEY_VARIABLE_NAME: &str = "variableName";
const KEY_IS_NUMBER: &str = "isNumber";

/// Validated bridge configuration.
///
/// Constructed once at startup, never mutated, shared read-only by the
/// task runner across all passes.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    host: String,
    port: u16,
    api_timeout: Duration,
    update_interval: Duration,
    macro_name: String,
    tasks: Vec<TaskDefinition>,
}

impl BridgeConfig {
    /// Create a validated configuration with the default macro group
    ///
    /// # Errors
    /// - ConfigError::InvalidField on empty host, zero port/durations or
    ///   an empty task list
    pub fn new(
        host: impl Into<String>,
        port: u16,
        api_timeout: Duration,
        update_interval: Duration,
        tasks: Vec<TaskDefinition>,
    ) -> Result<Self> {
        let host = host.into();

        if host.is_empty() {
            return Err(ConfigError::invalid(KEY_HOST, "must not be empty"));
        }
        if port == 0 {
            return Err(ConfigError::invalid(KEY_PORT, "must be positive"));
        }
        if api_timeout.is_zero() {
            return Err(ConfigError::invalid(KEY_API_TIMEOUT, "must be positive"));
        }
        if update_interval.is_zero() {
            return Err(ConfigError::invalid(KEY_UPDATE_INTERVAL, "must be positive"));
        }
        if tasks.is_empty() {
            return Err(ConfigError::invalid(KEY_TASK_LIST, "must not be empty"));
        }

        Ok(Self {
            host,
            port,
            api_timeout,
            update_interval,
            macro_name: DEFAULT_MACRO_NAME.to_string(),
            tasks,
        })
    }

    /// Override the macro group name
    pub fn with_macro_name(mut self, macro_name: impl Into<String>) -> Result<Self> {
        let macro_name = macro_name.into();
        if macro_name.is_empty() {
            return Err(ConfigError::invalid(KEY_MACRO_NAME, "must not be empty"));
        }
        self.macro_name = macro_name;
        Ok(self)
    }

    /// Read and validate a config file
    ///
    /// # Errors
    /// - AppError::Io if the file cannot be read
    /// - AppError::Config if the document is malformed or invalid
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json_str(&content)?)
    }

    /// Parse and validate a JSON config document
    pub fn from_json_str(content: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(content)?;
        Self::from_value(&document)
    }

    /// Validate an already parsed JSON document
    pub fn from_value(document: &Value) -> Result<Self> {
        let root = document
            .as_object()
            .ok_or_else(|| ConfigError::invalid("config", "expected a JSON object"))?;

        let host = required_str(root, KEY_HOST, Some(KEY_HOST_ALIAS), KEY_HOST)?;
        let port = required_positive_int(root, KEY_PORT, Some(KEY_PORT_ALIAS), KEY_PORT)?;
        let port = u16::try_from(port)
            .map_err(|_| ConfigError::invalid(KEY_PORT, format!("{} is out of range", port)))?;
        let api_timeout = required_seconds(root, KEY_API_TIMEOUT, KEY_API_TIMEOUT)?;
        let update_interval = required_seconds(root, KEY_UPDATE_INTERVAL, KEY_UPDATE_INTERVAL)?;

        let raw_tasks = root
            .get(KEY_TASK_LIST)
            .ok_or_else(|| missing(KEY_TASK_LIST))?
            .as_array()
            .ok_or_else(|| ConfigError::invalid(KEY_TASK_LIST, "expected an array"))?;

        let tasks = raw_tasks
            .iter()
            .enumerate()
            .map(|(index, raw)| parse_task(index, raw))
            .collect::<Result<Vec<_>>>()?;

        let config = Self::new(host, port, api_timeout, update_interval, tasks)?;

        match root.get(KEY_MACRO_NAME) {
            None => Ok(config),
            Some(value) => {
                let macro_name = value
                    .as_str()
                    .ok_or_else(|| ConfigError::invalid(KEY_MACRO_NAME, "expected a string"))?;
                config.with_macro_name(macro_name)
            }
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn api_timeout(&self) -> Duration {
        self.api_timeout
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    pub fn macro_name(&self) -> &str {
        &self.macro_name
    }

    pub fn tasks(&self) -> &[TaskDefinition] {
        &self.tasks
    }

    /// Base URL of the Moonraker API, e.g. `http://localhost:7125`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

fn parse_task(index: usize, raw: &Value) -> Result<TaskDefinition> {
    let prefix = format!("{}[{}]", KEY_TASK_LIST, index);
    let obj = raw
        .as_object()
        .ok_or_else(|| ConfigError::invalid(&prefix, "expected an object"))?;
    let field = |key: &str| format!("{}.{}", prefix, key);

    let command = required_str(obj, KEY_COMMAND, None, &field(KEY_COMMAND))?;
    let exec_timeout = required_seconds(obj, KEY_EXEC_TIMEOUT, &field(KEY_EXEC_TIMEOUT))?;
    let variable_name = required_str(obj, KEY_VARIABLE_NAME, None, &field(KEY_VARIABLE_NAME))?;
    let is_number = obj
        .get(KEY_IS_NUMBER)
        .ok_or_else(|| missing(&field(KEY_IS_NUMBER)))?
        .as_bool()
        .ok_or_else(|| ConfigError::invalid(field(KEY_IS_NUMBER), "expected a boolean"))?;

    TaskDefinition::new(
        command,
        exec_timeout,
        variable_name,
        ValueKind::from_is_number(is_number),
    )
    .map_err(|e| match e {
        ConfigError::InvalidField { field: name, reason } => {
            ConfigError::invalid(field(name.as_str()), reason)
        }
        other => other,
    })
}

fn lookup<'a>(obj: &'a Map<String, Value>, key: &str, alias: Option<&str>) -> Option<&'a Value> {
    obj.get(key).or_else(|| alias.and_then(|a| obj.get(a)))
}

fn missing(field: &str) -> ConfigError {
    ConfigError::invalid(field, "missing")
}

fn required_str<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    alias: Option<&str>,
    field: &str,
) -> Result<&'a str> {
    let value = lookup(obj, key, alias)
        .ok_or_else(|| missing(field))?
        .as_str()
        .ok_or_else(|| ConfigError::invalid(field, "expected a string"))?;

    if value.is_empty() {
        return Err(ConfigError::invalid(field, "must not be empty"));
    }
    Ok(value)
}

fn required_positive_int(
    obj: &Map<String, Value>,
    key: &str,
    alias: Option<&str>,
    field: &str,
) -> Result<u64> {
    let value = lookup(obj, key, alias)
        .ok_or_else(|| missing(field))?
        .as_i64()
        .ok_or_else(|| ConfigError::invalid(field, "expected an integer"))?;

    if value <= 0 {
        return Err(ConfigError::invalid(field, format!("{} is not positive", value)));
    }
    Ok(value as u64)
}

fn required_seconds(obj: &Map<String, Value>, key: &str, field: &str) -> Result<Duration> {
    required_positive_int(obj, key, None, field).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> Value {
        json!({
            "moonrakerHost": "localhost",
            "moonrakerPort": 7125,
            "apiTimeout": 5,
            "updateInterval": 30,
            "taskList": [
                {
                    "command": "echo 42",
                    "execTimeout": 2,
                    "variableName": "answer",
                    "isNumber": true
                }
            ]
        })
    }

    fn field_of(doc: &Value) -> String {
        BridgeConfig::from_value(doc)
            .unwrap_err()
            .field()
            .map(str::to_string)
            .unwrap_or_default()
    }

    #[test]
    fn test_accepts_minimal_document() {
        let config = BridgeConfig::from_value(&minimal()).unwrap();

        assert_eq!(config.host(), "localhost");
        assert_eq!(config.port(), 7125);
        assert_eq!(config.api_timeout(), Duration::from_secs(5));
        assert_eq!(config.update_interval(), Duration::from_secs(30));
        assert_eq!(config.macro_name(), DEFAULT_MACRO_NAME);
        assert_eq!(config.base_url(), "http://localhost:7125");
        assert_eq!(config.tasks().len(), 1);
        assert_eq!(config.tasks()[0].variable_name(), "answer");
        assert!(config.tasks()[0].is_number());
    }

    #[test]
    fn test_accepts_remote_aliases_and_macro_name() {
        let doc = json!({
            "remoteHost": "printer.local",
            "remotePort": 80,
            "apiTimeout": 1,
            "updateInterval": 1,
            "macroName": "MY_VARS",
            "taskList": [
                {"command": "hostname", "execTimeout": 1, "variableName": "host", "isNumber": false}
            ]
        });

        let config = BridgeConfig::from_value(&doc).unwrap();
        assert_eq!(config.host(), "printer.local");
        assert_eq!(config.port(), 80);
        assert_eq!(config.macro_name(), "MY_VARS");
        assert!(!config.tasks()[0].is_number());
    }

    #[test]
    fn test_rejects_missing_top_level_fields() {
        for key in [
            "moonrakerHost",
            "moonrakerPort",
            "apiTimeout",
            "updateInterval",
            "taskList",
        ] {
            let mut doc = minimal();
            doc.as_object_mut().unwrap().remove(key);
            assert_eq!(field_of(&doc), key, "missing {} should be rejected", key);
        }
    }

    #[test]
    fn test_rejects_wrong_typed_top_level_fields() {
        let cases = [
            ("moonrakerHost", json!(42)),
            ("moonrakerHost", json!(null)),
            ("moonrakerPort", json!("7125")),
            ("moonrakerPort", json!(7125.0)),
            ("apiTimeout", json!(true)),
            ("apiTimeout", json!(1.5)),
            ("updateInterval", json!("30")),
            ("taskList", json!({"command": "x"})),
        ];

        for (key, value) in cases {
            let mut doc = minimal();
            doc[key] = value.clone();
            assert_eq!(field_of(&doc), key, "{} = {} should be rejected", key, value);
        }
    }

    #[test]
    fn test_rejects_out_of_range_top_level_fields() {
        let cases = [
            ("moonrakerHost", json!("")),
            ("moonrakerPort", json!(0)),
            ("moonrakerPort", json!(-1)),
            ("moonrakerPort", json!(65536)),
            ("apiTimeout", json!(0)),
            ("apiTimeout", json!(-5)),
            ("updateInterval", json!(0)),
            ("taskList", json!([])),
            ("macroName", json!("")),
            ("macroName", json!(1)),
        ];

        for (key, value) in cases {
            let mut doc = minimal();
            doc[key] = value.clone();
            assert_eq!(field_of(&doc), key, "{} = {} should be rejected", key, value);
        }
    }

    #[test]
    fn test_rejects_invalid_task_fields() {
        let cases = [
            ("command", None),
            ("command", Some(json!(""))),
            ("command", Some(json!(["echo"]))),
            ("execTimeout", None),
            ("execTimeout", Some(json!(0))),
            ("execTimeout", Some(json!("2"))),
            ("variableName", None),
            ("variableName", Some(json!(""))),
            ("variableName", Some(json!(3))),
            ("isNumber", None),
            ("isNumber", Some(json!("true"))),
            ("isNumber", Some(json!(1))),
        ];

        for (key, value) in cases {
            let mut doc = minimal();
            let task = doc["taskList"][0].as_object_mut().unwrap();
            match &value {
                Some(v) => {
                    task.insert(key.to_string(), v.clone());
                }
                None => {
                    task.remove(key);
                }
            }
            assert_eq!(
                field_of(&doc),
                format!("taskList[0].{}", key),
                "{} = {:?} should be rejected",
                key,
                value
            );
        }
    }

    #[test]
    fn test_task_error_names_index() {
        let mut doc = minimal();
        doc["taskList"]
            .as_array_mut()
            .unwrap()
            .push(json!({"command": "true", "execTimeout": 1, "variableName": "", "isNumber": false}));

        assert_eq!(field_of(&doc), "taskList[1].variableName");
    }

    #[test]
    fn test_rejects_non_object_task_and_document() {
        let mut doc = minimal();
        doc["taskList"] = json!(["echo 1"]);
        assert_eq!(field_of(&doc), "taskList[0]");

        assert!(BridgeConfig::from_value(&json!([1, 2])).is_err());
        assert!(matches!(
            BridgeConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, minimal().to_string()).unwrap();

        let config = BridgeConfig::load(&path).unwrap();
        assert_eq!(config.tasks().len(), 1);

        let missing = BridgeConfig::load(dir.path().join("absent.json"));
        assert!(matches!(missing, Err(crate::AppError::Io(_))));
    }
}
