//! A message-shaped evaluation context: body, headers, exchange properties
//! and variables, plus named beans for call-style functions.

use crate::expression::{EvalError, EvalResult, EvaluationContext, Value, ValueType};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

const HEADER_PREFIXES: [&str; 4] = ["in.headers", "in.header", "headers", "header"];
const PROPERTY_PREFIXES: [&str; 1] = ["exchangeProperty"];
const VARIABLE_PREFIXES: [&str; 2] = ["variables", "variable"];
const BEAN_PREFIXES: [&str; 2] = ["bean:", "method:"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    pub body: Value,
    pub headers: HashMap<String, Value>,
    pub properties: HashMap<String, Value>,
    pub variables: HashMap<String, Value>,
}

impl Message {
    pub fn new(body: impl Into<Value>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    /// Load a message from a JSON file with optional `body`, `headers`,
    /// `properties` and `variables` fields.
    pub fn load(path: impl AsRef<Path>) -> Result<Message> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read message file {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("Failed to load message from {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> Result<Message> {
        serde_json::from_str(text).context("Invalid message JSON")
    }

    /// Header lookup, exact name first and then ignoring case.
    pub fn header(&self, name: &str) -> Option<&Value> {
        self.headers.get(name).or_else(|| {
            self.headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })
    }
}

/// A callable bean. Receives the text after the bean name, for example
/// `hello('World')` for `bean:greeter.hello('World')`.
pub type BeanFn = Arc<dyn Fn(&str) -> EvalResult<Value> + Send + Sync>;

#[derive(Clone, Default)]
pub struct MessageContext {
    message: Message,
    beans: HashMap<String, BeanFn>,
}

impl MessageContext {
    pub fn new(message: Message) -> Self {
        Self {
            message,
            beans: HashMap::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Value>) -> Self {
        self.message.body = body.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.message.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.message.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.message.variables.insert(name.into(), value.into());
        self
    }

    pub fn with_bean<F>(mut self, name: impl Into<String>, bean: F) -> Self
    where
        F: Fn(&str) -> EvalResult<Value> + Send + Sync + 'static,
    {
        self.beans.insert(name.into(), Arc::new(bean));
        self
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    fn call_bean(&self, call: &str) -> EvalResult<Value> {
        let end = call.find(['.', '(']).unwrap_or(call.len());
        let (name, rest) = call.split_at(end);
        let bean = self
            .beans
            .get(name)
            .ok_or_else(|| EvalError::unresolved(call, format!("no bean named '{}'", name)))?;
        bean(rest.strip_prefix('.').unwrap_or(rest))
    }

    /// Built-in functions written as `name(argument)`. An empty argument
    /// applies the function to the body. Unknown names return `None`.
    fn call_function(&self, path: &str) -> EvalResult<Option<Value>> {
        let Some((name, rest)) = path.split_once('(') else {
            return Ok(None);
        };
        let Some(argument) = rest.strip_suffix(')') else {
            return Ok(None);
        };
        let argument = argument.trim().trim_matches(|c| c == '\'' || c == '"');
        let input = if argument.is_empty() {
            self.message.body.clone()
        } else {
            Value::string(argument)
        };
        let map_text = |f: fn(&str) -> String| match &input {
            Value::Null => Value::Null,
            other => Value::String(f(&other.to_text())),
        };

        let value = match name.trim() {
            "uppercase" => map_text(|s| s.to_uppercase()),
            "lowercase" => map_text(|s| s.to_lowercase()),
            "trim" => map_text(|s| s.trim().to_string()),
            "length" => {
                let len = match &input {
                    Value::List(items) => items.len(),
                    other => other.to_text().chars().count(),
                };
                Value::Integer(len as i64)
            }
            "bodyAs" => {
                let target = ValueType::from_name(argument).ok_or_else(|| {
                    EvalError::unresolved(path, format!("unknown type '{}'", argument))
                })?;
                self.coerce(&self.message.body, target)?
            }
            _ => return Ok(None),
        };
        Ok(Some(value))
    }
}

impl fmt::Debug for MessageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut beans: Vec<&String> = self.beans.keys().collect();
        beans.sort();
        f.debug_struct("MessageContext")
            .field("message", &self.message)
            .field("beans", &beans)
            .finish()
    }
}

impl EvaluationContext for MessageContext {
    fn resolve(&self, name: &str) -> EvalResult<Value> {
        let path = name.trim();

        if path == "body" || path == "in.body" {
            return Ok(self.message.body.clone());
        }
        if let Some(key) = keyed(path, &HEADER_PREFIXES) {
            return Ok(self.message.header(key).cloned().unwrap_or_default());
        }
        if let Some(key) = keyed(path, &PROPERTY_PREFIXES) {
            return Ok(self.message.properties.get(key).cloned().unwrap_or_default());
        }
        if let Some(key) = keyed(path, &VARIABLE_PREFIXES) {
            return Ok(self.message.variables.get(key).cloned().unwrap_or_default());
        }
        if let Some(call) = BEAN_PREFIXES.iter().find_map(|p| path.strip_prefix(p)) {
            return self.call_bean(call);
        }
        if let Some(value) = self.call_function(path)? {
            return Ok(value);
        }

        Err(EvalError::unresolved(name, "unknown function"))
    }
}

/// Match `prefix.key`, `prefix:key` or `prefix[key]` for any of `prefixes`.
fn keyed<'a>(path: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|prefix| {
        let rest = path.strip_prefix(prefix)?;
        let key = match rest.chars().next()? {
            '.' | ':' => &rest[1..],
            '[' => rest.strip_prefix('[')?.strip_suffix(']')?,
            _ => return None,
        };
        let key = key.trim().trim_matches(|c| c == '\'' || c == '"');
        (!key.is_empty()).then_some(key)
    })
}
