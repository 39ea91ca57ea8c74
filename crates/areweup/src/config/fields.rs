//! Case-insensitive access to the fields of one endpoint object.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::ConfigParseError;

/// A document field and every key it may appear under
#[derive(Debug, Clone, Copy)]
pub(crate) struct Field {
    pub name: &'static str,
    pub keys: &'static [&'static str],
}

pub(crate) const TARGET: Field = Field { name: "Path", keys: &["path", "target"] };
pub(crate) const CUSTOMER_ID: Field = Field { name: "CustomerId", keys: &["customerid"] };
pub(crate) const SEND_METRIC: Field =
    Field { name: "SendToCloudWatch", keys: &["sendtocloudwatch", "sendmetric"] };
pub(crate) const ALERT_TOPIC: Field =
    Field { name: "SNSTopicArn", keys: &["snstopicarn", "alerttopic"] };
pub(crate) const ALERT_SUBJECT: Field =
    Field { name: "Subject", keys: &["subject", "alertsubject"] };
pub(crate) const TIMEOUT: Field = Field { name: "Timeout", keys: &["timeout", "timeoutmillis"] };
pub(crate) const PORT: Field = Field { name: "Port", keys: &["port"] };
pub(crate) const METHOD: Field = Field { name: "Method", keys: &["method"] };
pub(crate) const BODY: Field = Field { name: "Content", keys: &["content", "body"] };
pub(crate) const CONTENT_TYPE: Field = Field { name: "ContentType", keys: &["contenttype"] };
pub(crate) const PREVENT_REDIRECT: Field =
    Field { name: "PreventAutoRedirect", keys: &["preventautoredirect", "preventredirect"] };
pub(crate) const REDIRECT_HEADERS: Field = Field {
    name: "RedirectHeadersToValidate",
    keys: &["redirectheaderstovalidate", "redirectheaderexpectations"],
};
pub(crate) const COOKIES: Field =
    Field { name: "CookiesToValidate", keys: &["cookiestovalidate", "cookiesrequired"] };
pub(crate) const EXPECTED_STATUS: Field =
    Field { name: "ExpectedResponse", keys: &["expectedresponse", "expectedstatus"] };
pub(crate) const IGNORE_TLS_ERRORS: Field =
    Field { name: "IgnoreSslErrors", keys: &["ignoresslerrors", "ignoretlserrors"] };
pub(crate) const PAYLOAD: Field = Field { name: "Payload", keys: &["payload"] };
pub(crate) const RECEIVE_BUFFER_SIZE: Field =
    Field { name: "ReceiveBufferSize", keys: &["receivebuffersize"] };

/// The fields of `section[index]`, keyed by lower-cased name.
///
/// JSON `null` is treated the same as an absent field.
pub(crate) struct EntryFields<'a> {
    section: &'a str,
    index: usize,
    values: HashMap<String, &'a Value>,
}

impl<'a> EntryFields<'a> {
    pub fn new(section: &'a str, index: usize, object: &'a Map<String, Value>) -> Self {
        let mut values = HashMap::with_capacity(object.len());
        for (key, value) in object {
            if !value.is_null() {
                values.entry(key.to_ascii_lowercase()).or_insert(value);
            }
        }
        Self { section, index, values }
    }

    pub fn get(&self, field: Field) -> Option<&'a Value> {
        field.keys.iter().find_map(|key| self.values.get(*key).copied())
    }

    pub fn string(&self, field: Field) -> Result<Option<String>, ConfigParseError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(other) => Err(self.invalid(field, format!("expected a string, found {other}"))),
        }
    }

    pub fn bool(&self, field: Field) -> Result<Option<bool>, ConfigParseError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::Bool(value)) => Ok(Some(*value)),
            Some(Value::String(value)) => match value.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(self.invalid(field, format!("expected a boolean, found \"{value}\""))),
            },
            Some(other) => Err(self.invalid(field, format!("expected a boolean, found {other}"))),
        }
    }

    pub fn integer(&self, field: Field) -> Result<Option<i64>, ConfigParseError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::Number(number)) => number
                .as_i64()
                .map(Some)
                .ok_or_else(|| self.invalid(field, format!("expected an integer, found {number}"))),
            Some(Value::String(value)) => value
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| self.invalid(field, format!("expected an integer, found \"{value}\""))),
            Some(other) => Err(self.invalid(field, format!("expected an integer, found {other}"))),
        }
    }

    pub fn string_list(&self, field: Field) -> Result<Option<Vec<String>>, ConfigParseError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(value) => Ok(value.clone()),
                    other => Err(self.invalid(field, format!("expected strings, found {other}"))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(other) => Err(self.invalid(field, format!("expected an array, found {other}"))),
        }
    }

    pub fn missing(&self, field: Field) -> ConfigParseError {
        ConfigParseError::MissingField {
            section: self.section.to_string(),
            index: self.index,
            field: field.name,
        }
    }

    pub fn invalid(&self, field: Field, reason: impl Into<String>) -> ConfigParseError {
        ConfigParseError::InvalidField {
            section: self.section.to_string(),
            index: self.index,
            field: field.name,
            reason: reason.into(),
        }
    }
}
