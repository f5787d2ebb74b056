// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub const NETWORK_ERROR_MESSAGE: &str = "network error, please retry";
pub const MALFORMED_RESPONSE_MESSAGE: &str = "malformed response from server, please retry";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Rejected before any request was issued.
    LocalValidation,
    /// Network error, non-2xx without a usable error body, or a malformed body.
    Transport,
    /// Well-formed response carrying an `error` field.
    Application,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    pub details: Vec<String>,
}

impl Failure {
    pub fn local(error: &anyhow::Error) -> Self {
        Self {
            kind: FailureKind::LocalValidation,
            message: error.to_string(),
            details: Vec::new(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transport,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn application(message: impl Into<String>, details: Vec<String>) -> Self {
        Self {
            kind: FailureKind::Application,
            message: message.into(),
            details,
        }
    }

    /// Validation details joined with `, ` when present, the message otherwise.
    pub fn display_text(&self) -> String {
        if self.details.is_empty() {
            self.message.clone()
        } else {
            self.details.join(", ")
        }
    }

    pub fn prefixed(&self, prefix: &str) -> String {
        format!("{prefix}: {}", self.display_text())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    Success(Value),
    Failure(Failure),
}

impl RequestOutcome {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Treat a 2xx body that carries an `error` string as an application
    /// failure.
    pub fn into_application(self) -> Self {
        match self {
            Self::Success(payload) => match error_field(&payload) {
                Some(failure) => Self::Failure(failure),
                None => Self::Success(payload),
            },
            failure @ Self::Failure(_) => failure,
        }
    }

    pub fn into_result(self) -> std::result::Result<Value, Failure> {
        match self {
            Self::Success(payload) => Ok(payload),
            Self::Failure(failure) => Err(failure),
        }
    }
}

/// Map an HTTP status and raw body to an outcome.
pub fn classify_response(status: StatusCode, body: &str) -> RequestOutcome {
    if !status.is_success() {
        if let Ok(payload) = serde_json::from_str::<Value>(body)
            && let Some(failure) = error_field(&payload)
        {
            return RequestOutcome::Failure(failure);
        }
        let reason = status.canonical_reason().unwrap_or("");
        let message = format!("server error: {} {reason}", status.as_u16());
        return RequestOutcome::Failure(Failure::transport(message.trim_end()));
    }

    match serde_json::from_str::<Value>(body) {
        Ok(payload) => RequestOutcome::Success(payload),
        Err(error) => {
            tracing::debug!(%error, "decode response body");
            RequestOutcome::Failure(Failure::transport(MALFORMED_RESPONSE_MESSAGE))
        }
    }
}

/// Success text carried by mutation responses.
pub fn success_message(payload: &Value) -> Option<&str> {
    payload
        .get("message")
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
}

pub fn decode<T: DeserializeOwned>(payload: Value, what: &str) -> Result<T> {
    serde_json::from_value(payload).with_context(|| format!("decode {what}"))
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Value,
    #[serde(default)]
    details: Option<Value>,
}

fn error_field(payload: &Value) -> Option<Failure> {
    let parsed = ErrorBody::deserialize(payload).ok()?;
    let message = match parsed.error {
        Value::String(message) if !message.is_empty() => message,
        Value::Null | Value::Bool(false) => return None,
        Value::String(_) => return None,
        other => other.to_string(),
    };
    let details = match parsed.details {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(text) => text,
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    };
    Some(Failure::application(message, details))
}
