// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

pub const CSRF_HEADER: &str = "X-CSRFToken";

static META_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("valid meta tag pattern"));
static META_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\b(name|content)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid meta attribute pattern")
});

/// Where the forgery-protection token comes from for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    Fixed(String),
    /// Path of an HTML page whose `<meta name="csrf-token">` carries it.
    Page(String),
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct CsrfToken(Option<String>);

impl CsrfToken {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            return Self(None);
        }
        Self(Some(value))
    }

    pub const fn missing() -> Self {
        Self(None)
    }

    pub const fn is_present(&self) -> bool {
        self.0.is_some()
    }

    pub fn header_value(&self) -> &str {
        match &self.0 {
            Some(value) => value,
            None => {
                tracing::trace!("forgery-protection token missing; sending empty {CSRF_HEADER}");
                ""
            }
        }
    }
}

impl fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("CsrfToken(<redacted>)"),
            None => f.write_str("CsrfToken(<missing>)"),
        }
    }
}

pub fn extract_meta_token(html: &str) -> Option<String> {
    for tag in META_TAG.find_iter(html) {
        let mut name = None;
        let mut content = None;
        for attr in META_ATTR.captures_iter(tag.as_str()) {
            let value = attr
                .get(2)
                .or_else(|| attr.get(3))
                .map(|value| value.as_str());
            match attr.get(1).map(|key| key.as_str().to_ascii_lowercase()) {
                Some(key) if key == "name" => name = value,
                Some(key) if key == "content" => content = value,
                _ => {}
            }
        }
        if name.is_some_and(|name| name.eq_ignore_ascii_case("csrf-token")) {
            return content.map(str::to_owned);
        }
    }
    None
}
