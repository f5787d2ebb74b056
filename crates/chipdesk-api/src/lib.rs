// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod endpoints;
mod outcome;
mod token;

pub use outcome::*;
pub use token::*;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::blocking::multipart::Form;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body encoding. Each endpoint picks one explicitly.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    Multipart(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Body,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>, body: Body) -> Self {
        Self {
            method,
            path: path.into(),
            body,
        }
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// The single outbound boundary. Implementations never retry, cache or
/// deduplicate; every call is independent and may run concurrently.
pub trait Gateway: Send + Sync {
    fn perform(&self, request: &ApiRequest) -> RequestOutcome;
}

#[derive(Debug, Clone)]
pub struct HttpGateway {
    base_url: Url,
    timeout: Duration,
    token: CsrfToken,
    http: HttpClient,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("server.base_url must not be empty");
        }
        let base_url = Url::parse(&format!("{trimmed}/"))
            .with_context(|| format!("parse server.base_url {base_url:?}"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "server.base_url {:?} must use http or https",
                base_url.as_str()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            token: CsrfToken::missing(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn token(&self) -> &CsrfToken {
        &self.token
    }

    pub fn set_token(&mut self, token: CsrfToken) {
        self.token = token;
    }

    /// Resolve the session token once. A page without the meta tag leaves the
    /// token missing; only an unreachable page is an error.
    pub fn load_token(&mut self, source: &TokenSource) -> Result<()> {
        match source {
            TokenSource::Fixed(value) => {
                self.token = CsrfToken::new(value.clone());
            }
            TokenSource::Page(path) => {
                let url = self.url(path)?;
                let response = self
                    .http
                    .get(url)
                    .send()
                    .map_err(|error| connection_error(self.base_url(), error))?;
                let status = response.status();
                if !status.is_success() {
                    bail!("token page {path} returned {}", status.as_u16());
                }
                let html = response.text().context("read token page")?;
                self.token = match extract_meta_token(&html) {
                    Some(value) => CsrfToken::new(value),
                    None => {
                        tracing::warn!(page = %path, "csrf-token meta tag not found");
                        CsrfToken::missing()
                    }
                };
            }
        }
        Ok(())
    }

    pub fn health(&self) -> Result<endpoints::HealthResponse> {
        let payload = self
            .perform(&endpoints::health())
            .into_result()
            .map_err(|failure| {
                anyhow!(
                    "health check against {} failed: {}",
                    self.base_url(),
                    failure.display_text()
                )
            })?;
        decode(payload, "health response")
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("join {path:?} onto {}", self.base_url))
    }

    fn builder(&self, request: &ApiRequest, url: Url) -> RequestBuilder {
        let builder = match request.method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
            Method::Put => self.http.put(url),
            Method::Delete => self.http.delete(url),
        }
        .header(CSRF_HEADER, self.token.header_value());

        match &request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(value),
            Body::Multipart(fields) => {
                let form = fields.iter().fold(Form::new(), |form, (name, value)| {
                    form.text(name.clone(), value.clone())
                });
                builder.multipart(form)
            }
        }
    }
}

impl Gateway for HttpGateway {
    fn perform(&self, request: &ApiRequest) -> RequestOutcome {
        let url = match self.url(&request.path) {
            Ok(url) => url,
            Err(error) => {
                tracing::error!(%request, error = %format!("{error:#}"), "build request URL");
                return RequestOutcome::Failure(Failure::transport(NETWORK_ERROR_MESSAGE));
            }
        };

        let response = match self.builder(request, url).send() {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(%request, %error, "request failed");
                return RequestOutcome::Failure(Failure::transport(NETWORK_ERROR_MESSAGE));
            }
        };

        let status = response.status();
        let body = match response.text() {
            Ok(body) => body,
            Err(error) => {
                tracing::warn!(%request, %error, "read response body");
                return RequestOutcome::Failure(Failure::transport(NETWORK_ERROR_MESSAGE));
            }
        };

        let outcome = classify_response(status, &body);
        if let RequestOutcome::Failure(failure) = &outcome {
            tracing::debug!(%request, status = status.as_u16(), message = %failure.message, "request failed");
        }
        outcome
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- check [server].base_url and that the server is running ({})",
        base_url,
        error
    )
}

#[cfg(test)]
mod tests {
    use super::{ApiRequest, Body, HttpGateway, Method};
    use std::time::Duration;

    #[test]
    fn base_url_is_normalized() {
        let gateway = HttpGateway::new("http://localhost:5000///", Duration::from_secs(1))
            .expect("gateway should build");
        assert_eq!(gateway.base_url(), "http://localhost:5000");
    }

    #[test]
    fn base_url_with_prefix_joins_paths_under_it() {
        let gateway = HttpGateway::new("http://localhost:5000/shop", Duration::from_secs(1))
            .expect("gateway should build");
        let url = gateway.url("/admin/email/cc").expect("url should join");
        assert_eq!(url.as_str(), "http://localhost:5000/shop/admin/email/cc");
    }

    #[test]
    fn invalid_base_urls_are_rejected() {
        assert!(HttpGateway::new("", Duration::from_secs(1)).is_err());
        assert!(HttpGateway::new("ftp://example.com", Duration::from_secs(1)).is_err());
        assert!(HttpGateway::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn request_display_names_method_and_path() {
        let request = ApiRequest::new(Method::Delete, "/admin/email/cc/3", Body::Empty);
        assert_eq!(request.to_string(), "DELETE /admin/email/cc/3");
    }
}
