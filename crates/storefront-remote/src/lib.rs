// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use reqwest::Method as HttpMethod;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE, HeaderMap, HeaderValue, PRAGMA};
use std::time::Duration;
use storefront_app::{Method, RemoteCall, RemoteReply, Transport};
use tracing::debug;
use url::Url;

pub const HAL_JSON: &str = "application/hal+json";
const ACCEPT_VALUE: &str = "application/hal+json, application/json;q=0.9";
const BODY_CONTENT_TYPE: &str = "application/hal+json; charset=utf-8";

/// Blocking HTTP transport for a remote collection resource.
///
/// Every request asks for HAL JSON and bypasses caches; bodies are sent as
/// HAL JSON. Non-success statuses are returned as replies, only failures to
/// get a response at all are errors.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: Url,
    timeout: Duration,
    http: HttpClient,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("remote.base_url must not be empty");
        }
        let mut base_url =
            Url::parse(trimmed).with_context(|| format!("parse remote base URL {trimmed:?}"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "remote base URL {trimmed:?} must use http or https, got {:?}",
                base_url.scheme()
            );
        }

        // A prefix such as `/shop` must survive joining the collection path.
        if !base_url.path().ends_with('/') {
            let prefix = format!("{}/", base_url.path());
            base_url.set_path(&prefix);
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        let http = HttpClient::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    /// Resolves a collection or member path under the base URL's own path.
    pub fn url_for(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("join {path:?} onto {}", self.base_url))
    }
}

impl Transport for HttpTransport {
    fn send(&mut self, call: &RemoteCall) -> Result<RemoteReply> {
        let url = self.url_for(&call.path)?;
        debug!(method = %call.method, %url, "dispatching HTTP request");

        let mut request = self.http.request(http_method(call.method), url.clone());
        if let Some(body) = &call.body {
            let bytes = serde_json::to_vec(body).context("encode request body")?;
            request = request
                .header(CONTENT_TYPE, BODY_CONTENT_TYPE)
                .body(bytes);
        }

        let response = request
            .send()
            .map_err(|error| connection_error(&self.base_url, self.timeout, error))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .with_context(|| format!("read response body from {url}"))?;
        debug!(method = %call.method, %url, status, bytes = body.len(), "HTTP response received");

        Ok(RemoteReply { status, body })
    }
}

fn http_method(method: Method) -> HttpMethod {
    match method {
        Method::Get => HttpMethod::GET,
        Method::Post => HttpMethod::POST,
        Method::Put => HttpMethod::PUT,
        Method::Delete => HttpMethod::DELETE,
    }
}

fn connection_error(base_url: &Url, timeout: Duration, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!(
            "{} did not answer within {}ms -- raise [remote].timeout or check the server",
            base_url,
            timeout.as_millis()
        );
    }
    anyhow!(
        "cannot reach {} -- check [remote].base_url or STOREFRONT_BASE_URL ({})",
        base_url,
        error
    )
}
