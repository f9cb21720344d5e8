//! Authenticated GraphQL client for Rubrik Security Cloud

use super::PageInfo;
use super::trigger::truncate;
use crate::config::{RubrikConfig, RubrikCredentials};
use crate::platform::PlatformError;
use serde_json::{Value, json};
use std::time::Duration;

const ERROR_BODY_LIMIT: usize = 400;

/// Rubrik API client holding a bearer token for the whole run
pub struct RubrikClient {
    pub(super) http: reqwest::Client,
    /// Separate client so remediation can use its own, longer timeout
    pub(super) remediation_http: reqwest::Client,
    pub(super) graphql_url: String,
    pub(super) token: String,
    pub(super) settings: RubrikConfig,
}

impl RubrikClient {
    /// Exchange the client credentials for a token and build the client.
    ///
    /// Fails with [`PlatformError::Auth`] when the token request is rejected
    /// or the response carries no `access_token`.
    pub async fn connect(
        config: &RubrikConfig,
        credentials: &RubrikCredentials,
    ) -> Result<Self, PlatformError> {
        let http = build_http(config, config.request_timeout_secs)?;
        let remediation_http = build_http(config, config.remediation_timeout_secs)?;

        let token_url = token_url(config);
        tracing::debug!("Requesting platform token from: {}", token_url);

        let resp = http
            .post(&token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PlatformError::Auth(format!("{}: {}", token_url, e)))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| PlatformError::Auth(e.to_string()))?;

        if !status.is_success() {
            return Err(PlatformError::Auth(format!(
                "token request returned {}: {}",
                status,
                truncate(&body, ERROR_BODY_LIMIT)
            )));
        }

        let token = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("access_token")?.as_str().map(String::from))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| PlatformError::Auth("token response has no access_token".into()))?;

        tracing::info!("Authenticated against {}", config.endpoint);

        Ok(Self {
            http,
            remediation_http,
            graphql_url: graphql_url(&config.endpoint),
            token,
            settings: config.clone(),
        })
    }

    /// Run one GraphQL request and return the decoded body.
    ///
    /// Non-200 statuses and non-empty `errors` arrays are transport errors.
    pub(crate) async fn query(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<Value, PlatformError> {
        let resp = self
            .http
            .post(&self.graphql_url)
            .bearer_auth(&self.token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| PlatformError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| PlatformError::Transport(e.to_string()))?;

        if status != reqwest::StatusCode::OK {
            return Err(PlatformError::Transport(format!(
                "GraphQL returned {}: {}",
                status,
                truncate(&body, ERROR_BODY_LIMIT)
            )));
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| PlatformError::MalformedResponse(format!("invalid JSON: {}", e)))?;

        let errors = value
            .get("errors")
            .and_then(|e| e.as_array())
            .filter(|e| !e.is_empty());
        if let Some(errors) = errors {
            return Err(PlatformError::Transport(describe_graphql_errors(errors)));
        }

        Ok(value)
    }

    /// Raw POST of a GraphQL document with the remediation timeout
    pub(super) async fn post_remediation(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<(u16, String), reqwest::Error> {
        let resp = self
            .remediation_http
            .post(&self.graphql_url)
            .bearer_auth(&self.token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;
        let status = resp.status().as_u16();
        Ok((status, resp.text().await?))
    }

    /// Follow cursors over a listing.
    ///
    /// Losing the first page fails with [`PlatformError::CatalogFetch`];
    /// losing a later page keeps what was already collected.
    pub(super) async fn paginate<T, F>(
        &self,
        what: &str,
        query: &str,
        variables: Value,
        parse: F,
    ) -> Result<Vec<T>, PlatformError>
    where
        F: Fn(&Value) -> Option<(Vec<T>, PageInfo)>,
    {
        let mut items = Vec::new();
        let mut after: Option<String> = None;
        let mut page_number = 0usize;

        loop {
            let mut vars = variables.clone();
            vars["first"] = json!(self.settings.page_size);
            vars["after"] = json!(after);

            let page = self.query(query, vars).await.and_then(|response| {
                parse(&response).ok_or_else(|| {
                    PlatformError::MalformedResponse(format!("{} listing has no connection", what))
                })
            });

            let (mut batch, info) = match page {
                Ok(page) => page,
                Err(e) if page_number == 0 => {
                    return Err(PlatformError::CatalogFetch(format!("{}: {}", what, e)));
                }
                Err(e) => {
                    tracing::warn!(
                        "Stopping {} listing after {} page(s): {}",
                        what,
                        page_number,
                        e
                    );
                    break;
                }
            };

            page_number += 1;
            items.append(&mut batch);

            match info.next_cursor(after.as_deref()) {
                Some(cursor) => after = Some(cursor),
                None => break,
            }
        }

        tracing::debug!("Fetched {} {} item(s) in {} page(s)", items.len(), what, page_number);
        Ok(items)
    }
}

fn build_http(config: &RubrikConfig, timeout_secs: u64) -> Result<reqwest::Client, PlatformError> {
    let mut builder = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .danger_accept_invalid_certs(config.accept_invalid_certs);

    if let Some(proxy) = &config.proxy {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| PlatformError::Transport(format!("invalid proxy {}: {}", proxy, e)))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| PlatformError::Transport(format!("Failed to create HTTP client: {}", e)))
}

/// Endpoint as an `https://` base without a trailing slash
pub fn base_url(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Bare host of the endpoint, for `{fqdn}` substitution
fn host(endpoint: &str) -> String {
    let base = base_url(endpoint);
    url::Url::parse(&base)
        .ok()
        .and_then(|u| u.host_str().map(String::from))
        .unwrap_or(base)
}

pub fn graphql_url(endpoint: &str) -> String {
    format!("{}/api/graphql", base_url(endpoint))
}

/// Token URL from the configured template, or `<base>/api/client_token`
pub fn token_url(config: &RubrikConfig) -> String {
    match &config.token_url {
        Some(template) => {
            let fqdn = host(&config.endpoint);
            template.replace("{cluster}", &fqdn).replace("{fqdn}", &fqdn)
        }
        None => format!("{}/api/client_token", base_url(&config.endpoint)),
    }
}

fn describe_graphql_errors(errors: &[Value]) -> String {
    errors
        .iter()
        .map(|e| {
            let message = e
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error");
            match e.get("path") {
                Some(path) if !path.is_null() => format!("{} (path: {})", message, path),
                _ => message.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}
