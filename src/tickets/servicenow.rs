//! ServiceNow table API client

use super::{TicketStore, TicketStoreError, TicketUpdate};
use crate::config::{ServiceNowConfig, ServiceNowCredentials};
use crate::models::{Ticket, TicketRef, TicketState};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;

/// Node names embedded in alert descriptions, tried in order
static DESCRIPTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"(?i)vSphere VM\s+'([\w\-]+)'", r"(?i)Object Name:\s*([\w\-]+)"]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

/// ServiceNow incident client using basic auth
pub struct ServiceNowClient {
    client: reqwest::Client,
    base_url: String,
    query_url: Option<String>,
    node_field: String,
    credentials: ServiceNowCredentials,
    fetch_timeout: Duration,
    update_timeout: Duration,
}

impl ServiceNowClient {
    pub fn new(
        config: &ServiceNowConfig,
        credentials: ServiceNowCredentials,
    ) -> Result<Self, TicketStoreError> {
        let client = reqwest::Client::builder().build().map_err(|e| {
            TicketStoreError::Transport(format!("Failed to create HTTP client: {}", e))
        })?;

        let base_url = base_url(config.url.as_deref(), &config.instance);
        tracing::debug!("Using ServiceNow instance: {}", base_url);

        Ok(Self {
            client,
            base_url,
            query_url: config.url.as_deref().map(with_display_values),
            node_field: config.node_field.clone(),
            credentials,
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
            update_timeout: Duration::from_secs(config.update_timeout_secs),
        })
    }
}

#[async_trait]
impl TicketStore for ServiceNowClient {
    async fn fetch_tickets(&self) -> Result<Vec<Ticket>, TicketStoreError> {
        let url = self.query_url.as_deref().ok_or_else(|| {
            TicketStoreError::Transport("no incident query URL configured".to_string())
        })?;

        tracing::info!("Fetching incidents from: {}", url);

        let resp = self
            .client
            .get(url)
            .basic_auth(&self.credentials.user, Some(&self.credentials.password))
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|e| TicketStoreError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(TicketStoreError::Status {
                status: resp.status().as_u16(),
                target: url.to_string(),
            });
        }

        let payload: Value = resp
            .json()
            .await
            .map_err(|e| TicketStoreError::MalformedResponse(e.to_string()))?;

        parse_ticket_payload(&payload, &self.node_field)
    }

    async fn update_ticket(
        &self,
        ticket: &TicketRef,
        update: &TicketUpdate,
    ) -> Result<(), TicketStoreError> {
        let url = format!("{}/api/now/table/incident/{}", self.base_url, ticket.sys_id);

        let resp = self
            .client
            .patch(&url)
            .basic_auth(&self.credentials.user, Some(&self.credentials.password))
            .json(update)
            .timeout(self.update_timeout)
            .send()
            .await
            .map_err(|e| TicketStoreError::Transport(e.to_string()))?;

        match resp.status().as_u16() {
            200 | 204 => Ok(()),
            status => Err(TicketStoreError::Status {
                status,
                target: ticket.number.clone(),
            }),
        }
    }
}

/// Scheme and host of the configured URL, else the legacy instance URL
pub fn base_url(url: Option<&str>, instance: &str) -> String {
    match url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(raw) => match url::Url::parse(raw) {
            Ok(parsed) if parsed.has_host() => parsed.origin().ascii_serialization(),
            _ => raw.trim_end_matches('/').to_string(),
        },
        None => format!("https://{}.service-now.com", instance),
    }
}

/// Ask for display values so reference fields come back readable
pub fn with_display_values(url: &str) -> String {
    if url.contains("sysparm_display_value") {
        url.to_string()
    } else if url.contains('?') {
        format!("{}&sysparm_display_value=all", url)
    } else {
        format!("{}?sysparm_display_value=all", url)
    }
}

/// A field as returned with `sysparm_display_value=all`: either a plain
/// string or `{display_value, value}`
fn field_text(record: &Value, field: &str) -> Option<String> {
    let text = match record.get(field)? {
        Value::String(s) => s.clone(),
        Value::Object(obj) => ["display_value", "value"]
            .iter()
            .filter_map(|k| obj.get(*k).and_then(|v| v.as_str()))
            .find(|s| !s.trim().is_empty())?
            .to_string(),
        _ => return None,
    };
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Node name mentioned in an alert description
pub fn node_from_description(description: &str) -> Option<String> {
    DESCRIPTION_PATTERNS
        .iter()
        .find_map(|re| re.captures(description))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parse a table API `{"result": [...]}` payload into tickets
pub fn parse_ticket_payload(
    payload: &Value,
    node_field: &str,
) -> Result<Vec<Ticket>, TicketStoreError> {
    let records = payload
        .get("result")
        .and_then(|r| r.as_array())
        .ok_or_else(|| TicketStoreError::MalformedResponse("no result array".to_string()))?;

    let mut tickets = Vec::with_capacity(records.len());
    for record in records {
        let number = field_text(record, "number").unwrap_or_else(|| "(unknown)".to_string());
        let Some(sys_id) = field_text(record, "sys_id") else {
            tracing::warn!("Skipping incident {} without sys_id", number);
            continue;
        };

        let description = field_text(record, "description").map(|d| d.replace('\n', " "));
        let node = field_text(record, node_field).or_else(|| {
            let extracted = description.as_deref().and_then(node_from_description);
            if let Some(node) = &extracted {
                tracing::info!("Extracted node '{}' from description of {}", node, number);
            }
            extracted
        });

        let incident_state = field_text(record, "incident_state")
            .unwrap_or_else(|| TicketState::Active.as_str().to_string());

        tracing::debug!("{}: node={:?}, state={}", number, node, incident_state);

        tickets.push(Ticket {
            number,
            sys_id,
            nodes: node.into_iter().collect(),
            incident_state,
            description,
        });
    }

    Ok(tickets)
}
