//! Requested server lists and the ticket artifacts they are derived from
//!
//! A server list can be given inline, as a file, or derived from the
//! tickets fetched from the ticket store. Every source yields lowercase,
//! de-duplicated names in first-seen order.

use crate::config::paths::ensure_dir;
use crate::models::{Ticket, servers_from_tickets};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Where the requested names came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerSource {
    CommandLine,
    Configured,
    Tickets,
}

impl fmt::Display for ServerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServerSource::CommandLine => "command line",
            ServerSource::Configured => "configured server list",
            ServerSource::Tickets => "ticket artifact",
        };
        write!(f, "{}", s)
    }
}

/// `servicenow_servers.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerArtifact {
    pub servers: Vec<String>,
    pub tickets: Vec<Ticket>,
}

impl ServerArtifact {
    /// Sorted unique servers plus tickets stripped to their identity
    pub fn from_tickets(tickets: &[Ticket]) -> Self {
        let minimal = tickets
            .iter()
            .map(|t| Ticket {
                number: t.number.clone(),
                sys_id: t.sys_id.clone(),
                nodes: t.normalized_nodes().collect(),
                incident_state: t.incident_state.clone(),
                description: None,
            })
            .collect();

        Self {
            servers: servers_from_tickets(tickets),
            tickets: minimal,
        }
    }
}

/// Lowercase, drop blanks and `#` comments, keep first occurrence
fn clean<'a>(entries: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.starts_with('#'))
        .map(str::to_lowercase)
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// Names separated by commas or newlines
pub fn parse_inline(text: &str) -> Vec<String> {
    clean(text.split([',', '\n']))
}

/// One name per line
pub fn load_file(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read server list: {}", path.display()))?;
    let servers = clean(contents.lines());
    tracing::info!("Loaded {} server(s) from {}", servers.len(), path.display());
    Ok(servers)
}

/// A configured value is a file when such a file exists, otherwise a list
pub fn from_value(value: &str) -> Result<Vec<String>> {
    let path = Path::new(value.trim());
    if !value.contains(['\n', ',']) && path.is_file() {
        load_file(path)
    } else {
        Ok(parse_inline(value))
    }
}

/// Resolve the requested names.
///
/// Order: the command line, then the configured list, then the tickets
/// artifact. No usable source is a fatal setup error.
pub fn resolve(
    cli: Option<&str>,
    configured: Option<&str>,
    tickets_path: &Path,
) -> Result<(Vec<String>, ServerSource)> {
    if let Some(value) = cli.filter(|v| !v.trim().is_empty()) {
        return Ok((from_value(value)?, ServerSource::CommandLine));
    }
    if let Some(value) = configured.filter(|v| !v.trim().is_empty()) {
        return Ok((from_value(value)?, ServerSource::Configured));
    }
    if tickets_path.exists() {
        let tickets = read_tickets(tickets_path)?;
        return Ok((servers_from_tickets(&tickets), ServerSource::Tickets));
    }

    anyhow::bail!(
        "No server list: pass --servers, set SERVER_NAMES, or provide {}",
        tickets_path.display()
    )
}

pub fn read_tickets(path: &Path) -> Result<Vec<Ticket>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tickets file: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("{} must be a JSON list of tickets", path.display()))
}

/// Write any JSON artifact, creating parent directories
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value).context("Failed to serialize artifact")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(number: &str, nodes: &[&str]) -> Ticket {
        Ticket {
            number: number.to_string(),
            sys_id: format!("sys-{}", number),
            nodes: nodes.iter().map(|n| n.to_string()).collect(),
            incident_state: "Active".to_string(),
            description: Some("alert text".to_string()),
        }
    }

    #[test]
    fn test_parse_inline() {
        assert_eq!(
            parse_inline("SRV-A, srv-b\nsrv-a,,# note\n  web01 "),
            vec!["srv-a", "srv-b", "web01"]
        );
    }

    #[test]
    fn test_load_file_skips_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("servers.txt");
        std::fs::write(&path, "# weekly list\nAPP01\n\napp02\nApp01\n").unwrap();

        assert_eq!(load_file(&path).unwrap(), vec!["app01", "app02"]);
        assert_eq!(from_value(path.to_str().unwrap()).unwrap(), vec!["app01", "app02"]);
    }

    #[test]
    fn test_resolve_order() {
        let dir = tempfile::tempdir().unwrap();
        let tickets_path = dir.path().join("tickets.json");
        write_json(&tickets_path, &vec![ticket("INC1", &["Srv-B", "srv-a"])]).unwrap();

        let (names, source) = resolve(Some("x1"), Some("y1"), &tickets_path).unwrap();
        assert_eq!((names, source), (vec!["x1".to_string()], ServerSource::CommandLine));

        let (names, source) = resolve(None, Some("y1,y2"), &tickets_path).unwrap();
        assert_eq!(names, vec!["y1", "y2"]);
        assert_eq!(source, ServerSource::Configured);

        let (names, source) = resolve(None, Some("  "), &tickets_path).unwrap();
        assert_eq!(names, vec!["srv-a", "srv-b"]);
        assert_eq!(source, ServerSource::Tickets);
    }

    #[test]
    fn test_resolve_without_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve(None, None, &dir.path().join("tickets.json")).is_err());
    }

    #[test]
    fn test_server_artifact() {
        let artifact = ServerArtifact::from_tickets(&[
            ticket("INC2", &[" WEB01 ", ""]),
            ticket("INC1", &["app01", "web01"]),
        ]);
        assert_eq!(artifact.servers, vec!["app01", "web01"]);
        assert_eq!(artifact.tickets[0].nodes, vec!["web01"]);
        assert!(artifact.tickets.iter().all(|t| t.description.is_none()));
    }
}
