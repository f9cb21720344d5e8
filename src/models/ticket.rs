//! Ticket records exchanged with the ticket store

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// A ticket as persisted in `tickets.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub number: String,
    pub sys_id: String,
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default = "default_state", alias = "state")]
    pub incident_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_state() -> String {
    TicketState::Active.as_str().to_string()
}

/// Minimal handle needed to update a ticket
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketRef {
    pub number: String,
    pub sys_id: String,
}

/// Ticket states this tool writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketState {
    Resolved,
    Active,
}

impl TicketState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketState::Resolved => "Resolved",
            TicketState::Active => "Active",
        }
    }

    /// Compliant servers resolve their ticket, anything else keeps it open
    pub fn for_compliance(compliant: bool) -> Self {
        if compliant {
            TicketState::Resolved
        } else {
            TicketState::Active
        }
    }
}

impl fmt::Display for TicketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Ticket {
    pub fn reference(&self) -> TicketRef {
        TicketRef {
            number: self.number.clone(),
            sys_id: self.sys_id.clone(),
        }
    }

    /// Non-empty nodes, trimmed and lowercased
    pub fn normalized_nodes(&self) -> impl Iterator<Item = String> + '_ {
        self.nodes
            .iter()
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty())
    }
}

/// Map every ticket node (lowercase) to its ticket; later tickets win
pub fn build_ticket_index(tickets: &[Ticket]) -> HashMap<String, TicketRef> {
    let mut index = HashMap::new();
    for ticket in tickets {
        for node in ticket.normalized_nodes() {
            index.insert(node, ticket.reference());
        }
    }
    index
}

/// Sorted, unique, lowercase server names referenced by the tickets
pub fn servers_from_tickets(tickets: &[Ticket]) -> Vec<String> {
    tickets
        .iter()
        .flat_map(Ticket::normalized_nodes)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
