//! Domain model layer
//!
//! Explicit types for everything that crosses a module boundary:
//! - `object_type.rs` - kinds of backup-tracked objects
//! - `catalog.rs` - catalog objects and name normalization
//! - `snapshot.rs` - snapshot records and timestamp parsing
//! - `result.rs` - per-server reconciliation results
//! - `ticket.rs` - ticket records and the server-to-ticket index

pub mod catalog;
pub mod object_type;
pub mod result;
pub mod snapshot;
pub mod ticket;

pub use catalog::{CatalogObject, NOT_AVAILABLE, normalize_name};
pub use object_type::ObjectType;
pub use result::{CatalogPresence, Remediation, ResultRecord};
pub use snapshot::{SnapshotHistory, SnapshotRecord, display_timestamp, parse_timestamp};
pub use ticket::{Ticket, TicketRef, TicketState, build_ticket_index, servers_from_tickets};
