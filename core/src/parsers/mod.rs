//! Parsers for the text output of the remote inventory commands.
//!
//! Both parsers are pure and never fail: lines they cannot use are skipped
//! and counted, so drift in tool output across host versions shows up as a
//! growing counter instead of a failed query.

mod ss;
mod ufw;

pub use ss::{parse_socket_listing, SocketListing};
pub use ufw::parse_firewall_status;
