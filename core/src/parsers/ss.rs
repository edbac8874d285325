//! Parser for `ss -tulpn`.
//!
//! ```text
//! Netid State  Recv-Q Send-Q Local Address:Port Peer Address:Port Process
//! tcp   LISTEN 0      4096   0.0.0.0:80         0.0.0.0:*         users:(("nginx",pid=123,fd=4))
//! ```

use tracing::debug;

use crate::domain::{ListeningSocket, Protocol};

const MIN_FIELDS: usize = 6;
const PROCESS_COLUMN: usize = 6;

fn is_header(line: &str) -> bool {
    line.starts_with("Netid") || line.starts_with("State")
}

/// Keep only sockets accepting connections (tcp) or bound for datagrams (udp).
fn is_listening(state: &str) -> bool {
    state == "LISTEN" || state == "UNCONN"
}

/// Split `addr:port` at its last colon.
///
/// Handles "0.0.0.0:80", "[::]:22", "*:68" and "127.0.0.53%lo:53".
fn split_address(local: &str) -> Option<(&str, u16)> {
    let (address, port) = local.rsplit_once(':')?;
    let port: u16 = port.parse().ok()?;
    if port == 0 {
        return None;
    }
    let address = if address.is_empty() { "*" } else { address };
    Some((address, port))
}

/// Sockets extracted from one listing, plus the number of lines skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocketListing {
    pub sockets: Vec<ListeningSocket>,
    pub skipped: usize,
}

enum Line {
    Socket(ListeningSocket),
    Filtered,
    Unusable,
}

fn parse_line(line: &str) -> Line {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < MIN_FIELDS {
        return Line::Unusable;
    }

    let Ok(protocol) = fields[0].parse::<Protocol>() else {
        return Line::Unusable;
    };
    if !is_listening(fields[1]) {
        return Line::Filtered;
    }
    let Some((address, port)) = split_address(fields[4]) else {
        return Line::Unusable;
    };

    let descriptor = fields[PROCESS_COLUMN..].join(" ");
    let descriptor = (!descriptor.is_empty()).then_some(descriptor);

    Line::Socket(ListeningSocket::new(protocol, port, address, descriptor))
}

/// Parse the output of `ss -tulpn` into listening sockets.
///
/// Rows in other connection states are dropped silently; malformed rows are
/// counted in `skipped`.
pub fn parse_socket_listing(output: &str) -> SocketListing {
    let mut listing = SocketListing::default();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() || is_header(line) {
            continue;
        }

        match parse_line(line) {
            Line::Socket(socket) => listing.sockets.push(socket),
            Line::Filtered => {}
            Line::Unusable => {
                debug!(line = %line, "Skipping unrecognized socket listing line");
                listing.skipped += 1;
            }
        }
    }

    listing
}
