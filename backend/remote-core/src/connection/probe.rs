//! OS-level TCP state of an established client socket.
//!
//! The probe looks the socket up in the system socket table instead of doing
//! a round trip to the operator, so it is safe to call between exchanges.

use crate::discovery::process::query_tcp_sockets;
use crate::error::discovery::DiscoveryError;

use std::net::SocketAddr;

use log::trace;
use netstat2::{ProtocolSocketInfo, TcpState};

/// States in which the socket can still carry a request/response exchange.
pub fn is_connected_state(state: TcpState) -> bool {
    !matches!(
        state,
        TcpState::Unknown | TcpState::Closed | TcpState::Closing | TcpState::CloseWait
    )
}

/// TCP state of the socket bound to `local` and connected to `peer`.
///
/// `Ok(None)` means the socket is not listed in the table.
#[track_caller]
pub fn tcp_state(local: SocketAddr, peer: SocketAddr) -> Result<Option<TcpState>, DiscoveryError> {
    let sockets = query_tcp_sockets()?;

    for s in sockets {
        if let ProtocolSocketInfo::Tcp(tcp) = s.protocol_socket_info
            && tcp.local_port == local.port()
            && tcp.remote_port == peer.port()
            && same_host(tcp.remote_addr, peer)
        {
            trace!("Socket {local} -> {peer} is {:?}", tcp.state);
            return Ok(Some(tcp.state));
        }
    }

    trace!("Socket {local} -> {peer} not found in socket table");
    Ok(None)
}

fn same_host(remote: std::net::IpAddr, peer: SocketAddr) -> bool {
    let peer_ip = peer.ip().to_canonical();
    remote.to_canonical() == peer_ip
}
