use std::net::UdpSocket;

use tracing::{debug, error, warn};

pub mod config;
pub mod dns;
pub mod error;
pub mod packetbuff;
pub mod resolver;
pub mod responder;

pub use config::ServerConfig;
pub use error::{PacketError, ResolveError, ServerError};
pub use resolver::{Resolver, UpstreamResolver};
pub use responder::Responder;

use packetbuff::MAX_DATAGRAM;

/// Receive one datagram on `socket`, answer it and send the reply back to
/// its source.
pub fn handle_query<R: Resolver>(
    socket: &UdpSocket,
    responder: &Responder<R>,
) -> Result<(), ServerError> {
    // receive a query packet
    let mut req_buffer = [0; MAX_DATAGRAM];
    let (size, src) = socket
        .recv_from(&mut req_buffer)
        .map_err(ServerError::Recv)?;
    debug!(size, %src, "received datagram");

    let response = responder.respond(&req_buffer[..size])?;

    // send our response packet
    socket
        .send_to(&response, src)
        .map_err(ServerError::Send)?;
    debug!(size = response.len(), %src, "sent response");

    Ok(())
}

/// Serve requests one at a time until receiving fails.
///
/// Errors confined to one datagram are logged and the loop moves on.
pub fn serve<R: Resolver>(
    socket: &UdpSocket,
    responder: &Responder<R>,
) -> Result<(), ServerError> {
    loop {
        match handle_query(socket, responder) {
            Ok(()) => {}
            Err(e) if e.is_fatal() => {
                error!(error = %e, "stopping server");
                return Err(e);
            }
            Err(e) => warn!(error = %e, "dropped datagram"),
        }
    }
}
