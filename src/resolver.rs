use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::dns::{DnsName, DnsPacket, DnsQuestion, QueryType};
use crate::error::ResolveError;
use crate::packetbuff::{PacketReader, PacketWriter, MAX_DATAGRAM};

/// Turns a hostname into IPv4 addresses.
pub trait Resolver {
    fn resolve(&self, host: &str) -> Result<Vec<Ipv4Addr>, ResolveError>;
}

impl<R: Resolver + ?Sized> Resolver for &R {
    fn resolve(&self, host: &str) -> Result<Vec<Ipv4Addr>, ResolveError> {
        (**self).resolve(host)
    }
}

impl<R: Resolver + ?Sized> Resolver for Box<R> {
    fn resolve(&self, host: &str) -> Result<Vec<Ipv4Addr>, ResolveError> {
        (**self).resolve(host)
    }
}

/// Forwards A lookups to an upstream server over UDP.
#[derive(Debug, Clone)]
pub struct UpstreamResolver {
    server: SocketAddr,
    timeout: Duration,
}

impl UpstreamResolver {
    pub fn new(server: SocketAddr, timeout: Duration) -> Self {
        UpstreamResolver { server, timeout }
    }

    fn socket(&self) -> Result<UdpSocket, ResolveError> {
        let local: SocketAddr = if self.server.is_ipv4() {
            ([0u8; 4], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };

        let socket = UdpSocket::bind(local)?;
        socket.set_write_timeout(Some(self.timeout))?;
        Ok(socket)
    }
}

impl Resolver for UpstreamResolver {
    fn resolve(&self, host: &str) -> Result<Vec<Ipv4Addr>, ResolveError> {
        let qname = DnsName::from_hostname(host)?;
        let socket = self.socket()?;

        let deadline = Instant::now() + self.timeout;
        let response = lookup(qname, QueryType::A, self.server, &socket, deadline)?;
        let addrs: Vec<Ipv4Addr> = response.ipv4_answers().collect();
        debug!(host, ?addrs, upstream = %self.server, "upstream answered");

        if addrs.is_empty() {
            return Err(ResolveError::NoAddresses(host.to_string()));
        }

        Ok(addrs)
    }
}

/// Send one recursive query to `server` and wait for its answer until
/// `deadline`.
///
/// Datagrams from another source, or that do not answer this query (wrong
/// id, not a response, different question), are skipped. The accepted
/// answer must carry response code 0.
pub fn lookup(
    qname: DnsName,
    qtype: QueryType,
    server: SocketAddr,
    socket: &UdpSocket,
    deadline: Instant,
) -> Result<DnsPacket, ResolveError> {
    // query packet
    let mut query = DnsPacket::new();
    query.header.id = fastrand::u16(..);
    query.header.rd = true;
    query.add_question(DnsQuestion::new(qname, qtype))?;

    let mut req_buf = PacketWriter::new();
    query.write(&mut req_buf)?;

    socket
        .send_to(req_buf.as_slice(), server)
        .map_err(classify_io)?;

    let mut res_buf = [0; MAX_DATAGRAM];
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(ResolveError::Timeout);
        }
        socket.set_read_timeout(Some(remaining))?;

        let (size, src) = socket.recv_from(&mut res_buf).map_err(classify_io)?;
        if src != server {
            debug!(%src, %server, "ignoring datagram from unexpected source");
            continue;
        }

        let response = match DnsPacket::read(&mut PacketReader::new(&res_buf[..size])) {
            Ok(response) => response,
            Err(e) => {
                debug!(%src, error = %e, "ignoring malformed upstream datagram");
                continue;
            }
        };

        if !answers_query(&query, &response) {
            debug!(
                id = response.header.id,
                expected = query.header.id,
                "ignoring reply to another query"
            );
            continue;
        }

        if response.header.rcode() != 0 {
            return Err(ResolveError::ResponseCode(response.header.rcode()));
        }

        return Ok(response);
    }
}

fn answers_query(query: &DnsPacket, response: &DnsPacket) -> bool {
    response.header.qr
        && response.header.id == query.header.id
        && response.questions.len() == query.questions.len()
        && response.questions.iter().zip(&query.questions).all(|(r, q)| {
            r.qtype == q.qtype && r.qclass == q.qclass && r.name.eq_ignore_ascii_case(&q.name)
        })
}

// socket timeouts surface as WouldBlock on unix and TimedOut on windows
fn classify_io(err: io::Error) -> ResolveError {
    match err.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => ResolveError::Timeout,
        _ => ResolveError::Io(err),
    }
}
