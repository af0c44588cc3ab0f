use std::io;
use std::net::{Ipv4Addr, UdpSocket};
use std::sync::Once;
use std::thread;
use std::time::{Duration, Instant};

use forwarder::dns::{DnsHeader, DnsName, DnsPacket, DnsQuestion, DnsRecord, QueryType, ResultCode};
use forwarder::packetbuff::{PacketReader, PacketWriter, MAX_DATAGRAM};
use forwarder::responder::PLACEHOLDER_ADDR;
use forwarder::{handle_query, ResolveError, Resolver, Responder, ServerError, UpstreamResolver};

static INIT: Once = Once::new();

fn setup() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

fn local_socket() -> UdpSocket {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    socket
}

/// Answer a single query on `socket` with whatever `reply` builds from it.
fn answer_once<F>(socket: UdpSocket, reply: F) -> thread::JoinHandle<()>
where
    F: FnOnce(&DnsPacket, &[u8]) -> Vec<u8> + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = [0; MAX_DATAGRAM];
        let (size, src) = socket.recv_from(&mut buf).unwrap();
        let query = DnsPacket::read(&mut PacketReader::new(&buf[..size])).unwrap();
        let bytes = reply(&query, &buf[..size]);
        socket.send_to(&bytes, src).unwrap();
    })
}

fn reply_with(query: &DnsPacket, rcode: ResultCode, addrs: &[Ipv4Addr]) -> Vec<u8> {
    let mut response = DnsPacket::new();
    response.header = DnsHeader::response_to(&query.header);
    response.header.ra = true;
    response.header.set_result_code(rcode);

    let question = query.questions[0].clone();
    response.add_question(question.clone()).unwrap();
    for addr in addrs {
        response
            .add_answer(DnsRecord::answer(&question, 300, *addr))
            .unwrap();
    }

    let mut out = PacketWriter::new();
    response.write(&mut out).unwrap();
    out.into_vec()
}

fn request(id: u16, host: &str) -> Vec<u8> {
    let mut packet = DnsPacket::new();
    packet.header.id = id;
    packet.header.rd = true;
    let name = DnsName::from_hostname(host).unwrap();
    packet
        .add_question(DnsQuestion::new(name, QueryType::A))
        .unwrap();

    let mut out = PacketWriter::new();
    packet.write(&mut out).unwrap();
    out.into_vec()
}

fn upstream(socket: &UdpSocket, timeout: Duration) -> UpstreamResolver {
    UpstreamResolver::new(socket.local_addr().unwrap(), timeout)
}

#[test]
fn upstream_resolver_returns_every_a_record() {
    setup();
    let server = local_socket();
    let resolver = upstream(&server, Duration::from_secs(5));

    let addrs = [Ipv4Addr::new(93, 184, 216, 34), Ipv4Addr::new(93, 184, 216, 35)];
    let handle = answer_once(server, move |query, _| {
        assert!(query.header.rd);
        assert_eq!(query.questions[0].name.to_string(), "example.com");
        assert_eq!(query.questions[0].qtype, QueryType::A);
        reply_with(query, ResultCode::NOERROR, &addrs)
    });

    assert_eq!(resolver.resolve("example.com").unwrap(), addrs);
    handle.join().unwrap();
}

#[test]
fn upstream_resolver_reads_compressed_answers() {
    setup();
    let server = local_socket();
    let resolver = upstream(&server, Duration::from_secs(5));

    let handle = answer_once(server, |_, raw| {
        // echo the query, flip QR and append one answer pointing at the question name
        let mut bytes = raw.to_vec();
        bytes[2] |= 0x80;
        bytes[7] = 1;
        bytes.extend_from_slice(&[0xC0, 0x0C, 0x00, 0x01, 0x00, 0x01]);
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x3c, 0x00, 0x04, 1, 2, 3, 4]);
        bytes
    });

    assert_eq!(
        resolver.resolve("compressed.test").unwrap(),
        [Ipv4Addr::new(1, 2, 3, 4)]
    );
    handle.join().unwrap();
}

#[test]
fn upstream_error_codes_and_empty_answers_are_failures() {
    setup();
    let server = local_socket();
    let resolver = upstream(&server, Duration::from_secs(5));
    let handle = answer_once(server, |query, _| reply_with(query, ResultCode::NXDOMAIN, &[]));
    assert!(matches!(
        resolver.resolve("nowhere.test"),
        Err(ResolveError::ResponseCode(3))
    ));
    handle.join().unwrap();

    let server = local_socket();
    let resolver = upstream(&server, Duration::from_secs(5));
    let handle = answer_once(server, |query, _| reply_with(query, ResultCode::NOERROR, &[]));
    assert!(matches!(
        resolver.resolve("empty.test"),
        Err(ResolveError::NoAddresses(host)) if host == "empty.test"
    ));
    handle.join().unwrap();
}

#[test]
fn upstream_resolver_ignores_mismatched_ids() {
    setup();
    let server = local_socket();
    let resolver = upstream(&server, Duration::from_millis(300));
    let handle = answer_once(server, |query, _| {
        let mut bytes = reply_with(query, ResultCode::NOERROR, &[Ipv4Addr::LOCALHOST]);
        bytes[0] ^= 0xff;
        bytes
    });

    assert!(matches!(
        resolver.resolve("spoofed.test"),
        Err(ResolveError::Timeout)
    ));
    handle.join().unwrap();
}

#[test]
fn upstream_resolver_skips_stray_replies() {
    setup();
    let server = local_socket();
    let resolver = upstream(&server, Duration::from_secs(5));

    let handle = thread::spawn(move || {
        let mut buf = [0; MAX_DATAGRAM];
        let (size, src) = server.recv_from(&mut buf).unwrap();
        let query = DnsPacket::read(&mut PacketReader::new(&buf[..size])).unwrap();
        let stray_addr = [Ipv4Addr::new(10, 6, 6, 6)];

        // a well-formed answer from a socket the query never went to
        let stranger = local_socket();
        let spoofed = reply_with(&query, ResultCode::NOERROR, &stray_addr);
        stranger.send_to(&spoofed, src).unwrap();

        // right source, wrong id
        let mut wrong_id = spoofed.clone();
        wrong_id[0] ^= 0xff;
        server.send_to(&wrong_id, src).unwrap();

        // right source and id, but another question
        let mut other = query.clone();
        other.questions[0].name = DnsName::from_hostname("other.test").unwrap();
        server
            .send_to(&reply_with(&other, ResultCode::NOERROR, &stray_addr), src)
            .unwrap();

        // garbage
        server.send_to(&[0xde, 0xad], src).unwrap();

        thread::sleep(Duration::from_millis(50));
        let real = [Ipv4Addr::new(10, 9, 9, 9)];
        server
            .send_to(&reply_with(&query, ResultCode::NOERROR, &real), src)
            .unwrap();
    });

    assert_eq!(
        resolver.resolve("stray.test").unwrap(),
        [Ipv4Addr::new(10, 9, 9, 9)]
    );
    handle.join().unwrap();
}

#[test]
fn flood_of_wrong_replies_still_times_out() {
    setup();
    let server = local_socket();
    let timeout = Duration::from_millis(300);
    let resolver = upstream(&server, timeout);

    let handle = thread::spawn(move || {
        let mut buf = [0; MAX_DATAGRAM];
        let (size, src) = server.recv_from(&mut buf).unwrap();
        let query = DnsPacket::read(&mut PacketReader::new(&buf[..size])).unwrap();
        let mut wrong_id = reply_with(&query, ResultCode::NOERROR, &[Ipv4Addr::LOCALHOST]);
        wrong_id[0] ^= 0xff;

        // keep the resolver's socket busy for longer than its timeout
        let until = Instant::now() + Duration::from_millis(800);
        while Instant::now() < until {
            let _ = server.send_to(&wrong_id, src);
            thread::sleep(Duration::from_millis(10));
        }
    });

    let started = Instant::now();
    assert!(matches!(
        resolver.resolve("flood.test"),
        Err(ResolveError::Timeout)
    ));
    let elapsed = started.elapsed();
    assert!(elapsed >= timeout);
    assert!(elapsed < Duration::from_millis(1000), "took {elapsed:?}");
    handle.join().unwrap();
}

#[test]
fn silent_upstream_times_out() {
    setup();
    let server = local_socket();
    let resolver = upstream(&server, Duration::from_millis(200));

    assert!(matches!(
        resolver.resolve("slow.test"),
        Err(ResolveError::Timeout)
    ));
    drop(server);
}

#[test]
fn handle_query_forwards_over_udp() {
    setup();
    let upstream_socket = local_socket();
    let resolver = upstream(&upstream_socket, Duration::from_secs(5));
    let upstream_handle = answer_once(upstream_socket, |query, _| {
        reply_with(query, ResultCode::NOERROR, &[Ipv4Addr::new(10, 1, 2, 3)])
    });

    let listen = local_socket();
    let listen_addr = listen.local_addr().unwrap();
    let responder = Responder::new(Some(resolver));

    let client = local_socket();
    client.send_to(&request(0x1234, "forwarded.test"), listen_addr).unwrap();

    handle_query(&listen, &responder).unwrap();
    upstream_handle.join().unwrap();

    let mut buf = [0; MAX_DATAGRAM];
    let (size, from) = client.recv_from(&mut buf).unwrap();
    assert_eq!(from, listen_addr);

    let reply = DnsPacket::read(&mut PacketReader::new(&buf[..size])).unwrap();
    assert_eq!(reply.header.id, 0x1234);
    assert!(reply.header.qr);
    assert_eq!(reply.header.ancount, 1);
    assert_eq!(reply.answers[0].ttl, 60);
    assert_eq!(reply.answers[0].as_ipv4(), Some(Ipv4Addr::new(10, 1, 2, 3)));
}

#[test]
fn unreachable_upstream_gets_placeholder_answer() {
    setup();
    // a bound socket that never replies
    let silent = local_socket();
    let resolver = upstream(&silent, Duration::from_millis(200));

    let listen = local_socket();
    let listen_addr = listen.local_addr().unwrap();
    let responder = Responder::new(Some(resolver));

    let client = local_socket();
    client.send_to(&request(77, "down.test"), listen_addr).unwrap();
    handle_query(&listen, &responder).unwrap();

    let mut buf = [0; MAX_DATAGRAM];
    let (size, _) = client.recv_from(&mut buf).unwrap();
    let reply = DnsPacket::read(&mut PacketReader::new(&buf[..size])).unwrap();
    assert_eq!(reply.header.ancount, 1);
    assert_eq!(reply.answers[0].as_ipv4(), Some(PLACEHOLDER_ADDR));
    drop(silent);
}

#[test]
fn short_datagram_gets_no_reply() {
    setup();
    let listen = local_socket();
    let listen_addr = listen.local_addr().unwrap();
    let responder = Responder::<UpstreamResolver>::new(None);

    let client = local_socket();
    client
        .set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();
    client.send_to(&[0x86, 0x2a, 0x01, 0x00], listen_addr).unwrap();

    let err = handle_query(&listen, &responder).unwrap_err();
    assert!(matches!(err, ServerError::TooShort(4)));
    assert!(!err.is_fatal());

    let mut buf = [0; MAX_DATAGRAM];
    let err = client.recv_from(&mut buf).unwrap_err();
    assert!(matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    ));

    // the next datagram is served normally
    client.send_to(&request(1, "after.test"), listen_addr).unwrap();
    handle_query(&listen, &responder).unwrap();
    client
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let (size, _) = client.recv_from(&mut buf).unwrap();
    assert!(size > 12);
}

#[test]
fn responder_accepts_any_resolver_behind_a_box() {
    setup();
    struct Fixed;
    impl Resolver for Fixed {
        fn resolve(&self, _host: &str) -> Result<Vec<Ipv4Addr>, ResolveError> {
            Ok(vec![Ipv4Addr::new(192, 0, 2, 1)])
        }
    }

    let boxed: Box<dyn Resolver> = Box::new(Fixed);
    let responder = Responder::new(Some(boxed));
    let bytes = responder.respond(&request(2, "boxed.test")).unwrap();
    let reply = DnsPacket::read(&mut PacketReader::new(&bytes)).unwrap();
    assert_eq!(
        reply.ipv4_answers().collect::<Vec<_>>(),
        [Ipv4Addr::new(192, 0, 2, 1)]
    );
}
