use std::net::Ipv4Addr;

use tracing::{debug, info, warn};

use crate::dns::{DnsHeader, DnsPacket, DnsQuestion, DnsRecord, HEADER_LEN};
use crate::error::ServerError;
use crate::packetbuff::{PacketReader, PacketWriter};
use crate::resolver::Resolver;

pub const ANSWER_TTL: u32 = 60;

/// Address answered when not forwarding, or when forwarding fails.
pub const PLACEHOLDER_ADDR: Ipv4Addr = Ipv4Addr::new(8, 8, 8, 8);

/// Builds the reply to one request datagram.
pub struct Responder<R> {
    resolver: Option<R>,
}

impl<R: Resolver> Responder<R> {
    pub fn new(resolver: Option<R>) -> Self {
        Responder { resolver }
    }

    /// Decode `datagram`, answer each of its questions and encode the reply.
    ///
    /// Every question is echoed back followed by its answers. Any decode
    /// failure abandons the whole datagram.
    pub fn respond(&self, datagram: &[u8]) -> Result<Vec<u8>, ServerError> {
        if datagram.len() < HEADER_LEN {
            return Err(ServerError::TooShort(datagram.len()));
        }

        let mut buf = PacketReader::new(datagram);
        let request = DnsHeader::read(&mut buf)?;
        debug!(
            id = request.id,
            opcode = request.opcode(),
            questions = request.qdcount,
            "decoded request header"
        );

        let mut response = DnsPacket::new();
        response.header = DnsHeader::response_to(&request);

        for _ in 0..request.qdcount {
            let question = DnsQuestion::read(&mut buf)?;
            let answers = self.answers_for(&question);

            response
                .add_question(question)
                .map_err(ServerError::Encode)?;
            for answer in answers {
                response.add_answer(answer).map_err(ServerError::Encode)?;
            }
        }

        let mut out = PacketWriter::new();
        response.write(&mut out).map_err(ServerError::Encode)?;
        Ok(out.into_vec())
    }

    fn answers_for(&self, question: &DnsQuestion) -> Vec<DnsRecord> {
        let placeholder = || vec![DnsRecord::answer(question, ANSWER_TTL, PLACEHOLDER_ADDR)];

        let Some(resolver) = &self.resolver else {
            return placeholder();
        };

        let Some(host) = question.name.hostname() else {
            warn!(name = %question.name, "name has no dotted form, answering with placeholder");
            return placeholder();
        };
        info!(%host, "forwarding lookup");

        match resolver.resolve(&host) {
            Ok(addrs) => addrs
                .into_iter()
                .map(|addr| DnsRecord::answer(question, ANSWER_TTL, addr))
                .collect(),
            Err(e) => {
                warn!(%host, error = %e, "lookup failed, answering with placeholder");
                placeholder()
            }
        }
    }
}
