use std::net::Ipv4Addr;

use crate::error::PacketError;
use crate::packetbuff::{PacketReader, PacketWriter};

use super::{header::DnsHeader, question::DnsQuestion, record::DnsRecord};

/// A message limited to its header, question and answer sections.
///
/// Authority and additional records of a parsed message are not decoded.
#[derive(Debug, Clone, Default)]
pub struct DnsPacket {
    pub header: DnsHeader,
    pub questions: Vec<DnsQuestion>,
    pub answers: Vec<DnsRecord>,
}

impl DnsPacket {
    pub fn new() -> Self {
        DnsPacket {
            header: DnsHeader::new(),
            questions: Vec::new(),
            answers: Vec::new(),
        }
    }

    // every A record in the answer section, in order
    pub fn ipv4_answers(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        self.answers.iter().filter_map(DnsRecord::as_ipv4)
    }

    pub fn read(buf: &mut PacketReader<'_>) -> Result<Self, PacketError> {
        let header = DnsHeader::read(buf)?;

        let mut questions = Vec::with_capacity(header.qdcount as usize);
        for _ in 0..header.qdcount {
            questions.push(DnsQuestion::read(buf)?);
        }

        let mut answers = Vec::with_capacity(header.ancount as usize);
        for _ in 0..header.ancount {
            answers.push(DnsRecord::read(buf)?);
        }

        Ok(DnsPacket {
            header,
            questions,
            answers,
        })
    }

    pub fn write(&self, buf: &mut PacketWriter) -> Result<(), PacketError> {
        // counts are kept in step by add_question / add_answer
        self.header.write(buf)?;

        for q in &self.questions {
            q.write(buf)?;
        }

        for a in &self.answers {
            a.write(buf)?;
        }

        Ok(())
    }

    pub fn add_question(&mut self, question: DnsQuestion) -> Result<(), PacketError> {
        self.header.qdcount = bump(self.header.qdcount)?;
        self.questions.push(question);
        Ok(())
    }

    pub fn add_answer(&mut self, answer: DnsRecord) -> Result<(), PacketError> {
        self.header.ancount = bump(self.header.ancount)?;
        self.answers.push(answer);
        Ok(())
    }
}

#[inline]
fn bump(count: u16) -> Result<u16, PacketError> {
    count.checked_add(1).ok_or(PacketError::TooManyRecords)
}
