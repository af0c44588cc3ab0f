use crate::error::PacketError;
use crate::packetbuff::{PacketReader, PacketWriter};

use super::name::DnsName;

/// The Internet class.
pub const CLASS_IN: u16 = 1;

#[derive(PartialEq, Eq, Debug, Clone, Hash, Copy)]
pub enum QueryType {
    UNKNOWN(u16),
    A,     // 1
    NS,    // 2
    CNAME, // 5
    MX,    // 15
    AAAA,  // 28
}

impl QueryType {
    #[inline]
    pub fn from_u16(val: u16) -> QueryType {
        match val {
            1 => QueryType::A,
            2 => QueryType::NS,
            5 => QueryType::CNAME,
            15 => QueryType::MX,
            28 => QueryType::AAAA,
            _ => QueryType::UNKNOWN(val),
        }
    }

    #[inline]
    pub fn to_u16(&self) -> u16 {
        match self {
            QueryType::A => 1,
            QueryType::NS => 2,
            QueryType::CNAME => 5,
            QueryType::MX => 15,
            QueryType::AAAA => 28,
            QueryType::UNKNOWN(val) => *val,
        }
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Hash)]
pub struct DnsQuestion {
    pub name: DnsName,
    pub qtype: QueryType,
    pub qclass: u16,
}

impl DnsQuestion {
    pub fn new(name: DnsName, qtype: QueryType) -> Self {
        DnsQuestion {
            name,
            qtype,
            qclass: CLASS_IN,
        }
    }

    pub fn read(buf: &mut PacketReader<'_>) -> Result<Self, PacketError> {
        let name = DnsName::read(buf)?;
        let qtype = QueryType::from_u16(buf.read_u16()?);
        let qclass = buf.read_u16()?;

        Ok(DnsQuestion {
            name,
            qtype,
            qclass,
        })
    }

    /// Decode the question at `offset` of `message`, returning it with the
    /// number of bytes it occupies there (a compressed name counts only up to
    /// its pointer).
    pub fn decode(message: &[u8], offset: usize) -> Result<(Self, usize), PacketError> {
        let mut buf = PacketReader::new(message);
        buf.seek(offset);
        let question = DnsQuestion::read(&mut buf)?;
        Ok((question, buf.pos() - offset))
    }

    pub fn write(&self, buf: &mut PacketWriter) -> Result<(), PacketError> {
        self.name.write(buf)?;
        buf.write_u16(self.qtype.to_u16());
        buf.write_u16(self.qclass);
        Ok(())
    }
}
