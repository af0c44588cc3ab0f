use std::net::Ipv4Addr;

use crate::error::PacketError;
use crate::packetbuff::{PacketReader, PacketWriter};

use super::name::DnsName;
use super::question::{DnsQuestion, QueryType};

/// A resource record with opaque resource data.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct DnsRecord {
    pub name: DnsName,
    pub rtype: QueryType,
    pub class: u16,
    pub ttl: u32,
    pub data: Vec<u8>,
}

impl DnsRecord {
    /// An answer to `question` carrying `addr`, with the question's type
    /// and class copied over.
    pub fn answer(question: &DnsQuestion, ttl: u32, addr: Ipv4Addr) -> Self {
        DnsRecord {
            name: question.name.clone(),
            rtype: question.qtype,
            class: question.qclass,
            ttl,
            data: addr.octets().to_vec(),
        }
    }

    /// The address in an A record. Other records, and A records whose data
    /// is not 4 bytes long, have none.
    pub fn as_ipv4(&self) -> Option<Ipv4Addr> {
        match (self.rtype, <[u8; 4]>::try_from(self.data.as_slice())) {
            (QueryType::A, Ok(octets)) => Some(Ipv4Addr::from(octets)),
            _ => None,
        }
    }

    // only ever used on upstream responses
    pub fn read(buf: &mut PacketReader<'_>) -> Result<Self, PacketError> {
        let name = DnsName::read(buf)?;

        let rtype = QueryType::from_u16(buf.read_u16()?);
        let class = buf.read_u16()?;
        let ttl = buf.read_u32()?;
        let data_len = buf.read_u16()?;
        let data = buf.read_bytes(data_len as usize)?.to_vec();

        Ok(DnsRecord {
            name,
            rtype,
            class,
            ttl,
            data,
        })
    }

    pub fn write(&self, buf: &mut PacketWriter) -> Result<usize, PacketError> {
        let start_pos = buf.pos();

        self.name.write(buf)?;
        buf.write_u16(self.rtype.to_u16());
        buf.write_u16(self.class);
        buf.write_u32(self.ttl);

        let len_pos = buf.pos();
        buf.write_u16(0); // data_len
        buf.write_bytes(&self.data);

        let len = buf.pos() - len_pos - 2;
        let len = u16::try_from(len).map_err(|_| PacketError::DataTooLong(len))?;
        buf.set_u16(len_pos, len)?;

        Ok(buf.pos() - start_pos)
    }
}
