use packed_struct::prelude::*;

use crate::error::PacketError;
use crate::packetbuff::{PacketReader, PacketWriter};

/// Size of the fixed header on the wire.
pub const HEADER_LEN: usize = 12;

/// Opcode of a standard query.
pub const OPCODE_QUERY: u8 = 0;

#[derive(PrimitiveEnum_u8, Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResultCode {
    NOERROR = 0,  // no error condition
    FORMERR = 1,  // format error
    SERVFAIL = 2, // server failure
    NXDOMAIN = 3, // name error
    NOTIMP = 4,   // not implemented - the name server does not support the requested kind of query
    REFUSED = 5,  // refused
}

/// The fixed 12-byte message header.
///
/// Flag layout of the second 16-bit word, most significant bit first:
/// `QR | OPCODE(4) | AA | TC | RD | RA | Z | AD | CD | RCODE(4)`.
///
/// `opcode` and `rcode` are 4-bit fields. Values are masked by the setters;
/// building an `Integer` wider than 4 bits by hand is not validated here.
#[derive(PackedStruct, Clone, Copy, Debug, PartialEq, Eq)]
#[packed_struct(bit_numbering = "msb0")]
pub struct DnsHeader {
    #[packed_field(bits = "0..=15", endian = "msb")]
    pub id: u16, // identification number; 16 bits

    #[packed_field(bits = "16")]
    pub qr: bool, // query (0) or response (1); 1 bit

    #[packed_field(bits = "17..=20")]
    pub opcode: Integer<u8, packed_bits::Bits<4>>, // operation code; 4 bits

    #[packed_field(bits = "21")]
    pub aa: bool, // authoritative answer; 1 bit
    #[packed_field(bits = "22")]
    pub tc: bool, // truncated; 1 bit
    #[packed_field(bits = "23")]
    pub rd: bool, // recursion desired; 1 bit
    #[packed_field(bits = "24")]
    pub ra: bool, // recursion available; 1 bit

    #[packed_field(bits = "25")]
    pub z: bool, // reserved; 1 bit
    #[packed_field(bits = "26")]
    pub ad: bool, // authenticated data; 1 bit
    #[packed_field(bits = "27")]
    pub cd: bool, // checking disabled; 1 bit

    #[packed_field(bits = "28..=31")]
    pub rcode: Integer<u8, packed_bits::Bits<4>>, // response code; 4 bits

    #[packed_field(bits = "32..=47", endian = "msb")]
    pub qdcount: u16, // number of entries in the question section
    #[packed_field(bits = "48..=63", endian = "msb")]
    pub ancount: u16, // number of resource records in the answer section
    #[packed_field(bits = "64..=79", endian = "msb")]
    pub nscount: u16, // number of name server records in the authority section
    #[packed_field(bits = "80..=95", endian = "msb")]
    pub arcount: u16, // number of resource records in the additional section
}

impl Default for DnsHeader {
    fn default() -> Self {
        DnsHeader::new()
    }
}

impl DnsHeader {
    pub fn new() -> Self {
        DnsHeader {
            id: 0,
            qr: false,
            opcode: 0.into(),
            aa: false,
            tc: false,
            rd: false,
            ra: false,

            z: false,
            ad: false,
            cd: false,

            rcode: 0.into(),
            qdcount: 0,
            ancount: 0,
            nscount: 0,
            arcount: 0,
        }
    }

    #[inline]
    pub fn opcode(&self) -> u8 {
        *self.opcode
    }

    #[inline]
    pub fn set_opcode(&mut self, opcode: u8) {
        self.opcode = (opcode & 0x0F).into();
    }

    #[inline]
    pub fn rcode(&self) -> u8 {
        *self.rcode
    }

    #[inline]
    pub fn set_rcode(&mut self, rcode: u8) {
        self.rcode = (rcode & 0x0F).into();
    }

    /// The response code, if it is one this crate knows by name.
    pub fn result_code(&self) -> Option<ResultCode> {
        ResultCode::from_primitive(self.rcode())
    }

    #[inline]
    pub fn set_result_code(&mut self, code: ResultCode) {
        self.set_rcode(code.to_primitive());
    }

    /// Derive the header of a reply from the header of a request.
    ///
    /// The request header is copied, the response flag set and the response
    /// code chosen from the opcode. Section counts start at zero and are
    /// bumped as records are added.
    pub fn response_to(request: &DnsHeader) -> DnsHeader {
        let mut header = *request;
        header.qr = true;
        header.set_result_code(if request.opcode() == OPCODE_QUERY {
            ResultCode::NOERROR
        } else {
            ResultCode::NOTIMP
        });
        header.qdcount = 0;
        header.ancount = 0;
        header.nscount = 0;
        header.arcount = 0;
        header
    }

    pub fn decode(bytes: &[u8; HEADER_LEN]) -> Result<Self, PacketError> {
        DnsHeader::unpack(bytes).map_err(|e| PacketError::Header(format!("{e:?}")))
    }

    pub fn encode(&self) -> Result<[u8; HEADER_LEN], PacketError> {
        self.pack().map_err(|e| PacketError::Header(format!("{e:?}")))
    }

    pub fn read(buf: &mut PacketReader<'_>) -> Result<Self, PacketError> {
        let bytes = buf.read_array::<HEADER_LEN>()?;
        DnsHeader::decode(&bytes)
    }

    pub fn write(&self, buf: &mut PacketWriter) -> Result<(), PacketError> {
        buf.write_bytes(&self.encode()?);
        Ok(())
    }
}
