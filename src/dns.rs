pub mod header;
pub mod name;
pub mod packet;
pub mod question;
pub mod record;

pub use header::{DnsHeader, ResultCode, HEADER_LEN, OPCODE_QUERY};
pub use name::DnsName;
pub use packet::DnsPacket;
pub use question::{DnsQuestion, QueryType, CLASS_IN};
pub use record::DnsRecord;
