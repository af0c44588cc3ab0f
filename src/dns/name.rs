use std::fmt;

use crate::error::PacketError;
use crate::packetbuff::{PacketReader, PacketWriter};

/// Longest label a length byte can describe.
pub const MAX_LABEL_LEN: usize = 63;

const POINTER_MASK: u8 = 0xC0;

/// A domain name as its sequence of labels.
///
/// Labels are kept as raw bytes so a decoded name re-encodes to exactly the
/// bytes the client sent.
#[derive(PartialEq, Eq, Debug, Clone, Hash, Default)]
pub struct DnsName {
    labels: Vec<Vec<u8>>,
}

impl DnsName {
    pub fn new(labels: Vec<Vec<u8>>) -> Result<Self, PacketError> {
        if let Some(label) = labels.iter().find(|l| l.len() > MAX_LABEL_LEN) {
            return Err(PacketError::LabelTooLong(label.len()));
        }
        Ok(DnsName { labels })
    }

    /// Split a dotted hostname into labels. A trailing dot is accepted.
    pub fn from_hostname(host: &str) -> Result<Self, PacketError> {
        let labels = host
            .split('.')
            .filter(|label| !label.is_empty())
            .map(|label| label.as_bytes().to_vec())
            .collect();
        DnsName::new(labels)
    }

    pub fn labels(&self) -> &[Vec<u8>] {
        &self.labels
    }

    /// Labels joined with `.`, the form handed to a resolver.
    ///
    /// `None` when a label is not UTF-8 or contains a `.` itself, since the
    /// dotted form would then name something else.
    pub fn hostname(&self) -> Option<String> {
        let mut labels = Vec::with_capacity(self.labels.len());
        for label in &self.labels {
            match std::str::from_utf8(label) {
                Ok(label) if !label.contains('.') => labels.push(label),
                _ => return None,
            }
        }
        Some(labels.join("."))
    }

    /// Label-wise comparison ignoring ASCII case.
    pub fn eq_ignore_ascii_case(&self, other: &DnsName) -> bool {
        self.labels.len() == other.labels.len()
            && self
                .labels
                .iter()
                .zip(&other.labels)
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }

    /// Decode the name starting at the reader's position.
    ///
    /// Compression pointers are followed against the whole message. On
    /// return the reader sits just past the name as it appears at the
    /// starting position: after the zero terminator, or after the first
    /// two-byte pointer if the name was compressed.
    ///
    /// A pointer must target bytes before the start of the label run that
    /// contains it. Forward, self-referencing and out-of-range targets are
    /// rejected, which also rules out pointer loops.
    pub fn read(buf: &mut PacketReader<'_>) -> Result<Self, PacketError> {
        let mut labels = Vec::new();

        let mut pos = buf.pos();
        let mut run_start = pos;
        let mut resume = None;

        loop {
            let len = buf.get(pos)?;

            match len & POINTER_MASK {
                POINTER_MASK => {
                    let low = buf.get(pos + 1)? as usize;
                    let target = (((len & !POINTER_MASK) as usize) << 8) | low;
                    if target >= run_start {
                        return Err(PacketError::InvalidPointer { at: pos, target });
                    }

                    if resume.is_none() {
                        resume = Some(pos + 2);
                    }
                    pos = target;
                    run_start = target;
                }
                0 => {
                    pos += 1;
                    if len == 0 {
                        break;
                    }

                    let label = buf.get_range(pos, len as usize)?;
                    labels.push(label.to_vec());
                    pos += len as usize;
                }
                _ => return Err(PacketError::ReservedLabelType(len)),
            }
        }

        buf.seek(resume.unwrap_or(pos));

        Ok(DnsName { labels })
    }

    /// Decode a name at `offset` of `message`, returning it together with the
    /// number of bytes it occupies at that offset.
    pub fn decode(message: &[u8], offset: usize) -> Result<(Self, usize), PacketError> {
        let mut buf = PacketReader::new(message);
        buf.seek(offset);
        let name = DnsName::read(&mut buf)?;
        Ok((name, buf.pos() - offset))
    }

    /// Write every label verbatim followed by the zero terminator.
    /// Compression is never emitted.
    pub fn write(&self, buf: &mut PacketWriter) -> Result<(), PacketError> {
        for label in &self.labels {
            if label.len() > MAX_LABEL_LEN {
                return Err(PacketError::LabelTooLong(label.len()));
            }
            buf.write_u8(label.len() as u8);
            buf.write_bytes(label);
        }
        buf.write_u8(0);
        Ok(())
    }
}

impl fmt::Display for DnsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut delimiter = "";
        for label in &self.labels {
            write!(f, "{delimiter}{}", String::from_utf8_lossy(label))?;
            delimiter = ".";
        }
        Ok(())
    }
}
