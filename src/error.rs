use std::io;

use thiserror::Error;

/// Malformed wire data, or data that cannot be put on the wire.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("end of buffer: needed byte {pos} but only {len} available")]
    EndOfBuffer { pos: usize, len: usize },

    #[error("invalid compression pointer at {at} to {target}")]
    InvalidPointer { at: usize, target: usize },

    #[error("label too long ({0} bytes, max 63)")]
    LabelTooLong(usize),

    #[error("resource data too long ({0} bytes)")]
    DataTooLong(usize),

    #[error("too many records for a 16-bit section count")]
    TooManyRecords,

    #[error("reserved label type in length byte {0:#04x}")]
    ReservedLabelType(u8),

    #[error("failed to pack header: {0}")]
    Header(String),
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("upstream i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("upstream lookup timed out")]
    Timeout,

    #[error("malformed upstream response: {0}")]
    Packet(#[from] PacketError),

    #[error("upstream answered with response code {0}")]
    ResponseCode(u8),

    #[error("no such host: {0}")]
    NoAddresses(String),
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to receive datagram: {0}")]
    Recv(#[source] io::Error),

    #[error("failed to send response: {0}")]
    Send(#[source] io::Error),

    #[error("datagram too short ({0} bytes, header needs 12)")]
    TooShort(usize),

    #[error("malformed datagram: {0}")]
    Malformed(#[from] PacketError),

    #[error("failed to encode response: {0}")]
    Encode(#[source] PacketError),
}

impl ServerError {
    /// Whether the serving loop has to stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ServerError::Recv(_))
    }
}
