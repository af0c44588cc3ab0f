use crate::error::PacketError;

/// Largest datagram honored on receive.
pub const MAX_DATAGRAM: usize = 512;

/// Read cursor over a received message.
///
/// The underlying bytes are borrowed and never mutated, so compression
/// pointers can be followed against the same message the cursor is walking.
pub struct PacketReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> PacketReader<'a> {
    pub fn new(buf: &'a [u8]) -> PacketReader<'a> {
        PacketReader { buf, pos: 0 }
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    // step forward in the buffer by n steps
    // bounds checking is done during read
    #[inline]
    pub fn step(&mut self, n: usize) {
        self.pos += n;
    }

    #[inline]
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    #[inline]
    fn check(&self, end: usize) -> Result<(), PacketError> {
        if end > self.buf.len() {
            return Err(PacketError::EndOfBuffer {
                pos: end - 1,
                len: self.buf.len(),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn get(&self, pos: usize) -> Result<u8, PacketError> {
        self.check(pos + 1)?;
        Ok(self.buf[pos])
    }

    #[inline]
    pub fn get_range(&self, start: usize, len: usize) -> Result<&'a [u8], PacketError> {
        self.check(start + len)?;
        Ok(&self.buf[start..start + len])
    }

    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], PacketError> {
        self.check(self.pos + N)?;

        let mut arr = [0; N];
        arr.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.step(N);

        Ok(arr)
    }

    #[inline]
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], PacketError> {
        let bytes = self.get_range(self.pos, len)?;
        self.step(len);
        Ok(bytes)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, PacketError> {
        let byte = self.get(self.pos)?;
        self.step(1);
        Ok(byte)
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16, PacketError> {
        Ok(u16::from_be_bytes(self.read_array::<2>()?))
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32, PacketError> {
        Ok(u32::from_be_bytes(self.read_array::<4>()?))
    }
}

/// Growable output buffer for an outgoing message.
///
/// Responses are not truncated to 512 bytes.
#[derive(Debug, Default, Clone)]
pub struct PacketWriter {
    buf: Vec<u8>,
}

impl PacketWriter {
    pub fn new() -> PacketWriter {
        PacketWriter {
            buf: Vec::with_capacity(MAX_DATAGRAM),
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn write_u8(&mut self, val: u8) {
        self.buf.push(val);
    }

    #[inline]
    pub fn write_u16(&mut self, val: u16) {
        self.buf.extend_from_slice(&val.to_be_bytes());
    }

    #[inline]
    pub fn write_u32(&mut self, val: u32) {
        self.buf.extend_from_slice(&val.to_be_bytes());
    }

    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    // overwrite a previously written u16, used to backfill lengths
    #[inline]
    pub fn set_u16(&mut self, pos: usize, val: u16) -> Result<(), PacketError> {
        if pos + 2 > self.buf.len() {
            return Err(PacketError::EndOfBuffer {
                pos: pos + 1,
                len: self.buf.len(),
            });
        }

        self.buf[pos..pos + 2].copy_from_slice(&val.to_be_bytes());
        Ok(())
    }
}
