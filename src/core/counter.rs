//! Size-only writer.
//!
//! [`SizeCounter`] accepts every write the codec can produce and only advances
//! a byte counter, so the serialized size of a value can be measured without
//! allocating output. It has no read side.

use crate::core::buffer::SegmentedBuffer;
use crate::core::codec::{
    array_bytes, var_int_bytes, var_long_bytes, Position, Uuid, WireWrite, ANGLE_SIZE,
    BOOLEAN_SIZE, DOUBLE_SIZE, FLOAT_SIZE, INT_SIZE, LONG_SIZE, MEDIUM_SIZE, POSITION_SIZE,
    SHORT_SIZE, UUID_SIZE,
};
use crate::core::scratch::ScratchBuffer;
use crate::error::{ProtocolError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeCounter {
    written: usize,
}

impl SizeCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes counted so far
    #[inline]
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn reset(&mut self) {
        self.written = 0;
    }

    #[inline]
    fn advance(&mut self, count: usize) {
        self.written += count;
    }
}

impl WireWrite for SizeCounter {
    #[inline]
    fn write_byte(&mut self, _value: u8) {
        self.advance(1);
    }

    #[inline]
    fn write_bytes(&mut self, input: &[u8]) {
        self.advance(input.len());
    }

    /// Counts `size` bytes; `input` is left untouched. Fails like a real
    /// copy would when `size` exceeds the scratch limit or what `input` holds.
    fn write_bytes_from(
        &mut self,
        input: &mut SegmentedBuffer,
        size: usize,
        scratch: &mut ScratchBuffer,
    ) -> Result<()> {
        scratch.check_limit(size)?;
        let available = input.readable_bytes();
        if available < size {
            return Err(ProtocolError::BufferUnderflow {
                requested: size,
                available,
            });
        }
        self.advance(size);
        Ok(())
    }

    fn write_boolean(&mut self, _value: bool) {
        self.advance(BOOLEAN_SIZE);
    }

    fn write_short(&mut self, _value: u16) {
        self.advance(SHORT_SIZE);
    }

    fn write_medium(&mut self, _value: u32) {
        self.advance(MEDIUM_SIZE);
    }

    fn write_int(&mut self, _value: u32) {
        self.advance(INT_SIZE);
    }

    fn write_long(&mut self, _value: u64) {
        self.advance(LONG_SIZE);
    }

    fn write_var_int(&mut self, value: u32) {
        self.advance(var_int_bytes(value));
    }

    fn write_var_long(&mut self, value: u64) {
        self.advance(var_long_bytes(value));
    }

    fn write_float(&mut self, _value: f32) {
        self.advance(FLOAT_SIZE);
    }

    fn write_double(&mut self, _value: f64) {
        self.advance(DOUBLE_SIZE);
    }

    fn write_uuid(&mut self, _value: Uuid) {
        self.advance(UUID_SIZE);
    }

    fn write_uuid_int_array(&mut self, _value: Uuid) {
        self.advance(UUID_SIZE);
    }

    fn write_string(&mut self, value: &str) {
        self.advance(array_bytes(value.len()));
    }

    fn write_byte_array(&mut self, value: &[u8]) {
        self.advance(array_bytes(value.len()));
    }

    /// Counts the prefixed length of `input` without draining it.
    fn write_buffer_array(
        &mut self,
        input: &mut SegmentedBuffer,
        scratch: &mut ScratchBuffer,
    ) -> Result<()> {
        let length = input.readable_bytes();
        scratch.check_limit(length)?;
        self.advance(array_bytes(length));
        Ok(())
    }

    fn write_position(&mut self, _value: Position) {
        self.advance(POSITION_SIZE);
    }

    fn write_angle(&mut self, _degrees: f32) {
        self.advance(ANGLE_SIZE);
    }
}
