//! # Binary Codec
//!
//! Encoding and decoding of wire primitives on top of a buffer's byte-level
//! operations.
//!
//! ## Wire Format
//! | Type                  | Encoding                                          |
//! |-----------------------|---------------------------------------------------|
//! | boolean               | 1 byte, 0 or nonzero                              |
//! | short / medium / int  | 2 / 3 / 4 bytes big-endian                        |
//! | long                  | 8 bytes big-endian                                |
//! | float / double        | bit pattern as int / long                         |
//! | VarInt / VarLong      | 7 bits per byte, low group first, <= 5 / 10 bytes |
//! | string / byte array   | VarInt byte length + raw bytes                    |
//! | UUID                  | 2 longs, or 4 ints (MSB-high, MSB-low, ...)       |
//! | position              | 1 long: X[63:38] Z[37:12] Y[11:0]                 |
//! | angle                 | 1 byte, degrees * 256/360                         |
//!
//! Writers implement [`WireWrite`], readers implement [`WireRead`]. Both traits
//! provide every composite encoding as a default method so an implementor only
//! supplies the primitive byte operations. The write side has two
//! implementations: [`SegmentedBuffer`] and the size-only
//! [`SizeCounter`](crate::core::counter::SizeCounter).

use crate::config::BufferConfig;
use crate::core::buffer::SegmentedBuffer;
use crate::core::counter::SizeCounter;
use crate::core::scratch::ScratchBuffer;
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::version::ProtocolVersion;

pub const BYTE_SIZE: usize = 1;
pub const SHORT_SIZE: usize = 2;
pub const MEDIUM_SIZE: usize = 3;
pub const INT_SIZE: usize = 4;
pub const LONG_SIZE: usize = 8;
pub const FLOAT_SIZE: usize = INT_SIZE;
pub const DOUBLE_SIZE: usize = LONG_SIZE;
pub const BOOLEAN_SIZE: usize = BYTE_SIZE;
pub const POSITION_SIZE: usize = LONG_SIZE;
pub const ANGLE_SIZE: usize = BYTE_SIZE;
pub const UUID_SIZE: usize = LONG_SIZE * 2;

/// Longest VarInt encoding in bytes
pub const MAX_VAR_INT_BYTES: usize = 5;

/// Longest VarLong encoding in bytes
pub const MAX_VAR_LONG_BYTES: usize = 10;

/// Default bound on decoded string length, in bytes
pub const DEFAULT_MAX_STRING_LENGTH: u32 = 65536;

/// Quantization factor between degrees and the one-byte angle encoding
pub const ANGLE_FACTOR: f32 = 256.0 / 360.0;

/// Encoded length of `value` as a VarInt.
#[inline]
pub fn var_int_bytes(value: u32) -> usize {
    if value & (u32::MAX << 7) == 0 {
        1
    } else if value & (u32::MAX << 14) == 0 {
        2
    } else if value & (u32::MAX << 21) == 0 {
        3
    } else if value & (u32::MAX << 28) == 0 {
        4
    } else {
        5
    }
}

/// Encoded length of `value` as a VarLong.
#[inline]
pub fn var_long_bytes(value: u64) -> usize {
    for groups in 1..MAX_VAR_LONG_BYTES {
        if value & (u64::MAX << (7 * groups)) == 0 {
            return groups;
        }
    }
    MAX_VAR_LONG_BYTES
}

/// Encoded length of a length-prefixed string.
#[inline]
pub fn string_bytes(value: &str) -> usize {
    array_bytes(value.len())
}

/// Encoded length of a length-prefixed byte array of `length` bytes.
#[inline]
pub fn array_bytes(length: usize) -> usize {
    var_int_bytes(length as u32) + length
}

/// 128-bit identifier as two 64-bit halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Uuid {
    pub most_significant: u64,
    pub least_significant: u64,
}

impl Uuid {
    pub const fn new(most_significant: u64, least_significant: u64) -> Self {
        Self {
            most_significant,
            least_significant,
        }
    }

    pub const fn from_u128(value: u128) -> Self {
        Self::new((value >> 64) as u64, value as u64)
    }

    pub const fn as_u128(&self) -> u128 {
        (self.most_significant as u128) << 64 | self.least_significant as u128
    }

    /// The four 32-bit quarters in wire order
    pub const fn quarters(&self) -> [u32; 4] {
        [
            (self.most_significant >> 32) as u32,
            self.most_significant as u32,
            (self.least_significant >> 32) as u32,
            self.least_significant as u32,
        ]
    }

    pub const fn from_quarters(quarters: [u32; 4]) -> Self {
        Self::new(
            (quarters[0] as u64) << 32 | quarters[1] as u64,
            (quarters[2] as u64) << 32 | quarters[3] as u64,
        )
    }
}

/// Block position packed into a single long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// 26-bit signed
    pub x: i32,
    /// 12-bit signed
    pub y: i32,
    /// 26-bit signed
    pub z: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Pack as X[63:38] Z[37:12] Y[11:0]; out-of-range bits are truncated.
    pub const fn pack(&self) -> u64 {
        ((self.x as u64) & 0x3FF_FFFF) << 38
            | ((self.z as u64) & 0x3FF_FFFF) << 12
            | (self.y as u64) & 0xFFF
    }

    /// Unpack and sign-extend each field from two's complement.
    pub const fn unpack(value: u64) -> Self {
        let mut x = (value >> 38) as i32;
        let mut y = (value & 0xFFF) as i32;
        let mut z = ((value >> 12) & 0x3FF_FFFF) as i32;

        if x >= 1 << 25 {
            x -= 1 << 26;
        }
        if y >= 1 << 11 {
            y -= 1 << 12;
        }
        if z >= 1 << 25 {
            z -= 1 << 26;
        }

        Self { x, y, z }
    }
}

/// Write side of the codec.
pub trait WireWrite {
    fn write_byte(&mut self, value: u8);

    fn write_bytes(&mut self, input: &[u8]);

    /// Move `size` bytes out of `input` into this writer through `scratch`.
    fn write_bytes_from(
        &mut self,
        input: &mut SegmentedBuffer,
        size: usize,
        scratch: &mut ScratchBuffer,
    ) -> Result<()> {
        let region = scratch.region(size)?;
        input.read_bytes(region)?;
        self.write_bytes(region);
        Ok(())
    }

    fn write_boolean(&mut self, value: bool) {
        self.write_byte(u8::from(value));
    }

    fn write_short(&mut self, value: u16) {
        self.write_bytes(&value.to_be_bytes());
    }

    /// Low 24 bits of `value`, big-endian
    fn write_medium(&mut self, value: u32) {
        self.write_bytes(&value.to_be_bytes()[1..]);
    }

    fn write_int(&mut self, value: u32) {
        self.write_bytes(&value.to_be_bytes());
    }

    fn write_long(&mut self, value: u64) {
        self.write_bytes(&value.to_be_bytes());
    }

    fn write_var_int(&mut self, mut value: u32) {
        loop {
            if value & !0x7F == 0 {
                self.write_byte(value as u8);
                return;
            }
            self.write_byte((value & 0x7F) as u8 | 0x80);
            value >>= 7;
        }
    }

    fn write_var_long(&mut self, mut value: u64) {
        loop {
            if value & !0x7F == 0 {
                self.write_byte(value as u8);
                return;
            }
            self.write_byte((value & 0x7F) as u8 | 0x80);
            value >>= 7;
        }
    }

    /// Signed VarInt as its two's-complement bit pattern (negatives take 5 bytes).
    fn write_var_int_signed(&mut self, value: i32) {
        self.write_var_int(value as u32);
    }

    fn write_var_long_signed(&mut self, value: i64) {
        self.write_var_long(value as u64);
    }

    fn write_float(&mut self, value: f32) {
        self.write_int(value.to_bits());
    }

    fn write_double(&mut self, value: f64) {
        self.write_long(value.to_bits());
    }

    fn write_uuid(&mut self, value: Uuid) {
        self.write_long(value.most_significant);
        self.write_long(value.least_significant);
    }

    fn write_uuid_int_array(&mut self, value: Uuid) {
        for quarter in value.quarters() {
            self.write_int(quarter);
        }
    }

    /// VarInt byte length, then the UTF-8 bytes
    fn write_string(&mut self, value: &str) {
        self.write_byte_array(value.as_bytes());
    }

    fn write_byte_array(&mut self, value: &[u8]) {
        self.write_var_int(value.len() as u32);
        self.write_bytes(value);
    }

    /// Length-prefix and move every readable byte of `input`.
    fn write_buffer_array(
        &mut self,
        input: &mut SegmentedBuffer,
        scratch: &mut ScratchBuffer,
    ) -> Result<()> {
        let length = input.readable_bytes();
        let region = scratch.region(length)?;
        input.read_bytes(region)?;
        self.write_var_int(length as u32);
        self.write_bytes(region);
        Ok(())
    }

    fn write_position(&mut self, value: Position) {
        self.write_long(value.pack());
    }

    /// Quantize `degrees` to 1/256 of a turn. Lossy; whole turns wrap.
    fn write_angle(&mut self, degrees: f32) {
        self.write_byte((degrees * ANGLE_FACTOR) as i32 as u8);
    }
}

/// Read side of the codec.
///
/// Every bounds-checked read fails with [`ProtocolError::BufferUnderflow`]
/// before consuming anything when the value is not fully available.
pub trait WireRead {
    fn readable_bytes(&self) -> usize;

    /// Read one byte; the caller guarantees `readable_bytes() >= 1`.
    fn read_byte_unchecked(&mut self) -> u8;

    fn read_bytes(&mut self, output: &mut [u8]) -> Result<()>;

    fn ensure_readable(&self, size: usize) -> Result<()> {
        let available = self.readable_bytes();
        if available < size {
            return Err(ProtocolError::BufferUnderflow {
                requested: size,
                available,
            });
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8> {
        self.ensure_readable(BYTE_SIZE)?;
        Ok(self.read_byte_unchecked())
    }

    /// Any nonzero byte reads as `true`
    fn read_boolean(&mut self) -> Result<bool> {
        Ok(self.read_byte()? != 0)
    }

    fn read_short(&mut self) -> Result<u16> {
        let mut raw = [0u8; SHORT_SIZE];
        self.read_bytes(&mut raw)?;
        Ok(u16::from_be_bytes(raw))
    }

    fn read_medium(&mut self) -> Result<u32> {
        let mut raw = [0u8; 4];
        self.read_bytes(&mut raw[1..])?;
        Ok(u32::from_be_bytes(raw))
    }

    fn read_int(&mut self) -> Result<u32> {
        let mut raw = [0u8; INT_SIZE];
        self.read_bytes(&mut raw)?;
        Ok(u32::from_be_bytes(raw))
    }

    fn read_long(&mut self) -> Result<u64> {
        let mut raw = [0u8; LONG_SIZE];
        self.read_bytes(&mut raw)?;
        Ok(u64::from_be_bytes(raw))
    }

    /// Fails with `IncompleteVarInt` when the buffer runs dry before the
    /// terminating byte and with `InvalidVarInt` when a fifth byte still
    /// carries the continuation bit. Bytes read before the failure stay consumed.
    fn read_var_int(&mut self) -> Result<u32> {
        let mut value = 0u32;
        for index in 0..MAX_VAR_INT_BYTES {
            if self.readable_bytes() < 1 {
                return Err(ProtocolError::IncompleteVarInt);
            }
            let byte = self.read_byte_unchecked();
            value |= u32::from(byte & 0x7F).wrapping_shl(7 * index as u32);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(ProtocolError::InvalidVarInt)
    }

    /// VarLong counterpart of [`read_var_int`](Self::read_var_int).
    fn read_var_long(&mut self) -> Result<u64> {
        let mut value = 0u64;
        for index in 0..MAX_VAR_LONG_BYTES {
            if self.readable_bytes() < 1 {
                return Err(ProtocolError::IncompleteVarLong);
            }
            let byte = self.read_byte_unchecked();
            value |= u64::from(byte & 0x7F).wrapping_shl(7 * index as u32);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(ProtocolError::InvalidVarLong)
    }

    fn read_var_int_signed(&mut self) -> Result<i32> {
        Ok(self.read_var_int()? as i32)
    }

    fn read_var_long_signed(&mut self) -> Result<i64> {
        Ok(self.read_var_long()? as i64)
    }

    fn read_float(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_int()?))
    }

    fn read_double(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_long()?))
    }

    fn read_uuid(&mut self) -> Result<Uuid> {
        self.ensure_readable(UUID_SIZE)?;
        let most_significant = self.read_long()?;
        let least_significant = self.read_long()?;
        Ok(Uuid::new(most_significant, least_significant))
    }

    fn read_uuid_int_array(&mut self) -> Result<Uuid> {
        self.ensure_readable(UUID_SIZE)?;
        let mut quarters = [0u32; 4];
        for quarter in quarters.iter_mut() {
            *quarter = self.read_int()?;
        }
        Ok(Uuid::from_quarters(quarters))
    }

    fn read_bytes_to_vec(&mut self, size: usize) -> Result<Vec<u8>> {
        self.ensure_readable(size)?;
        let mut output = vec![0u8; size];
        self.read_bytes(&mut output)?;
        Ok(output)
    }

    /// Read a string of at most [`DEFAULT_MAX_STRING_LENGTH`] bytes.
    fn read_string(&mut self) -> Result<String> {
        self.read_string_with_limit(DEFAULT_MAX_STRING_LENGTH)
    }

    /// Read a string bounded by the configured `max_string_length`.
    fn read_string_with_config(&mut self, config: &BufferConfig) -> Result<String> {
        self.read_string_with_limit(config.max_string_length)
    }

    /// Read a string of at most `max_length` bytes.
    ///
    /// The length prefix stays consumed when it exceeds `max_length`.
    fn read_string_with_limit(&mut self, max_length: u32) -> Result<String> {
        let length = self.read_var_int()?;
        if length > max_length {
            return Err(ProtocolError::InvalidInput(format!(
                "{}: {length} > {max_length}",
                constants::ERR_STRING_TOO_LONG
            )));
        }
        let raw = self.read_bytes_to_vec(length as usize)?;
        String::from_utf8(raw)
            .map_err(|_| ProtocolError::InvalidInput(constants::ERR_STRING_NOT_UTF8.to_string()))
    }

    /// Read a length-prefixed byte array into a buffer holding exactly its bytes.
    fn read_byte_array(&mut self) -> Result<SegmentedBuffer> {
        self.read_byte_array_with_limit(u32::MAX)
    }

    fn read_byte_array_with_limit(&mut self, max_length: u32) -> Result<SegmentedBuffer> {
        let length = self.read_var_int()?;
        if length > max_length {
            return Err(ProtocolError::InvalidInput(format!(
                "{}: {length} > {max_length}",
                constants::ERR_ARRAY_TOO_LONG
            )));
        }
        let raw = self.read_bytes_to_vec(length as usize)?;
        Ok(SegmentedBuffer::from_segment(raw.into_boxed_slice()))
    }

    fn read_position(&mut self) -> Result<Position> {
        Ok(Position::unpack(self.read_long()?))
    }

    /// Degrees in `[0, 360)`, quantized to 360/256
    fn read_angle(&mut self) -> Result<f32> {
        Ok(f32::from(self.read_byte()?) / ANGLE_FACTOR)
    }
}

/// A value whose wire layout may depend on the negotiated protocol version.
pub trait Encode {
    fn encode<W: WireWrite + ?Sized>(&self, version: &ProtocolVersion, out: &mut W)
        -> Result<()>;

    /// Serialized size, measured with a dry run into a [`SizeCounter`].
    fn encoded_size(&self, version: &ProtocolVersion) -> Result<usize> {
        let mut counter = SizeCounter::new();
        self.encode(version, &mut counter)?;
        Ok(counter.written())
    }
}

/// Decoding counterpart of [`Encode`].
pub trait Decode: Sized {
    fn decode<R: WireRead + ?Sized>(version: &ProtocolVersion, input: &mut R) -> Result<Self>;
}
