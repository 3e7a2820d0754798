//! # Segmented Buffer
//!
//! A growable byte stream backed by a queue of fixed-capacity segments.
//!
//! Writes append at the tail segment and allocate a fresh one when it fills up;
//! reads consume from the head segment and release it once exhausted. Callers
//! never observe segment boundaries through the byte-level API.
//!
//! ## Layout
//! ```text
//!  head                                tail
//! [....RRRRRRRR][RRRRRRRRRRRR][RRRRR.......]
//!      ^reader                      ^writer
//! ```
//!
//! ## Zero-copy paths
//! - [`SegmentedBuffer::write_segment`] moves a caller-owned segment in as the
//!   new tail when the writer sits at a fresh segment boundary.
//! - [`SegmentedBuffer::direct_read`] / [`SegmentedBuffer::direct_write`] expose
//!   the current segment as a slice when the requested span fits.
//! - [`SegmentedBuffer::read_from`] / [`SegmentedBuffer::write_to`] hand segment
//!   memory straight to a socket.
//!
//! ## Usage
//! ```rust
//! use shipnet::core::buffer::SegmentedBuffer;
//! use shipnet::core::codec::{WireRead, WireWrite};
//!
//! let mut buffer = SegmentedBuffer::new(16);
//! buffer.write_var_int(300);
//! buffer.write_string("hello");
//! assert_eq!(buffer.read_var_int().unwrap(), 300);
//! assert_eq!(buffer.read_string().unwrap(), "hello");
//! ```

use bytes::{Bytes, BytesMut};
use std::collections::VecDeque;
use std::io;
use tracing::trace;

use crate::config::BufferConfig;
use crate::core::codec::{WireRead, WireWrite};
use crate::error::{ProtocolError, Result};

/// Default capacity of a single segment (8 KiB)
pub const DEFAULT_SEGMENT_CAPACITY: usize = 8 * 1024;

/// Outcome of filling a buffer from a non-blocking reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadProgress {
    /// Bytes appended to the buffer
    pub bytes: usize,
    /// The reader reported end of stream
    pub eof: bool,
}

/// Byte stream over a queue of fixed-capacity segments.
///
/// Invariants:
/// - `readable` equals the sum of unread bytes over all held segments
/// - at least one segment is held until [`release`](Self::release) is called
/// - every segment is exactly `capacity` bytes long
///
/// Cloning deep-copies every segment together with both cursors. Two buffers
/// never share segment storage.
#[derive(Debug, Clone)]
pub struct SegmentedBuffer {
    segments: VecDeque<Box<[u8]>>,
    capacity: usize,
    reader: usize,
    writer: usize,
    readable: usize,
}

impl Default for SegmentedBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_SEGMENT_CAPACITY)
    }
}

impl SegmentedBuffer {
    /// Create an empty buffer whose segments hold `capacity` bytes each.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut segments = VecDeque::with_capacity(4);
        segments.push_back(fresh_segment(capacity));

        Self {
            segments,
            capacity,
            reader: 0,
            writer: 0,
            readable: 0,
        }
    }

    /// Create an empty buffer sized by the configured `segment_capacity`.
    pub fn from_config(config: &BufferConfig) -> Self {
        Self::new(config.segment_capacity)
    }

    /// Wrap a caller-supplied region as the sole first segment.
    ///
    /// The region's length becomes the segment capacity and its whole content
    /// is readable. An empty region yields an empty buffer.
    pub fn from_segment(segment: Box<[u8]>) -> Self {
        if segment.is_empty() {
            return Self::new(1);
        }

        let capacity = segment.len();
        let mut segments = VecDeque::with_capacity(4);
        segments.push_back(segment);

        Self {
            segments,
            capacity,
            reader: 0,
            writer: capacity,
            readable: capacity,
        }
    }

    /// Bytes that can currently be read
    #[inline]
    pub fn readable_bytes(&self) -> usize {
        self.readable
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.readable == 0
    }

    /// Reader offset inside the head segment
    #[inline]
    pub fn reader_index(&self) -> usize {
        self.reader
    }

    /// Writer offset inside the tail segment
    #[inline]
    pub fn writer_index(&self) -> usize {
        self.writer
    }

    /// Capacity of a single segment
    #[inline]
    pub fn segment_capacity(&self) -> usize {
        self.capacity
    }

    /// Number of segments currently held
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Append `input` at the writer cursor, spilling into new segments as needed.
    pub fn write_bytes(&mut self, mut input: &[u8]) {
        while !input.is_empty() {
            self.refresh_writer();
            let room = self.capacity - self.writer;
            let n = room.min(input.len());
            let start = self.writer;
            self.tail_mut()[start..start + n].copy_from_slice(&input[..n]);
            self.writer += n;
            self.readable += n;
            input = &input[n..];
        }
    }

    /// Move `segment` into the buffer, copying only when it cannot be adopted.
    ///
    /// The segment is adopted as the new tail without copying when
    /// `segment.len() == segment_capacity()` and the writer sits at a fresh
    /// segment boundary: either offset 0 of an empty tail or the end of a full
    /// one. Otherwise its bytes are copied and the segment is dropped.
    ///
    /// Returns `true` when the segment was adopted.
    pub fn write_segment(&mut self, segment: Box<[u8]>) -> bool {
        if segment.len() != self.capacity {
            self.write_bytes(&segment);
            return false;
        }

        if self.segments.is_empty() {
            self.reader = 0;
            self.segments.push_back(segment);
        } else if self.writer == 0 {
            // An empty tail holds no unread bytes, so it can be swapped out.
            let tail = self.tail_mut();
            *tail = segment;
        } else if self.writer >= self.capacity {
            self.segments.push_back(segment);
        } else {
            self.write_bytes(&segment);
            return false;
        }

        self.writer = self.capacity;
        self.readable += self.capacity;
        trace!(capacity = self.capacity, "Adopted segment without copying");
        true
    }

    /// Copy `output.len()` bytes out of the buffer.
    ///
    /// Fails with [`ProtocolError::BufferUnderflow`] without consuming
    /// anything when fewer bytes are readable.
    pub fn read_bytes(&mut self, output: &mut [u8]) -> Result<()> {
        self.ensure_readable(output.len())?;

        let mut copied = 0;
        while copied < output.len() {
            self.refresh_reader();
            let chunk = self.head_chunk();
            let n = chunk.len().min(output.len() - copied);
            output[copied..copied + n].copy_from_slice(&chunk[..n]);
            self.reader += n;
            self.readable -= n;
            copied += n;
        }

        Ok(())
    }

    /// Read one byte without a bounds check.
    ///
    /// The caller must guarantee `readable_bytes() >= 1`; otherwise this panics
    /// or returns stale segment content.
    #[inline]
    pub fn read_byte_unchecked(&mut self) -> u8 {
        self.refresh_reader();
        let value = self.segments[0][self.reader];
        self.reader += 1;
        self.readable -= 1;
        value
    }

    /// Advance the reader by `count` bytes without copying them out.
    pub fn skip_read_bytes(&mut self, mut count: usize) -> Result<()> {
        self.ensure_readable(count)?;

        while count > 0 {
            self.refresh_reader();
            let n = self.head_chunk().len().min(count);
            self.reader += n;
            self.readable -= n;
            count -= n;
        }

        Ok(())
    }

    /// Advance the writer by `count` bytes, appending segments as needed.
    ///
    /// Commits bytes placed through [`direct_write`](Self::direct_write). The
    /// skipped span is not cleared: bytes in the current tail keep whatever
    /// that segment last held (stale data after
    /// [`reset_writer_index`](Self::reset_writer_index)); only newly appended
    /// segments start zeroed.
    pub fn skip_write_bytes(&mut self, mut count: usize) {
        while count > 0 {
            self.refresh_writer();
            let n = (self.capacity - self.writer).min(count);
            self.writer += n;
            self.readable += n;
            count -= n;
        }
    }

    /// Rewind the reader to the start of the head segment.
    ///
    /// Bytes of the head segment that were already consumed become readable
    /// again; segments released earlier are gone for good.
    pub fn reset_reader_index(&mut self) {
        self.reader = 0;
        self.readable = match self.segments.len() {
            0 => 0,
            n => (n - 1) * self.capacity + self.writer,
        };
    }

    /// Discard all pending content, keeping a single empty segment.
    ///
    /// The kept segment's memory is reused as is, not cleared.
    pub fn reset_writer_index(&mut self) {
        self.segments.truncate(1);
        self.reader = 0;
        self.writer = 0;
        self.readable = 0;
    }

    /// True when `size` readable bytes sit contiguously in the head segment,
    /// ending strictly before the segment's end.
    #[inline]
    pub fn can_read_direct(&self, size: usize) -> bool {
        !self.segments.is_empty() && size <= self.readable && self.reader + size < self.capacity
    }

    /// Borrow the next `size` readable bytes in place.
    ///
    /// Returns `None` when [`can_read_direct`](Self::can_read_direct) fails;
    /// fall back to [`read_bytes`](Self::read_bytes) in that case. The bytes are
    /// not consumed; follow up with [`skip_read_bytes`](Self::skip_read_bytes).
    pub fn direct_read(&self, size: usize) -> Option<&[u8]> {
        if !self.can_read_direct(size) {
            return None;
        }
        Some(&self.segments[0][self.reader..self.reader + size])
    }

    /// True when `size` bytes can be written contiguously into the tail
    /// segment, ending strictly before the segment's end.
    #[inline]
    pub fn can_write_direct(&self, size: usize) -> bool {
        !self.segments.is_empty() && self.writer + size < self.capacity
    }

    /// Borrow `size` writable bytes of the tail segment in place.
    ///
    /// Returns `None` when [`can_write_direct`](Self::can_write_direct) fails.
    /// Commit what was written with [`skip_write_bytes`](Self::skip_write_bytes).
    pub fn direct_write(&mut self, size: usize) -> Option<&mut [u8]> {
        if !self.can_write_direct(size) {
            return None;
        }
        let start = self.writer;
        Some(&mut self.tail_mut()[start..start + size])
    }

    /// Fill the buffer from a (possibly non-blocking) reader, up to `max` bytes.
    ///
    /// Reads land directly in segment memory. `WouldBlock` ends the fill
    /// normally; `Interrupted` is retried.
    pub fn read_from<R: io::Read + ?Sized>(
        &mut self,
        reader: &mut R,
        max: usize,
    ) -> io::Result<ReadProgress> {
        let mut progress = ReadProgress {
            bytes: 0,
            eof: false,
        };

        while progress.bytes < max {
            self.refresh_writer();
            let room = (self.capacity - self.writer).min(max - progress.bytes);
            let start = self.writer;
            match reader.read(&mut self.tail_mut()[start..start + room]) {
                Ok(0) => {
                    progress.eof = true;
                    break;
                }
                Ok(n) => {
                    self.writer += n;
                    self.readable += n;
                    progress.bytes += n;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(progress)
    }

    /// Drain readable bytes into a (possibly non-blocking) writer.
    ///
    /// Returns the number of bytes consumed. `WouldBlock` stops the drain with
    /// the remaining bytes left in the buffer.
    pub fn write_to<W: io::Write + ?Sized>(&mut self, writer: &mut W) -> io::Result<usize> {
        let mut total = 0;

        while self.readable > 0 {
            self.refresh_reader();
            match writer.write(self.head_chunk()) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero)),
                Ok(n) => {
                    self.reader += n;
                    self.readable -= n;
                    total += n;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(total)
    }

    /// Copy the readable content without consuming it.
    pub fn to_bytes(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(self.readable);
        let last = self.segments.len().saturating_sub(1);
        for (index, segment) in self.segments.iter().enumerate() {
            let start = if index == 0 { self.reader } else { 0 };
            let end = if index == last { self.writer } else { self.capacity };
            if start < end {
                out.extend_from_slice(&segment[start..end]);
            }
        }
        out.freeze()
    }

    /// Deep copy with the same cursors; the copy shares no storage.
    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    /// Drop every held segment. Safe to call repeatedly.
    ///
    /// The buffer stays usable: the next write allocates a fresh segment.
    pub fn release(&mut self) {
        if !self.segments.is_empty() {
            trace!(segments = self.segments.len(), "Releasing buffer segments");
        }
        self.segments.clear();
        self.reader = 0;
        self.writer = 0;
        self.readable = 0;
    }

    fn ensure_readable(&self, size: usize) -> Result<()> {
        if self.readable < size {
            return Err(ProtocolError::BufferUnderflow {
                requested: size,
                available: self.readable,
            });
        }
        Ok(())
    }

    /// Unread bytes of the head segment.
    fn head_chunk(&self) -> &[u8] {
        let end = if self.segments.len() == 1 {
            self.writer
        } else {
            self.capacity
        };
        &self.segments[0][self.reader..end]
    }

    fn tail_mut(&mut self) -> &mut Box<[u8]> {
        let last = self.segments.len() - 1;
        &mut self.segments[last]
    }

    fn refresh_reader(&mut self) {
        if self.reader >= self.capacity && self.segments.len() > 1 {
            self.segments.pop_front();
            self.reader = 0;
        }
    }

    fn refresh_writer(&mut self) {
        if self.segments.is_empty() {
            self.segments.push_back(fresh_segment(self.capacity));
            self.reader = 0;
            self.writer = 0;
        } else if self.writer >= self.capacity {
            self.segments.push_back(fresh_segment(self.capacity));
            self.writer = 0;
        }
    }
}

fn fresh_segment(capacity: usize) -> Box<[u8]> {
    vec![0u8; capacity].into_boxed_slice()
}

impl WireWrite for SegmentedBuffer {
    #[inline]
    fn write_byte(&mut self, value: u8) {
        self.refresh_writer();
        let index = self.writer;
        self.tail_mut()[index] = value;
        self.writer += 1;
        self.readable += 1;
    }

    #[inline]
    fn write_bytes(&mut self, input: &[u8]) {
        SegmentedBuffer::write_bytes(self, input);
    }
}

impl WireRead for SegmentedBuffer {
    #[inline]
    fn readable_bytes(&self) -> usize {
        self.readable
    }

    #[inline]
    fn read_byte_unchecked(&mut self) -> u8 {
        SegmentedBuffer::read_byte_unchecked(self)
    }

    #[inline]
    fn read_bytes(&mut self, output: &mut [u8]) -> Result<()> {
        SegmentedBuffer::read_bytes(self, output)
    }
}

impl io::Write for SegmentedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Read for SegmentedBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.readable);
        self.read_bytes(&mut buf[..n])
            .map_err(|e| io::Error::new(io::ErrorKind::UnexpectedEof, e.to_string()))?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 251) as u8).collect()
    }

    #[test]
    fn test_cross_boundary_roundtrip_unaligned_chunks() {
        let capacity = 16;
        let data = pattern(2 * capacity + 5);
        let mut buffer = SegmentedBuffer::new(capacity);
        buffer.write_bytes(&data);
        assert_eq!(buffer.readable_bytes(), data.len());
        assert_eq!(buffer.segment_count(), 3);

        let mut out = Vec::new();
        for chunk in [3usize, 7, 11, 1, 15] {
            let mut part = vec![0u8; chunk];
            buffer.read_bytes(&mut part).unwrap();
            out.extend_from_slice(&part);
        }
        assert_eq!(out, data);
        assert!(buffer.is_empty());
        assert_eq!(buffer.segment_count(), 1);
    }

    #[test]
    fn test_underflow_leaves_buffer_intact() {
        let mut buffer = SegmentedBuffer::new(8);
        buffer.write_bytes(&[1, 2, 3]);

        let mut out = [0u8; 4];
        match buffer.read_bytes(&mut out) {
            Err(ProtocolError::BufferUnderflow {
                requested,
                available,
            }) => {
                assert_eq!(requested, 4);
                assert_eq!(available, 3);
            }
            other => panic!("expected underflow, got {other:?}"),
        }

        let mut rest = [0u8; 3];
        buffer.read_bytes(&mut rest).unwrap();
        assert_eq!(rest, [1, 2, 3]);
    }

    #[test]
    fn test_write_segment_adopts_without_copy() {
        let mut buffer = SegmentedBuffer::new(8);
        let segment: Box<[u8]> = pattern(8).into_boxed_slice();
        let ptr = segment.as_ptr();

        assert!(buffer.write_segment(segment));
        assert_eq!(buffer.readable_bytes(), 8);
        assert_eq!(buffer.segment_count(), 1);

        // The tail now is the caller's allocation.
        assert_eq!(buffer.to_bytes().as_ref(), pattern(8).as_slice());
        let direct = buffer.direct_read(4).unwrap();
        assert_eq!(direct.as_ptr(), ptr);
    }

    #[test]
    fn test_write_segment_appends_after_full_tail() {
        let mut buffer = SegmentedBuffer::new(4);
        buffer.write_bytes(&[9, 9, 9, 9]);
        assert!(buffer.write_segment(vec![1, 2, 3, 4].into_boxed_slice()));
        assert_eq!(buffer.segment_count(), 2);
        assert_eq!(buffer.to_bytes().as_ref(), &[9, 9, 9, 9, 1, 2, 3, 4]);
    }

    #[test]
    fn test_write_segment_falls_back_to_copy() {
        let mut buffer = SegmentedBuffer::new(4);
        buffer.write_bytes(&[7]);
        assert!(!buffer.write_segment(vec![1, 2, 3, 4].into_boxed_slice()));
        assert!(!buffer.write_segment(vec![5, 6].into_boxed_slice()));
        assert_eq!(buffer.to_bytes().as_ref(), &[7, 1, 2, 3, 4, 5, 6]);
        assert_eq!(buffer.readable_bytes(), 7);
    }

    #[test]
    fn test_skip_read_and_write() {
        let mut buffer = SegmentedBuffer::new(4);
        buffer.skip_write_bytes(10);
        assert_eq!(buffer.readable_bytes(), 10);
        assert_eq!(buffer.segment_count(), 3);

        buffer.write_bytes(&[42]);
        buffer.skip_read_bytes(10).unwrap();
        assert_eq!(buffer.read_byte_unchecked(), 42);
        assert!(buffer.skip_read_bytes(1).is_err());
    }

    #[test]
    fn test_skip_write_commits_in_place_bytes_without_clearing() {
        let mut buffer = SegmentedBuffer::new(4);
        buffer.write_bytes(&[1, 2, 3]);
        buffer.reset_writer_index();

        // the reused head still holds the discarded bytes
        buffer.skip_write_bytes(2);
        assert_eq!(buffer.to_bytes().as_ref(), &[1, 2]);

        // the direct_write region is committed exactly as written
        buffer.reset_writer_index();
        buffer.direct_write(2).unwrap().copy_from_slice(&[7, 8]);
        buffer.skip_write_bytes(2);
        assert_eq!(buffer.to_bytes().as_ref(), &[7, 8]);

        // the rest of the tail stays stale, appended segments are zeroed
        buffer.skip_write_bytes(5);
        assert_eq!(buffer.to_bytes().as_ref(), &[7, 8, 3, 0, 0, 0, 0]);
    }

    #[test]
    fn test_reset_reader_index_rereads_head() {
        let mut buffer = SegmentedBuffer::new(8);
        buffer.write_bytes(&[1, 2, 3, 4]);
        buffer.skip_read_bytes(3).unwrap();
        buffer.reset_reader_index();
        assert_eq!(buffer.readable_bytes(), 4);
        assert_eq!(buffer.read_byte_unchecked(), 1);
    }

    #[test]
    fn test_reset_writer_index_discards_content() {
        let mut buffer = SegmentedBuffer::new(4);
        buffer.write_bytes(&pattern(9));
        buffer.reset_writer_index();
        assert_eq!(buffer.readable_bytes(), 0);
        assert_eq!(buffer.segment_count(), 1);

        buffer.write_bytes(&[5, 6]);
        assert_eq!(buffer.to_bytes().as_ref(), &[5, 6]);
    }

    #[test]
    fn test_direct_predicates() {
        let mut buffer = SegmentedBuffer::new(8);
        assert!(buffer.can_write_direct(7));
        assert!(!buffer.can_write_direct(8));

        let region = buffer.direct_write(3).unwrap();
        region.copy_from_slice(&[10, 20, 30]);
        buffer.skip_write_bytes(3);

        assert!(buffer.can_read_direct(3));
        assert!(!buffer.can_read_direct(4));
        assert_eq!(buffer.direct_read(3).unwrap(), &[10, 20, 30]);
        assert!(buffer.direct_write(5).is_none());
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut buffer = SegmentedBuffer::new(4);
        buffer.write_bytes(&pattern(6));
        buffer.release();
        buffer.release();
        assert_eq!(buffer.segment_count(), 0);
        assert_eq!(buffer.readable_bytes(), 0);
        assert!(buffer.read_byte().is_err());

        buffer.write_bytes(&[1, 2]);
        assert_eq!(buffer.to_bytes().as_ref(), &[1, 2]);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = SegmentedBuffer::new(4);
        original.write_bytes(&[1, 2, 3, 4, 5]);
        let mut copy = original.clone();

        original.skip_read_bytes(5).unwrap();
        assert_eq!(copy.readable_bytes(), 5);
        let mut out = [0u8; 5];
        copy.read_bytes(&mut out).unwrap();
        assert_eq!(out, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_read_from_and_write_to() {
        let data = pattern(21);
        let mut source = io::Cursor::new(data.clone());
        let mut buffer = SegmentedBuffer::new(8);

        let progress = buffer.read_from(&mut source, 64).unwrap();
        assert_eq!(progress.bytes, 21);
        assert!(progress.eof);

        let mut sink = Vec::new();
        assert_eq!(buffer.write_to(&mut sink).unwrap(), 21);
        assert_eq!(sink, data);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_read_from_respects_max() {
        let mut source = io::Cursor::new(pattern(50));
        let mut buffer = SegmentedBuffer::new(8);
        let progress = buffer.read_from(&mut source, 20).unwrap();
        assert_eq!(progress.bytes, 20);
        assert!(!progress.eof);
        assert_eq!(buffer.readable_bytes(), 20);
    }

    #[test]
    fn test_from_segment_is_readable() {
        let mut buffer = SegmentedBuffer::from_segment(vec![4, 5, 6].into_boxed_slice());
        assert_eq!(buffer.segment_capacity(), 3);
        assert_eq!(buffer.readable_bytes(), 3);
        assert_eq!(buffer.read_byte_unchecked(), 4);

        buffer.write_bytes(&[7]);
        assert_eq!(buffer.to_bytes().as_ref(), &[5, 6, 7]);
    }
}
