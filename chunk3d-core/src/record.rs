/// Record cursor: header reads, byte accounting and absolute skips
use std::io::{self, Read, Seek, SeekFrom};

use tracing::trace;

use crate::error::{DecodeError, FormatError, Result};
use crate::tags::{HEADER_LEN, MAX_TAG, MIN_TAG, PRIMARY};

/// One tagged, length-prefixed record of the stream.
///
/// `length` includes the 6-byte header, so a freshly read record has
/// already consumed 6 bytes. `start` is the absolute stream offset of the
/// header and `start + length` is where the next sibling begins, no matter
/// how much of the body was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    pub tag: u16,
    pub length: u32,
    pub consumed: u32,
    pub start: u64,
}

impl Record {
    /// Absolute offset one past the last byte of this record.
    pub fn end(&self) -> u64 {
        self.start + u64::from(self.length)
    }

    pub fn remaining(&self) -> u32 {
        self.length.saturating_sub(self.consumed)
    }

    pub fn is_exhausted(&self) -> bool {
        self.consumed >= self.length
    }

    /// Account for `len` more body bytes, refusing to run past the end.
    pub fn advance(&mut self, len: u32) -> std::result::Result<(), FormatError> {
        match self.consumed.checked_add(len) {
            Some(total) if total <= self.length => {
                self.consumed = total;
                Ok(())
            }
            _ => Err(FormatError::OutOfSync {
                tag: self.tag,
                offset: self.start,
                consumed: self.consumed,
                length: self.length,
                requested: len,
            }),
        }
    }
}

/// Receives advisory progress events, 0..=100, one per record header read.
pub trait ProgressObserver {
    fn progress(&mut self, percent: u8);
}

impl<F: FnMut(u8)> ProgressObserver for F {
    fn progress(&mut self, percent: u8) {
        self(percent)
    }
}

/// Reads records from a borrowed seekable stream.
///
/// The reader tracks its own stream offset, so skipping a record whose body
/// was read to the end never touches the stream.
pub struct RecordReader<'a, R> {
    stream: &'a mut R,
    position: u64,
    total_len: u64,
    observer: Option<&'a mut dyn ProgressObserver>,
    headers_read: usize,
}

impl<'a, R: Read + Seek> RecordReader<'a, R> {
    /// Wrap a stream, measuring its total length for progress reporting.
    /// The stream position is left where it was.
    pub fn new(stream: &'a mut R) -> io::Result<Self> {
        let here = stream.stream_position()?;
        let total_len = stream.seek(SeekFrom::End(0))?;
        stream.seek(SeekFrom::Start(here))?;

        Ok(Self {
            stream,
            position: here,
            total_len,
            observer: None,
            headers_read: 0,
        })
    }

    pub fn with_progress(mut self, observer: &'a mut dyn ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn total_len(&self) -> u64 {
        self.total_len
    }

    pub fn headers_read(&self) -> usize {
        self.headers_read
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read the whole-file container header. Anything but the primary tag
    /// means this is not a model file at all.
    pub fn read_top_level(&mut self) -> Result<Record> {
        let record = self.read_raw_header()?;
        if record.tag != PRIMARY {
            return Err(FormatError::NotAModelFile { tag: record.tag }.into());
        }
        check_length(record)
    }

    /// Read the next child container of `parent`, checking that its tag is in
    /// the recognized range and that it fits inside the parent.
    pub fn next_child(&mut self, parent: &Record) -> Result<Record> {
        let child = self.child_header(parent)?;
        if !(MIN_TAG..=MAX_TAG).contains(&child.tag) {
            return Err(FormatError::CorruptTag {
                tag: child.tag,
                offset: child.start,
            }
            .into());
        }
        Ok(child)
    }

    /// Read a leaf data sub-record of `parent`. Leaf tags are not validated;
    /// the caller decides what an unexpected tag means.
    pub fn leaf_child(&mut self, parent: &Record) -> Result<Record> {
        self.child_header(parent)
    }

    fn child_header(&mut self, parent: &Record) -> Result<Record> {
        if parent.remaining() < HEADER_LEN {
            return Err(out_of_sync(parent, HEADER_LEN));
        }
        let child = self.read_header()?;
        if child.end() > parent.end() {
            return Err(out_of_sync(parent, child.length));
        }
        Ok(child)
    }

    fn read_header(&mut self) -> Result<Record> {
        let record = self.read_raw_header()?;
        check_length(record)
    }

    /// Header fields as found, before any length check.
    fn read_raw_header(&mut self) -> Result<Record> {
        let start = self.position;
        let mut raw = [0u8; 6];
        self.fill(&mut raw)?;

        let tag = u16::from_le_bytes([raw[0], raw[1]]);
        let length = u32::from_le_bytes([raw[2], raw[3], raw[4], raw[5]]);
        self.headers_read += 1;
        trace!("record 0x{tag:04X} at {start}, {length} bytes");
        self.report_progress(start);

        Ok(Record {
            tag,
            length,
            consumed: HEADER_LEN,
            start,
        })
    }

    fn report_progress(&mut self, offset: u64) {
        if let Some(observer) = self.observer.as_mut() {
            let percent = if self.total_len == 0 {
                100
            } else {
                (offset.saturating_mul(100) / self.total_len).min(100) as u8
            };
            observer.progress(percent);
        }
    }

    /// Jump to the record's canonical end, `start + length`, and mark it
    /// fully consumed. Idempotent.
    pub fn skip_to_end(&mut self, record: &mut Record) -> Result<()> {
        let end = record.end();
        if self.position != end {
            // Relative, so a buffered stream can keep its buffer.
            let delta = end as i64 - self.position as i64;
            self.stream.seek_relative(delta)?;
            self.position = end;
        }
        record.consumed = record.length;
        Ok(())
    }

    fn fill(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.stream.read_exact(buf)?;
        self.position += buf.len() as u64;
        Ok(())
    }

    pub fn read_bytes(&mut self, record: &mut Record, len: u32) -> Result<Vec<u8>> {
        record.advance(len)?;
        let mut buf = vec![0u8; len as usize];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    fn read_array<const N: usize>(&mut self, record: &mut Record) -> Result<[u8; N]> {
        record.advance(N as u32)?;
        let mut buf = [0u8; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    pub fn read_u8(&mut self, record: &mut Record) -> Result<u8> {
        let [b] = self.read_array::<1>(record)?;
        Ok(b)
    }

    pub fn read_u16(&mut self, record: &mut Record) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array(record)?))
    }

    pub fn read_u32(&mut self, record: &mut Record) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array(record)?))
    }

    pub fn read_f32(&mut self, record: &mut Record) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_array(record)?))
    }

    /// Read a zero-terminated string, one byte at a time.
    pub fn read_cstring(&mut self, record: &mut Record) -> Result<String> {
        let mut bytes = Vec::new();
        loop {
            match self.read_u8(record)? {
                0 => break,
                b => bytes.push(b),
            }
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn check_length(record: Record) -> Result<Record> {
    if record.length < HEADER_LEN {
        return Err(FormatError::BadLength {
            tag: record.tag,
            offset: record.start,
            length: record.length,
        }
        .into());
    }
    Ok(record)
}

fn out_of_sync(parent: &Record, requested: u32) -> DecodeError {
    FormatError::OutOfSync {
        tag: parent.tag,
        offset: parent.start,
        consumed: parent.consumed,
        length: parent.length,
        requested,
    }
    .into()
}

/// Turn a nom failure on a leaf payload into a format error.
pub(crate) fn payload_error(tag: u16, err: nom::Err<nom::error::Error<&[u8]>>) -> DecodeError {
    let message = match err {
        nom::Err::Incomplete(_) => "truncated payload".to_string(),
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            format!("{:?} with {} bytes left", e.code, e.input.len())
        }
    };
    FormatError::Payload { tag, message }.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header(tag: u16, length: u32) -> Vec<u8> {
        let mut out = tag.to_le_bytes().to_vec();
        out.extend_from_slice(&length.to_le_bytes());
        out
    }

    #[test]
    fn test_read_top_level_rejects_foreign_tag() {
        let mut data = header(0x0002, 10);
        data.extend_from_slice(&3u32.to_le_bytes());
        let mut stream = Cursor::new(data);
        let mut reader = RecordReader::new(&mut stream).unwrap();

        let err = reader.read_top_level().unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Format(FormatError::NotAModelFile { tag: 0x0002 })
        ));
    }

    #[test]
    fn test_scalar_reads_track_consumption() {
        let mut data = header(PRIMARY, 6 + 2 + 4);
        data.extend_from_slice(&7u16.to_le_bytes());
        data.extend_from_slice(&1.5f32.to_le_bytes());
        let mut stream = Cursor::new(data);
        let mut reader = RecordReader::new(&mut stream).unwrap();

        let mut record = reader.read_top_level().unwrap();
        assert_eq!(record.consumed, 6);
        assert_eq!(reader.read_u16(&mut record).unwrap(), 7);
        assert!((reader.read_f32(&mut record).unwrap() - 1.5).abs() < 1e-6);
        assert!(record.is_exhausted());

        // Nothing left in the record: the next read is refused before touching the stream.
        let err = reader.read_u8(&mut record).unwrap_err();
        assert!(matches!(err, DecodeError::Format(FormatError::OutOfSync { .. })));
    }

    #[test]
    fn test_skip_to_end_is_absolute_and_idempotent() {
        let mut data = header(PRIMARY, 6 + 16);
        data.extend_from_slice(&header(0x1234, 10));
        data.extend_from_slice(&[1, 2, 3, 4]);
        data.extend_from_slice(&header(0x5678, 6));
        let mut stream = Cursor::new(data);
        let mut reader = RecordReader::new(&mut stream).unwrap();

        let parent = reader.read_top_level().unwrap();
        let mut child = reader.next_child(&parent).unwrap();
        assert_eq!(child.start, 6);
        reader.read_u8(&mut child).unwrap();

        reader.skip_to_end(&mut child).unwrap();
        assert_eq!(reader.position(), 16);
        assert_eq!(child.consumed, child.length);

        reader.skip_to_end(&mut child).unwrap();
        assert_eq!(reader.position(), 16);
        let next = reader.next_child(&parent).unwrap();
        assert_eq!((next.tag, next.start), (0x5678, 16));
    }

    #[test]
    fn test_next_child_rejects_zero_tag() {
        let mut data = header(PRIMARY, 12);
        data.extend_from_slice(&header(0x0000, 6));
        let mut stream = Cursor::new(data);
        let mut reader = RecordReader::new(&mut stream).unwrap();

        let parent = reader.read_top_level().unwrap();
        let err = reader.next_child(&parent).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Format(FormatError::CorruptTag { offset: 6, .. })
        ));
    }

    #[test]
    fn test_next_child_rejects_tag_above_known_range() {
        let mut data = header(PRIMARY, 16);
        data.extend_from_slice(&header(0xFFFF, 10));
        data.extend_from_slice(&0u32.to_le_bytes());
        let mut stream = Cursor::new(data);
        let mut reader = RecordReader::new(&mut stream).unwrap();

        let parent = reader.read_top_level().unwrap();
        let err = reader.next_child(&parent).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Format(FormatError::CorruptTag { tag: 0xFFFF, offset: 6 })
        ));
    }

    #[test]
    fn test_next_child_accepts_unknown_tag_inside_range() {
        let mut data = header(PRIMARY, 12);
        data.extend_from_slice(&header(0xB000, 6));
        let mut stream = Cursor::new(data);
        let mut reader = RecordReader::new(&mut stream).unwrap();

        let parent = reader.read_top_level().unwrap();
        assert_eq!(reader.next_child(&parent).unwrap().tag, 0xB000);
    }

    #[test]
    fn test_leaf_child_accepts_any_tag() {
        let mut data = header(PRIMARY, 12);
        data.extend_from_slice(&header(0x0000, 6));
        let mut stream = Cursor::new(data);
        let mut reader = RecordReader::new(&mut stream).unwrap();

        let parent = reader.read_top_level().unwrap();
        let leaf = reader.leaf_child(&parent).unwrap();
        assert_eq!(leaf.tag, 0);
    }

    #[test]
    fn test_child_overrunning_parent_is_out_of_sync() {
        let mut data = header(PRIMARY, 12);
        data.extend_from_slice(&header(0x1234, 40));
        let mut stream = Cursor::new(data);
        let mut reader = RecordReader::new(&mut stream).unwrap();

        let parent = reader.read_top_level().unwrap();
        let err = reader.next_child(&parent).unwrap_err();
        assert!(matches!(err, DecodeError::Format(FormatError::OutOfSync { .. })));
    }

    #[test]
    fn test_short_length_is_rejected() {
        let data = header(PRIMARY, 3);
        let mut stream = Cursor::new(data);
        let mut reader = RecordReader::new(&mut stream).unwrap();

        let err = reader.read_top_level().unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Format(FormatError::BadLength { length: 3, .. })
        ));
    }

    #[test]
    fn test_foreign_tag_wins_over_short_length() {
        let data = header(0x0002, 3);
        let mut stream = Cursor::new(data);
        let mut reader = RecordReader::new(&mut stream).unwrap();

        let err = reader.read_top_level().unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Format(FormatError::NotAModelFile { tag: 0x0002 })
        ));
    }

    /// Counts `seek` calls on the wrapped stream.
    struct SeekCounter {
        inner: Cursor<Vec<u8>>,
        seeks: usize,
    }

    impl Read for SeekCounter {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl Seek for SeekCounter {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.seeks += 1;
            self.inner.seek(pos)
        }
    }

    fn two_children() -> SeekCounter {
        let mut data = header(PRIMARY, 6 + 10 + 6);
        data.extend_from_slice(&header(0x1234, 10));
        data.extend_from_slice(&[1, 2, 3, 4]);
        data.extend_from_slice(&header(0x5678, 6));
        SeekCounter {
            inner: Cursor::new(data),
            seeks: 0,
        }
    }

    #[test]
    fn test_skip_after_full_read_does_not_seek() {
        let mut stream = two_children();
        RecordReader::new(&mut stream).unwrap();
        let length_probe = stream.seeks;

        let mut stream = two_children();
        let mut reader = RecordReader::new(&mut stream).unwrap();
        let parent = reader.read_top_level().unwrap();
        let mut read_through = reader.next_child(&parent).unwrap();
        reader.read_u32(&mut read_through).unwrap();
        reader.skip_to_end(&mut read_through).unwrap();
        let mut empty = reader.next_child(&parent).unwrap();
        reader.skip_to_end(&mut empty).unwrap();
        assert_eq!(reader.position(), 22);
        assert_eq!(stream.seeks, length_probe);
    }

    #[test]
    fn test_skip_after_partial_read_seeks_once() {
        let mut stream = two_children();
        RecordReader::new(&mut stream).unwrap();
        let length_probe = stream.seeks;

        let mut stream = two_children();
        let mut reader = RecordReader::new(&mut stream).unwrap();
        let parent = reader.read_top_level().unwrap();
        let mut partial = reader.next_child(&parent).unwrap();
        reader.read_u8(&mut partial).unwrap();
        reader.skip_to_end(&mut partial).unwrap();
        reader.skip_to_end(&mut partial).unwrap();
        assert_eq!(reader.position(), 16);
        assert_eq!(stream.seeks, length_probe + 1);
        assert_eq!(stream.inner.position(), 16);
    }

    #[test]
    fn test_cstring_stops_at_nul() {
        let mut data = header(PRIMARY, 6 + 5 + 1);
        data.extend_from_slice(b"cube\0");
        data.push(9);
        let mut stream = Cursor::new(data);
        let mut reader = RecordReader::new(&mut stream).unwrap();

        let mut record = reader.read_top_level().unwrap();
        assert_eq!(reader.read_cstring(&mut record).unwrap(), "cube");
        assert_eq!(record.consumed, 11);
        assert_eq!(reader.read_u8(&mut record).unwrap(), 9);
    }

    #[test]
    fn test_progress_reports_header_offsets() {
        let mut data = header(PRIMARY, 12);
        data.extend_from_slice(&header(0x1234, 6));
        let mut stream = Cursor::new(data);
        let mut seen = Vec::new();
        let mut observer = |p: u8| seen.push(p);
        {
            let mut reader = RecordReader::new(&mut stream)
                .unwrap()
                .with_progress(&mut observer);
            let parent = reader.read_top_level().unwrap();
            reader.next_child(&parent).unwrap();
            assert_eq!(reader.headers_read(), 2);
        }
        assert_eq!(seen, vec![0, 50]);
    }
}
