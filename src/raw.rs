//! The raw, byte-for-byte on-disk structures (component C): the fixed
//! 16-byte file header and the 28-byte block header records that make up a
//! file's header table. All fields are big-endian on disk regardless of
//! host byte order.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::error::Result;
use crate::field::{Compression, Layout};

/// Size of a [`IdxFileHeader`] on disk.
pub const FILE_HEADER_BYTES: usize = 16;

/// Size of a single [`IdxBlockHeader`] record on disk.
pub const BLOCK_HEADER_BYTES: usize = 28;

/// The 16-byte file-level header. Reserved and zero as of format version 6;
/// carried so that a future version can extend it without moving the header
/// table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdxFileHeader {
    reserved: [u8; FILE_HEADER_BYTES],
}

impl IdxFileHeader {
    /// Reads the 16-byte header from `reader`.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<IdxFileHeader> {
        let mut reserved = [0u8; FILE_HEADER_BYTES];
        reader.read_exact(&mut reserved)?;
        Ok(IdxFileHeader { reserved })
    }

    /// Writes the 16-byte header to `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.reserved)?;
        Ok(())
    }
}

impl Default for IdxFileHeader {
    fn default() -> IdxFileHeader {
        IdxFileHeader {
            reserved: [0; FILE_HEADER_BYTES],
        }
    }
}

/// One 28-byte block header record: where a block's payload lives, how big
/// it is, and how it is encoded.
///
/// `offset == 0` means the block has never been written — "absent" — the
/// same sentinel the reference format uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdxBlockHeader {
    /// Absolute file offset of the block payload. `0` means absent.
    pub offset: u64,
    /// Size of the payload on disk, in bytes (possibly compressed).
    pub bytes: u32,
    /// The codec tag applied to the payload.
    pub compression: Compression,
    /// The on-disk sample ordering of the payload.
    pub format: Layout,
    reserved: [u8; 8],
}

impl IdxBlockHeader {
    /// `true` if this header describes a block that has been written.
    pub fn is_present(&self) -> bool {
        self.offset != 0
    }

    /// Reads one 28-byte record from `reader`.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<IdxBlockHeader> {
        let offset = reader.read_u64::<BigEndian>()?;
        let bytes = reader.read_u32::<BigEndian>()?;
        let compression = Compression::from_tag(reader.read_i32::<BigEndian>()?);
        let format = Layout::from_tag(reader.read_i32::<BigEndian>()?).unwrap_or(Layout::RowMajor);
        let mut reserved = [0u8; 8];
        reader.read_exact(&mut reserved)?;
        Ok(IdxBlockHeader {
            offset,
            bytes,
            compression,
            format,
            reserved,
        })
    }

    /// Writes this record to `writer` as 28 big-endian bytes.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u64::<BigEndian>(self.offset)?;
        writer.write_u32::<BigEndian>(self.bytes)?;
        writer.write_i32::<BigEndian>(self.compression.tag())?;
        writer.write_i32::<BigEndian>(self.format.tag())?;
        writer.write_all(&self.reserved)?;
        Ok(())
    }
}

impl Default for IdxBlockHeader {
    fn default() -> IdxBlockHeader {
        IdxBlockHeader {
            offset: 0,
            bytes: 0,
            compression: Compression::Invalid,
            format: Layout::RowMajor,
            reserved: [0; 8],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn file_header_roundtrip() {
        let header = IdxFileHeader::default();
        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), FILE_HEADER_BYTES);
        let read_back = IdxFileHeader::read_from(&mut Cursor::new(buf)).unwrap();
        assert_eq!(read_back, header);
    }

    #[test]
    fn block_header_roundtrip() {
        let header = IdxBlockHeader {
            offset: 4096,
            bytes: 256,
            compression: Compression::Zip,
            format: Layout::RowMajor,
            ..Default::default()
        };
        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), BLOCK_HEADER_BYTES);
        let read_back = IdxBlockHeader::read_from(&mut Cursor::new(buf)).unwrap();
        assert_eq!(read_back, header);
    }

    #[test]
    fn block_header_is_big_endian() {
        let header = IdxBlockHeader {
            offset: 1,
            ..Default::default()
        };
        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        assert_eq!(&buf[..8], &[0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn absent_header_has_zero_offset() {
        assert!(!IdxBlockHeader::default().is_present());
    }
}
