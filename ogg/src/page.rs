//! Ogg page structures.

use std::io::{self, Write};

use crate::crc::Crc;
use crate::error::{Error, Result};

/// Magic bytes for Ogg page header.
pub const CAPTURE_PATTERN: &[u8; 4] = b"OggS";

/// Size of the fixed part of a page header.
pub const HEADER_SIZE: usize = 27;

/// Maximum number of lacing values in one segment table.
pub const MAX_SEGMENTS: usize = 255;

/// Largest lacing value; it means the packet continues.
pub const MAX_SEGMENT_SIZE: usize = 255;

/// Maximum body size a full segment table can describe.
pub const MAX_BODY_SIZE: usize = MAX_SEGMENTS * MAX_SEGMENT_SIZE;

/// Maximum size of a page on the wire.
pub const MAX_PAGE_SIZE: usize = HEADER_SIZE + MAX_SEGMENTS + MAX_BODY_SIZE;

/// Granule position of a page on which no packet completes.
pub const GRANULE_NONE: i64 = -1;

/// Byte range of the checksum field inside the header.
pub(crate) const CHECKSUM_RANGE: std::ops::Range<usize> = 22..26;

/// Header type flags.
pub mod flags {
    /// Continuation of previous packet.
    pub const CONTINUATION: u8 = 0x01;
    /// Beginning of stream.
    pub const BOS: u8 = 0x02;
    /// End of stream.
    pub const EOS: u8 = 0x04;
}

/// Fixed 27-byte Ogg page header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    /// Stream structure version (always 0)
    pub version: u8,
    /// Header type flags
    pub header_type: u8,
    /// Granule position of the last packet completed on this page
    pub granule_position: i64,
    /// Stream serial number
    pub serial: u32,
    /// Page sequence number
    pub sequence: u32,
    /// CRC checksum
    pub checksum: u32,
    /// Number of segments
    pub segments: u8,
}

impl PageHeader {
    /// Parses the fixed header.
    ///
    /// Fails with [`Error::Framing`] if the capture pattern is missing and
    /// [`Error::UnsupportedVersion`] for a non-zero version byte.
    pub fn parse(header: &[u8; HEADER_SIZE]) -> Result<Self> {
        if &header[0..4] != CAPTURE_PATTERN {
            return Err(Error::Framing);
        }
        let version = header[4];
        if version != 0 {
            return Err(Error::UnsupportedVersion(version));
        }

        let le_u32 = |at: usize| u32::from_le_bytes([header[at], header[at + 1], header[at + 2], header[at + 3]]);
        let mut granule = [0u8; 8];
        granule.copy_from_slice(&header[6..14]);

        Ok(Self {
            version,
            header_type: header[5],
            granule_position: i64::from_le_bytes(granule),
            serial: le_u32(14),
            sequence: le_u32(18),
            checksum: le_u32(22),
            segments: header[26],
        })
    }

    /// Encodes the fixed header, checksum field included as stored.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut header = [0u8; HEADER_SIZE];
        header[0..4].copy_from_slice(CAPTURE_PATTERN);
        header[4] = self.version;
        header[5] = self.header_type;
        header[6..14].copy_from_slice(&self.granule_position.to_le_bytes());
        header[14..18].copy_from_slice(&self.serial.to_le_bytes());
        header[18..22].copy_from_slice(&self.sequence.to_le_bytes());
        header[CHECKSUM_RANGE].copy_from_slice(&self.checksum.to_le_bytes());
        header[26] = self.segments;
        header
    }

    /// Returns true if this is a beginning-of-stream page.
    pub fn is_bos(&self) -> bool {
        (self.header_type & flags::BOS) != 0
    }

    /// Returns true if this is an end-of-stream page.
    pub fn is_eos(&self) -> bool {
        (self.header_type & flags::EOS) != 0
    }

    /// Returns true if this is a continuation page.
    pub fn is_continuation(&self) -> bool {
        (self.header_type & flags::CONTINUATION) != 0
    }
}

impl Default for PageHeader {
    fn default() -> Self {
        Self {
            version: 0,
            header_type: 0,
            granule_position: GRANULE_NONE,
            serial: 0,
            sequence: 0,
            checksum: 0,
            segments: 0,
        }
    }
}

/// A complete Ogg page: header, segment table and body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    /// Fixed header
    pub header: PageHeader,
    /// Segment table (lacing values)
    pub segment_table: Vec<u8>,
    /// Page body data
    pub body: Vec<u8>,
}

impl Page {
    /// Header length on the wire: fixed part plus segment table.
    pub fn header_len(&self) -> usize {
        HEADER_SIZE + self.segment_table.len()
    }

    /// Total page length on the wire.
    pub fn len(&self) -> usize {
        self.header_len() + self.body.len()
    }

    /// Returns true if the page carries no segments.
    pub fn is_empty(&self) -> bool {
        self.segment_table.is_empty()
    }

    /// Number of packets that end on this page.
    pub fn completed_packets(&self) -> usize {
        self.segment_table
            .iter()
            .filter(|&&lacing| (lacing as usize) < MAX_SEGMENT_SIZE)
            .count()
    }

    /// Returns true if the last packet on this page continues on the next.
    pub fn ends_mid_packet(&self) -> bool {
        self.segment_table.last() == Some(&(MAX_SEGMENT_SIZE as u8))
    }

    /// Serialized header: fixed part followed by the segment table.
    pub fn header_bytes(&self) -> Vec<u8> {
        let mut header = Vec::with_capacity(self.header_len());
        header.extend_from_slice(&self.header.encode());
        header.extend_from_slice(&self.segment_table);
        header
    }

    /// Computes the checksum over the page with the checksum field zeroed.
    pub fn compute_checksum(&self) -> u32 {
        let mut fixed = self.header.encode();
        fixed[CHECKSUM_RANGE].fill(0);

        let mut crc = Crc::new();
        crc.update(&fixed);
        crc.update(&self.segment_table);
        crc.update(&self.body);
        crc.finish()
    }

    /// Serializes the whole page.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.header_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }

    /// Writes header and body verbatim.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.header_bytes())?;
        writer.write_all(&self.body)
    }
}
