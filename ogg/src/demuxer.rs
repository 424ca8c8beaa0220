//! Byte stream to packet demuxer.

use tracing::{debug, warn};

use crate::config::DemuxerConfig;
use crate::crc::Crc;
use crate::error::{Error, Result};
use crate::page::{PageHeader, CAPTURE_PATTERN, CHECKSUM_RANGE, GRANULE_NONE, HEADER_SIZE, MAX_SEGMENT_SIZE};

/// A packet, or the accumulated head of one, borrowed from the demuxer.
///
/// Valid until the next call to [`Demuxer::feed`] or [`Demuxer::next_packet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketRef<'a> {
    /// Packet bytes. For a packet spanning pages this includes every
    /// fragment seen so far.
    pub data: &'a [u8],
    /// Page granule position if this is the last packet completed on its
    /// page, `-1` otherwise.
    pub granule_position: i64,
    /// The packet continues on the next page; `data` is not complete yet.
    pub continues: bool,
}

/// Where the demuxer stands in the page parsing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemuxState {
    /// Collecting the fixed page header.
    AwaitingSync,
    /// Header staged; collecting segment table and body.
    HeaderBuffered,
    /// A validated page has packets left to read.
    PacketsAvailable,
}

/// Reassembles the packets of one logical stream from raw Ogg bytes.
///
/// Input may be split anywhere, down to one byte per [`feed`](Demuxer::feed).
/// Each `feed` stops after one validated page; drain it with
/// [`next_packet`](Demuxer::next_packet) before feeding again:
///
/// ```rust
/// # use giztoy_ogg::Demuxer;
/// # fn run(bytes: &[u8]) -> giztoy_ogg::Result<()> {
/// let mut demuxer = Demuxer::new();
/// let mut input = bytes;
/// while !input.is_empty() {
///     let used = demuxer.feed(input)?;
///     input = &input[used..];
///     while let Some(packet) = demuxer.next_packet() {
///         if !packet.continues {
///             println!("{} bytes @ {}", packet.data.len(), packet.granule_position);
///         }
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Demuxer {
    config: DemuxerConfig,
    serial: Option<u32>,
    /// Bytes of the page being assembled. Once a page is accepted it stays
    /// here until its packets are drained.
    staging: Vec<u8>,
    page: Option<PageHeader>,
    /// Wire length of the accepted page at the front of `staging`.
    page_len: usize,
    last_page: Option<PageHeader>,
    /// Next unread segment of the accepted page.
    segment: usize,
    /// Body offset of that segment.
    body_offset: usize,
    /// Index of the last lacing value below 255 on the accepted page.
    last_complete: Option<usize>,
    expected_sequence: Option<u32>,
    partial: Vec<u8>,
    in_packet: bool,
}

impl Default for Demuxer {
    fn default() -> Self {
        Self::new()
    }
}

impl Demuxer {
    /// Creates a demuxer that locks onto the first stream it sees.
    pub fn new() -> Self {
        Self::with_config(DemuxerConfig::default())
    }

    /// Creates a demuxer from a config.
    pub fn with_config(config: DemuxerConfig) -> Self {
        Self {
            config,
            serial: config.serial,
            staging: Vec::with_capacity(HEADER_SIZE),
            page: None,
            page_len: 0,
            last_page: None,
            segment: 0,
            body_offset: 0,
            last_complete: None,
            expected_sequence: None,
            partial: Vec::new(),
            in_packet: false,
        }
    }

    /// Serial number of the stream being demuxed, once known.
    pub fn serial(&self) -> Option<u32> {
        self.serial
    }

    /// Header of the most recently accepted page.
    pub fn last_page(&self) -> Option<&PageHeader> {
        self.last_page.as_ref()
    }

    /// Returns true once an end-of-stream page was accepted.
    pub fn is_eos(&self) -> bool {
        self.last_page.is_some_and(|header| header.is_eos())
    }

    /// Current position in the parsing cycle.
    pub fn state(&self) -> DemuxState {
        if self.has_packets() {
            DemuxState::PacketsAvailable
        } else if self.page.is_none() && self.staging.len() >= HEADER_SIZE {
            DemuxState::HeaderBuffered
        } else {
            DemuxState::AwaitingSync
        }
    }

    /// Returns true if the accepted page has unread packets.
    pub fn has_packets(&self) -> bool {
        self.page
            .is_some_and(|header| self.segment < header.segments as usize)
    }

    /// Feeds raw bytes and returns how many were consumed.
    ///
    /// Consumption stops right after the first page of this stream that
    /// passes validation, so the result may be less than `input.len()`.
    /// Pages of other streams are consumed and skipped. If every byte is
    /// consumed without completing a page, more input is needed.
    ///
    /// Returns `Ok(0)` without touching the input while the previous page
    /// still has packets to read.
    pub fn feed(&mut self, input: &[u8]) -> Result<usize> {
        if self.has_packets() {
            return Ok(0);
        }
        if self.page.take().is_some() {
            self.staging.drain(..self.page_len);
        }

        let mut consumed = 0;
        loop {
            let wanted = match self.wanted_len() {
                Ok(wanted) => wanted,
                Err(err) => {
                    self.recover(err)?;
                    continue;
                }
            };

            if self.staging.len() < wanted {
                let take = (wanted - self.staging.len()).min(input.len() - consumed);
                if take == 0 {
                    return Ok(consumed);
                }
                self.staging.extend_from_slice(&input[consumed..consumed + take]);
                consumed += take;
                continue;
            }

            match self.accept_page(wanted) {
                Ok(true) => {
                    self.page_len = wanted;
                    return Ok(consumed);
                }
                Ok(false) => {
                    self.staging.drain(..wanted);
                }
                Err(err) => self.recover(err)?,
            }
        }
    }

    /// Returns the next packet of the accepted page, or `None` when the
    /// page is exhausted.
    ///
    /// A packet that continues on the next page is returned with
    /// `continues` set and is kept internally; the fragment from the next
    /// page is appended to it automatically.
    pub fn next_packet(&mut self) -> Option<PacketRef<'_>> {
        let header = self.page?;
        let segments = header.segments as usize;
        if self.segment >= segments {
            return None;
        }

        let body_start = HEADER_SIZE + segments;
        let start = body_start + self.body_offset;
        let mut complete = false;
        while self.segment < segments {
            let lacing = self.staging[HEADER_SIZE + self.segment] as usize;
            self.segment += 1;
            self.body_offset += lacing;
            if lacing < MAX_SEGMENT_SIZE {
                complete = true;
                break;
            }
        }
        let fragment = start..body_start + self.body_offset;

        let granule_position = if complete && self.last_complete == Some(self.segment - 1) {
            header.granule_position
        } else {
            GRANULE_NONE
        };

        if !complete {
            if !self.in_packet {
                self.partial.clear();
                self.in_packet = true;
            }
            self.partial.extend_from_slice(&self.staging[fragment]);
            return Some(PacketRef {
                data: &self.partial,
                granule_position,
                continues: true,
            });
        }

        if self.in_packet {
            self.in_packet = false;
            self.partial.extend_from_slice(&self.staging[fragment]);
            return Some(PacketRef {
                data: &self.partial,
                granule_position,
                continues: false,
            });
        }

        Some(PacketRef {
            data: &self.staging[fragment],
            granule_position,
            continues: false,
        })
    }

    /// Total staged length needed to complete the current page.
    fn wanted_len(&self) -> Result<usize> {
        let staged = &self.staging;
        let prefix = staged.len().min(CAPTURE_PATTERN.len());
        if staged[..prefix] != CAPTURE_PATTERN[..prefix] {
            return Err(Error::Framing);
        }
        if let Some(&version) = staged.get(4) {
            if version != 0 {
                return Err(Error::UnsupportedVersion(version));
            }
        }
        if staged.len() < HEADER_SIZE {
            return Ok(HEADER_SIZE);
        }

        let header_len = HEADER_SIZE + staged[HEADER_SIZE - 1] as usize;
        if staged.len() < header_len {
            return Ok(header_len);
        }
        let body_len: usize = staged[HEADER_SIZE..header_len]
            .iter()
            .map(|&lacing| lacing as usize)
            .sum();
        Ok(header_len + body_len)
    }

    /// Validates the page staged in `staging[..page_len]`. Returns false
    /// for a page of another stream.
    fn accept_page(&mut self, page_len: usize) -> Result<bool> {
        let mut fixed = [0u8; HEADER_SIZE];
        fixed.copy_from_slice(&self.staging[..HEADER_SIZE]);
        let header = PageHeader::parse(&fixed)?;

        fixed[CHECKSUM_RANGE].fill(0);
        let mut crc = Crc::new();
        crc.update(&fixed);
        crc.update(&self.staging[HEADER_SIZE..page_len]);
        let computed = crc.finish();
        if computed != header.checksum {
            return Err(Error::Checksum {
                expected: header.checksum,
                computed,
            });
        }

        let serial = *self.serial.get_or_insert(header.serial);
        if header.serial != serial {
            debug!(serial = header.serial, sequence = header.sequence, "skipping page of other stream");
            return Ok(false);
        }

        if let Some(expected) = self.expected_sequence {
            if header.sequence != expected {
                if self.config.strict_sequence {
                    return Err(Error::SequenceGap {
                        expected,
                        got: header.sequence,
                    });
                }
                warn!(expected, got = header.sequence, "ogg page sequence gap");
                self.drop_partial();
            }
        }
        self.expected_sequence = Some(header.sequence.wrapping_add(1));

        if !header.is_continuation() && self.in_packet {
            warn!(sequence = header.sequence, "unterminated packet before fresh page");
            self.drop_partial();
        }

        let segments = header.segments as usize;
        let table = &self.staging[HEADER_SIZE..HEADER_SIZE + segments];
        self.last_complete = table
            .iter()
            .rposition(|&lacing| (lacing as usize) < MAX_SEGMENT_SIZE);
        self.segment = 0;
        self.body_offset = 0;

        if header.is_continuation() && !self.in_packet {
            // The head of this packet was never seen.
            while self.segment < segments {
                let lacing = table[self.segment] as usize;
                self.segment += 1;
                self.body_offset += lacing;
                if lacing < MAX_SEGMENT_SIZE {
                    break;
                }
            }
            debug!(sequence = header.sequence, bytes = self.body_offset, "dropping orphan continuation");
        }

        debug!(
            sequence = header.sequence,
            segments,
            granule = header.granule_position,
            header_type = header.header_type,
            "ogg page accepted"
        );
        self.page = Some(header);
        self.last_page = Some(header);
        Ok(true)
    }

    fn drop_partial(&mut self) {
        if self.in_packet {
            warn!(bytes = self.partial.len(), "dropping partial packet");
            self.in_packet = false;
            self.partial.clear();
        }
    }

    /// Handles a framing or checksum failure: skip to the next capture
    /// pattern if resync is enabled, otherwise hand the error back.
    fn recover(&mut self, err: Error) -> Result<()> {
        let recoverable = matches!(
            err,
            Error::Framing | Error::Checksum { .. } | Error::UnsupportedVersion(_)
        );
        if !self.config.resync || !recoverable {
            return Err(err);
        }

        let discarded = self.skip_to_capture();
        warn!(%err, discarded, "ogg resync");
        Ok(())
    }

    /// Drops staged bytes up to the next candidate capture pattern. Always
    /// drops at least one byte.
    fn skip_to_capture(&mut self) -> usize {
        let len = self.staging.len();
        let start = self
            .staging
            .windows(CAPTURE_PATTERN.len())
            .skip(1)
            .position(|window| window == CAPTURE_PATTERN)
            .map(|pos| pos + 1)
            .unwrap_or_else(|| {
                // Keep a trailing partial pattern.
                (1..CAPTURE_PATTERN.len())
                    .rev()
                    .find(|&n| n < len && self.staging[len - n..] == CAPTURE_PATTERN[..n])
                    .map_or(len, |n| len - n)
            });
        self.staging.drain(..start);
        start
    }
}
