//! Packet to page muxer.

use tracing::debug;

use crate::config::MuxerConfig;
use crate::error::{Error, Result};
use crate::page::{flags, Page, PageHeader, GRANULE_NONE, MAX_BODY_SIZE, MAX_SEGMENTS, MAX_SEGMENT_SIZE};

/// Outcome of [`Muxer::add_packet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddPacket {
    /// Bytes of the packet copied into the current page.
    pub consumed: usize,
    /// The segment table filled up before the packet was finished. The
    /// caller must finish the page and add the remaining bytes again.
    pub page_full: bool,
}

/// Packs packets of one logical stream into Ogg pages.
///
/// Small packets share a page until [`finish_page`](Muxer::finish_page) is
/// called or the segment table fills up; large packets are split across as
/// many pages as needed.
#[derive(Debug)]
pub struct Muxer {
    serial: u32,
    sequence: u32,
    segment_table: Vec<u8>,
    body: Vec<u8>,
    granule_position: i64,
    /// The next finished page starts with the tail of an unfinished packet.
    continued: bool,
    bos_emitted: bool,
    closed: bool,
}

impl Muxer {
    /// Creates a muxer whose first page has sequence number 0.
    pub fn new(serial: u32) -> Self {
        Self::with_config(MuxerConfig::new(serial))
    }

    /// Creates a muxer from a config.
    pub fn with_config(config: MuxerConfig) -> Self {
        Self {
            serial: config.serial,
            sequence: config.initial_sequence,
            segment_table: Vec::with_capacity(MAX_SEGMENTS),
            body: Vec::with_capacity(MAX_BODY_SIZE),
            granule_position: GRANULE_NONE,
            continued: false,
            bos_emitted: false,
            closed: false,
        }
    }

    /// Returns the serial number.
    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// Returns the sequence number the next finished page will carry.
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Granule position of the page under construction, or `-1` if no
    /// packet has completed on it yet.
    pub fn granule_position(&self) -> i64 {
        self.granule_position
    }

    /// Returns true once [`close`](Muxer::close) produced the final page.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of segments in the page under construction.
    pub fn pending_segments(&self) -> usize {
        self.segment_table.len()
    }

    /// Adds (the rest of) a packet to the current page.
    ///
    /// Bytes are laced in 255-byte segments; the packet ends with a segment
    /// shorter than 255, which is zero-length when the packet size is an
    /// exact multiple of 255. When the packet completes, `granule_position`
    /// becomes the page's granule position.
    ///
    /// If `page_full` is set in the result, call [`finish_page`](Muxer::finish_page)
    /// and then `add_packet` again with `data[consumed..]`, even if that
    /// slice is empty.
    pub fn add_packet(&mut self, data: &[u8], granule_position: i64) -> Result<AddPacket> {
        if self.closed {
            return Err(Error::Closed);
        }

        let mut consumed = 0;
        loop {
            if self.segment_table.len() == MAX_SEGMENTS {
                return Ok(AddPacket {
                    consumed,
                    page_full: true,
                });
            }

            let chunk = (data.len() - consumed).min(MAX_SEGMENT_SIZE);
            self.segment_table.push(chunk as u8);
            self.body.extend_from_slice(&data[consumed..consumed + chunk]);
            consumed += chunk;

            if chunk < MAX_SEGMENT_SIZE {
                self.granule_position = granule_position;
                return Ok(AddPacket {
                    consumed,
                    page_full: false,
                });
            }
        }
    }

    /// Adds a whole packet, finishing pages as they fill up.
    ///
    /// Returns the pages that became full. The page holding the end of the
    /// packet stays open for further packets.
    pub fn write_packet(&mut self, data: &[u8], granule_position: i64) -> Result<Vec<Page>> {
        let mut pages = Vec::new();
        let mut offset = 0;
        loop {
            let added = self.add_packet(&data[offset..], granule_position)?;
            offset += added.consumed;
            if !added.page_full {
                return Ok(pages);
            }
            pages.push(self.finish_page()?);
        }
    }

    /// Emits the page under construction, full or not.
    pub fn finish_page(&mut self) -> Result<Page> {
        if self.closed {
            return Err(Error::Closed);
        }
        Ok(self.emit(false))
    }

    /// Emits the final page with the end-of-stream flag.
    ///
    /// The page carries `final_granule_position` and may be empty. Fails
    /// with [`Error::PacketInProgress`] if the last packet was not added
    /// completely.
    pub fn close(&mut self, final_granule_position: i64) -> Result<Page> {
        if self.closed {
            return Err(Error::Closed);
        }
        if self.in_packet() {
            return Err(Error::PacketInProgress);
        }

        self.granule_position = final_granule_position;
        let page = self.emit(true);
        self.closed = true;
        Ok(page)
    }

    fn in_packet(&self) -> bool {
        match self.segment_table.last() {
            Some(&lacing) => lacing as usize == MAX_SEGMENT_SIZE,
            None => self.continued,
        }
    }

    fn emit(&mut self, eos: bool) -> Page {
        let mut header_type = 0u8;
        if self.continued {
            header_type |= flags::CONTINUATION;
        }
        if !self.bos_emitted {
            header_type |= flags::BOS;
        }
        if eos {
            header_type |= flags::EOS;
        }

        let mut page = Page {
            header: PageHeader {
                version: 0,
                header_type,
                granule_position: self.granule_position,
                serial: self.serial,
                sequence: self.sequence,
                checksum: 0,
                segments: self.segment_table.len() as u8,
            },
            segment_table: self.segment_table.clone(),
            body: self.body.clone(),
        };
        page.header.checksum = page.compute_checksum();

        debug!(
            sequence = self.sequence,
            segments = page.segment_table.len(),
            body = page.body.len(),
            granule = self.granule_position,
            header_type,
            "ogg page finished"
        );

        self.continued = page.ends_mid_packet() || (page.is_empty() && self.continued);
        self.bos_emitted = true;
        self.sequence = self.sequence.wrapping_add(1);
        self.segment_table.clear();
        self.body.clear();
        self.granule_position = GRANULE_NONE;
        page
    }
}
