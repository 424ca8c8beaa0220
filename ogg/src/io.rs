//! `std::io` adapters around [`Muxer`] and [`Demuxer`].

use std::io::{Read, Write};

use crate::config::{DemuxerConfig, MuxerConfig};
use crate::demuxer::Demuxer;
use crate::error::Result;
use crate::muxer::Muxer;

/// Read size used by [`PacketReader`].
const READ_CHUNK_SIZE: usize = 4096;

/// A complete packet read from an Ogg stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Packet data
    pub data: Vec<u8>,
    /// Granule position, `-1` unless the packet was the last one completed
    /// on its page.
    pub granule_position: i64,
}

/// Writes packets of one logical stream as Ogg pages.
pub struct PageWriter<W: Write> {
    writer: W,
    muxer: Muxer,
}

impl<W: Write> PageWriter<W> {
    /// Creates a page writer with sequence numbers starting at 0.
    pub fn new(writer: W, serial: u32) -> Self {
        Self::with_config(writer, MuxerConfig::new(serial))
    }

    /// Creates a page writer from a muxer config.
    pub fn with_config(writer: W, config: MuxerConfig) -> Self {
        Self {
            writer,
            muxer: Muxer::with_config(config),
        }
    }

    /// Returns the underlying muxer.
    pub fn muxer(&self) -> &Muxer {
        &self.muxer
    }

    /// Writes a packet. Pages that fill up are written immediately; the
    /// last page stays open for further packets.
    pub fn write_packet(&mut self, data: &[u8], granule_position: i64) -> Result<()> {
        for page in self.muxer.write_packet(data, granule_position)? {
            page.write_to(&mut self.writer)?;
        }
        Ok(())
    }

    /// Writes the open page even if it is not full.
    pub fn flush_page(&mut self) -> Result<()> {
        let page = self.muxer.finish_page()?;
        page.write_to(&mut self.writer)?;
        Ok(())
    }

    /// Writes the end-of-stream page and returns the inner writer.
    pub fn close(mut self, final_granule_position: i64) -> Result<W> {
        let page = self.muxer.close(final_granule_position)?;
        page.write_to(&mut self.writer)?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Reads complete packets of one logical stream from an Ogg byte stream.
pub struct PacketReader<R: Read> {
    reader: R,
    demuxer: Demuxer,
    buf: Vec<u8>,
    pos: usize,
    len: usize,
}

impl<R: Read> PacketReader<R> {
    /// Creates a packet reader that follows the first stream it sees.
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, DemuxerConfig::default())
    }

    /// Creates a packet reader from a demuxer config.
    pub fn with_config(reader: R, config: DemuxerConfig) -> Self {
        Self {
            reader,
            demuxer: Demuxer::with_config(config),
            buf: vec![0u8; READ_CHUNK_SIZE],
            pos: 0,
            len: 0,
        }
    }

    /// Returns the underlying demuxer.
    pub fn demuxer(&self) -> &Demuxer {
        &self.demuxer
    }

    /// Reads the next complete packet.
    ///
    /// Returns `Ok(None)` at end of input. Trailing bytes that do not form
    /// a complete page are ignored.
    pub fn read_packet(&mut self) -> Result<Option<Packet>> {
        loop {
            while let Some(packet) = self.demuxer.next_packet() {
                if !packet.continues {
                    return Ok(Some(Packet {
                        data: packet.data.to_vec(),
                        granule_position: packet.granule_position,
                    }));
                }
            }

            if self.pos == self.len {
                self.len = self.reader.read(&mut self.buf)?;
                self.pos = 0;
                if self.len == 0 {
                    return Ok(None);
                }
            }

            let used = self.demuxer.feed(&self.buf[self.pos..self.len])?;
            self.pos += used;
        }
    }

    /// Returns an iterator over the remaining packets.
    pub fn packets(self) -> PacketIter<R> {
        PacketIter {
            reader: self,
            done: false,
        }
    }

    /// Returns the inner reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Iterator over packets in an Ogg stream.
pub struct PacketIter<R: Read> {
    reader: PacketReader<R>,
    done: bool,
}

impl<R: Read> Iterator for PacketIter<R> {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_packet() {
            Ok(Some(packet)) => Some(Ok(packet)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
