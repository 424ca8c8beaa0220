//! Streaming Ogg page muxer and demuxer.
//!
//! This crate implements the page/packet framing layer of the Ogg bitstream
//! format (RFC 3533) for a single logical stream, without any knowledge of
//! the codec carried inside the packets:
//!
//! - [`Muxer`]: packs packets into checksummed pages
//! - [`Demuxer`]: reassembles packets from raw bytes fed in any chunk size
//! - [`PageWriter`] / [`PacketReader`]: `std::io` adapters around both
//!
//! # Example
//!
//! ```rust
//! use giztoy_ogg::{Demuxer, Muxer};
//!
//! let mut muxer = Muxer::new(0x1234);
//! let mut bytes = Vec::new();
//! for page in muxer.write_packet(b"hello", 0).unwrap() {
//!     bytes.extend_from_slice(&page.to_bytes());
//! }
//! bytes.extend_from_slice(&muxer.close(0).unwrap().to_bytes());
//!
//! let mut demuxer = Demuxer::new();
//! let mut input = &bytes[..];
//! while !input.is_empty() {
//!     let used = demuxer.feed(input).unwrap();
//!     input = &input[used..];
//!     while let Some(packet) = demuxer.next_packet() {
//!         assert_eq!(packet.data, b"hello");
//!     }
//! }
//! ```

mod config;
pub mod crc;
mod demuxer;
mod error;
pub mod io;
mod muxer;
mod page;

pub use config::{DemuxerConfig, MuxerConfig};
pub use demuxer::{DemuxState, Demuxer, PacketRef};
pub use error::{Error, Result};
pub use io::{Packet, PacketIter, PacketReader, PageWriter};
pub use muxer::{AddPacket, Muxer};
pub use page::*;

#[cfg(test)]
mod tests;
