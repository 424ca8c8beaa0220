//! Packet listing command.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use tracing::info;

use giztoy_ogg::{Demuxer, DemuxerConfig};

use crate::Cli;

/// List packet numbers, lengths and granule positions.
///
/// The file is fed to the demuxer in `--chunk-size` pieces (one byte by
/// default) to exercise arbitrary input splitting.
#[derive(Args)]
pub struct ListCommand {
    /// Ogg file to read
    file: PathBuf,

    /// Bytes handed to the demuxer per call
    #[arg(long, default_value_t = 1)]
    chunk_size: usize,

    /// Only list the stream with this serial number
    #[arg(long)]
    serial: Option<u32>,

    /// Skip corrupt data instead of stopping
    #[arg(long)]
    resync: bool,
}

/// One listed packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PacketInfo {
    pub packet: usize,
    pub packetlen: usize,
    pub granulepos: i64,
}

impl ListCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let data = fs::read(&self.file)
            .with_context(|| format!("unable to open {}", self.file.display()))?;

        let mut config = DemuxerConfig::new().with_resync(self.resync);
        if let Some(serial) = self.serial {
            config = config.with_serial(serial);
        }
        let packets = list_packets(&data, self.chunk_size, config)?;

        let stdout = io::stdout();
        let mut out = stdout.lock();
        for info in &packets {
            if cli.json {
                serde_json::to_writer(&mut out, info)?;
                writeln!(out)?;
            } else {
                writeln!(out, "packet #{}", info.packet)?;
                writeln!(out, "  packetlen: {}", info.packetlen)?;
                // Unsigned, like libogg-based listings print it.
                writeln!(out, "  granulepos: {}", info.granulepos as u64)?;
            }
        }

        info!(packets = packets.len(), file = %self.file.display(), "listing done");
        Ok(())
    }
}

/// Demuxes `data` fed in `chunk_size` pieces and describes every complete
/// packet.
pub fn list_packets(data: &[u8], chunk_size: usize, config: DemuxerConfig) -> giztoy_ogg::Result<Vec<PacketInfo>> {
    let mut demuxer = Demuxer::with_config(config);
    let mut packets = Vec::new();

    for piece in data.chunks(chunk_size.max(1)) {
        let mut input = piece;
        loop {
            let used = demuxer.feed(input)?;
            input = &input[used..];
            while let Some(packet) = demuxer.next_packet() {
                if packet.continues {
                    continue;
                }
                packets.push(PacketInfo {
                    packet: packets.len() + 1,
                    packetlen: packet.data.len(),
                    granulepos: packet.granule_position,
                });
            }
            if input.is_empty() {
                break;
            }
        }
    }

    Ok(packets)
}
