//! Repack command: demux the first logical stream and mux it again.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Args;
use tracing::{debug, info};

use giztoy_ogg::{Demuxer, Muxer, Page};

use crate::Cli;

const READ_SIZE: usize = 4096;

/// Demux the first logical stream of a file and mux it into a new one.
///
/// Granule positions are renumbered assuming a fixed number of samples per
/// packet; packets with granule position 0 (stream headers) keep 0 and get
/// a page of their own.
#[derive(Args)]
pub struct RepackCommand {
    /// Source Ogg file
    input: PathBuf,

    /// Destination Ogg file
    output: PathBuf,

    /// Granule increment per audio packet (960 = 20ms Opus at 48kHz)
    #[arg(long, default_value_t = 960)]
    samples_per_packet: i64,

    /// Serial number of the output stream (default: keep the source serial)
    #[arg(long)]
    serial: Option<u32>,
}

/// Counters reported after a repack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepackStats {
    pub packets: usize,
    pub pages: usize,
    pub granule_position: i64,
}

impl RepackCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let input = File::open(&self.input)
            .with_context(|| format!("unable to open {} for reading", self.input.display()))?;
        let output = File::create(&self.output)
            .with_context(|| format!("unable to open {} for writing", self.output.display()))?;

        let stats = repack(
            BufReader::new(input),
            BufWriter::new(output),
            self.samples_per_packet,
            self.serial,
        )?;

        if cli.json {
            println!(
                "{}",
                serde_json::json!({
                    "packets": stats.packets,
                    "pages": stats.pages,
                    "granulepos": stats.granule_position,
                })
            );
        }
        info!(
            packets = stats.packets,
            pages = stats.pages,
            granule = stats.granule_position,
            "repack done"
        );
        Ok(())
    }
}

/// Copies the packets of the first logical stream in `input` into a fresh
/// Ogg stream written to `output`.
pub fn repack<R: Read, W: Write>(
    mut input: R,
    mut output: W,
    samples_per_packet: i64,
    serial: Option<u32>,
) -> anyhow::Result<RepackStats> {
    let mut demuxer = Demuxer::new();
    let mut muxer: Option<Muxer> = None;
    let mut stats = RepackStats::default();
    let mut buf = [0u8; READ_SIZE];

    'read: loop {
        let len = input.read(&mut buf)?;
        if len == 0 {
            break;
        }

        let mut chunk = &buf[..len];
        while !chunk.is_empty() {
            let used = demuxer.feed(chunk)?;
            chunk = &chunk[used..];

            let Some(source_serial) = demuxer.serial() else {
                continue;
            };
            let mux = muxer.get_or_insert_with(|| {
                debug!(source_serial, "first stream found");
                Muxer::new(serial.unwrap_or(source_serial))
            });

            while let Some(packet) = demuxer.next_packet() {
                if packet.continues {
                    continue;
                }
                if packet.granule_position != 0 {
                    stats.granule_position += samples_per_packet;
                }
                for page in mux.write_packet(packet.data, stats.granule_position)? {
                    write_page(&mut output, &page, &mut stats)?;
                }
                stats.packets += 1;

                // Header packets always get their own page.
                if mux.granule_position() == 0 {
                    let page = mux.finish_page()?;
                    write_page(&mut output, &page, &mut stats)?;
                }
            }

            if demuxer.is_eos() {
                break 'read;
            }
        }
    }

    let mut muxer = muxer.ok_or_else(|| anyhow!("no Ogg pages found"))?;
    let page = muxer.close(stats.granule_position)?;
    write_page(&mut output, &page, &mut stats)?;
    output.flush()?;
    Ok(stats)
}

fn write_page<W: Write>(output: &mut W, page: &Page, stats: &mut RepackStats) -> anyhow::Result<()> {
    page.write_to(&mut *output)?;
    stats.pages += 1;
    Ok(())
}
