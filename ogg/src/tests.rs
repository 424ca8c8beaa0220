//! Round-trip and conformance tests across muxer and demuxer.

use crate::page::{GRANULE_NONE, MAX_BODY_SIZE};
use crate::{Demuxer, Error, Muxer, Page};

/// Muxes packets, flushing a page after every packet when `flush_each`
/// is set, and closes with the last granule position.
fn mux_pages(packets: &[(Vec<u8>, i64)], flush_each: bool) -> Vec<Page> {
    let mut muxer = Muxer::new(0xcafe);
    let mut pages = Vec::new();
    for (data, granule) in packets {
        pages.extend(muxer.write_packet(data, *granule).unwrap());
        if flush_each {
            pages.push(muxer.finish_page().unwrap());
        }
    }
    let last = packets.last().map_or(0, |(_, granule)| *granule);
    pages.push(muxer.close(last).unwrap());
    pages
}

fn to_bytes(pages: &[Page]) -> Vec<u8> {
    pages.iter().flat_map(|page| page.to_bytes()).collect()
}

/// Demuxes `bytes` fed in `chunk`-sized pieces; returns complete packets.
fn demux_chunked(bytes: &[u8], chunk: usize) -> Result<Vec<(Vec<u8>, i64)>, Error> {
    let mut demuxer = Demuxer::new();
    let mut packets = Vec::new();
    for piece in bytes.chunks(chunk.max(1)) {
        let mut input = piece;
        loop {
            let used = demuxer.feed(input)?;
            input = &input[used..];
            while let Some(packet) = demuxer.next_packet() {
                if !packet.continues {
                    packets.push((packet.data.to_vec(), packet.granule_position));
                }
            }
            if input.is_empty() {
                break;
            }
        }
    }
    Ok(packets)
}

fn patterned(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}

fn sample_packets() -> Vec<(Vec<u8>, i64)> {
    vec![
        (patterned(19, 1), 0),
        (patterned(0, 2), 0),
        (patterned(255, 3), 960),
        (patterned(1000, 4), 1920),
        (patterned(510, 5), 2880),
        (patterned(MAX_BODY_SIZE + 300, 6), 3840),
        (patterned(3, 7), 4800),
    ]
}

#[test]
fn test_roundtrip_any_chunking() {
    let packets = sample_packets();
    let bytes = to_bytes(&mux_pages(&packets, false));

    let whole = demux_chunked(&bytes, bytes.len()).unwrap();
    assert_eq!(whole.len(), packets.len());
    for ((got, _), (want, _)) in whole.iter().zip(&packets) {
        assert_eq!(got, want);
    }
    assert_eq!(whole.last().unwrap().1, 4800);

    for chunk in [1, 7] {
        assert_eq!(demux_chunked(&bytes, chunk).unwrap(), whole, "chunk size {}", chunk);
    }
}

#[test]
fn test_roundtrip_flushed_pages_keep_every_granule() {
    let packets = sample_packets();
    let bytes = to_bytes(&mux_pages(&packets, true));
    let got = demux_chunked(&bytes, 7).unwrap();
    assert_eq!(got, packets);
}

#[test]
fn test_lacing_quirk() {
    for k in 1..=3 {
        let data = patterned(255 * k, k as u8);
        let pages = mux_pages(&[(data.clone(), 1)], true);

        let mut expected = vec![255u8; k];
        expected.push(0);
        assert_eq!(pages[0].segment_table, expected);

        let got = demux_chunked(&to_bytes(&pages), 1).unwrap();
        assert_eq!(got, vec![(data, 1)]);
    }
}

#[test]
fn test_continuation_across_pages() {
    let data = patterned(MAX_BODY_SIZE * 2 + 17, 9);
    let pages = mux_pages(&[(data.clone(), 480)], false);

    assert_eq!(pages.len(), 3);
    assert!(!pages[0].header.is_continuation());
    assert!(pages[1].header.is_continuation());
    assert!(pages[2].header.is_continuation());
    assert_eq!(pages[0].header.granule_position, GRANULE_NONE);
    assert_eq!(pages[1].header.granule_position, GRANULE_NONE);

    let bytes = to_bytes(&pages);
    let mut demuxer = Demuxer::new();
    let mut input = &bytes[..];
    let mut flags = Vec::new();
    let mut complete = None;
    while !input.is_empty() {
        let used = demuxer.feed(input).unwrap();
        input = &input[used..];
        while let Some(packet) = demuxer.next_packet() {
            flags.push(packet.continues);
            if !packet.continues {
                complete = Some(packet.data.to_vec());
            }
        }
    }
    assert_eq!(flags, vec![true, true, false]);
    assert_eq!(complete.unwrap(), data);
}

#[test]
fn test_granule_of_completed_packet_not_none() {
    let mut muxer = Muxer::new(1);
    muxer.add_packet(&[1u8; 100], 960).unwrap();
    let big = vec![2u8; MAX_BODY_SIZE];
    let added = muxer.add_packet(&big, 1920).unwrap();
    assert!(added.page_full);

    let page = muxer.finish_page().unwrap();
    assert_eq!(page.header.granule_position, 960);
    assert!(page.ends_mid_packet());
}

#[test]
fn test_single_bit_flip_rejected() {
    let pages = mux_pages(&[(patterned(600, 1), 10)], true);
    let bytes = pages[0].to_bytes();

    for bit in pages[0].header_len() * 8..bytes.len() * 8 {
        let mut corrupt = bytes.clone();
        corrupt[bit / 8] ^= 1 << (bit % 8);
        let result = demux_chunked(&corrupt, corrupt.len());
        assert!(
            matches!(result, Err(Error::Checksum { .. })),
            "bit {} gave {:?}",
            bit,
            result
        );
    }
}

#[test]
fn test_sequence_monotonicity() {
    let mut muxer = Muxer::with_config(crate::MuxerConfig::new(5).with_initial_sequence(1000));
    let mut sequences = Vec::new();
    for i in 0..20 {
        muxer.add_packet(&patterned(i * 50, i as u8), i as i64).unwrap();
        sequences.push(muxer.finish_page().unwrap().header.sequence);
    }
    sequences.push(muxer.close(20).unwrap().header.sequence);
    let expected: Vec<u32> = (1000..1021).collect();
    assert_eq!(sequences, expected);
}

#[test]
fn test_bos_and_eos_exactly_once() {
    let pages = mux_pages(&sample_packets(), true);
    assert_eq!(pages.iter().filter(|page| page.header.is_bos()).count(), 1);
    assert_eq!(pages.iter().filter(|page| page.header.is_eos()).count(), 1);
    assert!(pages.first().unwrap().header.is_bos());
    assert!(pages.last().unwrap().header.is_eos());
    assert!(pages.iter().all(|page| page.header.serial == 0xcafe));
}

#[test]
fn test_three_packet_scenario() {
    let packets = vec![(patterned(10, 1), 0), (patterned(300, 2), 960), (patterned(5, 3), 1920)];

    // One page per packet keeps every granule position.
    let bytes = to_bytes(&mux_pages(&packets, true));
    for chunk in [1, 7, bytes.len()] {
        let got = demux_chunked(&bytes, chunk).unwrap();
        let lengths: Vec<usize> = got.iter().map(|(data, _)| data.len()).collect();
        let granules: Vec<i64> = got.iter().map(|(_, granule)| *granule).collect();
        assert_eq!(lengths, vec![10, 300, 5]);
        assert_eq!(granules, vec![0, 960, 1920]);
        assert_eq!(got, packets);
    }

    // Batched on one page, only the last packet carries the granule.
    let bytes = to_bytes(&mux_pages(&packets, false));
    let got = demux_chunked(&bytes, 1).unwrap();
    let granules: Vec<i64> = got.iter().map(|(_, granule)| *granule).collect();
    assert_eq!(granules, vec![GRANULE_NONE, GRANULE_NONE, 1920]);
}

#[test]
fn test_every_page_checksum_valid() {
    for page in mux_pages(&sample_packets(), false) {
        assert_eq!(page.compute_checksum(), page.header.checksum);
        assert_eq!(page.header.segments as usize, page.segment_table.len());
        let body: usize = page.segment_table.iter().map(|&s| s as usize).sum();
        assert_eq!(body, page.body.len());
    }
}
