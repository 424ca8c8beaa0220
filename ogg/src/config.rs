//! Muxer and demuxer configuration.

/// Muxer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuxerConfig {
    /// Serial number stamped on every page.
    pub serial: u32,
    /// Sequence number of the first page.
    pub initial_sequence: u32,
}

impl MuxerConfig {
    /// Create a new muxer config starting at sequence number 0.
    pub fn new(serial: u32) -> Self {
        Self {
            serial,
            initial_sequence: 0,
        }
    }

    /// Set the sequence number of the first page.
    pub fn with_initial_sequence(mut self, sequence: u32) -> Self {
        self.initial_sequence = sequence;
        self
    }
}

/// Demuxer configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemuxerConfig {
    /// Serial number to accept. `None` locks onto the first page seen.
    pub serial: Option<u32>,
    /// Treat page sequence gaps as errors instead of dropping the
    /// partial packet and continuing.
    pub strict_sequence: bool,
    /// Skip forward to the next capture pattern on framing or checksum
    /// errors instead of reporting them.
    pub resync: bool,
}

impl DemuxerConfig {
    /// Create a demuxer config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept pages with this serial number.
    pub fn with_serial(mut self, serial: u32) -> Self {
        self.serial = Some(serial);
        self
    }

    /// Report sequence gaps as [`Error::SequenceGap`](crate::Error::SequenceGap).
    pub fn with_strict_sequence(mut self, strict: bool) -> Self {
        self.strict_sequence = strict;
        self
    }

    /// Enable resynchronisation after corrupt input.
    pub fn with_resync(mut self, resync: bool) -> Self {
        self.resync = resync;
        self
    }
}
