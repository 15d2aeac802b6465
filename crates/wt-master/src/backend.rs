//! Backends and clocks for running the engine on a host.

use std::time::Instant;

use wt_engine::{AudioBackend, Clock};
use wt_ir::Instrument;

/// Wall-clock time in milliseconds since creation.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// Backend that reports every call through `tracing` and keeps counters.
///
/// Used for headless playback where no synthesizer is attached.
#[derive(Clone, Debug, Default)]
pub struct TraceBackend {
    /// Notes started
    pub notes_played: u64,
    /// Frequency and volume updates received
    pub updates: u64,
}

impl TraceBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioBackend for TraceBackend {
    fn play_note(&mut self, channel: u8, note: u8, instrument: &Instrument, volume: u8) {
        self.notes_played += 1;
        tracing::info!(channel, note, volume, instrument = %instrument.name, "note on");
    }

    fn stop_note(&mut self, channel: u8) {
        tracing::debug!(channel, "note off");
    }

    fn stop_all(&mut self) {
        tracing::debug!("all notes off");
    }

    fn set_channel_frequency(&mut self, channel: u8, hz: f32) {
        self.updates += 1;
        tracing::trace!(channel, hz, "frequency");
    }

    fn set_channel_volume(&mut self, channel: u8, level: f32) {
        self.updates += 1;
        tracing::trace!(channel, level, "volume");
    }
}
