//! Audio backend interface.
//!
//! The engine never synthesizes audio itself. Everything it wants heard goes
//! through [`AudioBackend`]; the backend owns oscillators, envelopes and
//! output devices.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use wt_ir::Instrument;

/// Sink for the sequencer's audible side effects.
///
/// Channel indices are always below the song's channel count.
pub trait AudioBackend {
    /// Start a note on a channel. `volume` is a cell volume (0-64).
    fn play_note(&mut self, channel: u8, note: u8, instrument: &Instrument, volume: u8);

    /// Release whatever is sounding on a channel.
    fn stop_note(&mut self, channel: u8);

    /// Silence every channel.
    fn stop_all(&mut self);

    /// Retune the sounding note on a channel.
    fn set_channel_frequency(&mut self, channel: u8, hz: f32);

    /// Set a channel's level, normalized to 0-1.
    fn set_channel_volume(&mut self, channel: u8, level: f32);
}

impl<T: AudioBackend + ?Sized> AudioBackend for Box<T> {
    fn play_note(&mut self, channel: u8, note: u8, instrument: &Instrument, volume: u8) {
        (**self).play_note(channel, note, instrument, volume)
    }

    fn stop_note(&mut self, channel: u8) {
        (**self).stop_note(channel)
    }

    fn stop_all(&mut self) {
        (**self).stop_all()
    }

    fn set_channel_frequency(&mut self, channel: u8, hz: f32) {
        (**self).set_channel_frequency(channel, hz)
    }

    fn set_channel_volume(&mut self, channel: u8, level: f32) {
        (**self).set_channel_volume(channel, level)
    }
}

/// Backend that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullBackend;

impl AudioBackend for NullBackend {
    fn play_note(&mut self, _channel: u8, _note: u8, _instrument: &Instrument, _volume: u8) {}
    fn stop_note(&mut self, _channel: u8) {}
    fn stop_all(&mut self) {}
    fn set_channel_frequency(&mut self, _channel: u8, _hz: f32) {}
    fn set_channel_volume(&mut self, _channel: u8, _level: f32) {}
}

/// One call received by a [`RecordingBackend`].
#[derive(Clone, Debug, PartialEq)]
pub enum AudioCall {
    PlayNote {
        channel: u8,
        note: u8,
        instrument: String,
        volume: u8,
    },
    StopNote(u8),
    StopAll,
    Frequency { channel: u8, hz: f32 },
    Volume { channel: u8, level: f32 },
}

/// Backend that records every call, for tests and offline inspection.
#[derive(Clone, Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<AudioCall>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all recorded calls.
    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Frequencies pushed to one channel, in order.
    pub fn frequencies(&self, channel: u8) -> Vec<f32> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                AudioCall::Frequency { channel: c, hz } if *c == channel => Some(*hz),
                _ => None,
            })
            .collect()
    }

    /// Volume levels pushed to one channel, in order.
    pub fn volumes(&self, channel: u8) -> Vec<f32> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                AudioCall::Volume { channel: c, level } if *c == channel => Some(*level),
                _ => None,
            })
            .collect()
    }

    /// Notes started on one channel, in order.
    pub fn notes(&self, channel: u8) -> Vec<u8> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                AudioCall::PlayNote { channel: c, note, .. } if *c == channel => Some(*note),
                _ => None,
            })
            .collect()
    }

    /// Number of `stop_all` calls received.
    pub fn stop_all_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, AudioCall::StopAll))
            .count()
    }
}

impl AudioBackend for RecordingBackend {
    fn play_note(&mut self, channel: u8, note: u8, instrument: &Instrument, volume: u8) {
        self.calls.push(AudioCall::PlayNote {
            channel,
            note,
            instrument: instrument.name.clone(),
            volume,
        });
    }

    fn stop_note(&mut self, channel: u8) {
        self.calls.push(AudioCall::StopNote(channel));
    }

    fn stop_all(&mut self) {
        self.calls.push(AudioCall::StopAll);
    }

    fn set_channel_frequency(&mut self, channel: u8, hz: f32) {
        self.calls.push(AudioCall::Frequency { channel, hz });
    }

    fn set_channel_volume(&mut self, channel: u8, level: f32) {
        self.calls.push(AudioCall::Volume { channel, level });
    }
}
