//! Playback engine for the wavetrak tracker.
//!
//! The [`Sequencer`] walks a song's order list on a tick clock and hands
//! notes and effects to the [`EffectProcessor`] and an [`AudioBackend`].

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod backend;
mod channel;
mod clock;
mod effect_processor;
pub mod frequency;
mod sequencer;

pub use backend::{AudioBackend, AudioCall, NullBackend, RecordingBackend};
pub use channel::ChannelState;
pub use clock::{Clock, ManualClock};
pub use effect_processor::EffectProcessor;
pub use frequency::note_to_frequency;
pub use sequencer::{PlaybackPosition, PositionListener, Sequencer, TransportState};
