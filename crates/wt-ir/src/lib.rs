//! Core song types for the wavetrak sequencer.
//!
//! This crate defines the data model shared by the playback engine, the
//! song document format and the editor: instruments, cells, patterns and
//! songs with their order list.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod effects;
mod instrument;
mod pattern;
pub mod song;

pub use effects::Effect;
pub use instrument::{Adsr, Filter, FilterKind, Fm, Instrument, Karplus, Lfo, LfoShape, LfoTarget, Waveform};
pub use pattern::{Cell, Pattern, DEFAULT_NOTE_VOLUME, DEFAULT_ROWS, MAX_NOTE, MAX_ROWS, MAX_VOLUME};
pub use song::{
    tick_interval_ms, Song, SongError, SongParts, DEFAULT_BPM, DEFAULT_CHANNELS, DEFAULT_SPEED,
    MAX_BPM, MAX_CHANNELS, MAX_PATTERNS, MAX_SPEED, MIN_BPM, MIN_SPEED,
};
