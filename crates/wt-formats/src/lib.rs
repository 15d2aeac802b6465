//! Song document format for the wavetrak tracker.
//!
//! Songs are stored as JSON. See [`SongDoc`] for the layout.

mod document;
pub mod effect_parser;

use thiserror::Error;
use wt_ir::SongError;

pub use document::{
    load_song, load_song_slice, save_song, CellDoc, EnvelopeDoc, FilterDoc, FmDoc, InstrumentDoc,
    KarplusDoc, LfoDoc, PatternDoc, SongDoc,
};
pub use effect_parser::{encode_effect, parse_effect};

/// Error type for song documents.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Malformed JSON or a missing/mistyped field
    #[error("invalid song document: {0}")]
    Json(#[from] serde_json::Error),
    /// The document parsed but does not describe a valid song
    #[error("invalid song: {0}")]
    Song(#[from] SongError),
    #[error("pattern {pattern} has an invalid size ({rows} rows, {channels} channels)")]
    PatternSize { pattern: usize, rows: u16, channels: u8 },
    #[error("pattern {pattern} declares {expected} rows but holds {found}")]
    RowCount { pattern: usize, expected: u16, found: usize },
    #[error("pattern {pattern} row {row} has {found} cells, expected {expected}")]
    CellCount { pattern: usize, row: usize, expected: u8, found: usize },
    #[error("pattern {pattern} row {row} channel {channel}: note {note} is out of range")]
    InvalidNote { pattern: usize, row: usize, channel: usize, note: u16 },
    #[error("unknown {field} \"{value}\"")]
    UnknownName { field: &'static str, value: String },
}
