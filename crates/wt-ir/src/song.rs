//! Song structure and sequencing types.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use thiserror::Error;

use crate::instrument::Instrument;
use crate::pattern::{Cell, Pattern, DEFAULT_ROWS};

/// Slowest allowed tempo.
pub const MIN_BPM: u8 = 32;
/// Fastest allowed tempo.
pub const MAX_BPM: u8 = 255;
/// Fewest ticks per row.
pub const MIN_SPEED: u8 = 1;
/// Most ticks per row.
pub const MAX_SPEED: u8 = 31;
pub const DEFAULT_BPM: u8 = 125;
pub const DEFAULT_SPEED: u8 = 6;
pub const DEFAULT_CHANNELS: u8 = 4;
/// Upper bound on the channel count of a song.
pub const MAX_CHANNELS: u8 = 32;
/// Upper bound on the number of patterns (order entries are `u8`).
pub const MAX_PATTERNS: usize = 256;

/// Duration of one tick in milliseconds at the given tempo.
///
/// FastTracker 2 timing: a tick lasts 2500 / BPM ms regardless of speed.
/// Tempos below `MIN_BPM` are treated as `MIN_BPM`.
pub fn tick_interval_ms(bpm: u8) -> f64 {
    2500.0 / f64::from(bpm.max(MIN_BPM))
}

/// Structural problems found when assembling a song.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SongError {
    #[error("channel count {0} is outside 1..={max}", max = MAX_CHANNELS)]
    InvalidChannelCount(u8),
    #[error("song has no instruments")]
    NoInstruments,
    #[error("song has no patterns")]
    NoPatterns,
    #[error("song has {0} patterns, at most {max} are allowed", max = MAX_PATTERNS)]
    TooManyPatterns(usize),
    #[error("pattern {pattern} has {found} channels, song has {expected}")]
    ChannelMismatch { pattern: usize, expected: u8, found: u8 },
    #[error("order list is empty")]
    EmptyOrder,
    #[error("order position {position} refers to missing pattern {pattern}")]
    InvalidOrderEntry { position: usize, pattern: u8 },
}

/// Raw song contents, validated by [`Song::from_parts`].
#[derive(Clone, Debug)]
pub struct SongParts {
    pub title: String,
    pub author: String,
    pub bpm: u16,
    pub speed: u8,
    pub channels: u8,
    pub instruments: Vec<Instrument>,
    pub patterns: Vec<Pattern>,
    pub order: Vec<u8>,
}

/// A complete song.
///
/// Invariants: at least one instrument, at least one pattern, every pattern
/// has `channels` channels, the order list is non-empty and every entry is a
/// valid pattern index.
#[derive(Clone, Debug, PartialEq)]
pub struct Song {
    /// Song title
    pub title: String,
    /// Song author
    pub author: String,
    bpm: u8,
    speed: u8,
    channels: u8,
    instruments: Vec<Instrument>,
    patterns: Vec<Pattern>,
    order: Vec<u8>,
}

impl Default for Song {
    fn default() -> Self {
        Self::new("Untitled", "Unknown")
    }
}

impl Song {
    /// Create a new song with default tempo, four channels, the standard
    /// instrument presets and a single empty 64-row pattern.
    pub fn new(title: &str, author: &str) -> Self {
        Self::with_channels(title, author, DEFAULT_CHANNELS)
    }

    /// Create a default song with a given number of channels.
    pub fn with_channels(title: &str, author: &str, channels: u8) -> Self {
        let channels = channels.clamp(1, MAX_CHANNELS);
        Self {
            title: String::from(title),
            author: String::from(author),
            bpm: DEFAULT_BPM,
            speed: DEFAULT_SPEED,
            channels,
            instruments: vec![
                Instrument::square_50(),
                Instrument::square_25(),
                Instrument::triangle(),
                Instrument::sawtooth(),
            ],
            patterns: vec![Pattern::new(DEFAULT_ROWS, channels)],
            order: vec![0],
        }
    }

    /// Assemble a song from parts, checking its structural invariants.
    ///
    /// Tempo and speed are clamped into range rather than rejected.
    pub fn from_parts(parts: SongParts) -> Result<Self, SongError> {
        if parts.channels == 0 || parts.channels > MAX_CHANNELS {
            return Err(SongError::InvalidChannelCount(parts.channels));
        }
        if parts.instruments.is_empty() {
            return Err(SongError::NoInstruments);
        }
        if parts.patterns.is_empty() {
            return Err(SongError::NoPatterns);
        }
        if parts.patterns.len() > MAX_PATTERNS {
            return Err(SongError::TooManyPatterns(parts.patterns.len()));
        }
        for (i, pattern) in parts.patterns.iter().enumerate() {
            if pattern.channels() != parts.channels {
                return Err(SongError::ChannelMismatch {
                    pattern: i,
                    expected: parts.channels,
                    found: pattern.channels(),
                });
            }
        }
        if parts.order.is_empty() {
            return Err(SongError::EmptyOrder);
        }
        if let Some((position, &pattern)) = parts
            .order
            .iter()
            .enumerate()
            .find(|&(_, &p)| p as usize >= parts.patterns.len())
        {
            return Err(SongError::InvalidOrderEntry { position, pattern });
        }

        Ok(Self {
            title: parts.title,
            author: parts.author,
            bpm: clamp_bpm(parts.bpm),
            speed: parts.speed.clamp(MIN_SPEED, MAX_SPEED),
            channels: parts.channels,
            instruments: parts.instruments,
            patterns: parts.patterns,
            order: parts.order,
        })
    }

    // --- Timing ---

    pub fn bpm(&self) -> u8 {
        self.bpm
    }

    /// Set the tempo, clamped to `MIN_BPM..=MAX_BPM`. Returns the applied value.
    pub fn set_bpm(&mut self, bpm: u16) -> u8 {
        self.bpm = clamp_bpm(bpm);
        self.bpm
    }

    /// Ticks per row.
    pub fn speed(&self) -> u8 {
        self.speed
    }

    /// Set ticks per row, clamped to `MIN_SPEED..=MAX_SPEED`. Returns the applied value.
    pub fn set_speed(&mut self, speed: u8) -> u8 {
        self.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        self.speed
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Playback length of one pass through the order list, in seconds.
    ///
    /// Uses the current tempo and speed; speed/tempo effects inside the
    /// patterns are not taken into account.
    pub fn duration_secs(&self) -> f64 {
        let rows: u64 = self
            .order
            .iter()
            .map(|&p| self.pattern(p).map_or(DEFAULT_ROWS, Pattern::rows) as u64)
            .sum();
        rows as f64 * f64::from(self.speed) * tick_interval_ms(self.bpm) / 1000.0
    }

    // --- Instruments ---

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    /// Look up an instrument, falling back to instrument 0 for missing or
    /// out-of-range indices.
    pub fn instrument(&self, index: Option<u8>) -> &Instrument {
        index
            .and_then(|i| self.instruments.get(i as usize))
            .unwrap_or(&self.instruments[0])
    }

    pub fn instrument_mut(&mut self, index: u8) -> Option<&mut Instrument> {
        self.instruments.get_mut(index as usize)
    }

    /// Append an instrument, returning its index. `None` once 256 exist.
    pub fn add_instrument(&mut self, instrument: Instrument) -> Option<u8> {
        let index = u8::try_from(self.instruments.len()).ok()?;
        self.instruments.push(instrument);
        Some(index)
    }

    // --- Patterns ---

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn pattern(&self, index: u8) -> Option<&Pattern> {
        self.patterns.get(index as usize)
    }

    pub fn pattern_mut(&mut self, index: u8) -> Option<&mut Pattern> {
        self.patterns.get_mut(index as usize)
    }

    /// Append an empty pattern, returning its index.
    pub fn add_pattern(&mut self, rows: u16) -> Option<u8> {
        self.push_pattern(Pattern::new(rows, self.channels))
    }

    /// Append a copy of an existing pattern, returning the copy's index.
    pub fn clone_pattern(&mut self, index: u8) -> Option<u8> {
        let copy = self.pattern(index)?.clone();
        self.push_pattern(copy)
    }

    fn push_pattern(&mut self, pattern: Pattern) -> Option<u8> {
        if self.patterns.len() >= MAX_PATTERNS {
            return None;
        }
        self.patterns.push(pattern);
        Some((self.patterns.len() - 1) as u8)
    }

    /// Remove a pattern that the order list no longer uses.
    ///
    /// Refused for the last remaining pattern and for patterns still in the
    /// order list. Order entries pointing past the removed pattern are
    /// renumbered.
    pub fn delete_pattern(&mut self, index: u8) -> bool {
        if self.patterns.len() <= 1
            || index as usize >= self.patterns.len()
            || self.order.contains(&index)
        {
            return false;
        }
        self.patterns.remove(index as usize);
        for entry in &mut self.order {
            if *entry > index {
                *entry -= 1;
            }
        }
        true
    }

    // --- Order list ---

    pub fn order(&self) -> &[u8] {
        &self.order
    }

    /// Pattern played at an order position.
    pub fn pattern_at_order(&self, position: usize) -> Option<&Pattern> {
        let index = *self.order.get(position)?;
        self.pattern(index)
    }

    /// Cell at an order position, row and channel.
    pub fn cell_at(&self, position: usize, row: u16, channel: u8) -> Option<&Cell> {
        self.pattern_at_order(position)?.cell(row, channel)
    }

    /// Append a pattern to the order list.
    pub fn add_to_order(&mut self, pattern: u8) -> bool {
        self.insert_order(self.order.len(), pattern)
    }

    /// Insert a pattern into the order list at `position`.
    pub fn insert_order(&mut self, position: usize, pattern: u8) -> bool {
        if pattern as usize >= self.patterns.len() || position > self.order.len() {
            return false;
        }
        self.order.insert(position, pattern);
        true
    }

    /// Remove an order entry; the last entry cannot be removed.
    pub fn remove_order(&mut self, position: usize) -> bool {
        if self.order.len() <= 1 || position >= self.order.len() {
            return false;
        }
        self.order.remove(position);
        true
    }

    /// Point an existing order entry at another pattern.
    pub fn set_order_entry(&mut self, position: usize, pattern: u8) -> bool {
        if pattern as usize >= self.patterns.len() {
            return false;
        }
        match self.order.get_mut(position) {
            Some(entry) => {
                *entry = pattern;
                true
            }
            None => false,
        }
    }
}

fn clamp_bpm(bpm: u16) -> u8 {
    bpm.clamp(MIN_BPM as u16, MAX_BPM as u16) as u8
}
