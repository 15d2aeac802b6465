//! Pattern and cell types for tracker sequences.

use alloc::vec::Vec;
use crate::effects::Effect;

/// Highest note number a cell can hold (MIDI range, 60 = C-4).
pub const MAX_NOTE: u8 = 127;
/// Highest cell volume.
pub const MAX_VOLUME: u8 = 64;
/// Volume used when a note is triggered from a cell without a volume.
pub const DEFAULT_NOTE_VOLUME: u8 = 48;
/// Largest allowed pattern length.
pub const MAX_ROWS: u16 = 256;
/// Default pattern length.
pub const DEFAULT_ROWS: u16 = 64;

/// A single cell in a pattern.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    /// Note number (0-127), or `None` for an empty note column
    pub note: Option<u8>,
    /// Instrument index, or `None` for the default instrument
    pub instrument: Option<u8>,
    /// Volume (0-64), or `None` to keep the channel's volume
    pub volume: Option<u8>,
    /// Effect column command
    pub effect: Effect,
}

impl Cell {
    /// Create an empty cell.
    pub const fn empty() -> Self {
        Self {
            note: None,
            instrument: None,
            volume: None,
            effect: Effect::None,
        }
    }

    /// Create a cell holding a note.
    pub fn with_note(note: u8, instrument: u8, volume: u8) -> Self {
        Self {
            note: Some(note.min(MAX_NOTE)),
            instrument: Some(instrument),
            volume: Some(volume.min(MAX_VOLUME)),
            effect: Effect::None,
        }
    }

    /// Builder-style effect assignment.
    pub fn effect(mut self, effect: Effect) -> Self {
        self.effect = effect;
        self
    }

    /// Returns true if the cell is completely empty.
    pub fn is_empty(&self) -> bool {
        self.note.is_none()
            && self.instrument.is_none()
            && self.volume.is_none()
            && self.effect == Effect::None
    }
}

/// A pattern containing rows of cells across channels.
#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    rows: u16,
    channels: u8,
    /// Pattern data, stored row-major: data[row * channels + channel]
    data: Vec<Cell>,
}

impl Pattern {
    /// Create a new pattern with empty cells.
    ///
    /// `rows` is clamped to `1..=MAX_ROWS` and `channels` to at least 1.
    pub fn new(rows: u16, channels: u8) -> Self {
        let rows = rows.clamp(1, MAX_ROWS);
        let channels = channels.max(1);
        Self {
            rows,
            channels,
            data: alloc::vec![Cell::empty(); rows as usize * channels as usize],
        }
    }

    /// Build a pattern from row-major cell data.
    ///
    /// Returns `None` if the dimensions are out of range or the data does not
    /// fill the grid exactly.
    pub fn from_cells(rows: u16, channels: u8, data: Vec<Cell>) -> Option<Self> {
        if rows == 0 || rows > MAX_ROWS || channels == 0 {
            return None;
        }
        if data.len() != rows as usize * channels as usize {
            return None;
        }
        Some(Self { rows, channels, data })
    }

    /// Number of rows.
    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Number of channels.
    pub fn channels(&self) -> u8 {
        self.channels
    }

    fn index(&self, row: u16, channel: u8) -> Option<usize> {
        if row < self.rows && channel < self.channels {
            Some(row as usize * self.channels as usize + channel as usize)
        } else {
            None
        }
    }

    /// Get a reference to a cell.
    pub fn cell(&self, row: u16, channel: u8) -> Option<&Cell> {
        self.index(row, channel).map(|i| &self.data[i])
    }

    /// Get a mutable reference to a cell.
    pub fn cell_mut(&mut self, row: u16, channel: u8) -> Option<&mut Cell> {
        self.index(row, channel).map(|i| &mut self.data[i])
    }

    /// All cells in a row.
    pub fn row(&self, row: u16) -> Option<&[Cell]> {
        if row >= self.rows {
            return None;
        }
        let start = row as usize * self.channels as usize;
        Some(&self.data[start..start + self.channels as usize])
    }

    /// Iterate over rows as channel slices.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.data.chunks(self.channels as usize)
    }

    /// Replace a cell. Out-of-range positions are ignored.
    pub fn set_cell(&mut self, row: u16, channel: u8, cell: Cell) -> bool {
        match self.cell_mut(row, channel) {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    /// Write a note into a cell, keeping its effect column.
    pub fn set_note(&mut self, row: u16, channel: u8, note: u8, instrument: u8, volume: u8) {
        if let Some(cell) = self.cell_mut(row, channel) {
            cell.note = Some(note.min(MAX_NOTE));
            cell.instrument = Some(instrument);
            cell.volume = Some(volume.min(MAX_VOLUME));
        }
    }

    /// Reset a cell to empty.
    pub fn clear_cell(&mut self, row: u16, channel: u8) {
        self.set_cell(row, channel, Cell::empty());
    }

    /// Reset every cell to empty.
    pub fn clear(&mut self) {
        self.data.fill(Cell::empty());
    }

    /// Change the number of rows, keeping existing cells.
    ///
    /// New rows are empty; rows past the new length are dropped.
    pub fn resize(&mut self, rows: u16) {
        let rows = rows.clamp(1, MAX_ROWS);
        self.data
            .resize(rows as usize * self.channels as usize, Cell::empty());
        self.rows = rows;
    }
}
