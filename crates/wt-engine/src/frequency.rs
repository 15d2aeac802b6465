//! Note-to-frequency conversion and pitch-slide math.
//!
//! Equal temperament around A-4 = note 69 = 440 Hz. Slides work on Hz
//! directly; porta up/down are exponential (768 speed units per octave),
//! tone portamento is linear.

/// Lowest frequency a slide may reach.
pub const FREQ_MIN: f32 = 20.0;

/// Highest frequency a slide may reach.
pub const FREQ_MAX: f32 = 20000.0;

/// Note number of the tuning reference (A-4).
const REFERENCE_NOTE: i16 = 69;

/// Frequency of the tuning reference in Hz.
const REFERENCE_FREQ: f32 = 440.0;

/// Porta up/down speed units per octave.
const SLIDE_UNITS_PER_OCTAVE: f32 = 768.0;

/// Tone portamento moves this many Hz per tick per speed unit.
pub const TONE_PORTA_HZ_PER_UNIT: f32 = 0.5;

/// Convert a note number (0-127, 60 = C-4) to Hz.
pub fn note_to_frequency(note: u8) -> f32 {
    let semitones = (note as i16 - REFERENCE_NOTE) as f32;
    REFERENCE_FREQ * libm::powf(2.0, semitones / 12.0)
}

/// Shift a frequency by a (possibly fractional) number of semitones.
pub fn shift_semitones(hz: f32, semitones: f32) -> f32 {
    hz * libm::powf(2.0, semitones / 12.0)
}

/// Per-tick multiplier for porta up/down at the given speed.
pub fn slide_factor(speed: u8) -> f32 {
    libm::powf(2.0, speed as f32 / SLIDE_UNITS_PER_OCTAVE)
}

/// Clamp a frequency to the slide range.
pub fn clamp_frequency(hz: f32) -> f32 {
    hz.clamp(FREQ_MIN, FREQ_MAX)
}
