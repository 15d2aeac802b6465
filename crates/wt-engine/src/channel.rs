//! Per-channel effect state.

use core::f32::consts::TAU;

use wt_ir::MAX_VOLUME;

use crate::frequency::{
    clamp_frequency, note_to_frequency, shift_semitones, slide_factor, TONE_PORTA_HZ_PER_UNIT,
};

/// Positions per vibrato/tremolo cycle.
const WAVE_STEPS: u8 = 64;

/// Vibrato depth unit in semitones.
const VIBRATO_SEMITONES_PER_UNIT: f32 = 0.01;

fn sine_at(pos: u8) -> f32 {
    libm::sinf(pos as f32 / WAVE_STEPS as f32 * TAU)
}

fn advance(pos: u8, speed: u8) -> u8 {
    ((pos as u16 + speed as u16) % WAVE_STEPS as u16) as u8
}

/// Effect state for a single channel.
///
/// `frequency` is the continuous pitch that slides act on; arpeggio and
/// vibrato push offsets from it without changing it. Likewise tremolo never
/// changes `volume`.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelState {
    /// Last note triggered on this channel
    pub note: Option<u8>,
    /// Current base frequency in Hz (0 until a note is triggered)
    pub frequency: f32,
    /// Current volume (0-64)
    pub volume: u8,
    /// Is a note sounding on this channel?
    pub sounding: bool,

    // Arpeggio
    pub arpeggio_x: u8,
    pub arpeggio_y: u8,
    /// Arpeggio step last pushed (0 = base note)
    pub arpeggio_tick: u8,

    // Pitch slides
    /// Shared memory for porta up/down and tone portamento
    pub slide_speed: u8,
    /// Tone portamento target frequency
    pub porta_target: Option<f32>,

    // Effect memory for the oscillating effects
    pub vibrato_pos: u8,
    pub vibrato_speed: u8,
    pub vibrato_depth: u8,
    pub tremolo_pos: u8,
    pub tremolo_speed: u8,
    pub tremolo_depth: u8,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            note: None,
            frequency: 0.0,
            volume: MAX_VOLUME,
            sounding: false,
            arpeggio_x: 0,
            arpeggio_y: 0,
            arpeggio_tick: 0,
            slide_speed: 0,
            porta_target: None,
            vibrato_pos: 0,
            vibrato_speed: 0,
            vibrato_depth: 0,
            tremolo_pos: 0,
            tremolo_speed: 0,
            tremolo_depth: 0,
        }
    }
}

impl ChannelState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh note: pitch jumps to the note, oscillators restart.
    pub fn trigger_note(&mut self, note: u8) {
        self.note = Some(note);
        self.frequency = note_to_frequency(note);
        self.sounding = true;
        self.porta_target = None;
        self.arpeggio_tick = 0;
        self.vibrato_pos = 0;
        self.tremolo_pos = 0;
    }

    /// Make `note` the tone portamento target.
    ///
    /// A silent channel has nothing to glide from, so it starts on the
    /// target directly.
    pub fn set_porta_target(&mut self, note: u8) {
        let target = note_to_frequency(note);
        self.note = Some(note);
        if !self.sounding {
            self.frequency = target;
            self.sounding = true;
        }
        self.porta_target = Some(target);
    }

    /// Store a slide speed; zero keeps the previous one.
    pub fn remember_slide(&mut self, speed: u8) {
        if speed > 0 {
            self.slide_speed = speed;
        }
    }

    pub fn remember_vibrato(&mut self, speed: u8, depth: u8) {
        if speed > 0 {
            self.vibrato_speed = speed;
        }
        if depth > 0 {
            self.vibrato_depth = depth;
        }
    }

    pub fn remember_tremolo(&mut self, speed: u8, depth: u8) {
        if speed > 0 {
            self.tremolo_speed = speed;
        }
        if depth > 0 {
            self.tremolo_depth = depth;
        }
    }

    pub fn set_arpeggio(&mut self, x: u8, y: u8) {
        self.arpeggio_x = x;
        self.arpeggio_y = y;
        self.arpeggio_tick = 0;
    }

    /// Frequency for an arpeggio tick: base, base+x, base+y.
    pub fn arpeggio_frequency(&mut self, tick: u8) -> f32 {
        self.arpeggio_tick = tick % 3;
        let semitones = match self.arpeggio_tick {
            0 => 0,
            1 => self.arpeggio_x,
            _ => self.arpeggio_y,
        };
        shift_semitones(self.frequency, semitones as f32)
    }

    /// Exponential slide up by the remembered speed.
    pub fn slide_up(&mut self) -> f32 {
        self.frequency = clamp_frequency(self.frequency * slide_factor(self.slide_speed));
        self.frequency
    }

    /// Exponential slide down by the remembered speed.
    pub fn slide_down(&mut self) -> f32 {
        self.frequency = clamp_frequency(self.frequency / slide_factor(self.slide_speed));
        self.frequency
    }

    /// Linear glide toward the porta target; `None` without a target.
    pub fn tone_porta_step(&mut self) -> Option<f32> {
        let target = self.porta_target?;
        let step = self.slide_speed as f32 * TONE_PORTA_HZ_PER_UNIT;
        let distance = target - self.frequency;
        if distance.abs() <= step {
            self.frequency = target;
        } else if distance > 0.0 {
            self.frequency += step;
        } else {
            self.frequency -= step;
        }
        Some(self.frequency)
    }

    /// Vibrato frequency for the current position, then advance it.
    pub fn vibrato_step(&mut self) -> f32 {
        let offset = sine_at(self.vibrato_pos)
            * self.vibrato_depth as f32
            * VIBRATO_SEMITONES_PER_UNIT;
        self.vibrato_pos = advance(self.vibrato_pos, self.vibrato_speed);
        shift_semitones(self.frequency, offset)
    }

    /// Normalized tremolo level for the current position, then advance it.
    pub fn tremolo_level(&mut self) -> f32 {
        let swing = sine_at(self.tremolo_pos) * self.tremolo_depth as f32;
        self.tremolo_pos = advance(self.tremolo_pos, self.tremolo_speed);
        (self.volume as f32 + swing).clamp(0.0, MAX_VOLUME as f32) / MAX_VOLUME as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_channel_is_silent_at_full_volume() {
        let ch = ChannelState::new();
        assert!(!ch.sounding);
        assert_eq!(ch.volume, 64);
        assert_eq!(ch.note, None);
    }

    #[test]
    fn trigger_resets_oscillators() {
        let mut ch = ChannelState::new();
        ch.vibrato_pos = 17;
        ch.tremolo_pos = 9;
        ch.porta_target = Some(1000.0);
        ch.trigger_note(69);
        assert_eq!(ch.frequency, 440.0);
        assert_eq!(ch.vibrato_pos, 0);
        assert_eq!(ch.tremolo_pos, 0);
        assert_eq!(ch.porta_target, None);
    }

    #[test]
    fn porta_target_on_sounding_channel_keeps_pitch() {
        let mut ch = ChannelState::new();
        ch.trigger_note(69);
        ch.set_porta_target(81);
        assert_eq!(ch.frequency, 440.0);
        assert_eq!(ch.note, Some(81));
        assert!(ch.porta_target.is_some());
    }

    #[test]
    fn porta_target_on_silent_channel_starts_there() {
        let mut ch = ChannelState::new();
        ch.set_porta_target(69);
        assert_eq!(ch.frequency, 440.0);
        assert!(ch.sounding);
    }

    #[test]
    fn zero_slide_speed_is_remembered_not_stored() {
        let mut ch = ChannelState::new();
        ch.remember_slide(5);
        ch.remember_slide(0);
        assert_eq!(ch.slide_speed, 5);
    }

    #[test]
    fn vibrato_memory_is_per_nibble() {
        let mut ch = ChannelState::new();
        ch.remember_vibrato(8, 4);
        ch.remember_vibrato(0, 6);
        assert_eq!((ch.vibrato_speed, ch.vibrato_depth), (8, 6));
        ch.remember_vibrato(3, 0);
        assert_eq!((ch.vibrato_speed, ch.vibrato_depth), (3, 6));
    }

    #[test]
    fn vibrato_position_wraps() {
        let mut ch = ChannelState::new();
        ch.trigger_note(69);
        ch.remember_vibrato(15, 8);
        for _ in 0..5 {
            ch.vibrato_step();
        }
        assert_eq!(ch.vibrato_pos, 75 % 64);
    }

    #[test]
    fn vibrato_first_step_is_unshifted() {
        let mut ch = ChannelState::new();
        ch.trigger_note(69);
        ch.remember_vibrato(4, 15);
        assert_eq!(ch.vibrato_step(), 440.0);
        assert!(ch.vibrato_step() > 440.0);
        assert_eq!(ch.frequency, 440.0);
    }

    #[test]
    fn tremolo_level_is_clamped_and_keeps_volume() {
        let mut ch = ChannelState::new();
        ch.volume = 60;
        ch.remember_tremolo(16, 15);
        let levels: [f32; 4] = core::array::from_fn(|_| ch.tremolo_level());
        // positions 0, 16, 32, 48: sin = 0, 1, 0, -1
        assert_eq!(levels[0], 60.0 / 64.0);
        assert_eq!(levels[1], 1.0);
        assert!((levels[3] - 45.0 / 64.0).abs() < 1e-4);
        assert_eq!(ch.volume, 60);
    }

    #[test]
    fn slide_clamps_to_audible_range() {
        let mut ch = ChannelState::new();
        ch.trigger_note(127);
        ch.remember_slide(255);
        for _ in 0..100 {
            ch.slide_up();
        }
        assert_eq!(ch.frequency, 20000.0);
        ch.trigger_note(0);
        for _ in 0..100 {
            ch.slide_down();
        }
        assert_eq!(ch.frequency, 20.0);
    }

    #[test]
    fn tone_porta_without_target_does_nothing() {
        let mut ch = ChannelState::new();
        ch.trigger_note(60);
        ch.remember_slide(10);
        assert_eq!(ch.tone_porta_step(), None);
    }
}
