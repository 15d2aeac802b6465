//! Instrument definitions.
//!
//! The sequencer never interprets these fields; it hands the instrument to
//! the audio backend together with each note.

use alloc::string::String;

/// Oscillator shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Waveform {
    #[default]
    Pulse,
    Triangle,
    Sawtooth,
    Noise,
}

impl Waveform {
    pub fn name(self) -> &'static str {
        match self {
            Waveform::Pulse => "pulse",
            Waveform::Triangle => "triangle",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Noise => "noise",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pulse" => Some(Waveform::Pulse),
            "triangle" => Some(Waveform::Triangle),
            "sawtooth" => Some(Waveform::Sawtooth),
            "noise" => Some(Waveform::Noise),
            _ => None,
        }
    }
}

/// ADSR envelope. Times in seconds, sustain as a level (0-1).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Adsr {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for Adsr {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.05,
            sustain: 0.7,
            release: 0.05,
        }
    }
}

/// State-variable filter mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterKind {
    #[default]
    Lowpass,
    Highpass,
    Bandpass,
    Notch,
}

impl FilterKind {
    pub fn name(self) -> &'static str {
        match self {
            FilterKind::Lowpass => "lowpass",
            FilterKind::Highpass => "highpass",
            FilterKind::Bandpass => "bandpass",
            FilterKind::Notch => "notch",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "lowpass" => Some(FilterKind::Lowpass),
            "highpass" => Some(FilterKind::Highpass),
            "bandpass" => Some(FilterKind::Bandpass),
            "notch" => Some(FilterKind::Notch),
            _ => None,
        }
    }
}

/// Filter settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Filter {
    pub enabled: bool,
    pub kind: FilterKind,
    /// Cutoff in Hz (20-20000)
    pub cutoff: f32,
    /// Q factor (0.1-20)
    pub resonance: f32,
    /// Envelope modulation amount (0-1)
    pub envelope: f32,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            enabled: false,
            kind: FilterKind::Lowpass,
            cutoff: 2000.0,
            resonance: 1.0,
            envelope: 0.0,
        }
    }
}

/// What an LFO modulates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LfoTarget {
    #[default]
    Pitch,
    Filter,
    Volume,
    PulseWidth,
}

impl LfoTarget {
    pub fn name(self) -> &'static str {
        match self {
            LfoTarget::Pitch => "pitch",
            LfoTarget::Filter => "filter",
            LfoTarget::Volume => "volume",
            LfoTarget::PulseWidth => "pwm",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pitch" => Some(LfoTarget::Pitch),
            "filter" => Some(LfoTarget::Filter),
            "volume" => Some(LfoTarget::Volume),
            "pwm" => Some(LfoTarget::PulseWidth),
            _ => None,
        }
    }
}

/// LFO shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LfoShape {
    #[default]
    Sine,
    Triangle,
    Square,
    Sawtooth,
}

impl LfoShape {
    pub fn name(self) -> &'static str {
        match self {
            LfoShape::Sine => "sine",
            LfoShape::Triangle => "triangle",
            LfoShape::Square => "square",
            LfoShape::Sawtooth => "sawtooth",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sine" => Some(LfoShape::Sine),
            "triangle" => Some(LfoShape::Triangle),
            "square" => Some(LfoShape::Square),
            "sawtooth" => Some(LfoShape::Sawtooth),
            _ => None,
        }
    }
}

/// Low-frequency oscillator settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lfo {
    pub enabled: bool,
    pub target: LfoTarget,
    pub shape: LfoShape,
    /// Rate in Hz (0.1-20)
    pub rate: f32,
    /// Depth (0-1)
    pub depth: f32,
}

impl Default for Lfo {
    fn default() -> Self {
        Self {
            enabled: false,
            target: LfoTarget::Pitch,
            shape: LfoShape::Sine,
            rate: 4.0,
            depth: 0.5,
        }
    }
}

/// Two-operator FM settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fm {
    /// Modulator frequency as a ratio of the carrier
    pub ratio: f32,
    /// Modulation index
    pub index: f32,
}

/// Karplus-Strong plucked string settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Karplus {
    /// Feedback damping (0-1)
    pub damping: f32,
    /// Excitation brightness (0-1)
    pub brightness: f32,
}

/// An instrument definition.
#[derive(Clone, Debug, PartialEq)]
pub struct Instrument {
    /// Instrument name
    pub name: String,
    pub waveform: Waveform,
    /// Pulse duty cycle (0-1), used by `Waveform::Pulse`
    pub duty_cycle: f32,
    pub envelope: Adsr,
    /// Base volume (0-1)
    pub volume: f32,
    pub filter: Filter,
    pub lfo: Lfo,
    pub fm: Option<Fm>,
    pub karplus: Option<Karplus>,
}

impl Default for Instrument {
    fn default() -> Self {
        Self {
            name: String::from("Untitled"),
            waveform: Waveform::Pulse,
            duty_cycle: 0.5,
            envelope: Adsr::default(),
            volume: 0.5,
            filter: Filter::default(),
            lfo: Lfo::default(),
            fm: None,
            karplus: None,
        }
    }
}

impl Instrument {
    /// Create a new instrument with default settings.
    pub fn new(name: &str, waveform: Waveform) -> Self {
        Self {
            name: String::from(name),
            waveform,
            ..Self::default()
        }
    }

    fn with_envelope(mut self, attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        self.envelope = Adsr { attack, decay, sustain, release };
        self
    }

    fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    fn with_duty(mut self, duty_cycle: f32) -> Self {
        self.duty_cycle = duty_cycle;
        self
    }

    // --- Presets ---

    pub fn square_50() -> Self {
        Self::new("Square 50%", Waveform::Pulse)
            .with_duty(0.5)
            .with_envelope(0.01, 0.05, 0.7, 0.1)
    }

    pub fn square_25() -> Self {
        Self::new("Square 25%", Waveform::Pulse)
            .with_duty(0.25)
            .with_envelope(0.01, 0.1, 0.8, 0.15)
    }

    pub fn square_125() -> Self {
        Self::new("Square 12.5%", Waveform::Pulse)
            .with_duty(0.125)
            .with_envelope(0.005, 0.03, 0.6, 0.08)
            .with_volume(0.45)
    }

    pub fn triangle() -> Self {
        Self::new("Triangle", Waveform::Triangle)
            .with_envelope(0.02, 0.08, 0.75, 0.15)
            .with_volume(0.6)
    }

    pub fn sawtooth() -> Self {
        Self::new("Sawtooth", Waveform::Sawtooth).with_envelope(0.005, 0.04, 0.65, 0.1)
    }

    pub fn noise() -> Self {
        Self::new("Noise", Waveform::Noise)
            .with_envelope(0.001, 0.02, 0.3, 0.02)
            .with_volume(0.4)
    }

    /// Triangle with no sustain; meant for low notes.
    pub fn kick() -> Self {
        Self::new("Kick Drum", Waveform::Triangle)
            .with_envelope(0.001, 0.15, 0.0, 0.05)
            .with_volume(0.8)
    }

    pub fn snare() -> Self {
        let mut inst = Self::new("Snare Drum", Waveform::Noise)
            .with_envelope(0.001, 0.08, 0.1, 0.05)
            .with_volume(0.5);
        inst.filter = Filter {
            enabled: true,
            kind: FilterKind::Highpass,
            cutoff: 800.0,
            resonance: 2.0,
            envelope: 0.0,
        };
        inst
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_have_distinct_names() {
        let presets = [
            Instrument::square_50(),
            Instrument::square_25(),
            Instrument::square_125(),
            Instrument::triangle(),
            Instrument::sawtooth(),
            Instrument::noise(),
            Instrument::kick(),
            Instrument::snare(),
        ];
        for (i, a) in presets.iter().enumerate() {
            for b in &presets[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn snare_enables_highpass() {
        let snare = Instrument::snare();
        assert!(snare.filter.enabled);
        assert_eq!(snare.filter.kind, FilterKind::Highpass);
        assert_eq!(snare.filter.cutoff, 800.0);
    }

    #[test]
    fn enum_names_roundtrip() {
        for w in [Waveform::Pulse, Waveform::Triangle, Waveform::Sawtooth, Waveform::Noise] {
            assert_eq!(Waveform::from_name(w.name()), Some(w));
        }
        assert_eq!(LfoTarget::from_name("pwm"), Some(LfoTarget::PulseWidth));
        assert_eq!(FilterKind::from_name("comb"), None);
    }
}
