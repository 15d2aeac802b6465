//! Effect column commands.

/// Effect column command.
///
/// Each variant carries its decoded parameter. A zero parameter on the
/// slide and modulation effects means "reuse the last value" (effect memory).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Effect {
    #[default]
    None,

    // === Pitch ===
    /// Arpeggio: cycle between note, note+x, note+y each tick
    Arpeggio { x: u8, y: u8 },
    /// Slide pitch up by speed per tick
    PortaUp(u8),
    /// Slide pitch down by speed per tick
    PortaDown(u8),
    /// Glide toward the row's note without retriggering
    TonePorta(u8),
    /// Vibrato with speed and depth (nibbles)
    Vibrato { speed: u8, depth: u8 },

    // === Volume ===
    /// Tremolo (volume oscillation)
    Tremolo { speed: u8, depth: u8 },
    /// Set channel volume (0-64)
    SetVolume(u8),

    // === Speed & Tempo ===
    /// Set ticks per row (speed)
    SetSpeed(u8),
    /// Set BPM tempo
    SetTempo(u8),
}

impl Effect {
    /// Returns the variant name as a static string (ignoring parameters).
    pub fn name(&self) -> &'static str {
        match self {
            Effect::None => "None",
            Effect::Arpeggio { .. } => "Arpeggio",
            Effect::PortaUp(_) => "Porta Up",
            Effect::PortaDown(_) => "Porta Down",
            Effect::TonePorta(_) => "Tone Porta",
            Effect::Vibrato { .. } => "Vibrato",
            Effect::Tremolo { .. } => "Tremolo",
            Effect::SetVolume(_) => "Set Volume",
            Effect::SetSpeed(_) => "Set Speed",
            Effect::SetTempo(_) => "Set Tempo",
        }
    }

    /// Returns true for effects that only act when the row is triggered.
    pub fn is_row_effect(&self) -> bool {
        matches!(
            self,
            Effect::SetVolume(_) | Effect::SetSpeed(_) | Effect::SetTempo(_)
        )
    }

    /// Returns true if the effect evolves pitch or volume on non-zero ticks.
    pub fn is_continuous(&self) -> bool {
        !matches!(self, Effect::None) && !self.is_row_effect()
    }
}
