//! Effect column codec.
//!
//! Song documents store effects the way trackers display them: a command
//! nibble (0x0-0xF) plus a parameter byte. Commands without a meaning here
//! decode to `Effect::None`.

use wt_ir::{Effect, MAX_SPEED, MAX_VOLUME, MIN_BPM};

/// Decode an effect command and its parameter.
pub fn parse_effect(cmd: u8, param: u8) -> Effect {
    match cmd {
        0x0 if param != 0 => Effect::Arpeggio {
            x: (param >> 4) & 0x0F,
            y: param & 0x0F,
        },
        0x0 => Effect::None,
        0x1 => Effect::PortaUp(param),
        0x2 => Effect::PortaDown(param),
        0x3 => Effect::TonePorta(param),
        0x4 => Effect::Vibrato {
            speed: (param >> 4) & 0x0F,
            depth: param & 0x0F,
        },
        0x7 => Effect::Tremolo {
            speed: (param >> 4) & 0x0F,
            depth: param & 0x0F,
        },
        0xC => Effect::SetVolume(param.min(MAX_VOLUME)),
        0xF => {
            if param < 32 {
                Effect::SetSpeed(param)
            } else {
                Effect::SetTempo(param)
            }
        }
        _ => {
            log::warn!("unsupported effect {:X}{:02X} ignored", cmd, param);
            Effect::None
        }
    }
}

/// Encode an effect as `(command, parameter)`.
///
/// `Arpeggio { x: 0, y: 0 }` encodes to `(0, 0)`, which reads back as no
/// effect.
pub fn encode_effect(effect: Effect) -> (u8, u8) {
    match effect {
        Effect::None => (0x0, 0),
        Effect::Arpeggio { x, y } => (0x0, nibbles(x, y)),
        Effect::PortaUp(p) => (0x1, p),
        Effect::PortaDown(p) => (0x2, p),
        Effect::TonePorta(p) => (0x3, p),
        Effect::Vibrato { speed, depth } => (0x4, nibbles(speed, depth)),
        Effect::Tremolo { speed, depth } => (0x7, nibbles(speed, depth)),
        Effect::SetVolume(v) => (0xC, v.min(MAX_VOLUME)),
        Effect::SetSpeed(s) => (0xF, s.min(MAX_SPEED)),
        Effect::SetTempo(t) => (0xF, t.max(MIN_BPM)),
    }
}

fn nibbles(hi: u8, lo: u8) -> u8 {
    ((hi & 0x0F) << 4) | (lo & 0x0F)
}
