//! Tracker-notation cell formatting.

use wt_formats::encode_effect;
use wt_ir::{Cell, Effect};

const NOTE_NAMES: [&str; 12] = [
    "C-", "C#", "D-", "D#", "E-", "F-", "F#", "G-", "G#", "A-", "A#", "B-",
];

/// `NNN II VV EPP`, e.g. `C-4 00 30 037`.
pub fn format_cell(cell: &Cell) -> String {
    format!(
        "{} {} {} {}",
        format_note(cell.note),
        format_byte(cell.instrument),
        format_byte(cell.volume),
        format_effect(cell.effect),
    )
}

/// MIDI note name with octave, 60 is `C-4`. Notes below octave 0 show `?`.
pub fn format_note(note: Option<u8>) -> String {
    match note {
        None => "---".to_string(),
        Some(n) => {
            let name = NOTE_NAMES[(n % 12) as usize];
            match (n / 12).checked_sub(1) {
                Some(octave) => format!("{}{}", name, octave),
                None => format!("{}?", name),
            }
        }
    }
}

pub fn format_byte(value: Option<u8>) -> String {
    match value {
        Some(v) => format!("{:02X}", v),
        None => "..".to_string(),
    }
}

pub fn format_effect(effect: Effect) -> String {
    if effect == Effect::None {
        return "...".to_string();
    }
    let (cmd, param) = encode_effect(effect);
    format!("{:X}{:02X}", cmd, param)
}
