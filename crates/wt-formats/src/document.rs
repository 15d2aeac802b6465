//! JSON song documents.
//!
//! A document mirrors the song model field for field. Patterns are stored as
//! `data[row][channel]`, effects as a command/parameter pair. Tempo, speed,
//! title, author and channel count fall back to the song defaults when
//! absent; instruments, patterns and the order list are required.

use serde::{Deserialize, Serialize};
use wt_ir::{
    Adsr, Cell, Filter, FilterKind, Fm, Instrument, Karplus, Lfo, LfoShape, LfoTarget, Pattern,
    Song, SongParts, Waveform, DEFAULT_BPM, DEFAULT_CHANNELS, DEFAULT_SPEED, MAX_NOTE, MAX_ROWS,
    MAX_VOLUME,
};

use crate::effect_parser::{encode_effect, parse_effect};
use crate::FormatError;

fn default_title() -> String {
    String::from("Untitled")
}

fn default_author() -> String {
    String::from("Unknown")
}

fn default_bpm() -> u16 {
    DEFAULT_BPM as u16
}

fn default_speed() -> u8 {
    DEFAULT_SPEED
}

fn default_channels() -> u8 {
    DEFAULT_CHANNELS
}

fn default_duty() -> f32 {
    0.5
}

fn default_inst_volume() -> f32 {
    0.5
}

/// Top-level song document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SongDoc {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_author")]
    pub author: String,
    #[serde(default = "default_bpm")]
    pub bpm: u16,
    #[serde(default = "default_speed")]
    pub speed: u8,
    #[serde(default = "default_channels")]
    pub channels: u8,
    pub instruments: Vec<InstrumentDoc>,
    pub patterns: Vec<PatternDoc>,
    pub order: Vec<u8>,
}

/// One pattern: `data[row][channel]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternDoc {
    pub channels: u8,
    pub rows: u16,
    pub data: Vec<Vec<CellDoc>>,
}

/// One cell. Notes are MIDI numbers, volumes 0-64.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CellDoc {
    #[serde(default)]
    pub note: Option<u16>,
    #[serde(default)]
    pub instrument: Option<u8>,
    #[serde(default)]
    pub volume: Option<u16>,
    #[serde(default)]
    pub effect: u8,
    #[serde(default)]
    pub effect_param: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentDoc {
    pub name: String,
    pub waveform: String,
    #[serde(default = "default_duty")]
    pub duty_cycle: f32,
    #[serde(default)]
    pub envelope: EnvelopeDoc,
    #[serde(default = "default_inst_volume")]
    pub volume: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lfo: Option<LfoDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fm: Option<FmDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub karplus: Option<KarplusDoc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EnvelopeDoc {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for EnvelopeDoc {
    fn default() -> Self {
        Adsr::default().into()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterDoc {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: String,
    pub cutoff: f32,
    pub resonance: f32,
    #[serde(default)]
    pub envelope: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LfoDoc {
    pub enabled: bool,
    pub target: String,
    pub waveform: String,
    pub rate: f32,
    pub depth: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FmDoc {
    pub ratio: f32,
    pub index: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct KarplusDoc {
    pub damping: f32,
    pub brightness: f32,
}

// --- Song -> document ---

impl From<Adsr> for EnvelopeDoc {
    fn from(env: Adsr) -> Self {
        Self {
            attack: env.attack,
            decay: env.decay,
            sustain: env.sustain,
            release: env.release,
        }
    }
}

impl From<&Cell> for CellDoc {
    fn from(cell: &Cell) -> Self {
        let (effect, effect_param) = encode_effect(cell.effect);
        Self {
            note: cell.note.map(u16::from),
            instrument: cell.instrument,
            volume: cell.volume.map(u16::from),
            effect,
            effect_param,
        }
    }
}

impl From<&Pattern> for PatternDoc {
    fn from(pattern: &Pattern) -> Self {
        Self {
            channels: pattern.channels(),
            rows: pattern.rows(),
            data: pattern
                .iter_rows()
                .map(|row| row.iter().map(CellDoc::from).collect())
                .collect(),
        }
    }
}

impl From<&Instrument> for InstrumentDoc {
    fn from(inst: &Instrument) -> Self {
        Self {
            name: inst.name.clone(),
            waveform: inst.waveform.name().to_owned(),
            duty_cycle: inst.duty_cycle,
            envelope: inst.envelope.into(),
            volume: inst.volume,
            filter: Some(FilterDoc {
                enabled: inst.filter.enabled,
                kind: inst.filter.kind.name().to_owned(),
                cutoff: inst.filter.cutoff,
                resonance: inst.filter.resonance,
                envelope: inst.filter.envelope,
            }),
            lfo: Some(LfoDoc {
                enabled: inst.lfo.enabled,
                target: inst.lfo.target.name().to_owned(),
                waveform: inst.lfo.shape.name().to_owned(),
                rate: inst.lfo.rate,
                depth: inst.lfo.depth,
            }),
            fm: inst.fm.map(|fm| FmDoc {
                ratio: fm.ratio,
                index: fm.index,
            }),
            karplus: inst.karplus.map(|k| KarplusDoc {
                damping: k.damping,
                brightness: k.brightness,
            }),
        }
    }
}

impl From<&Song> for SongDoc {
    fn from(song: &Song) -> Self {
        Self {
            title: song.title.clone(),
            author: song.author.clone(),
            bpm: song.bpm() as u16,
            speed: song.speed(),
            channels: song.channels(),
            instruments: song.instruments().iter().map(InstrumentDoc::from).collect(),
            patterns: song.patterns().iter().map(PatternDoc::from).collect(),
            order: song.order().to_vec(),
        }
    }
}

// --- document -> Song ---

fn unknown(field: &'static str, value: &str) -> FormatError {
    FormatError::UnknownName {
        field,
        value: value.to_owned(),
    }
}

impl InstrumentDoc {
    fn to_instrument(&self) -> Result<Instrument, FormatError> {
        let waveform =
            Waveform::from_name(&self.waveform).ok_or_else(|| unknown("waveform", &self.waveform))?;
        let mut inst = Instrument::new(&self.name, waveform);
        inst.duty_cycle = self.duty_cycle;
        inst.envelope = Adsr {
            attack: self.envelope.attack,
            decay: self.envelope.decay,
            sustain: self.envelope.sustain,
            release: self.envelope.release,
        };
        inst.volume = self.volume;
        if let Some(f) = &self.filter {
            inst.filter = Filter {
                enabled: f.enabled,
                kind: FilterKind::from_name(&f.kind).ok_or_else(|| unknown("filter type", &f.kind))?,
                cutoff: f.cutoff,
                resonance: f.resonance,
                envelope: f.envelope,
            };
        }
        if let Some(l) = &self.lfo {
            inst.lfo = Lfo {
                enabled: l.enabled,
                target: LfoTarget::from_name(&l.target).ok_or_else(|| unknown("lfo target", &l.target))?,
                shape: LfoShape::from_name(&l.waveform)
                    .ok_or_else(|| unknown("lfo waveform", &l.waveform))?,
                rate: l.rate,
                depth: l.depth,
            };
        }
        inst.fm = self.fm.map(|fm| Fm {
            ratio: fm.ratio,
            index: fm.index,
        });
        inst.karplus = self.karplus.map(|k| Karplus {
            damping: k.damping,
            brightness: k.brightness,
        });
        Ok(inst)
    }
}

impl PatternDoc {
    fn to_pattern(&self, index: usize) -> Result<Pattern, FormatError> {
        if self.rows == 0 || self.rows > MAX_ROWS || self.channels == 0 {
            return Err(FormatError::PatternSize {
                pattern: index,
                rows: self.rows,
                channels: self.channels,
            });
        }
        if self.data.len() != self.rows as usize {
            return Err(FormatError::RowCount {
                pattern: index,
                expected: self.rows,
                found: self.data.len(),
            });
        }

        let mut cells = Vec::with_capacity(self.rows as usize * self.channels as usize);
        for (row, doc_row) in self.data.iter().enumerate() {
            if doc_row.len() != self.channels as usize {
                return Err(FormatError::CellCount {
                    pattern: index,
                    row,
                    expected: self.channels,
                    found: doc_row.len(),
                });
            }
            for (channel, doc) in doc_row.iter().enumerate() {
                cells.push(doc.to_cell().map_err(|note| FormatError::InvalidNote {
                    pattern: index,
                    row,
                    channel,
                    note,
                })?);
            }
        }

        Pattern::from_cells(self.rows, self.channels, cells).ok_or(FormatError::PatternSize {
            pattern: index,
            rows: self.rows,
            channels: self.channels,
        })
    }
}

impl CellDoc {
    /// Convert to a cell; the error carries an out-of-range note.
    fn to_cell(self) -> Result<Cell, u16> {
        let note = match self.note {
            Some(n) if n > MAX_NOTE as u16 => return Err(n),
            n => n.map(|n| n as u8),
        };
        Ok(Cell {
            note,
            instrument: self.instrument,
            volume: self.volume.map(|v| v.min(MAX_VOLUME as u16) as u8),
            effect: parse_effect(self.effect, self.effect_param),
        })
    }
}

impl SongDoc {
    /// Build a song, validating its structure.
    pub fn to_song(&self) -> Result<Song, FormatError> {
        let instruments = self
            .instruments
            .iter()
            .map(InstrumentDoc::to_instrument)
            .collect::<Result<Vec<_>, _>>()?;
        let patterns = self
            .patterns
            .iter()
            .enumerate()
            .map(|(i, p)| p.to_pattern(i))
            .collect::<Result<Vec<_>, _>>()?;

        let song = Song::from_parts(SongParts {
            title: self.title.clone(),
            author: self.author.clone(),
            bpm: self.bpm,
            speed: self.speed,
            channels: self.channels,
            instruments,
            patterns,
            order: self.order.clone(),
        })?;
        Ok(song)
    }
}

/// Parse a song document from JSON text.
pub fn load_song(json: &str) -> Result<Song, FormatError> {
    let doc: SongDoc = serde_json::from_str(json)?;
    let song = doc.to_song()?;
    log::debug!(
        "loaded \"{}\": {} patterns, {} order entries, {} channels",
        song.title,
        song.patterns().len(),
        song.order().len(),
        song.channels()
    );
    Ok(song)
}

/// Parse a song document from JSON bytes.
pub fn load_song_slice(bytes: &[u8]) -> Result<Song, FormatError> {
    let doc: SongDoc = serde_json::from_slice(bytes)?;
    doc.to_song()
}

/// Serialize a song as pretty-printed JSON.
pub fn save_song(song: &Song) -> Result<String, FormatError> {
    Ok(serde_json::to_string_pretty(&SongDoc::from(song))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wt_ir::{Effect, SongError};

    const MINIMAL: &str = r#"{
        "instruments": [{ "name": "Lead", "waveform": "pulse" }],
        "patterns": [{
            "channels": 2,
            "rows": 2,
            "data": [
                [{ "note": 60, "instrument": 0, "volume": 40, "effect": 0, "effectParam": 71 }, {}],
                [{ "note": null, "instrument": null, "volume": null, "effect": 15, "effectParam": 140 }, {}]
            ]
        }],
        "order": [0],
        "channels": 2
    }"#;

    #[test]
    fn minimal_document_uses_defaults() {
        let song = load_song(MINIMAL).unwrap();
        assert_eq!(song.title, "Untitled");
        assert_eq!(song.author, "Unknown");
        assert_eq!(song.bpm(), 125);
        assert_eq!(song.speed(), 6);
        assert_eq!(song.channels(), 2);

        let inst = &song.instruments()[0];
        assert_eq!(inst.name, "Lead");
        assert_eq!(inst.duty_cycle, 0.5);
        assert_eq!(inst.envelope, Adsr::default());
        assert!(!inst.filter.enabled);
    }

    #[test]
    fn cells_decode_effects() {
        let song = load_song(MINIMAL).unwrap();
        let p = song.pattern(0).unwrap();
        assert_eq!(
            *p.cell(0, 0).unwrap(),
            Cell::with_note(60, 0, 40).effect(Effect::Arpeggio { x: 4, y: 7 })
        );
        assert_eq!(p.cell(1, 0).unwrap().effect, Effect::SetTempo(140));
        assert!(p.cell(1, 1).unwrap().is_empty());
    }

    #[test]
    fn missing_order_is_rejected() {
        let json = r#"{ "instruments": [], "patterns": [] }"#;
        let err = load_song(json).unwrap_err();
        assert!(matches!(err, FormatError::Json(_)));
        assert!(err.to_string().contains("order"));
    }

    #[test]
    fn structural_errors_are_reported() {
        let json = MINIMAL.replace(r#""order": [0]"#, r#""order": [3]"#);
        assert!(matches!(
            load_song(&json).unwrap_err(),
            FormatError::Song(SongError::InvalidOrderEntry { position: 0, pattern: 3 })
        ));

        let json = MINIMAL.replace(r#""rows": 2"#, r#""rows": 3"#);
        assert!(matches!(
            load_song(&json).unwrap_err(),
            FormatError::RowCount { pattern: 0, expected: 3, found: 2 }
        ));

        let json = MINIMAL.replace(r#""note": 60"#, r#""note": 130"#);
        assert!(matches!(
            load_song(&json).unwrap_err(),
            FormatError::InvalidNote { note: 130, row: 0, channel: 0, .. }
        ));

        let json = MINIMAL.replace(r#""waveform": "pulse""#, r#""waveform": "sine""#);
        assert!(matches!(
            load_song(&json).unwrap_err(),
            FormatError::UnknownName { field: "waveform", .. }
        ));
    }

    #[test]
    fn short_rows_are_rejected() {
        let json = MINIMAL.replace(r#", {}]"#, "]");
        assert!(matches!(
            load_song(&json).unwrap_err(),
            FormatError::CellCount { pattern: 0, row: 0, expected: 2, found: 1 }
        ));
    }

    #[test]
    fn volumes_are_clamped() {
        let json = MINIMAL.replace(r#""volume": 40"#, r#""volume": 99"#);
        let song = load_song(&json).unwrap();
        assert_eq!(song.pattern(0).unwrap().cell(0, 0).unwrap().volume, Some(64));
    }

    #[test]
    fn saved_song_loads_back_identical() {
        let mut song = Song::new("Round", "Trip");
        song.set_bpm(150);
        song.set_speed(4);
        let mut fm = Instrument::sawtooth();
        fm.fm = Some(Fm { ratio: 2.0, index: 1.5 });
        song.add_instrument(fm);
        song.add_instrument(Instrument::snare());
        let p = song.add_pattern(16).unwrap();
        song.add_to_order(p);
        let pat = song.pattern_mut(p).unwrap();
        pat.set_cell(0, 0, Cell::with_note(48, 4, 64).effect(Effect::Vibrato { speed: 4, depth: 2 }));
        pat.set_cell(5, 3, Cell::empty().effect(Effect::SetSpeed(3)));

        let json = save_song(&song).unwrap();
        assert_eq!(load_song(&json).unwrap(), song);
        assert_eq!(load_song_slice(json.as_bytes()).unwrap(), song);
    }

    #[test]
    fn saved_document_uses_camel_case() {
        let json = save_song(&Song::default()).unwrap();
        assert!(json.contains("\"dutyCycle\""));
        assert!(json.contains("\"effectParam\""));
        assert!(json.contains("\"type\": \"lowpass\""));
        assert!(!json.contains("\"fm\""));
    }

    #[test]
    fn tempo_out_of_range_is_clamped() {
        let json = MINIMAL.replace(r#""order": [0]"#, r#""order": [0], "bpm": 400, "speed": 0"#);
        let song = load_song(&json).unwrap();
        assert_eq!(song.bpm(), 255);
        assert_eq!(song.speed(), 1);
    }
}
