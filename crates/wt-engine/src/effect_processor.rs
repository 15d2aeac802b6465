//! Per-channel effect processing.
//!
//! `trigger` runs once when a row carrying a note or an effect is processed;
//! `process_tick` runs on every following tick of that row. Both push their
//! results straight to the audio backend.

use arrayvec::ArrayVec;
use wt_ir::{Effect, DEFAULT_NOTE_VOLUME, MAX_CHANNELS, MAX_VOLUME};

use crate::backend::AudioBackend;
use crate::channel::ChannelState;

/// Persistent effect state for every channel of a song.
#[derive(Clone, Debug)]
pub struct EffectProcessor {
    channels: ArrayVec<ChannelState, { MAX_CHANNELS as usize }>,
}

impl EffectProcessor {
    /// Create state for `channels` channels (at most `MAX_CHANNELS`).
    pub fn new(channels: u8) -> Self {
        let mut processor = Self {
            channels: ArrayVec::new(),
        };
        processor.resize(channels);
        processor
    }

    /// Change the channel count, resetting every channel.
    pub fn resize(&mut self, channels: u8) {
        self.channels.clear();
        for _ in 0..channels.min(MAX_CHANNELS) {
            self.channels.push(ChannelState::new());
        }
    }

    pub fn channel_count(&self) -> u8 {
        self.channels.len() as u8
    }

    pub fn channel(&self, ch: u8) -> Option<&ChannelState> {
        self.channels.get(ch as usize)
    }

    pub fn is_sounding(&self, ch: u8) -> bool {
        self.channel(ch).is_some_and(|c| c.sounding)
    }

    /// Mark every channel silent. Effect memory is kept.
    pub fn silence_all(&mut self) {
        for ch in &mut self.channels {
            ch.sounding = false;
        }
    }

    /// Apply a row's note, volume and effect to a channel.
    ///
    /// A note arriving with tone portamento becomes the glide target instead
    /// of jumping the pitch. Out-of-range channels are ignored.
    pub fn trigger<A: AudioBackend + ?Sized>(
        &mut self,
        audio: &mut A,
        ch: u8,
        note: Option<u8>,
        volume: Option<u8>,
        effect: Effect,
    ) {
        let Some(state) = self.channels.get_mut(ch as usize) else {
            return;
        };

        // A note gliding on a sounding channel is not replayed and keeps its level
        let glide = matches!(effect, Effect::TonePorta(_)) && state.sounding;
        if let Some(note) = note {
            match effect {
                Effect::TonePorta(_) => state.set_porta_target(note),
                _ => state.trigger_note(note),
            }
        }
        match (note, volume) {
            (_, Some(volume)) => state.volume = volume.min(MAX_VOLUME),
            (Some(_), None) if !glide => state.volume = DEFAULT_NOTE_VOLUME,
            _ => {}
        }

        match effect {
            Effect::Arpeggio { x, y } => state.set_arpeggio(x, y),
            Effect::PortaUp(speed) | Effect::PortaDown(speed) | Effect::TonePorta(speed) => {
                state.remember_slide(speed)
            }
            Effect::Vibrato { speed, depth } => state.remember_vibrato(speed, depth),
            Effect::Tremolo { speed, depth } => state.remember_tremolo(speed, depth),
            Effect::SetVolume(v) => {
                state.volume = v.min(MAX_VOLUME);
                audio.set_channel_volume(ch, state.volume as f32 / MAX_VOLUME as f32);
            }
            // Speed and tempo belong to the sequencer
            Effect::SetSpeed(_) | Effect::SetTempo(_) | Effect::None => {}
        }
    }

    /// Advance a channel's active effect by one tick.
    pub fn process_tick<A: AudioBackend + ?Sized>(
        &mut self,
        audio: &mut A,
        ch: u8,
        effect: Effect,
        tick: u8,
    ) {
        let Some(state) = self.channels.get_mut(ch as usize) else {
            return;
        };

        // Pitch effects need a pitch to work from
        let has_pitch = state.note.is_some();
        match effect {
            Effect::Arpeggio { .. } if has_pitch => {
                audio.set_channel_frequency(ch, state.arpeggio_frequency(tick));
            }
            Effect::PortaUp(_) if has_pitch => {
                audio.set_channel_frequency(ch, state.slide_up());
            }
            Effect::PortaDown(_) if has_pitch => {
                audio.set_channel_frequency(ch, state.slide_down());
            }
            Effect::TonePorta(_) => {
                if let Some(hz) = state.tone_porta_step() {
                    audio.set_channel_frequency(ch, hz);
                }
            }
            Effect::Vibrato { .. } if has_pitch => {
                audio.set_channel_frequency(ch, state.vibrato_step());
            }
            Effect::Tremolo { .. } => {
                audio.set_channel_volume(ch, state.tremolo_level());
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AudioCall, RecordingBackend};
    use crate::frequency::{note_to_frequency, shift_semitones, FREQ_MAX, FREQ_MIN};
    use alloc::vec::Vec;
    use pretty_assertions::assert_eq;

    fn make_processor() -> (EffectProcessor, RecordingBackend) {
        (EffectProcessor::new(4), RecordingBackend::new())
    }

    fn note_on(fx: &mut EffectProcessor, rec: &mut RecordingBackend, note: u8) {
        fx.trigger(rec, 0, Some(note), None, Effect::None);
    }

    /// Run `ticks` ticks of `effect` on channel 0, returning pushed frequencies.
    fn run(fx: &mut EffectProcessor, rec: &mut RecordingBackend, effect: Effect, ticks: u8) -> Vec<f32> {
        rec.clear();
        for tick in 1..=ticks {
            fx.process_tick(rec, 0, effect, tick);
        }
        rec.frequencies(0)
    }

    #[test]
    fn arpeggio_cycles_base_x_y() {
        let (mut fx, mut rec) = make_processor();
        let arp = Effect::Arpeggio { x: 4, y: 7 };
        fx.trigger(&mut rec, 0, Some(60), None, arp);
        for tick in 0..6 {
            fx.process_tick(&mut rec, 0, arp, tick);
        }
        let base = note_to_frequency(60);
        let plus4 = shift_semitones(base, 4.0);
        let plus7 = shift_semitones(base, 7.0);
        assert_eq!(rec.frequencies(0), [base, plus4, plus7, base, plus4, plus7]);
        assert!((plus4 - note_to_frequency(64)).abs() < 1e-3);
        assert!((plus7 - note_to_frequency(67)).abs() < 1e-3);
    }

    #[test]
    fn arpeggio_does_not_move_base_frequency() {
        let (mut fx, mut rec) = make_processor();
        let arp = Effect::Arpeggio { x: 12, y: 7 };
        fx.trigger(&mut rec, 0, Some(48), None, arp);
        run(&mut fx, &mut rec, arp, 5);
        assert_eq!(fx.channel(0).unwrap().frequency, note_to_frequency(48));
    }

    #[test]
    fn tone_porta_converges_without_overshoot() {
        let (mut fx, mut rec) = make_processor();
        note_on(&mut fx, &mut rec, 69);
        // 20 * 0.5 Hz = 10 Hz per tick
        fx.trigger(&mut rec, 0, Some(81), None, Effect::TonePorta(20));
        assert_eq!(fx.channel(0).unwrap().frequency, 440.0);

        let pushed = run(&mut fx, &mut rec, Effect::TonePorta(20), 60);
        assert!(pushed.iter().all(|&hz| hz <= 880.0));
        assert!(pushed.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(pushed[0], 450.0);
        assert_eq!(*pushed.last().unwrap(), 880.0);
        let arrival = pushed.iter().position(|&hz| hz == 880.0).unwrap();
        assert_eq!(arrival, 43);
    }

    #[test]
    fn tone_porta_glides_down() {
        let (mut fx, mut rec) = make_processor();
        note_on(&mut fx, &mut rec, 81);
        fx.trigger(&mut rec, 0, Some(69), None, Effect::TonePorta(255));
        let pushed = run(&mut fx, &mut rec, Effect::TonePorta(0), 10);
        assert!(pushed.iter().all(|&hz| hz >= 440.0));
        assert_eq!(*pushed.last().unwrap(), 440.0);
    }

    #[test]
    fn porta_up_stays_in_range() {
        let (mut fx, mut rec) = make_processor();
        note_on(&mut fx, &mut rec, 120);
        fx.trigger(&mut rec, 0, None, None, Effect::PortaUp(255));
        let pushed = run(&mut fx, &mut rec, Effect::PortaUp(255), 200);
        assert!(pushed.iter().all(|&hz| (FREQ_MIN..=FREQ_MAX).contains(&hz)));
        assert_eq!(*pushed.last().unwrap(), FREQ_MAX);
    }

    #[test]
    fn porta_down_stays_in_range() {
        let (mut fx, mut rec) = make_processor();
        note_on(&mut fx, &mut rec, 10);
        fx.trigger(&mut rec, 0, None, None, Effect::PortaDown(255));
        let pushed = run(&mut fx, &mut rec, Effect::PortaDown(255), 200);
        assert!(pushed.iter().all(|&hz| (FREQ_MIN..=FREQ_MAX).contains(&hz)));
        assert_eq!(*pushed.last().unwrap(), FREQ_MIN);
    }

    #[test]
    fn porta_zero_reuses_last_speed() {
        let (mut fx, mut rec) = make_processor();
        note_on(&mut fx, &mut rec, 60);
        fx.trigger(&mut rec, 0, None, None, Effect::PortaUp(5));
        let first = run(&mut fx, &mut rec, Effect::PortaUp(5), 1)[0];

        let (mut fx2, mut rec2) = make_processor();
        note_on(&mut fx2, &mut rec2, 60);
        fx2.trigger(&mut rec2, 0, None, None, Effect::PortaUp(5));
        fx2.trigger(&mut rec2, 0, None, None, Effect::PortaUp(0));
        assert_eq!(fx2.channel(0).unwrap().slide_speed, 5);
        let second = run(&mut fx2, &mut rec2, Effect::PortaUp(0), 1)[0];
        assert_eq!(first, second);
        assert!(second > note_to_frequency(60));
    }

    #[test]
    fn porta_and_tone_porta_share_memory() {
        let (mut fx, mut rec) = make_processor();
        fx.trigger(&mut rec, 0, None, None, Effect::PortaDown(9));
        fx.trigger(&mut rec, 0, None, None, Effect::TonePorta(0));
        assert_eq!(fx.channel(0).unwrap().slide_speed, 9);
    }

    #[test]
    fn vibrato_memory_per_nibble() {
        let (mut fx, mut rec) = make_processor();
        fx.trigger(&mut rec, 0, Some(60), None, Effect::Vibrato { speed: 8, depth: 4 });
        fx.trigger(&mut rec, 0, None, None, Effect::Vibrato { speed: 0, depth: 6 });
        let ch = fx.channel(0).unwrap();
        assert_eq!((ch.vibrato_speed, ch.vibrato_depth), (8, 6));
    }

    #[test]
    fn vibrato_oscillates_around_base() {
        let (mut fx, mut rec) = make_processor();
        let vib = Effect::Vibrato { speed: 8, depth: 15 };
        fx.trigger(&mut rec, 0, Some(69), None, vib);
        let pushed = run(&mut fx, &mut rec, vib, 8);
        assert_eq!(pushed[0], 440.0);
        assert!(pushed.iter().any(|&hz| hz > 440.0));
        assert!(pushed.iter().any(|&hz| hz < 440.0));
        assert_eq!(fx.channel(0).unwrap().frequency, 440.0);
        assert_eq!(fx.channel(0).unwrap().vibrato_pos, 0);
    }

    #[test]
    fn set_volume_pushes_immediately() {
        let (mut fx, mut rec) = make_processor();
        fx.trigger(&mut rec, 2, None, None, Effect::SetVolume(32));
        assert_eq!(rec.calls, [AudioCall::Volume { channel: 2, level: 0.5 }]);
        assert_eq!(fx.channel(2).unwrap().volume, 32);

        fx.trigger(&mut rec, 2, None, None, Effect::SetVolume(200));
        assert_eq!(fx.channel(2).unwrap().volume, 64);
        assert_eq!(rec.volumes(2).last(), Some(&1.0));
    }

    #[test]
    fn cell_volume_is_stored_without_push() {
        let (mut fx, mut rec) = make_processor();
        fx.trigger(&mut rec, 1, Some(60), Some(20), Effect::None);
        assert_eq!(fx.channel(1).unwrap().volume, 20);
        assert!(rec.calls.is_empty());
    }

    #[test]
    fn tremolo_keeps_stored_volume() {
        let (mut fx, mut rec) = make_processor();
        let trem = Effect::Tremolo { speed: 8, depth: 8 };
        fx.trigger(&mut rec, 0, Some(60), Some(32), trem);
        for tick in 1..10 {
            fx.process_tick(&mut rec, 0, trem, tick);
        }
        let levels = rec.volumes(0);
        assert_eq!(levels.len(), 9);
        assert!(levels.iter().any(|&l| l != 0.5));
        assert_eq!(fx.channel(0).unwrap().volume, 32);
    }

    #[test]
    fn pitch_effects_need_a_note() {
        let (mut fx, mut rec) = make_processor();
        fx.trigger(&mut rec, 0, None, None, Effect::PortaUp(4));
        run(&mut fx, &mut rec, Effect::PortaUp(4), 3);
        run(&mut fx, &mut rec, Effect::Arpeggio { x: 1, y: 2 }, 3);
        assert!(rec.calls.is_empty());
    }

    #[test]
    fn out_of_range_channel_is_ignored() {
        let (mut fx, mut rec) = make_processor();
        fx.trigger(&mut rec, 9, Some(60), None, Effect::SetVolume(10));
        fx.process_tick(&mut rec, 9, Effect::PortaUp(1), 1);
        assert!(rec.calls.is_empty());
        assert!(!fx.is_sounding(9));
    }

    #[test]
    fn silence_all_keeps_memory() {
        let (mut fx, mut rec) = make_processor();
        fx.trigger(&mut rec, 0, Some(60), None, Effect::PortaUp(7));
        assert!(fx.is_sounding(0));
        fx.silence_all();
        assert!(!fx.is_sounding(0));
        assert_eq!(fx.channel(0).unwrap().slide_speed, 7);
        fx.resize(4);
        assert_eq!(fx.channel(0).unwrap().slide_speed, 0);
    }

    #[test]
    fn note_without_volume_stores_default_level() {
        let (mut fx, mut rec) = make_processor();
        let trem = Effect::Tremolo { speed: 1, depth: 1 };
        fx.trigger(&mut rec, 0, Some(60), None, trem);
        assert_eq!(fx.channel(0).unwrap().volume, DEFAULT_NOTE_VOLUME);

        // First tremolo step sits on the note's own level
        fx.process_tick(&mut rec, 0, trem, 1);
        assert_eq!(rec.volumes(0), [0.75]);
    }

    #[test]
    fn glide_without_volume_keeps_level() {
        let (mut fx, mut rec) = make_processor();
        fx.trigger(&mut rec, 0, Some(60), Some(20), Effect::None);
        fx.trigger(&mut rec, 0, Some(72), None, Effect::TonePorta(8));
        assert_eq!(fx.channel(0).unwrap().volume, 20);

        // A silent channel plays the porta note, so it gets the default level
        fx.trigger(&mut rec, 1, Some(72), None, Effect::TonePorta(8));
        assert_eq!(fx.channel(1).unwrap().volume, DEFAULT_NOTE_VOLUME);
    }

    #[test]
    fn resize_caps_channel_count() {
        let mut fx = EffectProcessor::new(200);
        assert_eq!(fx.channel_count(), MAX_CHANNELS);
        fx.resize(2);
        assert_eq!(fx.channel_count(), 2);
    }
}
