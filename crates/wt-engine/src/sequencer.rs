//! Tick/row/order state machine.
//!
//! The host calls [`Sequencer::update`] (or [`Sequencer::poll`]) as often as
//! it likes. Each call fires at most one tick once a tick interval has passed
//! since the previous one. Tick 0 of a row triggers the row's cells; the
//! remaining ticks evolve the channels' active effects.
//!
//! All timing is measured in the timebase of the `now` values passed to
//! `update`. The first `update` after `play` only anchors the tick reference.

use alloc::boxed::Box;

use arrayvec::ArrayVec;
use wt_ir::{
    tick_interval_ms, Effect, Song, DEFAULT_NOTE_VOLUME, DEFAULT_ROWS, MAX_CHANNELS, MAX_VOLUME,
};

use crate::backend::AudioBackend;
use crate::clock::Clock;
use crate::effect_processor::EffectProcessor;

/// Transport state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    /// Not advancing; position kept.
    Paused,
}

/// Receives playback position changes.
pub trait PositionListener {
    /// A row was processed, or the position was moved to `row`.
    fn on_row_change(&mut self, _row: u16) {}

    /// Playback moved to a new order position.
    fn on_order_change(&mut self, _order: usize) {}
}

/// Snapshot of where playback is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackPosition {
    /// Index into the order list
    pub order: usize,
    /// Pattern at that order position
    pub pattern: Option<u8>,
    pub row: u16,
    pub tick: u8,
}

/// Drives a [`Song`] through an [`AudioBackend`].
pub struct Sequencer<A: AudioBackend> {
    song: Song,
    audio: A,
    clock: Box<dyn Clock>,
    effects: EffectProcessor,
    /// Effect of the last processed row, per channel
    active: ArrayVec<Effect, { MAX_CHANNELS as usize }>,
    listener: Option<Box<dyn PositionListener>>,
    state: TransportState,
    order: usize,
    row: u16,
    tick: u8,
    /// Time of the last tick; `None` until the first update after `play`
    last_tick_time: Option<f64>,
    /// Latest `now` seen by `update`
    last_now: f64,
    tick_interval: f64,
}

impl<A: AudioBackend> Sequencer<A> {
    pub fn new<C: Clock + 'static>(song: Song, audio: A, clock: C) -> Self {
        let mut seq = Self {
            tick_interval: tick_interval_ms(song.bpm()),
            effects: EffectProcessor::new(song.channels()),
            active: ArrayVec::new(),
            song,
            audio,
            clock: Box::new(clock),
            listener: None,
            state: TransportState::Stopped,
            order: 0,
            row: 0,
            tick: 0,
            last_tick_time: None,
            last_now: 0.0,
        };
        seq.reset_active();
        seq
    }

    fn reset_active(&mut self) {
        self.active.clear();
        for _ in 0..self.song.channels().min(MAX_CHANNELS) {
            self.active.push(Effect::None);
        }
    }

    // --- Accessors ---

    pub fn song(&self) -> &Song {
        &self.song
    }

    /// Mutable access to the song. Edits take effect from the next row.
    pub fn song_mut(&mut self) -> &mut Song {
        &mut self.song
    }

    /// Replace the song. Playback stops and the position returns to the start.
    pub fn set_song(&mut self, song: Song) {
        self.song = song;
        self.effects.resize(self.song.channels());
        self.reset_active();
        self.tick_interval = tick_interval_ms(self.song.bpm());
        self.stop();
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    pub fn effects(&self) -> &EffectProcessor {
        &self.effects
    }

    /// Effect left active on a channel by the last processed row.
    pub fn active_effect(&self, ch: u8) -> Effect {
        self.active.get(ch as usize).copied().unwrap_or_default()
    }

    pub fn set_listener(&mut self, listener: Option<Box<dyn PositionListener>>) {
        self.listener = listener;
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    pub fn position(&self) -> PlaybackPosition {
        PlaybackPosition {
            order: self.order,
            pattern: self.song.order().get(self.order).copied(),
            row: self.row,
            tick: self.tick,
        }
    }

    pub fn tick_interval_ms(&self) -> f64 {
        self.tick_interval
    }

    // --- Transport ---

    /// Start or resume playback. No-op while already playing.
    pub fn play(&mut self) {
        if self.state == TransportState::Playing {
            return;
        }
        log::debug!("play from order {} row {}", self.order, self.row);
        self.state = TransportState::Playing;
        self.last_tick_time = None;
        self.tick_interval = tick_interval_ms(self.song.bpm());
    }

    /// Halt playback in place and silence the backend.
    ///
    /// Pausing a stopped sequencer leaves it stopped.
    pub fn pause(&mut self) {
        if self.state == TransportState::Playing {
            log::debug!("pause at order {} row {}", self.order, self.row);
            self.state = TransportState::Paused;
        }
        self.audio.stop_all();
        self.effects.silence_all();
    }

    /// Halt playback, silence the backend and rewind to the start.
    pub fn stop(&mut self) {
        log::debug!("stop");
        self.state = TransportState::Stopped;
        self.order = 0;
        self.row = 0;
        self.tick = 0;
        self.audio.stop_all();
        self.effects.silence_all();
        self.notify_row();
        self.notify_order();
    }

    /// Move to an order position and row without touching audio.
    ///
    /// The order is clamped into the order list and the row into the
    /// destination pattern.
    pub fn jump_to(&mut self, order: usize, row: u16) {
        self.order = order.min(self.song.order().len().saturating_sub(1));
        self.row = row.min(self.current_rows() - 1);
        self.tick = 0;
        self.notify_row();
        self.notify_order();
    }

    /// Set the tempo (clamped to 32-255).
    ///
    /// While playing, the tick reference restarts from the latest update
    /// time so the new interval is measured from there.
    pub fn set_bpm(&mut self, bpm: u16) {
        let applied = self.song.set_bpm(bpm);
        self.tick_interval = tick_interval_ms(applied);
        if self.state == TransportState::Playing && self.last_tick_time.is_some() {
            self.last_tick_time = Some(self.last_now);
        }
        log::debug!("bpm {} ({:.2} ms/tick)", applied, self.tick_interval);
    }

    /// Set ticks per row (clamped to 1-31). Tick timing is unaffected.
    pub fn set_speed(&mut self, speed: u8) {
        let applied = self.song.set_speed(speed);
        log::debug!("speed {}", applied);
    }

    // --- Timing ---

    /// Fire one tick if an interval has elapsed since the last one.
    ///
    /// Missed intervals are not caught up: the reference moves to `now`.
    pub fn update(&mut self, now: f64) {
        if self.state != TransportState::Playing {
            return;
        }
        self.last_now = now;
        match self.last_tick_time {
            None => self.last_tick_time = Some(now),
            Some(last) if now - last >= self.tick_interval => {
                self.last_tick_time = Some(now);
                self.tick();
            }
            Some(_) => {}
        }
    }

    /// [`update`](Self::update) with the sequencer's own clock.
    pub fn poll(&mut self) {
        let now = self.clock.now_ms();
        self.update(now);
    }

    /// Advance by exactly one tick, regardless of time or transport state.
    pub fn tick(&mut self) {
        if self.tick == 0 {
            self.process_row();
        } else {
            for (ch, effect) in self.active.iter().enumerate() {
                if effect.is_continuous() {
                    self.effects
                        .process_tick(&mut self.audio, ch as u8, *effect, self.tick);
                }
            }
        }

        self.tick += 1;
        if self.tick >= self.song.speed() {
            self.tick = 0;
            self.advance_row();
        }
    }

    // --- Internals ---

    /// Rows in the pattern at the current order position.
    fn current_rows(&self) -> u16 {
        self.song
            .pattern_at_order(self.order)
            .map_or(DEFAULT_ROWS, |p| p.rows())
    }

    fn process_row(&mut self) {
        // The order list may have shrunk under the current position
        if self.order >= self.song.order().len() {
            self.order = 0;
            self.row = 0;
            self.notify_order();
        }
        if self.song.pattern_at_order(self.order).is_none() {
            log::warn!("order {} has no pattern, row {} skipped", self.order, self.row);
        }

        for ch in 0..self.active.len() as u8 {
            let cell = self
                .song
                .cell_at(self.order, self.row, ch)
                .copied()
                .unwrap_or_default();
            self.active[ch as usize] = cell.effect;

            if let Some(note) = cell.note {
                let glide = matches!(cell.effect, Effect::TonePorta(_))
                    && self.effects.is_sounding(ch);
                if glide {
                    if let Some(volume) = cell.volume {
                        let level = volume.min(MAX_VOLUME) as f32 / MAX_VOLUME as f32;
                        self.audio.set_channel_volume(ch, level);
                    }
                } else {
                    if self.effects.is_sounding(ch) {
                        self.audio.stop_note(ch);
                    }
                    let instrument = self.song.instrument(cell.instrument);
                    let volume = cell.volume.unwrap_or(DEFAULT_NOTE_VOLUME);
                    self.audio.play_note(ch, note, instrument, volume);
                }
            }

            if cell.note.is_some() || cell.effect != Effect::None {
                self.effects
                    .trigger(&mut self.audio, ch, cell.note, cell.volume, cell.effect);
            }

            match cell.effect {
                Effect::SetSpeed(speed) => self.set_speed(speed),
                Effect::SetTempo(bpm) => self.set_bpm(bpm as u16),
                _ => {}
            }
        }

        self.notify_row();
    }

    fn advance_row(&mut self) {
        self.row += 1;
        if self.row >= self.current_rows() {
            self.row = 0;
            self.advance_order();
        }
    }

    fn advance_order(&mut self) {
        self.order += 1;
        if self.order >= self.song.order().len() {
            self.order = 0;
        }
        self.notify_order();
    }

    fn notify_row(&mut self) {
        if let Some(listener) = self.listener.as_mut() {
            listener.on_row_change(self.row);
        }
    }

    fn notify_order(&mut self) {
        if let Some(listener) = self.listener.as_mut() {
            listener.on_order_change(self.order);
        }
    }
}
