//! Headless controller for the wavetrak tracker.
//!
//! Provides a unified API for loading songs and driving playback that both
//! the CLI and an editor front end can share.

mod backend;

use wt_engine::{Clock, PositionListener, Sequencer};

// Re-export common types so callers don't need wt-ir/wt-engine directly.
pub use backend::{SystemClock, TraceBackend};
pub use wt_engine::{AudioBackend, PlaybackPosition, TransportState};
pub use wt_formats::FormatError;
pub use wt_ir::Song;

/// Headless tracker controller: owns the sequencer, and through it the song,
/// effect state and audio backend.
pub struct Controller<A: AudioBackend> {
    sequencer: Sequencer<A>,
}

impl<A: AudioBackend> Controller<A> {
    /// Controller on the wall clock with a fresh default song.
    pub fn new(audio: A) -> Self {
        Self::with_clock(Song::default(), audio, SystemClock::new())
    }

    pub fn with_clock<C: Clock + 'static>(song: Song, audio: A, clock: C) -> Self {
        Self {
            sequencer: Sequencer::new(song, audio, clock),
        }
    }

    // --- Song management ---

    pub fn song(&self) -> &Song {
        self.sequencer.song()
    }

    pub fn song_mut(&mut self) -> &mut Song {
        self.sequencer.song_mut()
    }

    /// Replace the song with an empty default one.
    pub fn new_song(&mut self) {
        tracing::info!("new song");
        self.sequencer.set_song(Song::default());
    }

    /// Replace the song. Playback stops and rewinds.
    pub fn set_song(&mut self, song: Song) {
        self.sequencer.set_song(song);
    }

    /// Load a JSON song document. On failure the current song is kept and
    /// playback is not interrupted.
    pub fn load_song_json(&mut self, json: &str) -> Result<(), FormatError> {
        let song = wt_formats::load_song(json).inspect_err(|e| {
            tracing::warn!("song not loaded: {}", e);
        })?;
        tracing::info!(
            title = %song.title,
            patterns = song.patterns().len(),
            "song loaded"
        );
        self.sequencer.set_song(song);
        Ok(())
    }

    /// Serialize the current song as a JSON document.
    pub fn save_song_json(&self) -> Result<String, FormatError> {
        wt_formats::save_song(self.song())
    }

    // --- Transport ---

    pub fn play(&mut self) {
        self.sequencer.play();
    }

    pub fn pause(&mut self) {
        self.sequencer.pause();
    }

    pub fn stop(&mut self) {
        self.sequencer.stop();
    }

    /// Pause while playing, otherwise play.
    pub fn toggle_play_pause(&mut self) {
        if self.sequencer.is_playing() {
            self.sequencer.pause();
        } else {
            self.sequencer.play();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.sequencer.is_playing()
    }

    pub fn state(&self) -> TransportState {
        self.sequencer.state()
    }

    pub fn jump_to(&mut self, order: usize, row: u16) {
        self.sequencer.jump_to(order, row);
    }

    pub fn position(&self) -> PlaybackPosition {
        self.sequencer.position()
    }

    pub fn set_listener(&mut self, listener: Option<Box<dyn PositionListener>>) {
        self.sequencer.set_listener(listener);
    }

    // --- Tempo ---

    pub fn set_bpm(&mut self, bpm: u16) {
        self.sequencer.set_bpm(bpm);
    }

    /// Nudge the tempo by `delta` BPM. Returns the applied tempo.
    pub fn adjust_bpm(&mut self, delta: i16) -> u8 {
        let bpm = (self.song().bpm() as i16 + delta).max(0) as u16;
        self.sequencer.set_bpm(bpm);
        self.song().bpm()
    }

    pub fn set_speed(&mut self, speed: u8) {
        self.sequencer.set_speed(speed);
    }

    pub fn tick_interval_ms(&self) -> f64 {
        self.sequencer.tick_interval_ms()
    }

    // --- Driving ---

    /// Advance playback to `now` (milliseconds on the controller's clock).
    pub fn update(&mut self, now: f64) {
        self.sequencer.update(now);
    }

    /// Advance playback using the controller's own clock.
    pub fn poll(&mut self) {
        self.sequencer.poll();
    }

    pub fn sequencer(&self) -> &Sequencer<A> {
        &self.sequencer
    }

    pub fn sequencer_mut(&mut self) -> &mut Sequencer<A> {
        &mut self.sequencer
    }

    pub fn audio(&self) -> &A {
        self.sequencer.audio()
    }

    pub fn audio_mut(&mut self) -> &mut A {
        self.sequencer.audio_mut()
    }
}

impl Default for Controller<TraceBackend> {
    fn default() -> Self {
        Self::new(TraceBackend::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wt_engine::{ManualClock, RecordingBackend};

    fn make_controller() -> (Controller<RecordingBackend>, ManualClock) {
        let clock = ManualClock::new(0.0);
        let ctl = Controller::with_clock(Song::default(), RecordingBackend::new(), clock.clone());
        (ctl, clock)
    }

    #[test]
    fn failed_load_keeps_song_and_playback() {
        let (mut ctl, _clock) = make_controller();
        ctl.song_mut().title = String::from("Keep me");
        ctl.play();
        let json = r#"{ "title": "Broken", "instruments": [], "patterns": [] }"#;
        assert!(ctl.load_song_json(json).is_err());
        assert_eq!(ctl.song().title, "Keep me");
        assert!(ctl.is_playing());
        assert!(ctl.load_song_json("not json").is_err());
        assert_eq!(ctl.song().title, "Keep me");
    }

    #[test]
    fn successful_load_replaces_and_stops() {
        let (mut ctl, _clock) = make_controller();
        let mut other = Song::with_channels("Other", "Someone", 6);
        other.set_bpm(90);
        let json = wt_formats::save_song(&other).unwrap();
        ctl.play();
        ctl.load_song_json(&json).unwrap();
        assert_eq!(ctl.song(), &other);
        assert_eq!(ctl.state(), TransportState::Stopped);
        assert_eq!(ctl.tick_interval_ms(), 2500.0 / 90.0);
    }

    #[test]
    fn save_then_load_is_lossless() {
        let (mut ctl, _clock) = make_controller();
        ctl.song_mut().pattern_mut(0).unwrap().set_note(0, 0, 60, 1, 50);
        let before = ctl.song().clone();
        let json = ctl.save_song_json().unwrap();
        ctl.new_song();
        ctl.load_song_json(&json).unwrap();
        assert_eq!(ctl.song(), &before);
    }

    #[test]
    fn toggle_alternates_play_and_pause() {
        let (mut ctl, _clock) = make_controller();
        ctl.toggle_play_pause();
        assert_eq!(ctl.state(), TransportState::Playing);
        ctl.toggle_play_pause();
        assert_eq!(ctl.state(), TransportState::Paused);
        ctl.toggle_play_pause();
        assert_eq!(ctl.state(), TransportState::Playing);
    }

    #[test]
    fn adjust_bpm_clamps() {
        let (mut ctl, _clock) = make_controller();
        assert_eq!(ctl.adjust_bpm(5), 130);
        assert_eq!(ctl.adjust_bpm(-5), 125);
        assert_eq!(ctl.adjust_bpm(-200), 32);
        assert_eq!(ctl.adjust_bpm(300), 255);
        assert_eq!(ctl.tick_interval_ms(), 2500.0 / 255.0);
    }

    #[test]
    fn new_song_resets_to_defaults() {
        let (mut ctl, _clock) = make_controller();
        ctl.song_mut().title = String::from("Old");
        ctl.set_speed(3);
        ctl.new_song();
        assert_eq!(ctl.song(), &Song::default());
    }

    #[test]
    fn poll_uses_controller_clock() {
        let (mut ctl, clock) = make_controller();
        ctl.song_mut().pattern_mut(0).unwrap().set_note(0, 0, 60, 0, 64);
        ctl.play();
        ctl.poll();
        assert!(ctl.audio().calls.is_empty());
        clock.advance(20.0);
        ctl.poll();
        assert_eq!(ctl.audio().notes(0), [60]);
        assert_eq!(ctl.position().tick, 1);
    }
}
