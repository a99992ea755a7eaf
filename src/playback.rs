use std::collections::VecDeque;

use log::{debug, info, warn};

use crate::assets::AudioBuffer;
use crate::error::{LoadError, SetupError};
use crate::media::AudioSink;

/// Condition of the single audio source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// No source has been created yet.
    Idle,
    Stopped,
    Paused,
    Playing,
}

impl PlaybackStatus {
    pub fn label(self) -> &'static str {
        match self {
            PlaybackStatus::Idle => "idle",
            PlaybackStatus::Stopped => "stopped",
            PlaybackStatus::Paused => "paused",
            PlaybackStatus::Playing => "playing",
        }
    }
}

/// Asynchronous audio load issued by `play`, `next` or `previous`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub generation: u64,
    pub track: usize,
    pub id: String,
}

/// What happened to a completed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The buffer was swapped into the source and started.
    Applied { track: usize },
    /// A newer request superseded this one, or it was never issued.
    Discarded,
}

/// Track pointer plus the state of the one audio source.
///
/// Loads follow load-then-swap ordering: the source keeps its previous buffer
/// and status until a completion for an outstanding request arrives.
#[derive(Debug, Clone)]
pub struct Playback {
    tracks: Vec<String>,
    current: usize,
    status: PlaybackStatus,
    volume: f32,
    discard_stale: bool,
    next_generation: u64,
    outstanding: VecDeque<LoadRequest>,
    source_track: Option<usize>,
}

impl Playback {
    pub fn new(tracks: Vec<String>, volume: f32, discard_stale: bool) -> Result<Self, SetupError> {
        if tracks.is_empty() {
            return Err(SetupError::EmptyPlaylist);
        }
        Ok(Self {
            tracks,
            current: 0,
            status: PlaybackStatus::Idle,
            volume: volume.clamp(0.0, 1.0),
            discard_stale,
            next_generation: 0,
            outstanding: VecDeque::new(),
            source_track: None,
        })
    }

    pub fn current_track(&self) -> usize {
        self.current
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn track_id(&self, index: usize) -> Option<&str> {
        self.tracks.get(index).map(String::as_str)
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Track whose buffer is currently bound to the source.
    pub fn source_track(&self) -> Option<usize> {
        self.source_track
    }

    pub fn pending_loads(&self) -> usize {
        self.outstanding.len()
    }

    /// Requests the current track; playback starts when the load completes.
    pub fn play(&mut self) -> LoadRequest {
        let request = LoadRequest {
            generation: self.next_generation,
            track: self.current,
            id: self.tracks[self.current].clone(),
        };
        self.next_generation += 1;
        debug!(
            "requesting track {} ({}) generation {}",
            request.track, request.id, request.generation
        );
        self.outstanding.push_back(request.clone());
        request
    }

    /// Pauses a playing source. Returns whether anything changed.
    pub fn pause(&mut self, sink: &mut dyn AudioSink) -> bool {
        if self.status != PlaybackStatus::Playing {
            return false;
        }
        sink.pause();
        self.status = PlaybackStatus::Paused;
        true
    }

    pub fn next(&mut self) -> LoadRequest {
        self.current = (self.current + 1) % self.tracks.len();
        self.play()
    }

    pub fn previous(&mut self) -> LoadRequest {
        let count = self.tracks.len();
        self.current = (self.current + count - 1) % count;
        self.play()
    }

    /// Applies the result of an earlier [`LoadRequest`].
    ///
    /// Failures leave the source untouched. When stale loads are discarded,
    /// only the most recently issued request may swap the buffer.
    pub fn complete_load(
        &mut self,
        generation: u64,
        result: Result<AudioBuffer, LoadError>,
        sink: &mut dyn AudioSink,
    ) -> Result<LoadOutcome, LoadError> {
        let position = self
            .outstanding
            .iter()
            .position(|request| request.generation == generation);
        let is_latest = generation + 1 == self.next_generation;
        let Some(request) = position.and_then(|index| self.outstanding.remove(index)) else {
            debug!("ignoring completion for unknown load generation {generation}");
            return Ok(LoadOutcome::Discarded);
        };

        let buffer = match result {
            Ok(buffer) => buffer,
            Err(err) => {
                warn!("track {} failed to load: {err}", request.id);
                return Err(err);
            }
        };

        if self.discard_stale && !is_latest {
            debug!(
                "discarding stale load of {} (generation {generation})",
                request.id
            );
            return Ok(LoadOutcome::Discarded);
        }

        if self.status == PlaybackStatus::Playing {
            sink.stop();
        }
        sink.start(&buffer, self.volume);
        self.status = PlaybackStatus::Playing;
        self.source_track = Some(request.track);
        info!("playing track {} ({})", request.track, request.id);
        Ok(LoadOutcome::Applied {
            track: request.track,
        })
    }

    /// The non-looping source reached the end of its buffer.
    pub fn on_ended(&mut self) {
        if self.status == PlaybackStatus::Playing {
            self.status = PlaybackStatus::Stopped;
        }
    }

    /// Stops the source and forgets outstanding loads.
    pub fn stop(&mut self, sink: &mut dyn AudioSink) {
        if matches!(self.status, PlaybackStatus::Playing | PlaybackStatus::Paused) {
            sink.stop();
            self.status = PlaybackStatus::Stopped;
        }
        self.outstanding.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{HeadlessAudio, SinkState};

    fn playlist(count: usize) -> Playback {
        let tracks = (0..count).map(|i| format!("Audio/{i}.mp3")).collect();
        Playback::new(tracks, 0.5, true).unwrap()
    }

    fn buffer(request: &LoadRequest) -> Result<AudioBuffer, LoadError> {
        Ok(AudioBuffer::new(request.id.clone(), vec![0; 8]))
    }

    #[test]
    fn empty_playlist_is_rejected() {
        assert_eq!(
            Playback::new(Vec::new(), 0.5, true).unwrap_err(),
            SetupError::EmptyPlaylist
        );
    }

    #[test]
    fn next_wraps_through_all_tracks() {
        let mut playback = playlist(4);
        let seen: Vec<usize> = (0..4).map(|_| playback.next().track).collect();
        assert_eq!(seen, vec![1, 2, 3, 0]);
    }

    #[test]
    fn previous_from_zero_wraps_to_last() {
        let mut playback = playlist(4);
        assert_eq!(playback.previous().track, 3);
    }

    #[test]
    fn next_then_previous_is_identity() {
        for count in 1..6 {
            for start in 0..count {
                let mut playback = playlist(count);
                for _ in 0..start {
                    playback.next();
                }
                assert_eq!(playback.current_track(), start);
                playback.next();
                playback.previous();
                assert_eq!(playback.current_track(), start);
            }
        }
    }

    #[test]
    fn first_play_moves_idle_to_playing_after_load() {
        let mut playback = playlist(2);
        let mut sink = HeadlessAudio::new();
        let request = playback.play();
        assert_eq!(playback.status(), PlaybackStatus::Idle);

        let outcome = playback
            .complete_load(request.generation, buffer(&request), &mut sink)
            .unwrap();
        assert_eq!(outcome, LoadOutcome::Applied { track: 0 });
        assert_eq!(playback.status(), PlaybackStatus::Playing);
        assert_eq!(sink.current(), Some("Audio/0.mp3"));
        assert!((sink.volume() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn play_twice_leaves_one_playing_source() {
        let mut playback = playlist(2);
        let mut sink = HeadlessAudio::new();
        for _ in 0..2 {
            let request = playback.play();
            playback
                .complete_load(request.generation, buffer(&request), &mut sink)
                .unwrap();
        }
        assert_eq!(sink.state(), SinkState::Playing);
        assert_eq!(sink.overlaps(), 0);
        assert_eq!(sink.starts(), 2);
    }

    #[test]
    fn pause_is_noop_unless_playing() {
        let mut playback = playlist(1);
        let mut sink = HeadlessAudio::new();
        assert!(!playback.pause(&mut sink));
        assert_eq!(playback.status(), PlaybackStatus::Idle);

        let request = playback.play();
        playback
            .complete_load(request.generation, buffer(&request), &mut sink)
            .unwrap();
        assert!(playback.pause(&mut sink));
        assert!(!playback.pause(&mut sink));
        assert_eq!(playback.status(), PlaybackStatus::Paused);
        assert_eq!(sink.state(), SinkState::Paused);
    }

    #[test]
    fn failed_load_keeps_previous_track_playing() {
        let mut playback = playlist(3);
        let mut sink = HeadlessAudio::new();
        let first = playback.play();
        playback
            .complete_load(first.generation, buffer(&first), &mut sink)
            .unwrap();

        let second = playback.next();
        let err = playback
            .complete_load(
                second.generation,
                Err(LoadError::Empty {
                    id: second.id.clone(),
                }),
                &mut sink,
            )
            .unwrap_err();
        assert!(matches!(err, LoadError::Empty { .. }));
        assert_eq!(playback.status(), PlaybackStatus::Playing);
        assert_eq!(playback.source_track(), Some(0));
        assert_eq!(sink.current(), Some("Audio/0.mp3"));
        assert_eq!(playback.pending_loads(), 0);
    }

    #[test]
    fn stale_completion_is_discarded() {
        let mut playback = playlist(3);
        let mut sink = HeadlessAudio::new();
        let older = playback.next();
        let newer = playback.next();

        playback
            .complete_load(newer.generation, buffer(&newer), &mut sink)
            .unwrap();
        let outcome = playback
            .complete_load(older.generation, buffer(&older), &mut sink)
            .unwrap();
        assert_eq!(outcome, LoadOutcome::Discarded);
        assert_eq!(sink.current(), Some("Audio/2.mp3"));
    }

    #[test]
    fn last_completion_wins_without_guard() {
        let tracks = vec!["a.mp3".to_string(), "b.mp3".to_string()];
        let mut playback = Playback::new(tracks, 0.5, false).unwrap();
        let mut sink = HeadlessAudio::new();
        let older = playback.play();
        let newer = playback.next();

        playback
            .complete_load(newer.generation, buffer(&newer), &mut sink)
            .unwrap();
        playback
            .complete_load(older.generation, buffer(&older), &mut sink)
            .unwrap();
        assert_eq!(sink.current(), Some("a.mp3"));
        assert_eq!(playback.source_track(), Some(0));
    }

    #[test]
    fn ended_source_is_stopped() {
        let mut playback = playlist(1);
        let mut sink = HeadlessAudio::new();
        let request = playback.play();
        playback
            .complete_load(request.generation, buffer(&request), &mut sink)
            .unwrap();
        playback.on_ended();
        assert_eq!(playback.status(), PlaybackStatus::Stopped);
    }
}
