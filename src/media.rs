use log::debug;

use crate::assets::AudioBuffer;

/// Output for the single active audio source.
pub trait AudioSink {
    /// Starts `buffer` from the beginning, replacing whatever the source held.
    fn start(&mut self, buffer: &AudioBuffer, volume: f32);
    fn pause(&mut self);
    fn stop(&mut self);
}

/// The video element backing the video-texture material.
pub trait VideoElement {
    fn play(&mut self);
    fn pause(&mut self);
    fn is_playing(&self) -> bool;
}

/// Observable state of a [`HeadlessAudio`] sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkState {
    Empty,
    Playing,
    Paused,
    Stopped,
}

/// Audio sink that records what a real output would be doing.
#[derive(Debug, Clone)]
pub struct HeadlessAudio {
    state: SinkState,
    current: Option<String>,
    volume: f32,
    starts: usize,
    overlaps: usize,
}

impl Default for HeadlessAudio {
    fn default() -> Self {
        Self {
            state: SinkState::Empty,
            current: None,
            volume: 0.0,
            starts: 0,
            overlaps: 0,
        }
    }
}

impl HeadlessAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SinkState {
        self.state
    }

    /// Identifier of the buffer bound to the source.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn starts(&self) -> usize {
        self.starts
    }

    /// Number of times a buffer was started while another one was still audible.
    pub fn overlaps(&self) -> usize {
        self.overlaps
    }
}

impl AudioSink for HeadlessAudio {
    fn start(&mut self, buffer: &AudioBuffer, volume: f32) {
        if self.state == SinkState::Playing {
            self.overlaps += 1;
        }
        debug!("audio start {} ({} bytes)", buffer.id, buffer.len());
        self.current = Some(buffer.id.clone());
        self.volume = volume;
        self.state = SinkState::Playing;
        self.starts += 1;
    }

    fn pause(&mut self) {
        if self.state == SinkState::Playing {
            self.state = SinkState::Paused;
        }
    }

    fn stop(&mut self) {
        if self.state != SinkState::Empty {
            self.state = SinkState::Stopped;
        }
    }
}

/// Video element stand-in that only tracks its playing flag.
#[derive(Debug, Clone, Default)]
pub struct HeadlessVideo {
    source: Option<String>,
    playing: bool,
}

impl HeadlessVideo {
    pub fn new(source: Option<String>) -> Self {
        Self {
            source,
            playing: false,
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

impl VideoElement for HeadlessVideo {
    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}
