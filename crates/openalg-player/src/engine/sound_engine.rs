//! Audio playback via rodio
//!
//! Two channels: one-shot cue sounds (gunshots, menu confirmations) and
//! the scene audio track, which pauses along with the video.

use std::collections::HashMap;
use std::io::Cursor;

use openalg_media::SoundClip;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use crate::game::Cue;

pub struct SoundEngine {
    /// Must stay alive for the handle to work
    _stream: OutputStream,
    handle: OutputStreamHandle,
    cues: HashMap<Cue, SoundClip>,
    cue_sinks: Vec<Sink>,
    scene_sink: Option<Sink>,
}

impl SoundEngine {
    /// None if no audio device is available
    pub fn new(cues: HashMap<Cue, SoundClip>) -> Option<Self> {
        match OutputStream::try_default() {
            Ok((stream, handle)) => {
                tracing::info!("Audio output initialized");
                Some(Self {
                    _stream: stream,
                    handle,
                    cues,
                    cue_sinks: Vec::new(),
                    scene_sink: None,
                })
            }
            Err(e) => {
                tracing::warn!("Failed to initialize audio: {}", e);
                None
            }
        }
    }

    fn start(&self, clip: &SoundClip) -> Option<Sink> {
        let source = match Decoder::new(Cursor::new(clip.to_wav())) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!("Failed to decode clip for playback: {}", e);
                return None;
            }
        };
        match Sink::try_new(&self.handle) {
            Ok(sink) => {
                sink.append(source);
                Some(sink)
            }
            Err(e) => {
                tracing::warn!("Failed to create sink: {}", e);
                None
            }
        }
    }

    pub fn play_cue(&mut self, cue: Cue) {
        self.gc();
        let Some(clip) = self.cues.get(&cue) else {
            tracing::debug!("No sound for {:?}", cue);
            return;
        };
        if let Some(sink) = self.start(clip) {
            self.cue_sinks.push(sink);
        }
    }

    /// Replace the scene track; None just stops the old one
    pub fn start_scene(&mut self, clip: Option<SoundClip>) {
        if let Some(old) = self.scene_sink.take() {
            old.stop();
        }
        self.scene_sink = clip.and_then(|clip| self.start(&clip));
    }

    pub fn pause_scene(&mut self, paused: bool) {
        if let Some(sink) = &self.scene_sink {
            if paused && !sink.is_paused() {
                sink.pause();
            } else if !paused && sink.is_paused() {
                sink.play();
            }
        }
    }

    pub fn stop_all(&mut self) {
        if let Some(sink) = self.scene_sink.take() {
            sink.stop();
        }
        for sink in self.cue_sinks.drain(..) {
            sink.stop();
        }
    }

    /// Drop finished cue sinks
    fn gc(&mut self) {
        self.cue_sinks.retain(|s| !s.empty());
    }
}
