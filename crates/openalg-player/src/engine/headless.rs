//! Frontend without window or audio
//!
//! Replays a queue of input batches, holding the last one once the queue
//! runs dry, and records every cue it is asked to play.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use openalg_media::SoundClip;

use super::{EngineError, FrameView, Frontend, InputState};
use crate::game::Cue;

#[derive(Default)]
pub struct HeadlessFrontend {
    inputs: VecDeque<InputState>,
    last: InputState,
    cues: Rc<RefCell<Vec<Cue>>>,
    frames: u64,
}

impl HeadlessFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inputs(inputs: impl IntoIterator<Item = InputState>) -> Self {
        HeadlessFrontend {
            inputs: inputs.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Shared log of played cues, readable after the scheduler takes ownership
    pub fn cue_log(&self) -> Rc<RefCell<Vec<Cue>>> {
        Rc::clone(&self.cues)
    }
}

impl Frontend for HeadlessFrontend {
    fn poll_input(&mut self) -> InputState {
        if let Some(input) = self.inputs.pop_front() {
            self.last = input;
        }
        self.last
    }

    fn play_cue(&mut self, cue: Cue) {
        tracing::trace!("Cue {:?}", cue);
        self.cues.borrow_mut().push(cue);
    }

    fn start_scene_audio(&mut self, _clip: Option<SoundClip>) {}

    fn pause_scene_audio(&mut self, _paused: bool) {}

    fn present(&mut self, frame: &FrameView<'_>) -> Result<(), EngineError> {
        self.frames += 1;
        if self.frames % 100 == 0 {
            tracing::debug!(
                "{} frames presented, scene {} score {}",
                self.frames,
                frame.scene,
                frame.hud.score
            );
        }
        Ok(())
    }
}
