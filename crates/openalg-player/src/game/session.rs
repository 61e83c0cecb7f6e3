//! Per-playthrough session state
//!
//! The scheduler owns one `Session` and lends it to every behavior call.
//! Scene routing uses three names: the scene playing now, a pending
//! return target and a pending sub-scene. When a scene ends, a return
//! target wins; a sub-scene then becomes the next return target.

/// Mutable facts behaviors read and change
#[derive(Debug, Clone, PartialEq)]
pub struct Session<P> {
    /// Scene playing, or requested next. Empty means quit.
    pub cur_scene: String,
    pub ret_scene: Option<String>,
    pub sub_scene: Option<String>,
    /// Where "start game" lands; scripts may move it
    pub start_scene: String,
    pub score: i32,
    pub lives: i8,
    pub shots: u8,
    /// 1 (easy) to 3 (hard)
    pub difficulty: u8,
    pub in_menu: bool,
    pub quit: bool,
    /// Game-specific progress
    pub progress: P,
}

impl<P: Default> Session<P> {
    pub fn new(start_scene: &str) -> Self {
        Session {
            cur_scene: start_scene.to_string(),
            ret_scene: None,
            sub_scene: None,
            start_scene: start_scene.to_string(),
            score: 0,
            lives: 0,
            shots: 0,
            difficulty: 1,
            in_menu: false,
            quit: false,
            progress: P::default(),
        }
    }

    /// Reset counters for a fresh game; progress is kept
    pub fn new_game(&mut self, lives: i8, shots: u8) {
        self.shots = shots;
        self.lives = lives;
        self.score = 0;
        self.sub_scene = None;
    }

    /// Forget all progress and routing, back to level 1
    pub fn reset_progress(&mut self) {
        self.progress = P::default();
        self.difficulty = 1;
        self.ret_scene = None;
        self.sub_scene = None;
    }

    pub fn jump(&mut self, scene: impl Into<String>) {
        self.cur_scene = scene.into();
    }

    /// Apply deferred routing once a scene has finished
    pub fn settle_routing(&mut self) {
        if let Some(ret) = self.ret_scene.take() {
            self.cur_scene = ret;
        }
        if let Some(sub) = self.sub_scene.take() {
            self.ret_scene = Some(sub);
        }
    }
}
