//! Game layer: the behavior contract and the shared pieces behaviors use
//!
//! A game variant implements [`Behaviors`]: one closed enum per hook
//! category plus the code each tag runs. The scheduler resolves script
//! names against those enums at startup and afterwards calls behaviors
//! with a [`Context`] that lends out the session and timing state.

pub mod cursor;
pub mod difficulty;
pub mod hit;
pub mod hooks;
pub mod maddog;
pub mod save;
pub mod session;

use std::fmt;

use crate::engine::InputState;
use crate::script::{Point, Rect, Scene, Zone};
use cursor::GunState;
use difficulty::ScaleTables;
use hooks::{Hook, SceneHooks};
use save::SaveError;
use session::Session;

/// Sound cues a behavior can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    Shot,
    Empty,
    Saved,
    Loaded,
    Skull,
    Easy,
    Average,
    Hard,
}

/// HUD indicator shown during shootouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Reload,
    Draw,
}

/// Side effects behaviors hand back to the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Cue(Cue),
    /// Mark a hit on the current video frame (screen coordinates)
    BulletHole(Point),
    Indicator(Option<Indicator>),
    SaveGame,
    LoadGame,
}

/// Wall-clock bookkeeping for frame pacing and script pauses (ms)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pacing {
    /// When the next video frame is due
    pub next_frame_time: u32,
    /// Pause end time, 0 when not paused
    pub pause_until: u32,
    /// The current scene already paused once
    pub had_pause: bool,
}

impl Pacing {
    /// Hold video for `duration` ms starting at `now`
    pub fn pause(&mut self, now: u32, duration: u32) {
        self.pause_until = now.wrapping_add(duration);
        self.next_frame_time = self.next_frame_time.wrapping_add(duration);
        self.had_pause = true;
    }

    pub fn is_paused(&self) -> bool {
        self.pause_until != 0
    }

    /// Drop the pause once its deadline has passed
    pub fn expire(&mut self, now: u32) {
        if self.is_paused() && (now.wrapping_sub(self.pause_until) as i32) > 0 {
            self.pause_until = 0;
        }
    }

    /// Shift an active pause after time spent in the menu
    pub fn extend(&mut self, elapsed: u32) {
        if self.had_pause {
            self.pause_until = self.pause_until.wrapping_add(elapsed);
            self.next_frame_time = self.next_frame_time.wrapping_add(elapsed);
        }
    }

    pub fn clear_pause(&mut self) {
        self.pause_until = 0;
        self.had_pause = false;
    }
}

/// Developer switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugOptions {
    pub draw_rects: bool,
    pub god_mode: bool,
}

/// Screen positions of HUD elements
#[derive(Debug, Clone, Copy)]
pub struct HudLayout {
    pub lives: &'static [(u8, u8)],
    pub shots: &'static [(u8, u8)],
    /// Knife marker per difficulty level, index 0 is level 1
    pub difficulty: &'static [(u8, u8)],
    pub score: (i32, i32),
    pub indicator: (i32, i32),
}

/// Fixed numbers a game variant runs with
#[derive(Debug, Clone, Copy)]
pub struct GameConstants {
    pub frame_skip: u32,
    pub screen_size: (u16, u16),
    pub video_pos: (i32, i32),
    pub video_size: (u16, u16),
    pub scales: ScaleTables,
    pub start_lives: i8,
    pub start_shots: u8,
    pub cue_files: &'static [(Cue, &'static str)],
    pub hud: HudLayout,
}

/// Everything a behavior may touch during one call
pub struct Context<'a, P> {
    pub session: &'a mut Session<P>,
    pub gun: &'a mut GunState,
    pub pacing: &'a mut Pacing,
    /// Logical script frame
    pub frame: u32,
    pub frame_skip: u32,
    /// A shot went off this tick
    pub fired: bool,
    pub pointer: Point,
    pub now_ms: u32,
    pub debug: DebugOptions,
    pub(crate) effects: &'a mut Vec<Effect>,
}

impl<'a, P> Context<'a, P> {
    pub fn emit(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn play(&mut self, cue: Cue) {
        self.emit(Effect::Cue(cue));
    }
}

/// A scene together with its resolved hooks
pub struct SceneCall<'s, B: Behaviors> {
    pub scene: &'s Scene,
    pub hooks: SceneHooks<B>,
}

impl<B: Behaviors> Clone for SceneCall<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: Behaviors> Copy for SceneCall<'_, B> {}

/// A game variant's behavior set
pub trait Behaviors: Sized {
    type Progress: Default + Clone + fmt::Debug;

    type ZoneHit: Hook;
    type RectHit: Hook;
    type PreOp: Hook;
    type ShowMsg: Hook;
    type InsOp: Hook;
    type WeaponDown: Hook;
    type Score: Hook;
    type NextFrame: Hook;
    type NextScene: Hook;

    fn constants(&self) -> &GameConstants;

    /// Always-active UI zone, tested before scene zones
    fn menu_zone(&self) -> Zone;

    /// Zone tested while the menu overlay is open
    fn submenu_zone(&self) -> Zone;

    /// Whether a scene's first data parameter is a pause length
    fn scales_pause(&self, pre_op: Self::PreOp) -> bool;

    fn new_game(&mut self, session: &mut Session<Self::Progress>) {
        let c = self.constants();
        session.new_game(c.start_lives, c.start_shots);
    }

    /// Pick the cursor frame for the pointer position
    fn track_pointer(&self, gun: &mut GunState, pointer: Point, in_menu: bool);

    /// Player is holding the gun down to reload
    fn is_weapon_down(&self, input: &InputState) -> bool;

    fn zone_hit(&mut self, hook: Self::ZoneHit, cx: &mut Context<'_, Self::Progress>, at: Point);

    fn rect_hit(&mut self, hook: Self::RectHit, cx: &mut Context<'_, Self::Progress>, rect: &Rect);

    fn pre_op(
        &mut self,
        hook: Self::PreOp,
        cx: &mut Context<'_, Self::Progress>,
        scene: SceneCall<'_, Self>,
    );

    /// Reserved; scripts name it but nothing is shown
    fn show_msg(
        &mut self,
        _hook: Self::ShowMsg,
        _cx: &mut Context<'_, Self::Progress>,
        _scene: SceneCall<'_, Self>,
    ) {
    }

    fn ins_op(
        &mut self,
        hook: Self::InsOp,
        cx: &mut Context<'_, Self::Progress>,
        scene: SceneCall<'_, Self>,
    );

    fn weapon_down(
        &mut self,
        hook: Self::WeaponDown,
        cx: &mut Context<'_, Self::Progress>,
        scene: SceneCall<'_, Self>,
    );

    fn score(
        &mut self,
        hook: Self::Score,
        cx: &mut Context<'_, Self::Progress>,
        scene: SceneCall<'_, Self>,
    );

    fn next_frame(
        &mut self,
        hook: Self::NextFrame,
        cx: &mut Context<'_, Self::Progress>,
        scene: SceneCall<'_, Self>,
    );

    fn next_scene(
        &mut self,
        hook: Self::NextScene,
        cx: &mut Context<'_, Self::Progress>,
        scene: SceneCall<'_, Self>,
    );

    /// A shot that hit nothing
    fn miss(&mut self, cx: &mut Context<'_, Self::Progress>, at: Point);

    /// Trigger pulled with no ammo left
    fn out_of_ammo(&mut self, cx: &mut Context<'_, Self::Progress>);

    /// Jump to a canned game state; false if `slot` is unknown
    fn warp(&mut self, _session: &mut Session<Self::Progress>, _slot: u32) -> bool {
        false
    }

    fn encode_save(&self, session: &Session<Self::Progress>) -> Result<Vec<u8>, SaveError>;

    fn decode_save(
        &mut self,
        session: &mut Session<Self::Progress>,
        bytes: &[u8],
    ) -> Result<(), SaveError>;
}
