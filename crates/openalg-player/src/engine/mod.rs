//! Frame scheduler and host seams
//!
//! The scheduler is a state machine stepped once per loop iteration:
//!
//! ```text
//! LoadScene -> PlayScene -> Resolve -> LoadScene | Quit
//! ```
//!
//! `PlayScene` lasts until a behavior changes the current scene or the
//! logical frame passes the scene's end frame. The menu overlay runs as a
//! mode of `PlayScene` with video held. Window, audio and input live
//! behind [`Frontend`]; time behind [`Clock`].

pub mod clock;
pub mod headless;
pub mod sound_engine;
pub mod timer;
pub mod window;

use openalg_media::{MediaError, Palette, SoundClip, Surface, VideoDecoder};
use thiserror::Error;

use crate::assets::SceneLibrary;
use crate::game::cursor::{GunCursor, GunState};
use crate::game::difficulty::{self, MAX_LEVEL, MIN_LEVEL};
use crate::game::hit::{active_window, hit_rect, hit_scene};
use crate::game::hooks::{HookTable, RegistryError, ZoneHooks};
use crate::game::save::SaveManager;
use crate::game::session::Session;
use crate::game::{
    Behaviors, Context, Cue, DebugOptions, Effect, HudLayout, Indicator, Pacing, SceneCall,
};
use crate::script::{Bounds, Point, SceneId, SceneInfo, Zone};
use clock::Clock;
use timer::GunTimer;

/// Wall-clock period of one decoded video frame
pub const FRAME_MS: u32 = 100;
/// Longest single sleep, keeps input responsive
pub const MAX_SLEEP_MS: u32 = 15;
/// Advance early when the next frame is this close
const FRAME_SLACK_MS: i32 = 10;
/// Slot used by the in-game save and load buttons
const SAVE_SLOT: u32 = 0;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unknown scene `{0}`")]
    UnknownScene(String),

    #[error("No video entry `{0}` in archive")]
    MissingVideo(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Video decoder failed: {0}")]
    Media(#[from] MediaError),

    #[error("Display error: {0}")]
    Display(String),
}

/// One polled input batch, in screen coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub pointer: Point,
    pub left_down: bool,
    pub right_down: bool,
    pub quit_requested: bool,
}

/// HUD values for the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hud {
    pub score: i32,
    pub lives: i8,
    pub shots: u8,
    pub difficulty: u8,
    pub cursor: GunCursor,
    pub in_menu: bool,
    pub indicator: Option<Indicator>,
}

/// Everything the frontend needs to draw one frame
pub struct FrameView<'a> {
    pub scene: &'a str,
    /// None while the menu holds the video
    pub video: Option<&'a Surface>,
    pub palette: &'a Palette,
    pub palette_changed: bool,
    pub video_pos: (i32, i32),
    /// Debug outlines of active rects, screen coordinates
    pub outlines: &'a [Bounds],
    pub pointer: Point,
    pub hud: Hud,
    pub layout: &'a HudLayout,
}

/// Window, audio and input host
pub trait Frontend {
    fn poll_input(&mut self) -> InputState;

    fn play_cue(&mut self, cue: Cue);

    /// Replace the scene soundtrack; None silences it
    fn start_scene_audio(&mut self, clip: Option<SoundClip>);

    fn pause_scene_audio(&mut self, paused: bool);

    fn present(&mut self, frame: &FrameView<'_>) -> Result<(), EngineError>;
}

/// Why a scene stopped playing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneExit {
    SceneChanged,
    FrameLimitReached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    LoadScene,
    PlayScene(SceneId),
    Resolve(SceneId, SceneExit),
    Quit,
}

struct MenuZones<B: Behaviors> {
    main: Zone,
    main_hooks: ZoneHooks<B>,
    sub: Zone,
    sub_hooks: ZoneHooks<B>,
}

/// Read-only script state lent to a behavior call
struct Graph<'a, B: Behaviors> {
    script: &'a SceneInfo,
    hooks: &'a HookTable<B>,
    menu: &'a MenuZones<B>,
}

impl<'a, B: Behaviors> Graph<'a, B> {
    fn call(&self, id: SceneId) -> SceneCall<'a, B> {
        SceneCall {
            scene: self.script.scene(id),
            hooks: self.hooks.scene(id),
        }
    }
}

pub struct Scheduler<B: Behaviors> {
    script: SceneInfo,
    hooks: HookTable<B>,
    menu: MenuZones<B>,
    game: B,
    session: Session<B::Progress>,
    library: SceneLibrary,
    video: Box<dyn VideoDecoder>,
    frontend: Box<dyn Frontend>,
    clock: Box<dyn Clock>,
    saves: Option<SaveManager>,
    timer: GunTimer,
    gun: GunState,
    pacing: Pacing,
    effects: Vec<Effect>,
    input: InputState,
    button_down: bool,
    /// Logical frame of the playing scene
    frame: u32,
    /// Session name the current scene was entered under
    entered_as: String,
    /// Level the script geometry is currently scaled for
    scaled_for: u8,
    debug: DebugOptions,
    phase: Phase,
    indicator: Option<Indicator>,
    menu_opened_at: Option<u32>,
    ticks: u64,
}

impl<B: Behaviors> Scheduler<B> {
    /// Resolve every behavior name up front; nothing plays on failure
    pub fn new(
        mut game: B,
        script: SceneInfo,
        library: SceneLibrary,
        video: Box<dyn VideoDecoder>,
        frontend: Box<dyn Frontend>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, EngineError> {
        let hooks = HookTable::resolve(&script)?;
        let main = game.menu_zone();
        let sub = game.submenu_zone();
        let menu = MenuZones {
            main_hooks: ZoneHooks::resolve(&main)?,
            sub_hooks: ZoneHooks::resolve(&sub)?,
            main,
            sub,
        };

        let mut session = Session::new(script.start_scene());
        game.new_game(&mut session);

        Ok(Scheduler {
            script,
            hooks,
            menu,
            game,
            session,
            library,
            video,
            frontend,
            clock,
            saves: None,
            timer: GunTimer::default(),
            gun: GunState::default(),
            pacing: Pacing::default(),
            effects: Vec::new(),
            input: InputState::default(),
            button_down: false,
            frame: 0,
            entered_as: String::new(),
            scaled_for: difficulty::BASE_LEVEL,
            debug: DebugOptions::default(),
            phase: Phase::LoadScene,
            indicator: None,
            menu_opened_at: None,
            ticks: 0,
        })
    }

    pub fn with_saves(mut self, saves: SaveManager) -> Self {
        self.saves = Some(saves);
        self
    }

    pub fn with_debug(mut self, debug: DebugOptions) -> Self {
        self.debug = debug;
        self
    }

    /// Jump to a canned game state; only before the first scene loads
    pub fn warp(&mut self, slot: u32) -> bool {
        if self.phase != Phase::LoadScene || self.ticks > 0 {
            return false;
        }
        let warped = self.game.warp(&mut self.session, slot);
        if !warped {
            tracing::warn!("Unknown warp slot {}", slot);
        }
        warped
    }

    pub fn session(&self) -> &Session<B::Progress> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<B::Progress> {
        &mut self.session
    }

    pub fn script(&self) -> &SceneInfo {
        &self.script
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Step until quit, or for at most `max_ticks` iterations
    pub fn run(&mut self, max_ticks: Option<u64>) -> Result<(), EngineError> {
        tracing::info!("Starting at scene {}", self.session.cur_scene);
        while self.step()? {
            if max_ticks.is_some_and(|max| self.ticks >= max) {
                tracing::info!("Stopping after {} ticks", self.ticks);
                break;
            }
        }
        self.frontend.start_scene_audio(None);
        Ok(())
    }

    /// One loop iteration; false once the game has quit
    pub fn step(&mut self) -> Result<bool, EngineError> {
        match self.phase {
            Phase::LoadScene => self.load_scene()?,
            Phase::PlayScene(id) => self.play_tick(id)?,
            Phase::Resolve(id, exit) => self.resolve(id, exit),
            Phase::Quit => return Ok(false),
        }
        self.ticks += 1;
        Ok(self.phase != Phase::Quit)
    }

    /// Hand `f` the behavior set and a context over the session
    fn dispatch<R>(
        &mut self,
        fired: bool,
        f: impl FnOnce(&mut B, &mut Context<'_, B::Progress>, &Graph<'_, B>) -> R,
    ) -> R {
        let now_ms = self.clock.now_ms();
        let frame_skip = self.game.constants().frame_skip;
        let Scheduler {
            script,
            hooks,
            menu,
            game,
            session,
            gun,
            pacing,
            effects,
            input,
            frame,
            debug,
            ..
        } = self;
        let graph = Graph {
            script,
            hooks,
            menu,
        };
        let mut cx = Context {
            session,
            gun,
            pacing,
            frame: *frame,
            frame_skip,
            fired,
            pointer: input.pointer,
            now_ms,
            debug: *debug,
            effects,
        };
        f(game, &mut cx, &graph)
    }

    fn logical_frame(&self, id: SceneId) -> u32 {
        let start = self.script.scene(id).start_frame;
        let skip = self.game.constants().frame_skip;
        match self.video.current_frame() {
            0 => start,
            n => start.saturating_add((n - 1).saturating_mul(skip)),
        }
    }

    fn scene_changed(&self) -> bool {
        self.session.cur_scene != self.entered_as
    }

    fn load_scene(&mut self) -> Result<(), EngineError> {
        let name = self.session.cur_scene.clone();
        let id = self
            .script
            .find_scene(&name)
            .ok_or_else(|| EngineError::UnknownScene(name.clone()))?;
        let scene = self.script.scene(id);
        let entry = SceneLibrary::scene_entry(&scene.name);
        let offset = self
            .library
            .offset(&entry)
            .ok_or_else(|| EngineError::MissingVideo(entry.clone()))?;
        tracing::info!(
            "Scene {} (frames {}..={})",
            scene.name,
            scene.start_frame,
            scene.end_frame
        );
        let start_frame = scene.start_frame;

        self.video.load_video_from_stream(offset)?;
        let audio = self.video.audio_stream();
        self.frontend.start_scene_audio(audio);

        self.entered_as = name;
        self.pacing.next_frame_time = self.clock.now_ms().wrapping_add(FRAME_MS);
        self.frame = start_frame;

        let hooks = self.hooks.scene(id);
        self.dispatch(false, |game, cx, g| game.pre_op(hooks.pre_op, cx, g.call(id)));
        self.settle_effects();

        self.frame = self.logical_frame(id);
        self.phase = self.after_tick(id);
        Ok(())
    }

    fn after_tick(&self, id: SceneId) -> Phase {
        if self.session.quit {
            Phase::Quit
        } else if self.scene_changed() {
            Phase::Resolve(id, SceneExit::SceneChanged)
        } else if self.frame > self.script.scene(id).end_frame {
            Phase::Resolve(id, SceneExit::FrameLimitReached)
        } else {
            Phase::PlayScene(id)
        }
    }

    fn poll(&mut self) -> bool {
        self.input = self.frontend.poll_input();
        if self.input.quit_requested && !self.session.quit {
            tracing::info!("Quit requested");
            self.session.quit = true;
        }
        let fired = self.input.left_down && !self.button_down;
        self.button_down = self.input.left_down;
        fired
    }

    fn play_tick(&mut self, id: SceneId) -> Result<(), EngineError> {
        let now = self.clock.now_ms();
        self.timer.pump(now, &mut self.gun);
        if self.session.in_menu {
            return self.menu_tick(id);
        }

        let fired = self.poll();
        self.game.track_pointer(&mut self.gun, self.input.pointer, false);
        let hooks = self.hooks.scene(id);
        if self.game.is_weapon_down(&self.input) {
            self.dispatch(false, |game, cx, g| game.weapon_down(hooks.weapon_down, cx, g.call(id)));
        }

        // the menu icon overlaps the holster band
        let holstered = matches!(self.gun.cursor, GunCursor::Holstered | GunCursor::Reloading);
        if fired && !self.fire_menu() && !holstered {
            self.fire(id);
        }

        // a rect hit that already moved the scene stands
        if !self.scene_changed() {
            self.dispatch(fired, |game, cx, g| game.ins_op(hooks.ins_op, cx, g.call(id)));
        }
        if !self.scene_changed() {
            self.dispatch(fired, |game, cx, g| game.next_frame(hooks.next_frame, cx, g.call(id)));
        }
        self.settle_effects();

        if self.session.in_menu {
            tracing::debug!("Menu opened in {}", self.entered_as);
            self.phase = self.after_tick(id);
            return Ok(());
        }
        if !self.scene_changed() && !self.session.quit {
            self.frontend.pause_scene_audio(self.pacing.is_paused());
            self.advance_video()?;
            self.frame = self.logical_frame(id);
            self.present(id, true)?;
        }
        self.phase = self.after_tick(id);
        Ok(())
    }

    /// Shots on the menu zone never cost ammo
    fn fire_menu(&mut self) -> bool {
        let at = self.input.pointer;
        let Some(index) = hit_rect(&self.menu.main, at) else {
            return false;
        };
        tracing::debug!("Menu zone hit at ({}, {})", at.x, at.y);
        self.dispatch(true, |game, cx, g| {
            let hooks = &g.menu.main_hooks;
            game.rect_hit(hooks.rects[index], cx, &g.menu.main.rects[index]);
            game.zone_hit(hooks.global_hit, cx, at);
        });
        true
    }

    /// Route a shot into the scene's zones
    fn fire(&mut self, id: SceneId) {
        let at = self.input.pointer;
        if self.session.shots == 0 {
            self.dispatch(true, |game, cx, _| game.out_of_ammo(cx));
            return;
        }
        self.session.shots -= 1;

        let frame_skip = self.game.constants().frame_skip;
        match hit_scene(&self.script, id, self.frame, frame_skip, at) {
            Some(hit) => {
                tracing::debug!(
                    "Hit {} rect {} at frame {}",
                    self.script.zone(hit.zone).name,
                    hit.rect,
                    self.frame
                );
                self.dispatch(true, |game, cx, g| {
                    let hooks = g.hooks.zone(hit.zone);
                    let rect = &g.script.zone(hit.zone).rects[hit.rect];
                    game.rect_hit(hooks.rects[hit.rect], cx, rect);
                    game.zone_hit(hooks.global_hit, cx, at);
                });
            }
            None => self.dispatch(true, |game, cx, _| game.miss(cx, at)),
        }
    }

    /// Video held; only the sub-menu zone takes shots
    fn menu_tick(&mut self, id: SceneId) -> Result<(), EngineError> {
        let now = self.clock.now_ms();
        let opened_at = match self.menu_opened_at {
            Some(at) => at,
            None => {
                self.frontend.pause_scene_audio(true);
                self.menu_opened_at = Some(now);
                now
            }
        };

        let fired = self.poll();
        self.game.track_pointer(&mut self.gun, self.input.pointer, true);
        if fired {
            let at = self.input.pointer;
            if let Some(index) = hit_rect(&self.menu.sub, at) {
                self.dispatch(true, |game, cx, g| {
                    let hooks = &g.menu.sub_hooks;
                    game.rect_hit(hooks.rects[index], cx, &g.menu.sub.rects[index]);
                });
            }
        }
        self.settle_effects();

        let closed = !self.session.in_menu || self.session.quit || self.scene_changed();
        if closed {
            let elapsed = self.clock.now_ms().wrapping_sub(opened_at);
            self.pacing.extend(elapsed);
            self.menu_opened_at = None;
            self.session.in_menu = false;
            self.frontend.pause_scene_audio(self.pacing.is_paused());
            tracing::debug!("Menu closed after {} ms", elapsed);
        } else {
            self.present(id, false)?;
            self.clock.sleep_ms(MAX_SLEEP_MS);
        }
        self.phase = self.after_tick(id);
        Ok(())
    }

    /// Step the decoder when the next frame is due, otherwise nap briefly
    fn advance_video(&mut self) -> Result<(), EngineError> {
        if self.video.current_frame() == 0 {
            self.video.next_frame()?;
        }
        let now = self.clock.now_ms();
        let mut remaining = self.pacing.next_frame_time.wrapping_sub(now) as i32;
        if remaining < FRAME_SLACK_MS {
            if self.video.current_frame() > 0 {
                self.video.next_frame()?;
            }
            let now = self.clock.now_ms();
            remaining = self.pacing.next_frame_time.wrapping_sub(now) as i32;
            self.pacing.next_frame_time = now
                .wrapping_add(remaining.max(0) as u32)
                .wrapping_add(FRAME_MS);
        }
        if remaining > 0 {
            self.clock.sleep_ms((remaining as u32).min(MAX_SLEEP_MS));
        }
        Ok(())
    }

    fn resolve(&mut self, id: SceneId, exit: SceneExit) {
        self.pacing.clear_pause();
        if exit == SceneExit::FrameLimitReached {
            let hooks = self.hooks.scene(id);
            self.dispatch(false, |game, cx, g| game.score(hooks.score, cx, g.call(id)));
        }
        self.session.settle_routing();
        if !self.scene_changed() {
            let hooks = self.hooks.scene(id);
            self.dispatch(false, |game, cx, g| game.next_scene(hooks.next_scene, cx, g.call(id)));
        }
        self.settle_effects();

        self.phase = if self.session.quit || self.session.cur_scene.is_empty() {
            tracing::info!("Game over, final score {}", self.session.score);
            Phase::Quit
        } else {
            tracing::debug!("{} -> {} ({:?})", self.entered_as, self.session.cur_scene, exit);
            Phase::LoadScene
        };
    }

    fn settle_effects(&mut self) {
        self.apply_effects();
        self.reconcile_difficulty();
    }

    fn apply_effects(&mut self) {
        for effect in std::mem::take(&mut self.effects) {
            match effect {
                Effect::Cue(cue) => self.frontend.play_cue(cue),
                Effect::BulletHole(at) => {
                    let (vx, vy) = self.game.constants().video_pos;
                    self.video
                        .video_frame_mut()
                        .draw_marker(at.x - vx, at.y - vy, Palette::OUTLINE);
                }
                Effect::Indicator(indicator) => self.indicator = indicator,
                Effect::SaveGame => self.save_game(),
                Effect::LoadGame => self.load_game(),
            }
        }
    }

    fn save_game(&self) {
        let Some(saves) = &self.saves else {
            tracing::warn!("Save requested but no save directory is set");
            return;
        };
        let written = self
            .game
            .encode_save(&self.session)
            .and_then(|bytes| saves.write(SAVE_SLOT, &bytes));
        if let Err(e) = written {
            tracing::warn!("Save failed: {}", e);
        }
    }

    fn load_game(&mut self) {
        let Some(saves) = &self.saves else {
            tracing::warn!("Load requested but no save directory is set");
            return;
        };
        match saves.read(SAVE_SLOT) {
            Ok(Some(bytes)) => match self.game.decode_save(&mut self.session, &bytes) {
                Ok(()) => tracing::info!("Loaded game at {}", self.session.cur_scene),
                Err(e) => tracing::warn!("Ignoring save slot {}: {}", SAVE_SLOT, e),
            },
            Ok(None) => tracing::debug!("No saved game in slot {}", SAVE_SLOT),
            Err(e) => tracing::warn!("Failed to read save slot {}: {}", SAVE_SLOT, e),
        }
    }

    /// Rescale the script once per difficulty change, however it happened
    fn reconcile_difficulty(&mut self) {
        let level = self.session.difficulty.clamp(MIN_LEVEL, MAX_LEVEL);
        self.session.difficulty = level;
        let old = self.scaled_for;
        let tables = self.game.constants().scales;
        let game = &self.game;
        let hooks = &self.hooks;
        if difficulty::rescale(&mut self.script, &tables, old, level, |id, _| {
            game.scales_pause(hooks.scene(id).pre_op)
        }) {
            self.scaled_for = level;
        }
    }

    fn present(&mut self, id: SceneId, show_video: bool) -> Result<(), EngineError> {
        let frame_skip = self.game.constants().frame_skip;
        let outlines: Vec<Bounds> = if self.debug.draw_rects && show_video {
            self.script
                .scene_zones(id)
                .filter(|zone| active_window(zone, frame_skip).contains(&self.frame))
                .flat_map(|zone| zone.rects.iter().map(|rect| rect.bounds))
                .collect()
        } else {
            Vec::new()
        };
        let palette_changed = self.video.is_palette_dirty();
        let constants = self.game.constants();
        let view = FrameView {
            scene: &self.session.cur_scene,
            video: if show_video {
                Some(self.video.video_frame())
            } else {
                None
            },
            palette: self.video.palette(),
            palette_changed,
            video_pos: constants.video_pos,
            outlines: &outlines,
            pointer: self.input.pointer,
            hud: Hud {
                score: self.session.score,
                lives: self.session.lives,
                shots: self.session.shots,
                difficulty: self.session.difficulty,
                cursor: self.gun.cursor,
                in_menu: self.session.in_menu,
                indicator: self.indicator,
            },
            layout: &constants.hud,
        };
        self.frontend.present(&view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::maddog::MadDog;
    use clock::ManualClock;
    use headless::HeadlessFrontend;
    use openalg_media::BlankDecoder;
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;

    const SCRIPT: &str = "\
ZONE targets 0 1000
RECT 100 50 140 90 scene2 25 DEFAULT 0
;
SCENE scene1 0 1000
ZONES targets
NXTSCN DEFAULT
NEXT scene2
;
SCENE scene2 0 30
NEXT scene3
;
SCENE scene3 0 30
;
START scene1
";

    fn press(x: i32, y: i32) -> InputState {
        InputState {
            pointer: Point::new(x, y),
            left_down: true,
            ..Default::default()
        }
    }

    fn release(x: i32, y: i32) -> InputState {
        InputState {
            pointer: Point::new(x, y),
            ..Default::default()
        }
    }

    /// Every scene gets a 4-byte segment in one in-memory archive
    fn video(info: &SceneInfo) -> (SceneLibrary, Box<dyn VideoDecoder>) {
        let mut bytes = Vec::new();
        let mut entries = Vec::new();
        for scene in info.scenes() {
            entries.push((SceneLibrary::scene_entry(&scene.name), bytes.len() as u32));
            bytes.extend_from_slice(&4u32.to_le_bytes());
        }
        let library = SceneLibrary::from_entries(entries.iter().map(|(n, o)| (n.as_str(), *o)));
        let mut decoder = BlankDecoder::new(264, 160);
        decoder.set_stream(Box::new(Cursor::new(bytes)));
        (library, Box::new(decoder))
    }

    fn scheduler(
        text: &str,
        inputs: Vec<InputState>,
    ) -> (Scheduler<MadDog>, Rc<RefCell<Vec<Cue>>>, ManualClock) {
        let info = SceneInfo::parse(text).unwrap();
        let (library, decoder) = video(&info);
        let frontend = HeadlessFrontend::with_inputs(inputs);
        let cues = frontend.cue_log();
        let clock = ManualClock::new();
        let sched = Scheduler::new(
            MadDog::new(Some(7)),
            info,
            library,
            decoder,
            Box::new(frontend),
            Box::new(clock.clone()),
        )
        .unwrap();
        (sched, cues, clock)
    }

    #[test]
    fn rect_hit_moves_to_target_scene() {
        let inputs = vec![release(120, 70), press(120, 70), release(120, 70)];
        let (mut sched, cues, _) = scheduler(SCRIPT, inputs);

        sched.step().unwrap();
        assert!(matches!(sched.phase(), Phase::PlayScene(_)));
        sched.step().unwrap();
        sched.step().unwrap();
        assert_eq!(sched.session().cur_scene, "scene2");
        assert_eq!(sched.session().score, 25);
        assert_eq!(sched.session().shots, 5);
        assert!(matches!(
            sched.phase(),
            Phase::Resolve(_, SceneExit::SceneChanged)
        ));
        assert_eq!(cues.borrow().as_slice(), &[Cue::Shot]);

        sched.step().unwrap();
        assert_eq!(sched.phase(), Phase::LoadScene);
        sched.step().unwrap();
        let scene2 = sched.script().find_scene("scene2").unwrap();
        assert_eq!(sched.phase(), Phase::PlayScene(scene2));
    }

    #[test]
    fn rect_hit_beats_shoot_past() {
        let script = "\
ZONE targets 0 1000
RECT 100 50 140 90 scene2 25 DEFAULT 0
;
SCENE scene1 0 1000
ZONES targets
INSOP SHOOTPAST
NXTSCN DEFAULT
NEXT scene3
;
SCENE scene2 0 30
;
SCENE scene3 0 30
;
START scene1
";
        let inputs = vec![press(120, 70), release(120, 70)];
        let (mut sched, _, _) = scheduler(script, inputs);
        sched.step().unwrap();
        sched.step().unwrap();
        assert_eq!(sched.session().cur_scene, "scene2");
        assert_eq!(sched.session().score, 25);
    }

    #[test]
    fn shoot_past_on_a_miss_takes_next() {
        let script = "\
SCENE scene1 0 1000
INSOP SHOOTPAST
NXTSCN DEFAULT
NEXT scene3
;
SCENE scene3 0 30
;
START scene1
";
        let inputs = vec![press(300, 20), release(300, 20)];
        let (mut sched, _, _) = scheduler(script, inputs);
        sched.step().unwrap();
        sched.step().unwrap();
        assert_eq!(sched.session().cur_scene, "scene3");
    }

    #[test]
    fn seventh_shot_clicks_empty() {
        let mut inputs = Vec::new();
        for _ in 0..7 {
            inputs.push(press(300, 20));
            inputs.push(release(300, 20));
        }
        let (mut sched, cues, _) = scheduler(SCRIPT, inputs);

        sched.step().unwrap();
        for _ in 0..12 {
            sched.step().unwrap();
        }
        assert_eq!(sched.session().shots, 0);
        assert_eq!(cues.borrow().iter().filter(|&&c| c == Cue::Shot).count(), 6);

        sched.step().unwrap();
        sched.step().unwrap();
        assert_eq!(sched.session().shots, 0);
        assert_eq!(cues.borrow().last(), Some(&Cue::Empty));
        assert_eq!(sched.session().cur_scene, "scene1");
    }

    #[test]
    fn held_button_fires_once() {
        let inputs = vec![press(300, 20), press(300, 20), press(300, 20)];
        let (mut sched, _, _) = scheduler(SCRIPT, inputs);
        for _ in 0..4 {
            sched.step().unwrap();
        }
        assert_eq!(sched.session().shots, 5);
    }

    #[test]
    fn frame_limit_follows_next_scene() {
        let (mut sched, _, _) = scheduler(SCRIPT, Vec::new());
        sched.session_mut().cur_scene = "scene2".to_string();
        sched.step().unwrap();
        let scene2 = sched.script().find_scene("scene2").unwrap();

        let mut guard = 0;
        while sched.phase() == Phase::PlayScene(scene2) {
            sched.step().unwrap();
            guard += 1;
            assert!(guard < 200, "scene never ended");
        }
        assert!(sched.frame() > 30);
        assert_eq!(
            sched.phase(),
            Phase::Resolve(scene2, SceneExit::FrameLimitReached)
        );
        sched.step().unwrap();
        assert_eq!(sched.session().cur_scene, "scene3");
    }

    #[test]
    fn logical_frame_advances_by_frame_skip() {
        let (mut sched, _, clock) = scheduler(SCRIPT, Vec::new());
        sched.step().unwrap();
        assert_eq!(sched.frame(), 0);
        sched.step().unwrap();
        assert_eq!(sched.frame(), 0);
        clock.advance(FRAME_MS);
        sched.step().unwrap();
        assert_eq!(sched.frame(), 3);
    }

    #[test]
    fn pending_return_scene_wins() {
        let inputs = vec![press(120, 70), release(120, 70)];
        let (mut sched, _, _) = scheduler(SCRIPT, inputs);
        sched.step().unwrap();
        sched.session_mut().sub_scene = Some("scene1".to_string());

        // scene1 -> scene2 by rect hit; the pending sub becomes the return
        sched.step().unwrap();
        sched.step().unwrap();
        assert_eq!(sched.session().ret_scene.as_deref(), Some("scene1"));
        sched.step().unwrap();
        assert_eq!(sched.session().cur_scene, "scene2");

        // scene2 runs out and routes back instead of to its NEXT
        let mut guard = 0;
        while sched.phase() != Phase::LoadScene || sched.session().cur_scene == "scene2" {
            sched.step().unwrap();
            guard += 1;
            assert!(guard < 200, "never left scene2");
        }
        assert_eq!(sched.session().cur_scene, "scene1");
        assert_eq!(sched.session().ret_scene, None);
    }

    #[test]
    fn menu_changes_difficulty_and_rescales() {
        // menu icon, then the hard knife, then continue
        let inputs = vec![
            press(0x20, 0xB0),
            release(0x20, 0xB0),
            press(0x50, 0x80),
            release(0x50, 0x80),
            press(0x90, 0x65),
            release(0x90, 0x65),
        ];
        let (mut sched, cues, _) = scheduler(SCRIPT, inputs);
        let zone = sched.script().find_zone("targets").unwrap();
        let before = sched.script().zone(zone).rects[0].bounds;

        sched.step().unwrap();
        sched.step().unwrap();
        assert!(sched.session().in_menu);
        assert_eq!(sched.session().shots, 6);

        for _ in 0..3 {
            sched.step().unwrap();
        }
        assert_eq!(sched.session().difficulty, 3);
        assert!(cues.borrow().contains(&Cue::Hard));
        let after = sched.script().zone(zone).rects[0].bounds;
        assert_eq!(after.width(), before.width() / 2);

        for _ in 0..2 {
            sched.step().unwrap();
        }
        assert!(!sched.session().in_menu);
        assert!(matches!(sched.phase(), Phase::PlayScene(_)));
    }

    #[test]
    fn menu_icon_edge_opens_menu_over_holster() {
        // right edge of the menu icon, inside the holster band
        let inputs = vec![press(60, 180), release(60, 180)];
        let (mut sched, _, _) = scheduler(SCRIPT, inputs);
        sched.step().unwrap();
        sched.step().unwrap();
        assert!(sched.session().in_menu);
        assert_eq!(sched.session().shots, 6);
    }

    #[test]
    fn menu_save_then_load_restores_state() {
        let dir = std::env::temp_dir().join("openalg_test_engine_saves");
        let _ = std::fs::remove_dir_all(&dir);
        let inputs = vec![
            press(0x20, 0xB0),
            release(0x20, 0xB0),
            press(0xF0, 0x40),
            release(0xF0, 0x40),
        ];
        let (sched, cues, _) = scheduler(SCRIPT, inputs);
        let mut sched = sched.with_saves(SaveManager::new(&dir, "maddog"));
        sched.step().unwrap();
        sched.session_mut().progress.been_to = 0x21;
        for _ in 0..4 {
            sched.step().unwrap();
        }
        assert!(cues.borrow().contains(&Cue::Saved));
        assert!(dir.join("maddog.000").exists());

        sched.session_mut().progress.been_to = 0;
        sched.load_game();
        assert_eq!(sched.session().progress.been_to, 0x21);
        assert_eq!(sched.session().cur_scene, "scene1");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn quit_request_stops_the_loop() {
        let inputs = vec![InputState {
            quit_requested: true,
            ..Default::default()
        }];
        let (mut sched, _, _) = scheduler(SCRIPT, inputs);
        sched.run(Some(100)).unwrap();
        assert_eq!(sched.phase(), Phase::Quit);
        assert_eq!(sched.ticks(), 2);
    }

    #[test]
    fn unknown_scene_is_fatal() {
        let (mut sched, _, _) = scheduler(SCRIPT, Vec::new());
        sched.session_mut().cur_scene = "scene99".to_string();
        assert!(matches!(sched.step(), Err(EngineError::UnknownScene(_))));
    }

    #[test]
    fn warp_only_before_play() {
        let (mut sched, _, _) = scheduler(SCRIPT, Vec::new());
        assert!(sched.warp(5));
        assert_eq!(sched.session().cur_scene, "scene227");
        assert!(!sched.warp(99));
    }
}
