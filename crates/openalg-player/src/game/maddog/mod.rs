//! Mad Dog McCree
//!
//! The behavior set for the first ALG game. Town locations, the mine,
//! the trail and the hotel are routed through progress bitmasks in
//! [`MadDogProgress`]; every random pick goes through the game's own
//! seeded generator.

pub mod hooks;
pub mod progress;
pub mod routes;

pub use hooks::{InsOp, NextFrame, NextScene, PreOp, RectHit, Score, ShowMsg, WeaponDown, ZoneHit};
pub use progress::MadDogProgress;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::cursor::{GunCursor, GunState};
use super::difficulty::ScaleTables;
use super::save::SaveError;
use super::session::Session;
use super::{Behaviors, Context, Cue, Effect, GameConstants, HudLayout, Indicator, SceneCall};
use crate::engine::InputState;
use crate::script::{Bounds, Point, Rect, Scene, Zone};
use progress::{
    BANK, BOTTLE_TOSS, HIDEOUT, HOTEL, MINE, OFFICE, PROSPECTOR, SALOON, SIGNPOST, STABLE,
};
use routes::scene;

/// Pointer x below this is over the HUD strip
const HUD_EDGE_X: i32 = 59;
/// Pointer y above this is over the holster strip
const HOLSTER_Y: i32 = 166;
/// Right button below this line reloads
const WEAPON_DOWN_Y: i32 = 168;
const EMPTY_CLICK_TICKS: u8 = 3;
const RELOAD_TICKS: u8 = 9;
/// Script pause units to milliseconds, times 1000
const PAUSE_UNIT: u64 = 0x90FF;

/// Scene that stands for "pick the next town location"
const TOWN_SQUARE: &str = "scene28";

/// Saloon timeline, in logical frames
const SALOON_ENTERED: u32 = 7561;
const SALOON_SKIP_FROM: u32 = 7165;
const SALOON_SKIP_TO: u32 = 7817;
const BARTENDER_SHOT: u32 = 7909;

static CUE_FILES: [(Cue, &str); 8] = [
    (Cue::Shot, "blow.8b"),
    (Cue::Empty, "empty.8b"),
    (Cue::Saved, "saved.8b"),
    (Cue::Loaded, "loaded.8b"),
    (Cue::Skull, "skull.8b"),
    (Cue::Easy, "deputy.8b"),
    (Cue::Average, "sheriff.8b"),
    (Cue::Hard, "marshall.8b"),
];

static LIVES_POS: [(u8, u8); 3] = [(0x03, 0x5E), (0x03, 0x76), (0x03, 0x8E)];

static SHOTS_POS: [(u8, u8); 12] = [
    (0x03, 0x05),
    (0x0D, 0x05),
    (0x17, 0x05),
    (0x21, 0x05),
    (0x03, 0x21),
    (0x0D, 0x21),
    (0x17, 0x21),
    (0x21, 0x21),
    (0x03, 0x3D),
    (0x0D, 0x3D),
    (0x17, 0x3D),
    (0x21, 0x3D),
];

static DIFFICULTY_POS: [(u8, u8); 3] = [(0x4D, 0x43), (0x4E, 0x66), (0x4F, 0x80)];

pub const CONSTANTS: GameConstants = GameConstants {
    frame_skip: 3,
    screen_size: (320, 200),
    video_pos: (56, 8),
    video_size: (264, 160),
    scales: ScaleTables {
        pause: [0x0100_0000, 0x0080_0000, 0x0040_0000],
        rect: [0x0100_0000, 0x00C0_0000, 0x0080_0000],
    },
    start_lives: 3,
    start_shots: 6,
    cue_files: &CUE_FILES,
    hud: HudLayout {
        lives: &LIVES_POS,
        shots: &SHOTS_POS,
        difficulty: &DIFFICULTY_POS,
        score: (0xDC, 0xAD),
        indicator: (0x40, 0xB0),
    },
};

fn menu_rect(left: i16, top: i16, right: i16, bottom: i16, hit: &str) -> Rect {
    Rect::new(Bounds::new(left, top, right, bottom), "", 0, hit)
}

fn on_video(at: Point) -> bool {
    at.x >= HUD_EDGE_X && at.y <= HOLSTER_Y
}

/// `#<min>to<max>` shootout window
fn parse_window(param: &str) -> Option<(u32, u32)> {
    let (min, max) = param.strip_prefix('#')?.split_once("to")?;
    Some((min.trim().parse().ok()?, max.trim().parse().ok()?))
}

/// Leading digits of a frame parameter, 0 when there are none
fn param_frame(param: &str) -> u32 {
    let digits: String = param.trim().chars().take_while(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

pub struct MadDog {
    constants: GameConstants,
    rng: StdRng,
}

impl MadDog {
    /// A fixed seed makes every random pick reproducible
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        MadDog {
            constants: CONSTANTS,
            rng,
        }
    }

    pub fn with_frame_skip(mut self, frame_skip: u32) -> Self {
        self.constants.frame_skip = frame_skip.max(1);
        self
    }

    fn bullet_hole(&mut self, cx: &mut Context<'_, MadDogProgress>, at: Point, cue: Cue) {
        if on_video(at) {
            cx.emit(Effect::BulletHole(at));
            cx.gun.fire();
            cx.play(cue);
        }
    }

    fn reset_params(&self, session: &mut Session<MadDogProgress>) {
        session.reset_progress();
        self.new_game_counters(session);
    }

    fn new_game_counters(&self, session: &mut Session<MadDogProgress>) {
        session.new_game(self.constants.start_lives, self.constants.start_shots);
    }

    /// Pre-ops on the town square roll the next location
    fn town_square(&mut self, cx: &mut Context<'_, MadDogProgress>, current: &Scene) {
        if current.name == TOWN_SQUARE {
            let next = routes::pick_town(&mut cx.session.progress);
            cx.session.jump(next);
        }
    }

    /// Hold the video once when the frame reaches `start`
    fn timed_pause(&mut self, cx: &mut Context<'_, MadDogProgress>, current: &Scene, start: u32) {
        let length = current.pause_param();
        if !cx.pacing.had_pause && cx.frame <= current.end_frame && length > 0 {
            let end = start.saturating_add(cx.frame_skip + 1);
            if (start..end).contains(&cx.frame) {
                let duration = (length as u64 * PAUSE_UNIT / 1000) as u32;
                tracing::debug!(
                    "Pausing {} for {}ms at frame {}",
                    current.name,
                    duration,
                    cx.frame
                );
                cx.pacing.pause(cx.now_ms, duration);
            }
        }
        cx.pacing.expire(cx.now_ms);
    }

    fn skip_saloon(&mut self, cx: &mut Context<'_, MadDogProgress>, current: &Scene) {
        let target = &current.ins_op.param;
        let p = &mut cx.session.progress;
        if p.got_into & SALOON != 0 && cx.frame < SALOON_ENTERED {
            cx.session.jump(target.clone());
            cx.pacing.pause_until = 0;
            return;
        }
        if cx.frame > SALOON_ENTERED {
            p.got_into |= SALOON;
        }
        if cx.fired && cx.frame > SALOON_SKIP_FROM && cx.frame < SALOON_SKIP_TO {
            cx.session.jump(target.clone());
        }
    }

    fn shootout(&mut self, cx: &mut Context<'_, MadDogProgress>, call: SceneCall<'_, Self>) {
        let p = &mut cx.session.progress;
        if cx.frame <= p.min_f {
            return;
        }
        let was_waiting = std::mem::replace(&mut p.in_shootout, false);
        let max_f = p.max_f;
        if was_waiting {
            cx.emit(Effect::Indicator(Some(Indicator::Draw)));
        }
        if cx.session.shots != 0 && cx.frame < max_f {
            self.next_scene(call.hooks.next_scene, cx, call);
        }
    }

    /// A shot skips ahead to the pending scene or the next one
    fn shoot_past(&mut self, cx: &mut Context<'_, MadDogProgress>, call: SceneCall<'_, Self>) {
        if !cx.fired {
            return;
        }
        if let Some(ret) = cx.session.ret_scene.take() {
            cx.session.jump(ret);
        } else if let Some(sub) = cx.session.sub_scene.take() {
            cx.session.jump(sub);
        } else {
            self.next_scene(call.hooks.next_scene, cx, call);
        }
    }

    fn mine_item(&mut self, cx: &mut Context<'_, MadDogProgress>, clue: u8) {
        let p = &mut cx.session.progress;
        if p.pro_clue != clue {
            cx.pacing.pause_until = 0;
            return;
        }
        if p.had_lantern {
            let next = routes::pick_map(p, &mut self.rng);
            cx.session.jump(next);
        } else {
            p.got_clue = true;
        }
    }

    fn menu_select(&mut self, cx: &mut Context<'_, MadDogProgress>) {
        let Point { x, y } = cx.pointer;
        let p = &cx.session.progress;
        let (location, entered, cleared) = match (x < 184, y < 88) {
            (true, true) => (STABLE, scene(130), scene(122)),
            (true, false) => {
                let office = if p.been_to & SALOON != 0 { scene(118) } else { scene(119) };
                (OFFICE, office, scene(114))
            }
            (false, true) => (SALOON, "scene69b".to_string(), scene(67)),
            (false, false) => (BANK, String::new(), scene(45)),
        };
        if p.been_to & location != 0 {
            return;
        }
        if p.got_into & location == 0 {
            cx.session.jump(cleared);
        } else if location == BANK {
            self.bank(cx);
        } else {
            cx.session.jump(entered);
        }
    }

    /// Player shot a bystander
    fn kill(&mut self, cx: &mut Context<'_, MadDogProgress>, first_scene: u32) {
        if !cx.debug.god_mode {
            cx.session.lives -= 1;
        }
        let p = &mut cx.session.progress;
        let sub = if cx.session.lives <= 0 {
            cx.session.lives = 0;
            scene(212)
        } else {
            routes::pick_town(p)
        };
        p.bad_men_bits = 0;
        p.bad_men = 0;
        p.people_killed = p.people_killed.wrapping_add(1);
        let next = if p.people_killed == 1 {
            scene(first_scene)
        } else {
            scene(156 + (p.people_killed & 1) as u32)
        };
        cx.session.sub_scene = Some(sub);
        cx.session.jump(next);
    }

    fn died(&mut self, cx: &mut Context<'_, MadDogProgress>, current: &Scene) {
        let p = &mut cx.session.progress;
        p.had_skull = false;
        p.bad_men_bits = 0;
        p.bad_men = 0;
        p.got_clue = false;
        p.had_lantern = false;
        if !cx.debug.god_mode {
            cx.session.lives -= 1;
        }
        if cx.session.lives <= 0 {
            cx.session.lives = 0;
            cx.session.sub_scene = Some(scene(255));
        } else if cx.session.cur_scene == TOWN_SQUARE {
            cx.session.ret_scene = Some(routes::pick_town(&mut cx.session.progress));
        } else {
            cx.session.ret_scene = Some(current.next.clone());
        }
        let next = routes::death_scene(cx.session.lives, &mut self.rng);
        tracing::info!("Player died, {} lives left", cx.session.lives);
        cx.session.jump(next);
    }

    fn bank(&mut self, cx: &mut Context<'_, MadDogProgress>) {
        let total = cx.session.difficulty * 2 + 6;
        let p = &mut cx.session.progress;
        p.bad_men += 1;
        let next = if p.bad_men > total + 2 {
            p.been_to |= BANK;
            p.bad_men_bits = 0;
            p.bad_men = 0;
            p.hide_out_front = self.rng.gen();
            if p.hide_out_front {
                scene(49)
            } else {
                scene(48)
            }
        } else if p.bad_men > total {
            scene(65)
        } else {
            scene(routes::pick_bad(6, p, &mut self.rng) as u32 + 51)
        };
        cx.session.jump(next);
    }

    /// Count a shot bad man; past `total` the fight moves on via `done`
    fn gunfight(
        &mut self,
        cx: &mut Context<'_, MadDogProgress>,
        total: u8,
        slots: u8,
        base: u32,
        done: impl FnOnce(&mut MadDogProgress) -> String,
    ) {
        let p = &mut cx.session.progress;
        p.bad_men += 1;
        let next = if p.bad_men > total {
            p.bad_men_bits = 0;
            p.bad_men = 0;
            done(p)
        } else {
            scene(routes::pick_bad(slots, p, &mut self.rng) as u32 + base)
        };
        cx.session.jump(next);
    }

    fn default_next(&mut self, cx: &mut Context<'_, MadDogProgress>, current: &Scene) {
        // wipe the shootout indicator
        cx.emit(Effect::Indicator(None));
        let next = if current.next == TOWN_SQUARE {
            routes::pick_town(&mut cx.session.progress)
        } else {
            current.next.clone()
        };
        cx.session.jump(next);
    }

    fn set_difficulty(&mut self, cx: &mut Context<'_, MadDogProgress>, level: u8, cue: Cue) {
        cx.play(cue);
        cx.session.difficulty = level;
    }
}

impl Behaviors for MadDog {
    type Progress = MadDogProgress;

    type ZoneHit = ZoneHit;
    type RectHit = RectHit;
    type PreOp = PreOp;
    type ShowMsg = ShowMsg;
    type InsOp = InsOp;
    type WeaponDown = WeaponDown;
    type Score = Score;
    type NextFrame = NextFrame;
    type NextScene = NextScene;

    fn constants(&self) -> &GameConstants {
        &self.constants
    }

    fn menu_zone(&self) -> Zone {
        Zone::new("MainMenu", 0, u32::MAX)
            .with_global_hit("GLOBALHIT")
            .with_rect(menu_rect(0x0C, 0xAC, 0x3D, 0xBF, "SHOTMENU"))
            .with_rect(menu_rect(0x00, 0xA6, 0x013F, 0xC7, "DEFAULT"))
            .with_rect(menu_rect(0x00, 0x00, 0x3B, 0xC7, "DEFAULT"))
    }

    fn submenu_zone(&self) -> Zone {
        Zone::new("SubMenu", 0, u32::MAX)
            .with_global_hit("GLOBALHIT")
            .with_rect(menu_rect(0x8A, 0x3B, 0xC2, 0x48, "STARTBOT"))
            .with_rect(menu_rect(0x8A, 0x4E, 0xC2, 0x59, "STARTMENU"))
            .with_rect(menu_rect(0x8A, 0x60, 0xC2, 0x6B, "CONTMENU"))
            .with_rect(menu_rect(0xE3, 0x3B, 0x011B, 0x48, "RECTSAVE"))
            .with_rect(menu_rect(0xE3, 0x4E, 0x011B, 0x59, "RECTLOAD"))
            .with_rect(menu_rect(0xE3, 0x60, 0x011B, 0x6B, "EXITMENU"))
            .with_rect(menu_rect(0x42, 0x34, 0x5C, 0x4E, "RECTEASY"))
            .with_rect(menu_rect(0x42, 0x53, 0x5C, 0x70, "RECTAVG"))
            .with_rect(menu_rect(0x42, 0x72, 0x62, 0x8A, "RECTHARD"))
    }

    fn scales_pause(&self, pre_op: PreOp) -> bool {
        pre_op.is_pause()
    }

    fn track_pointer(&self, gun: &mut GunState, pointer: Point, in_menu: bool) {
        if pointer.x < HUD_EDGE_X || in_menu {
            gun.cursor = GunCursor::Menu;
        } else if pointer.y > HOLSTER_Y {
            gun.cursor = if gun.in_holster == 0 {
                GunCursor::Holstered
            } else {
                GunCursor::Reloading
            };
        } else if !matches!(gun.cursor, GunCursor::Aim(_) | GunCursor::Empty) {
            gun.cursor = GunCursor::Aim(0);
        }
    }

    fn is_weapon_down(&self, input: &InputState) -> bool {
        input.right_down && input.pointer.y > WEAPON_DOWN_Y
    }

    fn zone_hit(&mut self, hook: ZoneHit, cx: &mut Context<'_, MadDogProgress>, at: Point) {
        match hook {
            ZoneHit::BulletHole => self.bullet_hole(cx, at, Cue::Shot),
            ZoneHit::Skull => {
                let cue = if cx.session.progress.had_skull {
                    Cue::Shot
                } else {
                    Cue::Skull
                };
                self.bullet_hole(cx, at, cue);
            }
            ZoneHit::GlobalHit => {}
        }
    }

    fn rect_hit(&mut self, hook: RectHit, cx: &mut Context<'_, MadDogProgress>, rect: &Rect) {
        tracing::debug!("Rect hit {:?} -> {:?}", hook, rect.target_scene);
        let p = &mut cx.session.progress;
        match hook {
            RectHit::NewScene => {
                cx.session.score += rect.score;
                if !rect.target_scene.is_empty() {
                    cx.session.jump(rect.target_scene.clone());
                }
            }
            RectHit::HideFront | RectHit::HideRear => {
                let front = hook == RectHit::HideFront;
                let next = if p.hide_out_front == front { 214 } else { 211 };
                cx.session.jump(scene(next));
            }
            RectHit::MenuSelect => self.menu_select(cx),
            RectHit::Skull => {
                if !p.had_skull {
                    p.had_skull = true;
                    cx.session.shots = if p.been_to < 15 { 9 } else { 12 };
                }
            }
            RectHit::KillMan => self.kill(cx, 155),
            RectHit::KillWoman => self.kill(cx, 154),
            RectHit::ProspectorSign | RectHit::MineSign => {
                let done = if hook == RectHit::ProspectorSign { PROSPECTOR } else { MINE };
                if p.been_to & done == 0 {
                    p.gun_time = 1;
                    cx.session.jump(rect.target_scene.clone());
                }
            }
            RectHit::MineItem1 => self.mine_item(cx, 0),
            RectHit::MineItem2 => self.mine_item(cx, 2),
            RectHit::MineItem3 => self.mine_item(cx, 1),
            RectHit::MineLantern => {
                p.had_lantern = true;
                if p.got_clue {
                    let next = routes::pick_map(p, &mut self.rng);
                    cx.session.jump(next);
                }
            }
            RectHit::ShotHideout => {
                let next = routes::pick_sign(p);
                cx.session.jump(next);
            }
            RectHit::ShotRight => {
                let next = routes::map_right(p);
                cx.session.jump(next);
            }
            RectHit::ShotLeft => {
                let next = routes::map_left(p);
                cx.session.jump(next);
            }
            RectHit::ShotMenu => {
                tracing::debug!("Menu opened");
                cx.session.in_menu = true;
            }
            RectHit::ExitMenu => {
                tracing::info!("Quit selected from menu");
                cx.session.quit = true;
            }
            RectHit::ContinueMenu => {
                cx.session.in_menu = false;
                if cx.session.lives == 0 {
                    self.new_game_counters(cx.session);
                    cx.session.ret_scene = None;
                    let next = routes::pick_town(&mut cx.session.progress);
                    cx.session.jump(next);
                }
            }
            RectHit::StartMenu => {
                cx.session.in_menu = false;
                cx.emit(Effect::Indicator(None));
                let start = cx.session.start_scene.clone();
                cx.session.jump(start);
                self.reset_params(cx.session);
            }
            RectHit::StartBottles => {
                cx.session.in_menu = false;
                cx.session.jump(scene(7));
                self.reset_params(cx.session);
            }
            RectHit::Save => {
                cx.emit(Effect::SaveGame);
                cx.play(Cue::Saved);
            }
            RectHit::Load => {
                cx.emit(Effect::LoadGame);
                cx.play(Cue::Loaded);
            }
            RectHit::Easy => self.set_difficulty(cx, 1, Cue::Easy),
            RectHit::Average => self.set_difficulty(cx, 2, Cue::Average),
            RectHit::Hard => self.set_difficulty(cx, 3, Cue::Hard),
        }
    }

    fn pre_op(
        &mut self,
        hook: PreOp,
        cx: &mut Context<'_, MadDogProgress>,
        call: SceneCall<'_, Self>,
    ) {
        match hook {
            PreOp::DrawRect | PreOp::FadeIn | PreOp::PreRead => self.town_square(cx, call.scene),
            PreOp::Pause | PreOp::PauseFadeIn | PreOp::PausePreRead => {
                self.town_square(cx, call.scene);
                cx.pacing.clear_pause();
            }
            PreOp::PreShootout | PreOp::MdShootout => {
                let p = &mut cx.session.progress;
                match parse_window(&call.scene.pre_op.param) {
                    Some((min, max)) => {
                        p.min_f = min;
                        p.max_f = max;
                    }
                    None => tracing::warn!(
                        "{}: bad shootout window `{}`",
                        call.scene.name,
                        call.scene.pre_op.param
                    ),
                }
                p.in_shootout = true;
                cx.session.shots = 0;
                cx.emit(Effect::Indicator(Some(Indicator::Reload)));
            }
        }
    }

    fn ins_op(
        &mut self,
        hook: InsOp,
        cx: &mut Context<'_, MadDogProgress>,
        call: SceneCall<'_, Self>,
    ) {
        let current = call.scene;
        let p = &mut cx.session.progress;
        match hook {
            InsOp::Nothing | InsOp::ShotInto24 => {}
            InsOp::Pause => self.timed_pause(cx, current, param_frame(&current.ins_op.param)),
            InsOp::StartGame => cx.session.start_scene = current.ins_op.param.clone(),
            InsOp::SkipSaloon => self.skip_saloon(cx, current),
            InsOp::SkipSaloon2 => {
                self.timed_pause(cx, current, current.data[1]);
                self.skip_saloon(cx, current);
            }
            InsOp::CheckSaloon => {
                p.got_into |= SALOON;
                p.bartender_alive = cx.frame <= BARTENDER_SHOT;
            }
            InsOp::IntoStable => p.got_into |= STABLE,
            InsOp::IntoOffice => p.got_into |= OFFICE,
            InsOp::IntoBank => {
                p.got_into |= BANK;
                self.shoot_past(cx, call);
            }
            InsOp::CheckBartender => {
                if !p.bartender_alive && current.pause_param() <= cx.frame {
                    cx.session.jump(current.ins_op.param.clone());
                }
                if cx.fired && current.data[1] < cx.frame {
                    self.next_scene(call.hooks.next_scene, cx, call);
                }
            }
            InsOp::DidHideout => p.been_to |= HIDEOUT,
            InsOp::DidSignpost => p.been_to |= SIGNPOST,
            InsOp::DoShootout => self.shootout(cx, call),
            InsOp::MdShootout => {
                p.been_to |= HOTEL;
                self.shootout(cx, call);
            }
            InsOp::ShootPast => self.shoot_past(cx, call),
            InsOp::ShootPastPause => {
                self.shoot_past(cx, call);
                self.timed_pause(cx, current, param_frame(&current.ins_op.param));
            }
            InsOp::ShotInto116 => {
                if cx.fired && cx.frame > param_frame(&current.ins_op.param) {
                    self.next_scene(call.hooks.next_scene, cx, call);
                }
            }
        }
    }

    fn weapon_down(
        &mut self,
        _hook: WeaponDown,
        cx: &mut Context<'_, MadDogProgress>,
        _call: SceneCall<'_, Self>,
    ) {
        cx.gun.reload(RELOAD_TICKS);
        let p = &cx.session.progress;
        if !p.in_shootout {
            let full = if p.been_to >= 15 { 12 } else { 6 };
            cx.session.shots = cx.session.shots.max(full);
        }
    }

    fn score(
        &mut self,
        _hook: Score,
        cx: &mut Context<'_, MadDogProgress>,
        call: SceneCall<'_, Self>,
    ) {
        if call.scene.score_param > 0 {
            cx.session.score += call.scene.score_param;
        }
    }

    fn next_frame(
        &mut self,
        _hook: NextFrame,
        _cx: &mut Context<'_, MadDogProgress>,
        _call: SceneCall<'_, Self>,
    ) {
    }

    fn next_scene(
        &mut self,
        hook: NextScene,
        cx: &mut Context<'_, MadDogProgress>,
        call: SceneCall<'_, Self>,
    ) {
        let current = call.scene;
        let difficulty = cx.session.difficulty;
        let p = &mut cx.session.progress;
        match hook {
            NextScene::Default | NextScene::DrawGun => self.default_next(cx, current),
            NextScene::PickBottle => {
                p.bottles += 1;
                let next = if p.bottles < 4 {
                    scene(routes::pick_rand(6, &mut p.botmask, &mut self.rng) as u32 + 11)
                } else {
                    scene(253)
                };
                cx.session.jump(next);
            }
            NextScene::Died => self.died(cx, current),
            NextScene::AutoSelect => {
                let next = if p.been_to & STABLE == 0 {
                    scene(122)
                } else if p.been_to & OFFICE == 0 {
                    scene(114)
                } else if p.been_to & SALOON == 0 {
                    if p.got_into & SALOON != 0 {
                        scene(69)
                    } else {
                        scene(67)
                    }
                } else if p.been_to & BANK == 0 {
                    scene(45)
                } else {
                    scene(186)
                };
                cx.session.jump(next);
            }
            NextScene::FinishSaloon
            | NextScene::FinishOffice
            | NextScene::FinishStable
            | NextScene::FinishBank => {
                p.been_to |= match hook {
                    NextScene::FinishSaloon => SALOON,
                    NextScene::FinishOffice => OFFICE,
                    NextScene::FinishStable => STABLE,
                    _ => BANK,
                };
                let next = routes::pick_town(p);
                cx.session.jump(next);
            }
            NextScene::PickSaloon => {
                let next = if p.been_to & SALOON != 0 { 118 } else { 119 };
                cx.session.jump(scene(next));
            }
            NextScene::KillMan => self.kill(cx, 155),
            NextScene::KillWoman => self.kill(cx, 154),
            NextScene::Bank => self.bank(cx),
            NextScene::Stable => {
                let office_done = if p.been_to & OFFICE != 0 { 2 } else { 0 };
                let total = difficulty * 2 + 6 - office_done;
                self.gunfight(cx, total, 6, 131, |_| scene(143));
            }
            NextScene::SaveProspector => {
                p.gun_time = 1;
                p.pro_clue = self.rng.gen_range(0..=2);
                p.been_to |= PROSPECTOR;
                let next = scene(p.pro_clue as u32 + 160);
                cx.session.jump(next);
            }
            NextScene::PickToss => {
                let index = routes::pick_bad(7, p, &mut self.rng) as usize;
                cx.session.jump(scene(routes::BOTTLE_TOSS_SCENES[index]));
            }
            NextScene::HitToss | NextScene::MissToss => {
                if hook == NextScene::HitToss && cx.session.lives > 0 {
                    cx.session.score += 100;
                }
                let p = &mut cx.session.progress;
                p.bad_men += 1;
                let next = if p.bad_men <= 2 {
                    current.next.clone()
                } else {
                    p.bad_men_bits = 0;
                    p.bad_men = 0;
                    p.been_to |= BOTTLE_TOSS;
                    scene(185)
                };
                cx.session.jump(next);
            }
            NextScene::PickSign => {
                let next = routes::pick_sign(p);
                cx.session.jump(next);
            }
            NextScene::BackRockMen => {
                self.gunfight(cx, difficulty * 2 + 9, 7, 229, routes::pick_sign)
            }
            NextScene::LeftRockMen => {
                self.gunfight(cx, difficulty * 2 + 4, 3, 244, routes::pick_sign)
            }
            NextScene::HotelMen => {
                let next = if p.bad_men >= difficulty * 2 + 9 {
                    p.bad_men_bits = 0;
                    p.bad_men = 0;
                    p.been_to |= HOTEL;
                    scene(250)
                } else {
                    p.bad_men += 1;
                    let index = routes::pick_bad(5, p, &mut self.rng) as usize;
                    scene(routes::HOTEL_SCENES[index])
                };
                cx.session.jump(next);
            }
        }
    }

    fn miss(&mut self, cx: &mut Context<'_, MadDogProgress>, at: Point) {
        self.bullet_hole(cx, at, Cue::Shot);
    }

    fn out_of_ammo(&mut self, cx: &mut Context<'_, MadDogProgress>) {
        cx.play(Cue::Empty);
        cx.gun.click_empty(EMPTY_CLICK_TICKS);
    }

    fn warp(&mut self, session: &mut Session<MadDogProgress>, slot: u32) -> bool {
        let p = &mut session.progress;
        let next = match slot {
            0 => {
                p.been_to = 0;
                TOWN_SQUARE.to_string()
            }
            1 | 2 => {
                p.been_to = if slot == 1 { 1 } else { 15 };
                routes::pick_town(p)
            }
            3 => {
                p.been_to = 575;
                // always go right
                p.map = [-1, -1, -1];
                routes::pick_town(p)
            }
            4 => {
                p.been_to = 575;
                p.hide_out_front = true;
                scene(210)
            }
            5 => {
                p.been_to = 639;
                scene(227)
            }
            6 => {
                p.been_to = 1023;
                scene(250)
            }
            _ => return false,
        };
        tracing::info!("Warped to {} (been_to {:#x})", next, session.progress.been_to);
        session.jump(next);
        true
    }

    fn encode_save(&self, session: &Session<MadDogProgress>) -> Result<Vec<u8>, SaveError> {
        progress::encode(session)
    }

    fn decode_save(
        &mut self,
        session: &mut Session<MadDogProgress>,
        bytes: &[u8],
    ) -> Result<(), SaveError> {
        progress::decode(session, bytes)
    }
}
