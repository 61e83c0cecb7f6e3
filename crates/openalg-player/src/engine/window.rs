//! minifb window frontend
//!
//! Composes the 320x200 screen in a 32-bit framebuffer: video at its
//! offset, debug outlines, HUD markers and a software cursor. The buffer
//! is scaled to the window with nearest-neighbour sampling.

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, ScaleMode, Window, WindowOptions};
use openalg_media::{Palette, SoundClip};

use super::sound_engine::SoundEngine;
use super::{EngineError, FrameView, Frontend, InputState};
use crate::game::cursor::GunCursor;
use crate::game::Cue;
use crate::script::Point;

const TARGET_FPS: usize = 60;
const OUTLINE_COLOR: u32 = 0x0000_FF00;
const HUD_COLOR: u32 = 0x00E0_C080;
const CURSOR_COLOR: u32 = 0x00FF_FFFF;
const CURSOR_ALT_COLOR: u32 = 0x00FF_4040;

pub struct WindowFrontend {
    window: Window,
    screen_w: usize,
    screen_h: usize,
    framebuffer: Vec<u32>,
    scaled: Vec<u32>,
    out_w: usize,
    out_h: usize,
    /// Palette resolved to 0RGB
    colors: [u32; 256],
    sound: Option<SoundEngine>,
    frame_count: u64,
}

impl WindowFrontend {
    pub fn new(
        title: &str,
        screen_size: (u16, u16),
        scale: u32,
        sound: Option<SoundEngine>,
    ) -> Result<Self, EngineError> {
        let screen_w = screen_size.0 as usize;
        let screen_h = screen_size.1 as usize;
        let scale = scale.max(1) as usize;
        let (out_w, out_h) = (screen_w * scale, screen_h * scale);

        let options = WindowOptions {
            resize: true,
            scale_mode: ScaleMode::AspectRatioStretch,
            ..Default::default()
        };
        let mut window = Window::new(title, out_w, out_h, options)
            .map_err(|e| EngineError::Display(format!("Window creation failed: {}", e)))?;
        window.set_target_fps(TARGET_FPS);
        window.set_cursor_visibility(false);

        let mut colors = [0u32; 256];
        let palette = Palette::default();
        for (i, c) in colors.iter_mut().enumerate() {
            *c = palette.rgb(i as u8);
        }

        tracing::info!("Window opened at {}x{}", out_w, out_h);
        Ok(WindowFrontend {
            window,
            screen_w,
            screen_h,
            framebuffer: vec![0; screen_w * screen_h],
            scaled: vec![0; out_w * out_h],
            out_w,
            out_h,
            colors,
            sound,
            frame_count: 0,
        })
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        for py in y.max(0)..(y + h).min(self.screen_h as i32) {
            for px in x.max(0)..(x + w).min(self.screen_w as i32) {
                self.framebuffer[py as usize * self.screen_w + px as usize] = color;
            }
        }
    }

    fn outline(&mut self, left: i32, top: i32, right: i32, bottom: i32, color: u32) {
        self.fill_rect(left, top, right - left + 1, 1, color);
        self.fill_rect(left, bottom, right - left + 1, 1, color);
        self.fill_rect(left, top, 1, bottom - top + 1, color);
        self.fill_rect(right, top, 1, bottom - top + 1, color);
    }

    fn draw_hud(&mut self, frame: &FrameView<'_>) {
        let hud = frame.hud;
        let layout = frame.layout;
        for &(x, y) in layout.shots.iter().take(hud.shots as usize) {
            self.fill_rect(x as i32, y as i32, 6, 12, HUD_COLOR);
        }
        for &(x, y) in layout.lives.iter().take(hud.lives.max(0) as usize) {
            self.fill_rect(x as i32, y as i32, 20, 16, HUD_COLOR);
        }
        if let Some(&(x, y)) = layout.difficulty.get(hud.difficulty.saturating_sub(1) as usize) {
            self.outline(x as i32, y as i32, x as i32 + 12, y as i32 + 12, HUD_COLOR);
        }
        if hud.indicator.is_some() {
            let (x, y) = layout.indicator;
            self.fill_rect(x, y, 16, 8, CURSOR_ALT_COLOR);
        }
    }

    fn draw_cursor(&mut self, at: Point, cursor: GunCursor) {
        let color = match cursor {
            GunCursor::Aim(0) | GunCursor::Menu => CURSOR_COLOR,
            _ => CURSOR_ALT_COLOR,
        };
        self.fill_rect(at.x - 4, at.y, 9, 1, color);
        self.fill_rect(at.x, at.y - 4, 1, 9, color);
    }

    fn scale_to_window(&mut self) {
        for dy in 0..self.out_h {
            let sy = dy * self.screen_h / self.out_h;
            let src_row = sy * self.screen_w;
            let dst_row = dy * self.out_w;
            for dx in 0..self.out_w {
                let sx = dx * self.screen_w / self.out_w;
                self.scaled[dst_row + dx] = self.framebuffer[src_row + sx];
            }
        }
    }
}

impl Frontend for WindowFrontend {
    fn poll_input(&mut self) -> InputState {
        let (w, h) = self.window.get_size();
        if w > 0 && h > 0 && (w != self.out_w || h != self.out_h) {
            self.out_w = w;
            self.out_h = h;
            self.scaled.resize(w * h, 0);
        }

        let (mouse_x, mouse_y) = self
            .window
            .get_mouse_pos(MouseMode::Clamp)
            .unwrap_or((0.0, 0.0));
        let x = (mouse_x as usize * self.screen_w / self.out_w.max(1)) as i32;
        let y = (mouse_y as usize * self.screen_h / self.out_h.max(1)) as i32;

        InputState {
            pointer: Point::new(
                x.clamp(0, self.screen_w as i32 - 1),
                y.clamp(0, self.screen_h as i32 - 1),
            ),
            left_down: self.window.get_mouse_down(MouseButton::Left),
            right_down: self.window.get_mouse_down(MouseButton::Right),
            quit_requested: !self.window.is_open()
                || self.window.is_key_pressed(Key::Escape, KeyRepeat::No),
        }
    }

    fn play_cue(&mut self, cue: Cue) {
        if let Some(sound) = &mut self.sound {
            sound.play_cue(cue);
        }
    }

    fn start_scene_audio(&mut self, clip: Option<SoundClip>) {
        if let Some(sound) = &mut self.sound {
            sound.start_scene(clip);
        }
    }

    fn pause_scene_audio(&mut self, paused: bool) {
        if let Some(sound) = &mut self.sound {
            sound.pause_scene(paused);
        }
    }

    fn present(&mut self, frame: &FrameView<'_>) -> Result<(), EngineError> {
        if frame.palette_changed || self.frame_count == 0 {
            for (i, c) in self.colors.iter_mut().enumerate() {
                *c = frame.palette.rgb(i as u8);
            }
        }

        self.framebuffer.fill(0);
        if let Some(video) = frame.video {
            let (vx, vy) = frame.video_pos;
            for sy in 0..video.height as i32 {
                let dy = vy + sy;
                if dy < 0 || dy >= self.screen_h as i32 {
                    continue;
                }
                for sx in 0..video.width as i32 {
                    let dx = vx + sx;
                    if dx < 0 || dx >= self.screen_w as i32 {
                        continue;
                    }
                    let index = video.pixels[(sy * video.width as i32 + sx) as usize];
                    self.framebuffer[dy as usize * self.screen_w + dx as usize] =
                        self.colors[index as usize];
                }
            }
        }
        for b in frame.outlines {
            self.outline(
                b.left as i32,
                b.top as i32,
                b.right as i32,
                b.bottom as i32,
                OUTLINE_COLOR,
            );
        }
        self.draw_hud(frame);
        self.draw_cursor(frame.pointer, frame.hud.cursor);

        self.frame_count += 1;
        if self.frame_count % 5 == 0 {
            let title = format!(
                "OpenAlg | {} | score {} | lives {} | shots {}{}",
                frame.scene,
                frame.hud.score,
                frame.hud.lives,
                frame.hud.shots,
                if frame.hud.in_menu { " | MENU" } else { "" },
            );
            self.window.set_title(&title);
        }

        self.scale_to_window();
        self.window
            .update_with_buffer(&self.scaled, self.out_w, self.out_h)
            .map_err(|e| EngineError::Display(e.to_string()))
    }
}

impl Drop for WindowFrontend {
    fn drop(&mut self) {
        if let Some(sound) = &mut self.sound {
            sound.stop_all();
        }
    }
}
