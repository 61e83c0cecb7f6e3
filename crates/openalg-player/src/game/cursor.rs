//! Gun cursor animation state
//!
//! The cursor sheet has ten frames: 0-5 are the fire animation, then
//! holstered, reloading, the menu arrow and the empty-gun click. The
//! 50 Hz timer tick steps the animation; pointer movement and behaviors
//! switch between the static frames.

/// What the cursor currently shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GunCursor {
    /// Aiming; frames 1-5 play after a shot
    Aim(u8),
    Holstered,
    Reloading,
    Menu,
    Empty,
}

impl GunCursor {
    pub const LAST_FIRE_FRAME: u8 = 5;

    /// Frame index in the cursor sheet
    pub fn frame(self) -> u8 {
        match self {
            GunCursor::Aim(f) => f.min(Self::LAST_FIRE_FRAME),
            GunCursor::Holstered => 6,
            GunCursor::Reloading => 7,
            GunCursor::Menu => 8,
            GunCursor::Empty => 9,
        }
    }
}

/// Cursor state shared by the timer, the pointer tracker and behaviors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GunState {
    pub cursor: GunCursor,
    /// Ticks left showing the empty-gun frame
    pub empty_count: u8,
    /// A shot is animating
    pub shot_fired: bool,
    /// Ticks left in the reload pose
    pub in_holster: u8,
}

impl Default for GunState {
    fn default() -> Self {
        GunState {
            cursor: GunCursor::Aim(0),
            empty_count: 0,
            shot_fired: false,
            in_holster: 0,
        }
    }
}

impl GunState {
    /// Advance the animation by one timer tick
    pub fn tick(&mut self) {
        match self.cursor {
            GunCursor::Empty => {
                if self.empty_count > 0 {
                    self.empty_count -= 1;
                } else {
                    self.cursor = GunCursor::Aim(0);
                }
            }
            _ if self.shot_fired => {
                let next = match self.cursor {
                    GunCursor::Aim(f) => f + 1,
                    _ => 1,
                };
                if next > GunCursor::LAST_FIRE_FRAME {
                    self.cursor = GunCursor::Aim(0);
                    self.shot_fired = false;
                } else {
                    self.cursor = GunCursor::Aim(next);
                }
            }
            _ => {
                if self.in_holster > 0 {
                    self.in_holster -= 1;
                    if self.in_holster == 0 && self.cursor == GunCursor::Reloading {
                        self.cursor = GunCursor::Holstered;
                    }
                }
            }
        }
    }

    /// Start the fire animation
    pub fn fire(&mut self) {
        self.shot_fired = true;
    }

    /// Show the empty-gun click for a few ticks
    pub fn click_empty(&mut self, ticks: u8) {
        self.empty_count = ticks;
        self.cursor = GunCursor::Empty;
    }

    /// Enter the reload pose for `ticks`
    pub fn reload(&mut self, ticks: u8) {
        self.in_holster = ticks;
        self.cursor = GunCursor::Reloading;
    }
}
