//! 50 Hz gun animation tick, pumped from the main loop

use crate::game::cursor::GunState;

/// Tick period in milliseconds
pub const TICK_MS: u32 = 20;
/// Ticks replayed at most per pump after a stall
const MAX_CATCH_UP: u32 = 5;

#[derive(Debug, Clone, Copy, Default)]
pub struct GunTimer {
    next_tick: Option<u32>,
}

impl GunTimer {
    /// Run every tick due by `now`; returns how many ran
    pub fn pump(&mut self, now: u32, gun: &mut GunState) -> u32 {
        let mut next = *self.next_tick.get_or_insert(now.wrapping_add(TICK_MS));
        let mut ran = 0;
        while (now.wrapping_sub(next) as i32) >= 0 {
            if ran == MAX_CATCH_UP {
                // too far behind, drop the backlog
                next = now.wrapping_add(TICK_MS);
                break;
            }
            gun.tick();
            next = next.wrapping_add(TICK_MS);
            ran += 1;
        }
        self.next_tick = Some(next);
        ran
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_at_fifty_hertz() {
        let mut timer = GunTimer::default();
        let mut gun = GunState::default();
        assert_eq!(timer.pump(0, &mut gun), 0);
        assert_eq!(timer.pump(19, &mut gun), 0);
        assert_eq!(timer.pump(20, &mut gun), 1);
        assert_eq!(timer.pump(65, &mut gun), 2);
    }

    #[test]
    fn stall_is_capped() {
        let mut timer = GunTimer::default();
        let mut gun = GunState::default();
        timer.pump(0, &mut gun);
        assert_eq!(timer.pump(10_000, &mut gun), MAX_CATCH_UP);
        assert_eq!(timer.pump(10_010, &mut gun), 0);
        assert_eq!(timer.pump(10_020, &mut gun), 1);
    }
}
