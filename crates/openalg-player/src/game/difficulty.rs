//! Difficulty scaling
//!
//! Pause lengths and rect sizes shrink as difficulty rises. Scale tables
//! are 8.24 fixed point, one entry per level. The script is authored at
//! level 1, so every transition recomputes from the authored values with
//! ratio `table[new] / table[1]`. Rounding is to nearest, half away from
//! zero, and rects keep their centre (rounded down when the new size is
//! odd against an even span).

use std::collections::HashSet;

use crate::script::{
    Bounds, Scene, SceneId, SceneInfo, ZoneId, DIFF_KEEP_PAUSE, DIFF_KEEP_RECTS,
};

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 3;
/// Level the script geometry is written for
pub const BASE_LEVEL: u8 = 1;

/// Per-level multipliers, index 0 is level 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleTables {
    pub pause: [u32; 3],
    pub rect: [u32; 3],
}

fn entry(table: &[u32; 3], level: u8) -> u64 {
    table[(level.clamp(MIN_LEVEL, MAX_LEVEL) - MIN_LEVEL) as usize] as u64
}

fn round_div(n: i64, d: i64) -> i64 {
    if n >= 0 {
        (2 * n + d) / (2 * d)
    } else {
        -((-2 * n + d) / (2 * d))
    }
}

fn scale(value: i64, num: u64, den: u64) -> i64 {
    round_div(value * num as i64, den as i64)
}

/// Resize `b` around its centre by `num / den`
pub fn scale_bounds(b: Bounds, num: u64, den: u64) -> Bounds {
    let width = scale(b.width() as i64, num, den);
    let height = scale(b.height() as i64, num, den);
    let sum_x = b.left as i64 + b.right as i64;
    let sum_y = b.top as i64 + b.bottom as i64;
    let left = (sum_x - width).div_euclid(2);
    let top = (sum_y - height).div_euclid(2);
    let clamp = |v: i64| v.clamp(i16::MIN as i64, i16::MAX as i64) as i16;
    Bounds::new(clamp(left), clamp(top), clamp(left + width), clamp(top + height))
}

/// Apply a difficulty change to the graph.
///
/// `scales_pause` picks the scenes whose first data parameter is a pause
/// length. Returns false when `old == new`, leaving the graph untouched.
pub fn rescale(
    info: &mut SceneInfo,
    tables: &ScaleTables,
    old: u8,
    new: u8,
    scales_pause: impl Fn(SceneId, &Scene) -> bool,
) -> bool {
    if old == new {
        return false;
    }

    let pause_num = entry(&tables.pause, new);
    let pause_den = entry(&tables.pause, BASE_LEVEL);
    let rect_num = entry(&tables.rect, new);
    let rect_den = entry(&tables.rect, BASE_LEVEL);

    let mut zones: HashSet<ZoneId> = HashSet::new();
    let ids: Vec<_> = (0..info.scenes().len()).map(SceneId).collect();
    for id in ids {
        let scene = info.scene(id);
        let keep_pause = scene.diff_mask & DIFF_KEEP_PAUSE != 0 || !scales_pause(id, scene);
        if scene.diff_mask & DIFF_KEEP_RECTS == 0 {
            zones.extend(scene.zones.iter().copied());
        }
        if !keep_pause {
            let scene = info.scene_mut(id);
            let scaled = scale(scene.authored_pause as i64, pause_num, pause_den);
            scene.data[0] = scaled.clamp(0, u32::MAX as i64) as u32;
        }
    }

    // Zones can be shared between scenes; each is resized once
    for id in zones {
        for rect in &mut info.zone_mut(id).rects {
            rect.bounds = scale_bounds(rect.authored, rect_num, rect_den);
        }
    }

    tracing::info!("Difficulty changed {} -> {}", old, new);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Point;

    const TABLES: ScaleTables = ScaleTables {
        pause: [0x0100_0000, 0x0080_0000, 0x0040_0000],
        rect: [0x0100_0000, 0x00C0_0000, 0x0080_0000],
    };

    const SCRIPT: &str = "\
ZONE shared 0 100
RECT 100 50 200 90 x 0 DEFAULT 0
RECT 7 7 8 8 x 0 DEFAULT 0
;
ZONE fixed 0 100
RECT 100 50 200 90 x 0 DEFAULT 0
;
SCENE a 0 100
ZONES shared
PREOP PAUSE
DATA 40
;
SCENE b 0 100
ZONES shared
DATA 40
;
SCENE c 0 100
ZONES fixed
PREOP PAUSE
DATA 40
DIFF 3
;
START a
";

    fn load() -> SceneInfo {
        SceneInfo::parse(SCRIPT).unwrap()
    }

    fn pause_preop(_: SceneId, scene: &Scene) -> bool {
        scene.pre_op.name == "PAUSE"
    }

    fn bounds(info: &SceneInfo, zone: &str, rect: usize) -> Bounds {
        info.zone(info.find_zone(zone).unwrap()).rects[rect].bounds
    }

    #[test]
    fn same_level_is_noop() {
        let mut info = load();
        assert!(!rescale(&mut info, &TABLES, 2, 2, pause_preop));
        assert_eq!(bounds(&info, "shared", 0), Bounds::new(100, 50, 200, 90));
        assert_eq!(info.scenes()[0].pause_param(), 40);
    }

    #[test]
    fn rects_shrink_around_centre() {
        let mut info = load();
        rescale(&mut info, &TABLES, 1, 2, pause_preop);
        let b = bounds(&info, "shared", 0);
        assert_eq!(b.width(), 75);
        assert_eq!(b.height(), 30);
        assert_eq!(b, Bounds::new(112, 55, 187, 85));
        // centre stays put
        assert_eq!(b.left as i32 + b.right as i32, 300 - 1);
        assert!(b.contains(Point::new(150, 70)));
        assert!(!b.contains(Point::new(105, 70)));
    }

    #[test]
    fn round_trip_restores_geometry() {
        let mut info = load();
        rescale(&mut info, &TABLES, 1, 2, pause_preop);
        rescale(&mut info, &TABLES, 2, 1, pause_preop);
        assert_eq!(bounds(&info, "shared", 0), Bounds::new(100, 50, 200, 90));
        assert_eq!(bounds(&info, "shared", 1), Bounds::new(7, 7, 8, 8));
        assert_eq!(info.scenes()[0].pause_param(), 40);
    }

    #[test]
    fn repeated_transitions_do_not_drift() {
        let mut info = load();
        let mut level = 1;
        for next in [3, 2, 3, 1, 2, 2, 3] {
            rescale(&mut info, &TABLES, level, next, pause_preop);
            level = next;
        }
        let b = bounds(&info, "shared", 0);
        assert_eq!(b.width(), 50);
        assert_eq!(b.left, 125);
    }

    #[test]
    fn tiny_rects_never_invert() {
        let mut info = load();
        rescale(&mut info, &TABLES, 1, 3, pause_preop);
        let b = bounds(&info, "shared", 1);
        assert!(b.left <= b.right);
        assert!(b.top <= b.bottom);
    }

    #[test]
    fn masks_and_preops_select_targets() {
        let mut info = load();
        rescale(&mut info, &TABLES, 1, 3, pause_preop);
        // a: pause pre-op, scaled
        assert_eq!(info.scenes()[0].pause_param(), 10);
        // b: no pause pre-op
        assert_eq!(info.scenes()[1].pause_param(), 40);
        // c: mask keeps both axes
        assert_eq!(info.scenes()[2].pause_param(), 40);
        assert_eq!(bounds(&info, "fixed", 0), Bounds::new(100, 50, 200, 90));
        // shared zone scaled exactly once
        assert_eq!(bounds(&info, "shared", 0).width(), 50);
    }

    const MASKED: &str = "\
ZONE one 0 100
RECT 100 50 200 90 x 0 DEFAULT 0
;
ZONE two 0 100
RECT 100 50 200 90 x 0 DEFAULT 0
;
SCENE keep_pause 0 100
ZONES one
PREOP PAUSE
DATA 40
DIFF 1
;
SCENE keep_rects 0 100
ZONES two
PREOP PAUSE
DATA 40
DIFF 2
;
START keep_pause
";

    #[test]
    fn keep_pause_bit_still_scales_rects() {
        let mut info = SceneInfo::parse(MASKED).unwrap();
        rescale(&mut info, &TABLES, 1, 3, pause_preop);
        assert_eq!(info.scenes()[0].pause_param(), 40);
        assert_eq!(bounds(&info, "one", 0).width(), 50);
    }

    #[test]
    fn keep_rects_bit_still_scales_pause() {
        let mut info = SceneInfo::parse(MASKED).unwrap();
        rescale(&mut info, &TABLES, 1, 3, pause_preop);
        assert_eq!(info.scenes()[1].pause_param(), 10);
        assert_eq!(bounds(&info, "two", 0), Bounds::new(100, 50, 200, 90));
    }
}
