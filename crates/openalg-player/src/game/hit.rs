//! Hit testing
//!
//! Zones are tried in chain order and only while the logical frame is in
//! their window, widened by the frame skip on both ends. Inside a zone
//! the first rect (in script order) containing the point wins.

use std::ops::RangeInclusive;

use crate::script::{Point, SceneId, SceneInfo, Zone, ZoneId};

/// A rect hit inside a scene zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub zone: ZoneId,
    pub rect: usize,
}

/// Logical frames during which `zone` accepts hits
pub fn active_window(zone: &Zone, frame_skip: u32) -> RangeInclusive<u32> {
    let slack = frame_skip.max(1) - 1;
    zone.start_frame.saturating_sub(slack)..=zone.end_frame.saturating_add(slack)
}

/// Index of the first rect containing `point`
pub fn hit_rect(zone: &Zone, point: Point) -> Option<usize> {
    zone.rects.iter().position(|rect| rect.bounds.contains(point))
}

/// First rect hit among the scene's zones active at `frame`
pub fn hit_scene(
    info: &SceneInfo,
    scene: SceneId,
    frame: u32,
    frame_skip: u32,
    point: Point,
) -> Option<Hit> {
    info.scene(scene)
        .zones
        .iter()
        .filter(|&&id| active_window(info.zone(id), frame_skip).contains(&frame))
        .find_map(|&id| hit_rect(info.zone(id), point).map(|rect| Hit { zone: id, rect }))
}
