//! Scene script data model
//!
//! A script is a flat list of zones and scenes. Scenes point at the head
//! of a zone chain; the loader walks each chain once and stores the
//! resolved zone ids on the scene. Everything is addressed by index after
//! loading, names are kept for diagnostics and for behaviors that jump
//! by name.

pub mod parser;

use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Failed to read scene script: {0}")]
    IoError(#[from] std::io::Error),

    #[error("line {line}: unknown {context} key `{key}`")]
    UnknownKey {
        line: usize,
        context: &'static str,
        key: String,
    },

    #[error("line {line}: {key} records are not supported")]
    Unsupported { line: usize, key: String },

    #[error("line {line}: missing {what}")]
    MissingToken { line: usize, what: &'static str },

    #[error("line {line}: `{token}` is not a valid {what}")]
    BadNumber {
        line: usize,
        what: &'static str,
        token: String,
    },

    #[error("line {line}: unexpected token `{token}`")]
    ExtraToken { line: usize, token: String },

    #[error("line {line}: {kind} `{name}` ends before it starts ({start} > {end})")]
    InvertedRange {
        line: usize,
        kind: &'static str,
        name: String,
        start: u32,
        end: u32,
    },

    #[error("line {line}: duplicate {kind} `{name}`")]
    Duplicate {
        line: usize,
        kind: &'static str,
        name: String,
    },

    #[error("line {line}: {kind} `{name}` is missing its closing `;`")]
    Unterminated {
        line: usize,
        kind: &'static str,
        name: String,
    },

    #[error("`{owner}` references unknown zone `{zone}`")]
    UnknownZone { owner: String, zone: String },

    #[error("zone chain through `{zone}` loops back on itself")]
    ZoneCycle { zone: String },

    #[error("script declares no START scene")]
    NoStartScene,

    #[error("START scene `{0}` does not exist")]
    UnknownStartScene(String),
}

/// Pointer position in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

/// Inclusive screen-space box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds {
    pub left: i16,
    pub top: i16,
    pub right: i16,
    pub bottom: i16,
}

impl Bounds {
    pub fn new(left: i16, top: i16, right: i16, bottom: i16) -> Self {
        Bounds {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Edges are part of the box
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left as i32
            && p.x <= self.right as i32
            && p.y >= self.top as i32
            && p.y <= self.bottom as i32
    }

    pub fn width(&self) -> i32 {
        self.right as i32 - self.left as i32
    }

    pub fn height(&self) -> i32 {
        self.bottom as i32 - self.top as i32
    }
}

/// A clickable region inside a zone
#[derive(Debug, Clone, Serialize)]
pub struct Rect {
    pub bounds: Bounds,
    /// Geometry as written in the script, before difficulty scaling
    #[serde(skip)]
    pub(crate) authored: Bounds,
    pub target_scene: String,
    pub score: i32,
    pub hit: String,
    pub aux: String,
}

impl Rect {
    pub fn new(bounds: Bounds, target_scene: &str, score: i32, hit: &str) -> Self {
        Rect {
            bounds,
            authored: bounds,
            target_scene: target_scene.to_string(),
            score,
            hit: hit.to_string(),
            aux: String::new(),
        }
    }

    pub fn authored(&self) -> Bounds {
        self.authored
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ZoneId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SceneId(pub usize);

/// A frame-windowed group of rects
#[derive(Debug, Clone, Serialize)]
pub struct Zone {
    pub name: String,
    pub start_frame: u32,
    pub end_frame: u32,
    /// Behavior run after any rect in this zone is hit
    pub global_hit: String,
    pub rects: Vec<Rect>,
    pub next: Option<String>,
}

impl Zone {
    pub fn new(name: &str, start_frame: u32, end_frame: u32) -> Self {
        Zone {
            name: name.to_string(),
            start_frame,
            end_frame,
            global_hit: String::new(),
            rects: Vec::new(),
            next: None,
        }
    }

    /// Builder used for game-supplied zones such as menus
    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rects.push(rect);
        self
    }

    pub fn with_global_hit(mut self, name: &str) -> Self {
        self.global_hit = name.to_string();
        self
    }
}

/// A behavior name with its optional script argument
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HookRef {
    pub name: String,
    pub param: String,
}

/// Difficulty mask bit: keep pause durations fixed
pub const DIFF_KEEP_PAUSE: u32 = 0x01;
/// Difficulty mask bit: keep rect geometry fixed
pub const DIFF_KEEP_RECTS: u32 = 0x02;

/// A named interval of the video timeline plus its behavior hooks
#[derive(Debug, Clone, Serialize)]
pub struct Scene {
    pub name: String,
    pub start_frame: u32,
    pub end_frame: u32,
    pub next: String,
    /// Head of the zone chain as written
    pub zones_head: Option<String>,
    /// Resolved zone chain, in order
    pub zones: Vec<ZoneId>,
    pub pre_op: HookRef,
    pub show_msg: String,
    pub ins_op: HookRef,
    pub weapon_down: String,
    pub score_op: String,
    pub score_param: i32,
    pub next_frame_op: String,
    pub next_scene_op: String,
    pub data: [u32; 6],
    #[serde(skip)]
    pub(crate) authored_pause: u32,
    pub diff_mask: u32,
}

impl Scene {
    pub fn new(name: &str, start_frame: u32, end_frame: u32) -> Self {
        Scene {
            name: name.to_string(),
            start_frame,
            end_frame,
            next: String::new(),
            zones_head: None,
            zones: Vec::new(),
            pre_op: HookRef::default(),
            show_msg: String::new(),
            ins_op: HookRef::default(),
            weapon_down: String::new(),
            score_op: String::new(),
            score_param: 0,
            next_frame_op: String::new(),
            next_scene_op: String::new(),
            data: [0; 6],
            authored_pause: 0,
            diff_mask: 0,
        }
    }

    /// Pause length parameter, scaled by difficulty
    pub fn pause_param(&self) -> u32 {
        self.data[0]
    }

    pub fn authored_pause(&self) -> u32 {
        self.authored_pause
    }
}

/// The complete scene graph
#[derive(Debug, Clone, Serialize)]
pub struct SceneInfo {
    scenes: Vec<Scene>,
    zones: Vec<Zone>,
    start_scene: String,
    #[serde(skip)]
    scene_index: HashMap<String, SceneId>,
    #[serde(skip)]
    zone_index: HashMap<String, ZoneId>,
}

impl SceneInfo {
    /// Read and parse a `.SCN` file
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        tracing::debug!("Loading scene script {:?}", path);
        let bytes = std::fs::read(path)?;
        Self::parse(&String::from_utf8_lossy(&bytes))
    }

    /// Parse script text, then resolve every zone chain
    pub fn parse(text: &str) -> Result<Self, ScriptError> {
        let parsed = parser::parse(text)?;
        Self::build(parsed.scenes, parsed.zones, parsed.start_scene)
    }

    fn build(
        mut scenes: Vec<Scene>,
        zones: Vec<Zone>,
        start_scene: Option<String>,
    ) -> Result<Self, ScriptError> {
        let start_scene = start_scene.ok_or(ScriptError::NoStartScene)?;

        let zone_index: HashMap<String, ZoneId> = zones
            .iter()
            .enumerate()
            .map(|(i, z)| (z.name.to_ascii_lowercase(), ZoneId(i)))
            .collect();
        let scene_index: HashMap<String, SceneId> = scenes
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.to_ascii_lowercase(), SceneId(i)))
            .collect();

        // Dangling links are fatal even on zones no scene uses
        for zone in &zones {
            if let Some(next) = &zone.next {
                if !zone_index.contains_key(&next.to_ascii_lowercase()) {
                    return Err(ScriptError::UnknownZone {
                        owner: zone.name.clone(),
                        zone: next.clone(),
                    });
                }
            }
        }

        for scene in &mut scenes {
            if let Some(head) = &scene.zones_head {
                scene.zones = resolve_chain(&scene.name, head, &zones, &zone_index)?;
            }
        }

        if !scene_index.contains_key(&start_scene.to_ascii_lowercase()) {
            return Err(ScriptError::UnknownStartScene(start_scene));
        }

        Ok(SceneInfo {
            scenes,
            zones,
            start_scene,
            scene_index,
            zone_index,
        })
    }

    pub fn start_scene(&self) -> &str {
        &self.start_scene
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn scene(&self, id: SceneId) -> &Scene {
        &self.scenes[id.0]
    }

    pub fn scene_mut(&mut self, id: SceneId) -> &mut Scene {
        &mut self.scenes[id.0]
    }

    pub fn zone(&self, id: ZoneId) -> &Zone {
        &self.zones[id.0]
    }

    pub fn zone_mut(&mut self, id: ZoneId) -> &mut Zone {
        &mut self.zones[id.0]
    }

    /// Case-insensitive scene lookup
    pub fn find_scene(&self, name: &str) -> Option<SceneId> {
        self.scene_index.get(&name.to_ascii_lowercase()).copied()
    }

    /// Case-insensitive zone lookup
    pub fn find_zone(&self, name: &str) -> Option<ZoneId> {
        self.zone_index.get(&name.to_ascii_lowercase()).copied()
    }

    /// Zones of a scene in chain order
    pub fn scene_zones(&self, id: SceneId) -> impl Iterator<Item = &Zone> {
        self.scenes[id.0].zones.iter().map(move |z| &self.zones[z.0])
    }
}

fn resolve_chain(
    scene: &str,
    head: &str,
    zones: &[Zone],
    index: &HashMap<String, ZoneId>,
) -> Result<Vec<ZoneId>, ScriptError> {
    let mut chain = Vec::new();
    let mut name = head;
    loop {
        let id = *index
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| ScriptError::UnknownZone {
                owner: scene.to_string(),
                zone: name.to_string(),
            })?;
        if chain.contains(&id) {
            return Err(ScriptError::ZoneCycle {
                zone: zones[id.0].name.clone(),
            });
        }
        chain.push(id);
        match &zones[id.0].next {
            Some(next) => name = next,
            None => return Ok(chain),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ZONES: &str = "\
* chain test
ZONE A 100 200
NEXT B
PTRFB DEFAULT
RECT 10 10 20 20 scene2 0 NEWSCENE 0
;
ZONE B 150 300
RECT 30 30 40 40 scene1 5 DEFAULT 0
;
SCENE scene1 100 300
ZONES A
NEXT scene2
;
SCENE scene2 400 500
NEXT scene1
;
START scene1
END
";

    #[test]
    fn test_zone_chain_order() {
        let info = SceneInfo::parse(TWO_ZONES).unwrap();
        let scene = info.find_scene("scene1").unwrap();
        let names: Vec<_> = info.scene_zones(scene).map(|z| z.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);

        let plain = info.find_scene("scene2").unwrap();
        assert!(info.scene(plain).zones.is_empty());
    }

    #[test]
    fn test_lookup_ignores_case() {
        let info = SceneInfo::parse(TWO_ZONES).unwrap();
        assert_eq!(info.find_scene("SCENE2"), info.find_scene("scene2"));
        assert!(info.find_zone("b").is_some());
        assert!(info.find_scene("scene3").is_none());
    }

    #[test]
    fn test_dangling_zone_rejected() {
        let text = TWO_ZONES.replace("NEXT B", "NEXT C");
        assert!(matches!(
            SceneInfo::parse(&text),
            Err(ScriptError::UnknownZone { ref zone, .. }) if zone == "C"
        ));
    }

    #[test]
    fn test_zone_cycle_rejected() {
        let text = TWO_ZONES.replace("ZONE B 150 300\n", "ZONE B 150 300\nNEXT A\n");
        assert!(matches!(
            SceneInfo::parse(&text),
            Err(ScriptError::ZoneCycle { .. })
        ));
    }

    #[test]
    fn test_start_scene_must_exist() {
        let text = TWO_ZONES.replace("START scene1", "START nowhere");
        assert!(matches!(
            SceneInfo::parse(&text),
            Err(ScriptError::UnknownStartScene(_))
        ));
        let text = TWO_ZONES.replace("START scene1\n", "");
        assert!(matches!(
            SceneInfo::parse(&text),
            Err(ScriptError::NoStartScene)
        ));
    }

    #[test]
    fn test_bounds_inclusive() {
        let b = Bounds::new(10, 20, 30, 40);
        assert!(b.contains(Point::new(10, 20)));
        assert!(b.contains(Point::new(30, 40)));
        assert!(!b.contains(Point::new(31, 40)));
        assert!(!b.contains(Point::new(30, 41)));
        assert_eq!(b.width(), 20);
    }
}
