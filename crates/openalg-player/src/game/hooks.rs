//! Behavior registry
//!
//! Every hook category is a closed enum supplied by the game. Script
//! names are resolved to enum tags once, right after loading, so play
//! never does a string lookup and a typo in the script stops startup.

use std::fmt;
use thiserror::Error;

use super::Behaviors;
use crate::script::{SceneId, SceneInfo, Zone, ZoneId};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{owner}: unknown {kind} behavior `{name}`")]
    Unknown {
        kind: HookKind,
        name: String,
        owner: String,
    },
}

/// Hook categories, named after their script keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    ZoneHit,
    RectHit,
    PreOp,
    ShowMsg,
    InsOp,
    WeaponDown,
    Score,
    NextFrame,
    NextScene,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            HookKind::ZoneHit => "PTRFB",
            HookKind::RectHit => "RECT",
            HookKind::PreOp => "PREOP",
            HookKind::ShowMsg => "SHOWMSG",
            HookKind::InsOp => "INSOP",
            HookKind::WeaponDown => "WEPDWN",
            HookKind::Score => "SCNSCR",
            HookKind::NextFrame => "NXTFRM",
            HookKind::NextScene => "NXTSCN",
        };
        f.write_str(keyword)
    }
}

/// A behavior tag for one hook category
pub trait Hook: Copy + fmt::Debug {
    const KIND: HookKind;

    /// Map a script name to a tag. Names are case-sensitive.
    fn from_name(name: &str) -> Option<Self>;
}

/// Resolve a script name; an omitted name means `DEFAULT`
pub fn resolve<H: Hook>(name: &str, owner: &str) -> Result<H, RegistryError> {
    let key = if name.is_empty() { "DEFAULT" } else { name };
    H::from_name(key).ok_or_else(|| RegistryError::Unknown {
        kind: H::KIND,
        name: key.to_string(),
        owner: owner.to_string(),
    })
}

/// Resolved scene hooks
pub struct SceneHooks<B: Behaviors> {
    pub pre_op: B::PreOp,
    pub show_msg: B::ShowMsg,
    pub ins_op: B::InsOp,
    pub weapon_down: B::WeaponDown,
    pub score: B::Score,
    pub next_frame: B::NextFrame,
    pub next_scene: B::NextScene,
}

impl<B: Behaviors> Clone for SceneHooks<B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: Behaviors> Copy for SceneHooks<B> {}

impl<B: Behaviors> fmt::Debug for SceneHooks<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneHooks")
            .field("pre_op", &self.pre_op)
            .field("ins_op", &self.ins_op)
            .field("next_scene", &self.next_scene)
            .finish_non_exhaustive()
    }
}

/// Resolved zone hooks; `rects` follows the zone's rect order
pub struct ZoneHooks<B: Behaviors> {
    pub global_hit: B::ZoneHit,
    pub rects: Vec<B::RectHit>,
}

impl<B: Behaviors> ZoneHooks<B> {
    pub fn resolve(zone: &Zone) -> Result<Self, RegistryError> {
        let owner = format!("zone {}", zone.name);
        let rects = zone
            .rects
            .iter()
            .map(|rect| resolve(&rect.hit, &owner))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ZoneHooks {
            global_hit: resolve(&zone.global_hit, &owner)?,
            rects,
        })
    }
}

/// Every hook in a scene graph, indexed like the graph itself
pub struct HookTable<B: Behaviors> {
    scenes: Vec<SceneHooks<B>>,
    zones: Vec<ZoneHooks<B>>,
}

impl<B: Behaviors> HookTable<B> {
    /// Resolve every behavior name in the graph, failing on the first miss
    pub fn resolve(info: &SceneInfo) -> Result<Self, RegistryError> {
        let zones = info
            .zones()
            .iter()
            .map(ZoneHooks::resolve)
            .collect::<Result<Vec<_>, _>>()?;

        let mut scenes = Vec::with_capacity(info.scenes().len());
        for scene in info.scenes() {
            let owner = format!("scene {}", scene.name);
            scenes.push(SceneHooks {
                pre_op: resolve(&scene.pre_op.name, &owner)?,
                show_msg: resolve(&scene.show_msg, &owner)?,
                ins_op: resolve(&scene.ins_op.name, &owner)?,
                weapon_down: resolve(&scene.weapon_down, &owner)?,
                score: resolve(&scene.score_op, &owner)?,
                next_frame: resolve(&scene.next_frame_op, &owner)?,
                next_scene: resolve(&scene.next_scene_op, &owner)?,
            });
        }

        tracing::debug!(
            "Resolved behaviors for {} scenes and {} zones",
            scenes.len(),
            zones.len()
        );
        Ok(HookTable { scenes, zones })
    }

    pub fn scene(&self, id: SceneId) -> SceneHooks<B> {
        self.scenes[id.0]
    }

    pub fn zone(&self, id: ZoneId) -> &ZoneHooks<B> {
        &self.zones[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::maddog::{MadDog, NextScene, PreOp, RectHit};
    use crate::script::SceneInfo;

    #[test]
    fn omitted_name_is_default() {
        let op: PreOp = resolve("", "scene x").unwrap();
        assert_eq!(op, PreOp::DrawRect);
        let next: NextScene = resolve("", "scene x").unwrap();
        assert_eq!(next, NextScene::Default);
    }

    #[test]
    fn names_are_case_sensitive() {
        assert_eq!(resolve::<RectHit>("KILLMAN", "z"), Ok(RectHit::KillMan));
        assert!(resolve::<RectHit>("killman", "z").is_err());
    }

    #[test]
    fn table_covers_every_reference() {
        let text = "\
ZONE z 0 10
PTRFB SKULL
RECT 1 1 5 5 s1 0 SKULL 0
;
SCENE s1 0 10
ZONES z
PREOP PAUSE 3
NXTSCN DIED
;
START s1
";
        let info = SceneInfo::parse(text).unwrap();
        let table = HookTable::<MadDog>::resolve(&info).unwrap();
        let scene = table.scene(SceneId(0));
        assert_eq!(scene.pre_op, PreOp::Pause);
        assert_eq!(scene.next_scene, NextScene::Died);
        assert_eq!(table.zone(ZoneId(0)).rects, vec![RectHit::Skull]);
    }

    #[test]
    fn unknown_name_names_its_owner() {
        let text = "SCENE s1 0 10\nINSOP WIBBLE 4\n;\nSTART s1\n";
        let info = SceneInfo::parse(text).unwrap();
        let err = HookTable::<MadDog>::resolve(&info).err().unwrap();
        assert_eq!(
            err,
            RegistryError::Unknown {
                kind: HookKind::InsOp,
                name: "WIBBLE".to_string(),
                owner: "scene s1".to_string(),
            }
        );
        assert_eq!(err.to_string(), "scene s1: unknown INSOP behavior `WIBBLE`");
    }
}
