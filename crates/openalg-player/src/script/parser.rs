//! Line-oriented scene script grammar
//!
//! ```text
//! ZONE <name> <start> <end>      SCENE <name> <start> <end>
//!   NEXT <zone>                    NEXT <scene>      ZONES <zone>
//!   PTRFB <behavior>               PREOP <b> [arg]   INSOP <b> [arg]
//!   RECT l t r b scene score b aux SHOWMSG <b>       WEPDWN <b>
//! ;                                SCNSCR <b> <n>    NXTFRM <b>
//!                                  NXTSCN <b>        DATA n..       DIFF <mask>
//! START <scene>                  ;
//! END
//! ```
//!
//! Keywords are case-sensitive. `*` and `//` start comment lines.

use std::str::SplitWhitespace;

use super::{Bounds, Rect, Scene, ScriptError, Zone};

type Result<T> = std::result::Result<T, ScriptError>;

pub(super) struct Parsed {
    pub scenes: Vec<Scene>,
    pub zones: Vec<Zone>,
    pub start_scene: Option<String>,
}

/// One tokenized script line
struct Line<'a> {
    number: usize,
    tokens: SplitWhitespace<'a>,
}

impl<'a> Line<'a> {
    fn word(&mut self, what: &'static str) -> Result<&'a str> {
        self.tokens.next().ok_or(ScriptError::MissingToken {
            line: self.number,
            what,
        })
    }

    fn opt_word(&mut self) -> &'a str {
        self.tokens.next().unwrap_or("")
    }

    fn number<T: TryFrom<i64>>(&mut self, what: &'static str) -> Result<T> {
        let token = self.word(what)?;
        self.convert(token, what)
    }

    fn opt_number<T: TryFrom<i64> + Default>(&mut self, what: &'static str) -> Result<T> {
        match self.tokens.next() {
            Some(token) => self.convert(token, what),
            None => Ok(T::default()),
        }
    }

    fn convert<T: TryFrom<i64>>(&self, token: &str, what: &'static str) -> Result<T> {
        token
            .parse::<i64>()
            .ok()
            .and_then(|v| T::try_from(v).ok())
            .ok_or_else(|| ScriptError::BadNumber {
                line: self.number,
                what,
                token: token.to_string(),
            })
    }

    /// Every key consumes a fixed argument list; anything left is an error
    fn finish(mut self) -> Result<()> {
        match self.tokens.next() {
            Some(token) => Err(ScriptError::ExtraToken {
                line: self.number,
                token: token.to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn is_skipped(line: &str) -> bool {
    line.is_empty() || line.starts_with('*') || line.starts_with("//")
}

struct Parser<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    scenes: Vec<Scene>,
    zones: Vec<Zone>,
    start_scene: Option<String>,
}

impl<'a> Parser<'a> {
    /// Next meaningful line and its leading keyword
    fn next_line(&mut self) -> Option<(&'a str, Line<'a>)> {
        for (i, raw) in self.lines.by_ref() {
            let text = raw.trim();
            if is_skipped(text) {
                continue;
            }
            let mut line = Line {
                number: i + 1,
                tokens: text.split_whitespace(),
            };
            let key = line.opt_word();
            return Some((key, line));
        }
        None
    }

    fn run(mut self) -> Result<Parsed> {
        while let Some((key, mut line)) = self.next_line() {
            match key {
                "ZONE" => {
                    let (name, start, end) = Self::header(&mut line, "zone")?;
                    let number = line.number;
                    line.finish()?;
                    self.check_unique("zone", name, number)?;
                    let zone = self.zone_block(Zone::new(name, start, end), number)?;
                    self.zones.push(zone);
                }
                "SCENE" => {
                    let (name, start, end) = Self::header(&mut line, "scene")?;
                    let number = line.number;
                    line.finish()?;
                    self.check_unique("scene", name, number)?;
                    let scene = self.scene_block(Scene::new(name, start, end), number)?;
                    self.scenes.push(scene);
                }
                "START" => {
                    self.start_scene = Some(line.word("start scene name")?.to_string());
                    line.finish()?;
                }
                "END" => break,
                "MSG" | "GLOBAL" => {
                    return Err(ScriptError::Unsupported {
                        line: line.number,
                        key: key.to_string(),
                    })
                }
                ";" => line.finish()?,
                _ => {
                    return Err(ScriptError::UnknownKey {
                        line: line.number,
                        context: "top-level",
                        key: key.to_string(),
                    })
                }
            }
        }

        Ok(Parsed {
            scenes: self.scenes,
            zones: self.zones,
            start_scene: self.start_scene,
        })
    }

    fn header(line: &mut Line<'a>, kind: &'static str) -> Result<(&'a str, u32, u32)> {
        let name = line.word("name")?;
        let start: u32 = line.number("start frame")?;
        let end: u32 = line.number("end frame")?;
        if start > end {
            return Err(ScriptError::InvertedRange {
                line: line.number,
                kind,
                name: name.to_string(),
                start,
                end,
            });
        }
        Ok((name, start, end))
    }

    fn check_unique(&self, kind: &'static str, name: &str, line: usize) -> Result<()> {
        let taken = match kind {
            "zone" => self.zones.iter().any(|z| z.name.eq_ignore_ascii_case(name)),
            _ => self.scenes.iter().any(|s| s.name.eq_ignore_ascii_case(name)),
        };
        if taken {
            return Err(ScriptError::Duplicate {
                line,
                kind,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn zone_block(&mut self, mut zone: Zone, opened_at: usize) -> Result<Zone> {
        while let Some((key, mut line)) = self.next_line() {
            match key {
                "NEXT" => zone.next = Some(line.word("next zone")?.to_string()),
                "PTRFB" => zone.global_hit = line.word("pointer feedback behavior")?.to_string(),
                "RECT" => {
                    let bounds = Bounds::new(
                        line.number("rect left")?,
                        line.number("rect top")?,
                        line.number("rect right")?,
                        line.number("rect bottom")?,
                    );
                    let target = line.opt_word();
                    let score = line.opt_number("rect score")?;
                    let hit = line.opt_word();
                    let mut rect = Rect::new(bounds, target, score, hit);
                    rect.aux = line.opt_word().to_string();
                    zone.rects.push(rect);
                }
                ";" => {
                    line.finish()?;
                    return Ok(zone);
                }
                _ => {
                    return Err(ScriptError::UnknownKey {
                        line: line.number,
                        context: "zone",
                        key: key.to_string(),
                    })
                }
            }
            line.finish()?;
        }
        Err(ScriptError::Unterminated {
            line: opened_at,
            kind: "zone",
            name: zone.name,
        })
    }

    fn scene_block(&mut self, mut scene: Scene, opened_at: usize) -> Result<Scene> {
        while let Some((key, mut line)) = self.next_line() {
            match key {
                "NEXT" => scene.next = line.word("next scene")?.to_string(),
                "ZONES" => scene.zones_head = Some(line.word("zone name")?.to_string()),
                "PREOP" => {
                    scene.pre_op.name = line.word("pre-op behavior")?.to_string();
                    scene.pre_op.param = line.opt_word().to_string();
                }
                "SHOWMSG" => scene.show_msg = line.word("show-message behavior")?.to_string(),
                "INSOP" => {
                    scene.ins_op.name = line.word("in-scene behavior")?.to_string();
                    scene.ins_op.param = line.opt_word().to_string();
                }
                "WEPDWN" => scene.weapon_down = line.word("weapon-down behavior")?.to_string(),
                "SCNSCR" => {
                    scene.score_op = line.word("score behavior")?.to_string();
                    scene.score_param = line.opt_number("scene score")?;
                }
                "NXTFRM" => scene.next_frame_op = line.word("next-frame behavior")?.to_string(),
                "NXTSCN" => scene.next_scene_op = line.word("next-scene behavior")?.to_string(),
                "DATA" => {
                    for slot in scene.data.iter_mut() {
                        *slot = line.opt_number("data parameter")?;
                    }
                    scene.authored_pause = scene.data[0];
                }
                "DIFF" => scene.diff_mask = line.number("difficulty mask")?,
                // Misspelt NEXT found in shipped scripts; the game ignores it
                "NXET" => {
                    line.opt_word();
                }
                ";" => {
                    line.finish()?;
                    return Ok(scene);
                }
                _ => {
                    return Err(ScriptError::UnknownKey {
                        line: line.number,
                        context: "scene",
                        key: key.to_string(),
                    })
                }
            }
            line.finish()?;
        }
        Err(ScriptError::Unterminated {
            line: opened_at,
            kind: "scene",
            name: scene.name,
        })
    }
}

pub(super) fn parse(text: &str) -> Result<Parsed> {
    Parser {
        lines: text.lines().enumerate(),
        scenes: Vec::new(),
        zones: Vec::new(),
        start_scene: None,
    }
    .run()
}

#[cfg(test)]
mod tests {
    use super::super::SceneInfo;
    use super::*;

    fn scene_script(body: &str) -> String {
        format!("SCENE s1 10 20\n{}\n;\nSTART s1\nEND\n", body)
    }

    #[test]
    fn test_scene_fields() {
        let text = scene_script(
            "NEXT s2\n\
             PREOP PAUSE 7\n\
             SHOWMSG DEFAULT\n\
             INSOP SKIPSALOON2 scene70\n\
             WEPDWN DEFAULT\n\
             SCNSCR DEFAULT 150\n\
             NXTFRM DEFAULT\n\
             NXTSCN DIED\n\
             DATA 40 7400 0 0\n\
             DIFF 2",
        );
        let info = SceneInfo::parse(&text).unwrap();
        let scene = &info.scenes()[0];
        assert_eq!(scene.next, "s2");
        assert_eq!(scene.pre_op.name, "PAUSE");
        assert_eq!(scene.pre_op.param, "7");
        assert_eq!(scene.ins_op.param, "scene70");
        assert_eq!(scene.score_param, 150);
        assert_eq!(scene.next_scene_op, "DIED");
        assert_eq!(scene.data, [40, 7400, 0, 0, 0, 0]);
        assert_eq!(scene.authored_pause(), 40);
        assert_eq!(scene.diff_mask, 2);
    }

    #[test]
    fn test_rect_fields_and_defaults() {
        let text = "\
ZONE z 0 10
PTRFB BULLETHOLE
RECT 1 2 3 4 s1 -50 KILLMAN 0
RECT 5 6 7 8
;
SCENE s1 0 10
ZONES z
;
START s1
";
        let info = SceneInfo::parse(text).unwrap();
        let zone = &info.zones()[0];
        assert_eq!(zone.global_hit, "BULLETHOLE");
        assert_eq!(zone.rects.len(), 2);
        assert_eq!(zone.rects[0].bounds, Bounds::new(1, 2, 3, 4));
        assert_eq!(zone.rects[0].score, -50);
        assert_eq!(zone.rects[0].hit, "KILLMAN");
        assert_eq!(zone.rects[0].aux, "0");
        assert_eq!(zone.rects[1].hit, "");
        assert_eq!(zone.rects[1].target_scene, "");
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let text = "* header\n\n// note\nSCENE s1 1 2\n\n// inside\n;\n;\nSTART s1\n";
        assert!(SceneInfo::parse(text).is_ok());
    }

    #[test]
    fn test_end_stops_parsing() {
        let text = "SCENE s1 1 2\n;\nSTART s1\nEND\ngarbage after end\n";
        assert!(SceneInfo::parse(text).is_ok());
    }

    #[test]
    fn test_inverted_scene_rejected() {
        let err = SceneInfo::parse("SCENE s1 20 10\n;\nSTART s1\n").unwrap_err();
        assert!(matches!(
            err,
            ScriptError::InvertedRange { line: 1, start: 20, end: 10, .. }
        ));
    }

    #[test]
    fn test_unknown_keys_are_fatal() {
        assert!(matches!(
            SceneInfo::parse("BOGUS x\n"),
            Err(ScriptError::UnknownKey { context: "top-level", .. })
        ));
        assert!(matches!(
            SceneInfo::parse(&scene_script("PTRFB DEFAULT")),
            Err(ScriptError::UnknownKey { line: 2, context: "scene", .. })
        ));
        assert!(matches!(
            SceneInfo::parse("ZONE z 0 1\nZONES a\n;\n"),
            Err(ScriptError::UnknownKey { context: "zone", .. })
        ));
    }

    #[test]
    fn test_unsupported_records() {
        assert!(matches!(
            SceneInfo::parse("MSG hello\n"),
            Err(ScriptError::Unsupported { .. })
        ));
        assert!(matches!(
            SceneInfo::parse("GLOBAL x\n"),
            Err(ScriptError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_leftover_token_is_fatal() {
        assert!(matches!(
            SceneInfo::parse(&scene_script("NEXT s2 s3")),
            Err(ScriptError::ExtraToken { ref token, .. }) if token == "s3"
        ));
    }

    #[test]
    fn test_bad_number() {
        assert!(matches!(
            SceneInfo::parse("SCENE s1 ten 20\n;\n"),
            Err(ScriptError::BadNumber { line: 1, .. })
        ));
        assert!(matches!(
            SceneInfo::parse(&scene_script("DATA 1 x")),
            Err(ScriptError::BadNumber { .. })
        ));
    }

    #[test]
    fn test_unterminated_block() {
        assert!(matches!(
            SceneInfo::parse("SCENE s1 1 2\nNEXT s1\n"),
            Err(ScriptError::Unterminated { line: 1, .. })
        ));
    }

    #[test]
    fn test_duplicate_names() {
        let text = "SCENE s1 1 2\n;\nSCENE S1 3 4\n;\nSTART s1\n";
        assert!(matches!(
            SceneInfo::parse(text),
            Err(ScriptError::Duplicate { line: 3, .. })
        ));
    }

    #[test]
    fn test_misspelt_next_ignored() {
        let info = SceneInfo::parse(&scene_script("NXET s9")).unwrap();
        assert_eq!(info.scenes()[0].next, "");
    }
}
