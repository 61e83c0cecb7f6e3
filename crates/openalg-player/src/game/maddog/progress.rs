//! Mad Dog progress flags and their save slot layout

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::game::save::{read_cstr, read_header, write_cstr, write_header, SaveError};
use crate::game::session::Session;

/// `been_to` / `got_into` bits for the four town locations
pub const SALOON: u16 = 0x01;
pub const STABLE: u16 = 0x02;
pub const BANK: u16 = 0x04;
pub const OFFICE: u16 = 0x08;
/// `been_to` bits for the later acts
pub const PROSPECTOR: u16 = 0x10;
pub const MINE: u16 = 0x20;
pub const SIGNPOST: u16 = 0x40;
pub const HIDEOUT: u16 = 0x80;
pub const HOTEL: u16 = 0x100;
pub const BOTTLE_TOSS: u16 = 0x200;
/// All four town locations cleared
pub const TOWN_DONE: u16 = SALOON | STABLE | BANK | OFFICE;

/// Game-specific session facts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MadDogProgress {
    /// Bad men shot in the current fight
    pub bad_men: u8,
    /// Random picks already used in the current fight
    pub bad_men_bits: u8,
    pub bartender_alive: bool,
    pub been_to: u16,
    pub got_into: u16,
    pub bottles: u8,
    pub botmask: u8,
    pub got_clue: bool,
    pub gun_time: u8,
    pub had_skull: bool,
    pub had_lantern: bool,
    pub hide_out_front: bool,
    pub in_shootout: bool,
    /// Trail directions: -1 right, 1 left, 0 dead end
    pub map: [i8; 3],
    pub map_pos: u8,
    pub max_map_pos: u8,
    /// Shootout draw window, in logical frames
    pub min_f: u32,
    pub max_f: u32,
    pub people_killed: u8,
    pub pro_clue: u8,
    pub sheriff_cnt: u8,
    pub shoot_out_cnt: u8,
}

pub fn encode(session: &Session<MadDogProgress>) -> Result<Vec<u8>, SaveError> {
    let p = &session.progress;
    let mut out = Vec::with_capacity(64);
    write_header(&mut out)?;
    out.write_u16::<LittleEndian>(p.been_to)?;
    out.write_u16::<LittleEndian>(p.got_into)?;
    out.write_u8(p.had_skull as u8)?;
    out.write_u8(p.bad_men)?;
    out.write_u8(p.bad_men_bits)?;
    out.write_u8(p.people_killed)?;
    out.write_u8(p.hide_out_front as u8)?;
    out.write_u8(session.difficulty)?;
    out.write_u8(p.pro_clue)?;
    out.write_u8(p.got_clue as u8)?;
    out.write_u8(p.had_lantern as u8)?;
    out.write_u8(p.map_pos)?;
    out.write_u8(p.shoot_out_cnt)?;
    for dir in p.map {
        out.write_i8(dir)?;
    }
    out.write_u8(p.max_map_pos)?;
    out.write_u8(p.bartender_alive as u8)?;
    out.write_u8(p.sheriff_cnt)?;
    out.write_u8(p.in_shootout as u8)?;
    write_cstr(&mut out, &session.cur_scene)?;
    write_cstr(&mut out, session.ret_scene.as_deref().unwrap_or(""))?;
    write_cstr(&mut out, session.sub_scene.as_deref().unwrap_or(""))?;
    Ok(out)
}

/// Restore a slot into `session`. Nothing changes unless the whole
/// record reads cleanly.
pub fn decode(session: &mut Session<MadDogProgress>, bytes: &[u8]) -> Result<(), SaveError> {
    let mut r = Cursor::new(bytes);
    read_header(&mut r)?;

    let mut p = session.progress.clone();
    p.been_to = r.read_u16::<LittleEndian>()?;
    p.got_into = r.read_u16::<LittleEndian>()?;
    p.had_skull = r.read_u8()? != 0;
    p.bad_men = r.read_u8()?;
    p.bad_men_bits = r.read_u8()?;
    p.people_killed = r.read_u8()?;
    p.hide_out_front = r.read_u8()? != 0;
    let difficulty = r.read_u8()?;
    p.pro_clue = r.read_u8()?;
    p.got_clue = r.read_u8()? != 0;
    p.had_lantern = r.read_u8()? != 0;
    p.map_pos = r.read_u8()?;
    p.shoot_out_cnt = r.read_u8()?;
    let mut map = [0u8; 3];
    r.read_exact(&mut map)?;
    p.map = map.map(|b| b as i8);
    p.max_map_pos = r.read_u8()?;
    p.bartender_alive = r.read_u8()? != 0;
    p.sheriff_cnt = r.read_u8()?;
    p.in_shootout = r.read_u8()? != 0;
    let cur = read_cstr(&mut r)?;
    let ret = read_cstr(&mut r)?;
    let sub = read_cstr(&mut r)?;

    let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };
    session.progress = p;
    session.difficulty = difficulty;
    session.cur_scene = cur;
    session.ret_scene = non_empty(ret);
    session.sub_scene = non_empty(sub);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::save::SAVE_MAGIC;

    fn sample() -> Session<MadDogProgress> {
        let mut s: Session<MadDogProgress> = Session::new("scene1");
        s.cur_scene = "scene186".into();
        s.ret_scene = Some("scene210".into());
        s.difficulty = 2;
        s.progress.been_to = TOWN_DONE | HOTEL;
        s.progress.got_into = SALOON | BANK;
        s.progress.map = [-1, 1, 0];
        s.progress.people_killed = 2;
        s.progress.hide_out_front = true;
        s
    }

    #[test]
    fn layout_matches_slot_format() {
        let bytes = encode(&sample()).unwrap();
        assert_eq!(&bytes[0..4], &SAVE_MAGIC.to_be_bytes());
        assert_eq!(bytes[4], 0);
        // been_to little-endian
        assert_eq!(&bytes[5..7], &[0x0F, 0x01]);
        assert_eq!(&bytes[7..9], &[0x05, 0x00]);
        // difficulty sits after hide_out_front
        assert_eq!(bytes[13], 1);
        assert_eq!(bytes[14], 2);
        // signed map bytes
        assert_eq!(&bytes[20..23], &[0xFF, 0x01, 0x00]);
        assert!(bytes.ends_with(b"scene186\0scene210\0\0"));
    }

    #[test]
    fn decode_restores_routing() {
        let bytes = encode(&sample()).unwrap();
        let mut s: Session<MadDogProgress> = Session::new("scene1");
        decode(&mut s, &bytes).unwrap();
        assert_eq!(s.cur_scene, "scene186");
        assert_eq!(s.ret_scene.as_deref(), Some("scene210"));
        assert_eq!(s.sub_scene, None);
        assert_eq!(s.difficulty, 2);
        assert_eq!(s.progress.map, [-1, 1, 0]);
        assert!(s.progress.hide_out_front);
    }

    #[test]
    fn truncated_slot_leaves_state() {
        let bytes = encode(&sample()).unwrap();
        let mut s: Session<MadDogProgress> = Session::new("scene1");
        assert!(decode(&mut s, &bytes[..12]).is_err());
        assert_eq!(s.cur_scene, "scene1");
        assert_eq!(s.progress, MadDogProgress::default());
    }

    #[test]
    fn bad_magic_rejected() {
        let mut bytes = encode(&sample()).unwrap();
        bytes[0] = b'X';
        let mut s: Session<MadDogProgress> = Session::new("scene1");
        assert!(matches!(decode(&mut s, &bytes), Err(SaveError::BadMagic(_))));
    }
}
