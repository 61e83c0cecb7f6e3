//! Scene routing helpers shared by several Mad Dog behaviors

use rand::rngs::StdRng;
use rand::Rng;

use super::progress::{MadDogProgress, HIDEOUT, HOTEL, MINE, SIGNPOST};

/// Shootout at the end of each trail leg
pub const FIGHT: [u32; 3] = [208, 228, 243];
/// Ambush for a wrong turn on each trail leg
pub const AMBUSH: [u32; 3] = [192, 193, 192];
pub const HOTEL_SCENES: [u32; 10] = [77, 77, 87, 87, 89, 89, 97, 97, 105, 105];
pub const BOTTLE_TOSS_SCENES: [u32; 14] =
    [171, 171, 174, 174, 175, 175, 178, 178, 179, 179, 182, 182, 183, 183];

/// Town scenes visited before any location is cleared
const TOWN_BASE: u32 = 29;

pub fn scene(n: u32) -> String {
    format!("scene{n}")
}

/// Draw an unused slot below `max` and mark it in `mask`.
/// The mask starts over once every slot is taken. Returns twice the
/// slot, which is how the scene tables are laid out.
pub fn pick_rand(max: u8, mask: &mut u8, rng: &mut StdRng) -> u8 {
    let full = 0xFFu8 >> (8 - max);
    if *mask & full == full {
        *mask = 0;
    }
    loop {
        let slot = rng.gen_range(0..max);
        let bit = 1u8 << slot;
        if *mask & bit == 0 {
            *mask |= bit;
            return slot * 2;
        }
    }
}

pub fn pick_bad(max: u8, p: &mut MadDogProgress, rng: &mut StdRng) -> u8 {
    pick_rand(max, &mut p.bad_men_bits, rng)
}

/// Next town scene; every fifth visit is a surprise showdown
pub fn pick_town(p: &mut MadDogProgress) -> String {
    p.had_skull = false;
    p.map_pos = 0;
    p.bad_men_bits = 0;
    p.shoot_out_cnt = p.shoot_out_cnt.wrapping_add(1);
    if p.shoot_out_cnt % 5 == 0 {
        if p.shoot_out_cnt > 15 || p.shoot_out_cnt == 0 {
            p.shoot_out_cnt = 5;
        }
        return scene(p.shoot_out_cnt as u32 / 5 + 106);
    }
    match p.been_to {
        0 => scene(28),
        b if b & HOTEL != 0 => scene(250),
        b if b & HIDEOUT != 0 => scene(76),
        b if b & SIGNPOST != 0 => scene(214),
        b if b >= 15 => scene(186),
        b => scene(b as u32 + TOWN_BASE),
    }
}

/// Roll the trail layout and show the matching map scene
pub fn pick_map(p: &mut MadDogProgress, rng: &mut StdRng) -> String {
    p.been_to |= MINE;
    let (map, n) = match rng.gen_range(0..=5) {
        0 => ([1, 1, 0], 164),
        1 => ([1, -1, 0], 165),
        2 => ([-1, 1, 1], 166),
        3 => ([-1, 1, -1], 167),
        4 => ([-1, -1, 1], 168),
        _ => ([-1, -1, -1], 169),
    };
    p.map = map;
    scene(n)
}

/// Advance along the trail to the next sign post
pub fn pick_sign(p: &mut MadDogProgress) -> String {
    p.map_pos += 1;
    p.max_map_pos = p.max_map_pos.max(p.map_pos);
    let pos = p.map_pos as usize;
    if pos <= 2 && p.map[pos] != 0 {
        scene(p.map_pos as u32 + 187)
    } else {
        scene(210)
    }
}

fn leg(p: &MadDogProgress) -> (usize, i8) {
    let pos = (p.map_pos as usize).min(2);
    (pos, p.map[pos])
}

fn fight_or_sign(p: &mut MadDogProgress, pos: usize) -> String {
    if p.map_pos >= p.max_map_pos {
        scene(FIGHT[pos])
    } else {
        pick_sign(p)
    }
}

/// Player shot the right-hand sign
pub fn map_right(p: &mut MadDogProgress) -> String {
    match leg(p) {
        (pos, 1) => scene(AMBUSH[pos]),
        (pos, _) => fight_or_sign(p, pos),
    }
}

/// Player shot the left-hand sign
pub fn map_left(p: &mut MadDogProgress) -> String {
    match leg(p) {
        (pos, -1) => scene(AMBUSH[pos]),
        (pos, _) => fight_or_sign(p, pos),
    }
}

/// Death scene for the lives left after losing one
pub fn death_scene(lives: i8, rng: &mut StdRng) -> String {
    match lives {
        2 => scene(150),
        1 => scene(152),
        0 => scene(153),
        _ => scene(rng.gen_range(148..=149)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::maddog::progress::TOWN_DONE;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn pick_rand_exhausts_before_repeating() {
        let mut rng = rng();
        let mut mask = 0;
        let mut seen: Vec<u8> = (0..6).map(|_| pick_rand(6, &mut mask, &mut rng)).collect();
        seen.sort();
        assert_eq!(seen, vec![0, 2, 4, 6, 8, 10]);
        assert_eq!(mask, 0x3F);
        // full mask resets on the next draw
        pick_rand(6, &mut mask, &mut rng);
        assert_eq!(mask.count_ones(), 1);
    }

    #[test]
    fn town_progression() {
        let mut p = MadDogProgress::default();
        assert_eq!(pick_town(&mut p), "scene28");
        p.been_to = 1;
        assert_eq!(pick_town(&mut p), "scene30");
        p.been_to = TOWN_DONE;
        assert_eq!(pick_town(&mut p), "scene186");
        p.been_to |= SIGNPOST;
        assert_eq!(pick_town(&mut p), "scene214");
        // fifth visit
        assert_eq!(pick_town(&mut p), "scene107");
        assert_eq!(p.shoot_out_cnt, 5);
    }

    #[test]
    fn showdown_counter_wraps_back() {
        let mut p = MadDogProgress {
            shoot_out_cnt: 19,
            been_to: 1,
            ..Default::default()
        };
        assert_eq!(pick_town(&mut p), "scene107");
        assert_eq!(p.shoot_out_cnt, 5);
    }

    #[test]
    fn trail_follows_map() {
        let mut p = MadDogProgress {
            map: [-1, 1, 0],
            ..Default::default()
        };
        // -1 means the right-hand path is safe
        assert_eq!(map_left(&mut p), "scene192");
        assert_eq!(map_right(&mut p), "scene208");
        assert_eq!(pick_sign(&mut p), "scene188");
        assert_eq!(map_right(&mut p), "scene193");
        assert_eq!(pick_sign(&mut p), "scene210");
        assert_eq!(p.max_map_pos, 2);
    }

    #[test]
    fn map_roll_sets_directions() {
        let mut rng = rng();
        let mut p = MadDogProgress::default();
        let s = pick_map(&mut p, &mut rng);
        assert!(p.been_to & MINE != 0);
        let n: u32 = s.trim_start_matches("scene").parse().unwrap();
        assert!((164..=169).contains(&n));
        assert_ne!(p.map[0], 0);
    }

    #[test]
    fn death_scene_by_lives() {
        let mut rng = rng();
        assert_eq!(death_scene(2, &mut rng), "scene150");
        assert_eq!(death_scene(0, &mut rng), "scene153");
        let s = death_scene(3, &mut rng);
        assert!(s == "scene148" || s == "scene149");
    }
}
