//! 8-bit indexed pixel surfaces

/// A 256-entry RGB palette
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub colors: [[u8; 3]; 256],
}

impl Palette {
    /// Index used for debug rectangle outlines
    pub const OUTLINE: u8 = 1;

    /// Greyscale ramp with a blue outline colour at index 1
    pub fn debug_default() -> Self {
        let mut colors = [[0u8; 3]; 256];
        for (i, c) in colors.iter_mut().enumerate() {
            *c = [i as u8, i as u8, i as u8];
        }
        colors[Self::OUTLINE as usize] = [0, 0, 0xFF];
        Palette { colors }
    }

    /// Packed 0RGB value, as minifb expects
    pub fn rgb(&self, index: u8) -> u32 {
        let [r, g, b] = self.colors[index as usize];
        ((r as u32) << 16) | ((g as u32) << 8) | b as u32
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::debug_default()
    }
}

/// An indexed-colour bitmap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    pub width: u16,
    pub height: u16,
    pub pixels: Vec<u8>,
}

impl Surface {
    pub fn new(width: u16, height: u16) -> Self {
        Surface {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn fill(&mut self, color: u8) {
        self.pixels.fill(color);
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<u8> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: u8) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Copy `src` onto this surface with its top-left at (x, y), clipped
    pub fn blit(&mut self, src: &Surface, x: i32, y: i32) {
        for sy in 0..src.height as i32 {
            let dy = y + sy;
            if dy < 0 || dy >= self.height as i32 {
                continue;
            }
            for sx in 0..src.width as i32 {
                let dx = x + sx;
                if dx < 0 || dx >= self.width as i32 {
                    continue;
                }
                let v = src.pixels[sy as usize * src.width as usize + sx as usize];
                self.pixels[dy as usize * self.width as usize + dx as usize] = v;
            }
        }
    }

    /// Outline with inclusive corners
    pub fn draw_rect_outline(&mut self, left: i32, top: i32, right: i32, bottom: i32, color: u8) {
        for x in left..=right {
            self.set_pixel(x, top, color);
            self.set_pixel(x, bottom, color);
        }
        for y in top..=bottom {
            self.set_pixel(left, y, color);
            self.set_pixel(right, y, color);
        }
    }

    /// Small cross centred on (x, y)
    pub fn draw_marker(&mut self, x: i32, y: i32, color: u8) {
        for d in -2..=2 {
            self.set_pixel(x + d, y, color);
            self.set_pixel(x, y + d, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blit_clips_to_destination() {
        let mut screen = Surface::new(8, 8);
        let mut frame = Surface::new(4, 4);
        frame.fill(7);

        screen.blit(&frame, 6, -2);
        assert_eq!(screen.pixel(6, 0), Some(7));
        assert_eq!(screen.pixel(7, 1), Some(7));
        assert_eq!(screen.pixel(5, 0), Some(0));
        assert_eq!(screen.pixel(6, 2), Some(0));
    }

    #[test]
    fn test_outline_is_inclusive() {
        let mut s = Surface::new(10, 10);
        s.draw_rect_outline(2, 2, 5, 4, Palette::OUTLINE);
        assert_eq!(s.pixel(5, 4), Some(1));
        assert_eq!(s.pixel(2, 3), Some(1));
        assert_eq!(s.pixel(3, 3), Some(0));
        assert_eq!(s.pixel(6, 4), Some(0));
    }

    #[test]
    fn test_palette_outline_is_blue() {
        let palette = Palette::default();
        assert_eq!(palette.rgb(Palette::OUTLINE), 0x0000FF);
        assert_eq!(palette.rgb(255), 0xFFFFFF);
    }
}
