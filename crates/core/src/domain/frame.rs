// Frame - two monochrome planes sized to the panel

use super::error::{DomainError, Result};

/// Panel geometry in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// One monochrome bitmap layer; `true` means ink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    width: u32,
    height: u32,
    pixels: Vec<bool>,
}

impl Plane {
    /// Blank (ink-absent) plane
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![false; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.width, self.height)
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Out-of-bounds reads are blank
    pub fn get(&self, x: i32, y: i32) -> bool {
        self.index(x, y).map(|i| self.pixels[i]).unwrap_or(false)
    }

    /// Out-of-bounds writes are clipped
    pub fn set(&mut self, x: i32, y: i32, ink: bool) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = ink;
        }
    }

    /// Copy every pixel of `src` (ink and blank alike) with its origin at `(x, y)`
    pub fn stamp(&mut self, src: &Plane, x: i32, y: i32) {
        for sy in 0..src.height as i32 {
            for sx in 0..src.width as i32 {
                self.set(x + sx, y + sy, src.get(sx, sy));
            }
        }
    }

    /// Flip every pixel of the rectangle, clipped to the plane
    pub fn invert_region(&mut self, x: i32, y: i32, width: u32, height: u32) {
        for py in y..y + height as i32 {
            for px in x..x + width as i32 {
                if let Some(i) = self.index(px, py) {
                    self.pixels[i] = !self.pixels[i];
                }
            }
        }
    }

    pub fn ink_count(&self) -> usize {
        self.pixels.iter().filter(|p| **p).count()
    }

    /// Device buffer: rows packed MSB-first, bit set = no ink,
    /// stride `ceil(width / 8)`, padding bits set.
    pub fn pack(&self) -> Vec<u8> {
        let stride = (self.width as usize).div_ceil(8);
        let mut buf = vec![0xFFu8; stride * self.height as usize];
        for y in 0..self.height as usize {
            for x in 0..self.width as usize {
                if self.pixels[y * self.width as usize + x] {
                    buf[y * stride + x / 8] &= !(0x80 >> (x % 8));
                }
            }
        }
        buf
    }
}

/// Ink and accent planes of equal size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub ink: Plane,
    pub accent: Plane,
}

impl Frame {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            ink: Plane::new(geometry.width, geometry.height),
            accent: Plane::new(geometry.width, geometry.height),
        }
    }

    pub fn from_planes(ink: Plane, accent: Plane) -> Result<Self> {
        if ink.geometry() != accent.geometry() {
            return Err(DomainError::GeometryMismatch {
                ink_w: ink.width,
                ink_h: ink.height,
                accent_w: accent.width,
                accent_h: accent.height,
            });
        }
        Ok(Self { ink, accent })
    }

    pub fn geometry(&self) -> Geometry {
        self.ink.geometry()
    }
}

/// Two-layer picture stamped onto both planes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artwork {
    pub name: String,
    pub ink: Plane,
    pub accent: Option<Plane>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_plane_is_blank() {
        let plane = Plane::new(126, 298);
        assert_eq!(plane.ink_count(), 0);
        assert!(!plane.get(125, 297));
    }

    #[test]
    fn test_set_clips_out_of_bounds() {
        let mut plane = Plane::new(4, 4);
        plane.set(-1, 0, true);
        plane.set(4, 0, true);
        plane.set(0, 4, true);
        assert_eq!(plane.ink_count(), 0);
        plane.set(3, 3, true);
        assert!(plane.get(3, 3));
    }

    #[test]
    fn test_stamp_overwrites_blank_pixels_too() {
        let mut plane = Plane::new(4, 4);
        plane.set(1, 1, true);
        let mut art = Plane::new(2, 2);
        art.set(1, 1, true);
        plane.stamp(&art, 1, 1);
        assert!(!plane.get(1, 1));
        assert!(plane.get(2, 2));
    }

    #[test]
    fn test_invert_region_is_clipped() {
        let mut plane = Plane::new(3, 3);
        plane.invert_region(1, 1, 5, 5);
        assert_eq!(plane.ink_count(), 4);
        assert!(!plane.get(0, 0));
    }

    #[test]
    fn test_pack_layout() {
        let mut plane = Plane::new(10, 2);
        plane.set(0, 0, true);
        plane.set(9, 1, true);
        let buf = plane.pack();
        assert_eq!(buf.len(), 4);
        assert_eq!(buf[0], 0b0111_1111);
        assert_eq!(buf[1], 0xFF);
        assert_eq!(buf[2], 0xFF);
        assert_eq!(buf[3], 0b1011_1111);
    }

    #[test]
    fn test_frame_geometry_must_match() {
        assert!(Frame::from_planes(Plane::new(2, 2), Plane::new(2, 3)).is_err());
        let frame = Frame::new(Geometry::new(126, 298));
        assert_eq!(frame.ink.geometry(), frame.accent.geometry());
    }
}
