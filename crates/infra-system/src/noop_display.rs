// No-op display adapter
// Same contract as a panel driver, logs instead of driving hardware
use image::{GrayImage, Luma};
use std::path::PathBuf;
use tracing::{info, warn};

use inkstat_core::domain::Geometry;
use inkstat_core::port::display::buffer_len;
use inkstat_core::port::{DisplayAdapter, DisplayError};

/// Geometry of the 2.13" three-color panel the agent was built for
pub const NOOP_GEOMETRY: Geometry = Geometry::new(126, 298);

pub struct NoopDisplay {
    geometry: Geometry,
    dump_dir: Option<PathBuf>,
    frames: u64,
    torn_down: bool,
}

impl Default for NoopDisplay {
    fn default() -> Self {
        Self::new(NOOP_GEOMETRY)
    }
}

impl NoopDisplay {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            dump_dir: None,
            frames: 0,
            torn_down: false,
        }
    }

    /// Write `ink.png` / `accent.png` into `dir` on every refresh
    pub fn with_dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dump_dir = Some(dir.into());
        self
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn check_len(&self, buf: &[u8]) -> Result<(), DisplayError> {
        let expected = buffer_len(self.geometry);
        if buf.len() != expected {
            return Err(DisplayError::BufferSize {
                expected,
                actual: buf.len(),
            });
        }
        Ok(())
    }

    fn dump(&self, ink: &[u8], accent: &[u8]) {
        let Some(dir) = &self.dump_dir else {
            return;
        };
        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!(dir = %dir.display(), error = %e, "Frame dump directory unavailable");
            return;
        }
        for (name, buf) in [("ink.png", ink), ("accent.png", accent)] {
            let path = dir.join(name);
            if let Err(e) = unpack(buf, self.geometry).save(&path) {
                warn!(path = %path.display(), error = %e, "Frame dump failed");
            }
        }
    }
}

/// Device buffer back to a bitmap: ink black, no ink white
pub fn unpack(buf: &[u8], geometry: Geometry) -> GrayImage {
    let stride = (geometry.width as usize).div_ceil(8);
    GrayImage::from_fn(geometry.width, geometry.height, |x, y| {
        let byte = buf
            .get(y as usize * stride + x as usize / 8)
            .copied()
            .unwrap_or(0xFF);
        if byte & (0x80 >> (x % 8)) == 0 {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

impl DisplayAdapter for NoopDisplay {
    fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        if self.torn_down {
            return Err(DisplayError::Unavailable("panel already released".to_string()));
        }
        info!("noop panel: init");
        Ok(())
    }

    fn display(&mut self, ink: &[u8], accent: &[u8]) -> Result<(), DisplayError> {
        self.check_len(ink)?;
        self.check_len(accent)?;
        self.frames += 1;
        info!(
            frame = self.frames,
            ink_bytes = ink.len(),
            accent_bytes = accent.len(),
            "noop panel: display"
        );
        self.dump(ink, accent);
        Ok(())
    }

    fn sleep(&mut self) -> Result<(), DisplayError> {
        info!("noop panel: sleep");
        Ok(())
    }

    fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        info!(frames = self.frames, "noop panel: released");
    }
}
