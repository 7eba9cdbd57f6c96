// Artwork loader
// `<dir>/<name>.black.png` is the ink layer, `<dir>/<name>.red.png` the optional accent layer
use image::GrayImage;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use inkstat_core::domain::{Artwork, Plane};

/// Luma below this is ink
pub const INK_THRESHOLD: u8 = 128;

#[derive(Error, Debug)]
pub enum ArtworkError {
    #[error("Artwork {path} could not be decoded: {reason}")]
    Decode { path: PathBuf, reason: String },
}

pub fn ink_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.black.png"))
}

pub fn accent_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.red.png"))
}

/// Threshold a grayscale bitmap into a plane
pub fn plane_from_luma(img: &GrayImage) -> Plane {
    let mut plane = Plane::new(img.width(), img.height());
    for (x, y, pixel) in img.enumerate_pixels() {
        if pixel[0] < INK_THRESHOLD {
            plane.set(x as i32, y as i32, true);
        }
    }
    plane
}

fn load_plane(path: &Path) -> Result<Plane, ArtworkError> {
    let img = image::open(path).map_err(|e| ArtworkError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(plane_from_luma(&img.to_luma8()))
}

/// Load one artwork; the accent layer is optional
pub fn load_artwork(dir: &Path, name: &str) -> Result<Artwork, ArtworkError> {
    let ink = load_plane(&ink_path(dir, name))?;

    let accent_file = accent_path(dir, name);
    let accent = if accent_file.exists() {
        match load_plane(&accent_file) {
            Ok(plane) => Some(plane),
            Err(e) => {
                warn!(artwork = name, error = %e, "Accent layer unusable; drawing ink only");
                None
            }
        }
    } else {
        None
    };

    Ok(Artwork {
        name: name.to_string(),
        ink,
        accent,
    })
}

/// Load every distinct name; failures are logged and left out
pub fn load_artworks(dir: &Path, names: &[String]) -> Vec<Artwork> {
    let mut loaded: Vec<Artwork> = Vec::new();
    for name in names {
        if loaded.iter().any(|art| &art.name == name) {
            continue;
        }
        match load_artwork(dir, name) {
            Ok(art) => {
                info!(
                    artwork = %name,
                    width = art.ink.width(),
                    height = art.ink.height(),
                    accent = art.accent.is_some(),
                    "Artwork loaded"
                );
                loaded.push(art);
            }
            Err(e) => warn!(artwork = %name, error = %e, "Artwork skipped"),
        }
    }
    loaded
}
