// Frame Compositor - snapshot + artwork -> ink/accent planes
//
// Draw order, each step overwriting what is under it:
// 1. primary clock (ink)
// 2. secondary clocks (accent)
// 3. status lines (ink)
// 4. rotating artwork (both planes)

use std::collections::HashMap;

use embedded_graphics::{
    mono_font::{
        ascii::{FONT_10X20, FONT_5X8, FONT_6X10, FONT_9X18_BOLD},
        MonoFont, MonoTextStyle,
    },
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use tracing::{debug, warn};

use inkstat_core::domain::{Artwork, Frame, Geometry, Plane, StatusSnapshot};
use inkstat_core::port::FrameComposer;
use inkstat_core::Result;

use crate::canvas::PlaneCanvas;

const PRIMARY_CLOCK_ORIGIN: Point = Point::new(2, 0);
const SECONDARY_CLOCK_Y: i32 = 35;
/// Top edge of each status line, in `StatusSnapshot::status_lines` order
const STATUS_LINE_Y: [i32; 5] = [60, 70, 79, 88, 97];
/// Artwork origin, just below the last status line
pub const ARTWORK_OFFSET: Point = Point::new(0, 106);

/// Background polarity of the artwork's ink layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarity {
    /// Artwork drawn as loaded
    #[default]
    Light,
    /// Ink layer inverted within the artwork bounds
    Dark,
}

impl Polarity {
    pub fn from_black_background(black_background: bool) -> Self {
        if black_background {
            Polarity::Dark
        } else {
            Polarity::Light
        }
    }
}

pub struct FrameCompositor {
    artworks: HashMap<String, Artwork>,
    rotation: Vec<String>,
    polarity: Polarity,
}

impl FrameCompositor {
    /// `rotation` may name artworks that failed to load; those iterations
    /// are drawn without artwork.
    pub fn new(artworks: Vec<Artwork>, rotation: Vec<String>, polarity: Polarity) -> Self {
        let artworks = artworks
            .into_iter()
            .map(|art| (art.name.clone(), art))
            .collect();
        Self {
            artworks,
            rotation,
            polarity,
        }
    }

    /// Rotation entry for an iteration
    pub fn artwork_name(&self, iteration: u64) -> Option<&str> {
        if self.rotation.is_empty() {
            return None;
        }
        let index = (iteration % self.rotation.len() as u64) as usize;
        Some(self.rotation[index].as_str())
    }

    fn stamp_artwork(&self, frame: &mut Frame, iteration: u64) {
        let Some(name) = self.artwork_name(iteration) else {
            return;
        };
        let Some(art) = self.artworks.get(name) else {
            warn!(artwork = name, "Artwork not loaded; drawing without it");
            return;
        };
        debug!(artwork = name, polarity = ?self.polarity, "Drawing artwork");

        let Point { x, y } = ARTWORK_OFFSET;
        frame.ink.stamp(&art.ink, x, y);
        if self.polarity == Polarity::Dark {
            frame
                .ink
                .invert_region(x, y, art.ink.width(), art.ink.height());
        }
        if let Some(accent) = &art.accent {
            frame.accent.stamp(accent, x, y);
        }
    }
}

fn draw_text(plane: &mut Plane, text: &str, origin: Point, font: &MonoFont<'_>) {
    if text.is_empty() {
        return;
    }
    let style = MonoTextStyle::new(font, BinaryColor::On);
    let mut canvas = PlaneCanvas::new(plane);
    Text::with_baseline(text, origin, style, Baseline::Top)
        .draw(&mut canvas)
        .unwrap_or_else(|never| match never {});
}

impl FrameComposer for FrameCompositor {
    fn compose(
        &self,
        snapshot: &StatusSnapshot,
        iteration: u64,
        geometry: Geometry,
    ) -> Result<Frame> {
        let mut ink = Plane::new(geometry.width, geometry.height);
        let mut accent = Plane::new(geometry.width, geometry.height);

        draw_text(&mut ink, &snapshot.primary_clock, PRIMARY_CLOCK_ORIGIN, &FONT_10X20);

        let columns = snapshot.secondary_clocks.len().max(1) as i32;
        for (i, readout) in snapshot.secondary_clocks.iter().enumerate() {
            let x = i as i32 * geometry.width as i32 / columns;
            draw_text(
                &mut accent,
                readout,
                Point::new(x, SECONDARY_CLOCK_Y),
                &FONT_9X18_BOLD,
            );
        }

        for (i, (line, y)) in snapshot
            .status_lines()
            .iter()
            .zip(STATUS_LINE_Y)
            .enumerate()
        {
            // packet loss gets the larger face
            let font = if i == 0 { &FONT_6X10 } else { &FONT_5X8 };
            draw_text(&mut ink, line, Point::new(0, y), font);
        }

        let mut frame = Frame::from_planes(ink, accent)?;
        self.stamp_artwork(&mut frame, iteration);
        Ok(frame)
    }
}
