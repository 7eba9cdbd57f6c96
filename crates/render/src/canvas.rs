// embedded-graphics draw target over a core Plane

use core::convert::Infallible;

use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};
use inkstat_core::domain::Plane;

/// Borrowed drawing surface; `BinaryColor::On` is ink.
///
/// Pixels outside the plane are dropped, so text running off the right edge
/// is simply clipped.
pub struct PlaneCanvas<'a> {
    plane: &'a mut Plane,
}

impl<'a> PlaneCanvas<'a> {
    pub fn new(plane: &'a mut Plane) -> Self {
        Self { plane }
    }
}

impl DrawTarget for PlaneCanvas<'_> {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.plane.set(point.x, point.y, color.is_on());
        }
        Ok(())
    }
}

impl OriginDimensions for PlaneCanvas<'_> {
    fn size(&self) -> Size {
        Size::new(self.plane.width(), self.plane.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    #[test]
    fn test_draws_ink_and_clips() {
        let mut plane = Plane::new(8, 4);
        let mut canvas = PlaneCanvas::new(&mut plane);
        assert_eq!(canvas.size(), Size::new(8, 4));

        Rectangle::new(Point::new(6, 2), Size::new(5, 5))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut canvas)
            .unwrap();

        assert!(plane.get(6, 2));
        assert!(plane.get(7, 3));
        assert!(!plane.get(5, 2));
        assert_eq!(plane.ink_count(), 4);
    }

    #[test]
    fn test_off_pixels_clear_ink() {
        let mut plane = Plane::new(4, 4);
        plane.set(1, 1, true);
        PlaneCanvas::new(&mut plane)
            .draw_iter([Pixel(Point::new(1, 1), BinaryColor::Off)])
            .unwrap();
        assert_eq!(plane.ink_count(), 0);
    }
}
