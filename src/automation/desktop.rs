//! The screen and mouse as seen by the automation loop.

use anyhow::Result;

use crate::automation::detection::Rgb;
use crate::automation::input;
use crate::capture::{self, Point};

/// Pixel reads and mouse actions the automation loop depends on.
pub trait Desktop {
    /// Reads the colors at `points`, in order, from a single capture.
    fn sample_colors(&mut self, points: &[Point]) -> Result<Vec<Rgb>>;
    fn move_to(&mut self, point: Point) -> Result<()>;
    fn press_left(&mut self, point: Point) -> Result<()>;
    fn release_left(&mut self, point: Point) -> Result<()>;

    fn click_left(&mut self, point: Point) -> Result<()> {
        self.move_to(point)?;
        self.press_left(point)?;
        self.release_left(point)
    }
}

/// The real desktop: GDI capture and SendInput.
#[derive(Debug, Default)]
pub struct ScreenDesktop;

impl Desktop for ScreenDesktop {
    fn sample_colors(&mut self, points: &[Point]) -> Result<Vec<Rgb>> {
        capture::sample_colors(points)
    }

    fn move_to(&mut self, point: Point) -> Result<()> {
        input::move_cursor(point)
    }

    fn press_left(&mut self, point: Point) -> Result<()> {
        input::left_down(point)
    }

    fn release_left(&mut self, point: Point) -> Result<()> {
        input::left_up(point)
    }
}
