//! Screen capture and window inspection.
//!
//! This module provides:
//! - Screen coordinates (`Point`) and capture regions (`Region`)
//! - Pixel sampling from a single region screenshot (`sample_colors`)
//! - Game window detection under a click (`is_game_window_at`)

pub mod pixels;
pub mod window;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use pixels::{sample_colors, screen_bounds};
pub use window::is_game_window_at;

/// A position on screen in physical pixels. Serialized as `[x, y]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for (i32, i32) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An axis-aligned screen rectangle. `right` and `bottom` are exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Region {
    pub fn width(&self) -> u32 {
        (self.right - self.left).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.bottom - self.top).max(0) as u32
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x < self.right && p.y >= self.top && p.y < self.bottom
    }

    /// Smallest region containing every point, grown by `padding` on each side.
    /// Returns `None` for an empty slice.
    pub fn bounding(points: &[Point], padding: i32) -> Option<Self> {
        let first = points.first()?;
        let mut region = Region {
            left: first.x,
            top: first.y,
            right: first.x,
            bottom: first.y,
        };
        for p in &points[1..] {
            region.left = region.left.min(p.x);
            region.top = region.top.min(p.y);
            region.right = region.right.max(p.x);
            region.bottom = region.bottom.max(p.y);
        }
        Some(Region {
            left: region.left - padding,
            top: region.top - padding,
            // +1 so the far points themselves are inside the exclusive bound
            right: region.right + padding + 1,
            bottom: region.bottom + padding + 1,
        })
    }

    /// Intersection with `other`, `None` if they do not overlap.
    pub fn intersect(&self, other: &Region) -> Option<Region> {
        let r = Region {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        };
        (r.left < r.right && r.top < r.bottom).then_some(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_serializes_as_pair() {
        let json = serde_json::to_string(&Point::new(640, -12)).unwrap();
        assert_eq!(json, "[640,-12]");
        let back: Point = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(back, Point::new(1, 2));
    }

    #[test]
    fn test_bounding_region_includes_all_points() {
        let points = [Point::new(10, 50), Point::new(30, 20), Point::new(15, 25)];
        let region = Region::bounding(&points, 5).unwrap();
        assert_eq!(
            region,
            Region {
                left: 5,
                top: 15,
                right: 36,
                bottom: 56
            }
        );
        assert!(points.iter().all(|p| region.contains(*p)));
    }

    #[test]
    fn test_bounding_single_point() {
        let region = Region::bounding(&[Point::new(3, 4)], 0).unwrap();
        assert_eq!(region.width(), 1);
        assert_eq!(region.height(), 1);
        assert!(region.contains(Point::new(3, 4)));
    }

    #[test]
    fn test_bounding_empty() {
        assert!(Region::bounding(&[], 5).is_none());
    }

    #[test]
    fn test_intersect() {
        let screen = Region {
            left: 0,
            top: 0,
            right: 1920,
            bottom: 1080,
        };
        let near_edge = Region {
            left: -5,
            top: 1070,
            right: 20,
            bottom: 1090,
        };
        assert_eq!(
            screen.intersect(&near_edge),
            Some(Region {
                left: 0,
                top: 1070,
                right: 20,
                bottom: 1080
            })
        );

        let outside = Region {
            left: 2000,
            top: 0,
            right: 2010,
            bottom: 10,
        };
        assert!(screen.intersect(&outside).is_none());
    }
}
