//! Grid setup: zodiac slots laid out in rows and columns.
//!
//! Two clicks define the grid. The first is the top-left slot, the second is
//! the slot one column right and one row down. Everything else is
//! interpolated from that step.

use anyhow::{bail, Result};

use crate::capture::Point;

/// Shape of a slot grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridLayout {
    pub rows: usize,
    pub columns: usize,
    /// Slots actually present, filled row by row. May leave the last row short.
    pub total: usize,
}

impl GridLayout {
    pub fn new(rows: usize, columns: usize, total: usize) -> Result<Self> {
        if rows == 0 || columns == 0 {
            bail!("Rows and columns must be at least 1");
        }
        if total == 0 {
            bail!("Total boxes must be at least 1");
        }
        if total > rows * columns {
            bail!(
                "Total boxes ({}) cannot exceed rows x columns ({})",
                total,
                rows * columns
            );
        }
        Ok(Self {
            rows,
            columns,
            total,
        })
    }

    /// A single box has no step to measure, so the second click is skipped.
    pub fn needs_second_click(&self) -> bool {
        self.total > 1
    }
}

/// Slot positions in row-major order.
///
/// `first` is the top-left slot, `diagonal` the slot at row 1, column 1.
pub fn calculate_grid_coordinates(layout: &GridLayout, first: Point, diagonal: Point) -> Vec<Point> {
    let dx = diagonal.x - first.x;
    let dy = diagonal.y - first.y;

    (0..layout.total)
        .map(|i| {
            let row = (i / layout.columns) as i32;
            let col = (i % layout.columns) as i32;
            Point::new(first.x + col * dx, first.y + row * dy)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_grid_row_major() {
        let layout = GridLayout::new(2, 3, 6).unwrap();
        let points = calculate_grid_coordinates(&layout, Point::new(100, 200), Point::new(150, 240));
        assert_eq!(
            points,
            vec![
                Point::new(100, 200),
                Point::new(150, 200),
                Point::new(200, 200),
                Point::new(100, 240),
                Point::new(150, 240),
                Point::new(200, 240),
            ]
        );
    }

    #[test]
    fn test_partial_last_row() {
        let layout = GridLayout::new(3, 4, 10).unwrap();
        let points = calculate_grid_coordinates(&layout, Point::new(0, 0), Point::new(10, 20));
        assert_eq!(points.len(), 10);
        assert_eq!(points[9], Point::new(10, 40));
    }

    #[test]
    fn test_single_row_ignores_vertical_step() {
        let layout = GridLayout::new(1, 3, 3).unwrap();
        let points = calculate_grid_coordinates(&layout, Point::new(0, 0), Point::new(30, 999));
        assert!(points.iter().all(|p| p.y == 0));
        assert_eq!(points[2].x, 60);
    }

    #[test]
    fn test_layout_validation() {
        assert!(GridLayout::new(0, 3, 1).is_err());
        assert!(GridLayout::new(2, 2, 0).is_err());
        assert!(GridLayout::new(2, 2, 5).is_err());
        assert!(GridLayout::new(2, 2, 4).is_ok());
    }

    #[test]
    fn test_single_box_needs_one_click() {
        assert!(!GridLayout::new(1, 1, 1).unwrap().needs_second_click());
        assert!(GridLayout::new(1, 2, 2).unwrap().needs_second_click());
    }
}
