//! A single NTv2 sub-grid

use serde::Serialize;

/// Shift interpolated at one point, in arc-seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShiftValue {
    pub lat_shift: f64,
    /// Positive west, as stored in the file
    pub lon_shift: f64,
    pub lat_accuracy: f64,
    pub lon_accuracy: f64,
}

/// One rectangular lattice of shift nodes
///
/// Bounds are arc-seconds with longitude positive west, so `west > east`.
/// Nodes run row by row from south to north, each row from east to west.
#[derive(Debug, Clone, Serialize)]
pub struct GridShiftGrid {
    pub name: String,
    /// Parent sub-grid name, `None` for a root grid
    pub parent: Option<String>,
    pub created: String,
    pub updated: String,
    pub south: f64,
    pub north: f64,
    pub east: f64,
    pub west: f64,
    pub lat_inc: f64,
    pub lon_inc: f64,
    pub rows: usize,
    pub cols: usize,
    /// Index of the parent in the owning file
    pub parent_index: Option<usize>,
    /// Indices of direct children in the owning file
    pub children: Vec<usize>,
    #[serde(skip)]
    pub(crate) lat_shift: Vec<f64>,
    #[serde(skip)]
    pub(crate) lon_shift: Vec<f64>,
    #[serde(skip)]
    pub(crate) lat_accuracy: Vec<f64>,
    #[serde(skip)]
    pub(crate) lon_accuracy: Vec<f64>,
}

impl GridShiftGrid {
    /// Whether the point lies in the closed bounding box
    pub fn contains(&self, lon_pw: f64, lat: f64) -> bool {
        lat >= self.south && lat <= self.north && lon_pw >= self.east && lon_pw <= self.west
    }

    /// Bounding-box area in square arc-seconds
    pub fn area(&self) -> f64 {
        (self.north - self.south) * (self.west - self.east)
    }

    pub fn node_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Stored values of the node at (row, col)
    pub fn node(&self, row: usize, col: usize) -> Option<ShiftValue> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        let index = row * self.cols + col;
        Some(ShiftValue {
            lat_shift: self.lat_shift[index],
            lon_shift: self.lon_shift[index],
            lat_accuracy: self.lat_accuracy[index],
            lon_accuracy: self.lon_accuracy[index],
        })
    }

    /// Bilinear interpolation at a point inside this grid
    ///
    /// The last row and column belong to the last cell, so points on the
    /// north or west edge interpolate within the grid.
    pub fn interpolate(&self, lon_pw: f64, lat: f64) -> Option<ShiftValue> {
        if !self.contains(lon_pw, lat) {
            return None;
        }

        let x = (lon_pw - self.east) / self.lon_inc;
        let y = (lat - self.south) / self.lat_inc;

        let col = (x.floor() as usize).min(self.cols.saturating_sub(2));
        let row = (y.floor() as usize).min(self.rows.saturating_sub(2));
        let next_col = (col + 1).min(self.cols - 1);
        let next_row = (row + 1).min(self.rows - 1);

        let dx = if next_col == col { 0.0 } else { x - col as f64 };
        let dy = if next_row == row { 0.0 } else { y - row as f64 };

        let weights = [
            (1.0 - dx) * (1.0 - dy),
            dx * (1.0 - dy),
            (1.0 - dx) * dy,
            dx * dy,
        ];
        let indices = [
            row * self.cols + col,
            row * self.cols + next_col,
            next_row * self.cols + col,
            next_row * self.cols + next_col,
        ];
        let blend = |values: &[f64]| -> f64 {
            weights[0] * values[indices[0]]
                + weights[1] * values[indices[1]]
                + weights[2] * values[indices[2]]
                + weights[3] * values[indices[3]]
        };

        Some(ShiftValue {
            lat_shift: blend(&self.lat_shift),
            lon_shift: blend(&self.lon_shift),
            lat_accuracy: blend(&self.lat_accuracy),
            lon_accuracy: blend(&self.lon_accuracy),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3 rows x 3 cols over [0, 7200] x [0, 7200] arc-seconds
    fn grid() -> GridShiftGrid {
        let lat_shift: Vec<f64> = (0..9).map(|i| i as f64 * 0.1).collect();
        let lon_shift: Vec<f64> = (0..9).map(|i| 1.0 + i as f64 * 0.25).collect();
        GridShiftGrid {
            name: "TEST".into(),
            parent: None,
            created: String::new(),
            updated: String::new(),
            south: 0.0,
            north: 7200.0,
            east: 0.0,
            west: 7200.0,
            lat_inc: 3600.0,
            lon_inc: 3600.0,
            rows: 3,
            cols: 3,
            parent_index: None,
            children: Vec::new(),
            lat_accuracy: vec![0.5; 9],
            lon_accuracy: vec![0.5; 9],
            lat_shift,
            lon_shift,
        }
    }

    #[test]
    fn test_exact_at_every_node() {
        let g = grid();
        for row in 0..3 {
            for col in 0..3 {
                let lon = col as f64 * 3600.0;
                let lat = row as f64 * 3600.0;
                let value = g.interpolate(lon, lat).unwrap();
                let node = g.node(row, col).unwrap();
                assert_eq!(value.lat_shift, node.lat_shift, "row {row} col {col}");
                assert_eq!(value.lon_shift, node.lon_shift, "row {row} col {col}");
            }
        }
    }

    #[test]
    fn test_cell_centre_is_mean_of_corners() {
        let g = grid();
        let value = g.interpolate(1800.0, 1800.0).unwrap();
        let expected = (0.0 + 0.1 + 0.3 + 0.4) / 4.0;
        assert!((value.lat_shift - expected).abs() < 1e-12);
        assert_eq!(value.lat_accuracy, 0.5);
    }

    #[test]
    fn test_outside_returns_none() {
        let g = grid();
        assert!(g.interpolate(-0.001, 10.0).is_none());
        assert!(g.interpolate(10.0, 7200.001).is_none());
        assert!(g.node(3, 0).is_none());
    }

    #[test]
    fn test_area_and_contains() {
        let g = grid();
        assert_eq!(g.area(), 7200.0 * 7200.0);
        assert!(g.contains(7200.0, 7200.0));
        assert!(g.contains(0.0, 0.0));
    }
}
