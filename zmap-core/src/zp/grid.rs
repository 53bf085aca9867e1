// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::f64::consts::PI;

use crate::error::ZmapError;

/// Approximate number of pixels covered by the unit disk on a square grid
#[inline]
pub fn disk_area(size: usize) -> f64 {
    PI * (size * size) as f64 / 4.0
}

/// Row-major polar coordinates of a square pixel grid.
///
/// Pixel centers are mapped onto [-1, 1] so that the unit disk touches the
/// grid edges. For odd sizes the center pixel sits exactly at radius 0.
///
/// # Examples
///
/// ```
/// use zmap_core::zp::PolarGrid;
///
/// let grid = PolarGrid::new(5).unwrap();
///
/// assert_eq!(grid.len(), 25);
/// assert_eq!(grid.radius()[12], 0.0);
/// assert!(grid.inside()[12]);
/// assert!(!grid.inside()[0]);
/// ```
#[derive(Debug, Clone)]
pub struct PolarGrid {
    size: usize,
    radius: Vec<f64>,
    angle: Vec<f64>,
    inside: Vec<bool>,
}

impl PolarGrid {
    pub fn new(size: usize) -> Result<PolarGrid, ZmapError> {
        if size < 1 {
            return Err(ZmapError::GridSizeError(size));
        }

        let capacity = size * size;
        let mut radius = Vec::with_capacity(capacity);
        let mut angle = Vec::with_capacity(capacity);
        let mut inside = Vec::with_capacity(capacity);

        let s = size as f64;
        for i in 0..size {
            let y = (2.0 * i as f64 + 1.0 - s) / s;
            for k in 0..size {
                let x = (2.0 * k as f64 + 1.0 - s) / s;
                let r = (x * x + y * y).sqrt();
                radius.push(r);
                angle.push(y.atan2(x));
                inside.push(r <= 1.0);
            }
        }

        Ok(PolarGrid {
            size,
            radius,
            angle,
            inside,
        })
    }

    /// Grid width (and height)
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of pixels
    pub fn len(&self) -> usize {
        self.radius.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radius.is_empty()
    }

    /// Distance of each pixel center from the grid center
    pub fn radius(&self) -> &[f64] {
        &self.radius
    }

    /// Polar angle of each pixel center in (-pi, pi]
    pub fn angle(&self) -> &[f64] {
        &self.angle
    }

    /// Whether each pixel center falls within the unit disk
    pub fn inside(&self) -> &[bool] {
        &self.inside
    }

    /// Approximate disk area in pixels
    pub fn area(&self) -> f64 {
        disk_area(self.size)
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_polar_grid_invalid() {
        assert_eq!(PolarGrid::new(0).unwrap_err(), ZmapError::GridSizeError(0));
    }

    #[test]
    fn test_polar_grid_single_pixel() {
        let grid = PolarGrid::new(1).unwrap();
        assert_eq!(grid.radius(), &[0.0]);
        assert_eq!(grid.inside(), &[true]);
    }

    #[test]
    fn test_polar_grid_symmetric() {
        let grid = PolarGrid::new(8).unwrap();
        let r = grid.radius();
        for i in 0..8 {
            for k in 0..8 {
                let mirrored = (7 - i) * 8 + (7 - k);
                assert!((r[i * 8 + k] - r[mirrored]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_polar_grid_angle() {
        let grid = PolarGrid::new(3).unwrap();
        let t = grid.angle();
        // Right of center, below center (increasing row), left of center
        assert!((t[5] - 0.0).abs() < 1e-12);
        assert!((t[7] - PI / 2.0).abs() < 1e-12);
        assert!((t[3] - PI).abs() < 1e-12);
    }

    #[test]
    fn test_polar_grid_area() {
        let grid = PolarGrid::new(64).unwrap();
        let count = grid.inside().iter().filter(|&&v| v).count() as f64;
        assert!((count - grid.area()).abs() / grid.area() < 0.02);
    }
}
