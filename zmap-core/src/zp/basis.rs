// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use nalgebra::DMatrix;

use crate::error::ZmapError;
use crate::zp::coeffs::family_coeffs;
use crate::zp::grid::disk_area;
use crate::zp::{Family, PolarGrid};

/// Powers of the radius sampled on a polar grid
///
/// Rows hold r^k for k = n_max down to 0, optionally weighted by
/// (1 - r)^(alpha / 2), and are zero outside the unit disk. The k = 0 row is
/// the disk indicator so the center pixel evaluates to one rather than 0^0.
///
/// # Arguments
///
/// * `n_max` - Largest power of the radius
/// * `grid` - Polar grid to sample
/// * `alpha` - Optional generalized pseudo-Zernike shape parameter
pub fn radial_power_matrix(n_max: usize, grid: &PolarGrid, alpha: Option<f64>) -> DMatrix<f64> {
    let weights: Vec<f64> = grid
        .radius()
        .iter()
        .zip(grid.inside().iter())
        .map(|(&r, &inside)| match (inside, alpha) {
            (false, _) => 0.0,
            (true, None) => 1.0,
            (true, Some(alpha)) => (1.0 - r).max(0.0).powf(alpha / 2.0),
        })
        .collect();

    let radius = grid.radius();

    DMatrix::from_fn(n_max + 1, grid.len(), |row, px| {
        let power = n_max - row;
        if power == 0 {
            weights[px]
        } else {
            radius[px].powi(power as i32) * weights[px]
        }
    })
}

/// Angular factor of each polynomial sampled on a polar grid
///
/// Negative frequencies map to sin(|m| theta) and the remaining ones to
/// cos(|m| theta).
pub fn angular_matrix(m: &[i32], grid: &PolarGrid) -> DMatrix<f64> {
    let angle = grid.angle();

    DMatrix::from_fn(m.len(), grid.len(), |row, px| {
        let mi = m[row];
        let t = mi.unsigned_abs() as f64 * angle[px];
        if mi < 0 { t.sin() } else { t.cos() }
    })
}

/// Disk polynomials sampled on a square pixel grid.
///
/// Each row of [`BasisImages::data`] is one flattened row-major image. The
/// basis occupies `len() * size^2` values and is the dominant memory cost of
/// an extractor, so large grids at high degree should be sized with care.
///
/// # Examples
///
/// ```
/// use zmap_core::zp::{BasisImages, Family};
///
/// let basis = BasisImages::new(&[0, 1, 1], &[0, -1, 1], 16, Family::Zernike).unwrap();
///
/// assert_eq!(basis.len(), 3);
/// assert_eq!(basis.data().shape(), (3, 256));
/// assert_eq!(basis.image(0).shape(), (16, 16));
/// ```
#[derive(Debug, Clone)]
pub struct BasisImages {
    size: usize,
    n: Vec<usize>,
    m: Vec<i32>,
    family: Family,
    data: DMatrix<f64>,
}

impl BasisImages {
    /// Sample the normalized polynomials (n, m) on a size x size grid
    ///
    /// # Arguments
    ///
    /// * `n` - Radial degree of each polynomial
    /// * `m` - Azimuthal frequency of each polynomial
    /// * `size` - Grid width and height
    /// * `family` - Polynomial family
    pub fn new(n: &[usize], m: &[i32], size: usize, family: Family) -> Result<BasisImages, ZmapError> {
        let grid = PolarGrid::new(size)?;
        let c_matrix = family_coeffs(n, m, family, true)?;

        let n_max = c_matrix.ncols() - 1;
        let radial = radial_power_matrix(n_max, &grid, family.alpha());
        let angular = angular_matrix(m, &grid);

        let data = (c_matrix * radial).component_mul(&angular);

        Ok(BasisImages {
            size,
            n: n.to_vec(),
            m: m.to_vec(),
            family,
            data,
        })
    }

    /// Number of polynomials
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    /// Grid width and height
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn n(&self) -> &[usize] {
        &self.n
    }

    pub fn m(&self) -> &[i32] {
        &self.m
    }

    pub fn family(&self) -> Family {
        self.family
    }

    /// Flattened basis with one polynomial per row
    pub fn data(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// The j-th basis image as a size x size matrix indexed by (row, column)
    pub fn image(&self, j: usize) -> DMatrix<f64> {
        let size = self.size;
        DMatrix::from_fn(size, size, |i, k| self.data[(j, i * size + k)])
    }

    /// Discrete inner products between all basis images divided by the disk area
    pub fn inner_products(&self) -> DMatrix<f64> {
        (&self.data * self.data.transpose()) / disk_area(self.size)
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::zp::index::nm_pairs;

    fn basis(n_max: usize, size: usize, family: Family) -> BasisImages {
        let (n, m): (Vec<usize>, Vec<i32>) = nm_pairs(n_max, family).into_iter().unzip();
        BasisImages::new(&n, &m, size, family).unwrap()
    }

    fn max_deviation(basis: &BasisImages) -> (f64, f64) {
        let g = basis.inner_products();
        let mut diagonal: f64 = 0.0;
        let mut off_diagonal: f64 = 0.0;
        for i in 0..g.nrows() {
            for j in 0..g.ncols() {
                if i == j {
                    diagonal = diagonal.max((g[(i, j)] - 1.0).abs());
                } else {
                    off_diagonal = off_diagonal.max(g[(i, j)].abs());
                }
            }
        }
        (diagonal, off_diagonal)
    }

    #[test]
    fn test_radial_power_matrix_center() {
        let grid = PolarGrid::new(5).unwrap();
        let radial = radial_power_matrix(3, &grid, None);
        assert_eq!(radial.shape(), (4, 25));
        assert_eq!(radial[(3, 12)], 1.0);
        assert_eq!(radial[(0, 12)], 0.0);
        // Corner pixel is outside of the disk
        assert!(radial.column(0).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_radial_power_matrix_weighted() {
        let grid = PolarGrid::new(5).unwrap();
        let radial = radial_power_matrix(1, &grid, Some(2.0));
        // Pixel right of center sits at r = 0.4
        assert!((radial[(1, 13)] - 0.6).abs() < 1e-12);
        assert!((radial[(0, 13)] - 0.4 * 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_angular_matrix() {
        let grid = PolarGrid::new(3).unwrap();
        let angular = angular_matrix(&[-1, 0, 1, 2], &grid);
        // Pixel below center sits at theta = pi / 2
        assert!((angular[(0, 7)] - 1.0).abs() < 1e-12);
        assert_eq!(angular[(1, 7)], 1.0);
        assert!(angular[(2, 7)].abs() < 1e-12);
        assert!((angular[(3, 7)] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_basis_images_zero_outside_disk() {
        let basis = basis(4, 16, Family::Zernike);
        let grid = PolarGrid::new(16).unwrap();
        for (px, inside) in grid.inside().iter().enumerate() {
            if !inside {
                assert!(basis.data().column(px).iter().all(|&v| v == 0.0));
            }
        }
    }

    #[test]
    fn test_basis_images_orthonormal_zernike() {
        // coarse grids only reach a few percent
        let (diagonal, off_diagonal) = max_deviation(&basis(4, 32, Family::Zernike));
        assert!(diagonal < 6e-2);
        assert!(off_diagonal < 4e-2);

        let (diagonal, off_diagonal) = max_deviation(&basis(4, 64, Family::Zernike));
        assert!(diagonal < 5e-2);
        assert!(off_diagonal < 5e-2);

        let (diagonal, off_diagonal) = max_deviation(&basis(4, 128, Family::Zernike));
        assert!(diagonal < 2e-2);
        assert!(off_diagonal < 2e-2);
    }

    #[test]
    fn test_basis_images_orthonormal_pseudo_zernike() {
        for alpha in [0.0, 2.0] {
            let family = Family::PseudoZernike { alpha };
            let (diagonal, off_diagonal) = max_deviation(&basis(3, 64, family));
            assert!(diagonal < 3e-2);
            assert!(off_diagonal < 3e-2);
        }
    }

    #[test]
    fn test_basis_images_invalid() {
        assert!(BasisImages::new(&[1], &[0], 16, Family::Zernike).is_err());
        assert!(BasisImages::new(&[0], &[0], 0, Family::Zernike).is_err());
    }
}
