// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::f64::consts::PI;

use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::constant::CURVE_STEPS;
use crate::error::ZmapError;
use crate::mp::transform::rotation_weights;
use crate::mp::{MomentArray, MomentData, Norm, States};

/// Evenly spaced values between `start` and `end`
///
/// # Examples
///
/// ```
/// use zmap_core::mp::symmetry::linspace;
///
/// assert_eq!(linspace(0.0, 1.0, 5, true), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
/// assert_eq!(linspace(0.0, 1.0, 4, false), vec![0.0, 0.25, 0.5, 0.75]);
/// ```
pub fn linspace(start: f64, end: f64, steps: usize, endpoint: bool) -> Vec<f64> {
    let intervals = match (endpoint, steps) {
        (_, 0) => return Vec::new(),
        (true, 1) => return vec![start],
        (true, _) => steps - 1,
        (false, _) => steps,
    };

    let step = (end - start) / intervals as f64;
    (0..steps).map(|k| start + step * k as f64).collect()
}

/// Per-sample scores as a square map when the sample count allows it
///
/// Samples extracted with a sliding window are image-major then row-major,
/// so `s * s` samples fold back to an s x s map. Other counts are returned
/// as a single column.
pub fn square_map(values: &[f64], reshape: bool) -> DMatrix<f64> {
    let side = (values.len() as f64).sqrt().round() as usize;

    if reshape && side * side == values.len() {
        DMatrix::from_fn(side, side, |i, k| values[i * side + k])
    } else {
        DMatrix::from_column_slice(values.len(), 1, values)
    }
}

fn cos_table(m: &[i32], thetas: &[f64]) -> DMatrix<f64> {
    DMatrix::from_fn(m.len(), thetas.len(), |j, t| (m[j].unsigned_abs() as f64 * thetas[t]).cos())
}

fn sin_table(m: &[i32], thetas: &[f64]) -> DMatrix<f64> {
    DMatrix::from_fn(m.len(), thetas.len(), |j, t| (m[j].unsigned_abs() as f64 * thetas[t]).sin())
}

impl MomentArray {
    /// Squared moments excluding |m| < 2, scaled to unit sum per sample
    fn normalized_power(&self) -> DMatrix<f64> {
        let mut power = match self.data() {
            MomentData::Real(data) => data.map(|v| v * v),
            MomentData::Complex(data) => data.map(|c| c.norm_sqr()),
        };

        for (j, mj) in self.m().iter().enumerate() {
            if mj.unsigned_abs() < 2 {
                power.column_mut(j).fill(0.0);
            }
        }

        for mut row in power.row_iter_mut() {
            let total = row.sum();
            if total > 0.0 {
                row /= total;
            }
        }

        power
    }

    /// Score n-fold rotational symmetry of every sample
    ///
    /// Scores reach one when all the non-trivial power sits on frequencies
    /// that are multiples of `n_fold`.
    ///
    /// # Arguments
    ///
    /// * `n_fold` - Order of rotational symmetry, at least 2
    /// * `reshape` - Fold a perfect-square number of samples into a square map
    ///
    /// # Examples
    ///
    /// ```
    /// use nalgebra::DMatrix;
    /// use zmap_core::mp::MomentArray;
    /// use zmap_core::zp::Family;
    ///
    /// let data = DMatrix::from_row_slice(1, 2, &[0.0, 2.0]);
    /// let moments = MomentArray::new(data, vec![2, 2], vec![-2, 2], Family::Zernike).unwrap();
    ///
    /// assert!((moments.maps(2, false).unwrap()[(0, 0)] - 1.0).abs() < 1e-12);
    /// assert!(moments.maps(1, false).is_err());
    /// ```
    pub fn maps(&self, n_fold: usize, reshape: bool) -> Result<DMatrix<f64>, ZmapError> {
        let weights = rotation_weights(n_fold, self.m())?;
        let scores = self.normalized_power() * weights;

        Ok(square_map(scores.as_slice(), reshape))
    }

    /// Rotational auto-correlation of every sample over a set of angles
    ///
    /// Returns a (samples x angles) matrix. Angles are in radians and default
    /// to 360 points spanning [0, 2 pi] inclusive.
    pub fn rot_curve(&self, thetas: Option<&[f64]>) -> DMatrix<f64> {
        let thetas = curve_thetas(thetas, true);
        self.normalized_power() * cos_table(self.m(), &thetas)
    }

    /// Reflection auto-correlation of every sample over a set of mirror axes
    ///
    /// Returns a (samples x angles) matrix with scores in [-1, 1]. Angles are
    /// in radians and default to 360 points spanning [0, 2 pi] inclusive.
    /// Samples without non-zero frequency content score zero.
    pub fn reflect_curve(&self, thetas: Option<&[f64]>) -> Result<DMatrix<f64>, ZmapError> {
        let thetas = curve_thetas(thetas, true);
        self.reflection_scores(&thetas)
    }

    /// Best reflection score of every sample
    ///
    /// Angles default to 360 points spanning [0, 2 pi) with the endpoint
    /// excluded.
    pub fn reflect_map(&self, thetas: Option<&[f64]>, reshape: bool) -> Result<DMatrix<f64>, ZmapError> {
        let thetas = curve_thetas(thetas, false);
        let curve = self.reflection_scores(&thetas)?;

        let best: Vec<f64> = (0..curve.nrows())
            .into_par_iter()
            .map(|s| curve.row(s).iter().copied().fold(f64::NEG_INFINITY, f64::max))
            .collect();

        Ok(square_map(&best, reshape))
    }

    fn reflection_scores(&self, thetas: &[f64]) -> Result<DMatrix<f64>, ZmapError> {
        let selected = self.select(&States::NonZero);

        let normalized = match selected.data() {
            MomentData::Real(_) => selected.normalize(Norm::L2),
            MomentData::Complex(data) => {
                let mut data = data.clone();
                for mut row in data.row_iter_mut() {
                    let total = row.iter().map(|c| c.norm_sqr()).sum::<f64>().sqrt();
                    if total > 0.0 {
                        row.unscale_mut(total);
                    }
                }
                MomentArray::from_data(
                    MomentData::Complex(data),
                    selected.n().to_vec(),
                    selected.m().to_vec(),
                    selected.family(),
                )?
            }
        };

        let folded = normalized.complex()?;
        let squared = match folded.complex_data() {
            Some(data) => data.map(|c| c * c),
            None => return Err(ZmapError::ComplexMomentsError("Moments failed to fold into complex values.")),
        };

        let m = folded.m();
        Ok(squared.map(|c| c.re) * cos_table(m, thetas) + squared.map(|c| c.im) * sin_table(m, thetas))
    }
}

fn curve_thetas(thetas: Option<&[f64]>, endpoint: bool) -> Vec<f64> {
    match thetas {
        Some(thetas) if !thetas.is_empty() => thetas.to_vec(),
        _ => linspace(0.0, 2.0 * PI, CURVE_STEPS, endpoint),
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::zp::Family;
    use crate::zp::index::nm_pairs;
    use num::complex::Complex64;

    fn four_fold(n_samples: usize) -> MomentArray {
        let (n, m): (Vec<usize>, Vec<i32>) = nm_pairs(6, Family::Zernike).into_iter().unzip();
        let data = DMatrix::from_fn(n_samples, n.len(), |s, j| match (n[j], m[j]) {
            (0, 0) => 5.0,
            (1, 1) => 2.0,
            (4, 4) | (6, 4) => 1.0 + s as f64,
            (4, -4) => 0.5,
            _ => 0.0,
        });
        MomentArray::new(data, n, m, Family::Zernike).unwrap()
    }

    #[test]
    fn test_linspace_default_curve() {
        let t = linspace(0.0, 2.0 * PI, CURVE_STEPS, true);
        assert_eq!(t.len(), 360);
        assert_eq!(t[0], 0.0);
        assert!((t[359] - 2.0 * PI).abs() < 1e-12);

        let t = linspace(0.0, 2.0 * PI, CURVE_STEPS, false);
        assert!((t[1] - PI / 180.0).abs() < 1e-12);
        assert!(linspace(0.0, 1.0, 0, true).is_empty());
    }

    #[test]
    fn test_square_map() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let map = square_map(&values, true);
        assert_eq!(map.shape(), (2, 2));
        assert_eq!(map[(0, 1)], 2.0);
        assert_eq!(map[(1, 0)], 3.0);

        assert_eq!(square_map(&values, false).shape(), (4, 1));
        assert_eq!(square_map(&values[..3], true).shape(), (3, 1));
    }

    #[test]
    fn test_maps_four_fold() {
        let zm = four_fold(2);

        let four = zm.maps(4, false).unwrap();
        let three = zm.maps(3, false).unwrap();
        let five = zm.maps(5, false).unwrap();

        for s in 0..2 {
            assert!((four[(s, 0)] - 1.0).abs() < 1e-12);
            assert!((three[(s, 0)] + 0.5).abs() < 1e-12);
            assert!((five[(s, 0)] + 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn test_maps_complex_matches_real() {
        let zm = four_fold(1);
        let a = zm.maps(4, false).unwrap();
        let b = zm.complex().unwrap().maps(4, false).unwrap();
        assert!((a - b).amax() < 1e-12);
    }

    #[test]
    fn test_maps_invalid_fold() {
        assert!(four_fold(1).maps(1, false).is_err());
        assert!(four_fold(1).maps(0, false).is_err());
    }

    #[test]
    fn test_maps_reshape_and_zero_rows() {
        let (n, m): (Vec<usize>, Vec<i32>) = nm_pairs(2, Family::Zernike).into_iter().unzip();
        let data = DMatrix::from_fn(4, n.len(), |s, j| if s == 3 && m[j] == 2 { 1.0 } else { 0.0 });
        let zm = MomentArray::new(data, n, m, Family::Zernike).unwrap();

        let map = zm.maps(2, true).unwrap();
        assert_eq!(map.shape(), (2, 2));
        assert_eq!(map[(0, 0)], 0.0);
        assert!((map[(1, 1)] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rot_curve() {
        let zm = four_fold(1);
        let thetas = [0.0, PI / 4.0, PI / 2.0];
        let curve = zm.rot_curve(Some(&thetas));

        assert_eq!(curve.shape(), (1, 3));
        assert!((curve[(0, 0)] - 1.0).abs() < 1e-12);
        assert!((curve[(0, 1)] + 1.0).abs() < 1e-12);
        assert!((curve[(0, 2)] - 1.0).abs() < 1e-12);

        assert_eq!(zm.rot_curve(None).shape(), (1, CURVE_STEPS));
    }

    #[test]
    fn test_reflect_curve_symmetric_pattern() {
        let zm = MomentArray::new(DMatrix::from_row_slice(1, 2, &[0.0, 1.0]), vec![3, 3], vec![-3, 3], Family::Zernike)
            .unwrap();

        let thetas = [0.0, PI / 3.0, 2.0 * PI / 3.0];
        let curve = zm.reflect_curve(Some(&thetas)).unwrap();

        assert!((curve[(0, 0)] - 1.0).abs() < 1e-12);
        assert!((curve[(0, 1)] + 1.0).abs() < 1e-12);
        assert!((curve[(0, 2)] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_reflect_curve_follows_rotation() {
        let zm = four_fold(1);
        let rotated = zm.rot(30.0).unwrap();

        let thetas: Vec<f64> = (0..12).map(|k| k as f64 * PI / 12.0).collect();
        let a = zm.reflect_curve(Some(&thetas)).unwrap();
        let b = rotated.reflect_curve(Some(&thetas)).unwrap();

        // a 30 degree rotation shifts the curve by 60 degrees
        for t in 0..8 {
            assert!((b[(0, t)] - a[(0, t + 4)]).abs() < 1e-10);
        }
    }

    #[test]
    fn test_reflect_curve_complex_matches_real() {
        let zm = four_fold(2);
        let a = zm.reflect_curve(None).unwrap();
        let b = zm.complex().unwrap().reflect_curve(None).unwrap();
        assert!((a - b).amax() < 1e-12);
    }

    #[test]
    fn test_reflect_map() {
        let data = DMatrix::from_fn(4, 2, |s, j| if j == 1 { 1.0 + s as f64 } else { 0.0 });
        let zm = MomentArray::new(data, vec![2, 2], vec![-2, 2], Family::Zernike).unwrap();

        let map = zm.reflect_map(None, true).unwrap();
        assert_eq!(map.shape(), (2, 2));
        assert!(map.iter().all(|v| (v - 1.0).abs() < 1e-12));

        let empty = MomentArray::new(DMatrix::from_element(1, 1, 3.0), vec![0], vec![0], Family::Zernike).unwrap();
        assert_eq!(empty.reflect_map(None, false).unwrap()[(0, 0)], 0.0);
    }

    #[test]
    fn test_reflect_curve_complex_input() {
        let data = DMatrix::from_row_slice(1, 1, &[Complex64::new(0.0, 3.0)]);
        let zm = MomentArray::from_data(MomentData::Complex(data), vec![1], vec![1], Family::Zernike).unwrap();

        let curve = zm.reflect_curve(Some(&[0.0, PI])).unwrap();
        assert!((curve[(0, 0)] + 1.0).abs() < 1e-12);
        assert!((curve[(0, 1)] - 1.0).abs() < 1e-12);
    }
}
