// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::collections::{BTreeMap, HashMap};
use std::f64::consts::PI;

use nalgebra::{DMatrix, DVector};
use num::complex::Complex64;

use crate::error::ZmapError;
use crate::zp::Family;
use crate::zp::index::nm_to_j_complex;

/// Group action applied to pairs of (cos, sin) moments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Rotation,
    Reflection,
}

/// Coefficients of a single operator row as (own column, partner column)
///
/// The partner of (n, m) is (n, -m). With t = |m| theta for rotations and
/// t = 2 |m| theta for reflections about the axis at angle theta:
///
/// | action     | m = 0    | m < 0            | m > 0           |
/// |------------|----------|------------------|-----------------|
/// | rotation   | identity | (cos t, -sin t)  | (cos t, sin t)  |
/// | reflection | identity | (-cos t, -sin t) | (cos t, -sin t) |
///
/// # Arguments
///
/// * `action` - Rotation or reflection
/// * `m` - Azimuthal frequency of the row
/// * `theta` - Angle in radians
///
/// # Examples
///
/// ```
/// use zmap_core::mp::transform::{pair_rule, Action};
///
/// assert_eq!(pair_rule(Action::Rotation, 0, 1.0), None);
///
/// let (own, partner) = pair_rule(Action::Reflection, -2, 0.0).unwrap();
/// assert_eq!((own, partner), (-1.0, 0.0));
/// ```
#[inline]
pub fn pair_rule(action: Action, m: i32, theta: f64) -> Option<(f64, f64)> {
    let t = match action {
        Action::Rotation => m.unsigned_abs() as f64 * theta,
        Action::Reflection => 2.0 * m.unsigned_abs() as f64 * theta,
    };

    let (sin, cos) = t.sin_cos();

    match (action, m.signum()) {
        (_, 0) => None,
        (Action::Rotation, -1) => Some((cos, -sin)),
        (Action::Rotation, _) => Some((cos, sin)),
        (Action::Reflection, -1) => Some((-cos, -sin)),
        (Action::Reflection, _) => Some((cos, -sin)),
    }
}

/// Square operator acting on the columns of a real moment array
///
/// Partner columns are located through the (n, m) metadata so the operator
/// also applies to arrays restricted to a subset of azimuthal states.
///
/// # Arguments
///
/// * `n` - Radial degree of each column
/// * `m` - Azimuthal frequency of each column
/// * `theta` - Angle in degrees
/// * `action` - Rotation or reflection
pub fn operator_matrix(
    n: &[usize],
    m: &[i32],
    theta: f64,
    action: Action,
) -> Result<DMatrix<f64>, ZmapError> {
    let columns: HashMap<(usize, i32), usize> = n
        .iter()
        .copied()
        .zip(m.iter().copied())
        .enumerate()
        .map(|(i, nm)| (nm, i))
        .collect();

    let theta = theta.to_radians();
    let mut operator = DMatrix::<f64>::zeros(n.len(), n.len());

    for (i, (&ni, &mi)) in n.iter().zip(m.iter()).enumerate() {
        match pair_rule(action, mi, theta) {
            None => operator[(i, i)] = 1.0,
            Some((own, partner)) => {
                let j = columns
                    .get(&(ni, -mi))
                    .ok_or(ZmapError::PartnerError { n: ni, m: mi })?;
                operator[(i, i)] = own;
                operator[(i, *j)] = partner;
            }
        }
    }

    Ok(operator)
}

/// Matrix folding real (cos, sin) moment pairs into complex moments
#[derive(Debug, Clone)]
pub struct ComplexFold {
    /// (complex columns x real columns) with 1 for m >= 0 and i for m < 0
    pub matrix: DMatrix<Complex64>,
    /// Radial degree of each complex column
    pub n: Vec<usize>,
    /// Non-negative azimuthal frequency of each complex column
    pub m: Vec<i32>,
}

/// Build the fold from real columns (n, m) onto complex columns (n, |m|)
///
/// Complex columns are ordered by their folded linear index.
///
/// # Examples
///
/// ```
/// use zmap_core::mp::transform::complex_fold_matrix;
/// use zmap_core::zp::Family;
///
/// let fold = complex_fold_matrix(&[0, 1, 1], &[0, -1, 1], Family::Zernike).unwrap();
///
/// assert_eq!(fold.matrix.shape(), (2, 3));
/// assert_eq!(fold.n, vec![0, 1]);
/// assert_eq!(fold.m, vec![0, 1]);
/// ```
pub fn complex_fold_matrix(n: &[usize], m: &[i32], family: Family) -> Result<ComplexFold, ZmapError> {
    let mut folded: Vec<usize> = Vec::with_capacity(n.len());
    let mut rows: BTreeMap<usize, (usize, i32)> = BTreeMap::new();

    for (&ni, &mi) in n.iter().zip(m.iter()) {
        let m_abs = mi.unsigned_abs() as usize;
        let j = nm_to_j_complex(ni, m_abs, family)?;
        folded.push(j);
        rows.insert(j, (ni, m_abs as i32));
    }

    let position: HashMap<usize, usize> = rows.keys().enumerate().map(|(row, &j)| (j, row)).collect();

    let mut matrix = DMatrix::<Complex64>::zeros(rows.len(), n.len());
    for (col, (j, &mi)) in folded.iter().zip(m.iter()).enumerate() {
        matrix[(position[j], col)] = if mi < 0 {
            Complex64::new(0.0, 1.0)
        } else {
            Complex64::new(1.0, 0.0)
        };
    }

    let (n, m) = rows.into_values().unzip();

    Ok(ComplexFold { matrix, n, m })
}

/// Expected response of each azimuthal frequency to n-fold rotational symmetry
///
/// The weight of frequency m is the mean of cos(|m| 2 pi k / n_fold) over
/// k = 1..n_fold - 1. Frequencies that are multiples of n_fold score one.
///
/// # Examples
///
/// ```
/// use zmap_core::mp::transform::rotation_weights;
///
/// let w = rotation_weights(4, &[2, 4, -4]).unwrap();
/// assert!((w[0] + 1.0 / 3.0).abs() < 1e-12);
/// assert!((w[1] - 1.0).abs() < 1e-12);
/// assert!((w[2] - 1.0).abs() < 1e-12);
///
/// assert!(rotation_weights(1, &[2]).is_err());
/// ```
pub fn rotation_weights(n_fold: usize, m: &[i32]) -> Result<DVector<f64>, ZmapError> {
    if n_fold < 2 {
        return Err(ZmapError::SymmetryFoldError(n_fold));
    }

    let step = 2.0 * PI / n_fold as f64;

    Ok(DVector::from_iterator(
        m.len(),
        m.iter().map(|&mi| {
            let m_abs = mi.unsigned_abs() as f64;
            (1..n_fold).map(|k| (m_abs * step * k as f64).cos()).sum::<f64>() / (n_fold - 1) as f64
        }),
    ))
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::zp::index::nm_pairs;

    fn pairs(n_max: usize) -> (Vec<usize>, Vec<i32>) {
        nm_pairs(n_max, Family::Zernike).into_iter().unzip()
    }

    #[test]
    fn test_operator_matrix_identity_at_zero() {
        let (n, m) = pairs(4);
        let op = operator_matrix(&n, &m, 0.0, Action::Rotation).unwrap();
        assert!((op - DMatrix::<f64>::identity(n.len(), n.len())).amax() < 1e-12);
    }

    #[test]
    fn test_operator_matrix_rotation_orthogonal() {
        let (n, m) = pairs(5);
        let op = operator_matrix(&n, &m, 37.0, Action::Rotation).unwrap();
        let product = &op * op.transpose();
        assert!((product - DMatrix::<f64>::identity(n.len(), n.len())).amax() < 1e-12);
    }

    #[test]
    fn test_operator_matrix_reflection_involution() {
        let (n, m) = pairs(5);
        let op = operator_matrix(&n, &m, 23.0, Action::Reflection).unwrap();
        let product = &op * &op;
        assert!((product - DMatrix::<f64>::identity(n.len(), n.len())).amax() < 1e-12);
    }

    #[test]
    fn test_operator_matrix_rotation_block() {
        let op = operator_matrix(&[2, 2, 2], &[-2, 0, 2], 45.0, Action::Rotation).unwrap();
        // 2 * 45 degrees is a quarter turn
        assert!(op[(0, 0)].abs() < 1e-12);
        assert!((op[(0, 2)] + 1.0).abs() < 1e-12);
        assert!((op[(2, 0)] - 1.0).abs() < 1e-12);
        assert_eq!(op[(1, 1)], 1.0);
    }

    #[test]
    fn test_operator_matrix_missing_partner() {
        assert_eq!(
            operator_matrix(&[2, 2], &[0, 2], 10.0, Action::Rotation).unwrap_err(),
            ZmapError::PartnerError { n: 2, m: 2 }
        );
    }

    #[test]
    fn test_complex_fold_matrix_values() {
        let (n, m) = pairs(2);
        let fold = complex_fold_matrix(&n, &m, Family::Zernike).unwrap();

        assert_eq!(fold.matrix.shape(), (4, 6));
        assert_eq!(fold.n, vec![0, 1, 2, 2]);
        assert_eq!(fold.m, vec![0, 1, 0, 2]);

        // (1, -1) folds onto the imaginary part of (1, 1)
        assert_eq!(fold.matrix[(1, 1)], Complex64::new(0.0, 1.0));
        assert_eq!(fold.matrix[(1, 2)], Complex64::new(1.0, 0.0));
        assert_eq!(fold.matrix[(3, 3)], Complex64::new(0.0, 1.0));
        assert_eq!(fold.matrix[(3, 5)], Complex64::new(1.0, 0.0));
        assert_eq!(fold.matrix[(2, 4)], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_rotation_weights() {
        let w = rotation_weights(3, &[0, 3, 4]).unwrap();
        assert!((w[0] - 1.0).abs() < 1e-12);
        assert!((w[1] - 1.0).abs() < 1e-12);
        assert!((w[2] + 0.5).abs() < 1e-12);

        assert_eq!(
            rotation_weights(0, &[1]).unwrap_err(),
            ZmapError::SymmetryFoldError(0)
        );
    }
}
