// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use nalgebra::DMatrix;
use statrs::function::factorial::binomial;
use statrs::function::gamma::ln_gamma;

use crate::error::ZmapError;
use crate::zp::Family;
use crate::zp::index::check_nm;

/// Log of the rising factorial (x)_k = gamma(x + k) / gamma(x)
#[inline]
fn ln_poch(x: f64, k: f64) -> f64 {
    ln_gamma(x + k) - ln_gamma(x)
}

#[inline]
fn sign(k: usize) -> f64 {
    if k % 2 == 0 { 1.0 } else { -1.0 }
}

/// Normalization factor of a classical Zernike polynomial
///
/// # Examples
///
/// ```
/// use zmap_core::zp::coeffs::zernike_norm;
///
/// assert_eq!(zernike_norm(0, 0), 1.0);
/// assert_eq!(zernike_norm(1, 1), 2.0);
/// ```
#[inline]
pub fn zernike_norm(n: usize, m: i32) -> f64 {
    if m == 0 {
        (n as f64 + 1.0).sqrt()
    } else {
        (2.0 * n as f64 + 2.0).sqrt()
    }
}

/// Normalization factor of a generalized pseudo-Zernike polynomial
#[inline]
pub fn pseudo_zernike_norm(n: usize, m: i32, alpha: f64) -> f64 {
    let m_abs = m.unsigned_abs() as f64;
    let b = n as f64 - m_abs;
    let f = if m == 0 {
        n as f64 + alpha / 2.0 + 1.0
    } else {
        2.0 * n as f64 + alpha + 2.0
    };

    let ln_ratio = ln_poch(b + alpha + 1.0, 2.0 * m_abs + 1.0) - ln_poch(b + 1.0, 2.0 * m_abs + 1.0);
    (f * ln_ratio.exp()).sqrt()
}

fn check_lengths(n: &[usize], m: &[i32]) -> Result<usize, ZmapError> {
    if n.len() != m.len() {
        return Err(ZmapError::IndexError(format!(
            "Received {} radial degrees but {} azimuthal frequencies.",
            n.len(),
            m.len()
        )));
    }

    n.iter()
        .copied()
        .max()
        .ok_or_else(|| ZmapError::IndexError("No polynomials were requested.".to_string()))
}

/// Radial coefficients of classical Zernike polynomials
///
/// Each row holds the coefficients of one polynomial over descending powers
/// of the radius, n_max down to 0. Rows of degree n are left-padded with
/// n_max - n zeros.
///
/// # Arguments
///
/// * `n` - Radial degree of each polynomial
/// * `m` - Azimuthal frequency of each polynomial
/// * `normalize` - Scale rows so sampled polynomials are orthonormal
///
/// # Examples
///
/// ```
/// use zmap_core::zp::coeffs::zernike_coeffs;
///
/// // R(4, 0) = 6r^4 - 6r^2 + 1
/// let c = zernike_coeffs(&[4], &[0], false).unwrap();
/// assert_eq!(c.row(0).iter().copied().collect::<Vec<f64>>(), vec![6.0, 0.0, -6.0, 0.0, 1.0]);
///
/// assert!(zernike_coeffs(&[3], &[0], false).is_err());
/// ```
pub fn zernike_coeffs(n: &[usize], m: &[i32], normalize: bool) -> Result<DMatrix<f64>, ZmapError> {
    let n_max = check_lengths(n, m)?;

    let mut c_matrix = DMatrix::<f64>::zeros(n.len(), n_max + 1);

    for (row, (&ni, &mi)) in n.iter().zip(m.iter()).enumerate() {
        check_nm(ni, mi, Family::Zernike)?;

        let num = (ni - mi.unsigned_abs() as usize) / 2;
        let scale = if normalize { zernike_norm(ni, mi) } else { 1.0 };
        let offset = n_max - ni;

        for k in 0..=num {
            let v = binomial((ni - k) as u64, k as u64) * binomial((ni - 2 * k) as u64, (num - k) as u64);
            c_matrix[(row, offset + 2 * k)] = sign(k) * v * scale;
        }
    }

    Ok(c_matrix)
}

/// Radial coefficients of generalized pseudo-Zernike polynomials
///
/// Uses the same layout as [`zernike_coeffs`]. Factorials and rising
/// factorials are combined in the log domain so that high degrees do not
/// overflow before the terms cancel.
///
/// # Arguments
///
/// * `n` - Radial degree of each polynomial
/// * `m` - Azimuthal frequency of each polynomial
/// * `alpha` - Shape parameter (> -1)
/// * `normalize` - Scale rows so sampled polynomials are orthonormal
///
/// # Examples
///
/// ```
/// use zmap_core::zp::coeffs::pseudo_zernike_coeffs;
///
/// // R(2, 0) = 10r^2 - 12r + 3
/// let c = pseudo_zernike_coeffs(&[2], &[0], 0.0, false).unwrap();
/// assert!((c[(0, 0)] - 10.0).abs() < 1e-9);
/// assert!((c[(0, 1)] + 12.0).abs() < 1e-9);
/// assert!((c[(0, 2)] - 3.0).abs() < 1e-9);
/// ```
pub fn pseudo_zernike_coeffs(
    n: &[usize],
    m: &[i32],
    alpha: f64,
    normalize: bool,
) -> Result<DMatrix<f64>, ZmapError> {
    let family = Family::PseudoZernike { alpha };
    family.validate()?;

    let n_max = check_lengths(n, m)?;

    let mut c_matrix = DMatrix::<f64>::zeros(n.len(), n_max + 1);

    for (row, (&ni, &mi)) in n.iter().zip(m.iter()).enumerate() {
        check_nm(ni, mi, family)?;

        let m_abs = mi.unsigned_abs() as usize;
        let a = (ni + m_abs) as f64;
        let b = ni - m_abs;

        let ln_c = ln_gamma(a + 2.0) - ln_poch(alpha + 1.0, a + 1.0);
        let ln_scale = if normalize {
            pseudo_zernike_norm(ni, mi, alpha).ln()
        } else {
            0.0
        };

        let offset = n_max - ni;

        for k in 0..=b {
            let kf = k as f64;
            let ln_term = ln_c + ln_poch(alpha + 1.0, 2.0 * ni as f64 + 1.0 - kf)
                - ln_gamma(kf + 1.0)
                - ln_gamma(a + 2.0 - kf)
                - ln_gamma((b - k) as f64 + 1.0);

            c_matrix[(row, offset + k)] = sign(k) * (ln_term + ln_scale).exp();
        }
    }

    Ok(c_matrix)
}

/// Radial coefficients for either polynomial family
pub fn family_coeffs(
    n: &[usize],
    m: &[i32],
    family: Family,
    normalize: bool,
) -> Result<DMatrix<f64>, ZmapError> {
    match family {
        Family::Zernike => zernike_coeffs(n, m, normalize),
        Family::PseudoZernike { alpha } => pseudo_zernike_coeffs(n, m, alpha, normalize),
    }
}

#[cfg(test)]
mod test {

    use super::*;

    fn row(c: &DMatrix<f64>, i: usize) -> Vec<f64> {
        c.row(i).iter().copied().collect()
    }

    #[test]
    fn test_zernike_coeffs_padding() {
        let c = zernike_coeffs(&[0, 2, 3, 4], &[0, 2, 1, 0], false).unwrap();

        assert_eq!(c.shape(), (4, 5));
        assert_eq!(row(&c, 0), vec![0.0, 0.0, 0.0, 0.0, 1.0]);
        assert_eq!(row(&c, 1), vec![0.0, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(row(&c, 2), vec![0.0, 3.0, 0.0, -2.0, 0.0]);
        assert_eq!(row(&c, 3), vec![6.0, 0.0, -6.0, 0.0, 1.0]);
    }

    #[test]
    fn test_zernike_coeffs_sign_of_m() {
        let c = zernike_coeffs(&[3, 3], &[-1, 1], false).unwrap();
        assert_eq!(row(&c, 0), row(&c, 1));
    }

    #[test]
    fn test_zernike_coeffs_normalized() {
        let c = zernike_coeffs(&[2, 2], &[0, 2], true).unwrap();
        let s3 = 3.0_f64.sqrt();
        let s6 = 6.0_f64.sqrt();
        assert!((c[(0, 0)] - 2.0 * s3).abs() < 1e-12);
        assert!((c[(0, 2)] + s3).abs() < 1e-12);
        assert!((c[(1, 0)] - s6).abs() < 1e-12);
    }

    #[test]
    fn test_zernike_coeffs_invalid() {
        assert_eq!(
            zernike_coeffs(&[4, 3], &[0, 2], true).unwrap_err(),
            ZmapError::ParityError { n: 3, m: 2 }
        );
        assert!(zernike_coeffs(&[2], &[0, 2], true).is_err());
        assert!(zernike_coeffs(&[], &[], true).is_err());
    }

    #[test]
    fn test_pseudo_zernike_coeffs_alpha_zero() {
        let c = pseudo_zernike_coeffs(&[0, 1, 1], &[0, 0, 1], 0.0, false).unwrap();
        let expected = [[0.0, 1.0], [3.0, -2.0], [1.0, 0.0]];
        for (i, e) in expected.iter().enumerate() {
            for (k, v) in e.iter().enumerate() {
                assert!((c[(i, k)] - v).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_pseudo_zernike_norm_alpha_zero() {
        for n in 0..8 {
            for m in -(n as i32)..=(n as i32) {
                let expected = zernike_norm(n, m);
                assert!((pseudo_zernike_norm(n, m, 0.0) - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_pseudo_zernike_coeffs_high_degree() {
        let n: Vec<usize> = vec![60, 60, 45];
        let m: Vec<i32> = vec![0, -7, 45];
        let c = pseudo_zernike_coeffs(&n, &m, 3.5, true).unwrap();
        assert!(c.iter().all(|v| v.is_finite()));
        assert!(c[(0, 0)] != 0.0);
    }

    #[test]
    fn test_pseudo_zernike_coeffs_invalid_alpha() {
        assert_eq!(
            pseudo_zernike_coeffs(&[1], &[0], -1.0, true).unwrap_err(),
            ZmapError::AlphaError(-1.0)
        );
    }
}
