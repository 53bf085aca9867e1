// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use crate::error::ZmapError;
use crate::zp::Family;

/// Check that (n, m) indexes a polynomial of the given family
///
/// # Arguments
///
/// * `n` - Radial degree
/// * `m` - Azimuthal frequency
/// * `family` - Polynomial family
#[inline]
pub fn check_nm(n: usize, m: i32, family: Family) -> Result<(), ZmapError> {
    let m_abs = m.unsigned_abs() as usize;

    if m_abs > n {
        return Err(ZmapError::IndexError(format!(
            "|m| = {} exceeds n = {}.",
            m_abs, n
        )));
    }

    if family == Family::Zernike && (n - m_abs) % 2 != 0 {
        return Err(ZmapError::ParityError { n, m });
    }

    Ok(())
}

/// Linear index of the polynomial (n, m)
///
/// # Examples
///
/// ```
/// use zmap_core::zp::Family;
/// use zmap_core::zp::index::nm_to_j;
///
/// assert_eq!(nm_to_j(2, -2, Family::Zernike).unwrap(), 3);
/// assert_eq!(nm_to_j(2, -2, Family::PseudoZernike { alpha: 0.0 }).unwrap(), 4);
/// assert!(nm_to_j(2, 1, Family::Zernike).is_err());
/// ```
pub fn nm_to_j(n: usize, m: i32, family: Family) -> Result<usize, ZmapError> {
    check_nm(n, m, family)?;

    let n = n as i64;
    let m = m as i64;

    let j = match family {
        Family::Zernike => (n * (n + 2) + m) / 2,
        Family::PseudoZernike { .. } => n * n + n + m,
    };

    Ok(j as usize)
}

/// Polynomial (n, m) at linear index `j`
pub fn j_to_nm(j: usize, family: Family) -> (usize, i32) {
    match family {
        Family::Zernike => {
            // (n + 1)(n + 2) / 2 polynomials have degree <= n
            let mut n = 0;
            while (n + 1) * (n + 2) / 2 <= j {
                n += 1;
            }
            let m = 2 * j as i64 - (n * (n + 2)) as i64;
            (n, m as i32)
        }
        Family::PseudoZernike { .. } => {
            let mut n = 0;
            while (n + 1) * (n + 1) <= j {
                n += 1;
            }
            let m = j as i64 - (n * n + n) as i64;
            (n, m as i32)
        }
    }
}

/// Linear index of the complex moment (n, |m|)
///
/// Both signs of m collapse onto the same index and the (n, |m|) pairs are
/// enumerated in ascending order without gaps.
///
/// # Examples
///
/// ```
/// use zmap_core::zp::Family;
/// use zmap_core::zp::index::nm_to_j_complex;
///
/// assert_eq!(nm_to_j_complex(0, 0, Family::Zernike).unwrap(), 0);
/// assert_eq!(nm_to_j_complex(1, 1, Family::Zernike).unwrap(), 1);
/// assert_eq!(nm_to_j_complex(2, 0, Family::Zernike).unwrap(), 2);
/// assert_eq!(nm_to_j_complex(2, 2, Family::Zernike).unwrap(), 3);
/// ```
pub fn nm_to_j_complex(n: usize, m_abs: usize, family: Family) -> Result<usize, ZmapError> {
    check_nm(n, m_abs as i32, family)?;

    let j = match family {
        Family::Zernike => (n + 1) * (n + 1) / 4 + m_abs / 2,
        Family::PseudoZernike { .. } => n * (n + 1) / 2 + m_abs,
    };

    Ok(j)
}

/// All (n, m) pairs up to and including degree `n_max` in linear index order
pub fn nm_pairs(n_max: usize, family: Family) -> Vec<(usize, i32)> {
    // (n_max, n_max) is valid in both families and carries the largest j
    let j_max = match family {
        Family::Zernike => n_max * (n_max + 3) / 2,
        Family::PseudoZernike { .. } => n_max * n_max + 2 * n_max,
    };

    (0..=j_max).map(|j| j_to_nm(j, family)).collect()
}

/// Radial degree required to hold `n_components` polynomials
pub fn n_components_to_nmax(n_components: usize, family: Family) -> Result<usize, ZmapError> {
    if n_components == 0 {
        return Err(ZmapError::IndexError(
            "At least one component must be requested.".to_string(),
        ));
    }

    Ok(j_to_nm(n_components - 1, family).0)
}
