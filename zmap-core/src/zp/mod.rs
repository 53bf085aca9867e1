// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use serde::{Deserialize, Serialize};

use crate::error::ZmapError;

pub mod basis;
pub mod coeffs;
pub mod grid;
pub mod index;

pub use basis::BasisImages;
pub use grid::PolarGrid;

/// Polynomial family spanning the unit disk.
///
/// `Zernike` is the classical family where only (n, m) pairs with an even
/// n - |m| exist. `PseudoZernike` is the generalized pseudo-Zernike family
/// parameterized by a shape parameter `alpha > -1`; every |m| <= n is valid
/// and the radial factor carries a (1 - r)^(alpha / 2) weight. With
/// `alpha = 0` it reduces to the ordinary pseudo-Zernike polynomials.
///
/// # Examples
///
/// ```
/// use zmap_core::zp::Family;
///
/// assert_eq!(Family::from_alpha(None), Family::Zernike);
/// assert_eq!(Family::from_alpha(Some(2.0)).alpha(), Some(2.0));
/// assert!(Family::PseudoZernike { alpha: -1.5 }.validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    #[default]
    Zernike,
    PseudoZernike {
        alpha: f64,
    },
}

impl Family {
    pub fn from_alpha(alpha: Option<f64>) -> Family {
        match alpha {
            Some(alpha) => Family::PseudoZernike { alpha },
            None => Family::Zernike,
        }
    }

    pub fn alpha(&self) -> Option<f64> {
        match self {
            Family::Zernike => None,
            Family::PseudoZernike { alpha } => Some(*alpha),
        }
    }

    /// Check that the shape parameter keeps all gamma arguments positive
    pub fn validate(&self) -> Result<(), ZmapError> {
        match self {
            Family::Zernike => Ok(()),
            Family::PseudoZernike { alpha } => {
                if alpha.is_finite() && *alpha > -1.0 {
                    Ok(())
                } else {
                    Err(ZmapError::AlphaError(*alpha))
                }
            }
        }
    }
}
