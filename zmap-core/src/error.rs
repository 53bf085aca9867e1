// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ZmapError {
    ParityError { n: usize, m: i32 },
    IndexError(String),
    GridSizeError(usize),
    AlphaError(f64),
    StatesError,
    ImageSizeError(String),
    BufferSizeError,
    ConversionError,
    SymmetryFoldError(usize),
    SingularBasisError,
    PseudoInverseError(&'static str),
    PartnerError { n: usize, m: i32 },
    ComplexMomentsError(&'static str),
    ConfigError(String),
    MethodError(String),
}

impl fmt::Display for ZmapError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ZmapError::ParityError { n, m } => {
                write!(
                    f,
                    "[zmap::ParityError] Polynomial index (n = {}, m = {}) is invalid as n - |m| must be even.",
                    n, m
                )
            }
            ZmapError::IndexError(message) => {
                write!(f, "[zmap::IndexError] Invalid polynomial index. {}", message)
            }
            ZmapError::GridSizeError(size) => {
                write!(
                    f,
                    "[zmap::GridSizeError] Grid size must be at least 1 but {} was provided.",
                    size
                )
            }
            ZmapError::AlphaError(alpha) => {
                write!(
                    f,
                    "[zmap::AlphaError] Shape parameter alpha must be finite and greater than -1 but {} was provided.",
                    alpha
                )
            }
            ZmapError::StatesError => {
                write!(
                    f,
                    "[zmap::StatesError] The requested azimuthal states do not match any polynomial."
                )
            }
            ZmapError::ImageSizeError(message) => {
                write!(
                    f,
                    "[zmap::ImageSizeError] Images do not match the basis grid. {}",
                    message
                )
            }
            ZmapError::BufferSizeError => {
                write!(
                    f,
                    "[zmap::BufferSizeError] The buffer does not match provided size."
                )
            }
            ZmapError::ConversionError => {
                write!(f, "[zmap::ConversionError] Failed to convert value to f64.")
            }
            ZmapError::SymmetryFoldError(n_fold) => {
                write!(
                    f,
                    "[zmap::SymmetryFoldError] Rotational symmetry order must be at least 2 but {} was provided.",
                    n_fold
                )
            }
            ZmapError::SingularBasisError => {
                write!(
                    f,
                    "[zmap::SingularBasisError] The basis inner product matrix could not be inverted. Increase the grid size or lower n_max."
                )
            }
            ZmapError::PseudoInverseError(message) => {
                write!(
                    f,
                    "[zmap::PseudoInverseError] Failed to compute pseudo-inverse of basis. {}",
                    message
                )
            }
            ZmapError::PartnerError { n, m } => {
                write!(
                    f,
                    "[zmap::PartnerError] Moment (n = {}, m = {}) has no (n = {}, m = {}) partner column.",
                    n, m, n, -m
                )
            }
            ZmapError::ComplexMomentsError(message) => {
                write!(
                    f,
                    "[zmap::ComplexMomentsError] Operation requires real-valued moments. {}",
                    message
                )
            }
            ZmapError::ConfigError(message) => {
                write!(
                    f,
                    "[zmap::ConfigError] Failed to parse configuration. {}",
                    message
                )
            }
            ZmapError::MethodError(message) => {
                write!(
                    f,
                    "[zmap::MethodError] Unknown extraction method {}. Must be one of: matrix, direct, transpose, pseudo, fftconv.",
                    message
                )
            }
        }
    }
}

impl std::error::Error for ZmapError {}
