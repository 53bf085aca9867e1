// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

// Number of angles sampled by default in rotation and reflection curves
pub const CURVE_STEPS: usize = 360;

// Relative singular value cutoff used when computing basis pseudo-inverses
pub const PINV_RCOND: f64 = 1e-12;

// Smallest squared ratio of Cholesky pivots accepted for the basis Gram matrix
pub const GRAM_RCOND: f64 = 1e-10;

// Default maximum radial degree of an extractor
pub const DEFAULT_N_MAX: usize = 10;

// Default width and height of the basis grid
pub const DEFAULT_SIZE: usize = 64;

// Default number of moments kept by the functional decomposition
pub const DEFAULT_COMPONENTS: usize = 66;

// Extraction method names accepted when parsing from strings
pub const METHOD_NAMES: [&str; 5] = ["matrix", "direct", "transpose", "pseudo", "fftconv"];
