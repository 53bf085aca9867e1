// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

//! Zernike and generalized pseudo-Zernike moments of image batches.
//!
//! The [`zp`] module samples the polynomial basis on a disk grid, [`mp`]
//! extracts moments from an [`im::ImageBatch`] and provides the algebra over
//! them (complex moments, rotations, reflections and symmetry scores).
//!
//! ```
//! use zmap_core::im::ImageBatch;
//! use zmap_core::mp::{ExtractorConfig, Method};
//!
//! let extractor = ExtractorConfig::new(6, 32).build().unwrap();
//! let images = ImageBatch::from_fn(2, 32, 32, |s, i, k| ((s + i + k) % 4) as f64);
//!
//! let moments = extractor.extract(&images, Method::Matrix).unwrap();
//! let invariants = moments.rotinv().unwrap();
//!
//! assert_eq!(invariants.len(), 2);
//! assert_eq!(moments.maps(4, false).unwrap().nrows(), 2);
//! ```

pub mod constant;
pub mod error;
pub mod im;
pub mod mp;
pub mod ut;
pub mod zp;
