// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::str::FromStr;
use std::sync::OnceLock;

use kdam::TqdmParallelIterator;
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constant::{DEFAULT_COMPONENTS, DEFAULT_N_MAX, DEFAULT_SIZE, GRAM_RCOND, METHOD_NAMES, PINV_RCOND};
use crate::error::ZmapError;
use crate::im::ImageBatch;
use crate::mp::fft::convolve_same;
use crate::mp::{MomentArray, States};
use crate::ut::track::{progress_bar, progress_done, progress_log, thousands_format};
use crate::zp::grid::disk_area;
use crate::zp::index::{n_components_to_nmax, nm_pairs};
use crate::zp::{BasisImages, Family};

/// Strategy used to project images onto the basis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Least squares through the inverse Gram matrix of the basis
    #[default]
    Matrix,
    /// Per-sample pixel dot products scaled by the disk area
    Direct,
    /// Product with the transposed basis scaled by the disk area
    Transpose,
    /// Product with the pseudo-inverse of the basis
    Pseudo,
    /// Sliding-window moments at every pixel through FFT convolution
    FftConv,
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Method::Matrix => METHOD_NAMES[0],
            Method::Direct => METHOD_NAMES[1],
            Method::Transpose => METHOD_NAMES[2],
            Method::Pseudo => METHOD_NAMES[3],
            Method::FftConv => METHOD_NAMES[4],
        }
    }
}

impl FromStr for Method {
    type Err = ZmapError;

    fn from_str(s: &str) -> Result<Method, ZmapError> {
        match s.to_lowercase().as_str() {
            "matrix" => Ok(Method::Matrix),
            "direct" => Ok(Method::Direct),
            "transpose" => Ok(Method::Transpose),
            "pseudo" => Ok(Method::Pseudo),
            "fftconv" => Ok(Method::FftConv),
            _ => Err(ZmapError::MethodError(s.to_string())),
        }
    }
}

/// Settings of a moment extractor
///
/// # Examples
///
/// ```
/// use zmap_core::mp::{ExtractorConfig, States};
///
/// let config = ExtractorConfig::new(6, 32).alpha(2.0).states(States::NonZero);
/// assert_eq!(config.family.alpha(), Some(2.0));
///
/// let parsed = ExtractorConfig::from_json(r#"{"n_max": 6, "size": 32, "states": "non_zero"}"#).unwrap();
/// assert_eq!(parsed.states, States::NonZero);
/// assert!(!parsed.verbose);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub n_max: usize,
    pub size: usize,
    pub family: Family,
    pub states: States,
    pub verbose: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        ExtractorConfig {
            n_max: DEFAULT_N_MAX,
            size: DEFAULT_SIZE,
            family: Family::Zernike,
            states: States::All,
            verbose: false,
        }
    }
}

impl ExtractorConfig {
    pub fn new(n_max: usize, size: usize) -> Self {
        ExtractorConfig {
            n_max,
            size,
            ..Default::default()
        }
    }

    /// Switch to the generalized pseudo-Zernike family
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.family = Family::PseudoZernike { alpha };
        self
    }

    pub fn family(mut self, family: Family) -> Self {
        self.family = family;
        self
    }

    pub fn states(mut self, states: States) -> Self {
        self.states = states;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ZmapError> {
        serde_json::from_str(json).map_err(|err| ZmapError::ConfigError(err.to_string()))
    }

    pub fn build(self) -> Result<Extractor, ZmapError> {
        Extractor::new(self)
    }
}

/// Moments of a single sample or of a batch
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Single(DVector<f64>),
    Batch(MomentArray),
}

/// Projects image batches onto a sampled polynomial basis.
///
/// Basis images and the inverse Gram matrix are computed once when the
/// extractor is built. The pseudo-inverse is only computed the first time
/// [`Method::Pseudo`] is requested. An extractor is immutable and can be
/// shared across threads.
///
/// # Examples
///
/// ```
/// use zmap_core::im::ImageBatch;
/// use zmap_core::mp::{ExtractorConfig, Method};
///
/// let extractor = ExtractorConfig::new(4, 16).build().unwrap();
/// let images = ImageBatch::from_fn(3, 16, 16, |_, _, _| 1.0);
///
/// let moments = extractor.extract(&images, Method::Matrix).unwrap();
/// assert_eq!(moments.len(), 3);
/// assert_eq!(moments.n_columns(), 15);
/// assert!((moments.real().unwrap()[(0, 0)] - 1.0).abs() < 1e-8);
/// ```
#[derive(Debug)]
pub struct Extractor {
    config: ExtractorConfig,
    basis: BasisImages,
    area: f64,
    gram_inverse: DMatrix<f64>,
    pseudo_inverse: OnceLock<Result<DMatrix<f64>, ZmapError>>,
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Result<Extractor, ZmapError> {
        config.family.validate()?;

        let (n, m): (Vec<usize>, Vec<i32>) = nm_pairs(config.n_max, config.family).into_iter().unzip();
        let columns = config.states.columns(&m);
        if columns.is_empty() {
            return Err(ZmapError::StatesError);
        }

        let n: Vec<usize> = columns.iter().map(|&j| n[j]).collect();
        let m: Vec<i32> = columns.iter().map(|&j| m[j]).collect();

        let basis = BasisImages::new(&n, &m, config.size, config.family)?;

        let gram = basis.data() * basis.data().transpose();
        let cholesky = gram.cholesky().ok_or(ZmapError::SingularBasisError)?;

        let pivots = cholesky.l_dirty().diagonal();
        if (pivots.min() / pivots.max()).powi(2) < GRAM_RCOND {
            return Err(ZmapError::SingularBasisError);
        }

        let gram_inverse = cholesky.inverse();

        progress_log(
            &format!(
                "Built {} basis images on a {}x{} grid.",
                thousands_format(basis.len()),
                config.size,
                config.size
            ),
            config.verbose,
        );

        Ok(Extractor {
            area: disk_area(config.size),
            config,
            basis,
            gram_inverse,
            pseudo_inverse: OnceLock::new(),
        })
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn basis(&self) -> &BasisImages {
        &self.basis
    }

    pub fn size(&self) -> usize {
        self.config.size
    }

    pub fn family(&self) -> Family {
        self.config.family
    }

    pub fn n(&self) -> &[usize] {
        self.basis.n()
    }

    pub fn m(&self) -> &[i32] {
        self.basis.m()
    }

    /// Moments of every image in the batch
    ///
    /// [`Method::FftConv`] treats each image as a field of overlapping
    /// windows and returns one sample per pixel, image-major then row-major.
    /// It requires images at least as large as the basis grid. The other
    /// methods require images exactly as large as the grid.
    pub fn extract(&self, images: &ImageBatch, method: Method) -> Result<MomentArray, ZmapError> {
        let size = self.config.size;

        let data = match method {
            Method::FftConv => {
                if images.height() < size || images.width() < size {
                    return Err(ZmapError::ImageSizeError(format!(
                        "Sliding-window extraction needs images of at least {}x{} but got {}x{}.",
                        size,
                        size,
                        images.height(),
                        images.width()
                    )));
                }
                self.fftconv(images)
            }
            _ => {
                if images.height() != size || images.width() != size {
                    return Err(ZmapError::ImageSizeError(format!(
                        "Method {} needs {}x{} images but got {}x{}.",
                        method.name(),
                        size,
                        size,
                        images.height(),
                        images.width()
                    )));
                }

                let x = images.data();
                match method {
                    Method::Direct => self.direct(images),
                    Method::Transpose => x * self.basis.data().transpose() / self.area,
                    Method::Pseudo => x * self.pseudo_inverse()?,
                    _ => x * self.basis.data().transpose() * &self.gram_inverse,
                }
            }
        };

        MomentArray::new(data, self.n().to_vec(), self.m().to_vec(), self.config.family)
    }

    /// Moments with shape routing
    ///
    /// Images matching the grid use `method`. Larger images fall back to
    /// sliding-window extraction and smaller images are rejected.
    pub fn extract_auto(&self, images: &ImageBatch, method: Method) -> Result<MomentArray, ZmapError> {
        let size = self.config.size;

        if images.height() == size && images.width() == size {
            return self.extract(images, method);
        }

        if images.height() >= size && images.width() >= size {
            progress_log(
                &format!(
                    "Images are {}x{} but the basis grid is {}x{}. Using fftconv.",
                    images.height(),
                    images.width(),
                    size,
                    size
                ),
                self.config.verbose,
            );
            return self.extract(images, Method::FftConv);
        }

        Err(ZmapError::ImageSizeError(format!(
            "Images of {}x{} are smaller than the {}x{} basis grid.",
            images.height(),
            images.width(),
            size,
            size
        )))
    }

    /// Least squares moments, squeezed to a vector for a single sample
    pub fn fit_transform(&self, images: &ImageBatch) -> Result<Projection, ZmapError> {
        let moments = self.extract_auto(images, Method::Matrix)?;

        if moments.len() == 1 {
            if let Some(data) = moments.real() {
                return Ok(Projection::Single(data.row(0).transpose()));
            }
        }

        Ok(Projection::Batch(moments))
    }

    fn pseudo_inverse(&self) -> Result<&DMatrix<f64>, ZmapError> {
        self.pseudo_inverse
            .get_or_init(|| {
                // pinv(B) = pinv(B^T)^T and B^T is the tall side
                let svd = self.basis.data().transpose().svd(true, true);
                let cutoff = svd.singular_values.max() * PINV_RCOND;
                svd.pseudo_inverse(cutoff)
                    .map(|pinv| pinv.transpose())
                    .map_err(ZmapError::PseudoInverseError)
            })
            .as_ref()
            .map_err(|err| err.clone())
    }

    fn direct(&self, images: &ImageBatch) -> DMatrix<f64> {
        let basis = self.basis.data();
        let pb = progress_bar(images.len(), "Projecting samples", "samples", self.config.verbose);

        let rows: Vec<(usize, Vec<f64>)> = (0..images.len())
            .into_par_iter()
            .tqdm_with_bar(pb)
            .map(|s| {
                let sample = images.data().row(s);
                let row = (0..basis.nrows())
                    .map(|j| sample.dot(&basis.row(j)) / self.area)
                    .collect();
                (s, row)
            })
            .collect();

        progress_done(rows.len(), "samples", self.config.verbose);

        let mut moments = DMatrix::<f64>::zeros(images.len(), basis.nrows());
        for (s, row) in rows {
            for (j, value) in row.into_iter().enumerate() {
                moments[(s, j)] = value;
            }
        }

        moments
    }

    fn fftconv(&self, images: &ImageBatch) -> DMatrix<f64> {
        let mut responses = convolve_same(images, self.basis.data(), self.config.size);

        // convolution flips the kernel and B(-x) = (-1)^|m| B(x)
        for (j, mj) in self.m().iter().enumerate() {
            let sign = if mj.unsigned_abs() % 2 == 0 { 1.0 } else { -1.0 };
            responses.column_mut(j).scale_mut(sign / self.area);
        }

        responses
    }
}

/// Least squares moments of square images keeping the first `n_components`
///
/// The basis grid matches the image size and its degree is the smallest
/// one covering `n_components` polynomials (66 when `None`).
///
/// # Examples
///
/// ```
/// use zmap_core::im::ImageBatch;
/// use zmap_core::mp::extract::decompose;
/// use zmap_core::zp::Family;
///
/// let images = ImageBatch::from_fn(2, 24, 24, |s, i, k| (s + i * k) as f64);
/// let moments = decompose(&images, Some(8), Family::Zernike).unwrap();
///
/// assert_eq!(moments.len(), 2);
/// assert_eq!(moments.n_columns(), 8);
/// ```
pub fn decompose(images: &ImageBatch, n_components: Option<usize>, family: Family) -> Result<MomentArray, ZmapError> {
    if images.height() != images.width() {
        return Err(ZmapError::ImageSizeError(format!(
            "Decomposition needs square images but got {}x{}.",
            images.height(),
            images.width()
        )));
    }

    let n_components = n_components.unwrap_or(DEFAULT_COMPONENTS);
    let n_max = n_components_to_nmax(n_components, family)?;

    let extractor = ExtractorConfig::new(n_max, images.height()).family(family).build()?;

    Ok(extractor.extract(images, Method::Matrix)?.take(n_components))
}
