// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use nalgebra::DMatrix;
use num::complex::Complex64;

use crate::error::ZmapError;
use crate::im::ImageBatch;
use crate::mp::States;
use crate::mp::transform::{Action, complex_fold_matrix, operator_matrix};
use crate::zp::index::{check_nm, j_to_nm};
use crate::zp::{BasisImages, Family};

/// Row-wise vector norms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Norm {
    L1,
    #[default]
    L2,
    Max,
}

impl Norm {
    fn of<'a, I: Iterator<Item = &'a f64>>(&self, values: I) -> f64 {
        match self {
            Norm::L1 => values.map(|v| v.abs()).sum(),
            Norm::L2 => values.map(|v| v * v).sum::<f64>().sqrt(),
            Norm::Max => values.fold(0.0, |acc, v| acc.max(v.abs())),
        }
    }
}

/// Moment buffer with one sample per row and one polynomial per column
#[derive(Debug, Clone, PartialEq)]
pub enum MomentData {
    Real(DMatrix<f64>),
    Complex(DMatrix<Complex64>),
}

impl MomentData {
    pub fn shape(&self) -> (usize, usize) {
        match self {
            MomentData::Real(data) => data.shape(),
            MomentData::Complex(data) => data.shape(),
        }
    }

    fn select_columns(&self, columns: &[usize]) -> MomentData {
        match self {
            MomentData::Real(data) => MomentData::Real(data.select_columns(columns.iter())),
            MomentData::Complex(data) => MomentData::Complex(data.select_columns(columns.iter())),
        }
    }
}

/// Moments of a batch of images together with their polynomial indices.
///
/// Column j of the buffer is the moment of polynomial (n[j], m[j]). Real
/// arrays hold one column per (cos, sin) polynomial; complex arrays hold one
/// column per (n, |m|) pair with m >= 0. Every operation returns a new
/// array and leaves the receiver untouched.
///
/// # Examples
///
/// ```
/// use nalgebra::DMatrix;
/// use zmap_core::mp::MomentArray;
/// use zmap_core::zp::Family;
///
/// let data = DMatrix::from_row_slice(1, 3, &[1.0, 3.0, 4.0]);
/// let moments = MomentArray::new(data, vec![0, 1, 1], vec![0, -1, 1], Family::Zernike).unwrap();
///
/// let rotinv = moments.rotinv().unwrap();
/// assert_eq!(rotinv.m(), &[0, 1]);
/// assert!((rotinv.real().unwrap()[(0, 1)] - 5.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MomentArray {
    data: MomentData,
    n: Vec<usize>,
    m: Vec<i32>,
    family: Family,
}

impl MomentArray {
    /// Real moments with explicit (n, m) metadata per column
    pub fn new(data: DMatrix<f64>, n: Vec<usize>, m: Vec<i32>, family: Family) -> Result<MomentArray, ZmapError> {
        MomentArray::from_data(MomentData::Real(data), n, m, family)
    }

    /// Real moments whose columns follow the linear index order from j = 0
    pub fn from_linear_index(data: DMatrix<f64>, family: Family) -> Result<MomentArray, ZmapError> {
        let (n, m) = (0..data.ncols()).map(|j| j_to_nm(j, family)).unzip();
        MomentArray::new(data, n, m, family)
    }

    pub fn from_data(data: MomentData, n: Vec<usize>, m: Vec<i32>, family: Family) -> Result<MomentArray, ZmapError> {
        let columns = data.shape().1;
        if n.len() != columns || m.len() != columns {
            return Err(ZmapError::IndexError(format!(
                "Moments have {} columns but {} radial degrees and {} azimuthal frequencies.",
                columns,
                n.len(),
                m.len()
            )));
        }

        family.validate()?;
        for (&ni, &mi) in n.iter().zip(m.iter()) {
            check_nm(ni, mi, family)?;
        }

        Ok(MomentArray { data, n, m, family })
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.data.shape().0
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of moments per sample
    pub fn n_columns(&self) -> usize {
        self.data.shape().1
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

    pub fn alpha(&self) -> Option<f64> {
        self.family.alpha()
    }

    pub fn data(&self) -> &MomentData {
        &self.data
    }

    pub fn is_complex(&self) -> bool {
        matches!(self.data, MomentData::Complex(_))
    }

    /// Real buffer, if the moments are real-valued
    pub fn real(&self) -> Option<&DMatrix<f64>> {
        match &self.data {
            MomentData::Real(data) => Some(data),
            MomentData::Complex(_) => None,
        }
    }

    /// Complex buffer, if the moments are complex-valued
    pub fn complex_data(&self) -> Option<&DMatrix<Complex64>> {
        match &self.data {
            MomentData::Real(_) => None,
            MomentData::Complex(data) => Some(data),
        }
    }

    fn with_columns(&self, columns: &[usize]) -> MomentArray {
        MomentArray {
            data: self.data.select_columns(columns),
            n: columns.iter().map(|&j| self.n[j]).collect(),
            m: columns.iter().map(|&j| self.m[j]).collect(),
            family: self.family,
        }
    }

    fn with_data(&self, data: MomentData) -> MomentArray {
        MomentArray {
            data,
            n: self.n.clone(),
            m: self.m.clone(),
            family: self.family,
        }
    }

    /// Keep the columns whose |m| belongs to `states`
    ///
    /// # Examples
    ///
    /// ```
    /// use nalgebra::DMatrix;
    /// use zmap_core::mp::{MomentArray, States};
    /// use zmap_core::zp::Family;
    ///
    /// let moments = MomentArray::from_linear_index(DMatrix::zeros(2, 6), Family::Zernike).unwrap();
    /// let selected = moments.select(&States::NonZero);
    ///
    /// assert_eq!(selected.n(), &[1, 1, 2, 2]);
    /// assert_eq!(selected.m(), &[-1, 1, -2, 2]);
    /// ```
    pub fn select(&self, states: &States) -> MomentArray {
        self.with_columns(&states.columns(&self.m))
    }

    /// Keep the first `k` columns
    pub fn take(&self, k: usize) -> MomentArray {
        let columns: Vec<usize> = (0..k.min(self.n_columns())).collect();
        self.with_columns(&columns)
    }

    fn fold(&self) -> Result<(DMatrix<Complex64>, Vec<usize>, Vec<i32>), ZmapError> {
        match &self.data {
            MomentData::Complex(data) => Ok((data.clone(), self.n.clone(), self.m.clone())),
            MomentData::Real(data) => {
                let fold = complex_fold_matrix(&self.n, &self.m, self.family)?;
                let data = data.map(|v| Complex64::new(v, 0.0)) * fold.matrix.transpose();
                Ok((data, fold.n, fold.m))
            }
        }
    }

    /// Fold (cos, sin) moment pairs into complex moments a + ib
    ///
    /// Complex arrays are returned unchanged.
    pub fn complex(&self) -> Result<MomentArray, ZmapError> {
        let (data, n, m) = self.fold()?;
        MomentArray::from_data(MomentData::Complex(data), n, m, self.family)
    }

    /// Rotation invariant moments
    ///
    /// Moments with m != 0 are replaced by the modulus of their complex
    /// moment while m = 0 moments keep their real part.
    pub fn rotinv(&self) -> Result<MomentArray, ZmapError> {
        let (data, n, m) = self.fold()?;

        let invariant = DMatrix::from_fn(data.nrows(), data.ncols(), |s, j| {
            if m[j] == 0 {
                data[(s, j)].re
            } else {
                data[(s, j)].norm()
            }
        });

        MomentArray::new(invariant, n, m, self.family)
    }

    fn apply(&self, theta: f64, action: Action) -> Result<MomentArray, ZmapError> {
        match &self.data {
            MomentData::Real(data) => {
                let operator = operator_matrix(&self.n, &self.m, theta, action)?;
                Ok(self.with_data(MomentData::Real(data * operator.transpose())))
            }
            MomentData::Complex(data) => {
                let theta = theta.to_radians();
                let m = &self.m;
                let transformed = DMatrix::from_fn(data.nrows(), data.ncols(), |s, j| {
                    let mf = m[j] as f64;
                    match action {
                        Action::Rotation => data[(s, j)] * Complex64::from_polar(1.0, -mf * theta),
                        Action::Reflection => data[(s, j)].conj() * Complex64::from_polar(1.0, -2.0 * mf * theta),
                    }
                });
                Ok(self.with_data(MomentData::Complex(transformed)))
            }
        }
    }

    /// Moments after rotating by `theta` degrees
    pub fn rot(&self, theta: f64) -> Result<MomentArray, ZmapError> {
        self.apply(theta, Action::Rotation)
    }

    /// Moments after reflecting about the axis at `theta` degrees
    pub fn reflect(&self, theta: f64) -> Result<MomentArray, ZmapError> {
        self.apply(theta, Action::Reflection)
    }

    /// Row-wise normalization of real moments
    ///
    /// Rows with zero norm are left unchanged and complex arrays are returned
    /// as they are.
    pub fn normalize(&self, norm: Norm) -> MomentArray {
        let data = match &self.data {
            MomentData::Real(data) => data,
            MomentData::Complex(_) => return self.clone(),
        };

        let mut normalized = data.clone();
        for mut row in normalized.row_iter_mut() {
            let scale = norm.of(row.iter());
            if scale > 0.0 {
                row /= scale;
            }
        }

        self.with_data(MomentData::Real(normalized))
    }

    /// Approximate images from real moments and the basis they were extracted with
    pub fn reconstruct(&self, basis: &BasisImages) -> Result<ImageBatch, ZmapError> {
        let data = self.real().ok_or(ZmapError::ComplexMomentsError(
            "Reconstruction uses the real (cos, sin) basis.",
        ))?;

        if data.ncols() != basis.len() {
            return Err(ZmapError::IndexError(format!(
                "Moments have {} columns but the basis holds {} polynomials.",
                data.ncols(),
                basis.len()
            )));
        }

        ImageBatch::new(basis.size(), basis.size(), data * basis.data())
    }
}
