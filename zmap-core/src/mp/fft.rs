// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::sync::Arc;

use nalgebra::DMatrix;
use num::complex::Complex64;
use rayon::prelude::*;
use rustfft::{Fft, FftPlanner};

use crate::im::ImageBatch;

/// Planned forward and inverse 2D transforms over a row-major grid
pub struct Fft2d {
    rows: usize,
    cols: usize,
    row_forward: Arc<dyn Fft<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    col_inverse: Arc<dyn Fft<f64>>,
}

impl Fft2d {
    pub fn new(rows: usize, cols: usize) -> Fft2d {
        let mut planner = FftPlanner::<f64>::new();
        Fft2d {
            rows,
            cols,
            row_forward: planner.plan_fft_forward(cols),
            col_forward: planner.plan_fft_forward(rows),
            row_inverse: planner.plan_fft_inverse(cols),
            col_inverse: planner.plan_fft_inverse(rows),
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Forward transform in place
    pub fn forward(&self, buffer: &mut [Complex64]) {
        self.process(buffer, &self.row_forward, &self.col_forward);
    }

    /// Inverse transform in place, scaled so that inverse(forward(x)) == x
    pub fn inverse(&self, buffer: &mut [Complex64]) {
        self.process(buffer, &self.row_inverse, &self.col_inverse);
        let scale = 1.0 / (self.rows * self.cols) as f64;
        buffer.iter_mut().for_each(|v| *v *= scale);
    }

    /// Spectrum of a (height x width) row-major image zero-padded to the grid
    pub fn spectrum<F>(&self, height: usize, width: usize, pixel: F) -> Vec<Complex64>
    where
        F: Fn(usize) -> f64,
    {
        let mut buffer = vec![Complex64::new(0.0, 0.0); self.rows * self.cols];
        for i in 0..height {
            for k in 0..width {
                buffer[i * self.cols + k] = Complex64::new(pixel(i * width + k), 0.0);
            }
        }
        self.forward(&mut buffer);
        buffer
    }

    fn process(&self, buffer: &mut [Complex64], row_fft: &Arc<dyn Fft<f64>>, col_fft: &Arc<dyn Fft<f64>>) {
        // Every row is transformed by processing the buffer in row-length chunks
        row_fft.process(buffer);
        let mut transposed = transpose(buffer, self.rows, self.cols);
        col_fft.process(&mut transposed);
        buffer.copy_from_slice(&transpose(&transposed, self.cols, self.rows));
    }
}

#[inline]
fn transpose(buffer: &[Complex64], rows: usize, cols: usize) -> Vec<Complex64> {
    let mut out = vec![Complex64::new(0.0, 0.0); rows * cols];
    for i in 0..rows {
        for k in 0..cols {
            out[k * rows + i] = buffer[i * cols + k];
        }
    }
    out
}

/// Same-size 2D convolution of every image with every kernel
///
/// The output keeps the input image shape, with the full convolution cropped
/// around its center. Row `s * height * width + px` of the result holds pixel
/// `px` of image `s`, and column `j` corresponds to kernel `j`.
///
/// # Arguments
///
/// * `images` - Batch of (height x width) images
/// * `kernels` - One flattened (size x size) kernel per row
/// * `size` - Kernel width and height
pub fn convolve_same(images: &ImageBatch, kernels: &DMatrix<f64>, size: usize) -> DMatrix<f64> {
    let height = images.height();
    let width = images.width();
    let n_pixels = height * width;
    let n_kernels = kernels.nrows();

    let fft = Fft2d::new(height + size - 1, width + size - 1);
    let start = (size - 1) / 2;

    let kernel_spectra: Vec<Vec<Complex64>> = (0..n_kernels)
        .into_par_iter()
        .map(|j| fft.spectrum(size, size, |px| kernels[(j, px)]))
        .collect();

    let mut output = DMatrix::<f64>::zeros(images.len() * n_pixels, n_kernels);

    for s in 0..images.len() {
        let image_spectrum = fft.spectrum(height, width, |px| images.data()[(s, px)]);

        let responses: Vec<Vec<f64>> = kernel_spectra
            .par_iter()
            .map(|kernel| {
                let mut product: Vec<Complex64> = image_spectrum
                    .iter()
                    .zip(kernel.iter())
                    .map(|(a, b)| a * b)
                    .collect();

                fft.inverse(&mut product);

                let mut response = Vec::with_capacity(n_pixels);
                for i in 0..height {
                    let offset = (i + start) * fft.cols() + start;
                    response.extend(product[offset..offset + width].iter().map(|v| v.re));
                }
                response
            })
            .collect();

        for (j, response) in responses.iter().enumerate() {
            for (px, value) in response.iter().enumerate() {
                output[(s * n_pixels + px, j)] = *value;
            }
        }
    }

    output
}
