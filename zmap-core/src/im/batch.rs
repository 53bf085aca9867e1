// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use nalgebra::DMatrix;
use num::ToPrimitive;

use crate::error::ZmapError;

/// A batch of equally sized single-channel images.
///
/// Each row of the underlying matrix holds one sample flattened in
/// row-major order, so pixel (i, k) of sample s lives at
/// `data[(s, i * width + k)]`.
///
/// # Examples
///
/// ```
/// use zmap_core::im::ImageBatch;
///
/// let pixels = vec![0u8; 16 * 16];
/// let batch = ImageBatch::from_pixels(&pixels, 16, 16).unwrap();
///
/// assert_eq!(batch.len(), 1);
/// assert_eq!(batch.n_pixels(), 256);
/// ```
///
/// ```
/// use zmap_core::im::ImageBatch;
///
/// let pixels = vec![0u8; 10];
/// assert!(ImageBatch::from_pixels(&pixels, 4, 4).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBatch {
    height: usize,
    width: usize,
    data: DMatrix<f64>,
}

impl ImageBatch {
    /// Wraps a (samples x pixels) matrix
    pub fn new(height: usize, width: usize, data: DMatrix<f64>) -> Result<ImageBatch, ZmapError> {
        if height * width != data.ncols() {
            return Err(ZmapError::BufferSizeError);
        }

        Ok(ImageBatch {
            height,
            width,
            data,
        })
    }

    /// A batch holding a single row-major image
    ///
    /// # Arguments
    ///
    /// * `pixels` - Row-major pixel buffer of any numeric type
    /// * `height` - Image height
    /// * `width` - Image width
    pub fn from_pixels<T>(pixels: &[T], height: usize, width: usize) -> Result<ImageBatch, ZmapError>
    where
        T: ToPrimitive,
    {
        ImageBatch::from_images(&[pixels], height, width)
    }

    /// A batch stacking several row-major images of identical shape
    pub fn from_images<T, P>(images: &[P], height: usize, width: usize) -> Result<ImageBatch, ZmapError>
    where
        T: ToPrimitive,
        P: AsRef<[T]>,
    {
        let n_pixels = height * width;

        let mut buffer = Vec::with_capacity(images.len() * n_pixels);
        for image in images {
            let image = image.as_ref();
            if image.len() != n_pixels {
                return Err(ZmapError::BufferSizeError);
            }

            for pixel in image {
                buffer.push(pixel.to_f64().ok_or(ZmapError::ConversionError)?);
            }
        }

        Ok(ImageBatch {
            height,
            width,
            data: DMatrix::from_row_slice(images.len(), n_pixels, &buffer),
        })
    }

    /// A batch filled by evaluating `f(sample, row, column)`
    pub fn from_fn<F>(n_samples: usize, height: usize, width: usize, f: F) -> ImageBatch
    where
        F: Fn(usize, usize, usize) -> f64,
    {
        ImageBatch {
            height,
            width,
            data: DMatrix::from_fn(n_samples, height * width, |s, px| f(s, px / width, px % width)),
        }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Pixels per sample
    pub fn n_pixels(&self) -> usize {
        self.height * self.width
    }

    /// Flattened samples with one image per row
    pub fn data(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// The s-th sample as a (height x width) matrix indexed by (row, column)
    pub fn image(&self, s: usize) -> DMatrix<f64> {
        let width = self.width;
        DMatrix::from_fn(self.height, width, |i, k| self.data[(s, i * width + k)])
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_from_images_layout() {
        let a: Vec<u16> = (0..6).collect();
        let b: Vec<u16> = (6..12).collect();
        let batch = ImageBatch::from_images(&[a, b], 2, 3).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.data()[(0, 4)], 4.0);
        assert_eq!(batch.data()[(1, 0)], 6.0);
        assert_eq!(batch.image(1)[(1, 2)], 11.0);
    }

    #[test]
    fn test_from_images_mismatch() {
        let a = vec![0.0f32; 6];
        let b = vec![0.0f32; 5];
        assert_eq!(
            ImageBatch::from_images(&[a, b], 2, 3).unwrap_err(),
            ZmapError::BufferSizeError
        );
    }

    #[test]
    fn test_from_fn() {
        let batch = ImageBatch::from_fn(2, 3, 4, |s, i, k| (s * 100 + i * 10 + k) as f64);
        assert_eq!(batch.image(1)[(2, 3)], 123.0);
        assert_eq!(batch.data()[(0, 5)], 11.0);
    }

    #[test]
    fn test_new_mismatch() {
        assert!(ImageBatch::new(3, 3, DMatrix::zeros(1, 8)).is_err());
        assert!(ImageBatch::new(2, 4, DMatrix::zeros(1, 8)).is_ok());
    }
}
