use std::ops::Mul;

use ndarray::{
    Array1, Array3, Array4, ArrayBase, ArrayViewD, Dimension, Ix1, Ix2, Ix3, Ix4, RawData,
};
use num_traits::Zero;

use crate::error::ConvError;

/// Create a sampled gaussian kernel.
///
/// The taps hold the gaussian density at the integer offsets `-r..=r`, the kernel
/// is not normalized.
///
/// # Arguments
///
/// * `std_dev` - The standard deviation of the gaussian.
/// * `window_ratio` - The radius in multiples of `std_dev`, `0.0` selects the default of 3.
///
/// # Returns
///
/// A kernel of `2r + 1` taps with `r = round(window_ratio * std_dev)`, at least 1.
/// A non positive `std_dev` gives the identity kernel `[1.0]`.
///
/// # Example
///
/// ```
/// use kornia_conv::kernel::gaussian_kernel_1d;
///
/// let kernel = gaussian_kernel_1d(1.0, 0.0);
/// assert_eq!(kernel.len(), 7);
/// assert_eq!(gaussian_kernel_1d(0.0, 0.0).to_vec(), vec![1.0]);
/// ```
pub fn gaussian_kernel_1d(std_dev: f64, window_ratio: f64) -> Array1<f64> {
    if std_dev <= 0.0 {
        return Array1::from_elem(1, 1.0);
    }

    let ratio = if window_ratio == 0.0 { 3.0 } else { window_ratio };
    let radius = ((ratio * std_dev + 0.5) as i64).max(1);

    let norm = 1.0 / ((2.0 * std::f64::consts::PI).sqrt() * std_dev);
    let sigma_sq = std_dev * std_dev;

    Array1::from_iter((-radius..=radius).map(|x| {
        let x = x as f64;
        norm * (-(x * x) / (2.0 * sigma_sq)).exp()
    }))
}

/// Promote a one dimensional kernel to a full `C_out x C_in x K` kernel.
///
/// * `K`: applied to every channel separately, `C_in = C_out = output_channels`.
/// * `C_in x K`: replicated for every output channel.
/// * `C_out x C_in x K`: returned as is.
///
/// # Errors
///
/// Returns [`ConvError::NoOutputChannels`] if `output_channels` is zero for a kernel
/// that needs it and [`ConvError::InvalidKernelDimension`] for any other rank.
pub fn promote_kernel_1d<T>(
    kernel: ArrayViewD<T>,
    output_channels: usize,
) -> Result<Array3<T>, ConvError>
where
    T: Copy + Zero,
{
    match kernel.ndim() {
        1 => {
            let kernel = kernel.into_dimensionality::<Ix1>()?;
            let channels = require_output_channels(output_channels)?;
            Ok(Array3::from_shape_fn(
                (channels, channels, kernel.len()),
                |(o, i, w)| if o == i { kernel[w] } else { T::zero() },
            ))
        }
        2 => {
            let kernel = kernel.into_dimensionality::<Ix2>()?;
            let channels = require_output_channels(output_channels)?;
            let (input_channels, width) = kernel.dim();
            Ok(Array3::from_shape_fn(
                (channels, input_channels, width),
                |(_, i, w)| kernel[[i, w]],
            ))
        }
        3 => Ok(kernel.into_dimensionality::<Ix3>()?.to_owned()),
        ndim => Err(ConvError::InvalidKernelDimension(ndim)),
    }
}

/// Promote a two dimensional kernel to a full `C_out x C_in x kh x kw` kernel.
///
/// * `K`: separable, the outer product with itself applied to every channel separately.
/// * `kh x kw`: applied to every channel separately.
/// * `C_in x kh x kw`: replicated for every output channel.
/// * `C_out x C_in x kh x kw`: returned as is.
///
/// # Errors
///
/// Returns [`ConvError::NoOutputChannels`] if `output_channels` is zero for a kernel
/// that needs it and [`ConvError::InvalidKernelDimension`] for any other rank.
///
/// # Example
///
/// ```
/// use kornia_conv::kernel::promote_kernel_2d;
/// use ndarray::array;
///
/// let kernel = array![1, 2, 1];
/// let full = promote_kernel_2d(kernel.view().into_dyn(), 2).unwrap();
/// assert_eq!(full.dim(), (2, 2, 3, 3));
/// assert_eq!(full[[1, 1, 1, 1]], 4);
/// assert_eq!(full[[0, 1, 1, 1]], 0);
/// ```
pub fn promote_kernel_2d<T>(
    kernel: ArrayViewD<T>,
    output_channels: usize,
) -> Result<Array4<T>, ConvError>
where
    T: Copy + Zero + Mul<Output = T>,
{
    match kernel.ndim() {
        1 => {
            let kernel = kernel.into_dimensionality::<Ix1>()?;
            let channels = require_output_channels(output_channels)?;
            let size = kernel.len();
            Ok(Array4::from_shape_fn(
                (channels, channels, size, size),
                |(o, i, h, w)| if o == i { kernel[h] * kernel[w] } else { T::zero() },
            ))
        }
        2 => {
            let kernel = kernel.into_dimensionality::<Ix2>()?;
            let channels = require_output_channels(output_channels)?;
            let (height, width) = kernel.dim();
            Ok(Array4::from_shape_fn(
                (channels, channels, height, width),
                |(o, i, h, w)| if o == i { kernel[[h, w]] } else { T::zero() },
            ))
        }
        3 => {
            let kernel = kernel.into_dimensionality::<Ix3>()?;
            let channels = require_output_channels(output_channels)?;
            let (input_channels, height, width) = kernel.dim();
            Ok(Array4::from_shape_fn(
                (channels, input_channels, height, width),
                |(_, i, h, w)| kernel[[i, h, w]],
            ))
        }
        4 => Ok(kernel.into_dimensionality::<Ix4>()?.to_owned()),
        ndim => Err(ConvError::InvalidKernelDimension(ndim)),
    }
}

fn require_output_channels(output_channels: usize) -> Result<usize, ConvError> {
    if output_channels == 0 {
        return Err(ConvError::NoOutputChannels);
    }
    Ok(output_channels)
}

/// The number of taps of a full `C_out x C_in x K` kernel.
pub fn kernel_extent_1d<S: RawData>(kernel: &ArrayBase<S, Ix3>) -> usize {
    kernel.dim().2
}

/// The spatial size `[kh, kw]` of a full `C_out x C_in x kh x kw` kernel.
pub fn kernel_extent_2d<S: RawData>(kernel: &ArrayBase<S, Ix4>) -> [usize; 2] {
    let (_, _, height, width) = kernel.dim();
    [height, width]
}

/// Check that an input with `input_channels` channels fits a full kernel.
///
/// # Errors
///
/// Returns [`ConvError::ChannelMismatch`] if the kernel expects another number of
/// input channels and [`ConvError::InvalidKernelDimension`] if the kernel has no
/// input channel axis.
pub fn check_input_channels<S, D>(
    kernel: &ArrayBase<S, D>,
    input_channels: usize,
) -> Result<(), ConvError>
where
    S: RawData,
    D: Dimension,
{
    let expected = match kernel.shape() {
        [_, expected, ..] => *expected,
        shape => return Err(ConvError::InvalidKernelDimension(shape.len())),
    };

    if expected != input_channels {
        return Err(ConvError::ChannelMismatch(input_channels, expected));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};

    #[test]
    fn test_gaussian_kernel_1d() {
        let kernel = gaussian_kernel_1d(1.0, 0.0);
        let expected = [
            0.004431848411938008,
            0.05399096651318806,
            0.24197072451914337,
            0.3989422804014327,
            0.24197072451914337,
            0.05399096651318806,
            0.004431848411938008,
        ];
        assert_eq!(kernel.len(), expected.len());
        for (value, expected) in kernel.iter().zip(expected) {
            assert_relative_eq!(*value, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_gaussian_kernel_1d_radius() {
        // round(3 * 0.1) = 0 is raised to 1
        assert_eq!(gaussian_kernel_1d(0.1, 0.0).len(), 3);
        // round(2 * 1.5) = 3
        assert_eq!(gaussian_kernel_1d(1.5, 2.0).len(), 7);
        // round(3 * 2.5) = 8
        assert_eq!(gaussian_kernel_1d(2.5, 0.0).len(), 17);

        assert_eq!(gaussian_kernel_1d(-1.0, 0.0).to_vec(), vec![1.0]);

        let kernel = gaussian_kernel_1d(4.0, 0.0);
        let sum = kernel.sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-2);
    }

    #[test]
    fn test_promote_kernel_1d() -> Result<(), ConvError> {
        let kernel = array![1, 2, 3];
        let full = promote_kernel_1d(kernel.view().into_dyn(), 2)?;
        assert_eq!(full, array![[[1, 2, 3], [0, 0, 0]], [[0, 0, 0], [1, 2, 3]]]);

        let kernel = array![[1, 2], [3, 4], [5, 6]];
        let full = promote_kernel_1d(kernel.view().into_dyn(), 2)?;
        assert_eq!(full.dim(), (2, 3, 2));
        assert_eq!(full.index_axis(ndarray::Axis(0), 1), kernel);

        let kernel = Array3::<f32>::ones((4, 3, 5));
        assert_eq!(promote_kernel_1d(kernel.view().into_dyn(), 0)?, kernel);

        Ok(())
    }

    #[test]
    fn test_promote_kernel_1d_errors() {
        let kernel = array![1.0f32, 2.0];
        assert_eq!(
            promote_kernel_1d(kernel.view().into_dyn(), 0),
            Err(ConvError::NoOutputChannels)
        );

        let kernel = Array4::<f32>::zeros((1, 1, 1, 3));
        assert_eq!(
            promote_kernel_1d(kernel.view().into_dyn(), 1),
            Err(ConvError::InvalidKernelDimension(4))
        );
    }

    #[test]
    fn test_promote_kernel_2d() -> Result<(), ConvError> {
        let kernel = array![[0, 1, 0], [1, -4, 1], [0, 1, 0]];
        let full = promote_kernel_2d(kernel.view().into_dyn(), 3)?;
        assert_eq!(full.dim(), (3, 3, 3, 3));
        assert_eq!(full.slice(ndarray::s![2, 2, .., ..]), kernel);
        assert_eq!(full.slice(ndarray::s![2, 0, .., ..]), Array2::<i32>::zeros((3, 3)));

        let kernel = Array3::from_shape_fn((2, 3, 3), |(c, h, w)| (c * 9 + h * 3 + w) as i32);
        let full = promote_kernel_2d(kernel.view().into_dyn(), 4)?;
        assert_eq!(full.dim(), (4, 2, 3, 3));
        assert_eq!(full.index_axis(ndarray::Axis(0), 3), kernel);

        let kernel = Array4::<u8>::ones((1, 2, 3, 3));
        assert_eq!(promote_kernel_2d(kernel.view().into_dyn(), 0)?, kernel);

        let kernel = ndarray::ArrayD::<u8>::zeros(ndarray::IxDyn(&[1, 1, 1, 1, 1]));
        assert_eq!(
            promote_kernel_2d(kernel.view(), 1),
            Err(ConvError::InvalidKernelDimension(5))
        );
        Ok(())
    }

    #[test]
    fn test_kernel_extent_and_channels() -> Result<(), ConvError> {
        let kernel = Array4::<f32>::zeros((8, 3, 5, 7));
        assert_eq!(kernel_extent_2d(&kernel), [5, 7]);
        check_input_channels(&kernel, 3)?;
        assert_eq!(
            check_input_channels(&kernel, 4),
            Err(ConvError::ChannelMismatch(4, 3))
        );

        let kernel = Array3::<f32>::zeros((2, 1, 9));
        assert_eq!(kernel_extent_1d(&kernel.view()), 9);

        assert_eq!(
            check_input_channels(&array![1.0f32, 2.0], 1),
            Err(ConvError::InvalidKernelDimension(1))
        );
        Ok(())
    }
}
