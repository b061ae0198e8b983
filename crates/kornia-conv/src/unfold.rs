use ndarray::{Array2, Array3, Array4, Array5, ArrayView1, ArrayView2, ArrayView3, Axis};
use num_traits::Zero;

use crate::{
    error::ConvError,
    geometry::{AxisGeometry, Tap},
    options::{ChannelPosition, ConvOptions, KernelOptions, KernelOptions1D, KernelOptions2D},
    parallel::{for_each_block, ExecutionStrategy},
};

fn require_explicit_channels<T, const N: usize>(
    options: &ConvOptions<T, N>,
) -> Result<ChannelPosition, ConvError> {
    match options.channel_position() {
        ChannelPosition::Implicit => Err(ConvError::ChannelPositionMismatch {
            expected: "First or Last",
            found: ChannelPosition::Implicit,
        }),
        position => Ok(position),
    }
}

fn require_implicit_channels<T, const N: usize>(
    options: &ConvOptions<T, N>,
) -> Result<(), ConvError> {
    match options.channel_position() {
        ChannelPosition::Implicit => Ok(()),
        found => Err(ConvError::ChannelPositionMismatch {
            expected: "Implicit",
            found,
        }),
    }
}

fn resolve_axes<T: Copy, const N: usize>(
    input_shape: [usize; N],
    kernel_shape: [usize; N],
    options: &ConvOptions<T, N>,
) -> Result<Vec<AxisGeometry<T>>, ConvError> {
    options
        .axes()
        .iter()
        .enumerate()
        .map(|(axis, axis_options)| {
            AxisGeometry::resolve(input_shape[axis], kernel_shape[axis], axis_options)
                .map_err(|e| e.on_axis(axis))
        })
        .collect()
}

/// Gather the windows of an `H x W x C` view into `(out_h, out_w, C, kh, kw)`.
///
/// A tap out of range on the row axis reads the row fill value, whatever the
/// column tap is.
fn unfold_hwc<T>(
    src: ArrayView3<T>,
    rows: &AxisGeometry<T>,
    cols: &AxisGeometry<T>,
    strategy: ExecutionStrategy,
) -> Result<Array5<T>, ConvError>
where
    T: Copy + Send + Sync + Zero,
{
    let (_, _, channels) = src.dim();
    let (out_h, out_w) = (rows.output_size(), cols.output_size());
    let (kh, kw) = (rows.kernel_size(), cols.kernel_size());
    let block_size = channels * kh * kw;

    log::trace!(
        "unfold: {}x{}x{} -> {}x{} windows of {}x{} with {:?}",
        rows.input_size(),
        cols.input_size(),
        channels,
        out_h,
        out_w,
        kh,
        kw,
        strategy
    );

    let mut data = vec![T::zero(); out_h * out_w * block_size];

    if block_size > 0 {
        for_each_block(strategy, &mut data, block_size, |position, block| {
            let (oy, ox) = (position / out_w, position % out_w);
            for ky in 0..kh {
                let row_tap = rows.tap(oy, ky);
                for kx in 0..kw {
                    let column_tap = cols.tap(ox, kx);
                    for c in 0..channels {
                        block[(c * kh + ky) * kw + kx] = match (row_tap, column_tap) {
                            (Tap::Fill(value), _) => value,
                            (Tap::Input(_), Tap::Fill(value)) => value,
                            (Tap::Input(y), Tap::Input(x)) => src[[y, x, c]],
                        };
                    }
                }
            }
        })?;
    }

    Ok(Array5::from_shape_vec((out_h, out_w, channels, kh, kw), data)?)
}

/// Extract the windows of a one dimensional convolution with a channel axis.
///
/// # Arguments
///
/// * `src` - The input, `W x C` for [`ChannelPosition::Last`] or `C x W` for
///   [`ChannelPosition::First`].
/// * `kernel_size` - The number of kernel taps.
/// * `options` - The convolution settings.
/// * `strategy` - How the windows are gathered.
///
/// # Returns
///
/// The windows as `(out_w, C, K)` for channels last or `(C, K, out_w)` for channels first.
///
/// # Errors
///
/// Returns [`ConvError::ChannelPositionMismatch`] for [`ChannelPosition::Implicit`]
/// options and the resolver errors for an invalid geometry.
///
/// # Example
///
/// ```
/// use kornia_conv::{unfold::unfold_1d, BorderTreatment, ExecutionStrategy, KernelOptions1D};
/// use ndarray::{array, s};
///
/// let src = array![[1, 10], [2, 20], [3, 30]];
/// let options = KernelOptions1D::new()
///     .with_padding(1)
///     .with_border_treatment(BorderTreatment::constant(0));
///
/// let windows = unfold_1d(src.view(), 3, &options, ExecutionStrategy::Serial).unwrap();
/// assert_eq!(windows.dim(), (3, 2, 3));
/// assert_eq!(windows.slice(s![0, 0, ..]).to_vec(), vec![0, 1, 2]);
/// ```
pub fn unfold_1d<T>(
    src: ArrayView2<T>,
    kernel_size: usize,
    options: &KernelOptions1D<T>,
    strategy: ExecutionStrategy,
) -> Result<Array3<T>, ConvError>
where
    T: Copy + Send + Sync + Zero,
{
    let position = require_explicit_channels(options)?;

    let src = match position {
        ChannelPosition::First => src.reversed_axes(),
        _ => src,
    };

    let rows = AxisGeometry::resolve(1, 1, &KernelOptions::new())?;
    let geometry = resolve_axes([src.len_of(Axis(0))], [kernel_size], options)?;

    let windows = unfold_hwc(src.insert_axis(Axis(0)), &rows, &geometry[0], strategy)?
        .index_axis_move(Axis(3), 0)
        .index_axis_move(Axis(0), 0);

    Ok(match position {
        ChannelPosition::First => windows
            .permuted_axes([1, 2, 0])
            .as_standard_layout()
            .into_owned(),
        _ => windows,
    })
}

/// Extract the windows of a one dimensional convolution over a `W` input.
///
/// The options must carry [`ChannelPosition::Implicit`]. The windows are returned
/// as `(out_w, K)`.
pub fn unfold_1d_implicit<T>(
    src: ArrayView1<T>,
    kernel_size: usize,
    options: &KernelOptions1D<T>,
    strategy: ExecutionStrategy,
) -> Result<Array2<T>, ConvError>
where
    T: Copy + Send + Sync + Zero,
{
    require_implicit_channels(options)?;

    let rows = AxisGeometry::resolve(1, 1, &KernelOptions::new())?;
    let geometry = resolve_axes([src.len()], [kernel_size], options)?;

    let src = src.insert_axis(Axis(0)).insert_axis(Axis(2));

    Ok(unfold_hwc(src, &rows, &geometry[0], strategy)?
        .index_axis_move(Axis(3), 0)
        .index_axis_move(Axis(2), 0)
        .index_axis_move(Axis(0), 0))
}

/// Extract the windows of a two dimensional convolution with a channel axis.
///
/// # Arguments
///
/// * `src` - The input, `H x W x C` for [`ChannelPosition::Last`] or `C x H x W` for
///   [`ChannelPosition::First`].
/// * `kernel_size` - The kernel size as `[kh, kw]`.
/// * `options` - The convolution settings, rows first.
/// * `strategy` - How the windows are gathered.
///
/// # Returns
///
/// The windows as `(out_h, out_w, C, kh, kw)` for channels last or
/// `(C, kh, kw, out_h, out_w)` for channels first.
///
/// # Errors
///
/// Returns [`ConvError::ChannelPositionMismatch`] for [`ChannelPosition::Implicit`]
/// options and the resolver errors for an invalid geometry.
pub fn unfold_2d<T>(
    src: ArrayView3<T>,
    kernel_size: [usize; 2],
    options: &KernelOptions2D<T>,
    strategy: ExecutionStrategy,
) -> Result<Array5<T>, ConvError>
where
    T: Copy + Send + Sync + Zero,
{
    let position = require_explicit_channels(options)?;

    let src = match position {
        ChannelPosition::First => src.permuted_axes([1, 2, 0]),
        _ => src,
    };

    let (height, width, _) = src.dim();
    let geometry = resolve_axes([height, width], kernel_size, options)?;

    let windows = unfold_hwc(src, &geometry[0], &geometry[1], strategy)?;

    Ok(match position {
        ChannelPosition::First => windows
            .permuted_axes([2, 3, 4, 0, 1])
            .as_standard_layout()
            .into_owned(),
        _ => windows,
    })
}

/// Extract the windows of a two dimensional convolution over an `H x W` input.
///
/// The options must carry [`ChannelPosition::Implicit`]. The windows are returned
/// as `(out_h, out_w, kh, kw)`.
///
/// # Example
///
/// ```
/// use kornia_conv::{
///     unfold::unfold_2d_implicit, ChannelPosition, ExecutionStrategy, KernelOptions2D,
/// };
/// use ndarray::Array2;
///
/// let src = Array2::from_shape_fn((4, 5), |(y, x)| (y * 5 + x) as u16);
/// let options = KernelOptions2D::new().with_channel_position(ChannelPosition::Implicit);
///
/// let windows =
///     unfold_2d_implicit(src.view(), [3, 3], &options, ExecutionStrategy::Parallel).unwrap();
/// assert_eq!(windows.dim(), (2, 3, 3, 3));
/// assert_eq!(windows[[1, 2, 0, 0]], src[[1, 2]]);
/// ```
pub fn unfold_2d_implicit<T>(
    src: ArrayView2<T>,
    kernel_size: [usize; 2],
    options: &KernelOptions2D<T>,
    strategy: ExecutionStrategy,
) -> Result<Array4<T>, ConvError>
where
    T: Copy + Send + Sync + Zero,
{
    require_implicit_channels(options)?;

    let (height, width) = src.dim();
    let geometry = resolve_axes([height, width], kernel_size, options)?;

    Ok(
        unfold_hwc(src.insert_axis(Axis(2)), &geometry[0], &geometry[1], strategy)?
            .index_axis_move(Axis(2), 0),
    )
}
