use crate::{
    border::BorderTreatment,
    error::ConvError,
    options::{ConvOptions, KernelOptions},
};

/// Compute the span covered by one placement of a dilated kernel.
///
/// # Arguments
///
/// * `kernel_size` - The number of kernel taps, at least one.
/// * `dilation` - The spacing between consecutive taps.
///
/// # Returns
///
/// `(kernel_size - 1) * dilation + 1`.
///
/// # Errors
///
/// Returns [`ConvError::GeometryOverflow`] if the span does not fit in `usize`.
///
/// # Example
///
/// ```
/// use kornia_conv::effective_kernel_size;
///
/// assert_eq!(effective_kernel_size(3, 1), Ok(3));
/// assert_eq!(effective_kernel_size(3, 2), Ok(5));
/// assert!(effective_kernel_size(3, usize::MAX).is_err());
/// ```
pub fn effective_kernel_size(kernel_size: usize, dilation: usize) -> Result<usize, ConvError> {
    kernel_size
        .saturating_sub(1)
        .checked_mul(dilation)
        .and_then(|span| span.checked_add(1))
        .ok_or(ConvError::GeometryOverflow("effective kernel size"))
}

/// Compute the number of output positions of a convolution along one axis.
///
/// Padding is only honored on edges with a [`BorderTreatment::Constant`]
/// treatment; an edge with [`BorderTreatment::Avoid`] contributes no padding.
///
/// # Arguments
///
/// * `input_size` - The extent of the input along the axis.
/// * `kernel_size` - The number of kernel taps along the axis.
/// * `options` - The settings of the axis.
///
/// # Returns
///
/// `floor((input_size + padding_begin + padding_end - effective_kernel) / stride) + 1`
///
/// # Errors
///
/// Returns [`ConvError::EmptyKernel`] for a zero kernel size,
/// [`ConvError::GeometryOverflow`] if the padded input or the dilated kernel do not
/// fit in `usize` and [`ConvError::DegenerateGeometry`] if the kernel does not fit
/// even once.
///
/// # Example
///
/// ```
/// use kornia_conv::{calculate_output_size, BorderTreatment, KernelOptions};
///
/// let options = KernelOptions::new()
///     .with_padding(2)
///     .with_border_treatment(BorderTreatment::constant(0));
/// assert_eq!(calculate_output_size(5, 3, &options).unwrap(), 7);
///
/// let options = options.with_border_treatment(BorderTreatment::avoid());
/// assert_eq!(calculate_output_size(5, 3, &options).unwrap(), 3);
/// ```
pub fn calculate_output_size<T>(
    input_size: usize,
    kernel_size: usize,
    options: &KernelOptions<T>,
) -> Result<usize, ConvError> {
    if kernel_size == 0 {
        return Err(ConvError::EmptyKernel);
    }

    let effective_kernel_size = effective_kernel_size(kernel_size, options.dilation())?;
    let padded_size = options
        .padding_total()
        .and_then(|padding| input_size.checked_add(padding))
        .ok_or(ConvError::GeometryOverflow("padded size"))?;

    if padded_size < effective_kernel_size {
        return Err(ConvError::DegenerateGeometry {
            padded_size,
            effective_kernel_size,
        });
    }

    Ok((padded_size - effective_kernel_size) / options.stride() + 1)
}

/// Compute the output extent of a convolution over `N` spatial axes.
///
/// Either every axis resolves or the whole call fails.
///
/// # Errors
///
/// Returns [`ConvError::Axis`] carrying the index of the first failing axis.
///
/// # Example
///
/// ```
/// use kornia_conv::{output_shape, BorderTreatment, KernelOptions2D};
///
/// let options = KernelOptions2D::new()
///     .with_padding_per_axis([1, 0])
///     .with_border_treatment(BorderTreatment::constant(0u8));
/// assert_eq!(output_shape([4, 6], [3, 3], &options).unwrap(), [4, 4]);
/// ```
pub fn output_shape<T, const N: usize>(
    input_shape: [usize; N],
    kernel_shape: [usize; N],
    options: &ConvOptions<T, N>,
) -> Result<[usize; N], ConvError> {
    let mut shape = [0; N];
    for (axis, (size, axis_options)) in shape.iter_mut().zip(options.axes()).enumerate() {
        *size = calculate_output_size(input_shape[axis], kernel_shape[axis], axis_options)
            .map_err(|e| e.on_axis(axis))?;
    }
    Ok(shape)
}

/// Where one kernel tap of a window reads its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tap<T> {
    /// Read the input at this index.
    Input(usize),
    /// The tap lies in the padded region of a constant edge and reads this value.
    Fill(T),
}

/// The resolved geometry of one axis of a convolution.
///
/// Holds everything needed to address the window of any output position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisGeometry<T> {
    input_size: usize,
    kernel_size: usize,
    stride: usize,
    dilation: usize,
    padding_begin: usize,
    padding_end: usize,
    effective_kernel_size: usize,
    output_size: usize,
    border_treatment: [BorderTreatment<T>; 2],
}

impl<T: Copy> AxisGeometry<T> {
    /// Resolve the geometry of one axis.
    ///
    /// Every tap of a resolved geometry is addressable as an `isize`, so the padded
    /// input may not exceed `isize::MAX`.
    ///
    /// # Errors
    ///
    /// Same as [`calculate_output_size`], plus [`ConvError::GeometryOverflow`] if the
    /// padded input exceeds `isize::MAX`.
    pub fn resolve(
        input_size: usize,
        kernel_size: usize,
        options: &KernelOptions<T>,
    ) -> Result<Self, ConvError> {
        let output_size = calculate_output_size(input_size, kernel_size, options)?;

        // both fit since calculate_output_size succeeded
        let padded_size = input_size + options.padding_begin() + options.padding_end();
        if padded_size > isize::MAX as usize {
            return Err(ConvError::GeometryOverflow("padded size"));
        }
        let effective_kernel_size = effective_kernel_size(kernel_size, options.dilation())?;

        let geometry = Self {
            input_size,
            kernel_size,
            stride: options.stride(),
            dilation: options.dilation(),
            padding_begin: options.padding_begin(),
            padding_end: options.padding_end(),
            effective_kernel_size,
            output_size,
            border_treatment: [
                *options.border_treatment_begin(),
                *options.border_treatment_end(),
            ],
        };

        log::debug!(
            "axis geometry: input={} kernel={} padding=({}, {}) stride={} dilation={} -> output={}",
            input_size,
            kernel_size,
            geometry.padding_begin,
            geometry.padding_end,
            geometry.stride,
            geometry.dilation,
            output_size
        );

        Ok(geometry)
    }

    /// The extent of the input along the axis.
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// The number of kernel taps along the axis.
    pub fn kernel_size(&self) -> usize {
        self.kernel_size
    }

    /// The number of output positions along the axis.
    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// The honored padding as `(begin, end)`.
    pub fn padding(&self) -> (usize, usize) {
        (self.padding_begin, self.padding_end)
    }

    /// The span covered by one placement of the dilated kernel.
    pub fn effective_kernel_size(&self) -> usize {
        self.effective_kernel_size
    }

    /// Position of a tap inside the padded input.
    ///
    /// Bounded by `padded_size - 1` for a valid output position and tap, so it
    /// cannot overflow.
    fn padded_position(&self, output_index: usize, tap: usize) -> usize {
        output_index * self.stride + tap * self.dilation
    }

    /// The input index read by `tap` of the window at `output_index`.
    ///
    /// `output_index * stride - padding_begin + tap * dilation`; negative values and
    /// values past the input lie in the padded region.
    ///
    /// Returns `None` if `output_index` or `tap` is out of range.
    pub fn tap_index(&self, output_index: usize, tap: usize) -> Option<isize> {
        if output_index >= self.output_size || tap >= self.kernel_size {
            return None;
        }
        // the padded size is at most isize::MAX
        let position = self.padded_position(output_index, tap) as isize;
        Some(position - self.padding_begin as isize)
    }

    /// Returns true if every tap of the window at `output_index` reads the input.
    pub fn is_interior(&self, output_index: usize) -> bool {
        if output_index >= self.output_size {
            return false;
        }
        let first = self.padded_position(output_index, 0);
        let last = self.padded_position(output_index, self.kernel_size - 1);
        first >= self.padding_begin && last - self.padding_begin < self.input_size
    }

    /// Classify a tap of a valid output position.
    ///
    /// An avoided edge has no padding: positions before `padding_begin` only exist
    /// on a constant begin edge and positions past the input only on a constant end
    /// edge.
    pub(crate) fn tap(&self, output_index: usize, tap: usize) -> Tap<T> {
        let position = self.padded_position(output_index, tap);
        let edge = if position < self.padding_begin {
            &self.border_treatment[0]
        } else if position - self.padding_begin >= self.input_size {
            &self.border_treatment[1]
        } else {
            return Tap::Input(position - self.padding_begin);
        };

        match *edge {
            BorderTreatment::Constant(value) => Tap::Fill(value),
            BorderTreatment::Avoid => {
                unreachable!("tap at padded position {position} on an avoided edge")
            }
        }
    }

    /// The taps of the window at `output_index`, in kernel order.
    ///
    /// # Errors
    ///
    /// Returns [`ConvError::OutputIndexOutOfBounds`] if `output_index` is not a
    /// valid output position.
    ///
    /// # Example
    ///
    /// ```
    /// use kornia_conv::{AxisGeometry, BorderTreatment, KernelOptions, Tap};
    ///
    /// let options = KernelOptions::new()
    ///     .with_padding(1)
    ///     .with_border_treatment(BorderTreatment::constant(-1));
    /// let geometry = AxisGeometry::resolve(4, 3, &options).unwrap();
    ///
    /// let taps = geometry.window(0).unwrap().collect::<Vec<_>>();
    /// assert_eq!(taps, vec![Tap::Fill(-1), Tap::Input(0), Tap::Input(1)]);
    /// ```
    pub fn window(
        &self,
        output_index: usize,
    ) -> Result<impl ExactSizeIterator<Item = Tap<T>> + '_, ConvError> {
        if output_index >= self.output_size {
            return Err(ConvError::OutputIndexOutOfBounds {
                index: output_index,
                output_size: self.output_size,
            });
        }
        Ok((0..self.kernel_size).map(move |tap| self.tap(output_index, tap)))
    }
}
