use std::fmt;

use num_traits::NumCast;

use crate::{border::BorderTreatment, error::ConvError};

/// Where the channel axis sits in the input of a convolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelPosition {
    /// Channels come before the spatial axes, e.g. `C x H x W`.
    First,
    /// Channels come after the spatial axes, e.g. `H x W x C`.
    #[default]
    Last,
    /// The input has no channel axis, e.g. `H x W`.
    Implicit,
}

impl fmt::Display for ChannelPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelPosition::First => write!(f, "First"),
            ChannelPosition::Last => write!(f, "Last"),
            ChannelPosition::Implicit => write!(f, "Implicit"),
        }
    }
}

fn validate_stride(stride: usize) -> Result<usize, ConvError> {
    if stride == 0 {
        return Err(ConvError::InvalidStride(0));
    }
    Ok(stride)
}

fn validate_dilation(dilation: usize) -> Result<usize, ConvError> {
    if dilation == 0 {
        return Err(ConvError::InvalidDilation(0));
    }
    Ok(dilation)
}

/// Convolution settings for a single spatial axis.
///
/// The options are a plain value: every setter consumes the options and returns
/// the updated copy, so one configuration can be shared between threads and
/// reused across calls without aliasing.
///
/// The default is a valid-only convolution: no padding, stride 1, dilation 1 and
/// [`BorderTreatment::Avoid`] on both edges.
///
/// # Example
///
/// ```
/// use kornia_conv::{BorderTreatment, KernelOptions};
///
/// let options = KernelOptions::new()
///     .with_padding(2)
///     .with_border_treatment_edges(BorderTreatment::constant(0.0), BorderTreatment::avoid())
///     .with_stride(1)
///     .unwrap();
///
/// assert_eq!(options.padding(), (2, 2));
/// assert_eq!(options.padding_begin(), 2);
/// assert_eq!(options.padding_end(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawKernelOptions<T>"))]
pub struct KernelOptions<T> {
    padding: [usize; 2],
    stride: usize,
    dilation: usize,
    border_treatment: [BorderTreatment<T>; 2],
}

impl<T> KernelOptions<T> {
    /// Create the default options.
    pub fn new() -> Self {
        Self {
            padding: [0, 0],
            stride: 1,
            dilation: 1,
            border_treatment: [BorderTreatment::Avoid, BorderTreatment::Avoid],
        }
    }

    /// Request the same padding on both edges.
    pub fn with_padding(self, padding: usize) -> Self {
        self.with_padding_edges(padding, padding)
    }

    /// Request a different padding on the begin and end edges.
    pub fn with_padding_edges(mut self, begin: usize, end: usize) -> Self {
        self.padding = [begin, end];
        self
    }

    /// Set the step between consecutive output positions.
    ///
    /// # Errors
    ///
    /// Returns [`ConvError::InvalidStride`] if `stride` is zero.
    pub fn with_stride(mut self, stride: usize) -> Result<Self, ConvError> {
        self.stride = validate_stride(stride)?;
        Ok(self)
    }

    /// Set the spacing between consecutive kernel taps.
    ///
    /// # Errors
    ///
    /// Returns [`ConvError::InvalidDilation`] if `dilation` is zero.
    pub fn with_dilation(mut self, dilation: usize) -> Result<Self, ConvError> {
        self.dilation = validate_dilation(dilation)?;
        Ok(self)
    }

    /// Set the border treatment of both edges.
    pub fn with_border_treatment(self, treatment: BorderTreatment<T>) -> Self
    where
        T: Clone,
    {
        self.with_border_treatment_edges(treatment.clone(), treatment)
    }

    /// Set the border treatment of the begin and end edges independently.
    pub fn with_border_treatment_edges(
        mut self,
        begin: BorderTreatment<T>,
        end: BorderTreatment<T>,
    ) -> Self {
        self.border_treatment = [begin, end];
        self
    }

    /// The nominal padding as `(begin, end)`, whether honored or not.
    pub fn padding(&self) -> (usize, usize) {
        (self.padding[0], self.padding[1])
    }

    /// The padding honored on the begin edge.
    pub fn padding_begin(&self) -> usize {
        self.border_treatment[0].effective_padding(self.padding[0])
    }

    /// The padding honored on the end edge.
    pub fn padding_end(&self) -> usize {
        self.border_treatment[1].effective_padding(self.padding[1])
    }

    /// The padding honored on both edges together, `None` on overflow.
    pub fn padding_total(&self) -> Option<usize> {
        self.padding_begin().checked_add(self.padding_end())
    }

    /// The step between consecutive output positions.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The spacing between consecutive kernel taps.
    pub fn dilation(&self) -> usize {
        self.dilation
    }

    /// The border treatment of the begin edge.
    pub fn border_treatment_begin(&self) -> &BorderTreatment<T> {
        &self.border_treatment[0]
    }

    /// The border treatment of the end edge.
    pub fn border_treatment_end(&self) -> &BorderTreatment<T> {
        &self.border_treatment[1]
    }
}

impl<F> KernelOptions<F>
where
    F: NumCast + Copy + PartialEq + fmt::Display,
{
    /// Convert the fill values to the element type of a tensor.
    ///
    /// Options read at runtime carry their fill values in a wide type such as
    /// `f64`. Before the options are used on a tensor of `T`, every constant fill
    /// value must be representable in `T` exactly.
    ///
    /// # Errors
    ///
    /// Returns [`ConvError::FillValueMismatch`] if a fill value is out of range
    /// for `T` or would lose precision.
    ///
    /// # Example
    ///
    /// ```
    /// use kornia_conv::{BorderTreatment, KernelOptions};
    ///
    /// let options = KernelOptions::new().with_border_treatment(BorderTreatment::constant(255.0));
    /// let options_u8 = options.try_cast_fill::<u8>().unwrap();
    /// assert_eq!(options_u8.border_treatment_begin(), &BorderTreatment::constant(255u8));
    ///
    /// let options = KernelOptions::new().with_border_treatment(BorderTreatment::constant(-1.0));
    /// assert!(options.try_cast_fill::<u8>().is_err());
    /// ```
    pub fn try_cast_fill<T: NumCast + Copy>(&self) -> Result<KernelOptions<T>, ConvError> {
        let cast = |treatment: &BorderTreatment<F>| match *treatment {
            BorderTreatment::Avoid => Ok(BorderTreatment::Avoid),
            BorderTreatment::Constant(value) => T::from(value)
                .filter(|converted| F::from(*converted) == Some(value))
                .map(BorderTreatment::Constant)
                .ok_or_else(|| ConvError::FillValueMismatch {
                    value: value.to_string(),
                    target: std::any::type_name::<T>(),
                }),
        };

        Ok(KernelOptions {
            padding: self.padding,
            stride: self.stride,
            dilation: self.dilation,
            border_treatment: [
                cast(&self.border_treatment[0])?,
                cast(&self.border_treatment[1])?,
            ],
        })
    }
}

impl<T> Default for KernelOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Display> fmt::Display for KernelOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{padding=({}, {}), effective padding=({}, {}), stride={}, dilation={}, border=({}, {})}}",
            self.padding[0],
            self.padding[1],
            self.padding_begin(),
            self.padding_end(),
            self.stride,
            self.dilation,
            self.border_treatment[0],
            self.border_treatment[1],
        )
    }
}

/// Signed, unvalidated form of [`KernelOptions`] as read from a configuration file.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawKernelOptions<T> {
    #[serde(default)]
    padding: [i64; 2],
    #[serde(default = "default_step")]
    stride: i64,
    #[serde(default = "default_step")]
    dilation: i64,
    #[serde(default = "default_border_treatment")]
    border_treatment: [BorderTreatment<T>; 2],
}

#[cfg(feature = "serde")]
fn default_step() -> i64 {
    1
}

#[cfg(feature = "serde")]
fn default_border_treatment<T>() -> [BorderTreatment<T>; 2] {
    [BorderTreatment::Avoid, BorderTreatment::Avoid]
}

#[cfg(feature = "serde")]
impl<T> TryFrom<RawKernelOptions<T>> for KernelOptions<T> {
    type Error = ConvError;

    fn try_from(raw: RawKernelOptions<T>) -> Result<Self, Self::Error> {
        let to_usize =
            |value: i64| usize::try_from(value).map_err(|_| ConvError::ValueOutOfRange(value));

        let [begin, end] = raw.padding;
        if let Some(&negative) = raw.padding.iter().find(|&&p| p < 0) {
            return Err(ConvError::InvalidPadding(negative));
        }
        if raw.stride < 1 {
            return Err(ConvError::InvalidStride(raw.stride));
        }
        if raw.dilation < 1 {
            return Err(ConvError::InvalidDilation(raw.dilation));
        }

        let [treatment_begin, treatment_end] = raw.border_treatment;

        KernelOptions::new()
            .with_padding_edges(to_usize(begin)?, to_usize(end)?)
            .with_border_treatment_edges(treatment_begin, treatment_end)
            .with_stride(to_usize(raw.stride)?)?
            .with_dilation(to_usize(raw.dilation)?)
    }
}

/// Convolution settings for `N` spatial axes.
///
/// Every axis carries its own [`KernelOptions`]; the axes are ordered from the
/// outermost spatial axis to the innermost one (`[y, x]` for images). The channel
/// position is shared by the whole convolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvOptions<T, const N: usize> {
    axes: [KernelOptions<T>; N],
    channel_position: ChannelPosition,
}

/// Options of a convolution over one spatial axis.
pub type KernelOptions1D<T> = ConvOptions<T, 1>;

/// Options of a convolution over two spatial axes.
pub type KernelOptions2D<T> = ConvOptions<T, 2>;

impl<T, const N: usize> ConvOptions<T, N> {
    /// Create the default options for every axis, with channels last.
    pub fn new() -> Self {
        Self {
            axes: std::array::from_fn(|_| KernelOptions::new()),
            channel_position: ChannelPosition::default(),
        }
    }

    /// Create the options from explicit per-axis settings.
    pub fn from_axes(axes: [KernelOptions<T>; N]) -> Self {
        Self {
            axes,
            channel_position: ChannelPosition::default(),
        }
    }

    /// Set the position of the channel axis in the input.
    pub fn with_channel_position(mut self, channel_position: ChannelPosition) -> Self {
        self.channel_position = channel_position;
        self
    }

    /// Request the same padding on both edges of every axis.
    pub fn with_padding(self, padding: usize) -> Self {
        self.with_padding_per_axis([padding; N])
    }

    /// Request a symmetric padding per axis.
    pub fn with_padding_per_axis(mut self, padding: [usize; N]) -> Self {
        for (options, p) in self.axes.iter_mut().zip(padding) {
            options.padding = [p, p];
        }
        self
    }

    /// Set the same stride on every axis.
    ///
    /// # Errors
    ///
    /// Returns [`ConvError::InvalidStride`] if `stride` is zero.
    pub fn with_stride(mut self, stride: usize) -> Result<Self, ConvError> {
        let stride = validate_stride(stride)?;
        self.axes.iter_mut().for_each(|options| options.stride = stride);
        Ok(self)
    }

    /// Set the stride of every axis.
    ///
    /// # Errors
    ///
    /// Returns [`ConvError::Axis`] wrapping [`ConvError::InvalidStride`] for the
    /// first axis with a zero stride.
    pub fn with_stride_per_axis(mut self, strides: [usize; N]) -> Result<Self, ConvError> {
        for (axis, (options, &stride)) in self.axes.iter_mut().zip(strides.iter()).enumerate() {
            options.stride = validate_stride(stride).map_err(|e| e.on_axis(axis))?;
        }
        Ok(self)
    }

    /// Set the same dilation on every axis.
    ///
    /// # Errors
    ///
    /// Returns [`ConvError::InvalidDilation`] if `dilation` is zero.
    pub fn with_dilation(mut self, dilation: usize) -> Result<Self, ConvError> {
        let dilation = validate_dilation(dilation)?;
        self.axes.iter_mut().for_each(|options| options.dilation = dilation);
        Ok(self)
    }

    /// Set the dilation of every axis.
    ///
    /// # Errors
    ///
    /// Returns [`ConvError::Axis`] wrapping [`ConvError::InvalidDilation`] for the
    /// first axis with a zero dilation.
    pub fn with_dilation_per_axis(mut self, dilations: [usize; N]) -> Result<Self, ConvError> {
        for (axis, (options, &dilation)) in
            self.axes.iter_mut().zip(dilations.iter()).enumerate()
        {
            options.dilation = validate_dilation(dilation).map_err(|e| e.on_axis(axis))?;
        }
        Ok(self)
    }

    /// Set the border treatment of both edges of every axis.
    pub fn with_border_treatment(self, treatment: BorderTreatment<T>) -> Self
    where
        T: Clone,
    {
        self.with_border_treatment_edges(treatment.clone(), treatment)
    }

    /// Set the begin and end border treatments of every axis.
    pub fn with_border_treatment_edges(
        mut self,
        begin: BorderTreatment<T>,
        end: BorderTreatment<T>,
    ) -> Self
    where
        T: Clone,
    {
        self.axes = self
            .axes
            .map(|axis| axis.with_border_treatment_edges(begin.clone(), end.clone()));
        self
    }

    /// Replace the options of one axis.
    ///
    /// # Errors
    ///
    /// Returns [`ConvError::InvalidAxis`] if `axis` is not below `N`.
    pub fn with_axis(
        mut self,
        axis: usize,
        options: KernelOptions<T>,
    ) -> Result<Self, ConvError> {
        let slot = self
            .axes
            .get_mut(axis)
            .ok_or(ConvError::InvalidAxis { axis, num_axes: N })?;
        *slot = options;
        Ok(self)
    }

    /// Replace the options of every axis.
    pub fn with_axes(mut self, axes: [KernelOptions<T>; N]) -> Self {
        self.axes = axes;
        self
    }

    /// The options of every axis.
    pub fn axes(&self) -> &[KernelOptions<T>; N] {
        &self.axes
    }

    /// The options of one axis, if it exists.
    pub fn axis(&self, axis: usize) -> Option<&KernelOptions<T>> {
        self.axes.get(axis)
    }

    /// The position of the channel axis in the input.
    pub fn channel_position(&self) -> ChannelPosition {
        self.channel_position
    }
}

impl<T, const N: usize> Default for ConvOptions<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> From<KernelOptions<T>> for ConvOptions<T, N>
where
    T: Clone,
{
    /// Broadcast one axis configuration to all axes.
    fn from(options: KernelOptions<T>) -> Self {
        Self::from_axes(std::array::from_fn(|_| options.clone()))
    }
}
