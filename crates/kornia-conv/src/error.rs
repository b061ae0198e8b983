use thiserror::Error;

use crate::{options::ChannelPosition, parallel::ParallelError};

/// An error type for convolution geometry and window extraction.
#[derive(Error, Debug, PartialEq)]
pub enum ConvError {
    /// The stride must be at least one.
    #[error("Invalid stride {0}. The stride must be >= 1.")]
    InvalidStride(i64),

    /// The dilation must be at least one.
    #[error("Invalid dilation {0}. The dilation must be >= 1.")]
    InvalidDilation(i64),

    /// A padding value read from a raw configuration is negative.
    #[error("Invalid padding {0}. The padding must be >= 0.")]
    InvalidPadding(i64),

    /// A raw configuration value does not fit the platform integer size.
    #[error("Configuration value {0} is out of range")]
    ValueOutOfRange(i64),

    /// The kernel has no taps along an axis.
    #[error("The kernel size must be >= 1")]
    EmptyKernel,

    /// The kernel cannot be placed even once inside the padded input.
    #[error(
        "Degenerate geometry. The padded input size ({padded_size}) is smaller than the \
         effective kernel size ({effective_kernel_size})."
    )]
    DegenerateGeometry {
        /// Input size plus the effective padding on both edges.
        padded_size: usize,
        /// Span of the dilated kernel.
        effective_kernel_size: usize,
    },

    /// A size derived from the axis settings does not fit the platform integer size.
    #[error("The {0} of the axis overflows")]
    GeometryOverflow(&'static str),

    /// Resolving one axis of a multi-axis convolution failed.
    #[error("Axis {axis}: {source}")]
    Axis {
        /// Index of the failing axis.
        axis: usize,
        /// The failure reported for that axis.
        #[source]
        source: Box<ConvError>,
    },

    /// An axis index past the number of spatial axes.
    #[error("Axis {axis} does not exist, the convolution has {num_axes} spatial axes")]
    InvalidAxis {
        /// The requested axis.
        axis: usize,
        /// Number of spatial axes.
        num_axes: usize,
    },

    /// A window was requested for an output position that does not exist.
    #[error("Output index {index} is out of bounds for an output of size {output_size}")]
    OutputIndexOutOfBounds {
        /// The requested output position.
        index: usize,
        /// Number of valid output positions.
        output_size: usize,
    },

    /// A constant fill value cannot be represented in the element type.
    #[error("Fill value {value} cannot be represented as {target}")]
    FillValueMismatch {
        /// The offending fill value.
        value: String,
        /// Name of the element type.
        target: &'static str,
    },

    /// The channel position of the options does not fit the called operation.
    #[error("Unsupported channel position {found}. Expected {expected}.")]
    ChannelPositionMismatch {
        /// What the operation supports.
        expected: &'static str,
        /// What the options carry.
        found: ChannelPosition,
    },

    /// The number of input channels does not match the kernel.
    #[error("Input channels mismatch: input has {0}, kernel expects {1}")]
    ChannelMismatch(usize, usize),

    /// A kernel promotion needs at least one output channel.
    #[error("At least one output channel is required to promote the kernel")]
    NoOutputChannels,

    /// The kernel has an unsupported number of dimensions.
    #[error("Cannot promote a {0} dimensional kernel")]
    InvalidKernelDimension(usize),

    /// Error while building the output array.
    #[error("Invalid shape: {0}")]
    ShapeError(#[from] ndarray::ShapeError),

    /// Error while dispatching the work.
    #[error(transparent)]
    ParallelError(#[from] ParallelError),
}

impl ConvError {
    /// Attach the axis index to an error raised while resolving one axis.
    pub(crate) fn on_axis(self, axis: usize) -> Self {
        ConvError::Axis {
            axis,
            source: Box::new(self),
        }
    }
}
