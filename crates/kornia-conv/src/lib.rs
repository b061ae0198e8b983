#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// border treatments of the input edges.
pub mod border;

/// Error types for the conv module.
pub mod error;

/// output size and window addressing of a convolution.
pub mod geometry;

/// kernel construction and promotion utilities.
pub mod kernel;

/// per-axis convolution options.
pub mod options;

/// module containing parallization utilities.
pub mod parallel;

/// window extraction over ndarray inputs.
pub mod unfold;

pub use crate::border::BorderTreatment;
pub use crate::error::ConvError;
pub use crate::geometry::{
    calculate_output_size, effective_kernel_size, output_shape, AxisGeometry, Tap,
};
pub use crate::options::{
    ChannelPosition, ConvOptions, KernelOptions, KernelOptions1D, KernelOptions2D,
};
pub use crate::parallel::{ExecutionStrategy, ParallelError};
