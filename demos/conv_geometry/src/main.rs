use argh::FromArgs;
use std::path::{Path, PathBuf};

use kornia_conv::{
    self as kconv,
    unfold::{unfold_1d_implicit, unfold_2d_implicit},
    AxisGeometry, BorderTreatment, ChannelPosition, ExecutionStrategy, KernelOptions,
    KernelOptions1D, KernelOptions2D,
};
use ndarray::{Array1, Array2};

#[derive(FromArgs)]
/// Resolve the output geometry of a convolution
struct Args {
    /// path to a json file describing a two dimensional convolution
    #[argh(option)]
    config: Option<PathBuf>,

    /// the size of the input
    #[argh(option, default = "5")]
    input_size: usize,

    /// the number of kernel taps
    #[argh(option, default = "3")]
    kernel_size: usize,

    /// the padding requested on both edges
    #[argh(option, default = "0")]
    padding: usize,

    /// the step between output positions
    #[argh(option, default = "1")]
    stride: usize,

    /// the spacing between kernel taps
    #[argh(option, default = "1")]
    dilation: usize,

    /// the treatment of the begin edge: avoid or constant:<value>
    #[argh(option, default = "BorderTreatment::Avoid", from_str_fn(parse_border))]
    begin: BorderTreatment<f64>,

    /// the treatment of the end edge: avoid or constant:<value>
    #[argh(option, default = "BorderTreatment::Avoid", from_str_fn(parse_border))]
    end: BorderTreatment<f64>,

    /// print the windows of a ramp input
    #[argh(switch)]
    unfold: bool,
}

/// A two dimensional convolution read from a json file.
#[derive(serde::Deserialize)]
struct GeometryConfig {
    input_shape: [usize; 2],
    kernel_shape: [usize; 2],
    axes: [KernelOptions<f64>; 2],
}

fn parse_border(value: &str) -> Result<BorderTreatment<f64>, String> {
    match value.split_once(':') {
        None if value == "avoid" => Ok(BorderTreatment::avoid()),
        Some(("constant", fill)) => fill
            .parse::<f64>()
            .map(BorderTreatment::constant)
            .map_err(|e| format!("invalid fill value {fill}: {e}")),
        _ => Err(format!("expected avoid or constant:<value>, got {value}")),
    }
}

fn run_axis(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let options = KernelOptions::new()
        .with_padding(args.padding)
        .with_border_treatment_edges(args.begin, args.end)
        .with_stride(args.stride)?
        .with_dilation(args.dilation)?;

    let output_size = kconv::calculate_output_size(args.input_size, args.kernel_size, &options)?;
    log::info!("options: {options}");
    println!(
        "input {} kernel {} -> output {}",
        args.input_size, args.kernel_size, output_size
    );

    if !args.unfold {
        return Ok(());
    }

    let options = KernelOptions1D::from_axes([options.try_cast_fill::<i32>()?])
        .with_channel_position(ChannelPosition::Implicit);

    let geometry = AxisGeometry::resolve(args.input_size, args.kernel_size, &options.axes()[0])?;
    let src = Array1::from_iter(0..args.input_size as i32);
    let windows = unfold_1d_implicit(
        src.view(),
        args.kernel_size,
        &options,
        ExecutionStrategy::Serial,
    )?;

    for (o, window) in windows.outer_iter().enumerate() {
        let taps = geometry.window(o)?.collect::<Vec<_>>();
        println!("{o:>4}: {window} {taps:?}");
    }

    Ok(())
}

fn run_config(args: &Args, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config: GeometryConfig = serde_json::from_reader(std::fs::File::open(path)?)?;

    let [rows, cols] = config.axes;
    let options =
        KernelOptions2D::from_axes([rows.try_cast_fill::<i32>()?, cols.try_cast_fill::<i32>()?])
        .with_channel_position(ChannelPosition::Implicit);

    log::info!("rows: {rows}");
    log::info!("cols: {cols}");

    let output_shape = kconv::output_shape(config.input_shape, config.kernel_shape, &options)?;
    println!(
        "input {:?} kernel {:?} -> output {:?}",
        config.input_shape, config.kernel_shape, output_shape
    );

    if args.unfold {
        let [height, width] = config.input_shape;
        let src = Array2::from_shape_fn((height, width), |(y, x)| (y * width + x) as i32);
        let windows = unfold_2d_implicit(
            src.view(),
            config.kernel_shape,
            &options,
            ExecutionStrategy::Parallel,
        )?;
        println!("windows {:?}", windows.dim());
        println!("{windows}");
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    match &args.config {
        Some(path) => run_config(&args, path),
        None => run_axis(&args),
    }
}
