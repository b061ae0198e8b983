use kornia_conv::{
    output_shape,
    unfold::{unfold_1d, unfold_2d, unfold_2d_implicit},
    BorderTreatment, ChannelPosition, ConvError, ExecutionStrategy, KernelOptions,
    KernelOptions1D, KernelOptions2D,
};
use ndarray::{Array2, Array3};
use rand::Rng;

fn random_image(height: usize, width: usize, channels: usize) -> Array3<i32> {
    let mut rng = rand::rng();
    Array3::from_shape_fn((height, width, channels), |_| rng.random_range(0..256))
}

/// Read one padded pixel the slow way.
fn padded_pixel(
    src: &Array3<i32>,
    options: &KernelOptions2D<i32>,
    y: isize,
    x: isize,
    c: usize,
) -> i32 {
    let (height, width, _) = src.dim();
    let [rows, cols] = options.axes();
    let fill = |options: &KernelOptions<i32>, index: isize, size: usize| {
        if index < 0 {
            options.border_treatment_begin().fill_value()
        } else if index as usize >= size {
            options.border_treatment_end().fill_value()
        } else {
            None
        }
    };

    match (fill(rows, y, height), fill(cols, x, width)) {
        (Some(value), _) | (None, Some(value)) => value,
        (None, None) => src[[y as usize, x as usize, c]],
    }
}

#[test]
fn test_unfold_2d_matches_reference() -> Result<(), ConvError> {
    let src = random_image(11, 8, 3);
    let kernel = [3, 4];

    let options = KernelOptions2D::from_axes([
        KernelOptions::new()
            .with_padding_edges(2, 1)
            .with_border_treatment_edges(
                BorderTreatment::constant(-1),
                BorderTreatment::constant(-2),
            )
            .with_stride(2)?,
        KernelOptions::new()
            .with_padding(3)
            .with_border_treatment_edges(BorderTreatment::constant(-3), BorderTreatment::avoid())
            .with_dilation(2)?,
    ]);

    let windows = unfold_2d(src.view(), kernel, &options, ExecutionStrategy::Parallel)?;
    let [out_h, out_w] = output_shape([11, 8], kernel, &options)?;
    assert_eq!(windows.dim(), (out_h, out_w, 3, 3, 4));

    let [rows, cols] = options.axes();
    let pad_y = rows.padding_begin() as isize;
    let pad_x = cols.padding_begin() as isize;

    for ((oy, ox, c, ky, kx), value) in windows.indexed_iter() {
        let y = (oy * rows.stride() + ky * rows.dilation()) as isize - pad_y;
        let x = (ox * cols.stride() + kx * cols.dilation()) as isize - pad_x;
        assert_eq!(
            *value,
            padded_pixel(&src, &options, y, x, c),
            "window ({oy}, {ox}) tap ({ky}, {kx}) channel {c}"
        );
    }

    Ok(())
}

#[test]
fn test_unfold_2d_layouts_agree() -> Result<(), ConvError> {
    let src = random_image(6, 9, 2);
    let options = KernelOptions2D::new()
        .with_padding(1)
        .with_border_treatment(BorderTreatment::constant(0));

    let last = unfold_2d(src.view(), [3, 3], &options, ExecutionStrategy::Serial)?;
    let first = unfold_2d(
        src.view().permuted_axes([2, 0, 1]),
        [3, 3],
        &options.with_channel_position(ChannelPosition::First),
        ExecutionStrategy::Chunked(8),
    )?;
    assert_eq!(first, last.view().permuted_axes([2, 3, 4, 0, 1]));

    // every channel of the explicit layout matches the implicit extraction
    let implicit_options = options.with_channel_position(ChannelPosition::Implicit);
    for c in 0..2 {
        let plane: Array2<i32> = src.index_axis(ndarray::Axis(2), c).to_owned();
        let implicit = unfold_2d_implicit(
            plane.view(),
            [3, 3],
            &implicit_options,
            ExecutionStrategy::Serial,
        )?;
        assert_eq!(implicit, last.index_axis(ndarray::Axis(2), c));
    }

    Ok(())
}

#[test]
fn test_unfold_1d_strided_signal() -> Result<(), ConvError> {
    // a stereo signal, W x C
    let src = Array2::from_shape_fn((10, 2), |(w, c)| (w * 10 + c) as i32);
    let options = KernelOptions1D::from_axes([KernelOptions::new()
        .with_padding_edges(0, 2)
        .with_border_treatment(BorderTreatment::constant(99))
        .with_stride(4)?]);

    let windows = unfold_1d(src.view(), 3, &options, ExecutionStrategy::Fixed(2))?;
    // (10 + 2 - 3) / 4 + 1
    assert_eq!(windows.dim(), (3, 2, 3));
    assert_eq!(windows.slice(ndarray::s![2, 0, ..]).to_vec(), vec![80, 90, 99]);
    assert_eq!(windows.slice(ndarray::s![2, 1, ..]).to_vec(), vec![81, 91, 99]);
    Ok(())
}
