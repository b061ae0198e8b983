use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use kornia_conv::{
    calculate_output_size, unfold::unfold_2d, BorderTreatment, ExecutionStrategy, KernelOptions,
    KernelOptions2D,
};
use ndarray::Array3;
use rand::Rng;

fn bench_unfold(c: &mut Criterion) {
    let mut group = c.benchmark_group("Unfold2d");
    let mut rng = rand::rng();

    for (width, height) in [(256, 224), (512, 448)].iter() {
        for kernel_size in [3, 7].iter() {
            for (stride, dilation, padding) in [(1, 1, 0), (1, 1, 3), (2, 1, 1), (1, 2, 2)] {
                let parameter_string = format!(
                    "{}x{}x{}_s{}_d{}_p{}",
                    width, height, kernel_size, stride, dilation, padding
                );

                let image = Array3::from_shape_fn((*height, *width, 3), |_| rng.random::<f32>());

                let options = KernelOptions2D::new()
                    .with_padding(padding)
                    .with_border_treatment(BorderTreatment::constant(0.0))
                    .with_stride(stride)
                    .and_then(|options| options.with_dilation(dilation))
                    .unwrap();

                group.throughput(criterion::Throughput::Elements(
                    (*width * *height * *kernel_size * *kernel_size) as u64,
                ));

                for (name, strategy) in [
                    ("serial", ExecutionStrategy::Serial),
                    ("parallel", ExecutionStrategy::Parallel),
                    ("chunked", ExecutionStrategy::Chunked(64)),
                ] {
                    group.bench_with_input(
                        BenchmarkId::new(name, &parameter_string),
                        &image,
                        |b, i| {
                            b.iter(|| {
                                black_box(unfold_2d(
                                    i.view(),
                                    [*kernel_size, *kernel_size],
                                    &options,
                                    strategy,
                                ))
                            })
                        },
                    );
                }
            }
        }
    }

    group.finish();
}

fn bench_output_size(c: &mut Criterion) {
    let options = KernelOptions::new()
        .with_padding_edges(2, 1)
        .with_border_treatment_edges(BorderTreatment::constant(0u8), BorderTreatment::avoid())
        .with_stride(2)
        .unwrap();

    c.bench_function("calculate_output_size", |b| {
        b.iter(|| {
            for input_size in 1..256 {
                let _ = black_box(calculate_output_size(
                    black_box(input_size),
                    black_box(5),
                    &options,
                ));
            }
        })
    });
}

criterion_group!(benches, bench_unfold, bench_output_size);
criterion_main!(benches);
