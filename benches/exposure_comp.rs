use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pano_expcomp_rs::exposure_comp::{
    AccessMode, ChannelMode, CompensationConfig, CompositeImage, ExposureCompensator, Gains,
    GainSolver, ImageAccessor, Matrix, Rect, ViewLayout, apply_gains, pack_pixel, solve_gauss,
};

/// Views of `width` x `height` side by side in a ring, each overlapping its
/// neighbour by a quarter of the width, with a per-view brightness offset.
fn generate_ring(views: usize, width: usize, height: usize) -> (CompositeImage, Vec<Rect>) {
    let mut image = CompositeImage::new(width, height * views);
    let mut valid = Vec::with_capacity(views);
    for v in 0..views {
        let start_x = (v % 2) * width / 4;
        let rect = Rect::new(start_x, 0, start_x + 3 * width / 4, height);
        for y in 0..height {
            for x in rect.start_x..rect.end_x {
                let value = (60 + 20 * v + (x + y) % 40) as u8;
                image.set_pixel(x, v * height + y, pack_pixel(value, value, value, value));
            }
        }
        valid.push(rect);
    }
    (image, valid)
}

fn benchmark_process_by_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_by_size");

    let sizes = vec![
        (256, 128, "256x128"),
        (1024, 512, "1024x512"),
        (1920, 1080, "1920x1080"),
    ];

    for (width, height, label) in sizes {
        let (image, valid) = generate_ring(4, width, height);

        group.bench_with_input(BenchmarkId::from_parameter(label), &image, |b, image| {
            let output = CompositeImage::filled(image.width(), image.height(), 0);
            let mut compensator = ExposureCompensator::new(
                valid.clone(),
                image.clone(),
                output,
                CompensationConfig::default(),
            )
            .unwrap();

            b.iter(|| {
                let _ = black_box(compensator.process());
            });
        });
    }

    group.finish();
}

fn benchmark_channel_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("channel_modes");
    let (image, valid) = generate_ring(4, 1024, 512);

    let modes = vec![
        (ChannelMode::Luma, true, "luma"),
        (ChannelMode::PerChannel, false, "per_channel"),
        (ChannelMode::PerChannel, true, "per_channel_linear"),
    ];

    for (mode, linearize, label) in modes {
        group.bench_function(label, |b| {
            let config = CompensationConfig::builder()
                .channel_mode(mode)
                .linearize(linearize)
                .build();
            let output = CompositeImage::filled(image.width(), image.height(), 0);
            let mut compensator =
                ExposureCompensator::new(valid.clone(), image.clone(), output, config).unwrap();

            b.iter(|| {
                let _ = black_box(compensator.compute_gains());
            });
        });
    }

    group.finish();
}

fn benchmark_block_gains(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_gains");
    let (image, valid) = generate_ring(4, 1024, 512);

    group.bench_function("1024x512x4", |b| {
        let config = CompensationConfig::builder().block_gains(true).build();
        let output = CompositeImage::filled(image.width(), image.height(), 0);
        let mut compensator =
            ExposureCompensator::new(valid.clone(), image.clone(), output, config).unwrap();

        b.iter(|| {
            let _ = black_box(compensator.process_block_gains());
        });
    });

    group.finish();
}

fn benchmark_solver(c: &mut Criterion) {
    let mut group = c.benchmark_group("solver");

    for views in [4usize, 16, 64] {
        let mut intensity = Matrix::new(views, views, 0.0f32);
        let counts = Matrix::new(views, views, 1000u32);
        for i in 0..views {
            for j in 0..views {
                intensity[(i, j)] = 100.0 + (i * 7 + j * 3) as f32 % 50.0;
            }
        }

        group.bench_with_input(BenchmarkId::new("normal_equations", views), &views, |b, &n| {
            let mut solver = GainSolver::new(n, 0.01, 100.0);
            let mut gains = vec![0.0f32; n];
            b.iter(|| solver.solve(black_box(&intensity), black_box(&counts), &mut gains));
        });

        group.bench_with_input(BenchmarkId::new("gauss_only", views), &views, |b, &n| {
            let mut a = Matrix::new(n, n + 1, 1.0f64);
            let mut gains = vec![0.0f32; n];
            b.iter(|| {
                a.fill(1.0);
                for i in 0..n {
                    a[(i, i)] = (n + 1) as f64;
                }
                solve_gauss(black_box(&mut a), &mut gains);
            });
        });
    }

    group.finish();
}

fn benchmark_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_gains");
    let (mut image, valid) = generate_ring(4, 1920, 1080);
    let full = Rect::full(image.width(), image.height());
    let layout = ViewLayout::new(image.width(), image.height(), valid).unwrap();
    let src = image.acquire(&full, AccessMode::ReadOnly).unwrap();
    let gains = Gains::Luma(vec![1.1, 0.9, 1.05, 0.95]);

    group.bench_function("1920x1080x4", |b| {
        let mut dst = src.clone();
        b.iter(|| {
            apply_gains(&src, &mut dst, &layout, &gains, false).unwrap();
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_process_by_size,
    benchmark_channel_modes,
    benchmark_block_gains,
    benchmark_solver,
    benchmark_apply
);
criterion_main!(benches);
