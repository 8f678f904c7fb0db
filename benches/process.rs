//! Block processing benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fading_channel::*;
use num_complex::Complex64;

fn four_path(synthesis: SynthesisMethod) -> ChannelConfig {
    ChannelConfig::from_vectors(5e6, &[0.0, 2e-7, 4e-7, 8e-7], &[0.0, -3.0, -6.0, -9.0])
        .expect("valid path vectors")
        .with_max_doppler(200.0)
        .with_synthesis(synthesis)
        .with_normalization(true)
}

fn block(n: usize) -> Vec<Complex64> {
    (0..n)
        .map(|i| Complex64::from_polar(1.0, 0.01 * i as f64))
        .collect()
}

fn benchmark_filtered_noise_process(c: &mut Criterion) {
    let mut channel = FadingChannel::new(four_path(SynthesisMethod::FilteredNoise), Some(1))
        .expect("channel builds");
    let input = block(4096);

    c.bench_function("filtered_noise_4path_4096_samples", |b| {
        b.iter(|| black_box(channel.process(&input)))
    });
}

fn benchmark_sum_of_sinusoids_process(c: &mut Criterion) {
    let mut channel = FadingChannel::new(four_path(SynthesisMethod::SumOfSinusoids), Some(1))
        .expect("channel builds");
    let input = block(4096);

    c.bench_function("sum_of_sinusoids_4path_4096_samples", |b| {
        b.iter(|| black_box(channel.process(&input)))
    });
}

fn benchmark_fractional_delay_process(c: &mut Criterion) {
    let config = ChannelConfig::from_vectors(1e6, &[0.0, 1.5e-6, 3.25e-6], &[0.0, -3.0, -6.0])
        .expect("valid path vectors")
        .with_max_doppler(100.0);
    let mut channel = FadingChannel::new(config, Some(1)).expect("channel builds");
    let input = block(4096);

    c.bench_function("fractional_delay_3path_4096_samples", |b| {
        b.iter(|| black_box(channel.process(&input)))
    });
}

fn benchmark_frequency_response(c: &mut Criterion) {
    let channel = FadingChannel::new(four_path(SynthesisMethod::FilteredNoise), Some(1))
        .expect("channel builds");

    c.bench_function("frequency_response_1024_points", |b| {
        b.iter(|| black_box(channel.snapshot_frequency_response(1024)))
    });
}

criterion_group!(
    benches,
    benchmark_filtered_noise_process,
    benchmark_sum_of_sinusoids_process,
    benchmark_fractional_delay_process,
    benchmark_frequency_response
);
criterion_main!(benches);
