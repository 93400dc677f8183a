use criterion::{criterion_group, criterion_main, Criterion};

use flow_core::census::{census_transform, CENSUS_RADIUS};
use flow_core::cost_volume::build_cost_volume;
use flow_core::image::plane_from_samples;
use flow_core::sgm::{aggregate, SgmParams};
use flow_core::HintField;

fn synthetic_samples(width: usize, height: usize) -> Vec<u8> {
    (0..width * height).map(|i| ((i * 37) % 251) as u8).collect()
}

fn bench_cost_volume(c: &mut Criterion) {
    let width = 256;
    let height = 256;
    let samples = synthetic_samples(width, height);
    let plane1 = plane_from_samples(width, height, &samples);
    let plane2 = plane_from_samples(width, height, &samples);
    let cen1 = census_transform(&plane1, CENSUS_RADIUS);
    let cen2 = census_transform(&plane2, CENSUS_RADIUS);
    let hint = HintField::zero(width, height);

    c.bench_function("build_cost_volume_256x256_rx3_ry3", |b| {
        b.iter(|| build_cost_volume(&cen1, &cen2, width, height, &hint, 2, 3, 3))
    });
}

fn bench_sgm_aggregate(c: &mut Criterion) {
    let width = 256;
    let height = 256;
    let samples = synthetic_samples(width, height);
    let plane = plane_from_samples(width, height, &samples);
    let cen = census_transform(&plane, CENSUS_RADIUS);
    let hint = HintField::zero(width, height);
    let cost = build_cost_volume(&cen, &cen, width, height, &hint, 2, 3, 3);
    let params = SgmParams {
        p1: 2,
        p2: 8,
        enable_diagonal: true,
        total_pass: 2,
        adaptive_p2: true,
    };

    c.bench_function("sgm_aggregate_256x256_8path_2pass", |b| {
        b.iter(|| aggregate(&cost, &plane, &hint, &params).unwrap())
    });
}

criterion_group!(benches, bench_cost_volume, bench_sgm_aggregate);
criterion_main!(benches);
