//! Benchmarks for the delineation stages

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use catchflow_algorithms::config::{DelineationParams, HydroModel, PitPolicy};
use catchflow_algorithms::flow_accumulation::{
    flow_accumulation, flow_accumulation_batched, AccumulationParams,
};
use catchflow_algorithms::flow_direction::{flow_direction, FlowDirectionParams};
use catchflow_algorithms::outlet::OutletSpec;
use catchflow_algorithms::partition::{partition, PartitionParams};
use catchflow_algorithms::pipeline::delineate;
use catchflow_core::{GeoTransform, Raster};

/// Tilted plane with small deterministic noise, so every cell drains to
/// the south edge without flats or pits.
fn create_hillslope_dem(size: usize) -> Raster<f64> {
    let mut dem = Raster::new(size, size);
    dem.set_transform(GeoTransform::new(0.0, size as f64, 1.0, -1.0));
    for row in 0..size {
        for col in 0..size {
            let noise = ((row * 7 + col * 13) % 17) as f64 * 0.01;
            let z = (size - row) as f64 * 2.0 + col as f64 * 0.1 + noise;
            dem.set(row, col, z).unwrap();
        }
    }
    dem
}

fn bench_flow_direction(c: &mut Criterion) {
    let mut group = c.benchmark_group("delineation/flow_direction");
    for size in [256, 512, 1024] {
        let dem = create_hillslope_dem(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                flow_direction(
                    black_box(&dem),
                    &OutletSpec::none(),
                    FlowDirectionParams::default(),
                )
                .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_flow_accumulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("delineation/flow_accumulation");
    for size in [256, 512, 1024] {
        let dem = create_hillslope_dem(size);
        let field =
            flow_direction(&dem, &OutletSpec::none(), FlowDirectionParams::default()).unwrap();
        group.bench_with_input(BenchmarkId::new("heap", size), &size, |b, _| {
            b.iter(|| {
                flow_accumulation(
                    black_box(&dem),
                    &field,
                    AccumulationParams::default(),
                )
                .unwrap()
            })
        });
        group.bench_with_input(BenchmarkId::new("batched", size), &size, |b, _| {
            b.iter(|| {
                flow_accumulation_batched(
                    black_box(&dem),
                    &field,
                    AccumulationParams::default(),
                )
                .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_partition(c: &mut Criterion) {
    let mut group = c.benchmark_group("delineation/partition");
    for size in [256, 512, 1024] {
        let dem = create_hillslope_dem(size);
        let field =
            flow_direction(&dem, &OutletSpec::none(), FlowDirectionParams::default()).unwrap();
        let acc = flow_accumulation(&dem, &field, AccumulationParams::default()).unwrap();
        let target = (size * size) as f64 / 64.0;
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                partition(
                    black_box(&dem),
                    &field,
                    &acc,
                    PartitionParams {
                        target_area: target,
                        min_split_area: 0.0,
                    },
                )
                .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("delineation/pipeline");
    group.sample_size(20);
    for size in [256, 512] {
        let dem = create_hillslope_dem(size);
        let params = DelineationParams::new(HydroModel::Mydro, (size * size) as f64 / 64.0)
            .with_pit_policy(PitPolicy::SyntheticExit);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| delineate(black_box(dem.clone()), &OutletSpec::none(), &params).unwrap())
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_flow_direction,
    bench_flow_accumulation,
    bench_partition,
    bench_full_pipeline
);
criterion_main!(benches);
