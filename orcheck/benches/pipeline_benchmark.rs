use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use orcheck::models::DayOfYear;
use orcheck::parsing::CatalogLoader;
use orcheck::pipeline::{CheckConfig, Pipeline};
use orcheck::services::geometry::{ApproximateSunGeometry, PitchGeometry};
use qtty::Degrees;

/// A synthetic week: short chains of four, mixed roll specifications.
fn synthetic_week(count: usize) -> String {
    let mut text = String::new();
    for i in 0..count {
        let obsid = 20_000 + i;
        let ra = (i as f64 * 7.3) % 360.0;
        let dec = ((i as f64 * 3.1) % 160.0) - 80.0;
        let roll = if i % 3 == 0 {
            format!("ROLL=({:.1})", (i as f64 * 11.0) % 360.0)
        } else {
            format!("ROLL=({:.1},{})", (i as f64 * 13.0) % 360.0, 5 + i % 20)
        };
        let preceding = if i % 4 == 0 {
            String::new()
        } else {
            format!(",PRECEDING=({})", obsid - 1)
        };
        text.push_str(&format!(
            "ID={},TARGET=({:.4},{:.4},{{Field {}}}),DURATION=({}),PRIORITY={},{},DITHER=(ON,0.002222,0.36,0.0,0.002222,0.5091,0.0){}\n",
            obsid,
            ra,
            dec,
            i,
            5000 + (i % 7) * 1000,
            1 + i % 9,
            roll,
            preceding
        ));
    }
    text
}

fn config(parallel: bool) -> CheckConfig {
    CheckConfig::from_toml_str(&format!(
        "[week]\nstart_date = \"2013-11-06\"\n[run]\nparallel = {}\n",
        parallel
    ))
    .expect("benchmark config")
}

fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog_load");

    for count in [100usize, 1000] {
        let text = synthetic_week(count);
        group.bench_with_input(BenchmarkId::new("load_str", count), &text, |b, input| {
            b.iter(|| CatalogLoader::load_str(black_box(input)));
        });
    }

    group.finish();
}

fn bench_pitch(c: &mut Criterion) {
    let mut group = c.benchmark_group("geometry");

    let geometry = ApproximateSunGeometry;
    group.bench_function("pitch_1000", |b| {
        b.iter(|| {
            for i in 0..1000 {
                let day = DayOfYear::new(310.0 + (i % 7) as f64);
                black_box(geometry.pitch(
                    Degrees::new((i as f64 * 0.36) % 360.0),
                    Degrees::new(-45.0 + (i % 90) as f64),
                    Degrees::new(90.0),
                    day,
                ));
            }
        });
    });

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(20);

    let text = synthetic_week(500);
    for parallel in [false, true] {
        let pipeline = Pipeline::with_config(config(parallel));
        let label = if parallel { "parallel" } else { "serial" };
        group.bench_with_input(BenchmarkId::new(label, 500), &text, |b, input| {
            b.iter(|| pipeline.run_str(black_box(input)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_load, bench_pitch, bench_pipeline);
criterion_main!(benches);
