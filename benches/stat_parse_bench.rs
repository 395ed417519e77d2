use std::hint::black_box;

use coremon::system::counters::{CoreCounters, CpuCounterRecord};
use coremon::system::stat::parse_cpu_counters;
use coremon::system::store::{decode_region, encode_region};
use coremon::system::utilization::compute;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

const CORE_COUNTS: [usize; 3] = [8, 64, 256];

fn stat_text(cores: usize, tick: u64) -> String {
    let mut text = String::from("cpu  4705 356 584 3699 23 23 0 0 0 0\n");
    for i in 0..cores {
        let base = tick * (i as u64 + 1);
        text.push_str(&format!(
            "cpu{i} {} {} {} {} {} {} 0 0 0 0\n",
            base,
            base / 7,
            base / 3,
            base * 4,
            base / 11,
            base / 13
        ));
    }
    text.push_str("intr 114930548 113199788 3 0 5 263 0 4 [... lots more numbers ...]\n");
    text.push_str("ctxt 1990473\nbtime 1062191376\nprocesses 2915\n");
    text
}

fn record(cores: usize, tick: u64) -> CpuCounterRecord {
    CpuCounterRecord::new(
        (0..cores)
            .map(|i| CoreCounters {
                id: format!("cpu{i}"),
                user: tick * (i as u64 + 1),
                system: tick,
                idle: tick * 4,
                ..CoreCounters::default()
            })
            .collect(),
    )
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("stat_parse_8_64_256");
    for cores in CORE_COUNTS {
        let text = stat_text(cores, 1_000);
        group.bench_with_input(BenchmarkId::from_parameter(cores), &text, |b, text| {
            b.iter(|| parse_cpu_counters(black_box(text)))
        });
    }
    group.finish();
}

fn bench_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("utilization_compute_8_64_256");
    for cores in CORE_COUNTS {
        let prev = record(cores, 1_000);
        let curr = record(cores, 1_100);
        group.bench_with_input(
            BenchmarkId::from_parameter(cores),
            &(prev, curr),
            |b, (prev, curr)| b.iter(|| compute(black_box(prev), black_box(curr))),
        );
    }
    group.finish();
}

fn bench_region_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("region_codec_8_64_256");
    for cores in CORE_COUNTS {
        let rec = record(cores, 1_000);
        group.bench_with_input(BenchmarkId::from_parameter(cores), &rec, |b, rec| {
            b.iter(|| {
                let bytes = encode_region(black_box(rec)).unwrap_or_default();
                decode_region(black_box(&bytes))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_compute, bench_region_codec);
criterion_main!(benches);
