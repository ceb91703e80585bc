use criterion::{criterion_group, criterion_main, Criterion};
use go_test_coverage::core::profile::CoverageProfile;
use std::fmt::Write;
use std::hint::black_box;

/// A profile shaped like an aggregate of many packages.
fn generate_profile(packages: usize, blocks_per_package: usize) -> String {
    let mut text = String::new();
    for p in 0..packages {
        text.push_str("mode: atomic\n");
        for b in 0..blocks_per_package {
            let line = b * 4 + 1;
            let _ = writeln!(
                text,
                "example.com/app/pkg{p}/file{}.go:{line}.13,{}.2 {} {}",
                b % 7,
                line + 3,
                b % 5 + 1,
                b % 3
            );
        }
    }
    text
}

fn bench_parse_profile(c: &mut Criterion) {
    let text = generate_profile(50, 400);

    c.bench_function("parse_profile", |b| {
        b.iter(|| CoverageProfile::parse(black_box(&text)).unwrap());
    });

    let profile = CoverageProfile::parse(&text).unwrap();
    c.bench_function("file_summaries", |b| {
        b.iter(|| black_box(&profile).file_summaries().len());
    });
}

criterion_group!(benches, bench_parse_profile);
criterion_main!(benches);
