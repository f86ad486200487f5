//! Benchmarks for import extraction
//!
//! Measures parsing and import collection on generated source files, from
//! a handful of imports up to large barrel modules.

use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ghost_imports::analysis::{package_root, ImportExtractor, SourceLanguage};

/// Generate a module with the given number of import sites, mixing static,
/// dynamic and CommonJS forms.
fn create_module(imports: usize) -> String {
    let mut source = String::new();

    for i in 0..imports {
        match i % 4 {
            0 => source.push_str(&format!("import dep{i} from 'pkg-{i}';\n")),
            1 => source.push_str(&format!("import {{ a{i} }} from '@scope/pkg-{i}/sub';\n")),
            2 => source.push_str(&format!("const r{i} = require('pkg-{i}');\n")),
            _ => source.push_str(&format!("const l{i} = () => import('./local-{i}');\n")),
        }
    }

    source.push_str("export function main() { return 42; }\n");
    source
}

/// Benchmark full extraction (parse + walk + package resolution)
fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_imports");
    let path = Path::new("/bench/src/index.ts");

    for size in [10, 100, 1000] {
        let source = create_module(size);
        let mut extractor = ImportExtractor::new().unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &source, |b, source| {
            b.iter(|| {
                let records = extractor
                    .extract_imports(path, black_box(source), SourceLanguage::TypeScript, "bench")
                    .unwrap();
                black_box(records.len())
            });
        });
    }

    group.finish();
}

/// Benchmark import site discovery on an already parsed tree
fn bench_import_sites(c: &mut Criterion) {
    let path = Path::new("/bench/src/index.js");
    let source = create_module(1000);
    let mut extractor = ImportExtractor::new().unwrap();
    let parsed = extractor
        .parse(&source, SourceLanguage::JavaScript, path)
        .unwrap();

    c.bench_function("import_sites_1000", |b| {
        b.iter(|| black_box(parsed.import_sites().count()));
    });
}

/// Benchmark specifier to package name resolution
fn bench_package_root(c: &mut Criterion) {
    let specifiers = [
        "lodash",
        "lodash/fp",
        "@babel/core",
        "@babel/core/lib/index.js",
        "./relative",
        "node:fs",
        "fs/promises",
    ];

    c.bench_function("package_root", |b| {
        b.iter(|| {
            specifiers
                .iter()
                .filter_map(|s| package_root(black_box(s)))
                .count()
        });
    });
}

criterion_group!(benches, bench_extract, bench_import_sites, bench_package_root);
criterion_main!(benches);
