//! Benchmark fixtures - generated at runtime from random catalogs.
//!
//! Fixtures are generated lazily on first access and cached for the
//! duration of the benchmark run. All generation is deterministic.

use catalog_validator_core::generate::{GeneratorConfig, generate};
use std::sync::LazyLock;

// Lazily generated fixtures (deterministic via default seed)
static SMALL: LazyLock<String> = LazyLock::new(|| generate(&GeneratorConfig::small()));
static MEDIUM: LazyLock<String> = LazyLock::new(|| generate(&GeneratorConfig::medium()));
static LARGE: LazyLock<String> = LazyLock::new(|| generate(&GeneratorConfig::large()));
static XLARGE: LazyLock<String> = LazyLock::new(|| generate(&GeneratorConfig::xlarge()));
static MAX_SIZE: LazyLock<String> =
    LazyLock::new(|| generate(&GeneratorConfig::target_bytes(10_000_000)));

/// Standard fixtures for regular benchmarks.
pub fn fixtures() -> &'static [(&'static str, &'static str)] {
    static FIXTURES: LazyLock<Vec<(&'static str, &'static str)>> = LazyLock::new(|| {
        vec![
            ("small", SMALL.as_str()),
            ("medium", MEDIUM.as_str()),
            ("large", LARGE.as_str()),
        ]
    });
    FIXTURES.as_slice()
}

/// Extended fixtures including ~10MB stress documents.
pub fn fixtures_extended() -> &'static [(&'static str, &'static str)] {
    static FIXTURES: LazyLock<Vec<(&'static str, &'static str)>> = LazyLock::new(|| {
        vec![
            ("large", LARGE.as_str()),
            ("xlarge", XLARGE.as_str()),
            ("max_size", MAX_SIZE.as_str()),
        ]
    });
    FIXTURES.as_slice()
}

/// Single flat objects with many distinct keys and one repeated key at the end.
pub fn wide_objects() -> &'static [(usize, String)] {
    static FIXTURES: LazyLock<Vec<(usize, String)>> = LazyLock::new(|| {
        [1_000, 10_000, 50_000]
            .into_iter()
            .map(|keys| {
                let mut members: Vec<String> = (0..keys).map(|i| format!("\"key_{i}\": {i}")).collect();
                members.push("\"key_0\": null".to_string());
                (keys, format!("{{{}}}", members.join(",")))
            })
            .collect()
    });
    FIXTURES.as_slice()
}
