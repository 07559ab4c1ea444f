//! Random catalog manifest generation for benchmarking and testing.
//!
//! Builds documents as [`serde_json::Value`] and pretty-prints them, so the
//! output always parses. Raw duplicate object keys cannot be produced this
//! way; semantic duplicates (configuration keys, input mappings) can.

use rand::prelude::*;
use rand::rngs::StdRng;
use serde_json::{Map, Value, json};

/// Configuration for generating catalog manifests.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Number of products.
    pub num_products: usize,
    /// Maximum flavors per product (at least 1).
    pub max_flavors: usize,
    /// Maximum configuration entries per flavor.
    pub max_configuration: usize,
    /// Percentage of flavors given a duplicated configuration key and a
    /// duplicated input mapping.
    pub duplicate_percent: u32,
    /// Seed for deterministic generation.
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            num_products: 50,
            max_flavors: 3,
            max_configuration: 8,
            duplicate_percent: 10,
            seed: 42,
        }
    }
}

impl GeneratorConfig {
    /// Create a new config with the given number of products.
    pub fn new(num_products: usize) -> Self {
        Self {
            num_products,
            ..Default::default()
        }
    }

    /// Small fixture (~5 products).
    pub fn small() -> Self {
        Self::new(5)
    }

    /// Medium fixture (~50 products).
    pub fn medium() -> Self {
        Self::new(50)
    }

    /// Large fixture (~500 products).
    pub fn large() -> Self {
        Self::new(500)
    }

    /// Extra large fixture (~2000 products).
    pub fn xlarge() -> Self {
        Self::new(2_000)
    }

    /// Generate a document targeting approximately the given byte size.
    ///
    /// Note: Actual size varies with the random shape of each product.
    pub fn target_bytes(bytes: usize) -> Self {
        // Average product is ~2.5KB pretty-printed
        Self::new(bytes.saturating_div(2_500).max(1))
    }

    /// Set the random seed for deterministic generation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the maximum flavors per product.
    pub fn with_max_flavors(mut self, max: usize) -> Self {
        self.max_flavors = max.max(1);
        self
    }

    /// Set the percentage of flavors that carry duplicates.
    pub fn with_duplicate_percent(mut self, percent: u32) -> Self {
        self.duplicate_percent = percent.min(100);
        self
    }
}

/// Vocabulary for generating realistic names.
mod vocabulary {
    pub const PRODUCT_NAMES: &[&str] = &[
        "observability", "storage", "gateway", "search", "identity", "analytics", "billing",
    ];
    pub const FLAVOR_NAMES: &[&str] = &["basic", "standard", "enterprise", "edge", "lite"];
    pub const CONFIG_KEYS: &[&str] = &[
        "region", "replicas", "storage_class", "tls_enabled", "log_level", "namespace",
        "cpu_limit", "memory_limit", "retention_days", "admin_email",
    ];
    pub const DEPENDENCIES: &[&str] = &["cert-manager", "postgres", "redis", "kafka", "vault"];
    pub const INPUTS: &[&str] = &["version", "channel", "release", "tag"];
}

const INSTALL_TYPES: &[&str] = &["fullstack", "extension"];

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items[rng.random_range(0..items.len())]
}

fn configuration(rng: &mut StdRng, max: usize, duplicate: bool) -> Vec<Value> {
    use vocabulary::CONFIG_KEYS;

    let count = rng.random_range(1..=max.max(1)).min(CONFIG_KEYS.len());
    let mut keys: Vec<&str> = CONFIG_KEYS.choose_multiple(rng, count).copied().collect();
    if duplicate {
        keys.push(keys[0]);
    }
    keys.into_iter()
        .map(|key| {
            json!({
                "key": key,
                "type": "string",
                "default_value": format!("{}-{}", key, rng.random_range(0..1000)),
                "required": rng.random_bool(0.5),
            })
        })
        .collect()
}

fn dependency(rng: &mut StdRng, duplicate: bool) -> Value {
    use vocabulary::{DEPENDENCIES, INPUTS};

    let count = rng.random_range(1..=INPUTS.len());
    let mut inputs: Vec<&str> = INPUTS.choose_multiple(rng, count).copied().collect();
    if duplicate {
        inputs.push(inputs[0]);
    }
    let input_mapping: Vec<Value> = inputs
        .into_iter()
        .map(|input| json!({"version_input": input, "product_input": format!("{}_ref", input)}))
        .collect();

    json!({
        "name": pick(rng, DEPENDENCIES),
        "version": format!(">={}.{}", rng.random_range(0..5), rng.random_range(0..20)),
        "input_mapping": input_mapping,
    })
}

fn flavor(rng: &mut StdRng, config: &GeneratorConfig, index: usize) -> Value {
    let duplicate = rng.random_ratio(config.duplicate_percent.min(100), 100);
    let install_type = pick(rng, INSTALL_TYPES);

    let mut flavor = Map::new();
    flavor.insert(
        "name".to_string(),
        Value::from(format!("{}-{}", pick(rng, vocabulary::FLAVOR_NAMES), index)),
    );
    flavor.insert("install_type".to_string(), Value::from(install_type));
    flavor.insert(
        "dependency_version_2".to_string(),
        Value::from(rng.random_bool(0.3)),
    );
    flavor.insert(
        "configuration".to_string(),
        Value::from(configuration(rng, config.max_configuration, duplicate)),
    );
    let dependencies: Vec<Value> = (0..rng.random_range(0..=2))
        .map(|i| dependency(rng, duplicate && i == 0))
        .collect();
    flavor.insert("dependencies".to_string(), Value::from(dependencies));
    Value::Object(flavor)
}

/// Generates a random catalog manifest based on configuration.
pub fn generate_value(config: &GeneratorConfig) -> Value {
    let mut rng = StdRng::seed_from_u64(config.seed);

    let products: Vec<Value> = (0..config.num_products)
        .map(|i| {
            let num_flavors = rng.random_range(1..=config.max_flavors.max(1));
            let flavors: Vec<Value> = (0..num_flavors)
                .map(|j| flavor(&mut rng, config, j))
                .collect();
            json!({
                "id": format!("{}-{}", pick(&mut rng, vocabulary::PRODUCT_NAMES), i),
                "label": format!("Product {}", i),
                "flavors": flavors,
            })
        })
        .collect();

    json!({ "products": products })
}

/// Generates a catalog manifest as pretty-printed JSON text.
pub fn generate(config: &GeneratorConfig) -> String {
    // Serializing a Value cannot fail.
    serde_json::to_string_pretty(&generate_value(config)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::CatalogDocument;
    use crate::engine::ValidationEngine;
    use crate::validate::ErrorCode;

    #[test]
    fn generated_text_parses() {
        let content = generate(&GeneratorConfig::small());
        let document = CatalogDocument::parse(content.as_str()).unwrap();
        let products = document.value()["products"].as_array().unwrap();
        assert_eq!(products.len(), 5);
    }

    #[test]
    fn large_document_parses() {
        let content = generate(&GeneratorConfig::large());
        assert!(CatalogDocument::parse(content.as_str()).is_ok());
    }

    #[test]
    fn deterministic_generation() {
        let config = GeneratorConfig::medium();
        assert_eq!(generate(&config), generate(&config), "Same seed should produce same output");
    }

    #[test]
    fn different_seeds_differ() {
        let content1 = generate(&GeneratorConfig::medium().with_seed(1));
        let content2 = generate(&GeneratorConfig::medium().with_seed(2));
        assert_ne!(content1, content2);
    }

    #[test]
    fn target_bytes_approximate() {
        let content = generate(&GeneratorConfig::target_bytes(200_000));
        // Within 4x of target
        assert!(
            content.len() > 50_000 && content.len() < 800_000,
            "Got {} bytes",
            content.len()
        );
    }

    #[test]
    fn zero_products() {
        let content = generate(&GeneratorConfig::new(0));
        let document = CatalogDocument::parse(content.as_str()).unwrap();
        assert_eq!(document.value()["products"], json!([]));
    }

    #[test]
    fn builder_clamps() {
        let config = GeneratorConfig::default()
            .with_max_flavors(0)
            .with_duplicate_percent(250);
        assert_eq!(config.max_flavors, 1);
        assert_eq!(config.duplicate_percent, 100);
    }

    #[tokio::test]
    async fn duplicate_percent_controls_semantic_duplicates() {
        let engine = ValidationEngine::with_builtin_rules();

        let clean = generate(&GeneratorConfig::small().with_duplicate_percent(0));
        let result = engine.validate(&clean).await;
        assert!(!result.contains_code(&ErrorCode::DUPLICATE_CONFIG_KEY));
        assert!(!result.contains_code(&ErrorCode::DUPLICATE_INPUT_MAPPING));
        assert!(!result.contains_code(&ErrorCode::DUPLICATE_OBJECT_KEY));

        let noisy = generate(&GeneratorConfig::small().with_duplicate_percent(100));
        let result = engine.validate(&noisy).await;
        assert!(result.contains_code(&ErrorCode::DUPLICATE_CONFIG_KEY));
    }
}
