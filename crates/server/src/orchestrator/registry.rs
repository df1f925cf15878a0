use std::collections::HashMap;

/// Fixed mapping from logical runtime name to container image. An unknown
/// runtime is a caller error surfaced before anything is staged or launched.
#[derive(Debug, Clone)]
pub struct RuntimeRegistry {
    images: HashMap<String, String>,
}

const DEFAULT_RUNTIMES: &[(&str, &str)] = &[
    ("dotnet8", "benchforge-dotnet8-base"),
    ("python3.12", "benchforge-python3.12-base"),
    ("node20", "benchforge-node20-base"),
];

impl RuntimeRegistry {
    pub fn with_defaults() -> Self {
        Self {
            images: DEFAULT_RUNTIMES
                .iter()
                .map(|(runtime, image)| (runtime.to_string(), image.to_string()))
                .collect(),
        }
    }

    /// Defaults with config-supplied overrides merged on top.
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Self {
        let mut registry = Self::with_defaults();
        for (runtime, image) in overrides {
            registry.images.insert(runtime.clone(), image.clone());
        }
        registry
    }

    pub fn resolve(&self, runtime: &str) -> Option<&str> {
        self.images.get(runtime).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_runtimes_resolve_to_images() {
        let registry = RuntimeRegistry::with_defaults();
        assert_eq!(registry.resolve("node20"), Some("benchforge-node20-base"));
        assert_eq!(registry.resolve("go1.22"), None);
    }

    #[test]
    fn overrides_replace_defaults_and_add_new_entries() {
        let mut overrides = HashMap::new();
        overrides.insert("node20".to_string(), "custom-node".to_string());
        overrides.insert("rust1.79".to_string(), "benchforge-rust-base".to_string());

        let registry = RuntimeRegistry::with_overrides(&overrides);
        assert_eq!(registry.resolve("node20"), Some("custom-node"));
        assert_eq!(registry.resolve("rust1.79"), Some("benchforge-rust-base"));
        assert_eq!(
            registry.resolve("python3.12"),
            Some("benchforge-python3.12-base")
        );
    }
}
