// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Plugin registry: discovers manifests on disk, validates them,
//! instantiates plugins from a compiled-in factory table, and caches
//! instances by `(plugin_id, config hash)`.

mod factory;

pub use factory::builtin_factories;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use aetherframe_domain::error::{PipelineError, PipelineResult};
use aetherframe_domain::plugin::{AnalyzerPlugin, PluginConfig, PluginFactory, PluginManifest};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

/// A query-able catalogue of instantiable plugins.
///
/// Manifests are the source of truth for id/kind/capabilities/dependencies.
/// A manifest's id resolves to a compiled-in [`PluginFactory`] rather than
/// a dynamically loaded module — "loading plugin code" here means that
/// lookup.
pub struct PluginRegistry {
    manifests: RwLock<HashMap<String, PluginManifest>>,
    factories: HashMap<String, PluginFactory>,
    instances: RwLock<HashMap<(String, String), Arc<dyn AnalyzerPlugin>>>,
}

impl PluginRegistry {
    pub fn new(factories: HashMap<String, PluginFactory>) -> PluginRegistry {
        PluginRegistry {
            manifests: RwLock::new(HashMap::new()),
            factories,
            instances: RwLock::new(HashMap::new()),
        }
    }

    /// A registry pre-populated with the built-in analyzer factories and
    /// their manifests, used when no on-disk plugin bundles are configured.
    pub fn with_builtin_plugins() -> PluginRegistry {
        let registry = PluginRegistry::new(builtin_factories());
        for manifest in factory::builtin_manifests() {
            registry.register_manifest(manifest);
        }
        registry
    }

    pub fn register_manifest(&self, manifest: PluginManifest) {
        self.manifests.write().insert(manifest.id.clone(), manifest);
    }

    /// Scans `plugins_dir` for bundle directories (any name not starting
    /// with `_`) containing a `plugin.yaml`, parses and validates each,
    /// and records valid manifests. Invalid manifests are logged and
    /// skipped, never fatal. Returns the ids discovered.
    pub async fn discover(&self, plugins_dir: &Path) -> PipelineResult<Vec<String>> {
        let mut discovered = Vec::new();

        let mut entries = match tokio::fs::read_dir(plugins_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %plugins_dir.display(), error = %e, "plugins directory unreadable, discovering nothing");
                return Ok(discovered);
            }
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PipelineError::FatalWorker(e.to_string()))?
        {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let dir_name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name,
                None => continue,
            };
            if dir_name.starts_with('_') {
                continue;
            }

            let manifest_path = path.join("plugin.yaml");
            let contents = match tokio::fs::read_to_string(&manifest_path).await {
                Ok(contents) => contents,
                Err(_) => {
                    debug!(bundle = dir_name, "no plugin.yaml found, skipping");
                    continue;
                }
            };

            let manifest: PluginManifest = match serde_yaml::from_str(&contents) {
                Ok(manifest) => manifest,
                Err(e) => {
                    warn!(bundle = dir_name, error = %e, "invalid plugin.yaml, skipping");
                    continue;
                }
            };

            let errors = manifest.validate();
            if !errors.is_empty() {
                warn!(bundle = dir_name, ?errors, "manifest failed validation, skipping");
                continue;
            }

            discovered.push(manifest.id.clone());
            self.register_manifest(manifest);
        }

        info!(count = discovered.len(), "plugin discovery complete");
        Ok(discovered)
    }

    pub fn manifest(&self, plugin_id: &str) -> Option<PluginManifest> {
        self.manifests.read().get(plugin_id).cloned()
    }

    pub fn find_by_capability(&self, cap: &str) -> Vec<String> {
        self.manifests
            .read()
            .values()
            .filter(|m| m.supports_capability(cap))
            .map(|m| m.id.clone())
            .collect()
    }

    /// Returns a plugin instance bound to `(plugin_id, config)`. Two calls
    /// with an equal `config` return the same cached instance.
    pub fn get_instance(&self, plugin_id: &str, config: PluginConfig) -> PipelineResult<Arc<dyn AnalyzerPlugin>> {
        if self.manifests.read().get(plugin_id).is_none() {
            return Err(PipelineError::PluginNotFound(plugin_id.to_string()));
        }

        let cache_key = (plugin_id.to_string(), hash_config(&config));

        if let Some(instance) = self.instances.read().get(&cache_key) {
            return Ok(Arc::clone(instance));
        }

        let factory = self
            .factories
            .get(plugin_id)
            .ok_or_else(|| PipelineError::PluginNotFound(plugin_id.to_string()))?;

        let mut instances = self.instances.write();
        // Re-check after acquiring the write lock: another caller may have
        // raced us to the same cache miss.
        if let Some(instance) = instances.get(&cache_key) {
            return Ok(Arc::clone(instance));
        }

        let instance: Arc<dyn AnalyzerPlugin> = Arc::from(factory(config));
        instances.insert(cache_key, Arc::clone(&instance));
        Ok(instance)
    }

    /// Topologically sorts `plugin_id` and its transitive dependencies,
    /// roots first. Unlike a naive recursive walk, this explicitly detects
    /// cycles via a three-colour depth-first search rather than recursing
    /// forever.
    pub fn resolve_dependencies(&self, plugin_id: &str) -> PipelineResult<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let manifests = self.manifests.read();
        let mut colors: HashMap<String, Color> = HashMap::new();
        let mut order = Vec::new();
        let mut stack: Vec<String> = Vec::new();

        fn visit(
            id: &str,
            manifests: &HashMap<String, PluginManifest>,
            colors: &mut HashMap<String, Color>,
            stack: &mut Vec<String>,
            order: &mut Vec<String>,
        ) -> PipelineResult<()> {
            match colors.get(id).copied().unwrap_or(Color::White) {
                Color::Black => return Ok(()),
                Color::Gray => {
                    let mut cycle: Vec<String> = stack
                        .iter()
                        .skip_while(|s| s.as_str() != id)
                        .cloned()
                        .collect();
                    cycle.push(id.to_string());
                    return Err(PipelineError::DependencyCycle(cycle));
                }
                Color::White => {}
            }

            colors.insert(id.to_string(), Color::Gray);
            stack.push(id.to_string());

            if let Some(manifest) = manifests.get(id) {
                for dep in &manifest.dependencies {
                    visit(dep, manifests, colors, stack, order)?;
                }
            }

            stack.pop();
            colors.insert(id.to_string(), Color::Black);
            order.push(id.to_string());
            Ok(())
        }

        visit(plugin_id, &manifests, &mut colors, &mut stack, &mut order)?;
        Ok(order)
    }
}

fn hash_config(config: &PluginConfig) -> String {
    // Sort keys so two equal maps always hash the same regardless of
    // insertion order.
    let mut entries: Vec<(&String, &serde_json::Value)> = config.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    let mut hasher = Sha256::new();
    for (key, value) in entries {
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.to_string().as_bytes());
        hasher.update(b";");
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aetherframe_domain::value_objects::PluginKind;

    fn manifest(id: &str, deps: Vec<&str>) -> PluginManifest {
        PluginManifest {
            id: id.to_string(),
            name: id.to_string(),
            version: "1.0.0".to_string(),
            kind: PluginKind::Analyzer,
            capabilities: vec!["test.run".to_string()],
            description: None,
            author: None,
            inputs: vec![],
            outputs: vec![],
            dependencies: deps.into_iter().map(String::from).collect(),
            config_schema: serde_json::Value::Null,
        }
    }

    #[test]
    fn resolve_dependencies_orders_roots_first() {
        let registry = PluginRegistry::new(HashMap::new());
        registry.register_manifest(manifest("a", vec!["b", "c"]));
        registry.register_manifest(manifest("b", vec!["c"]));
        registry.register_manifest(manifest("c", vec![]));

        let order = registry.resolve_dependencies("a").unwrap();
        assert_eq!(order, vec!["c", "b", "a"]);
    }

    #[test]
    fn resolve_dependencies_detects_a_cycle() {
        let registry = PluginRegistry::new(HashMap::new());
        registry.register_manifest(manifest("a", vec!["b"]));
        registry.register_manifest(manifest("b", vec!["a"]));

        let result = registry.resolve_dependencies("a");
        assert!(matches!(result, Err(PipelineError::DependencyCycle(_))));
    }

    #[test]
    fn get_instance_with_equal_config_returns_the_same_instance() {
        let registry = PluginRegistry::with_builtin_plugins();
        let a = registry.get_instance("umbriel", PluginConfig::new()).unwrap();
        let b = registry.get_instance("umbriel", PluginConfig::new()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn get_instance_rejects_an_unknown_plugin() {
        let registry = PluginRegistry::new(HashMap::new());
        let result = registry.get_instance("ghost", PluginConfig::new());
        assert!(matches!(result, Err(PipelineError::PluginNotFound(_))));
    }

    #[test]
    fn find_by_capability_matches_declared_capabilities() {
        let registry = PluginRegistry::with_builtin_plugins();
        let ids = registry.find_by_capability("anti_analysis.scan");
        assert!(ids.contains(&"umbriel".to_string()));
    }
}
