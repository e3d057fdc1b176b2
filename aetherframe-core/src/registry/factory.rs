// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The compiled-in factory table: maps a manifest id to the code that
//! instantiates it. This is how "loading plugin code" works in a
//! from-scratch rewrite — the manifest on disk stays the source of truth
//! for id/capabilities/dependencies.

use std::collections::HashMap;

use aetherframe_domain::plugin::{PluginFactory, PluginManifest};
use aetherframe_domain::value_objects::PluginKind;

use crate::plugins::builtin::{Aegis, Laintrace, Mnemosyne, Noema, Scribe, Umbriel, Valkyrie};

pub fn builtin_factories() -> HashMap<String, PluginFactory> {
    let mut factories: HashMap<String, PluginFactory> = HashMap::new();
    factories.insert("umbriel".to_string(), (|c| Box::new(Umbriel::new(c))) as PluginFactory);
    factories.insert("aegis".to_string(), (|c| Box::new(Aegis::new(c))) as PluginFactory);
    factories.insert("noema".to_string(), (|c| Box::new(Noema::new(c))) as PluginFactory);
    factories.insert("valkyrie".to_string(), (|c| Box::new(Valkyrie::new(c))) as PluginFactory);
    factories.insert("laintrace".to_string(), (|c| Box::new(Laintrace::new(c))) as PluginFactory);
    factories.insert("mnemosyne".to_string(), (|c| Box::new(Mnemosyne::new(c))) as PluginFactory);
    factories.insert("scribe".to_string(), (|c| Box::new(Scribe::new(c))) as PluginFactory);
    factories
}

fn manifest(id: &str, kind: PluginKind, capabilities: &[&str]) -> PluginManifest {
    PluginManifest {
        id: id.to_string(),
        name: id.to_string(),
        version: "1.0.0".to_string(),
        kind,
        capabilities: capabilities.iter().map(|s| s.to_string()).collect(),
        description: None,
        author: None,
        inputs: vec![],
        outputs: vec![],
        dependencies: vec![],
        config_schema: serde_json::Value::Null,
    }
}

pub fn builtin_manifests() -> Vec<PluginManifest> {
    vec![
        manifest("umbriel", PluginKind::Detector, &["anti_analysis.scan"]),
        manifest("aegis", PluginKind::Analyzer, &["static.analyze"]),
        manifest("noema", PluginKind::Inferencer, &["intent.infer"]),
        manifest("valkyrie", PluginKind::Differ, &["binary_diff.compare"]),
        manifest("laintrace", PluginKind::Tracer, &["dynamic.trace"]),
        manifest("mnemosyne", PluginKind::Reconstructor, &["state.reconstruct"]),
        manifest("scribe", PluginKind::Reporter, &["report.generate"]),
    ]
}
