//! Module registry - the static declarative map of modules, sections and items.
//!
//! Built once at startup (from the built-in document or a JSON file),
//! validated, and then shared read-only behind an `Arc`.

mod builtin;

pub use builtin::builtin_document;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::authz::PredicateRegistry;
use crate::errors::RegistryError;
use crate::models::module::ModuleDescriptor;
use crate::models::navigation::{NavigationItem, SectionKind};
use crate::route::{match_path, normalize_path, PathMatch, RouteDetector};

/// Serialized form of a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDocument {
    /// Items outside any module (main, system, documents, communication, reports)
    #[serde(default)]
    pub global_items: Vec<NavigationItem>,
    #[serde(default)]
    pub modules: Vec<ModuleDescriptor>,
}

#[derive(Debug, Clone)]
pub struct ModuleRegistry {
    global_items: Vec<NavigationItem>,
    modules: Vec<ModuleDescriptor>,
    index: BTreeMap<String, usize>,
    detector: RouteDetector,
}

impl ModuleRegistry {
    pub fn new(
        document: RegistryDocument,
        detector: RouteDetector,
        rules: &PredicateRegistry,
    ) -> Result<Self, RegistryError> {
        validate(&document, &detector, rules)?;

        let index = document
            .modules
            .iter()
            .enumerate()
            .map(|(position, module)| (module.key.clone(), position))
            .collect();

        Ok(Self {
            global_items: document.global_items,
            modules: document.modules,
            index,
            detector,
        })
    }

    /// The registry shipped with the crate, laid out under the detector's
    /// module segment.
    pub fn builtin(detector: RouteDetector, rules: &PredicateRegistry) -> Result<Self, RegistryError> {
        let document = builtin_document(detector.segment());
        Self::new(document, detector, rules)
    }

    pub fn from_json_str(
        json: &str,
        detector: RouteDetector,
        rules: &PredicateRegistry,
    ) -> Result<Self, RegistryError> {
        let deserializer = &mut serde_json::Deserializer::from_str(json);
        let document: RegistryDocument =
            serde_path_to_error::deserialize(deserializer).map_err(|err| RegistryError::Parse {
                path: err.path().to_string(),
                source: err.into_inner(),
            })?;
        Self::new(document, detector, rules)
    }

    pub fn load(path: &Path, detector: RouteDetector, rules: &PredicateRegistry) -> Result<Self, RegistryError> {
        let json = std::fs::read_to_string(path)?;
        let registry = Self::from_json_str(&json, detector, rules)?;
        tracing::info!(
            path = %path.display(),
            modules = registry.modules.len(),
            global_items = registry.global_items.len(),
            "module registry loaded"
        );
        Ok(registry)
    }

    pub fn detector(&self) -> &RouteDetector {
        &self.detector
    }

    pub fn global_items(&self) -> &[NavigationItem] {
        &self.global_items
    }

    pub fn modules(&self) -> &[ModuleDescriptor] {
        &self.modules
    }

    pub fn get(&self, key: &str) -> Option<&ModuleDescriptor> {
        self.index.get(key).map(|position| &self.modules[*position])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Registered module owning `path`, if the path is inside a module namespace.
    pub fn detect_module(&self, path: &str) -> Option<&ModuleDescriptor> {
        let segment = self.detector.module_segment(path)?;
        let module = self.get(&segment);
        if module.is_none() {
            tracing::debug!(path = %path, segment = %segment, "route names an unregistered module");
        }
        module
    }

    /// Every item the registry declares: global items, module entries and
    /// module sidebar items.
    pub fn all_items(&self) -> Vec<NavigationItem> {
        let mut items = self.global_items.clone();
        for module in &self.modules {
            items.push(module.entry_item());
            items.extend(module.items().cloned());
        }
        items
    }

    pub fn to_document(&self) -> RegistryDocument {
        RegistryDocument {
            global_items: self.global_items.clone(),
            modules: self.modules.clone(),
        }
    }
}

fn validate(
    document: &RegistryDocument,
    detector: &RouteDetector,
    rules: &PredicateRegistry,
) -> Result<(), RegistryError> {
    let mut global_paths: BTreeMap<SectionKind, BTreeSet<String>> = BTreeMap::new();
    for item in &document.global_items {
        validate_item(item, rules)?;
        if item.section == SectionKind::Modules {
            return Err(RegistryError::ReservedSection(item.path.clone()));
        }
        if !global_paths
            .entry(item.section)
            .or_default()
            .insert(normalize_path(&item.path))
        {
            return Err(RegistryError::DuplicatePath {
                section: item.section.to_string(),
                path: item.path.clone(),
            });
        }
    }

    let mut keys = BTreeSet::new();
    for module in &document.modules {
        if !is_slug(&module.key) {
            return Err(RegistryError::InvalidKey(module.key.clone()));
        }
        if !keys.insert(module.key.as_str()) {
            return Err(RegistryError::DuplicateKey(module.key.clone()));
        }
        if !module.base_path.starts_with('/')
            || detector.module_segment(&module.base_path).as_deref() != Some(module.key.as_str())
        {
            return Err(RegistryError::BasePathMismatch {
                key: module.key.clone(),
                base_path: module.base_path.clone(),
            });
        }

        for section in &module.sections {
            if section.title.trim().is_empty() {
                return Err(RegistryError::EmptySectionTitle(module.key.clone()));
            }
            let mut paths = BTreeSet::new();
            for item in &section.items {
                validate_item(item, rules)?;
                if match_path(&module.base_path, &item.path) == PathMatch::None {
                    return Err(RegistryError::OutsideBasePath {
                        module: module.key.clone(),
                        path: item.path.clone(),
                    });
                }
                if !paths.insert(normalize_path(&item.path)) {
                    return Err(RegistryError::DuplicatePath {
                        section: format!("{}/{}", module.key, section.title),
                        path: item.path.clone(),
                    });
                }
            }
        }
    }

    Ok(())
}

fn validate_item(item: &NavigationItem, rules: &PredicateRegistry) -> Result<(), RegistryError> {
    if !item.path.starts_with('/') {
        return Err(RegistryError::InvalidPath(item.path.clone()));
    }
    if let Some(predicate) = &item.hidden {
        if let Some(name) = predicate.named_rules().into_iter().find(|name| !rules.contains(name)) {
            return Err(RegistryError::UnknownPredicate {
                path: item.path.clone(),
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

fn is_slug(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('-')
        && !key.ends_with('-')
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
