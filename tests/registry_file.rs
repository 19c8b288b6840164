use std::fs;

use anyhow::Result;
use serde_json::json;
use tempfile::tempdir;

use erp_nav::app::build_composer;
use erp_nav::authz::{PredicateRegistry, User};
use erp_nav::errors::{AppError, RegistryError};
use erp_nav::models::navigation::SectionKind;
use erp_nav::registry::{builtin_document, ModuleRegistry};
use erp_nav::route::RouteDetector;
use erp_nav::NavConfig;

fn registry_json() -> serde_json::Value {
    json!({
        "global_items": [
            {"label": "Inbox", "icon": "inbox", "path": "/dashboard/inbox", "section": "communication"},
            {
                "label": "Plant Reports",
                "icon": "bar-chart",
                "path": "/dashboard/reports/plant",
                "section": "reports",
                "required": {"min_level": 500, "department": "Operations"}
            }
        ],
        "modules": [{
            "key": "maintenance",
            "label": "Maintenance",
            "icon": "settings",
            "base_path": "/dashboard/apps/maintenance",
            "required": {"min_level": 200},
            "sections": [{
                "title": "Work Orders",
                "items": [
                    {"label": "Open", "path": "/dashboard/apps/maintenance"},
                    {
                        "label": "Schedule",
                        "path": "/dashboard/apps/maintenance/schedule",
                        "required": {"min_level": 400},
                        "hidden": {"op": "named", "name": "read_only"}
                    }
                ]
            }]
        }]
    })
}

#[test]
fn loads_registry_from_file_with_custom_segment() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("registry.json");
    fs::write(&path, serde_json::to_vec_pretty(&registry_json())?)?;

    let config = NavConfig {
        registry_path: Some(path),
        module_segment: "apps".into(),
        ..NavConfig::default()
    };
    let composer = build_composer(&config)?;

    let registry = composer.registry();
    assert_eq!(registry.modules().len(), 1);
    assert_eq!(
        registry.detect_module("/dashboard/apps/maintenance/schedule").map(|m| m.key.as_str()),
        Some("maintenance")
    );

    let nav = composer.resolve(&User::new(500).with_department("Operations"), None);
    let reports = nav.section(SectionKind::Reports).expect("reports section");
    assert_eq!(reports.items[0].label, "Plant Reports");
    assert!(nav.contains_path("/dashboard/apps/maintenance"));
    Ok(())
}

#[test]
fn parse_errors_point_at_the_offending_field() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("registry.json");
    let mut doc = registry_json();
    doc["modules"][0]["sections"][0]["items"][1]["required"]["min_level"] = json!("high");
    fs::write(&path, serde_json::to_vec(&doc)?)?;

    let err = ModuleRegistry::load(&path, RouteDetector::new("apps"), &PredicateRegistry::with_builtin()).unwrap_err();
    match err {
        RegistryError::Parse { path, .. } => {
            assert_eq!(path, "modules[0].sections[0].items[1].required.min_level")
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[test]
fn wrong_segment_is_a_base_path_mismatch() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("registry.json");
    fs::write(&path, serde_json::to_vec(&registry_json())?)?;

    let config = NavConfig {
        registry_path: Some(path),
        ..NavConfig::default()
    };
    let err = build_composer(&config).unwrap_err();
    assert!(matches!(err, AppError::Registry(RegistryError::BasePathMismatch { .. })));
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() {
    let err = ModuleRegistry::load(
        std::path::Path::new("/nonexistent/registry.json"),
        RouteDetector::default(),
        &PredicateRegistry::with_builtin(),
    )
    .unwrap_err();
    assert!(matches!(err, RegistryError::Io(_)));
}

#[test]
fn builtin_document_survives_a_json_round_trip() -> Result<()> {
    let rules = PredicateRegistry::with_builtin();
    let json = serde_json::to_string(&builtin_document("modules"))?;

    let registry = ModuleRegistry::from_json_str(&json, RouteDetector::default(), &rules)?;
    let builtin = ModuleRegistry::builtin(RouteDetector::default(), &rules)?;
    assert_eq!(registry.to_document(), builtin.to_document());
    Ok(())
}
