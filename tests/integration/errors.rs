//! Top-level failures and partial loads.

use crate::common::{PROJECT_ROOT, has_errors, link_triples, memory_loader, template_id};
use anyhow::Result;
use prefab_loader::core::PrefabErrorKind;
use prefab_loader::registry::TemplateRegistry;
use prefab_loader::test_utils::{PrefabFixture, TestProject};
use serde_json::json;

#[test]
fn test_broken_child_flags_parent() -> Result<()> {
    let project = TestProject::new()?;
    PrefabFixture::broken_child().write_to(&project.project_dir)?;
    project.write_raw("broken.prefab", "{\"entities\": ")?;

    let loader = project.loader();
    let mut registry = TemplateRegistry::new();
    loader.load_from_path(&mut registry, "parent.prefab")?;

    assert!(has_errors(&registry, "parent.prefab")?);
    assert_eq!(registry.find_by_path("broken.prefab"), None);
    assert_eq!(registry.template_count(), 1);
    assert_eq!(registry.link_count(), 0);
    registry.check_invariants()?;
    Ok(())
}

#[test]
fn test_missing_child_flags_parent() -> Result<()> {
    let loader = memory_loader(&PrefabFixture::broken_child());
    let mut registry = TemplateRegistry::new();

    loader.load_from_path(&mut registry, "parent.prefab")?;
    assert!(has_errors(&registry, "parent.prefab")?);
    assert_eq!(registry.template_count(), 1);
    Ok(())
}

#[test]
fn test_errors_propagate_to_every_ancestor() -> Result<()> {
    let fixture = PrefabFixture::new("deep")
        .with_document("a.prefab", json!({"instances": {"b": {"source": "b.prefab"}}}))
        .with_document("b.prefab", json!({"instances": {"gone": {"source": "gone.prefab"}}}));
    let loader = memory_loader(&fixture);
    let mut registry = TemplateRegistry::new();

    loader.load_from_path(&mut registry, "a.prefab")?;
    assert!(has_errors(&registry, "a.prefab")?);
    assert!(has_errors(&registry, "b.prefab")?);
    assert_eq!(link_triples(&registry).len(), 1);
    Ok(())
}

#[test]
fn test_siblings_load_despite_failure() -> Result<()> {
    let fixture = PrefabFixture::new("siblings")
        .with_document(
            "parent.prefab",
            json!({"instances": {
                "missing": {"source": "missing.prefab"},
                "fine": {"source": "fine.prefab"}
            }}),
        )
        .with_document("fine.prefab", json!({}));
    let loader = memory_loader(&fixture);
    let mut registry = TemplateRegistry::new();

    loader.load_from_path(&mut registry, "parent.prefab")?;
    assert!(has_errors(&registry, "parent.prefab")?);
    assert!(!has_errors(&registry, "fine.prefab")?);
    assert_eq!(registry.link_count(), 1);
    Ok(())
}

#[test]
fn test_unappliable_patch_skips_link() -> Result<()> {
    let fixture = PrefabFixture::new("bad_patch")
        .with_document(
            "parent.prefab",
            json!({"instances": {"child_0": {
                "source": "child.prefab",
                "patches": [{"op": "remove", "path": "/entities/Nope"}]
            }}}),
        )
        .with_document("child.prefab", json!({}));
    let loader = memory_loader(&fixture);
    let mut registry = TemplateRegistry::new();

    loader.load_from_path(&mut registry, "parent.prefab")?;
    assert!(has_errors(&registry, "parent.prefab")?);
    assert!(!has_errors(&registry, "child.prefab")?);
    assert_eq!(registry.link_count(), 0);
    registry.check_invariants()?;
    Ok(())
}

#[test]
fn test_top_level_failures() -> Result<()> {
    let loader = memory_loader(&PrefabFixture::new("empty"));
    let mut registry = TemplateRegistry::new();

    let err = loader.load_from_path(&mut registry, "missing.prefab").unwrap_err();
    assert_eq!(err.kind(), PrefabErrorKind::Io);
    assert!(err.to_string().contains("missing.prefab"), "{err}");

    let err = loader.load_from_path(&mut registry, "levels/").unwrap_err();
    assert_eq!(err.kind(), PrefabErrorKind::InvalidPath);

    let err = loader.load_from_path(&mut registry, "bad|name.prefab").unwrap_err();
    assert_eq!(err.kind(), PrefabErrorKind::InvalidPath);

    let err = loader.load_from_bytes(&mut registry, b"[]", "array.prefab").unwrap_err();
    assert_eq!(err.kind(), PrefabErrorKind::Parse);
    assert!(err.to_string().contains("array.prefab"), "{err}");

    assert_eq!(registry.template_count(), 0);
    registry.check_invariants()?;
    Ok(())
}

#[test]
fn test_flagged_template_can_be_evicted_and_reloaded() -> Result<()> {
    let loader = memory_loader(&PrefabFixture::broken_child());
    let mut registry = TemplateRegistry::new();

    let parent = loader.load_from_path(&mut registry, "parent.prefab")?;
    registry.remove_template(parent)?;
    assert_eq!(registry.template_count(), 0);

    loader.store().insert(format!("{PROJECT_ROOT}/broken.prefab"), "{}");
    let reloaded = loader.load_from_path(&mut registry, "parent.prefab")?;
    assert_ne!(reloaded, parent);
    assert!(!has_errors(&registry, "parent.prefab")?);
    assert!(template_id(&registry, "broken.prefab").is_ok());
    Ok(())
}

#[test]
fn test_file_size_limit() -> Result<()> {
    let project = TestProject::new()?;
    project.write_prefab("big.prefab", &json!({"description": "x".repeat(256)}))?;

    let loader = prefab_loader::loader::PrefabLoader::from_config(project.config().with_max_file_size(64));
    let mut registry = TemplateRegistry::new();
    let err = loader.load_from_path(&mut registry, "big.prefab").unwrap_err();
    assert_eq!(err.kind(), PrefabErrorKind::Io);
    assert_eq!(registry.template_count(), 0);
    Ok(())
}
