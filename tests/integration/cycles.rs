//! Documents that nest themselves, directly or through other documents.

use crate::common::{has_errors, link_triples, memory_loader, template_id};
use anyhow::Result;
use prefab_loader::registry::TemplateRegistry;
use prefab_loader::test_utils::PrefabFixture;
use serde_json::json;

#[test]
fn test_two_document_cycle_flags_both() -> Result<()> {
    let loader = memory_loader(&PrefabFixture::cycle());
    let mut registry = TemplateRegistry::new();

    let a = loader.load_from_path(&mut registry, "a.prefab")?;
    assert_eq!(template_id(&registry, "a.prefab")?, a);
    assert_eq!(registry.template_count(), 2);
    assert!(has_errors(&registry, "a.prefab")?);
    assert!(has_errors(&registry, "b.prefab")?);

    // only the edge that does not close the cycle exists
    assert_eq!(
        link_triples(&registry),
        vec![("b.prefab".to_string(), "a.prefab".to_string(), "/instances/b".to_string())]
    );
    registry.check_invariants()?;
    Ok(())
}

#[test]
fn test_self_reference() -> Result<()> {
    let fixture = PrefabFixture::new("self")
        .with_document("a.prefab", json!({"instances": {"me": {"source": "a.prefab"}}}));
    let loader = memory_loader(&fixture);
    let mut registry = TemplateRegistry::new();

    loader.load_from_path(&mut registry, "a.prefab")?;
    assert_eq!(registry.template_count(), 1);
    assert_eq!(registry.link_count(), 0);
    assert!(has_errors(&registry, "a.prefab")?);
    registry.check_invariants()?;
    Ok(())
}

#[test]
fn test_three_document_cycle() -> Result<()> {
    let fixture = PrefabFixture::new("ring")
        .with_document("a.prefab", json!({"instances": {"b": {"source": "b.prefab"}}}))
        .with_document("b.prefab", json!({"instances": {"c": {"source": "c.prefab"}}}))
        .with_document("c.prefab", json!({"instances": {"a": {"source": "a.prefab"}}}));
    let loader = memory_loader(&fixture);
    let mut registry = TemplateRegistry::new();

    loader.load_from_path(&mut registry, "a.prefab")?;
    assert_eq!(registry.template_count(), 3);
    assert_eq!(registry.link_count(), 2);
    for path in ["a.prefab", "b.prefab", "c.prefab"] {
        assert!(has_errors(&registry, path)?, "{path} should be flagged");
    }
    assert!(registry.dependency_order().is_ok());
    registry.check_invariants()?;
    Ok(())
}

#[test]
fn test_cycle_does_not_taint_unrelated_loads() -> Result<()> {
    let fixture = PrefabFixture::cycle()
        .with_document("clean.prefab", json!({"instances": {"leaf": {"source": "leaf.prefab"}}}))
        .with_document("leaf.prefab", json!({}));
    let loader = memory_loader(&fixture);
    let mut registry = TemplateRegistry::new();

    loader.load_from_path(&mut registry, "a.prefab")?;
    loader.load_from_path(&mut registry, "clean.prefab")?;
    assert!(!has_errors(&registry, "clean.prefab")?);
    assert!(!has_errors(&registry, "leaf.prefab")?);
    Ok(())
}

#[test]
fn test_cycle_entered_from_outside() -> Result<()> {
    let fixture = PrefabFixture::cycle()
        .with_document("outer.prefab", json!({"instances": {"entry": {"source": "a.prefab"}}}));
    let loader = memory_loader(&fixture);
    let mut registry = TemplateRegistry::new();

    loader.load_from_path(&mut registry, "outer.prefab")?;
    assert_eq!(registry.template_count(), 3);
    assert!(has_errors(&registry, "outer.prefab")?);
    assert_eq!(
        link_triples(&registry),
        vec![
            ("b.prefab".to_string(), "a.prefab".to_string(), "/instances/b".to_string()),
            ("a.prefab".to_string(), "outer.prefab".to_string(), "/instances/entry".to_string()),
        ]
    );
    registry.check_invariants()?;
    Ok(())
}
