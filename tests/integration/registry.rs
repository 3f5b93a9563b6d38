//! Registry behavior observed through loads.

use crate::common::{memory_loader, template_id};
use anyhow::Result;
use prefab_loader::registry::{
    EventRecorder, LinkId, RegistryError, RegistryEvent, TemplateId, TemplateRegistry,
};
use prefab_loader::test_utils::PrefabFixture;

#[test]
fn test_observer_sees_load_in_order() -> Result<()> {
    let loader = memory_loader(&PrefabFixture::nested());
    let mut registry = TemplateRegistry::new();
    let recorder = EventRecorder::new();
    registry.add_observer(Box::new(recorder.clone()));

    loader.load_from_path(&mut registry, "parent.prefab")?;
    assert_eq!(
        recorder.events(),
        vec![
            RegistryEvent::TemplateAdded(TemplateId::new(1)),
            RegistryEvent::TemplateAdded(TemplateId::new(2)),
            RegistryEvent::LinkAdded(LinkId::new(1)),
        ]
    );
    Ok(())
}

#[test]
fn test_observer_sees_error_flags() -> Result<()> {
    let loader = memory_loader(&PrefabFixture::cycle());
    let mut registry = TemplateRegistry::new();
    let recorder = EventRecorder::new();
    registry.add_observer(Box::new(recorder.clone()));

    loader.load_from_path(&mut registry, "a.prefab")?;
    let flagged: Vec<_> = recorder
        .events()
        .into_iter()
        .filter_map(|event| match event {
            RegistryEvent::LoadedWithErrorsChanged(id, true) => Some(id),
            _ => None,
        })
        .collect();
    // b finishes first
    assert_eq!(flagged, vec![TemplateId::new(2), TemplateId::new(1)]);
    Ok(())
}

#[test]
fn test_invariants_hold_after_every_scenario() -> Result<()> {
    let fixtures = [
        (PrefabFixture::nested(), "parent.prefab"),
        (PrefabFixture::cycle(), "a.prefab"),
        (PrefabFixture::diamond(), "top.prefab"),
        (PrefabFixture::broken_child(), "parent.prefab"),
    ];
    for (fixture, entry) in fixtures {
        let loader = memory_loader(&fixture);
        let mut registry = TemplateRegistry::new();
        loader.load_from_path(&mut registry, entry)?;
        registry.check_invariants()?;

        let order = registry.dependency_order()?;
        assert_eq!(order.len(), registry.template_count(), "{}", fixture.name);
    }
    Ok(())
}

#[test]
fn test_manual_link_cannot_close_cycle() -> Result<()> {
    let loader = memory_loader(&PrefabFixture::nested());
    let mut registry = TemplateRegistry::new();
    loader.load_from_path(&mut registry, "parent.prefab")?;
    let parent = template_id(&registry, "parent.prefab")?;
    let child = template_id(&registry, "child.prefab")?;

    // the child has no instance to link into, and the edge would close a cycle anyway
    let err = registry.add_link(parent, child, "/instances/child_0", None).unwrap_err();
    assert!(matches!(err, RegistryError::WouldCreateCycle { .. }), "{err}");
    assert_eq!(registry.link_count(), 1);
    registry.check_invariants()?;
    Ok(())
}

#[test]
fn test_evicting_diamond_leaf() -> Result<()> {
    let loader = memory_loader(&PrefabFixture::diamond());
    let mut registry = TemplateRegistry::new();
    loader.load_from_path(&mut registry, "top.prefab")?;

    let leaf = template_id(&registry, "leaf.prefab")?;
    registry.remove_template(leaf)?;
    assert_eq!(registry.template_count(), 3);
    assert_eq!(registry.link_count(), 2);
    for path in ["left.prefab", "right.prefab"] {
        let id = template_id(&registry, path)?;
        assert!(registry.find(id).is_some_and(|template| template.is_dirty()));
    }
    assert!(!registry.find(template_id(&registry, "top.prefab")?).is_some_and(|t| t.is_dirty()));
    registry.check_invariants()?;
    Ok(())
}
