//! Thin output, round trips, and bulk saves.

use crate::common::{dom_of, memory_loader, memory_path, template_id};
use anyhow::Result;
use prefab_loader::core::PrefabErrorKind;
use prefab_loader::loader::saver::without_source;
use prefab_loader::registry::TemplateRegistry;
use prefab_loader::test_utils::{PrefabFixture, TestProject};
use serde_json::{Value, json};

fn patched_fixture() -> PrefabFixture {
    PrefabFixture::new("patched")
        .with_document(
            "levels/town.prefab",
            json!({
                "entities": {"E1": {"name": "Square", "transform": {"scale": 2.0}}},
                "instances": {
                    "door_1": {
                        "source": "props/door.prefab",
                        "patches": [{"op": "replace", "path": "/entities/D1/name", "value": "Gate"}]
                    },
                    "door_2": {"source": "props/door.prefab"}
                },
                "description": "market day"
            }),
        )
        .with_document("props/door.prefab", json!({"entities": {"D1": {"name": "Door"}}}))
}

#[test]
fn test_save_strips_root_source() -> Result<()> {
    let loader = memory_loader(&PrefabFixture::new("single").with_document("a.prefab", json!({"entities": {}})));
    let mut registry = TemplateRegistry::new();
    let id = loader.load_from_path(&mut registry, "a.prefab")?;

    let text = loader.save_to_string(&registry, id)?;
    let saved: Value = serde_json::from_str(&text)?;
    assert!(saved.get("source").is_none());
    assert_eq!(saved, json!({}));
    Ok(())
}

#[test]
fn test_nested_instances_collapse_to_references() -> Result<()> {
    let loader = memory_loader(&patched_fixture());
    let mut registry = TemplateRegistry::new();
    let town = loader.load_from_path(&mut registry, "levels/town.prefab")?;

    let saved: Value = serde_json::from_str(&loader.save_to_string(&registry, town)?)?;
    assert_eq!(
        saved,
        json!({
            "entities": {"E1": {"name": "Square", "transform": {"scale": 2.0}}},
            "instances": {
                "door_1": {
                    "source": "props/door.prefab",
                    "patches": [{"op": "replace", "path": "/entities/D1/name", "value": "Gate"}]
                },
                "door_2": {"source": "props/door.prefab"}
            },
            "description": "market day"
        })
    );
    Ok(())
}

#[test]
fn test_round_trip_preserves_fat_dom() -> Result<()> {
    let project = TestProject::new()?;
    patched_fixture().write_to(&project.project_dir)?;

    let loader = project.loader();
    let mut registry = TemplateRegistry::new();
    let town = loader.load_from_path(&mut registry, "levels/town.prefab")?;
    let before = without_source(dom_of(&registry, "levels/town.prefab")?);

    loader.save(&mut registry, town)?;
    let on_disk = project.read_prefab("levels/town.prefab")?;
    assert!(on_disk.get("source").is_none());

    let mut fresh = TemplateRegistry::new();
    loader.load_from_path(&mut fresh, "levels/town.prefab")?;
    let after = without_source(dom_of(&fresh, "levels/town.prefab")?);
    assert_eq!(before, after);
    assert_eq!(before["instances"]["door_1"]["entities"]["D1"]["name"], "Gate");
    Ok(())
}

#[test]
fn test_save_is_byte_stable() -> Result<()> {
    let loader = memory_loader(&patched_fixture());
    let mut registry = TemplateRegistry::new();
    let town = loader.load_from_path(&mut registry, "levels/town.prefab")?;

    loader.save(&mut registry, town)?;
    let first = loader.store().get_string(memory_path("levels/town.prefab"));
    loader.save(&mut registry, town)?;
    let second = loader.store().get_string(memory_path("levels/town.prefab"));
    assert!(first.is_some());
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_save_never_touches_nested_templates() -> Result<()> {
    let loader = memory_loader(&patched_fixture());
    let mut registry = TemplateRegistry::new();
    let town = loader.load_from_path(&mut registry, "levels/town.prefab")?;
    let door_before = loader.store().get(memory_path("props/door.prefab"));

    loader.save(&mut registry, town)?;
    assert_eq!(loader.store().get(memory_path("props/door.prefab")), door_before);
    Ok(())
}

#[test]
fn test_save_to_checks_location() -> Result<()> {
    let project = TestProject::new()?;
    project.write_prefab("a.prefab", &json!({}))?;
    let loader = project.loader();
    let mut registry = TemplateRegistry::new();
    let id = loader.load_from_path(&mut registry, "a.prefab")?;

    let err = loader.save_to(&mut registry, id, &project.path("b.prefab")).unwrap_err();
    assert_eq!(err.kind(), PrefabErrorKind::PathMismatch);
    assert!(!project.file_exists("b.prefab"));

    registry.set_dirty(id, true)?;
    loader.save_to(&mut registry, id, &project.path("a.prefab"))?;
    assert_eq!(project.read_raw("a.prefab")?, "{}\n");
    assert!(!registry.find(id).expect("registered").is_dirty());
    Ok(())
}

#[test]
fn test_save_all_dirty_in_dependency_order() -> Result<()> {
    let loader = memory_loader(&PrefabFixture::diamond());
    let mut registry = TemplateRegistry::new();
    loader.load_from_path(&mut registry, "top.prefab")?;

    for path in ["top.prefab", "left.prefab", "leaf.prefab"] {
        registry.set_dirty(template_id(&registry, path)?, true)?;
    }
    let saved = loader.save_all_dirty(&mut registry)?;
    let saved_paths: Vec<_> = saved
        .iter()
        .filter_map(|id| registry.find(*id).map(|template| template.file_path().to_string()))
        .collect();
    assert_eq!(saved_paths, vec!["leaf.prefab", "left.prefab", "top.prefab"]);
    assert!(registry.templates().all(|template| !template.is_dirty()));

    assert!(loader.save_all_dirty(&mut registry)?.is_empty());
    Ok(())
}

#[test]
fn test_evicted_child_saves_inline() -> Result<()> {
    let loader = memory_loader(&PrefabFixture::nested());
    let mut registry = TemplateRegistry::new();
    let parent = loader.load_from_path(&mut registry, "parent.prefab")?;

    registry.remove_template(template_id(&registry, "child.prefab")?)?;
    assert!(registry.find(parent).expect("parent kept").is_dirty());

    let saved = loader.save_all_dirty(&mut registry)?;
    assert_eq!(saved, vec![parent]);
    let text = loader.store().get_string(memory_path("parent.prefab")).unwrap_or_default();
    let saved: Value = serde_json::from_str(&text)?;
    assert_eq!(
        saved["instances"]["child_0"],
        json!({"source": "child.prefab", "entities": {"E1": {"name": "Lamp"}}})
    );
    Ok(())
}
