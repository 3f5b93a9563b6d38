//! Nested loads, diamonds, and instance overrides.

use crate::common::{dom_of, has_errors, link_triples, memory_loader, memory_path, template_id};
use anyhow::Result;
use prefab_loader::registry::{LinkId, TemplateRegistry};
use prefab_loader::test_utils::{PrefabFixture, TestProject};
use serde_json::json;

#[test]
fn test_trivial_load_from_disk() -> Result<()> {
    let project = TestProject::new()?;
    project.write_prefab("a.prefab", &json!({"entities": {}}))?;

    let loader = project.loader();
    let mut registry = TemplateRegistry::new();
    let id = loader.load_from_path(&mut registry, "a.prefab")?;

    let template = registry.find(id).expect("template registered");
    assert_eq!(template.file_path(), "a.prefab");
    assert_eq!(template.dom()["source"], "a.prefab");
    assert!(!template.is_loaded_with_errors());
    assert_eq!(registry.template_count(), 1);
    assert_eq!(registry.link_count(), 0);
    registry.check_invariants()?;
    Ok(())
}

#[test]
fn test_nested_load_links_child_into_parent() -> Result<()> {
    let loader = memory_loader(&PrefabFixture::nested());
    let mut registry = TemplateRegistry::new();

    let parent = loader.load_from_path(&mut registry, "parent.prefab")?;
    let child = template_id(&registry, "child.prefab")?;
    assert_ne!(parent, child);
    assert_eq!(registry.template_count(), 2);
    assert_eq!(
        link_triples(&registry),
        vec![(
            "child.prefab".to_string(),
            "parent.prefab".to_string(),
            "/instances/child_0".to_string()
        )]
    );

    let instance = &dom_of(&registry, "parent.prefab")?["instances"]["child_0"];
    assert_eq!(instance["source"], "child.prefab");
    assert_eq!(instance["link_id"], 1);
    assert_eq!(instance["entities"]["E1"]["name"], "Lamp");
    assert_eq!(instance["entities"]["E1"]["active"], true);

    let parent_template = registry.find(parent).expect("parent registered");
    assert!(parent_template.link_ids().contains(&LinkId::new(1)));
    assert!(!has_errors(&registry, "parent.prefab")?);
    assert!(!has_errors(&registry, "child.prefab")?);
    registry.check_invariants()?;
    Ok(())
}

#[test]
fn test_diamond_reads_shared_child_once() -> Result<()> {
    let loader = memory_loader(&PrefabFixture::diamond());
    let mut registry = TemplateRegistry::new();

    loader.load_from_path(&mut registry, "top.prefab")?;
    assert_eq!(registry.template_count(), 4);
    assert_eq!(registry.link_count(), 4);
    assert_eq!(loader.store().read_count(memory_path("leaf.prefab")), 1);
    assert_eq!(loader.store().total_reads(), 4);

    let links = link_triples(&registry);
    let leaf_links = links.iter().filter(|(source, _, _)| source == "leaf.prefab").count();
    assert_eq!(leaf_links, 2);

    // link ids follow document order: left subtree first
    let expected_first = ("leaf.prefab", "left.prefab", "/instances/leaf");
    let expected_second = ("left.prefab", "top.prefab", "/instances/left");
    fn as_strs((a, b, c): &(String, String, String)) -> (&str, &str, &str) {
        (a.as_str(), b.as_str(), c.as_str())
    }
    assert_eq!(as_strs(&links[0]), expected_first);
    assert_eq!(as_strs(&links[1]), expected_second);

    let top = dom_of(&registry, "top.prefab")?;
    assert_eq!(top["instances"]["right"]["instances"]["leaf"]["entities"]["E1"]["name"], "Leaf");
    registry.check_invariants()?;
    Ok(())
}

#[test]
fn test_reload_returns_cached_template() -> Result<()> {
    let loader = memory_loader(&PrefabFixture::nested());
    let mut registry = TemplateRegistry::new();

    let first = loader.load_from_path(&mut registry, "parent.prefab")?;
    let second = loader.load_from_path(&mut registry, "/project/parent.prefab")?;
    assert_eq!(first, second);
    assert_eq!(loader.store().total_reads(), 2);

    // a separately loaded child is also served from the registry
    let child = loader.load_from_path(&mut registry, "child.prefab")?;
    assert_eq!(child, template_id(&registry, "child.prefab")?);
    assert_eq!(loader.store().read_count(memory_path("child.prefab")), 1);
    Ok(())
}

#[test]
fn test_patches_are_applied_to_expanded_instance() -> Result<()> {
    let fixture = PrefabFixture::new("patched")
        .with_document(
            "parent.prefab",
            json!({"instances": {"door": {
                "source": "door.prefab",
                "patches": [
                    {"op": "replace", "path": "/entities/E1/active", "value": false},
                    {"op": "add", "path": "/entities/E1/components/Light", "value": {"intensity": 3}}
                ]
            }}}),
        )
        .with_document("door.prefab", json!({"entities": {"E1": {"name": "Door"}}}));
    let loader = memory_loader(&fixture);
    let mut registry = TemplateRegistry::new();

    loader.load_from_path(&mut registry, "parent.prefab")?;
    let door = &dom_of(&registry, "parent.prefab")?["instances"]["door"];
    assert_eq!(door["entities"]["E1"]["active"], false);
    assert_eq!(door["entities"]["E1"]["components"]["Light"]["intensity"], 3);
    assert_eq!(dom_of(&registry, "door.prefab")?["entities"]["E1"]["active"], true);
    assert!(door.get("patches").is_none());

    let link = registry.links_to(template_id(&registry, "parent.prefab")?)[0];
    assert_eq!(link.patches().as_array().map(Vec::len), Some(2));
    Ok(())
}

#[test]
fn test_nested_documents_in_subdirectories() -> Result<()> {
    let project = TestProject::new()?;
    project.write_prefab(
        "levels/town.prefab",
        &json!({"instances": {"door_1": {"source": "props/door.prefab"}}}),
    )?;
    project.write_prefab("props/door.prefab", &json!({"entities": {"E1": {"name": "Door"}}}))?;

    let loader = project.loader();
    let mut registry = TemplateRegistry::new();
    let town = loader.load_from_path(&mut registry, project.path("levels/town.prefab"))?;

    assert_eq!(registry.find(town).map(|t| t.file_path()), Some("levels/town.prefab"));
    assert!(registry.find_by_path("props/door.prefab").is_some());
    assert!(!has_errors(&registry, "levels/town.prefab")?);
    Ok(())
}

#[test]
fn test_load_from_bytes_reads_children_from_store() -> Result<()> {
    let loader = memory_loader(&PrefabFixture::nested());
    let mut registry = TemplateRegistry::new();

    let bytes = br#"{"instances": {"lamp": {"source": "child.prefab"}}}"#;
    let id = loader.load_from_bytes(&mut registry, bytes, "scratch.prefab")?;

    assert_eq!(registry.find(id).map(|t| t.file_path()), Some("scratch.prefab"));
    assert_eq!(loader.store().read_count(memory_path("scratch.prefab")), 0);
    assert_eq!(loader.store().read_count(memory_path("child.prefab")), 1);
    assert_eq!(registry.link_count(), 1);
    Ok(())
}
