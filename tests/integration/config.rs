//! Configuration files and filesystem-backed loaders.

use anyhow::Result;
use prefab_loader::config::LoaderConfig;
use prefab_loader::loader::PrefabLoader;
use prefab_loader::registry::TemplateRegistry;
use prefab_loader::test_utils::TestProject;
use serde_json::json;

#[test]
fn test_loader_from_config_file() -> Result<()> {
    let project = TestProject::new()?;
    project.write_prefab("a.prefab", &json!({"instances": {"b": {"source": "b.prefab"}}}))?;
    project.write_prefab("b.prefab", &json!({}))?;
    let config_path = project.write_raw("loader.toml", "project_root = \".\"\nmax_depth = 1\n")?;

    let config = LoaderConfig::load_from(&config_path)?;
    assert_eq!(config.max_depth, 1);
    let loader = PrefabLoader::from_config(config);
    let mut registry = TemplateRegistry::new();

    let a = loader.load_from_path(&mut registry, "a.prefab")?;
    assert!(registry.find(a).is_some_and(|template| template.is_loaded_with_errors()));
    assert_eq!(registry.find_by_path("b.prefab"), None);
    Ok(())
}

#[test]
fn test_scan_roots_resolve_documents_outside_project() -> Result<()> {
    let project = TestProject::new()?;
    let gem_root = project.temp_dir.path().join("gems").join("props");
    std::fs::create_dir_all(&gem_root)?;
    std::fs::write(gem_root.join("lamp.prefab"), r#"{"entities": {"L": {"name": "Lamp"}}}"#)?;
    project.write_prefab("town.prefab", &json!({"instances": {"lamp": {"source": "lamp.prefab"}}}))?;

    let config = project.config().with_scan_roots([project.project_dir.clone(), gem_root.clone()]);
    let loader = PrefabLoader::from_config(config);
    let mut registry = TemplateRegistry::new();

    let town = loader.load_from_path(&mut registry, project.path("town.prefab"))?;
    assert!(!registry.find(town).is_some_and(|template| template.is_loaded_with_errors()));
    assert!(registry.find_by_path("lamp.prefab").is_some());

    // absolute paths under a secondary root canonicalize relative to that root
    let lamp = loader.load_from_path(&mut registry, gem_root.join("lamp.prefab"))?;
    assert_eq!(registry.find(lamp).map(|template| template.file_path()), Some("lamp.prefab"));
    Ok(())
}
