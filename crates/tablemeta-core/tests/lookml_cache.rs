//! End-to-end tests: LookML file → cache file → fresh client

use std::path::Path;

use tablemeta_core::{DatasetId, LookmlExtractor, MetadataClient};

const MODEL: &str = r#"
view: orders {
  sql_table_name: `proj.ds.orders` ;;
  label: "Orders"
  description: "One row per order"

  dimension: id {
    primary_key: yes
    type: number
    sql: ${TABLE}.id ;;
  }

  dimension: customer_id {
    type: number
    sql: ${TABLE}.customer_id ;;
  }

  measure: total {
    type: sum
    label: "Order Total"
    sql: ${TABLE}.total_amount ;;
  }
}

view: customers {
  dimension: email {
    primary_key: Yes
    description: "Login email"
  }
}
"#;

fn write_model(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("model.lkml");
    std::fs::write(&path, MODEL).unwrap();
    path
}

#[test]
fn test_build_then_read_back_with_fresh_client() {
    let dir = tempfile::tempdir().unwrap();
    let lookml = write_model(dir.path());
    let cache = dir.path().join("cache").join("proj__ds.json");
    let dataset = DatasetId::new("proj", "ds");

    let builder = LookmlExtractor::new(&lookml).into_builder(dataset.clone(), Some(cache.clone()));
    let built = builder.get_metadata().unwrap().clone();

    assert_eq!(built.len(), 2);
    let orders = &built["orders"];
    assert_eq!(orders.source_label, "Orders");
    assert_eq!(orders.description, "One row per order");
    assert_eq!(orders.columns.len(), 3);
    assert!(!orders.columns["id"].is_nullable);
    assert_eq!(orders.columns["total_amount"].field_label, "Order Total");
    assert!(!built["customers"].columns["email"].is_nullable);

    let client = MetadataClient::new(dataset, Some(cache));
    assert_eq!(client.get_metadata().unwrap(), &built);
}

#[test]
fn test_existing_cache_wins_over_source() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("proj__ds.json");
    std::fs::write(&cache, r#"{"prebuilt": {"columns": {}}}"#).unwrap();

    // Source file does not exist, but the cache does
    let builder = LookmlExtractor::new(dir.path().join("missing.lkml"))
        .into_builder(DatasetId::new("proj", "ds"), Some(cache));

    let record = builder.get_metadata().unwrap();
    assert_eq!(record.keys().collect::<Vec<_>>(), vec!["prebuilt"]);
}

#[test]
fn test_missing_source_and_cache_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("proj__ds.json");

    let builder = LookmlExtractor::new(dir.path().join("missing.lkml"))
        .into_builder(DatasetId::new("proj", "ds"), Some(cache.clone()));

    let err = builder.get_metadata().unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("missing.lkml"));
    assert!(!cache.exists());
}

#[test]
fn test_malformed_lookml_writes_no_cache() {
    let dir = tempfile::tempdir().unwrap();
    let lookml = dir.path().join("broken.lkml");
    std::fs::write(&lookml, "view: orders {\n  dimension: id {\n").unwrap();
    let cache = dir.path().join("proj__ds.json");

    let builder =
        LookmlExtractor::new(&lookml).into_builder(DatasetId::new("proj", "ds"), Some(cache.clone()));

    let err = builder.get_metadata().unwrap_err();
    assert!(!err.is_not_found());
    assert!(!cache.exists());
}

#[test]
fn test_extra_descriptions_written_to_cache() {
    let dir = tempfile::tempdir().unwrap();
    let lookml = write_model(dir.path());
    let overlay = dir.path().join("extra.json");
    std::fs::write(&overlay, r#"{"orders": {"customer_id": "FK to customers"}}"#).unwrap();
    let cache = dir.path().join("proj__ds.json");

    LookmlExtractor::new(&lookml)
        .with_extra_descriptions(&overlay)
        .into_builder(DatasetId::new("proj", "ds"), Some(cache.clone()))
        .get_metadata()
        .unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&cache).unwrap()).unwrap();
    assert_eq!(
        raw["orders"]["columns"]["customer_id"]["extra_description"],
        "FK to customers"
    );
    assert!(raw["orders"]["columns"]["id"].get("extra_description").is_none());
}
