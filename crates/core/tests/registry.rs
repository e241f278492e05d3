// Unit tests for ProcessorRegistry
mod common;

use cdtransport_core::pipeline::ProcessorRegistry;
use common::MarkerStage;

#[test]
fn test_registry_new() {
    let registry = ProcessorRegistry::new();
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);
}

#[test]
fn test_registry_register_and_create() {
    let mut registry = ProcessorRegistry::new();

    registry.register("marker", || Box::new(MarkerStage { marker: b'x' }));

    assert!(registry.contains("marker"));
    assert_eq!(registry.len(), 1);

    let stage = registry.create("marker");
    assert!(stage.is_some());
    assert_eq!(stage.unwrap().name(), "Marker-x");
}

#[test]
fn test_registry_create_nonexistent() {
    let registry = ProcessorRegistry::new();
    let stage = registry.create("nonexistent");
    assert!(stage.is_none());
}

#[test]
fn test_registry_lists_sorted_names() {
    let mut registry = ProcessorRegistry::new();

    registry.register("upload", || Box::new(MarkerStage { marker: b'u' }));
    registry.register("download", || Box::new(MarkerStage { marker: b'd' }));

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.list_processors(), vec!["download", "upload"]);
}
