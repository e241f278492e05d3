// Integration tests for whole-component transport
mod common;

use cdtransport_core::descriptor::{Access, ComponentDescriptor, RepositoryContext, Resource};
use cdtransport_core::filter::{AccessTypeFilter, AllResources, ResourceTypeFilter};
use cdtransport_core::pipeline::{PipelineBuilder, ProcessorRegistry};
use cdtransport_core::processors::register_processors;
use cdtransport_core::registry::MemoryRegistry;
use cdtransport_core::{ErrorKind, ExecContext, Pipeline, transport_component};
use std::sync::Arc;

const SOURCE_REFERENCE: &str = "registry.example/source/acme/app:1.2.0";

fn relocation(registry: &Arc<MemoryRegistry>) -> Pipeline {
    let mut processors = ProcessorRegistry::new();
    register_processors(
        &mut processors,
        registry.clone(),
        RepositoryContext::new("registry.example/source"),
        RepositoryContext::new("registry.example/acme/"),
    );
    PipelineBuilder::new("relocate", Arc::new(processors))
        .add_stages(["download", "upload", "rewrite"])
        .unwrap()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_transport_filters_resources() {
    common::init_tracing();
    let registry = Arc::new(MemoryRegistry::new());
    let chart = registry.insert(SOURCE_REFERENCE, b"chart bytes".to_vec()).await;
    let image: Access = serde_json::from_value(serde_json::json!({
        "type": "ociRegistry",
        "imageReference": "registry.example/source/acme/app-image:1.2.0"
    }))
    .unwrap();

    let descriptor = ComponentDescriptor::new("acme/app", "1.2.0")
        .with_repository_context(RepositoryContext::new("registry.example/source"))
        .with_resource(Resource::new(
            "chart",
            "1.2.0",
            "helm-chart",
            Access::local_blob(chart.to_string()),
        ))
        .with_resource(Resource::new("image", "1.2.0", "ociImage", image.clone()));

    let pipeline = relocation(&registry);
    let report = transport_component(
        &pipeline,
        &ExecContext::unbounded(),
        &descriptor,
        &AccessTypeFilter::new(["localOciBlob"]),
    )
    .await
    .unwrap();

    assert_eq!(report.processed, vec!["chart"]);
    assert_eq!(report.skipped, vec!["image"]);
    match &report.descriptor.resources[0].access {
        Access::OciBlob(access) => {
            assert_eq!(access.reference, "registry.example/acme/acme/app:1.2.0");
            assert_eq!(access.digest, chart.to_string());
            assert_eq!(access.size, 11);
            assert_eq!(access.media_type, "helm-chart");
        }
        other => panic!("unexpected access {:?}", other),
    }
    assert_eq!(report.descriptor.resources[1].access, image);
    // The caller's descriptor stays as it was
    assert!(matches!(
        descriptor.resources[0].access,
        Access::LocalOciBlob(_)
    ));
}

#[tokio::test]
async fn test_transport_aborts_on_first_failure() {
    let registry = Arc::new(MemoryRegistry::new());
    let descriptor = ComponentDescriptor::new("acme/app", "1.2.0").with_resource(Resource::new(
        "missing",
        "1.2.0",
        "oci-blob",
        Access::local_blob(cdtransport_core::Digest::of_bytes(b"absent").to_string()),
    ));

    let pipeline = relocation(&registry);
    let err = transport_component(
        &pipeline,
        &ExecContext::unbounded(),
        &descriptor,
        &AllResources,
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DownloadFailed);
    assert_eq!(err.stage_index(), Some(1));
    assert!(registry.pushes().await.is_empty());
}

#[tokio::test]
async fn test_transport_with_nothing_selected() {
    let registry = Arc::new(MemoryRegistry::new());
    let (descriptor, _) = common::descriptor_and_resource(Access::local_blob("sha256:00"));

    let pipeline = relocation(&registry);
    let report = transport_component(
        &pipeline,
        &ExecContext::unbounded(),
        &descriptor,
        &ResourceTypeFilter::new(["helm-chart"]),
    )
    .await
    .unwrap();

    assert!(report.processed.is_empty());
    assert_eq!(report.skipped, vec!["app-blob"]);
    assert_eq!(report.descriptor, descriptor);
}
