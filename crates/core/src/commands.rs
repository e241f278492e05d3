// Transport of a whole component, one resource at a time

use tracing::{debug, info};

use crate::descriptor::ComponentDescriptor;
use crate::error::Result;
use crate::filter::Filter;
use crate::pipeline::{ExecContext, Pipeline};

/// Outcome of [`transport_component`]
#[derive(Debug, Clone)]
pub struct TransportReport {
    /// Copy of the input descriptor with processed resources replaced
    pub descriptor: ComponentDescriptor,
    pub processed: Vec<String>,
    pub skipped: Vec<String>,
}

/// Run every resource of `descriptor` selected by `filter` through `pipeline`.
///
/// Resources are processed sequentially in descriptor order. The first
/// failure aborts the run; `descriptor` itself is never modified.
pub async fn transport_component(
    pipeline: &Pipeline,
    ctx: &ExecContext,
    descriptor: &ComponentDescriptor,
    filter: &dyn Filter,
) -> Result<TransportReport> {
    info!(
        "Transporting {}:{} ({} resources) with pipeline '{}'",
        descriptor.name,
        descriptor.version,
        descriptor.resources.len(),
        pipeline.name()
    );

    let mut updated = descriptor.clone();
    let mut processed = Vec::new();
    let mut skipped = Vec::new();

    for (index, resource) in descriptor.resources.iter().enumerate() {
        if !filter.matches(descriptor, resource) {
            debug!("Skipping resource '{}' ({})", resource.name, resource.resource_type);
            skipped.push(resource.name.clone());
            continue;
        }

        info!("Processing resource '{}' ({})", resource.name, resource.resource_type);
        let (_, processed_resource) = pipeline.process(ctx, descriptor, resource).await?;
        updated.resources[index] = processed_resource;
        processed.push(resource.name.clone());
    }

    info!(
        "Transported {}:{}: {} processed, {} skipped",
        descriptor.name,
        descriptor.version,
        processed.len(),
        skipped.len()
    );

    Ok(TransportReport {
        descriptor: updated,
        processed,
        skipped,
    })
}
