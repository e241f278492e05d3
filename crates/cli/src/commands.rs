// Command implementations behind the CLI subcommands

use std::path::Path;
use std::sync::Arc;

use cdtransport_core::message::{ScratchSpace, read_message, write_message};
use cdtransport_core::pipeline::{PipelineBuilder, ProcessorRegistry};
use cdtransport_core::processors::register_processors;
use cdtransport_core::registry::{FsRegistry, RegistryClient};
use cdtransport_core::transport_component;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, info};

use crate::config::{CliResult, TransportConfig, load_descriptor, write_descriptor};

pub async fn transport_command(config: TransportConfig) -> CliResult<()> {
    config.validate()?;
    let descriptor = load_descriptor(&config.descriptor)?;
    let source = config.source_context(&descriptor)?;
    let target = config.target_context();
    info!(
        "Relocating {}:{} from {} to {}",
        descriptor.name, descriptor.version, source.base_url, target.base_url
    );

    let client: Arc<dyn RegistryClient> = Arc::new(FsRegistry::new(config.store.clone()));
    let mut processors = ProcessorRegistry::new();
    register_processors(&mut processors, client, source, target.clone());

    let pipeline = PipelineBuilder::new("transport", Arc::new(processors))
        .with_stage_timeout(config.stage_timeout)
        .with_scratch(config.scratch())
        .add_stages(config.stages.iter().cloned())?
        .build()?;
    debug!("Pipeline stages: {:?}", pipeline.stage_names());

    let filter = config.filter();
    let report = transport_component(
        &pipeline,
        &config.exec_context(),
        &descriptor,
        filter.as_ref(),
    )
    .await?;

    let mut updated = report.descriptor;
    if updated.current_repository_context() != Some(&target) {
        updated.repository_contexts.push(target);
    }
    write_descriptor(&config.output_path, &updated)?;

    info!(
        "Wrote {} ({} transported, {} skipped)",
        config.output_path.display(),
        report.processed.len(),
        report.skipped.len()
    );
    Ok(())
}

pub async fn encode_command(
    descriptor_path: &Path,
    resource_name: &str,
    blob_path: Option<&Path>,
    output_path: &Path,
) -> CliResult<()> {
    let descriptor = load_descriptor(descriptor_path)?;
    let resource = descriptor
        .resources
        .iter()
        .find(|r| r.name == resource_name)
        .cloned()
        .ok_or_else(|| {
            format!(
                "Resource '{}' not found in {}:{}",
                resource_name, descriptor.name, descriptor.version
            )
        })?;

    let mut output = tokio::fs::File::create(output_path).await?;
    match blob_path {
        Some(path) => {
            let mut blob = tokio::fs::File::open(path).await?;
            let blob: &mut (dyn AsyncRead + Unpin + Send) = &mut blob;
            write_message(&mut output, &descriptor, &resource, Some(blob)).await?;
        }
        None => write_message(&mut output, &descriptor, &resource, None).await?,
    }
    output.flush().await?;

    info!("Encoded resource '{}' to {}", resource_name, output_path.display());
    Ok(())
}

pub async fn inspect_command(message_path: &Path) -> CliResult<()> {
    let mut input = tokio::fs::File::open(message_path).await?;
    let message = read_message(&mut input, &ScratchSpace::system()).await?;

    println!("descriptor: {}:{}", message.descriptor.name, message.descriptor.version);
    if let Some(ctx) = message.descriptor.current_repository_context() {
        println!("repository: {}", ctx.base_url);
    }
    println!("resource:");
    print!("{}", serde_yaml::to_string(&message.resource)?);

    match message.blob {
        Some(mut blob) => {
            let size = tokio::io::copy(&mut blob, &mut tokio::io::sink()).await?;
            println!("blob: {} bytes", size);
            blob.close().await?;
        }
        None => println!("blob: none"),
    }
    Ok(())
}
