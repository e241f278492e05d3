// Concrete pipeline stages

pub mod downloader;
pub mod rewriter;
pub mod uploader;

pub use downloader::LocalBlobDownloader;
pub use rewriter::AccessRewriter;
pub use uploader::LocalBlobUploader;

use std::sync::Arc;

use crate::descriptor::RepositoryContext;
use crate::pipeline::ProcessorRegistry;
use crate::registry::RegistryClient;

/// Stage names accepted by [`register_processors`]
pub const DOWNLOAD_STAGE: &str = "download";
pub const UPLOAD_STAGE: &str = "upload";
pub const REWRITE_STAGE: &str = "rewrite";

/// Register the built-in stages for moving local blobs from `source` to `target`
pub fn register_processors(
    registry: &mut ProcessorRegistry,
    client: Arc<dyn RegistryClient>,
    source: RepositoryContext,
    target: RepositoryContext,
) {
    let download_client = Arc::clone(&client);
    registry.register(DOWNLOAD_STAGE, move || {
        Box::new(LocalBlobDownloader::new(
            Arc::clone(&download_client),
            source.clone(),
        ))
    });

    let upload_target = target.clone();
    registry.register(UPLOAD_STAGE, move || {
        Box::new(LocalBlobUploader::new(
            Arc::clone(&client),
            upload_target.clone(),
        ))
    });

    registry.register(REWRITE_STAGE, move || Box::new(AccessRewriter::new(target.clone())));
}
