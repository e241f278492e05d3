//! Minimal component descriptor model carried through the pipeline.

pub mod access;

pub use access::{Access, LocalOciBlobAccess, OciBlobAccess, OciRegistryAccess};

use serde::{Deserialize, Serialize};

/// Repository a component descriptor is (or will be) stored in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryContext {
    pub base_url: String,
}

impl RepositoryContext {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceRelation {
    #[default]
    Local,
    External,
}

/// One artifact of a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub name: String,
    pub version: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub relation: ResourceRelation,
    pub access: Access,
}

impl Resource {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        resource_type: impl Into<String>,
        access: Access,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            resource_type: resource_type.into(),
            relation: ResourceRelation::Local,
            access,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDescriptor {
    pub name: String,
    pub version: String,
    /// Repository history; the last entry is the current location.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repository_contexts: Vec<RepositoryContext>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl ComponentDescriptor {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            repository_contexts: Vec::new(),
            resources: Vec::new(),
        }
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn with_repository_context(mut self, ctx: RepositoryContext) -> Self {
        self.repository_contexts.push(ctx);
        self
    }

    pub fn current_repository_context(&self) -> Option<&RepositoryContext> {
        self.repository_contexts.last()
    }
}
