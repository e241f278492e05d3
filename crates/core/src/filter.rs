/// Resource filter implementations
use crate::descriptor::{ComponentDescriptor, Resource};

/// Selects which resources of a component enter the pipeline
pub trait Filter: Send + Sync {
    fn matches(&self, descriptor: &ComponentDescriptor, resource: &Resource) -> bool;
}

/// Matches resources whose type is one of the given types
pub struct ResourceTypeFilter {
    include_types: Vec<String>,
}

impl ResourceTypeFilter {
    pub fn new<I, S>(include_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            include_types: include_types.into_iter().map(Into::into).collect(),
        }
    }
}

impl Filter for ResourceTypeFilter {
    fn matches(&self, _descriptor: &ComponentDescriptor, resource: &Resource) -> bool {
        self.include_types.contains(&resource.resource_type)
    }
}

/// Matches resources whose access type is one of the given types
pub struct AccessTypeFilter {
    include_types: Vec<String>,
}

impl AccessTypeFilter {
    pub fn new<I, S>(include_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            include_types: include_types.into_iter().map(Into::into).collect(),
        }
    }
}

impl Filter for AccessTypeFilter {
    fn matches(&self, _descriptor: &ComponentDescriptor, resource: &Resource) -> bool {
        self.include_types
            .iter()
            .any(|t| t == resource.access.type_name())
    }
}

/// Matches every resource
pub struct AllResources;

impl Filter for AllResources {
    fn matches(&self, _descriptor: &ComponentDescriptor, _resource: &Resource) -> bool {
        true
    }
}

/// Matches when every inner filter matches
pub struct AllOf {
    filters: Vec<Box<dyn Filter>>,
}

impl AllOf {
    pub fn new(filters: Vec<Box<dyn Filter>>) -> Self {
        Self { filters }
    }
}

impl Filter for AllOf {
    fn matches(&self, descriptor: &ComponentDescriptor, resource: &Resource) -> bool {
        self.filters.iter().all(|f| f.matches(descriptor, resource))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Access;

    fn resource(resource_type: &str, access: Access) -> Resource {
        Resource::new("res", "1.0.0", resource_type, access)
    }

    #[test]
    fn test_resource_type_filter() {
        let cd = ComponentDescriptor::new("acme/app", "1.0.0");
        let filter = ResourceTypeFilter::new(["helm-chart", "oci-blob"]);

        assert!(filter.matches(&cd, &resource("oci-blob", Access::local_blob("d"))));
        assert!(!filter.matches(&cd, &resource("ociImage", Access::local_blob("d"))));
        assert!(!ResourceTypeFilter::new(Vec::<String>::new())
            .matches(&cd, &resource("oci-blob", Access::local_blob("d"))));
    }

    #[test]
    fn test_combined_filters() {
        let cd = ComponentDescriptor::new("acme/app", "1.0.0");
        let filter = AllOf::new(vec![
            Box::new(ResourceTypeFilter::new(["oci-blob"])),
            Box::new(AccessTypeFilter::new(["localOciBlob"])),
        ]);

        assert!(filter.matches(&cd, &resource("oci-blob", Access::local_blob("d"))));
        let remote = serde_json::from_value(
            serde_json::json!({"type": "ociRegistry", "imageReference": "r/i:1"}),
        )
        .unwrap();
        assert!(!filter.matches(&cd, &resource("oci-blob", remote)));
        assert!(AllResources.matches(&cd, &resource("anything", Access::local_blob("d"))));
    }
}
