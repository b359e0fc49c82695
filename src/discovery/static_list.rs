//! Fixed instance list

use async_trait::async_trait;

use super::{Registry, ServiceInstance};
use crate::Result;

/// Registry over a fixed set of instances, in insertion order
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    instances: Vec<ServiceInstance>,
}

impl StaticRegistry {
    /// Create from instances
    #[must_use]
    pub fn new(instances: Vec<ServiceInstance>) -> Self {
        Self { instances }
    }

    /// Add an instance
    #[must_use]
    pub fn with_instance(mut self, instance: ServiceInstance) -> Self {
        self.instances.push(instance);
        self
    }
}

#[async_trait]
impl Registry for StaticRegistry {
    async fn list_instances(&self, name: &str) -> Result<Vec<ServiceInstance>> {
        Ok(self
            .instances
            .iter()
            .filter(|i| i.id == name)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_exact_match_keeps_order() {
        let registry = StaticRegistry::default()
            .with_instance(ServiceInstance::new("svc", "b", 2))
            .with_instance(ServiceInstance::new("svc-2", "x", 9))
            .with_instance(ServiceInstance::new("svc", "a", 1));

        let found = registry.list_instances("svc").await.unwrap();
        let addresses: Vec<_> = found.iter().map(|i| i.address.as_str()).collect();
        assert_eq!(addresses, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_unknown_name_is_empty() {
        let registry = StaticRegistry::new(vec![ServiceInstance::new("svc", "a", 1)]);
        assert!(registry.list_instances("SVC").await.unwrap().is_empty());
    }
}
