use std::collections::HashMap;

use crate::error::DispatchError;

/// A single addressable instance of a logical backend service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replica {
    /// Position of the replica in the configured list for its service
    pub index: usize,
    /// Opaque endpoint base URL (e.g. "http://10.0.0.7:50051")
    pub address: String,
}

/// Static mapping from logical service name to its ordered replica list.
///
/// Built once at startup and read-only afterwards, so it is safe to share
/// behind an `Arc` across any number of concurrent dispatch calls without
/// locking. Replica indices are assigned from configuration order and never
/// change for the lifetime of the process.
pub struct ReplicaRegistry {
    services: HashMap<String, Vec<Replica>>,
}

impl ReplicaRegistry {
    /// Create a registry from a service name -> ordered address list map.
    pub fn new(services: HashMap<String, Vec<String>>) -> Self {
        let services = services
            .into_iter()
            .map(|(name, addresses)| {
                let replicas = addresses
                    .into_iter()
                    .enumerate()
                    .map(|(index, address)| Replica { index, address })
                    .collect();
                (name, replicas)
            })
            .collect();

        Self { services }
    }

    /// Get the ordered replica list for a service.
    ///
    /// An unknown service name, or one configured with an empty address
    /// list, fails with `DispatchError::UnknownService`.
    pub fn replicas_for(&self, service: &str) -> Result<&[Replica], DispatchError> {
        match self.services.get(service) {
            Some(replicas) if !replicas.is_empty() => Ok(replicas),
            _ => Err(DispatchError::UnknownService(service.to_string())),
        }
    }

    /// Iterate over (service name, replica count) pairs.
    pub fn services(&self) -> impl Iterator<Item = (&str, usize)> {
        self.services
            .iter()
            .map(|(name, replicas)| (name.as_str(), replicas.len()))
    }

    /// Number of configured services.
    pub fn service_count(&self) -> usize {
        self.services.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(service: &str, addresses: &[&str]) -> ReplicaRegistry {
        let mut map = HashMap::new();
        map.insert(
            service.to_string(),
            addresses.iter().map(|a| a.to_string()).collect(),
        );
        ReplicaRegistry::new(map)
    }

    #[test]
    fn test_replicas_preserve_configuration_order() {
        let registry = registry_with("orders", &["http://a:1", "http://b:2", "http://c:3"]);
        let replicas = registry.replicas_for("orders").unwrap();

        assert_eq!(replicas.len(), 3);
        assert_eq!(replicas[0].index, 0);
        assert_eq!(replicas[0].address, "http://a:1");
        assert_eq!(replicas[1].index, 1);
        assert_eq!(replicas[2].address, "http://c:3");
    }

    #[test]
    fn test_unknown_service_fails() {
        let registry = registry_with("orders", &["http://a:1"]);
        let err = registry.replicas_for("shipments").unwrap_err();
        assert_eq!(err, DispatchError::UnknownService("shipments".to_string()));
    }

    #[test]
    fn test_empty_replica_list_is_unknown() {
        let registry = registry_with("orders", &[]);
        let err = registry.replicas_for("orders").unwrap_err();
        assert_eq!(err, DispatchError::UnknownService("orders".to_string()));
    }

    #[test]
    fn test_service_listing() {
        let mut map = HashMap::new();
        map.insert("orders".to_string(), vec!["http://a:1".to_string()]);
        map.insert(
            "payments".to_string(),
            vec!["http://b:1".to_string(), "http://b:2".to_string()],
        );
        let registry = ReplicaRegistry::new(map);

        assert_eq!(registry.service_count(), 2);
        let mut services: Vec<_> = registry.services().collect();
        services.sort();
        assert_eq!(services, vec![("orders", 1), ("payments", 2)]);
    }
}
