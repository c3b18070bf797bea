//! C3 — `ResourceRegistry` (spec.md §4.3).
//!
//! Scoped to one orchestrator invocation (§9 design note "Registry as
//! mutable state") — never exposed as a process-wide singleton.

use std::collections::HashSet;
use std::sync::Mutex;

use k8s_openapi::api::core::v1::{Pod, Secret, Service};
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::{Api, DeleteParams};
use kube::Client;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Secret,
    Service,
    Pod,
    Ingress,
}

/// Namespaced API handles the registry needs to delete what it tracks.
struct ClusterApis {
    secrets: Api<Secret>,
    services: Api<Service>,
    pods: Api<Pod>,
    ingresses: Api<Ingress>,
}

pub struct ResourceRegistry {
    entries: Mutex<HashSet<(ResourceKind, String)>>,
    apis: ClusterApis,
}

impl ResourceRegistry {
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            entries: Mutex::new(HashSet::new()),
            apis: ClusterApis {
                secrets: Api::namespaced(client.clone(), namespace),
                services: Api::namespaced(client.clone(), namespace),
                pods: Api::namespaced(client.clone(), namespace),
                ingresses: Api::namespaced(client, namespace),
            },
        }
    }

    /// Idempotent: registering the same `(kind, name)` twice leaves one entry.
    pub fn register_or_update(&self, kind: ResourceKind, name: impl Into<String>) {
        self.entries.lock().expect("registry mutex poisoned").insert((kind, name.into()));
    }

    pub fn unregister(&self, kind: ResourceKind, name: &str) {
        self.entries
            .lock()
            .expect("registry mutex poisoned")
            .remove(&(kind, name.to_string()));
    }

    /// Best-effort delete of every remaining entry. Never returns an error;
    /// individual delete failures are logged and swallowed (spec.md §4.3).
    pub async fn delete_all(&self) {
        let entries: Vec<(ResourceKind, String)> =
            self.entries.lock().expect("registry mutex poisoned").drain().collect();

        for (kind, name) in entries {
            let result = match kind {
                ResourceKind::Secret => self
                    .apis
                    .secrets
                    .delete(&name, &DeleteParams::default())
                    .await
                    .map(|_| ()),
                ResourceKind::Service => self
                    .apis
                    .services
                    .delete(&name, &DeleteParams::default())
                    .await
                    .map(|_| ()),
                ResourceKind::Pod => self
                    .apis
                    .pods
                    .delete(&name, &DeleteParams::default())
                    .await
                    .map(|_| ()),
                ResourceKind::Ingress => self
                    .apis
                    .ingresses
                    .delete(&name, &DeleteParams::default())
                    .await
                    .map(|_| ()),
            };
            if let Err(err) = result {
                tracing::warn!(kind = ?kind, name = %name, error = %err, "cleanup delete failed, continuing");
            }
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("registry mutex poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // `ResourceRegistry` holds live `Api<T>` handles, so constructing one
    // needs a `Client`; bookkeeping (register/unregister/idempotency) is
    // exercised directly against the `HashSet` it wraps instead.

    #[test]
    fn register_is_idempotent() {
        let entries: Mutex<HashSet<(ResourceKind, String)>> = Mutex::new(HashSet::new());
        entries.lock().unwrap().insert((ResourceKind::Pod, "a".to_string()));
        entries.lock().unwrap().insert((ResourceKind::Pod, "a".to_string()));
        assert_eq!(entries.lock().unwrap().len(), 1);
    }

    #[test]
    fn unregister_removes_entry() {
        let entries: Mutex<HashSet<(ResourceKind, String)>> = Mutex::new(HashSet::new());
        entries.lock().unwrap().insert((ResourceKind::Service, "svc".to_string()));
        entries.lock().unwrap().remove(&(ResourceKind::Service, "svc".to_string()));
        assert!(entries.lock().unwrap().is_empty());
    }
}
