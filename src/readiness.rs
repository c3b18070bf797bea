//! C4 — `ReadinessWatcher<T>` (spec.md §4.4, §9 design note on single-assignment
//! futures).
//!
//! A single-assignment promise driven by a cluster watch stream: the first
//! event for which the predicate holds resolves the watcher; the underlying
//! task is then dropped, closing the watch.

use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::StreamExt;
use k8s_openapi::api::core::v1::{Endpoints, Pod, Service};
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::Api;
use kube::runtime::{watcher, WatchStreamExt};
use serde::de::DeserializeOwned;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::constants::DRIVER_CONTAINER;

#[derive(Debug, thiserror::Error)]
pub enum ReadinessError {
    #[error("readiness watch timed out after {0:?}")]
    Timeout(Duration),
    #[error("readiness watch closed without a resolving event")]
    Closed,
}

/// Generic one-shot readiness detector (spec.md §4.4).
pub struct ReadinessWatcher<T> {
    rx: oneshot::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T> ReadinessWatcher<T>
where
    T: kube::Resource<DynamicType = ()> + Clone + Debug + DeserializeOwned + Send + Sync + 'static,
{
    /// Spawns a background task that drives `api`'s watch stream and resolves
    /// once `predicate` first holds for an applied object.
    pub fn spawn<P>(api: Api<T>, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let tx = Arc::new(Mutex::new(Some(tx)));

        let task = tokio::spawn(async move {
            let stream = watcher(api, watcher::Config::default()).applied_objects();
            tokio::pin!(stream);
            loop {
                match stream.next().await {
                    Some(Ok(obj)) => {
                        tracing::debug!(kind = std::any::type_name::<T>(), "observed applied event");
                        if predicate(&obj) {
                            if let Some(sender) = tx.lock().expect("resolved-flag mutex poisoned").take() {
                                let _ = sender.send(obj);
                            }
                            break;
                        }
                    }
                    Some(Err(err)) => {
                        tracing::warn!(error = %err, "watch stream error, continuing");
                    }
                    None => break,
                }
            }
        });

        Self { rx, task }
    }

    /// Awaits resolution, bounded by `timeout`. On timeout the background
    /// watch task is aborted.
    pub async fn wait(self, timeout: Duration) -> Result<T, ReadinessError> {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(obj)) => Ok(obj),
            Ok(Err(_)) => Err(ReadinessError::Closed),
            Err(_) => {
                self.task.abort();
                Err(ReadinessError::Timeout(timeout))
            }
        }
    }

    /// Awaits resolution with no timeout (spec.md §5: the completion wait is
    /// "unbounded by design"). Consumes `self` directly rather than going
    /// through `tokio::time::timeout`, which would otherwise need an
    /// artificial bound.
    pub async fn wait_unbounded(self) -> Result<T, ReadinessError> {
        self.rx.await.map_err(|_| ReadinessError::Closed)
    }
}

/// `action ∈ {Added, Modified} ∧ phase = "Running" ∧ driver container ready`.
///
/// `watcher().applied_objects()` already restricts events to Added/Modified
/// (collapsed into "Applied"), which is the idiomatic modern-kube-rs way to
/// express this predicate's action clause.
pub fn pod_ready(pod: &Pod) -> bool {
    let Some(status) = &pod.status else { return false };
    if status.phase.as_deref() != Some("Running") {
        return false;
    }
    status
        .container_statuses
        .as_ref()
        .map(|statuses| statuses.iter().any(|s| s.name == DRIVER_CONTAINER && s.ready))
        .unwrap_or(false)
}

/// `action = Added ∨ action = Modified` — any applied event is sufficient.
pub fn service_applied(_svc: &Service) -> bool {
    true
}

/// `action ∈ {Added, Modified} ∧ ∃ subset with non-empty addresses`.
///
/// Resolves the operator-precedence ambiguity noted in spec.md §9 by adopting
/// the explicit form recommended there.
pub fn endpoints_ready(endpoints: &Endpoints) -> bool {
    endpoints
        .subsets
        .as_ref()
        .map(|subsets| {
            subsets
                .iter()
                .any(|s| s.addresses.as_ref().map(|a| !a.is_empty()).unwrap_or(false))
        })
        .unwrap_or(false)
}

/// `action ∈ {Added, Modified} ∧ status.loadBalancer.ingress is non-empty`.
pub fn ingress_ready(ingress: &Ingress) -> bool {
    ingress
        .status
        .as_ref()
        .and_then(|s| s.load_balancer.as_ref())
        .and_then(|lb| lb.ingress.as_ref())
        .map(|entries| !entries.is_empty())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{ContainerStatus, PodStatus};
    use k8s_openapi::api::core::v1::{EndpointAddress, EndpointSubset};
    use k8s_openapi::api::networking::v1::{IngressLoadBalancerIngress, IngressLoadBalancerStatus, IngressStatus};

    fn pod_with(phase: &str, container_ready: Option<bool>) -> Pod {
        Pod {
            status: Some(PodStatus {
                phase: Some(phase.to_string()),
                container_statuses: container_ready.map(|ready| {
                    vec![ContainerStatus {
                        name: DRIVER_CONTAINER.to_string(),
                        ready,
                        ..Default::default()
                    }]
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn running_pod_with_ready_container_resolves() {
        assert!(pod_ready(&pod_with("Running", Some(true))));
    }

    #[test]
    fn running_pod_with_unready_container_never_resolves() {
        assert!(!pod_ready(&pod_with("Running", Some(false))));
    }

    #[test]
    fn pending_pod_never_resolves() {
        assert!(!pod_ready(&pod_with("Pending", Some(true))));
    }

    #[test]
    fn endpoints_with_empty_addresses_are_not_ready() {
        let endpoints = Endpoints {
            subsets: Some(vec![EndpointSubset {
                addresses: Some(vec![]),
                ..Default::default()
            }]),
            ..Default::default()
        };
        assert!(!endpoints_ready(&endpoints));
    }

    #[test]
    fn endpoints_with_an_address_are_ready() {
        let endpoints = Endpoints {
            subsets: Some(vec![EndpointSubset {
                addresses: Some(vec![EndpointAddress {
                    ip: "10.0.0.1".to_string(),
                    ..Default::default()
                }]),
                ..Default::default()
            }]),
            ..Default::default()
        };
        assert!(endpoints_ready(&endpoints));
    }

    #[test]
    fn ingress_without_load_balancer_is_not_ready() {
        assert!(!ingress_ready(&Ingress::default()));
    }

    #[test]
    fn ingress_with_load_balancer_entry_is_ready() {
        let ingress = Ingress {
            status: Some(IngressStatus {
                load_balancer: Some(IngressLoadBalancerStatus {
                    ingress: Some(vec![IngressLoadBalancerIngress {
                        ip: Some("1.2.3.4".to_string()),
                        ..Default::default()
                    }]),
                }),
            }),
            ..Default::default()
        };
        assert!(ingress_ready(&ingress));
    }
}
