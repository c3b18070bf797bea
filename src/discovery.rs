//! C6 — `EndpointDiscovery` (spec.md §4.6).

use std::collections::HashSet;

use k8s_openapi::api::core::v1::{Node, Service};
use kube::api::{Api, ListParams};

use crate::config::SubmitConfig;
use crate::constants::{SUBMISSION_SERVER_PATH_COMPONENT, SUBMISSION_SERVER_PORT_NAME};
use crate::error::SubmitError;

const ACCEPTED_ADDRESS_TYPES: [&str; 2] = ["ExternalIP", "LegacyHostIP"];

/// Builds the non-empty set of candidate driver URLs (spec.md §4.6).
pub async fn discover(
    config: &SubmitConfig,
    app_id: &str,
    ssl_enabled: bool,
    node_api: &Api<Node>,
    service: &Service,
) -> Result<HashSet<String>, SubmitError> {
    let scheme = if ssl_enabled { "https" } else { "http" };
    if !ssl_enabled {
        tracing::warn!("submission RPC will use unencrypted HTTP");
    }

    if let Some(base) = &config.ingress_base_path {
        let url = format!("{scheme}://{base}/{app_id}/{SUBMISSION_SERVER_PATH_COMPONENT}");
        return Ok(HashSet::from([url]));
    }

    let node_port = submission_node_port(service)?;
    let nodes = node_api.list(&ListParams::default()).await?;

    let mut urls = HashSet::new();
    for node in nodes.items {
        if node.spec.as_ref().and_then(|s| s.unschedulable).unwrap_or(false) {
            continue;
        }
        let Some(addresses) = node.status.as_ref().and_then(|s| s.addresses.as_ref()) else {
            continue;
        };
        for addr in addresses {
            if ACCEPTED_ADDRESS_TYPES.contains(&addr.type_.as_str()) {
                urls.insert(format!(
                    "{scheme}://{}:{node_port}/{app_id}/{SUBMISSION_SERVER_PATH_COMPONENT}",
                    addr.address
                ));
            }
        }
    }

    if urls.is_empty() {
        return Err(SubmitError::NoReachableNodes);
    }
    Ok(urls)
}

fn submission_node_port(service: &Service) -> Result<i32, SubmitError> {
    service
        .spec
        .as_ref()
        .and_then(|spec| spec.ports.as_ref())
        .and_then(|ports| ports.iter().find(|p| p.name.as_deref() == Some(SUBMISSION_SERVER_PORT_NAME)))
        .and_then(|port| port.node_port)
        .ok_or(SubmitError::NoReachableNodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{NodeAddress, NodeSpec, NodeStatus};

    fn node(unschedulable: bool, addresses: Vec<(&str, &str)>) -> Node {
        Node {
            spec: Some(NodeSpec {
                unschedulable: Some(unschedulable),
                ..Default::default()
            }),
            status: Some(NodeStatus {
                addresses: Some(
                    addresses
                        .into_iter()
                        .map(|(t, a)| NodeAddress {
                            type_: t.to_string(),
                            address: a.to_string(),
                        })
                        .collect(),
                ),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn unschedulable_nodes_are_excluded() {
        let n = node(true, vec![("ExternalIP", "203.0.113.7")]);
        assert!(n.spec.unwrap().unschedulable.unwrap());
    }

    #[test]
    fn internal_ip_is_not_accepted() {
        assert!(!ACCEPTED_ADDRESS_TYPES.contains(&"InternalIP"));
    }

    #[test]
    fn external_and_legacy_host_ip_are_accepted() {
        assert!(ACCEPTED_ADDRESS_TYPES.contains(&"ExternalIP"));
        assert!(ACCEPTED_ADDRESS_TYPES.contains(&"LegacyHostIP"));
    }
}
