//! Client bootstrap (spec.md §4.8.1 phase 2): builds an API client bound to
//! the resolved master URL, namespace, and optional CA/client-cert/key paths.
//!
//! Grounded on the teacher's `get_client` (`k8s.rs`), generalized from
//! kubeconfig-context selection to an explicit master URL plus PEM files.

use kube::config::{AuthInfo, Cluster, Context, Kubeconfig, NamedAuthInfo, NamedCluster, NamedContext};
use kube::{Client, Config};

use crate::config::SubmitConfig;
use crate::error::SubmitError;

/// Builds a `kube::Client` from an already-resolved master URL and the
/// optional client-cert material named in `config`.
pub async fn build_client(master_url: &str, config: &SubmitConfig) -> Result<Client, SubmitError> {
    let ca_data = config
        .ca_cert_file
        .as_ref()
        .map(std::fs::read)
        .transpose()?;
    let client_cert_data = config
        .client_cert_file
        .as_ref()
        .map(std::fs::read)
        .transpose()?;
    let client_key_data = config
        .client_key_file
        .as_ref()
        .map(std::fs::read)
        .transpose()?;

    let auth_info = AuthInfo {
        client_certificate_data: client_cert_data.map(|b| encode_pem(&b)),
        client_key_data: client_key_data.map(|b| encode_pem(&b)),
        ..Default::default()
    };

    let cluster = Cluster {
        server: Some(master_url.to_string()),
        certificate_authority_data: ca_data.map(|b| encode_pem(&b)),
        ..Default::default()
    };

    let kubeconfig = Kubeconfig {
        clusters: vec![NamedCluster {
            name: "driver-submit".to_string(),
            cluster: Some(cluster),
        }],
        auth_infos: vec![NamedAuthInfo {
            name: "driver-submit".to_string(),
            auth_info: Some(auth_info),
        }],
        contexts: vec![NamedContext {
            name: "driver-submit".to_string(),
            context: Some(Context {
                cluster: "driver-submit".to_string(),
                user: "driver-submit".to_string(),
                namespace: Some(config.namespace.clone()),
                ..Default::default()
            }),
        }],
        current_context: Some("driver-submit".to_string()),
        ..Default::default()
    };

    let kube_config = Config::from_custom_kubeconfig(kubeconfig, &Default::default())
        .await
        .map_err(|e| SubmitError::ClusterConfigError(Box::new(e)))?;

    Client::try_from(kube_config).map_err(SubmitError::from)
}

fn encode_pem(bytes: &[u8]) -> String {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    BASE64.encode(bytes)
}
