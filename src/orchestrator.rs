//! C8 — `Orchestrator` (spec.md §4.8): the top-level provisioning sequencer.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use k8s_openapi::api::core::v1::{Endpoints, Node, Pod, Service};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::{Client, Resource, ResourceExt};
use serde_json::json;

use crate::cluster;
use crate::components;
use crate::config::SubmitConfig;
use crate::constants::{
    SUBMISSION_CLIENT_RETRIES_INGRESS, SUBMISSION_CLIENT_RETRIES_NODE_PORT,
};
use crate::discovery;
use crate::error::SubmitError;
use crate::labels;
use crate::master_url;
use crate::payload::PayloadEncoder;
use crate::readiness::{self, ReadinessWatcher};
use crate::registry::{ResourceKind, ResourceRegistry};
use crate::request::SubmissionRequestBuilder;
use crate::rpc::{HttpClientFactory, RpcClientParams};
use crate::ssl::SslConfigurationProvider;
use crate::types::Selectors;

const FIELD_MANAGER: &str = "driver-submit";

/// What happened after a submission ran to completion (spec.md §6 exit codes).
pub struct SubmitOutcome {
    pub app_id: String,
    /// Set only when `wait_for_app_completion` was requested; maps directly
    /// to the process exit code (`Succeeded` → 0, anything else → non-zero).
    pub terminal_phase: Option<String>,
}

impl SubmitOutcome {
    pub fn exit_code(&self) -> i32 {
        match &self.terminal_phase {
            None => 0,
            Some(phase) if phase == "Succeeded" => 0,
            Some(_) => 1,
        }
    }
}

pub struct SubmitRequest {
    pub main_resource: String,
    pub main_class: String,
    pub app_args: Vec<String>,
    pub files: Vec<PathBuf>,
    pub jars: Vec<PathBuf>,
}

pub struct Orchestrator {
    config: SubmitConfig,
    ssl_provider: Box<dyn SslConfigurationProvider>,
    payload_encoder: Box<dyn PayloadEncoder>,
    http_client_factory: Box<dyn HttpClientFactory>,
}

impl Orchestrator {
    pub fn new(
        config: SubmitConfig,
        ssl_provider: Box<dyn SslConfigurationProvider>,
        payload_encoder: Box<dyn PayloadEncoder>,
        http_client_factory: Box<dyn HttpClientFactory>,
    ) -> Self {
        Self {
            config,
            ssl_provider,
            payload_encoder,
            http_client_factory,
        }
    }

    pub async fn submit(&self, request: SubmitRequest) -> Result<SubmitOutcome, SubmitError> {
        // Phase 1: Validate.
        let master = master_url::resolve(&self.config.master)?;
        let custom_labels = labels::parse(self.config.driver_labels.as_deref())?;
        if self.config.expose_ingress && self.config.ingress_base_path.is_none() {
            return Err(SubmitError::MissingIngressBasePath);
        }
        for path in request.files.iter().chain(request.jars.iter()) {
            if !path.is_file() {
                return Err(SubmitError::LocalFileMissing(path.clone()));
            }
        }
        // The main resource is only a local-file candidate when it has no
        // scheme or an explicit `file://` scheme (spec.md §4.7 steps 1-2).
        let main_resource_is_local = match url::Url::parse(&request.main_resource) {
            Ok(parsed) => parsed.scheme() == "file",
            Err(_) => true,
        };
        if main_resource_is_local {
            let path = crate::request::local_path_of(&request.main_resource);
            if !path.is_file() {
                return Err(SubmitError::LocalFileMissing(path));
            }
        }
        tracing::info!(phase = "Validated", master = %master);

        let app_id = compute_app_id(&self.config.app_name);
        let selectors = Selectors::new(&app_id, &self.config.app_name, custom_labels);

        // Phase 2: Bootstrap client & registry.
        let client = cluster::build_client(&master, &self.config).await?;
        tracing::info!(phase = "ClientReady");
        let registry = ResourceRegistry::new(client.clone(), &self.config.namespace);

        let outcome = self.run_provisioned(&client, &registry, &app_id, &selectors, request).await;

        // Phase 17: Finalize — always runs, on every exit path.
        registry.delete_all().await;
        tracing::info!(phase = "Terminated");

        outcome
    }

    async fn run_provisioned(
        &self,
        client: &Client,
        registry: &ResourceRegistry,
        app_id: &str,
        selectors: &Selectors,
        request: SubmitRequest,
    ) -> Result<SubmitOutcome, SubmitError> {
        let pods: Api<Pod> = Api::namespaced(client.clone(), &self.config.namespace);
        let services: Api<Service> = Api::namespaced(client.clone(), &self.config.namespace);
        let endpoints: Api<Endpoints> = Api::namespaced(client.clone(), &self.config.namespace);
        let ingresses: Api<Ingress> = Api::namespaced(client.clone(), &self.config.namespace);
        // Node is cluster-scoped (`/api/v1/nodes`), not namespaced.
        let nodes: Api<Node> = Api::all(client.clone());

        // Phase 3: Create submission secret.
        let (secret, secret_value) = components::build_secret(app_id, selectors);
        let secret_name = secret.metadata.name.clone().expect("secret always named");
        let secrets_api: Api<k8s_openapi::api::core::v1::Secret> =
            Api::namespaced(client.clone(), &self.config.namespace);
        secrets_api.create(&PostParams::default(), &secret).await?;
        registry.register_or_update(ResourceKind::Secret, secret_name.clone());
        tracing::info!(phase = "SecretCreated", secret = %secret_name);

        // Phase 4: Request SSL bundle.
        let ssl_bundle = self.ssl_provider.prepare(&self.config)?;
        let mut ssl_secret_names = Vec::new();
        for ssl_secret in &ssl_bundle.secrets {
            let name = ssl_secret.metadata.name.clone().unwrap_or_default();
            secrets_api.create(&PostParams::default(), ssl_secret).await?;
            registry.register_or_update(ResourceKind::Secret, name.clone());
            ssl_secret_names.push(name);
        }
        tracing::info!(phase = "SslReady", enabled = ssl_bundle.enabled);

        // Phase 6: Start readiness watchers (spawned before creation so no
        // events are missed between creation and watch establishment).
        let pod_watcher = ReadinessWatcher::spawn(pods.clone(), readiness::pod_ready);
        let service_watcher = ReadinessWatcher::spawn(services.clone(), readiness::service_applied);
        let endpoints_watcher = ReadinessWatcher::spawn(endpoints.clone(), readiness::endpoints_ready);
        let ingress_watcher = self
            .config
            .expose_ingress
            .then(|| ReadinessWatcher::spawn(ingresses.clone(), readiness::ingress_ready));
        tracing::info!(phase = "WatchersArmed");

        // Phase 7: Create resources in order — Service, Pod, Ingress.
        let service = components::build_service(app_id, selectors, self.config.expose_ingress);
        services.create(&PostParams::default(), &service).await?;
        registry.register_or_update(ResourceKind::Service, app_id.to_string());

        let pod = components::build_pod(app_id, selectors, &self.config, &ssl_bundle);
        pods.create(&PostParams::default(), &pod).await?;
        registry.register_or_update(ResourceKind::Pod, app_id.to_string());

        if self.config.expose_ingress {
            let ingress = components::build_ingress(app_id, selectors);
            ingresses.create(&PostParams::default(), &ingress).await?;
            registry.register_or_update(ResourceKind::Ingress, app_id.to_string());
        }
        tracing::info!(phase = "ComponentsCreated");

        // Phase 8: Await readiness sequentially: Pod, Service, Endpoints, Ingress.
        let timeout = Duration::from_secs(self.config.driver_submit_timeout_secs);
        let ready_pod = match pod_watcher.wait(timeout).await {
            Ok(pod) => pod,
            Err(_) => {
                let diagnostics = self.collect_pod_diagnostics(&pods, app_id).await?;
                return Err(SubmitError::PodNotReady {
                    pod: app_id.to_string(),
                    namespace: self.config.namespace.clone(),
                    timeout,
                    diagnostics,
                });
            }
        };
        service_watcher
            .wait(timeout)
            .await
            .map_err(|_| SubmitError::ServiceNotReady(app_id.to_string()))?;
        endpoints_watcher
            .wait(timeout)
            .await
            .map_err(|_| SubmitError::EndpointsNotReady(app_id.to_string()))?;
        if let Some(watcher) = ingress_watcher {
            watcher
                .wait(timeout)
                .await
                .map_err(|_| SubmitError::IngressNotReady(app_id.to_string()))?;
        }
        tracing::info!(phase = "ComponentsReady");

        // Phase 9: Owner adoption.
        let owner_ref = pod_owner_reference(&ready_pod);
        patch_owner_reference(&secrets_api, &secret_name, &owner_ref).await?;
        for name in &ssl_secret_names {
            patch_owner_reference(&secrets_api, name, &owner_ref).await?;
        }
        patch_owner_reference(&services, app_id, &owner_ref).await?;
        if self.config.expose_ingress {
            patch_owner_reference(&ingresses, app_id, &owner_ref).await?;
        }
        tracing::info!(phase = "Adopted");

        // Phase 10: Discover endpoints.
        let current_service = services.get(app_id).await?;
        let uris = discovery::discover(&self.config, app_id, ssl_bundle.enabled, &nodes, &current_service).await?;

        // Phase 11: Build RPC client.
        let max_retries = if self.config.expose_ingress {
            SUBMISSION_CLIENT_RETRIES_INGRESS
        } else {
            SUBMISSION_CLIENT_RETRIES_NODE_PORT
        };
        let rpc = self.http_client_factory.build(RpcClientParams {
            uris,
            max_retries_per_server: max_retries,
            trust_ctx: ssl_bundle.client_trust_ctx.clone(),
            connect_timeout: Duration::from_millis(5000),
        })?;

        // Phase 12: Sanity check.
        rpc.ping().await?;
        tracing::info!(phase = "Submitted", step = "ping-ok");

        // Phase 13: Submit.
        let request_builder = SubmissionRequestBuilder {
            encoder: self.payload_encoder.as_ref(),
        };
        let submission = request_builder.build(
            &request.main_resource,
            &request.main_class,
            request.app_args,
            &request.files,
            &request.jars,
            secret_value,
            properties_for(&self.config),
        )?;
        rpc.submit_application(&submission).await?;
        tracing::info!(phase = "Submitted");

        // Phase 14: Rewrite Service to ClusterIP/UI-only form.
        let rewritten = components::rewrite_service_to_cluster_ip(current_service, self.config.ui_port);
        services
            .patch(
                app_id,
                &PatchParams::apply(FIELD_MANAGER).force(),
                &Patch::Apply(&rewritten),
            )
            .await?;
        tracing::info!(phase = "ServiceRewritten");

        // Phase 15: Persist long-lived resources — unregister Pod/Service/Ingress.
        registry.unregister(ResourceKind::Pod, app_id);
        registry.unregister(ResourceKind::Service, app_id);
        if self.config.expose_ingress {
            registry.unregister(ResourceKind::Ingress, app_id);
        }
        tracing::info!(phase = "Persisted");

        // Phase 16: Optionally wait for app completion.
        let terminal_phase = if self.config.wait_for_app_completion {
            Some(self.await_pod_terminal_phase(&pods, app_id).await?)
        } else {
            None
        };

        Ok(SubmitOutcome {
            app_id: app_id.to_string(),
            terminal_phase,
        })
    }

    async fn collect_pod_diagnostics(&self, pods: &Api<Pod>, app_id: &str) -> Result<String, SubmitError> {
        let pod = pods.get(app_id).await.map_err(|err| {
            SubmitError::DiagnosticFetchFailed(Box::new(SubmitError::ClusterApiError(err)))
        })?;

        let phase = pod
            .status
            .as_ref()
            .and_then(|s| s.phase.clone())
            .unwrap_or_else(|| "The pod had no final phase.".to_string());
        let message = pod
            .status
            .as_ref()
            .and_then(|s| s.message.clone())
            .unwrap_or_else(|| "The pod had no final message.".to_string());

        let container_state = pod
            .status
            .as_ref()
            .and_then(|s| s.container_statuses.as_ref())
            .and_then(|statuses| statuses.iter().find(|s| s.name == crate::constants::DRIVER_CONTAINER))
            .and_then(|s| s.state.as_ref())
            .map(describe_container_state)
            .unwrap_or_else(|| "container wasn't found in pod".to_string());

        Ok(format!(
            "phase: {phase}\nmessage: {message}\ndriver container state: {container_state}"
        ))
    }

    /// Phase 16 / spec.md §4.8.1 phase 5: waits for the pod to reach a
    /// terminal phase, logging the observed phase every `report_interval`
    /// while it waits. The wait itself is unbounded by design (spec.md §5).
    async fn await_pod_terminal_phase(&self, pods: &Api<Pod>, app_id: &str) -> Result<String, SubmitError> {
        let watcher = ReadinessWatcher::spawn(pods.clone(), |pod: &Pod| {
            matches!(
                pod.status.as_ref().and_then(|s| s.phase.as_deref()),
                Some("Succeeded") | Some("Failed")
            )
        });

        let report_interval = Duration::from_secs(self.config.report_interval_secs.max(1));
        let mut ticker = tokio::time::interval(report_interval);
        ticker.tick().await; // the first tick fires immediately; skip it

        let wait = watcher.wait_unbounded();
        tokio::pin!(wait);
        loop {
            tokio::select! {
                result = &mut wait => {
                    let pod = result.map_err(|_| SubmitError::ClusterWatchClosed(app_id.to_string()))?;
                    return Ok(pod.status.and_then(|s| s.phase).unwrap_or_default());
                }
                _ = ticker.tick() => {
                    match pods.get(app_id).await {
                        Ok(pod) => {
                            let phase = pod
                                .status
                                .and_then(|s| s.phase)
                                .unwrap_or_else(|| "Unknown".to_string());
                            tracing::info!(app_id, phase = %phase, "waiting for app completion");
                        }
                        Err(err) => tracing::warn!(app_id, error = %err, "failed to poll pod phase for reporting"),
                    }
                }
            }
        }
    }
}

fn compute_app_id(app_name: &str) -> String {
    let launch_time_millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    format!("{app_name}-{launch_time_millis}").to_lowercase().replace('.', "-")
}

fn properties_for(config: &SubmitConfig) -> BTreeMap<String, String> {
    config.properties.clone()
}

fn pod_owner_reference(pod: &Pod) -> OwnerReference {
    pod.controller_owner_ref(&()).expect("created pod always has name and uid")
}

async fn patch_owner_reference<K>(api: &Api<K>, name: &str, owner_ref: &OwnerReference) -> Result<(), SubmitError>
where
    K: Resource + Clone + serde::de::DeserializeOwned + serde::Serialize + std::fmt::Debug,
{
    let patch = json!({
        "metadata": {
            "ownerReferences": [owner_ref],
        }
    });
    api.patch(name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    Ok(())
}

fn describe_container_state(state: &k8s_openapi::api::core::v1::ContainerState) -> String {
    if let Some(running) = &state.running {
        format!("Running (since {:?})", running.started_at)
    } else if let Some(waiting) = &state.waiting {
        format!(
            "Waiting (reason={}, message={})",
            waiting.reason.clone().unwrap_or_default(),
            waiting.message.clone().unwrap_or_default()
        )
    } else if let Some(terminated) = &state.terminated {
        format!(
            "Terminated (exit_code={}, reason={}, message={})",
            terminated.exit_code,
            terminated.reason.clone().unwrap_or_default(),
            terminated.message.clone().unwrap_or_default()
        )
    } else {
        "unknown container state".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_id_is_lowercase_with_dots_replaced() {
        let id = compute_app_id("My.App");
        assert!(id.starts_with("my-app-"));
        assert!(!id.contains('.'));
    }

    #[test]
    fn exit_code_maps_succeeded_to_zero() {
        let outcome = SubmitOutcome {
            app_id: "a".to_string(),
            terminal_phase: Some("Succeeded".to_string()),
        };
        assert_eq!(outcome.exit_code(), 0);
    }

    #[test]
    fn exit_code_maps_other_terminal_phases_to_nonzero() {
        let outcome = SubmitOutcome {
            app_id: "a".to_string(),
            terminal_phase: Some("Failed".to_string()),
        };
        assert_eq!(outcome.exit_code(), 1);
    }

    #[test]
    fn exit_code_is_zero_when_not_waiting() {
        let outcome = SubmitOutcome {
            app_id: "a".to_string(),
            terminal_phase: None,
        };
        assert_eq!(outcome.exit_code(), 0);
    }
}
