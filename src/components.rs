//! C5 — `ComponentFactory` (spec.md §4.5): pure constructors, no I/O.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, HTTPGetAction, Pod, PodSpec, Probe, Secret, SecretVolumeSource,
    Service, ServicePort, ServiceSpec, Volume, VolumeMount,
};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule, IngressServiceBackend,
    IngressSpec, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::ObjectMeta;

use crate::config::SubmitConfig;
use crate::constants::{
    DRIVER_CONTAINER, DRIVER_CONTAINER_SECRETS_BASE_DIR, ENV_SUBMISSION_SECRET_LOCATION,
    ENV_SUBMISSION_SERVER_BASE_PATH, ENV_SUBMISSION_SERVER_PORT, SUBMISSION_APP_SECRET_NAME,
    SUBMISSION_SERVER_PATH_COMPONENT, SUBMISSION_SERVER_PORT, SUBMISSION_SERVER_PORT_NAME,
    UI_PATH_COMPONENT, UI_PORT_NAME,
};
use crate::types::{SslBundle, Selectors};

/// 128 random bytes, base64-encoded (spec.md invariant 2). Returns both the
/// `Secret` object to create and the plaintext value to hand to the driver
/// over the submission RPC.
pub fn build_secret(app_id: &str, selectors: &Selectors) -> (Secret, String) {
    let name = secret_name(app_id);
    let raw: Vec<u8> = (0..128).map(|_| fastrand::u8(..)).collect();
    let encoded = BASE64.encode(&raw);

    let mut data = BTreeMap::new();
    data.insert(
        SUBMISSION_APP_SECRET_NAME.to_string(),
        k8s_openapi::ByteString(raw),
    );

    let secret = Secret {
        metadata: ObjectMeta {
            name: Some(name),
            labels: Some(selectors.as_btree_map()),
            ..Default::default()
        },
        type_: Some("Opaque".to_string()),
        data: Some(data),
        ..Default::default()
    };
    (secret, encoded)
}

pub fn secret_name(app_id: &str) -> String {
    format!("submission-app-secret-{app_id}")
}

pub fn build_service(app_id: &str, selectors: &Selectors, ingress_mode: bool) -> Service {
    let svc_type = if ingress_mode { "ClusterIP" } else { "NodePort" };
    Service {
        metadata: ObjectMeta {
            name: Some(app_id.to_string()),
            labels: Some(selectors.as_btree_map()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(selectors.as_btree_map()),
            type_: Some(svc_type.to_string()),
            ports: Some(vec![ServicePort {
                name: Some(SUBMISSION_SERVER_PORT_NAME.to_string()),
                port: i32::from(SUBMISSION_SERVER_PORT),
                target_port: Some(IntOrString::Int(i32::from(SUBMISSION_SERVER_PORT))),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        status: None,
    }
}

/// Rewrites a submission-mode `Service` into the ClusterIP/UI-only form
/// applied after successful submission (spec.md §4.5).
pub fn rewrite_service_to_cluster_ip(mut service: Service, ui_port: u16) -> Service {
    let spec = service.spec.get_or_insert_with(Default::default);
    spec.type_ = Some("ClusterIP".to_string());
    spec.ports = Some(vec![ServicePort {
        name: Some(UI_PORT_NAME.to_string()),
        port: i32::from(ui_port),
        target_port: Some(IntOrString::Int(i32::from(ui_port))),
        ..Default::default()
    }]);
    service
}

pub fn build_pod(
    app_id: &str,
    selectors: &Selectors,
    config: &SubmitConfig,
    ssl: &SslBundle,
) -> Pod {
    let secret_volume_name = "submission-secret";
    let mount_path = format!("{DRIVER_CONTAINER_SECRETS_BASE_DIR}/{app_id}");

    let mut volumes = vec![Volume {
        name: secret_volume_name.to_string(),
        secret: Some(SecretVolumeSource {
            secret_name: Some(secret_name(app_id)),
            ..Default::default()
        }),
        ..Default::default()
    }];
    volumes.extend(ssl.volumes.iter().cloned());

    let mut mounts = vec![VolumeMount {
        name: secret_volume_name.to_string(),
        mount_path: mount_path.clone(),
        read_only: Some(true),
        ..Default::default()
    }];
    mounts.extend(ssl.volume_mounts.iter().cloned());

    let mut env = vec![
        EnvVar {
            name: ENV_SUBMISSION_SECRET_LOCATION.to_string(),
            value: Some(format!("{mount_path}/{SUBMISSION_APP_SECRET_NAME}")),
            ..Default::default()
        },
        EnvVar {
            name: ENV_SUBMISSION_SERVER_PORT.to_string(),
            value: Some(SUBMISSION_SERVER_PORT.to_string()),
            ..Default::default()
        },
        EnvVar {
            name: ENV_SUBMISSION_SERVER_BASE_PATH.to_string(),
            value: Some(format!("/{app_id}")),
            ..Default::default()
        },
    ];
    env.extend(ssl.env.iter().cloned());

    let probe = Probe {
        http_get: Some(HTTPGetAction {
            path: Some(format!("/{app_id}/{SUBMISSION_SERVER_PATH_COMPONENT}/v1/submissions/ping")),
            port: IntOrString::String(SUBMISSION_SERVER_PORT_NAME.to_string()),
            scheme: Some(if ssl.enabled { "HTTPS".to_string() } else { "HTTP".to_string() }),
            ..Default::default()
        }),
        ..Default::default()
    };

    let container = Container {
        name: DRIVER_CONTAINER.to_string(),
        image: Some(config.driver_docker_image.clone()),
        image_pull_policy: Some("IfNotPresent".to_string()),
        volume_mounts: Some(mounts),
        env: Some(env),
        ports: Some(vec![
            ContainerPort { container_port: i32::from(config.driver_port), ..Default::default() },
            ContainerPort { container_port: i32::from(config.blockmanager_port), ..Default::default() },
            ContainerPort { container_port: i32::from(SUBMISSION_SERVER_PORT), ..Default::default() },
            ContainerPort { container_port: i32::from(config.ui_port), ..Default::default() },
        ]),
        readiness_probe: Some(probe),
        ..Default::default()
    };

    Pod {
        metadata: ObjectMeta {
            name: Some(app_id.to_string()),
            labels: Some(selectors.as_btree_map()),
            ..Default::default()
        },
        spec: Some(PodSpec {
            restart_policy: Some("OnFailure".to_string()),
            service_account_name: config.service_account.clone(),
            containers: vec![container],
            volumes: Some(volumes),
            ..Default::default()
        }),
        status: None,
    }
}

pub fn build_ingress(app_id: &str, selectors: &Selectors) -> Ingress {
    let backend = |port_name: &str| IngressBackend {
        service: Some(IngressServiceBackend {
            name: app_id.to_string(),
            port: Some(ServiceBackendPort {
                name: Some(port_name.to_string()),
                ..Default::default()
            }),
        }),
        ..Default::default()
    };

    Ingress {
        metadata: ObjectMeta {
            name: Some(app_id.to_string()),
            labels: Some(selectors.as_btree_map()),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            rules: Some(vec![IngressRule {
                http: Some(HTTPIngressRuleValue {
                    paths: vec![
                        HTTPIngressPath {
                            path: Some(format!("/{app_id}/{SUBMISSION_SERVER_PATH_COMPONENT}")),
                            path_type: "Prefix".to_string(),
                            backend: backend(SUBMISSION_SERVER_PORT_NAME),
                        },
                        HTTPIngressPath {
                            path: Some(format!("/{app_id}/{UI_PATH_COMPONENT}")),
                            path_type: "Prefix".to_string(),
                            backend: backend(UI_PORT_NAME),
                        },
                    ],
                }),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        status: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn selectors() -> Selectors {
        Selectors::new("app-123", "my-app", BTreeMap::new())
    }

    #[test]
    fn secret_has_expected_name_and_128_byte_token() {
        let (secret, encoded) = build_secret("app-123", &selectors());
        assert_eq!(secret.metadata.name.as_deref(), Some("submission-app-secret-app-123"));
        assert_eq!(secret.type_.as_deref(), Some("Opaque"));
        let raw = BASE64.decode(&encoded).unwrap();
        assert_eq!(raw.len(), 128);
    }

    #[test]
    fn node_port_service_in_non_ingress_mode() {
        let svc = build_service("app-123", &selectors(), false);
        assert_eq!(svc.spec.unwrap().type_.as_deref(), Some("NodePort"));
    }

    #[test]
    fn cluster_ip_service_in_ingress_mode() {
        let svc = build_service("app-123", &selectors(), true);
        assert_eq!(svc.spec.unwrap().type_.as_deref(), Some("ClusterIP"));
    }

    #[test]
    fn ingress_has_two_paths() {
        let ingress = build_ingress("app-123", &selectors());
        let paths = &ingress.spec.unwrap().rules.unwrap()[0].http.as_ref().unwrap().paths;
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].path.as_deref(), Some("/app-123/submit"));
        assert_eq!(paths[1].path.as_deref(), Some("/app-123/ui"));
    }

    #[test]
    fn cluster_ip_rewrite_drops_submission_port() {
        let svc = build_service("app-123", &selectors(), false);
        let rewritten = rewrite_service_to_cluster_ip(svc, 4040);
        let spec = rewritten.spec.unwrap();
        assert_eq!(spec.type_.as_deref(), Some("ClusterIP"));
        let ports = spec.ports.unwrap();
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].name.as_deref(), Some(UI_PORT_NAME));
        assert_eq!(ports[0].port, 4040);
    }
}
