//! The out-of-scope configuration collaborator (SPEC_FULL.md §10.3).
//!
//! The core treats configuration ingestion as external input; this struct is
//! the concrete shape `main.rs`'s CLI parser produces and the `Orchestrator`
//! consumes.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::constants::DEFAULT_UI_PORT;

#[derive(Debug, Clone)]
pub struct SubmitConfig {
    pub namespace: String,
    pub master: String,
    pub app_name: String,
    pub driver_docker_image: String,
    pub service_account: Option<String>,
    pub driver_labels: Option<String>,
    pub ui_port: u16,
    pub driver_port: u16,
    pub blockmanager_port: u16,
    pub ca_cert_file: Option<PathBuf>,
    pub client_key_file: Option<PathBuf>,
    pub client_cert_file: Option<PathBuf>,
    pub driver_submit_timeout_secs: u64,
    pub expose_ingress: bool,
    pub ingress_base_path: Option<String>,
    pub wait_for_app_completion: bool,
    pub report_interval_secs: u64,
    pub properties: BTreeMap<String, String>,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            master: String::new(),
            app_name: "app".to_string(),
            driver_docker_image: String::new(),
            service_account: None,
            driver_labels: None,
            ui_port: DEFAULT_UI_PORT,
            driver_port: 7078,
            blockmanager_port: 7079,
            ca_cert_file: None,
            client_key_file: None,
            client_cert_file: None,
            driver_submit_timeout_secs: 300,
            expose_ingress: false,
            ingress_base_path: None,
            wait_for_app_completion: false,
            report_interval_secs: 30,
            properties: BTreeMap::new(),
        }
    }
}
