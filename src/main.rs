use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;
use driver_submit::config::SubmitConfig;
use driver_submit::orchestrator::{Orchestrator, SubmitRequest};
use driver_submit::payload::TarGzPayloadEncoder;
use driver_submit::rpc::ReqwestHttpClientFactory;
use driver_submit::ssl::NoTlsSslProvider;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Submits a driver application to a Kubernetes cluster.
#[derive(Parser, Debug)]
#[command(name = "driver-submit", version)]
struct Cli {
    /// Main application resource: a local file, a `local://` container path,
    /// or a remote URL.
    main_app_resource: String,
    /// Fully-qualified entry-point class the driver should invoke.
    main_class: String,
    /// Arguments forwarded verbatim to the application.
    app_args: Vec<String>,

    #[arg(long, default_value = "default")]
    namespace: String,
    #[arg(long)]
    master: String,
    #[arg(long)]
    app_name: Option<String>,
    #[arg(long)]
    driver_docker_image: String,
    #[arg(long)]
    service_account: Option<String>,
    #[arg(long)]
    driver_labels: Option<String>,
    #[arg(long, default_value_t = driver_submit::constants::DEFAULT_UI_PORT)]
    ui_port: u16,
    #[arg(long, default_value = "7078")]
    driver_port: u16,
    #[arg(long, default_value = "7079")]
    blockmanager_port: u16,
    #[arg(long)]
    ca_cert_file: Option<PathBuf>,
    #[arg(long)]
    client_key_file: Option<PathBuf>,
    #[arg(long)]
    client_cert_file: Option<PathBuf>,
    #[arg(long, default_value = "300")]
    driver_submit_timeout_secs: u64,
    #[arg(long)]
    expose_ingress: bool,
    #[arg(long)]
    ingress_base_path: Option<String>,
    #[arg(long)]
    wait_for_app_completion: bool,
    #[arg(long, default_value = "30")]
    report_interval: u64,
    /// Arbitrary user property, repeatable: `--conf key=value`.
    #[arg(long = "conf", value_parser = parse_conf)]
    conf: Vec<(String, String)>,
    /// Local files to upload alongside the main resource.
    #[arg(long)]
    files: Vec<PathBuf>,
    /// Local jars to upload alongside the main resource.
    #[arg(long)]
    jars: Vec<PathBuf>,

    /// Increase log verbosity; repeatable.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_conf(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))
}

fn setup_tracing(verbose: u8) {
    let directive = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let config = SubmitConfig {
        namespace: cli.namespace,
        master: cli.master,
        app_name: cli.app_name.unwrap_or_else(|| cli.main_class.clone()),
        driver_docker_image: cli.driver_docker_image,
        service_account: cli.service_account,
        driver_labels: cli.driver_labels,
        ui_port: cli.ui_port,
        driver_port: cli.driver_port,
        blockmanager_port: cli.blockmanager_port,
        ca_cert_file: cli.ca_cert_file,
        client_key_file: cli.client_key_file,
        client_cert_file: cli.client_cert_file,
        driver_submit_timeout_secs: cli.driver_submit_timeout_secs,
        expose_ingress: cli.expose_ingress,
        ingress_base_path: cli.ingress_base_path,
        wait_for_app_completion: cli.wait_for_app_completion,
        report_interval_secs: cli.report_interval,
        properties: cli.conf.into_iter().collect::<BTreeMap<_, _>>(),
    };

    let orchestrator = Orchestrator::new(
        config,
        Box::new(NoTlsSslProvider),
        Box::new(TarGzPayloadEncoder),
        Box::new(ReqwestHttpClientFactory),
    );

    let outcome = orchestrator
        .submit(SubmitRequest {
            main_resource: cli.main_app_resource,
            main_class: cli.main_class,
            app_args: cli.app_args,
            files: cli.files,
            jars: cli.jars,
        })
        .await;

    match outcome {
        Ok(outcome) => {
            tracing::info!(app_id = %outcome.app_id, "submission complete");
            std::process::exit(outcome.exit_code());
        }
        Err(err) => {
            tracing::error!(error = %err, "submission failed");
            std::process::exit(1);
        }
    }
}
