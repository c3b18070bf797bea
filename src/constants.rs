//! Fixed names and defaults shared across the provisioning protocol.
//!
//! Centralizing these avoids the classic bug of a probe path and a route
//! path drifting apart after a rename.

pub const DRIVER_CONTAINER: &str = "driver";
pub const DRIVER_CONTAINER_SECRETS_BASE_DIR: &str = "/mnt/secrets";

pub const SUBMISSION_SERVER_PORT: u16 = 7077;
pub const SUBMISSION_SERVER_PORT_NAME: &str = "submit";
pub const UI_PORT_NAME: &str = "driver-ui";
pub const SUBMISSION_SERVER_PATH_COMPONENT: &str = "submit";
pub const UI_PATH_COMPONENT: &str = "ui";

pub const ENV_SUBMISSION_SECRET_LOCATION: &str = "SUBMISSION_SECRET_LOCATION";
pub const ENV_SUBMISSION_SERVER_PORT: &str = "SUBMISSION_SERVER_PORT";
pub const ENV_SUBMISSION_SERVER_BASE_PATH: &str = "SUBMISSION_SERVER_BASE_PATH";

pub const SUBMISSION_APP_SECRET_NAME: &str = "SUBMISSION_APP_SECRET_NAME";

pub const DEFAULT_UI_PORT: u16 = 4040;

pub const SUBMISSION_CLIENT_RETRIES_INGRESS: u32 = 4;
pub const SUBMISSION_CLIENT_RETRIES_NODE_PORT: u32 = 1;

/// Reserved label key identifying the app id; custom labels may not set this.
pub const APP_ID_LABEL_KEY: &str = "driver-app-selector";
pub const DRIVER_LABEL_KEY: &str = "driver-role";
pub const DRIVER_LABEL_VALUE: &str = "driver";
pub const APP_NAME_LABEL_KEY: &str = "app-name";

pub const MASTER_URL_PREFIX: &str = "k8s://";
