use serde::Deserialize;

static CONFIG: OnceCell<Config> = OnceCell::const_new();

mod config_dir;
pub use config_dir::{find_config_file, read_config};

mod error;
pub use error::{ConfigError, ConfigResult};
use tokio::sync::OnceCell;

#[derive(Debug, Deserialize)]
pub struct Config {
    host: Host,
    app: App,
    #[serde(default)]
    grading: Grading,
    #[serde(default)]
    certificate: Certificate,
    #[serde(default)]
    payment: Payment,
}

#[derive(Debug, Deserialize)]
pub struct Host {
    bindto: String,
}

#[derive(Debug, Deserialize)]
pub struct App {
    jwt: String,
    database_uri: String,
    #[serde(default)]
    docs: bool,
    #[serde(default = "default_access_token_minutes")]
    access_token_minutes: i64,
    #[serde(default = "default_refresh_token_hours")]
    refresh_token_hours: i64,
}

#[derive(Debug, Deserialize)]
pub struct Grading {
    url: String,
    timeout_secs: u64,
    retries: u32,
    use_ai: bool,
}

#[derive(Debug, Deserialize)]
pub struct Certificate {
    issuer_name: String,
    issuer_wallet: String,
    signing_key: String,
    network: String,
}

#[derive(Debug, Deserialize)]
pub struct Payment {
    checksum_key: String,
    currency: String,
}

const MAX_GRADING_RETRIES: u32 = 5;

fn default_access_token_minutes() -> i64 {
    15
}

fn default_refresh_token_hours() -> i64 {
    24
}

impl Default for Grading {
    fn default() -> Self {
        Self {
            url: String::from("http://localhost:8000"),
            timeout_secs: 60,
            retries: 3,
            use_ai: true,
        }
    }
}

impl Default for Certificate {
    fn default() -> Self {
        Self {
            issuer_name: String::from("StudyHub"),
            issuer_wallet: String::from("0x0000000000000000000000000000000000000000"),
            signing_key: String::from("studyhub-dev-signing-key"),
            network: String::from("sepolia"),
        }
    }
}

impl Default for Payment {
    fn default() -> Self {
        Self {
            checksum_key: String::from("studyhub-dev-checksum-key"),
            currency: String::from("VND"),
        }
    }
}

impl Config {
    #[tracing::instrument]
    pub async fn get_or_init(use_local: bool) -> &'static Config {
        CONFIG
            .get_or_init(|| async {
                let read_cfg = |use_local| -> ConfigResult<Self> {
                    let bytes = read_config(use_local)?;
                    let config: Self = toml::from_slice(&bytes)?;
                    Ok(config)
                };

                match read_cfg(use_local) {
                    Ok(c) => c,
                    Err(e) => {
                        if !matches!(e, error::ConfigError::ConfigNotFound) {
                            crate::error::log_error(&e);
                        }
                        tracing::error!("Config not found.");
                        std::process::exit(1);
                    }
                }
            })
            .await
    }

    pub async fn current() -> &'static Config {
        match CONFIG.get() {
            Some(config) => config,
            None => Self::get_or_init(true).await,
        }
    }

    #[inline]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[inline]
    pub fn app(&self) -> &App {
        &self.app
    }

    #[inline]
    pub fn grading(&self) -> &Grading {
        &self.grading
    }

    #[inline]
    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    #[inline]
    pub fn payment(&self) -> &Payment {
        &self.payment
    }
}

impl Host {
    #[inline]
    pub fn bindto(&self) -> &str {
        &self.bindto
    }
}

impl App {
    #[inline]
    pub fn jwt(&self) -> &str {
        &self.jwt
    }

    #[inline]
    pub fn database_uri(&self) -> &str {
        &self.database_uri
    }

    #[inline]
    pub fn docs(&self) -> bool {
        self.docs
    }

    #[inline]
    pub fn access_token_minutes(&self) -> i64 {
        self.access_token_minutes
    }

    #[inline]
    pub fn refresh_token_hours(&self) -> i64 {
        self.refresh_token_hours
    }
}

impl Grading {
    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[inline]
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    #[inline]
    pub fn retries(&self) -> u32 {
        self.retries.min(MAX_GRADING_RETRIES)
    }

    #[inline]
    pub fn use_ai(&self) -> bool {
        self.use_ai
    }
}

impl Certificate {
    #[inline]
    pub fn issuer_name(&self) -> &str {
        &self.issuer_name
    }

    #[inline]
    pub fn issuer_wallet(&self) -> &str {
        &self.issuer_wallet
    }

    #[inline]
    pub fn signing_key(&self) -> &str {
        &self.signing_key
    }

    #[inline]
    pub fn network(&self) -> &str {
        &self.network
    }
}

impl Payment {
    #[inline]
    pub fn checksum_key(&self) -> &str {
        &self.checksum_key
    }

    #[inline]
    pub fn currency(&self) -> &str {
        &self.currency
    }
}
