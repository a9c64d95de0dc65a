//! Settings with TOML file support.
//!
//! Resolution order, later wins: built-in defaults, the TOML file, then
//! command-line flags and their `KEYLINK_*` environment variables.

use std::{path::Path, path::PathBuf, time::Duration};

use anyhow::{Context, bail};
use keylink_delegation::{ChainContext, Slot};
use serde::{Deserialize, Serialize};

use crate::{cli::GlobalArgs, logging::LogFormat};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Broker the delegate key acts with.
    #[serde(default)]
    pub broker_id: String,

    /// Account the delegate key acts for.
    #[serde(default)]
    pub account_id: String,

    /// Chain the delegation targets.
    #[serde(default)]
    pub chain_id: Option<u64>,

    /// Registration contract on the target chain.
    #[serde(default)]
    pub contract_address: String,

    /// Delegation lifetime in seconds; 0 never expires.
    #[serde(default)]
    pub ttl_secs: u64,

    /// Seconds to wait for the wallet.
    #[serde(default = "default_signing_timeout_secs")]
    pub signing_timeout_secs: u64,

    /// JSON file holding issued records.
    #[serde(default = "default_record_store")]
    pub record_store: PathBuf,

    #[serde(default)]
    pub log_format: LogFormat,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_signing_timeout_secs() -> u64 {
    120
}

fn default_record_store() -> PathBuf {
    PathBuf::from("keylink-records.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            broker_id: String::new(),
            account_id: String::new(),
            chain_id: None,
            contract_address: String::new(),
            ttl_secs: 0,
            signing_timeout_secs: default_signing_timeout_secs(),
            record_store: default_record_store(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read settings from a TOML file.
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Resolve settings for one invocation.
    pub fn resolve(args: &GlobalArgs) -> anyhow::Result<Self> {
        let mut settings = match &args.config {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        settings.apply(args);
        Ok(settings)
    }

    /// Overwrite every field `args` sets.
    pub fn apply(&mut self, args: &GlobalArgs) {
        if let Some(broker_id) = &args.broker_id {
            self.broker_id.clone_from(broker_id);
        }
        if let Some(account_id) = &args.account_id {
            self.account_id.clone_from(account_id);
        }
        if let Some(chain_id) = args.chain_id {
            self.chain_id = Some(chain_id);
        }
        if let Some(contract_address) = &args.contract_address {
            self.contract_address.clone_from(contract_address);
        }
        if let Some(ttl_secs) = args.ttl_secs {
            self.ttl_secs = ttl_secs;
        }
        if let Some(signing_timeout_secs) = args.signing_timeout_secs {
            self.signing_timeout_secs = signing_timeout_secs;
        }
        if let Some(record_store) = &args.record_store {
            self.record_store.clone_from(record_store);
        }
        if let Some(log_format) = args.log_format {
            self.log_format = log_format;
        }
        if let Some(log_level) = &args.log_level {
            self.log_level.clone_from(log_level);
        }
    }

    /// The configured chain.
    pub fn chain(&self) -> anyhow::Result<ChainContext> {
        let Some(chain_id) = self.chain_id else {
            bail!("no chain id configured; set chain_id or pass --chain-id");
        };
        Ok(ChainContext::new(chain_id, self.contract_address.clone()))
    }

    /// The configured slot.
    pub fn slot(&self) -> anyhow::Result<Slot> {
        if self.broker_id.is_empty() || self.account_id.is_empty() {
            bail!("broker id and account id must both be configured");
        }
        Ok(Slot {
            broker_id: self.broker_id.clone(),
            account_id: self.account_id.clone(),
            chain_id: self.chain()?.chain_id,
        })
    }

    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }

    pub fn signing_timeout(&self) -> Duration {
        Duration::from_secs(self.signing_timeout_secs)
    }
}
