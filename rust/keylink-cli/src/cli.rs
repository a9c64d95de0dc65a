use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::logging::LogFormat;

#[derive(Debug, Parser)]
#[command(name = "keylink")]
#[command(bin_name = "keylink")]
#[command(about = "Issue and check delegate keys authorized by a primary wallet", long_about = None)]
pub struct KeylinkCli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Settings that override the configuration file.
#[derive(Debug, Default, Args)]
pub struct GlobalArgs {
    /// Path to a TOML configuration file.
    #[arg(long, global = true, env = "KEYLINK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Broker the delegate key acts with.
    #[arg(long, global = true, env = "KEYLINK_BROKER_ID")]
    pub broker_id: Option<String>,

    /// Account the delegate key acts for.
    #[arg(long, global = true, env = "KEYLINK_ACCOUNT_ID")]
    pub account_id: Option<String>,

    /// Chain the delegation targets.
    #[arg(long, global = true, env = "KEYLINK_CHAIN_ID")]
    pub chain_id: Option<u64>,

    /// Registration contract on the target chain.
    #[arg(long, global = true, env = "KEYLINK_CONTRACT_ADDRESS")]
    pub contract_address: Option<String>,

    /// Delegation lifetime in seconds; 0 never expires.
    #[arg(long, global = true, env = "KEYLINK_TTL_SECS")]
    pub ttl_secs: Option<u64>,

    /// Seconds to wait for the wallet before giving up.
    #[arg(long, global = true, env = "KEYLINK_SIGNING_TIMEOUT_SECS")]
    pub signing_timeout_secs: Option<u64>,

    /// JSON file holding issued delegation records.
    #[arg(long, global = true, env = "KEYLINK_RECORD_STORE")]
    pub record_store: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, env = "KEYLINK_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Log filter, e.g. "info" or "keylink_delegation=debug". `RUST_LOG` wins.
    #[arg(long, global = true, env = "KEYLINK_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a delegate key and write its seed to a file.
    Keygen {
        /// Where to write the seed (hex, owner-only permissions).
        #[arg(long)]
        out: PathBuf,
    },

    /// Print the encoded public key for a delegate key file.
    Pubkey {
        /// Delegate key file.
        #[arg(long)]
        key: PathBuf,
    },

    /// Authorize a delegate key with an in-process primary wallet key.
    Issue {
        /// Primary wallet key file (hex secret key).
        #[arg(long, env = "KEYLINK_PRIMARY_KEY")]
        primary_key: PathBuf,

        /// Address scheme of the primary key.
        #[arg(long, value_enum, default_value_t = Scheme::Evm)]
        scheme: Scheme,

        /// Delegate key file to authorize. Generated when absent.
        #[arg(long)]
        key: Option<PathBuf>,

        /// Where to write a generated delegate key.
        #[arg(long, required_unless_present = "key")]
        out: Option<PathBuf>,
    },

    /// Check the record held for the configured slot.
    Verify {
        /// Unix seconds to check at. Defaults to now.
        #[arg(long)]
        now: Option<u64>,
    },

    /// Sign an operation with a delegate key.
    Sign {
        /// Delegate key file.
        #[arg(long)]
        key: PathBuf,

        /// Operation payload, signed as UTF-8.
        operation: String,
    },

    /// Check a delegate-signed operation against the configured slot.
    Authorize {
        /// Operation payload, as passed to `sign`.
        operation: String,

        /// Hex operation signature printed by `sign`.
        #[arg(long)]
        signature: String,

        /// Unix seconds to check at. Defaults to now.
        #[arg(long)]
        now: Option<u64>,
    },

    /// Describe every held record.
    Show,

    /// Forget the record held for the configured slot.
    Revoke,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scheme {
    Evm,
    Solana,
}
