//! Configuration for govern - using the CLI (clap), env (clap), and configuration file (toml).

mod clap_config;
mod toml_config;

use abi::{Address, U256};
use clap::{parser::ValueSource, ArgMatches, ValueEnum};
use governance::{
    ContractRegistry, GovernConfig, GovernError, PollConfig, ProposalType, StaticFeePolicy,
    TxKind, VoteRevision,
};
use serde::Deserialize;
use std::{collections::HashMap, time::Duration};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("toml config error")]
    TomlConfig(#[from] toml_config::TomlConfigError),

    #[error("--gas-price and --gas-limit must be set together")]
    PartialFeePolicy,

    #[error("invalid address for {key}")]
    InvalidAddress {
        key: String,
        #[source]
        source: abi::Error,
    },

    #[error("unknown contract key {0:?}")]
    UnknownContract(String, #[source] GovernError),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Contract registry key for the contract proposals are read from.
const GOVERNANCE_KEY: &str = "governance";

#[derive(Debug)]
pub struct Config {
    pub command: GovernCommand,

    /// Root directory where the config file is stored
    pub root_dir: String,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// JSON-RPC endpoint of the node
    pub rpc_url: String,

    /// Secret key encoded as hex
    pub secret_key: Option<String>,

    pub chain_id: Option<u64>,

    pub tx_kind: TxKindArg,

    /// Beneficiary of incentive transactions
    pub incentive_address: Option<String>,

    /// Tip of incentive transactions in wei
    pub max_priority_fee: u64,

    /// Fixed gas price, only used together with `gas_limit`
    pub gas_price: Option<u64>,

    pub gas_limit: Option<u64>,

    /// Receipt queries per transaction
    pub max_attempts: u32,

    pub poll_interval_ms: u64,

    pub vote_revision: VoteRevisionArg,

    /// Contract address overrides, only read from the TOML file
    pub contracts: HashMap<String, String>,
}

impl Config {
    pub fn new() -> ConfigResult<Self> {
        let clap_matches = clap_config::get_matches();

        let mut config: Config = clap_matches.clone().into();
        let toml_config = toml_config::read_config(&config.root_dir)?;
        config.merge_toml_config(toml_config, &clap_matches);

        Ok(config)
    }

    fn was_supplied_by_user(key: &str, matches: &ArgMatches) -> bool {
        !matches!(matches.value_source(key), Some(ValueSource::DefaultValue))
    }

    /// The order of priority is (in decreasing order):
    /// cli -> env -> toml -> default
    ///
    /// Fields with a default value are replaced by the TOML value when the
    /// user did not supply them. Optional fields are filled from the TOML
    /// file when unset.
    fn merge_toml_config(
        &mut self,
        toml_config: Option<toml_config::TomlConfig>,
        matches: &ArgMatches,
    ) {
        let Some(toml_config) = toml_config else {
            return;
        };
        let core = toml_config.core;

        if let Some(log_level) = core.log_level {
            if !Self::was_supplied_by_user("log-level", matches) {
                self.log_level = log_level;
            }
        }

        if let Some(log_format) = core.log_format {
            if !Self::was_supplied_by_user("log-format", matches) {
                self.log_format = log_format;
            }
        }

        if let Some(rpc_url) = core.rpc_url {
            if !Self::was_supplied_by_user("rpc-url", matches) {
                self.rpc_url = rpc_url;
            }
        }

        if self.secret_key.is_none() {
            self.secret_key = core.secret_key;
        }

        if self.chain_id.is_none() {
            self.chain_id = core.chain_id;
        }

        if let Some(tx_kind) = core.tx_kind {
            if !Self::was_supplied_by_user("tx-kind", matches) {
                self.tx_kind = tx_kind;
            }
        }

        if self.incentive_address.is_none() {
            self.incentive_address = core.incentive_address;
        }

        if let Some(max_priority_fee) = core.max_priority_fee {
            if !Self::was_supplied_by_user("max-priority-fee", matches) {
                self.max_priority_fee = max_priority_fee;
            }
        }

        if self.gas_price.is_none() {
            self.gas_price = core.gas_price;
        }

        if self.gas_limit.is_none() {
            self.gas_limit = core.gas_limit;
        }

        if let Some(max_attempts) = core.max_attempts {
            if !Self::was_supplied_by_user("max-attempts", matches) {
                self.max_attempts = max_attempts.max(1);
            }
        }

        if let Some(poll_interval_ms) = core.poll_interval_ms {
            if !Self::was_supplied_by_user("poll-interval-ms", matches) {
                self.poll_interval_ms = poll_interval_ms;
            }
        }

        if let Some(vote_revision) = core.vote_revision {
            if !Self::was_supplied_by_user("vote-revision", matches) {
                self.vote_revision = vote_revision;
            }
        }

        self.contracts = toml_config.contracts;
    }

    pub fn govern_config(&self) -> ConfigResult<GovernConfig> {
        let incentive_address = self
            .incentive_address
            .as_deref()
            .map(|value| parse_address("incentive-address", value))
            .transpose()?;

        Ok(GovernConfig {
            tx_kind: self.tx_kind.into(),
            chain_id: self.chain_id,
            incentive_address,
            max_priority_fee: U256::from(self.max_priority_fee),
            vote_revision: self.vote_revision.into(),
            poll: PollConfig {
                max_attempts: self.max_attempts,
                interval: Duration::from_millis(self.poll_interval_ms),
            },
        })
    }

    /// A fixed fee source when both the gas price and the gas limit are set,
    /// `None` to query the node.
    pub fn fee_policy(&self) -> ConfigResult<Option<StaticFeePolicy>> {
        match (self.gas_price, self.gas_limit) {
            (Some(gas_price), Some(gas_limit)) => {
                Ok(Some(StaticFeePolicy::new(gas_price, gas_limit)))
            }
            (None, None) => Ok(None),
            _ => Err(ConfigError::PartialFeePolicy),
        }
    }

    /// Default addresses overridden by the `[contracts]` table.
    pub fn contract_registry(&self) -> ConfigResult<ContractRegistry> {
        let mut registry = ContractRegistry::default();
        for (key, value) in &self.contracts {
            let address = parse_address(key, value)?;
            if key == GOVERNANCE_KEY {
                registry = registry.with_governance(address);
                continue;
            }

            let proposal_type = key
                .parse::<ProposalType>()
                .map_err(|err| ConfigError::UnknownContract(key.clone(), err))?;
            registry.set(proposal_type, address);
        }
        Ok(registry)
    }
}

fn parse_address(key: &str, value: &str) -> ConfigResult<Address> {
    value
        .parse::<Address>()
        .map_err(|source| ConfigError::InvalidAddress {
            key: key.to_string(),
            source,
        })
}

// To convert from an ArgMatches into the main `Config` entity.
// `clap` does not provide an automated way to do so in builder mode.
#[allow(clippy::unwrap_used)]
impl From<ArgMatches> for Config {
    fn from(am: ArgMatches) -> Self {
        Config {
            command: GovernCommand::from_matches(&am),
            root_dir: am.get_one::<String>("root-dir").unwrap().clone(),
            log_level: *am.get_one::<LogLevel>("log-level").unwrap(),
            log_format: *am.get_one::<LogFormat>("log-format").unwrap(),
            rpc_url: am.get_one::<String>("rpc-url").unwrap().clone(),
            secret_key: am.get_one::<String>("secret-key").cloned(),
            chain_id: am.get_one::<u64>("chain-id").copied(),
            tx_kind: *am.get_one::<TxKindArg>("tx-kind").unwrap(),
            incentive_address: am.get_one::<String>("incentive-address").cloned(),
            max_priority_fee: *am.get_one::<u64>("max-priority-fee").unwrap(),
            gas_price: am.get_one::<u64>("gas-price").copied(),
            gas_limit: am.get_one::<u64>("gas-limit").copied(),
            max_attempts: *am.get_one::<u32>("max-attempts").unwrap(),
            poll_interval_ms: *am.get_one::<u64>("poll-interval-ms").unwrap(),
            vote_revision: *am.get_one::<VoteRevisionArg>("vote-revision").unwrap(),
            contracts: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GovernCommand {
    /// Submit a proposal
    Propose {
        proposal_type: String,
        title: String,
        desc: String,
        block: u64,
        extra: Option<String>,
    },
    /// Vote on a proposal
    Vote {
        proposal_type: String,
        id: u64,
        approve: bool,
    },
    /// Read a proposal
    Proposal { id: u64 },
    /// Read the latest proposal id
    LatestId { contract: Option<String> },
    /// Print the node status
    Status,
    /// Generate a new secret key
    GenerateKey,
}

impl GovernCommand {
    pub fn sends_transaction(&self) -> bool {
        matches!(
            self,
            GovernCommand::Propose { .. } | GovernCommand::Vote { .. }
        )
    }

    // Subcommands are required, so one of them has matched.
    #[allow(clippy::unwrap_used)]
    fn from_matches(am: &ArgMatches) -> Self {
        match am.subcommand() {
            Some(("propose", sub)) => GovernCommand::Propose {
                proposal_type: sub.get_one::<String>("type").unwrap().clone(),
                title: sub.get_one::<String>("title").unwrap().clone(),
                desc: sub.get_one::<String>("desc").unwrap().clone(),
                block: *sub.get_one::<u64>("block").unwrap(),
                extra: sub.get_one::<String>("extra").cloned(),
            },
            Some(("vote", sub)) => GovernCommand::Vote {
                proposal_type: sub.get_one::<String>("type").unwrap().clone(),
                id: *sub.get_one::<u64>("id").unwrap(),
                approve: sub.get_flag("approve"),
            },
            Some(("proposal", sub)) => GovernCommand::Proposal {
                id: *sub.get_one::<u64>("id").unwrap(),
            },
            Some(("latest-id", sub)) => GovernCommand::LatestId {
                contract: sub.get_one::<String>("contract").cloned(),
            },
            Some(("generate-key", _)) => GovernCommand::GenerateKey,
            _ => GovernCommand::Status,
        }
    }
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Deserialize, ValueEnum)]
#[clap(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    #[serde(rename = "DEBUG")]
    Debug,
    #[serde(rename = "INFO")]
    Info,
    #[serde(rename = "ERROR")]
    Error,
}

impl LogLevel {
    /// Filter directive for `tracing_subscriber::EnvFilter`.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Deserialize)]
#[clap(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogFormat {
    #[serde(rename = "PRETTY")]
    Pretty,
    #[serde(rename = "JSON")]
    Json,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug, Deserialize)]
#[clap(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxKindArg {
    #[serde(rename = "LEGACY")]
    Legacy,
    #[serde(rename = "INCENTIVE")]
    Incentive,
}

impl From<TxKindArg> for TxKind {
    fn from(kind: TxKindArg) -> Self {
        match kind {
            TxKindArg::Legacy => TxKind::Legacy,
            TxKindArg::Incentive => TxKind::Incentive,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug, Deserialize)]
#[clap(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteRevisionArg {
    #[serde(rename = "BASIC")]
    Basic,
    #[serde(rename = "WITH_EXTRA")]
    WithExtra,
}

impl From<VoteRevisionArg> for VoteRevision {
    fn from(revision: VoteRevisionArg) -> Self {
        match revision {
            VoteRevisionArg::Basic => VoteRevision::Basic,
            VoteRevisionArg::WithExtra => VoteRevision::WithExtra,
        }
    }
}
