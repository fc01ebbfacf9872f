//! File-based (TOML) configuration, read from `<root_dir>/config/config.toml`.

use super::{ConfigResult, LogFormat, LogLevel, TxKindArg, VoteRevisionArg};
use crate::util;
use serde::Deserialize;
use std::{collections::HashMap, fs};

#[derive(Debug, thiserror::Error)]
pub enum TomlConfigError {
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TomlConfig {
    #[serde(default)]
    pub core: CoreConfig,

    /// Proposal type name (or `governance`) to contract address
    #[serde(default)]
    pub contracts: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CoreConfig {
    pub log_level: Option<LogLevel>,
    pub log_format: Option<LogFormat>,
    pub rpc_url: Option<String>,
    pub secret_key: Option<String>,
    pub chain_id: Option<u64>,
    pub tx_kind: Option<TxKindArg>,
    pub incentive_address: Option<String>,
    pub max_priority_fee: Option<u64>,
    pub gas_price: Option<u64>,
    pub gas_limit: Option<u64>,
    pub max_attempts: Option<u32>,
    pub poll_interval_ms: Option<u64>,
    pub vote_revision: Option<VoteRevisionArg>,
}

/// Read the TOML configuration file, if present in the `config` sub-directory under the
/// root directory.
pub(super) fn read_config(root_dir: &str) -> ConfigResult<Option<TomlConfig>> {
    util::get_toml_config_file(root_dir, "config").map_or(Ok(None), |config_file| {
        if !config_file.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(config_file).map_err(TomlConfigError::from)?;
        Ok(Some(parse_config(&contents)?))
    })
}

pub(super) fn parse_config(contents: &str) -> Result<TomlConfig, TomlConfigError> {
    Ok(toml::from_str::<TomlConfig>(contents)?)
}
