use clap::{crate_version, Arg, ArgAction, ArgGroup, ArgMatches, Command};

use super::{LogFormat, LogLevel, TxKindArg, VoteRevisionArg};

/// Low-level `clap` object which provides with `value_source` which
/// indicates whether an option was set by the user (cli/env) or by the
/// default value.
///
/// This also encapsulates the core configuation that is supported for the cli, env,
/// and TOML (file-based) configuration.
pub(super) fn get_matches() -> ArgMatches {
    command().get_matches()
}

pub(super) fn command() -> Command {
    Command::new("govern")
        .about("Submit and inspect on-chain governance proposals")
        .version(crate_version!()) // pick the version from `Cargo.toml`
        .propagate_version(true)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("propose")
                .about("Submit a proposal and print its id")
                .arg(proposal_type_arg())
                .arg(
                    Arg::new("title")
                        .help("Proposal title")
                        .long("title")
                        .required(true),
                )
                .arg(
                    Arg::new("desc")
                        .help("Proposal description")
                        .long("desc")
                        .default_value(""),
                )
                .arg(
                    Arg::new("block")
                        .help("Anchor block number of the proposal")
                        .long("block")
                        .required(true)
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("extra")
                        .help("Type specific payload as JSON")
                        .long("extra"),
                ),
        )
        .subcommand(
            Command::new("vote")
                .about("Vote on a proposal")
                .arg(proposal_type_arg())
                .arg(proposal_id_arg())
                .arg(
                    Arg::new("approve")
                        .help("Vote for the proposal")
                        .long("approve")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("reject")
                        .help("Vote against the proposal")
                        .long("reject")
                        .action(ArgAction::SetTrue),
                )
                .group(
                    ArgGroup::new("choice")
                        .args(["approve", "reject"])
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("proposal")
                .about("Read a proposal")
                .arg(proposal_id_arg()),
        )
        .subcommand(
            Command::new("latest-id")
                .about("Read the latest proposal id of a contract")
                .arg(
                    Arg::new("contract")
                        .help("Contract address, defaults to the governance contract")
                        .long("contract"),
                ),
        )
        .subcommand(Command::new("status").about("Print the node status"))
        .subcommand(Command::new("generate-key").about("Generate a new secret key"))
        .arg(
            Arg::new("root-dir")
                .help("Root directory where the config file is stored")
                .short('r')
                .long("root-dir")
                .value_name("ROOT_DIR")
                .env("GOVERN_ROOT_DIR")
                .value_parser(clap::value_parser!(String))
                .default_value("~/.govern"),
        )
        .arg(
            Arg::new("log-level")
                .help("Log level")
                .long("log-level")
                .value_name("LOG_LEVEL")
                .env("LOG_LEVEL")
                .value_parser(clap::builder::EnumValueParser::<LogLevel>::new())
                .default_value("INFO"),
        )
        .arg(
            Arg::new("log-format")
                .help("Log format")
                .long("log-format")
                .value_name("LOG_FORMAT")
                .env("LOG_FORMAT")
                .value_parser(clap::builder::EnumValueParser::<LogFormat>::new())
                .default_value("PRETTY"),
        )
        .arg(
            Arg::new("rpc-url")
                .help("JSON-RPC endpoint of the node")
                .long("rpc-url")
                .value_name("RPC_URL")
                .env("RPC_URL")
                .value_parser(clap::value_parser!(String))
                .default_value("http://127.0.0.1:8881"),
        )
        .arg(
            Arg::new("secret-key")
                .help("Secret key encoded as hex")
                .long("secret-key")
                .value_name("SECRET_KEY")
                .env("SECRET_KEY")
                .hide_env_values(true)
                .value_parser(clap::value_parser!(String)),
        )
        .arg(
            Arg::new("chain-id")
                .help("Chain id, signs legacy transactions with replay protection")
                .long("chain-id")
                .value_name("CHAIN_ID")
                .env("CHAIN_ID")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("tx-kind")
                .help("Transaction serialization")
                .long("tx-kind")
                .value_name("TX_KIND")
                .env("TX_KIND")
                .value_parser(clap::builder::EnumValueParser::<TxKindArg>::new())
                .default_value("LEGACY"),
        )
        .arg(
            Arg::new("incentive-address")
                .help("Beneficiary of incentive transactions")
                .long("incentive-address")
                .value_name("INCENTIVE_ADDRESS")
                .env("INCENTIVE_ADDRESS")
                .value_parser(clap::value_parser!(String)),
        )
        .arg(
            Arg::new("max-priority-fee")
                .help("Tip of incentive transactions in wei")
                .long("max-priority-fee")
                .value_name("MAX_PRIORITY_FEE")
                .env("MAX_PRIORITY_FEE")
                .value_parser(clap::value_parser!(u64))
                .default_value("1000000000"),
        )
        .arg(
            Arg::new("gas-price")
                .help("Fixed gas price in wei, requires --gas-limit")
                .long("gas-price")
                .value_name("GAS_PRICE")
                .env("GAS_PRICE")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("gas-limit")
                .help("Fixed gas limit, requires --gas-price")
                .long("gas-limit")
                .value_name("GAS_LIMIT")
                .env("GAS_LIMIT")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("max-attempts")
                .help("Receipt queries before giving up on a transaction")
                .long("max-attempts")
                .value_name("MAX_ATTEMPTS")
                .env("MAX_ATTEMPTS")
                .value_parser(clap::value_parser!(u32).range(1..))
                .default_value("5"),
        )
        .arg(
            Arg::new("poll-interval-ms")
                .help("Delay between receipt queries in milliseconds")
                .long("poll-interval-ms")
                .value_name("POLL_INTERVAL_MS")
                .env("POLL_INTERVAL_MS")
                .value_parser(clap::value_parser!(u64))
                .default_value("500"),
        )
        .arg(
            Arg::new("vote-revision")
                .help("Signature of the contract's vote function")
                .long("vote-revision")
                .value_name("VOTE_REVISION")
                .env("VOTE_REVISION")
                .value_parser(clap::builder::EnumValueParser::<VoteRevisionArg>::new())
                .default_value("BASIC"),
        )
}

fn proposal_type_arg() -> Arg {
    Arg::new("type")
        .help("Proposal type, by name (e.g. NodeAdd) or numeric code")
        .long("type")
        .required(true)
}

fn proposal_id_arg() -> Arg {
    Arg::new("id")
        .help("Proposal id")
        .long("id")
        .required(true)
        .value_parser(clap::value_parser!(u64))
}
