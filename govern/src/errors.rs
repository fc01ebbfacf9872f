use crate::config::ConfigError;
use governance::{signer::SignerError, GovernError};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Govern(#[from] GovernError),

    #[error("invalid secret key")]
    Signer(#[from] SignerError),

    #[error("a secret key is required to send transactions")]
    MissingSecretKey,

    #[error("invalid --extra JSON")]
    InvalidExtra(#[source] serde_json::Error),

    #[error("invalid contract address")]
    InvalidContract(#[source] abi::Error),

    #[error("failed to serialize output")]
    Output(#[from] serde_json::Error),

    #[error("tracing parse error")]
    TracingParse(#[from] tracing_subscriber::filter::ParseError),

    #[error("error setting tracing global subscriber")]
    TracingSetGlobalDefault(#[from] tracing::subscriber::SetGlobalDefaultError),
}

impl AppError {
    /// Classification printed with the error, governance failures keep their
    /// own codes.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Govern(err) => err.code(),
            AppError::Config(_) | AppError::MissingSecretKey => "config",
            AppError::Signer(_) => "signing",
            AppError::InvalidExtra(_) | AppError::InvalidContract(_) => "validation",
            AppError::Output(_) => "output",
            AppError::TracingParse(_) | AppError::TracingSetGlobalDefault(_) => "logging",
        }
    }
}

/// The error followed by its sources, separated by `: `.
pub fn report(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(err) = source {
        message.push_str(": ");
        message.push_str(&err.to_string());
        source = err.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_includes_sources() {
        let err = AppError::Config(ConfigError::PartialFeePolicy);
        assert_eq!(
            report(&err),
            "config error: --gas-price and --gas-limit must be set together"
        );
        assert_eq!(err.code(), "config");
    }

    #[test]
    fn test_governance_codes_pass_through() {
        let err = AppError::from("Treasury".parse::<governance::ProposalType>().unwrap_err());
        assert_eq!(err.code(), "validation");
    }
}
