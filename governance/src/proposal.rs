use crate::{GovernError, Result};
use abi::{int_to_i128, Address, ParamType, Token, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::HashMap, fmt, str::FromStr};
use transaction::TxHash;

/// The governance system contract.
pub const GOVERNANCE_CONTRACT: Address = Address::new([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x10, 0x01,
]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProposalType {
    CouncilElect,
    NodeUpgrade,
    NodeAdd,
    NodeRemove,
    WhiteListProviderAdd,
    WhiteListProviderRemove,
    GasUpdate,
}

impl ProposalType {
    pub const ALL: [ProposalType; 7] = [
        ProposalType::CouncilElect,
        ProposalType::NodeUpgrade,
        ProposalType::NodeAdd,
        ProposalType::NodeRemove,
        ProposalType::WhiteListProviderAdd,
        ProposalType::WhiteListProviderRemove,
        ProposalType::GasUpdate,
    ];

    /// Code used on the wire
    pub fn code(self) -> u8 {
        match self {
            ProposalType::CouncilElect => 0,
            ProposalType::NodeUpgrade => 1,
            ProposalType::NodeAdd => 2,
            ProposalType::NodeRemove => 3,
            ProposalType::WhiteListProviderAdd => 4,
            ProposalType::WhiteListProviderRemove => 5,
            ProposalType::GasUpdate => 6,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            ProposalType::CouncilElect => "CouncilElect",
            ProposalType::NodeUpgrade => "NodeUpgrade",
            ProposalType::NodeAdd => "NodeAdd",
            ProposalType::NodeRemove => "NodeRemove",
            ProposalType::WhiteListProviderAdd => "WhiteListProviderAdd",
            ProposalType::WhiteListProviderRemove => "WhiteListProviderRemove",
            ProposalType::GasUpdate => "GasUpdate",
        }
    }

    /// Shape of extra data this type of proposal carries
    pub fn extra_kind(self) -> ExtraKind {
        match self {
            ProposalType::CouncilElect => ExtraKind::Council,
            ProposalType::WhiteListProviderAdd | ProposalType::WhiteListProviderRemove => {
                ExtraKind::Whitelist
            }
            _ => ExtraKind::Raw,
        }
    }
}

impl fmt::Display for ProposalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts the type name (`CouncilElect`) or its code (`0`).
impl FromStr for ProposalType {
    type Err = GovernError;

    fn from_str(s: &str) -> Result<Self> {
        let by_code = s.parse::<u8>().ok().and_then(Self::from_code);
        by_code
            .or_else(|| {
                Self::ALL
                    .into_iter()
                    .find(|ty| ty.name().eq_ignore_ascii_case(s))
            })
            .ok_or_else(|| GovernError::validation(format!("unknown proposal type {s:?}")))
    }
}

/// Contract each proposal type is sent to, plus the contract proposals are
/// read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractRegistry {
    governance: Address,
    contracts: HashMap<ProposalType, Address>,
}

impl Default for ContractRegistry {
    fn default() -> Self {
        Self {
            governance: GOVERNANCE_CONTRACT,
            contracts: ProposalType::ALL
                .into_iter()
                .map(|ty| (ty, GOVERNANCE_CONTRACT))
                .collect(),
        }
    }
}

impl ContractRegistry {
    /// No proposal type resolves; reads still go to the governance contract.
    pub fn empty() -> Self {
        Self {
            governance: GOVERNANCE_CONTRACT,
            contracts: HashMap::new(),
        }
    }

    pub fn governance(&self) -> Address {
        self.governance
    }

    pub fn with_governance(mut self, address: Address) -> Self {
        self.governance = address;
        self
    }

    pub fn with(mut self, ty: ProposalType, address: Address) -> Self {
        self.set(ty, address);
        self
    }

    pub fn set(&mut self, ty: ProposalType, address: Address) {
        self.contracts.insert(ty, address);
    }

    pub fn resolve(&self, ty: ProposalType) -> Result<Address> {
        self.contracts
            .get(&ty)
            .copied()
            .ok_or_else(|| GovernError::validation(format!("no contract registered for {ty}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub address: Address,
    pub weight: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistProvider {
    #[serde(rename = "whitelistProviderAddr")]
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouncilExtra {
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistExtra {
    pub providers: Vec<WhitelistProvider>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraKind {
    Council,
    Whitelist,
    Raw,
}

impl fmt::Display for ExtraKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtraKind::Council => f.write_str("council"),
            ExtraKind::Whitelist => f.write_str("whitelist"),
            ExtraKind::Raw => f.write_str("raw"),
        }
    }
}

/// Extra data attached to a proposal, serialized as JSON on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProposalExtra {
    Council(CouncilExtra),
    Whitelist(WhitelistExtra),
    /// Free-form payload for types without a dedicated shape
    Raw(Value),
}

impl ProposalExtra {
    pub fn kind(&self) -> ExtraKind {
        match self {
            ProposalExtra::Council(_) => ExtraKind::Council,
            ProposalExtra::Whitelist(_) => ExtraKind::Whitelist,
            ProposalExtra::Raw(_) => ExtraKind::Raw,
        }
    }

    /// Parses `value` into the shape `ty` expects.
    pub fn from_json(ty: ProposalType, value: Value) -> Result<Self> {
        let invalid =
            |e: serde_json::Error| GovernError::validation(format!("invalid {ty} extra: {e}"));
        Ok(match ty.extra_kind() {
            ExtraKind::Council => {
                ProposalExtra::Council(serde_json::from_value(value).map_err(invalid)?)
            }
            ExtraKind::Whitelist => {
                ProposalExtra::Whitelist(serde_json::from_value(value).map_err(invalid)?)
            }
            ExtraKind::Raw => ProposalExtra::Raw(value),
        })
    }
}

/// A proposal whose extra data is known to match its type.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalRequest {
    proposal_type: ProposalType,
    title: String,
    description: String,
    anchor_block: u64,
    extra: ProposalExtra,
}

impl ProposalRequest {
    pub fn new(
        proposal_type: ProposalType,
        title: impl Into<String>,
        description: impl Into<String>,
        anchor_block: u64,
        extra: ProposalExtra,
    ) -> Result<Self> {
        let expected = proposal_type.extra_kind();
        if extra.kind() != expected {
            return Err(GovernError::validation(format!(
                "{proposal_type} proposal requires {expected} extra, got {}",
                extra.kind()
            )));
        }

        Ok(Self {
            proposal_type,
            title: title.into(),
            description: description.into(),
            anchor_block,
            extra,
        })
    }

    pub fn proposal_type(&self) -> ProposalType {
        self.proposal_type
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn anchor_block(&self) -> u64 {
        self.anchor_block
    }

    pub fn extra(&self) -> &ProposalExtra {
        &self.extra
    }

    /// JSON encoding of the extra data as sent to the contract
    pub fn extra_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.extra)
            .map_err(|e| GovernError::validation(format!("failed to serialize extra: {e}")))
    }

    pub(crate) fn into_tokens(self) -> Result<Vec<Token>> {
        let extra = self.extra_bytes()?;
        Ok(vec![
            Token::uint8(self.proposal_type.code()),
            Token::string(self.title),
            Token::string(self.description),
            Token::uint64(self.anchor_block),
            Token::bytes(extra),
        ])
    }
}

/// A proposal as stored by the governance contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Proposal {
    #[serde(rename = "ID", serialize_with = "decimal::serialize")]
    pub id: U256,
    #[serde(rename = "Type")]
    pub kind: i128,
    pub strategy: i128,
    pub proposer: String,
    pub title: String,
    pub desc: String,
    #[serde(serialize_with = "decimal::serialize")]
    pub block_number: U256,
    pub total_votes: i128,
    pub pass_votes: Vec<String>,
    pub reject_votes: Vec<String>,
    #[serde(serialize_with = "decimal::serialize")]
    pub status: U256,
    pub extra: String,
    #[serde(serialize_with = "decimal::serialize")]
    pub created_block_number: U256,
    #[serde(serialize_with = "decimal::serialize")]
    pub effective_block_number: U256,
}

impl Proposal {
    /// Return type of `proposal(uint64)`
    pub fn param_type() -> ParamType {
        let strings = || ParamType::Array(Box::new(ParamType::String));
        ParamType::Tuple(vec![
            ParamType::Uint(256),
            ParamType::Int(256),
            ParamType::Int(256),
            ParamType::String,
            ParamType::String,
            ParamType::String,
            ParamType::Uint(256),
            ParamType::Int(256),
            strings(),
            strings(),
            ParamType::Uint(256),
            ParamType::String,
            ParamType::Uint(256),
            ParamType::Uint(256),
        ])
    }

    pub fn proposal_type(&self) -> Option<ProposalType> {
        u8::try_from(self.kind).ok().and_then(ProposalType::from_code)
    }

    pub(crate) fn from_token(token: Token) -> abi::Result<Self> {
        let found = token.param_type();
        let mut fields = Fields::new(token.into_tuple().ok_or_else(|| {
            abi::Error::TypeMismatch {
                index: 0,
                expected: Self::param_type().to_string(),
                found: found.to_string(),
            }
        })?);

        Ok(Proposal {
            id: fields.uint(256)?,
            kind: fields.int()?,
            strategy: fields.int()?,
            proposer: fields.string()?,
            title: fields.string()?,
            desc: fields.string()?,
            block_number: fields.uint(256)?,
            total_votes: fields.int()?,
            pass_votes: fields.strings()?,
            reject_votes: fields.strings()?,
            status: fields.uint(256)?,
            extra: fields.string()?,
            created_block_number: fields.uint(256)?,
            effective_block_number: fields.uint(256)?,
        })
    }
}

/// Typed access to the decoded fields of a tuple, in declaration order.
struct Fields {
    tokens: std::vec::IntoIter<Token>,
    index: usize,
}

impl Fields {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into_iter(),
            index: 0,
        }
    }

    fn next(&mut self, expected: ParamType) -> abi::Result<Token> {
        let index = self.index;
        self.index += 1;
        match self.tokens.next() {
            Some(token) if token.param_type() == expected => Ok(token),
            Some(token) => Err(abi::Error::TypeMismatch {
                index,
                expected: expected.to_string(),
                found: token.param_type().to_string(),
            }),
            None => Err(abi::Error::ArgumentCount {
                expected: index + 1,
                found: index,
            }),
        }
    }

    fn uint(&mut self, bits: u16) -> abi::Result<U256> {
        match self.next(ParamType::Uint(bits))? {
            Token::Uint { value, .. } => Ok(value),
            _ => Err(abi::Error::ValueOutOfRange {
                ty: ParamType::Uint(bits).to_string(),
            }),
        }
    }

    fn int(&mut self) -> abi::Result<i128> {
        let ty = ParamType::Int(256);
        let value = match self.next(ty.clone())? {
            Token::Int { value, .. } => int_to_i128(value),
            _ => None,
        };
        value.ok_or(abi::Error::ValueOutOfRange { ty: ty.to_string() })
    }

    fn string(&mut self) -> abi::Result<String> {
        match self.next(ParamType::String)? {
            Token::String(s) => Ok(s),
            _ => Err(abi::Error::ValueOutOfRange {
                ty: ParamType::String.to_string(),
            }),
        }
    }

    fn strings(&mut self) -> abi::Result<Vec<String>> {
        let ty = ParamType::Array(Box::new(ParamType::String));
        let items = match self.next(ty.clone())? {
            Token::Array(_, items) => items,
            _ => vec![],
        };
        items
            .into_iter()
            .map(|item| {
                item.into_string()
                    .ok_or_else(|| abi::Error::ValueOutOfRange { ty: ty.to_string() })
            })
            .collect()
    }
}

/// Result of a successful proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeReceipt {
    pub tx_hash: TxHash,
    pub proposal_type: ProposalType,
    #[serde(serialize_with = "decimal::serialize")]
    pub proposal_id: U256,
}

/// Serializes 256-bit integers as decimal strings, JSON numbers cannot hold them.
pub mod decimal {
    use abi::U256;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }
}
