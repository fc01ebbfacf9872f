use crate::{
    gas::{self, FeePolicy, GasParams},
    poll::{PollConfig, PollState, ReceiptPoller, Sleeper, TokioSleeper},
    proposal::{
        ContractRegistry, Proposal, ProposalExtra, ProposalRequest, ProposalType, ProposeReceipt,
    },
    rpc::{BlockTag, NodeRpc, Receipt},
    signer::Signer,
    submit, GovernError, Result,
};
use abi::{Address, Function, ParamType, Token, U256};
use std::sync::Arc;
use tracing::{debug, info};
use transaction::{IncentiveTransaction, LegacyTransaction, Transaction, TxHash};

/// How transactions are serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxKind {
    #[default]
    Legacy,
    Incentive,
}

/// Signature of the contract's `vote` function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoteRevision {
    /// `vote(uint64,uint8)`
    #[default]
    Basic,
    /// `vote(uint64,uint8,bytes)`, sent with empty extra bytes
    WithExtra,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernConfig {
    pub tx_kind: TxKind,
    /// Replay protection for legacy transactions. Incentive transactions query
    /// the node when unset.
    pub chain_id: Option<u64>,
    /// Beneficiary of incentive transactions. Always taken from configuration,
    /// the node is never asked for it. Serialized as the empty string when
    /// unset.
    pub incentive_address: Option<Address>,
    /// Tip of incentive transactions
    pub max_priority_fee: U256,
    pub vote_revision: VoteRevision,
    pub poll: PollConfig,
}

impl Default for GovernConfig {
    fn default() -> Self {
        Self {
            tx_kind: TxKind::default(),
            chain_id: None,
            incentive_address: None,
            max_priority_fee: U256::from(1_000_000_000u64),
            vote_revision: VoteRevision::default(),
            poll: PollConfig::default(),
        }
    }
}

/// Client for the governance contracts.
///
/// Transactions from one signer are not coordinated: concurrent `propose` or
/// `vote` calls may read the same nonce, callers must serialize them.
pub struct Govern {
    rpc: Arc<dyn NodeRpc>,
    signer: Option<Arc<dyn Signer>>,
    fee_policy: Option<Arc<dyn FeePolicy>>,
    sleeper: Arc<dyn Sleeper>,
    contracts: ContractRegistry,
    config: GovernConfig,
}

impl Govern {
    /// A client for reads only, writes need [`Govern::with_signer`].
    pub fn new(rpc: Arc<dyn NodeRpc>) -> Self {
        Self {
            rpc,
            signer: None,
            fee_policy: None,
            sleeper: Arc::new(TokioSleeper),
            contracts: ContractRegistry::default(),
            config: GovernConfig::default(),
        }
    }

    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn with_fee_policy(mut self, fee_policy: Arc<dyn FeePolicy>) -> Self {
        self.fee_policy = Some(fee_policy);
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_contracts(mut self, contracts: ContractRegistry) -> Self {
        self.contracts = contracts;
        self
    }

    pub fn with_config(mut self, config: GovernConfig) -> Self {
        self.config = config;
        self
    }

    pub fn address(&self) -> Option<Address> {
        self.signer.as_ref().map(|signer| signer.address())
    }

    pub fn contracts(&self) -> &ContractRegistry {
        &self.contracts
    }

    /// Creates a proposal and returns the id the contract assigned to it.
    pub async fn propose(
        &self,
        proposal_type: ProposalType,
        title: &str,
        description: &str,
        anchor_block: u64,
        extra: ProposalExtra,
    ) -> Result<ProposeReceipt> {
        let request = ProposalRequest::new(proposal_type, title, description, anchor_block, extra)?;
        self.submit_proposal(request).await
    }

    #[tracing::instrument(skip(self, request), fields(proposal_type = %request.proposal_type()))]
    pub async fn submit_proposal(&self, request: ProposalRequest) -> Result<ProposeReceipt> {
        let proposal_type = request.proposal_type();
        let contract = self.contracts.resolve(proposal_type)?;
        let data = propose_function()
            .encode_call(&request.into_tokens()?)
            .map_err(GovernError::Encode)?;

        let (tx_hash, receipt) = self.transact(contract, data).await?;
        let proposal_id =
            proposal_id(&receipt).ok_or(GovernError::IdentifierMissing { tx_hash })?;

        info!(%tx_hash, %proposal_id, "proposal created");
        Ok(ProposeReceipt {
            tx_hash,
            proposal_type,
            proposal_id,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn vote(
        &self,
        proposal_type: ProposalType,
        proposal_id: u64,
        approve: bool,
    ) -> Result<TxHash> {
        let contract = self.contracts.resolve(proposal_type)?;
        let revision = self.config.vote_revision;

        let mut args = vec![Token::uint64(proposal_id), Token::uint8(approve as u8)];
        if revision == VoteRevision::WithExtra {
            args.push(Token::bytes(vec![]));
        }
        let data = vote_function(revision)
            .encode_call(&args)
            .map_err(GovernError::Encode)?;

        let (tx_hash, _) = self.transact(contract, data).await?;
        info!(%tx_hash, "vote accepted");
        Ok(tx_hash)
    }

    /// `None` when the contract returns no data for the id.
    #[tracing::instrument(skip(self))]
    pub async fn get_proposal(&self, proposal_id: u64) -> Result<Option<Proposal>> {
        let function = proposal_function();
        let data = function
            .encode_call(&[Token::uint64(proposal_id)])
            .map_err(GovernError::Encode)?;

        let output = self
            .rpc
            .call(
                Some(Address::ZERO),
                self.contracts.governance(),
                &data,
                BlockTag::Latest,
            )
            .await?;

        match function.decode_output(&output)?.into_iter().next() {
            Some(token) => Ok(Some(Proposal::from_token(token)?)),
            None => {
                debug!("proposal not found");
                Ok(None)
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_latest_proposal_id(&self, contract: Address) -> Result<Option<U256>> {
        let function = latest_proposal_id_function();
        let data = function.encode_call(&[]).map_err(GovernError::Encode)?;

        let output = self
            .rpc
            .call(None, contract, &data, BlockTag::Latest)
            .await?;

        Ok(function
            .decode_output(&output)?
            .into_iter()
            .next()
            .and_then(Token::into_uint))
    }

    /// Node status as reported by `axm_status`.
    pub async fn status(&self) -> Result<String> {
        Ok(self.rpc.status().await?)
    }

    /// Builds, signs and broadcasts a call to `to`, then waits for a successful
    /// receipt.
    async fn transact(&self, to: Address, data: Vec<u8>) -> Result<(TxHash, Receipt)> {
        let signer = self
            .signer
            .as_deref()
            .ok_or_else(|| GovernError::validation("no signer configured"))?;
        let from = signer.address();
        let nonce = self
            .rpc
            .get_transaction_count(from, BlockTag::Latest)
            .await?;
        let gas = gas::resolve(self.fee_policy.as_deref(), self.rpc.as_ref(), &data).await?;
        debug!(%from, %nonce, gas_price = %gas.gas_price, gas_limit = %gas.gas_limit, "building transaction");

        let tx = self.build_transaction(nonce, gas, to, data).await?;
        let signed = submit::sign(signer, tx)?;
        let tx_hash = submit::submit(self.rpc.as_ref(), &signed).await?;

        let poller = ReceiptPoller::new(self.rpc.as_ref(), self.sleeper.as_ref(), self.config.poll);
        match poller.poll(&tx_hash).await? {
            PollState::Confirmed(receipt) => Ok((tx_hash, receipt)),
            PollState::Failed(_) => Err(GovernError::TransactionRejected { tx_hash }),
            PollState::TimedOut | PollState::Pending { .. } => {
                Err(GovernError::ReceiptTimeout { tx_hash })
            }
        }
    }

    async fn build_transaction(
        &self,
        nonce: U256,
        gas: GasParams,
        to: Address,
        data: Vec<u8>,
    ) -> Result<Transaction> {
        Ok(match self.config.tx_kind {
            TxKind::Legacy => LegacyTransaction {
                nonce,
                gas_price: gas.gas_price,
                gas_limit: gas.gas_limit,
                to: Some(to),
                value: U256::zero(),
                data,
                chain_id: self.config.chain_id,
            }
            .into(),
            TxKind::Incentive => {
                let chain_id = match self.config.chain_id {
                    Some(chain_id) => chain_id,
                    None => self.rpc.chain_id().await?,
                };
                IncentiveTransaction {
                    chain_id,
                    nonce,
                    max_priority_fee_per_gas: self.config.max_priority_fee,
                    max_fee_per_gas: gas.gas_price,
                    gas_limit: gas.gas_limit,
                    to: Some(to),
                    value: U256::zero(),
                    data,
                    incentive_address: self.config.incentive_address,
                }
                .into()
            }
        })
    }
}

/// The id is the second topic of the first log. Other events emitted before
/// the creation event would break this.
fn proposal_id(receipt: &Receipt) -> Option<U256> {
    let topic = receipt.logs.first()?.topics.get(1)?;
    Some(U256::from_big_endian(topic))
}

fn propose_function() -> Function {
    Function::new(
        "propose",
        vec![
            ParamType::Uint(8),
            ParamType::String,
            ParamType::String,
            ParamType::Uint(64),
            ParamType::Bytes,
        ],
        vec![ParamType::Uint(64)],
    )
}

fn vote_function(revision: VoteRevision) -> Function {
    let mut inputs = vec![ParamType::Uint(64), ParamType::Uint(8)];
    if revision == VoteRevision::WithExtra {
        inputs.push(ParamType::Bytes);
    }
    Function::new("vote", inputs, vec![])
}

fn proposal_function() -> Function {
    Function::new(
        "proposal",
        vec![ParamType::Uint(64)],
        vec![Proposal::param_type()],
    )
}

fn latest_proposal_id_function() -> Function {
    Function::new("getLatestProposalID", vec![], vec![ParamType::Uint(64)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        gas::StaticFeePolicy,
        proposal::{Candidate, CouncilExtra, WhitelistExtra, GOVERNANCE_CONTRACT},
        signer::LocalSigner,
        testing::{log, receipt, FakeNode, FakeSleeper},
    };
    use pretty_assertions::assert_eq;
    use transaction::INCENTIVE_TX_TYPE;

    fn topic(value: u8) -> [u8; 32] {
        let mut topic = [0u8; 32];
        topic[31] = value;
        topic
    }

    fn council() -> ProposalExtra {
        ProposalExtra::Council(CouncilExtra {
            candidates: vec![Candidate {
                address: Address::new([0x11; 20]),
                weight: 1,
                name: "node X".to_string(),
            }],
        })
    }

    fn govern(node: &Arc<FakeNode>) -> Govern {
        Govern::new(node.clone())
            .with_signer(Arc::new(LocalSigner::generate().unwrap()))
            .with_sleeper(Arc::new(FakeSleeper::default()))
    }

    fn confirm_with(node: &FakeNode, status: u64, logs: Vec<crate::rpc::Log>) {
        node.state().receipt_after = Some((1, receipt(TxHash::default(), status, logs)));
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn test_function_selectors() {
        assert_eq!(hex::encode(propose_function().selector()), "cee0ffe8");
        assert_eq!(
            hex::encode(vote_function(VoteRevision::Basic).selector()),
            "b040d166"
        );
        assert_eq!(
            vote_function(VoteRevision::WithExtra).signature(),
            "vote(uint64,uint8,bytes)"
        );
        assert_eq!(hex::encode(proposal_function().selector()), "7afa0aa3");
        assert_eq!(
            hex::encode(latest_proposal_id_function().selector()),
            "6785bd6e"
        );
    }

    #[tokio::test]
    async fn test_propose_extracts_proposal_id() {
        let node = Arc::new(FakeNode::default());
        confirm_with(&node, 1, vec![log(vec![topic(0xee), topic(0x2a)])]);
        let govern = govern(&node);

        let result = govern
            .propose(ProposalType::CouncilElect, "Add node X", "", 1000, council())
            .await
            .unwrap();

        assert_eq!(result.proposal_id, U256::from(42u64));
        assert_eq!(result.proposal_type, ProposalType::CouncilElect);

        let broadcasts = node.state().broadcasts.clone();
        assert_eq!(broadcasts.len(), 1);
        assert_eq!(result.tx_hash, TxHash(abi::keccak256(&broadcasts[0])));

        let request =
            ProposalRequest::new(ProposalType::CouncilElect, "Add node X", "", 1000, council())
                .unwrap();
        let expected = propose_function()
            .encode_call(&request.into_tokens().unwrap())
            .unwrap();
        assert_eq!(&expected[..4], &[0xce, 0xe0, 0xff, 0xe8]);
        assert!(contains(&broadcasts[0], &expected));
    }

    #[tokio::test]
    async fn test_propose_mismatched_extra_makes_no_calls() {
        let node = Arc::new(FakeNode::default());
        let govern = govern(&node);

        let err = govern
            .propose(
                ProposalType::CouncilElect,
                "Add node X",
                "",
                1000,
                ProposalExtra::Whitelist(WhitelistExtra { providers: vec![] }),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, GovernError::Validation(_)));
        assert_eq!(node.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_propose_unresolved_contract_makes_no_calls() {
        let node = Arc::new(FakeNode::default());
        let govern = govern(&node).with_contracts(ContractRegistry::empty());

        let err = govern
            .propose(ProposalType::CouncilElect, "t", "d", 1, council())
            .await
            .unwrap_err();

        assert_eq!(err.code(), "validation");
        assert_eq!(node.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_propose_without_logs_is_identifier_missing() {
        let node = Arc::new(FakeNode::default());
        confirm_with(&node, 1, vec![]);
        let govern = govern(&node);

        let err = govern
            .propose(ProposalType::CouncilElect, "t", "d", 1, council())
            .await
            .unwrap_err();

        let broadcast = node.state().broadcasts[0].clone();
        match err {
            GovernError::IdentifierMissing { tx_hash } => {
                assert_eq!(tx_hash, TxHash(abi::keccak256(broadcast)))
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_propose_single_topic_is_identifier_missing() {
        let node = Arc::new(FakeNode::default());
        confirm_with(&node, 1, vec![log(vec![topic(1)])]);
        let govern = govern(&node);

        let err = govern
            .propose(ProposalType::CouncilElect, "t", "d", 1, council())
            .await
            .unwrap_err();

        assert_eq!(err.code(), "identifier-missing");
    }

    #[tokio::test]
    async fn test_failed_receipt_is_rejected() {
        let node = Arc::new(FakeNode::default());
        confirm_with(&node, 0, vec![log(vec![topic(1), topic(2)])]);
        let govern = govern(&node);

        let err = govern
            .propose(ProposalType::CouncilElect, "t", "d", 1, council())
            .await
            .unwrap_err();

        assert!(matches!(err, GovernError::TransactionRejected { .. }));
    }

    #[tokio::test]
    async fn test_missing_receipt_times_out() {
        let node = Arc::new(FakeNode::default());
        let govern = govern(&node);

        let err = govern.vote(ProposalType::NodeAdd, 42, true).await.unwrap_err();

        assert!(matches!(err, GovernError::ReceiptTimeout { .. }));
        assert_eq!(node.calls("eth_getTransactionReceipt"), 5);
        assert_eq!(node.calls("eth_sendRawTransaction"), 1);
    }

    #[tokio::test]
    async fn test_broadcast_failure_is_not_retried() {
        let node = Arc::new(FakeNode::default());
        node.state().fail_broadcast = true;
        let govern = govern(&node);

        let err = govern.vote(ProposalType::NodeAdd, 42, true).await.unwrap_err();

        assert_eq!(err.code(), "transport");
        assert_eq!(node.calls("eth_sendRawTransaction"), 1);
        assert_eq!(node.calls("eth_getTransactionReceipt"), 0);
    }

    #[tokio::test]
    async fn test_vote_encodes_approve_as_integer() {
        let node = Arc::new(FakeNode::default());
        confirm_with(&node, 1, vec![]);
        let govern = govern(&node);

        let tx_hash = govern.vote(ProposalType::NodeAdd, 42, true).await.unwrap();

        let broadcast = node.state().broadcasts[0].clone();
        assert_eq!(tx_hash, TxHash(abi::keccak256(&broadcast)));

        let mut expected = hex::decode("b040d166").unwrap();
        expected.extend(topic(42));
        expected.extend(topic(1));
        assert!(contains(&broadcast, &expected));
    }

    #[tokio::test]
    async fn test_vote_reject_with_extra_revision() {
        let node = Arc::new(FakeNode::default());
        confirm_with(&node, 1, vec![]);
        let govern = govern(&node).with_config(GovernConfig {
            vote_revision: VoteRevision::WithExtra,
            ..Default::default()
        });

        govern.vote(ProposalType::NodeAdd, 7, false).await.unwrap();

        let expected = vote_function(VoteRevision::WithExtra)
            .encode_call(&[Token::uint64(7), Token::uint8(0), Token::bytes(vec![])])
            .unwrap();
        // id, flag, offset and the empty length word
        assert_eq!(expected.len(), 4 + 4 * 32);
        assert!(contains(&node.state().broadcasts[0], &expected));
    }

    #[tokio::test]
    async fn test_fee_policy_skips_gas_queries() {
        let node = Arc::new(FakeNode::default());
        confirm_with(&node, 1, vec![]);
        let govern =
            govern(&node).with_fee_policy(Arc::new(StaticFeePolicy::new(5u64, 100_000u64)));

        govern.vote(ProposalType::NodeAdd, 1, true).await.unwrap();

        assert_eq!(node.calls("eth_gasPrice"), 0);
        assert_eq!(node.calls("eth_getBlockByNumber"), 0);
        assert_eq!(node.calls("eth_getTransactionCount"), 1);
    }

    #[tokio::test]
    async fn test_incentive_transaction_queries_chain_id() {
        let node = Arc::new(FakeNode::default());
        confirm_with(&node, 1, vec![]);
        let govern = govern(&node).with_config(GovernConfig {
            tx_kind: TxKind::Incentive,
            incentive_address: Some(Address::new([0x33; 20])),
            ..Default::default()
        });

        govern.vote(ProposalType::NodeAdd, 1, true).await.unwrap();

        let broadcast = node.state().broadcasts[0].clone();
        assert_eq!(broadcast[0], INCENTIVE_TX_TYPE);
        assert!(contains(&broadcast, &[0x33; 20]));
        assert_eq!(node.calls("eth_chainId"), 1);
    }

    #[tokio::test]
    async fn test_configured_chain_id_is_not_queried() {
        let node = Arc::new(FakeNode::default());
        confirm_with(&node, 1, vec![]);
        let govern = govern(&node).with_config(GovernConfig {
            tx_kind: TxKind::Incentive,
            chain_id: Some(1356),
            ..Default::default()
        });

        govern.vote(ProposalType::NodeAdd, 1, true).await.unwrap();

        assert_eq!(node.calls("eth_chainId"), 0);
    }

    #[tokio::test]
    async fn test_get_proposal_not_found() {
        let node = Arc::new(FakeNode::default());
        let govern = govern(&node);

        assert_eq!(govern.get_proposal(42).await.unwrap(), None);

        let (from, to, data, block) = node.state().last_call.clone().unwrap();
        assert_eq!(from, Some(Address::ZERO));
        assert_eq!(to, GOVERNANCE_CONTRACT);
        assert_eq!(block, BlockTag::Latest);
        assert_eq!(hex::encode(&data[..4]), "7afa0aa3");
        assert_eq!(&data[4..], &topic(42));
    }

    #[tokio::test]
    async fn test_get_proposal_decodes_record() {
        let node = Arc::new(FakeNode::default());
        node.state().call_result = abi::encode(&[Token::Tuple(vec![
            Token::uint64(3),
            Token::int(256, 1),
            Token::int(256, 0),
            Token::string("0xproposer"),
            Token::string("Upgrade"),
            Token::string("to v2"),
            Token::uint64(1000),
            Token::int(256, 1),
            Token::string_array(["0xaa"]),
            Token::string_array(Vec::<String>::new()),
            Token::uint(256, 0u64),
            Token::string(""),
            Token::uint(256, 1000u64),
            Token::uint(256, 0u64),
        ])]);
        let govern = govern(&node);

        let proposal = govern.get_proposal(3).await.unwrap().unwrap();

        assert_eq!(proposal.id, U256::from(3u64));
        assert_eq!(proposal.proposal_type(), Some(ProposalType::NodeUpgrade));
        assert_eq!(proposal.desc, "to v2");
        assert_eq!(proposal.pass_votes, vec!["0xaa"]);
    }

    #[tokio::test]
    async fn test_get_proposal_truncated_data_is_decode_error() {
        let node = Arc::new(FakeNode::default());
        node.state().call_result = vec![0u8; 16];
        let govern = govern(&node);

        let err = govern.get_proposal(3).await.unwrap_err();
        assert_eq!(err.code(), "decode");
    }

    #[tokio::test]
    async fn test_get_latest_proposal_id() {
        let node = Arc::new(FakeNode::default());
        let govern = govern(&node);
        let contract = Address::new([0x44; 20]);

        assert_eq!(govern.get_latest_proposal_id(contract).await.unwrap(), None);

        node.state().call_result = abi::encode(&[Token::uint64(7)]);
        assert_eq!(
            govern.get_latest_proposal_id(contract).await.unwrap(),
            Some(U256::from(7u64))
        );

        let (from, to, data, _) = node.state().last_call.clone().unwrap();
        assert_eq!(from, None);
        assert_eq!(to, contract);
        assert_eq!(hex::encode(data), "6785bd6e");
    }

    #[tokio::test]
    async fn test_write_without_signer_makes_no_calls() {
        let node = Arc::new(FakeNode::default());
        let govern = Govern::new(node.clone());

        let err = govern.vote(ProposalType::NodeAdd, 1, true).await.unwrap_err();

        assert!(matches!(err, GovernError::Validation(_)));
        assert_eq!(node.total_calls(), 0);
        assert_eq!(govern.address(), None);
        // reads work without one
        assert_eq!(govern.get_proposal(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_status() {
        let node = Arc::new(FakeNode::default());
        let govern = govern(&node);
        assert_eq!(govern.status().await.unwrap(), "normal");
    }
}
