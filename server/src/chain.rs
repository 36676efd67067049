use std::collections::{btree_map::Entry, BTreeMap, VecDeque};

use borsh::{BorshDeserialize, BorshSerialize};
use contracts::{
    api::Receipt, Blob, BlobData, Calldata, Contract, ContractName, Event, Identity, ProgramKind,
    Revert, RunResult, StateCommitment, Transaction, TxHash, TxPayload, MAX_BLOBS_PER_TX,
};
use faucet::{Faucet, FaucetInit};
use token::{Token, TokenInit};

/// A deployed contract.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub enum Program {
    Token(Token),
    Faucet(Faucet),
}

impl Program {
    pub fn kind(&self) -> ProgramKind {
        match self {
            Program::Token(_) => ProgramKind::Token,
            Program::Faucet(_) => ProgramKind::Faucet,
        }
    }

    fn execute(&mut self, calldata: &Calldata) -> RunResult {
        match self {
            Program::Token(token) => token.execute(calldata),
            Program::Faucet(faucet) => faucet.execute(calldata),
        }
    }

    pub fn commit(&self) -> StateCommitment {
        match self {
            Program::Token(token) => token.commit(),
            Program::Faucet(faucet) => faucet.commit(),
        }
    }
}

/// Why a transaction did not make it into a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxFailure {
    /// Refused before execution: chain id, signature, nonce.
    Rejected(Revert),
    /// A contract aborted. Nothing the transaction touched changed.
    Reverted(Revert),
}

impl TxFailure {
    pub fn revert(&self) -> &Revert {
        match self {
            TxFailure::Rejected(r) | TxFailure::Reverted(r) => r,
        }
    }
}

/// The whole chain: contracts, account nonces and the head block.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Default)]
pub struct ChainState {
    contracts: BTreeMap<ContractName, Program>,
    nonces: BTreeMap<Identity, u64>,
    block_height: u64,
    timestamp: u64,
}

impl ChainState {
    pub fn block_height(&self) -> u64 {
        self.block_height
    }

    /// Timestamp of the head block.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn nonce(&self, account: &Identity) -> u64 {
        self.nonces.get(account).copied().unwrap_or(0)
    }

    pub fn contract(&self, name: &ContractName) -> Result<&Program, Revert> {
        self.contracts.get(name).ok_or_else(|| unknown_contract(name))
    }

    pub fn token(&self, name: &ContractName) -> Result<&Token, Revert> {
        match self.contract(name)? {
            Program::Token(token) => Ok(token),
            other => Err(wrong_kind(name, other.kind(), ProgramKind::Token)),
        }
    }

    pub fn faucet(&self, name: &ContractName) -> Result<&Faucet, Revert> {
        match self.contract(name)? {
            Program::Faucet(faucet) => Ok(faucet),
            other => Err(wrong_kind(name, other.kind(), ProgramKind::Faucet)),
        }
    }

    /// Validates and executes `tx` as the next block. State only changes when
    /// the transaction succeeds as a whole.
    pub fn apply(&mut self, tx: &Transaction, chain_id: u64, now: u64) -> Result<Receipt, TxFailure> {
        if tx.tx.chain_id != chain_id {
            return Err(TxFailure::Rejected(Revert::new(
                "WRONG_CHAIN",
                format!("Wrong chain id: expected {chain_id}, got {}", tx.tx.chain_id),
            )));
        }
        tx.verify()
            .map_err(|e| TxFailure::Rejected(Revert::from(e)))?;

        let identity = &tx.tx.identity;
        let expected = self.nonce(identity);
        if tx.tx.nonce != expected {
            return Err(TxFailure::Rejected(Revert::new(
                "BAD_NONCE",
                format!("Invalid nonce: expected {expected}, got {}", tx.tx.nonce),
            )));
        }
        let tx_hash = tx
            .hash()
            .map_err(|e| TxFailure::Rejected(Revert::from(e)))?;

        let block = BlockInfo {
            height: self.block_height + 1,
            timestamp: now.max(self.timestamp),
            tx_hash,
        };

        let (outputs, events) = match &tx.tx.payload {
            TxPayload::Deploy {
                contract_name,
                program,
                init,
            } => {
                let output = self
                    .deploy(identity, contract_name, *program, init)
                    .map_err(TxFailure::Reverted)?;
                (vec![output], vec![])
            }
            TxPayload::Call(blob) => self
                .call(identity, blob, &block)
                .map_err(TxFailure::Reverted)?,
        };

        self.nonces.insert(identity.clone(), expected + 1);
        self.block_height = block.height;
        self.timestamp = block.timestamp;

        Ok(Receipt {
            tx_hash: block.tx_hash,
            block_height: block.height,
            timestamp: block.timestamp,
            outputs,
            events,
        })
    }

    fn deploy(
        &mut self,
        deployer: &Identity,
        name: &ContractName,
        kind: ProgramKind,
        init: &BlobData,
    ) -> Result<String, Revert> {
        if !name.is_valid() {
            return Err(Revert::new(
                "INVALID_NAME",
                format!("Invalid contract name '{name}'"),
            ));
        }
        if self.contracts.contains_key(name) {
            return Err(Revert::new(
                "CONTRACT_EXISTS",
                format!("Contract '{name}' already exists"),
            ));
        }

        let program = match kind {
            ProgramKind::Token => {
                let init: TokenInit = decode_init(name, init)?;
                Program::Token(Token::new(init, deployer.clone()))
            }
            ProgramKind::Faucet => {
                let init: FaucetInit = decode_init(name, init)?;
                self.token(&init.token)?;
                Program::Faucet(Faucet::new(init, deployer.clone())?)
            }
        };
        self.contracts.insert(name.clone(), program);
        Ok(format!("Deployed {kind} contract '{name}'"))
    }

    /// Runs `blob` and every callee it queues on copies of the touched
    /// contracts, then swaps the copies in.
    fn call(
        &mut self,
        caller: &Identity,
        blob: &Blob,
        block: &BlockInfo,
    ) -> Result<(Vec<String>, Vec<Event>), Revert> {
        let mut touched: BTreeMap<ContractName, Program> = BTreeMap::new();
        let mut queue = VecDeque::from([(caller.clone(), blob.clone())]);
        let mut outputs = vec![];
        let mut events = vec![];

        while let Some((caller, blob)) = queue.pop_front() {
            if outputs.len() == MAX_BLOBS_PER_TX {
                return Err(Revert::new(
                    "TOO_MANY_CALLS",
                    format!("Transaction exceeds {MAX_BLOBS_PER_TX} contract calls"),
                ));
            }
            let name = blob.contract_name;
            let program = match touched.entry(name.clone()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let live = self.contracts.get(&name).ok_or_else(|| unknown_contract(&name))?;
                    entry.insert(live.clone())
                }
            };

            let calldata = Calldata {
                identity: caller,
                contract_name: name.clone(),
                data: blob.data,
                timestamp: block.timestamp,
                block_height: block.height,
                tx_hash: block.tx_hash.clone(),
            };
            let (output, ctx) = program.execute(&calldata)?;

            outputs.push(output);
            events.extend(ctx.events.into_iter().map(|event| Event {
                contract: name.clone(),
                block_height: block.height,
                tx_hash: block.tx_hash.clone(),
                event,
            }));
            let contract_identity = Identity::from(&name);
            queue.extend(
                ctx.callees
                    .into_iter()
                    .map(|callee| (contract_identity.clone(), callee)),
            );
        }

        self.contracts.extend(touched);
        Ok((outputs, events))
    }
}

struct BlockInfo {
    height: u64,
    timestamp: u64,
    tx_hash: TxHash,
}

fn decode_init<T: BorshDeserialize>(name: &ContractName, init: &BlobData) -> Result<T, Revert> {
    borsh::from_slice(&init.0).map_err(|e| {
        Revert::new(
            "INVALID_CALLDATA",
            format!("Could not decode init data for '{name}': {e}"),
        )
    })
}

fn unknown_contract(name: &ContractName) -> Revert {
    Revert::new("UNKNOWN_CONTRACT", format!("Unknown contract '{name}'"))
}

fn wrong_kind(name: &ContractName, actual: ProgramKind, expected: ProgramKind) -> Revert {
    Revert::new(
        "UNKNOWN_CONTRACT",
        format!("Contract '{name}' is a {actual} contract, not a {expected} contract"),
    )
}

#[cfg(test)]
mod tests {
    use contracts::{ContractEvent, UnsignedTransaction};
    use faucet::{FaucetAction, FaucetParams, CLAIM_AMOUNT, COOLDOWN_SECS, LIFETIME_CAP};
    use k256::ecdsa::SigningKey;
    use rand_core::OsRng;
    use token::TokenAction;

    use super::*;

    const CHAIN: u64 = 1337;
    const START: u64 = 1_700_000_000;

    struct Account {
        key: SigningKey,
        id: Identity,
    }

    impl Account {
        fn new() -> Self {
            let key = SigningKey::random(&mut OsRng);
            let id = Identity::from_public_key(key.verifying_key());
            Self { key, id }
        }

        fn tx(&self, state: &ChainState, payload: TxPayload) -> Transaction {
            UnsignedTransaction {
                chain_id: CHAIN,
                identity: self.id.clone(),
                nonce: state.nonce(&self.id),
                payload,
            }
            .sign(&self.key)
            .unwrap()
        }

        fn send(
            &self,
            state: &mut ChainState,
            payload: TxPayload,
            now: u64,
        ) -> Result<Receipt, TxFailure> {
            let tx = self.tx(state, payload);
            state.apply(&tx, CHAIN, now)
        }
    }

    fn deploy_token(name: &str) -> TxPayload {
        TxPayload::Deploy {
            contract_name: name.into(),
            program: ProgramKind::Token,
            init: BlobData(borsh::to_vec(&TokenInit::default()).unwrap()),
        }
    }

    fn deploy_faucet(name: &str, token: &str) -> TxPayload {
        TxPayload::Deploy {
            contract_name: name.into(),
            program: ProgramKind::Faucet,
            init: BlobData(
                borsh::to_vec(&FaucetInit {
                    token: token.into(),
                    params: FaucetParams::default(),
                })
                .unwrap(),
            ),
        }
    }

    fn faucet_call(action: FaucetAction) -> TxPayload {
        TxPayload::Call(action.as_blob("faucet".into()).unwrap())
    }

    fn token_call(action: TokenAction) -> TxPayload {
        TxPayload::Call(action.as_blob("jan".into()).unwrap())
    }

    /// Deploys `jan` and `faucet` and wires the minter, like the init tool.
    fn deployed() -> (ChainState, Account) {
        let mut state = ChainState::default();
        let admin = Account::new();
        admin.send(&mut state, deploy_token("jan"), START).unwrap();
        admin
            .send(&mut state, deploy_faucet("faucet", "jan"), START)
            .unwrap();
        admin
            .send(
                &mut state,
                token_call(TokenAction::SetMinter {
                    minter: "faucet".into(),
                }),
                START,
            )
            .unwrap();
        (state, admin)
    }

    fn reverted(result: Result<Receipt, TxFailure>) -> Revert {
        match result {
            Err(TxFailure::Reverted(revert)) => revert,
            other => panic!("expected revert, got {other:?}"),
        }
    }

    #[test]
    fn claim_mints_through_callee() {
        let (mut state, _) = deployed();
        let user = Account::new();
        let receipt = user
            .send(&mut state, faucet_call(FaucetAction::RequestTokens), START)
            .unwrap();

        assert_eq!(receipt.outputs.len(), 2);
        assert_eq!(receipt.block_height, 4);
        let kinds: Vec<_> = receipt.events.iter().map(|e| e.contract.0.as_str()).collect();
        assert_eq!(kinds, vec!["faucet", "jan"]);
        assert!(matches!(
            &receipt.events[1].event,
            ContractEvent::Transfer { from: None, to, amount } if to == &user.id && *amount == CLAIM_AMOUNT
        ));
        assert_eq!(
            state.token(&"jan".into()).unwrap().balance_of(&user.id),
            CLAIM_AMOUNT
        );
    }

    #[test]
    fn ten_claims_then_lifetime_limit() {
        let (mut state, _) = deployed();
        let user = Account::new();
        let mut now = START;
        for _ in 0..10 {
            user.send(&mut state, faucet_call(FaucetAction::RequestTokens), now)
                .unwrap();
            now += COOLDOWN_SECS + 1;
        }
        let token = state.token(&"jan".into()).unwrap();
        assert_eq!(token.balance_of(&user.id), LIFETIME_CAP);

        let revert = reverted(user.send(&mut state, faucet_call(FaucetAction::RequestTokens), now));
        assert_eq!(revert.reason, "Lifetime claim limit reached");
    }

    #[test]
    fn cooldown_revert_keeps_nonce_and_state() {
        let (mut state, _) = deployed();
        let user = Account::new();
        user.send(&mut state, faucet_call(FaucetAction::RequestTokens), START)
            .unwrap();
        let before = state.faucet(&"faucet".into()).unwrap().commit();
        let height = state.block_height();

        let revert = reverted(user.send(
            &mut state,
            faucet_call(FaucetAction::RequestTokens),
            START + 60,
        ));
        assert_eq!(revert.reason, "Cooldown period not elapsed");
        assert_eq!(state.nonce(&user.id), 1);
        assert_eq!(state.block_height(), height);
        assert_eq!(state.faucet(&"faucet".into()).unwrap().commit(), before);

        user.send(
            &mut state,
            faucet_call(FaucetAction::RequestTokens),
            START + COOLDOWN_SECS,
        )
        .unwrap();
    }

    #[test]
    fn failing_mint_rolls_back_faucet_bookkeeping() {
        // Minter never wired: the faucet accepts the claim, the ledger refuses.
        let mut state = ChainState::default();
        let admin = Account::new();
        admin.send(&mut state, deploy_token("jan"), START).unwrap();
        admin
            .send(&mut state, deploy_faucet("faucet", "jan"), START)
            .unwrap();

        let user = Account::new();
        let revert = reverted(user.send(&mut state, faucet_call(FaucetAction::RequestTokens), START));
        assert_eq!(revert.reason, "Only minter can mint");

        let faucet = state.faucet(&"faucet".into()).unwrap();
        assert_eq!(faucet.total_claimed(&user.id), 0);
        assert_eq!(faucet.last_claim_at(&user.id), 0);
    }

    #[test]
    fn pause_is_admin_only() {
        let (mut state, admin) = deployed();
        let user = Account::new();

        let revert = reverted(user.send(
            &mut state,
            faucet_call(FaucetAction::SetPaused { paused: true }),
            START,
        ));
        assert_eq!(revert.reason, "Only admin can call this function");

        admin
            .send(&mut state, faucet_call(FaucetAction::SetPaused { paused: true }), START)
            .unwrap();
        let revert = reverted(user.send(&mut state, faucet_call(FaucetAction::RequestTokens), START));
        assert_eq!(revert.reason, "Faucet is paused");
    }

    #[test]
    fn users_cannot_mint_directly() {
        let (mut state, admin) = deployed();
        let revert = reverted(admin.send(
            &mut state,
            token_call(TokenAction::Mint {
                to: admin.id.clone(),
                amount: 1,
            }),
            START,
        ));
        assert_eq!(revert.code, "NOT_MINTER");
    }

    #[test]
    fn rejects_bad_nonce_chain_and_signature() {
        let (mut state, admin) = deployed();

        let mut tx = admin.tx(&state, faucet_call(FaucetAction::RequestTokens));
        tx.tx.nonce += 1;
        let tx = tx.tx.sign(&admin.key).unwrap();
        let failure = state.apply(&tx, CHAIN, START).unwrap_err();
        assert!(matches!(failure, TxFailure::Rejected(ref r) if r.code == "BAD_NONCE"));

        let tx = admin.tx(&state, faucet_call(FaucetAction::RequestTokens));
        let failure = state.apply(&tx, CHAIN + 1, START).unwrap_err();
        assert_eq!(failure.revert().code, "WRONG_CHAIN");

        let mut tx = admin.tx(&state, faucet_call(FaucetAction::RequestTokens));
        tx.signature[10] ^= 0xff;
        let failure = state.apply(&tx, CHAIN, START).unwrap_err();
        assert_eq!(failure.revert().code, "INVALID_SIGNATURE");
    }

    #[test]
    fn deploy_validation() {
        let (mut state, admin) = deployed();
        let revert = reverted(admin.send(&mut state, deploy_token("jan"), START));
        assert_eq!(revert.code, "CONTRACT_EXISTS");

        let revert = reverted(admin.send(&mut state, deploy_token("0xjan"), START));
        assert_eq!(revert.code, "INVALID_NAME");

        let revert = reverted(admin.send(&mut state, deploy_faucet("faucet2", "missing"), START));
        assert_eq!(revert.code, "UNKNOWN_CONTRACT");

        let revert = reverted(admin.send(&mut state, deploy_faucet("faucet2", "faucet"), START));
        assert_eq!(revert.code, "UNKNOWN_CONTRACT");
    }

    #[test]
    fn block_time_never_goes_backwards() {
        let (mut state, _) = deployed();
        let user = Account::new();
        let receipt = user
            .send(&mut state, faucet_call(FaucetAction::RequestTokens), START - 500)
            .unwrap();
        assert_eq!(receipt.timestamp, START);
    }

    #[test]
    fn state_survives_borsh() {
        let (mut state, _) = deployed();
        let user = Account::new();
        user.send(&mut state, faucet_call(FaucetAction::RequestTokens), START)
            .unwrap();
        let bytes = borsh::to_vec(&state).unwrap();
        let restored: ChainState = borsh::from_slice(&bytes).unwrap();
        assert_eq!(restored.nonce(&user.id), 1);
        assert_eq!(
            restored.faucet(&"faucet".into()).unwrap().commit(),
            state.faucet(&"faucet".into()).unwrap().commit()
        );
    }
}
