#![allow(dead_code)]
//! In-memory ledger and transaction builders shared by the integration tests.
use anchor_lang::AccountSerialize;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use borsh::BorshSerialize;
use serde_json::{json, Value};
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::rpc_response::RpcConfirmedTransactionStatusWithSignature;
use solana_program::program_option::COption;
use solana_program::program_pack::Pack;
use solana_sdk::account::Account;
use solana_sdk::bs58;
use solana_sdk::clock::Slot;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::{CompiledInstruction, Instruction};
use solana_sdk::message::v0::{self, MessageAddressTableLookup};
use solana_sdk::message::{MessageHeader, VersionedMessage};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use solana_transaction_status::EncodedConfirmedTransactionWithStatusMeta;
use spl_token::state::Mint;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tiplink_escrow::decode::InitializeArgs;
use tiplink_escrow::{
    EscrowConfig, EscrowContext, EscrowIdl, EscrowInstructionKind, EscrowLedger, EscrowMint,
    EscrowError, Result,
};

pub const PAGE_CAP: usize = 1000;

/// Deterministic signature, distinct for every `n`.
pub fn signature(n: u64) -> Signature {
    let mut bytes = [7u8; 64];
    bytes[..8].copy_from_slice(&n.to_le_bytes());
    Signature::from(bytes)
}

#[derive(Default)]
pub struct FakeLedger {
    transactions: Mutex<HashMap<Signature, EncodedConfirmedTransactionWithStatusMeta>>,
    /// Newest first, per address.
    histories: Mutex<HashMap<Pubkey, Vec<(Slot, Signature)>>>,
    accounts: Mutex<HashMap<Pubkey, Account>>,
    unavailable: Mutex<HashSet<Signature>>,
    page_cap: usize,
    pub page_requests: AtomicUsize,
    pub transaction_fetches: AtomicUsize,
    pub account_fetches: AtomicUsize,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self::with_page_cap(PAGE_CAP)
    }

    pub fn with_page_cap(page_cap: usize) -> Self {
        Self {
            page_cap,
            ..Default::default()
        }
    }

    /// Store `tx` under `signature` and list it in the history of every address in `touched`.
    pub fn add_transaction(
        &self,
        signature: Signature,
        tx: EncodedConfirmedTransactionWithStatusMeta,
        touched: &[Pubkey],
    ) {
        let slot = tx.slot;
        self.transactions.lock().unwrap().insert(signature, tx);
        let mut histories = self.histories.lock().unwrap();
        for address in touched {
            let history = histories.entry(*address).or_default();
            history.push((slot, signature));
            history.sort_by(|a, b| b.0.cmp(&a.0));
        }
    }

    /// List `signature` for `address` without storing a transaction for it.
    pub fn add_signature(&self, address: Pubkey, slot: Slot, signature: Signature) {
        let mut histories = self.histories.lock().unwrap();
        let history = histories.entry(address).or_default();
        history.push((slot, signature));
        history.sort_by(|a, b| b.0.cmp(&a.0));
    }

    pub fn set_account(&self, address: Pubkey, account: Account) {
        self.accounts.lock().unwrap().insert(address, account);
    }

    pub fn remove_account(&self, address: &Pubkey) {
        self.accounts.lock().unwrap().remove(address);
    }

    /// Make fetching `signature` fail like an unreachable node would.
    pub fn make_unavailable(&self, signature: Signature) {
        self.unavailable.lock().unwrap().insert(signature);
    }

    pub fn page_requests(&self) -> usize {
        self.page_requests.load(Ordering::SeqCst)
    }

    pub fn account_fetches(&self) -> usize {
        self.account_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EscrowLedger for FakeLedger {
    async fn get_transaction(
        &self,
        signature: &Signature,
    ) -> Result<Option<EncodedConfirmedTransactionWithStatusMeta>> {
        self.transaction_fetches.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.lock().unwrap().contains(signature) {
            return Err(EscrowError::Rpc(ClientError::from(ClientErrorKind::Custom(
                "node unavailable".to_string(),
            ))));
        }
        Ok(self.transactions.lock().unwrap().get(signature).map(|tx| {
            EncodedConfirmedTransactionWithStatusMeta {
                slot: tx.slot,
                transaction: tx.transaction.clone(),
                block_time: tx.block_time,
            }
        }))
    }

    async fn get_signatures_for_address(
        &self,
        address: &Pubkey,
        before: Option<Signature>,
        limit: Option<usize>,
    ) -> Result<Vec<RpcConfirmedTransactionStatusWithSignature>> {
        self.page_requests.fetch_add(1, Ordering::SeqCst);
        let histories = self.histories.lock().unwrap();
        let Some(history) = histories.get(address) else {
            return Ok(vec![]);
        };
        let start = match before {
            None => 0,
            Some(before) => match history.iter().position(|(_, s)| *s == before) {
                Some(i) => i + 1,
                None => return Ok(vec![]),
            },
        };
        let page_size = limit.unwrap_or(self.page_cap).min(self.page_cap);
        Ok(history
            .iter()
            .skip(start)
            .take(page_size)
            .map(|(slot, signature)| RpcConfirmedTransactionStatusWithSignature {
                signature: signature.to_string(),
                slot: *slot,
                err: None,
                memo: None,
                block_time: None,
                confirmation_status: None,
            })
            .collect())
    }

    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>> {
        self.account_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.accounts.lock().unwrap().get(address).cloned())
    }
}

/// Context with no pause between requests.
pub fn context(ledger: FakeLedger) -> EscrowContext<FakeLedger> {
    let config = EscrowConfig {
        request_delay_ms: 0,
        ..Default::default()
    };
    EscrowContext::new(ledger, config).unwrap()
}

pub fn mint_account(decimals: u8, supply: u64) -> Account {
    let mint = Mint {
        mint_authority: COption::None,
        supply,
        decimals,
        is_initialized: true,
        freeze_authority: COption::None,
    };
    let mut data = vec![0u8; Mint::LEN];
    Mint::pack(mint, &mut data).unwrap();
    Account {
        lamports: 1_461_600,
        data,
        owner: spl_token::id(),
        executable: false,
        rent_epoch: 0,
    }
}

pub fn escrow_mint(address: Pubkey, account: &Account) -> EscrowMint {
    EscrowMint {
        address,
        mint: Mint::unpack(&account.data).unwrap(),
    }
}

/// An escrow program account holding `record`.
pub fn record_account<T: AccountSerialize>(record: &T) -> Account {
    let mut data = vec![];
    record.try_serialize(&mut data).unwrap();
    Account {
        lamports: 2_000_000,
        data,
        owner: tiplink_escrow::ID,
        executable: false,
        rent_epoch: 0,
    }
}

fn escrow_ix(
    kind: EscrowInstructionKind,
    accounts: &[(&str, Pubkey)],
    args: Option<InitializeArgs>,
) -> Instruction {
    let idl = EscrowIdl::bundled().unwrap();
    let layout = idl.layout(kind);
    let mut data = layout.discriminator.to_vec();
    if let Some(args) = args {
        args.serialize(&mut data).unwrap();
    }
    Instruction::new_with_bytes(tiplink_escrow::ID, &data, layout.account_metas(accounts).unwrap())
}

pub fn initialize_lamport_ix(
    depositor: Pubkey,
    pda: Pubkey,
    receiver: Pubkey,
    amount: u64,
) -> Instruction {
    escrow_ix(
        EscrowInstructionKind::InitializeLamport,
        &[
            ("depositor", depositor),
            ("pda", pda),
            ("treasury", tiplink_escrow::TREASURY),
            ("tiplink", receiver),
            ("systemProgram", solana_sdk::system_program::id()),
        ],
        Some(InitializeArgs {
            amount,
            escrow_id: Pubkey::new_unique(),
        }),
    )
}

pub fn withdraw_lamport_ix(authority: Pubkey, destination: Pubkey, pda: Pubkey) -> Instruction {
    escrow_ix(
        EscrowInstructionKind::WithdrawLamport,
        &[
            ("authority", authority),
            ("destination", destination),
            ("pda", pda),
        ],
        None,
    )
}

pub fn initialize_spl_ix(
    depositor: Pubkey,
    pda: Pubkey,
    receiver: Pubkey,
    mint: Pubkey,
    amount: u64,
) -> Instruction {
    escrow_ix(
        EscrowInstructionKind::InitializeSpl,
        &[
            ("depositor", depositor),
            ("depositorTa", Pubkey::new_unique()),
            ("pda", pda),
            ("pdaAta", Pubkey::new_unique()),
            ("treasury", tiplink_escrow::TREASURY),
            ("tiplink", receiver),
            ("mint", mint),
            ("tokenProgram", spl_token::id()),
            ("associatedTokenProgram", spl_associated_token_account::id()),
            ("systemProgram", solana_sdk::system_program::id()),
        ],
        Some(InitializeArgs {
            amount,
            escrow_id: Pubkey::new_unique(),
        }),
    )
}

pub fn withdraw_spl_ix(authority: Pubkey, destination: Pubkey, pda: Pubkey, mint: Pubkey) -> Instruction {
    escrow_ix(
        EscrowInstructionKind::WithdrawSpl,
        &[
            ("authority", authority),
            ("destination", destination),
            ("destinationAta", Pubkey::new_unique()),
            ("pda", pda),
            ("pdaAta", Pubkey::new_unique()),
            ("mint", mint),
            ("tokenProgram", spl_token::id()),
            ("associatedTokenProgram", spl_associated_token_account::id()),
            ("systemProgram", solana_sdk::system_program::id()),
        ],
        None,
    )
}

/// An instruction of some other program.
pub fn foreign_ix(data: &[u8]) -> Instruction {
    Instruction::new_with_bytes(Pubkey::new_unique(), data, vec![])
}

/// Builds confirmed transactions in the shape `getTransaction` returns them with
/// base64 encoding: a v0 message plus status metadata.
pub struct TxBuilder {
    slot: Slot,
    block_time: Option<i64>,
    payer: Pubkey,
    outer: Vec<Instruction>,
    inner: Vec<(u8, Vec<Instruction>)>,
    loaded_writable: Vec<Pubkey>,
    loaded_readonly: Vec<Pubkey>,
    error: Option<Value>,
}

impl TxBuilder {
    pub fn new(slot: Slot) -> Self {
        Self {
            slot,
            block_time: Some(1_700_000_000 + slot as i64),
            payer: Pubkey::new_unique(),
            outer: vec![],
            inner: vec![],
            loaded_writable: vec![],
            loaded_readonly: vec![],
            error: None,
        }
    }

    pub fn outer(mut self, ix: Instruction) -> Self {
        self.outer.push(ix);
        self
    }

    /// Record `ix` as invoked by the outer instruction at `outer_index`.
    pub fn inner(mut self, outer_index: u8, ix: Instruction) -> Self {
        match self.inner.iter_mut().find(|(index, _)| *index == outer_index) {
            Some((_, group)) => group.push(ix),
            None => self.inner.push((outer_index, vec![ix])),
        }
        self
    }

    /// Resolve `address` through an address lookup table instead of the static keys.
    pub fn loaded_writable(mut self, address: Pubkey) -> Self {
        self.loaded_writable.push(address);
        self
    }

    pub fn loaded_readonly(mut self, address: Pubkey) -> Self {
        self.loaded_readonly.push(address);
        self
    }

    pub fn failed(mut self) -> Self {
        self.error = Some(json!({ "InstructionError": [0, { "Custom": 6000 }] }));
        self
    }

    pub fn build(self) -> EncodedConfirmedTransactionWithStatusMeta {
        let loaded: HashSet<Pubkey> = self
            .loaded_writable
            .iter()
            .chain(self.loaded_readonly.iter())
            .copied()
            .collect();
        let mut static_keys = vec![self.payer];
        let all_ixs = self
            .outer
            .iter()
            .chain(self.inner.iter().flat_map(|(_, group)| group.iter()));
        for ix in all_ixs {
            let keys = ix.accounts.iter().map(|meta| meta.pubkey).chain([ix.program_id]);
            for key in keys {
                if !loaded.contains(&key) && !static_keys.contains(&key) {
                    static_keys.push(key);
                }
            }
        }
        let table: Vec<Pubkey> = static_keys
            .iter()
            .chain(self.loaded_writable.iter())
            .chain(self.loaded_readonly.iter())
            .copied()
            .collect();
        let index_of = |key: &Pubkey| table.iter().position(|k| k == key).unwrap() as u8;
        let compile = |ix: &Instruction| {
            CompiledInstruction::new_from_raw_parts(
                index_of(&ix.program_id),
                ix.data.clone(),
                ix.accounts.iter().map(|meta| index_of(&meta.pubkey)).collect(),
            )
        };

        let (writable, readonly) = (
            self.loaded_writable.len() as u8,
            self.loaded_readonly.len() as u8,
        );
        let address_table_lookups = if writable + readonly == 0 {
            vec![]
        } else {
            vec![MessageAddressTableLookup {
                account_key: Pubkey::new_unique(),
                writable_indexes: (0..writable).collect(),
                readonly_indexes: (writable..writable + readonly).collect(),
            }]
        };
        let tx = VersionedTransaction {
            signatures: vec![Signature::default()],
            message: VersionedMessage::V0(v0::Message {
                header: MessageHeader {
                    num_required_signatures: 1,
                    num_readonly_signed_accounts: 0,
                    num_readonly_unsigned_accounts: 0,
                },
                account_keys: static_keys.clone(),
                recent_blockhash: Hash::default(),
                instructions: self.outer.iter().map(&compile).collect(),
                address_table_lookups,
            }),
        };
        let inner_instructions: Vec<Value> = self
            .inner
            .iter()
            .map(|(index, group)| {
                json!({
                    "index": index,
                    "instructions": group.iter().map(|ix| {
                        let compiled = compile(ix);
                        json!({
                            "programIdIndex": compiled.program_id_index,
                            "accounts": compiled.accounts,
                            "data": bs58::encode(&compiled.data).into_string(),
                            "stackHeight": 2,
                        })
                    }).collect::<Vec<_>>()
                })
            })
            .collect();
        let status = match &self.error {
            None => json!({ "Ok": null }),
            Some(err) => json!({ "Err": err }),
        };
        let encoded = STANDARD.encode(bincode::serialize(&tx).unwrap());
        serde_json::from_value(json!({
            "slot": self.slot,
            "blockTime": self.block_time,
            "transaction": [encoded, "base64"],
            "meta": {
                "err": self.error,
                "status": status,
                "fee": 5000,
                "preBalances": [],
                "postBalances": [],
                "innerInstructions": inner_instructions,
                "logMessages": [],
                "preTokenBalances": [],
                "postTokenBalances": [],
                "rewards": [],
                "loadedAddresses": {
                    "writable": self.loaded_writable.iter().map(Pubkey::to_string).collect::<Vec<_>>(),
                    "readonly": self.loaded_readonly.iter().map(Pubkey::to_string).collect::<Vec<_>>(),
                }
            },
            "version": 0
        }))
        .unwrap()
    }
}
