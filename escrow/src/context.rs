use crate::action::EscrowMint;
use crate::config::EscrowConfig;
use crate::error::{EscrowError, Result};
use crate::idl::EscrowIdl;
use crate::ledger::EscrowLedger;
use log::debug;
use solana_program::program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use spl_token::state::Mint;
use std::collections::HashMap;
use std::sync::Mutex;

/// Everything the decoding and history code needs, owned by the caller:
/// the ledger, the deployment settings, the parsed IDL and a mint cache.
///
/// The mint cache lives and dies with the context. Nothing is shared between contexts.
pub struct EscrowContext<L> {
    ledger: L,
    config: EscrowConfig,
    idl: EscrowIdl,
    mints: Mutex<HashMap<Pubkey, EscrowMint>>,
}

impl<L: EscrowLedger> EscrowContext<L> {
    /// Context over the IDL bundled with this crate.
    pub fn new(ledger: L, config: EscrowConfig) -> Result<Self> {
        Ok(Self::with_idl(ledger, config, EscrowIdl::bundled()?))
    }

    pub fn with_idl(ledger: L, config: EscrowConfig, idl: EscrowIdl) -> Self {
        Self {
            ledger,
            config,
            idl,
            mints: Mutex::new(HashMap::new()),
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn config(&self) -> &EscrowConfig {
        &self.config
    }

    pub fn idl(&self) -> &EscrowIdl {
        &self.idl
    }

    /// Mint metadata, served from this context's cache when already seen.
    pub async fn resolve_mint(&self, address: &Pubkey) -> Result<EscrowMint> {
        if let Some(mint) = self.cached_mint(address) {
            return Ok(mint);
        }
        self.fetch_mint(address).await
    }

    /// Mint metadata read from the ledger, bypassing the cache.
    /// The cache is refreshed with the result.
    pub async fn fetch_mint(&self, address: &Pubkey) -> Result<EscrowMint> {
        debug!("fetching mint {}", address);
        let account = self
            .ledger
            .get_account(address)
            .await?
            .ok_or_else(|| EscrowError::mint(*address, "account not found"))?;
        if account.owner != spl_token::id() {
            return Err(EscrowError::mint(
                *address,
                format!("owned by {}, not the token program", account.owner),
            ));
        }
        let mint = Mint::unpack(&account.data).map_err(|e| EscrowError::mint(*address, e))?;
        let mint = EscrowMint {
            address: *address,
            mint,
        };
        if let Ok(mut cache) = self.mints.lock() {
            cache.insert(*address, mint);
        }
        Ok(mint)
    }

    fn cached_mint(&self, address: &Pubkey) -> Option<EscrowMint> {
        self.mints.lock().ok()?.get(address).copied()
    }
}
