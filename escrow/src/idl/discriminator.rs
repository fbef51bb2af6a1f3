use anchor_syn::codegen::program::common::{sighash, SIGHASH_GLOBAL_NAMESPACE};
use anchor_syn::hash::hash;
use heck::SnakeCase;

pub type Discriminator = [u8; 8];

/// Calculates the discriminator for an account based on its name,
/// as found in an IDL.
pub fn account_discriminator(name: &str) -> Discriminator {
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&hash(format!("account:{}", name).as_bytes()).to_bytes()[..8]);
    discriminator
}

/// Calculates the discriminator for an instruction based on its IDL name.
/// IDL names are camelCase, the program hashes the snake_case handler name.
pub fn ix_discriminator(name: &str) -> Discriminator {
    sighash(SIGHASH_GLOBAL_NAMESPACE, &name.to_snake_case())
}

/// Split instruction data into its discriminator and the remaining argument bytes.
/// `None` if the data is too short to carry a discriminator.
pub fn split_discriminator(data: &[u8]) -> Option<(Discriminator, &[u8])> {
    if data.len() < 8 {
        return None;
    }
    let (head, rest) = data.split_at(8);
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(head);
    Some((discriminator, rest))
}
