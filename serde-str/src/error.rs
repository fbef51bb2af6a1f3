use serde::de::Expected;
use std::fmt::Formatter;

/// Rejection message for a string that is not a base58 ledger address.
pub struct InvalidPubkey {
    addr: String,
}

impl InvalidPubkey {
    pub fn new(addr: String) -> Self {
        Self { addr }
    }
}

impl Expected for InvalidPubkey {
    fn fmt(&self, formatter: &mut Formatter) -> std::fmt::Result {
        write!(formatter, "{} to be a base58 ledger address", &self.addr)
    }
}

/// Rejection message for a string that is not a base58 transaction signature.
pub struct InvalidSignature {
    sig: String,
}

impl InvalidSignature {
    pub fn new(sig: String) -> Self {
        Self { sig }
    }
}

impl Expected for InvalidSignature {
    fn fmt(&self, formatter: &mut Formatter) -> std::fmt::Result {
        write!(formatter, "{} to be a base58 transaction signature", &self.sig)
    }
}
