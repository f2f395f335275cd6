use sha3::{Digest, Keccak224};

/// Canonical currency identifier for a symbol: Keccak-224 over the
/// lowercased symbol, hex encoded. Matches the identifiers the upstream
/// network derives for token-generation transactions.
pub fn currency_hash_for_symbol(symbol: &str) -> String {
    let mut digest = Keccak224::new();
    digest.update(symbol.to_lowercase().as_bytes());
    hex::encode(digest.finalize())
}

/// Substitutes the native currency hash wherever a record omits one.
/// Every component that attributes money movement to a currency goes
/// through this.
#[derive(Debug, Clone)]
pub struct CurrencyNormalizer {
    native_currency_hash: String,
}

impl CurrencyNormalizer {
    pub fn new(native_symbol: &str) -> Self {
        Self {
            native_currency_hash: currency_hash_for_symbol(native_symbol),
        }
    }

    pub fn native_currency_hash(&self) -> &str {
        &self.native_currency_hash
    }

    pub fn normalize(&self, currency_hash: Option<&str>) -> String {
        match currency_hash {
            Some(hash) if !hash.is_empty() => hash.to_string(),
            _ => self.native_currency_hash.clone(),
        }
    }
}
