//! Signer capability for hub-chain transactions.
//!
//! The client takes an injected [`CosmosSigner`] rather than reaching for a
//! wallet in ambient state; [`MnemonicSigner`] is the standard
//! implementation, deriving a secp256k1 key from a bip39 mnemonic.

use bip39::Mnemonic;
use cosmrs::{
    bip32::DerivationPath,
    crypto::{secp256k1::SigningKey, PublicKey},
    tx::{Raw, SignDoc},
    AccountId,
};
use tracing::info;

use crate::error::ChainError;

/// Cosmos account key derivation path (coin type 118).
const COSMOS_DERIVATION_PATH: &str = "m/44'/118'/0'/0/0";

/// Capability to sign hub-chain transactions for one account.
pub trait CosmosSigner: Send + Sync {
    /// The account this signer controls.
    fn account_id(&self) -> &AccountId;

    /// Public key matching the account, for SignerInfo assembly.
    fn public_key(&self) -> PublicKey;

    /// Sign a prepared sign doc.
    fn sign(&self, sign_doc: SignDoc) -> Result<Raw, ChainError>;
}

/// Mnemonic-derived signing key.
pub struct MnemonicSigner {
    signing_key: SigningKey,
    account_id: AccountId,
}

impl MnemonicSigner {
    pub fn new(mnemonic: &str, hrp: &str) -> Result<Self, ChainError> {
        let mnemonic = Mnemonic::parse(mnemonic)
            .map_err(|e| ChainError::Signing(format!("invalid mnemonic: {}", e)))?;

        let seed = mnemonic.to_seed("");
        let path: DerivationPath = COSMOS_DERIVATION_PATH
            .parse()
            .map_err(|e| ChainError::Signing(format!("invalid derivation path: {:?}", e)))?;

        let signing_key = SigningKey::derive_from_path(seed, &path)
            .map_err(|e| ChainError::Signing(format!("key derivation failed: {}", e)))?;

        let account_id = signing_key
            .public_key()
            .account_id(hrp)
            .map_err(|e| ChainError::Signing(format!("account id derivation failed: {}", e)))?;

        info!(address = %account_id, "Hub signer initialized");

        Ok(Self {
            signing_key,
            account_id,
        })
    }
}

impl CosmosSigner for MnemonicSigner {
    fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    fn public_key(&self) -> PublicKey {
        self.signing_key.public_key()
    }

    fn sign(&self, sign_doc: SignDoc) -> Result<Raw, ChainError> {
        sign_doc
            .sign(&self.signing_key)
            .map_err(|e| ChainError::Signing(format!("signing failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_MNEMONIC: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_mnemonic_signer_derives_noble_address() {
        let signer = MnemonicSigner::new(TEST_MNEMONIC, "noble").unwrap();
        assert!(signer.account_id().to_string().starts_with("noble1"));
    }

    #[test]
    fn test_invalid_mnemonic_rejected() {
        let result = MnemonicSigner::new("not a mnemonic", "noble");
        assert!(matches!(result, Err(ChainError::Signing(_))));
    }
}
