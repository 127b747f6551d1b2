//! Deterministic custodial wallet derivation
//!
//! Every deposit wallet is a pure function of the master secret and an
//! integer index, so no private key ever needs to be stored. Index 0 is
//! reserved for the platform; project indices start at 1.

use sha2::{Digest, Sha256};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{keypair_from_seed, Keypair};
use solana_sdk::signer::Signer;
use std::sync::OnceLock;

/// Seed tag for the unrecoverable burn vault. The vault address is derived
/// from this public constant so anyone can re-derive and audit it.
const BURN_VAULT_SEED: &str = "flywheel-burn-vault-permanent";

/// Derive the signing keypair for a wallet index.
///
/// The SHA-256 digest of `"{secret}-{index}"` is used as the ed25519 seed,
/// so the mapping is irreversible and uniform across indices.
pub fn derive_wallet(master_secret: &str, index: u32) -> Keypair {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}-{}", master_secret, index).as_bytes());
    let seed: [u8; 32] = hasher.finalize().into();
    keypair_from_seed(&seed).expect("a 32-byte digest is a valid ed25519 seed")
}

/// Base58 address of the wallet at `index`.
pub fn wallet_address(master_secret: &str, index: u32) -> String {
    derive_wallet(master_secret, index).pubkey().to_string()
}

/// Destination for the transfer burn strategy.
///
/// Derived from a fixed constant seed rather than the master secret; the
/// derived secret key is discarded and never used to sign anything.
pub fn burn_vault_address() -> Pubkey {
    static VAULT: OnceLock<Pubkey> = OnceLock::new();
    *VAULT.get_or_init(|| {
        let mut hasher = Sha256::new();
        hasher.update(BURN_VAULT_SEED.as_bytes());
        let seed: [u8; 32] = hasher.finalize().into();
        keypair_from_seed(&seed)
            .expect("a 32-byte digest is a valid ed25519 seed")
            .pubkey()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn derivation_is_deterministic() {
        let a = derive_wallet("test-secret", 7);
        let b = derive_wallet("test-secret", 7);
        assert_eq!(a.pubkey(), b.pubkey());
        assert_eq!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn indices_never_collide() {
        let mut seen = HashSet::new();
        for index in 0..1000 {
            assert!(
                seen.insert(derive_wallet("test-secret", index).pubkey()),
                "index {} collided with an earlier index",
                index
            );
        }
    }

    #[test]
    fn different_secrets_yield_different_wallets() {
        assert_ne!(
            derive_wallet("secret-a", 1).pubkey(),
            derive_wallet("secret-b", 1).pubkey()
        );
    }

    #[test]
    fn address_matches_derived_pubkey() {
        let keypair = derive_wallet("test-secret", 3);
        assert_eq!(wallet_address("test-secret", 3), keypair.pubkey().to_string());
    }

    #[test]
    fn burn_vault_is_stable_and_distinct() {
        assert_eq!(burn_vault_address(), burn_vault_address());
        for index in 0..10 {
            assert_ne!(burn_vault_address(), derive_wallet("test-secret", index).pubkey());
        }
    }
}
