//! Two-to-one Poseidon hashing over BN254::Fr, using circomlib's parameters so that roots
//! match the membership circuits.

use crate::constants::POSEIDON_WIDTH;
use ark_bn254::Fr;
use light_poseidon::parameters::bn254_x5;
use light_poseidon::{Poseidon, PoseidonHasher as _, PoseidonParameters};
use once_cell::sync::OnceCell;
use std::fmt;

static GLOBAL: OnceCell<PoseidonHasher> = OnceCell::new();

/// Poseidon hash function with its round constants and MDS matrix already loaded.
///
/// Immutable after construction, so one instance is shared by reference across every tree
/// build, including builds running on different threads.
pub struct PoseidonHasher {
    params: PoseidonParameters<Fr>,
}

impl PoseidonHasher {
    pub fn new() -> Self {
        let params = bn254_x5::get_poseidon_parameters::<Fr>(POSEIDON_WIDTH)
            .expect("circom parameters exist for width 3");
        Self { params }
    }

    /// Process-wide instance, loaded on first use.
    ///
    /// Concurrent first callers block until the single initialization finishes.
    pub fn global() -> &'static PoseidonHasher {
        GLOBAL.get_or_init(|| {
            tracing::debug!(width = POSEIDON_WIDTH, "loading poseidon parameters");
            PoseidonHasher::new()
        })
    }

    /// circomlib `Poseidon(2)([left, right])`.
    pub fn hash_two(&self, left: &Fr, right: &Fr) -> Fr {
        // The permutation keeps its state inline, so each call gets its own instance.
        let params = PoseidonParameters::new(
            self.params.ark.clone(),
            self.params.mds.clone(),
            self.params.full_rounds,
            self.params.partial_rounds,
            self.params.width,
            self.params.alpha,
        );
        Poseidon::<Fr>::new(params)
            .hash(&[*left, *right])
            .expect("width-3 permutation takes two inputs")
    }
}

impl Default for PoseidonHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PoseidonHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoseidonHasher")
            .field("width", &self.params.width)
            .field("full_rounds", &self.params.full_rounds)
            .field("partial_rounds", &self.params.partial_rounds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::parse_fr_hex;

    #[test]
    fn global_is_initialized_once() {
        let a = PoseidonHasher::global() as *const PoseidonHasher;
        let b = PoseidonHasher::global() as *const PoseidonHasher;
        assert_eq!(a, b);
    }

    #[test]
    fn matches_circomlib_known_answers() {
        let h = PoseidonHasher::global();

        assert_eq!(
            h.hash_two(&Fr::from(1u64), &Fr::from(2u64)),
            parse_fr_hex("0x115cc0f5e7d690413df64c6b9662e9cf2a3617f2743245519e19607a4417189a").unwrap()
        );
        assert_eq!(
            h.hash_two(&Fr::from(0u64), &Fr::from(0u64)),
            parse_fr_hex("0x2098f5fb9e239eab3ceac3f27b81e481dc3124d55ffed523a839ee8446b64864").unwrap()
        );
    }

    #[test]
    fn hash_is_deterministic_and_ordered() {
        let h = PoseidonHasher::global();
        let one = Fr::from(1u64);
        let two = Fr::from(2u64);

        assert_eq!(h.hash_two(&one, &two), h.hash_two(&one, &two));
        assert_eq!(h.hash_two(&one, &two), PoseidonHasher::new().hash_two(&one, &two));
        assert_ne!(h.hash_two(&one, &two), h.hash_two(&two, &one));
    }
}
