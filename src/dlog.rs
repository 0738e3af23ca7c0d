use crate::*;
use num_bigint_dig::prime::probably_prime;
use num_bigint_dig::{BigUint, RandPrime};
use num_traits::One;

/// Retry bound for safe-prime sampling before generation is declared failed.
const MAX_GENERATION_ATTEMPTS: usize = 4096;

/// Miller-Rabin rounds, for an error probability of at most 2^-50 per check.
const PRIMALITY_ROUNDS: usize = 25;

/// Description of a cyclic group modulo a safe prime: `p = 2q + 1` with `p`
/// and `q` prime, and `g` a generator of the order-`q` subgroup.
///
/// All signatures and ciphertexts of a protocol run must be produced over a
/// single generated instance; mixing groups is a protocol violation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GroupParams {
    #[serde(with = "crate::serde_bigint")]
    pub p: BigUint,

    #[serde(with = "crate::serde_bigint")]
    pub q: BigUint,

    #[serde(with = "crate::serde_bigint")]
    pub g: BigUint,
}

impl GroupParams {
    /// Generate a fresh group: sample a probable prime `q` of `bits` bits
    /// until `p = 2q + 1` is also a probable prime, then take the smallest
    /// `g >= 2` generating the order-`q` subgroup.
    pub fn generate(bits: usize) -> Result<Self, Error> {
        let mut rng = rand::rngs::OsRng;

        for _ in 0..MAX_GENERATION_ATTEMPTS {
            let q: BigUint = rng.gen_prime(bits);
            let p = (&q << 1) + 1u32;
            if probably_prime(&p, PRIMALITY_ROUNDS) {
                let g = find_subgroup_generator(&p);
                return Ok(GroupParams { p, q, g });
            }
        }

        Err(Error::GenerationFailed(MAX_GENERATION_ATTEMPTS))
    }

    /// Euler-criterion membership test for the order-`q` subgroup:
    /// `x^((p-1)/2) mod p == 1`.
    pub fn is_subgroup_member(&self, x: &BigUint) -> bool {
        x.modpow(&self.q, &self.p).is_one()
    }
}

/// Smallest `g >= 2` with `g^((p-1)/2) mod p == 1`.
fn find_subgroup_generator(p: &BigUint) -> BigUint {
    let exp = (p - 1u32) >> 1;
    let mut g = BigUint::from(2u32);
    while !g.modpow(&exp, p).is_one() {
        g += 1u32;
    }
    g
}

/// Brute-force recovery of a small exponent: the first `i` in `0..bound`
/// with `g^i mod p == value`.
///
/// Only usable because the exponent is bounded by the number of voters; this
/// is not a general discrete-log solver. Exhausting the bound is reported as
/// [`Error::RecoveryBoundExceeded`], not a panic.
pub fn recover_exponent(
    value: &BigUint,
    g: &BigUint,
    p: &BigUint,
    bound: &BigUint,
) -> Result<BigUint, Error> {
    let mut power = BigUint::one();
    let mut i = BigUint::from(0u32);

    while &i < bound {
        if &power == value {
            return Ok(i);
        }
        power = power * g % p;
        i += 1u32;
    }

    Err(Error::RecoveryBoundExceeded(bound.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_group_is_safe_prime() {
        let group = GroupParams::generate(64).unwrap();

        assert!(probably_prime(&group.p, PRIMALITY_ROUNDS));
        assert!(probably_prime(&group.q, PRIMALITY_ROUNDS));
        assert_eq!(group.p, (&group.q << 1) + 1u32);
        assert!(group.is_subgroup_member(&group.g));
        assert!(group.g >= BigUint::from(2u32));
    }

    #[test]
    fn recover_small_exponent() {
        let group = GroupParams::generate(64).unwrap();

        let value = group.g.modpow(&BigUint::from(7u32), &group.p);
        let exponent =
            recover_exponent(&value, &group.g, &group.p, &BigUint::from(10u32)).unwrap();
        assert_eq!(exponent, BigUint::from(7u32));
    }

    #[test]
    fn recovery_bound_is_exclusive() {
        let group = GroupParams::generate(64).unwrap();

        let value = group.g.modpow(&BigUint::from(5u32), &group.p);
        let result = recover_exponent(&value, &group.g, &group.p, &BigUint::from(5u32));
        match result {
            Err(Error::RecoveryBoundExceeded(bound)) => assert_eq!(bound, BigUint::from(5u32)),
            other => panic!("expected RecoveryBoundExceeded, got {:?}", other.is_ok()),
        }
    }
}
