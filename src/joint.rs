use crate::*;
use num_bigint_dig::BigUint;
use num_traits::{One, Zero};

/// Joint public key of a fixed, ordered signer list: `Y = prod(h_i) mod p`.
/// Key-homomorphism makes this the only place joint key material is formed;
/// it carries the shared group of the first signer.
pub fn joint_public_key(keys: &[SchnorrPublicKey]) -> Result<SchnorrPublicKey, Error> {
    let first = keys.first().ok_or(Error::EmptySignerList)?;

    let mut y = BigUint::one();
    for pk in keys {
        y = y * &pk.h % &first.group.p;
    }

    Ok(SchnorrPublicKey {
        group: first.group.clone(),
        h: y,
        security_parameter: first.security_parameter,
    })
}

/// Aggregate commitment `A = prod(a_i) mod p` over the signers' first-round
/// commitments. All partial responses must be computed against this single
/// value: the joint challenge is derived from it once and reused verbatim.
pub fn joint_commitment(commitments: &[BigUint], p: &BigUint) -> BigUint {
    let mut a = BigUint::one();
    for c in commitments {
        a = a * c % p;
    }
    a
}

/// Aggregate the partial responses into the joint signature
/// `(A, e, sum(z_i) mod q)`, which verifies under the joint public key with
/// the ordinary [`SchnorrSignature::verify`].
pub fn combine_signatures(
    partials: &[SchnorrSignature],
    joint_pk: &SchnorrPublicKey,
    message: &str,
) -> SchnorrSignature {
    let group = &joint_pk.group;

    let mut a = BigUint::one();
    let mut z = BigUint::zero();
    for partial in partials {
        a = a * &partial.a % &group.p;
        z = (z + &partial.z) % &group.q;
    }

    let e = challenge(joint_pk, &a, message);

    SchnorrSignature { a, e, z }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_joint_protocol(n: usize, message: &str) -> (SchnorrPublicKey, SchnorrSignature) {
        let group = GroupParams::generate(64).unwrap();
        let signers: Vec<SchnorrKeyPair> = (0..n)
            .map(|_| SchnorrKeyPair::generate(&group, 64))
            .collect();

        // Round 1: independent commitments.
        let round_one: Vec<(BigUint, BigUint)> =
            signers.iter().map(|kp| kp.commitment()).collect();

        let keys: Vec<SchnorrPublicKey> = signers.iter().map(|kp| kp.public().clone()).collect();
        let joint_pk = joint_public_key(&keys).unwrap();

        let commitments: Vec<BigUint> = round_one.iter().map(|(_, a)| a.clone()).collect();
        let aggregate = joint_commitment(&commitments, &group.p);

        // Round 2: partial responses against the shared aggregate.
        let partials: Vec<SchnorrSignature> = signers
            .iter()
            .zip(round_one.iter())
            .map(|(kp, (r, _))| kp.partial_sign(message, &aggregate, r, &joint_pk))
            .collect();

        let sig = combine_signatures(&partials, &joint_pk, message);
        (joint_pk, sig)
    }

    #[test]
    fn joint_signature_round_trip() {
        for n in [1, 3, 5] {
            let (joint_pk, sig) = run_joint_protocol(n, "jointly signed");
            assert!(sig.verify(&joint_pk, "jointly signed"), "n = {}", n);
        }
    }

    #[test]
    fn joint_signature_binds_the_message() {
        let (joint_pk, sig) = run_joint_protocol(3, "jointly signed");
        assert!(!sig.verify(&joint_pk, "something else"));
    }

    #[test]
    fn empty_signer_list_is_rejected() {
        assert!(matches!(
            joint_public_key(&[]),
            Err(Error::EmptySignerList)
        ));
    }
}
