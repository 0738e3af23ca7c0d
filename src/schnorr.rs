use crate::*;
use digest::Digest;
use num_bigint_dig::{BigUint, RandBigInt};
use sha2::Sha256;
use std::fmt;

/// Schnorr public key: the full group description together with
/// `h = g^s mod p`. Verification needs `g`, `p` and `q`, so the group always
/// travels with the key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SchnorrPublicKey {
    pub group: GroupParams,

    #[serde(with = "crate::serde_bigint")]
    pub h: BigUint,

    pub security_parameter: usize,
}

impl fmt::Display for SchnorrPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "(g={}, h={}, p={}, q={})",
            self.group.g, self.h, self.group.p, self.group.q
        )
    }
}

/// Schnorr signing key. The secret scalar never leaves this struct; signing
/// and joint-signature contributions are methods on it.
pub struct SchnorrKeyPair {
    s: BigUint,
    public: SchnorrPublicKey,
}

/// Schnorr signature triple. The stored challenge `e` is informational only:
/// verification always recomputes it from the commitment and the message.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SchnorrSignature {
    #[serde(with = "crate::serde_bigint")]
    pub a: BigUint,

    #[serde(with = "crate::serde_bigint")]
    pub e: BigUint,

    #[serde(with = "crate::serde_bigint")]
    pub z: BigUint,
}

impl fmt::Display for SchnorrSignature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(a={}, e={}, z={})", self.a, self.e, self.z)
    }
}

/// The signature challenge: `SHA256(dec(g) || dec(h) || dec(a) || M) mod q`.
///
/// The decimal stringification of the numeric fields is part of the scheme's
/// contract; sign and verify must feed the hash byte-identical input.
pub fn challenge(pk: &SchnorrPublicKey, a: &BigUint, message: &str) -> BigUint {
    let mut hasher = Sha256::new();
    hasher.update(pk.group.g.to_string().as_bytes());
    hasher.update(pk.h.to_string().as_bytes());
    hasher.update(a.to_string().as_bytes());
    hasher.update(message.as_bytes());

    BigUint::from_bytes_be(&hasher.finalize()) % &pk.group.q
}

impl SchnorrKeyPair {
    /// Draw `s` from `[0, 2^security_parameter)` and publish `h = g^s mod p`
    /// over the given shared group.
    pub fn generate(group: &GroupParams, security_parameter: usize) -> Self {
        let mut rng = rand::rngs::OsRng;

        let s = rng.gen_biguint(security_parameter);
        let h = group.g.modpow(&s, &group.p);

        SchnorrKeyPair {
            s,
            public: SchnorrPublicKey {
                group: group.clone(),
                h,
                security_parameter,
            },
        }
    }

    pub fn public(&self) -> &SchnorrPublicKey {
        &self.public
    }

    /// Sign a message: fresh nonce `r`, commitment `a = g^r mod p`,
    /// challenge from the own public key, response `z = r + e*s mod q`.
    pub fn sign(&self, message: &str) -> SchnorrSignature {
        let group = &self.public.group;
        let mut rng = rand::rngs::OsRng;

        let r = rng.gen_biguint(self.public.security_parameter);
        let a = group.g.modpow(&r, &group.p);
        let e = challenge(&self.public, &a, message);
        let z = (r + (&e * &self.s) % &group.q) % &group.q;

        SchnorrSignature { a, e, z }
    }

    /// A joint-signature commitment: the nonce `r` and `a = g^r mod p`.
    /// The nonce must be handed back verbatim to [`partial_sign`] and never
    /// reused across protocol runs.
    ///
    /// [`partial_sign`]: SchnorrKeyPair::partial_sign
    pub fn commitment(&self) -> (BigUint, BigUint) {
        let group = &self.public.group;
        let mut rng = rand::rngs::OsRng;

        let r = rng.gen_biguint(self.public.security_parameter);
        let a = group.g.modpow(&r, &group.p);
        (r, a)
    }

    /// The second joint-signature round: a partial response under the
    /// signer's own secret, but against the aggregate commitment and the
    /// joint public key. Every signer must receive the same
    /// `joint_commitment`, so that the single shared challenge binds all
    /// partial responses.
    pub fn partial_sign(
        &self,
        message: &str,
        joint_commitment: &BigUint,
        nonce: &BigUint,
        joint_pk: &SchnorrPublicKey,
    ) -> SchnorrSignature {
        let group = &self.public.group;

        let a = group.g.modpow(nonce, &group.p);
        let e = challenge(joint_pk, joint_commitment, message);
        let z = (nonce + (&e * &self.s) % &group.q) % &group.q;

        SchnorrSignature { a, e, z }
    }
}

impl SchnorrSignature {
    /// Recompute the challenge from the commitment and the message, and
    /// accept iff `a * h^e mod p == g^z mod p`. The signature's own `e`
    /// field is deliberately ignored.
    pub fn verify(&self, pk: &SchnorrPublicKey, message: &str) -> bool {
        let group = &pk.group;

        let e = challenge(pk, &self.a, message);
        let lhs = (&self.a * pk.h.modpow(&e, &group.p)) % &group.p;
        lhs == group.g.modpow(&self.z, &group.p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify() {
        let group = GroupParams::generate(64).unwrap();
        let keypair = SchnorrKeyPair::generate(&group, 64);

        let sig = keypair.sign("a message");
        assert!(sig.verify(keypair.public(), "a message"));
    }

    #[test]
    fn tampering_is_detected() {
        let group = GroupParams::generate(64).unwrap();
        let keypair = SchnorrKeyPair::generate(&group, 64);
        let other = SchnorrKeyPair::generate(&group, 64);

        let sig = keypair.sign("a message");

        assert!(!sig.verify(keypair.public(), "another message"));
        assert!(!sig.verify(other.public(), "a message"));

        let mut forged = sig.clone();
        forged.z += 1u32;
        assert!(!forged.verify(keypair.public(), "a message"));
    }

    #[test]
    fn stored_challenge_is_ignored() {
        let group = GroupParams::generate(64).unwrap();
        let keypair = SchnorrKeyPair::generate(&group, 64);

        let mut sig = keypair.sign("a message");
        sig.e += 1u32;
        assert!(sig.verify(keypair.public(), "a message"));
    }
}
