use crate::*;
use num_bigint_dig::BigUint;
use num_traits::{One, Zero};
use std::path::Path;

/// A voter: a Schnorr identity (`h` of the signing key) plus the ability to
/// encrypt and submit a 0/1 ballot.
pub struct Voter {
    signing: SchnorrKeyPair,
}

impl Voter {
    pub fn new(group: &GroupParams, security_parameter: usize) -> Self {
        Voter {
            signing: SchnorrKeyPair::generate(group, security_parameter),
        }
    }

    pub fn public_key(&self) -> &SchnorrPublicKey {
        self.signing.public()
    }

    /// The registry identity of this voter.
    pub fn identity(&self) -> &BigUint {
        &self.signing.public().h
    }

    /// Append this voter's identity to the portal file, ahead of
    /// registration by the authorities.
    pub fn publish_public_key<P: AsRef<Path>>(&self, portal_path: P) -> Result<(), Error> {
        crate::portal::publish_public_key(portal_path, self.identity())
    }

    /// Encrypt the choice under a fresh nonce, attach the (simulated)
    /// validity proof, sign `ciphertext || proof`, and submit the ballot.
    /// The ledger's verdict is passed through unchanged.
    pub fn cast_vote(
        &self,
        ledger: &mut Ledger,
        election_key: &ElGamalPublicKey,
        choice: bool,
    ) -> Result<(), Error> {
        let m = if choice {
            BigUint::one()
        } else {
            BigUint::zero()
        };
        let r = election_key.params.random_nonce();
        let ballot = election_key.encrypt(&m, &r);

        let proof = self.prove_ballot(election_key, &m, &r);
        let sig = self.signing.sign(&format!("{}{}", ballot, proof));

        ledger.insert_vote(election_key, self.signing.public(), &sig, &ballot, &proof)
    }

    /// Simulated proof that the ballot encrypts 0 or 1.
    fn prove_ballot(&self, _election_key: &ElGamalPublicKey, _m: &BigUint, _r: &BigUint) -> String {
        "ballot valid".to_string()
    }
}
