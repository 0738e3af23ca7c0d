use crate::*;
use num_bigint_dig::BigUint;

/// An election authority: one Schnorr signer of the joint authority set,
/// and (once the sharing ceremony has run) holder of one ElGamal key share.
///
/// All authorities of a run sign over the same shared group.
pub struct Authority {
    signing: SchnorrKeyPair,
    share: Option<ElGamalKeyShare>,
}

impl Authority {
    pub fn new(group: &GroupParams, security_parameter: usize) -> Self {
        Authority {
            signing: SchnorrKeyPair::generate(group, security_parameter),
            share: None,
        }
    }

    /// Hand the authority its key share from the sharing ceremony.
    pub fn assign_share(&mut self, share: ElGamalKeyShare) {
        self.share = Some(share);
    }

    pub fn signing_key(&self) -> &SchnorrPublicKey {
        self.signing.public()
    }

    pub fn sign(&self, message: &str) -> SchnorrSignature {
        self.signing.sign(message)
    }

    /// First joint-signature round: this authority's `(nonce, commitment)`.
    pub fn commitment(&self) -> (BigUint, BigUint) {
        self.signing.commitment()
    }

    /// Second joint-signature round: the partial response against the
    /// aggregate commitment and joint key.
    pub fn partial_signature(
        &self,
        message: &str,
        joint_commitment: &BigUint,
        nonce: &BigUint,
        joint_pk: &SchnorrPublicKey,
    ) -> SchnorrSignature {
        self.signing
            .partial_sign(message, joint_commitment, nonce, joint_pk)
    }

    /// This authority's decryption contribution `w_j` for a combined
    /// ballot ciphertext.
    pub fn decryption_contribution(&self, ballot_sum: &Ciphertext) -> Result<BigUint, Error> {
        let share = self.share.as_ref().ok_or(Error::MissingKeyShare)?;
        Ok(share.partial_decrypt(ballot_sum))
    }

    /// Compute `w_j`, build the (simulated) correctness proof, sign
    /// `w_j || proof`, and publish the contribution to the ledger.
    pub fn publish_decryption_contribution(
        &self,
        ballot_sum: &Ciphertext,
        ledger: &mut Ledger,
    ) -> Result<(), Error> {
        let share = self.share.as_ref().ok_or(Error::MissingKeyShare)?;

        let contribution = share.partial_decrypt(ballot_sum);
        let proof = self.prove_contribution(&contribution, &ballot_sum.c2);
        let message = contribution.to_string();
        let sig = self.signing.sign(&format!("{}{}", message, proof));

        ledger.insert_decryption_contribution(
            self.signing.public(),
            &sig,
            message,
            proof,
            &contribution,
            &ballot_sum.c2,
            share.public(),
        )
    }

    /// Simulated proof that the contribution matches this authority's share.
    fn prove_contribution(&self, _contribution: &BigUint, _nonce_component: &BigUint) -> String {
        "decryption contribution valid".to_string()
    }
}

/// Run the whole two-round joint-signature protocol over an ordered set of
/// authorities: collect commitments, form the joint key and aggregate
/// commitment, gather the partial responses against the single shared
/// challenge, and combine them.
pub fn joint_sign(
    authorities: &[Authority],
    message: &str,
) -> Result<(SchnorrPublicKey, SchnorrSignature), Error> {
    let keys: Vec<SchnorrPublicKey> = authorities
        .iter()
        .map(|authority| authority.signing_key().clone())
        .collect();
    let joint_pk = joint_public_key(&keys)?;

    let round_one: Vec<(BigUint, BigUint)> = authorities
        .iter()
        .map(|authority| authority.commitment())
        .collect();
    let commitments: Vec<BigUint> = round_one.iter().map(|(_, a)| a.clone()).collect();
    let aggregate = joint_commitment(&commitments, &joint_pk.group.p);

    let partials: Vec<SchnorrSignature> = authorities
        .iter()
        .zip(round_one.iter())
        .map(|(authority, (nonce, _))| {
            authority.partial_signature(message, &aggregate, nonce, &joint_pk)
        })
        .collect();

    let signature = combine_signatures(&partials, &joint_pk, message);
    Ok((joint_pk, signature))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorities_jointly_sign() {
        let group = GroupParams::generate(64).unwrap();
        let authorities: Vec<Authority> = (0..3).map(|_| Authority::new(&group, 64)).collect();

        let (joint_pk, sig) = joint_sign(&authorities, "a shared statement").unwrap();
        assert!(sig.verify(&joint_pk, "a shared statement"));
        assert!(!sig.verify(&joint_pk, "a different statement"));
    }

    #[test]
    fn contribution_requires_a_share() {
        let group = GroupParams::generate(64).unwrap();
        let authority = Authority::new(&group, 64);

        assert!(matches!(
            authority.decryption_contribution(&Ciphertext::identity()),
            Err(Error::MissingKeyShare)
        ));
    }
}
