use crate::*;
use std::fmt;

/// Transaction payload: either a bare message, or a message accompanied by a
/// zero-knowledge proof string. Consumers pattern-match on the variant; code
/// that requires a proof treats a `Plain` payload as a hard error rather
/// than downcasting.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    Plain { message: String },
    WithProof { message: String, proof: String },
}

/// A signed ledger transaction. Immutable once constructed; the signature
/// covers the message, concatenated with the proof when one is present.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub signer: SchnorrPublicKey,
    pub signature: SchnorrSignature,

    #[serde(flatten)]
    pub payload: Payload,
}

impl Transaction {
    pub fn plain(signer: SchnorrPublicKey, signature: SchnorrSignature, message: String) -> Self {
        Transaction {
            signer,
            signature,
            payload: Payload::Plain { message },
        }
    }

    pub fn with_proof(
        signer: SchnorrPublicKey,
        signature: SchnorrSignature,
        message: String,
        proof: String,
    ) -> Self {
        Transaction {
            signer,
            signature,
            payload: Payload::WithProof { message, proof },
        }
    }

    pub fn message(&self) -> &str {
        match &self.payload {
            Payload::Plain { message } => message,
            Payload::WithProof { message, .. } => message,
        }
    }

    pub fn proof(&self) -> Option<&str> {
        match &self.payload {
            Payload::Plain { .. } => None,
            Payload::WithProof { proof, .. } => Some(proof),
        }
    }

    /// The exact byte string the signature covers: `message` for plain
    /// transactions, `message || proof` for proof-carrying ones.
    pub fn signed_content(&self) -> String {
        match &self.payload {
            Payload::Plain { message } => message.clone(),
            Payload::WithProof { message, proof } => format!("{}{}", message, proof),
        }
    }

    pub fn verify_signature(&self) -> Result<(), ValidationError> {
        if self.signature.verify(&self.signer, &self.signed_content()) {
            Ok(())
        } else {
            Err(ValidationError::SignatureInvalid)
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.payload {
            Payload::Plain { message } => write!(
                f,
                "Transaction(signer={}, signature={}, message={})",
                self.signer, self.signature, message
            ),
            Payload::WithProof { message, proof } => write!(
                f,
                "Transaction(signer={}, signature={}, message={}, proof={})",
                self.signer, self.signature, message, proof
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keypair() -> SchnorrKeyPair {
        let group = GroupParams::generate(64).unwrap();
        SchnorrKeyPair::generate(&group, 64)
    }

    #[test]
    fn signature_covers_message_and_proof() {
        let keypair = keypair();

        let sig = keypair.sign("ballotproof");
        let tx = Transaction::with_proof(
            keypair.public().clone(),
            sig.clone(),
            "ballot".into(),
            "proof".into(),
        );
        tx.verify_signature().unwrap();

        // The same signature over the bare message must not verify.
        let tx = Transaction::plain(keypair.public().clone(), sig, "ballot".into());
        assert_eq!(
            tx.verify_signature(),
            Err(ValidationError::SignatureInvalid)
        );
    }

    #[test]
    fn serde_round_trip() {
        let keypair = keypair();
        let tx = Transaction::with_proof(
            keypair.public().clone(),
            keypair.sign("messageproof"),
            "message".into(),
            "proof".into(),
        );

        let encoded = serde_json::to_string(&tx).unwrap();
        let decoded: Transaction = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, tx);
        decoded.verify_signature().unwrap();
    }
}
