use crate::*;
use num_bigint_dig::{BigUint, ModInverse, RandBigInt};
use num_traits::{One, Zero};
use std::fmt;
use std::str::FromStr;

/// Group description for the encryption side. All authorities of a run share
/// one instance; setup delegates to the safe-prime generator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ElGamalParams {
    pub group: GroupParams,
    pub security_parameter: usize,
}

impl ElGamalParams {
    pub fn setup(security_parameter: usize) -> Result<Self, Error> {
        let group = GroupParams::generate(security_parameter)?;
        Ok(ElGamalParams {
            group,
            security_parameter,
        })
    }

    /// A fresh encryption nonce of `security_parameter` bits. One draw per
    /// ciphertext; nonces are never reused.
    pub fn random_nonce(&self) -> BigUint {
        let mut rng = rand::rngs::OsRng;
        rng.gen_biguint(self.security_parameter)
    }
}

/// ElGamal public key `h = g^s mod p`. For the global key, `s` is the
/// un-shared master secret, which exists only during the sharing ceremony
/// and is never reconstructed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ElGamalPublicKey {
    pub params: ElGamalParams,

    #[serde(with = "crate::serde_bigint")]
    pub h: BigUint,
}

/// One authority's share of the decryption key: the Shamir evaluation `s_j`
/// at participant index `j`, together with its public `h_j = g^{s_j} mod p`.
pub struct ElGamalKeyShare {
    index: usize,
    s: BigUint,
    public: ElGamalPublicKey,
}

impl ElGamalKeyShare {
    /// 1-based participant index `j` the share was evaluated at.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn public(&self) -> &ElGamalPublicKey {
        &self.public
    }

    /// Decryption contribution `w_j = C2^{s_j} mod p`.
    pub fn partial_decrypt(&self, ciphertext: &Ciphertext) -> BigUint {
        let p = &self.public.params.group.p;
        ciphertext.c2.modpow(&self.s, p)
    }
}

/// Shamir-share a fresh master secret over `Z_q` among `n` shareholders:
/// `s_j = s + sum(a_i * j^i) mod q` for `j = 1..=n` with random coefficients
/// `a_1..a_{n-1}`. Returns the shares and the global public key
/// `h = g^s mod p`.
///
/// Reconstruction uses general Lagrange interpolation at `x = 0`, but all
/// `n` contributions are required: this is structurally an n-of-n scheme,
/// not a lower-threshold one.
pub fn share_secret(
    params: &ElGamalParams,
    n: usize,
) -> Result<(Vec<ElGamalKeyShare>, ElGamalPublicKey), Error> {
    if n == 0 {
        return Err(Error::NoShareholders);
    }

    let group = &params.group;
    let mut rng = rand::rngs::OsRng;

    let s = rng.gen_biguint(params.security_parameter) % &group.q;
    let coefficients: Vec<BigUint> = (1..n)
        .map(|_| rng.gen_biguint(params.security_parameter) % &group.q)
        .collect();

    let mut shares = Vec::with_capacity(n);
    for j in 1..=n {
        let x = BigUint::from(j);

        let mut sum = BigUint::zero();
        for (i, coefficient) in coefficients.iter().enumerate() {
            let degree = BigUint::from(i + 1);
            sum = (sum + coefficient * x.modpow(&degree, &group.q)) % &group.q;
        }

        let s_j = (&s + sum) % &group.q;
        let h_j = group.g.modpow(&s_j, &group.p);

        shares.push(ElGamalKeyShare {
            index: j,
            s: s_j,
            public: ElGamalPublicKey {
                params: params.clone(),
                h: h_j,
            },
        });
    }

    let global = ElGamalPublicKey {
        params: params.clone(),
        h: group.g.modpow(&s, &group.p),
    };

    Ok((shares, global))
}

/// Exponential ElGamal ciphertext `(C, C2)` with `C = g^m * h^r mod p` and
/// `C2 = g^r mod p`. Componentwise multiplication encrypts the sum of the
/// plaintext exponents.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Ciphertext {
    #[serde(with = "crate::serde_bigint")]
    pub c: BigUint,

    #[serde(with = "crate::serde_bigint")]
    pub c2: BigUint,
}

impl Ciphertext {
    /// The homomorphic identity `(1, 1)`, encrypting exponent zero.
    pub fn identity() -> Self {
        Ciphertext {
            c: BigUint::one(),
            c2: BigUint::one(),
        }
    }
}

impl fmt::Display for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{C={};C2={}}}", self.c, self.c2)
    }
}

impl FromStr for Ciphertext {
    type Err = Error;

    /// Parse the canonical `{C=<decimal>;C2=<decimal>}` encoding.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || Error::MalformedCiphertext(s.to_string());

        let inner = s
            .strip_prefix("{C=")
            .and_then(|rest| rest.strip_suffix('}'))
            .ok_or_else(malformed)?;
        let (c, c2) = inner.split_once(";C2=").ok_or_else(malformed)?;

        Ok(Ciphertext {
            c: BigUint::from_str(c).map_err(|_| malformed())?,
            c2: BigUint::from_str(c2).map_err(|_| malformed())?,
        })
    }
}

impl ElGamalPublicKey {
    /// Encrypt the exponent `m` under nonce `r`. The message is expected to
    /// be small (a 0/1 vote): decryption only recovers `g^m`, and reading
    /// `m` back goes through the bounded exponent search.
    pub fn encrypt(&self, m: &BigUint, r: &BigUint) -> Ciphertext {
        let group = &self.params.group;

        let encoded = group.g.modpow(m, &group.p);
        let c = (encoded * self.h.modpow(r, &group.p)) % &group.p;
        let c2 = group.g.modpow(r, &group.p);

        Ciphertext { c, c2 }
    }

    /// Componentwise modular product of the given ciphertexts, encrypting
    /// the sum of their plaintext exponents. An empty sequence combines to
    /// the identity.
    pub fn combine<'a, I>(&self, ciphertexts: I) -> Ciphertext
    where
        I: IntoIterator<Item = &'a Ciphertext>,
    {
        let p = &self.params.group.p;

        let mut combined = Ciphertext::identity();
        for ct in ciphertexts {
            combined.c = combined.c * &ct.c % p;
            combined.c2 = combined.c2 * &ct.c2 % p;
        }
        combined
    }

    /// Combine all `n` decryption contributions into the plaintext group
    /// element `g^m mod p`: Lagrange coefficients at `x = 0`,
    /// `W = prod(w_j^{lambda_j}) mod p`, result `C * W^-1 mod p`.
    pub fn decrypt(
        &self,
        ciphertext: &Ciphertext,
        contributions: &[BigUint],
    ) -> Result<BigUint, Error> {
        let group = &self.params.group;
        let n = contributions.len();

        let mut w_combined = BigUint::one();
        for (j, w_j) in contributions.iter().enumerate() {
            let j = j + 1;

            let mut lambda = BigUint::one();
            for l in 1..=n {
                if l == j {
                    continue;
                }
                // l * (l - j)^-1 mod q, with the difference lifted into Z_q.
                let difference = if l > j {
                    BigUint::from(l - j) % &group.q
                } else {
                    (&group.q - BigUint::from(j - l) % &group.q) % &group.q
                };
                let inverse = difference
                    .mod_inverse(&group.q)
                    .and_then(|inv| inv.to_biguint())
                    .ok_or(Error::DecryptionFailed)?;
                lambda = lambda * (BigUint::from(l) * inverse % &group.q) % &group.q;
            }

            w_combined = w_combined * w_j.modpow(&lambda, &group.p) % &group.p;
        }

        let w_inverse = w_combined
            .mod_inverse(&group.p)
            .and_then(|inv| inv.to_biguint())
            .ok_or(Error::DecryptionFailed)?;

        Ok(&ciphertext.c * w_inverse % &group.p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decrypt_with_shares(
        pk: &ElGamalPublicKey,
        shares: &[ElGamalKeyShare],
        ciphertext: &Ciphertext,
    ) -> BigUint {
        let contributions: Vec<BigUint> = shares
            .iter()
            .map(|share| share.partial_decrypt(ciphertext))
            .collect();
        pk.decrypt(ciphertext, &contributions).unwrap()
    }

    #[test]
    fn share_and_decrypt() {
        let params = ElGamalParams::setup(64).unwrap();

        for n in [1, 2, 5, 15] {
            let (shares, pk) = share_secret(&params, n).unwrap();

            for m in [0u32, 1] {
                let ct = pk.encrypt(&BigUint::from(m), &params.random_nonce());
                let plaintext = decrypt_with_shares(&pk, &shares, &ct);
                let expected = params.group.g.modpow(&BigUint::from(m), &params.group.p);
                assert_eq!(plaintext, expected, "n = {}, m = {}", n, m);
            }
        }
    }

    #[test]
    fn combine_sums_the_exponents() {
        let params = ElGamalParams::setup(64).unwrap();
        let (shares, pk) = share_secret(&params, 3).unwrap();

        let votes = [1u32, 0, 1, 1, 0];
        let ciphertexts: Vec<Ciphertext> = votes
            .iter()
            .map(|&m| pk.encrypt(&BigUint::from(m), &params.random_nonce()))
            .collect();

        let combined = pk.combine(&ciphertexts);
        let plaintext = decrypt_with_shares(&pk, &shares, &combined);

        let total: u32 = votes.iter().sum();
        let expected = params.group.g.modpow(&BigUint::from(total), &params.group.p);
        assert_eq!(plaintext, expected);
    }

    #[test]
    fn combine_is_order_independent() {
        let params = ElGamalParams::setup(64).unwrap();
        let (_, pk) = share_secret(&params, 2).unwrap();

        let a = pk.encrypt(&BigUint::from(1u32), &params.random_nonce());
        let b = pk.encrypt(&BigUint::from(0u32), &params.random_nonce());
        let c = pk.encrypt(&BigUint::from(1u32), &params.random_nonce());

        let forward = pk.combine([&a, &b, &c]);
        let backward = pk.combine([&c, &b, &a]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn empty_combine_is_the_identity() {
        let params = ElGamalParams::setup(64).unwrap();
        let (_, pk) = share_secret(&params, 1).unwrap();

        assert_eq!(pk.combine([]), Ciphertext::identity());
    }

    #[test]
    fn ciphertext_encoding_round_trip() {
        let ct = Ciphertext {
            c: BigUint::from(123456789u64),
            c2: BigUint::from(987654321u64),
        };

        let encoded = ct.to_string();
        assert_eq!(encoded, "{C=123456789;C2=987654321}");
        assert_eq!(encoded.parse::<Ciphertext>().unwrap(), ct);
    }

    #[test]
    fn malformed_ciphertext_encoding() {
        for bad in ["", "{C=12;C2=}", "{C=12,C2=34}", "C=12;C2=34", "{C=x;C2=1}"] {
            assert!(matches!(
                bad.parse::<Ciphertext>(),
                Err(Error::MalformedCiphertext(_))
            ));
        }
    }

    #[test]
    fn zero_shareholders_is_rejected() {
        let params = ElGamalParams::setup(64).unwrap();
        assert!(matches!(
            share_secret(&params, 0),
            Err(Error::NoShareholders)
        ));
    }
}
