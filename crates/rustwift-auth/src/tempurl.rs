//! HMAC signatures for Swift temporary URLs.
//!
//! A temporary URL grants access to one object for one HTTP method until an
//! expiry time, without a token. The signature is the hex-encoded HMAC of
//!
//! ```text
//! METHOD\nEXPIRES\nPATH
//! ```
//!
//! keyed with the account or container `Temp-URL-Key`, where `PATH` is the
//! URL path of the object (`/v1/AUTH_account/container/object`).
//!
//! # Examples
//!
//! ```
//! use rustwift_auth::tempurl::{TempUrlDigest, sign, verify};
//!
//! let path = "/v1/AUTH_test/photos/cat.jpg";
//! let sig = sign(TempUrlDigest::Sha256, b"secret", "GET", 1_700_000_000, path);
//! assert_eq!(sig.len(), 64);
//! assert!(verify(TempUrlDigest::Sha256, b"secret", "GET", 1_700_000_000, path, &sig));
//! ```

use std::fmt;
use std::str::FromStr;

use hmac::{Hmac, KeyInit, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use subtle::ConstantTimeEq;

use crate::AuthError;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// Digest algorithms accepted by Swift's tempurl middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TempUrlDigest {
    /// HMAC-SHA1.
    Sha1,
    /// HMAC-SHA256.
    Sha256,
    /// HMAC-SHA512.
    Sha512,
}

impl TempUrlDigest {
    /// All digests, strongest first.
    pub const PREFERENCE: [Self; 3] = [Self::Sha512, Self::Sha256, Self::Sha1];

    /// Name as advertised in the `tempurl.allowed_digests` capability.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for TempUrlDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TempUrlDigest {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            _ => Err(AuthError::UnsupportedDigest(s.to_owned())),
        }
    }
}

/// Pick the strongest digest that the server advertises and the caller
/// allows. An empty `allowed` list allows every digest.
///
/// # Examples
///
/// ```
/// use rustwift_auth::tempurl::{TempUrlDigest, choose_digest};
///
/// let advertised = [TempUrlDigest::Sha1, TempUrlDigest::Sha256];
/// assert_eq!(choose_digest(&advertised, &[]), Some(TempUrlDigest::Sha256));
/// assert_eq!(
///     choose_digest(&advertised, &[TempUrlDigest::Sha1]),
///     Some(TempUrlDigest::Sha1)
/// );
/// assert_eq!(choose_digest(&advertised, &[TempUrlDigest::Sha512]), None);
/// ```
#[must_use]
pub fn choose_digest(
    advertised: &[TempUrlDigest],
    allowed: &[TempUrlDigest],
) -> Option<TempUrlDigest> {
    TempUrlDigest::PREFERENCE
        .into_iter()
        .find(|d| advertised.contains(d) && (allowed.is_empty() || allowed.contains(d)))
}

/// Compute the hex-encoded temporary URL signature.
#[must_use]
pub fn sign(digest: TempUrlDigest, key: &[u8], method: &str, expires: i64, path: &str) -> String {
    let payload = format!("{method}\n{expires}\n{path}");
    hex::encode(compute_hmac(digest, key, payload.as_bytes()))
}

/// Check a hex-encoded temporary URL signature in constant time.
#[must_use]
pub fn verify(
    digest: TempUrlDigest,
    key: &[u8],
    method: &str,
    expires: i64,
    path: &str,
    signature: &str,
) -> bool {
    let expected = sign(digest, key, method, expires, path);
    let provided = signature.to_ascii_lowercase();
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn compute_hmac(digest: TempUrlDigest, key: &[u8], data: &[u8]) -> Vec<u8> {
    match digest {
        TempUrlDigest::Sha1 => {
            let mut mac = HmacSha1::new_from_slice(key).expect("HMAC can accept any key length");
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
        TempUrlDigest::Sha256 => {
            let mut mac =
                HmacSha256::new_from_slice(key).expect("HMAC can accept any key length");
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
        TempUrlDigest::Sha512 => {
            let mut mac =
                HmacSha512::new_from_slice(key).expect("HMAC can accept any key length");
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
    }
}
