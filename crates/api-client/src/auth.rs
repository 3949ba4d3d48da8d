use crate::error::ApiError;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::BTreeMap;

// Create a type alias for the HMAC-SHA256 implementation.
type HmacSha256 = Hmac<Sha256>;

/// A canonical query string together with its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedQuery {
    /// The URL-encoded parameters, sorted by key. This is exactly what was signed.
    pub query: String,
    /// Hex-encoded HMAC-SHA256 of `query`.
    pub signature: String,
}

impl SignedQuery {
    /// The query string to send: the canonical parameters followed by `signature=<hex>`.
    pub fn to_query_string(&self) -> String {
        if self.query.is_empty() {
            format!("signature={}", self.signature)
        } else {
            format!("{}&signature={}", self.query, self.signature)
        }
    }
}

/// Builds the canonical query string for a set of parameters.
///
/// Parameters are sorted by key before encoding so that the result does not
/// depend on the order they were supplied in. The exchange recomputes the
/// signature over the same canonical form and rejects any mismatch.
pub fn canonical_query<'a, I>(params: I) -> Result<String, ApiError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let sorted: BTreeMap<&str, &str> = params.into_iter().collect();
    serde_qs::to_string(&sorted).map_err(|e| ApiError::Signing(e.to_string()))
}

/// Canonicalizes `params` and signs the result with `secret`.
///
/// The signature itself is never part of the signed data.
pub fn sign_params<'a, I>(params: I, secret: &str) -> Result<SignedQuery, ApiError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let query = canonical_query(params)?;
    let signature = sign_request(secret, &query)?;
    Ok(SignedQuery { query, signature })
}

/// Creates an HMAC-SHA256 signature for a given query string.
///
/// Binance requires all private API calls to be signed. The result is the
/// lowercase hexadecimal form the API expects.
pub fn sign_request(secret: &str, query_string: &str) -> Result<String, ApiError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ApiError::Signing(format!("HMAC error: {}", e)))?;
    mac.update(query_string.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret";

    fn order_params() -> Vec<(&'static str, &'static str)> {
        vec![
            ("symbol", "BTCUSDT"),
            ("side", "BUY"),
            ("type", "LIMIT"),
            ("timeInForce", "GTC"),
            ("quantity", "0.001"),
            ("price", "50000"),
            ("recvWindow", "5000"),
            ("timestamp", "1234567890000"),
        ]
    }

    #[test]
    fn query_is_sorted_by_key() {
        let query = canonical_query(order_params()).unwrap();
        assert_eq!(
            query,
            "price=50000&quantity=0.001&recvWindow=5000&side=BUY&symbol=BTCUSDT&timeInForce=GTC&timestamp=1234567890000&type=LIMIT"
        );
    }

    #[test]
    fn signing_is_independent_of_insertion_order() {
        let forward = sign_params(order_params(), SECRET).unwrap();
        let mut reversed_params = order_params();
        reversed_params.reverse();
        let reversed = sign_params(reversed_params, SECRET).unwrap();

        assert_eq!(forward, reversed);
        assert_eq!(forward, sign_params(order_params(), SECRET).unwrap());
    }

    #[test]
    fn signature_is_hex_hmac_of_the_query() {
        let signed = sign_params(order_params(), SECRET).unwrap();
        assert_eq!(signed.signature.len(), 64);
        assert!(signed.signature.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(signed.signature, sign_request(SECRET, &signed.query).unwrap());
    }

    #[test]
    fn known_vector_from_binance_docs() {
        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
        assert_eq!(
            sign_request(secret, query).unwrap(),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn changing_a_value_changes_the_signature() {
        let base = sign_params(order_params(), SECRET).unwrap();
        let mut params = order_params();
        params[4] = ("quantity", "0.002");
        let changed = sign_params(params, SECRET).unwrap();
        assert_ne!(base.signature, changed.signature);
    }

    #[test]
    fn changing_the_secret_changes_the_signature() {
        let a = sign_params(order_params(), SECRET).unwrap();
        let b = sign_params(order_params(), "another_secret").unwrap();
        assert_eq!(a.query, b.query);
        assert_ne!(a.signature, b.signature);
    }

    #[test]
    fn signature_is_appended_last() {
        let signed = sign_params(order_params(), SECRET).unwrap();
        let full = signed.to_query_string();
        assert!(full.starts_with(&signed.query));
        assert!(full.ends_with(&format!("&signature={}", signed.signature)));
        assert!(!signed.query.contains("signature"));
    }
}
