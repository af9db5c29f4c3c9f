//! RPC request signing (signature version 1.0, HMAC-SHA1).
//!
//! ```text
//! canonical     = sorted(k=v) joined by '&', keys and values percent-encoded
//! string_to_sign = "GET&%2F&" + percent_encode(canonical)
//! Signature     = base64(hmac_sha1(secret + "&", string_to_sign))
//! ```

use std::collections::BTreeMap;

use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
pub const SIGNATURE_VERSION: &str = "1.0";

/// Access key pair used to sign requests. **Redacted in `Debug`.**
#[derive(Clone, PartialEq, Eq)]
pub struct AccessKey {
    pub id: String,
    pub secret: String,
}

impl AccessKey {
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessKey")
            .field("id", &"<REDACTED>")
            .field("secret", &"<REDACTED>")
            .finish()
    }
}

/// RFC 3986 encoding: only `A-Z a-z 0-9 - _ . ~` pass through, everything
/// else becomes uppercase `%XX` of its UTF-8 bytes.
pub fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// `k=v&k=v` in key order, both sides percent-encoded. Also the request's
/// query string.
pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn string_to_sign(params: &BTreeMap<String, String>) -> String {
    format!(
        "GET&{}&{}",
        percent_encode("/"),
        percent_encode(&canonical_query(params))
    )
}

pub fn signature(secret: &str, string_to_sign: &str) -> Result<String, String> {
    let mut mac = HmacSha1::new_from_slice(format!("{secret}&").as_bytes())
        .map_err(|err| format!("invalid signing key: {err}"))?;
    mac.update(string_to_sign.as_bytes());
    Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

/// Add the signing parameters to `params`, then the `Signature` over all of
/// them. `timestamp` is ISO 8601 UTC (`2006-01-02T15:04:05Z`); `nonce` must
/// be unique per request.
pub fn sign_params(
    params: &mut BTreeMap<String, String>,
    key: &AccessKey,
    timestamp: &str,
    nonce: &str,
) -> Result<(), String> {
    params.insert("AccessKeyId".into(), key.id.clone());
    params.insert("SignatureMethod".into(), SIGNATURE_METHOD.into());
    params.insert("SignatureVersion".into(), SIGNATURE_VERSION.into());
    params.insert("SignatureNonce".into(), nonce.into());
    params.insert("Timestamp".into(), timestamp.into());
    params.remove("Signature");

    let sig = signature(&key.secret, &string_to_sign(params))?;
    params.insert("Signature".into(), sig);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn documented_request() -> BTreeMap<String, String> {
        [
            ("Action", "DescribeRegions"),
            ("Format", "XML"),
            ("Version", "2014-05-26"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn percent_encode_keeps_unreserved_only() {
        assert_eq!(percent_encode("aZ09-_.~"), "aZ09-_.~");
        assert_eq!(percent_encode("a b*c/"), "a%20b%2Ac%2F");
        assert_eq!(percent_encode("12:46"), "12%3A46");
        assert_eq!(percent_encode("é"), "%C3%A9");
    }

    #[test]
    fn signs_published_reference_request() {
        let mut p = documented_request();
        sign_params(
            &mut p,
            &AccessKey::new("testid", "testsecret"),
            "2016-02-23T12:46:24Z",
            "3ee8c1b8-83d3-44af-a94f-4e0ad82fd6cf",
        )
        .unwrap();

        let mut unsigned = p.clone();
        unsigned.remove("Signature");
        assert_eq!(
            string_to_sign(&unsigned),
            "GET&%2F&AccessKeyId%3Dtestid%26Action%3DDescribeRegions%26Format%3DXML\
             %26SignatureMethod%3DHMAC-SHA1\
             %26SignatureNonce%3D3ee8c1b8-83d3-44af-a94f-4e0ad82fd6cf\
             %26SignatureVersion%3D1.0%26Timestamp%3D2016-02-23T12%253A46%253A24Z\
             %26Version%3D2014-05-26"
        );
        assert_eq!(p["Signature"], "OLeaidS1JvxuMvnyHOwuJ+uX5qY=");
    }

    #[test]
    fn resigning_replaces_stale_signature() {
        let key = AccessKey::new("testid", "testsecret");
        let mut p = documented_request();
        sign_params(&mut p, &key, "2016-02-23T12:46:24Z", "n1").unwrap();
        let first = p["Signature"].clone();
        sign_params(&mut p, &key, "2016-02-23T12:46:24Z", "n1").unwrap();
        assert_eq!(p["Signature"], first);
    }

    #[test]
    fn debug_redacts_both_halves() {
        let s = format!("{:?}", AccessKey::new("LTAIxxxx", "hunter2"));
        assert!(!s.contains("LTAIxxxx"));
        assert!(!s.contains("hunter2"));
    }
}
