//! Minimal AWS Signature Version 4 signing for the Bedrock runtime call.
//!
//! Covers exactly what the invoke request needs: a POST with a JSON body and
//! `content-type`/`host`/`x-amz-date` as signed headers. This is not a
//! general SigV4 implementation (no query-string signing, no session tokens,
//! no chunked payloads).

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SIGNED_HEADERS: &str = "content-type;host;x-amz-date";

/// Credentials and scope for one signature.
#[derive(Debug, Clone, Copy)]
pub struct SigningKeys<'a> {
    pub access_key_id: &'a str,
    pub secret_access_key: &'a str,
    pub region: &'a str,
    pub service: &'a str,
}

/// Headers to attach to the signed request.
#[derive(Debug, Clone)]
pub struct SignedHeaders {
    /// `x-amz-date` value (`YYYYMMDDTHHMMSSZ`).
    pub amz_date: String,
    /// Full `Authorization` header value.
    pub authorization: String,
}

/// Signs a JSON POST to `https://{host}{path}` at time `now`.
///
/// `path` must already be canonically encoded (see [`uri_encode`] for the
/// per-segment encoding of e.g. model ids containing `:`).
pub fn sign_request(
    keys: &SigningKeys<'_>,
    method: &str,
    host: &str,
    path: &str,
    payload: &[u8],
    now: DateTime<Utc>,
) -> SignedHeaders {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();

    let canonical_headers =
        format!("content-type:application/json\nhost:{host}\nx-amz-date:{amz_date}\n");
    let canonical_request = format!(
        "{method}\n{path}\n\n{canonical_headers}\n{SIGNED_HEADERS}\n{}",
        sha_hex(payload)
    );

    let scope = format!("{date}/{}/{}/aws4_request", keys.region, keys.service);
    let string_to_sign = format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        sha_hex(canonical_request.as_bytes())
    );

    let signing_key = derive_signing_key(keys, &date);
    let signature = hex(&hmac_raw(&signing_key, string_to_sign.as_bytes()));

    let authorization = format!(
        "{ALGORITHM} Credential={}/{scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
        keys.access_key_id
    );

    SignedHeaders {
        amz_date,
        authorization,
    }
}

/// Percent-encodes one path segment per the SigV4 canonical-URI rules:
/// unreserved characters (`A-Z a-z 0-9 - _ . ~`) pass through, everything
/// else becomes uppercase `%XX`.
pub fn uri_encode(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn derive_signing_key(keys: &SigningKeys<'_>, date: &str) -> Vec<u8> {
    let k_secret = format!("AWS4{}", keys.secret_access_key);
    let k_date = hmac_raw(k_secret.as_bytes(), date.as_bytes());
    let k_region = hmac_raw(&k_date, keys.region.as_bytes());
    let k_service = hmac_raw(&k_region, keys.service.as_bytes());
    hmac_raw(&k_service, b"aws4_request")
}

fn hmac_raw(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("hmac-sha256 accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn sha_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn keys() -> SigningKeys<'static> {
        SigningKeys {
            access_key_id: "AKIDEXAMPLE",
            secret_access_key: "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            region: "us-east-1",
            service: "bedrock",
        }
    }

    #[test]
    fn signature_is_hex_and_scoped() {
        let now = Utc.with_ymd_and_hms(2024, 8, 30, 12, 36, 0).unwrap();
        let signed = sign_request(&keys(), "POST", "bedrock-runtime.us-east-1.amazonaws.com",
            "/model/anthropic.claude-3-5-sonnet-20240620-v1%3A0/invoke", b"{}", now);

        assert_eq!(signed.amz_date, "20240830T123600Z");
        assert!(signed.authorization.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240830/us-east-1/bedrock/aws4_request"
        ));
        assert!(signed.authorization.contains("SignedHeaders=content-type;host;x-amz-date"));
        let sig = signed.authorization.rsplit("Signature=").next().unwrap();
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signing_is_deterministic_and_payload_sensitive() {
        let now = Utc.with_ymd_and_hms(2024, 8, 30, 12, 36, 0).unwrap();
        let a = sign_request(&keys(), "POST", "h", "/p", b"one", now);
        let b = sign_request(&keys(), "POST", "h", "/p", b"one", now);
        let c = sign_request(&keys(), "POST", "h", "/p", b"two", now);
        assert_eq!(a.authorization, b.authorization);
        assert_ne!(a.authorization, c.authorization);
    }

    #[test]
    fn uri_encode_escapes_reserved_chars() {
        assert_eq!(
            uri_encode("anthropic.claude-3-5-sonnet-20240620-v1:0"),
            "anthropic.claude-3-5-sonnet-20240620-v1%3A0"
        );
        assert_eq!(uri_encode("a_b-c.d~e"), "a_b-c.d~e");
        assert_eq!(uri_encode("a b"), "a%20b");
    }
}
