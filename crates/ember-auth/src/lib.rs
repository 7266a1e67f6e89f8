//! Telegram Web App init-data signature handling.
//!
//! Verification recomputes the two-stage keyed hash over the canonicalized
//! payload: the secret is HMAC-SHA256("WebAppData", bot_token), the signature
//! is HMAC-SHA256(secret, sorted `key=value` lines excluding `hash`). The
//! signing half is the exact inverse, used by the bot relay to call the REST
//! API on behalf of a user with the same shared credential.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use ember_types::models::TelegramUser;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum InitDataError {
    #[error("missing hash field")]
    MissingHash,
    #[error("malformed hex signature")]
    BadHex(#[from] hex::FromHexError),
    #[error("signature mismatch")]
    BadSignature,
    #[error("missing user field")]
    MissingUser,
    #[error("malformed user payload: {0}")]
    MalformedUser(#[from] serde_json::Error),
}

/// Validate a raw init-data query string against the bot token and extract
/// the caller identity.
pub fn verify_init_data(init_data: &str, bot_token: &str) -> Result<TelegramUser, InitDataError> {
    let mut pairs: Vec<(String, String)> = url::form_urlencoded::parse(init_data.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let hash_idx = pairs
        .iter()
        .position(|(k, _)| k == "hash")
        .ok_or(InitDataError::MissingHash)?;
    let (_, supplied) = pairs.swap_remove(hash_idx);

    let mut mac = keyed(&derive_secret(bot_token));
    mac.update(check_string(&mut pairs).as_bytes());
    mac.verify_slice(&hex::decode(supplied)?)
        .map_err(|_| InitDataError::BadSignature)?;

    let user_json = pairs
        .iter()
        .find(|(k, _)| k == "user")
        .map(|(_, v)| v.as_str())
        .ok_or(InitDataError::MissingUser)?;

    Ok(serde_json::from_str(user_json)?)
}

/// Produce a signed init-data string for `user`, as a client holding the
/// bot credential would. Counterpart of [`verify_init_data`].
pub fn sign_init_data(
    user: &TelegramUser,
    auth_date: i64,
    bot_token: &str,
) -> Result<String, serde_json::Error> {
    let mut pairs = vec![
        ("auth_date".to_string(), auth_date.to_string()),
        ("user".to_string(), serde_json::to_string(user)?),
    ];

    let mut mac = keyed(&derive_secret(bot_token));
    mac.update(check_string(&mut pairs).as_bytes());
    let hash = hex::encode(mac.finalize().into_bytes());

    let mut encoded = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in &pairs {
        encoded.append_pair(k, v);
    }
    encoded.append_pair("hash", &hash);
    Ok(encoded.finish())
}

/// First HMAC stage: derive the signing secret from the shared bot token.
fn derive_secret(bot_token: &str) -> Vec<u8> {
    let mut mac = keyed(b"WebAppData");
    mac.update(bot_token.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// Canonical form: pairs sorted by key, joined as `key=value` lines.
fn check_string(pairs: &mut [(String, String)]) -> String {
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("\n")
}

fn keyed(key: &[u8]) -> HmacSha256 {
    // HMAC-SHA256 accepts keys of any length
    HmacSha256::new_from_slice(key).expect("hmac key length")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "110201543:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw";

    fn alice() -> TelegramUser {
        TelegramUser {
            id: 1001,
            first_name: Some("Alice".into()),
            username: Some("alice".into()),
            language_code: Some("en".into()),
        }
    }

    #[test]
    fn sign_then_verify_roundtrips() {
        let signed = sign_init_data(&alice(), 1_700_000_000, TOKEN).unwrap();
        let user = verify_init_data(&signed, TOKEN).unwrap();
        assert_eq!(user, alice());
    }

    #[test]
    fn pair_order_does_not_matter() {
        let signed = sign_init_data(&alice(), 1_700_000_000, TOKEN).unwrap();

        // Reorder the query-string fields; the canonical form is sorted,
        // so verification must not care.
        let mut fields: Vec<&str> = signed.split('&').collect();
        fields.reverse();
        let reordered = fields.join("&");

        assert!(verify_init_data(&reordered, TOKEN).is_ok());
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let signed = sign_init_data(&alice(), 1_700_000_000, TOKEN).unwrap();
        let forged = signed.replace("1001", "2002");
        assert!(matches!(
            verify_init_data(&forged, TOKEN),
            Err(InitDataError::BadSignature)
        ));
    }

    #[test]
    fn wrong_token_is_rejected() {
        let signed = sign_init_data(&alice(), 1_700_000_000, TOKEN).unwrap();
        assert!(matches!(
            verify_init_data(&signed, "999999:OTHER"),
            Err(InitDataError::BadSignature)
        ));
    }

    #[test]
    fn missing_hash_is_rejected() {
        assert!(matches!(
            verify_init_data("auth_date=1&user=%7B%22id%22%3A1%7D", TOKEN),
            Err(InitDataError::MissingHash)
        ));
    }
}
