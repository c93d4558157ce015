use anyhow::Result;
use base64::Engine;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

static JWT_CONFIG: OnceLock<crate::config::jwt::JwtConfig> = OnceLock::new();

/// Initialize JWT config from environment. Must be called once at startup.
pub fn init_jwt_config(config: crate::config::jwt::JwtConfig) -> Result<()> {
    JWT_CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("JWT config already initialized"))?;
    Ok(())
}

fn get_config() -> &'static crate::config::jwt::JwtConfig {
    JWT_CONFIG
        .get()
        .expect("JWT config not initialized — call init_jwt_config() at startup")
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub exp: usize,
    pub iat: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>, // "access" or "refresh"
}

fn encode_token(user_id: &str, expiry: u64, token_type: &str) -> Result<String> {
    let config = get_config();
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_owned(),
        exp: now + expiry as usize,
        iat: now,
        token_type: Some(token_type.to_string()),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| anyhow::anyhow!("Failed to encode {token_type} token: {e}"))
}

pub fn encode_access_token(user_id: &str) -> Result<String> {
    encode_token(user_id, get_config().access_token_expiry, "access")
}

pub fn encode_refresh_token(user_id: &str) -> Result<String> {
    encode_token(user_id, get_config().refresh_token_expiry, "refresh")
}

pub fn decode_jwt(token: &str) -> Result<Claims> {
    let config = get_config();

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| anyhow::anyhow!("Failed to decode JWT: {}", e))
}

pub fn is_access_token(claims: &Claims) -> bool {
    matches!(claims.token_type.as_deref(), Some("access"))
}

pub fn is_refresh_token(claims: &Claims) -> bool {
    matches!(claims.token_type.as_deref(), Some("refresh"))
}

pub fn refresh_token_expiry_seconds() -> u64 {
    get_config().refresh_token_expiry
}

/// Digest used when persisting refresh tokens; raw tokens never hit the
/// database.
pub fn hash_refresh_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Once;

    static INIT: Once = Once::new();

    fn ensure_config() {
        INIT.call_once(|| {
            std::env::set_var("JWT_SECRET", "a_unit_test_secret_key_of_at_least_32_chars");
            let config = crate::config::jwt::JwtConfig::from_env().unwrap();
            let _ = init_jwt_config(config);
        });
    }

    #[test]
    fn access_token_round_trip() {
        ensure_config();
        let token = encode_access_token("7").unwrap();
        let claims = decode_jwt(&token).unwrap();
        assert_eq!(claims.sub, "7");
        assert!(claims.exp > claims.iat);
        assert!(is_access_token(&claims));
        assert!(!is_refresh_token(&claims));
    }

    #[test]
    fn refresh_token_round_trip() {
        ensure_config();
        let token = encode_refresh_token("7").unwrap();
        let claims = decode_jwt(&token).unwrap();
        assert!(is_refresh_token(&claims));
    }

    #[test]
    fn tampered_token_fails() {
        ensure_config();
        let token = encode_access_token("7").unwrap();
        let mut chars: Vec<char> = token.chars().collect();
        let mid = chars.len() / 2;
        chars[mid] = if chars[mid] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();
        assert!(decode_jwt(&tampered).is_err());
    }

    #[test]
    fn empty_token_fails() {
        ensure_config();
        assert!(decode_jwt("").is_err());
    }

    #[test]
    fn refresh_hash_is_stable_and_opaque() {
        let a = hash_refresh_token("some-token");
        let b = hash_refresh_token("some-token");
        assert_eq!(a, b);
        assert_ne!(a, "some-token");
        assert_ne!(hash_refresh_token("other-token"), a);
    }
}
