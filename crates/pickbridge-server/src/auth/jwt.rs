use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use pickbridge_db::Role;
use serde::{Deserialize, Serialize};

/// Access tokens live 15 minutes, refresh tokens 7 days.
const ACCESS_TTL_MINUTES: i64 = 15;
const REFRESH_TTL_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    pub role: Role,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

fn sign(
    username: &str,
    role: Role,
    token_type: TokenType,
    ttl: Duration,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: username.to_string(),
        role,
        token_type,
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Generate access + refresh token pair
pub fn generate_token_pair(
    username: &str,
    role: Role,
    secret: &str,
) -> Result<TokenPair, jsonwebtoken::errors::Error> {
    let access = Duration::minutes(ACCESS_TTL_MINUTES);
    Ok(TokenPair {
        access_token: sign(username, role, TokenType::Access, access, secret)?,
        refresh_token: sign(
            username,
            role,
            TokenType::Refresh,
            Duration::days(REFRESH_TTL_DAYS),
            secret,
        )?,
        token_type: "Bearer".to_string(),
        expires_in: access.num_seconds(),
    })
}

/// Validate a JWT token and return claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-for-jwt";

    #[test]
    fn test_pair_round_trips_claims() {
        let pair = generate_token_pair("nova", Role::Streamer, SECRET).unwrap();

        let access = validate_token(&pair.access_token, SECRET).unwrap();
        assert_eq!(access.sub, "nova");
        assert_eq!(access.role, Role::Streamer);
        assert_eq!(access.token_type, TokenType::Access);

        let refresh = validate_token(&pair.refresh_token, SECRET).unwrap();
        assert_eq!(refresh.token_type, TokenType::Refresh);
        assert_ne!(pair.access_token, pair.refresh_token);
    }

    #[test]
    fn test_lifetimes() {
        let pair = generate_token_pair("admin", Role::Admin, SECRET).unwrap();
        let access = validate_token(&pair.access_token, SECRET).unwrap();
        assert!((899..=901).contains(&(access.exp - access.iat)));

        let refresh = validate_token(&pair.refresh_token, SECRET).unwrap();
        assert!((604799..=604801).contains(&(refresh.exp - refresh.iat)));

        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 900);
    }

    #[test]
    fn test_role_is_serialized_lowercase() {
        let pair = generate_token_pair("admin", Role::Admin, SECRET).unwrap();
        let claims = validate_token(&pair.access_token, SECRET).unwrap();
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["role"], "admin");
        assert_eq!(json["token_type"], "access");
    }

    #[test]
    fn test_rejects_wrong_secret_and_garbage() {
        let pair = generate_token_pair("nova", Role::Streamer, SECRET).unwrap();
        assert!(validate_token(&pair.access_token, "wrong-secret").is_err());
        assert!(validate_token("not-a-valid-jwt", SECRET).is_err());
        assert!(validate_token("", SECRET).is_err());
    }
}
