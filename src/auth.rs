// src/auth.rs
use jsonwebtoken::errors::Error as JwtError;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
}

const SECRET_KEY: &str = "stock_game_secret_key";

// Basic digest storage; credential hardening is out of scope for the game.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn verify_password(password: &str, digest: &str) -> bool {
    hash_password(password) == digest
}

pub fn create_token(nickname: &str) -> Result<String, JwtError> {
    let claims = Claims {
        sub: nickname.to_string(),
        exp: 10000000000, // Set expiration
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET_KEY.as_ref()),
    )
}

/// Decodes a token back to the nickname it was minted for.
pub fn verify_token(token: &str) -> Result<String, JwtError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(SECRET_KEY.as_ref()),
        &Validation::default(),
    )?;
    Ok(data.claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digests_are_stable_and_distinct() {
        assert_eq!(hash_password("1234"), hash_password("1234"));
        assert_ne!(hash_password("1234"), hash_password("12345"));
        assert!(verify_password("1234", &hash_password("1234")));
        assert!(!verify_password("wrong", &hash_password("1234")));
    }

    #[test]
    fn token_round_trips_nickname() {
        let token = create_token("StockMaster").unwrap();
        assert_eq!(verify_token(&token).unwrap(), "StockMaster");
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(verify_token("not-a-token").is_err());
    }
}
