// src/services/auth.rs

use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use crate::{
    common::error::AppError,
    models::auth::{Claims, Identity},
};

/// Verifica os tokens RS256 emitidos pelo provedor de identidade.
/// Não emitimos tokens: só validamos assinatura e expiração.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl TokenVerifier {
    pub fn from_pem(public_key_pem: &[u8]) -> Result<Self, jsonwebtoken::errors::Error> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        Ok(Self {
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
        })
    }

    /// Token malformado, assinatura errada, expirado ou papel desconhecido -> `InvalidToken`.
    pub fn verify(&self, token: &str) -> Result<Identity, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!("Token rejeitado: {}", e);
            AppError::InvalidToken
        })?;

        Ok(Identity::from(data.claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::UserRole;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    const PUBLIC_PEM: &str = include_str!("../../tests/fixtures/issuer_public.pem");
    const PRIVATE_PEM: &str = include_str!("../../tests/fixtures/issuer_private.pem");
    const FOREIGN_PEM: &str = include_str!("../../tests/fixtures/foreign_private.pem");

    fn sign(private_pem: &str, claims: serde_json::Value) -> String {
        let key = EncodingKey::from_rsa_pem(private_pem.as_bytes()).unwrap();
        encode(&Header::new(Algorithm::RS256), &claims, &key).unwrap()
    }

    fn future_exp() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    fn verifier() -> TokenVerifier {
        TokenVerifier::from_pem(PUBLIC_PEM.as_bytes()).unwrap()
    }

    #[test]
    fn role_defaults_to_operator() {
        let token = sign(PRIVATE_PEM, json!({ "sub": "user_1", "exp": future_exp() }));
        let identity = verifier().verify(&token).unwrap();
        assert_eq!(identity.subject, "user_1");
        assert_eq!(identity.role, UserRole::Operator);
    }

    #[test]
    fn null_metadata_defaults_to_operator() {
        let token = sign(
            PRIVATE_PEM,
            json!({ "sub": "user_2", "exp": future_exp(), "public_metadata": null }),
        );
        assert_eq!(verifier().verify(&token).unwrap().role, UserRole::Operator);

        let token = sign(
            PRIVATE_PEM,
            json!({ "sub": "user_3", "exp": future_exp(), "public_metadata": { "role": null } }),
        );
        assert_eq!(verifier().verify(&token).unwrap().role, UserRole::Operator);
    }

    #[test]
    fn admin_role_is_read_from_public_metadata() {
        let token = sign(
            PRIVATE_PEM,
            json!({ "sub": "boss", "exp": future_exp(), "public_metadata": { "role": "admin" } }),
        );
        assert!(verifier().verify(&token).unwrap().is_admin());
    }

    #[test]
    fn unknown_role_is_rejected() {
        let token = sign(
            PRIVATE_PEM,
            json!({ "sub": "x", "exp": future_exp(), "public_metadata": { "role": "root" } }),
        );
        assert!(matches!(verifier().verify(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let past = chrono::Utc::now().timestamp() - 60;
        let token = sign(PRIVATE_PEM, json!({ "sub": "x", "exp": past }));
        assert!(matches!(verifier().verify(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn token_signed_by_another_key_is_rejected() {
        let token = sign(FOREIGN_PEM, json!({ "sub": "x", "exp": future_exp() }));
        assert!(matches!(verifier().verify(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(verifier().verify("not-a-jwt"), Err(AppError::InvalidToken)));
    }
}
