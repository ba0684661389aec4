// src/models/auth.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Papel do usuário. Serve tanto para o claim do token quanto para o papel
// dentro da equipe de uma empresa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Operator,
    Viewer,
}

impl Default for UserRole {
    // Menor privilégio quando o token não traz papel
    fn default() -> Self {
        UserRole::Operator
    }
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Operator => "operator",
            UserRole::Viewer => "viewer",
        }
    }
}

// Quem está chamando a API: o `sub` do provedor de identidade + o papel.
// Vive só nas extensions da requisição, nunca é persistido.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub subject: String,
    pub role: UserRole,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

// Metadados públicos que o provedor de identidade embute no token
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PublicMetadata {
    #[serde(default)]
    pub role: Option<UserRole>,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (ID do usuário no provedor)
    pub exp: usize,  // Expiration time
    // Ausente ou `null`: operador
    #[serde(default)]
    pub public_metadata: Option<PublicMetadata>,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            role: claims
                .public_metadata
                .and_then(|meta| meta.role)
                .unwrap_or_default(),
        }
    }
}
