// src/middleware/rbac.rs

use axum::{extract::Request, middleware::Next, response::Response};

use crate::{common::error::AppError, models::auth::Identity};

/// Só administradores passam. Roda depois do `auth_guard`.
pub async fn admin_guard(request: Request, next: Next) -> Result<Response, AppError> {
    let identity = request
        .extensions()
        .get::<Identity>()
        .ok_or(AppError::InvalidToken)?;

    if !identity.is_admin() {
        tracing::debug!(subject = %identity.subject, role = identity.role.as_str(), "Acesso administrativo negado");
        return Err(AppError::Forbidden(
            "Acesso negado: requer permissões de administrador.".into(),
        ));
    }

    Ok(next.run(request).await)
}
