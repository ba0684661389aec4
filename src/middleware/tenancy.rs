// src/middleware/tenancy.rs

use axum::{
    extract::{FromRequestParts, Query, Request, State},
    http::{HeaderMap, Uri, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{common::error::AppError, config::AppState, models::auth::Identity};

// O nome do nosso cabeçalho HTTP customizado
const TENANT_ID_HEADER: &str = "x-tenant-id";

// A empresa já resolvida e autorizada para esta requisição.
// O segundo campo marca se ela veio de cabeçalho ou query.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub Uuid, bool);

impl TenantContext {
    /// Empresa enviada no corpo (clientes móveis). Só vale quando nem
    /// cabeçalho nem query definiram o escopo, e passa pela mesma checagem
    /// de vínculo.
    pub async fn or_body_tenant(
        self,
        app_state: &AppState,
        identity: &Identity,
        body_tenant: Option<Uuid>,
    ) -> Result<Uuid, AppError> {
        match body_tenant {
            Some(tenant_id) if !self.1 && tenant_id != self.0 => {
                app_state
                    .tenant_service
                    .resolve_scope(&identity.subject, Some(tenant_id))
                    .await
            }
            _ => Ok(self.0),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct TenantQuery {
    tenant_id: Option<String>,
}

/// Resolve o escopo: cabeçalho `x-tenant-id`, depois `?tenant_id=`, depois
/// a empresa padrão do usuário. Empresa fora do escopo = 404.
/// Handlers com `tenantId` no corpo refinam via `TenantContext::or_body_tenant`.
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = request
        .extensions()
        .get::<Identity>()
        .cloned()
        .ok_or(AppError::InvalidToken)?;

    let requested = requested_tenant(request.headers(), request.uri())?;

    let tenant_id = app_state
        .tenant_service
        .resolve_scope(&identity.subject, requested)
        .await?;

    request
        .extensions_mut()
        .insert(TenantContext(tenant_id, requested.is_some()));
    Ok(next.run(request).await)
}

fn requested_tenant(headers: &HeaderMap, uri: &Uri) -> Result<Option<Uuid>, AppError> {
    if let Some(value) = headers.get(TENANT_ID_HEADER) {
        let raw = value.to_str().map_err(|_| AppError::InvalidTenantHeader)?;
        return parse_tenant_id(raw).map(Some);
    }

    // Query que não desserializa é tratada como ausente
    let from_query = Query::<TenantQuery>::try_from_uri(uri)
        .ok()
        .and_then(|Query(q)| q.tenant_id);

    match from_query {
        Some(raw) => parse_tenant_id(&raw).map(Some),
        None => Ok(None),
    }
}

fn parse_tenant_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::InvalidTenantHeader)
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .copied()
            .ok_or(AppError::InvalidTenantHeader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn header_wins_over_query() {
        let header_id = Uuid::new_v4();
        let query_id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_ID_HEADER, HeaderValue::from_str(&header_id.to_string()).unwrap());

        let target = uri(&format!("/api/farms?tenant_id={}", query_id));
        assert_eq!(requested_tenant(&headers, &target).unwrap(), Some(header_id));
    }

    #[test]
    fn query_is_used_without_header() {
        let query_id = Uuid::new_v4();
        let target = uri(&format!("/api/shipments?status=shipped&tenant_id={}", query_id));
        assert_eq!(requested_tenant(&HeaderMap::new(), &target).unwrap(), Some(query_id));
    }

    #[test]
    fn nothing_requested_falls_back_to_default() {
        assert_eq!(requested_tenant(&HeaderMap::new(), &uri("/api/farms")).unwrap(), None);
        assert_eq!(
            requested_tenant(&HeaderMap::new(), &uri("/api/shipments?status=shipped")).unwrap(),
            None
        );
    }

    #[test]
    fn malformed_ids_are_bad_requests() {
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert!(matches!(
            requested_tenant(&headers, &uri("/api/farms")),
            Err(AppError::InvalidTenantHeader)
        ));

        assert!(matches!(
            requested_tenant(&HeaderMap::new(), &uri("/api/farms?tenant_id=123")),
            Err(AppError::InvalidTenantHeader)
        ));
    }
}
