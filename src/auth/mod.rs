//! Admin gate for mutating magazine operations.
//!
//! Callers name themselves with a `userId` field in the JSON body; that claim is
//! resolved against the admin directory. A shared key can be required on top,
//! compared in constant time to mitigate timing attacks.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::db::Repository;
use crate::errors::AppError;
use crate::AppState;

/// Header name for the shared key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Largest body the gate will buffer to read the identity claim.
const MAX_GATED_BODY_BYTES: usize = 1024 * 1024;

const FORBIDDEN_MESSAGE: &str = "Forbidden: Only admins can perform this action";

/// An admin that passed the gate, available to handlers as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub admin_id: String,
}

/// What an authenticator gets to look at.
pub struct GateRequest<'a> {
    pub headers: &'a HeaderMap,
    /// `userId` taken from the request body, if any
    pub claimed_id: Option<&'a str>,
}

/// Decides whether a request may run a gated operation.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn verify(&self, request: &GateRequest<'_>) -> Result<Identity, AppError>;
}

/// Trusts the self-declared `userId` if it names an existing admin.
pub struct AdminDirectory {
    repo: Arc<Repository>,
}

impl AdminDirectory {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl Authenticator for AdminDirectory {
    async fn verify(&self, request: &GateRequest<'_>) -> Result<Identity, AppError> {
        let Some(claimed) = request.claimed_id.filter(|id| !id.is_empty()) else {
            return Err(AppError::Forbidden(FORBIDDEN_MESSAGE.to_string()));
        };

        match self.repo.find_admin(claimed).await? {
            Some(admin) => Ok(Identity { admin_id: admin.id }),
            None => {
                tracing::warn!(user_id = %claimed, "Rejected non-admin caller");
                Err(AppError::Forbidden(FORBIDDEN_MESSAGE.to_string()))
            }
        }
    }
}

/// Requires a pre-shared key before delegating to the wrapped authenticator.
pub struct SharedKey<A> {
    expected: String,
    inner: A,
}

impl<A> SharedKey<A> {
    pub fn new(expected: String, inner: A) -> Self {
        Self { expected, inner }
    }
}

#[async_trait]
impl<A: Authenticator> Authenticator for SharedKey<A> {
    async fn verify(&self, request: &GateRequest<'_>) -> Result<Identity, AppError> {
        let provided = request
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .or_else(|| {
                request
                    .headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.strip_prefix("Bearer "))
            });

        match provided {
            Some(key) if constant_time_compare(key, &self.expected) => {
                self.inner.verify(request).await
            }
            Some(_) => Err(AppError::Unauthorized("Invalid API key".to_string())),
            None => Err(AppError::Unauthorized("Missing API key".to_string())),
        }
    }
}

/// Build the authenticator the configuration asks for.
pub fn build_authenticator(repo: Arc<Repository>, api_psk: Option<String>) -> Arc<dyn Authenticator> {
    let directory = AdminDirectory::new(repo);
    match api_psk {
        Some(psk) => Arc::new(SharedKey::new(psk, directory)),
        None => Arc::new(directory),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityClaim {
    #[serde(default)]
    user_id: Option<String>,
}

/// Middleware gating every non-read method behind the configured authenticator.
pub async fn admin_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if is_read_only(request.method()) {
        return next.run(request).await;
    }

    let (mut parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_GATED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Failed to read gated request body: {}", e);
            return AppError::Internal("Failed to verify admin".to_string()).into_response();
        }
    };

    // Anything that is not a JSON object with a string userId carries no claim
    let claim: IdentityClaim = serde_json::from_slice(&bytes).unwrap_or_default();

    let verdict = state
        .authenticator
        .verify(&GateRequest {
            headers: &parts.headers,
            claimed_id: claim.user_id.as_deref(),
        })
        .await;

    match verdict {
        Ok(identity) => {
            parts.extensions.insert(identity);
            next.run(Request::from_parts(parts, Body::from(bytes))).await
        }
        Err(e) => e.public("Failed to verify admin").into_response(),
    }
}

fn is_read_only(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
