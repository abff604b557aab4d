//! Staff authentication for the admin actions.
//!
//! Staff members authenticate with a bearer token. With no tokens
//! configured every staff-only request is rejected.

use crate::error::AdminError;
use crate::server::AppState;
use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashSet;
use subtle::ConstantTimeEq;
use tracing::warn;

/// Configured staff tokens.
#[derive(Debug, Clone, Default)]
pub struct StaffAuth {
    tokens: HashSet<String>,
}

impl StaffAuth {
    /// Create a StaffAuth from a list of tokens.
    pub fn from_tokens(tokens: Vec<String>) -> Result<Self, String> {
        let mut valid_tokens = HashSet::new();
        for token in tokens {
            let trimmed = token.trim().to_string();
            if trimmed.is_empty() {
                return Err("Empty staff token value in configuration".to_string());
            }
            valid_tokens.insert(trimmed);
        }
        Ok(Self {
            tokens: valid_tokens,
        })
    }

    /// Whether any staff member can authenticate at all.
    pub fn is_enabled(&self) -> bool {
        !self.tokens.is_empty()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Check a presented token against every configured token.
    pub fn verify(&self, provided: &str) -> bool {
        let mut found = false;
        for expected in &self.tokens {
            if constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
                found = true;
            }
        }
        found
    }
}

/// Middleware for routes restricted to staff members.
pub async fn require_staff(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.staff.is_enabled() {
        warn!(path = %request.uri().path(), "Staff action rejected: no staff tokens configured");
        return AdminError::unauthorized("Staff access is not configured on this server")
            .into_response();
    }

    let token = match extract_bearer_token(&request) {
        Ok(Some(token)) => token,
        Ok(None) => {
            warn!("Staff authentication failed: missing Authorization header");
            return AdminError::unauthorized("Missing Bearer token in Authorization header")
                .into_response();
        }
        Err(msg) => {
            warn!("Staff authentication failed: invalid header format");
            return AdminError::unauthorized(msg).into_response();
        }
    };

    if state.staff.verify(token) {
        next.run(request).await
    } else {
        warn!(token_prefix = %mask_token(token), "Staff authentication failed: invalid token");
        AdminError::unauthorized("Invalid Bearer token").into_response()
    }
}

fn extract_bearer_token(request: &Request<Body>) -> Result<Option<&str>, &'static str> {
    let Some(auth_header) = request.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Authorization header contains invalid characters")?;

    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err("Invalid Authorization header format. Expected 'Bearer <token>'");
    };
    if token.is_empty() {
        return Err("Bearer token is empty");
    }

    Ok(Some(token))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

fn mask_token(token: &str) -> String {
    match token.get(..3) {
        Some(prefix) if token.len() > 3 => format!("{}***", prefix),
        _ => "***".to_string(),
    }
}
