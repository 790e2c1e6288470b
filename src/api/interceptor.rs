//! Request interceptors
//!
//! Every call made through [`ApiClient`](super::ApiClient) passes through the
//! registered interceptors twice:
//! - on the way out, the newest registration holding a token attaches it as
//!   `Authorization: Bearer <token>`
//! - on the way back, a 401 or a 403 with reason `suspended` is reported to
//!   each registration's [`AuthFailureHandler`] before the call completes
//!
//! A registration captures a token snapshot. Whoever owns the token ejects
//! its registration and registers a fresh one whenever the token changes, so
//! no registration ever carries a stale credential.

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, Weak};

use super::error::{ApiError, ErrorBody};

/// Authentication failures the interceptor reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// 401: credential missing, expired or revoked
    Expired,
    /// 403 with reason `suspended`
    Suspended,
}

impl AuthFailure {
    /// Classify a failed response
    pub(crate) fn classify(status: StatusCode, body: &ErrorBody) -> Option<Self> {
        match status {
            StatusCode::UNAUTHORIZED => Some(AuthFailure::Expired),
            StatusCode::FORBIDDEN if body.is_suspension() => Some(AuthFailure::Suspended),
            _ => None,
        }
    }
}

impl From<AuthFailure> for ApiError {
    fn from(failure: AuthFailure) -> Self {
        match failure {
            AuthFailure::Expired => ApiError::AuthExpired,
            AuthFailure::Suspended => ApiError::AccountSuspended,
        }
    }
}

/// Receiver of authentication failures
#[async_trait]
pub trait AuthFailureHandler: Send + Sync {
    async fn on_auth_failure(&self, failure: AuthFailure);
}

/// Proof of a registration; pass it back to [`InterceptorChain::eject`]
#[derive(Debug, PartialEq, Eq)]
pub struct InterceptorHandle {
    id: u64,
}

impl InterceptorHandle {
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Clone)]
struct Registration {
    id: u64,
    token: Option<String>,
    handler: Weak<dyn AuthFailureHandler>,
}

/// Ordered set of interceptor registrations
pub struct InterceptorChain {
    registrations: RwLock<Vec<Registration>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("registrations", &self.len())
            .finish()
    }
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self {
            registrations: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a token snapshot and its failure handler.
    ///
    /// The handler is held weakly; once it is dropped the registration only
    /// attaches its token.
    pub fn register(
        &self,
        token: Option<String>,
        handler: Weak<dyn AuthFailureHandler>,
    ) -> InterceptorHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.registrations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Registration { id, token, handler });
        tracing::debug!(interceptor = id, "Interceptor registered");
        InterceptorHandle { id }
    }

    /// Remove a registration; ejecting twice is a no-op
    pub fn eject(&self, handle: InterceptorHandle) {
        self.registrations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|r| r.id != handle.id);
        tracing::debug!(interceptor = handle.id, "Interceptor ejected");
    }

    pub fn len(&self) -> usize {
        self.registrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Token the next request will carry
    pub fn current_token(&self) -> Option<String> {
        self.registrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find_map(|r| r.token.clone())
    }

    /// Outbound stage
    pub(crate) fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.current_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Inbound stage for a failed response.
    ///
    /// Returns the failure the handlers were told about, if any.
    pub(crate) async fn react(&self, status: StatusCode, body: &ErrorBody) -> Option<AuthFailure> {
        let failure = AuthFailure::classify(status, body)?;

        // Collect first: handlers may re-register, which needs the write lock.
        let handlers: Vec<_> = self
            .registrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(|r| r.handler.upgrade())
            .collect();

        tracing::info!(?failure, handlers = handlers.len(), "Authentication failure intercepted");
        for handler in handlers {
            handler.on_auth_failure(failure).await;
        }

        Some(failure)
    }
}

impl Default for InterceptorChain {
    fn default() -> Self {
        Self::new()
    }
}
