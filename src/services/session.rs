//! Session context
//!
//! Owns the authenticated session for the whole process and is the only
//! writer of the persisted record. Every mutation happens under one
//! `tokio::sync::RwLock`, held across the store write, so memory and disk
//! change together and a user/token pair is never observed half-set.
//!
//! Lifecycle: `Uninitialized -> Loading -> {Authenticated, Anonymous}`, then
//! `Authenticated <-> Anonymous` through login and logout.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::sync::{watch, RwLock};

use super::alerts::{AlertLevel, AlertSink, TracingAlertSink};
use super::navigation::{Navigator, TracingNavigator};
use crate::api::{ApiClient, ApiError, AuthFailure, AuthFailureHandler, InterceptorHandle};
use crate::cache::{CacheLayer, MemoryCache, SESSION_SCOPE, TOASTED_WARNINGS_KEY};
use crate::config::NavigationConfig;
use crate::models::{
    group_by_module, AdminAccess, AuthSession, Document, DocumentFeed, DocumentGroup,
    DocumentUpload, InboxMessage, ProfileUpdate, RegistrationForm, RewardBook, SessionPhase,
    SessionSignal, SessionSnapshot, User, UserPayload, Vote, Warning,
};
use crate::store::{PersistedRecord, SessionStore, StoreError};

/// Session service error
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Session already booted")]
    AlreadyBooted,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Credentials were accepted but the email still needs its OTP
    #[error("Email {email} is not verified")]
    EmailNotVerified { email: String },

    #[error("Administrator access required")]
    Forbidden,

    /// The server answered but declined the change
    #[error("Rejected by server: {0}")]
    Rejected(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SessionError {
    /// The session was already logged out because of this failure
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, SessionError::Api(e) if e.is_auth_failure())
    }
}

/// Profile update error
#[derive(Debug, thiserror::Error)]
pub enum ProfileUpdateError {
    #[error("Not signed in")]
    NotAuthenticated,

    /// The server refused the submitted fields
    #[error("Profile update rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Profile update failed: {0}")]
    Api(ApiError),

    #[error("Profile update could not be saved: {0}")]
    Store(#[from] StoreError),
}

impl ProfileUpdateError {
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ProfileUpdateError::Api(e) if e.is_auth_failure())
    }
}

impl From<ApiError> for ProfileUpdateError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Status { status, message } => ProfileUpdateError::Rejected { status, message },
            other => ProfileUpdateError::Api(other),
        }
    }
}

impl From<SessionError> for ProfileUpdateError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Store(e) => ProfileUpdateError::Store(e),
            SessionError::Api(e) => e.into(),
            _ => ProfileUpdateError::NotAuthenticated,
        }
    }
}

/// Outcome of a liveness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Account active; the refreshed user was applied
    Active,
    /// Account suspended; the session was logged out
    Suspended,
    /// The session changed while the check was in flight; result dropped
    Stale,
}

#[derive(Debug, Default)]
struct SessionState {
    phase: SessionPhase,
    session: Option<AuthSession>,
    unseen_warnings: u32,
    unseen_inbox: u32,
    generation: u64,
    revision: u64,
}

impl SessionState {
    fn signal(&self) -> SessionSignal {
        SessionSignal {
            generation: self.generation,
            revision: self.revision,
            authenticated: self.session.is_some(),
        }
    }
}

/// Builder for [`SessionContext`]
pub struct SessionContextBuilder {
    client: ApiClient,
    store: Arc<dyn SessionStore>,
    navigation: NavigationConfig,
    navigator: Arc<dyn Navigator>,
    alerts: Arc<dyn AlertSink>,
    scratch: MemoryCache,
}

impl SessionContextBuilder {
    pub fn navigation(mut self, navigation: NavigationConfig) -> Self {
        self.navigation = navigation;
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn alerts(mut self, alerts: Arc<dyn AlertSink>) -> Self {
        self.alerts = alerts;
        self
    }

    pub fn build(self) -> Arc<SessionContext> {
        let (signal, _) = watch::channel(SessionSignal::default());
        let context = Arc::new_cyclic(|this| SessionContext {
            state: RwLock::new(SessionState::default()),
            store: self.store,
            scratch: self.scratch,
            client: self.client,
            navigator: self.navigator,
            alerts: self.alerts,
            navigation: self.navigation,
            interceptor: Mutex::new(None),
            signal,
            booted: AtomicBool::new(false),
            this: this.clone(),
        });
        // Anonymous calls still need their auth failures routed here.
        context.rebind_interceptor(None);
        context
    }
}

/// Result of pressing a vote button
#[derive(Debug, Clone, PartialEq)]
pub struct VoteOutcome {
    /// The user's vote after the press
    pub vote: Option<Vote>,
    /// The document with fresh counts
    pub document: Document,
}

/// Process-wide session context
pub struct SessionContext {
    state: RwLock<SessionState>,
    store: Arc<dyn SessionStore>,
    /// Session-lifetime markers, wiped at logout
    scratch: MemoryCache,
    client: ApiClient,
    navigator: Arc<dyn Navigator>,
    alerts: Arc<dyn AlertSink>,
    navigation: NavigationConfig,
    interceptor: Mutex<Option<InterceptorHandle>>,
    signal: watch::Sender<SessionSignal>,
    booted: AtomicBool,
    this: Weak<SessionContext>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("signal", &*self.signal.borrow())
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    /// Start building a context; navigation and alerts default to the
    /// tracing-backed implementations
    pub fn builder(client: ApiClient, store: Arc<dyn SessionStore>) -> SessionContextBuilder {
        SessionContextBuilder {
            client,
            store,
            navigation: NavigationConfig::default(),
            navigator: Arc::new(TracingNavigator::new()),
            alerts: Arc::new(TracingAlertSink::new()),
            scratch: MemoryCache::new(),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Restore the session from the persisted record.
    ///
    /// A suspended record redirects to the suspension page and leaves the
    /// context loading; an unreadable record is discarded.
    pub async fn boot(&self) -> Result<SessionPhase, SessionError> {
        if self.booted.swap(true, Ordering::SeqCst) {
            return Err(SessionError::AlreadyBooted);
        }

        let mut state = self.state.write().await;
        state.phase = SessionPhase::Loading;
        self.publish(&mut state);

        let record = match self.store.load().await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Discarding unreadable session record: {}", e);
                if let Err(e) = self.store.clear().await {
                    tracing::warn!("Failed to remove session record: {}", e);
                }
                None
            }
        };

        match record {
            None => {
                state.phase = SessionPhase::Anonymous;
                tracing::info!("No persisted session, starting anonymous");
            }
            Some(record) if record.user.is_suspended() => {
                tracing::info!(user_id = %record.user.id, "Persisted account is suspended");
                self.navigator.navigate(&self.navigation.suspended_path);
                return Ok(state.phase);
            }
            Some(record) => {
                let session = AuthSession::from(record);
                tracing::info!(user_id = %session.user.id, "Session restored");
                self.rebind_interceptor(Some(session.token.clone()));
                state.session = Some(session);
                state.phase = SessionPhase::Authenticated;
                state.generation += 1;
            }
        }

        self.publish(&mut state);
        Ok(state.phase)
    }

    /// Commit a session for `user_data` and `token`.
    ///
    /// The avatar is resolved before anything is stored.
    pub async fn login(
        &self,
        user_data: UserPayload,
        token: impl Into<String>,
    ) -> Result<User, SessionError> {
        let session = AuthSession::new(self.normalize(user_data), token);

        let mut state = self.state.write().await;
        self.store.save(&PersistedRecord::from(session.clone())).await?;
        self.rebind_interceptor(Some(session.token.clone()));

        tracing::info!(user_id = %session.user.id, "Signed in");
        let user = session.user.clone();
        state.session = Some(session);
        state.phase = SessionPhase::Authenticated;
        state.generation += 1;
        self.publish(&mut state);
        Ok(user)
    }

    /// Log out and navigate to the login page
    pub async fn logout(&self) {
        self.logout_to(&self.navigation.login_path).await
    }

    /// Log out and navigate to `target`. Safe to call without a session.
    pub async fn logout_to(&self, target: &str) {
        self.end_session(None).await;
        self.navigator.navigate(target);
    }

    /// Clear everything session-scoped. With `expected` set, only ends the
    /// session of that generation.
    async fn end_session(&self, expected: Option<u64>) -> bool {
        let mut state = self.state.write().await;
        if expected.is_some_and(|generation| generation != state.generation) {
            return false;
        }

        let previous = state.session.take();
        if let Err(e) = self.store.clear().await {
            tracing::warn!("Failed to remove session record: {}", e);
        }
        if let Err(e) = self.scratch.delete_prefix(SESSION_SCOPE).await {
            tracing::warn!("Failed to clear session markers: {:#}", e);
        }

        state.unseen_warnings = 0;
        state.unseen_inbox = 0;
        if state.phase != SessionPhase::Uninitialized {
            state.phase = SessionPhase::Anonymous;
        }
        state.generation += 1;
        self.rebind_interceptor(None);
        self.publish(&mut state);

        if let Some(session) = previous {
            tracing::info!(user_id = %session.user.id, "Signed out");
        }
        true
    }

    // ========================================================================
    // User updates
    // ========================================================================

    /// Replace the signed-in user, keeping the token
    pub async fn update_user(&self, user: User) -> Result<(), SessionError> {
        self.replace_user(None, user).await.map(|_| ())
    }

    /// `update_user` that only applies while `generation` is current
    pub(crate) async fn update_user_if_current(
        &self,
        generation: u64,
        user: User,
    ) -> Result<bool, SessionError> {
        self.replace_user(Some(generation), user).await
    }

    async fn replace_user(&self, expected: Option<u64>, user: User) -> Result<bool, SessionError> {
        let mut state = self.state.write().await;
        if expected.is_some_and(|generation| generation != state.generation) {
            return Ok(false);
        }
        let token = match &state.session {
            Some(session) => session.token.clone(),
            None => return Err(SessionError::NotAuthenticated),
        };

        let session = AuthSession::new(user, token);
        self.store.save(&PersistedRecord::from(session.clone())).await?;
        state.session = Some(session);
        self.publish(&mut state);
        Ok(true)
    }

    /// Submit profile changes and apply the user the server returns
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<User, ProfileUpdateError> {
        let user_id = self
            .current_user()
            .await
            .ok_or(ProfileUpdateError::NotAuthenticated)?
            .id;

        let payload = self.client.update_profile(&user_id, &update).await?;
        let user = self.normalize(payload);
        self.update_user(user.clone()).await?;
        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }

    /// Re-fetch the signed-in user
    pub async fn refresh_user(&self) -> Result<User, SessionError> {
        let user = self.normalize(self.client.me().await?);
        self.update_user(user.clone()).await?;
        Ok(user)
    }

    /// Add module codes to the user's current modules.
    ///
    /// Codes are trimmed and upper-cased; the stored list keeps its order
    /// and gains only codes it does not already hold.
    pub async fn update_modules(&self, codes: &[String]) -> Result<User, SessionError> {
        let codes = normalize_module_codes(codes);
        if codes.is_empty() {
            return Err(SessionError::InvalidInput("Enter valid module codes".to_string()));
        }

        let current = self.client.me().await?;
        let merged = merge_modules(&current.current_modules, &codes);
        self.save_modules(current, merged).await
    }

    /// Drop a module code, compared case-insensitively
    pub async fn remove_module(&self, code: &str) -> Result<User, SessionError> {
        let current = self.client.me().await?;
        let remaining: Vec<String> = current
            .current_modules
            .iter()
            .filter(|m| !m.eq_ignore_ascii_case(code.trim()))
            .cloned()
            .collect();
        self.save_modules(current, remaining).await
    }

    async fn save_modules(&self, current: UserPayload, modules: Vec<String>) -> Result<User, SessionError> {
        let res = self.client.update_modules(&modules).await?;
        if !res.success {
            return Err(SessionError::Rejected("Failed to update modules".to_string()));
        }

        let user = match res.user {
            Some(payload) => self.normalize(payload),
            None => User {
                current_modules: modules,
                ..self.normalize(current)
            },
        };
        self.update_user(user.clone()).await?;
        Ok(user)
    }

    // ========================================================================
    // Account flows
    // ========================================================================

    /// Exchange credentials for a session.
    ///
    /// An account whose email is unverified gets no session; the caller
    /// routes to OTP verification instead.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let res = self.client.login(email, password).await?;
        if res.user.email_unverified() {
            tracing::info!(user_id = %res.user.id, "Sign-in deferred until email is verified");
            return Err(SessionError::EmailNotVerified {
                email: email.to_string(),
            });
        }
        self.login(res.user, res.token).await
    }

    /// Confirm the registration OTP, then sign in
    pub async fn verify_email(
        &self,
        email: &str,
        otp: &str,
        password: &str,
    ) -> Result<User, SessionError> {
        self.client.verify_otp(email, otp).await?;
        self.sign_in(email, password).await
    }

    /// Create an account; the session is created later by `verify_email`
    pub async fn register(&self, registration: &RegistrationForm) -> Result<String, SessionError> {
        Ok(self.client.register(registration).await?.message)
    }

    /// Send a fresh registration OTP
    pub async fn resend_otp(&self, email: &str) -> Result<String, SessionError> {
        Ok(self.client.resend_otp(email).await?.message)
    }

    /// Send a fresh password-reset OTP
    pub async fn resend_reset_otp(&self, email: &str) -> Result<String, SessionError> {
        Ok(self.client.resend_reset_otp(email).await?.message)
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<String, SessionError> {
        Ok(self.client.request_password_reset(email).await?.message)
    }

    pub async fn verify_reset_otp(&self, email: &str, otp: &str) -> Result<String, SessionError> {
        Ok(self.client.verify_reset_otp(email, otp).await?.message)
    }

    pub async fn reset_password(&self, email: &str, new_password: &str) -> Result<String, SessionError> {
        Ok(self.client.reset_password(email, new_password).await?.message)
    }

    // ========================================================================
    // Documents
    // ========================================================================

    /// Every active document
    pub async fn documents(&self) -> Result<Vec<Document>, SessionError> {
        let res = self.client.documents().await?;
        if !res.success {
            return Err(SessionError::Rejected("Failed to load documents".to_string()));
        }
        Ok(res.documents)
    }

    pub async fn document_feed(&self, feed: DocumentFeed) -> Result<Vec<Document>, SessionError> {
        if feed == DocumentFeed::RecentlyViewed && self.current_user().await.is_none() {
            return Err(SessionError::NotAuthenticated);
        }
        let res = self.client.document_feed(feed).await?;
        if !res.success {
            return Err(SessionError::Rejected("Failed to load documents".to_string()));
        }
        Ok(res.documents)
    }

    /// Documents grouped under the signed-in user's current modules
    pub async fn module_documents(&self) -> Result<Vec<DocumentGroup>, SessionError> {
        let user = self.current_user().await.ok_or(SessionError::NotAuthenticated)?;
        let documents = self.documents().await?;
        Ok(group_by_module(&user.current_modules, &documents))
    }

    pub async fn document(&self, document_id: &str) -> Result<Document, SessionError> {
        Ok(self.client.document(document_id).await?)
    }

    /// Saved documents grouped by course
    pub async fn my_documents(&self) -> Result<Vec<DocumentGroup>, SessionError> {
        Ok(self.client.my_documents().await?)
    }

    /// Press like or dislike on a document the user currently holds
    /// `current` on, then re-fetch its counts
    pub async fn vote(
        &self,
        document_id: &str,
        current: Option<Vote>,
        pressed: Vote,
    ) -> Result<VoteOutcome, SessionError> {
        if self.current_user().await.is_none() {
            return Err(SessionError::NotAuthenticated);
        }

        let (actions, vote) = Vote::toggle(current, pressed);
        for action in actions {
            self.client.vote_action(document_id, action).await?;
        }
        let document = self.client.document(document_id).await?;
        Ok(VoteOutcome { vote, document })
    }

    /// Save or unsave a document; returns whether it is saved afterwards
    pub async fn toggle_saved(&self, document_id: &str) -> Result<bool, SessionError> {
        let mut user = self.current_user().await.ok_or(SessionError::NotAuthenticated)?;
        let saved = user.saved_documents.iter().any(|id| id == document_id);

        let res = if saved {
            self.client.unsave_document(document_id).await?
        } else {
            self.client.save_document(document_id).await?
        };
        if !res.success {
            return Err(SessionError::Rejected("Failed to update bookmark".to_string()));
        }

        if saved {
            user.saved_documents.retain(|id| id != document_id);
        } else {
            user.saved_documents.push(document_id.to_string());
        }
        self.update_user(user).await?;
        Ok(!saved)
    }

    /// Share a document; the reward points the server grants are applied
    /// to the signed-in user
    pub async fn upload_document(&self, upload: &DocumentUpload) -> Result<Option<i64>, SessionError> {
        if !upload.is_complete() {
            return Err(SessionError::InvalidInput(
                "Please fill in all fields before submitting".to_string(),
            ));
        }
        let user = self.current_user().await.ok_or(SessionError::NotAuthenticated)?;

        let res = self.client.upload_document(&user.id, upload).await?;
        if !res.success {
            return Err(SessionError::Rejected("Upload failed".to_string()));
        }
        tracing::info!(user_id = %user.id, title = %upload.title, "Document uploaded");

        if let Some(points) = res.points {
            if let Some(current) = self.current_user().await {
                self.update_user(User { points, ..current }).await?;
            }
        }
        Ok(res.points)
    }

    pub async fn delete_document(&self, document_id: &str) -> Result<(), SessionError> {
        if self.current_user().await.is_none() {
            return Err(SessionError::NotAuthenticated);
        }
        Ok(self.client.delete_document(document_id).await?)
    }

    // ========================================================================
    // Administration
    // ========================================================================

    /// Send a message to every user's inbox
    pub async fn broadcast_message(&self, title: &str, body: &str) -> Result<(), SessionError> {
        if title.trim().is_empty() || body.trim().is_empty() {
            return Err(SessionError::InvalidInput(
                "Title and message cannot be empty".to_string(),
            ));
        }
        if self.require_admin().await != AdminAccess::Granted {
            return Err(SessionError::Forbidden);
        }

        let res = self.client.broadcast_message(title, body).await?;
        if !res.success {
            return Err(SessionError::Rejected("Failed to broadcast message".to_string()));
        }
        tracing::info!(title, "Message broadcast");
        Ok(())
    }

    // ========================================================================
    // Rewards
    // ========================================================================

    pub async fn reward_books(&self) -> Result<Vec<RewardBook>, SessionError> {
        Ok(self.client.reward_books().await?)
    }

    /// Unlock a book with points, then refresh the user's balance
    pub async fn redeem_reward(&self, book_id: &str) -> Result<String, SessionError> {
        let res = self.client.redeem(book_id).await?;
        self.refresh_user().await?;
        Ok(res.message)
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Fetch warnings, update the unseen count and alert the ones not yet
    /// alerted this session.
    ///
    /// Returns `false` without touching state when the session moved past
    /// `generation` while the fetch was in flight.
    pub(crate) async fn sync_warnings(&self, generation: u64) -> Result<bool, ApiError> {
        let res = self.client.warnings().await?;

        let mut state = self.state.write().await;
        if state.generation != generation || state.session.is_none() {
            return Ok(false);
        }
        if !res.success {
            return Ok(true);
        }

        let unseen: Vec<&Warning> = res.unseen().collect();
        state.unseen_warnings = count(unseen.len());

        let mut alerted: Vec<String> = match self.scratch.get(TOASTED_WARNINGS_KEY).await {
            Ok(keys) => keys.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Resetting unreadable warning ledger: {:#}", e);
                Vec::new()
            }
        };
        let before = alerted.len();
        for warning in unseen {
            let key = warning.alert_key();
            if !alerted.contains(&key) {
                self.alerts.alert(AlertLevel::Warning, warning.display_message());
                alerted.push(key);
            }
        }
        if alerted.len() != before {
            if let Err(e) = self.scratch.set(TOASTED_WARNINGS_KEY, &alerted).await {
                tracing::warn!("Failed to record alerted warnings: {:#}", e);
            }
        }
        Ok(true)
    }

    /// Fetch the inbox and update the unread count
    pub(crate) async fn sync_inbox(&self, generation: u64) -> Result<bool, ApiError> {
        let res = self.client.inbox().await?;

        let mut state = self.state.write().await;
        if state.generation != generation || state.session.is_none() {
            return Ok(false);
        }
        state.unseen_inbox = count(res.unread_count());
        Ok(true)
    }

    /// Re-fetch the user; log out if the account was suspended, otherwise
    /// apply the fresh record
    pub(crate) async fn check_liveness(&self, generation: u64) -> Result<Liveness, SessionError> {
        let user = self.normalize(self.client.me().await?);

        if user.is_suspended() {
            if !self.end_session(Some(generation)).await {
                return Ok(Liveness::Stale);
            }
            tracing::info!(user_id = %user.id, "Account suspended, signing out");
            self.navigator.navigate(&self.navigation.suspended_path);
            return Ok(Liveness::Suspended);
        }

        match self.update_user_if_current(generation, user).await {
            Ok(true) => Ok(Liveness::Active),
            Ok(false) | Err(SessionError::NotAuthenticated) => Ok(Liveness::Stale),
            Err(e) => Err(e),
        }
    }

    /// Mark every warning seen
    pub async fn mark_warnings_seen(&self) -> Result<(), SessionError> {
        self.client.mark_warnings_seen().await?;
        self.set_unseen_warnings(0).await;
        Ok(())
    }

    /// Full warning history, newest first
    pub async fn all_warnings(&self) -> Result<Vec<Warning>, SessionError> {
        Ok(self.client.all_warnings().await?)
    }

    /// Inbox messages; also refreshes the unread count
    pub async fn inbox(&self) -> Result<Vec<InboxMessage>, SessionError> {
        let res = self.client.inbox().await?;
        self.set_unseen_inbox(count(res.unread_count())).await;
        Ok(res.messages)
    }

    pub async fn mark_message_read(&self, message_id: &str) -> Result<(), SessionError> {
        self.client.mark_read(message_id).await?;
        let mut state = self.state.write().await;
        state.unseen_inbox = state.unseen_inbox.saturating_sub(1);
        Ok(())
    }

    pub async fn set_unseen_warnings(&self, n: u32) {
        self.state.write().await.unseen_warnings = n;
    }

    pub async fn set_unseen_inbox(&self, n: u32) {
        self.state.write().await.unseen_inbox = n;
    }

    // ========================================================================
    // Read access
    // ========================================================================

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            user: state.session.as_ref().map(|s| s.user.clone()),
            token: state.session.as_ref().map(|s| s.token.clone()),
            loading: state.phase.is_loading(),
            unseen_warnings: state.unseen_warnings,
            unseen_inbox: state.unseen_inbox,
        }
    }

    pub async fn phase(&self) -> SessionPhase {
        self.state.read().await.phase
    }

    pub async fn current_user(&self) -> Option<User> {
        self.state.read().await.session.as_ref().map(|s| s.user.clone())
    }

    /// Gate for administrator-only views
    pub async fn require_admin(&self) -> AdminAccess {
        let state = self.state.read().await;
        if state.phase.is_loading() {
            return AdminAccess::Pending;
        }
        match &state.session {
            Some(session) if session.user.is_admin() => AdminAccess::Granted,
            _ => AdminAccess::Denied,
        }
    }

    /// Receive a signal on every session change
    pub fn subscribe(&self) -> watch::Receiver<SessionSignal> {
        self.signal.subscribe()
    }

    /// Resolve a wire user with the configured placeholder avatar
    pub fn normalize(&self, payload: UserPayload) -> User {
        payload.normalize(&self.navigation.default_avatar)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn publish(&self, state: &mut SessionState) {
        state.revision += 1;
        self.signal.send_replace(state.signal());
    }

    /// Replace the interceptor registration with one carrying `token`
    fn rebind_interceptor(&self, token: Option<String>) {
        let handler: Weak<dyn AuthFailureHandler> = self.this.clone();
        let next = self.client.interceptors().register(token, handler);
        let previous = self
            .interceptor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(next);
        if let Some(previous) = previous {
            self.client.interceptors().eject(previous);
        }
    }
}

#[async_trait]
impl AuthFailureHandler for SessionContext {
    async fn on_auth_failure(&self, failure: AuthFailure) {
        match failure {
            AuthFailure::Suspended => self.logout_to(&self.navigation.suspended_path).await,
            AuthFailure::Expired => {
                tracing::info!("Credential rejected, signing out");
                self.logout().await;
            }
        }
    }
}

impl Drop for SessionContext {
    fn drop(&mut self) {
        let handle = self
            .interceptor
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            self.client.interceptors().eject(handle);
        }
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Trim, upper-case and drop empty codes
pub fn normalize_module_codes(codes: &[String]) -> Vec<String> {
    codes
        .iter()
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .collect()
}

/// Existing modules followed by new ones, first occurrence wins
pub fn merge_modules(existing: &[String], new: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(existing.len() + new.len());
    for code in existing.iter().chain(new) {
        if !merged.contains(code) {
            merged.push(code.clone());
        }
    }
    merged
}
