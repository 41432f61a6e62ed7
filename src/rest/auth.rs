/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

//! Token based authentication.
//!
//! Desktop style, single user:
//!
//! ```rust,no_run
//! use flickr::rest::{Client, FlickrError, Permission};
//!
//! fn authenticate(client: &Client) -> Result<String, FlickrError> {
//!     let perm = Permission::Write;
//!     if let Some(nsid) = client.default_user()? {
//!         if client.is_authenticated(Some(nsid.as_str()), perm)? {
//!             client.set_auth_context(&nsid);
//!             return Ok(nsid);
//!         }
//!     }
//!     println!("Visit {} then come back", client.begin_auth(perm)?);
//!     // ... wait for the user to approve the application ...
//!     let user = client.complete_auth()?;
//!     client.set_default_user(Some(user.nsid.as_str()))?;
//!     Ok(user.nsid)
//! }
//! ```
//!
//! Multi user servers authenticate once per user and then, on each request
//! handling thread, act as that user inside a scope:
//!
//! ```rust,no_run
//! # use flickr::rest::{Client, FlickrError, Photo};
//! fn handle(client: &Client, nsid: &str) -> Result<(), FlickrError> {
//!     let _as_user = client.scoped_auth_context(nsid);
//!     let photos = Photo::find_by_tags(client, &["sunset"], false)?.fetch_all()?;
//!     println!("{} photos", photos.len());
//!     Ok(())
//! }
//! ```
use crate::rest::parsers::{from_empty_str_to_none, from_permission};
use crate::rest::store::{DEFAULT_USER_KEY, TokenStore, token_key};
use crate::rest::{Client, FlickrError, HttpMethod, Permission, Request, ServiceErrorCode};
use log::{info, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, ThreadId};

/// The user an auth token belongs to
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    #[serde(rename = "@nsid")]
    pub nsid: String,

    #[serde(default, rename = "@username")]
    pub username: String,

    #[serde(
        default,
        rename = "@fullname",
        deserialize_with = "from_empty_str_to_none"
    )]
    pub fullname: Option<String>,
}

/// A validated token along with the permission it grants and its owner
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    token: String,
    permission: Permission,
    user: AuthUser,
}

impl AuthToken {
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    pub fn user(&self) -> &AuthUser {
        &self.user
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("token", &"xxx")
            .field("permission", &self.permission)
            .field("user", &self.user)
            .finish()
    }
}

/// A token string whose permission and owner are not known yet.
///
/// [`PendingToken::resolve`] asks the service about it and yields an [`AuthToken`].
#[derive(Clone)]
pub struct PendingToken(String);

impl PendingToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Validates the token with `flickr.auth.checkToken`
    pub fn resolve(self, client: &Client) -> Result<AuthToken, FlickrError> {
        Request::unauthenticated(client, HttpMethod::Get, &client.config().rest_url)?
            .with_parameter("method", "flickr.auth.checkToken")
            .with_parameter("auth_token", self.0)
            .fetch::<AuthResponse>()?
            .auth
            .into_token(None)
    }
}

impl std::fmt::Debug for PendingToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PendingToken").field(&"xxx").finish()
    }
}

// Response to flickr.auth.checkToken and flickr.auth.getToken
#[derive(Deserialize, Debug)]
struct AuthResponse {
    auth: AuthPayload,
}

#[derive(Deserialize, Debug)]
struct AuthPayload {
    token: String,

    #[serde(default, deserialize_with = "from_permission")]
    perms: Option<Permission>,

    user: Option<AuthUser>,
}

impl AuthPayload {
    fn into_token(self, requested: Option<Permission>) -> Result<AuthToken, FlickrError> {
        let permission = self.perms.or(requested).ok_or_else(|| {
            FlickrError::Protocol("auth response is missing the granted permission".into())
        })?;
        let user = self
            .user
            .ok_or_else(|| FlickrError::Protocol("auth response is missing the user".into()))?;
        Ok(AuthToken {
            token: self.token.trim().to_string(),
            permission,
            user,
        })
    }
}

// Response to flickr.auth.getFrob
#[derive(Deserialize, Debug)]
struct FrobResponse {
    frob: String,
}

struct PendingHandshake {
    frob: String,
    permission: Permission,
}

/// Authentication state shared by every clone of a [`Client`].
///
/// Tokens are process wide. Auth contexts and pending handshakes are keyed by
/// the calling thread and never seen by other threads.
pub(crate) struct AuthState {
    tokens: Mutex<HashMap<String, Arc<AuthToken>>>,
    contexts: Mutex<HashMap<ThreadId, String>>,
    handshakes: Mutex<HashMap<ThreadId, PendingHandshake>>,
    store: Arc<dyn TokenStore>,
}

impl AuthState {
    pub(crate) fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
            contexts: Mutex::new(HashMap::new()),
            handshakes: Mutex::new(HashMap::new()),
            store,
        }
    }

    fn cached(&self, nsid: &str) -> Option<Arc<AuthToken>> {
        let tokens = self.tokens.lock().unwrap_or_else(PoisonError::into_inner);
        tokens.get(nsid).cloned()
    }

    // Concurrent misses keep whichever token was cached first
    fn cache_if_absent(&self, nsid: &str, token: AuthToken) -> Arc<AuthToken> {
        let mut tokens = self.tokens.lock().unwrap_or_else(PoisonError::into_inner);
        tokens
            .entry(nsid.to_string())
            .or_insert_with(|| Arc::new(token))
            .clone()
    }

    fn cache(&self, nsid: &str, token: AuthToken) -> Arc<AuthToken> {
        let token = Arc::new(token);
        let mut tokens = self.tokens.lock().unwrap_or_else(PoisonError::into_inner);
        tokens.insert(nsid.to_string(), token.clone());
        token
    }

    // Leaves a token cached since `rejected` was handed out alone
    fn uncache_if(&self, nsid: &str, rejected: &str) {
        let mut tokens = self.tokens.lock().unwrap_or_else(PoisonError::into_inner);
        if tokens.get(nsid).is_some_and(|t| t.token() == rejected) {
            tokens.remove(nsid);
        }
    }

    fn forget_saved_if(&self, nsid: &str, rejected: &str) -> Result<(), FlickrError> {
        let key = token_key(nsid);
        if self.store.get(&key)?.as_deref() == Some(rejected) {
            self.store.remove(&key)?;
        }
        Ok(())
    }

    fn context(&self) -> Option<String> {
        let contexts = self.contexts.lock().unwrap_or_else(PoisonError::into_inner);
        contexts.get(&thread::current().id()).cloned()
    }

    fn set_context(&self, nsid: Option<String>) {
        let mut contexts = self.contexts.lock().unwrap_or_else(PoisonError::into_inner);
        let id = thread::current().id();
        match nsid {
            Some(nsid) => contexts.insert(id, nsid),
            None => contexts.remove(&id),
        };
    }

    fn begin_handshake(&self, handshake: PendingHandshake) {
        let mut handshakes = self.handshakes.lock().unwrap_or_else(PoisonError::into_inner);
        handshakes.insert(thread::current().id(), handshake);
    }

    fn take_handshake(&self) -> Option<PendingHandshake> {
        let mut handshakes = self.handshakes.lock().unwrap_or_else(PoisonError::into_inner);
        handshakes.remove(&thread::current().id())
    }
}

impl Client {
    /// Returns the token for a user, `None` when the user is not authenticated.
    ///
    /// A token saved by an earlier session is validated on first use. If the
    /// service reports it invalid it is removed from memory and from the token
    /// store, unless a newer login replaced it meanwhile, and the token that
    /// remains cached, if any, is returned.
    pub fn token_for(&self, nsid: &str) -> Result<Option<Arc<AuthToken>>, FlickrError> {
        let state = self.auth_state();
        if let Some(token) = state.cached(nsid) {
            return Ok(Some(token));
        }

        let key = token_key(nsid);
        let Some(saved) = state.store.get(&key)? else {
            return Ok(None);
        };
        match PendingToken::new(saved.clone()).resolve(self) {
            Ok(token) => Ok(Some(state.cache_if_absent(nsid, token))),
            Err(err) if err.is_invalid_token() => {
                warn!("Saved token for {nsid} is no longer valid, discarding it");
                state.forget_saved_if(nsid, &saved)?;
                state.uncache_if(nsid, &saved);
                Ok(state.cached(nsid))
            }
            Err(err) => Err(err),
        }
    }

    /// Whether `user` holds a token granting at least `required`.
    ///
    /// `None` is never authenticated.
    pub fn is_authenticated(
        &self,
        user: Option<&str>,
        required: Permission,
    ) -> Result<bool, FlickrError> {
        let Some(nsid) = user else {
            return Ok(false);
        };
        Ok(self
            .token_for(nsid)?
            .is_some_and(|token| token.permission().satisfies(required)))
    }

    /// The permission granted to the user's token, `None` if not authenticated
    pub fn permission_level(&self, nsid: &str) -> Result<Option<Permission>, FlickrError> {
        Ok(self.token_for(nsid)?.map(|token| token.permission()))
    }

    /// Starts authentication on the calling thread.
    ///
    /// Returns the URL the user must visit to approve the application. Finish
    /// with [`Client::complete_auth`] on the same thread.
    pub fn begin_auth(&self, permission: Permission) -> Result<String, FlickrError> {
        let frob = Request::unauthenticated(self, HttpMethod::Get, &self.config().rest_url)?
            .with_parameter("method", "flickr.auth.getFrob")
            .fetch::<FrobResponse>()?
            .frob
            .trim()
            .to_string();
        if frob.is_empty() {
            return Err(FlickrError::Protocol("service returned an empty frob".into()));
        }

        let perms: &'static str = permission.into();
        let url = Request::unauthenticated(self, HttpMethod::Get, &self.config().auth_url)?
            .with_parameter("frob", &frob)
            .with_parameter("perms", perms)
            .url()?;
        self.auth_state()
            .begin_handshake(PendingHandshake { frob, permission });
        Ok(url)
    }

    /// Finishes the authentication begun on this thread.
    ///
    /// The exchange code is consumed whatever the outcome. On success the
    /// token is cached and persisted and the calling thread's auth context is
    /// set to the new user.
    pub fn complete_auth(&self) -> Result<AuthUser, FlickrError> {
        let handshake = self.auth_state().take_handshake().ok_or_else(|| {
            FlickrError::Auth("No authentication was begun on this thread".into())
        })?;

        let payload = Request::unauthenticated(self, HttpMethod::Get, &self.config().rest_url)?
            .with_parameter("method", "flickr.auth.getToken")
            .with_parameter("frob", &handshake.frob)
            .fetch::<AuthResponse>()
            .map_err(|err| match err.service_code() {
                Some(ServiceErrorCode::InvalidFrob) => {
                    FlickrError::Auth("Exchange code is no longer valid".into())
                }
                _ => err,
            })?
            .auth;

        let token = if payload.user.is_some() {
            payload.into_token(Some(handshake.permission))?
        } else {
            PendingToken::new(payload.token)
                .resolve(self)
                .map_err(|err| {
                    if err.is_invalid_token() {
                        FlickrError::Auth("Just authenticated token is already invalid".into())
                    } else {
                        err
                    }
                })?
        };

        let user = token.user().clone();
        self.auth_state()
            .store
            .put(&token_key(&user.nsid), token.token())?;
        self.auth_state().cache(&user.nsid, token);
        self.set_auth_context(&user.nsid);
        info!("Authenticated {} ({})", user.username, user.nsid);
        Ok(user)
    }

    /// Persists the default user, `None` clears it
    pub fn set_default_user(&self, nsid: Option<&str>) -> Result<(), FlickrError> {
        let store = &self.auth_state().store;
        match nsid {
            Some(nsid) => store.put(DEFAULT_USER_KEY, nsid),
            None => store.remove(DEFAULT_USER_KEY),
        }
    }

    /// The persisted default user.
    ///
    /// The user may no longer be authenticated, check with [`Client::is_authenticated`].
    pub fn default_user(&self) -> Result<Option<String>, FlickrError> {
        self.auth_state().store.get(DEFAULT_USER_KEY)
    }

    /// Requests built on this thread are made as `nsid` until reset
    pub fn set_auth_context(&self, nsid: &str) {
        self.auth_state().set_context(Some(nsid.to_string()));
    }

    pub fn reset_auth_context(&self) {
        self.auth_state().set_context(None);
    }

    /// The user requests on this thread are made as
    pub fn auth_context(&self) -> Option<String> {
        self.auth_state().context()
    }

    /// Sets this thread's auth context until the returned guard is dropped,
    /// then restores whatever was set before
    pub fn scoped_auth_context(&self, nsid: &str) -> AuthContextGuard<'_> {
        let previous = self.auth_context();
        self.set_auth_context(nsid);
        AuthContextGuard {
            client: self,
            previous,
            _thread_bound: PhantomData,
        }
    }

    /// Drops `rejected` for `nsid` from the cache and the store. A different
    /// token saved by a later authentication is kept.
    pub(crate) fn evict_token(&self, nsid: &str, rejected: &str) {
        warn!("Token for {nsid} was rejected, discarding it");
        let state = self.auth_state();
        state.uncache_if(nsid, rejected);
        if let Err(err) = state.forget_saved_if(nsid, rejected) {
            warn!("Failed removing saved token for {nsid}: {err}");
        }
    }
}

/// Restores the previous auth context of the thread when dropped
#[must_use = "the auth context is restored as soon as the guard is dropped"]
pub struct AuthContextGuard<'a> {
    client: &'a Client,
    previous: Option<String>,
    // The context belongs to the thread that created the guard
    _thread_bound: PhantomData<*const ()>,
}

impl Drop for AuthContextGuard<'_> {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(previous) => self.client.set_auth_context(&previous),
            None => self.client.reset_auth_context(),
        }
    }
}
