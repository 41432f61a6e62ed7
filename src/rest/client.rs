/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::auth::AuthState;
use crate::rest::{
    Config, Creds, FlickrError, HttpTransport, MemoryTokenStore, TokenStore, Transport,
};
use std::sync::Arc;

/// Handle to the service.
///
/// Cheap to clone; clones share configuration, transport and authentication state.
///
/// ```rust,no_run
/// use flickr::rest::{Client, Creds, Permission};
///
/// fn login() -> Result<(), flickr::rest::FlickrError> {
///     let client = Client::new(Creds::from_tokens("api-key", Some("shared-secret")))?;
///     let url = client.begin_auth(Permission::Read)?;
///     println!("Visit {url} and approve the application, then press enter");
///     let mut line = String::new();
///     let _ = std::io::stdin().read_line(&mut line);
///     let user = client.complete_auth()?;
///     client.set_default_user(Some(user.nsid.as_str()))?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: Config,
    transport: Arc<dyn Transport>,
    auth: AuthState,
}

impl Client {
    /// Creates a client using the default endpoints, HTTP transport and an in-memory token store
    pub fn new(creds: Creds) -> Result<Self, FlickrError> {
        Self::builder(Config::new(creds)).build()
    }

    pub fn builder(config: Config) -> ClientBuilder {
        ClientBuilder {
            config,
            transport: None,
            token_store: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.inner.transport.as_ref()
    }

    pub(crate) fn auth_state(&self) -> &AuthState {
        &self.inner.auth
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// Assembles a [`Client`] from its parts
pub struct ClientBuilder {
    config: Config,
    transport: Option<Arc<dyn Transport>>,
    token_store: Option<Arc<dyn TokenStore>>,
}

impl ClientBuilder {
    /// Replaces the HTTP transport
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Where tokens and the default user are persisted
    pub fn token_store(mut self, token_store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(token_store);
        self
    }

    pub fn build(self) -> Result<Client, FlickrError> {
        self.config.validate()?;
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(self.config.timeout)?),
        };
        let token_store = self
            .token_store
            .unwrap_or_else(|| Arc::new(MemoryTokenStore::default()));
        Ok(Client {
            inner: Arc::new(ClientInner {
                config: self.config,
                transport,
                auth: AuthState::new(token_store),
            }),
        })
    }
}
