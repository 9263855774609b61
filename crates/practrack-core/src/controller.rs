// ── Controller ──
//
// Facade the CLI and TUI talk to. Owns the API client and the store,
// runs every CRUD operation generically over `Entity`, and keeps the
// slice flags in step with each request.

use std::fmt::Display;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::TimeZone;
use practrack_api::transport::{TlsMode, TransportConfig};
use practrack_api::{ApiClient, ListParams};
use secrecy::SecretString;
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{ControllerConfig, TlsVerification};
use crate::error::CoreError;
use crate::form::{self, EntityForm, FormMode, ReferenceOptions};
use crate::model::{Entity, EntityId, EntityKind, Practice, PracticeSession};
use crate::store::{DataStore, EntitySlice, SliceState};
use crate::stream::SliceStream;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Every operation updates
/// the matching store slice and also returns its result, so callers can
/// either await the value or watch the slice.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    store: Arc<DataStore>,
    connection_state: watch::Sender<ConnectionState>,
    client: ArcSwapOption<ApiClient>,
    cancel: CancellationToken,
    /// Child token for the current connection; background re-lists
    /// spawned under it stop on disconnect.
    cancel_child: Mutex<CancellationToken>,
}

impl Controller {
    /// Create a controller. Does not connect.
    pub fn new(config: ControllerConfig) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(ControllerInner {
                config,
                store: Arc::new(DataStore::new()),
                connection_state,
                client: ArcSwapOption::empty(),
                cancel,
                cancel_child: Mutex::new(cancel_child),
            }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Build the HTTP client, logging in first for username/password auth.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Connecting);

        let config = &self.inner.config;
        let transport = build_transport(config);

        let client = match ApiClient::connect(config.url.as_str(), &config.auth, &transport).await
        {
            Ok(client) => client,
            Err(e) => {
                let _ = self.inner.connection_state.send(ConnectionState::Failed);
                let err = self.map_api_error(e);
                warn!(error = %err, url = %config.url, "connect failed");
                return Err(err);
            }
        };
        debug!(base_url = %client.base_url(), "api client ready");

        *self.inner.cancel_child.lock().await = self.inner.cancel.child_token();
        self.inner.client.store(Some(Arc::new(client)));

        let _ = self.inner.connection_state.send(ConnectionState::Connected);
        info!(url = %config.url, "connected");
        Ok(())
    }

    /// Drop the client, stop background re-lists and clear every slice.
    pub async fn disconnect(&self) {
        self.inner.cancel_child.lock().await.cancel();
        self.inner.client.store(None);
        self.inner.store.reset_all();

        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    /// One-shot: connect, run closure, disconnect.
    pub async fn oneshot<F, Fut, T>(config: ControllerConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let controller = Controller::new(config);
        controller.connect().await?;
        let result = f(controller.clone()).await;
        controller.disconnect().await;
        result
    }

    /// Exchange a username and password for a JWT without keeping a
    /// connection, e.g. to store the token for later runs.
    pub async fn login(
        config: &ControllerConfig,
        username: &str,
        password: &SecretString,
        remember_me: bool,
    ) -> Result<SecretString, CoreError> {
        let transport = build_transport(config);
        let client = ApiClient::new(config.url.as_str(), &transport)?;
        let token = client.authenticate(username, password, remember_me).await?;
        info!(username, "obtained token");
        Ok(token)
    }

    // ── State observation ────────────────────────────────────────

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Current state of `E`'s slice.
    pub fn state<E: Entity>(&self) -> SliceState<E> {
        self.slice::<E>().snapshot()
    }

    pub fn subscribe<E: Entity>(&self) -> watch::Receiver<SliceState<E>> {
        self.slice::<E>().subscribe()
    }

    pub fn stream<E: Entity>(&self) -> SliceStream<E> {
        SliceStream::new(self.subscribe::<E>())
    }

    /// Restore `E`'s slice to its initial state.
    pub fn reset<E: Entity>(&self) {
        self.slice::<E>().reset();
    }

    // ── Reads ────────────────────────────────────────────────────

    /// `GET` the collection into the slice.
    pub async fn list<E: Entity>(&self, params: &ListParams) -> Result<Vec<Arc<E>>, CoreError> {
        self.run_list::<E>(params, false).await
    }

    /// Same as [`list`](Self::list) over the NDJSON representation.
    pub async fn list_ndjson<E: Entity>(
        &self,
        params: &ListParams,
    ) -> Result<Vec<Arc<E>>, CoreError> {
        self.run_list::<E>(params, true).await
    }

    async fn run_list<E: Entity>(
        &self,
        params: &ListParams,
        ndjson: bool,
    ) -> Result<Vec<Arc<E>>, CoreError> {
        let slice = self.slice::<E>();
        slice.begin_fetch();

        match self.fetch_list::<E>(params, ndjson).await {
            Ok(items) => {
                debug!(entity = E::KIND.label(), count = items.len(), "list fulfilled");
                slice.list_fulfilled(items);
                Ok(slice.snapshot().entities.as_ref().clone())
            }
            Err(e) => Err(reject(slice, e)),
        }
    }

    /// List whichever entity `kind` names.
    pub async fn list_kind(&self, kind: EntityKind, params: &ListParams) -> Result<(), CoreError> {
        match kind {
            EntityKind::PracticeSession => self.list::<PracticeSession>(params).await.map(drop),
            EntityKind::Practice => self.list::<Practice>(params).await.map(drop),
        }
    }

    /// `GET` one entity into the slice.
    pub async fn get_one<E: Entity>(&self, id: EntityId) -> Result<E, CoreError> {
        let slice = self.slice::<E>();
        slice.begin_fetch();

        let result = match self.client() {
            Ok(client) => client
                .get_one::<E>(id.get())
                .await
                .map_err(|e| self.map_api_error(e).with_target(E::KIND.label(), id)),
            Err(e) => Err(e),
        };

        match result {
            Ok(entity) => {
                slice.entity_fulfilled(entity.clone());
                Ok(entity)
            }
            Err(e) => Err(reject(slice, e)),
        }
    }

    // ── Mutations ────────────────────────────────────────────────

    /// `POST` a new entity. The server assigns the id.
    pub async fn create<E: Entity>(&self, entity: E) -> Result<E, CoreError> {
        let slice = self.slice::<E>();
        slice.begin_mutation();

        let result = match self.client() {
            Ok(client) => client.create(&entity).await.map_err(|e| self.map_api_error(e)),
            Err(e) => Err(e),
        };
        self.finish_save(slice, result, "created").await
    }

    /// `PUT` a full replacement.
    pub async fn update<E: Entity>(&self, entity: E) -> Result<E, CoreError> {
        let slice = self.slice::<E>();
        slice.begin_mutation();

        let result = match self.client() {
            Ok(client) => client.update(&entity).await.map_err(|e| self.map_api_error(e)),
            Err(e) => Err(e),
        };
        self.finish_save(slice, result, "updated").await
    }

    /// `PATCH` only the fields present on `entity`.
    pub async fn partial_update<E: Entity>(&self, entity: E) -> Result<E, CoreError> {
        let slice = self.slice::<E>();
        slice.begin_mutation();

        let result = match self.client() {
            Ok(client) => client
                .partial_update(&entity)
                .await
                .map_err(|e| self.map_api_error(e)),
            Err(e) => Err(e),
        };
        self.finish_save(slice, result, "patched").await
    }

    pub async fn delete<E: Entity>(&self, id: EntityId) -> Result<(), CoreError> {
        let slice = self.slice::<E>();
        slice.begin_mutation();

        let result = match self.client() {
            Ok(client) => client
                .delete::<E>(id.get())
                .await
                .map_err(|e| self.map_api_error(e).with_target(E::KIND.label(), id)),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                info!(entity = E::KIND.label(), %id, "deleted");
                slice.mutation_succeeded(None);
                self.spawn_refresh::<E>().await;
                Ok(())
            }
            Err(e) => Err(reject(slice, e)),
        }
    }

    async fn finish_save<E: Entity>(
        &self,
        slice: &EntitySlice<E>,
        result: Result<E, CoreError>,
        verb: &'static str,
    ) -> Result<E, CoreError> {
        match result {
            Ok(saved) => {
                info!(
                    entity = E::KIND.label(),
                    id = ?saved.id(),
                    "{verb}"
                );
                slice.mutation_succeeded(Some(saved.clone()));
                self.spawn_refresh::<E>().await;
                Ok(saved)
            }
            Err(e) => Err(reject(slice, e)),
        }
    }

    // ── Forms ────────────────────────────────────────────────────

    /// Fetch every entity kind `E` references, for the form's selectors.
    pub async fn preload_references<E: Entity>(&self) -> Result<ReferenceOptions, CoreError> {
        for kind in form::reference_kinds::<E>() {
            self.list_kind(kind, &ListParams::default()).await?;
        }
        Ok(self.reference_options::<E>())
    }

    /// Reference options from whatever lists are already loaded.
    pub fn reference_options<E: Entity>(&self) -> ReferenceOptions {
        ReferenceOptions::from_store(&self.inner.store, form::reference_kinds::<E>())
    }

    /// Validate and submit a form: `create` for a new entity, `update`
    /// for an edit. Validation failures never reach the server.
    pub async fn save<E, Tz>(&self, form: &mut EntityForm<E>, tz: &Tz) -> Result<E, CoreError>
    where
        E: Entity,
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let base = match form.mode() {
            FormMode::Create => E::default(),
            FormMode::Edit(id) => {
                let cached = self.state::<E>().entity;
                if cached.entity_id() == Some(id) {
                    cached.as_ref().clone()
                } else {
                    self.get_one::<E>(id).await?
                }
            }
        };

        let entity = form.submit(&base, &self.reference_options::<E>(), tz)?;
        match form.mode() {
            FormMode::Create => self.create(entity).await,
            FormMode::Edit(_) => self.update(entity).await,
        }
    }

    // ── Internals ────────────────────────────────────────────────

    fn slice<E: Entity>(&self) -> &EntitySlice<E> {
        E::slice(&self.inner.store)
    }

    fn client(&self) -> Result<Arc<ApiClient>, CoreError> {
        self.inner
            .client
            .load_full()
            .ok_or(CoreError::ControllerDisconnected)
    }

    async fn fetch_list<E: Entity>(
        &self,
        params: &ListParams,
        ndjson: bool,
    ) -> Result<Vec<E>, CoreError> {
        let client = self.client()?;
        let result = if ndjson {
            client.list_ndjson::<E>(params).await
        } else {
            client.list::<E>(params).await
        };
        result.map_err(|e| self.map_api_error(e))
    }

    fn map_api_error(&self, err: practrack_api::Error) -> CoreError {
        match CoreError::from(err) {
            CoreError::Timeout { .. } => CoreError::Timeout {
                timeout_secs: self.inner.config.timeout.as_secs(),
            },
            other => other,
        }
    }

    /// Re-list `E` in the background after a mutation. Not awaited; a
    /// disconnect cancels it.
    async fn spawn_refresh<E: Entity>(&self) {
        let cancel = self.inner.cancel_child.lock().await.clone();
        let ctrl = self.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {}
                () = ctrl.refresh::<E>() => {}
            }
        });
    }

    async fn refresh<E: Entity>(&self) {
        let slice = self.slice::<E>();
        slice.begin_refresh();

        match self.fetch_list::<E>(&ListParams::default(), false).await {
            Ok(items) => {
                debug!(entity = E::KIND.label(), count = items.len(), "background refresh");
                slice.list_fulfilled(items);
            }
            Err(e) => {
                warn!(error = %e, entity = E::KIND.label(), "background refresh failed");
                slice.refresh_failed(e.to_string());
            }
        }
    }
}

/// Record a failure on the slice and hand the error back.
fn reject<E>(slice: &EntitySlice<E>, err: CoreError) -> CoreError {
    warn!(error = %err, "request failed");
    slice.rejected(err.to_string());
    err
}

fn build_transport(config: &ControllerConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
