//! Session lifecycle with single-flight establishment
//!
//! Establishing a session runs in a spawned task. Callers await a shared
//! handle to that task, so concurrent callers produce exactly one session
//! creation and a caller that gives up does not abort it for the others.

use std::sync::Arc;

use banklink_core::{SessionPhase, SessionState, SignatureBuilder};
use banklink_domain::{BankLinkError, Result, SessionToken};
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::handshake::HandshakeClient;
use crate::key_manager::KeyManager;

type Establishment = Shared<BoxFuture<'static, Result<SessionToken>>>;

struct PendingEstablishment {
    generation: u64,
    future: Establishment,
}

#[derive(Default)]
struct Inner {
    state: SessionState,
    pending: Option<PendingEstablishment>,
}

/// Drives the `NoSession → DeviceRegistered → SessionActive` state machine.
///
/// One instance per API client; the session token never leaves memory.
#[derive(Clone)]
pub struct SessionManager {
    keys: Arc<KeyManager>,
    handshake: HandshakeClient,
    signer: SignatureBuilder,
    inner: Arc<Mutex<Inner>>,
}

impl SessionManager {
    pub fn new(keys: Arc<KeyManager>, handshake: HandshakeClient, signer: SignatureBuilder) -> Self {
        Self { keys, handshake, signer, inner: Arc::new(Mutex::new(Inner::default())) }
    }

    /// Current phase, for diagnostics.
    pub async fn state(&self) -> SessionPhase {
        self.inner.lock().await.state.phase()
    }

    /// Register the device for `access_secret` unless already registered.
    #[instrument(skip_all)]
    pub async fn ensure_device_registered(&self, access_secret: &str) -> Result<()> {
        let generation = {
            let inner = self.inner.lock().await;
            if inner.state.is_device_registered() {
                return Ok(());
            }
            inner.state.generation()
        };

        let installation_token = self.keys.installation_token().await?;
        self.handshake.register_device(&self.signer, &installation_token, access_secret).await?;

        if !self.inner.lock().await.state.mark_device_registered(generation) {
            debug!("session was reset during device registration");
        }
        Ok(())
    }

    /// Return the active session token, establishing a session if needed.
    ///
    /// No network call happens while a session is active.
    pub async fn ensure_session(&self, access_secret: &str) -> Result<SessionToken> {
        let establishment = {
            let mut inner = self.inner.lock().await;
            if let Some(token) = inner.state.token() {
                return Ok(token.clone());
            }

            let generation = inner.state.generation();
            let joined = inner
                .pending
                .as_ref()
                .filter(|pending| pending.generation == generation)
                .map(|pending| pending.future.clone());

            match joined {
                Some(future) => future,
                None => {
                    let future = self.spawn_establishment(&inner.state, access_secret.to_string());
                    inner.pending = Some(PendingEstablishment { generation, future: future.clone() });
                    future
                }
            }
        };

        establishment.await
    }

    /// Drop the session; the next request establishes a new one.
    pub async fn invalidate(&self) {
        let mut inner = self.inner.lock().await;
        inner.state.invalidate();
        inner.pending = None;
        info!("session invalidated");
    }

    /// Drop the session only if `token` is still the active one.
    pub async fn invalidate_token(&self, token: &SessionToken) -> bool {
        let mut inner = self.inner.lock().await;
        let invalidated = inner.state.invalidate_token(token);
        if invalidated {
            inner.pending = None;
            info!("session invalidated after authentication failure");
        }
        invalidated
    }

    fn spawn_establishment(&self, state: &SessionState, access_secret: String) -> Establishment {
        let generation = state.generation();
        let register_device = !state.is_device_registered();
        let keys = Arc::clone(&self.keys);
        let handshake = self.handshake.clone();
        let signer = self.signer.clone();
        let inner = Arc::clone(&self.inner);

        let task = tokio::spawn(async move {
            let result = establish(
                &keys,
                &handshake,
                &signer,
                &inner,
                generation,
                register_device,
                &access_secret,
            )
            .await;

            let mut guard = inner.lock().await;
            if guard.pending.as_ref().is_some_and(|pending| pending.generation == generation) {
                guard.pending = None;
            }

            match result {
                Ok(token) if guard.state.activate(generation, token.clone()) => {
                    info!("session established");
                    Ok(token)
                }
                Ok(_) => {
                    debug!("discarding session established before an invalidation");
                    Err(BankLinkError::SessionInvalid(
                        "session was invalidated while it was being established".into(),
                    ))
                }
                Err(err) => {
                    warn!(error = %err, "session establishment failed");
                    Err(err)
                }
            }
        });

        async move {
            task.await.unwrap_or_else(|err| {
                Err(BankLinkError::Internal(format!("session establishment task failed: {err}")))
            })
        }
        .boxed()
        .shared()
    }
}

async fn establish(
    keys: &KeyManager,
    handshake: &HandshakeClient,
    signer: &SignatureBuilder,
    inner: &Mutex<Inner>,
    generation: u64,
    register_device: bool,
    access_secret: &str,
) -> Result<SessionToken> {
    let installation_token = keys.installation_token().await?;

    if register_device {
        handshake.register_device(signer, &installation_token, access_secret).await?;
        inner.lock().await.state.mark_device_registered(generation);
    }

    handshake.create_session(signer, &installation_token, access_secret).await
}
