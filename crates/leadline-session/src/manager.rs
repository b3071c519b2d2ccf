//! Session Manager
//!
//! Restores the last session once at start-up and keeps it current from
//! auth-state notifications until torn down.

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use leadline_backend::{Backend, Session};
use leadline_storage::RememberDevice;

use crate::state::{SessionPhase, SessionState};

/// State shared with the notification listener
struct Shared {
    state: watch::Sender<SessionState>,
    phase: RwLock<SessionPhase>,
    /// Cleared on teardown; nothing is applied afterwards
    alive: AtomicBool,
}

impl Shared {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn set_phase(&self, target: SessionPhase) {
        let mut phase = self.phase.write();
        Self::transition(&mut phase, target);
    }

    fn transition(phase: &mut SessionPhase, target: SessionPhase) {
        let current = *phase;
        if current.can_transition_to(target) {
            *phase = target;
        } else {
            tracing::warn!(from = %current, to = %target, "Ignoring invalid session transition");
        }
    }

    /// Replace the held session from a notification
    ///
    /// The phase lock is held until the state is published, so the phase
    /// always matches the session readers see.
    fn apply_event(&self, session: Option<Session>) {
        let mut phase = self.phase.write();
        if !self.is_alive() {
            return;
        }

        if *phase != SessionPhase::Checking {
            Self::transition(&mut phase, SessionPhase::settled(session.as_ref()));
        }
        self.state.send_modify(|state| state.session = session);
    }

    /// Adopt the start-up result and leave the loading state
    fn finish_start(&self, session: Option<Session>) {
        let mut phase = self.phase.write();
        if !self.is_alive() {
            tracing::debug!("Discarding start-up result after teardown");
            return;
        }

        Self::transition(&mut phase, SessionPhase::settled(session.as_ref()));
        self.state.send_modify(|state| {
            state.session = session;
            state.loading = false;
        });
    }

    /// Stop applying updates; waits for one already being applied
    fn shut_down(&self) {
        let _phase = self.phase.write();
        self.alive.store(false, Ordering::SeqCst);
    }
}

pub struct SessionManager {
    backend: Arc<dyn Backend>,
    remember: RememberDevice,
    shared: Arc<Shared>,
    started: Arc<AtomicBool>,
    listener: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn Backend>, remember: RememberDevice) -> Self {
        let (state, _) = watch::channel(SessionState::initial());

        Self {
            backend,
            remember,
            shared: Arc::new(Shared {
                state,
                phase: RwLock::new(SessionPhase::Uninitialized),
                alive: AtomicBool::new(true),
            }),
            started: Arc::new(AtomicBool::new(false)),
            listener: Arc::new(Mutex::new(None)),
        }
    }

    /// Run the start-up protocol. Only the first call does any work.
    ///
    /// Never fails: an unreachable backend or unreadable storage ends in
    /// the anonymous state with `loading` cleared.
    pub async fn start(&self) -> SessionState {
        if self.started.swap(true, Ordering::SeqCst) {
            return self.state();
        }
        if !self.shared.is_alive() {
            tracing::debug!("Session manager already torn down, not starting");
            return self.state();
        }

        self.shared.set_phase(SessionPhase::Checking);

        if !self.backend.is_configured() {
            tracing::info!("No backend configuration, session stays anonymous");
            self.shared.finish_start(None);
            return self.state();
        }

        // Subscribe before the first backend call so its notifications are seen
        self.listen();

        if !self.remember.get_remember_device() {
            // Device opted out: drop whatever the backend kept
            if let Err(e) = self.backend.sign_out().await {
                tracing::debug!(error = %e, "Sign-out on start-up failed");
            }
            tracing::info!("Remember-device is off, discarded stored session");
            self.shared.finish_start(None);
            return self.state();
        }

        let restored = match self.backend.get_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Session restore failed, continuing signed out");
                None
            }
        };

        match &restored {
            Some(session) => tracing::info!(user_id = %session.user.id, "Restored session"),
            None => tracing::info!("No session to restore"),
        }

        self.shared.finish_start(restored);
        self.state()
    }

    fn listen(&self) {
        let mut subscription = self.backend.on_auth_state_change();
        let shared = Arc::clone(&self.shared);

        let handle = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                tracing::debug!(kind = ?event.kind, "Auth state changed");
                shared.apply_event(event.session);
            }
        });

        *self.listener.lock() = Some(handle);
    }

    /// Stop listening and ignore results of a start-up still in flight
    pub fn teardown(&self) {
        self.shared.shut_down();
        if let Some(handle) = self.listener.lock().take() {
            handle.abort();
        }
        tracing::debug!("Session manager torn down");
    }

    pub fn state(&self) -> SessionState {
        self.shared.state.borrow().clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.shared.state.borrow().session.clone()
    }

    pub fn phase(&self) -> SessionPhase {
        *self.shared.phase.read()
    }

    /// Receiver that observes every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }
}

impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            remember: self.remember.clone(),
            shared: Arc::clone(&self.shared),
            started: Arc::clone(&self.started),
            listener: Arc::clone(&self.listener),
        }
    }
}
