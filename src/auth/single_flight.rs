//! Coalescing of concurrent session refreshes.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;

use crate::{Error, Result};

type Flight = Shared<BoxFuture<'static, std::result::Result<(), Arc<Error>>>>;

/// Runs at most one refresh at a time.
///
/// The first caller starts the refresh. Callers arriving while it is in
/// flight await the same result instead of starting another. The slot is
/// cleared when the flight completes, so a later 401 triggers a fresh
/// refresh.
#[derive(Default)]
pub struct SingleFlight {
    slot: Mutex<Option<Flight>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a refresh is currently in flight.
    pub fn in_flight(&self) -> bool {
        self.lock().is_some()
    }

    /// Join the in-flight refresh, or start one with `start`.
    ///
    /// `start` is only called when no refresh is in flight. A failed refresh
    /// is reported to every waiter as [`Error::Auth`].
    pub async fn run<F, Fut>(&self, start: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let flight = {
            let mut slot = self.lock();
            match slot.as_ref() {
                Some(flight) => {
                    tracing::trace!("joining in-flight session refresh");
                    flight.clone()
                }
                None => {
                    tracing::debug!("starting session refresh");
                    let flight = start().map(|r| r.map_err(Arc::new)).boxed().shared();
                    *slot = Some(flight.clone());
                    flight
                }
            }
        };

        let result = flight.clone().await;

        {
            let mut slot = self.lock();
            if slot.as_ref().is_some_and(|current| current.ptr_eq(&flight)) {
                *slot = None;
            }
        }

        result.map_err(|e| {
            tracing::warn!(error = %e, "session refresh failed");
            Error::Auth {
                message: format!("session refresh failed: {e}"),
            }
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Flight>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SingleFlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleFlight")
            .field("in_flight", &self.in_flight())
            .finish()
    }
}
