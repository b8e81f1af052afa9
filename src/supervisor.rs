//! Fail-safe supervisor
//!
//! The only sanctioned way out of the process. A fatal error is announced
//! once over the broadcast channel, given a cooldown so a listener can log
//! it, and then the process terminates abnormally. Running as PID 1, that
//! termination makes the kernel reboot the appliance.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Error;
use crate::network::StatusSink;

/// An error nothing in-process may recover from
#[derive(Debug)]
pub struct FatalError {
    cause: Error,
}

impl FatalError {
    pub fn cause(&self) -> &Error {
        &self.cause
    }
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.cause, f)
    }
}

impl std::error::Error for FatalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

impl From<Error> for FatalError {
    fn from(cause: Error) -> Self {
        Self { cause }
    }
}

/// Final step of the fatal path. In production this never returns.
pub type Terminate = Box<dyn Fn(&FatalError) + Send + Sync>;

/// Abort the process so init's death reboots the machine
pub fn abort_process(fatal: &FatalError) {
    tracing::error!("Terminating: {}", fatal);
    std::process::abort();
}

struct Inner {
    status: Arc<dyn StatusSink>,
    cooldown: Duration,
    terminate: Terminate,
    tripped: Mutex<Option<String>>,
}

/// Cheaply cloneable handle shared by every task that can fail
#[derive(Clone)]
pub struct Supervisor {
    inner: Arc<Inner>,
}

impl Supervisor {
    pub fn new(status: Arc<dyn StatusSink>, cooldown: Duration, terminate: Terminate) -> Self {
        Self {
            inner: Arc::new(Inner {
                status,
                cooldown,
                terminate,
                tripped: Mutex::new(None),
            }),
        }
    }

    /// Supervisor whose fatal path aborts the process
    pub fn rebooting(status: Arc<dyn StatusSink>, cooldown: Duration) -> Self {
        Self::new(status, cooldown, Box::new(abort_process))
    }

    /// Description of the first fatal error, once one has occurred
    pub fn tripped(&self) -> Option<String> {
        self.inner.tripped.lock().clone()
    }

    /// Announce, cool down, terminate.
    ///
    /// Only the first fatal error is announced. A later one is logged and its
    /// caller parks for good, so it can't run on past the first one's
    /// termination.
    pub async fn fail(&self, cause: impl Into<Error>) {
        let fatal = FatalError::from(cause.into());
        let description = fatal.to_string();

        let first = {
            let mut tripped = self.inner.tripped.lock();
            match tripped.as_ref() {
                Some(first) => Some(first.clone()),
                None => {
                    *tripped = Some(description.clone());
                    None
                }
            }
        };
        if let Some(first) = first {
            tracing::error!("Fatal error while already failing ({}): {}", first, description);
            std::future::pending::<()>().await;
        }

        tracing::error!("Fatal: {}", description);
        self.inner.status.announce(&description);

        tracing::warn!("Terminating in {:?}", self.inner.cooldown);
        tokio::time::sleep(self.inner.cooldown).await;

        (self.inner.terminate)(&fatal);
    }
}
