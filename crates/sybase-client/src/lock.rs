//! Process-wide locks around non-reentrant client library calls.
//!
//! Context allocation and context exit must not run concurrently anywhere
//! in the process. These two locks are the only state shared between
//! connections.

use once_cell::sync::Lazy;
use parking_lot::{Mutex, MutexGuard};

/// Serializes context allocation (`cs_ctx_alloc` + `ct_init`).
static CT_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Serializes context exit (`ct_exit` + `cs_ctx_drop`).
static CS_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Hold the context allocation lock.
pub fn init_guard() -> MutexGuard<'static, ()> {
    CT_LOCK.lock()
}

/// Hold the context exit lock.
pub fn exit_guard() -> MutexGuard<'static, ()> {
    CS_LOCK.lock()
}
