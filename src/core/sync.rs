//! Mutex poisoning policies
//!
//! A poisoned lock means a thread panicked mid-update. Operations that can
//! report failure turn that into an error with [`lock_or_error`]; operations
//! that cannot (close, introspection, cancellation clean-up) keep going on
//! the recovered guard with [`lock_or_recover`].

use std::sync::{Mutex, MutexGuard};

/// Lock `mutex`, mapping poisoning to an error built by `error_constructor`
///
/// # Examples
/// ```
/// use std::sync::Mutex;
/// use pipeline_queue::core::sync::lock_or_error;
/// use pipeline_queue::queue::QueueError;
///
/// let mutex = Mutex::new(42);
/// let guard = lock_or_error(&mutex, |message| QueueError::OperationFailed { message }).unwrap();
/// assert_eq!(*guard, 42);
/// ```
pub fn lock_or_error<'a, T, E>(
    mutex: &'a Mutex<T>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<MutexGuard<'a, T>, E> {
    mutex.lock().map_err(|_| {
        error_constructor(
            "Internal synchronisation error (mutex poisoned): a panic occurred while holding the lock"
                .to_string(),
        )
    })
}

/// Lock `mutex`, taking the guard back from a poisoned lock
///
/// `what` names the protected state in the warning that is logged.
pub fn lock_or_recover<'a, T>(mutex: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        log::warn!("Recovering poisoned {} lock", what);
        poisoned.into_inner()
    })
}
