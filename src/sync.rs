//! Mutex selection.
//!
//! Uses `parking_lot::Mutex` when the `fast-lock` feature is enabled and
//! `std::sync::Mutex` otherwise. Callers go through [`lock`] so both behave
//! the same.

#[cfg(feature = "fast-lock")]
pub type Mutex<T> = parking_lot::Mutex<T>;

#[cfg(not(feature = "fast-lock"))]
pub type Mutex<T> = std::sync::Mutex<T>;

/// Lock a mutex, recovering the guard if a previous holder panicked.
#[cfg(feature = "fast-lock")]
pub fn lock<T>(mutex: &Mutex<T>) -> parking_lot::MutexGuard<'_, T> {
    mutex.lock()
}

/// Lock a mutex, recovering the guard if a previous holder panicked.
#[cfg(not(feature = "fast-lock"))]
pub fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
