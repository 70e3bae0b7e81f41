//! Thread-safe handle for multi-threaded hosts.
//!
//! Reads take a shared lock, changes take the exclusive lock. A change made
//! through [`SharedAccessControl::update`] is all-or-nothing: if the closure
//! fails, the grants are restored to their state before the call.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::control::AccessControl;
use crate::error::AccessControlResult;
use crate::permission::Permission;
use crate::query::QueryInfo;

/// Cloneable, shared [`AccessControl`].
///
/// # Example
///
/// ```
/// use accessgate::{AccessControl, QueryInfo, SharedAccessControl};
///
/// let shared = SharedAccessControl::new(AccessControl::new());
/// shared.update(|ac| {
///     ac.grant("user")?.read_any("video")?;
///     Ok(())
/// })?;
///
/// let handle = shared.clone();
/// let granted = std::thread::spawn(move || {
///     handle
///         .permission(&QueryInfo::new("user", "video", "read"))
///         .map(|p| p.granted())
/// })
/// .join()
/// .unwrap()?;
/// assert!(granted);
/// # Ok::<(), accessgate::AccessControlError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedAccessControl {
    inner: Arc<RwLock<AccessControl>>,
}

impl SharedAccessControl {
    /// Wrap an instance.
    pub fn new(control: AccessControl) -> Self {
        Self {
            inner: Arc::new(RwLock::new(control)),
        }
    }

    /// Acquire shared read access.
    pub fn read(&self) -> RwLockReadGuard<'_, AccessControl> {
        self.inner.read()
    }

    /// Acquire exclusive write access.
    ///
    /// Changes made through the guard are not rolled back on error; use
    /// [`update`](Self::update) for that.
    pub fn write(&self) -> RwLockWriteGuard<'_, AccessControl> {
        self.inner.write()
    }

    /// Run a change under the exclusive lock, restoring the previous state
    /// if it fails.
    pub fn update<T>(
        &self,
        change: impl FnOnce(&mut AccessControl) -> AccessControlResult<T>,
    ) -> AccessControlResult<T> {
        let mut guard = self.inner.write();
        let snapshot = guard.clone();
        match change(&mut guard) {
            Ok(value) => Ok(value),
            Err(err) => {
                *guard = snapshot;
                Err(err)
            }
        }
    }

    /// Resolve a permission under the shared lock.
    pub fn permission(&self, query: &QueryInfo) -> AccessControlResult<Permission> {
        self.inner.read().permission(query)
    }

    /// Lock the grants.
    pub fn lock(&self) -> AccessControlResult<()> {
        self.inner.write().lock()
    }

    /// Check if the grants are locked.
    pub fn is_locked(&self) -> bool {
        self.inner.read().is_locked()
    }
}

impl From<AccessControl> for SharedAccessControl {
    fn from(control: AccessControl) -> Self {
        Self::new(control)
    }
}
