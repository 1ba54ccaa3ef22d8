//! Bounded pool for expensive resources such as browser instances.
//!
//! At most `capacity` resources are checked out at any time. A checked-out
//! resource is wrapped in [`Pooled`], which hands it back to the idle list
//! when dropped, so release also happens when the holding task is cancelled.
//! A resource marked dirty is dropped instead, so one abandoned mid-use is
//! never handed out again.

use std::future::Future;
use std::ops::Deref;
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// The pool was closed and hands out no more resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("resource pool is closed")]
pub struct PoolClosed;

/// Bounded pool of reusable resources, created lazily on demand.
pub struct ResourcePool<T> {
    permits: Arc<Semaphore>,
    idle: Arc<Mutex<Vec<T>>>,
    capacity: usize,
}

impl<T> ResourcePool<T> {
    pub fn new(capacity: usize) -> Self {
        Self { permits: Arc::new(Semaphore::new(capacity)), idle: Arc::new(Mutex::new(Vec::new())), capacity }
    }

    /// Number of resources currently checked out.
    pub fn in_use(&self) -> usize {
        self.capacity - self.permits.available_permits()
    }

    /// Number of resources waiting to be reused.
    pub fn idle(&self) -> usize {
        self.idle.lock().map(|idle| idle.len()).unwrap_or(0)
    }

    /// Check out a resource, reusing an idle one or creating one with `create`.
    ///
    /// Waits while the pool is at capacity.
    pub async fn acquire<F, Fut, E>(&self, create: F) -> Result<Pooled<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<PoolClosed>,
    {
        let permit = Arc::clone(&self.permits).acquire_owned().await.map_err(|_| PoolClosed)?;

        let reused = self.idle.lock().ok().and_then(|mut idle| idle.pop());
        let item = match reused {
            Some(item) => item,
            None => create().await?,
        };

        Ok(Pooled { item: Some(item), home: Some(Arc::clone(&self.idle)), parked: None, _permit: permit })
    }

    /// Check out a freshly created resource that is dropped instead of reused.
    ///
    /// Counts against the same capacity as [`ResourcePool::acquire`].
    pub async fn acquire_fresh<F, Fut, E>(&self, create: F) -> Result<Pooled<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<PoolClosed>,
    {
        let permit = Arc::clone(&self.permits).acquire_owned().await.map_err(|_| PoolClosed)?;
        let item = create().await?;
        Ok(Pooled { item: Some(item), home: None, parked: None, _permit: permit })
    }

    /// Stop handing out resources and drop every idle one.
    pub fn close(&self) {
        self.permits.close();
        if let Ok(mut idle) = self.idle.lock() {
            idle.clear();
        }
    }
}

/// A checked-out resource. Returned to the pool on drop unless discarded or dirty.
pub struct Pooled<T> {
    item: Option<T>,
    home: Option<Arc<Mutex<Vec<T>>>>,
    /// Where `home` waits while the resource is dirty.
    parked: Option<Arc<Mutex<Vec<T>>>>,
    _permit: OwnedSemaphorePermit,
}

impl<T> Pooled<T> {
    /// Mark the resource as mid-operation. Dropped while dirty, it is discarded.
    pub fn mark_dirty(&mut self) {
        if let Some(home) = self.home.take() {
            self.parked = Some(home);
        }
    }

    /// The operation finished and left the resource reusable.
    pub fn mark_clean(&mut self) {
        if let Some(home) = self.parked.take() {
            self.home = Some(home);
        }
    }
}

impl<T> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Only `Drop` takes the item out.
        self.item.as_ref().expect("pooled item present until drop")
    }
}

impl<T> Drop for Pooled<T> {
    fn drop(&mut self) {
        if let (Some(item), Some(home)) = (self.item.take(), self.home.take())
            && let Ok(mut idle) = home.lock()
        {
            idle.push(item);
        }
    }
}
