//! Registry containing the replication topology specs, backed by the
//! persistent store. The specs are loaded from the store at startup and
//! kept in sync on every mutation; the store remains the source of truth
//! across agent restarts.

use crate::{controller::resources::specs::ResourceSpecsLocked, errors::SvcError};
use pstor::{etcd::Etcd, ObjectKey, StorableObject, Store};
use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
    time::Duration,
};
use tokio::sync::Mutex;

/// Default timeout for store operations.
pub const STORE_OP_TIMEOUT: Duration = Duration::from_secs(5);

/// Registry containing the resource specs and a handle to the persistent
/// store.
#[derive(Debug, Clone)]
pub struct Registry<S: Store = Etcd> {
    inner: Arc<RegistryInner<S>>,
}

impl<S: Store> Deref for Registry<S> {
    type Target = Arc<RegistryInner<S>>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Generic registry with a persistent store of generic type `S`.
#[derive(Debug)]
pub struct RegistryInner<S: Store> {
    /// The replication topology specs.
    specs: ResourceSpecsLocked,
    store: Arc<Mutex<S>>,
    /// Timeout for store operations.
    store_timeout: Duration,
}

impl Registry {
    /// Create a new registry backed by an etcd store at the given endpoint
    /// and load the specs from it.
    pub async fn new(store_endpoint: &str) -> Result<Self, SvcError> {
        let store = Etcd::new(store_endpoint).await?;
        Registry::with_store(store, STORE_OP_TIMEOUT).await
    }
}

impl<S: Store> Registry<S> {
    /// Create a new registry over an already connected store and load the
    /// specs from it.
    pub async fn with_store(store: S, store_timeout: Duration) -> Result<Self, SvcError> {
        let registry = Self {
            inner: Arc::new(RegistryInner {
                specs: ResourceSpecsLocked::new(),
                store: Arc::new(Mutex::new(store)),
                store_timeout,
            }),
        };
        registry.init().await?;
        Ok(registry)
    }

    /// The resource specs of the registry.
    pub fn specs(&self) -> &ResourceSpecsLocked {
        &self.inner.specs
    }

    /// Initialise the registry with the content of the persistent store.
    async fn init(&self) -> Result<(), SvcError> {
        let mut store = self.store.lock().await;
        self.specs.init(store.deref_mut()).await?;
        Ok(())
    }

    /// Serialized write to the persistent store.
    pub async fn store_obj<O: StorableObject>(&self, object: &O) -> Result<(), SvcError> {
        let mut store = self.store.lock().await;
        match tokio::time::timeout(
            self.store_timeout,
            async move { store.put_obj(object).await },
        )
        .await
        {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(SvcError::Store {
                source: pstor::Error::Timeout {
                    operation: "Put".to_string(),
                    timeout: self.store_timeout,
                },
            }),
        }
    }

    /// Serialized deletion of the object from the persistent store.
    pub async fn delete_obj<K: ObjectKey>(&self, key: &K) -> Result<(), SvcError> {
        let mut store = self.store.lock().await;
        match tokio::time::timeout(
            self.store_timeout,
            async move { store.delete_obj(key).await },
        )
        .await
        {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(SvcError::Store {
                source: pstor::Error::Timeout {
                    operation: "Delete".to_string(),
                    timeout: self.store_timeout,
                },
            }),
        }
    }
}
