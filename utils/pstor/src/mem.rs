use crate::{
    api::{ObjectKey, StorableObject, Store, StoreKey, StoreKv, StoreObj, StoreValue},
    error::{DeserialiseValue, Error, SerialiseValue},
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use snafu::ResultExt;
use std::{collections::BTreeMap, sync::Arc};

/// An in-process key-value store backed by an ordered map.
/// It keeps the same key layout as the etcd backend so prefix queries
/// behave identically.
#[derive(Clone, Default)]
pub struct Mem {
    entries: Arc<Mutex<BTreeMap<String, Value>>>,
}

impl std::fmt::Debug for Mem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Mem({} entries)", self.entries.lock().len())
    }
}

impl Mem {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreKv for Mem {
    async fn put_kv<K: StoreKey, V: StoreValue>(
        &mut self,
        key: &K,
        value: &V,
    ) -> Result<(), Error> {
        let value = serde_json::to_value(value).context(SerialiseValue)?;
        self.entries.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn get_kv<K: StoreKey>(&mut self, key: &K) -> Result<Value, Error> {
        match self.entries.lock().get(&key.to_string()) {
            Some(value) => Ok(value.clone()),
            None => Err(Error::MissingEntry {
                key: key.to_string(),
            }),
        }
    }

    async fn delete_kv<K: StoreKey>(&mut self, key: &K) -> Result<(), Error> {
        self.entries.lock().remove(&key.to_string());
        Ok(())
    }

    async fn get_values_prefix(&mut self, key_prefix: &str) -> Result<Vec<(String, Value)>, Error> {
        let entries = self.entries.lock();
        Ok(entries
            .range(key_prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(key_prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    async fn get_values_paged(
        &mut self,
        key_prefix: &str,
        limit: i64,
    ) -> Result<Vec<(String, Value)>, Error> {
        if limit <= 2 {
            return Err(Error::PagedMinimum);
        }
        let entries = self.entries.lock();
        Ok(entries
            .range(key_prefix.to_string()..)
            .take(limit as usize)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    async fn delete_values_prefix(&mut self, key_prefix: &str) -> Result<(), Error> {
        let mut entries = self.entries.lock();
        entries.retain(|key, _| !key.starts_with(key_prefix));
        Ok(())
    }
}

#[async_trait]
impl StoreObj for Mem {
    async fn put_obj<O: StorableObject>(&mut self, object: &O) -> Result<(), Error> {
        let value = serde_json::to_value(object).context(SerialiseValue)?;
        self.entries.lock().insert(object.key().key(), value);
        Ok(())
    }

    async fn get_obj<O: StorableObject>(&mut self, key: &O::Key) -> Result<O, Error> {
        let value = self.get_kv(&key.key()).await?;
        serde_json::from_value(value.clone()).context(DeserialiseValue {
            value: value.to_string(),
        })
    }

    async fn delete_obj<K: ObjectKey>(&mut self, key: &K) -> Result<(), Error> {
        self.delete_kv(&key.key()).await
    }
}

#[async_trait]
impl Store for Mem {
    async fn online(&mut self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prefix_queries_are_scoped() {
        let mut store = Mem::new();
        store.put_kv(&"/a/1", &1u32).await.unwrap();
        store.put_kv(&"/a/2", &2u32).await.unwrap();
        store.put_kv(&"/b/1", &3u32).await.unwrap();

        let values = store.get_values_prefix("/a").await.unwrap();
        assert_eq!(values.len(), 2);

        store.delete_values_prefix("/a").await.unwrap();
        assert!(store.get_values_prefix("/a").await.unwrap().is_empty());
        assert_eq!(store.get_values_prefix("/b").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_entry_is_an_error() {
        let mut store = Mem::new();
        let error = store.get_kv(&"/nope").await.unwrap_err();
        assert!(matches!(error, Error::MissingEntry { .. }));
    }
}
