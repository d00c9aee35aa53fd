use crate::{
    api::{ObjectKey, StorableObject, Store, StoreKey, StoreKv, StoreObj, StoreValue},
    error::{Connect, Delete, DeserialiseValue, Error, Get, GetPrefix, Put, SerialiseValue, ValueString},
};
use async_trait::async_trait;
use etcd_client::{Client, GetOptions, SortOrder, SortTarget};
use serde_json::Value;
use snafu::ResultExt;

/// etcd client.
#[derive(Clone)]
pub struct Etcd {
    client: Client,
}

impl std::fmt::Debug for Etcd {
    fn fmt(&self, _: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Ok(())
    }
}

impl Etcd {
    /// Create a new instance of the etcd client.
    pub async fn new(endpoint: &str) -> Result<Etcd, Error> {
        Ok(Self {
            client: Client::connect([endpoint], None)
                .await
                .context(Connect {})?,
        })
    }
}

#[async_trait]
impl StoreKv for Etcd {
    /// 'Put' a key-value pair into etcd.
    async fn put_kv<K: StoreKey, V: StoreValue>(
        &mut self,
        key: &K,
        value: &V,
    ) -> Result<(), Error> {
        let vec_value = serde_json::to_vec(value).context(SerialiseValue)?;
        self.client
            .put(key.to_string(), vec_value, None)
            .await
            .context(Put {
                key: key.to_string(),
                value: serde_json::to_string(value).context(SerialiseValue)?,
            })?;
        Ok(())
    }

    /// 'Get' the value for the given key from etcd.
    async fn get_kv<K: StoreKey>(&mut self, key: &K) -> Result<Value, Error> {
        let resp = self.client.get(key.to_string(), None).await.context(Get {
            key: key.to_string(),
        })?;
        match resp.kvs().first() {
            Some(kv) => Ok(
                serde_json::from_slice(kv.value()).context(DeserialiseValue {
                    value: String::from_utf8_lossy(kv.value()).to_string(),
                })?,
            ),
            None => Err(Error::MissingEntry {
                key: key.to_string(),
            }),
        }
    }

    /// 'Delete' the entry with the given key from etcd.
    async fn delete_kv<K: StoreKey>(&mut self, key: &K) -> Result<(), Error> {
        self.client
            .delete(key.to_string(), None)
            .await
            .context(Delete {
                key: key.to_string(),
            })?;
        Ok(())
    }

    /// Retrieve all key-value pairs under the given prefix.
    async fn get_values_prefix(&mut self, key_prefix: &str) -> Result<Vec<(String, Value)>, Error> {
        let resp = self
            .client
            .get(key_prefix, Some(GetOptions::new().with_prefix()))
            .await
            .context(GetPrefix { prefix: key_prefix })?;
        let mut result = Vec::with_capacity(resp.kvs().len());
        for kv in resp.kvs() {
            let key = kv.key_str().context(ValueString)?.to_string();
            let value = serde_json::from_slice(kv.value()).context(DeserialiseValue {
                value: String::from_utf8_lossy(kv.value()).to_string(),
            })?;
            result.push((key, value));
        }
        Ok(result)
    }

    /// Retrieve a page of key-value pairs, sorted by key. The caller passes
    /// the last seen key back in to fetch the next page.
    async fn get_values_paged(
        &mut self,
        key_prefix: &str,
        limit: i64,
    ) -> Result<Vec<(String, Value)>, Error> {
        if limit <= 2 {
            return Err(Error::PagedMinimum);
        }
        let resp = self
            .client
            .get(
                key_prefix,
                Some(
                    GetOptions::new()
                        .with_prefix()
                        .with_from_key()
                        .with_sort(SortTarget::Key, SortOrder::Ascend)
                        .with_limit(limit),
                ),
            )
            .await
            .context(GetPrefix { prefix: key_prefix })?;
        let mut result = Vec::with_capacity(resp.kvs().len());
        for kv in resp.kvs() {
            let key = kv.key_str().context(ValueString)?.to_string();
            let value = serde_json::from_slice(kv.value()).context(DeserialiseValue {
                value: String::from_utf8_lossy(kv.value()).to_string(),
            })?;
            result.push((key, value));
        }
        Ok(result)
    }

    /// Delete all key-value pairs under the given prefix.
    async fn delete_values_prefix(&mut self, key_prefix: &str) -> Result<(), Error> {
        self.client
            .delete(
                key_prefix,
                Some(etcd_client::DeleteOptions::new().with_prefix()),
            )
            .await
            .context(Delete {
                key: key_prefix.to_string(),
            })?;
        Ok(())
    }
}

#[async_trait]
impl StoreObj for Etcd {
    async fn put_obj<O: StorableObject>(&mut self, object: &O) -> Result<(), Error> {
        let key = object.key().key();
        let vec_value = serde_json::to_vec(object).context(SerialiseValue)?;
        self.client.put(key.clone(), vec_value, None).await.context(Put {
            key,
            value: serde_json::to_string(object).context(SerialiseValue)?,
        })?;
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
impl Store for Etcd {
    async fn online(&mut self) -> bool {
        self.client.status().await.is_ok()
    }
}
