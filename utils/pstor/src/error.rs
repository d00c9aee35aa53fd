/// All errors that can be returned from the pstor.
#[derive(Debug, snafu::Snafu)]
#[snafu(visibility(pub), context(suffix(false)))]
pub enum Error {
    /// Failed to connect to the key-value store.
    #[snafu(display("Failed to connect to store. Error {}", source))]
    Connect { source: etcd_client::Error },
    /// Failed to 'put' an entry in the store.
    #[snafu(display(
        "Failed to 'put' entry with key {} and value {:?}. Error {}",
        key,
        value,
        source
    ))]
    Put {
        key: String,
        value: String,
        source: etcd_client::Error,
    },
    /// Failed to 'get' an entry from the store.
    #[snafu(display("Failed to 'get' entry with key {}. Error {}", key, source))]
    Get {
        key: String,
        source: etcd_client::Error,
    },
    /// Failed to 'get' an entry, with the given prefix, from the store.
    #[snafu(display("Failed to 'get' entry with prefix {}. Error {}", prefix, source))]
    GetPrefix {
        prefix: String,
        source: etcd_client::Error,
    },
    /// Failed to find an entry with the given key.
    #[snafu(display("Entry with key {} not found.", key))]
    MissingEntry { key: String },
    /// Failed to 'delete' an entry from the store.
    #[snafu(display("Failed to 'delete' entry with key {}. Error {}", key, source))]
    Delete {
        key: String,
        source: etcd_client::Error,
    },
    /// Failed to get value as a string.
    #[snafu(display("Failed to get value as string. Error {}", source))]
    ValueString { source: etcd_client::Error },
    /// Failed to deserialise value.
    #[snafu(display("Failed to deserialise value {}. Error {}", value, source))]
    DeserialiseValue {
        value: String,
        source: serde_json::Error,
    },
    /// Failed to serialise value.
    #[snafu(display("Failed to serialise value. Error {}", source))]
    SerialiseValue { source: serde_json::Error },
    /// Failed to run operation within a timeout.
    #[snafu(display("Timed out during {} operation after {:?}", operation, timeout))]
    Timeout {
        operation: String,
        timeout: std::time::Duration,
    },
    /// Paged queries require a sane page size.
    #[snafu(display("Minimum paged value is 2"))]
    PagedMinimum,
}
