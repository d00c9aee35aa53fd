use serde::{Deserialize, Serialize};

#[macro_export]
macro_rules! impl_string_id_inner {
    ($Name:ident, $Doc:literal) => {
        #[doc = $Doc]
        #[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq, Hash)]
        pub struct $Name(String);

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl $Name {
            /// Get the identifier as a string slice.
            pub fn as_str<'a>(&'a self) -> &'a str {
                self.0.as_str()
            }
        }

        impl From<&str> for $Name {
            fn from(id: &str) -> Self {
                $Name::from(id)
            }
        }
        impl From<String> for $Name {
            fn from(id: String) -> Self {
                $Name::from(id.as_str())
            }
        }
        impl From<&$Name> for $Name {
            fn from(id: &$Name) -> $Name {
                id.clone()
            }
        }
        impl From<$Name> for String {
            fn from(id: $Name) -> String {
                id.to_string()
            }
        }
        impl From<&$Name> for String {
            fn from(id: &$Name) -> String {
                id.to_string()
            }
        }
    };
}

#[macro_export]
macro_rules! impl_string_id {
    ($Name:ident, $Doc:literal) => {
        impl_string_id_inner!($Name, $Doc);
        impl Default for $Name {
            /// Generates new blank identifier.
            fn default() -> Self {
                $Name("".to_string())
            }
        }
        impl $Name {
            /// Build Self from a string-like id.
            pub fn from<T: Into<String>>(id: T) -> Self {
                $Name(id.into())
            }
        }
    };
}

#[macro_export]
macro_rules! impl_string_uuid_inner {
    ($Name:ident, $Doc:literal) => {
        #[doc = $Doc]
        #[derive(Debug, Clone, Eq, PartialEq, Hash)]
        pub struct $Name(uuid::Uuid, String);

        impl Serialize for $Name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $Name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let uuid = uuid::Uuid::deserialize(deserializer)?;
                Ok($Name(uuid, uuid.to_string()))
            }
        }

        impl std::ops::Deref for $Name {
            type Target = uuid::Uuid;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl $Name {
            /// Get the identifier as a string slice.
            pub fn as_str<'a>(&'a self) -> &'a str {
                self.1.as_str()
            }
            /// Get a reference to the `uuid::Uuid` container.
            pub fn uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl From<&$Name> for $Name {
            fn from(id: &$Name) -> $Name {
                id.clone()
            }
        }
        impl From<$Name> for String {
            fn from(id: $Name) -> String {
                id.to_string()
            }
        }
        impl From<&$Name> for String {
            fn from(id: &$Name) -> String {
                id.to_string()
            }
        }
        impl From<&uuid::Uuid> for $Name {
            fn from(uuid: &uuid::Uuid) -> $Name {
                $Name(*uuid, uuid.to_string())
            }
        }
        impl From<uuid::Uuid> for $Name {
            fn from(uuid: uuid::Uuid) -> $Name {
                $Name::from(&uuid)
            }
        }
        impl std::convert::TryFrom<&str> for $Name {
            type Error = uuid::Error;
            fn try_from(value: &str) -> Result<Self, Self::Error> {
                let uuid: uuid::Uuid = std::str::FromStr::from_str(value)?;
                Ok($Name::from(uuid))
            }
        }
    };
}

#[macro_export]
macro_rules! impl_string_uuid {
    ($Name:ident, $Doc:literal) => {
        impl_string_uuid_inner!($Name, $Doc);
        impl Default for $Name {
            /// Generates new blank identifier.
            fn default() -> Self {
                let uuid = uuid::Uuid::default();
                $Name(uuid, uuid.to_string())
            }
        }
        impl $Name {
            /// Generates new random identifier.
            pub fn new() -> Self {
                let uuid = uuid::Uuid::new_v4();
                $Name(uuid, uuid.to_string())
            }
        }
    };
}

impl_string_uuid!(SetId, "UUID of a replication set");
impl_string_uuid!(GroupId, "UUID of a replication group");
impl_string_uuid!(PairId, "UUID of a replication pair");
impl_string_uuid!(VolumeId, "UUID of a storage volume element");
impl_string_uuid!(CgId, "UUID of a storage consistency group");
impl_string_uuid!(TaskId, "UUID of an asynchronous operation task");

impl_string_id!(SystemId, "Identifier of a storage system");
impl_string_id!(RdfGroupId, "Identifier of an array remote director group");
impl_string_id!(NativeId, "Array-facing identifier derived from device serials/ids");
