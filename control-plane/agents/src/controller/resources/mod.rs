use parking_lot::Mutex;
use rr_port::types::v0::{
    store::{
        group::ReplicationGroupSpec,
        pair::ReplicationPairSpec,
        set::ReplicationSetSpec,
        system::{RdfGroupSpec, StorageSystemSpec},
        volume::VolumeSpec,
    },
    transport::{GroupId, PairId, RdfGroupId, SetId, SystemId, VolumeId},
};
use std::{hash::Hash, ops::Deref, sync::Arc};

/// Generic resources map.
pub mod resource_map;
/// The resource specs held by the registry.
pub mod specs;

/// Ref-counted resource wrapped with a mutex.
#[derive(Debug, Clone)]
pub struct ResourceMutex<T> {
    inner: Arc<ResourceMutexInner<T>>,
}
/// Inner Resource which holds the mutex and an immutable value for peeking
/// into immutable fields such as identification fields.
#[derive(Debug)]
pub struct ResourceMutexInner<T> {
    resource: Mutex<T>,
    immutable_peek: Arc<T>,
}
impl<T: Clone> From<T> for ResourceMutex<T> {
    fn from(resource: T) -> Self {
        let immutable_peek = Arc::new(resource.clone());
        let resource = Mutex::new(resource);
        Self {
            inner: Arc::new(ResourceMutexInner {
                resource,
                immutable_peek,
            }),
        }
    }
}
impl<T> Deref for ResourceMutex<T> {
    type Target = Mutex<T>;
    fn deref(&self) -> &Self::Target {
        &self.inner.resource
    }
}
impl<T: Clone> ResourceMutex<T> {
    /// Peek the initial resource value without locking.
    /// # Note:
    /// This is only useful for immutable fields, such as the resource
    /// identifier.
    pub fn immutable_ref(&self) -> &Arc<T> {
        &self.inner.immutable_peek
    }
}

/// Uniquely identify a resource within its resource map.
pub trait ResourceUid {
    /// The type of the unique identifier.
    type Uid: Eq + Hash + Clone;
    /// The unique identifier of the resource.
    fn uid(&self) -> &Self::Uid;
}

impl ResourceUid for ReplicationSetSpec {
    type Uid = SetId;
    fn uid(&self) -> &Self::Uid {
        &self.id
    }
}
impl ResourceUid for ReplicationGroupSpec {
    type Uid = GroupId;
    fn uid(&self) -> &Self::Uid {
        &self.id
    }
}
impl ResourceUid for ReplicationPairSpec {
    type Uid = PairId;
    fn uid(&self) -> &Self::Uid {
        &self.id
    }
}
impl ResourceUid for VolumeSpec {
    type Uid = VolumeId;
    fn uid(&self) -> &Self::Uid {
        &self.id
    }
}
impl ResourceUid for StorageSystemSpec {
    type Uid = SystemId;
    fn uid(&self) -> &Self::Uid {
        &self.id
    }
}
impl ResourceUid for RdfGroupSpec {
    type Uid = RdfGroupId;
    fn uid(&self) -> &Self::Uid {
        &self.id
    }
}
