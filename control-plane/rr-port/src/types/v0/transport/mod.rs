pub mod misc;
pub mod replication;

pub use misc::*;
pub use replication::*;

pub use crate::{impl_string_id, impl_string_id_inner, impl_string_uuid, impl_string_uuid_inner};
