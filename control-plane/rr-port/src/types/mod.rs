/// Version 0 of the types.
pub mod v0;
