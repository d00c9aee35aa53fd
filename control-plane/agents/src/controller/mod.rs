/// The registry which owns the resource specs and the persistent store
/// handle.
pub mod registry;
/// The resource specs and their locked wrapper.
pub mod resources;
