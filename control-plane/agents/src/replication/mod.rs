/// The device driver interface over which link operations are dispatched.
pub mod driver;
/// The link operation orchestration service.
pub mod service;
/// Topology queries over the replication resource specs.
pub mod topology;
/// Operation validity rules.
pub mod validator;

#[cfg(test)]
mod tests;
