#![allow(clippy::crate_in_macro_def)]

/// Common types for the various resources used by the control-plane internal
/// components.
pub mod types;

/// Re-export pstor types and modules.
pub use pstor;

/// Helper to convert from Vec<F> into Vec<T>.
pub trait IntoVec<T>: Sized {
    /// Performs the conversion.
    fn into_vec(self) -> Vec<T>;
}

impl<F: Into<T>, T> IntoVec<T> for Vec<F> {
    fn into_vec(self) -> Vec<T> {
        self.into_iter().map(Into::into).collect()
    }
}
