/// Built-in recognition backends.
pub mod google;
