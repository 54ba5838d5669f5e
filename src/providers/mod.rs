pub mod aktools;

pub use aktools::AkToolsProvider;
