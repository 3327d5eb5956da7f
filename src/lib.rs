#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod selection;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
