//! Test harness for CLI integration tests.
//!
//! Provides isolated vaults in temp directories, a builder for note files,
//! and CLI assertion helpers using `assert_cmd`.

mod command;
mod env;
mod note;

#[allow(unused_imports)]
pub use command::ZettelCommand;
#[allow(unused_imports)]
pub use env::TestEnv;
#[allow(unused_imports)]
pub use note::TestNote;

/// Root timestamp shared by most fixtures.
#[allow(dead_code)]
pub const ROOT: &str = "20240101000000000";
