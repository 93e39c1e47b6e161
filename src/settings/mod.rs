//! Settings come from a TOML file layered with `REGISTRAR__*` environment
//! variables; the CLI only picks the file and the command.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
