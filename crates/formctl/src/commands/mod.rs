//! Command handlers, one module per subcommand.

pub mod check;
pub mod completion;
pub mod config_cmd;
pub mod eval;
pub mod formula;
pub mod store;
pub mod suggest;
