//! Command dispatch and handler modules.

pub mod config_cmd;
mod crud;
mod practices;
mod sessions;
mod util;

use practrack_core::{ControllerConfig, Practice, PracticeSession};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Route an entity command to the generic CRUD handler for its type.
pub async fn dispatch(
    cmd: Command,
    config: ControllerConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Sessions(args) => crud::handle::<PracticeSession>(config, args.command, global).await,
        Command::Practices(args) => crud::handle::<Practice>(config, args.command, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions are handled before dispatch".into(),
        )),
    }
}
