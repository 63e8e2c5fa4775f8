// Commands of the interactive shell
pub mod parser;
pub mod render;
pub mod shell;

// Re-export the shell entry points
pub use parser::{Command, CommandError, parse_command};
pub use render::{HELP, render_screen};
pub use shell::{Shell, ShellResponse};
