pub mod config;
pub mod connection;
pub mod decode;
pub mod discovery;
pub mod error;
pub mod remote;

#[cfg(test)]
mod tests;

pub const OPERATOR_DEFAULT_ADDRESS: &str = "127.0.0.1";
pub const OPERATOR_DEFAULT_PORT: u16 = 3999;

/// Reserved character the operator writes after every response.
pub const PROMPT: char = '>';

/// Script variable the operator expands to the directory it was launched from.
pub const LAUNCH_DIR_VARIABLE: &str = "$BCI2000LAUNCHDIR";
pub const CHANGE_TO_LAUNCH_DIR_COMMAND: &str =
    const_format::concatcp!("change directory ", LAUNCH_DIR_VARIABLE);
