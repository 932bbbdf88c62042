use crate::ModelError;
use crate::declaration::validate_identifier;

use serde::{Deserialize, Serialize};

/// Flag every module is started with so it connects to the local operator.
pub const LOCAL_FLAG: &str = "--local";

const ARGUMENT_PREFIX: &str = "--";

/// An operator module (signal source, signal processing, application) and
/// the arguments it is started with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ModuleDescriptor {
    pub fn new<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    #[track_caller]
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_identifier("Module", &self.name)
    }

    /// Normalized, space-joined argument list.
    ///
    /// Every argument becomes a single `--`-prefixed token, duplicates are
    /// dropped (first occurrence wins) and `--local` is appended unless the
    /// caller already passed it.
    pub fn argument_string(&self) -> String {
        let mut tokens: Vec<String> = Vec::with_capacity(self.args.len() + 1);

        for arg in &self.args {
            let Some(token) = normalize_argument(arg) else {
                continue;
            };
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }

        if !tokens.iter().any(|t| t == LOCAL_FLAG) {
            tokens.push(LOCAL_FLAG.to_string());
        }

        tokens.join(" ")
    }

    /// `start executable <name> <args>`
    pub fn to_command(&self) -> String {
        format!("start executable {} {}", self.name, self.argument_string())
    }
}

fn normalize_argument(arg: &str) -> Option<String> {
    let bare = arg.trim().trim_start_matches('-');
    if bare.is_empty() {
        return None;
    }
    Some(format!("{ARGUMENT_PREFIX}{bare}"))
}
