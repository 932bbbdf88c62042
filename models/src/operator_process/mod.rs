mod builder;

pub use builder::OperatorProcessBuilder;

/// A running operator process, found by port lookup or launched by us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorProcess {
    pub pid: u32,
    pub port: u16,
    pub name: String,
    pub command: String,
    /// Whether this client launched the process (and may therefore stop it).
    pub owned: bool,
}
