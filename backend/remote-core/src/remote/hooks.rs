use crate::connection::Connection;
use crate::error::RemoteError;

/// Extension points along the setup sequence.
///
/// Every method defaults to doing nothing. Each receives the live connection
/// so it can issue its own commands (set a window title, declare extra
/// states, watch an expression).
pub trait RemoteHooks {
    /// After the connect handshake. An error fails the connect.
    fn on_operator_connected(&mut self, _connection: &mut Connection) -> Result<(), RemoteError> {
        Ok(())
    }

    /// After all modules reported in.
    ///
    /// Errors are logged and otherwise ignored: the modules are already
    /// running and cannot be taken back.
    fn on_modules_connected(&mut self, _connection: &mut Connection) -> Result<(), RemoteError> {
        Ok(())
    }

    /// After the operator accepted the configuration. An error fails `set_config`.
    fn on_configured(&mut self, _connection: &mut Connection) -> Result<(), RemoteError> {
        Ok(())
    }
}

/// Hooks that do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl RemoteHooks for NoHooks {}
