use crate::discovery::port::wait_for_port;
use crate::error::launch::LaunchError;

use common::ErrorLocation;
use models::{OperatorProcess, OperatorProcessBuilder};

use std::panic::Location;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use log::{debug, info, trace, warn};
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::process::Command as TokioCommand;
use tokio::spawn as TokioSpawn;

const TELNET_FLAG: &str = "--Telnet";
const STARTUP_IDLE_FLAG: &str = "--StartupIdle";

pub(crate) fn telnet_endpoint(address: &str, port: u16) -> String {
    format!("{address}:{port}")
}

pub(crate) fn build_launch_command(executable: &Path, address: &str, port: u16) -> TokioCommand {
    let mut cmd = TokioCommand::new(executable);
    cmd.arg(TELNET_FLAG)
        .arg(telnet_endpoint(address, port))
        .arg(STARTUP_IDLE_FLAG)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = executable.parent()
        && !dir.as_os_str().is_empty()
    {
        cmd.current_dir(dir);
    }
    cmd
}

/// Launch an operator in telnet mode and wait until its port accepts connections.
///
/// The operator is started idle, so no modules run until a client issues
/// `startup system`. Output is forwarded to the log at trace level. If the
/// port does not open within `max_elapsed` the child is killed.
///
/// # Returns
///
/// * `Ok(OperatorProcess)` - Operator launched and listening; marked as owned
/// * `Err(LaunchError)` - Spawn failed or the port never opened
pub async fn launch_operator(
    executable: &Path,
    address: &str,
    port: u16,
    max_elapsed: Duration,
) -> Result<OperatorProcess, LaunchError> {
    info!(
        "Launching operator {} on {}",
        executable.display(),
        telnet_endpoint(address, port)
    );

    let mut child = build_launch_command(executable, address, port)
        .spawn()
        .map_err(|e| LaunchError::Spawn {
            message: format!("Failed to launch {}: {e}", executable.display()),
            location: ErrorLocation::from(Location::caller()),
            source: Box::new(e),
        })?;

    let pid = child.id().unwrap_or_default();
    debug!("Spawned operator (PID: {pid})");

    if let Some(stdout) = child.stdout.take() {
        TokioSpawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                trace!("Operator stdout: {line}");
            }
        });
    }

    if let Some(stderr) = child.stderr.take() {
        TokioSpawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                trace!("Operator stderr: {line}");
            }
        });
    }

    if let Err(e) = wait_for_port(address, port, max_elapsed).await {
        warn!("Operator port never opened, killing launched operator (PID: {pid})");
        let _ = child.kill().await;
        return Err(e.into());
    }

    let name = executable
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| executable.display().to_string());

    let command = format!(
        "{} {TELNET_FLAG} {} {STARTUP_IDLE_FLAG}",
        executable.display(),
        telnet_endpoint(address, port)
    );

    info!("Operator ready on {} (PID: {pid})", telnet_endpoint(address, port));

    // Without kill_on_drop the operator outlives the handle; tokio reaps it once it exits
    drop(child);

    let operator = OperatorProcessBuilder::default()
        .with_pid(pid)
        .with_port(port)
        .with_name(name)
        .with_command(command)
        .with_owned(true)
        .build()?;

    Ok(operator)
}
