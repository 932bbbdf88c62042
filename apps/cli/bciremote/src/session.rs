//! Runs one command-line invocation against the operator.
//!
//! The protocol layer is synchronous, so the exchange with the operator runs
//! on a blocking worker; launching the operator and waiting for its port run
//! on the async runtime.

use crate::cli::{Cli, Commands};
use crate::error::BciRemoteError;

use remote_core::config::{SessionConfig, default_session_path};
use remote_core::connection::Connection;
use remote_core::discovery::launch::launch_operator;
use remote_core::discovery::port::{is_port_reachable, wait_for_port_closed};
use remote_core::discovery::process::{discover_on_port, stop_pid};
use remote_core::remote::Remote;

use std::path::PathBuf;

use log::{debug, info, warn};
use tokio::task::{JoinError, spawn_blocking};

/// Load the session named on the command line, or the default one.
pub fn load_session(cli: &Cli) -> Result<SessionConfig, BciRemoteError> {
    let path: PathBuf = match &cli.session {
        Some(path) => path.clone(),
        None => default_session_path()?,
    };

    debug!("Using session file {}", path.display());
    let mut config = SessionConfig::load(&path)?;

    if cli.verbose {
        config.connection.debug = true;
    }

    Ok(config)
}

/// Make sure something is listening on the operator port, launching it if configured.
pub async fn ensure_operator(config: &SessionConfig) -> Result<(), BciRemoteError> {
    let operator = &config.operator;

    if is_port_reachable(&operator.address, operator.port).await {
        match discover_on_port(operator.port) {
            Ok(Some(process)) => debug!(
                "Operator on port {} is {} (PID: {})",
                operator.port, process.name, process.pid
            ),
            Ok(None) => debug!("Operator on port {} is not a local process", operator.port),
            Err(e) => debug!("Could not identify operator process: {e}"),
        }
        return Ok(());
    }

    let Some(executable) = &operator.executable else {
        return Err(BciRemoteError::app(format!(
            "No operator is listening on {}:{} and no executable is configured",
            operator.address, operator.port
        )));
    };

    let process = launch_operator(
        executable,
        &operator.address,
        operator.port,
        operator.launch_timeout(),
    )
    .await?;

    info!("Launched operator {} (PID: {})", process.name, process.pid);
    Ok(())
}

/// Run one subcommand against a reachable operator.
///
/// Returns text to print, if the command produces any.
pub fn execute(
    config: &SessionConfig,
    command: &Commands,
) -> Result<Option<String>, BciRemoteError> {
    let mut remote = Remote::with_default_hooks(Connection::new(config.connection.clone()));
    remote.connect(&config.operator.address, config.operator.port)?;

    let output = match command {
        Commands::Run { start } => {
            config.apply(&mut remote)?;
            remote.set_config()?;

            if *start || config.run.auto_start {
                remote.start_run()?;
            }

            let state = remote.get_system_state()?;
            info!("Operator is {state}");
            Some(state.to_string())
        }
        Commands::State => Some(remote.get_system_state()?.to_string()),
        Commands::Exec { command } => {
            let line = command.join(" ");
            let response = remote.execute(&line)?;
            let trimmed = response.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Commands::Quit => {
            remote.connection_mut().set_terminate_on_disconnect(true);
            None
        }
    };

    remote.disconnect();
    Ok(output)
}

/// Ask the operator to quit, stopping its process if it keeps the port open.
///
/// Nothing listening on the port counts as success.
pub async fn shutdown_operator(config: &SessionConfig) -> Result<(), BciRemoteError> {
    let operator = &config.operator;

    if !is_port_reachable(&operator.address, operator.port).await {
        warn!(
            "No operator listening on {}:{}",
            operator.address, operator.port
        );
        return Ok(());
    }

    let session = config.clone();
    spawn_blocking(move || execute(&session, &Commands::Quit))
        .await
        .map_err(session_task_failed)??;

    let grace = operator.quit_timeout();
    if wait_for_port_closed(&operator.address, operator.port, grace)
        .await
        .is_ok()
    {
        return Ok(());
    }

    warn!(
        "Operator on port {} still listening {grace:?} after Quit",
        operator.port
    );
    let Some(process) = discover_on_port(operator.port)? else {
        return Err(BciRemoteError::app(format!(
            "Operator on {}:{} ignored Quit and is not a local process",
            operator.address, operator.port
        )));
    };

    let pid = process.pid;
    let stopped = spawn_blocking(move || stop_pid(pid, grace))
        .await
        .map_err(session_task_failed)?;

    if stopped {
        info!("Stopped operator {} (PID: {})", process.name, process.pid);
        Ok(())
    } else {
        Err(BciRemoteError::app(format!(
            "Operator {} (PID: {}) ignored Quit and could not be stopped",
            process.name, process.pid
        )))
    }
}

/// Entry point for a parsed command line.
pub async fn run(cli: Cli) -> Result<(), BciRemoteError> {
    let config = load_session(&cli)?;

    if cli.command == Commands::Quit {
        return shutdown_operator(&config).await;
    }

    ensure_operator(&config).await?;

    let command = cli.command.clone();
    let output = spawn_blocking(move || execute(&config, &command))
        .await
        .map_err(session_task_failed)??;

    if let Some(text) = output {
        println!("{text}");
    }

    Ok(())
}

fn session_task_failed(error: JoinError) -> BciRemoteError {
    BciRemoteError::app(format!("Operator session task failed: {error}"))
}
