//! @ai:module:intent Run the inference tool as a foreground interactive session
//! @ai:module:layer infrastructure
//! @ai:module:public_api InferenceLauncher, LaunchOutcome
//! @ai:module:stateless true

use crate::error::Result;
use crate::session::InferenceCommand;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::signal::unix::{signal, SignalKind};

const SIGINT: i32 = 2;

/// @ai:intent How a launched inference session ended
#[derive(Debug)]
pub enum LaunchOutcome {
    Exited { status: ExitStatus, elapsed: Duration },
    /// Operator pressed Ctrl-C; the tool was terminated.
    Interrupted,
}

/// @ai:intent Spawns the tool with the terminal attached and waits for it or an interrupt
pub struct InferenceLauncher;

impl InferenceLauncher {
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Launch the command and block until it exits or Ctrl-C arrives
    /// @ai:post a child killed by SIGINT is reported as Interrupted
    /// @ai:effects io, time
    pub async fn launch(&self, command: &InferenceCommand) -> Result<LaunchOutcome> {
        tracing::info!("Launching: {}", command);

        // Terminal Ctrl-C reaches the whole foreground group; listen before the child exists.
        let mut interrupt = signal(SignalKind::interrupt())?;

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .kill_on_drop(true)
            .spawn()?;
        let start = Instant::now();

        let exited = tokio::select! {
            status = child.wait() => Some(status?),
            _ = interrupt.recv() => None,
        };

        match exited {
            Some(status) if status.signal() == Some(SIGINT) => {
                tracing::info!("{} stopped by interrupt", command.program);
                Ok(LaunchOutcome::Interrupted)
            }
            Some(status) => {
                let elapsed = start.elapsed();
                tracing::info!("{} exited with {} after {:.1}s", command.program, status, elapsed.as_secs_f64());
                Ok(LaunchOutcome::Exited { status, elapsed })
            }
            None => {
                if let Err(e) = child.kill().await {
                    tracing::debug!("Failed to stop {}: {}", command.program, e);
                }
                Ok(LaunchOutcome::Interrupted)
            }
        }
    }
}

impl Default for InferenceLauncher {
    fn default() -> Self {
        Self::new()
    }
}
