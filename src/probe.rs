//! @ai:module:intent Detect the inference tool and sample host resource state
//! @ai:module:layer infrastructure
//! @ai:module:public_api EnvironmentProbe, SystemProbe, MockProbe, MemoryUsage, parse_memory_report
//! @ai:module:stateless true

use crate::config::ProbeConfig;
use crate::record::Sample;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};

/// @ai:intent Used/total host memory in whole gigabytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryUsage {
    pub used_gb: u64,
    pub total_gb: u64,
}

/// @ai:intent Sensors the session controller reads from the host
pub trait EnvironmentProbe: Send + Sync {
    /// @ai:intent Check whether an executable resolves on PATH
    fn tool_available(&self, tool: &str) -> bool;

    /// @ai:intent Sample used/total memory; never fails
    fn sample_memory(&self) -> Sample<MemoryUsage>;

    /// @ai:intent Sample accelerator utilisation text; never fails
    fn sample_accelerator_load(&self) -> Sample<String>;
}

/// @ai:intent Parse the `Mem:` line of a `free`-style report
/// @ai:effects pure
pub fn parse_memory_report(report: &str) -> Option<MemoryUsage> {
    let line = report.lines().find(|l| l.trim_start().starts_with("Mem:"))?;
    let mut fields = line.split_whitespace().skip(1);
    let total_gb = fields.next()?.parse().ok()?;
    let used_gb = fields.next()?.parse().ok()?;
    Some(MemoryUsage { used_gb, total_gb })
}

/// @ai:intent Probe backed by real host commands and files
pub struct SystemProbe {
    config: ProbeConfig,
}

impl SystemProbe {
    /// @ai:effects pure
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    /// @ai:intent Run a command and return its stdout when it exits successfully
    /// @ai:effects io
    fn run_for_stdout(program: &str, args: &[&str]) -> Option<String> {
        match Command::new(program).args(args).output() {
            Ok(output) if output.status.success() => {
                Some(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                tracing::debug!(
                    "{} {:?} exited with {}: {}",
                    program,
                    args,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                None
            }
            Err(e) => {
                tracing::debug!("Failed to spawn {}: {}", program, e);
                None
            }
        }
    }

    /// @ai:intent Read the accelerator load file, escalating through `sudo -n` if allowed
    /// @ai:effects fs:read, io
    fn read_load_file(&self) -> Option<String> {
        let path = &self.config.accelerator_load_path;
        match std::fs::read_to_string(path) {
            Ok(content) => Some(content),
            Err(e) if self.config.privileged_read => {
                tracing::debug!("Direct read of {} failed ({}), trying sudo -n", path.display(), e);
                let path = path.to_string_lossy();
                Self::run_for_stdout("sudo", &["-n", "cat", &*path])
            }
            Err(e) => {
                tracing::debug!("Cannot read {}: {}", path.display(), e);
                None
            }
        }
    }
}

impl EnvironmentProbe for SystemProbe {
    /// @ai:effects io
    fn tool_available(&self, tool: &str) -> bool {
        Command::new("which")
            .arg(tool)
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// @ai:effects io
    fn sample_memory(&self) -> Sample<MemoryUsage> {
        let Some((program, args)) = self.config.memory_command.split_first() else {
            tracing::warn!("No memory command configured; RAM will be reported as N/A");
            return Sample::Unavailable;
        };
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        let usage = Self::run_for_stdout(program, &args)
            .as_deref()
            .and_then(parse_memory_report);
        if usage.is_none() {
            tracing::warn!("Memory sample unavailable from `{}`", self.config.memory_command.join(" "));
        }
        usage.into()
    }

    /// @ai:effects fs:read, io
    fn sample_accelerator_load(&self) -> Sample<String> {
        let load = self
            .read_load_file()
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty());
        if load.is_none() {
            tracing::warn!(
                "NPU load unavailable from {}",
                self.config.accelerator_load_path.display()
            );
        }
        load.into()
    }
}

/// @ai:intent Probe with fixed readings that counts how often each sensor is read
pub struct MockProbe {
    tool_present: bool,
    memory: Sample<MemoryUsage>,
    accelerator_load: Sample<String>,
    tool_checks: AtomicUsize,
    samples: AtomicUsize,
}

impl MockProbe {
    /// @ai:effects pure
    pub fn new(
        tool_present: bool,
        memory: Sample<MemoryUsage>,
        accelerator_load: Sample<String>,
    ) -> Self {
        Self {
            tool_present,
            memory,
            accelerator_load,
            tool_checks: AtomicUsize::new(0),
            samples: AtomicUsize::new(0),
        }
    }

    /// @ai:intent Number of tool lookups performed
    pub fn tool_checks(&self) -> usize {
        self.tool_checks.load(Ordering::SeqCst)
    }

    /// @ai:intent Number of resource samples taken (memory and accelerator combined)
    pub fn samples(&self) -> usize {
        self.samples.load(Ordering::SeqCst)
    }
}

impl EnvironmentProbe for MockProbe {
    fn tool_available(&self, _tool: &str) -> bool {
        self.tool_checks.fetch_add(1, Ordering::SeqCst);
        self.tool_present
    }

    fn sample_memory(&self) -> Sample<MemoryUsage> {
        self.samples.fetch_add(1, Ordering::SeqCst);
        self.memory.clone()
    }

    fn sample_accelerator_load(&self) -> Sample<String> {
        self.samples.fetch_add(1, Ordering::SeqCst);
        self.accelerator_load.clone()
    }
}
