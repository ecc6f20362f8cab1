//! @ai:module:intent Orchestrate one benchmark session from validation to record
//! @ai:module:layer application
//! @ai:module:public_api BenchmarkSession, PreparedInvocation, InferenceCommand, SessionOutcome, LaunchedSession
//! @ai:module:stateless false

use crate::config::{RunConfiguration, ToolConfig};
use crate::error::{Error, Result};
use crate::launcher::{InferenceLauncher, LaunchOutcome};
use crate::probe::EnvironmentProbe;
use crate::record::{Baseline, BenchmarkRecord, GenerationReport};
use crate::store::RecordStore;
use crate::template::TemplateRegistry;
use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

/// @ai:intent Command line for the external inference tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for InferenceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// @ai:intent Everything the operator needs to run the inference step by hand
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedInvocation {
    pub model_name: String,
    pub prompt: String,
    /// Name of the applied template rule, if any.
    pub template: Option<&'static str>,
    pub baseline: Baseline,
    pub command: InferenceCommand,
    pub monitor_script: String,
    pub output: PathBuf,
}

impl PreparedInvocation {
    /// @ai:intent Log file name suggested for the NPU monitor
    /// @ai:effects pure
    pub fn monitor_log(&self) -> String {
        let stem = self
            .model_name
            .strip_suffix(".rkllm")
            .unwrap_or(&self.model_name);
        format!("{stem}_benchmark.log")
    }

    /// @ai:intent Two-terminal instructions for a manual run
    /// @ai:effects pure
    pub fn manual_steps(&self) -> Vec<String> {
        vec![
            format!("Terminal 1: {} {}", self.monitor_script, self.monitor_log()),
            format!("Terminal 2: {}", self.command),
            format!("Then paste: {}", self.prompt),
        ]
    }
}

/// @ai:intent Where a session stopped
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// Timing is not yet known; the operator runs the tool manually.
    InvocationPrepared(PreparedInvocation),
    /// Timing was reported and the record has been appended.
    RecordComplete(BenchmarkRecord),
}

/// @ai:intent How a session run through the launcher ended
#[derive(Debug)]
pub enum LaunchedSession {
    /// Operator interrupt; nothing was persisted.
    Interrupted,
    Finished {
        status: ExitStatus,
        elapsed: Duration,
        /// Present when a token count was supplied.
        record: Option<BenchmarkRecord>,
    },
}

/// @ai:intent Runs benchmark sessions against an environment probe
pub struct BenchmarkSession<P: EnvironmentProbe> {
    probe: Arc<P>,
    registry: TemplateRegistry,
    store: RecordStore,
    tool: ToolConfig,
}

impl<P: EnvironmentProbe> BenchmarkSession<P> {
    /// @ai:effects pure
    pub fn new(probe: Arc<P>, registry: TemplateRegistry, tool: ToolConfig) -> Self {
        Self {
            probe,
            registry,
            store: RecordStore::new(),
            tool,
        }
    }

    /// @ai:intent Fail fast on missing model or tool, before any sampling
    /// @ai:effects fs:read, io
    fn validate(&self, config: &RunConfiguration) -> Result<()> {
        if !config.model_path.is_file() {
            return Err(Error::ModelNotFound {
                path: config.model_path.clone(),
            });
        }
        if !self.probe.tool_available(&self.tool.executable) {
            return Err(Error::ToolNotFound {
                tool: self.tool.executable.clone(),
            });
        }
        Ok(())
    }

    /// @ai:intent Apply the model's chat template when enabled
    /// @ai:effects pure
    fn prepare_prompt(&self, config: &RunConfiguration) -> (String, Option<&'static str>) {
        if !config.apply_template {
            return (config.prompt.clone(), None);
        }
        let model_name = config.model_name();
        match self.registry.rule_for(&model_name) {
            Some(rule) => ((rule.format)(&config.prompt), Some(rule.name)),
            None => (config.prompt.clone(), None),
        }
    }

    /// @ai:intent Capture memory and accelerator load; both are best-effort
    /// @ai:effects io
    fn sample_baseline(&self) -> Baseline {
        Baseline {
            memory: self.probe.sample_memory(),
            accelerator_load: self.probe.sample_accelerator_load(),
        }
    }

    /// @ai:intent Run the session up to the point where the tool must be launched
    /// @ai:post no resource sampling happens unless validation passed
    /// @ai:effects fs:read, io
    pub fn prepare(&self, config: &RunConfiguration) -> Result<PreparedInvocation> {
        self.validate(config)?;

        let model_name = config.model_name();
        tracing::info!(
            "Model: {} (max tokens {}, max context {})",
            model_name,
            config.max_tokens,
            config.max_context
        );

        let (prompt, template) = self.prepare_prompt(config);
        match template {
            Some(name) => tracing::info!("Applied {} chat template for {}", name, model_name),
            None if config.apply_template => {
                tracing::info!("No chat template registered for {}; using raw prompt", model_name)
            }
            None => tracing::info!("Chat template disabled"),
        }

        let baseline = self.sample_baseline();
        tracing::info!("Baseline RAM: {}", baseline.memory_display());
        tracing::info!("Baseline NPU: {}", baseline.accelerator_display());

        let command = InferenceCommand {
            program: self.tool.executable.clone(),
            args: vec![
                config.model_path.to_string_lossy().into_owned(),
                config.max_tokens.to_string(),
                config.max_context.to_string(),
            ],
        };

        Ok(PreparedInvocation {
            model_name,
            prompt,
            template,
            baseline,
            command,
            monitor_script: self.tool.monitor_script.clone(),
            output: config.output.clone(),
        })
    }

    /// @ai:intent Finish a prepared session with reported timing and persist the record
    /// @ai:effects fs:write, time
    pub fn complete(
        &self,
        prepared: PreparedInvocation,
        report: &GenerationReport,
    ) -> Result<BenchmarkRecord> {
        let record = BenchmarkRecord::assemble(
            prepared.model_name,
            prepared.prompt,
            &prepared.baseline,
            report,
        );
        self.store.append(&record, &prepared.output)?;
        Ok(record)
    }

    /// @ai:intent Launch the prepared invocation and record it once the tool exits
    /// @ai:post an interrupted launch writes no record
    /// @ai:effects io, fs:write, time
    pub async fn launch_and_record(
        &self,
        prepared: PreparedInvocation,
        launcher: &InferenceLauncher,
        total_tokens: Option<u64>,
        duration_secs: Option<f64>,
    ) -> Result<LaunchedSession> {
        let (status, elapsed) = match launcher.launch(&prepared.command).await? {
            LaunchOutcome::Interrupted => {
                tracing::info!("Session for {} interrupted; no record written", prepared.model_name);
                return Ok(LaunchedSession::Interrupted);
            }
            LaunchOutcome::Exited { status, elapsed } => (status, elapsed),
        };

        if !status.success() {
            tracing::warn!("{} exited with {}", prepared.command.program, status);
        }

        let record = match total_tokens {
            Some(tokens) => {
                let secs = duration_secs.unwrap_or(elapsed.as_secs_f64());
                Some(self.complete(prepared, &GenerationReport::new(tokens, secs)?)?)
            }
            None => None,
        };

        Ok(LaunchedSession::Finished {
            status,
            elapsed,
            record,
        })
    }

    /// @ai:intent Run a full session; completes the record only when timing is supplied
    /// @ai:effects fs:read, fs:write, io
    pub fn run_session(
        &self,
        config: &RunConfiguration,
        report: Option<GenerationReport>,
    ) -> Result<SessionOutcome> {
        let prepared = self.prepare(config)?;
        match report {
            Some(report) => Ok(SessionOutcome::RecordComplete(
                self.complete(prepared, &report)?,
            )),
            None => Ok(SessionOutcome::InvocationPrepared(prepared)),
        }
    }
}
