//! @ai:module:intent Benchmark record and sampled-value types
//! @ai:module:layer domain
//! @ai:module:public_api BenchmarkRecord, Sample, GenerationReport, Baseline, UNAVAILABLE
//! @ai:module:stateless true

use crate::error::{Error, Result};
use crate::probe::MemoryUsage;

/// Placeholder written wherever a value could not be measured.
pub const UNAVAILABLE: &str = "N/A";

/// @ai:intent Outcome of a best-effort measurement
#[derive(Debug, Clone, PartialEq)]
pub enum Sample<T> {
    Present(T),
    Unavailable,
}

impl<T> Sample<T> {
    /// @ai:effects pure
    pub fn is_present(&self) -> bool {
        matches!(self, Sample::Present(_))
    }

    /// @ai:effects pure
    pub fn as_ref(&self) -> Sample<&T> {
        match self {
            Sample::Present(value) => Sample::Present(value),
            Sample::Unavailable => Sample::Unavailable,
        }
    }

    /// @ai:effects pure
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Sample<U> {
        match self {
            Sample::Present(value) => Sample::Present(f(value)),
            Sample::Unavailable => Sample::Unavailable,
        }
    }

    /// @ai:effects pure
    pub fn into_option(self) -> Option<T> {
        match self {
            Sample::Present(value) => Some(value),
            Sample::Unavailable => None,
        }
    }

    /// @ai:intent Render for output, substituting the N/A sentinel when absent
    /// @ai:effects pure
    pub fn display_with<F: FnOnce(&T) -> String>(&self, f: F) -> String {
        match self {
            Sample::Present(value) => f(value),
            Sample::Unavailable => UNAVAILABLE.to_string(),
        }
    }
}

impl<T> From<Option<T>> for Sample<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Sample::Unavailable, Sample::Present)
    }
}

/// @ai:intent Resource state captured immediately before generation
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    pub memory: Sample<MemoryUsage>,
    pub accelerator_load: Sample<String>,
}

impl Baseline {
    /// @ai:effects pure
    pub fn memory_display(&self) -> String {
        self.memory
            .display_with(|m| format!("{}GB / {}GB", m.used_gb, m.total_gb))
    }

    /// @ai:effects pure
    pub fn accelerator_display(&self) -> String {
        self.accelerator_load.display_with(|load| load.clone())
    }
}

/// @ai:intent Timing data reported by the external monitoring side channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationReport {
    pub total_tokens: u64,
    pub duration_seconds: f64,
}

impl GenerationReport {
    /// @ai:intent Validate and build a report
    /// @ai:pre duration_seconds is finite and not negative
    /// @ai:effects pure
    pub fn new(total_tokens: u64, duration_seconds: f64) -> Result<Self> {
        if !duration_seconds.is_finite() || duration_seconds < 0.0 {
            return Err(Error::InvalidReport(format!(
                "duration must be a non-negative number of seconds, got {duration_seconds}"
            )));
        }
        Ok(Self {
            total_tokens,
            duration_seconds,
        })
    }

    /// @ai:intent Generation throughput; absent for a zero-length generation phase
    /// @ai:effects pure
    pub fn tokens_per_second(&self) -> Sample<f64> {
        if self.duration_seconds > 0.0 {
            Sample::Present(self.total_tokens as f64 / self.duration_seconds)
        } else {
            Sample::Unavailable
        }
    }
}

/// @ai:intent One immutable row describing a single inference session
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkRecord {
    pub timestamp: String,
    pub model: String,
    pub tokens_per_second: Sample<f64>,
    pub total_tokens: u64,
    pub duration_seconds: f64,
    pub ram_used_gb: Sample<u64>,
    /// Not a log column; kept for in-process consumers.
    pub ram_total_gb: Sample<u64>,
    pub npu_load: Sample<String>,
    pub prompt: String,
}

impl BenchmarkRecord {
    /// Column order of the benchmark log.
    pub const FIELDS: [&'static str; 8] = [
        "timestamp",
        "model",
        "tokens_per_second",
        "total_tokens",
        "duration_seconds",
        "ram_used_gb",
        "npu_load",
        "prompt",
    ];

    /// @ai:intent Assemble a record from the baseline and the reported timing
    /// @ai:effects time
    pub fn assemble(
        model: String,
        prompt: String,
        baseline: &Baseline,
        report: &GenerationReport,
    ) -> Self {
        let memory = baseline.memory.clone();
        Self {
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            model,
            tokens_per_second: report.tokens_per_second(),
            total_tokens: report.total_tokens,
            duration_seconds: report.duration_seconds,
            ram_used_gb: memory.as_ref().map(|m| m.used_gb),
            ram_total_gb: memory.map(|m| m.total_gb),
            npu_load: baseline.accelerator_load.clone(),
            prompt,
        }
    }

    /// @ai:intent Render the record as log cells in `FIELDS` order
    /// @ai:effects pure
    pub fn to_row(&self) -> [String; 8] {
        [
            self.timestamp.clone(),
            self.model.clone(),
            self.tokens_per_second.display_with(|tps| format!("{tps:.2}")),
            self.total_tokens.to_string(),
            format!("{:.3}", self.duration_seconds),
            self.ram_used_gb.display_with(|gb| gb.to_string()),
            self.npu_load.display_with(|load| load.clone()),
            self.prompt.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn baseline() -> Baseline {
        Baseline {
            memory: Sample::Present(MemoryUsage {
                used_gb: 3,
                total_gb: 15,
            }),
            accelerator_load: Sample::Unavailable,
        }
    }

    #[test]
    fn test_tokens_per_second() {
        let report = GenerationReport::new(512, 64.0).unwrap();
        assert_eq!(report.tokens_per_second(), Sample::Present(8.0));
    }

    #[test]
    fn test_zero_duration_has_no_throughput() {
        let report = GenerationReport::new(10, 0.0).unwrap();
        assert_eq!(report.tokens_per_second(), Sample::Unavailable);
    }

    #[test]
    fn test_negative_duration_rejected() {
        assert!(GenerationReport::new(10, -1.0).is_err());
        assert!(GenerationReport::new(10, f64::NAN).is_err());
    }

    #[test]
    fn test_assemble_copies_baseline() {
        let report = GenerationReport::new(100, 20.0).unwrap();
        let record = BenchmarkRecord::assemble(
            "Qwen2.5-7B.rkllm".to_string(),
            "Hi".to_string(),
            &baseline(),
            &report,
        );

        assert_eq!(record.ram_used_gb, Sample::Present(3));
        assert_eq!(record.ram_total_gb, Sample::Present(15));
        assert_eq!(record.npu_load, Sample::Unavailable);
        assert_eq!(record.tokens_per_second, Sample::Present(5.0));
        assert!(chrono::DateTime::parse_from_rfc3339(&record.timestamp).is_ok());
    }

    #[test]
    fn test_row_uses_sentinel_for_missing_values() {
        let report = GenerationReport::new(0, 0.0).unwrap();
        let mut record = BenchmarkRecord::assemble(
            "model.rkllm".to_string(),
            "prompt".to_string(),
            &baseline(),
            &report,
        );
        record.timestamp = "2026-01-01T00:00:00Z".to_string();
        record.ram_used_gb = Sample::Unavailable;

        assert_eq!(
            record.to_row(),
            [
                "2026-01-01T00:00:00Z".to_string(),
                "model.rkllm".to_string(),
                "N/A".to_string(),
                "0".to_string(),
                "0.000".to_string(),
                "N/A".to_string(),
                "N/A".to_string(),
                "prompt".to_string(),
            ]
        );
    }

    #[test]
    fn test_baseline_display() {
        let base = baseline();
        assert_eq!(base.memory_display(), "3GB / 15GB");
        assert_eq!(base.accelerator_display(), "N/A");
    }
}
