//! @ai:module:intent Read a benchmark log back and summarise it per model
//! @ai:module:layer application
//! @ai:module:public_api ReportReader, ModelSummary
//! @ai:module:stateless true

use crate::error::Result;
use crate::record::UNAVAILABLE;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// Columns needed for the summary; other columns are ignored.
#[derive(Debug, Deserialize)]
struct LogRow {
    model: String,
    tokens_per_second: String,
    total_tokens: u64,
    duration_seconds: String,
}

/// @ai:intent Aggregated results for one model across all logged runs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub model: String,
    pub runs: u32,
    /// Runs with a measured throughput.
    pub measured_runs: u32,
    pub total_tokens: u64,
    pub mean_tokens_per_second: Option<f64>,
    pub best_tokens_per_second: Option<f64>,
    pub mean_duration_seconds: Option<f64>,
    #[serde(skip)]
    duration_sum: f64,
    #[serde(skip)]
    duration_count: u32,
    #[serde(skip)]
    tps_sum: f64,
}

impl ModelSummary {
    fn new(model: String) -> Self {
        Self {
            model,
            runs: 0,
            measured_runs: 0,
            total_tokens: 0,
            mean_tokens_per_second: None,
            best_tokens_per_second: None,
            mean_duration_seconds: None,
            duration_sum: 0.0,
            duration_count: 0,
            tps_sum: 0.0,
        }
    }

    /// @ai:effects state:write
    fn add(&mut self, row: &LogRow) {
        self.runs += 1;
        self.total_tokens += row.total_tokens;

        if let Some(duration) = parse_measured(&row.duration_seconds) {
            self.duration_sum += duration;
            self.duration_count += 1;
            self.mean_duration_seconds = Some(self.duration_sum / self.duration_count as f64);
        }

        if let Some(tps) = parse_measured(&row.tokens_per_second) {
            self.measured_runs += 1;
            self.tps_sum += tps;
            self.mean_tokens_per_second = Some(self.tps_sum / self.measured_runs as f64);
            self.best_tokens_per_second = Some(
                self.best_tokens_per_second
                    .map_or(tps, |best| best.max(tps)),
            );
        }
    }
}

/// @ai:intent Parse a numeric cell, treating the sentinel and garbage as unmeasured
/// @ai:effects pure
fn parse_measured(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() || cell == UNAVAILABLE {
        return None;
    }
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// @ai:intent Summarises benchmark logs
pub struct ReportReader;

impl ReportReader {
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Group logged runs by model in first-seen order
    /// @ai:pre path is a log written by RecordStore
    /// @ai:effects fs:read
    pub fn summarize(&self, path: &Path) -> Result<Vec<ModelSummary>> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut summaries: Vec<ModelSummary> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for row in reader.deserialize::<LogRow>() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    tracing::warn!("Skipping malformed row in {}: {}", path.display(), e);
                    continue;
                }
            };

            let slot = *index.entry(row.model.clone()).or_insert_with(|| {
                summaries.push(ModelSummary::new(row.model.clone()));
                summaries.len() - 1
            });
            summaries[slot].add(&row);
        }

        Ok(summaries)
    }

    /// @ai:intent Render summaries as a fixed-width text table
    /// @ai:effects pure
    pub fn render_table(&self, summaries: &[ModelSummary]) -> String {
        fn cell(value: Option<f64>) -> String {
            value.map_or_else(|| UNAVAILABLE.to_string(), |v| format!("{v:.2}"))
        }

        let mut output = String::new();
        writeln!(
            output,
            "{:<40} {:>5} {:>10} {:>10} {:>12}",
            "Model", "Runs", "Mean t/s", "Best t/s", "Mean dur(s)"
        )
        .unwrap();
        writeln!(output, "{}", "-".repeat(81)).unwrap();

        for summary in summaries {
            writeln!(
                output,
                "{:<40} {:>5} {:>10} {:>10} {:>12}",
                summary.model,
                summary.runs,
                cell(summary.mean_tokens_per_second),
                cell(summary.best_tokens_per_second),
                cell(summary.mean_duration_seconds),
            )
            .unwrap();
        }

        output
    }

    /// @ai:intent Render summaries as pretty JSON
    /// @ai:effects pure
    pub fn render_json(&self, summaries: &[ModelSummary]) -> Result<String> {
        Ok(serde_json::to_string_pretty(summaries)?)
    }
}

impl Default for ReportReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    const LOG: &str = "\
timestamp,model,tokens_per_second,total_tokens,duration_seconds,ram_used_gb,npu_load,prompt
2026-01-19T10:00:00Z,Qwen2.5-7B.rkllm,5.00,600,120.000,2,N/A,Hi
2026-01-19T10:05:00Z,Llama-3.1-8B.rkllm,3.50,350,100.000,6,\"Core0: 40%, Core1: 38%\",\"multi
line\"
2026-01-19T10:10:00Z,Qwen2.5-7B.rkllm,7.00,700,100.000,2,N/A,Hi
2026-01-19T10:15:00Z,Qwen2.5-7B.rkllm,N/A,0,0.000,N/A,N/A,Hi
";

    fn write_log(content: &str) -> (TempDir, std::path::PathBuf) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("benchmark_results.csv");
        std::fs::write(&path, content).unwrap();
        (temp, path)
    }

    #[test]
    fn test_summarize_groups_in_first_seen_order() {
        let (_temp, path) = write_log(LOG);
        let summaries = ReportReader::new().summarize(&path).unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].model, "Qwen2.5-7B.rkllm");
        assert_eq!(summaries[1].model, "Llama-3.1-8B.rkllm");
    }

    #[test]
    fn test_unmeasured_runs_do_not_skew_throughput() {
        let (_temp, path) = write_log(LOG);
        let qwen = &ReportReader::new().summarize(&path).unwrap()[0];

        assert_eq!(qwen.runs, 3);
        assert_eq!(qwen.measured_runs, 2);
        assert_eq!(qwen.total_tokens, 1300);
        assert_eq!(qwen.mean_tokens_per_second, Some(6.0));
        assert_eq!(qwen.best_tokens_per_second, Some(7.0));
        assert!((qwen.mean_duration_seconds.unwrap() - 220.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_numeric_token_count_skips_row() {
        let (_temp, path) = write_log(
            "\
timestamp,model,tokens_per_second,total_tokens,duration_seconds,ram_used_gb,npu_load,prompt
2026-01-19T10:00:00Z,Qwen2.5-7B.rkllm,5.00,600,120.000,2,N/A,Hi
2026-01-19T10:05:00Z,Qwen2.5-7B.rkllm,9.00,lots,10.000,2,N/A,Hi
",
        );
        let summaries = ReportReader::new().summarize(&path).unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].runs, 1);
        assert_eq!(summaries[0].total_tokens, 600);
        assert_eq!(summaries[0].best_tokens_per_second, Some(5.0));
    }

    #[test]
    fn test_render_table_and_json() {
        let (_temp, path) = write_log(LOG);
        let reader = ReportReader::new();
        let summaries = reader.summarize(&path).unwrap();

        let table = reader.render_table(&summaries);
        assert!(table.lines().next().unwrap().starts_with("Model"));
        assert!(table.contains("Llama-3.1-8B.rkllm"));
        assert!(table.contains("6.00"));

        let json = reader.render_json(&summaries).unwrap();
        assert!(json.contains("\"mean_tokens_per_second\": 6.0"));
        assert!(!json.contains("tps_sum"));
    }

    #[test]
    fn test_missing_log_is_error() {
        let err = ReportReader::new()
            .summarize(Path::new("/nonexistent/benchmark_results.csv"))
            .unwrap_err();
        assert!(matches!(err, Error::Csv(_)));
    }
}
