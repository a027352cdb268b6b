//! Offline sales ingestion pipeline
//!
//! Runs `{command} {script} {file} {upload_id}` as a child process. The
//! pipeline writes sales rows itself and prints a JSON summary as the last
//! block of its output.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::process::Command;

use crate::config::PipelineConfig;
use crate::error::{AppError, AppResult};

/// Summary printed by the pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineOutcome {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub steps: Value,
    #[serde(default)]
    pub errors: Vec<Value>,
    #[serde(default)]
    pub warnings: Vec<Value>,
    #[serde(default, alias = "processingTimeMs")]
    pub processing_time_ms: Option<i64>,
    #[serde(default, alias = "salesCreated")]
    pub sales_created: Option<i64>,
    #[serde(default, alias = "ingredientsUpdated")]
    pub ingredients_updated: Option<i64>,
}

impl PipelineOutcome {
    /// A run counts as successful unless it reported an error status
    pub fn succeeded(&self) -> bool {
        !matches!(self.status.as_deref(), Some("error") | Some("failed"))
    }
}

/// Find the last complete top-level JSON object in a block of output
pub fn extract_trailing_json(output: &str) -> Option<Value> {
    let trimmed = output.trim_end();
    if !trimmed.ends_with('}') {
        return None;
    }

    // Walk every '{' from the back; the first that parses to the end wins.
    trimmed
        .char_indices()
        .rev()
        .filter(|(_, c)| *c == '{')
        .find_map(|(idx, _)| serde_json::from_str::<Value>(&trimmed[idx..]).ok())
        .filter(Value::is_object)
}

/// Child-process runner for the pipeline
#[derive(Clone)]
pub struct SalesPipeline {
    command: String,
    script: String,
    timeout: Duration,
}

impl SalesPipeline {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            command: config.command.clone(),
            script: config.script.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the pipeline for one staged spreadsheet
    pub async fn run(&self, file: &Path, upload_id: &str) -> AppResult<PipelineOutcome> {
        let mut command = Command::new(&self.command);
        if !self.script.is_empty() {
            command.arg(&self.script);
        }
        command
            .arg(file)
            .arg(upload_id)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::info!("Running sales pipeline for upload {}", upload_id);

        let child = command
            .spawn()
            .map_err(|e| AppError::ExternalService(format!("Falha ao iniciar processamento: {}", e)))?;

        // Dropping the future on timeout kills the child.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| AppError::PipelineTimeout(self.timeout.as_secs()))?
            .map_err(|e| AppError::ExternalService(format!("Falha no processamento: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let summary = extract_trailing_json(&stdout).or_else(|| extract_trailing_json(&stderr));

        match summary {
            Some(value) => serde_json::from_value(value).map_err(|e| {
                AppError::ExternalService(format!("Resumo do processamento inválido: {}", e))
            }),
            None if output.status.success() => Err(AppError::ExternalService(
                "Processamento não retornou resumo".to_string(),
            )),
            None => {
                let detail = stderr.trim();
                let start = detail.len().saturating_sub(500);
                let start = (start..detail.len())
                    .find(|i| detail.is_char_boundary(*i))
                    .unwrap_or(detail.len());
                Err(AppError::ExternalService(format!(
                    "Processamento falhou ({}): {}",
                    output.status,
                    &detail[start..]
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `sh -c` treats the "file" argument as the script body
    fn shell() -> SalesPipeline {
        SalesPipeline {
            command: "sh".to_string(),
            script: "-c".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_trailing_json_after_logs() {
        let out = "Lendo planilha...\n{\"step\": 1}\nProcessando\n{\"status\": \"success\", \"errors\": []}\n";
        let value = extract_trailing_json(out).unwrap();
        assert_eq!(value["status"], "success");
    }

    #[test]
    fn test_nested_trailing_json() {
        let out = "log\n{\n  \"status\": \"success\",\n  \"steps\": {\"parse\": {\"rows\": 3}}\n}";
        let value = extract_trailing_json(out).unwrap();
        assert_eq!(value["steps"]["parse"]["rows"], 3);
    }

    #[test]
    fn test_no_json() {
        assert!(extract_trailing_json("Traceback: boom").is_none());
        assert!(extract_trailing_json("").is_none());
    }

    #[test]
    fn test_outcome_aliases() {
        let outcome: PipelineOutcome = serde_json::from_str(
            r#"{"status":"success","processingTimeMs":120,"salesCreated":4,"warnings":["x"]}"#,
        )
        .unwrap();
        assert!(outcome.succeeded());
        assert_eq!(outcome.processing_time_ms, Some(120));
        assert_eq!(outcome.sales_created, Some(4));
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn test_error_status_is_failure() {
        let outcome: PipelineOutcome =
            serde_json::from_str(r#"{"status":"error","errors":["planilha vazia"]}"#).unwrap();
        assert!(!outcome.succeeded());
    }

    #[tokio::test]
    async fn test_run_parses_summary() {
        let script = Path::new(r#"echo 'Lendo planilha'; echo '{"status":"success","steps":{"parse":"ok"},"salesCreated":2}'"#);
        let outcome = shell().run(script, "upload_abc").await.unwrap();
        assert!(outcome.succeeded());
        assert_eq!(outcome.sales_created, Some(2));
        assert_eq!(outcome.steps["parse"], "ok");
    }

    #[tokio::test]
    async fn test_run_falls_back_to_stderr() {
        let script = Path::new(r#"echo '{"status":"error","errors":["coluna ausente"]}' >&2; exit 1"#);
        let outcome = shell().run(script, "upload_abc").await.unwrap();
        assert!(!outcome.succeeded());
        assert_eq!(outcome.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let pipeline = shell().with_timeout(Duration::from_millis(100));
        let err = pipeline.run(Path::new("sleep 5"), "upload_abc").await.unwrap_err();
        assert!(matches!(err, AppError::PipelineTimeout(_)));
    }
}
