//! `pipeline_runs` bookkeeping around collect, translate, and roundup runs.
//!
//! Ledger writes never affect the run itself: failures are logged and the
//! run's own result is returned unchanged.

use std::fmt;
use std::future::Future;

use serde::Serialize;

use crate::report::{CollectReport, RoundupReport, TranslateReport};
use crate::service::Pipeline;
use crate::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunType {
    Collect,
    Translate,
    Roundup,
}

impl RunType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunType::Collect => "collect",
            RunType::Translate => "translate",
            RunType::Roundup => "roundup",
        }
    }
}

impl fmt::Display for RunType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerSource {
    Cli,
    Http,
    Scheduler,
}

impl TriggerSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerSource::Cli => "cli",
            TriggerSource::Http => "http",
            TriggerSource::Scheduler => "scheduler",
        }
    }
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number recorded as `records_processed` for a finished run.
pub trait RunRecords {
    fn records_processed(&self) -> i32;
}

fn clamp_i32<T: TryInto<i32>>(value: T) -> i32 {
    value.try_into().unwrap_or(i32::MAX)
}

impl RunRecords for CollectReport {
    fn records_processed(&self) -> i32 {
        clamp_i32(self.collected)
    }
}

impl RunRecords for TranslateReport {
    fn records_processed(&self) -> i32 {
        clamp_i32(self.translated)
    }
}

impl RunRecords for RoundupReport {
    fn records_processed(&self) -> i32 {
        clamp_i32(self.generated)
    }
}

impl Pipeline {
    /// Run `operation` inside a ledger entry of `run_type`.
    pub(crate) async fn tracked<T, Fut>(
        &self,
        run_type: RunType,
        trigger: TriggerSource,
        operation: Fut,
    ) -> Result<T, PipelineError>
    where
        T: RunRecords,
        Fut: Future<Output = Result<T, PipelineError>>,
    {
        let run_id = match self.store().begin_run(run_type, trigger).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(run_type = %run_type, error = %e, "failed to open pipeline run");
                None
            }
        };

        let result = operation.await;

        if let Some(run_id) = run_id {
            let closed = match &result {
                Ok(report) => {
                    self.store()
                        .complete_run(run_id, report.records_processed())
                        .await
                }
                Err(e) => self.store().fail_run(run_id, &e.to_string()).await,
            };
            if let Err(e) = closed {
                tracing::warn!(run_id, run_type = %run_type, error = %e, "failed to close pipeline run");
            }
        }

        result
    }
}
