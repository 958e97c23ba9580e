use crate::core::{Pipeline, TransformResult};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// What a finished run produced: where the report went and the numbers in it.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub output_path: String,
    pub transform: TransformResult,
}

impl RunOutcome {
    pub fn headline_score(&self) -> f64 {
        self.transform
            .result
            .display_score(self.transform.score_kind)
    }

    pub fn is_complete(&self) -> bool {
        self.transform.result.is_complete
    }
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        tracing::info!("Starting transcript ETL process");
        self.monitor.log_phase("Start");

        tracing::info!("Extracting pages...");
        let pages = self.pipeline.extract().await?;
        tracing::info!("Extracted {} pages", pages.len());
        self.monitor.log_phase("Extract");

        tracing::info!("Computing averages...");
        let transform = self.pipeline.transform(pages).await?;
        tracing::info!(
            "Aggregated {} disciplines over {} semesters",
            transform.result.filtered_disciplines.len(),
            transform.result.semester_scores.len()
        );
        self.monitor.log_phase("Transform");

        tracing::info!("Writing report...");
        let output_path = self.pipeline.load(transform.clone()).await?;
        tracing::info!("Output saved to: {}", output_path);
        self.monitor.log_phase("Load");
        self.monitor.log_summary();

        Ok(RunOutcome {
            output_path,
            transform,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CalculatorResult, ScoreKind};
    use crate::utils::error::EtlError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedPipeline {
        loads: AtomicUsize,
        fail_extract: bool,
    }

    #[async_trait::async_trait]
    impl Pipeline for FixedPipeline {
        async fn extract(&self) -> Result<Vec<String>> {
            if self.fail_extract {
                return Err(EtlError::NoRecordsFound);
            }
            Ok(vec!["page".to_string()])
        }

        async fn transform(&self, _pages: Vec<String>) -> Result<TransformResult> {
            Ok(TransformResult {
                source_name: "historico.pdf".to_string(),
                score_kind: ScoreKind::Semester,
                result: CalculatorResult {
                    official_score: 7.7,
                    exact_score: 7.666,
                    cumulative_score: 7.25,
                    is_complete: true,
                    ..CalculatorResult::default()
                },
            })
        }

        async fn load(&self, _result: TransformResult) -> Result<String> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok("./output".to_string())
        }
    }

    #[tokio::test]
    async fn test_run_reports_headline_score() {
        let engine = EtlEngine::new(FixedPipeline {
            loads: AtomicUsize::new(0),
            fail_extract: false,
        });
        let outcome = engine.run().await.unwrap();

        assert_eq!(outcome.output_path, "./output");
        assert_eq!(outcome.headline_score(), 7.7);
        assert!(outcome.is_complete());
        assert_eq!(engine.pipeline.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_extract_failure_stops_the_run() {
        let engine = EtlEngine::new(FixedPipeline {
            loads: AtomicUsize::new(0),
            fail_extract: true,
        });
        assert!(matches!(engine.run().await, Err(EtlError::NoRecordsFound)));
        assert_eq!(engine.pipeline.loads.load(Ordering::SeqCst), 0);
    }
}
