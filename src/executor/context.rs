//! Execution context
//!
//! Handed to every operator at construction. Clones share the spill
//! namespace and the metrics registry.

use std::sync::Arc;

use super::errors::{ExecError, ExecResult};
use crate::config::{ConfigResult, ExecConfig};
use crate::observability::{Event, Logger, MetricsRegistry, Severity};
use crate::spill::{SpillNamespace, SpillWriter};
use crate::tuple::Schema;

#[derive(Debug, Clone)]
pub struct ExecContext {
    config: Arc<ExecConfig>,
    spill: SpillNamespace,
    metrics: Arc<MetricsRegistry>,
    logger: Logger,
}

impl ExecContext {
    /// Validates the config and creates the spill directory
    pub fn new(config: ExecConfig) -> ConfigResult<Self> {
        config.validate()?;
        config.ensure_spill_dir()?;

        Ok(Self {
            spill: SpillNamespace::new(config.spill_dir.clone()),
            logger: Logger::new(config.log_level),
            config: Arc::new(config),
            metrics: Arc::new(MetricsRegistry::new()),
        })
    }

    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    pub fn page_size(&self) -> usize {
        self.config.page_size
    }

    /// Default buffer budget B
    pub fn buffer_pages(&self) -> usize {
        self.config.buffer_pages
    }

    pub fn spill(&self) -> &SpillNamespace {
        &self.spill
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn logger(&self) -> Logger {
        self.logger
    }

    /// Page capacity for tuples of `schema`
    pub fn page_capacity(&self, schema: &Schema) -> ExecResult<usize> {
        schema.page_capacity(self.page_size())
    }

    /// Creates a new uniquely named spill file for tuples of `schema`
    pub fn create_spill(&self, prefix: &str, schema: &Schema) -> ExecResult<SpillWriter> {
        let capacity = self.page_capacity(schema)?;
        SpillWriter::create(
            self.spill.next_path(prefix),
            schema.clone(),
            capacity,
            Arc::clone(&self.metrics),
        )
    }

    pub fn log(&self, severity: Severity, event: Event, fields: &[(&str, &str)]) {
        self.logger.log(severity, event.as_str(), fields);
    }

    /// Logs a failure at an operator boundary and passes the result through
    pub fn observe<T>(&self, operator: &str, phase: &str, result: ExecResult<T>) -> ExecResult<T> {
        if let Err(ref err) = result {
            self.log_failure(operator, phase, err);
        }
        result
    }

    fn log_failure(&self, operator: &str, phase: &str, err: &ExecError) {
        let severity = if err.is_fatal() {
            Severity::Fatal
        } else {
            Severity::Error
        };
        let details = err.details().unwrap_or("");
        self.log(
            severity,
            Event::OperatorFailed,
            &[
                ("operator", operator),
                ("phase", phase),
                ("code", err.code().code()),
                ("message", err.message()),
                ("details", details),
            ],
        );
    }
}

/// Rejects budgets below the three-page minimum
pub fn check_budget(operator: &str, buffer_pages: usize) -> ExecResult<()> {
    if buffer_pages < crate::config::MIN_BUFFER_PAGES {
        return Err(ExecError::buffer_budget(format!(
            "{} needs at least {} buffer pages, got {}",
            operator,
            crate::config::MIN_BUFFER_PAGES,
            buffer_pages
        )));
    }
    Ok(())
}
