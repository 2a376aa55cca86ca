//! Execution error types
//!
//! Error codes:
//! - AERO_SPILL_IO_ERROR (ERROR) - spill file create/read/write/delete failed
//! - AERO_PAGE_CORRUPTION (FATAL) - spill frame could not be decoded
//! - AERO_SCHEMA_MISMATCH (ERROR) - attribute not resolvable or type conflict
//! - AERO_BUFFER_BUDGET (ERROR) - buffer budget or page capacity violated
//! - AERO_OPERATOR_STATE (ERROR) - operator contract misuse

use std::fmt;
use std::io;
use std::path::Path;

/// Severity levels for execution errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation failed; the operator tree must be closed
    Error,
    /// Spilled data can no longer be trusted
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Execution error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecErrorCode {
    /// Spill file I/O failure
    SpillIo,
    /// Spill page frame failed checksum or decoding
    PageCorruption,
    /// Attribute not resolvable against a child schema
    SchemaMismatch,
    /// Buffer budget or page capacity violated
    BufferBudget,
    /// Operator used outside its open/next/close contract
    OperatorState,
}

impl ExecErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            ExecErrorCode::SpillIo => "AERO_SPILL_IO_ERROR",
            ExecErrorCode::PageCorruption => "AERO_PAGE_CORRUPTION",
            ExecErrorCode::SchemaMismatch => "AERO_SCHEMA_MISMATCH",
            ExecErrorCode::BufferBudget => "AERO_BUFFER_BUDGET",
            ExecErrorCode::OperatorState => "AERO_OPERATOR_STATE",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            ExecErrorCode::PageCorruption => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for ExecErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Execution error with full context
#[derive(Debug)]
pub struct ExecError {
    code: ExecErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl ExecError {
    /// Spill I/O failure on the given file
    pub fn spill_io(message: impl Into<String>, path: &Path, source: io::Error) -> Self {
        Self {
            code: ExecErrorCode::SpillIo,
            message: message.into(),
            details: Some(format!("path: {}", path.display())),
            source: Some(source),
        }
    }

    /// Corrupt page frame at a byte offset of a spill file (FATAL)
    pub fn page_corruption(path: &Path, offset: u64, reason: impl Into<String>) -> Self {
        Self {
            code: ExecErrorCode::PageCorruption,
            message: reason.into(),
            details: Some(format!("path: {}, byte_offset: {}", path.display(), offset)),
            source: None,
        }
    }

    /// Page bytes that could not be decoded, before a file position is known
    pub fn malformed_page(reason: impl Into<String>) -> Self {
        Self {
            code: ExecErrorCode::PageCorruption,
            message: reason.into(),
            details: None,
            source: None,
        }
    }

    /// Attribute not resolvable or incompatible
    pub fn schema_mismatch(reason: impl Into<String>) -> Self {
        Self {
            code: ExecErrorCode::SchemaMismatch,
            message: reason.into(),
            details: None,
            source: None,
        }
    }

    /// Buffer budget or capacity violation
    pub fn buffer_budget(reason: impl Into<String>) -> Self {
        Self {
            code: ExecErrorCode::BufferBudget,
            message: reason.into(),
            details: None,
            source: None,
        }
    }

    /// Operator contract misuse
    pub fn operator_state(operator: &str, reason: impl Into<String>) -> Self {
        Self {
            code: ExecErrorCode::OperatorState,
            message: reason.into(),
            details: Some(format!("operator: {}", operator)),
            source: None,
        }
    }

    /// Attach a byte offset and path to a decoding failure
    pub(crate) fn at_frame(mut self, path: &Path, offset: u64) -> Self {
        if self.details.is_none() {
            self.details = Some(format!("path: {}, byte_offset: {}", path.display(), offset));
        }
        self
    }

    /// Returns the error code
    pub fn code(&self) -> ExecErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns whether spilled data is no longer trustworthy
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for operator execution
pub type ExecResult<T> = Result<T, ExecError>;
