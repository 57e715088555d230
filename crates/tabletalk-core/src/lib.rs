//! TableTalk Core
//!
//! Domain model for the schema documentation that grounds SQL generation,
//! plus the shared diagnostic, report, and configuration types.
//! Never rename diagnostic codes - they are part of the public API.

pub mod config;
pub mod diagnostic;
pub mod report;
pub mod schema;

pub use config::{
    Config, DatabaseConfig, DocConfig, ExamplesConfig, LlmConfig, PipelineConfig,
    SeverityThreshold,
};
pub use diagnostic::{Diagnostic, DiagnosticCode, Location, Severity};
pub use report::{Report, ReportSummary, ReportVersion};
pub use schema::{Column, ColumnRef, JoinHint, SchemaDoc, SqlType, Table};
