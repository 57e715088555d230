//! TableTalk SQL - guarding and repairing model-generated SQL
//!
//! Language models return prose around their SQL, write MySQL-isms into
//! PostgreSQL queries, and occasionally hallucinate tables that do not
//! exist. This crate deals with all three: [`extract_sql`] pulls the
//! statement out of raw model output, [`SqlGuard`] enforces the
//! single-read-only-statement rule, [`fixup`] rewrites known dialect
//! mismatches on the AST, and [`GroundingCheck`] verifies every table
//! and column reference against the documented schema.

pub mod extract;
pub mod fixup;
pub mod grounding;
pub mod guard;

pub use extract::extract_sql;
pub use fixup::{fix_postgres_sql, normalize_identifier_quoting, rewrite_for_postgres};
pub use grounding::GroundingCheck;
pub use guard::{ParsedQuery, SqlGuard, SqlGuardError};
