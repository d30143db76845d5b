//! Safety Gate
//!
//! A static text filter that decides whether model-generated SQL may run.
//! It is a coarse heuristic, not an injection-proof boundary: a statement
//! crafted to avoid every denied substring still passes the text checks.
//! The optional strict mode parses the statement with `sqlparser` and only
//! admits a single plain `SELECT` over the known tables.
//!
//! Substring matching also rejects harmless identifiers that contain a
//! denied word, e.g. `updated_at` contains `update`.

use crate::error::{PipelineError, Result};
use crate::schema_context::KNOWN_TABLES;
use sqlparser::ast::{visit_relations, ObjectName, SetExpr, Statement, TableFactor};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use std::ops::ControlFlow;
use thiserror::Error;

/// Substrings that veto a statement: comment openers plus mutating and
/// structural keywords.
pub const DENIED_SUBSTRINGS: &[&str] = &[
    "--", "/*", "drop", "delete", "insert", "update", "alter", "exec", "union", "pragma",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("empty statement")]
    Empty,

    #[error("statement does not start with SELECT")]
    NotSelect,

    #[error("statement contains denied token '{0}'")]
    DeniedToken(&'static str),

    #[error("statement references no known table")]
    UnknownTable,

    #[error("statement does not parse: {0}")]
    Unparseable(String),

    #[error("statement shape not allowed: {0}")]
    DisallowedShape(String),
}

/// A statement the gate has admitted. Only [`SafetyGate`] can build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedSql(String);

impl AcceptedSql {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AcceptedSql {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Accepted(AcceptedSql),
    Rejected(RejectReason),
}

impl GateDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateDecision::Accepted(_))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SafetyGate {
    strict: bool,
}

impl SafetyGate {
    pub fn new() -> Self {
        Self { strict: false }
    }

    pub fn strict() -> Self {
        Self { strict: true }
    }

    pub fn with_strict(strict: bool) -> Self {
        Self { strict }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Pure predicate over the candidate text. No state is kept between calls.
    pub fn inspect(&self, sql: &str) -> GateDecision {
        match self.check(sql) {
            Ok(()) => GateDecision::Accepted(AcceptedSql(sql.trim().to_string())),
            Err(reason) => GateDecision::Rejected(reason),
        }
    }

    /// Like [`inspect`](Self::inspect) but shaped for `?` in the pipeline.
    pub fn admit(&self, sql: &str) -> Result<AcceptedSql> {
        match self.inspect(sql) {
            GateDecision::Accepted(accepted) => Ok(accepted),
            GateDecision::Rejected(reason) => Err(PipelineError::SqlRejected(reason)),
        }
    }

    fn check(&self, sql: &str) -> std::result::Result<(), RejectReason> {
        let clean = sql.trim().to_lowercase();
        if clean.is_empty() {
            return Err(RejectReason::Empty);
        }
        if !clean.starts_with("select") {
            return Err(RejectReason::NotSelect);
        }
        if let Some(token) = DENIED_SUBSTRINGS.iter().find(|t| clean.contains(*t)) {
            return Err(RejectReason::DeniedToken(*token));
        }
        if !KNOWN_TABLES.iter().any(|t| clean.contains(t)) {
            return Err(RejectReason::UnknownTable);
        }
        if self.strict {
            check_structure(sql)?;
        }
        Ok(())
    }
}

fn check_structure(sql: &str) -> std::result::Result<(), RejectReason> {
    let statements = Parser::parse_sql(&PostgreSqlDialect {}, sql)
        .map_err(|e| RejectReason::Unparseable(e.to_string()))?;

    let [statement] = statements.as_slice() else {
        return Err(RejectReason::DisallowedShape(format!(
            "expected one statement, found {}",
            statements.len()
        )));
    };

    let Statement::Query(query) = statement else {
        return Err(RejectReason::DisallowedShape("not a query".to_string()));
    };
    if query.with.is_some() {
        return Err(RejectReason::DisallowedShape("WITH clause".to_string()));
    }
    let SetExpr::Select(select) = query.body.as_ref() else {
        return Err(RejectReason::DisallowedShape("not a plain SELECT".to_string()));
    };
    if select.into.is_some() {
        return Err(RejectReason::DisallowedShape("SELECT INTO".to_string()));
    }
    for table in &select.from {
        let factors = std::iter::once(&table.relation).chain(table.joins.iter().map(|j| &j.relation));
        for factor in factors {
            if !matches!(factor, TableFactor::Table { .. }) {
                return Err(RejectReason::DisallowedShape("derived relation in FROM".to_string()));
            }
        }
    }

    // Every relation anywhere in the statement, subqueries included.
    let outcome = visit_relations(&statements, |name| {
        if is_known_relation(name) {
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(name.to_string())
        }
    });
    if let ControlFlow::Break(name) = outcome {
        return Err(RejectReason::DisallowedShape(format!("relation '{}'", name)));
    }

    Ok(())
}

fn is_known_relation(name: &ObjectName) -> bool {
    let parts: Vec<String> = name.0.iter().map(|ident| ident.value.to_lowercase()).collect();
    match parts.as_slice() {
        [table] => KNOWN_TABLES.contains(&table.as_str()),
        [schema, table] => schema == "public" && KNOWN_TABLES.contains(&table.as_str()),
        _ => false,
    }
}
