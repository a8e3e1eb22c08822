//! Recoverable generation issues
//!
//! Resolution, synthesis and binding never fail outright. When a schema or
//! operation can't be handled they record an [`Issue`] here and degrade to
//! an opaque or defaulted value, so one bad node never aborts the run.

use miette::Diagnostic;
use std::fmt;
use thiserror::Error;

/// A condition that degraded one schema or operation
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum Issue {
    /// `$ref` target missing from the document
    #[error("unresolved reference `{reference}` at {location}")]
    #[diagnostic(
        code(skein::unresolved_reference),
        help("The referenced schema was replaced with an opaque JSON value")
    )]
    UnresolvedReference { reference: String, location: String },

    /// Schema shape the synthesizer can't express
    #[error("unsupported schema construct at {location}: {construct}")]
    #[diagnostic(
        code(skein::unsupported_schema),
        help("A placeholder declaration was emitted in its place")
    )]
    UnsupportedSchemaConstruct { construct: String, location: String },

    /// Operation is missing a field a binding needs
    #[error("operation {operation} has no {field}; using {fallback}")]
    #[diagnostic(code(skein::missing_operation_field))]
    MissingOperationField {
        operation: String,
        field: String,
        fallback: String,
    },
}

impl Issue {
    pub fn unresolved(reference: impl Into<String>, location: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            reference: reference.into(),
            location: location.into(),
        }
    }

    pub fn unsupported(construct: impl Into<String>, location: impl Into<String>) -> Self {
        Self::UnsupportedSchemaConstruct {
            construct: construct.into(),
            location: location.into(),
        }
    }

    pub fn missing_field(
        operation: impl Into<String>,
        field: impl Into<String>,
        fallback: impl Into<String>,
    ) -> Self {
        Self::MissingOperationField {
            operation: operation.into(),
            field: field.into(),
            fallback: fallback.into(),
        }
    }

    /// Schema location or operation the issue is attached to
    pub fn location(&self) -> &str {
        match self {
            Self::UnresolvedReference { location, .. }
            | Self::UnsupportedSchemaConstruct { location, .. } => location,
            Self::MissingOperationField { operation, .. } => operation,
        }
    }

    pub fn kind(&self) -> IssueKind {
        match self {
            Self::UnresolvedReference { .. } => IssueKind::UnresolvedReference,
            Self::UnsupportedSchemaConstruct { .. } => IssueKind::UnsupportedSchemaConstruct,
            Self::MissingOperationField { .. } => IssueKind::MissingOperationField,
        }
    }
}

/// Discriminant of [`Issue`], handy for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IssueKind {
    UnresolvedReference,
    UnsupportedSchemaConstruct,
    MissingOperationField,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UnresolvedReference => "unresolved reference",
            Self::UnsupportedSchemaConstruct => "unsupported schema construct",
            Self::MissingOperationField => "missing operation field",
        })
    }
}

/// Accumulates issues across pipeline stages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    issues: Vec<Issue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issue. Identical issues are only kept once.
    pub fn push(&mut self, issue: Issue) {
        if self.issues.contains(&issue) {
            return;
        }
        tracing::warn!(kind = %issue.kind(), "{issue}");
        self.issues.push(issue);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        for issue in other.issues {
            self.push(issue);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter()
    }

    pub fn of_kind(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.kind() == kind)
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Issue;
    type IntoIter = std::vec::IntoIter<Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.into_iter()
    }
}

/// A stage result paired with the issues recorded while producing it
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub diagnostics: Diagnostics,
}

impl<T> Outcome<T> {
    pub fn new(value: T, diagnostics: Diagnostics) -> Self {
        Self { value, diagnostics }
    }

    pub fn clean(value: T) -> Self {
        Self::new(value, Diagnostics::new())
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            diagnostics: self.diagnostics,
        }
    }

    /// Split off the value, moving the issues into `sink`
    pub fn drain_into(self, sink: &mut Diagnostics) -> T {
        sink.extend(self.diagnostics);
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_issues_are_recorded_once() {
        let mut diags = Diagnostics::new();
        diags.push(Issue::unresolved("#/components/schemas/Gone", "Pet.owner"));
        diags.push(Issue::unresolved("#/components/schemas/Gone", "Pet.owner"));
        diags.push(Issue::unsupported("type [string, integer]", "Pet.id"));
        assert_eq!(diags.len(), 2);
        assert_eq!(diags.of_kind(IssueKind::UnresolvedReference).count(), 1);
    }

    #[test]
    fn outcome_drains_into_sink() {
        let mut inner = Diagnostics::new();
        inner.push(Issue::missing_field("GET /pets", "responses", "no responses"));
        let outcome = Outcome::new(7, inner);

        let mut sink = Diagnostics::new();
        let value = outcome.map(|v| v * 2).drain_into(&mut sink);
        assert_eq!(value, 14);
        assert_eq!(sink.len(), 1);
        assert_eq!(
            sink.iter().next().map(|i| i.kind()),
            Some(IssueKind::MissingOperationField)
        );
    }
}
