use crate::spec::SpecError;
use tracing::error;

/// A single problem found while extracting routes from a specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub location: String,
    pub kind: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        location: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ValidationIssue {
            location: location.into(),
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.location, self.message)
    }
}

/// Log every issue and fold them into a single [`SpecError::Validation`].
///
/// # Errors
///
/// Returns an error when `issues` is not empty.
pub fn fail_if_issues(issues: Vec<ValidationIssue>) -> Result<(), SpecError> {
    if issues.is_empty() {
        return Ok(());
    }
    for issue in &issues {
        error!(kind = %issue.kind, location = %issue.location, "{}", issue.message);
    }
    let summary = issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    Err(SpecError::Validation(format!(
        "{} issue(s) found: {summary}",
        issues.len()
    )))
}
