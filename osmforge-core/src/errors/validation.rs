//! Accumulated validation errors and the step result shape.

use serde::{Deserialize, Serialize};

/// A single validation failure with a stable code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Stable `<area>.<subject>.<cause>` code.
    pub code: String,
    /// Human-readable description.
    pub message: String,
    /// Optional context (a coordinate, a path, a constraint name).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ValidationError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.context {
            Some(ctx) => write!(f, "[{}] {} ({})", self.code, self.message, ctx),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

/// Result of one pipeline step: success, or an ordered list of failures.
pub type StepResult<T> = Result<T, Vec<ValidationError>>;

/// Collector that accumulates errors within a step.
#[derive(Debug, Default)]
pub struct ErrorBag {
    errors: Vec<ValidationError>,
}

impl ErrorBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = ValidationError>) {
        self.errors.extend(errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Resolves the step: the value when nothing accumulated, the errors otherwise.
    pub fn into_result<T>(self, value: T) -> StepResult<T> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bag_accumulates_and_fails_together() {
        let mut bag = ErrorBag::new();
        bag.push(ValidationError::new("a.b.c", "first"));
        bag.push(ValidationError::new("a.b.d", "second").with_context("Entity=Customer"));
        let result: StepResult<()> = bag.into_result(());
        let errors = result.unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].code, "a.b.c");
        assert_eq!(
            errors[1].to_string(),
            "[a.b.d] second (Entity=Customer)"
        );
    }

    #[test]
    fn empty_bag_resolves_to_value() {
        let bag = ErrorBag::new();
        assert_eq!(bag.into_result(7).unwrap(), 7);
    }
}
