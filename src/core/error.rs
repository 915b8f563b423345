use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("{field} {reason}")]
    InvalidField { field: String, reason: String },

    #[error("timeline ends in {end_year}, before it starts in {current_year}")]
    InvalidTimeline { current_year: i32, end_year: i32 },

    #[error("invalid return distribution: {0}")]
    ReturnDistribution(String),
}

impl PlanError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PlanError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn field(&self) -> Option<&str> {
        match self {
            PlanError::InvalidField { field, .. } => Some(field),
            _ => None,
        }
    }
}
