use std::time::Duration;

/// Result of probing a single host once
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success { latency: Duration },
    Failure { reason: String, latency: Duration },
}

impl Outcome {
    pub fn success(latency: Duration) -> Self {
        Self::Success { latency }
    }

    pub fn failure(reason: impl Into<String>, latency: Duration) -> Self {
        Self::Failure {
            reason: reason.into(),
            latency,
        }
    }

    pub fn latency(&self) -> Duration {
        match self {
            Self::Success { latency } | Self::Failure { latency, .. } => *latency,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    #[allow(dead_code)]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { reason, .. } => Some(reason.as_str()),
        }
    }
}

/// Outcome as stored in a history slot (latency lives on the sample itself)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOutcome {
    Success,
    Failure(String),
}

impl From<&Outcome> for SlotOutcome {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Success { .. } => Self::Success,
            Outcome::Failure { reason, .. } => Self::Failure(reason.clone()),
        }
    }
}
