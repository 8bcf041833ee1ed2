use std::fmt;

use serde::{Deserialize, Serialize};

/// Categorical outcome of one candidate-versus-job evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Selected,
    Rejected,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Selected => "SELECTED",
            Decision::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finalized decision. Only the decision engine constructs these, and it never builds one
/// where `decision == Selected` without the score clearing the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub decision: Decision,
    pub compatibility_score: u8,
    pub justification: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&Decision::Selected).unwrap(),
            r#""SELECTED""#
        );
        assert_eq!(Decision::Rejected.to_string(), "REJECTED");
    }

    #[test]
    fn test_decision_rejects_lowercase() {
        let parsed: Result<Decision, _> = serde_json::from_str(r#""selected""#);
        assert!(parsed.is_err());
    }
}
