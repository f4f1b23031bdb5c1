//! Outcome of a fulfillment run.

use std::fmt;

use uuid::Uuid;

/// The side-effect steps that follow the recorded sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfillmentStep {
    Invoice,
    BuyerNotification,
    SellerNotification,
    SaleThread,
}

impl FulfillmentStep {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::BuyerNotification => "buyer_notification",
            Self::SellerNotification => "seller_notification",
            Self::SaleThread => "sale_thread",
        }
    }
}

impl fmt::Display for FulfillmentStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub step: FulfillmentStep,
    pub outcome: StepOutcome,
}

impl StepResult {
    #[must_use]
    pub fn completed(step: FulfillmentStep) -> Self {
        Self {
            step,
            outcome: StepOutcome::Completed,
        }
    }

    #[must_use]
    pub fn skipped(step: FulfillmentStep, reason: impl Into<String>) -> Self {
        Self {
            step,
            outcome: StepOutcome::Skipped(reason.into()),
        }
    }

    #[must_use]
    pub fn failed(step: FulfillmentStep, reason: impl Into<String>) -> Self {
        Self {
            step,
            outcome: StepOutcome::Failed(reason.into()),
        }
    }
}

/// Overall status of a fulfillment run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FulfillmentStatus {
    /// The sale was recorded by this run.
    Fulfilled,
    /// The sale had already been recorded; nothing was done.
    AlreadyProcessed,
    /// The run stopped before recording the sale.
    Aborted(String),
}

/// What a fulfillment run did, step by step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulfillmentReport {
    pub session_id: String,
    pub ledger_entry_id: Option<Uuid>,
    pub status: FulfillmentStatus,
    pub steps: Vec<StepResult>,
}

impl FulfillmentReport {
    #[must_use]
    pub fn aborted(session_id: &str, reason: impl Into<String>) -> Self {
        Self {
            session_id: session_id.to_owned(),
            ledger_entry_id: None,
            status: FulfillmentStatus::Aborted(reason.into()),
            steps: Vec::new(),
        }
    }

    /// Returns `true` if any post-sale step failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s.outcome, StepOutcome::Failed(_)))
    }

    /// Steps that failed, with their reasons.
    pub fn failures(&self) -> impl Iterator<Item = (FulfillmentStep, &str)> {
        self.steps.iter().filter_map(|s| match &s.outcome {
            StepOutcome::Failed(reason) => Some((s.step, reason.as_str())),
            _ => None,
        })
    }

    /// Looks up the result of a step.
    #[must_use]
    pub fn step(&self, step: FulfillmentStep) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.step == step).map(|s| &s.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_failures_only_counts_failed_steps() {
        let mut report = FulfillmentReport {
            session_id: "cs_1".to_owned(),
            ledger_entry_id: Some(Uuid::new_v4()),
            status: FulfillmentStatus::Fulfilled,
            steps: vec![
                StepResult::completed(FulfillmentStep::Invoice),
                StepResult::skipped(FulfillmentStep::BuyerNotification, "no address"),
            ],
        };
        assert!(!report.has_failures());

        report
            .steps
            .push(StepResult::failed(FulfillmentStep::SaleThread, "db down"));

        assert!(report.has_failures());
        assert_eq!(
            report.failures().collect::<Vec<_>>(),
            vec![(FulfillmentStep::SaleThread, "db down")]
        );
    }
}
