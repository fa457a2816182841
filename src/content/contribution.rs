//! Volunteer contribution form.
//!
//! The form walks through four steps. Each step validates only its own
//! fields; [`ContributionForm::submit`] re-validates all of them before the
//! single `POST /contributions`.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::api::{
    ApiClient,
    ApiError,
};
use crate::types::{
    ValidationError,
    check_email,
};

/// Fewest distinct research categories a volunteer must pick.
pub const MIN_CATEGORIES: usize = 3;

/// Most hours there are in a week.
const MAX_WEEKLY_HOURS: u32 = 168;

/// Submission endpoint.
const CONTRIBUTIONS_PATH: &str = "/contributions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormStep {
    Personal,
    Interests,
    Availability,
    Review,
}

impl FormStep {
    /// All steps in order.
    pub const ALL: [Self; 4] = [Self::Personal, Self::Interests, Self::Availability, Self::Review];

    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Personal => Some(Self::Interests),
            Self::Interests => Some(Self::Availability),
            Self::Availability => Some(Self::Review),
            Self::Review => None,
        }
    }

    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::Personal => None,
            Self::Interests => Some(Self::Personal),
            Self::Availability => Some(Self::Interests),
            Self::Review => Some(Self::Availability),
        }
    }

    /// One-based position, for "Step 2 of 4".
    #[must_use]
    pub const fn number(self) -> usize {
        match self {
            Self::Personal => 1,
            Self::Interests => 2,
            Self::Availability => 3,
            Self::Review => 4,
        }
    }

    /// Translation key of the step heading.
    #[must_use]
    pub const fn title_key(self) -> &'static str {
        match self {
            Self::Personal => "contribute.steps.personal",
            Self::Interests => "contribute.steps.interests",
            Self::Availability => "contribute.steps.availability",
            Self::Review => "contribute.steps.review",
        }
    }
}

/// Everything the volunteer enters. Serialized as the request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionDetails {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Kept in insertion order; duplicates are ignored by validation
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motivation: Option<String>,
    pub weekly_hours: u32,
    pub accepted_terms: bool,
}

/// Comparison form of a category: trimmed and Unicode-lowercased.
fn category_key(category: &str) -> String {
    category.trim().to_lowercase()
}

impl ContributionDetails {
    /// Categories compared by [`category_key`]; blanks dropped.
    fn distinct_categories(&self) -> BTreeSet<String> {
        self.categories.iter().map(|c| category_key(c)).filter(|c| !c.is_empty()).collect()
    }

    /// Problems with the fields that belong to `step`.
    #[must_use]
    pub fn validate_step(&self, step: FormStep) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        match step {
            FormStep::Personal => {
                if self.name.trim().is_empty() {
                    errors.push(ValidationError::new("name", "A name is required"));
                }
                check_email(&self.email, &mut errors);
            }
            FormStep::Interests => {
                if self.distinct_categories().len() < MIN_CATEGORIES {
                    errors.push(ValidationError::new(
                        "categories",
                        "Please select at least three research categories",
                    ));
                }
            }
            FormStep::Availability => {
                if !(1..=MAX_WEEKLY_HOURS).contains(&self.weekly_hours) {
                    errors.push(ValidationError::new(
                        "weeklyHours",
                        format!("Weekly hours must be between 1 and {MAX_WEEKLY_HOURS}"),
                    ));
                }
            }
            FormStep::Review => {
                if !self.accepted_terms {
                    errors.push(ValidationError::new(
                        "acceptedTerms",
                        "Please accept the terms to continue",
                    ));
                }
            }
        }
        errors
    }

    /// Problems across every step, in step order.
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationError> {
        FormStep::ALL.iter().flat_map(|step| self.validate_step(*step)).collect()
    }
}

/// Wizard state: current step plus the details entered so far.
#[derive(Debug, Clone)]
pub struct ContributionForm {
    /// Step on screen
    step: FormStep,
    /// Entered values
    details: ContributionDetails,
}

impl Default for ContributionForm {
    fn default() -> Self {
        Self::new()
    }
}

impl ContributionForm {
    #[must_use]
    pub fn new() -> Self {
        Self { step: FormStep::Personal, details: ContributionDetails::default() }
    }

    #[must_use]
    pub const fn step(&self) -> FormStep {
        self.step
    }

    #[must_use]
    pub const fn details(&self) -> &ContributionDetails {
        &self.details
    }

    pub const fn details_mut(&mut self) -> &mut ContributionDetails {
        &mut self.details
    }

    /// Adds `category`, or removes it if already selected.
    pub fn toggle_category(&mut self, category: &str) {
        let wanted = category_key(category);
        if wanted.is_empty() {
            return;
        }
        let before = self.details.categories.len();
        self.details.categories.retain(|c| category_key(c) != wanted);
        if self.details.categories.len() == before {
            self.details.categories.push(category.trim().to_string());
        }
    }

    /// Moves forward when the current step is valid. On the last step this
    /// is a no-op that still reports validation problems.
    pub fn next_step(&mut self) -> Result<FormStep, Vec<ValidationError>> {
        let errors = self.details.validate_step(self.step);
        if !errors.is_empty() {
            return Err(errors);
        }
        if let Some(next) = self.step.next() {
            tracing::debug!(from = ?self.step, to = ?next, "Contribution form advanced");
            self.step = next;
        }
        Ok(self.step)
    }

    /// Moves back without validating.
    pub fn previous_step(&mut self) -> FormStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    /// `POST /contributions` once every step validates. Nothing is sent
    /// otherwise.
    ///
    /// The server's acknowledgement is returned as-is.
    pub async fn submit(
        &self,
        api: &ApiClient,
        token: Option<&str>,
    ) -> Result<serde_json::Value, ApiError> {
        let errors = self.details.validate();
        if !errors.is_empty() {
            tracing::debug!(problems = errors.len(), "Contribution rejected before submit");
            return Err(ApiError::Validation(errors));
        }
        let ack = api.post(CONTRIBUTIONS_PATH, &self.details, token).await?;
        tracing::info!("Contribution submitted");
        Ok(ack)
    }
}
