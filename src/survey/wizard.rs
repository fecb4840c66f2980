//! The synchronous survey state machine.
//!
//! Every user action is a method that either mutates the form and returns
//! `Ok`, or returns a [`WizardError`] and leaves the form untouched. Actions
//! that move between steps return a [`PendingTransition`]; the step only
//! changes when the caller hands it back to [`Wizard::complete_transition`].
//! While a transition is pending every other step change is rejected.

use tracing::debug;

use crate::auth::Identity;
use crate::error::WizardError;

use super::model::{
    AddOnTier, LivingSituation, Location, MealFrequency, SurveyResponse, UserType,
};
use super::pricing;
use super::state::{SurveyStep, WizardState};

/// A step change that has started but not been applied yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransition {
    pub from: SurveyStep,
    pub to: SurveyStep,
}

/// Form state plus navigation state for one survey.
#[derive(Debug, Clone, Default)]
pub struct Wizard {
    state: WizardState,
    response: SurveyResponse,
    identity: Option<Identity>,
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn response(&self) -> &SurveyResponse {
        &self.response
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn current_step(&self) -> SurveyStep {
        self.state.current_step
    }

    pub fn is_signed_in(&self) -> bool {
        self.identity.is_some()
    }

    // ── Identity ────────────────────────────────────────────────────

    /// Record the identity reported by the provider. A signed-in identity
    /// prefills `name` and `email`; signing out keeps what was filled.
    pub fn apply_identity(&mut self, identity: Option<Identity>) {
        if let Some(ref id) = identity {
            if !self.state.is_submitted {
                self.response.name = id.display_name.clone().unwrap_or_default();
                self.response.email = id.email.clone().unwrap_or_default();
            }
        }
        self.identity = identity;
    }

    /// Sign-in finished on the welcome step: store the identity and start
    /// moving to the first question.
    pub fn sign_in_succeeded(
        &mut self,
        identity: Identity,
    ) -> Result<PendingTransition, WizardError> {
        self.require_step(SurveyStep::Welcome)?;
        self.ensure_not_transitioning()?;
        self.apply_identity(Some(identity));
        self.begin_transition(SurveyStep::UserType)
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// Whether the "continue" action is enabled on the current step.
    pub fn can_continue(&self) -> bool {
        self.continue_guard().is_ok()
    }

    /// Whether the "back" action is enabled on the current step.
    pub fn can_go_back(&self) -> bool {
        !self.state.is_transitioning
            && !self.state.is_submitting
            && self.state.current_step.previous().is_some()
    }

    /// Whether the submit action is enabled.
    pub fn can_submit(&self) -> bool {
        self.state.current_step == SurveyStep::Contact
            && !self.state.is_submitting
            && self.response.has_contact()
    }

    /// Continue from a step that has an explicit continue action
    /// (welcome, meal plan, budget).
    pub fn continue_next(&mut self) -> Result<PendingTransition, WizardError> {
        self.continue_guard()?;
        let step = self.state.current_step;
        let next = step.next().ok_or(WizardError::AlreadySubmitted)?;
        self.begin_transition(next)
    }

    pub fn go_back(&mut self) -> Result<PendingTransition, WizardError> {
        self.ensure_editable()?;
        self.ensure_not_transitioning()?;
        let step = self.state.current_step;
        let previous = step
            .previous()
            .ok_or(WizardError::NoPreviousStep { step })?;
        self.begin_transition(previous)
    }

    /// Apply a transition started earlier. Returns the step now current.
    ///
    /// A transition whose origin no longer matches the current step is
    /// stale and is dropped.
    pub fn complete_transition(&mut self, pending: PendingTransition) -> SurveyStep {
        if self.state.is_transitioning && self.state.current_step == pending.from {
            self.state.current_step = pending.to;
        } else {
            debug!(from = %pending.from, to = %pending.to, "Dropping stale transition");
        }
        self.state.is_transitioning = false;
        self.state.current_step
    }

    fn continue_guard(&self) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.ensure_not_transitioning()?;
        let step = self.state.current_step;
        match step {
            SurveyStep::Welcome if !self.is_signed_in() => Err(WizardError::NotSignedIn),
            SurveyStep::Welcome | SurveyStep::Budget => Ok(()),
            SurveyStep::MealPlan if self.response.meal_frequency.is_none() => {
                Err(WizardError::Blocked {
                    step,
                    reason: "choose how many meals a day".to_string(),
                })
            }
            SurveyStep::MealPlan => Ok(()),
            _ => Err(WizardError::WrongStep { step }),
        }
    }

    fn begin_transition(&mut self, to: SurveyStep) -> Result<PendingTransition, WizardError> {
        self.ensure_not_transitioning()?;
        let from = self.state.current_step;
        if !from.can_transition_to(to) {
            return Err(WizardError::WrongStep { step: from });
        }
        self.state.is_transitioning = true;
        Ok(PendingTransition { from, to })
    }

    // ── Selections (steps 1-3 advance on pick) ──────────────────────

    pub fn select_user_type(
        &mut self,
        user_type: UserType,
    ) -> Result<PendingTransition, WizardError> {
        self.guard_selection(SurveyStep::UserType)?;
        self.response.user_type = Some(user_type);
        self.begin_transition(SurveyStep::LivingSituation)
    }

    pub fn select_living_situation(
        &mut self,
        living: LivingSituation,
    ) -> Result<PendingTransition, WizardError> {
        self.guard_selection(SurveyStep::LivingSituation)?;
        self.response.living_situation = Some(living);
        self.begin_transition(SurveyStep::Location)
    }

    pub fn select_location(
        &mut self,
        location: Location,
    ) -> Result<PendingTransition, WizardError> {
        self.guard_selection(SurveyStep::Location)?;
        if !location.is_selectable() {
            return Err(WizardError::OptionUnavailable {
                option: location.to_string(),
            });
        }
        self.response.location = Some(location);
        self.begin_transition(SurveyStep::MealPlan)
    }

    fn guard_selection(&self, step: SurveyStep) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.require_step(step)?;
        self.ensure_not_transitioning()
    }

    // ── Meal plan (step 4) ──────────────────────────────────────────

    pub fn set_meal_frequency(&mut self, frequency: MealFrequency) -> Result<(), WizardError> {
        self.guard_field(SurveyStep::MealPlan)?;
        self.response.meal_frequency = Some(frequency);
        Ok(())
    }

    /// Flip the premium package. Turning it on drops the protein boost;
    /// turning it off does not bring the boost back.
    pub fn toggle_premium(&mut self) -> Result<AddOnTier, WizardError> {
        self.guard_field(SurveyStep::MealPlan)?;
        self.response.add_on = match self.response.add_on {
            AddOnTier::Premium => AddOnTier::None,
            AddOnTier::None | AddOnTier::Protein => AddOnTier::Premium,
        };
        self.response.restore_budget_floor();
        Ok(self.response.add_on)
    }

    /// Whether the protein boost control is enabled. Mirrors the guards
    /// of [`Wizard::toggle_protein`].
    pub fn can_toggle_protein(&self) -> bool {
        self.guard_field(SurveyStep::MealPlan).is_ok() && !self.response.add_on.is_gym_bro()
    }

    pub fn toggle_protein(&mut self) -> Result<AddOnTier, WizardError> {
        self.guard_field(SurveyStep::MealPlan)?;
        self.response.add_on = match self.response.add_on {
            AddOnTier::Premium => return Err(WizardError::ProteinLocked),
            AddOnTier::Protein => AddOnTier::None,
            AddOnTier::None => AddOnTier::Protein,
        };
        self.response.restore_budget_floor();
        Ok(self.response.add_on)
    }

    pub fn toggle_extra_serving(&mut self) -> Result<bool, WizardError> {
        self.guard_field(SurveyStep::MealPlan)?;
        self.response.needs_extra_serving = !self.response.needs_extra_serving;
        self.response.restore_budget_floor();
        Ok(self.response.needs_extra_serving)
    }

    // ── Budget (step 5) ─────────────────────────────────────────────

    /// Set the budget from the slider. Returns the stored value, which is
    /// snapped to the slider step and kept within range.
    pub fn set_budget(&mut self, requested: u32) -> Result<u32, WizardError> {
        self.guard_field(SurveyStep::Budget)?;
        self.response.budget_per_meal = pricing::snap_budget(requested, self.response.min_price());
        Ok(self.response.budget_per_meal)
    }

    // ── Contact (step 6) ────────────────────────────────────────────

    pub fn set_contact(&mut self, contact: &str) -> Result<(), WizardError> {
        self.guard_field(SurveyStep::Contact)?;
        self.response.contact = contact.to_string();
        Ok(())
    }

    pub fn toggle_trial(&mut self) -> Result<bool, WizardError> {
        self.guard_field(SurveyStep::Contact)?;
        self.response.wants_trial = !self.response.wants_trial;
        Ok(self.response.wants_trial)
    }

    fn guard_field(&self, step: SurveyStep) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.require_step(step)
    }

    // ── Submission ──────────────────────────────────────────────────

    /// Lock the form for submission and hand back what should be saved.
    pub fn begin_submission(&mut self) -> Result<(SurveyResponse, Identity), WizardError> {
        self.ensure_editable()?;
        self.require_step(SurveyStep::Contact)?;
        self.ensure_not_transitioning()?;
        if !self.response.has_contact() {
            return Err(WizardError::ContactRequired);
        }
        let identity = self.identity.clone().ok_or(WizardError::NotSignedIn)?;
        self.state.is_submitting = true;
        Ok((self.response.clone(), identity))
    }

    /// Record the outcome of a submission. Success is terminal; failure
    /// leaves the wizard on the contact step ready for a retry.
    pub fn finish_submission(&mut self, saved: bool) {
        self.state.is_submitting = false;
        if saved {
            self.state.is_submitted = true;
            self.state.current_step = SurveyStep::Submitted;
        }
    }

    // ── Guards ──────────────────────────────────────────────────────

    fn ensure_editable(&self) -> Result<(), WizardError> {
        if self.state.is_submitted {
            return Err(WizardError::AlreadySubmitted);
        }
        if self.state.is_submitting {
            return Err(WizardError::SubmissionInFlight);
        }
        Ok(())
    }

    fn ensure_not_transitioning(&self) -> Result<(), WizardError> {
        if self.state.is_transitioning {
            return Err(WizardError::TransitionInFlight);
        }
        Ok(())
    }

    fn require_step(&self, step: SurveyStep) -> Result<(), WizardError> {
        if self.state.is_submitted {
            return Err(WizardError::AlreadySubmitted);
        }
        if self.state.current_step != step {
            return Err(WizardError::WrongStep {
                step: self.state.current_step,
            });
        }
        Ok(())
    }
}
