//! Onboarding survey: pricing, the step wizard, and the session layer
//! that connects them to sign-in and storage.
//!
//! The wizard walks a signed-in user through six fixed steps: who they
//! are, where they live, their delivery area, their meal plan and add-ons,
//! a per-meal budget, and a contact number. The finished response is
//! written to the store once, at submission.

pub mod model;
pub mod pricing;
pub mod registry;
pub mod routes;
pub mod session;
pub mod state;
pub mod wizard;

pub use model::{
    AddOnTier, LivingSituation, Location, MealFrequency, SubmissionRecord, SurveyResponse,
    UserType,
};
pub use registry::SessionRegistry;
pub use routes::{SurveyRouteState, survey_routes};
pub use session::{SessionView, SurveySession};
pub use state::{SurveyStep, WizardState};
pub use wizard::{PendingTransition, Wizard};
