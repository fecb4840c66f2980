//! Survey steps and the flags that track progress through them.

use serde::{Deserialize, Serialize};

/// Number of survey steps after the welcome screen.
pub const SURVEY_STEPS: u8 = 6;

/// The steps of the survey.
///
/// Progresses linearly: Welcome → UserType → LivingSituation → Location →
/// MealPlan → Budget → Contact → Submitted. Every step from UserType to
/// Contact can also go back one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyStep {
    Welcome,
    UserType,
    LivingSituation,
    Location,
    MealPlan,
    Budget,
    Contact,
    Submitted,
}

impl SurveyStep {
    /// Numeric position: 0 for Welcome through 6 for Contact.
    /// Submitted is past the end and has no index.
    pub fn index(&self) -> Option<u8> {
        use SurveyStep::*;
        match self {
            Welcome => Some(0),
            UserType => Some(1),
            LivingSituation => Some(2),
            Location => Some(3),
            MealPlan => Some(4),
            Budget => Some(5),
            Contact => Some(6),
            Submitted => None,
        }
    }

    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: SurveyStep) -> bool {
        self.next() == Some(target) || self.previous() == Some(target)
    }

    /// Whether this step is terminal (survey is done).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Submitted)
    }

    /// Get the next step in the linear progression, if any.
    pub fn next(&self) -> Option<SurveyStep> {
        use SurveyStep::*;
        match self {
            Welcome => Some(UserType),
            UserType => Some(LivingSituation),
            LivingSituation => Some(Location),
            Location => Some(MealPlan),
            MealPlan => Some(Budget),
            Budget => Some(Contact),
            Contact => Some(Submitted),
            Submitted => None,
        }
    }

    /// The step a back action leads to. None on Welcome and Submitted.
    pub fn previous(&self) -> Option<SurveyStep> {
        use SurveyStep::*;
        match self {
            Welcome | Submitted => None,
            UserType => Some(Welcome),
            LivingSituation => Some(UserType),
            Location => Some(LivingSituation),
            MealPlan => Some(Location),
            Budget => Some(MealPlan),
            Contact => Some(Budget),
        }
    }

    /// Progress bar fill, `index / 6 * 100`.
    pub fn progress_percent(&self) -> f64 {
        match self.index() {
            Some(i) => f64::from(i) / f64::from(SURVEY_STEPS) * 100.0,
            None => 100.0,
        }
    }

    /// Heading shown above the step, if the step has one.
    pub fn label(&self) -> Option<String> {
        match self {
            Self::Contact => Some("Final Step".to_string()),
            Self::Welcome | Self::Submitted => None,
            other => other.index().map(|i| format!("Step {i}/{SURVEY_STEPS}")),
        }
    }
}

impl Default for SurveyStep {
    fn default() -> Self {
        Self::Welcome
    }
}

impl std::fmt::Display for SurveyStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Welcome => "welcome",
            Self::UserType => "user_type",
            Self::LivingSituation => "living_situation",
            Self::Location => "location",
            Self::MealPlan => "meal_plan",
            Self::Budget => "budget",
            Self::Contact => "contact",
            Self::Submitted => "submitted",
        };
        write!(f, "{s}")
    }
}

/// Navigation flags for one survey session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardState {
    pub current_step: SurveyStep,
    /// True only while a step change is animating.
    pub is_transitioning: bool,
    pub is_submitting: bool,
    /// Terminal; set together with `current_step = Submitted`.
    pub is_submitted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SurveyStep; 8] = [
        SurveyStep::Welcome,
        SurveyStep::UserType,
        SurveyStep::LivingSituation,
        SurveyStep::Location,
        SurveyStep::MealPlan,
        SurveyStep::Budget,
        SurveyStep::Contact,
        SurveyStep::Submitted,
    ];

    #[test]
    fn valid_transitions() {
        use SurveyStep::*;
        let forward = [
            (Welcome, UserType),
            (UserType, LivingSituation),
            (LivingSituation, Location),
            (Location, MealPlan),
            (MealPlan, Budget),
            (Budget, Contact),
            (Contact, Submitted),
        ];
        for (from, to) in forward {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
        assert!(Contact.can_transition_to(Budget));
        assert!(UserType.can_transition_to(Welcome));
    }

    #[test]
    fn invalid_transitions() {
        use SurveyStep::*;
        // Skip steps
        assert!(!Welcome.can_transition_to(Location));
        assert!(!MealPlan.can_transition_to(Contact));
        // Terminal
        assert!(!Submitted.can_transition_to(Contact));
        // Self-transition
        assert!(!Budget.can_transition_to(Budget));
    }

    #[test]
    fn back_yields_previous_index() {
        for step in ALL {
            match (step.index(), step.previous()) {
                (Some(0), prev) => assert!(prev.is_none()),
                (Some(n), Some(prev)) => assert_eq!(prev.index(), Some(n - 1)),
                (None, prev) => assert!(prev.is_none()),
                (Some(n), None) => panic!("step {n} should have a previous step"),
            }
        }
    }

    #[test]
    fn next_walks_all_steps() {
        let mut current = SurveyStep::Welcome;
        for expected in &ALL[1..] {
            let next = current.next().unwrap();
            assert_eq!(next, *expected);
            current = next;
        }
        assert!(current.next().is_none());
        assert!(current.is_terminal());
    }

    #[test]
    fn progress() {
        assert_eq!(SurveyStep::Welcome.progress_percent(), 0.0);
        assert_eq!(SurveyStep::Location.progress_percent(), 50.0);
        assert_eq!(SurveyStep::Contact.progress_percent(), 100.0);
        assert_eq!(SurveyStep::Submitted.progress_percent(), 100.0);
    }

    #[test]
    fn labels() {
        assert_eq!(SurveyStep::Welcome.label(), None);
        assert_eq!(SurveyStep::UserType.label().as_deref(), Some("Step 1/6"));
        assert_eq!(SurveyStep::Budget.label().as_deref(), Some("Step 5/6"));
        assert_eq!(SurveyStep::Contact.label().as_deref(), Some("Final Step"));
    }

    #[test]
    fn display_matches_serde() {
        for step in ALL {
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(format!("\"{step}\""), json, "Display and serde should match for {step:?}");
        }
    }

    #[test]
    fn default_state() {
        let state = WizardState::default();
        assert_eq!(state.current_step, SurveyStep::Welcome);
        assert!(!state.is_transitioning);
        assert!(!state.is_submitting);
        assert!(!state.is_submitted);
    }
}
