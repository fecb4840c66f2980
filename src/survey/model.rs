//! Survey answer types and the persisted submission record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pricing::{self, DEFAULT_BUDGET};

/// Who the subscriber is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Student,
    Professional,
}

/// Where the subscriber lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LivingSituation {
    PgHostel,
    Flat,
}

/// Delivery area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    GreaterNoida,
    Noida,
    /// Announced but not yet delivered to.
    Delhi,
}

impl Location {
    /// Whether the area can be picked right now.
    pub fn is_selectable(&self) -> bool {
        !matches!(self, Self::Delhi)
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::GreaterNoida => "greater_noida",
            Self::Noida => "noida",
            Self::Delhi => "delhi",
        };
        write!(f, "{s}")
    }
}

/// Meals per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MealFrequency {
    #[serde(rename = "2_meals")]
    TwoMeals,
    #[serde(rename = "3_meals")]
    ThreeMeals,
}

/// The add-on package. Premium ("Gym Bro") already includes the protein
/// boost, so the two can never be selected together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddOnTier {
    #[default]
    None,
    Protein,
    Premium,
}

impl AddOnTier {
    /// Map the legacy `isGymBro` / `needsProtein` pair onto a tier.
    /// Premium wins when both are set.
    pub fn from_flags(is_gym_bro: bool, needs_protein: bool) -> Self {
        match (is_gym_bro, needs_protein) {
            (true, _) => Self::Premium,
            (false, true) => Self::Protein,
            (false, false) => Self::None,
        }
    }

    pub fn needs_protein(&self) -> bool {
        matches!(self, Self::Protein)
    }

    pub fn is_gym_bro(&self) -> bool {
        matches!(self, Self::Premium)
    }
}

/// Everything the user has told us so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyResponse {
    pub user_type: Option<UserType>,
    pub living_situation: Option<LivingSituation>,
    pub location: Option<Location>,
    pub meal_frequency: Option<MealFrequency>,
    pub add_on: AddOnTier,
    pub needs_extra_serving: bool,
    /// Rupees per meal. Kept within `[min_price, MAX_BUDGET]`.
    pub budget_per_meal: u32,
    /// Prefilled from the identity provider.
    pub name: String,
    /// Prefilled from the identity provider.
    pub email: String,
    pub contact: String,
    pub wants_trial: bool,
}

impl Default for SurveyResponse {
    fn default() -> Self {
        Self {
            user_type: None,
            living_situation: None,
            location: None,
            meal_frequency: None,
            add_on: AddOnTier::None,
            needs_extra_serving: false,
            budget_per_meal: DEFAULT_BUDGET,
            name: String::new(),
            email: String::new(),
            contact: String::new(),
            wants_trial: false,
        }
    }
}

impl SurveyResponse {
    /// Minimum allowed price for the current selections.
    pub fn min_price(&self) -> u32 {
        pricing::min_price(self.add_on, self.needs_extra_serving)
    }

    /// Raise the budget to the current minimum if a selection pushed the
    /// minimum above it. Must run after every write to `add_on` or
    /// `needs_extra_serving`.
    pub fn restore_budget_floor(&mut self) {
        self.budget_per_meal = pricing::clamp_budget(self.budget_per_meal, self.min_price());
    }

    /// Whether anything has been entered as a contact number.
    pub fn has_contact(&self) -> bool {
        !self.contact.is_empty()
    }
}

/// The document written to the store at submission.
///
/// Field names follow the collection's existing camelCase layout, including
/// the legacy `needsProtein` / `isGymBro` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    /// Idempotency key, minted once per session and reused across retries.
    pub submission_id: Uuid,
    pub user_type: Option<UserType>,
    pub living_situation: Option<LivingSituation>,
    pub location: Option<Location>,
    pub meal_frequency: Option<MealFrequency>,
    pub needs_protein: bool,
    pub needs_extra_serving: bool,
    pub is_gym_bro: bool,
    pub budget_per_meal: u32,
    pub name: String,
    pub email: String,
    pub contact: String,
    pub wants_trial: bool,
    pub min_price_calculated: u32,
    pub uid: String,
    pub auth_provider: String,
    pub app_version: String,
    /// Assigned by the store when the record is saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl SubmissionRecord {
    pub fn from_response(
        response: &SurveyResponse,
        submission_id: Uuid,
        uid: &str,
        auth_provider: &str,
        app_version: &str,
    ) -> Self {
        Self {
            submission_id,
            user_type: response.user_type,
            living_situation: response.living_situation,
            location: response.location,
            meal_frequency: response.meal_frequency,
            needs_protein: response.add_on.needs_protein(),
            needs_extra_serving: response.needs_extra_serving,
            is_gym_bro: response.add_on.is_gym_bro(),
            budget_per_meal: response.budget_per_meal,
            name: response.name.clone(),
            email: response.email.clone(),
            contact: response.contact.clone(),
            wants_trial: response.wants_trial,
            min_price_calculated: response.min_price(),
            uid: uid.to_string(),
            auth_provider: auth_provider.to_string(),
            app_version: app_version.to_string(),
            timestamp: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_response_is_empty() {
        let r = SurveyResponse::default();
        assert!(r.user_type.is_none());
        assert!(r.meal_frequency.is_none());
        assert_eq!(r.add_on, AddOnTier::None);
        assert_eq!(r.budget_per_meal, 110);
        assert!(!r.has_contact());
    }

    #[test]
    fn wire_names() {
        assert_eq!(serde_json::to_string(&LivingSituation::PgHostel).unwrap(), "\"pg_hostel\"");
        assert_eq!(serde_json::to_string(&Location::GreaterNoida).unwrap(), "\"greater_noida\"");
        assert_eq!(serde_json::to_string(&MealFrequency::ThreeMeals).unwrap(), "\"3_meals\"");
        let two: MealFrequency = serde_json::from_str("\"2_meals\"").unwrap();
        assert_eq!(two, MealFrequency::TwoMeals);
    }

    #[test]
    fn only_delhi_is_unselectable() {
        assert!(Location::Noida.is_selectable());
        assert!(Location::GreaterNoida.is_selectable());
        assert!(!Location::Delhi.is_selectable());
    }

    #[test]
    fn tier_from_flags_prefers_premium() {
        assert_eq!(AddOnTier::from_flags(false, false), AddOnTier::None);
        assert_eq!(AddOnTier::from_flags(false, true), AddOnTier::Protein);
        assert_eq!(AddOnTier::from_flags(true, false), AddOnTier::Premium);
        assert_eq!(AddOnTier::from_flags(true, true), AddOnTier::Premium);
    }

    #[test]
    fn tier_flags_are_exclusive() {
        for tier in [AddOnTier::None, AddOnTier::Protein, AddOnTier::Premium] {
            assert!(!(tier.is_gym_bro() && tier.needs_protein()));
        }
    }

    #[test]
    fn restore_budget_floor_raises_to_minimum() {
        let mut r = SurveyResponse {
            add_on: AddOnTier::Premium,
            ..Default::default()
        };
        r.restore_budget_floor();
        assert_eq!(r.budget_per_meal, 210);
    }

    #[test]
    fn whitespace_contact_counts_as_entered() {
        let r = SurveyResponse {
            contact: " ".to_string(),
            ..Default::default()
        };
        assert!(r.has_contact());
    }

    #[test]
    fn record_uses_camel_case_and_legacy_flags() {
        let response = SurveyResponse {
            user_type: Some(UserType::Professional),
            location: Some(Location::Noida),
            meal_frequency: Some(MealFrequency::ThreeMeals),
            add_on: AddOnTier::Premium,
            budget_per_meal: 210,
            contact: " 9999999999 ".to_string(),
            ..Default::default()
        };
        let record = SubmissionRecord::from_response(
            &response,
            Uuid::new_v4(),
            "uid-1",
            "google",
            "maakhana-survey-v2",
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["userType"], "professional");
        assert_eq!(json["mealFrequency"], "3_meals");
        assert_eq!(json["isGymBro"], true);
        assert_eq!(json["needsProtein"], false);
        assert_eq!(json["minPriceCalculated"], 210);
        assert_eq!(json["contact"], " 9999999999 ");
        assert_eq!(json["authProvider"], "google");
        assert_eq!(json["appVersion"], "maakhana-survey-v2");
        assert!(json.get("timestamp").is_none());
    }
}
