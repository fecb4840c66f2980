//! SurveySession — drives one wizard against the identity provider and the
//! response store.
//!
//! The session owns the async side of the survey: the pause between steps,
//! sign-in and submission with timeouts, and the identity subscription that
//! keeps the prefilled name and email current. The wizard lock is never
//! held across a collaborator call.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::{AuthSubscription, IdentityProvider};
use crate::config::SurveyConfig;
use crate::error::{self, AuthError, Error, SubmitError, WizardError};
use crate::store::{SavedSubmission, SurveyStore};

use super::model::{
    AddOnTier, LivingSituation, Location, MealFrequency, SubmissionRecord, SurveyResponse,
    UserType,
};
use super::pricing::{self, BudgetRange, PriceBreakdown};
use super::state::SurveyStep;
use super::wizard::{PendingTransition, Wizard};

/// One user's pass through the survey.
pub struct SurveySession {
    id: Uuid,
    /// Idempotency key reused for every submit attempt of this session.
    submission_id: Uuid,
    config: SurveyConfig,
    auth: Arc<dyn IdentityProvider>,
    store: Arc<dyn SurveyStore>,
    wizard: Arc<RwLock<Wizard>>,
    receipt: Arc<RwLock<Option<SavedSubmission>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SurveySession {
    /// Start a session and subscribe to identity changes.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(
        config: SurveyConfig,
        auth: Arc<dyn IdentityProvider>,
        store: Arc<dyn SurveyStore>,
    ) -> Self {
        let id = Uuid::new_v4();
        let wizard = Arc::new(RwLock::new(Wizard::new()));
        let listener = spawn_identity_listener(id, auth.subscribe(), Arc::clone(&wizard));
        info!(session_id = %id, "Survey session started");
        Self {
            id,
            submission_id: Uuid::new_v4(),
            config,
            auth,
            store,
            wizard,
            receipt: Arc::new(RwLock::new(None)),
            listener: Mutex::new(Some(listener)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn submission_id(&self) -> Uuid {
        self.submission_id
    }

    /// Release the identity subscription. Idempotent.
    pub fn close(&self) {
        if let Ok(mut guard) = self.listener.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
                info!(session_id = %self.id, "Survey session closed");
            }
        }
    }

    pub async fn current_step(&self) -> SurveyStep {
        self.wizard.read().await.current_step()
    }

    pub async fn response(&self) -> SurveyResponse {
        self.wizard.read().await.response().clone()
    }

    /// Snapshot for rendering.
    pub async fn view(&self) -> SessionView {
        let wizard = self.wizard.read().await;
        let receipt = self.receipt.read().await;
        SessionView::new(self.id, &wizard, receipt.as_ref())
    }

    // ── Identity ────────────────────────────────────────────────────

    /// Sign in on the welcome step. Success moves to the first question;
    /// failure leaves the user on the welcome step.
    pub async fn sign_in(&self) -> error::Result<SurveyStep> {
        {
            let wizard = self.wizard.read().await;
            if wizard.current_step() != SurveyStep::Welcome {
                return Err(WizardError::WrongStep {
                    step: wizard.current_step(),
                }
                .into());
            }
            if wizard.state().is_transitioning {
                return Err(WizardError::TransitionInFlight.into());
            }
        }

        let limit = self.config.sign_in_timeout;
        let identity = match timeout(limit, self.auth.sign_in()).await {
            Ok(Ok(identity)) => identity,
            Ok(Err(e)) => {
                warn!(session_id = %self.id, error = %e, "Sign-in failed");
                return Err(e.into());
            }
            Err(_) => {
                warn!(session_id = %self.id, timeout = ?limit, "Sign-in timed out");
                return Err(AuthError::Timeout { timeout: limit }.into());
            }
        };

        info!(session_id = %self.id, uid = %identity.uid, "Sign-in succeeded");
        match self.transition(move |w| w.sign_in_succeeded(identity)).await {
            Ok(step) => Ok(step),
            // The identity feed already signed the wizard in and a concurrent
            // continue moved it on while the provider was answering.
            Err(WizardError::WrongStep { .. } | WizardError::TransitionInFlight) => {
                let step = self.current_step().await;
                debug!(session_id = %self.id, step = %step, "Wizard already past welcome");
                Ok(step)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Sign out. The form keeps what was already filled in.
    pub async fn sign_out(&self) -> error::Result<()> {
        self.auth.sign_out().await?;
        self.wizard.write().await.apply_identity(None);
        Ok(())
    }

    // ── Navigation ──────────────────────────────────────────────────

    pub async fn continue_next(&self) -> Result<SurveyStep, WizardError> {
        self.transition(|w| w.continue_next()).await
    }

    pub async fn go_back(&self) -> Result<SurveyStep, WizardError> {
        self.transition(|w| w.go_back()).await
    }

    pub async fn select_user_type(&self, user_type: UserType) -> Result<SurveyStep, WizardError> {
        self.transition(|w| w.select_user_type(user_type)).await
    }

    pub async fn select_living_situation(
        &self,
        living: LivingSituation,
    ) -> Result<SurveyStep, WizardError> {
        self.transition(|w| w.select_living_situation(living)).await
    }

    pub async fn select_location(&self, location: Location) -> Result<SurveyStep, WizardError> {
        self.transition(|w| w.select_location(location)).await
    }

    // ── Field edits ─────────────────────────────────────────────────

    pub async fn set_meal_frequency(&self, frequency: MealFrequency) -> Result<(), WizardError> {
        self.mutate(|w| w.set_meal_frequency(frequency)).await
    }

    pub async fn toggle_premium(&self) -> Result<AddOnTier, WizardError> {
        self.mutate(|w| w.toggle_premium()).await
    }

    pub async fn toggle_protein(&self) -> Result<AddOnTier, WizardError> {
        self.mutate(|w| w.toggle_protein()).await
    }

    pub async fn toggle_extra_serving(&self) -> Result<bool, WizardError> {
        self.mutate(|w| w.toggle_extra_serving()).await
    }

    pub async fn set_budget(&self, budget: u32) -> Result<u32, WizardError> {
        self.mutate(|w| w.set_budget(budget)).await
    }

    pub async fn set_contact(&self, contact: &str) -> Result<(), WizardError> {
        self.mutate(|w| w.set_contact(contact)).await
    }

    pub async fn toggle_trial(&self) -> Result<bool, WizardError> {
        self.mutate(|w| w.toggle_trial()).await
    }

    // ── Submission ──────────────────────────────────────────────────

    /// Save the response. Every attempt of this session carries the same
    /// `submission_id`, so a retry after an ambiguous failure cannot store
    /// the response twice.
    pub async fn submit(&self) -> error::Result<SavedSubmission> {
        let (response, identity) = {
            let mut wizard = self.wizard.write().await;
            wizard.begin_submission().inspect_err(|e| {
                debug!(session_id = %self.id, error = %e, "Submit rejected");
            })?
        };

        let record = SubmissionRecord::from_response(
            &response,
            self.submission_id,
            &identity.uid,
            self.auth.name(),
            &self.config.app_version,
        );

        // The save runs in its own task so that dropping the caller cannot
        // leave the wizard stuck in `is_submitting`.
        let store = Arc::clone(&self.store);
        let wizard = Arc::clone(&self.wizard);
        let receipt = Arc::clone(&self.receipt);
        let limit = self.config.submit_timeout;
        let session_id = self.id;
        let task = tokio::spawn(async move {
            let outcome = match timeout(limit, store.save(&record)).await {
                Ok(Ok(saved)) => Ok(saved),
                Ok(Err(e)) => Err(SubmitError::Store(e)),
                Err(_) => Err(SubmitError::Timeout { timeout: limit }),
            };
            if let Ok(ref saved) = outcome {
                *receipt.write().await = Some(saved.clone());
            }
            wizard.write().await.finish_submission(outcome.is_ok());
            match &outcome {
                Ok(saved) => info!(
                    session_id = %session_id,
                    document_id = %saved.id,
                    duplicate = saved.duplicate,
                    budget = record.budget_per_meal,
                    "Survey submitted"
                ),
                Err(e) => warn!(session_id = %session_id, error = %e, "Survey submission failed"),
            }
            outcome
        });

        match task.await {
            Ok(outcome) => outcome.map_err(Error::from),
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Submission task aborted");
                self.wizard.write().await.finish_submission(false);
                Err(SubmitError::Store(crate::error::DatabaseError::Query(e.to_string())).into())
            }
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────

    async fn mutate<R>(
        &self,
        action: impl FnOnce(&mut Wizard) -> Result<R, WizardError>,
    ) -> Result<R, WizardError> {
        let mut wizard = self.wizard.write().await;
        action(&mut *wizard).inspect_err(|e| {
            debug!(session_id = %self.id, step = %wizard.current_step(), error = %e, "Edit rejected");
        })
    }

    /// Start a step change, wait out the transition delay, then apply it.
    async fn transition(
        &self,
        action: impl FnOnce(&mut Wizard) -> Result<PendingTransition, WizardError>,
    ) -> Result<SurveyStep, WizardError> {
        let pending = {
            let mut wizard = self.wizard.write().await;
            let step = wizard.current_step();
            action(&mut *wizard).inspect_err(|e| {
                debug!(session_id = %self.id, step = %step, error = %e, "Transition rejected");
            })?
        };

        // Completed in a separate task so a dropped caller cannot strand
        // the wizard mid-transition.
        let wizard = Arc::clone(&self.wizard);
        let delay = self.config.transition_delay;
        let task = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            wizard.write().await.complete_transition(pending)
        });

        let step = match task.await {
            Ok(step) => step,
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Transition task aborted");
                self.wizard.write().await.complete_transition(pending)
            }
        };
        info!(session_id = %self.id, from = %pending.from, to = %step, "Step changed");
        Ok(step)
    }
}

impl Drop for SurveySession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Apply every identity the provider reports to the wizard: once with the
/// current value, then on each change.
fn spawn_identity_listener(
    session_id: Uuid,
    mut subscription: AuthSubscription,
    wizard: Arc<RwLock<Wizard>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let initial = subscription.current();
        wizard.write().await.apply_identity(initial);
        while let Some(identity) = subscription.changed().await {
            debug!(
                session_id = %session_id,
                signed_in = identity.is_some(),
                "Identity changed"
            );
            wizard.write().await.apply_identity(identity);
        }
        debug!(session_id = %session_id, "Identity feed closed");
    })
}

/// Which actions the UI should enable.
#[derive(Debug, Clone, Serialize)]
pub struct AvailableActions {
    pub can_continue: bool,
    pub can_go_back: bool,
    pub can_submit: bool,
    pub can_toggle_protein: bool,
}

/// Confirmation of a stored submission.
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    pub document_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Everything a client needs to render the current step.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub step: SurveyStep,
    pub step_index: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub progress_percent: f64,
    pub is_transitioning: bool,
    pub is_submitting: bool,
    pub is_submitted: bool,
    pub signed_in: bool,
    pub response: SurveyResponse,
    pub min_price: u32,
    pub budget_range: BudgetRange,
    pub price_breakdown: PriceBreakdown,
    /// The chosen budget formatted for display, e.g. "₹210".
    pub display_price: String,
    pub actions: AvailableActions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<Receipt>,
}

impl SessionView {
    fn new(session_id: Uuid, wizard: &Wizard, saved: Option<&SavedSubmission>) -> Self {
        let state = wizard.state();
        let response = wizard.response();
        let step = state.current_step;
        Self {
            session_id,
            step,
            step_index: step.index(),
            label: step.label(),
            progress_percent: step.progress_percent(),
            is_transitioning: state.is_transitioning,
            is_submitting: state.is_submitting,
            is_submitted: state.is_submitted,
            signed_in: wizard.is_signed_in(),
            min_price: response.min_price(),
            budget_range: BudgetRange::for_selection(response.add_on, response.needs_extra_serving),
            price_breakdown: PriceBreakdown::for_selection(
                response.add_on,
                response.needs_extra_serving,
            ),
            display_price: pricing::format_rupees(response.budget_per_meal),
            actions: AvailableActions {
                can_continue: wizard.can_continue(),
                can_go_back: wizard.can_go_back(),
                can_submit: wizard.can_submit(),
                can_toggle_protein: wizard.can_toggle_protein(),
            },
            receipt: saved.map(|s| Receipt {
                document_id: s.id.clone(),
                timestamp: s.timestamp,
            }),
            response: response.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::auth::{Identity, LocalIdentityProvider};
    use crate::error::DatabaseError;
    use crate::store::LibSqlBackend;

    fn asha() -> Identity {
        Identity {
            uid: "uid-asha".to_string(),
            display_name: Some("Asha".to_string()),
            email: Some("a@x.com".to_string()),
        }
    }

    fn instant_config() -> SurveyConfig {
        SurveyConfig {
            transition_delay: Duration::ZERO,
            ..SurveyConfig::default()
        }
    }

    /// Store that fails the first `failures` saves, then delegates.
    struct FlakyStore {
        inner: LibSqlBackend,
        failures: AtomicUsize,
    }

    #[async_trait]
    impl SurveyStore for FlakyStore {
        async fn run_migrations(&self) -> Result<(), DatabaseError> {
            self.inner.run_migrations().await
        }
        async fn save(&self, record: &SubmissionRecord) -> Result<SavedSubmission, DatabaseError> {
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(DatabaseError::Query("connection reset".to_string()));
            }
            self.inner.save(record).await
        }
        async fn get_submission(
            &self,
            id: &str,
        ) -> Result<Option<SubmissionRecord>, DatabaseError> {
            self.inner.get_submission(id).await
        }
        async fn count_by_uid(&self, uid: &str) -> Result<usize, DatabaseError> {
            self.inner.count_by_uid(uid).await
        }
    }

    /// Store whose save never completes.
    struct HangingStore;

    #[async_trait]
    impl SurveyStore for HangingStore {
        async fn run_migrations(&self) -> Result<(), DatabaseError> {
            Ok(())
        }
        async fn save(&self, _record: &SubmissionRecord) -> Result<SavedSubmission, DatabaseError> {
            std::future::pending().await
        }
        async fn get_submission(
            &self,
            _id: &str,
        ) -> Result<Option<SubmissionRecord>, DatabaseError> {
            Ok(None)
        }
        async fn count_by_uid(&self, _uid: &str) -> Result<usize, DatabaseError> {
            Ok(0)
        }
    }

    /// Provider whose sign-in waits until the test opens the gate.
    struct GatedProvider {
        inner: LocalIdentityProvider,
        entered: tokio::sync::Notify,
        gate: tokio::sync::Semaphore,
    }

    #[async_trait]
    impl IdentityProvider for GatedProvider {
        fn name(&self) -> &str {
            self.inner.name()
        }
        async fn sign_in(&self) -> Result<Identity, AuthError> {
            self.entered.notify_one();
            let _permit = self.gate.acquire().await.unwrap();
            self.inner.sign_in().await
        }
        async fn sign_out(&self) -> Result<(), AuthError> {
            self.inner.sign_out().await
        }
        fn subscribe(&self) -> AuthSubscription {
            self.inner.subscribe()
        }
    }

    async fn new_session(
        config: SurveyConfig,
        store: Arc<dyn SurveyStore>,
    ) -> (SurveySession, Arc<LocalIdentityProvider>) {
        let provider = Arc::new(LocalIdentityProvider::new("google"));
        let session = SurveySession::start(config, provider.clone(), store);
        (session, provider)
    }

    async fn memory_store() -> Arc<dyn SurveyStore> {
        Arc::new(LibSqlBackend::new_memory().await.unwrap())
    }

    async fn walk_to_contact(session: &SurveySession, provider: &LocalIdentityProvider) {
        provider.stage(asha()).await;
        session.sign_in().await.unwrap();
        session.select_user_type(UserType::Professional).await.unwrap();
        session.select_living_situation(LivingSituation::Flat).await.unwrap();
        session.select_location(Location::Noida).await.unwrap();
        session.set_meal_frequency(MealFrequency::ThreeMeals).await.unwrap();
        session.continue_next().await.unwrap();
        session.continue_next().await.unwrap();
        assert_eq!(session.current_step().await, SurveyStep::Contact);
    }

    #[tokio::test]
    async fn end_to_end_premium_submission() {
        let store = memory_store().await;
        let (session, provider) = new_session(instant_config(), store.clone()).await;

        provider.stage(asha()).await;
        assert_eq!(session.sign_in().await.unwrap(), SurveyStep::UserType);
        let response = session.response().await;
        assert_eq!(response.name, "Asha");
        assert_eq!(response.email, "a@x.com");

        assert_eq!(
            session.select_user_type(UserType::Professional).await.unwrap(),
            SurveyStep::LivingSituation
        );
        assert_eq!(
            session.select_living_situation(LivingSituation::Flat).await.unwrap(),
            SurveyStep::Location
        );
        assert_eq!(
            session.select_location(Location::Noida).await.unwrap(),
            SurveyStep::MealPlan
        );
        session.set_meal_frequency(MealFrequency::ThreeMeals).await.unwrap();
        session.toggle_premium().await.unwrap();
        assert_eq!(session.continue_next().await.unwrap(), SurveyStep::Budget);

        let view = session.view().await;
        assert_eq!(view.response.budget_per_meal, 210);
        assert_eq!(view.budget_range.min, 210);
        assert_eq!(view.display_price, "₹210");

        assert_eq!(session.continue_next().await.unwrap(), SurveyStep::Contact);
        session.set_contact("9999999999").await.unwrap();
        let saved = session.submit().await.unwrap();
        assert!(!saved.duplicate);

        let view = session.view().await;
        assert_eq!(view.step, SurveyStep::Submitted);
        assert!(view.is_submitted);
        assert_eq!(view.display_price, "₹210");
        assert_eq!(view.receipt.unwrap().document_id, saved.id);

        let stored = store.get_submission(&saved.id).await.unwrap().unwrap();
        assert!(stored.is_gym_bro);
        assert!(!stored.needs_protein);
        assert_eq!(stored.min_price_calculated, 210);
        assert_eq!(stored.uid, "uid-asha");
        assert_eq!(stored.auth_provider, "google");
        assert_eq!(stored.app_version, "maakhana-survey-v2");
        assert_eq!(stored.submission_id, session.submission_id());
        assert!(stored.timestamp.is_some());
    }

    #[tokio::test]
    async fn sign_in_failure_stays_on_welcome() {
        let (session, _provider) = new_session(instant_config(), memory_store().await).await;
        let err = session.sign_in().await.unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::NoCredentials)));
        assert_eq!(session.current_step().await, SurveyStep::Welcome);
        assert!(!session.view().await.is_transitioning);
    }

    #[tokio::test]
    async fn already_signed_in_can_continue() {
        let (session, provider) = new_session(instant_config(), memory_store().await).await;
        provider.stage(asha()).await;
        provider.sign_in().await.unwrap();
        // Give the identity listener a chance to run.
        for _ in 0..50 {
            if session.view().await.signed_in {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(session.view().await.signed_in);
        assert_eq!(session.response().await.name, "Asha");
        assert_eq!(session.continue_next().await.unwrap(), SurveyStep::UserType);
    }

    #[tokio::test]
    async fn slow_sign_in_after_concurrent_continue_succeeds() {
        let provider = Arc::new(GatedProvider {
            inner: LocalIdentityProvider::new("google"),
            entered: tokio::sync::Notify::new(),
            gate: tokio::sync::Semaphore::new(0),
        });
        let session = Arc::new(SurveySession::start(
            instant_config(),
            provider.clone(),
            memory_store().await,
        ));

        // Signed in elsewhere; the identity feed reaches the session.
        provider.inner.stage(asha()).await;
        provider.inner.sign_in().await.unwrap();
        for _ in 0..50 {
            if session.view().await.signed_in {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(session.view().await.signed_in);

        let pending = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.sign_in().await })
        };
        provider.entered.notified().await;

        assert_eq!(session.continue_next().await.unwrap(), SurveyStep::UserType);
        provider.gate.add_permits(1);

        assert_eq!(pending.await.unwrap().unwrap(), SurveyStep::UserType);
        assert_eq!(session.current_step().await, SurveyStep::UserType);
    }

    #[tokio::test]
    async fn failed_submit_can_be_retried_without_duplicates() {
        let store = Arc::new(FlakyStore {
            inner: LibSqlBackend::new_memory().await.unwrap(),
            failures: AtomicUsize::new(1),
        });
        let (session, provider) = new_session(instant_config(), store.clone()).await;
        walk_to_contact(&session, &provider).await;
        session.set_contact("9999999999").await.unwrap();

        let err = session.submit().await.unwrap_err();
        assert!(matches!(err, Error::Submit(SubmitError::Store(_))));
        let view = session.view().await;
        assert_eq!(view.step, SurveyStep::Contact);
        assert!(!view.is_submitting);
        assert!(view.actions.can_submit);

        let saved = session.submit().await.unwrap();
        assert!(!saved.duplicate);
        assert_eq!(store.count_by_uid("uid-asha").await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn submit_times_out() {
        let config = SurveyConfig {
            submit_timeout: Duration::from_secs(2),
            ..instant_config()
        };
        let (session, provider) = new_session(config, Arc::new(HangingStore)).await;
        walk_to_contact(&session, &provider).await;
        session.set_contact("9999999999").await.unwrap();

        let err = session.submit().await.unwrap_err();
        assert!(matches!(err, Error::Submit(SubmitError::Timeout { .. })));
        let view = session.view().await;
        assert_eq!(view.step, SurveyStep::Contact);
        assert!(!view.is_submitting);
    }

    #[tokio::test(start_paused = true)]
    async fn transition_waits_for_delay_and_rejects_overlap() {
        let config = SurveyConfig {
            transition_delay: Duration::from_millis(300),
            ..SurveyConfig::default()
        };
        let (session, provider) = new_session(config, Arc::new(HangingStore)).await;
        let session = Arc::new(session);
        provider.stage(asha()).await;
        session.sign_in().await.unwrap();

        let first = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.select_user_type(UserType::Student).await })
        };
        // Let the first pick take the lock and start its pause.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let view = session.view().await;
        assert!(view.is_transitioning);
        assert_eq!(view.step, SurveyStep::UserType);

        assert_eq!(
            session.select_user_type(UserType::Professional).await,
            Err(WizardError::TransitionInFlight)
        );

        assert_eq!(first.await.unwrap().unwrap(), SurveyStep::LivingSituation);
        let view = session.view().await;
        assert!(!view.is_transitioning);
        assert_eq!(view.response.user_type, Some(UserType::Student));
    }

    #[tokio::test]
    async fn back_returns_to_welcome() {
        let (session, provider) = new_session(instant_config(), memory_store().await).await;
        provider.stage(asha()).await;
        session.sign_in().await.unwrap();
        assert_eq!(session.go_back().await.unwrap(), SurveyStep::Welcome);
        assert_eq!(
            session.go_back().await,
            Err(WizardError::NoPreviousStep { step: SurveyStep::Welcome })
        );
    }

    #[tokio::test]
    async fn sign_out_keeps_answers_but_blocks_submit() {
        let (session, provider) = new_session(instant_config(), memory_store().await).await;
        walk_to_contact(&session, &provider).await;
        session.set_contact("9999999999").await.unwrap();

        session.sign_out().await.unwrap();
        assert!(!session.view().await.signed_in);
        assert_eq!(session.response().await.name, "Asha");
        assert!(matches!(
            session.submit().await,
            Err(Error::Wizard(WizardError::NotSignedIn))
        ));
    }

    #[tokio::test]
    async fn view_reports_progress_and_label() {
        let (session, provider) = new_session(instant_config(), memory_store().await).await;
        let view = session.view().await;
        assert_eq!(view.progress_percent, 0.0);
        assert!(view.label.is_none());

        walk_to_contact(&session, &provider).await;
        let view = session.view().await;
        assert_eq!(view.progress_percent, 100.0);
        assert_eq!(view.label.as_deref(), Some("Final Step"));
        assert!(!view.actions.can_submit);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (session, _provider) = new_session(instant_config(), memory_store().await).await;
        session.close();
        session.close();
    }
}
