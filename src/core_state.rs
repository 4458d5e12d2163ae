//! Application state shared by every request.
//!
//! Catalogs and collaborators are built once here and injected read-only
//! into the triage engine and the wellbeing service.

use std::sync::Arc;

use crate::advisory::{AdvisoryClient, AdvisoryService, OpenAiCompatClient};
use crate::config::Settings;
use crate::db::{DatabaseError, SqliteStore, TriageRepository};
use crate::engine::TriageEngine;
use crate::observation::{self, ObservationSource};
use crate::safety::SafetyInterceptor;
use crate::triage::{QuestionCatalog, QuestionRouter};
use crate::wellbeing::WellbeingService;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Database initialisation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Advisory client initialisation failed: {0}")]
    Advisory(#[from] crate::advisory::AdvisoryError),
}

pub struct CoreState {
    pub settings: Settings,
    pub engine: TriageEngine,
    pub wellbeing: WellbeingService,
}

impl CoreState {
    /// Wire production collaborators from settings.
    pub fn from_settings(settings: Settings) -> Result<Self, StartupError> {
        let repo: Arc<dyn TriageRepository> = Arc::new(SqliteStore::open(&settings.db_path)?);
        let client: Arc<dyn AdvisoryClient> = {
            let client = OpenAiCompatClient::new(&settings.advisory)?;
            if !client.is_configured() {
                tracing::warn!("No advisory API key configured, chat replies will use the fallback");
            }
            Arc::new(client)
        };
        let observations = observation::from_settings(&settings.vision);

        tracing::info!(
            db = %settings.db_path.display(),
            advisory_model = %settings.advisory.model,
            vision = settings.vision.base_url.is_some(),
            "Core state initialised"
        );
        Ok(Self::with_collaborators(settings, repo, client, observations))
    }

    /// Wire explicit collaborators (tests, embedding).
    pub fn with_collaborators(
        settings: Settings,
        repo: Arc<dyn TriageRepository>,
        advisory: Arc<dyn AdvisoryClient>,
        observations: Arc<dyn ObservationSource>,
    ) -> Self {
        let engine = TriageEngine::new(
            repo.clone(),
            Arc::new(SafetyInterceptor::standard()),
            QuestionRouter::new(QuestionCatalog),
            observations,
        );
        let advisory = AdvisoryService::new(advisory, settings.advisory.timeout);
        let wellbeing = WellbeingService::new(repo, advisory, settings.risk_policy);

        Self {
            settings,
            engine,
            wellbeing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::MockAdvisoryClient;
    use crate::engine::{TextInput, TriageInput};
    use crate::observation::NoObservations;

    #[tokio::test]
    async fn collaborators_are_shared_between_services() {
        let state = CoreState::with_collaborators(
            Settings::default(),
            Arc::new(SqliteStore::open_in_memory().unwrap()),
            Arc::new(MockAdvisoryClient::failing("offline")),
            Arc::new(NoObservations),
        );
        let r = state
            .engine
            .start_or_continue(None, TriageInput::Text(TextInput::new("headache")))
            .await
            .unwrap();
        assert!(state.engine.get_session(&r.session_id).is_ok());
        assert!(state.wellbeing.process_message("u", "hello").await.is_ok());
    }

    #[test]
    fn file_backed_state_opens() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            db_path: dir.path().join("nested").join("triage.db"),
            ..Settings::default()
        };
        let state = CoreState::from_settings(settings).unwrap();
        assert!(state.settings.db_path.exists());
    }
}
