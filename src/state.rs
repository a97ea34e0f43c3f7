use crate::config::Config;
use crate::insight::{GeminiClient, InsightRequester, TextGenerator};
use crate::models::Records;
use crate::storage::RecordStore;
use crate::submission::ReportDraft;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: RecordStore,
    /// Current snapshot; replaced wholesale on every submission.
    pub records: Arc<Mutex<Records>>,
    pub draft: Arc<Mutex<ReportDraft>>,
    pub insight: InsightRequester,
}

impl AppState {
    /// Loads the persisted records and wires the Gemini client from `config`.
    pub async fn open(config: Config) -> Self {
        let generator = Arc::new(GeminiClient::from_config(&config));
        Self::with_generator(config, generator).await
    }

    pub async fn with_generator(config: Config, generator: Arc<dyn TextGenerator>) -> Self {
        let store = RecordStore::new(&config.data_dir);
        let records = store.load().await;
        let insight = InsightRequester::new(generator, config.utc_offset);
        Self {
            config: Arc::new(config),
            store,
            records: Arc::new(Mutex::new(records)),
            draft: Arc::new(Mutex::new(ReportDraft::default())),
            insight,
        }
    }

    /// Cheap clone of the current record list.
    pub async fn snapshot(&self) -> Records {
        Arc::clone(&*self.records.lock().await)
    }
}
