use std::path::PathBuf;
use std::sync::Arc;

use plagcheck_core::{
    ChatModel, ConfigError, HttpCaller, OpenAiChat, Orchestrator, PdfBackend, ServiceCaller,
    load_config,
};
use plagcheck_pdf::PdfExtractBackend;
use tokio_util::sync::CancellationToken;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub config_path: PathBuf,
    pub frontend_dir: PathBuf,
    pub caller: Arc<dyn ServiceCaller>,
    pub llm: Arc<dyn ChatModel>,
    pub pdf: Arc<dyn PdfBackend>,
    /// Cancelled on server shutdown; in-flight flows abort.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Production wiring: one pooled HTTP client shared by services and the LLM.
    pub fn new(config_path: PathBuf, frontend_dir: PathBuf) -> Self {
        let caller = HttpCaller::default();
        let llm = OpenAiChat::new(caller.client().clone());
        Self {
            config_path,
            frontend_dir,
            caller: Arc::new(caller),
            llm: Arc::new(llm),
            pdf: Arc::new(PdfExtractBackend::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Build an orchestrator from a fresh read of the config file, so edits
    /// take effect on the next request.
    pub fn orchestrator(&self) -> Result<Orchestrator, ConfigError> {
        let settings = load_config(&self.config_path)?.into_settings();
        Ok(Orchestrator::new(
            Arc::new(settings),
            self.caller.clone(),
            self.llm.clone(),
        ))
    }
}
