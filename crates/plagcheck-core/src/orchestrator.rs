use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::backend::{BackendError, PdfBackend};
use crate::config_file::ConfigError;
use crate::dispatch::dispatch;
use crate::llm::ChatModel;
use crate::remote::ServiceCaller;
use crate::rephrase::rephrase;
use crate::summary::summarize;
use crate::{ServiceResult, Settings};

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("No text provided. Please provide text or upload a PDF file.")]
    NoText,
    #[error("No text provided for rephrasing.")]
    NoRephraseText,
    #[error("Only PDF files are supported")]
    UnsupportedFile,
    #[error(transparent)]
    Extraction(#[from] BackendError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Every rephrasing provider failed; carries the last provider's error.
    #[error("Rephrasing failed: {0}")]
    Rephrase(String),
    #[error("Rephrasing returned empty text")]
    EmptyRephrase,
    #[error("request cancelled")]
    Cancelled,
    #[error("internal error: {0}")]
    Internal(String),
}

impl CheckError {
    /// Whether the caller supplied bad input, as opposed to a server-side failure.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CheckError::NoText
                | CheckError::NoRephraseText
                | CheckError::UnsupportedFile
                | CheckError::Extraction(_)
        )
    }
}

/// An uploaded document.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Raw input of a check request: pasted text, an uploaded file, or both.
#[derive(Debug, Clone, Default)]
pub struct CheckInput {
    pub text: Option<String>,
    pub file: Option<UploadedFile>,
}

impl CheckInput {
    /// Turn the input into the text to check. A file wins over pasted text.
    ///
    /// Only `.pdf` files are accepted; extraction runs on a blocking thread.
    pub async fn resolve(self, pdf: Arc<dyn PdfBackend>) -> Result<String, CheckError> {
        let text = match self.file {
            Some(file) => {
                if !file.filename.to_lowercase().ends_with(".pdf") {
                    return Err(CheckError::UnsupportedFile);
                }
                tokio::task::spawn_blocking(move || pdf.extract_text(&file.data))
                    .await
                    .map_err(|e| CheckError::Internal(format!("task join error: {e}")))??
            }
            None => self.text.unwrap_or_default(),
        };

        if text.trim().is_empty() {
            return Err(CheckError::NoText);
        }
        Ok(text)
    }
}

/// Response of the check flow.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub summary: String,
    pub plagiarism_results: Vec<ServiceResult>,
    pub ai_detection_results: Vec<ServiceResult>,
    pub original_text: String,
}

/// Response of the rephrase-then-check flow.
#[derive(Debug, Clone, Serialize)]
pub struct RephraseReport {
    pub summary: String,
    pub rephrased_text: String,
    pub plagiarism_results: Vec<ServiceResult>,
    pub ai_detection_results: Vec<ServiceResult>,
    pub original_text: String,
    /// Every rephrasing attempt, in order.
    #[serde(skip)]
    pub rephrase_attempts: Vec<ServiceResult>,
}

/// Runs the check and rephrase flows against one settings snapshot.
#[derive(Clone)]
pub struct Orchestrator {
    settings: Arc<Settings>,
    caller: Arc<dyn ServiceCaller>,
    llm: Arc<dyn ChatModel>,
}

impl Orchestrator {
    pub fn new(
        settings: Arc<Settings>,
        caller: Arc<dyn ServiceCaller>,
        llm: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            settings,
            caller,
            llm,
        }
    }

    /// Dispatch `text` to every plagiarism and AI-detection service, then summarize.
    pub async fn check(
        &self,
        text: String,
        cancel: &CancellationToken,
    ) -> Result<CheckReport, CheckError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CheckError::Cancelled),
            report = self.run_check(text) => report,
        }
    }

    /// Rephrase `text` with the first working provider, then check the rephrased text.
    pub async fn rephrase_and_check(
        &self,
        text: String,
        cancel: &CancellationToken,
    ) -> Result<RephraseReport, CheckError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CheckError::Cancelled),
            report = self.run_rephrase(text) => report,
        }
    }

    async fn run_check(&self, text: String) -> Result<CheckReport, CheckError> {
        if text.trim().is_empty() {
            return Err(CheckError::NoText);
        }

        tracing::info!(
            chars = text.chars().count(),
            plagiarism = self.settings.plagiarism.len(),
            ai_detection = self.settings.ai_detection.len(),
            "running check"
        );

        let (plagiarism_results, ai_detection_results) = self.dispatch_categories(&text).await;
        let summary = summarize(
            &text,
            &plagiarism_results,
            &ai_detection_results,
            self.llm.as_ref(),
            &self.settings.llm,
        )
        .await;

        Ok(CheckReport {
            summary,
            plagiarism_results,
            ai_detection_results,
            original_text: text,
        })
    }

    async fn run_rephrase(&self, text: String) -> Result<RephraseReport, CheckError> {
        if text.trim().is_empty() {
            return Err(CheckError::NoRephraseText);
        }

        let outcome = rephrase(
            &text,
            &self.settings.rephrasing,
            self.caller.as_ref(),
            self.llm.as_ref(),
            &self.settings.llm,
            self.settings.request_timeout,
        )
        .await;

        if !outcome.succeeded() {
            let reason = outcome.result.error().unwrap_or_default().to_string();
            return Err(CheckError::Rephrase(reason));
        }
        if outcome.text.is_empty() {
            return Err(CheckError::EmptyRephrase);
        }

        let rephrased_text = outcome.text;
        let (plagiarism_results, ai_detection_results) =
            self.dispatch_categories(&rephrased_text).await;
        let summary = summarize(
            &rephrased_text,
            &plagiarism_results,
            &ai_detection_results,
            self.llm.as_ref(),
            &self.settings.llm,
        )
        .await;

        Ok(RephraseReport {
            summary,
            rephrased_text,
            plagiarism_results,
            ai_detection_results,
            original_text: text,
            rephrase_attempts: outcome.attempts,
        })
    }

    /// Both categories run concurrently; each keeps its configuration order.
    async fn dispatch_categories(&self, text: &str) -> (Vec<ServiceResult>, Vec<ServiceResult>) {
        let timeout = self.settings.request_timeout;
        tokio::join!(
            dispatch(text, &self.settings.plagiarism, self.caller.as_ref(), timeout),
            dispatch(text, &self.settings.ai_detection, self.caller.as_ref(), timeout),
        )
    }
}
