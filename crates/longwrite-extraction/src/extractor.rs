use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use longwrite_config::ExtractionConfig;
use longwrite_utils::error::ExtractionError;

use crate::command::CommandExtractor;

/// Turns one source document into plain text
#[async_trait]
pub trait TextExtractor: Send + Sync {
    fn name(&self) -> &str;

    async fn extract(&self, path: &Path) -> Result<String, ExtractionError>;
}

/// Document types the extract command knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Pptx,
    Text,
}

impl DocumentKind {
    /// Classify by extension, case-insensitively
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "pptx" => Some(Self::Pptx),
            "txt" | "md" => Some(Self::Text),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Pptx => "pptx",
            Self::Text => "text",
        }
    }
}

/// Reads `.txt` and `.md` files as UTF-8
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &str {
        "plain-text"
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ExtractionError::Io {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// One extractor per document kind; a kind without one is unsupported
pub struct ExtractorSet {
    pdf: Option<Box<dyn TextExtractor>>,
    pptx: Option<Box<dyn TextExtractor>>,
    text: Box<dyn TextExtractor>,
}

impl ExtractorSet {
    #[must_use]
    pub fn new(
        pdf: Option<Box<dyn TextExtractor>>,
        pptx: Option<Box<dyn TextExtractor>>,
        text: Box<dyn TextExtractor>,
    ) -> Self {
        Self { pdf, pptx, text }
    }

    /// External commands from `[extraction]`, plain text read directly
    #[must_use]
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        let command = |program: &Option<String>, args: &[String]| {
            program.as_ref().map(|program| {
                Box::new(CommandExtractor::new(program.clone(), args.to_vec(), timeout))
                    as Box<dyn TextExtractor>
            })
        };
        Self {
            pdf: command(&config.pdf_command, &config.pdf_args),
            pptx: command(&config.pptx_command, &config.pptx_args),
            text: Box::new(PlainTextExtractor),
        }
    }

    /// Extractor for `kind`.
    ///
    /// # Errors
    ///
    /// `ExtractionError::Unsupported` when no extractor is configured for it.
    pub fn for_kind(&self, kind: DocumentKind) -> Result<&dyn TextExtractor, ExtractionError> {
        let extractor = match kind {
            DocumentKind::Pdf => self.pdf.as_deref(),
            DocumentKind::Pptx => self.pptx.as_deref(),
            DocumentKind::Text => Some(self.text.as_ref()),
        };
        extractor.ok_or_else(|| {
            ExtractionError::Unsupported(format!(
                "no {} extractor configured; set [extraction].{}_command",
                kind.as_str(),
                kind.as_str()
            ))
        })
    }
}
