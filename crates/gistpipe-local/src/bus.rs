use crate::orchestrate::Orchestrator;
use crate::page::summarize_page;
use crate::summarize::quick_summary;
use gistpipe_core::{Error, Message, MessageBus, PageContentProvider, Reply, Result};
use std::sync::Arc;

/// In-process [`MessageBus`] over an orchestrator and, for page messages, the active page.
#[derive(Clone)]
pub struct LocalBus {
    page: Option<Arc<dyn PageContentProvider>>,
    orchestrator: Orchestrator,
}

impl LocalBus {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            page: None,
            orchestrator,
        }
    }

    /// Attach the page that `SummarizePage` messages read from.
    pub fn with_page(mut self, page: Arc<dyn PageContentProvider>) -> Self {
        self.page = Some(page);
        self
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }
}

#[async_trait::async_trait]
impl MessageBus for LocalBus {
    async fn request(&self, msg: Message) -> Result<Reply> {
        match msg {
            Message::SummarizePage { options } => {
                let page = self
                    .page
                    .as_ref()
                    .ok_or_else(|| Error::InvalidInput("no page to summarize".to_string()))?;
                let out = summarize_page(page.as_ref(), &options).await?;
                Ok(Reply::Summary(out))
            }
            Message::SummarizeSelection { selected_text } => {
                Ok(match quick_summary(&selected_text) {
                    Some(s) => Reply::Quick(s),
                    None => Reply::Ignored,
                })
            }
            Message::SummarizeText { text, language } => {
                let out = self.orchestrator.summarize(&text, &language).await?;
                Ok(Reply::Outcome(out))
            }
        }
    }
}
