use crate::{ApiConfig, chat::ChatClient, store::DraftStore};

#[derive(Clone)]
pub struct ApiState {
    pub drafts: DraftStore,
    pub chat: ChatClient,
    /// Token used when a generation request carries none
    pub fallback_token: Option<String>,
    pub max_upload_bytes: usize,
    pub max_source_chars: usize,
}

impl ApiState {
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let chat = ChatClient::new(config)?;

        if config.chat_api_key.is_none() {
            tracing::warn!("CHAT_API_KEY is not set; generation requires a bearer token per request");
        }

        Ok(Self {
            drafts: DraftStore::new(),
            chat,
            fallback_token: config.chat_api_key.clone(),
            max_upload_bytes: config.max_upload_bytes,
            max_source_chars: config.max_source_chars,
        })
    }
}
