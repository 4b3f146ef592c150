use super::{ChatBackend, ListResponse};
use crate::error::ClientResult;
use crate::http::RestClient;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::multipart::{Form, Part};
use shared::models::{SendMessageRequest, SupportMessage};
use std::path::Path;

const CHAT_PATH: &str = "support/chat/";

#[async_trait]
impl ChatBackend for RestClient {
    async fn fetch_messages(
        &self,
        after: Option<DateTime<Utc>>,
    ) -> ClientResult<Vec<SupportMessage>> {
        let list: ListResponse<SupportMessage> = match after {
            Some(cursor) => {
                let after = cursor.to_rfc3339_opts(SecondsFormat::Micros, true);
                self.get_query(CHAT_PATH, &[("after", after)]).await?
            }
            None => self.get(CHAT_PATH).await?,
        };
        Ok(list.into_vec())
    }

    async fn send_text(&self, content: &str) -> ClientResult<SupportMessage> {
        let body = SendMessageRequest {
            content: content.to_string(),
        };
        self.post(CHAT_PATH, &body).await
    }

    async fn send_attachment(&self, path: &Path, caption: &str) -> ClientResult<SupportMessage> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        let caption = caption.to_string();

        self.post_multipart(CHAT_PATH, || {
            Form::new()
                .text("content", caption.clone())
                .part(
                    "attachment",
                    Part::bytes(bytes.clone()).file_name(file_name.clone()),
                )
        })
        .await
    }
}
