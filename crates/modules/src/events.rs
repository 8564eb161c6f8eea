//! Scheduled-events module: a small document-store-backed collection with a
//! paginated listing, exercising routes, typed date parameters, and the
//! validation error path.

use std::sync::Arc;

use {
    anyhow::Context as _,
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    herald_common::types::{Page, Reply},
    herald_store::{Document, DocumentStore},
    serde_json::json,
    tracing::info,
};

use herald_commands::{Command, CommandError, CommandResult, Request, Response, Route};

const COLLECTION: &str = "events";
const EVENTS_PER_PAGE: usize = 5;

/// `!events`, `!events add <title> <start>`, `!events remove <title>`.
pub struct EventsCommand {
    store: Arc<dyn DocumentStore>,
    routes: Vec<Route>,
}

impl EventsCommand {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            routes: vec![
                Route::new("events"),
                Route::new("events add :title :start:date"),
                Route::new("events remove :title"),
            ],
        }
    }

    fn document_id(title: &str) -> String {
        title.trim().to_lowercase().replace(char::is_whitespace, "-")
    }

    async fn list(&self, response: &mut Response) -> CommandResult {
        let mut events = self.store.list(COLLECTION).await.context("listing events")?;
        if events.is_empty() {
            response.set_reply("No events scheduled.");
            return Ok(());
        }
        events.sort_by(|a, b| {
            let start = |d: &Document| d.body["start"].as_str().map(str::to_owned);
            start(a).cmp(&start(b))
        });

        let lines: Vec<String> = events
            .iter()
            .map(|doc| {
                let title = doc.body["title"].as_str().unwrap_or(&doc.id);
                let start = doc.body["start"]
                    .as_str()
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .map(|d| d.with_timezone(&Utc).format("%Y-%m-%d %H:%M UTC").to_string())
                    .unwrap_or_else(|| "unscheduled".to_string());
                format!("• {title} — {start}")
            })
            .collect();

        let pages: Vec<Page> = lines
            .chunks(EVENTS_PER_PAGE)
            .enumerate()
            .map(|(index, chunk)| Page {
                text: format!(
                    "**Upcoming events ({}/{})**\n{}",
                    index + 1,
                    lines.len().div_ceil(EVENTS_PER_PAGE),
                    chunk.join("\n"),
                ),
                ..Page::default()
            })
            .collect();

        if pages.len() == 1 {
            response.set_reply(pages.into_iter().next().map(|p| p.text).unwrap_or_default());
        } else {
            response.set_reply(Reply::paginated(pages));
        }
        Ok(())
    }

    async fn add(&self, request: &Request, response: &mut Response) -> CommandResult {
        let title = request
            .text("title")
            .ok_or_else(|| CommandError::validation("An event needs a title."))?
            .to_string();
        let start = request
            .date("start")
            .ok_or_else(|| CommandError::validation("An event needs a start time."))?;

        let id = Self::document_id(&title);
        if self
            .store
            .get(COLLECTION, &id)
            .await
            .context("looking up event")?
            .is_some()
        {
            return Err(CommandError::validation(format!(
                "An event called '{title}' already exists."
            )));
        }

        self.store
            .insert(COLLECTION, Document {
                id,
                owner_id: request.message.author.id.clone(),
                body: json!({ "title": title, "start": start.to_rfc3339() }),
            })
            .await
            .context("storing event")?;
        info!(title = %title, "event scheduled");
        response.set_reply(format!(
            "Scheduled '{title}' for {}.",
            start.format("%Y-%m-%d %H:%M UTC"),
        ));
        Ok(())
    }

    async fn remove(&self, request: &Request, response: &mut Response) -> CommandResult {
        let title = request
            .text("title")
            .ok_or_else(|| CommandError::validation("Which event should I remove?"))?;
        let id = Self::document_id(title);
        if self
            .store
            .get(COLLECTION, &id)
            .await
            .context("looking up event")?
            .is_none()
        {
            return Err(CommandError::validation(format!(
                "There is no event called '{title}'."
            )));
        }
        self.store
            .remove(COLLECTION, &id)
            .await
            .context("removing event")?;
        response.set_reply(format!("Removed '{title}'."));
        Ok(())
    }
}

#[async_trait]
impl Command for EventsCommand {
    fn module_id(&self) -> &str {
        "events"
    }

    fn id(&self) -> &str {
        "manage"
    }

    fn routes(&self) -> &[Route] {
        &self.routes
    }

    async fn execute(&self, request: &Request, response: &mut Response) -> CommandResult {
        match request.route_template() {
            "events add :title :start:date" => self.add(request, response).await,
            "events remove :title" => self.remove(request, response).await,
            _ => self.list(response).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use {
        chrono::TimeZone,
        herald_commands::{ParamValue, Parameter},
        herald_common::types::{ChannelRef, ChatMessage, MessageScope, UserRef},
        herald_store::MemoryStore,
    };

    use super::*;

    fn message(text: &str) -> ChatMessage {
        ChatMessage {
            id: "10".into(),
            channel: ChannelRef::new("7", "general"),
            author: UserRef::new("1", "ada"),
            text: text.into(),
            scope: MessageScope::default(),
        }
    }

    fn request(route: &str, values: HashMap<String, ParamValue>) -> Request {
        let parameters: Vec<Parameter> = route
            .split_whitespace()
            .filter_map(Parameter::from_token)
            .collect();
        Request::new(message("!events"), "events.manage", route, parameters, values)
    }

    fn response() -> Response {
        Response::new(ChannelRef::new("7", "general"))
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let command = EventsCommand::new(Arc::new(MemoryStore::new()));
        let mut resp = response();
        command
            .execute(&request("events", HashMap::new()), &mut resp)
            .await
            .unwrap();
        assert_eq!(resp.reply.map(|r| r.text), Some("No events scheduled.".to_string()));
    }

    #[tokio::test]
    async fn add_then_list_then_remove() {
        let command = EventsCommand::new(Arc::new(MemoryStore::new()));
        let start = Utc.with_ymd_and_hms(2026, 9, 1, 18, 0, 0).unwrap();

        let values = HashMap::from([
            ("title".to_string(), ParamValue::Text("game night".into())),
            ("start".to_string(), ParamValue::Date(start)),
        ]);
        let mut resp = response();
        command
            .execute(&request("events add :title :start:date", values), &mut resp)
            .await
            .unwrap();
        assert_eq!(
            resp.reply.map(|r| r.text),
            Some("Scheduled 'game night' for 2026-09-01 18:00 UTC.".to_string()),
        );

        let mut resp = response();
        command
            .execute(&request("events", HashMap::new()), &mut resp)
            .await
            .unwrap();
        let text = resp.reply.map(|r| r.text).unwrap();
        assert!(text.contains("game night"), "{text}");
        assert!(text.contains("2026-09-01 18:00 UTC"), "{text}");

        let values = HashMap::from([(
            "title".to_string(),
            ParamValue::Text("game night".into()),
        )]);
        let mut resp = response();
        command
            .execute(&request("events remove :title", values), &mut resp)
            .await
            .unwrap();
        assert_eq!(resp.reply.map(|r| r.text), Some("Removed 'game night'.".to_string()));
    }

    #[tokio::test]
    async fn duplicate_title_is_a_validation_error() {
        let command = EventsCommand::new(Arc::new(MemoryStore::new()));
        let start = Utc.with_ymd_and_hms(2026, 9, 1, 18, 0, 0).unwrap();
        let values = HashMap::from([
            ("title".to_string(), ParamValue::Text("raid".into())),
            ("start".to_string(), ParamValue::Date(start)),
        ]);
        command
            .execute(&request("events add :title :start:date", values.clone()), &mut response())
            .await
            .unwrap();

        let err = command
            .execute(&request("events add :title :start:date", values), &mut response())
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Validation(_)));
    }

    #[tokio::test]
    async fn removing_unknown_event_is_a_validation_error() {
        let command = EventsCommand::new(Arc::new(MemoryStore::new()));
        let values = HashMap::from([(
            "title".to_string(),
            ParamValue::Text("nothing".into()),
        )]);
        let err = command
            .execute(&request("events remove :title", values), &mut response())
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Validation(_)));
    }

    #[tokio::test]
    async fn long_listings_paginate() {
        let store = Arc::new(MemoryStore::new());
        for i in 0..12 {
            store
                .insert(COLLECTION, Document {
                    id: format!("event-{i}"),
                    owner_id: "1".into(),
                    body: json!({
                        "title": format!("event {i}"),
                        "start": format!("2026-09-{:02}T18:00:00Z", i + 1),
                    }),
                })
                .await
                .unwrap();
        }
        let command = EventsCommand::new(store);
        let mut resp = response();
        command
            .execute(&request("events", HashMap::new()), &mut resp)
            .await
            .unwrap();
        let reply = resp.reply.unwrap();
        assert!(reply.is_paginated());
        assert_eq!(reply.pages.len(), 3);
        assert!(reply.pages[0].text.contains("(1/3)"));
    }
}
