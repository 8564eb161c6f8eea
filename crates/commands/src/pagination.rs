//! Reaction-driven pagination.
//!
//! A paginated reply carries an ordered page list plus a navigation symbol
//! set. When one is posted, the process-wide [`Paginator`] (installed lazily
//! on first use, shared across all commands) attaches the navigation
//! reactions and persists `{serialized reply, author id}` under the
//! message's cache key with a 15-minute TTL. Reaction events then turn
//! pages: the message is edited in place and the cache entry rewritten,
//! refreshing the TTL. Expired state means reactions are silently ignored.

use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

use {
    herald_cache::CacheStore,
    herald_common::types::Reply,
    herald_transport::{ChatTransport, PostedMessage, ReactionEvent},
    serde::{Deserialize, Serialize},
    tracing::{debug, warn},
};

pub const TABLE: &str = "pagination";

/// Pagination state lives this long without a page turn.
pub const STATE_TTL: Duration = Duration::from_secs(15 * 60);

/// Navigation symbols attached to every paginated reply.
pub mod symbols {
    pub const FIRST: &str = "⏮";
    pub const PREVIOUS: &str = "◀";
    pub const NEXT: &str = "▶";
    pub const LAST: &str = "⏭";
}

/// Cache entry for one paginated message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationState {
    pub reply: Reply,
    /// The original invoker; only their reactions turn pages.
    pub author_id: String,
    pub current_page: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    First,
    Previous,
    Next,
    Last,
    Jump(usize),
}

/// Process-wide reaction listener and page-turn engine.
pub struct Paginator {
    cache: Arc<dyn CacheStore>,
    transport: Arc<dyn ChatTransport>,
}

impl Paginator {
    #[must_use]
    pub fn new(cache: Arc<dyn CacheStore>, transport: Arc<dyn ChatTransport>) -> Self {
        Self { cache, transport }
    }

    /// Start tracking a freshly posted paginated reply: attach the
    /// navigation reactions and persist the initial state.
    pub async fn track(
        &self,
        posted: &PostedMessage,
        reply: &Reply,
        author_id: &str,
    ) -> anyhow::Result<()> {
        let mut nav: Vec<&str> = vec![
            symbols::FIRST,
            symbols::PREVIOUS,
            symbols::NEXT,
            symbols::LAST,
        ];
        nav.extend(
            reply
                .pages
                .iter()
                .filter_map(|page| page.symbol.as_deref()),
        );
        for symbol in nav {
            self.transport
                .react(&posted.channel_id, &posted.id, symbol)
                .await?;
        }

        let state = PaginationState {
            reply: reply.clone(),
            author_id: author_id.to_string(),
            current_page: 0,
        };
        self.persist(&key(&posted.channel_id, &posted.id), &state)
            .await?;
        Ok(())
    }

    /// Handle a reaction add/remove event. Everything that does not map to
    /// a page turn by the original invoker is silently ignored.
    pub async fn handle_reaction(&self, event: &ReactionEvent) -> anyhow::Result<()> {
        if event.user.is_bot {
            return Ok(());
        }
        if event.message_author_id != self.transport.bot_user_id() {
            return Ok(());
        }

        let state_key = key(&event.channel_id, &event.message_id);
        let Some(value) = self.cache.get(TABLE, &state_key).await? else {
            debug!(key = %state_key, "reaction on untracked or expired message");
            return Ok(());
        };
        let mut state: PaginationState = serde_json::from_value(value)?;

        if state.author_id != event.user.id {
            debug!(
                key = %state_key,
                reactor = %event.user.id,
                "reaction from non-invoker ignored"
            );
            return Ok(());
        }

        let Some(transition) = transition_for(&event.symbol, &state.reply) else {
            return Ok(());
        };
        let page_count = state.reply.pages.len();
        if page_count == 0 {
            warn!(key = %state_key, "pagination state with no pages");
            return Ok(());
        }
        let new_page = apply(transition, state.current_page, page_count);
        if new_page == state.current_page {
            return Ok(());
        }

        let Some(page) = state.reply.pages.get(new_page) else {
            return Ok(());
        };
        let mut edited = state.reply.clone();
        edited.text = page.text.clone();
        edited.embed = page.embed.clone();
        self.transport
            .edit(&event.channel_id, &event.message_id, &edited)
            .await?;

        state.current_page = new_page;
        // a successful page turn refreshes the TTL
        self.persist(&state_key, &state).await?;
        Ok(())
    }

    async fn persist(&self, state_key: &str, state: &PaginationState) -> anyhow::Result<()> {
        self.cache
            .set(
                TABLE,
                state_key,
                Some(STATE_TTL),
                serde_json::to_value(state)?,
            )
            .await?;
        Ok(())
    }
}

fn key(channel_id: &str, message_id: &str) -> String {
    format!("{channel_id}.{message_id}")
}

fn transition_for(symbol: &str, reply: &Reply) -> Option<Transition> {
    match symbol {
        symbols::FIRST => Some(Transition::First),
        symbols::PREVIOUS => Some(Transition::Previous),
        symbols::NEXT => Some(Transition::Next),
        symbols::LAST => Some(Transition::Last),
        other => reply
            .pages
            .iter()
            .position(|page| page.symbol.as_deref() == Some(other))
            .map(Transition::Jump),
    }
}

fn apply(transition: Transition, current: usize, page_count: usize) -> usize {
    let last = page_count - 1;
    match transition {
        Transition::First => 0,
        Transition::Previous => current.saturating_sub(1),
        Transition::Next => (current + 1).min(last),
        Transition::Last => last,
        Transition::Jump(page) => page.min(last),
    }
}

/// Handle to the lazily installed process-wide [`Paginator`]. The pagination
/// middleware installs it on the first paginated reply; the dispatcher
/// consults it for inbound reaction events.
#[derive(Clone, Default)]
pub struct PaginatorHandle {
    inner: Arc<OnceLock<Arc<Paginator>>>,
}

impl PaginatorHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the listener if not yet installed, returning it either way.
    pub fn install(
        &self,
        cache: &Arc<dyn CacheStore>,
        transport: &Arc<dyn ChatTransport>,
    ) -> Arc<Paginator> {
        Arc::clone(self.inner.get_or_init(|| {
            debug!("installing pagination reaction listener");
            Arc::new(Paginator::new(Arc::clone(cache), Arc::clone(transport)))
        }))
    }

    /// The listener, if any paginated reply has been posted yet.
    #[must_use]
    pub fn installed(&self) -> Option<Arc<Paginator>> {
        self.inner.get().map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        herald_cache::MemoryCache,
        herald_common::types::{Page, UserRef},
        herald_transport::LoopbackTransport,
    };

    fn pages(n: usize) -> Vec<Page> {
        (1..=n)
            .map(|i| Page {
                text: format!("page {i}"),
                embed: None,
                symbol: None,
            })
            .collect()
    }

    fn reaction(message_id: &str, symbol: &str, user_id: &str) -> ReactionEvent {
        ReactionEvent {
            channel_id: "c".into(),
            message_id: message_id.into(),
            symbol: symbol.into(),
            user: UserRef::new(user_id, user_id),
            message_author_id: "bot".into(),
        }
    }

    async fn setup() -> (Paginator, Arc<LoopbackTransport>, PostedMessage) {
        let (transport, _rx) = LoopbackTransport::channel("bot");
        let transport = Arc::new(transport);
        let paginator = Paginator::new(
            Arc::new(MemoryCache::new()),
            Arc::clone(&transport) as Arc<dyn ChatTransport>,
        );
        let reply = Reply::paginated(pages(3));
        let posted = transport.send("c", &reply).await.expect("send");
        paginator.track(&posted, &reply, "author").await.expect("track");
        (paginator, transport, posted)
    }

    #[tokio::test]
    async fn track_attaches_navigation_reactions() {
        let (_paginator, transport, posted) = setup().await;
        let symbols: Vec<String> = transport
            .reactions()
            .await
            .into_iter()
            .map(|(_, s)| s)
            .collect();
        assert_eq!(symbols, ["⏮", "◀", "▶", "⏭"]);
        assert_eq!(
            transport.message("c", &posted.id).await.map(|r| r.text),
            Some("page 1".to_string())
        );
    }

    #[tokio::test]
    async fn next_and_last_turn_pages() {
        let (paginator, transport, posted) = setup().await;
        paginator
            .handle_reaction(&reaction(&posted.id, symbols::NEXT, "author"))
            .await
            .expect("next");
        assert_eq!(
            transport.message("c", &posted.id).await.map(|r| r.text),
            Some("page 2".to_string())
        );
        paginator
            .handle_reaction(&reaction(&posted.id, symbols::LAST, "author"))
            .await
            .expect("last");
        assert_eq!(
            transport.message("c", &posted.id).await.map(|r| r.text),
            Some("page 3".to_string())
        );
    }

    #[tokio::test]
    async fn next_clamps_at_last_page() {
        let (paginator, transport, posted) = setup().await;
        for _ in 0..5 {
            paginator
                .handle_reaction(&reaction(&posted.id, symbols::NEXT, "author"))
                .await
                .expect("next");
        }
        assert_eq!(
            transport.message("c", &posted.id).await.map(|r| r.text),
            Some("page 3".to_string())
        );
    }

    #[tokio::test]
    async fn foreign_reactor_never_changes_content() {
        let (paginator, transport, posted) = setup().await;
        paginator
            .handle_reaction(&reaction(&posted.id, symbols::NEXT, "someone-else"))
            .await
            .expect("ignored");
        assert_eq!(
            transport.message("c", &posted.id).await.map(|r| r.text),
            Some("page 1".to_string())
        );
    }

    #[tokio::test]
    async fn bot_reactions_ignored() {
        let (paginator, transport, posted) = setup().await;
        let mut event = reaction(&posted.id, symbols::NEXT, "author");
        event.user.is_bot = true;
        paginator.handle_reaction(&event).await.expect("ignored");
        assert_eq!(
            transport.message("c", &posted.id).await.map(|r| r.text),
            Some("page 1".to_string())
        );
    }

    #[tokio::test]
    async fn untracked_message_ignored() {
        let (paginator, transport, posted) = setup().await;
        paginator
            .handle_reaction(&reaction("not-tracked", symbols::NEXT, "author"))
            .await
            .expect("ignored");
        assert_eq!(
            transport.message("c", &posted.id).await.map(|r| r.text),
            Some("page 1".to_string())
        );
    }

    #[tokio::test]
    async fn expired_state_never_changes_content() {
        let (transport, _rx) = LoopbackTransport::channel("bot");
        let transport = Arc::new(transport);
        let cache: Arc<MemoryCache> = Arc::new(MemoryCache::new());
        let paginator = Paginator::new(
            Arc::clone(&cache) as Arc<dyn CacheStore>,
            Arc::clone(&transport) as Arc<dyn ChatTransport>,
        );
        let reply = Reply::paginated(pages(2));
        let posted = transport.send("c", &reply).await.expect("send");
        paginator.track(&posted, &reply, "author").await.expect("track");

        // simulate TTL expiry by dropping the state outright
        cache
            .remove(TABLE, &format!("c.{}", posted.id))
            .await
            .expect("remove");

        paginator
            .handle_reaction(&reaction(&posted.id, symbols::NEXT, "author"))
            .await
            .expect("ignored");
        assert_eq!(
            transport.message("c", &posted.id).await.map(|r| r.text),
            Some("page 1".to_string())
        );
    }

    #[tokio::test]
    async fn page_symbol_jumps_directly() {
        let (transport, _rx) = LoopbackTransport::channel("bot");
        let transport = Arc::new(transport);
        let paginator = Paginator::new(
            Arc::new(MemoryCache::new()),
            Arc::clone(&transport) as Arc<dyn ChatTransport>,
        );
        let mut page_list = pages(3);
        page_list[2].symbol = Some("🎲".into());
        let reply = Reply::paginated(page_list);
        let posted = transport.send("c", &reply).await.expect("send");
        paginator.track(&posted, &reply, "author").await.expect("track");

        paginator
            .handle_reaction(&reaction(&posted.id, "🎲", "author"))
            .await
            .expect("jump");
        assert_eq!(
            transport.message("c", &posted.id).await.map(|r| r.text),
            Some("page 3".to_string())
        );
    }

    #[tokio::test]
    async fn handle_installs_exactly_once() {
        let handle = PaginatorHandle::new();
        assert!(handle.installed().is_none());
        let (transport, _rx) = LoopbackTransport::channel("bot");
        let transport: Arc<dyn ChatTransport> = Arc::new(transport);
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
        let first = handle.install(&cache, &transport);
        let second = handle.install(&cache, &transport);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(handle.installed().is_some());
    }
}
