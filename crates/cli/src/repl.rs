//! Interactive demo loop: stdin lines become chat messages on the in-memory
//! transport, and everything the bot posts is echoed to the terminal.

use std::sync::Arc;

use {
    herald_commands::Dispatcher,
    herald_common::types::{ChannelRef, ChatMessage, MessageScope, UserRef},
    herald_transport::{ChatTransport, LoopbackTransport, ReactionEvent, TransportEvent},
    tokio::io::{AsyncBufReadExt, BufReader},
};

pub async fn run(dispatcher: Dispatcher, transport: Arc<LoopbackTransport>) -> anyhow::Result<()> {
    let channel = ChannelRef::new("demo", "demo");
    let you = UserRef::new("100", "you");
    let scope = MessageScope {
        channels: vec![channel.clone()],
        users: vec![you.clone()],
    };

    println!(
        "herald demo — type a command (e.g. `!roll 2d6+1`, `!events`), \
         `:react <message-id> <symbol>` to turn a page, ctrl-d to quit"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut next_id: u64 = 1;
    let mut echoed = 0usize;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        let mut react_target = None;
        let event = if let Some(rest) = line.strip_prefix(":react ") {
            let mut parts = rest.split_whitespace();
            let (Some(message_id), Some(symbol)) = (parts.next(), parts.next()) else {
                println!("usage: :react <message-id> <symbol>");
                continue;
            };
            react_target = Some(message_id.to_string());
            TransportEvent::ReactionAdded(ReactionEvent {
                channel_id: channel.id.clone(),
                message_id: message_id.to_string(),
                symbol: symbol.to_string(),
                user: you.clone(),
                message_author_id: transport.bot_user_id().to_string(),
            })
        } else {
            let id = next_id.to_string();
            next_id += 1;
            TransportEvent::Message(ChatMessage {
                id,
                channel: channel.clone(),
                author: you.clone(),
                text: line,
                scope: scope.clone(),
            })
        };

        dispatcher.handle_event(event).await;

        let sent = transport.sent().await;
        for (posted, reply) in &sent[echoed..] {
            println!("[bot #{}] {}", posted.id, reply.text);
        }
        echoed = sent.len();

        // a page turn edits the message in place, so show its current content
        if let Some(id) = react_target
            && let Some(current) = transport.message(&channel.id, &id).await
        {
            println!("[bot #{id}] {}", current.text);
        }
    }
    Ok(())
}
