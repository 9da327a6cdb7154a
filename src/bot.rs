//! Transport adapter
//!
//! Long-polls getUpdates and routes each message to a per-chat worker task,
//! so one chat's events are handled strictly in order while different chats
//! proceed concurrently. Replies for a transition already persisted are
//! retried with backoff rather than dropped.

use crate::engine::{ChatProfile, Command, Event, Session};
use crate::runtime::{CodeRunner, ContentStore, SessionStore, TutorRuntime};
use crate::telegram::{Message, TelegramClient, TelegramError};
use crate::texts::Lang;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const MAX_SEND_ATTEMPTS: u32 = 3;
const WORKER_QUEUE_DEPTH: usize = 32;

/// Exponential backoff: 1s, 2s, 4s, ... capped at 32s
fn retry_delay(attempt: u32) -> Duration {
    Duration::from_secs(1 << attempt.saturating_sub(1).min(5))
}

/// What one inbound text means at the transport level
#[derive(Debug, Clone, PartialEq, Eq)]
enum Inbound {
    Command(Command),
    Admin(AdminCommand),
    UnknownCommand,
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AdminCommand {
    AddUser { args: Vec<String> },
    ListUsers,
}

fn parse_inbound(text: &str) -> Inbound {
    let Some(head) = text.split_whitespace().next() else {
        return Inbound::Text(text.to_string());
    };
    let Some(command) = head.strip_prefix('/') else {
        return Inbound::Text(text.to_string());
    };
    // `/start@MyBot` addresses this bot explicitly in group chats
    let command = command.split('@').next().unwrap_or(command);
    match command {
        "start" => Inbound::Command(Command::Start),
        "menu" => Inbound::Command(Command::Menu),
        "lesson" => Inbound::Command(Command::Lesson),
        "quiz" => Inbound::Command(Command::Quiz),
        "code" => Inbound::Command(Command::Code),
        "info" => Inbound::Command(Command::Info),
        "cancel" => Inbound::Command(Command::Cancel),
        "add_user" => Inbound::Admin(AdminCommand::AddUser {
            args: text.split_whitespace().skip(1).map(String::from).collect(),
        }),
        "list_users" => Inbound::Admin(AdminCommand::ListUsers),
        _ => Inbound::UnknownCommand,
    }
}

/// The polling bot
pub struct Bot<S, C, R> {
    client: Arc<TelegramClient>,
    runtime: Arc<TutorRuntime<S, C, R>>,
    admin_ids: Arc<Vec<i64>>,
    poll_timeout_secs: u64,
}

impl<S, C, R> Bot<S, C, R>
where
    S: SessionStore + 'static,
    C: ContentStore + 'static,
    R: CodeRunner + 'static,
{
    pub fn new(
        client: TelegramClient,
        runtime: TutorRuntime<S, C, R>,
        admin_ids: Vec<i64>,
        poll_timeout_secs: u64,
    ) -> Self {
        Self {
            client: Arc::new(client),
            runtime: Arc::new(runtime),
            admin_ids: Arc::new(admin_ids),
            poll_timeout_secs,
        }
    }

    /// Poll forever. Returns only on a non-retryable polling error such as
    /// a revoked token.
    pub async fn run(self) -> Result<(), TelegramError> {
        self.client.delete_webhook(true).await?;
        tracing::info!("polling for updates");

        let mut workers: HashMap<i64, mpsc::Sender<Message>> = HashMap::new();
        let mut offset = 0i64;
        let mut poll_failures = 0u32;

        loop {
            let updates = match self.client.get_updates(offset, self.poll_timeout_secs).await {
                Ok(updates) => {
                    poll_failures = 0;
                    updates
                }
                Err(e) if e.is_retryable() => {
                    poll_failures += 1;
                    let delay = retry_delay(poll_failures);
                    tracing::warn!(error = %e, ?delay, "poll failed, backing off");
                    tokio::time::sleep(delay).await;
                    continue;
                }
                Err(e) => {
                    tracing::error!(error = %e, "poll failed fatally");
                    return Err(e);
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                let Some(message) = update.message else {
                    continue;
                };
                self.dispatch(&mut workers, message).await;
            }
        }
    }

    /// Route a message to its chat's worker, spawning one on first contact
    async fn dispatch(
        &self,
        workers: &mut HashMap<i64, mpsc::Sender<Message>>,
        message: Message,
    ) {
        let chat_id = message.chat.id;
        let message = match workers.get(&chat_id).cloned() {
            Some(tx) => match tx.send(message).await {
                Ok(()) => return,
                Err(mpsc::error::SendError(message)) => {
                    // Worker died; respawn and requeue
                    workers.remove(&chat_id);
                    tracing::warn!(chat_id, "respawning chat worker");
                    message
                }
            },
            None => message,
        };

        let (tx, rx) = mpsc::channel(WORKER_QUEUE_DEPTH);
        let client = self.client.clone();
        let runtime = self.runtime.clone();
        let admin_ids = self.admin_ids.clone();
        tokio::spawn(async move {
            chat_worker(client, runtime, admin_ids, rx).await;
        });
        if tx.send(message).await.is_ok() {
            workers.insert(chat_id, tx);
        }
    }
}

/// Sequential handler for one chat
async fn chat_worker<S, C, R>(
    client: Arc<TelegramClient>,
    runtime: Arc<TutorRuntime<S, C, R>>,
    admin_ids: Arc<Vec<i64>>,
    mut rx: mpsc::Receiver<Message>,
) where
    S: SessionStore,
    C: ContentStore,
    R: CodeRunner,
{
    while let Some(message) = rx.recv().await {
        let chat_id = message.chat.id;
        if let Err(e) = handle_message(&client, &runtime, &admin_ids, message).await {
            tracing::error!(chat_id, error = %e, "message handling failed");
        }
    }
}

async fn handle_message<S, C, R>(
    client: &TelegramClient,
    runtime: &TutorRuntime<S, C, R>,
    admin_ids: &[i64],
    message: Message,
) -> Result<(), TelegramError>
where
    S: SessionStore,
    C: ContentStore,
    R: CodeRunner,
{
    let chat_id = message.chat.id;
    let Some(text) = message.text else {
        // Stickers, photos and the like have no meaning here
        return Ok(());
    };

    let profile = match message.from {
        Some(user) => ChatProfile {
            chat_id,
            first_name: user.first_name,
            last_name: user.last_name.unwrap_or_default(),
            username: user.username.unwrap_or_default(),
        },
        None => ChatProfile {
            chat_id,
            first_name: String::new(),
            last_name: String::new(),
            username: String::new(),
        },
    };

    let event = match parse_inbound(&text) {
        Inbound::Command(Command::Start) => {
            let replies = match runtime.start_session(profile).await {
                Ok(replies) => replies,
                Err(e) => {
                    tracing::error!(chat_id, error = %e, "runtime failure");
                    return Ok(());
                }
            };
            for reply in replies {
                send_with_retry(client, chat_id, &reply.text, reply.options).await?;
            }
            return Ok(());
        }
        Inbound::Command(cmd) => Event::Command(cmd),
        Inbound::Text(text) => Event::Text(text),
        Inbound::UnknownCommand => {
            return send_with_retry(
                client,
                chat_id,
                "Commande non reconnue. Essayez /menu ou /start.",
                None,
            )
            .await;
        }
        Inbound::Admin(cmd) => {
            let reply = if admin_ids.contains(&profile.chat_id) {
                run_admin_command(runtime, cmd).await
            } else {
                "Sorry, you don't have permission to use this command.".to_string()
            };
            return send_with_retry(client, chat_id, &reply, None).await;
        }
    };

    let replies = match runtime.handle_event(profile, event).await {
        Ok(replies) => replies,
        Err(e) => {
            tracing::error!(chat_id, error = %e, "runtime failure");
            return Ok(());
        }
    };

    for reply in replies {
        send_with_retry(client, chat_id, &reply.text, reply.options).await?;
    }
    Ok(())
}

/// Deliver one reply, retrying retryable transport errors with backoff
async fn send_with_retry(
    client: &TelegramClient,
    chat_id: i64,
    text: &str,
    keyboard: Option<Vec<Vec<String>>>,
) -> Result<(), TelegramError> {
    let mut attempt = 1;
    loop {
        match client.send_message(chat_id, text, keyboard.clone()).await {
            Ok(()) => return Ok(()),
            Err(e) if e.is_retryable() && attempt < MAX_SEND_ATTEMPTS => {
                let delay = retry_delay(attempt);
                tracing::warn!(chat_id, attempt, error = %e, ?delay, "send failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(chat_id, error = %e, "send failed permanently");
                return Err(e);
            }
        }
    }
}

// ============================================================================
// Admin commands
// ============================================================================

async fn run_admin_command<S, C, R>(
    runtime: &TutorRuntime<S, C, R>,
    command: AdminCommand,
) -> String
where
    S: SessionStore,
    C: ContentStore,
    R: CodeRunner,
{
    match command {
        AdminCommand::AddUser { args } => add_user(runtime, &args).await,
        AdminCommand::ListUsers => list_users(runtime).await,
    }
}

async fn add_user<S, C, R>(runtime: &TutorRuntime<S, C, R>, args: &[String]) -> String
where
    S: SessionStore,
    C: ContentStore,
    R: CodeRunner,
{
    let [id, first_name, last_name, lang] = args else {
        return "Usage: /add_user <id> <first_name> <last_name> <lang>".to_string();
    };
    let Ok(chat_id) = id.parse::<i64>() else {
        return format!("Invalid user id: {id}");
    };

    let mut session = Session::new(
        ChatProfile {
            chat_id,
            first_name: first_name.clone(),
            last_name: last_name.clone(),
            username: String::new(),
        },
        Utc::now(),
    );
    session.lang = Lang::from_code(lang).unwrap_or_default();

    match runtime.register_session(&session).await {
        Ok(()) => format!(
            "User added: ID: {chat_id}, Name: {first_name} {last_name}, Lang: {}",
            session.lang.code()
        ),
        Err(e) => format!("Failed to add user: {e}"),
    }
}

async fn list_users<S, C, R>(runtime: &TutorRuntime<S, C, R>) -> String
where
    S: SessionStore,
    C: ContentStore,
    R: CodeRunner,
{
    let sessions = match runtime.sessions().await {
        Ok(sessions) => sessions,
        Err(e) => return format!("Failed to list users: {e}"),
    };
    if sessions.is_empty() {
        return "No users in database.".to_string();
    }
    let mut listing = String::from("Users in database:\n\n");
    for s in sessions {
        listing.push_str(&format!(
            "🔑 ID: {}\n👤 Name: {} {}\n🌐 Lang: {}\n📅 Joined: {}\n\n",
            s.chat_id,
            s.first_name,
            s.last_name,
            s.lang.code(),
            s.joined_at.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    listing
}
