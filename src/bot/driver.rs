//! Intake bot: routes channel events through the dialogue and executes effects.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::channels::{
    Channel, ChatId, InboundEvent, MessageId, OutgoingMessage, Sender, UserId,
};
use crate::dialogue::{self, Effect, FinalizeRequest, Input, SessionManager};
use crate::notify::{self, ActionTag, acknowledge};
use crate::records::{RecordStore, Submission};

use super::labels;
use super::prompts;

/// How long a user's worker waits for another event before exiting.
pub const WORKER_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// The intake bot.
pub struct IntakeBot {
    channel: Arc<dyn Channel>,
    store: Arc<dyn RecordStore>,
    sessions: SessionManager,
    operator_id: UserId,
    recent_limit: usize,
    worker_idle: Duration,
}

impl IntakeBot {
    pub fn new(
        channel: Arc<dyn Channel>,
        store: Arc<dyn RecordStore>,
        operator_id: UserId,
        recent_limit: usize,
    ) -> Self {
        Self {
            channel,
            store,
            sessions: SessionManager::new(),
            operator_id,
            recent_limit,
            worker_idle: WORKER_IDLE_TIMEOUT,
        }
    }

    pub fn with_worker_idle(mut self, idle: Duration) -> Self {
        self.worker_idle = idle;
        self
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Consume channel events until the stream ends.
    ///
    /// Each user gets a worker task that handles their events in arrival
    /// order; different users proceed concurrently. Idle workers exit and
    /// are swept from the registry. Returns once every worker has drained.
    pub async fn run(self: Arc<Self>) -> crate::error::Result<()> {
        let mut events = self.channel.start().await?;
        info!(
            channel = self.channel.name(),
            operator_id = %self.operator_id,
            "Intake bot started"
        );

        let mut workers = UserWorkers::default();
        let mut sweep = tokio::time::interval(self.worker_idle.max(Duration::from_secs(1)));

        loop {
            tokio::select! {
                event = events.next() => match event {
                    Some(event) => workers.dispatch(&self, event),
                    None => break,
                },
                _ = sweep.tick() => workers.reap().await,
            }
        }

        info!(workers = workers.len(), "Event stream ended, draining workers");
        workers.shutdown().await;
        Ok(self.channel.shutdown().await?)
    }

    async fn work(
        self: Arc<Self>,
        user_id: UserId,
        previous: Option<JoinHandle<()>>,
        mut rx: mpsc::UnboundedReceiver<InboundEvent>,
    ) {
        // A replaced worker may still be finishing this user's earlier events.
        if let Some(previous) = previous {
            if let Err(e) = previous.await {
                error!(user_id = %user_id, error = %e, "User worker panicked");
            }
        }

        loop {
            match tokio::time::timeout(self.worker_idle, rx.recv()).await {
                Ok(Some(event)) => self.handle_event(event).await,
                Ok(None) => break,
                Err(_) => {
                    rx.close();
                    while let Ok(event) = rx.try_recv() {
                        self.handle_event(event).await;
                    }
                    debug!(user_id = %user_id, "User worker idle, exiting");
                    break;
                }
            }
        }
    }

    /// Handle one inbound event to completion.
    pub async fn handle_event(&self, event: InboundEvent) {
        match event {
            InboundEvent::Callback {
                callback_id,
                chat_id,
                sender,
                message_id,
                message_text,
                data,
            } => {
                self.handle_callback(
                    &callback_id,
                    chat_id,
                    &sender,
                    message_id,
                    &message_text,
                    &data,
                )
                .await;
            }
            InboundEvent::Text {
                chat_id,
                sender,
                text,
            } => {
                self.handle_input(chat_id, &sender, |session_expects| {
                    labels::parse(session_expects, &text)
                })
                .await;
            }
            InboundEvent::Contact {
                chat_id,
                sender,
                contact,
            } => {
                if let Some(owner) = contact.owner.filter(|owner| *owner != sender.id) {
                    info!(
                        user_id = %sender.id,
                        owner = %owner,
                        "Accepting contact owned by another user"
                    );
                }
                self.handle_input(chat_id, &sender, move |_| Input::Contact(contact))
                    .await;
            }
        }
    }

    async fn handle_input<F>(&self, chat_id: ChatId, sender: &Sender, to_input: F)
    where
        F: FnOnce(dialogue::Expect) -> Input,
    {
        let (handle, mut session) = loop {
            let handle = self.sessions.session(sender.id).await;
            let session = Arc::clone(&handle).lock_owned().await;
            if self.sessions.is_current(sender.id, &handle).await {
                break (handle, session);
            }
        };

        let input = to_input(session.state.expects());
        let from = session.state;
        let result = dialogue::transition(&session, input);
        debug!(
            user_id = %sender.id,
            from = %from,
            to = %result.session.state,
            effects = result.effects.len(),
            "Dialogue transition"
        );
        *session = result.session;

        for effect in result.effects {
            self.execute(chat_id, sender, effect).await;
        }

        if session.is_fresh() {
            self.sessions.remove(sender.id, &handle).await;
        }
    }

    async fn execute(&self, chat_id: ChatId, sender: &Sender, effect: Effect) {
        match effect {
            Effect::Prompt(prompt) => {
                self.deliver(chat_id, prompts::render(prompt, sender)).await;
            }
            Effect::ListOwnRequests => {
                let requests = self
                    .store
                    .recent_trip_requests(sender.id, self.recent_limit)
                    .await;
                self.deliver(chat_id, prompts::render_request_list(&requests))
                    .await;
            }
            Effect::Finalize(request) => self.finalize(chat_id, sender, request).await,
        }
    }

    async fn finalize(&self, chat_id: ChatId, sender: &Sender, request: FinalizeRequest) {
        let mut submission = match dialogue::finalize::assemble(request, sender, Utc::now()) {
            Ok(submission) => submission,
            Err(e) => {
                error!(user_id = %sender.id, error = %e, "Failed to assemble submission");
                self.deliver(chat_id, prompts::render_failure(&e)).await;
                return;
            }
        };

        let saved = match &mut submission {
            Submission::Trip(trip) => self.store.save_trip_request(trip).await,
            Submission::Driver(driver) => self.store.save_driver_registration(driver).await,
        };
        if let Err(e) = saved {
            // The user and operator are still notified; the record is only
            // missing from disk.
            error!(
                user_id = %sender.id,
                kind = %submission.kind(),
                error = %e,
                "Failed to persist submission"
            );
        }

        let notification = notify::route(&submission);
        self.deliver(
            ChatId::from(self.operator_id),
            prompts::render_operator_message(
                &notification.operator_text,
                &notification.operator_actions,
            ),
        )
        .await;
        self.deliver(
            chat_id,
            OutgoingMessage::new(notification.user_text)
                .with_keyboard(prompts::compact_menu_keyboard()),
        )
        .await;
    }

    async fn handle_callback(
        &self,
        callback_id: &str,
        chat_id: ChatId,
        sender: &Sender,
        message_id: MessageId,
        message_text: &str,
        data: &str,
    ) {
        if let Err(e) = self.channel.answer_callback(callback_id).await {
            warn!(callback_id, error = %e, "Failed to answer callback");
        }

        if sender.id != self.operator_id {
            warn!(user_id = %sender.id, data, "Ignoring callback from non-operator");
            return;
        }

        let Some(tag) = ActionTag::parse(data) else {
            warn!(data, "Ignoring unrecognized callback payload");
            return;
        };

        info!(
            action = tag.action.status_suffix(),
            user_id = %tag.user_id,
            "Operator acted on request"
        );
        let edited = acknowledge(message_text, tag.action);
        if let Err(e) = self.channel.edit_text(chat_id, message_id, &edited).await {
            warn!(message_id = %message_id, error = %e, "Failed to edit operator message");
        }
    }

    async fn deliver(&self, chat_id: ChatId, message: OutgoingMessage) {
        if let Err(e) = self.channel.send(chat_id, message).await {
            warn!(chat_id = %chat_id, error = %e, "Failed to send message");
        }
    }
}

/// Per-user worker tasks and the senders that feed them.
#[derive(Default)]
struct UserWorkers {
    workers: HashMap<UserId, Worker>,
}

struct Worker {
    tx: mpsc::UnboundedSender<InboundEvent>,
    task: JoinHandle<()>,
}

impl UserWorkers {
    /// Queue `event` on its sender's worker, starting one if there is none
    /// or the old one has gone idle.
    fn dispatch(&mut self, bot: &Arc<IntakeBot>, event: InboundEvent) {
        let user_id = event.sender().id;
        let event = match self.workers.get(&user_id) {
            Some(worker) => match worker.tx.send(event) {
                Ok(()) => return,
                Err(mpsc::error::SendError(event)) => event,
            },
            None => event,
        };
        let previous = self.workers.remove(&user_id).map(|worker| worker.task);

        debug!(
            user_id = %user_id,
            chat_id = %event.chat_id(),
            "Starting user worker"
        );
        let (tx, rx) = mpsc::unbounded_channel();
        if tx.send(event).is_err() {
            warn!(user_id = %user_id, "User worker queue closed, dropping event");
            return;
        }
        let task = tokio::spawn(Arc::clone(bot).work(user_id, previous, rx));
        self.workers.insert(user_id, Worker { tx, task });
    }

    /// Forget workers that have exited.
    async fn reap(&mut self) {
        let finished: Vec<UserId> = self
            .workers
            .iter()
            .filter(|(_, worker)| worker.task.is_finished())
            .map(|(user_id, _)| *user_id)
            .collect();
        for user_id in finished {
            if let Some(worker) = self.workers.remove(&user_id) {
                if let Err(e) = worker.task.await {
                    error!(user_id = %user_id, error = %e, "User worker panicked");
                }
            }
        }
    }

    fn len(&self) -> usize {
        self.workers.len()
    }

    /// Close every queue and wait for the workers to drain.
    async fn shutdown(self) {
        let tasks: Vec<(UserId, JoinHandle<()>)> = self
            .workers
            .into_iter()
            .map(|(user_id, worker)| (user_id, worker.task))
            .collect();
        for (user_id, task) in tasks {
            if let Err(e) = task.await {
                error!(user_id = %user_id, error = %e, "User worker panicked");
            }
        }
    }
}
