//! Test context for unified test setup
//!
//! Wires the recording transport, a scripted analyzer, the in-memory store and
//! a pinned clock into a real [`Dispatcher`]. Background jobs stay in the queue
//! until a test runs them, unless workers are started.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use chrono_tz::Europe::Moscow;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use ReportBuddy::commands::{Button, EventKind, InboundEvent, Keyword};
use ReportBuddy::config::Settings;
use ReportBuddy::database::{Mutation, Store};
use ReportBuddy::dispatch::{
    spawn_workers, BackgroundQueue, DispatchOutcome, Dispatcher, JobReceiver, UserLocks,
};
use ReportBuddy::models::{Role, User};
use ReportBuddy::policy::FixedClock;
use ReportBuddy::state::AppContext;
use ReportBuddy::utils::errors::Result;
use ReportBuddy::MemoryStore;

use super::{FakeTransport, ScriptedAnalyzer};

/// Configuration for test context creation
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub queue_capacity: usize,
    pub inline_timeout: Duration,
    /// Local wall-clock time in Europe/Moscow, (hour, minute) on 2026-10-19
    pub local_time: (u32, u32),
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            inline_timeout: Duration::from_secs(5),
            local_time: (9, 0),
        }
    }
}

pub struct TestContext {
    pub settings: Settings,
    pub store: Arc<MemoryStore>,
    pub transport: Arc<FakeTransport>,
    pub analyzer: Arc<ScriptedAnalyzer>,
    pub clock: Arc<FixedClock>,
    pub dispatcher: Arc<Dispatcher>,
    receiver: Option<JobReceiver>,
    shutdown: Option<watch::Sender<bool>>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with(TestConfig::default(), ScriptedAnalyzer::scoring(8))
    }

    pub fn with_analyzer(analyzer: ScriptedAnalyzer) -> Self {
        Self::with(TestConfig::default(), analyzer)
    }

    pub fn with(config: TestConfig, analyzer: ScriptedAnalyzer) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let mut settings = Settings::default();
        settings.bot.admin_ids = vec![ADMIN_ID];
        settings.analyzer.enabled = true;
        settings.dispatch.queue_capacity = config.queue_capacity;

        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(FakeTransport::new());
        let analyzer = Arc::new(analyzer);
        let (hour, minute) = config.local_time;
        let clock = Arc::new(FixedClock::at_local(Moscow, 2026, 10, 19, hour, minute).unwrap());

        let ctx = AppContext::new(
            settings.clone(),
            store.clone(),
            transport.clone(),
            analyzer.clone(),
            clock.clone(),
        )
        .unwrap();

        let (queue, receiver) = BackgroundQueue::channel(config.queue_capacity);
        let dispatcher = Dispatcher::new(Arc::new(ctx), UserLocks::new(), queue)
            .with_inline_timeout(config.inline_timeout);

        Self {
            settings,
            store,
            transport,
            analyzer,
            clock,
            dispatcher: Arc::new(dispatcher),
            receiver: Some(receiver),
            shutdown: None,
        }
    }

    pub async fn dispatch(&self, event: InboundEvent) -> Result<DispatchOutcome> {
        self.dispatcher.dispatch(event).await
    }

    /// Run every queued background job in order, returning how many ran
    pub async fn run_queued(&mut self) -> usize {
        let receiver = self.receiver.as_mut().expect("workers own the queue");
        let mut ran = 0;
        while let Ok(job) = receiver.try_recv() {
            let _ = self.dispatcher.run_background_command(job).await;
            ran += 1;
        }
        ran
    }

    /// Hand the queue to a real worker pool
    pub fn start_workers(&mut self, count: usize) -> Vec<JoinHandle<()>> {
        let receiver = self.receiver.take().expect("workers already started");
        let (tx, rx) = watch::channel(false);
        self.shutdown = Some(tx);
        spawn_workers(self.dispatcher.clone(), receiver, count, rx)
    }

    pub fn stop_workers(&self) {
        if let Some(tx) = &self.shutdown {
            let _ = tx.send(true);
        }
    }

    pub async fn user(&self, id: i64) -> Option<User> {
        self.store.load_user(id).await.unwrap()
    }

    /// Store a fully registered user in their settled state
    pub async fn register(&self, id: i64, role: Role) -> User {
        let mut user = User::new(id, id, Some(format!("user{}", id)), role, Utc::now());
        user.full_name = Some(format!("Test User{}", letters(id)));
        user.position = Some("Engineer".to_string());
        if role == Role::Blocked {
            user.block();
        } else {
            user.settle().unwrap();
        }
        self.store.save(vec![Mutation::User(user.clone())]).await.unwrap();
        user
    }

    pub async fn register_examiner(&self, id: i64) -> User {
        let mut user = self.register(id, Role::Employee).await;
        user.is_examiner = true;
        self.store.save(vec![Mutation::User(user.clone())]).await.unwrap();
        user
    }
}

pub const ADMIN_ID: i64 = 1000;

/// Names only accept letters, so turn an id into some
fn letters(id: i64) -> String {
    id.to_string()
        .chars()
        .map(|c| (b'a' + c.to_digit(10).unwrap_or(0) as u8) as char)
        .collect()
}

pub fn start(user_id: i64) -> InboundEvent {
    InboundEvent::private(user_id, EventKind::Start)
}

pub fn text(user_id: i64, text: &str) -> InboundEvent {
    InboundEvent::private(user_id, EventKind::Text(text.to_string()))
}

pub fn keyword(user_id: i64, keyword: Keyword) -> InboundEvent {
    InboundEvent::private(user_id, EventKind::Keyword(keyword))
}

pub fn press(user_id: i64, button: Button) -> InboundEvent {
    InboundEvent {
        callback_id: Some(format!("cb-{}", user_id)),
        message_id: Some(77),
        ..InboundEvent::private(user_id, EventKind::Button(button))
    }
}

pub fn pick_user(user_id: i64, target: i64) -> InboundEvent {
    InboundEvent::private(user_id, EventKind::UserPicked(target))
}

pub fn pick_chat(user_id: i64, chat_id: i64) -> InboundEvent {
    InboundEvent::private(user_id, EventKind::ChatPicked(chat_id))
}
