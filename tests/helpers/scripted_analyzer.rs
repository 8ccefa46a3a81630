//! Scripted report analyzer

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use ReportBuddy::services::{Analysis, Analyzer};
use ReportBuddy::utils::errors::{AnalyzerError, AnalyzerResult};

#[derive(Debug, Clone)]
pub enum Script {
    Score(u8),
    Fail,
}

#[derive(Debug)]
pub struct ScriptedAnalyzer {
    script: Mutex<Script>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedAnalyzer {
    pub fn scoring(score: u8) -> Self {
        Self {
            script: Mutex::new(Script::Score(score)),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            script: Mutex::new(Script::Fail),
            ..Self::scoring(0)
        }
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set(&self, script: Script) {
        *self.script.lock().unwrap() = script;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn answer<T>(&self, ok: impl FnOnce() -> T) -> AnalyzerResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let script = self.script.lock().unwrap().clone();
        match script {
            Script::Score(_) => Ok(ok()),
            Script::Fail => Err(AnalyzerError::RequestFailed("scripted failure".to_string())),
        }
    }
}

#[async_trait]
impl Analyzer for ScriptedAnalyzer {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn score(&self, _text: &str) -> AnalyzerResult<Analysis> {
        let score = match *self.script.lock().unwrap() {
            Script::Score(score) => score,
            Script::Fail => 0,
        };
        self.answer(|| Analysis {
            score,
            recommendations: vec!["Add numbers".to_string()],
        })
        .await
    }

    async fn motivate(&self, _text: &str) -> AnalyzerResult<String> {
        self.answer(|| "Have a productive day!".to_string()).await
    }

    async fn praise(&self, _text: &str) -> AnalyzerResult<String> {
        self.answer(|| "Great work today!".to_string()).await
    }
}
