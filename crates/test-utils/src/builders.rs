#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use keydag::{Task, Values};
use tokio::time::Instant;

/// A task that sleeps for `delay` and returns nothing.
pub fn delayed(title: &str, delay: Duration) -> Task {
    Task::new(title, move |_req, _utils| async move {
        tokio::time::sleep(delay).await;
        Ok(None)
    })
}

/// A task that sleeps for `delay` and then fails with `message`.
pub fn failing_after(title: &str, delay: Duration, message: &str) -> Task {
    let message = message.to_string();
    Task::new(title, move |_req, _utils| {
        let message = message.clone();
        async move {
            tokio::time::sleep(delay).await;
            anyhow::bail!(message)
        }
    })
}

/// A task that sleeps for `delay` and returns `values`.
pub fn providing(title: &str, delay: Duration, values: Values) -> Task {
    Task::new(title, move |_req, _utils| {
        let values = values.clone();
        async move {
            tokio::time::sleep(delay).await;
            Ok(Some(values))
        }
    })
}

/// When each timed task started and ended, relative to the timeline's
/// creation. Uses Tokio's clock, so it is exact under `start_paused`.
#[derive(Debug, Clone)]
pub struct Timeline {
    origin: Instant,
    spans: Arc<Mutex<Vec<Span>>>,
}

#[derive(Debug, Clone)]
pub struct Span {
    pub title: String,
    pub start: Duration,
    pub end: Option<Duration>,
}

impl Timeline {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            spans: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A task that records its span on this timeline around a `delay` sleep.
    pub fn task(&self, title: &str, delay: Duration) -> Task {
        let timeline = self.clone();
        let name = title.to_string();
        Task::new(title, move |_req, _utils| {
            let timeline = timeline.clone();
            let name = name.clone();
            async move {
                timeline.begin(&name);
                tokio::time::sleep(delay).await;
                timeline.end(&name);
                Ok(None)
            }
        })
    }

    pub fn spans(&self) -> Vec<Span> {
        self.spans.lock().unwrap().clone()
    }

    pub fn span(&self, title: &str) -> Span {
        self.spans()
            .into_iter()
            .find(|s| s.title == title)
            .unwrap_or_else(|| panic!("task {title} never started"))
    }

    /// Most spans open at the same time among `titles`.
    pub fn max_overlap(&self, titles: &[&str]) -> usize {
        let spans: Vec<Span> = self
            .spans()
            .into_iter()
            .filter(|s| titles.contains(&s.title.as_str()))
            .collect();

        spans
            .iter()
            .map(|probe| {
                spans
                    .iter()
                    .filter(|s| {
                        let end = s.end.unwrap_or(Duration::MAX);
                        s.start <= probe.start && probe.start < end
                    })
                    .count()
            })
            .max()
            .unwrap_or(0)
    }

    fn begin(&self, title: &str) {
        let start = self.origin.elapsed();
        self.spans.lock().unwrap().push(Span {
            title: title.to_string(),
            start,
            end: None,
        });
    }

    fn end(&self, title: &str) {
        let now = self.origin.elapsed();
        let mut spans = self.spans.lock().unwrap();
        if let Some(span) = spans.iter_mut().find(|s| s.title == title) {
            span.end = Some(now);
        }
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}
