use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use spool_fetch::{FetchPhase, Progress};

pub trait TrackerBuilder {
    type Output: Tracker;
    fn build(self) -> Self::Output;
}

pub trait Tracker {
    fn step(&self, progress: &Progress) -> &Self;
    fn finish(self);
    fn abandon(self);
}

// Body length is unknown up front, so the bar is a spinner with a byte counter.
const PB_STYLE: &str = "{spinner:.blue} {prefix:>12.cyan.bold} [{elapsed_precise}] {bytes} ({bytes_per_sec}) {wide_msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

static PB_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    let pb_style = match ProgressStyle::with_template(PB_STYLE) {
        Ok(pb_style) => pb_style.tick_chars(TICK),
        Err(_) => return None,
    };

    Some(pb_style)
});

fn render(pb: &ProgressBar, progress: &Progress) {
    match progress.phase {
        FetchPhase::Connecting => {
            pb.reset();
            pb.set_message(format!("attempt {}: connecting", progress.attempt));
        }
        FetchPhase::Downloading => {
            pb.set_position(progress.bytes_written);
            pb.set_message(format!("attempt {}", progress.attempt));
        }
        FetchPhase::BackingOff => {
            let delay = progress.backoff.unwrap_or_default();
            pb.set_message(format!(
                "attempt {} failed, retrying in {}ms",
                progress.attempt,
                delay.as_millis()
            ));
        }
        FetchPhase::Completed | FetchPhase::Failed => {
            pb.set_position(progress.bytes_written);
        }
    }
    pb.tick();
}

pub struct ProgressTracker {
    pb: ProgressBar,
    finish: Option<String>,
}

impl ProgressTracker {
    /// Callback for [`FetchOptions::on_progress`](spool_fetch::FetchOptions::on_progress)
    /// that drives this tracker's bar.
    pub fn callback(&self) -> Arc<dyn Fn(&Progress) + Send + Sync> {
        let shared = ProgressTracker {
            pb:     self.pb.clone(),
            finish: None,
        };
        Arc::new(move |progress| {
            shared.step(progress);
        })
    }
}

impl Tracker for ProgressTracker {
    fn step(&self, progress: &Progress) -> &Self {
        render(&self.pb, progress);
        self
    }

    fn finish(self) {
        match self.finish {
            Some(msg) => self.pb.finish_with_message(msg),
            None => self.pb.finish(),
        }
    }

    fn abandon(self) { self.pb.abandon_with_message("failed"); }
}

#[derive(Debug, Clone, Default)]
pub struct ProgressTrackerBuilder {
    prefix: Option<String>,
    finish: Option<String>,
}

impl ProgressTrackerBuilder {
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    pub fn with_finish(mut self, finish: &str) -> Self {
        self.finish = Some(finish.to_string());
        self
    }
}

impl TrackerBuilder for ProgressTrackerBuilder {
    type Output = ProgressTracker;

    fn build(self) -> ProgressTracker {
        let pb = ProgressBar::new_spinner();
        let pb = if let Some(style) = PB_TEMPLATE.as_ref() {
            pb.with_style(style.clone())
        } else {
            pb
        };

        if let Some(prefix) = self.prefix {
            pb.set_prefix(prefix);
        }
        ProgressTracker {
            pb,
            finish: self.finish,
        }
    }
}
