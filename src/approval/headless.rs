//! Headless feedback UI — no rendering, notifications go to the log.
//!
//! Used for unattended runs and tests. Countdowns still run (and can still be
//! cancelled through the shared `Countdowns` registry); the most recent
//! notifications are kept so callers can inspect them afterwards.

use crate::approval::countdown::Countdowns;
use crate::approval::types::{CountdownRequest, NoticeLevel};
use crate::approval::FeedbackUi;
use crate::policy::types::delay_duration;
use crate::policy::ConfigStore;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// How many notifications a headless UI remembers.
pub const NOTICE_HISTORY: usize = 100;

pub struct HeadlessUi {
    countdowns: Arc<Countdowns>,
    notices: Mutex<VecDeque<(NoticeLevel, String)>>,
}

impl HeadlessUi {
    pub fn new(countdowns: Arc<Countdowns>) -> Self {
        Self {
            countdowns,
            notices: Mutex::new(VecDeque::new()),
        }
    }

    pub fn countdowns(&self) -> &Arc<Countdowns> {
        &self.countdowns
    }

    /// The last `NOTICE_HISTORY` notifications, oldest first.
    pub fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices.lock().iter().cloned().collect()
    }
}

#[async_trait]
impl FeedbackUi for HeadlessUi {
    async fn show_countdown(&self, request: &CountdownRequest) -> bool {
        tracing::info!("Approving in {}s: {}", request.seconds, request.summary);
        self.countdowns
            .run(request.call_id, delay_duration(request.seconds))
            .await
            .is_cancelled()
    }

    fn show_notification(&self, message: &str, level: NoticeLevel) {
        match level {
            NoticeLevel::Error => tracing::error!("{}", message),
            NoticeLevel::Warning => tracing::warn!("{}", message),
            NoticeLevel::Info | NoticeLevel::Success => tracing::info!("{}", message),
        }
        let mut notices = self.notices.lock();
        if notices.len() == NOTICE_HISTORY {
            notices.pop_front();
        }
        notices.push_back((level, message.to_string()));
    }

    fn open_config_panel(&self, store: &ConfigStore) {
        let config = store.get_config();
        for provider in &config.providers {
            for rule in &provider.rules {
                tracing::info!("{}: {}", provider.name, rule.describe());
            }
        }
    }

    fn cancel_active_countdown(&self) -> bool {
        self.countdowns.cancel_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_notice_history_is_bounded() {
        let ui = HeadlessUi::new(Arc::new(Countdowns::new()));
        for i in 0..NOTICE_HISTORY + 5 {
            ui.show_notification(&format!("notice {}", i), NoticeLevel::Info);
        }

        let notices = ui.notices();
        assert_eq!(notices.len(), NOTICE_HISTORY);
        assert_eq!(notices[0].1, "notice 5");
        assert_eq!(notices[NOTICE_HISTORY - 1].1, format!("notice {}", NOTICE_HISTORY + 4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fractional_countdown() {
        let ui = HeadlessUi::new(Arc::new(Countdowns::new()));
        let request = CountdownRequest {
            call_id: Uuid::new_v4(),
            seconds: 1.5,
            summary: "github create file".to_string(),
        };

        let started = tokio::time::Instant::now();
        assert!(!ui.show_countdown(&request).await);
        let elapsed = started.elapsed();
        assert!(elapsed >= std::time::Duration::from_millis(1500));
        assert!(elapsed < std::time::Duration::from_secs(2));
    }
}
