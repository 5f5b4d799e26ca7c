pub mod control;
pub mod countdown;
pub mod headless;
pub mod page;
pub mod terminal;
pub mod types;

use crate::approval::types::{CountdownRequest, NoticeLevel};
use crate::policy::ConfigStore;
use async_trait::async_trait;

pub use control::{ApprovalControl, ControlLocator, ControlTarget, DiscoveryStrategy, HostPage};
pub use countdown::{CountdownOutcome, Countdowns, Ticket};
pub use headless::HeadlessUi;
pub use page::StaticPage;
pub use terminal::TerminalUi;

/// Everything the orchestrator needs from the user-facing layer.
/// Implementations can be terminal-based, headless, or embedded in a page.
#[async_trait]
pub trait FeedbackUi: Send + Sync {
    /// Show a cancellable countdown. Resolves to true if the user cancelled.
    async fn show_countdown(&self, request: &CountdownRequest) -> bool;

    fn show_notification(&self, message: &str, level: NoticeLevel);

    fn open_config_panel(&self, store: &ConfigStore);

    /// Cancel the countdown currently on screen. Returns false if none.
    fn cancel_active_countdown(&self) -> bool;
}
