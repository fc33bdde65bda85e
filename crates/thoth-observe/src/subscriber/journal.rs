use async_trait::async_trait;
use thoth_core::{Event, Subscribe};

use crate::subscriber::view::log_event;

/// Writes executor events to the process log.
#[derive(Debug, Default)]
pub struct Journal;

impl Journal {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for Journal {
    async fn on_event(&self, event: &Event) {
        log_event(event);
    }

    fn name(&self) -> &'static str {
        "journal"
    }
}
