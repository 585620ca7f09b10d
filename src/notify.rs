// User-visible notifications (toasts), queued for the presentation layer to drain

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct Notifications {
    queue: Vec<Notice>,
}

impl Notifications {
    pub fn push(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            NoticeLevel::Error => tracing::warn!(%message, "Error notice queued"),
            _ => tracing::debug!(%message, "Notice queued"),
        }
        self.queue.push(Notice { level, message });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Success, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Error, message);
    }

    pub fn pending(&self) -> &[Notice] {
        &self.queue
    }

    /// Hands all queued notices to the caller, oldest first.
    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_in_order() {
        let mut notifications = Notifications::default();
        notifications.info("No listings found!");
        notifications.error("Failed to fetch more listings.");
        let drained = notifications.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].level, NoticeLevel::Info);
        assert_eq!(drained[1].message, "Failed to fetch more listings.");
        assert!(notifications.pending().is_empty());
    }
}
