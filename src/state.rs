use crate::calendar::CalendarClient;
use crate::client::RemoteClient;
use crate::config::Config;
use crate::directory::MemberDirectory;
use crate::session::MemorySession;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// One-shot message shown above the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub session: MemorySession,
    pub directory: Arc<MemberDirectory>,
    pub calendar: Arc<CalendarClient>,
    notice: Arc<Mutex<Option<Notice>>>,
}

impl AppState {
    pub fn new(config: Config, session: MemorySession) -> Self {
        let client = RemoteClient::new(config.api_base_url.clone(), Arc::new(session.clone()));
        Self {
            config: Arc::new(config),
            session,
            directory: Arc::new(MemberDirectory::new(client.clone())),
            calendar: Arc::new(CalendarClient::new(client)),
            notice: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn notify(&self, kind: NoticeKind, message: impl Into<String>) {
        *self.notice.lock().await = Some(Notice {
            kind,
            message: message.into(),
        });
    }

    pub async fn take_notice(&self) -> Option<Notice> {
        self.notice.lock().await.take()
    }
}
