//! Application state shared across handlers.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::config::AppSettings;
use crate::db::Store;
use crate::services::clock::Clock;
use crate::services::email::InviteNotifier;

/// Application state shared across all handlers.
///
/// Cheap to clone; every collaborator is injected here rather than reached
/// through a global.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    settings: AppSettings,
    store: Arc<dyn Store>,
    notifier: Arc<dyn InviteNotifier>,
    clock: Arc<dyn Clock>,
}

impl AppState {
    /// Assemble state from its collaborators.
    #[must_use]
    pub fn new(
        settings: AppSettings,
        store: Arc<dyn Store>,
        notifier: Arc<dyn InviteNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                settings,
                store,
                notifier,
                clock,
            }),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &AppSettings {
        &self.inner.settings
    }

    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    #[must_use]
    pub fn notifier(&self) -> &dyn InviteNotifier {
        self.inner.notifier.as_ref()
    }

    /// Current instant from the injected clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    /// Current wall-clock time in the company's local calendar.
    #[must_use]
    pub fn local_now(&self) -> NaiveDateTime {
        self.now()
            .with_timezone(&self.inner.settings.utc_offset)
            .naive_local()
    }

    /// Today's date in the company's local calendar.
    #[must_use]
    pub fn local_today(&self) -> NaiveDate {
        self.local_now().date()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::FixedOffset;

    use super::*;
    use crate::db::MemoryStore;
    use crate::services::clock::FixedClock;
    use crate::services::email::LogNotifier;

    fn state_at(instant: &str, offset_minutes: i32) -> AppState {
        let settings = AppSettings {
            utc_offset: FixedOffset::east_opt(offset_minutes * 60).unwrap(),
            ..AppSettings::default()
        };
        let now = DateTime::parse_from_rfc3339(instant).unwrap().with_timezone(&Utc);
        AppState::new(
            settings,
            Arc::new(MemoryStore::new()),
            Arc::new(LogNotifier),
            Arc::new(FixedClock::new(now)),
        )
    }

    #[test]
    fn test_local_today_follows_offset() {
        // 03:30 UTC on the 15th is still the 14th in UTC-5
        let behind = state_at("2024-05-15T03:30:00Z", -300);
        assert_eq!(behind.local_today(), NaiveDate::from_ymd_opt(2024, 5, 14).unwrap());

        let utc = state_at("2024-05-15T03:30:00Z", 0);
        assert_eq!(utc.local_today(), NaiveDate::from_ymd_opt(2024, 5, 15).unwrap());
    }
}
