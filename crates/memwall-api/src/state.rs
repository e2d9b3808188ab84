use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local, Offset, TimeZone, Utc};

use memwall_db::Store;
use memwall_moderation::{FailOpen, KeywordModerator, Moderator};

use crate::dispatcher::Dispatcher;

pub type AppState = Arc<AppStateInner>;

/// Everything the services share: the store, the moderation backend, the
/// event fan-out and the offset used for "local" hours and week boundaries.
pub struct AppStateInner {
    pub store: Store,
    pub moderator: FailOpen<Box<dyn Moderator>>,
    pub dispatcher: Dispatcher,
    /// Fixed offset for local time. `None` follows the host zone, resolved
    /// at each use so DST changes are picked up.
    pub utc_offset: Option<FixedOffset>,
}

impl AppStateInner {
    /// Keyword moderation, default dispatcher, host-local time.
    pub fn new(store: Store) -> Self {
        Self {
            store,
            moderator: FailOpen::new(Box::new(KeywordModerator)),
            dispatcher: Dispatcher::default(),
            utc_offset: None,
        }
    }

    pub fn with_moderator(mut self, moderator: impl Moderator + 'static) -> Self {
        self.moderator = FailOpen::new(Box::new(moderator));
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn with_utc_offset(mut self, utc_offset: FixedOffset) -> Self {
        self.utc_offset = Some(utc_offset);
        self
    }

    /// Offset in effect at `at`: the configured one, else the host's.
    pub fn offset_at(&self, at: DateTime<Utc>) -> FixedOffset {
        match self.utc_offset {
            Some(offset) => offset,
            None => Local.offset_from_utc_datetime(&at.naive_utc()).fix(),
        }
    }

    pub fn into_shared(self) -> AppState {
        Arc::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_offset_wins() {
        let plus_three = FixedOffset::east_opt(3 * 3600).unwrap();
        let state = AppStateInner::new(Store::new()).with_utc_offset(plus_three);
        let at = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(state.offset_at(at), plus_three);
    }

    #[test]
    fn host_offset_is_resolved_per_instant() {
        let state = AppStateInner::new(Store::new());
        let winter = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
        let summer = Utc.with_ymd_and_hms(2025, 7, 15, 12, 0, 0).unwrap();

        assert_eq!(state.offset_at(winter), Local.offset_from_utc_datetime(&winter.naive_utc()).fix());
        assert_eq!(state.offset_at(summer), Local.offset_from_utc_datetime(&summer.naive_utc()).fix());
    }
}
