use memwall_moderation::ToxicityCheck;

use crate::state::AppStateInner;

/// Score text without storing anything. Falls back to a clean result when
/// the moderation backend is unavailable.
pub fn check_toxicity(state: &AppStateInner, content: &str) -> ToxicityCheck {
    state.moderator.check(content).into()
}
