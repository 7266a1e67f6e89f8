//! Action-to-match resolution.
//!
//! Single source of truth for what recording an action means: no other code
//! path creates match rows. Confirmation only flips flags and decline only
//! deletes; both live at the API layer.

use anyhow::Result;

use ember_types::models::{ActionKind, MatchKind};

use crate::Database;

/// Outcome of recording an action, with enough context for the caller to
/// render an icon or label for the branch that fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDecision {
    None,
    Instant { action: ActionKind },
    Conditional,
}

/// Record `from → to` and decide the match outcome.
///
/// A kill is recorded and nothing else happens. For fuck/marry, the reverse
/// action decides: same kind is an instant match (both confirmations pre-set),
/// complementary fuck/marry is a conditional match awaiting both members, and
/// a reverse kill matches nothing. Match creation is insert-or-ignore on the
/// unordered pair, so resubmitting a matching action never duplicates a row.
pub fn resolve_action(
    db: &Database,
    from: i64,
    to: i64,
    action: ActionKind,
) -> Result<MatchDecision> {
    db.record_action(from, to, action)?;

    if action == ActionKind::Kill {
        return Ok(MatchDecision::None);
    }

    let Some(reverse) = db.action_between(to, from)? else {
        return Ok(MatchDecision::None);
    };

    match (action, reverse) {
        (a, r) if a == r => {
            db.create_match_if_absent(from, to, MatchKind::Instant, true)?;
            Ok(MatchDecision::Instant { action })
        }
        (ActionKind::Fuck, ActionKind::Marry) | (ActionKind::Marry, ActionKind::Fuck) => {
            db.create_match_if_absent(from, to, MatchKind::Conditional, false)?;
            Ok(MatchDecision::Conditional)
        }
        // The reverse side was a kill: no symmetric rule applies.
        _ => Ok(MatchDecision::None),
    }
}
