//! Pronoun resolution against persisted turn history.
//!
//! Each detected pronoun is classified into a slot, and the last value that
//! slot held on the user's most recent input with a detected object replaces
//! the pronoun in the same slot list. The first pronoun without a referent
//! ends the pass; substitutions made before it are kept.

use crate::error::ContextError;
use crate::input::{Slot, StructuredInput};
use crate::msg::Msg;
use crate::store::TurnStore;
use tracing::{debug, info, instrument};

/// Returns the turn's structured input with pronouns replaced by their
/// referents. The turn itself is not modified.
///
/// # Errors
///
/// - `UnknownPronoun` if a detected pronoun has no known slot
/// - `MissingUser` if the turn has pronouns but no identified user
/// - `Store` if a history lookup fails
#[instrument(skip_all, fields(user_id = ?msg.user_id()))]
pub async fn resolve_context<S: TurnStore + ?Sized>(
    store: &S,
    msg: &Msg,
) -> Result<StructuredInput, ContextError> {
    let mut resolved = msg.structured_input.clone();

    for pronoun in msg.structured_input.pronouns() {
        let slot = Slot::for_pronoun(pronoun).ok_or_else(|| ContextError::UnknownPronoun {
            pronoun: pronoun.clone(),
        })?;
        let user = msg.user_id().ok_or(ContextError::MissingUser)?;

        debug!(%pronoun, %slot, "getting context");
        let Some(referent) = store.last_slot_value(user, slot).await? else {
            debug!(%pronoun, %slot, "no context found");
            break;
        };

        let replaced = resolved.replace(slot, pronoun, &referent);
        info!(%pronoun, ctx = %referent, replaced, "context found");
    }

    Ok(resolved)
}
