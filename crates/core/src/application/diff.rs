//! Diff Engine - decides whether a fresh value must be written back
//!
//! Every write is a round-trip to a small embedded host, so the engine only
//! answers `true` when it can prove the remote value differs. Missing
//! baseline, missing variable and unparsable numbers all mean "leave it".

use crate::domain::{Snapshot, ValueKind};
use tracing::{debug, warn};

/// Whether `fresh_value` differs from the remote value of `variable_name`
pub fn needs_update(
    fresh_value: &str,
    variable_name: &str,
    kind: ValueKind,
    snapshot: Option<&Snapshot>,
) -> bool {
    let Some(snapshot) = snapshot else {
        debug!(variable = %variable_name, "No remote snapshot, cannot compare");
        return false;
    };

    let Some(current) = snapshot.get(variable_name) else {
        warn!(
            variable = %variable_name,
            "Variable not present in remote snapshot, skipping"
        );
        return false;
    };

    match kind {
        ValueKind::Number => match fresh_value.trim().parse::<f64>() {
            // A remote value of another type never equals a number
            Ok(fresh) => current.as_number().map_or(true, |remote| fresh != remote),
            Err(e) => {
                warn!(
                    variable = %variable_name,
                    value = %fresh_value,
                    error = %e,
                    "Value is not a number, skipping"
                );
                false
            }
        },
        ValueKind::Text => current.as_text().map_or(true, |remote| remote != fresh_value),
    }
}
