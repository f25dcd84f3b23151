use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::LoanRecord;

/// How an incoming record set is reconciled with the local one.
///
/// Replace is what a deliberate backup restore uses, and what the cloud
/// session applies to every snapshot once connected (the mirror is the
/// single shared source of truth). Merge is what every manual exchange
/// uses - file, clipboard, share link. The asymmetry is intentional; do
/// not unify the two paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    Merge,
    Replace,
}

/// Reconcile `incoming` into `local`.
///
/// Merge mode is per-entity last-write-wins keyed by id:
/// - id only in incoming: added (record introduced on another device);
/// - id only in local: kept untouched;
/// - id in both: the copy with the greater `last_updated` wins, exact tie
///   keeps local (avoids a needless rewrite).
///
/// Tombstones get no special precedence: a newer deleted copy overwrites a
/// live one by ordinary timestamp ordering, which is how deletes propagate.
/// A record that deserialized without a stamp carries `last_updated == 0`
/// and loses to any copy that was ever explicitly edited.
///
/// The result is a pure value - no mutation of either input. Output order
/// is deterministic: local iteration order with winners substituted in
/// place, then incoming-only records in incoming order. Under accurate
/// stamps the operation is idempotent and order-independent as a set.
pub fn merge_records(
    local: &[LoanRecord],
    incoming: &[LoanRecord],
    mode: MergeMode,
) -> Vec<LoanRecord> {
    if mode == MergeMode::Replace {
        return incoming.to_vec();
    }

    let incoming_by_id: HashMap<&str, &LoanRecord> =
        incoming.iter().map(|r| (r.id.as_str(), r)).collect();
    let local_ids: HashSet<&str> = local.iter().map(|r| r.id.as_str()).collect();

    let mut merged = Vec::with_capacity(local.len() + incoming.len());

    for ours in local {
        match incoming_by_id.get(ours.id.as_str()) {
            Some(theirs) if theirs.last_updated > ours.last_updated => {
                merged.push((*theirs).clone());
            }
            _ => merged.push(ours.clone()),
        }
    }

    for theirs in incoming {
        if !local_ids.contains(theirs.id.as_str()) {
            merged.push(theirs.clone());
        }
    }

    merged
}
