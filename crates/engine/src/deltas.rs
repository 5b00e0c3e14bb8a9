//! Balance delta resolution.
//!
//! Every movement operation is expressed as an explicit list of
//! `(account id, signed delta)` operations and then netted per distinct
//! account before anything is written. An account that plays several roles
//! across one edit (the old in-account becoming the new out-account, a
//! transfer whose sides are swapped, a self-referencing transfer) therefore
//! receives exactly one combined write; two live handles to the same record
//! can never overwrite each other.

use uuid::Uuid;

use crate::{Money, MovementKind};

/// Deltas applied when a movement comes into existence: credit the in
/// account, debit the out account.
pub(crate) fn creation_ops(kind: &MovementKind, amount: Money) -> Vec<(Uuid, Money)> {
    let mut ops = Vec::with_capacity(2);
    if let Some(account_id) = kind.account_in() {
        ops.push((account_id, amount));
    }
    if let Some(account_id) = kind.account_out() {
        ops.push((account_id, -amount));
    }
    ops
}

/// Exact algebraic inverse of [`creation_ops`].
pub(crate) fn reversal_ops(kind: &MovementKind, amount: Money) -> Vec<(Uuid, Money)> {
    creation_ops(kind, amount)
        .into_iter()
        .map(|(account_id, delta)| (account_id, -delta))
        .collect()
}

/// Deltas for an edit: undo the persisted state, apply the new one.
pub(crate) fn edit_ops(
    old_kind: &MovementKind,
    old_amount: Money,
    new_kind: &MovementKind,
    new_amount: Money,
) -> Vec<(Uuid, Money)> {
    let mut ops = reversal_ops(old_kind, old_amount);
    ops.extend(creation_ops(new_kind, new_amount));
    ops
}

/// Nets an operation list down to one delta per distinct account, preserving
/// first-touch order.
pub(crate) fn net_deltas(ops: &[(Uuid, Money)]) -> Vec<(Uuid, Money)> {
    let mut nets: Vec<(Uuid, Money)> = Vec::with_capacity(ops.len());
    for (account_id, delta) in ops {
        match nets.iter_mut().find(|(id, _)| id == account_id) {
            Some((_, net)) => *net += *delta,
            None => nets.push((*account_id, *delta)),
        }
    }
    nets
}
