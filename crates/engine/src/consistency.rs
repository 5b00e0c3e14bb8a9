//! Independent balance verification.
//!
//! The checker is stateless: it only looks at an account's starting balance,
//! its current balance and the movements referencing it, and recomputes what
//! the balance should be. It never mutates anything; the explicit repair
//! operations on the engine act on its report.

use serde::Serialize;
use uuid::Uuid;

use crate::{Account, Money, Movement};

/// Result of recomputing an account balance from its movements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BalanceReport {
    /// Whether the stored balance matches the recomputed one.
    pub ok: bool,
    /// Net effect of every linked movement: inflows minus outflows.
    pub movement_sum: Money,
    /// `balance_start + movement_sum`.
    pub expected: Money,
}

pub(crate) fn check(account: &Account, movements: &[Movement]) -> BalanceReport {
    let movement_sum = movement_sum(account.id, movements);
    let expected = account.balance_start + movement_sum;
    BalanceReport {
        ok: account.balance == expected,
        movement_sum,
        expected,
    }
}

/// Sums the signed effect of `movements` on one account.
///
/// A movement listing the account on both sides contributes both signs, so a
/// self-referencing transfer counts as zero.
pub(crate) fn movement_sum(account_id: Uuid, movements: &[Movement]) -> Money {
    let mut sum = Money::ZERO;
    for movement in movements {
        if movement.kind.account_in() == Some(account_id) {
            sum += movement.amount;
        }
        if movement.kind.account_out() == Some(account_id) {
            sum -= movement.amount;
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::{Currency, MovementKind};

    use super::*;

    fn account(balance_start: i64, balance: i64) -> Account {
        let mut account = Account::new(
            "cash".to_string(),
            "Cash".to_string(),
            Money::new(balance_start),
            Currency::Usd,
        );
        account.balance = Money::new(balance);
        account
    }

    fn movement(kind: MovementKind, amount: i64) -> Movement {
        Movement {
            id: Uuid::new_v4(),
            occurred_on: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            title: "test".to_string(),
            detail: None,
            amount: Money::new(amount),
            currency: Currency::Usd,
            kind,
            category_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn matching_balance_reports_ok() {
        let acc = account(5000_00, 5300_00);
        let other = Uuid::new_v4();
        let movements = vec![
            movement(MovementKind::Inflow { account_in: acc.id }, 500_00),
            movement(
                MovementKind::Outflow {
                    account_out: acc.id,
                },
                200_00,
            ),
            movement(
                MovementKind::Inflow {
                    account_in: other,
                },
                900_00,
            ),
        ];

        let report = check(&acc, &movements);

        assert!(report.ok);
        assert_eq!(report.movement_sum, Money::new(300_00));
        assert_eq!(report.expected, Money::new(5300_00));
    }

    #[test]
    fn drifted_balance_reports_not_ok() {
        let acc = account(5000_00, 9999_00);
        let movements = vec![movement(MovementKind::Inflow { account_in: acc.id }, 500_00)];

        let report = check(&acc, &movements);

        assert!(!report.ok);
        assert_eq!(report.expected, Money::new(5500_00));
    }

    #[test]
    fn both_roles_of_a_transfer_count_once_each() {
        let acc = account(0, 0);
        let other = Uuid::new_v4();
        let movements = vec![
            movement(
                MovementKind::Transfer {
                    account_in: acc.id,
                    account_out: other,
                },
                900_00,
            ),
            movement(
                MovementKind::Transfer {
                    account_in: other,
                    account_out: acc.id,
                },
                250_00,
            ),
        ];

        assert_eq!(movement_sum(acc.id, &movements), Money::new(650_00));
    }

    #[test]
    fn self_transfer_contributes_nothing() {
        let acc = account(1000, 1000);
        let movements = vec![movement(
            MovementKind::Transfer {
                account_in: acc.id,
                account_out: acc.id,
            },
            400,
        )];

        let report = check(&acc, &movements);

        assert!(report.ok);
        assert_eq!(report.movement_sum, Money::ZERO);
    }
}
