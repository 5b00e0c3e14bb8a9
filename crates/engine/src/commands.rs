//! Command structs for engine operations.
//!
//! These types group parameters for write operations, keeping call sites
//! readable and avoiding long argument lists.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{Currency, Money};

/// The full desired state of a movement.
///
/// Used both to create a movement and as the new state when editing one; the
/// engine diffs it against the last-persisted row, so a draft always carries
/// every field, not just the changed ones.
#[derive(Clone, Debug)]
pub struct MovementDraft {
    pub occurred_on: NaiveDate,
    pub title: String,
    pub detail: Option<String>,
    pub amount: Money,
    pub currency: Currency,
    pub account_in: Option<Uuid>,
    pub account_out: Option<Uuid>,
    pub category_id: Uuid,
}

impl MovementDraft {
    #[must_use]
    pub fn new(
        occurred_on: NaiveDate,
        title: impl Into<String>,
        amount: Money,
        category_id: Uuid,
    ) -> Self {
        Self {
            occurred_on,
            title: title.into(),
            detail: None,
            amount,
            currency: Currency::default(),
            account_in: None,
            account_out: None,
            category_id,
        }
    }

    #[must_use]
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    #[must_use]
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    #[must_use]
    pub fn account_in(mut self, account_id: Uuid) -> Self {
        self.account_in = Some(account_id);
        self
    }

    #[must_use]
    pub fn account_out(mut self, account_id: Uuid) -> Self {
        self.account_out = Some(account_id);
        self
    }
}
