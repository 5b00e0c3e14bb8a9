//! The module contains the `Account` struct and its implementation.
//!
//! An account is a representation of a real place where money is kept: a
//! physical wallet, a bank account, a savings box. Its balance is never edited
//! directly; only movement operations mutate it.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, Money, util};

/// A money-holding account tracked by the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable identifier for this account.
    ///
    /// This is a UUID generated once and persisted in the database, so the
    /// account can be renamed or recoded without breaking references.
    pub id: Uuid,
    /// Unique short code used as the external reference key.
    pub code: String,
    pub name: String,
    /// Balance at creation time. Only the explicit start-balance repair
    /// operation may rewrite it afterwards.
    pub balance_start: Money,
    /// Balance immediately before the most recent movement mutation.
    pub balance_previous: Money,
    /// Current authoritative balance.
    pub balance: Money,
    pub currency: Currency,
}

impl Account {
    /// Creates an account holding exactly its starting balance.
    ///
    /// At creation `balance == balance_start` and `balance_previous == 0`.
    /// This holds only here; later saves never reapply it.
    pub fn new(code: String, name: String, balance_start: Money, currency: Currency) -> Self {
        Self {
            id: Uuid::new_v4(),
            code,
            name,
            balance_start,
            balance_previous: Money::ZERO,
            balance: balance_start,
            currency,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub code_norm: String,
    pub name: String,
    pub balance_start: i64,
    pub balance_previous: i64,
    pub balance: i64,
    pub currency: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(value: &Account) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            code: ActiveValue::Set(value.code.clone()),
            code_norm: ActiveValue::Set(util::normalize_key(&value.code)),
            name: ActiveValue::Set(value.name.clone()),
            balance_start: ActiveValue::Set(value.balance_start.cents()),
            balance_previous: ActiveValue::Set(value.balance_previous.cents()),
            balance: ActiveValue::Set(value.balance.cents()),
            currency: ActiveValue::Set(value.currency.code().to_string()),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: util::parse_uuid(&model.id, "account")?,
            code: model.code,
            name: model.name,
            balance_start: Money::new(model.balance_start),
            balance_previous: Money::new(model.balance_previous),
            balance: Money::new(model.balance),
            currency: Currency::try_from(model.currency.as_str())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_holds_its_starting_balance() {
        let account = Account::new(
            "cash".to_string(),
            "Cash".to_string(),
            Money::new(5000_00),
            Currency::Usd,
        );

        assert_eq!(account.balance, account.balance_start);
        assert_eq!(account.balance_previous, Money::ZERO);
    }

    #[test]
    fn round_trips_through_the_storage_model() {
        let account = Account::new(
            "bank".to_string(),
            "Bank".to_string(),
            Money::new(120_000),
            Currency::Eur,
        );
        let active: ActiveModel = (&account).into();

        assert_eq!(active.code_norm.unwrap(), "bank");
        assert_eq!(active.balance.unwrap(), 120_000);
        assert_eq!(active.balance_previous.unwrap(), 0);
    }
}
