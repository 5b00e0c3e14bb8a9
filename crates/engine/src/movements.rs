//! Movement primitives.
//!
//! A `Movement` is an atomic money event that changes account balances. Its
//! role is carried by [`MovementKind`]: an inflow credits `account_in`, an
//! outflow debits `account_out`, a transfer does both with the same amount.
//!
//! The amount is stored unsigned-by-convention (non-negative); the sign of the
//! balance change is implicit in the role, never stored separately.

use chrono::NaiveDate;
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, Money, ResultEngine, commands::MovementDraft, util};

/// Which accounts a movement touches, and in which role.
///
/// Construction goes through [`MovementKind::from_refs`], so a movement with
/// no account at all cannot exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum MovementKind {
    Inflow { account_in: Uuid },
    Outflow { account_out: Uuid },
    Transfer { account_in: Uuid, account_out: Uuid },
}

impl MovementKind {
    /// Builds the role from optional in/out references.
    ///
    /// Fails with [`EngineError::NoAccountSpecified`] when both are `None`. A
    /// transfer where both references point at the same account is accepted;
    /// it nets to zero.
    pub fn from_refs(account_in: Option<Uuid>, account_out: Option<Uuid>) -> ResultEngine<Self> {
        match (account_in, account_out) {
            (Some(account_in), Some(account_out)) => Ok(Self::Transfer {
                account_in,
                account_out,
            }),
            (Some(account_in), None) => Ok(Self::Inflow { account_in }),
            (None, Some(account_out)) => Ok(Self::Outflow { account_out }),
            (None, None) => Err(EngineError::NoAccountSpecified),
        }
    }

    #[must_use]
    pub fn account_in(&self) -> Option<Uuid> {
        match self {
            Self::Inflow { account_in } | Self::Transfer { account_in, .. } => Some(*account_in),
            Self::Outflow { .. } => None,
        }
    }

    #[must_use]
    pub fn account_out(&self) -> Option<Uuid> {
        match self {
            Self::Outflow { account_out } | Self::Transfer { account_out, .. } => {
                Some(*account_out)
            }
            Self::Inflow { .. } => None,
        }
    }

    /// Every account referenced by the role, in-account first.
    pub fn accounts(&self) -> impl Iterator<Item = Uuid> {
        self.account_in().into_iter().chain(self.account_out())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: Uuid,
    pub occurred_on: NaiveDate,
    pub title: String,
    pub detail: Option<String>,
    pub amount: Money,
    pub currency: Currency,
    pub kind: MovementKind,
    pub category_id: Uuid,
}

impl Movement {
    pub(crate) fn from_draft(draft: &MovementDraft) -> ResultEngine<Self> {
        Self::build(Uuid::new_v4(), draft)
    }

    /// Rebuilds a movement under an existing identity, used when editing.
    pub(crate) fn with_id(id: Uuid, draft: &MovementDraft) -> ResultEngine<Self> {
        Self::build(id, draft)
    }

    fn build(id: Uuid, draft: &MovementDraft) -> ResultEngine<Self> {
        let kind = MovementKind::from_refs(draft.account_in, draft.account_out)?;
        if draft.amount.is_negative() {
            return Err(EngineError::InvalidAmount(
                "amount must not be negative".to_string(),
            ));
        }
        let title = util::normalize_required(&draft.title, "movement title")?;

        Ok(Self {
            id,
            occurred_on: draft.occurred_on,
            title,
            detail: util::normalize_optional(draft.detail.as_deref()),
            amount: draft.amount,
            currency: draft.currency,
            kind,
            category_id: draft.category_id,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub occurred_on: Date,
    pub title: String,
    pub detail: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub account_in: Option<String>,
    pub account_out: Option<String>,
    pub category_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountIn",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    AccountIn,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountOut",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    AccountOut,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Categories,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Movement> for ActiveModel {
    fn from(movement: &Movement) -> Self {
        Self {
            id: ActiveValue::Set(movement.id.to_string()),
            occurred_on: ActiveValue::Set(movement.occurred_on),
            title: ActiveValue::Set(movement.title.clone()),
            detail: ActiveValue::Set(movement.detail.clone()),
            amount_minor: ActiveValue::Set(movement.amount.cents()),
            currency: ActiveValue::Set(movement.currency.code().to_string()),
            account_in: ActiveValue::Set(movement.kind.account_in().map(|id| id.to_string())),
            account_out: ActiveValue::Set(movement.kind.account_out().map(|id| id.to_string())),
            category_id: ActiveValue::Set(movement.category_id.to_string()),
        }
    }
}

impl TryFrom<Model> for Movement {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let account_in = model
            .account_in
            .as_deref()
            .map(|value| util::parse_uuid(value, "account_in"))
            .transpose()?;
        let account_out = model
            .account_out
            .as_deref()
            .map(|value| util::parse_uuid(value, "account_out"))
            .transpose()?;

        Ok(Self {
            id: util::parse_uuid(&model.id, "movement")?,
            occurred_on: model.occurred_on,
            title: model.title,
            detail: model.detail,
            amount: Money::new(model.amount_minor),
            currency: Currency::try_from(model.currency.as_str())?,
            kind: MovementKind::from_refs(account_in, account_out)?,
            category_id: util::parse_uuid(&model.category_id, "category")?,
        })
    }
}
