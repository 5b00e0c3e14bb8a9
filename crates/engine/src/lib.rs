use std::collections::HashMap;

use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait, prelude::*,
};
use uuid::Uuid;

pub use accounts::Account;
pub use categories::Category;
pub use commands::MovementDraft;
pub use consistency::BalanceReport;
pub use currency::Currency;
pub use error::EngineError;
pub use money::Money;
pub use movements::{Movement, MovementKind};

mod accounts;
mod categories;
mod commands;
mod consistency;
mod currency;
mod deltas;
mod error;
mod money;
mod movements;
mod util;

type ResultEngine<T> = Result<T, EngineError>;

/// One pending balance write, previewed in memory before anything is
/// persisted.
#[derive(Debug)]
struct BalanceFlush {
    account_id: Uuid,
    balance_previous: Money,
    balance: Money,
}

/// The ledger engine.
///
/// Accounts are held in memory as the working state (loaded once by the
/// builder); movements live in the database. Every movement operation
/// previews the balance changes against the in-memory accounts, persists
/// the touched account rows together with the movement row in a single
/// database transaction, and only then applies the changes to memory.
#[derive(Debug)]
pub struct Engine {
    accounts: HashMap<Uuid, Account>,
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Add a new account.
    ///
    /// The account starts holding exactly `balance_start`, with a zero
    /// previous balance. Codes are unique on their normalized form.
    pub async fn new_account(
        &mut self,
        code: &str,
        name: &str,
        balance_start: Money,
        currency: Currency,
    ) -> ResultEngine<Uuid> {
        let code = util::normalize_required(code, "account code")?;
        let name = util::normalize_required(name, "account name")?;

        let code_norm = util::normalize_key(&code);
        if self
            .accounts
            .values()
            .any(|account| util::normalize_key(&account.code) == code_norm)
        {
            return Err(EngineError::ExistingKey(code));
        }

        let account = Account::new(code, name, balance_start, currency);
        let account_model: accounts::ActiveModel = (&account).into();
        account_model.insert(&self.database).await?;

        let account_id = account.id;
        self.accounts.insert(account_id, account);
        Ok(account_id)
    }

    /// Change an account's code and/or display name.
    ///
    /// Only the identity columns are written; balances are owned by the
    /// movement operations and are never touched here.
    pub async fn update_account(
        &mut self,
        account_id: Uuid,
        code: Option<&str>,
        name: Option<&str>,
    ) -> ResultEngine<()> {
        self.account(account_id)?;
        if code.is_none() && name.is_none() {
            return Ok(());
        }

        let new_code = code
            .map(|value| util::normalize_required(value, "account code"))
            .transpose()?;
        let new_name = name
            .map(|value| util::normalize_required(value, "account name"))
            .transpose()?;

        if let Some(code) = &new_code {
            let code_norm = util::normalize_key(code);
            if self.accounts.values().any(|account| {
                account.id != account_id && util::normalize_key(&account.code) == code_norm
            }) {
                return Err(EngineError::ExistingKey(code.clone()));
            }
        }

        let mut account_model = accounts::ActiveModel {
            id: ActiveValue::Set(account_id.to_string()),
            ..Default::default()
        };
        if let Some(code) = &new_code {
            account_model.code = ActiveValue::Set(code.clone());
            account_model.code_norm = ActiveValue::Set(util::normalize_key(code));
        }
        if let Some(name) = &new_name {
            account_model.name = ActiveValue::Set(name.clone());
        }
        account_model.update(&self.database).await?;

        let account = self.account_mut(account_id)?;
        if let Some(code) = new_code {
            account.code = code;
        }
        if let Some(name) = new_name {
            account.name = name;
        }
        Ok(())
    }

    /// Delete an account.
    ///
    /// Blocked while any movement still references the account in either
    /// role; callers must delete or repoint those movements first.
    pub async fn delete_account(&mut self, account_id: Uuid) -> ResultEngine<()> {
        let account = self.account(account_id)?;

        let referencing = movements::Entity::find()
            .filter(account_reference_condition(account_id))
            .count(&self.database)
            .await?;
        if referencing > 0 {
            return Err(EngineError::AccountInUse(account.code.clone()));
        }

        accounts::Entity::delete_by_id(account_id.to_string())
            .exec(&self.database)
            .await?;
        self.accounts.remove(&account_id);
        Ok(())
    }

    /// Return an account.
    pub fn account(&self, account_id: Uuid) -> ResultEngine<&Account> {
        self.accounts
            .get(&account_id)
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))
    }

    /// Return an account by its short code; the lookup is
    /// normalization-insensitive.
    pub fn account_by_code(&self, code: &str) -> ResultEngine<&Account> {
        let code_norm = util::normalize_key(code);
        self.accounts
            .values()
            .find(|account| util::normalize_key(&account.code) == code_norm)
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))
    }

    /// Iterate over every account.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Register a new category. Names are unique on their normalized form.
    pub async fn new_category(&mut self, name: &str, description: &str) -> ResultEngine<Uuid> {
        let name = util::normalize_required(name, "category name")?;
        let name_norm = util::normalize_key(&name);

        let existing = categories::Entity::find()
            .filter(categories::Column::NameNorm.eq(name_norm))
            .one(&self.database)
            .await?;
        if existing.is_some() {
            return Err(EngineError::ExistingKey(name));
        }

        let category = Category::new(name, description.trim().to_string());
        let category_model: categories::ActiveModel = (&category).into();
        category_model.insert(&self.database).await?;
        Ok(category.id)
    }

    /// List every category, name-ordered.
    pub async fn categories(&self) -> ResultEngine<Vec<Category>> {
        let models = categories::Entity::find()
            .order_by_asc(categories::Column::Name)
            .all(&self.database)
            .await?;
        models.into_iter().map(Category::try_from).collect()
    }

    /// Record a new movement and apply its effect on balances.
    ///
    /// Validation happens before any mutation: a draft referencing no account
    /// at all fails with [`EngineError::NoAccountSpecified`] and leaves every
    /// balance untouched. The touched account rows and the movement row are
    /// persisted in one database transaction.
    pub async fn new_movement(&mut self, draft: MovementDraft) -> ResultEngine<Uuid> {
        let movement = Movement::from_draft(&draft)?;
        self.require_category(movement.category_id).await?;
        self.ensure_movement_currency(&movement.kind, movement.currency)?;

        let ops = deltas::creation_ops(&movement.kind, movement.amount);
        let flushes = self.preview_updates(&deltas::net_deltas(&ops))?;

        let db_tx = self.database.begin().await?;
        persist_balances(&db_tx, &flushes).await?;
        movements::ActiveModel::from(&movement).insert(&db_tx).await?;
        db_tx.commit().await?;

        self.apply_balances_to_memory(flushes)?;
        Ok(movement.id)
    }

    /// Rewrite an existing movement and reconcile every touched balance.
    ///
    /// The diff runs against the movement's last-persisted row, not any
    /// in-memory copy, so a single edit may change the amount and both
    /// account references at once. The old and new per-role deltas are netted
    /// per distinct account before writing, which makes role flips, account
    /// swaps and old/new collisions on the same physical account safe by
    /// construction.
    pub async fn update_movement(
        &mut self,
        movement_id: Uuid,
        draft: MovementDraft,
    ) -> ResultEngine<()> {
        let previous = self.movement(movement_id).await?;
        let updated = Movement::with_id(movement_id, &draft)?;
        self.require_category(updated.category_id).await?;
        self.ensure_movement_currency(&updated.kind, updated.currency)?;

        let ops = deltas::edit_ops(
            &previous.kind,
            previous.amount,
            &updated.kind,
            updated.amount,
        );
        let flushes = self.preview_updates(&deltas::net_deltas(&ops))?;

        let db_tx = self.database.begin().await?;
        persist_balances(&db_tx, &flushes).await?;
        movements::ActiveModel::from(&updated).update(&db_tx).await?;
        db_tx.commit().await?;

        self.apply_balances_to_memory(flushes)?;
        Ok(())
    }

    /// Remove a movement, reverting its effect on balances.
    ///
    /// Exact inverse of [`Engine::new_movement`] for the persisted
    /// (amount, account_in, account_out) triple.
    pub async fn delete_movement(&mut self, movement_id: Uuid) -> ResultEngine<()> {
        let movement = self.movement(movement_id).await?;

        let ops = deltas::reversal_ops(&movement.kind, movement.amount);
        let flushes = self.preview_updates(&deltas::net_deltas(&ops))?;

        let db_tx = self.database.begin().await?;
        persist_balances(&db_tx, &flushes).await?;
        movements::Entity::delete_by_id(movement_id.to_string())
            .exec(&db_tx)
            .await?;
        db_tx.commit().await?;

        self.apply_balances_to_memory(flushes)?;
        Ok(())
    }

    /// Return a movement as last persisted.
    pub async fn movement(&self, movement_id: Uuid) -> ResultEngine<Movement> {
        let model = movements::Entity::find_by_id(movement_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("movement not exists".to_string()))?;
        Movement::try_from(model)
    }

    /// List every movement, oldest first.
    pub async fn movements(&self) -> ResultEngine<Vec<Movement>> {
        let models = movements::Entity::find()
            .order_by_asc(movements::Column::OccurredOn)
            .order_by_asc(movements::Column::Id)
            .all(&self.database)
            .await?;
        models.into_iter().map(Movement::try_from).collect()
    }

    /// Lists movements that reference an account in either role, most recent
    /// first.
    pub async fn movements_for_account(
        &self,
        account_id: Uuid,
        limit: Option<u64>,
    ) -> ResultEngine<Vec<Movement>> {
        self.account(account_id)?;

        let mut query = movements::Entity::find()
            .filter(account_reference_condition(account_id))
            .order_by_desc(movements::Column::OccurredOn)
            .order_by_desc(movements::Column::Id);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        let models = query.all(&self.database).await?;
        models.into_iter().map(Movement::try_from).collect()
    }

    /// Recompute an account's expected balance from its starting balance and
    /// every linked movement.
    ///
    /// A failed check is a report, not an error; repair is explicit via
    /// [`Engine::correct_balance`] or [`Engine::correct_start_balance`].
    pub async fn check_balance(&self, account_id: Uuid) -> ResultEngine<BalanceReport> {
        let account = self.account(account_id)?;
        let movements = self.movements_for_account(account_id, None).await?;
        Ok(consistency::check(account, &movements))
    }

    /// Repair: rewrite the current balance from
    /// `balance_start + movement_sum`.
    pub async fn correct_balance(&mut self, account_id: Uuid) -> ResultEngine<()> {
        let report = self.check_balance(account_id).await?;
        let corrected = self.account(account_id)?.balance_start + report.movement_sum;

        let account_model = accounts::ActiveModel {
            id: ActiveValue::Set(account_id.to_string()),
            balance: ActiveValue::Set(corrected.cents()),
            ..Default::default()
        };
        account_model.update(&self.database).await?;

        self.account_mut(account_id)?.balance = corrected;
        Ok(())
    }

    /// Repair: rebase the starting balance from
    /// `balance - movement_sum`, keeping the current balance as-is.
    pub async fn correct_start_balance(&mut self, account_id: Uuid) -> ResultEngine<()> {
        let report = self.check_balance(account_id).await?;
        let corrected = self.account(account_id)?.balance - report.movement_sum;

        let account_model = accounts::ActiveModel {
            id: ActiveValue::Set(account_id.to_string()),
            balance_start: ActiveValue::Set(corrected.cents()),
            ..Default::default()
        };
        account_model.update(&self.database).await?;

        self.account_mut(account_id)?.balance_start = corrected;
        Ok(())
    }

    fn account_mut(&mut self, account_id: Uuid) -> ResultEngine<&mut Account> {
        self.accounts
            .get_mut(&account_id)
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))
    }

    async fn require_category(&self, category_id: Uuid) -> ResultEngine<()> {
        categories::Entity::find_by_id(category_id.to_string())
            .one(&self.database)
            .await?
            .map(|_| ())
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))
    }

    fn ensure_movement_currency(
        &self,
        kind: &MovementKind,
        currency: Currency,
    ) -> ResultEngine<()> {
        for account_id in kind.accounts() {
            let account = self.account(account_id)?;
            util::ensure_account_currency(account.currency, currency)?;
        }
        Ok(())
    }

    /// Resolve netted deltas against the in-memory accounts, recording for
    /// each touched account the balance before and after the operation.
    fn preview_updates(&self, updates: &[(Uuid, Money)]) -> ResultEngine<Vec<BalanceFlush>> {
        let mut flushes = Vec::with_capacity(updates.len());
        for (account_id, delta) in updates {
            let account = self.account(*account_id)?;
            flushes.push(BalanceFlush {
                account_id: *account_id,
                balance_previous: account.balance,
                balance: account.balance + *delta,
            });
        }
        Ok(flushes)
    }

    fn apply_balances_to_memory(&mut self, flushes: Vec<BalanceFlush>) -> ResultEngine<()> {
        for flush in flushes {
            let account = self.account_mut(flush.account_id)?;
            account.balance_previous = flush.balance_previous;
            account.balance = flush.balance;
        }
        Ok(())
    }
}

fn account_reference_condition(account_id: Uuid) -> Condition {
    Condition::any()
        .add(movements::Column::AccountIn.eq(account_id.to_string()))
        .add(movements::Column::AccountOut.eq(account_id.to_string()))
}

async fn persist_balances(
    db_tx: &DatabaseTransaction,
    flushes: &[BalanceFlush],
) -> ResultEngine<()> {
    for flush in flushes {
        let account_model = accounts::ActiveModel {
            id: ActiveValue::Set(flush.account_id.to_string()),
            balance_previous: ActiveValue::Set(flush.balance_previous.cents()),
            balance: ActiveValue::Set(flush.balance.cents()),
            ..Default::default()
        };
        account_model.update(db_tx).await?;
    }
    Ok(())
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`, loading every account into memory.
    pub async fn build(self) -> ResultEngine<Engine> {
        let account_models: Vec<accounts::Model> =
            accounts::Entity::find().all(&self.database).await?;

        let mut accounts = HashMap::with_capacity(account_models.len());
        for account_model in account_models {
            let account = Account::try_from(account_model)?;
            accounts.insert(account.id, account);
        }

        Ok(Engine {
            accounts,
            database: self.database,
        })
    }
}
