//! The table access object.
//!
//! A [`Table`] owns one normalized [`TableSpec`] and an executor, and is
//! the only thing callers touch: it reconciles the live table to the spec
//! (`create`/`sync`) and exposes the CRUD facade built on the predicate
//! compiler and the executor boundary. The spec is normalized in the
//! constructor and never mutated afterwards.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::assemble::{build_query, limit_clause, Limit, Target};
use crate::error::{Error, Result};
use crate::executor::{Execute, Introspect, Outcome, Statement};
use crate::filter::Filter;
use crate::predicate::{order_clause, where_clause, OrderBy};
use crate::sanitize::{placeholders, quote};
use crate::spec::TableSpec;
use crate::sync::{ddl, plan, PlanOptions, SyncOp};
use crate::validate::validate;
use crate::value::{Record, Value};

/// Format used for stamped timestamps.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What a completed synchronization pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// DDL intents applied, in order. Empty when the table was already
    /// reconciled.
    pub applied: Vec<SyncOp>,
}

/// Access object for one table.
#[derive(Debug)]
pub struct Table<E> {
    executor: E,
    spec: TableSpec,
    options: PlanOptions,
}

impl<E> Table<E> {
    /// Builds the access object, normalizing the spec (injecting `id`,
    /// `date_created`, `date_modified` when absent).
    #[must_use]
    pub fn new(executor: E, mut spec: TableSpec) -> Self {
        spec.normalize();
        Self {
            executor,
            spec,
            options: PlanOptions::default(),
        }
    }

    /// Overrides the planning options.
    #[must_use]
    pub fn with_options(mut self, options: PlanOptions) -> Self {
        self.options = options;
        self
    }

    /// The normalized spec.
    #[must_use]
    pub fn spec(&self) -> &TableSpec {
        &self.spec
    }

    /// The underlying executor.
    #[must_use]
    pub fn executor(&self) -> &E {
        &self.executor
    }

    fn base_select(&self) -> String {
        format!("SELECT * FROM {}", self.spec.qualified_name())
    }

    fn require_field(&self, field: &str) -> Result<()> {
        if self.spec.has_field(field) {
            Ok(())
        } else {
            Err(Error::UnknownField(field.to_string()))
        }
    }
}

impl<E: Execute> Table<E> {
    async fn run(&self, statement: Statement) -> Result<Outcome> {
        debug!(table = %self.spec.table, sql = %statement.sql, "executing");
        self.executor
            .execute(&statement)
            .await
            .map_err(|source| Error::Execution {
                statement: statement.sql,
                source,
            })
    }

    /// Issues `CREATE TABLE IF NOT EXISTS` for the spec. Idempotent.
    pub async fn create(&self) -> Result<()> {
        info!(table = %self.spec.table, "ensuring table exists");
        self.run(ddl::create_table(&self.spec)).await?;
        Ok(())
    }

    // ---- CRUD facade -------------------------------------------------

    /// Selects rows by id or validated filter, with ordering and
    /// pagination. `order` defaults to `date_created` descending.
    pub async fn select(
        &self,
        target: impl Into<Target>,
        order: Option<OrderBy>,
        limit: Option<Limit>,
    ) -> Result<Vec<Record>> {
        let order = order.unwrap_or_else(default_order);
        let statement = build_query(
            &self.base_select(),
            target.into(),
            Some(&order),
            limit.as_ref(),
            &self.spec,
        );
        Ok(self.run(statement).await?.rows)
    }

    /// Alias for [`Table::select`].
    pub async fn find(
        &self,
        target: impl Into<Target>,
        order: Option<OrderBy>,
        limit: Option<Limit>,
    ) -> Result<Vec<Record>> {
        self.select(target, order, limit).await
    }

    /// Fetches one row by id.
    pub async fn select_one(&self, id: u64) -> Result<Option<Record>> {
        let statement = build_query(&self.base_select(), Target::Id(id), None, None, &self.spec);
        Ok(self.run(statement).await?.rows.into_iter().next())
    }

    /// Inserts a record.
    pub async fn insert(&self, record: Record) -> Result<Outcome> {
        if record.is_empty() {
            return Err(Error::EmptyRecord);
        }
        let (columns, params): (Vec<String>, Vec<Value>) = record
            .into_iter()
            .map(|(column, value)| (quote(&column), value))
            .unzip();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.spec.qualified_name(),
            columns.join(", "),
            placeholders(params.len())
        );
        self.run(Statement::with_params(sql, params)).await
    }

    /// Updates rows matching the target with the given values.
    ///
    /// A filter target that validates down to nothing is refused rather
    /// than updating every row.
    pub async fn update(&self, target: impl Into<Target>, values: Record) -> Result<Outcome> {
        if values.is_empty() {
            return Err(Error::EmptyUpdate);
        }
        let mut params = Vec::new();
        let assignments: Vec<String> = values
            .into_iter()
            .map(|(column, value)| {
                params.push(value);
                format!("{} = ?", quote(&column))
            })
            .collect();

        let (where_sql, where_params) = self.mutation_target(target.into())?;
        params.extend(where_params);

        let sql = format!(
            "UPDATE {} SET {} {where_sql}",
            self.spec.qualified_name(),
            assignments.join(", ")
        );
        self.run(Statement::with_params(sql, params)).await
    }

    /// Deletes rows matching the target; refuses an empty filter.
    pub async fn delete(&self, target: impl Into<Target>) -> Result<Outcome> {
        let (where_sql, params) = self.mutation_target(target.into())?;
        let sql = format!("DELETE FROM {} {where_sql}", self.spec.qualified_name());
        self.run(Statement::with_params(sql, params)).await
    }

    fn mutation_target(&self, target: Target) -> Result<(String, Vec<Value>)> {
        match target {
            Target::Id(id) => Ok((String::from("WHERE `id` = ?"), vec![Value::Uint(id)])),
            Target::Where(filter) => {
                let validated = validate(filter, &self.spec);
                if validated.is_empty() {
                    return Err(Error::EmptyFilter);
                }
                Ok(where_clause(&validated))
            }
        }
    }

    /// Counts rows matching the validated filter.
    pub async fn count(&self, filter: Filter) -> Result<u64> {
        let validated = validate(filter, &self.spec);
        let (where_sql, params) = where_clause(&validated);
        let mut sql = format!("SELECT COUNT(*) AS count FROM {}", self.spec.qualified_name());
        if !where_sql.is_empty() {
            sql.push(' ');
            sql.push_str(&where_sql);
        }
        let outcome = self.run(Statement::with_params(sql, params)).await?;
        Ok(outcome
            .rows
            .first()
            .and_then(|row| row.get("count"))
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }

    /// Per-value counts for one column, most frequent first.
    pub async fn count_by(&self, field: &str, limit: Option<Limit>) -> Result<Vec<Record>> {
        self.require_field(field)?;
        let column = quote(field);
        let mut sql = format!(
            "SELECT {column}, COUNT({column}) AS count FROM {} GROUP BY {column} \
             ORDER BY `count` DESC",
            self.spec.qualified_name()
        );
        let limit_sql = limit_clause(limit.as_ref());
        if !limit_sql.is_empty() {
            sql.push(' ');
            sql.push_str(&limit_sql);
        }
        Ok(self.run(Statement::new(sql)).await?.rows)
    }

    /// Sums one column over the validated filter. `None` when the table
    /// has no matching rows.
    pub async fn sum(&self, field: &str, filter: Filter) -> Result<Option<f64>> {
        self.require_field(field)?;
        let validated = validate(filter, &self.spec);
        let (where_sql, params) = where_clause(&validated);
        let mut sql = format!(
            "SELECT SUM({}) AS sum FROM {}",
            quote(field),
            self.spec.qualified_name()
        );
        if !where_sql.is_empty() {
            sql.push(' ');
            sql.push_str(&where_sql);
        }
        let outcome = self.run(Statement::with_params(sql, params)).await?;
        Ok(outcome.rows.first().and_then(|row| match row.get("sum") {
            Some(Value::Text(s)) => s.parse().ok(),
            Some(value) => value.as_f64(),
            None => None,
        }))
    }

    /// Distinct values of the given columns, optionally grouped.
    pub async fn distinct(
        &self,
        fields: &[&str],
        filter: Filter,
        order: Option<OrderBy>,
        group: &[&str],
        limit: Option<Limit>,
    ) -> Result<Vec<Record>> {
        for field in fields.iter().chain(group) {
            self.require_field(field)?;
        }
        let columns: Vec<String> = fields.iter().map(|f| quote(f)).collect();
        let validated = validate(filter, &self.spec);
        let (where_sql, params) = where_clause(&validated);
        let order = order.unwrap_or_else(default_order);

        let mut sql = format!(
            "SELECT DISTINCT {} FROM {}",
            columns.join(", "),
            self.spec.qualified_name()
        );
        let group_sql = if group.is_empty() {
            String::new()
        } else {
            let grouped: Vec<String> = group.iter().map(|g| quote(g)).collect();
            format!("GROUP BY {}", grouped.join(", "))
        };
        for clause in [
            where_sql,
            group_sql,
            order_clause(Some(&order)),
            limit_clause(limit.as_ref()),
        ] {
            if !clause.is_empty() {
                sql.push(' ');
                sql.push_str(&clause);
            }
        }
        Ok(self.run(Statement::with_params(sql, params)).await?.rows)
    }

    /// Empties the table.
    pub async fn truncate(&self) -> Result<Outcome> {
        self.run(Statement::new(format!(
            "TRUNCATE TABLE {}",
            self.spec.qualified_name()
        )))
        .await
    }

    /// Drops the table.
    pub async fn drop_table(&self) -> Result<Outcome> {
        self.run(Statement::new(format!(
            "DROP TABLE {}",
            self.spec.qualified_name()
        )))
        .await
    }

    /// Upserts by identity: inserts when no row carries the record's id
    /// (or the id is absent/zero), updates otherwise.
    ///
    /// Stamps `date_modified` when the caller did not, and mirrors it
    /// into `date_created` on insert. Undeclared keys are dropped.
    pub async fn save(&self, mut record: Record) -> Result<Outcome> {
        let id = record
            .remove("id")
            .and_then(|v| v.as_u64())
            .filter(|&id| id != 0);

        record
            .entry(String::from("date_modified"))
            .or_insert_with(|| Value::Text(Utc::now().format(TIMESTAMP_FORMAT).to_string()));
        let modified = record
            .get("date_modified")
            .cloned()
            .unwrap_or(Value::Null);

        record.retain(|column, _| {
            let keep = self.spec.has_field(column);
            if !keep {
                debug!(table = %self.spec.table, column = %column, "dropping undeclared save column");
            }
            keep
        });

        match id {
            Some(id) => {
                if self.select_one(id).await?.is_some() {
                    self.update(Target::Id(id), record).await
                } else {
                    record.insert(String::from("id"), Value::Uint(id));
                    record.insert(String::from("date_created"), modified);
                    self.insert(record).await
                }
            }
            None => {
                record.insert(String::from("date_created"), modified);
                self.insert(record).await
            }
        }
    }
}

impl<E: Execute + Introspect> Table<E> {
    /// Reconciles the live table to the spec, then applies seed rows.
    ///
    /// A failed pass aborts the remaining plan and is retried exactly once
    /// after re-introspection, so a DDL statement lost to a concurrent
    /// writer's race does not fail the synchronization outright. The
    /// second failure propagates.
    pub async fn sync(&self) -> Result<SyncReport> {
        let report = match self.sync_pass().await {
            Ok(report) => report,
            Err(Error::SchemaSync { op, source }) => {
                warn!(
                    table = %self.spec.table,
                    op = %op,
                    error = %source,
                    "sync pass failed, re-introspecting once"
                );
                self.sync_pass().await?
            }
            Err(other) => return Err(other),
        };
        self.apply_seeds().await?;
        Ok(report)
    }

    async fn sync_pass(&self) -> Result<SyncReport> {
        let columns = self
            .executor
            .columns(&self.spec.database, &self.spec.table)
            .await
            .map_err(|source| Error::Introspection {
                table: self.spec.table.clone(),
                source,
            })?;
        let engine = self
            .executor
            .engine(&self.spec.database, &self.spec.table)
            .await
            .map_err(|source| Error::Introspection {
                table: self.spec.table.clone(),
                source,
            })?;

        let plan = plan(&self.spec, &columns, engine.as_deref(), self.options)?;
        if plan.is_empty() {
            debug!(table = %self.spec.table, "schema already reconciled");
            return Ok(SyncReport::default());
        }

        info!(table = %self.spec.table, ops = plan.len(), "applying sync plan");
        let mut applied = Vec::new();
        for op in plan.ops {
            let statement = ddl::alter_statement(&self.spec, &op);
            debug!(sql = %statement.sql, "executing DDL");
            if let Err(source) = self.executor.execute(&statement).await {
                return Err(Error::SchemaSync { op, source });
            }
            applied.push(op);
        }
        Ok(SyncReport { applied })
    }

    async fn apply_seeds(&self) -> Result<()> {
        for record in self.spec.seed.clone() {
            self.save(record).await?;
        }
        Ok(())
    }
}

fn default_order() -> OrderBy {
    OrderBy::desc("date_created")
}
