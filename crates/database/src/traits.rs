//! PostgreSQL schema traits.
//!
//! Traits for table metadata and derived reference data.
use tokio_postgres::Client;

/// Schema metadata for PostgreSQL tables.
///
/// All methods return `&'static str` so statements can be assembled at
/// compile time via `const_format::concatcp!`.
///
/// # Design
///
/// This trait contains no I/O operations—it purely describes table structure.
/// [`Schema::prepare`] is the one place the statements are executed.
#[allow(async_fn_in_trait)]
pub trait Schema {
    /// Returns the table name in the database.
    fn name() -> &'static str;
    /// Returns `CREATE TABLE IF NOT EXISTS` DDL statement.
    fn creates() -> &'static str;
    /// Returns `CREATE INDEX IF NOT EXISTS` statements for all indices.
    fn indices() -> &'static str;
    /// Creates the table and its indices. Idempotent.
    async fn prepare(client: &Client) -> Result<(), tokio_postgres::Error> {
        log::info!("preparing table ({})", Self::name());
        client.batch_execute(Self::creates()).await?;
        match Self::indices() {
            "" => Ok(()),
            indices => client.batch_execute(indices).await,
        }
    }
}

/// Derived table generation from enumerable domain values.
///
/// For tables whose contents can be exhaustively enumerated at compile time
/// (e.g. roles), this trait generates INSERT statements programmatically.
///
/// # Usage
///
/// Implement [`exhaust`](Derive::exhaust) to enumerate all valid values,
/// and [`inserts`](Derive::inserts) to format each as an INSERT statement.
/// The [`derives`](Derive::derives) method combines these into a single
/// SQL batch.
#[allow(async_fn_in_trait)]
pub trait Derive: Sized + Schema {
    /// Enumerates all values that should be inserted into the table.
    fn exhaust() -> Vec<Self>;
    /// Formats this value as an INSERT statement.
    fn inserts(&self) -> String;
    /// Generates a batch of INSERT statements for all enumerated values.
    fn derives() -> String {
        Self::exhaust()
            .iter()
            .map(Self::inserts)
            .collect::<Vec<_>>()
            .join(";\n")
    }
    /// Writes the derived rows. Inserts must tolerate re-runs.
    async fn derive(client: &Client) -> Result<(), tokio_postgres::Error> {
        log::info!("deriving table ({})", Self::name());
        client.batch_execute(&Self::derives()).await
    }
}
