//! # Customer Repository
//!
//! Customers are global; nothing here is shop-scoped. Balances live in the
//! sale log, see [`crate::SaleRepository::totals`].

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use khata_core::Customer;

pub struct CustomerRepository;

impl CustomerRepository {
    pub async fn insert(conn: &mut SqliteConnection, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, phone, credit_limit_paise, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(customer.credit_limit_paise)
        .bind(customer.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(customer)
    }

    /// Sets or clears (`None` = unlimited) a customer's credit limit.
    /// Returns false if the customer doesn't exist.
    pub async fn set_credit_limit(
        conn: &mut SqliteConnection,
        id: &str,
        limit_paise: Option<i64>,
    ) -> DbResult<bool> {
        let result = sqlx::query("UPDATE customers SET credit_limit_paise = ? WHERE id = ?")
            .bind(limit_paise)
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
