use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::billing::{BillingError, Customer, CustomerRepository};

#[derive(Debug, FromRow)]
struct CustomerRow {
  id: Uuid,
  tenant_id: Uuid,
  name: String,
  email: Option<String>,
  phone: Option<String>,
}

impl From<CustomerRow> for Customer {
  fn from(row: CustomerRow) -> Self {
    Customer {
      id: row.id,
      tenant_id: row.tenant_id,
      name: row.name,
      email: row.email,
      phone: row.phone,
    }
  }
}

pub struct PostgresCustomerRepository {
  pool: PgPool,
}

impl PostgresCustomerRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl CustomerRepository for PostgresCustomerRepository {
  async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Customer>, BillingError> {
    let row = sqlx::query_as::<_, CustomerRow>(
      r#"
            SELECT id, tenant_id, name, email, phone
            FROM customers
            WHERE tenant_id = $1 AND id = $2
            "#,
    )
    .bind(tenant_id)
    .bind(id)
    .fetch_optional(&self.pool)
    .await?;

    Ok(row.map(Customer::from))
  }
}
