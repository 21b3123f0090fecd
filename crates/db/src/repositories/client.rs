//! Client repository for database operations.
//!
//! All queries are scoped to the owning user; a client belonging to a
//! different account is indistinguishable from a missing one.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{clients, invoices};

/// Error types for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Client not found (or owned by another account).
    #[error("Client not found: {0}")]
    NotFound(Uuid),

    /// Cannot delete a client that still has invoices.
    #[error("Cannot delete client: client has {0} invoices")]
    HasInvoices(u64),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a client.
#[derive(Debug, Clone)]
pub struct CreateClientInput {
    /// Owning user ID.
    pub user_id: Uuid,
    /// Client name.
    pub name: String,
    /// Client email address.
    pub email: String,
    /// Company name.
    pub company: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Postal address.
    pub address: Option<String>,
}

/// Input for updating a client.
#[derive(Debug, Clone, Default)]
pub struct UpdateClientInput {
    /// Client name.
    pub name: Option<String>,
    /// Client email address.
    pub email: Option<String>,
    /// Company name.
    pub company: Option<Option<String>>,
    /// Phone number.
    pub phone: Option<Option<String>>,
    /// Postal address.
    pub address: Option<Option<String>>,
}

/// Client repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    db: DatabaseConnection,
}

impl ClientRepository {
    /// Creates a new client repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, input: CreateClientInput) -> Result<clients::Model, ClientError> {
        let now = chrono::Utc::now().into();
        let client = clients::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            name: Set(input.name),
            email: Set(input.email),
            company: Set(input.company),
            phone: Set(input.phone),
            address: Set(input.address),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(client.insert(&self.db).await?)
    }

    /// Lists all clients for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<clients::Model>, ClientError> {
        let clients = clients::Entity::find()
            .filter(clients::Column::UserId.eq(user_id))
            .order_by_desc(clients::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(clients)
    }

    /// Finds a client by ID, scoped to the owning user.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if no such client exists for this user.
    pub async fn find(&self, user_id: Uuid, id: Uuid) -> Result<clients::Model, ClientError> {
        clients::Entity::find_by_id(id)
            .filter(clients::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(ClientError::NotFound(id))
    }

    /// Updates a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the client does not exist for this user or the
    /// database update fails.
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: UpdateClientInput,
    ) -> Result<clients::Model, ClientError> {
        let client = self.find(user_id, id).await?;

        let now = chrono::Utc::now().into();
        let mut active: clients::ActiveModel = client.into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(email) = input.email {
            active.email = Set(email);
        }
        if let Some(company) = input.company {
            active.company = Set(company);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(phone);
        }
        if let Some(address) = input.address {
            active.address = Set(address);
        }
        active.updated_at = Set(now);

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the client does not exist for this user or still
    /// has invoices attached.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), ClientError> {
        let client = self.find(user_id, id).await?;

        let invoice_count = invoices::Entity::find()
            .filter(invoices::Column::ClientId.eq(id))
            .count(&self.db)
            .await?;

        if invoice_count > 0 {
            return Err(ClientError::HasInvoices(invoice_count));
        }

        client.delete(&self.db).await?;
        Ok(())
    }
}
