//! # Contact Repository
//!
//! Database operations for customers and suppliers.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::store::SyncStore;
use stockbook_core::{Contact, ContactType};

/// Repository for contact database operations.
#[derive(Debug, Clone)]
pub struct ContactRepository {
    pool: SqlitePool,
}

impl ContactRepository {
    /// Creates a new ContactRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ContactRepository { pool }
    }

    /// Creates a contact with a fresh UUID and server timestamps.
    pub async fn create(
        &self,
        user_id: &str,
        name: &str,
        contact_type: ContactType,
        phone_number: Option<String>,
        address: Option<String>,
    ) -> DbResult<Contact> {
        let now = Utc::now();
        let contact = Contact {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.trim().to_string(),
            contact_type,
            phone_number,
            address,
            created_at: now,
            updated_at: now,
        };
        contact.insert(&self.pool).await?;

        debug!(id = %contact.id, name = %contact.name, "Contact created");
        Ok(contact)
    }

    /// Fetches a contact by ID, scoped to its owner.
    pub async fn get_by_id(&self, id: &str, user_id: &str) -> DbResult<Contact> {
        Contact::fetch(&self.pool, id, user_id)
            .await?
            .ok_or_else(|| DbError::not_found("Contact", id))
    }

    /// Lists every contact for an account.
    pub async fn list(&self, user_id: &str) -> DbResult<Vec<Contact>> {
        Contact::list_for_user(&self.pool, user_id).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_create_and_fetch_contact() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.contacts();

        let contact = repo
            .create("u1", "Ali Traders", ContactType::Supplier, None, None)
            .await
            .unwrap();

        let fetched = repo.get_by_id(&contact.id, "u1").await.unwrap();
        assert_eq!(fetched.contact_type, ContactType::Supplier);

        assert!(repo.get_by_id(&contact.id, "u2").await.is_err());
    }
}
