//! SQLite persistence layer for the helpdesk.
//!
//! This crate provides async database operations for tickets, comments,
//! reference data (statuses, priorities, categories), staff, customers,
//! settings and the audit log using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use helpdesk_db::{Database, registry::{self, RegistryKind}};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:helpdesk.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Create a status
//!     registry::create_entry(db.pool(), RegistryKind::Status, "Pending", "#e69900").await?;
//!
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod comment;
pub mod customer;
pub mod error;
pub mod models;
pub mod registry;
pub mod setting;
pub mod staff;
pub mod ticket;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use models::{Audit, Comment, Customer, Party, RegistryEntry, Setting, StaffUser, Ticket};
pub use registry::RegistryKind;
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> helpdesk_db::Result<()> {
    /// // File database
    /// let db = helpdesk_db::Database::connect("sqlite:data/helpdesk.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = helpdesk_db::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check that a connection can be acquired and used.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staff::NewStaffUser;
    use crate::ticket::{NewTicketRow, TicketQuery, Visibility};

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    struct Fixture {
        status: i64,
        priority: i64,
        category: i64,
        customer: i64,
        agent: i64,
    }

    async fn fixture(db: &Database) -> Fixture {
        let pool = db.pool();
        Fixture {
            status: registry::create_entry(pool, RegistryKind::Status, "Open", "#0014f4")
                .await
                .unwrap(),
            priority: registry::create_entry(pool, RegistryKind::Priority, "Low", "#069500")
                .await
                .unwrap(),
            category: registry::create_entry(pool, RegistryKind::Category, "Billing", "#000000")
                .await
                .unwrap(),
            customer: customer::create_customer(pool, "Carol", "carol@example.com")
                .await
                .unwrap(),
            agent: staff::create_staff(
                pool,
                &NewStaffUser {
                    name: "Alice",
                    email: "alice@example.com",
                    is_agent: true,
                    is_admin: false,
                },
            )
            .await
            .unwrap(),
        }
    }

    fn new_ticket(f: &Fixture, requester: Party) -> NewTicketRow<'static> {
        NewTicketRow {
            subject: "Cannot log in",
            content: "The login page spins forever.",
            html: None,
            status_id: f.status,
            priority_id: f.priority,
            category_id: f.category,
            agent_id: None,
            requester,
        }
    }

    #[tokio::test]
    async fn test_ticket_crud() {
        let db = test_db().await;
        let f = fixture(&db).await;
        let pool = db.pool();

        // Create
        let id = ticket::create_ticket(pool, &new_ticket(&f, Party::Customer(f.customer)))
            .await
            .unwrap();

        // Read
        let fetched = ticket::get_ticket(pool, id).await.unwrap();
        assert_eq!(fetched.subject, "Cannot log in");
        assert_eq!(fetched.requester, Party::Customer(f.customer));
        assert!(!fetched.is_complete());

        // Update
        let updated = Ticket {
            agent_id: Some(f.agent),
            subject: "Cannot log in at all".to_string(),
            ..fetched
        };
        ticket::update_ticket(pool, &updated).await.unwrap();
        let fetched = ticket::get_ticket(pool, id).await.unwrap();
        assert_eq!(fetched.agent_id, Some(f.agent));
        assert_eq!(fetched.subject, "Cannot log in at all");

        // Complete / reopen
        ticket::mark_completed(pool, id, None).await.unwrap();
        assert!(ticket::get_ticket(pool, id).await.unwrap().is_complete());
        ticket::mark_reopened(pool, id, None).await.unwrap();
        assert!(!ticket::get_ticket(pool, id).await.unwrap().is_complete());

        // Delete
        ticket::delete_ticket(pool, id).await.unwrap();
        let result = ticket::get_ticket(pool, id).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_requester_must_be_exclusive() {
        let db = test_db().await;
        let f = fixture(&db).await;

        let result = sqlx::query(
            r#"
            INSERT INTO tickets (subject, content, status_id, priority_id, category_id, customer_id, user_id)
            VALUES ('x', 'y', ?, ?, ?, ?, ?)
            "#,
        )
        .bind(f.status)
        .bind(f.priority)
        .bind(f.category)
        .bind(f.customer)
        .bind(f.agent)
        .execute(db.pool())
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_comments_cascade_with_ticket() {
        let db = test_db().await;
        let f = fixture(&db).await;
        let pool = db.pool();

        let id = ticket::create_ticket(pool, &new_ticket(&f, Party::Customer(f.customer)))
            .await
            .unwrap();
        comment::create_comment(pool, id, Party::Staff(f.agent), "Looking into it", None)
            .await
            .unwrap();
        let comment_id =
            comment::create_comment(pool, id, Party::Customer(f.customer), "Thanks!", None)
                .await
                .unwrap();

        let fetched = comment::get_comment(pool, comment_id).await.unwrap();
        assert_eq!(fetched.author, Party::Customer(f.customer));
        assert_eq!(comment::count_comments(pool, id).await.unwrap(), 2);

        ticket::delete_ticket(pool, id).await.unwrap();
        assert_eq!(comment::count_comments(pool, id).await.unwrap(), 0);
        assert!(comment::find_comment(pool, comment_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_audited_writes() {
        let db = test_db().await;
        let f = fixture(&db).await;
        let pool = db.pool();

        let id = ticket::create_ticket_audited(pool, &new_ticket(&f, Party::Customer(f.customer)))
            .await
            .unwrap();
        comment::create_comment_audited(pool, id, Party::Staff(f.agent), "On it", None)
            .await
            .unwrap();

        let audits = audit::list_for_ticket(pool, id).await.unwrap();
        let operations: Vec<&str> = audits.iter().map(|a| a.operation.as_str()).collect();
        assert_eq!(operations, ["created", "commented"]);
        assert_eq!(audits[0].customer_id, Some(f.customer));
        assert_eq!(audits[1].user_id, Some(f.agent));

        // A comment on a missing ticket fails and leaves no audit row behind.
        let result =
            comment::create_comment_audited(pool, 999, Party::Staff(f.agent), "Lost", None).await;
        assert!(result.is_err());
        assert!(audit::list_for_ticket(pool, 999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_registry_delete_is_restricted() {
        let db = test_db().await;
        let f = fixture(&db).await;
        let pool = db.pool();

        ticket::create_ticket(pool, &new_ticket(&f, Party::Staff(f.agent)))
            .await
            .unwrap();

        let result = registry::delete_entry(pool, RegistryKind::Category, f.category).await;
        assert!(matches!(result, Err(DatabaseError::InUse { .. })));

        let unused = registry::create_entry(pool, RegistryKind::Category, "Unused", "#000000")
            .await
            .unwrap();
        registry::delete_entry(pool, RegistryKind::Category, unused)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_open_count_and_visibility() {
        let db = test_db().await;
        let f = fixture(&db).await;
        let pool = db.pool();

        let mut row = new_ticket(&f, Party::Customer(f.customer));
        row.agent_id = Some(f.agent);
        let assigned = ticket::create_ticket(pool, &row).await.unwrap();
        let closed = ticket::create_ticket(pool, &row).await.unwrap();
        ticket::mark_completed(pool, closed, None).await.unwrap();
        ticket::create_ticket(pool, &new_ticket(&f, Party::Customer(f.customer)))
            .await
            .unwrap();

        assert_eq!(ticket::count_open_for_agent(pool, f.agent).await.unwrap(), 1);

        let open_for_agent = TicketQuery {
            visibility: Visibility::Agent(f.agent),
            completed: false,
            limit: 10,
            offset: 0,
        };
        let tickets = ticket::list_tickets(pool, &open_for_agent).await.unwrap();
        assert_eq!(tickets.len(), 2);
        assert!(tickets.iter().any(|t| t.id == assigned));

        let completed = TicketQuery {
            completed: true,
            ..open_for_agent
        };
        assert_eq!(ticket::count_tickets(pool, &completed).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_category_agents() {
        let db = test_db().await;
        let f = fixture(&db).await;
        let pool = db.pool();

        let plain = staff::create_staff(
            pool,
            &NewStaffUser {
                name: "Bob",
                email: "bob@example.com",
                is_agent: false,
                is_admin: false,
            },
        )
        .await
        .unwrap();

        staff::sync_category_agents(pool, f.category, &[f.agent, plain])
            .await
            .unwrap();

        // Only rows flagged as agents are eligible.
        let agents = staff::list_category_agents(pool, f.category).await.unwrap();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].id, f.agent);

        staff::sync_category_agents(pool, f.category, &[]).await.unwrap();
        assert!(staff::list_category_agents(pool, f.category)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_setting_upsert() {
        let db = test_db().await;
        let pool = db.pool();

        assert!(setting::insert_setting_if_absent(pool, "paginate_items", "10", None)
            .await
            .unwrap());
        assert!(!setting::insert_setting_if_absent(pool, "paginate_items", "20", None)
            .await
            .unwrap());

        setting::upsert_setting(pool, "paginate_items", "25", "10")
            .await
            .unwrap();
        let row = setting::get_setting(pool, "paginate_items")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.value, "25");
        assert_eq!(row.default_value, "10");
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = test_db().await;
        let pool = db.pool();

        customer::create_customer(pool, "Carol", "carol@example.com")
            .await
            .unwrap();
        let result = customer::create_customer(pool, "Carol 2", "carol@example.com").await;
        assert!(matches!(result, Err(DatabaseError::AlreadyExists { .. })));
    }
}
