//! Settings store: cache-through reads over the `settings` table.
//!
//! Reads never fail. A missing row, an unreadable stored value or a store
//! outage yields the caller's default and a warning in the log.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use helpdesk_db::setting as setting_store;
use helpdesk_db::{Database, Setting};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::cache::{SettingsCache, DEFAULT_TTL};
use crate::config::{as_flag, as_int, as_optional_id, HelpdeskConfig, RolePermissions};
use crate::serialized::{self, DecodeError};
use crate::Result;

/// Resolves translation keys for settings that carry one.
pub trait Translator: Send + Sync {
    /// Translate `key`, or `None` when no translation exists.
    fn translate(&self, key: &str) -> Option<String>;
}

/// A fixed key → text table.
#[derive(Debug, Clone, Default)]
pub struct StaticTranslations {
    entries: HashMap<String, String>,
}

impl StaticTranslations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a translation.
    pub fn with(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.entries.insert(key.into(), text.into());
        self
    }
}

impl Translator for StaticTranslations {
    fn translate(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

/// Slugs of the recognised settings.
pub mod slugs {
    pub const DEFAULT_STATUS_ID: &str = "default_status_id";
    pub const DEFAULT_CLOSE_STATUS_ID: &str = "default_close_status_id";
    pub const DEFAULT_REOPEN_STATUS_ID: &str = "default_reopen_status_id";
    pub const CLOSE_TICKET_PERM: &str = "close_ticket_perm";
    pub const REOPEN_TICKET_PERM: &str = "reopen_ticket_perm";
    pub const QUEUE_EMAILS: &str = "queue_emails";
    pub const STATUS_NOTIFICATION: &str = "status_notification";
    pub const COMMENT_NOTIFICATION: &str = "comment_notification";
    pub const ASSIGNED_NOTIFICATION: &str = "assigned_notification";
    pub const PAGINATE_ITEMS: &str = "paginate_items";
    pub const LENGTH_MENU: &str = "length_menu";
    pub const ADMIN_IDS: &str = "admin_ids";
    pub const EMAIL_OWNER_NEW_TICKET: &str = "email.owner_new_ticket";
}

/// One seeded setting.
#[derive(Debug, Clone)]
pub struct SettingDefault {
    pub slug: &'static str,
    pub value: Value,
    /// Translation key that replaces the value on read.
    pub lang: Option<&'static str>,
}

/// The defaults table seeded at install time.
pub fn defaults() -> Vec<SettingDefault> {
    let all_roles = RolePermissions::ALL.to_value();
    let plain = |slug, value| SettingDefault {
        slug,
        value,
        lang: None,
    };
    vec![
        plain(slugs::DEFAULT_STATUS_ID, json!(1)),
        plain(slugs::DEFAULT_CLOSE_STATUS_ID, json!(0)),
        plain(slugs::DEFAULT_REOPEN_STATUS_ID, json!(0)),
        plain(slugs::CLOSE_TICKET_PERM, all_roles.clone()),
        plain(slugs::REOPEN_TICKET_PERM, all_roles),
        plain(slugs::QUEUE_EMAILS, json!(0)),
        plain(slugs::STATUS_NOTIFICATION, json!(1)),
        plain(slugs::COMMENT_NOTIFICATION, json!(1)),
        plain(slugs::ASSIGNED_NOTIFICATION, json!(1)),
        plain(slugs::PAGINATE_ITEMS, json!(10)),
        plain(slugs::LENGTH_MENU, json!([[10, 50, 100], [10, 50, 100]])),
        plain(slugs::ADMIN_IDS, json!([1])),
        SettingDefault {
            slug: slugs::EMAIL_OWNER_NEW_TICKET,
            value: json!("Your ticket has been received"),
            lang: Some("lang.email.owner_new_ticket"),
        },
    ]
}

/// Text form of a value as written to the `settings` table.
///
/// Strings are stored raw; everything else in the serialized encoding.
pub fn encode_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serialized::serialize(other),
    }
}

/// Key-value configuration with cache-through reads.
pub struct Settings {
    db: Database,
    cache: SettingsCache,
    ttl: Duration,
    translator: Arc<dyn Translator>,
}

impl Settings {
    /// Create a store with the default TTL and no translations.
    pub fn new(db: Database) -> Self {
        Self {
            db,
            cache: SettingsCache::new(),
            ttl: DEFAULT_TTL,
            translator: Arc::new(StaticTranslations::new()),
        }
    }

    /// Builder method to set the translator.
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    /// Builder method to set the cache TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Read a setting, falling back to `default`.
    pub async fn get(&self, slug: &str, default: Value) -> Value {
        let loaded = self
            .cache
            .remember(slug, self.ttl, || self.load(slug))
            .await;
        loaded.unwrap_or(default)
    }

    async fn load(&self, slug: &str) -> Option<Value> {
        let row = match setting_store::get_setting(self.db.pool(), slug).await {
            Ok(Some(row)) => row,
            Ok(None) => {
                warn!(slug, "Setting not found, using default");
                return None;
            }
            Err(err) => {
                warn!(slug, error = %err, "Failed to load setting, using default");
                return None;
            }
        };

        match self.decode(&row) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(slug, error = %err, "Failed to decode setting, using default");
                None
            }
        }
    }

    fn decode(&self, row: &Setting) -> std::result::Result<Value, DecodeError> {
        if let Some(key) = row.lang.as_deref() {
            return match self.translator.translate(key) {
                Some(text) => Ok(Value::String(text)),
                None => {
                    warn!(slug = %row.slug, key, "Missing translation for setting");
                    Ok(Value::String(row.value.clone()))
                }
            };
        }

        if serialized::is_serialized(&row.value) {
            return serialized::unserialize(&row.value);
        }

        Ok(Value::String(row.value.clone()))
    }

    /// Create or update a setting and drop its cached value.
    pub async fn set(&self, slug: &str, value: &Value, default: &Value) -> Result<()> {
        setting_store::upsert_setting(
            self.db.pool(),
            slug,
            &encode_value(value),
            &encode_value(default),
        )
        .await?;

        self.cache.forget(slug).await;
        debug!(slug, "Setting updated");
        Ok(())
    }

    /// Drop every cached value.
    pub async fn flush(&self) {
        self.cache.flush().await;
    }

    /// Insert the defaults table, with `overrides` taking precedence, for
    /// every slug not yet present. Returns how many rows were written.
    pub async fn seed_defaults(&self, overrides: &HashMap<String, Value>) -> Result<usize> {
        let mut written = 0;

        for default in defaults() {
            let value = overrides.get(default.slug).unwrap_or(&default.value);
            if setting_store::insert_setting_if_absent(
                self.db.pool(),
                default.slug,
                &encode_value(value),
                default.lang,
            )
            .await?
            {
                written += 1;
            }
        }

        self.cache.flush().await;
        info!(written, "Seeded default settings");
        Ok(written)
    }

    /// Resolve the workflow configuration.
    pub async fn config(&self) -> HelpdeskConfig {
        let fallback = HelpdeskConfig::default();

        let int = |value: Value, default: i64| as_int(&value).unwrap_or(default);
        let flag = |value: Value, default: bool| as_flag(&value).unwrap_or(default);

        HelpdeskConfig {
            default_status_id: int(
                self.get(slugs::DEFAULT_STATUS_ID, json!(fallback.default_status_id))
                    .await,
                fallback.default_status_id,
            ),
            default_close_status_id: as_optional_id(
                &self.get(slugs::DEFAULT_CLOSE_STATUS_ID, json!(0)).await,
            ),
            default_reopen_status_id: as_optional_id(
                &self.get(slugs::DEFAULT_REOPEN_STATUS_ID, json!(0)).await,
            ),
            close_ticket_perm: RolePermissions::from_value(
                &self
                    .get(slugs::CLOSE_TICKET_PERM, fallback.close_ticket_perm.to_value())
                    .await,
            ),
            reopen_ticket_perm: RolePermissions::from_value(
                &self
                    .get(slugs::REOPEN_TICKET_PERM, fallback.reopen_ticket_perm.to_value())
                    .await,
            ),
            queue_emails: flag(
                self.get(slugs::QUEUE_EMAILS, json!(fallback.queue_emails)).await,
                fallback.queue_emails,
            ),
            status_notification: flag(
                self.get(slugs::STATUS_NOTIFICATION, json!(fallback.status_notification))
                    .await,
                fallback.status_notification,
            ),
            comment_notification: flag(
                self.get(slugs::COMMENT_NOTIFICATION, json!(fallback.comment_notification))
                    .await,
                fallback.comment_notification,
            ),
            assigned_notification: flag(
                self.get(slugs::ASSIGNED_NOTIFICATION, json!(fallback.assigned_notification))
                    .await,
                fallback.assigned_notification,
            ),
            paginate_items: int(
                self.get(slugs::PAGINATE_ITEMS, json!(fallback.paginate_items))
                    .await,
                fallback.paginate_items,
            )
            .max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_missing_setting_returns_default() {
        let settings = Settings::new(test_db().await);
        assert_eq!(settings.get("nope", json!("fallback")).await, json!("fallback"));
    }

    #[tokio::test]
    async fn test_plain_and_serialized_values() {
        let db = test_db().await;
        let pool = db.pool();
        setting_store::upsert_setting(pool, "admin_route", "tickets-admin", "tickets-admin")
            .await
            .unwrap();
        setting_store::upsert_setting(
            pool,
            "close_ticket_perm",
            r#"a:3:{s:5:"owner";s:2:"no";s:5:"agent";s:3:"yes";s:5:"admin";s:3:"yes";}"#,
            "",
        )
        .await
        .unwrap();

        let settings = Settings::new(db);
        assert_eq!(
            settings.get("admin_route", Value::Null).await,
            json!("tickets-admin")
        );
        assert_eq!(
            settings.get("close_ticket_perm", Value::Null).await,
            json!({ "owner": "no", "agent": "yes", "admin": "yes" })
        );
    }

    #[tokio::test]
    async fn test_corrupt_serialized_value_returns_default() {
        let db = test_db().await;
        setting_store::upsert_setting(db.pool(), "broken", r#"s:99:"short";"#, "")
            .await
            .unwrap();

        let settings = Settings::new(db);
        assert_eq!(settings.get("broken", json!(7)).await, json!(7));
    }

    #[tokio::test]
    async fn test_deeply_nested_value_returns_default() {
        let db = test_db().await;
        let settings = Settings::new(db);

        let depth = 20_000;
        let nested = format!("{}N;{}", "a:1:{i:0;".repeat(depth), "}".repeat(depth));
        settings.set("nested", &json!(nested), &json!("")).await.unwrap();

        assert_eq!(settings.get("nested", json!("fallback")).await, json!("fallback"));
    }

    #[tokio::test]
    async fn test_lang_key_uses_translation() {
        let db = test_db().await;
        setting_store::insert_setting_if_absent(
            db.pool(),
            "email.footer",
            "stored footer",
            Some("lang.email.footer"),
        )
        .await
        .unwrap();

        let translations = StaticTranslations::new().with("lang.email.footer", "Translated footer");
        let settings = Settings::new(db).with_translator(Arc::new(translations));
        assert_eq!(
            settings.get("email.footer", Value::Null).await,
            json!("Translated footer")
        );
    }

    #[tokio::test]
    async fn test_set_invalidates_cache() {
        let db = test_db().await;
        let settings = Settings::new(db.clone());

        settings.set("paginate_items", &json!("10"), &json!("10")).await.unwrap();
        assert_eq!(settings.get("paginate_items", Value::Null).await, json!("10"));

        // A write behind the store's back is not seen until the entry expires...
        setting_store::upsert_setting(db.pool(), "paginate_items", "99", "10")
            .await
            .unwrap();
        assert_eq!(settings.get("paginate_items", Value::Null).await, json!("10"));

        // ...but a write through the store is seen immediately.
        settings.set("paginate_items", &json!(25), &json!("10")).await.unwrap();
        assert_eq!(settings.get("paginate_items", Value::Null).await, json!(25));
    }

    #[tokio::test]
    async fn test_zero_ttl_reads_through() {
        let db = test_db().await;
        let settings = Settings::new(db.clone()).with_ttl(Duration::ZERO);

        settings.set("length_menu", &json!("10"), &json!("10")).await.unwrap();
        assert_eq!(settings.get("length_menu", Value::Null).await, json!("10"));

        setting_store::upsert_setting(db.pool(), "length_menu", "25", "10")
            .await
            .unwrap();
        assert_eq!(settings.get("length_menu", Value::Null).await, json!("25"));
    }

    #[tokio::test]
    async fn test_seed_defaults_respects_existing_and_overrides() {
        let db = test_db().await;
        setting_store::upsert_setting(db.pool(), "paginate_items", "50", "10")
            .await
            .unwrap();

        let settings = Settings::new(db);
        let overrides = HashMap::from([("queue_emails".to_string(), json!("yes"))]);

        let written = settings.seed_defaults(&overrides).await.unwrap();
        assert_eq!(written, defaults().len() - 1);

        // Second run writes nothing.
        assert_eq!(settings.seed_defaults(&overrides).await.unwrap(), 0);

        let config = settings.config().await;
        assert_eq!(config.paginate_items, 50);
        assert!(config.queue_emails);
        assert_eq!(config.close_ticket_perm, RolePermissions::ALL);
        assert_eq!(config.default_close_status_id, None);
    }

    #[tokio::test]
    async fn test_config_without_rows_uses_defaults() {
        let settings = Settings::new(test_db().await);
        assert_eq!(settings.config().await, HelpdeskConfig::default());
    }
}
