//! Settings table access.

use sqlx::SqlitePool;

use crate::models::Setting;
use crate::Result;

/// Get a setting row by slug.
pub async fn get_setting(pool: &SqlitePool, slug: &str) -> Result<Option<Setting>> {
    let setting = sqlx::query_as::<_, Setting>(
        r#"
        SELECT id, slug, value, "default" AS default_value, lang, created_at, updated_at
        FROM settings
        WHERE slug = ?
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(setting)
}

/// Create or update a setting.
pub async fn upsert_setting(pool: &SqlitePool, slug: &str, value: &str, default: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (slug, value, "default")
        VALUES (?, ?, ?)
        ON CONFLICT(slug) DO UPDATE SET
            value = excluded.value,
            "default" = excluded."default",
            updated_at = datetime('now')
        "#,
    )
    .bind(slug)
    .bind(value)
    .bind(default)
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert a setting unless the slug already exists.
///
/// Returns `true` when a row was written.
pub async fn insert_setting_if_absent(
    pool: &SqlitePool,
    slug: &str,
    value: &str,
    lang: Option<&str>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO settings (slug, value, "default", lang)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(slug) DO NOTHING
        "#,
    )
    .bind(slug)
    .bind(value)
    .bind(value)
    .bind(lang)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

