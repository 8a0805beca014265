//! Reference data and settings administration.

use helpdesk_db::registry::{self, RegistryKind};
use helpdesk_db::setting as setting_store;
use helpdesk_db::validation::{validate_color, validate_name};
use helpdesk_db::{staff, RegistryEntry, StaffUser, ValidationError};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::helpdesk::Helpdesk;
use crate::outcome::{Denial, Outcome};
use crate::permissions;
use crate::principal::Principal;
use crate::Result;

/// Input for a status, priority or category.
#[derive(Debug, Clone, Deserialize)]
pub struct EntryInput {
    pub name: String,
    /// `#rrggbb`; the kind's default colour when absent.
    #[serde(default)]
    pub color: Option<String>,
}

impl Helpdesk {
    /// All rows of one registry, by name.
    pub async fn list_entries(&self, kind: RegistryKind) -> Result<Vec<RegistryEntry>> {
        Ok(registry::list_entries(self.db.pool(), kind).await?)
    }

    /// Validate name and colour, rejecting a name another row already uses.
    async fn checked_entry(
        &self,
        kind: RegistryKind,
        input: &EntryInput,
        current: Option<i64>,
    ) -> Result<(String, String)> {
        let name = input.name.trim();
        validate_name(name)?;

        let color = input
            .color
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(kind.default_color());
        validate_color(color)?;

        if let Some(existing) = registry::find_entry_by_name(self.db.pool(), kind, name).await? {
            if Some(existing.id) != current {
                return Err(ValidationError::Duplicate {
                    field: "name".to_string(),
                    value: name.to_string(),
                }
                .into());
            }
        }

        Ok((name.to_string(), color.to_ascii_lowercase()))
    }

    /// Add a status, priority or category.
    pub async fn create_entry(
        &self,
        principal: &Principal,
        kind: RegistryKind,
        input: EntryInput,
    ) -> Result<Outcome<RegistryEntry>> {
        if !permissions::can_manage(principal) {
            return Ok(Outcome::Denied(Denial::Manage));
        }

        let (name, color) = self.checked_entry(kind, &input, None).await?;
        let id = registry::create_entry(self.db.pool(), kind, &name, &color).await?;
        info!(entity = kind.entity(), id, %name, "Registry entry created");

        Ok(Outcome::Done(registry::get_entry(self.db.pool(), kind, id).await?))
    }

    /// Rename or recolour a status, priority or category.
    pub async fn update_entry(
        &self,
        principal: &Principal,
        kind: RegistryKind,
        id: i64,
        input: EntryInput,
    ) -> Result<Outcome<RegistryEntry>> {
        if !permissions::can_manage(principal) {
            return Ok(Outcome::Denied(Denial::Manage));
        }
        if registry::find_entry(self.db.pool(), kind, id).await?.is_none() {
            return Ok(Outcome::not_found(kind.entity(), id));
        }

        let (name, color) = self.checked_entry(kind, &input, Some(id)).await?;
        registry::update_entry(self.db.pool(), kind, id, &name, &color).await?;
        info!(entity = kind.entity(), id, %name, "Registry entry updated");

        Ok(Outcome::Done(registry::get_entry(self.db.pool(), kind, id).await?))
    }

    /// Remove a status, priority or category. Refused while tickets use it.
    pub async fn delete_entry(
        &self,
        principal: &Principal,
        kind: RegistryKind,
        id: i64,
    ) -> Result<Outcome<()>> {
        if !permissions::can_manage(principal) {
            return Ok(Outcome::Denied(Denial::Manage));
        }
        if registry::find_entry(self.db.pool(), kind, id).await?.is_none() {
            return Ok(Outcome::not_found(kind.entity(), id));
        }

        registry::delete_entry(self.db.pool(), kind, id).await?;
        info!(entity = kind.entity(), id, "Registry entry deleted");
        Ok(Outcome::Done(()))
    }

    /// Replace the agents a category auto-assigns to.
    pub async fn set_category_agents(
        &self,
        principal: &Principal,
        category_id: i64,
        agent_ids: &[i64],
    ) -> Result<Outcome<Vec<StaffUser>>> {
        if !permissions::can_manage(principal) {
            return Ok(Outcome::Denied(Denial::Manage));
        }
        if registry::find_entry(self.db.pool(), RegistryKind::Category, category_id)
            .await?
            .is_none()
        {
            return Ok(Outcome::not_found("Category", category_id));
        }

        for &agent_id in agent_ids {
            match staff::find_staff(self.db.pool(), agent_id).await? {
                Some(user) if user.is_agent => {}
                _ => return Ok(Outcome::not_found("Agent", agent_id)),
            }
        }

        staff::sync_category_agents(self.db.pool(), category_id, agent_ids).await?;
        info!(category_id, agents = ?agent_ids, "Category agents updated");

        Ok(Outcome::Done(
            staff::list_category_agents(self.db.pool(), category_id).await?,
        ))
    }

    /// Read one setting as stored, decoded. Admin only.
    pub async fn read_setting(&self, principal: &Principal, slug: &str) -> Result<Outcome<Value>> {
        if !permissions::can_manage(principal) {
            return Ok(Outcome::Denied(Denial::Manage));
        }
        if setting_store::get_setting(self.db.pool(), slug).await?.is_none() {
            return Ok(Outcome::not_found("Setting", slug));
        }

        Ok(Outcome::Done(self.settings.get(slug, Value::Null).await))
    }

    /// Write one setting. A new slug keeps `value` as its default. Admin only.
    pub async fn write_setting(
        &self,
        principal: &Principal,
        slug: &str,
        value: Value,
    ) -> Result<Outcome<Value>> {
        if !permissions::can_manage(principal) {
            return Ok(Outcome::Denied(Denial::Manage));
        }
        if slug.trim().is_empty() {
            return Err(ValidationError::Empty("slug".to_string()).into());
        }

        let default = match setting_store::get_setting(self.db.pool(), slug).await? {
            Some(row) => Value::String(row.default_value),
            None => value.clone(),
        };
        self.settings.set(slug, &value, &default).await?;
        info!(slug, "Setting written");

        Ok(Outcome::Done(self.settings.get(slug, Value::Null).await))
    }
}
