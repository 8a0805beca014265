//! Identity and role resolution.
//!
//! A request may carry a customer session, a staff session, or neither.
//! The two are authenticated separately, so both are consulted and the
//! result folded into one [`Principal`].

use async_trait::async_trait;
use helpdesk_db::{staff, Database, Party, StaffUser};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{HelpdeskError, Result};

/// A staff role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Agent,
    Admin,
}

impl Role {
    fn bit(self) -> u8 {
        match self {
            Role::Agent => 0b01,
            Role::Admin => 0b10,
        }
    }
}

/// The roles a staff identity holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const EMPTY: Self = Self(0);

    pub fn with(self, role: Role) -> Self {
        Self(self.0 | role.bit())
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Roles carried by a staff row.
    pub fn from_flags(is_agent: bool, is_admin: bool) -> Self {
        let mut roles = Self::EMPTY;
        if is_agent {
            roles = roles.with(Role::Agent);
        }
        if is_admin {
            roles = roles.with(Role::Admin);
        }
        roles
    }
}

impl Serialize for RoleSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let roles: Vec<Role> = [Role::Agent, Role::Admin]
            .into_iter()
            .filter(|r| self.contains(*r))
            .collect();
        roles.serialize(serializer)
    }
}

/// A signed-in staff user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffIdentity {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub roles: RoleSet,
}

impl From<StaffUser> for StaffIdentity {
    fn from(user: StaffUser) -> Self {
        Self {
            id: user.id,
            roles: RoleSet::from_flags(user.is_agent, user.is_admin),
            name: user.name,
            email: user.email,
        }
    }
}

/// Who is making a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Principal {
    Anonymous,
    Customer { id: i64 },
    Staff(StaffIdentity),
}

/// Coarse classification of a principal. Admin dominates Agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    Anonymous,
    Customer,
    Staff,
    Agent,
    Admin,
}

impl Principal {
    pub fn customer(id: i64) -> Self {
        Principal::Customer { id }
    }

    pub fn kind(&self) -> PrincipalKind {
        match self {
            Principal::Anonymous => PrincipalKind::Anonymous,
            Principal::Customer { .. } => PrincipalKind::Customer,
            Principal::Staff(staff) if staff.roles.contains(Role::Admin) => PrincipalKind::Admin,
            Principal::Staff(staff) if staff.roles.contains(Role::Agent) => PrincipalKind::Agent,
            Principal::Staff(_) => PrincipalKind::Staff,
        }
    }

    /// The identity row this principal maps to, if any.
    pub fn party(&self) -> Option<Party> {
        match self {
            Principal::Anonymous => None,
            Principal::Customer { id } => Some(Party::Customer(*id)),
            Principal::Staff(staff) => Some(Party::Staff(staff.id)),
        }
    }

    pub fn staff(&self) -> Option<&StaffIdentity> {
        match self {
            Principal::Staff(staff) => Some(staff),
            _ => None,
        }
    }

    /// Staff id, if a staff user is signed in.
    pub fn staff_id(&self) -> Option<i64> {
        self.staff().map(|s| s.id)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.staff().is_some_and(|s| s.roles.contains(role))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    pub fn is_agent(&self) -> bool {
        self.has_role(Role::Agent)
    }
}

/// One authentication context.
#[async_trait]
pub trait PrincipalSource: Send + Sync {
    /// Whether a session is active in this context.
    async fn check(&self) -> bool;

    /// The authenticated identity id, if any.
    async fn current_user(&self) -> Option<i64>;
}

/// A context whose session, if any, is already known.
#[async_trait]
impl PrincipalSource for Option<i64> {
    async fn check(&self) -> bool {
        self.is_some()
    }

    async fn current_user(&self) -> Option<i64> {
        *self
    }
}

/// Fold the customer and staff contexts into one principal.
///
/// Both active is an error. A staff id with no matching row resolves to
/// [`Principal::Anonymous`].
pub async fn resolve_principal(
    db: &Database,
    customer: &dyn PrincipalSource,
    staff_source: &dyn PrincipalSource,
) -> Result<Principal> {
    let customer_id = if customer.check().await {
        customer.current_user().await
    } else {
        None
    };
    let staff_id = if staff_source.check().await {
        staff_source.current_user().await
    } else {
        None
    };

    match (customer_id, staff_id) {
        (Some(_), Some(_)) => {
            warn!(?customer_id, ?staff_id, "Both customer and staff sessions are active");
            Err(HelpdeskError::AmbiguousPrincipal)
        }
        (Some(id), None) => Ok(Principal::customer(id)),
        (None, Some(id)) => match staff::find_staff(db.pool(), id).await? {
            Some(user) => {
                let identity = StaffIdentity::from(user);
                debug!(staff_id = id, roles = ?identity.roles, "Resolved staff principal");
                Ok(Principal::Staff(identity))
            }
            None => {
                warn!(staff_id = id, "Staff session refers to a missing user");
                Ok(Principal::Anonymous)
            }
        },
        (None, None) => Ok(Principal::Anonymous),
    }
}
