//! Per-action access predicates.
//!
//! Every check is a pure function of the principal, the record and, for
//! close/reopen, the configured permission map.

use helpdesk_db::{Comment, Party, Ticket};

use crate::config::RolePermissions;
use crate::principal::Principal;

/// Whether the principal opened the ticket.
pub fn is_requester(principal: &Principal, ticket: &Ticket) -> bool {
    principal.party() == Some(ticket.requester)
}

/// Whether the principal is the ticket's assigned agent.
pub fn is_assigned_agent(principal: &Principal, ticket: &Ticket) -> bool {
    principal.is_agent() && ticket.agent_id.is_some() && principal.staff_id() == ticket.agent_id
}

pub fn is_administrator(principal: &Principal) -> bool {
    principal.is_admin()
}

pub fn is_agent(principal: &Principal) -> bool {
    principal.is_agent()
}

/// Admins see everything, agents see unassigned tickets and their own
/// assignments, everyone sees tickets they opened.
pub fn can_view(principal: &Principal, ticket: &Ticket) -> bool {
    if principal.is_admin() || is_requester(principal, ticket) {
        return true;
    }

    principal.is_agent() && (ticket.agent_id.is_none() || principal.staff_id() == ticket.agent_id)
}

/// Admins, the assigned agent and the requester may comment.
pub fn can_comment(principal: &Principal, ticket: &Ticket) -> bool {
    principal.is_admin() || is_assigned_agent(principal, ticket) || is_requester(principal, ticket)
}

/// Admins, or an agent editing their own comment.
pub fn can_edit_comment(principal: &Principal, comment: &Comment) -> bool {
    principal.is_admin()
        || (principal.is_agent() && principal.staff_id().map(Party::Staff) == Some(comment.author))
}

pub fn can_delete_comment(principal: &Principal, _comment: &Comment) -> bool {
    principal.is_admin()
}

fn allowed_by(principal: &Principal, ticket: &Ticket, perms: &RolePermissions) -> bool {
    (perms.admin && principal.is_admin())
        || (perms.agent && is_assigned_agent(principal, ticket))
        || (perms.owner && is_requester(principal, ticket))
}

/// Close check against the `close_ticket_perm` map.
pub fn can_close(principal: &Principal, ticket: &Ticket, perms: &RolePermissions) -> bool {
    allowed_by(principal, ticket, perms)
}

/// Reopen check against the `reopen_ticket_perm` map.
pub fn can_reopen(principal: &Principal, ticket: &Ticket, perms: &RolePermissions) -> bool {
    allowed_by(principal, ticket, perms)
}

/// Agents and admins may edit ticket fields.
pub fn can_update(principal: &Principal) -> bool {
    principal.is_agent() || principal.is_admin()
}

pub fn can_delete(principal: &Principal) -> bool {
    principal.is_admin()
}

/// Reference data and settings are admin-only.
pub fn can_manage(principal: &Principal) -> bool {
    principal.is_admin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::{RoleSet, StaffIdentity};

    fn staff(id: i64, is_agent: bool, is_admin: bool) -> Principal {
        Principal::Staff(StaffIdentity {
            id,
            name: format!("staff-{id}"),
            email: format!("staff-{id}@example.com"),
            roles: RoleSet::from_flags(is_agent, is_admin),
        })
    }

    fn ticket(agent_id: Option<i64>, requester: Party) -> Ticket {
        Ticket {
            id: 1,
            subject: "Printer".to_string(),
            content: "Out of toner again".to_string(),
            html: None,
            status_id: 1,
            priority_id: 1,
            category_id: 1,
            agent_id,
            requester,
            completed_at: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn comment(author: Party) -> Comment {
        Comment {
            id: 1,
            ticket_id: 1,
            content: "Any update?".to_string(),
            html: None,
            author,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_can_view() {
        let assigned = ticket(Some(5), Party::Customer(7));
        let unassigned = ticket(None, Party::Customer(7));

        // Agent sees own and unassigned, not a colleague's.
        assert!(can_view(&staff(5, true, false), &assigned));
        assert!(can_view(&staff(6, true, false), &unassigned));
        assert!(!can_view(&staff(6, true, false), &assigned));

        assert!(can_view(&staff(9, false, true), &assigned));

        assert!(can_view(&Principal::customer(7), &assigned));
        assert!(!can_view(&Principal::customer(8), &assigned));
        assert!(!can_view(&Principal::Anonymous, &unassigned));

        // Plain staff only see tickets they opened.
        let own = ticket(Some(5), Party::Staff(11));
        assert!(can_view(&staff(11, false, false), &own));
        assert!(!can_view(&staff(11, false, false), &unassigned));
    }

    #[test]
    fn test_can_comment() {
        let t = ticket(Some(5), Party::Customer(7));

        assert!(can_comment(&staff(5, true, false), &t));
        assert!(!can_comment(&staff(6, true, false), &t));
        assert!(can_comment(&staff(9, false, true), &t));
        assert!(can_comment(&Principal::customer(7), &t));
        assert!(!can_comment(&Principal::customer(8), &t));
        assert!(!can_comment(&Principal::Anonymous, &t));

        // Unassigned ticket: viewing is allowed for agents, commenting is not.
        let unassigned = ticket(None, Party::Customer(7));
        assert!(can_view(&staff(5, true, false), &unassigned));
        assert!(!can_comment(&staff(5, true, false), &unassigned));
    }

    #[test]
    fn test_comment_edit_and_delete() {
        let by_agent = comment(Party::Staff(5));

        assert!(can_edit_comment(&staff(5, true, false), &by_agent));
        assert!(!can_edit_comment(&staff(6, true, false), &by_agent));
        assert!(can_edit_comment(&staff(9, false, true), &by_agent));
        assert!(!can_edit_comment(&Principal::customer(5), &by_agent));

        assert!(can_delete_comment(&staff(9, false, true), &by_agent));
        assert!(!can_delete_comment(&staff(5, true, false), &by_agent));
    }

    #[test]
    fn test_close_follows_permission_map() {
        let t = ticket(Some(5), Party::Customer(7));
        let agent_and_admin = RolePermissions {
            owner: false,
            agent: true,
            admin: true,
        };

        assert!(!can_close(&Principal::customer(7), &t, &agent_and_admin));
        assert!(can_close(&staff(5, true, false), &t, &agent_and_admin));
        assert!(can_close(&staff(9, false, true), &t, &agent_and_admin));
        assert!(!can_close(&staff(6, true, false), &t, &agent_and_admin));

        assert!(can_reopen(&Principal::customer(7), &t, &RolePermissions::ALL));
        assert!(!can_reopen(&Principal::Anonymous, &t, &RolePermissions::ALL));
    }

    #[test]
    fn test_admin_passes_everything_when_flag_set() {
        let admin = staff(9, false, true);
        let t = ticket(Some(5), Party::Customer(7));

        assert!(can_view(&admin, &t));
        assert!(can_comment(&admin, &t));
        assert!(can_update(&admin));
        assert!(can_delete(&admin));
        assert!(can_manage(&admin));
        assert!(can_close(&admin, &t, &RolePermissions::ALL));
    }

    #[test]
    fn test_role_guards() {
        assert!(can_update(&staff(5, true, false)));
        assert!(!can_update(&staff(5, false, false)));
        assert!(!can_update(&Principal::customer(5)));
        assert!(!can_delete(&staff(5, true, false)));
        assert!(is_agent(&staff(5, true, false)));
        assert!(!is_administrator(&staff(5, true, false)));
    }
}
