//! Auto-assignment: pick the category agent with the fewest open tickets.
//!
//! Selection reads counts and writes the assignment in separate statements,
//! so two tickets created at the same moment may land on the same agent.

use helpdesk_db::{staff, ticket, Database};
use tracing::debug;

use crate::Result;

/// Lowest open count wins; ties go to the first candidate.
pub fn pick_least_loaded(candidates: &[(i64, i64)]) -> Option<i64> {
    let mut best: Option<(i64, i64)> = None;
    for &(agent_id, open) in candidates {
        match best {
            Some((_, lowest)) if open >= lowest => {}
            _ => best = Some((agent_id, open)),
        }
    }
    best.map(|(agent_id, _)| agent_id)
}

/// Choose an agent for a ticket in `category_id`.
///
/// Returns `current` when the category has no agents.
pub async fn select_agent(
    db: &Database,
    category_id: i64,
    current: Option<i64>,
) -> Result<Option<i64>> {
    let agents = staff::list_category_agents(db.pool(), category_id).await?;
    if agents.is_empty() {
        debug!(category_id, "No agents for category, keeping current assignment");
        return Ok(current);
    }

    let mut candidates = Vec::with_capacity(agents.len());
    for agent in &agents {
        let open = ticket::count_open_for_agent(db.pool(), agent.id).await?;
        candidates.push((agent.id, open));
    }

    let chosen = pick_least_loaded(&candidates);
    debug!(category_id, ?candidates, ?chosen, "Selected agent");
    Ok(chosen.or(current))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_least_loaded() {
        // A has 2, B has 0, C has 1.
        assert_eq!(pick_least_loaded(&[(1, 2), (2, 0), (3, 1)]), Some(2));
    }

    #[test]
    fn test_ties_go_to_first() {
        assert_eq!(pick_least_loaded(&[(4, 1), (2, 1), (3, 1)]), Some(4));
        assert_eq!(pick_least_loaded(&[(4, 3), (2, 1), (3, 1)]), Some(2));
    }

    #[test]
    fn test_no_candidates() {
        assert_eq!(pick_least_loaded(&[]), None);
    }

    #[tokio::test]
    async fn test_select_agent_without_category_agents_keeps_current() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let category = helpdesk_db::registry::create_entry(
            db.pool(),
            helpdesk_db::RegistryKind::Category,
            "Empty",
            "#000000",
        )
        .await
        .unwrap();

        assert_eq!(select_agent(&db, category, Some(42)).await.unwrap(), Some(42));
        assert_eq!(select_agent(&db, category, None).await.unwrap(), None);
    }
}
