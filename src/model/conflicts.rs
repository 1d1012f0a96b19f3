use std::collections::HashMap;

use super::placement::RenderedItem;
use super::schedule::Conflict;

/// Conflict reasons grouped by schedule id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConflictIndex {
    reasons: HashMap<i64, Vec<String>>,
}

impl ConflictIndex {
    pub fn new(conflicts: &[Conflict]) -> Self {
        let mut reasons: HashMap<i64, Vec<String>> = HashMap::new();
        for conflict in conflicts {
            let entry = reasons.entry(conflict.schedule_id).or_default();
            if !entry.contains(&conflict.reason) {
                entry.push(conflict.reason.clone());
            }
        }
        Self { reasons }
    }

    pub fn contains(&self, schedule_id: i64) -> bool {
        self.reasons.contains_key(&schedule_id)
    }

    /// Tooltip text for a conflicted item.
    pub fn tooltip(&self, schedule_id: i64) -> Option<String> {
        self.reasons
            .get(&schedule_id)
            .map(|reasons| format!("Conflict: {}", reasons.join("; ")))
    }

    pub fn len(&self) -> usize {
        self.reasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }
}

/// Flag the items that appear in `conflicts`, clearing all others.
pub fn highlight_conflicts(items: &mut [RenderedItem], conflicts: &[Conflict]) {
    let index = ConflictIndex::new(conflicts);
    for item in items.iter_mut() {
        item.conflict = index.tooltip(item.schedule_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::placement::ItemPlacement;

    fn item(id: i64) -> RenderedItem {
        RenderedItem {
            schedule_id: id,
            row: 0,
            placement: ItemPlacement {
                position: 0.0,
                width: 20.0,
            },
            conflict: None,
        }
    }

    fn conflict(id: i64, reason: &str) -> Conflict {
        Conflict {
            schedule_id: id,
            reason: reason.to_string(),
        }
    }

    #[test]
    fn flags_matching_items_with_reason() {
        let mut items = vec![item(1), item(2), item(3)];
        highlight_conflicts(&mut items, &[conflict(2, "Overlaps SCH/00003")]);

        assert_eq!(items[0].conflict, None);
        assert_eq!(items[1].conflict.as_deref(), Some("Conflict: Overlaps SCH/00003"));
        assert_eq!(items[2].conflict, None);
    }

    #[test]
    fn is_idempotent_and_joins_reasons() {
        let conflicts = vec![
            conflict(1, "Overlap"),
            conflict(1, "Operator unavailable"),
            conflict(1, "Overlap"),
        ];
        let mut items = vec![item(1)];
        highlight_conflicts(&mut items, &conflicts);
        let first = items.clone();
        highlight_conflicts(&mut items, &conflicts);

        assert_eq!(items, first);
        assert_eq!(
            items[0].conflict.as_deref(),
            Some("Conflict: Overlap; Operator unavailable")
        );
    }

    #[test]
    fn stale_flags_are_cleared() {
        let mut items = vec![item(1), item(2)];
        highlight_conflicts(&mut items, &[conflict(1, "Overlap")]);
        highlight_conflicts(&mut items, &[]);
        assert!(items.iter().all(|i| i.conflict.is_none()));
    }

    #[test]
    fn index_counts_distinct_schedules() {
        let index = ConflictIndex::new(&[conflict(1, "a"), conflict(1, "b"), conflict(4, "c")]);
        assert_eq!(index.len(), 2);
        assert!(index.contains(4));
        assert!(!index.contains(2));
    }
}
