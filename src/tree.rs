//! Nested tree reconstruction from a flat department list.

use std::collections::HashMap;

use crate::models::{Department, DepartmentNode};

/// Build the forest of `root_id`'s children out of a flat descendant list.
///
/// Nodes are held in one arena and linked through a parent -> slot index built
/// in a single pass; children keep the order in which they appear in `flat`.
/// The input must be acyclic. Entries not reachable from `root_id` are dropped.
pub fn build_children(flat: Vec<Department>, root_id: i32) -> Vec<DepartmentNode> {
    if flat.is_empty() {
        return Vec::new();
    }

    let mut index: HashMap<i32, Vec<usize>> = HashMap::new();
    for (slot, dept) in flat.iter().enumerate() {
        if let Some(parent_id) = dept.parent_id {
            index.entry(parent_id).or_default().push(slot);
        }
    }

    let mut arena: Vec<Option<Department>> = flat.into_iter().map(Some).collect();
    attach(root_id, &index, &mut arena)
}

fn attach(parent_id: i32, index: &HashMap<i32, Vec<usize>>, arena: &mut [Option<Department>]) -> Vec<DepartmentNode> {
    let Some(slots) = index.get(&parent_id) else {
        return Vec::new();
    };

    let mut nodes = Vec::with_capacity(slots.len());
    for &slot in slots {
        // A slot is taken at most once on acyclic input.
        let Some(dept) = arena[slot].take() else {
            continue;
        };
        let children = attach(dept.id, index, arena);
        nodes.push(DepartmentNode {
            department: dept,
            children,
            employees: None,
        });
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn dept(id: i32, parent_id: Option<i32>) -> Department {
        Department {
            id,
            name: format!("D{id}"),
            parent_id,
            created_at: Utc::now(),
        }
    }

    fn ids(nodes: &[DepartmentNode]) -> Vec<i32> {
        nodes.iter().map(|n| n.department.id).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(build_children(Vec::new(), 1).is_empty());
    }

    #[test]
    fn test_nested_forest() {
        // 1 -> {2, 3}, 2 -> {4, 6}, 3 -> {5}
        let flat = vec![
            dept(2, Some(1)),
            dept(3, Some(1)),
            dept(4, Some(2)),
            dept(5, Some(3)),
            dept(6, Some(2)),
        ];

        let forest = build_children(flat, 1);
        assert_eq!(ids(&forest), vec![2, 3]);
        assert_eq!(ids(&forest[0].children), vec![4, 6]);
        assert_eq!(ids(&forest[1].children), vec![5]);
        assert!(forest[0].children[0].children.is_empty());
        assert_eq!(forest.iter().map(DepartmentNode::subtree_len).sum::<usize>(), 5);
    }

    #[test]
    fn test_child_order_follows_input() {
        let flat = vec![dept(9, Some(1)), dept(3, Some(1)), dept(5, Some(1))];
        assert_eq!(ids(&build_children(flat, 1)), vec![9, 3, 5]);
    }

    #[test]
    fn test_unreachable_entries_dropped() {
        let flat = vec![dept(2, Some(1)), dept(7, Some(42)), dept(8, None)];
        let forest = build_children(flat, 1);
        assert_eq!(ids(&forest), vec![2]);
        assert!(forest[0].children.is_empty());
    }

    #[test]
    fn test_root_without_children() {
        let flat = vec![dept(2, Some(3))];
        assert!(build_children(flat, 1).is_empty());
    }
}
