use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::model::{Activity, Edge};

/// Upper bound on the configurable per-activity relaxation budget.
pub const MAX_ITERATIONS_PER_ACTIVITY: usize = 1_000;

/// Column index per activity id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Levels {
    pub by_id: HashMap<i64, usize>,
    /// Work was still queued when the relaxation budget ran out, so the
    /// levels are an approximation (cyclic input).
    pub capped: bool,
}

impl Levels {
    pub fn level(&self, id: i64) -> usize {
        self.by_id.get(&id).copied().unwrap_or(0)
    }
}

/// Longest-path layering by repeated relaxation from the sources.
///
/// Seeds are the start activities, or every activity without incoming
/// edges when none is flagged. A level only ever increases, and a raised
/// node is queued again. The loop stops after `iterations_per_activity`
/// pops per activity (at most [`MAX_ITERATIONS_PER_ACTIVITY`]), which
/// bounds cyclic graphs.
pub fn assign_levels(activities: &[Activity], edges: &[Edge], iterations_per_activity: usize) -> Levels {
    let mut outgoing: HashMap<i64, Vec<i64>> = HashMap::new();
    let mut incoming_count: HashMap<i64, usize> = HashMap::new();
    for edge in edges {
        outgoing
            .entry(edge.from_activity_id)
            .or_default()
            .push(edge.to_activity_id);
        *incoming_count.entry(edge.to_activity_id).or_default() += 1;
    }

    let mut level: HashMap<i64, usize> = HashMap::new();
    let mut queue: VecDeque<i64> = VecDeque::new();

    let has_start = activities.iter().any(|a| a.is_start_activity);
    for activity in activities {
        let seed = if has_start {
            activity.is_start_activity
        } else {
            incoming_count.get(&activity.id).copied().unwrap_or(0) == 0
        };
        if seed {
            level.insert(activity.id, 0);
            queue.push_back(activity.id);
        }
    }

    let per_activity = iterations_per_activity.min(MAX_ITERATIONS_PER_ACTIVITY);
    let max_iterations = activities.len().saturating_mul(per_activity);
    let mut iterations = 0;
    while iterations < max_iterations {
        let Some(u) = queue.pop_front() else {
            break;
        };
        iterations += 1;
        let next = level.get(&u).copied().unwrap_or(0) + 1;
        let Some(targets) = outgoing.get(&u) else {
            continue;
        };
        for &v in targets {
            let raise = level.get(&v).is_none_or(|&lv| lv < next);
            if raise {
                level.insert(v, next);
                queue.push_back(v);
            }
        }
    }
    let capped = !queue.is_empty();
    if capped {
        tracing::debug!(
            iterations,
            pending = queue.len(),
            "level relaxation hit its iteration budget"
        );
    }

    let by_id = activities
        .iter()
        .map(|a| (a.id, level.get(&a.id).copied().unwrap_or(0)))
        .collect();
    Levels { by_id, capped }
}

/// Buckets activities by level, each column sorted by id.
pub fn group_columns<'a>(activities: &'a [Activity], levels: &Levels) -> BTreeMap<usize, Vec<&'a Activity>> {
    let mut columns: BTreeMap<usize, Vec<&Activity>> = BTreeMap::new();
    for activity in activities {
        columns
            .entry(levels.level(activity.id))
            .or_default()
            .push(activity);
    }
    for column in columns.values_mut() {
        column.sort_by_key(|a| a.id);
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> (Vec<Activity>, Vec<Edge>) {
        let activities = vec![
            Activity::new(1, "Start").start(),
            Activity::new(2, "Mid"),
            Activity::new(3, "End").end(),
        ];
        let edges = vec![Edge::new(1, 1, 2), Edge::new(2, 2, 3)];
        (activities, edges)
    }

    #[test]
    fn linear_chain_gets_consecutive_levels() {
        let (activities, edges) = chain();
        let levels = assign_levels(&activities, &edges, 5);
        assert_eq!(levels.level(1), 0);
        assert_eq!(levels.level(2), 1);
        assert_eq!(levels.level(3), 2);
        assert!(!levels.capped);
    }

    #[test]
    fn level_is_longest_path_from_seed() {
        // 1 -> 2 -> 3 and a shortcut 1 -> 3
        let activities = vec![
            Activity::new(1, "a").start(),
            Activity::new(2, "b"),
            Activity::new(3, "c"),
        ];
        let edges = vec![Edge::new(1, 1, 3), Edge::new(2, 1, 2), Edge::new(3, 2, 3)];
        let levels = assign_levels(&activities, &edges, 5);
        assert_eq!(levels.level(3), 2);
        for edge in &edges {
            assert!(levels.level(edge.to_activity_id) > levels.level(edge.from_activity_id));
        }
    }

    #[test]
    fn falls_back_to_sources_without_start_flag() {
        let activities = vec![Activity::new(5, "x"), Activity::new(6, "y"), Activity::new(7, "z")];
        let edges = vec![Edge::new(1, 5, 6)];
        let levels = assign_levels(&activities, &edges, 5);
        assert_eq!(levels.level(5), 0);
        assert_eq!(levels.level(6), 1);
        // orphan is a source too
        assert_eq!(levels.level(7), 0);
    }

    #[test]
    fn unreached_activity_defaults_to_level_zero() {
        // With a start flag present, nothing else seeds the walk.
        let activities = vec![
            Activity::new(1, "s").start(),
            Activity::new(2, "island"),
            Activity::new(3, "after island"),
        ];
        let edges = vec![Edge::new(1, 2, 3)];
        let levels = assign_levels(&activities, &edges, 5);
        assert_eq!(levels.level(2), 0);
        assert_eq!(levels.level(3), 0);
    }

    #[test]
    fn cycle_terminates_within_budget() {
        let activities = vec![Activity::new(1, "a").start(), Activity::new(2, "b")];
        let edges = vec![Edge::new(1, 1, 2), Edge::new(2, 2, 1)];
        let levels = assign_levels(&activities, &edges, 5);
        assert!(levels.capped);
        assert_eq!(levels.by_id.len(), 2);
        // ten relaxations alternate between the two nodes
        assert!(levels.level(1) >= 1);
        assert!(levels.level(2) >= 1);
    }

    #[test]
    fn oversized_budget_is_clamped_on_cycles() {
        let activities = vec![Activity::new(1, "a").start(), Activity::new(2, "b")];
        let edges = vec![Edge::new(1, 1, 2), Edge::new(2, 2, 1)];
        let levels = assign_levels(&activities, &edges, usize::MAX);
        assert!(levels.capped);
        // each pop raises the other node, so the last one raised sits at the budget
        let budget = 2 * MAX_ITERATIONS_PER_ACTIVITY;
        assert_eq!(levels.level(1).max(levels.level(2)), budget);
        assert_eq!(levels.level(1).min(levels.level(2)), budget - 1);
    }

    #[test]
    fn self_loop_terminates() {
        let activities = vec![Activity::new(1, "loop").start()];
        let edges = vec![Edge::new(1, 1, 1)];
        let levels = assign_levels(&activities, &edges, 5);
        assert!(levels.capped);
        assert_eq!(levels.level(1), 5);
    }

    #[test]
    fn edges_to_unknown_activities_are_harmless() {
        let activities = vec![Activity::new(1, "a").start()];
        let edges = vec![Edge::new(1, 1, 99), Edge::new(2, 98, 1)];
        let levels = assign_levels(&activities, &edges, 5);
        assert_eq!(levels.by_id.len(), 1);
        assert_eq!(levels.level(1), 0);
    }

    #[test]
    fn columns_are_sorted_by_id() {
        let activities = vec![
            Activity::new(1, "s").start(),
            Activity::new(9, "late"),
            Activity::new(4, "early"),
        ];
        let edges = vec![Edge::new(1, 1, 9), Edge::new(2, 1, 4)];
        let levels = assign_levels(&activities, &edges, 5);
        let columns = group_columns(&activities, &levels);
        let ids: Vec<i64> = columns[&1].iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![4, 9]);
    }

    #[test]
    fn empty_input_is_empty() {
        let levels = assign_levels(&[], &[], 5);
        assert!(levels.by_id.is_empty());
        assert!(!levels.capped);
    }
}
