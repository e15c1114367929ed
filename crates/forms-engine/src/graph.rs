//! Dependency resolution for derived fields.
//!
//! Every derived field gets an edge to each of its parents. Edge problems
//! (unknown or disallowed parents, clashing aliases) are reported per
//! field, and the rest is ordered with Kahn's algorithm. Ties between
//! independent fields break on `(order, id)` so the output is stable.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use forms_core::field::Field;
use tracing::warn;

use crate::binding::{check_aliases, index_fields};
use crate::error::ResolveError;

/// Which parent references the resolver accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolvePolicy {
    /// Whether a derived field may read another derived field.
    pub allow_derived_parents: bool,
}

impl ResolvePolicy {
    pub fn allowing_chains() -> Self {
        Self {
            allow_derived_parents: true,
        }
    }
}

/// Outcome of resolving a field list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Derived field ids in a safe evaluation order.
    pub order: Vec<String>,
    /// Derived fields that cannot be evaluated, and why.
    pub failures: BTreeMap<String, ResolveError>,
}

impl Resolution {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failure(&self, id: &str) -> Option<&ResolveError> {
        self.failures.get(id)
    }
}

type Key<'a> = (u32, &'a str);

fn key(field: &Field) -> Key<'_> {
    (field.order, field.id.as_str())
}

/// Orders the derived fields of `fields` for evaluation.
pub fn resolve(fields: &[Field], policy: ResolvePolicy) -> Resolution {
    let by_id = index_fields(fields);

    let mut derived: Vec<&Field> = by_id.values().copied().filter(|f| f.is_derived).collect();
    derived.sort_by(|a, b| key(a).cmp(&key(b)));

    let mut failures = BTreeMap::new();
    for field in &derived {
        if let Err(e) = check_edges(field, &by_id, policy) {
            failures.insert(field.id.clone(), e);
        }
    }

    // Derived parents of each schedulable derived field.
    let mut parents: BTreeMap<&str, BTreeSet<&str>> = derived
        .iter()
        .filter(|f| !failures.contains_key(&f.id))
        .map(|f| {
            let ps = f
                .parent_ids()
                .iter()
                .map(String::as_str)
                .filter(|p| by_id.get(p).is_some_and(|pf| pf.is_derived))
                .collect();
            (f.id.as_str(), ps)
        })
        .collect();

    propagate_upstream(&mut parents, &mut failures, &by_id);

    let order = kahn(&parents, &by_id);

    let placed: BTreeSet<&str> = order.iter().map(String::as_str).collect();
    let leftover: BTreeMap<&str, BTreeSet<&str>> = parents
        .iter()
        .filter(|(id, _)| !placed.contains(*id))
        .map(|(id, ps)| (*id, ps.clone()))
        .collect();
    classify_leftover(&leftover, &by_id, &mut failures);

    for (id, err) in &failures {
        warn!(field = %id, kind = err.kind(), "derived field cannot be resolved: {}", err);
    }

    Resolution { order, failures }
}

fn check_edges(
    field: &Field,
    by_id: &BTreeMap<&str, &Field>,
    policy: ResolvePolicy,
) -> Result<(), ResolveError> {
    if field.derived_config.is_none() {
        return Err(ResolveError::MissingDerivedConfig {
            field: field.id.clone(),
        });
    }
    for parent_id in field.parent_ids() {
        let Some(parent) = by_id.get(parent_id.as_str()) else {
            return Err(ResolveError::DanglingReference {
                field: field.id.clone(),
                parent: parent_id.clone(),
            });
        };
        if parent.id == field.id {
            return Err(ResolveError::InvalidParent {
                field: field.id.clone(),
                parent: parent_id.clone(),
                reason: "a field cannot depend on itself".into(),
            });
        }
        if parent.is_derived && !policy.allow_derived_parents {
            return Err(ResolveError::InvalidParent {
                field: field.id.clone(),
                parent: parent_id.clone(),
                reason: "derived fields cannot be parents".into(),
            });
        }
    }
    check_aliases(field, by_id)
}

/// Removes fields whose derived parent already failed, repeating until
/// nothing changes.
fn propagate_upstream<'a>(
    parents: &mut BTreeMap<&'a str, BTreeSet<&'a str>>,
    failures: &mut BTreeMap<String, ResolveError>,
    by_id: &BTreeMap<&str, &Field>,
) {
    loop {
        let mut blocked: Vec<(&str, &str)> = parents
            .iter()
            .filter_map(|(id, ps)| {
                ps.iter()
                    .find(|p| failures.contains_key(**p))
                    .map(|p| (*id, *p))
            })
            .collect();
        if blocked.is_empty() {
            return;
        }
        blocked.sort_by_key(|(id, _)| by_id.get(id).map(|f| key(f)));
        for (id, parent) in blocked {
            parents.remove(id);
            failures.insert(
                id.to_string(),
                ResolveError::UpstreamFailed {
                    field: id.to_string(),
                    parent: parent.to_string(),
                },
            );
        }
    }
}

fn kahn(parents: &BTreeMap<&str, BTreeSet<&str>>, by_id: &BTreeMap<&str, &Field>) -> Vec<String> {
    let mut indegree: BTreeMap<&str, usize> =
        parents.iter().map(|(id, ps)| (*id, ps.len())).collect();
    let mut children: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (id, ps) in parents {
        for p in ps {
            children.entry(*p).or_default().push(*id);
        }
    }

    let mut ready: BTreeSet<Key<'_>> = indegree
        .iter()
        .filter(|(_, d)| **d == 0)
        .filter_map(|(id, _)| by_id.get(id).map(|f| key(f)))
        .collect();

    let mut order = Vec::with_capacity(parents.len());
    while let Some(next) = ready.pop_first() {
        let (_, id) = next;
        order.push(id.to_string());
        for child in children.get(id).into_iter().flatten() {
            if let Some(d) = indegree.get_mut(child) {
                *d -= 1;
                if *d == 0 {
                    if let Some(f) = by_id.get(child) {
                        ready.insert(key(f));
                    }
                }
            }
        }
    }
    order
}

/// Fields Kahn's algorithm could not place are on a cycle or behind one.
fn classify_leftover(
    leftover: &BTreeMap<&str, BTreeSet<&str>>,
    by_id: &BTreeMap<&str, &Field>,
    failures: &mut BTreeMap<String, ResolveError>,
) {
    let reach: BTreeMap<&str, BTreeSet<&str>> = leftover
        .keys()
        .map(|id| (*id, reachable(id, leftover)))
        .collect();

    for (id, from_here) in &reach {
        if from_here.contains(id) {
            let mut cycle: Vec<&str> = from_here
                .iter()
                .copied()
                .filter(|other| reach.get(other).is_some_and(|r| r.contains(id)))
                .collect();
            cycle.sort_by_key(|m| by_id.get(m).map(|f| key(f)));
            failures.insert(
                id.to_string(),
                ResolveError::CyclicDependency {
                    cycle: cycle.into_iter().map(str::to_string).collect(),
                },
            );
        }
    }

    for (id, ps) in leftover {
        if failures.contains_key(*id) {
            continue;
        }
        let parent = ps
            .iter()
            .find(|p| leftover.contains_key(**p))
            .or_else(|| ps.iter().next())
            .copied()
            .unwrap_or_default();
        failures.insert(
            id.to_string(),
            ResolveError::UpstreamFailed {
                field: id.to_string(),
                parent: parent.to_string(),
            },
        );
    }
}

/// Everything reachable from `start` by following parent edges.
fn reachable<'a>(start: &'a str, graph: &BTreeMap<&'a str, BTreeSet<&'a str>>) -> BTreeSet<&'a str> {
    let mut seen = BTreeSet::new();
    let mut queue: VecDeque<&str> = graph.get(start).into_iter().flatten().copied().collect();
    while let Some(n) = queue.pop_front() {
        if seen.insert(n) {
            queue.extend(graph.get(n).into_iter().flatten().copied());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use forms_core::enums::FieldType;
    use forms_core::field::FieldBuilder;
    use pretty_assertions::assert_eq;

    fn input(id: &str, label: &str, order: u32) -> Field {
        FieldBuilder::new(id, label)
            .field_type(FieldType::Number)
            .order(order)
            .build()
    }

    fn derived(id: &str, parents: &[&str], order: u32) -> Field {
        FieldBuilder::new(id, id.to_uppercase())
            .derived(parents.iter().copied(), "0")
            .order(order)
            .build()
    }

    #[test]
    fn independent_fields_order_by_display_position() {
        let fields = vec![
            input("w", "Width", 0),
            derived("b", &["w"], 3),
            derived("a", &["w"], 2),
            derived("c", &["w"], 2),
        ];
        let r = resolve(&fields, ResolvePolicy::default());
        assert_eq!(r.order, vec!["a", "c", "b"]);
        assert!(r.is_clean());
    }

    #[test]
    fn derived_parent_rejected_by_default() {
        let fields = vec![
            input("w", "Width", 0),
            derived("a", &["w"], 1),
            derived("b", &["a"], 2),
        ];
        let r = resolve(&fields, ResolvePolicy::default());
        assert_eq!(r.order, vec!["a"]);
        assert!(matches!(
            r.failure("b"),
            Some(ResolveError::InvalidParent { parent, .. }) if parent == "a"
        ));
    }

    #[test]
    fn chains_follow_dependencies_not_position() {
        let fields = vec![
            input("w", "Width", 0),
            derived("late", &["w"], 9),
            derived("early", &["late"], 1),
        ];
        let r = resolve(&fields, ResolvePolicy::allowing_chains());
        assert_eq!(r.order, vec!["late", "early"]);
    }

    #[test]
    fn cycles_are_reported_for_every_member() {
        let fields = vec![
            input("w", "Width", 0),
            derived("a", &["b"], 1),
            derived("b", &["a"], 2),
            derived("c", &["a"], 3),
            derived("ok", &["w"], 4),
        ];
        let r = resolve(&fields, ResolvePolicy::allowing_chains());
        assert_eq!(r.order, vec!["ok"]);
        let cycle = ResolveError::CyclicDependency {
            cycle: vec!["a".into(), "b".into()],
        };
        assert_eq!(r.failure("a"), Some(&cycle));
        assert_eq!(r.failure("b"), Some(&cycle));
        assert_eq!(
            r.failure("c"),
            Some(&ResolveError::UpstreamFailed {
                field: "c".into(),
                parent: "a".into()
            })
        );
    }

    #[test]
    fn self_reference_is_invalid() {
        let fields = vec![derived("a", &["a"], 0)];
        let r = resolve(&fields, ResolvePolicy::allowing_chains());
        assert!(r.failure("a").is_some_and(ResolveError::is_invalid_parent));
        assert!(r.order.is_empty());
    }

    #[test]
    fn dangling_parent_isolated_to_its_field() {
        let fields = vec![
            input("w", "Width", 0),
            derived("bad", &["ghost"], 1),
            derived("good", &["w"], 2),
        ];
        let r = resolve(&fields, ResolvePolicy::default());
        assert_eq!(r.order, vec!["good"]);
        assert_eq!(
            r.failure("bad"),
            Some(&ResolveError::DanglingReference {
                field: "bad".into(),
                parent: "ghost".into()
            })
        );
        assert!(r.failure("bad").is_some_and(ResolveError::is_invalid_parent));
    }

    #[test]
    fn failures_propagate_down_chains() {
        let fields = vec![
            derived("a", &["ghost"], 0),
            derived("b", &["a"], 1),
            derived("c", &["b"], 2),
        ];
        let r = resolve(&fields, ResolvePolicy::allowing_chains());
        assert!(r.order.is_empty());
        assert_eq!(r.failure("b").map(ResolveError::kind), Some("upstream_failed"));
        assert_eq!(r.failure("c").map(ResolveError::kind), Some("upstream_failed"));
    }

    #[test]
    fn missing_config_is_reported() {
        let mut f = derived("a", &[], 0);
        f.derived_config = None;
        let r = resolve(&[f], ResolvePolicy::default());
        assert_eq!(
            r.failure("a"),
            Some(&ResolveError::MissingDerivedConfig { field: "a".into() })
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let fields = vec![
            input("x", "X", 0),
            derived("d3", &["x"], 1),
            derived("d1", &["x"], 1),
            derived("d2", &["d1", "d3"], 0),
        ];
        let first = resolve(&fields, ResolvePolicy::allowing_chains());
        for _ in 0..5 {
            assert_eq!(resolve(&fields, ResolvePolicy::allowing_chains()), first);
        }
        assert_eq!(first.order, vec!["d1", "d3", "d2"]);
    }
}
