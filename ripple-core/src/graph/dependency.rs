//! Dependency Graph
//!
//! Stores the edges discovered while rules run. Both directions are kept:
//! `dependents` drives notification (who must re-run when a key changes) and
//! `dependencies` lets a rule's incoming edges be replaced in one step.
//!
//! Separately from the edges, the graph remembers what each rule read during
//! its latest evaluation. Edges may go stale under [`EdgePolicy::Accumulate`];
//! the latest reads never do, so cycle checks walk those instead.
//!
//! Edge order is insertion order. Notification visits dependents in the order
//! their edges were first discovered.

use indexmap::{IndexMap, IndexSet};

use super::RuleKey;
use crate::config::EdgePolicy;

/// Directed graph of `upstream -> dependent` edges between rule keys.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// For each key, the rules that read it.
    dependents: IndexMap<RuleKey, IndexSet<RuleKey>>,

    /// For each key, the rules it read.
    dependencies: IndexMap<RuleKey, IndexSet<RuleKey>>,

    /// For each rule, the keys read by its latest successful evaluation.
    latest: IndexMap<RuleKey, IndexSet<RuleKey>>,
}

impl DependencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edge: `dependent` read `upstream`.
    ///
    /// Returns `true` if the edge was not already present.
    pub fn add_edge(&mut self, upstream: &RuleKey, dependent: &RuleKey) -> bool {
        let added = self
            .dependents
            .entry(upstream.clone())
            .or_default()
            .insert(dependent.clone());
        self.dependencies
            .entry(dependent.clone())
            .or_default()
            .insert(upstream.clone());
        added
    }

    /// Remove an edge. Returns `true` if it existed.
    pub fn remove_edge(&mut self, upstream: &RuleKey, dependent: &RuleKey) -> bool {
        let removed = self
            .dependents
            .get_mut(upstream)
            .map(|set| set.shift_remove(dependent))
            .unwrap_or(false);
        if let Some(set) = self.dependencies.get_mut(dependent) {
            set.shift_remove(upstream);
        }
        removed
    }

    /// Remember the keys `dependent` read during its latest evaluation.
    ///
    /// No edges change until [`record`](Self::record) is called.
    pub fn set_reads(&mut self, dependent: &RuleKey, reads: &[RuleKey]) {
        self.latest
            .insert(dependent.clone(), reads.iter().cloned().collect());
    }

    /// Turn the latest reads of `dependent` into edges.
    ///
    /// Under [`EdgePolicy::Refresh`], edges from keys that were not read this
    /// time are dropped first. Returns the number of new edges.
    pub fn record(&mut self, dependent: &RuleKey, policy: EdgePolicy) -> usize {
        let reads: Vec<RuleKey> = self
            .latest
            .get(dependent)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();

        if policy == EdgePolicy::Refresh {
            let stale: Vec<RuleKey> = self
                .dependencies
                .get(dependent)
                .map(|deps| deps.iter().filter(|d| !reads.contains(d)).cloned().collect())
                .unwrap_or_default();

            for upstream in &stale {
                self.remove_edge(upstream, dependent);
                tracing::trace!(rule = %dependent, upstream = %upstream, "dropped stale edge");
            }
        }

        reads
            .iter()
            .filter(|upstream| self.add_edge(upstream, dependent))
            .count()
    }

    /// The keys read by the latest evaluation of `key`.
    pub fn latest_reads_of(&self, key: &str) -> Vec<RuleKey> {
        self.latest
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Find a cycle through `key` among the latest reads.
    ///
    /// The path is in propagation order and starts and ends with `key`: each
    /// step is read by the next one.
    pub fn cycle_through(&self, key: &str) -> Option<Vec<RuleKey>> {
        let (start, _) = self.latest.get_key_value(key)?;
        let mut path = vec![start.clone()];
        let mut visited = IndexSet::new();

        if self.walk_reads(start, start, &mut path, &mut visited) {
            path.reverse();
            Some(path)
        } else {
            None
        }
    }

    /// Depth-first search upstream from `node` for `target`.
    fn walk_reads(
        &self,
        node: &RuleKey,
        target: &RuleKey,
        path: &mut Vec<RuleKey>,
        visited: &mut IndexSet<RuleKey>,
    ) -> bool {
        let Some(reads) = self.latest.get(node) else {
            return false;
        };

        for upstream in reads {
            if upstream == target {
                path.push(upstream.clone());
                return true;
            }
            if visited.insert(upstream.clone()) {
                path.push(upstream.clone());
                if self.walk_reads(upstream, target, path, visited) {
                    return true;
                }
                path.pop();
            }
        }
        false
    }

    /// The rules that read `key`, in edge discovery order.
    pub fn dependents_of(&self, key: &str) -> Vec<RuleKey> {
        self.dependents
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The rules `key` read, in edge discovery order.
    pub fn dependencies_of(&self, key: &str) -> Vec<RuleKey> {
        self.dependencies
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Check whether `dependent` is recorded as reading `upstream`.
    pub fn has_edge(&self, upstream: &str, dependent: &str) -> bool {
        self.dependents
            .get(upstream)
            .map(|set| set.contains(dependent))
            .unwrap_or(false)
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.dependents.values().map(IndexSet::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> RuleKey {
        RuleKey::from(name)
    }

    #[test]
    fn add_and_remove_edges() {
        let mut graph = DependencyGraph::new();
        let a = key("a");
        let sum = key("sum");

        assert!(graph.add_edge(&a, &sum));
        assert!(!graph.add_edge(&a, &sum));

        assert!(graph.has_edge("a", "sum"));
        assert_eq!(graph.dependents_of("a"), vec![sum.clone()]);
        assert_eq!(graph.dependencies_of("sum"), vec![a.clone()]);
        assert_eq!(graph.edge_count(), 1);

        assert!(graph.remove_edge(&a, &sum));
        assert!(!graph.has_edge("a", "sum"));
        assert!(graph.dependencies_of("sum").is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn dependents_keep_discovery_order() {
        let mut graph = DependencyGraph::new();
        let a = key("a");

        graph.add_edge(&a, &key("z"));
        graph.add_edge(&a, &key("m"));
        graph.add_edge(&a, &key("b"));

        assert_eq!(graph.dependents_of("a"), vec![key("z"), key("m"), key("b")]);
    }

    #[test]
    fn accumulate_never_drops_edges() {
        let mut graph = DependencyGraph::new();
        let pick = key("pick");

        graph.set_reads(&pick, &[key("flag"), key("x")]);
        assert_eq!(graph.record(&pick, EdgePolicy::Accumulate), 2);
        graph.set_reads(&pick, &[key("flag"), key("y")]);
        assert_eq!(graph.record(&pick, EdgePolicy::Accumulate), 1);

        assert!(graph.has_edge("x", "pick"));
        assert!(graph.has_edge("y", "pick"));
        assert_eq!(graph.dependencies_of("pick").len(), 3);
        assert_eq!(graph.latest_reads_of("pick"), vec![key("flag"), key("y")]);
    }

    #[test]
    fn refresh_replaces_incoming_edges() {
        let mut graph = DependencyGraph::new();
        let pick = key("pick");

        graph.set_reads(&pick, &[key("flag"), key("x")]);
        graph.record(&pick, EdgePolicy::Refresh);
        graph.set_reads(&pick, &[key("flag"), key("y")]);
        graph.record(&pick, EdgePolicy::Refresh);

        assert!(graph.has_edge("flag", "pick"));
        assert!(!graph.has_edge("x", "pick"));
        assert!(graph.has_edge("y", "pick"));
        assert_eq!(graph.dependencies_of("pick"), vec![key("flag"), key("y")]);
    }

    #[test]
    fn reads_become_edges_only_when_recorded() {
        let mut graph = DependencyGraph::new();
        let sum = key("sum");

        graph.set_reads(&sum, &[key("a")]);
        assert!(!graph.has_edge("a", "sum"));

        graph.record(&sum, EdgePolicy::Accumulate);
        assert!(graph.has_edge("a", "sum"));
    }

    #[test]
    fn empty_reads_record_nothing() {
        let mut graph = DependencyGraph::new();
        let constant = key("const");

        graph.set_reads(&constant, &[]);
        assert_eq!(graph.record(&constant, EdgePolicy::Refresh), 0);
        assert_eq!(graph.edge_count(), 0);

        // Never evaluated
        assert_eq!(graph.record(&key("other"), EdgePolicy::Accumulate), 0);
    }

    #[test]
    fn cycle_follows_latest_reads() {
        let mut graph = DependencyGraph::new();
        let (x, y, z) = (key("x"), key("y"), key("z"));

        // x reads y, y reads z, z reads x
        graph.set_reads(&x, &[key("flag"), y.clone()]);
        graph.set_reads(&y, &[z.clone()]);
        graph.set_reads(&z, &[x.clone()]);

        assert_eq!(
            graph.cycle_through("x"),
            Some(vec![x.clone(), z.clone(), y.clone(), x.clone()])
        );
    }

    #[test]
    fn stale_edges_are_not_a_cycle() {
        let mut graph = DependencyGraph::new();
        let (x, y) = (key("x"), key("y"));

        graph.set_reads(&y, &[key("flag"), x.clone()]);
        graph.record(&y, EdgePolicy::Accumulate);
        graph.set_reads(&x, &[key("flag"), y.clone()]);
        graph.record(&x, EdgePolicy::Accumulate);

        // y stops reading x, but the edge stays
        graph.set_reads(&y, &[key("flag")]);
        graph.record(&y, EdgePolicy::Accumulate);

        assert!(graph.has_edge("x", "y"));
        assert!(graph.has_edge("y", "x"));
        assert_eq!(graph.cycle_through("x"), None);
        assert_eq!(graph.cycle_through("y"), None);
    }

    #[test]
    fn self_read_is_a_cycle() {
        let mut graph = DependencyGraph::new();
        let n = key("n");

        graph.set_reads(&n, &[n.clone()]);
        assert_eq!(graph.cycle_through("n"), Some(vec![n.clone(), n.clone()]));
        assert_eq!(graph.cycle_through("unknown"), None);
    }
}
