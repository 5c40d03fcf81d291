//! Dependency graph utilities shared by the feature and module resolvers.
//!
//! Nodes are string keys; an edge `a -> b` means "`a` depends on `b`".
//! Edges to keys that are not nodes (e.g. check ids referenced by features)
//! are leaves and do not participate in ordering or cycle detection.
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// How Kahn's algorithm breaks ties between nodes that are ready at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
    /// Earlier-declared node first.
    Declaration,
    /// Lexicographically smaller key first.
    Lexicographic,
}

/// A dependency cycle, listed from its first node back to itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle(pub Vec<String>);

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" → "))
    }
}

/// Directed dependency graph over string keys, preserving declaration order.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<String>,
    index: HashMap<String, usize>,
    deps: Vec<Vec<usize>>,
    dependents: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from `(key, dependencies)` pairs in declaration order.
    ///
    /// Dependencies that are not themselves declared keys are ignored.
    pub fn from_declarations<'a, I, D>(decls: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, D)> + Clone,
        D: IntoIterator<Item = &'a str>,
    {
        let mut graph = Self::new();
        for (key, _) in decls.clone() {
            graph.add_node(key);
        }
        for (key, deps) in decls {
            for dep in deps {
                graph.add_edge(key, dep);
            }
        }
        graph
    }

    /// Add a node; adding an existing key is a no-op.
    pub fn add_node(&mut self, key: &str) {
        if self.index.contains_key(key) {
            return;
        }
        self.index.insert(key.to_string(), self.nodes.len());
        self.nodes.push(key.to_string());
        self.deps.push(Vec::new());
        self.dependents.push(Vec::new());
    }

    /// Record that `from` depends on `to`. Ignored unless both are nodes.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        let (Some(&f), Some(&t)) = (self.index.get(from), self.index.get(to)) else {
            return;
        };
        if let Some(d) = self.deps.get_mut(f)
            && !d.contains(&t)
        {
            d.push(t);
            if let Some(r) = self.dependents.get_mut(t) {
                r.push(f);
            }
        }
    }

    /// Whether `key` is a node.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Node keys in declaration order.
    #[must_use]
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Direct dependencies of `key` that are nodes, in declaration order.
    #[must_use]
    pub fn dependencies(&self, key: &str) -> Vec<&str> {
        self.neighbours(key, &self.deps)
    }

    /// Nodes that directly depend on `key`.
    #[must_use]
    pub fn dependents(&self, key: &str) -> Vec<&str> {
        self.neighbours(key, &self.dependents)
    }

    fn neighbours<'a>(&'a self, key: &str, adjacency: &'a [Vec<usize>]) -> Vec<&'a str> {
        self.index
            .get(key)
            .and_then(|&i| adjacency.get(i))
            .map(|list| {
                list.iter()
                    .filter_map(|&j| self.nodes.get(j).map(String::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Topological order (dependencies first) using Kahn's algorithm.
    ///
    /// # Errors
    ///
    /// Returns the offending [`Cycle`] if the graph is not acyclic.
    pub fn topological_order(&self, tie: TieBreak) -> Result<Vec<String>, Cycle> {
        let rank = self.ranks(tie);
        let mut in_degree: Vec<usize> = self.deps.iter().map(Vec::len).collect();

        let mut ready: BTreeSet<(usize, usize)> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d == 0)
            .filter_map(|(i, _)| rank.get(i).map(|&r| (r, i)))
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some((_, idx)) = ready.pop_first() {
            if let Some(key) = self.nodes.get(idx) {
                order.push(key.clone());
            }
            for &dependent in self.dependents.get(idx).map_or(&[][..], Vec::as_slice) {
                if let Some(count) = in_degree.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0
                        && let Some(&rd) = rank.get(dependent)
                    {
                        ready.insert((rd, dependent));
                    }
                }
            }
        }

        if order.len() == self.nodes.len() {
            Ok(order)
        } else {
            Err(self.find_cycle().unwrap_or_else(|| Cycle(Vec::new())))
        }
    }

    /// Find a cycle, searching from nodes in declaration order.
    ///
    /// The result starts and ends on the same key, e.g. `A → B → A`.
    #[must_use]
    pub fn find_cycle(&self) -> Option<Cycle> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            New,
            Active,
            Done,
        }

        fn visit(
            graph: &DependencyGraph,
            node: usize,
            marks: &mut [Mark],
            stack: &mut Vec<usize>,
        ) -> Option<Vec<usize>> {
            if let Some(m) = marks.get_mut(node) {
                *m = Mark::Active;
            }
            stack.push(node);
            for &dep in graph.deps.get(node).map_or(&[][..], Vec::as_slice) {
                match marks.get(dep).copied() {
                    Some(Mark::Active) => {
                        let start = stack.iter().position(|&n| n == dep).unwrap_or(0);
                        let mut cycle: Vec<usize> = stack.get(start..).map(<[usize]>::to_vec)?;
                        cycle.push(dep);
                        return Some(cycle);
                    }
                    Some(Mark::New) => {
                        if let Some(cycle) = visit(graph, dep, marks, stack) {
                            return Some(cycle);
                        }
                    }
                    _ => {}
                }
            }
            stack.pop();
            if let Some(m) = marks.get_mut(node) {
                *m = Mark::Done;
            }
            None
        }

        let mut marks = vec![Mark::New; self.nodes.len()];
        let mut stack = Vec::new();
        for start in 0..self.nodes.len() {
            if marks.get(start) == Some(&Mark::New)
                && let Some(cycle) = visit(self, start, &mut marks, &mut stack)
            {
                return Some(Cycle(
                    cycle
                        .into_iter()
                        .filter_map(|i| self.nodes.get(i).cloned())
                        .collect(),
                ));
            }
        }
        None
    }

    /// Every node reachable from `roots` through dependency edges, roots included.
    #[must_use]
    pub fn closure<'a>(&self, roots: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut pending: Vec<usize> = roots
            .into_iter()
            .filter_map(|r| self.index.get(r).copied())
            .collect();
        while let Some(idx) = pending.pop() {
            let Some(key) = self.nodes.get(idx) else {
                continue;
            };
            if seen.insert(key.clone()) {
                pending.extend(self.deps.get(idx).map_or(&[][..], Vec::as_slice));
            }
        }
        seen
    }

    fn ranks(&self, tie: TieBreak) -> Vec<usize> {
        match tie {
            TieBreak::Declaration => (0..self.nodes.len()).collect(),
            TieBreak::Lexicographic => {
                let mut sorted: Vec<usize> = (0..self.nodes.len()).collect();
                sorted.sort_by(|&a, &b| self.nodes.get(a).cmp(&self.nodes.get(b)));
                let mut rank = vec![0; self.nodes.len()];
                for (r, idx) in sorted.into_iter().enumerate() {
                    if let Some(slot) = rank.get_mut(idx) {
                        *slot = r;
                    }
                }
                rank
            }
        }
    }
}
