// ── Level assignment ──
//
// Longest-path leveling from the roots of a directed graph, tolerant of
// cycles. Vertices are plain indices into the caller's stable input order.

use std::collections::VecDeque;

/// Directed graph over `0..n` with edges kept in insertion order.
#[derive(Debug, Clone)]
pub struct LevelGraph {
    adj: Vec<Vec<usize>>,
    has_incoming: Vec<bool>,
}

impl LevelGraph {
    pub fn new(n: usize) -> Self {
        Self {
            adj: vec![Vec::new(); n],
            has_incoming: vec![false; n],
        }
    }

    pub fn len(&self) -> usize {
        self.adj.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adj.is_empty()
    }

    /// Add `from → to`. Out-of-range indices and self loops are ignored.
    pub fn add_edge(&mut self, from: usize, to: usize) {
        if from == to {
            return;
        }
        let (Some(out), Some(incoming)) = (self.adj.get_mut(from), self.has_incoming.get_mut(to))
        else {
            return;
        };
        if !out.contains(&to) {
            out.push(to);
        }
        *incoming = true;
    }

    /// Assign a level to every vertex.
    ///
    /// Roots (no incoming edge) sit at level 0. A breadth-first walk from
    /// all roots, in index order, gives each successor `level(u) + 1`; a
    /// vertex already reached by a shorter path is raised and walked
    /// again. Levels never exceed `n - 1`, which bounds the walk when a
    /// cycle is reachable from a root. Vertices no root reaches stay at 0.
    pub fn assign_levels(&self) -> Vec<usize> {
        let n = self.len();
        let cap = n.saturating_sub(1);
        let mut levels: Vec<Option<usize>> = vec![None; n];
        let mut queue: VecDeque<usize> = VecDeque::new();

        for (v, incoming) in self.has_incoming.iter().enumerate() {
            if !incoming {
                levels[v] = Some(0);
                queue.push_back(v);
            }
        }

        while let Some(u) = queue.pop_front() {
            let candidate = (levels[u].unwrap_or(0) + 1).min(cap);
            for &v in &self.adj[u] {
                match levels[v] {
                    Some(current) if current >= candidate => {}
                    _ => {
                        levels[v] = Some(candidate);
                        queue.push_back(v);
                    }
                }
            }
        }

        levels.into_iter().map(|l| l.unwrap_or(0)).collect()
    }
}

/// Group vertex indices by level: `buckets[l]` lists the vertices at
/// level `l` in index order.
pub fn bucket_levels(levels: &[usize]) -> Vec<Vec<usize>> {
    let Some(&max) = levels.iter().max() else {
        return Vec::new();
    };
    let mut buckets = vec![Vec::new(); max + 1];
    for (v, &level) in levels.iter().enumerate() {
        buckets[level].push(v);
    }
    buckets
}
