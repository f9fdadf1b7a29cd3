//! Shortest paths over the undirected view of the graph

use super::knowledge::KnowledgeGraph;
use super::node::NodeIndex;
use std::collections::{HashMap, VecDeque};

impl KnowledgeGraph {
    /// Distinct undirected neighbours of `index`.
    pub fn neighbors(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut out: Vec<NodeIndex> = Vec::new();
        for edge in self.incident_edges(index).iter().filter_map(|e| self.edge(*e)) {
            if let Some(other) = edge.other(index) {
                if other != index && !out.contains(&other) {
                    out.push(other);
                }
            }
        }
        out
    }

    /// Every shortest path from `source` to `target`, edge direction
    /// ignored. Each path lists its nodes from `source` to `target`.
    /// Empty when the two are disconnected or either is missing.
    pub fn all_shortest_paths(&self, source: NodeIndex, target: NodeIndex) -> Vec<Vec<NodeIndex>> {
        if self.node(source).is_none() || self.node(target).is_none() {
            return Vec::new();
        }
        if source == target {
            return vec![vec![source]];
        }

        // BFS recording every predecessor that reaches a node at minimal depth
        let mut depth: HashMap<NodeIndex, usize> = HashMap::new();
        let mut predecessors: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();
        let mut queue: VecDeque<NodeIndex> = VecDeque::new();
        depth.insert(source, 0);
        queue.push_back(source);

        while let Some(current) = queue.pop_front() {
            let d = depth[&current];
            if let Some(&target_depth) = depth.get(&target) {
                if d >= target_depth {
                    break;
                }
            }
            for next in self.neighbors(current) {
                match depth.get(&next) {
                    None => {
                        depth.insert(next, d + 1);
                        predecessors.entry(next).or_default().push(current);
                        queue.push_back(next);
                    }
                    Some(&nd) if nd == d + 1 => {
                        predecessors.entry(next).or_default().push(current);
                    }
                    Some(_) => {}
                }
            }
        }

        if !depth.contains_key(&target) {
            return Vec::new();
        }

        // Walk predecessor lists back from the target
        let mut paths = Vec::new();
        let mut stack: Vec<Vec<NodeIndex>> = vec![vec![target]];
        while let Some(partial) = stack.pop() {
            let head = partial[partial.len() - 1];
            if head == source {
                let mut path = partial;
                path.reverse();
                paths.push(path);
                continue;
            }
            for prev in predecessors.get(&head).into_iter().flatten() {
                let mut extended = partial.clone();
                extended.push(*prev);
                stack.push(extended);
            }
        }
        paths.sort();
        paths
    }
}
