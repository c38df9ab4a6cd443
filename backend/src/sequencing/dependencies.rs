//! Explicit action dependency graph
//!
//! Edges run from a prerequisite to the action that depends on it. Unknown
//! prerequisites are reported and ignored. Cycles are found with Tarjan's
//! SCC algorithm and broken by dropping every edge inside a cyclic component
//! (self-dependencies included), so the remaining graph is always acyclic.
//!
//! # Determinism
//!
//! - Vertices are indexed in lexicographic id order
//! - Adjacency is kept in `BTreeSet`s for sorted iteration
//! - Ready actions are released highest priority first, ties by id

use crate::models::{DiagnosticKind, DiagnosticLog, PlannedAction};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Action id → vertex index (sorted)
    index: BTreeMap<String, usize>,
    /// Vertex index → action id
    ids: Vec<String>,
    /// prerequisite → dependents
    successors: Vec<BTreeSet<usize>>,
    /// dependent → prerequisites
    predecessors: Vec<BTreeSet<usize>>,
}

impl DependencyGraph {
    /// Build from the actions of one scenario
    ///
    /// `scope` prefixes diagnostic subjects (usually the scenario id).
    pub fn build(actions: &[PlannedAction], scope: &str, log: &mut DiagnosticLog) -> Self {
        let ids: Vec<String> = actions
            .iter()
            .map(|a| a.id().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index: BTreeMap<String, usize> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        let n = ids.len();
        let mut graph = Self {
            index,
            ids,
            successors: vec![BTreeSet::new(); n],
            predecessors: vec![BTreeSet::new(); n],
        };

        for action in actions {
            let Some(&to) = graph.index.get(action.id()) else {
                continue;
            };
            for dep in &action.plan.depends_on {
                match graph.index.get(dep) {
                    Some(&from) => graph.add_edge(from, to),
                    None => log.record(
                        DiagnosticKind::UnknownReference,
                        format!("{scope}/{}", action.id()),
                        format!("dependency {dep} is not part of the scenario; ignored"),
                    ),
                }
            }
        }

        graph.break_cycles(scope, log);
        graph
    }

    fn add_edge(&mut self, from: usize, to: usize) {
        self.successors[from].insert(to);
        self.predecessors[to].insert(from);
    }

    fn remove_edge(&mut self, from: usize, to: usize) {
        self.successors[from].remove(&to);
        self.predecessors[to].remove(&from);
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    /// Effective prerequisites of `id` after cycle breaking (sorted)
    pub fn prerequisites(&self, id: &str) -> Vec<String> {
        self.index
            .get(id)
            .map(|&v| {
                self.predecessors[v]
                    .iter()
                    .map(|&p| self.ids[p].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Strongly connected components in Tarjan order
    pub fn strongly_connected_components(&self) -> Vec<Vec<String>> {
        let mut state = TarjanState::new(self.len());
        for v in 0..self.len() {
            if state.indices[v].is_none() {
                self.strongconnect(v, &mut state);
            }
        }
        state
            .sccs
            .into_iter()
            .map(|scc| scc.into_iter().map(|v| self.ids[v].clone()).collect())
            .collect()
    }

    fn strongconnect(&self, v: usize, state: &mut TarjanState) {
        state.indices[v] = Some(state.index);
        state.lowlinks[v] = state.index;
        state.index += 1;
        state.stack.push(v);
        state.on_stack[v] = true;

        for &w in &self.successors[v] {
            match state.indices[w] {
                None => {
                    self.strongconnect(w, state);
                    state.lowlinks[v] = state.lowlinks[v].min(state.lowlinks[w]);
                }
                Some(w_index) if state.on_stack[w] => {
                    state.lowlinks[v] = state.lowlinks[v].min(w_index);
                }
                Some(_) => {}
            }
        }

        if Some(state.lowlinks[v]) == state.indices[v] {
            let mut scc = Vec::new();
            while let Some(w) = state.stack.pop() {
                state.on_stack[w] = false;
                scc.push(w);
                if w == v {
                    break;
                }
            }
            scc.sort_unstable();
            state.sccs.push(scc);
        }
    }

    /// Drop edges inside cyclic components, one diagnostic per component
    fn break_cycles(&mut self, scope: &str, log: &mut DiagnosticLog) {
        let components = self.strongly_connected_components();
        for members in components {
            let vertices: BTreeSet<usize> = members
                .iter()
                .filter_map(|id| self.index.get(id).copied())
                .collect();
            let cyclic = vertices.len() > 1
                || vertices.iter().any(|&v| self.successors[v].contains(&v));
            if !cyclic {
                continue;
            }

            let mut dropped = 0;
            for &from in &vertices {
                let inside: Vec<usize> = self.successors[from]
                    .iter()
                    .copied()
                    .filter(|to| vertices.contains(to))
                    .collect();
                for to in inside {
                    self.remove_edge(from, to);
                    dropped += 1;
                }
            }
            log.record(
                DiagnosticKind::DependencyCycle,
                format!("{scope}/{}", members.join(",")),
                format!(
                    "dependency cycle among [{}]; {dropped} edge(s) dropped",
                    members.join(", ")
                ),
            );
        }
    }

    /// Topological order, releasing the highest-priority ready action first
    ///
    /// Actions missing from `priorities` rank as 0.
    pub fn execution_order(&self, priorities: &BTreeMap<String, f64>) -> Vec<String> {
        let n = self.len();
        let mut remaining: Vec<usize> = self.predecessors.iter().map(BTreeSet::len).collect();
        let mut ready: Vec<usize> = (0..n).filter(|&v| remaining[v] == 0).collect();
        let mut order = Vec::with_capacity(n);

        let priority = |v: usize| priorities.get(&self.ids[v]).copied().unwrap_or(0.0);

        while !ready.is_empty() {
            // Vertex indices follow id order, so the smaller index wins ties
            let mut best = 0;
            for i in 1..ready.len() {
                let (a, b) = (ready[i], ready[best]);
                match priority(a).total_cmp(&priority(b)) {
                    std::cmp::Ordering::Greater => best = i,
                    std::cmp::Ordering::Equal if a < b => best = i,
                    _ => {}
                }
            }
            let v = ready.swap_remove(best);
            order.push(self.ids[v].clone());
            for &w in &self.successors[v] {
                remaining[w] -= 1;
                if remaining[w] == 0 {
                    ready.push(w);
                }
            }
        }
        order
    }

    /// Earliest step each action can start once its prerequisites finish
    ///
    /// Ignores planned start delays: this is the dependency-bound schedule.
    /// Steps saturate at `u32::MAX`.
    pub fn earliest_starts(&self, actions: &[PlannedAction]) -> BTreeMap<String, u32> {
        let durations: BTreeMap<&str, u32> = actions
            .iter()
            .map(|a| (a.id(), a.plan.duration.max(1)))
            .collect();
        let mut starts: BTreeMap<String, u32> = BTreeMap::new();
        for id in self.execution_order(&BTreeMap::new()) {
            let start = self
                .prerequisites(&id)
                .iter()
                .map(|p| {
                    starts
                        .get(p)
                        .copied()
                        .unwrap_or(0)
                        .saturating_add(durations.get(p.as_str()).copied().unwrap_or(1))
                })
                .max()
                .unwrap_or(0);
            starts.insert(id, start);
        }
        starts
    }
}

struct TarjanState {
    index: usize,
    indices: Vec<Option<usize>>,
    lowlinks: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    sccs: Vec<Vec<usize>>,
}

impl TarjanState {
    fn new(n: usize) -> Self {
        Self {
            index: 0,
            indices: vec![None; n],
            lowlinks: vec![0; n],
            on_stack: vec![false; n],
            stack: Vec::new(),
            sccs: Vec::new(),
        }
    }
}
