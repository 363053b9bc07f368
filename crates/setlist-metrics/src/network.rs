//! Voting network: who gives points to whom.
//!
//! The graph is an explicit weighted adjacency structure over competitor
//! ids. Influence is a power-iteration rank propagation over it (the
//! classic PageRank recurrence with uniform teleport and uniform
//! redistribution of dangling mass). Blocs are modularity communities of
//! the same graph with direction dropped.

use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use setlist_core::constants::BLOC_MAX_PASSES;
use setlist_core::traits::round_matches;
use setlist_core::{CompetitorId, Dataset, RoundId};

use crate::config::RankConfig;

/// Directed graph with one node per competitor and edge weight equal to
/// the total points a voter gave a submitter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VotingGraph {
    nodes: Vec<CompetitorId>,
    index: HashMap<CompetitorId, usize>,
    /// `adjacency[from][to] = weight`; only positive weights are stored.
    adjacency: Vec<BTreeMap<usize, u64>>,
}

impl VotingGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node if absent; returns its index.
    pub fn add_node(&mut self, id: &CompetitorId) -> usize {
        if let Some(&i) = self.index.get(id) {
            return i;
        }
        let i = self.nodes.len();
        self.nodes.push(id.clone());
        self.index.insert(id.clone(), i);
        self.adjacency.push(BTreeMap::new());
        i
    }

    /// Increment the `from -> to` edge, adding either node if needed.
    /// Zero weights and self-loops are ignored.
    pub fn add_weight(&mut self, from: &CompetitorId, to: &CompetitorId, weight: u64) {
        if weight == 0 || from == to {
            return;
        }
        let f = self.add_node(from);
        let t = self.add_node(to);
        *self.adjacency[f].entry(t).or_insert(0) += weight;
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[CompetitorId] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(BTreeMap::len).sum()
    }

    pub fn contains(&self, id: &CompetitorId) -> bool {
        self.index.contains_key(id)
    }

    /// Weight of the `from -> to` edge, `0` if absent.
    pub fn weight(&self, from: &CompetitorId, to: &CompetitorId) -> u64 {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&f), Some(&t)) => self.adjacency[f].get(&t).copied().unwrap_or(0),
            _ => 0,
        }
    }

    /// Total weight leaving a node.
    pub fn out_weight(&self, from: &CompetitorId) -> u64 {
        self.index
            .get(from)
            .map(|&f| self.adjacency[f].values().sum())
            .unwrap_or(0)
    }

    /// All edges as `(from, to, weight)`, ordered by node index.
    pub fn edges(&self) -> impl Iterator<Item = (&CompetitorId, &CompetitorId, u64)> + '_ {
        self.adjacency.iter().enumerate().flat_map(move |(f, out)| {
            out.iter()
                .map(move |(&t, &w)| (&self.nodes[f], &self.nodes[t], w))
        })
    }

    /// Rank propagation over the weighted edges.
    ///
    /// Returns one score per node in node order, summing to ~1. An empty
    /// graph yields an empty vector. Invalid parameters or failure to
    /// converge within `max_iterations` yield the uniform distribution.
    pub fn rank(&self, config: &RankConfig) -> Vec<f64> {
        let n = self.node_count();
        if n == 0 {
            return Vec::new();
        }
        let uniform = vec![1.0 / n as f64; n];
        if !config.is_valid() {
            warn!(?config, "voting_graph: invalid rank parameters, using uniform scores");
            return uniform;
        }

        let out: Vec<f64> = self
            .adjacency
            .iter()
            .map(|edges| edges.values().sum::<u64>() as f64)
            .collect();
        let d = config.damping;
        let teleport = (1.0 - d) / n as f64;
        let mut x = uniform.clone();

        for iteration in 1..=config.max_iterations {
            let dangling: f64 = (0..n).filter(|&i| out[i] == 0.0).map(|i| x[i]).sum();
            let base = teleport + d * dangling / n as f64;
            let mut next = vec![base; n];
            for (f, edges) in self.adjacency.iter().enumerate() {
                if out[f] == 0.0 {
                    continue;
                }
                let share = d * x[f] / out[f];
                for (&t, &w) in edges {
                    next[t] += share * w as f64;
                }
            }

            let change: f64 = next.iter().zip(&x).map(|(a, b)| (a - b).abs()).sum();
            x = next;
            if change < n as f64 * config.tolerance {
                debug!(nodes = n, iterations = iteration, "voting_graph: rank converged");
                return x;
            }
        }

        warn!(
            nodes = n,
            max_iterations = config.max_iterations,
            "voting_graph: rank did not converge, using uniform scores"
        );
        uniform
    }
}

/// Build the voting graph.
///
/// Every competitor is a node, connected or not. Each nonzero vote whose
/// submitter resolves and differs from the voter adds its points to the
/// `voter -> submitter` edge. Voters or submitters missing from the
/// competitor list become extra nodes so that point totals stay consistent.
pub fn build_voting_graph(ds: &dyn Dataset, round: Option<&RoundId>) -> VotingGraph {
    let mut graph = VotingGraph::new();
    for c in ds.competitors() {
        graph.add_node(&c.id);
    }

    for v in ds.votes() {
        if !v.is_cast() || !round_matches(round, &v.round_id) {
            continue;
        }
        let Some(submitter) = ds.submitter_for(&v.item_id, &v.round_id) else {
            trace!(item = %v.item_id, round = %v.round_id, "voting_graph: vote on unsubmitted item skipped");
            continue;
        };
        if submitter == &v.voter_id {
            continue;
        }
        graph.add_weight(&v.voter_id, submitter, u64::from(v.points));
    }

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "voting_graph: built"
    );
    graph
}

/// Influence per node with the default rank parameters.
pub fn influence_score(ds: &dyn Dataset, round: Option<&RoundId>) -> BTreeMap<CompetitorId, f64> {
    influence_score_with(ds, round, &RankConfig::default())
}

/// Influence per node with explicit rank parameters.
pub fn influence_score_with(
    ds: &dyn Dataset,
    round: Option<&RoundId>,
    config: &RankConfig,
) -> BTreeMap<CompetitorId, f64> {
    let graph = build_voting_graph(ds, round);
    graph
        .nodes()
        .iter()
        .cloned()
        .zip(graph.rank(config))
        .collect()
}

/// Balance of the points exchanged between two competitors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReciprocityRecord {
    pub voter_id: CompetitorId,
    pub voter_name: String,
    pub submitter_id: CompetitorId,
    pub submitter_name: String,
    pub points_given: u64,
    pub points_received: u64,
    /// `min(given, received) / max(given, received)`.
    pub reciprocity: f64,
}

/// One record per ordered pair `(a, b)` with points flowing in at least one
/// direction, in node order.
pub fn voting_reciprocity(ds: &dyn Dataset, round: Option<&RoundId>) -> Vec<ReciprocityRecord> {
    let graph = build_voting_graph(ds, round);
    let mut records = Vec::new();
    for a in graph.nodes() {
        for b in graph.nodes() {
            if a == b {
                continue;
            }
            let given = graph.weight(a, b);
            let received = graph.weight(b, a);
            let hi = given.max(received);
            if hi == 0 {
                continue;
            }
            records.push(ReciprocityRecord {
                voter_id: a.clone(),
                voter_name: ds.competitor_name(a).to_string(),
                submitter_id: b.clone(),
                submitter_name: ds.competitor_name(b).to_string(),
                points_given: given,
                points_received: received,
                reciprocity: given.min(received) as f64 / hi as f64,
            });
        }
    }
    records
}

/// Group competitors into voting blocs by weighted modularity over the
/// voting graph with direction dropped (`w(a, b) = a->b + b->a`).
///
/// One level of Louvain local moves: every node starts alone and is moved
/// to the neighbouring community with the largest positive modularity
/// gain until a sweep moves nothing. Competitors with no votes either way
/// stay in a bloc of their own. Bloc ids follow node order, starting at 0.
pub fn voting_blocs(ds: &dyn Dataset, round: Option<&RoundId>) -> BTreeMap<CompetitorId, usize> {
    let graph = build_voting_graph(ds, round);
    let bloc = detect_blocs(&graph, BLOC_MAX_PASSES);
    graph.nodes().iter().cloned().zip(bloc).collect()
}

/// Bloc id per node index. Falls back to connected components if the
/// local moves have not settled after `max_passes` sweeps.
fn detect_blocs(graph: &VotingGraph, max_passes: usize) -> Vec<usize> {
    let n = graph.node_count();
    let links = undirected(graph);

    match local_moves(&links, max_passes) {
        Some(community) => {
            let bloc = relabel(&community);
            debug!(
                nodes = n,
                blocs = bloc.iter().max().map_or(0, |b| b + 1),
                "voting_graph: blocs detected"
            );
            bloc
        }
        None => {
            warn!(
                nodes = n,
                passes = max_passes,
                "voting_graph: bloc detection did not settle, using connected components"
            );
            connected_components(&links)
        }
    }
}

/// Symmetrised weights, `links[i][j] = w(i->j) + w(j->i)`.
fn undirected(graph: &VotingGraph) -> Vec<BTreeMap<usize, u64>> {
    let mut links: Vec<BTreeMap<usize, u64>> = vec![BTreeMap::new(); graph.node_count()];
    for (f, edges) in graph.adjacency.iter().enumerate() {
        for (&t, &w) in edges {
            *links[f].entry(t).or_insert(0) += w;
            *links[t].entry(f).or_insert(0) += w;
        }
    }
    links
}

/// Community per node after local moves, or `None` if still moving after
/// `max_passes` sweeps.
fn local_moves(links: &[BTreeMap<usize, u64>], max_passes: usize) -> Option<Vec<usize>> {
    let n = links.len();
    let degree: Vec<f64> = links.iter().map(|l| l.values().sum::<u64>() as f64).collect();
    let two_m: f64 = degree.iter().sum();

    let mut community: Vec<usize> = (0..n).collect();
    let mut total = degree.clone();
    if two_m == 0.0 {
        return Some(community);
    }

    for pass in 0..max_passes {
        let mut moved = 0usize;
        for i in 0..n {
            if degree[i] == 0.0 {
                continue;
            }
            let home = community[i];
            let mut to_community: BTreeMap<usize, f64> = BTreeMap::new();
            for (&j, &w) in &links[i] {
                *to_community.entry(community[j]).or_insert(0.0) += w as f64;
            }

            total[home] -= degree[i];
            let gain = |c: usize, w_in: f64| w_in - total[c] * degree[i] / two_m;
            let mut best = home;
            let mut best_gain = gain(home, to_community.get(&home).copied().unwrap_or(0.0));
            for (&c, &w_in) in &to_community {
                let g = gain(c, w_in);
                if g > best_gain + 1e-12 {
                    best = c;
                    best_gain = g;
                }
            }
            total[best] += degree[i];

            if best != home {
                community[i] = best;
                moved += 1;
            }
        }
        trace!(pass, moved, "voting_graph: local-move sweep");
        if moved == 0 {
            return Some(community);
        }
    }
    None
}

/// Renumber communities densely in order of first appearance.
fn relabel(community: &[usize]) -> Vec<usize> {
    let mut ids: HashMap<usize, usize> = HashMap::new();
    community
        .iter()
        .map(|&c| {
            let next = ids.len();
            *ids.entry(c).or_insert(next)
        })
        .collect()
}

fn connected_components(links: &[BTreeMap<usize, u64>]) -> Vec<usize> {
    let n = links.len();
    let mut bloc: Vec<Option<usize>> = vec![None; n];
    let mut next_id = 0;
    for start in 0..n {
        if bloc[start].is_some() {
            continue;
        }
        let mut queue = VecDeque::from([start]);
        bloc[start] = Some(next_id);
        while let Some(node) = queue.pop_front() {
            for &m in links[node].keys() {
                if bloc[m].is_none() {
                    bloc[m] = Some(next_id);
                    queue.push_back(m);
                }
            }
        }
        next_id += 1;
    }
    bloc.into_iter().map(|b| b.unwrap_or_default()).collect()
}
