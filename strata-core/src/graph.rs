//! Owner-collapsed module dependency graph
//!
//! Every edge endpoint is replaced by its owning declared module; edges with an
//! undeclared endpoint and edges inside one module are dropped. Cycles are
//! found with Tarjan's strongly connected components.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt::Write as _;
use std::iter::Flatten;
use std::option;

use crate::edges::EdgeSet;
use crate::layer::Layer;
use crate::path::ModulePath;
use crate::rules::RuleSet;

#[derive(Debug, Clone, Copy, Default)]
struct NodeInfo {
    layer: Option<Layer>,
    utility: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: BTreeMap<ModulePath, NodeInfo>,
    edges: BTreeMap<ModulePath, BTreeSet<ModulePath>>,
}

impl DependencyGraph {
    /// Collapse `edges` onto the declared modules of `rules`
    pub fn from_edges(rules: &RuleSet, edges: &EdgeSet) -> Self {
        let mut graph = DependencyGraph::default();

        for rule in rules.modules() {
            graph.nodes.insert(
                rule.path.clone(),
                NodeInfo {
                    layer: rule.layer,
                    utility: rule.utility,
                },
            );
        }

        for edge in edges {
            let (Some(from), Some(to)) =
                (rules.owner(&edge.importer), rules.owner(&edge.imported))
            else {
                continue;
            };
            if from.path == to.path {
                continue;
            }
            graph
                .edges
                .entry(from.path.clone())
                .or_default()
                .insert(to.path.clone());
        }

        graph
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    /// Declared modules `path` depends on
    pub fn dependencies_of(&self, path: &str) -> Vec<&ModulePath> {
        self.edges
            .get(path)
            .map(|deps| deps.iter().collect())
            .unwrap_or_default()
    }

    /// Declared modules that depend on `path`
    pub fn dependents_of(&self, path: &str) -> Vec<&ModulePath> {
        self.edges
            .iter()
            .filter(|(_, deps)| deps.contains(path))
            .map(|(from, _)| from)
            .collect()
    }

    /// One closed cycle path per strongly connected component with more than
    /// one module, e.g. `[x, y, z, x]`.
    ///
    /// Each path starts at the smallest module of its component; the list is
    /// sorted by that start.
    pub fn find_cycles(&self) -> Vec<Vec<ModulePath>> {
        let mut cycles: Vec<Vec<ModulePath>> = self
            .strongly_connected_components()
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .filter_map(|scc| self.cycle_within(&scc))
            .collect();
        cycles.sort();
        cycles
    }

    fn strongly_connected_components(&self) -> Vec<Vec<&ModulePath>> {
        let mut state = Tarjan::default();
        for root in self.edges.keys() {
            if !state.index.contains_key(root) {
                self.tarjan_visit(root, &mut state);
            }
        }
        state.sccs
    }

    fn successors(&self, v: &ModulePath) -> Successors<'_> {
        self.edges.get(v).into_iter().flatten()
    }

    /// Depth-first walk from `root` with an explicit frame stack, so path
    /// length is bounded by the heap rather than the thread stack.
    fn tarjan_visit<'a>(&'a self, root: &'a ModulePath, state: &mut Tarjan<'a>) {
        let mut frames: Vec<(&'a ModulePath, Successors<'a>)> = Vec::new();
        state.open(root);
        frames.push((root, self.successors(root)));

        while let Some((v, neighbors)) = frames.last_mut() {
            let v = *v;

            if let Some(w) = neighbors.next() {
                if !state.index.contains_key(w) {
                    state.open(w);
                    frames.push((w, self.successors(w)));
                } else if state.on_stack.contains(w) {
                    let w_index = state.index[w];
                    state.lower(v, w_index);
                }
                continue;
            }

            frames.pop();

            if state.lowlink[v] == state.index[v] {
                let mut scc = Vec::new();
                while let Some(w) = state.stack.pop() {
                    state.on_stack.remove(w);
                    scc.push(w);
                    if w == v {
                        break;
                    }
                }
                scc.sort();
                state.sccs.push(scc);
            }

            if let Some((parent, _)) = frames.last() {
                let v_low = state.lowlink[v];
                state.lower(parent, v_low);
            }
        }
    }

    /// Shortest closed walk from the smallest member back to itself, staying
    /// inside the component
    fn cycle_within(&self, scc: &[&ModulePath]) -> Option<Vec<ModulePath>> {
        let members: HashSet<&ModulePath> = scc.iter().copied().collect();
        let start = *scc.first()?;

        let mut parent: HashMap<&ModulePath, &ModulePath> = HashMap::new();
        let mut queue = VecDeque::from([start]);

        while let Some(node) = queue.pop_front() {
            for next in self.edges.get(node).into_iter().flatten() {
                if !members.contains(next) {
                    continue;
                }
                if next == start {
                    let mut path = vec![start.clone()];
                    let mut cursor = node;
                    while cursor != start {
                        path.push(cursor.clone());
                        cursor = parent[cursor];
                    }
                    path.push(start.clone());
                    path.reverse();
                    return Some(path);
                }
                if !parent.contains_key(next) {
                    parent.insert(next, node);
                    queue.push_back(next);
                }
            }
        }

        None
    }

    /// Graphviz DOT rendering; nodes filled by layer, utility modules dashed
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "digraph modules {{");
        let _ = writeln!(out, "    rankdir=LR;");
        let _ = writeln!(out, "    node [shape=box, style=filled, fontname=\"Helvetica\"];");

        for (path, info) in &self.nodes {
            let style = if info.utility { "filled,dashed" } else { "filled" };
            let label = match info.layer {
                Some(layer) => format!("{}\\n[{}]", path, layer),
                None => path.to_string(),
            };
            let _ = writeln!(
                out,
                "    \"{}\" [label=\"{}\", fillcolor=\"{}\", style=\"{}\"];",
                path,
                label,
                layer_color(info.layer),
                style
            );
        }

        for (from, deps) in &self.edges {
            for to in deps {
                let _ = writeln!(out, "    \"{}\" -> \"{}\";", from, to);
            }
        }

        out.push_str("}\n");
        out
    }
}

type Successors<'a> = Flatten<option::IntoIter<&'a BTreeSet<ModulePath>>>;

#[derive(Default)]
struct Tarjan<'a> {
    counter: usize,
    index: HashMap<&'a ModulePath, usize>,
    lowlink: HashMap<&'a ModulePath, usize>,
    stack: Vec<&'a ModulePath>,
    on_stack: HashSet<&'a ModulePath>,
    sccs: Vec<Vec<&'a ModulePath>>,
}

impl<'a> Tarjan<'a> {
    fn open(&mut self, v: &'a ModulePath) {
        self.index.insert(v, self.counter);
        self.lowlink.insert(v, self.counter);
        self.counter += 1;
        self.stack.push(v);
        self.on_stack.insert(v);
    }

    fn lower(&mut self, v: &ModulePath, value: usize) {
        if let Some(low) = self.lowlink.get_mut(v) {
            *low = (*low).min(value);
        }
    }
}

fn layer_color(layer: Option<Layer>) -> &'static str {
    match layer {
        Some(Layer::Core) => "#cce5ff",
        Some(Layer::Auxiliary) => "#d4edda",
        Some(Layer::Tertiary) => "#fff3cd",
        Some(Layer::Ui) => "#f8d7da",
        None => "#eeeeee",
    }
}
