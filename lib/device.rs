//! Device description: qubit connectivity and the native gate catalog.
//!
//! A [`ProcessorSpec`] is read-only once built. It answers the queries the
//! samplers, compiler, and builders need: which gates are available on which
//! qubits, what each native gate does, which native gate undoes it, and how
//! to write any single-qubit Clifford in native gates.

use std::collections::VecDeque;
use itertools::Itertools;
use nalgebra::DMatrix;
use rustc_hash::FxHashMap as HashMap;
use crate::{
    circuit::Circuit,
    error::{ RbError, RbResult },
    gate::{ GateLabel, one_qubit_cliffords, one_qubit_clifford_name, standard_rep },
    symplectic::{ CliffordRep, symplectic_rep_of_clifford_circuit },
};

/// An undirected connectivity graph over labeled qubits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QubitGraph {
    nodes: Vec<usize>,
    adj: DMatrix<bool>,
}

impl QubitGraph {
    /// Create a new, totally disconnected graph.
    pub fn new(nodes: Vec<usize>) -> Self {
        let n = nodes.len();
        Self { nodes, adj: DMatrix::from_element(n, n, false) }
    }

    /// Create a graph with an edge between every pair of nodes.
    pub fn all_to_all(nodes: Vec<usize>) -> Self {
        let n = nodes.len();
        Self { nodes, adj: DMatrix::from_fn(n, n, |i, j| i != j) }
    }

    /// Create a graph from a list of edges.
    pub fn from_edges(nodes: Vec<usize>, edges: &[(usize, usize)])
        -> RbResult<Self>
    {
        let mut graph = Self::new(nodes);
        for &(a, b) in edges.iter() {
            graph.add_edge(a, b)?;
        }
        Ok(graph)
    }

    fn index_of(&self, q: usize) -> Option<usize> {
        self.nodes.iter().position(|n| *n == q)
    }

    fn index_checked(&self, q: usize) -> RbResult<usize> {
        self.index_of(q).ok_or(RbError::UnknownQubit(q))
    }

    /// Add an edge between `a` and `b`.
    ///
    /// Does nothing if an edge already exists or `a == b`.
    pub fn add_edge(&mut self, a: usize, b: usize) -> RbResult<&mut Self> {
        let i = self.index_checked(a)?;
        let j = self.index_checked(b)?;
        if i != j {
            self.adj[(i, j)] = true;
            self.adj[(j, i)] = true;
        }
        Ok(self)
    }

    /// The node labels.
    pub fn nodes(&self) -> &[usize] { &self.nodes }

    /// Return `true` if `a` and `b` share an edge.
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        match (self.index_of(a), self.index_of(b)) {
            (Some(i), Some(j)) => self.adj[(i, j)],
            _ => false,
        }
    }

    /// Return the labels of all nodes sharing an edge with `node`, in node
    /// order. Empty if the node doesn't exist.
    pub fn neighbors_of(&self, node: usize) -> Vec<usize> {
        match self.index_of(node) {
            Some(i) => {
                self.adj.row(i).iter().enumerate()
                    .filter_map(|(j, a)| a.then_some(self.nodes[j]))
                    .collect()
            },
            None => Vec::new(),
        }
    }

    /// Every edge once, as `(a, b)` with `a` before `b` in node order.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let n = self.nodes.len();
        (0..n).tuple_combinations()
            .filter(|&(i, j)| self.adj[(i, j)])
            .map(|(i, j)| (self.nodes[i], self.nodes[j]))
            .collect()
    }

    /// Shortest path from `a` to `b` (both included) through nodes in
    /// `within`, or the whole graph if `within` is `None`.
    pub fn shortest_path(&self, a: usize, b: usize, within: Option<&[usize]>)
        -> Option<Vec<usize>>
    {
        let allowed = |q: usize| within.map(|w| w.contains(&q)).unwrap_or(true);
        if !allowed(a) || !allowed(b) { return None; }
        let ia = self.index_of(a)?;
        let ib = self.index_of(b)?;
        let n = self.nodes.len();
        let mut prev: Vec<Option<usize>> = vec![None; n];
        let mut seen: Vec<bool> = vec![false; n];
        let mut queue: VecDeque<usize> = VecDeque::new();
        seen[ia] = true;
        queue.push_back(ia);
        while let Some(i) = queue.pop_front() {
            if i == ib { break; }
            for j in 0..n {
                if self.adj[(i, j)] && !seen[j] && allowed(self.nodes[j]) {
                    seen[j] = true;
                    prev[j] = Some(i);
                    queue.push_back(j);
                }
            }
        }
        if !seen[ib] { return None; }
        let mut path: Vec<usize> = vec![self.nodes[ib]];
        let mut cur = ib;
        while let Some(p) = prev[cur] {
            path.push(self.nodes[p]);
            cur = p;
        }
        path.reverse();
        Some(path)
    }

    /// Return `true` if `a` and `b` are connected by some path.
    pub fn is_connected(&self, a: usize, b: usize) -> bool {
        self.shortest_path(a, b, None).is_some()
    }

    /// Return `true` if the subgraph induced by `subset` is connected.
    pub fn subgraph_is_connected(&self, subset: &[usize]) -> bool {
        match subset.first() {
            None => true,
            Some(&a) => {
                subset.iter()
                    .all(|&b| self.shortest_path(a, b, Some(subset)).is_some())
            },
        }
    }
}

/// Qubits, connectivity, and native Clifford gates of a device.
///
/// Every single-qubit native gate is available on every qubit; every
/// two-qubit native gate is available on both orientations of every edge.
#[derive(Clone, Debug)]
pub struct ProcessorSpec {
    qubit_labels: Vec<usize>,
    graph: QubitGraph,
    gate_names: Vec<String>,
    gate_inverse: HashMap<String, String>,
    // shortest native sequence for each of the 24 single-qubit Cliffords
    one_qubit_compilations: Vec<Option<Vec<String>>>,
}

impl ProcessorSpec {
    /// Create a new device from its qubit labels, native gate names, and
    /// connectivity edges (all-to-all if `None`).
    ///
    /// Gate names must be known to the standard library; see
    /// [`standard_rep`].
    pub fn new<S>(
        qubit_labels: Vec<usize>,
        gate_names: &[S],
        edges: Option<&[(usize, usize)]>,
    ) -> RbResult<Self>
    where S: AsRef<str>
    {
        if let Some(q) = qubit_labels.iter().duplicates().next() {
            return Err(RbError::DuplicateQubit(*q));
        }
        let gate_names: Vec<String>
            = gate_names.iter()
            .map(|s| s.as_ref().to_string())
            .unique()
            .collect();
        let mut reps: Vec<&'static CliffordRep> = Vec::with_capacity(gate_names.len());
        for name in gate_names.iter() {
            let rep
                = standard_rep(name)
                .ok_or_else(|| RbError::UnknownGate(name.clone()))?;
            if rep.num_qubits() > 2 {
                return Err(RbError::UnknownGate(name.clone()));
            }
            reps.push(rep);
        }
        if let Some(q) = qubit_labels.first() {
            if !reps.iter().any(|r| r.num_qubits() == 1) {
                return Err(RbError::NoOneQubitGates(*q));
            }
        }
        let graph = match edges {
            Some(e) => QubitGraph::from_edges(qubit_labels.clone(), e)?,
            None => QubitGraph::all_to_all(qubit_labels.clone()),
        };

        let mut gate_inverse: HashMap<String, String> = HashMap::default();
        for (g, rg) in gate_names.iter().zip(&reps) {
            let inv
                = gate_names.iter().zip(&reps)
                .find(|(_, rh)| {
                    rh.num_qubits() == rg.num_qubits() && rg.compose(rh).is_identity()
                });
            if let Some((h, _)) = inv {
                gate_inverse.insert(g.clone(), h.clone());
            }
        }

        let one_qubit_compilations = Self::search_one_qubit(&gate_names, &reps);
        Ok(Self {
            qubit_labels,
            graph,
            gate_names,
            gate_inverse,
            one_qubit_compilations,
        })
    }

    // breadth-first search over products of native single-qubit gates
    fn search_one_qubit(names: &[String], reps: &[&'static CliffordRep])
        -> Vec<Option<Vec<String>>>
    {
        let natives: Vec<(&String, &CliffordRep)>
            = names.iter().zip(reps.iter().copied())
            .filter(|(_, r)| r.num_qubits() == 1)
            .collect();
        let cliffords = one_qubit_cliffords();
        let mut found: Vec<Option<Vec<String>>> = vec![None; cliffords.len()];
        found[0] = Some(Vec::new());
        let mut queue: VecDeque<(CliffordRep, Vec<String>)> = VecDeque::new();
        queue.push_back((CliffordRep::identity(1), Vec::new()));
        while let Some((rep, seq)) = queue.pop_front() {
            for (name, g) in natives.iter() {
                let next = rep.compose(g);
                if let Some(k) = cliffords.iter().position(|c| *c == next) {
                    if found[k].is_none() {
                        let mut next_seq = seq.clone();
                        next_seq.push((*name).clone());
                        found[k] = Some(next_seq.clone());
                        queue.push_back((next, next_seq));
                    }
                }
            }
        }
        found
    }

    /// Qubit labels.
    pub fn qubit_labels(&self) -> &[usize] { &self.qubit_labels }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize { self.qubit_labels.len() }

    /// The connectivity graph.
    pub fn graph(&self) -> &QubitGraph { &self.graph }

    /// Native gate names.
    pub fn gate_names(&self) -> &[String] { &self.gate_names }

    /// Representation of a native gate.
    pub fn rep(&self, name: &str) -> Option<&'static CliffordRep> {
        if self.gate_names.iter().any(|g| g == name) {
            standard_rep(name)
        } else {
            None
        }
    }

    /// Number of qubits a native gate acts on.
    pub fn arity(&self, name: &str) -> Option<usize> {
        self.rep(name).map(|r| r.num_qubits())
    }

    /// Map from each native gate name to the name of a native gate that
    /// inverts it, where one exists.
    pub fn gate_inverse(&self) -> &HashMap<String, String> { &self.gate_inverse }

    /// Native single-qubit gate names.
    pub fn one_qubit_gate_names(&self) -> Vec<&str> {
        self.gate_names.iter()
            .filter(|g| self.arity(g) == Some(1))
            .map(|g| g.as_str())
            .collect()
    }

    /// Native two-qubit gate names.
    pub fn two_qubit_gate_names(&self) -> Vec<&str> {
        self.gate_names.iter()
            .filter(|g| self.arity(g) == Some(2))
            .map(|g| g.as_str())
            .collect()
    }

    /// Return `true` if `q` is a device qubit.
    pub fn has_qubit(&self, q: usize) -> bool { self.qubit_labels.contains(&q) }

    /// Check that `qubits` is a duplicate-free list of device qubits.
    pub fn check_qubits(&self, qubits: &[usize]) -> RbResult<()> {
        if let Some(q) = qubits.iter().find(|q| !self.has_qubit(**q)) {
            return Err(RbError::UnknownQubit(*q));
        }
        if let Some(q) = qubits.iter().duplicates().next() {
            return Err(RbError::DuplicateQubit(*q));
        }
        Ok(())
    }

    /// Every native gate available on exactly the ordered qubits `qubits`.
    pub fn ops_on_qubits(&self, qubits: &[usize]) -> Vec<GateLabel> {
        match *qubits {
            [q] if self.has_qubit(q) => {
                self.one_qubit_gate_names().into_iter()
                    .map(|g| GateLabel::one(g, q))
                    .collect()
            },
            [a, b] if self.graph.has_edge(a, b) => {
                self.two_qubit_gate_names().into_iter()
                    .map(|g| GateLabel::two(g, a, b))
                    .collect()
            },
            _ => Vec::new(),
        }
    }

    /// Every native gate on every qubit and both orientations of every edge.
    pub fn primitive_ops(&self) -> Vec<GateLabel> {
        let one
            = self.qubit_labels.iter()
            .flat_map(|q| self.ops_on_qubits(&[*q]));
        let two
            = self.graph.edges().into_iter()
            .flat_map(|(a, b)| {
                let mut ops = self.ops_on_qubits(&[a, b]);
                ops.append(&mut self.ops_on_qubits(&[b, a]));
                ops
            });
        one.chain(two).collect()
    }

    /// Representation of a circuit of native gates, with qubits ordered as
    /// the circuit's line labels.
    ///
    /// *Panics* if the circuit contains a non-native gate.
    pub fn rep_of_circuit(&self, circuit: &Circuit) -> CliffordRep {
        symplectic_rep_of_clifford_circuit(circuit, |name| self.rep(name))
    }

    /// A shortest sequence of native gate names implementing the
    /// single-qubit Clifford `rep`, in time order.
    pub fn compile_one_qubit(&self, rep: &CliffordRep) -> RbResult<&[String]> {
        let k
            = one_qubit_cliffords().iter()
            .position(|c| c == rep)
            .ok_or_else(|| RbError::NotUniversal(format!("{:?}", rep)))?;
        self.one_qubit_compilations[k].as_deref()
            .ok_or_else(|| RbError::NotUniversal(one_qubit_clifford_name(k)))
    }

    /// Return an error unless every native gate has a native inverse.
    pub fn check_invertible(&self) -> RbResult<()> {
        match self.gate_names.iter().find(|g| !self.gate_inverse.contains_key(*g)) {
            Some(g) => Err(RbError::MissingInverse(g.clone())),
            None => Ok(()),
        }
    }

    /// The structural inverse of a native circuit: layers in reverse order
    /// with every gate replaced by its inverse.
    pub fn invert_circuit(&self, circuit: &Circuit) -> RbResult<Circuit> {
        if let Some(g) = circuit.gates().find(|g| !self.gate_inverse.contains_key(g.name())) {
            return Err(RbError::MissingInverse(g.name().to_string()));
        }
        let mut builder = circuit.to_builder();
        builder.reverse().map_names(&self.gate_inverse);
        Ok(builder.finalize())
    }
}
