//! Layered circuits over labeled qubit lines.
//!
//! A [`Circuit`] is immutable once built; all editing happens on a
//! [`CircuitBuilder`], which is turned into a circuit by
//! [`CircuitBuilder::finalize`]. Builders consume circuits only by reference,
//! so an existing circuit is never changed by building a new one from it.

use std::fmt;
use rustc_hash::FxHashMap as HashMap;
use crate::gate::GateLabel;

/// A set of gates acting on pairwise disjoint qubits at the same time step.
///
/// Qubits not touched by any gate idle. An empty layer is a pure idle.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Layer(Vec<GateLabel>);

impl IntoIterator for Layer {
    type Item = GateLabel;
    type IntoIter = <Vec<GateLabel> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

impl<'a> IntoIterator for &'a Layer {
    type Item = &'a GateLabel;
    type IntoIter = <&'a Vec<GateLabel> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter { self.0.iter() }
}

impl FromIterator<GateLabel> for Layer {
    fn from_iter<I>(iter: I) -> Self
    where I: IntoIterator<Item = GateLabel>
    {
        let mut layer = Self::idle();
        iter.into_iter().for_each(|g| { layer.push(g); });
        layer
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        let n = self.0.len();
        for (k, g) in self.0.iter().enumerate() {
            write!(f, "{}", g)?;
            if k < n - 1 { write!(f, " ")?; }
        }
        write!(f, "]")
    }
}

impl Layer {
    /// Create a layer from a list of gates.
    ///
    /// *Panics* if two gates share a qubit.
    pub fn new(gates: Vec<GateLabel>) -> Self { gates.into_iter().collect() }

    /// An empty (idle) layer.
    pub fn idle() -> Self { Self(Vec::new()) }

    /// Add a gate.
    ///
    /// *Panics* if the gate shares a qubit with one already present.
    pub fn push(&mut self, gate: GateLabel) -> &mut Self {
        if let Some(q) = gate.qubits().iter().find(|q| self.acts_on(**q)) {
            panic!("Layer::push: qubit {} is already acted on", q);
        }
        self.0.push(gate);
        self
    }

    /// Return `true` if no gate acts on `q`.
    pub fn is_free(&self, q: usize) -> bool { !self.acts_on(q) }

    /// Return `true` if some gate acts on `q`.
    pub fn acts_on(&self, q: usize) -> bool {
        self.0.iter().any(|g| g.acts_on(q))
    }

    /// The gates in the layer.
    pub fn gates(&self) -> &[GateLabel] { &self.0 }

    /// Iterate over the gates.
    pub fn iter(&self) -> std::slice::Iter<'_, GateLabel> { self.0.iter() }

    /// Number of gates.
    pub fn len(&self) -> usize { self.0.len() }

    /// Return `true` if the layer holds no gates.
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// All qubits acted on.
    pub fn qubits(&self) -> Vec<usize> {
        self.0.iter().flat_map(|g| g.qubits().iter().copied()).collect()
    }

    /// Number of gates acting on two or more qubits.
    pub fn two_qubit_gate_count(&self) -> usize {
        self.0.iter().filter(|g| g.arity() >= 2).count()
    }

    /// Return `true` if every qubit in `qubits` is acted on by exactly one
    /// gate and no gate acts outside of `qubits`.
    pub fn is_complete_on(&self, qubits: &[usize]) -> bool {
        let acted = self.qubits();
        acted.len() == qubits.len()
            && qubits.iter().all(|q| acted.contains(q))
    }

    /// Drop every gate touching `q`.
    fn remove_qubit(&mut self, q: usize) {
        self.0.retain(|g| !g.acts_on(q));
    }
}

/// An immutable sequence of [`Layer`]s over a set of labeled lines.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Circuit {
    layers: Vec<Layer>,
    line_labels: Vec<usize>,
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for layer in self.layers.iter() {
            write!(f, "{}", layer)?;
        }
        write!(f, "@(")?;
        let n = self.line_labels.len();
        for (k, q) in self.line_labels.iter().enumerate() {
            write!(f, "{}", q)?;
            if k < n - 1 { write!(f, ",")?; }
        }
        write!(f, ")")
    }
}

fn check_lines(layers: &[Layer], line_labels: &[usize]) {
    for layer in layers.iter() {
        if let Some(q) = layer.qubits().into_iter().find(|q| !line_labels.contains(q)) {
            panic!("circuit layer {} acts on qubit {} outside its lines", layer, q);
        }
    }
}

impl Circuit {
    /// Create a new circuit.
    ///
    /// *Panics* if a gate acts on a qubit that is not a line label.
    pub fn new(layers: Vec<Layer>, line_labels: Vec<usize>) -> Self {
        check_lines(&layers, &line_labels);
        Self { layers, line_labels }
    }

    /// A depth-zero circuit on the given lines.
    pub fn empty(line_labels: Vec<usize>) -> Self {
        Self { layers: Vec::new(), line_labels }
    }

    /// Pack a sequence of gates into layers, placing each gate in the
    /// earliest layer after every earlier gate sharing one of its qubits.
    pub fn parallelize<I>(gates: I, line_labels: Vec<usize>) -> Self
    where I: IntoIterator<Item = GateLabel>
    {
        let mut frontier: HashMap<usize, usize> = HashMap::default();
        let mut layers: Vec<Layer> = Vec::new();
        for gate in gates.into_iter() {
            let t: usize
                = gate.qubits().iter()
                .map(|q| frontier.get(q).copied().unwrap_or(0))
                .max()
                .unwrap_or(0);
            if t == layers.len() { layers.push(Layer::idle()); }
            gate.qubits().iter().for_each(|q| { frontier.insert(*q, t + 1); });
            layers[t].push(gate);
        }
        Self::new(layers, line_labels)
    }

    /// Number of layers.
    pub fn depth(&self) -> usize { self.layers.len() }

    /// The layers.
    pub fn layers(&self) -> &[Layer] { &self.layers }

    /// The `k`-th layer, if it exists.
    pub fn layer(&self, k: usize) -> Option<&Layer> { self.layers.get(k) }

    /// The line labels, in register order.
    pub fn line_labels(&self) -> &[usize] { &self.line_labels }

    /// Number of lines.
    pub fn num_lines(&self) -> usize { self.line_labels.len() }

    /// Iterate over every gate, layer by layer.
    pub fn gates(&self) -> impl Iterator<Item = &GateLabel> + '_ {
        self.layers.iter().flat_map(|l| l.iter())
    }

    /// Total number of gates.
    pub fn size(&self) -> usize { self.layers.iter().map(|l| l.len()).sum() }

    /// Number of gates acting on two or more qubits.
    pub fn two_qubit_gate_count(&self) -> usize {
        self.layers.iter().map(|l| l.two_qubit_gate_count()).sum()
    }

    /// Start a builder from a copy of `self`.
    pub fn to_builder(&self) -> CircuitBuilder {
        CircuitBuilder {
            layers: self.layers.clone(),
            line_labels: self.line_labels.clone(),
        }
    }
}

/// A mutable circuit under construction.
///
/// Methods return `&mut Self` so edits can be chained.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CircuitBuilder {
    layers: Vec<Layer>,
    line_labels: Vec<usize>,
}

impl From<Circuit> for CircuitBuilder {
    fn from(circuit: Circuit) -> Self {
        Self { layers: circuit.layers, line_labels: circuit.line_labels }
    }
}

impl CircuitBuilder {
    /// Create an empty builder on the given lines.
    pub fn new(line_labels: Vec<usize>) -> Self {
        Self { layers: Vec::new(), line_labels }
    }

    /// Current number of layers.
    pub fn depth(&self) -> usize { self.layers.len() }

    /// The line labels.
    pub fn line_labels(&self) -> &[usize] { &self.line_labels }

    /// The current layers.
    pub fn layers(&self) -> &[Layer] { &self.layers }

    /// Insert a layer before position `pos` (`pos == depth` appends).
    ///
    /// *Panics* if `pos` is out of range or the layer acts outside the
    /// lines.
    pub fn insert_layer(&mut self, layer: Layer, pos: usize) -> &mut Self {
        if pos > self.layers.len() {
            panic!("CircuitBuilder::insert_layer: position {} out of range", pos);
        }
        check_lines(std::slice::from_ref(&layer), &self.line_labels);
        self.layers.insert(pos, layer);
        self
    }

    /// Append a layer.
    pub fn append_layer(&mut self, layer: Layer) -> &mut Self {
        let pos = self.layers.len();
        self.insert_layer(layer, pos)
    }

    /// Remove the layer at `pos`.
    pub fn delete_layer(&mut self, pos: usize) -> &mut Self {
        if pos >= self.layers.len() {
            panic!("CircuitBuilder::delete_layer: position {} out of range", pos);
        }
        self.layers.remove(pos);
        self
    }

    /// Insert every layer of `circuit` before position `pos`.
    ///
    /// The circuit's lines must be a subset of this builder's lines.
    pub fn insert_circuit(&mut self, circuit: &Circuit, pos: usize) -> &mut Self {
        if pos > self.layers.len() {
            panic!("CircuitBuilder::insert_circuit: position {} out of range", pos);
        }
        check_lines(&circuit.layers, &self.line_labels);
        self.layers.splice(pos..pos, circuit.layers.iter().cloned());
        self
    }

    /// Append every layer of `circuit`.
    pub fn append_circuit(&mut self, circuit: &Circuit) -> &mut Self {
        let pos = self.layers.len();
        self.insert_circuit(circuit, pos)
    }

    /// Prepend every layer of `circuit`.
    pub fn prefix_circuit(&mut self, circuit: &Circuit) -> &mut Self {
        self.insert_circuit(circuit, 0)
    }

    /// Run `circuit` in parallel on its own lines, padding the shorter of the
    /// two with idle layers.
    ///
    /// *Panics* if the lines overlap.
    pub fn tensor_circuit(&mut self, circuit: &Circuit) -> &mut Self {
        if let Some(q) = circuit.line_labels.iter().find(|q| self.line_labels.contains(q)) {
            panic!("CircuitBuilder::tensor_circuit: line {} is shared", q);
        }
        self.line_labels.extend(circuit.line_labels.iter().copied());
        if circuit.depth() > self.layers.len() {
            self.layers.resize(circuit.depth(), Layer::idle());
        }
        for (layer, other) in self.layers.iter_mut().zip(circuit.layers.iter()) {
            other.iter().cloned().for_each(|g| { layer.push(g); });
        }
        self
    }

    /// Reverse the layer order.
    pub fn reverse(&mut self) -> &mut Self {
        self.layers.reverse();
        self
    }

    /// Rename gates according to `map`, leaving unmapped names unchanged.
    pub fn map_names(&mut self, map: &HashMap<String, String>) -> &mut Self {
        for layer in self.layers.iter_mut() {
            for gate in layer.0.iter_mut() {
                if let Some(new) = map.get(gate.name()) {
                    *gate = gate.renamed(new.as_str());
                }
            }
        }
        self
    }

    /// Remove every gate touching line `q`, keeping the line itself.
    pub fn replace_with_idling_line(&mut self, q: usize) -> &mut Self {
        self.layers.iter_mut().for_each(|layer| layer.remove_qubit(q));
        self
    }

    /// Drop every layer past `depth`.
    pub fn truncate(&mut self, depth: usize) -> &mut Self {
        self.layers.truncate(depth);
        self
    }

    /// Repeat the current layers end to end until there are at least `depth`
    /// of them, then truncate to exactly `depth`.
    ///
    /// *Panics* if the builder is empty and `depth` is nonzero.
    pub fn repeat_to_depth(&mut self, depth: usize) -> &mut Self {
        if self.layers.is_empty() {
            if depth == 0 { return self; }
            panic!("CircuitBuilder::repeat_to_depth: cannot repeat an empty circuit");
        }
        let unit = self.layers.clone();
        while self.layers.len() < depth {
            self.layers.extend(unit.iter().cloned());
        }
        self.layers.truncate(depth);
        self
    }

    /// Finish building.
    pub fn finalize(self) -> Circuit {
        Circuit { layers: self.layers, line_labels: self.line_labels }
    }
}
