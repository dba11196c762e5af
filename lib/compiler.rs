//! Compilation of Clifford representations into native-gate circuits.
//!
//! [`SynthesisCompiler`] reduces the symplectic matrix of the target to the
//! identity with Hadamard, phase, CNOT, and swap row operations, taking the
//! qubits as pivots in a random order. The recorded operations, read
//! backwards, implement the target up to a Pauli, which is then fixed with a
//! final layer of single-qubit gates. Several random pivot orders are tried
//! and the cheapest result under a [`CostFunction`] is kept.
//!
//! Every circuit returned is checked against its target before it leaves the
//! compiler.

use nalgebra::DMatrix;
use rand::{ Rng, seq::SliceRandom };
use tracing::debug;
use crate::{
    circuit::Circuit,
    device::ProcessorSpec,
    error::{ RbError, RbResult },
    gate::{ Gate, GateLabel, Pauli, standard_rep },
    stabilizer::StabilizerState,
    symplectic::CliffordRep,
};

/// Figure of merit minimized over compilation candidates.
#[derive(Copy, Clone, Debug)]
pub enum CostFunction {
    /// Number of gates acting on two or more qubits.
    TwoQubitGates,
    /// Circuit depth.
    Depth,
    /// Any other measure.
    Custom(fn(&Circuit) -> usize),
}

impl CostFunction {
    /// Evaluate the cost of a circuit.
    pub fn cost(&self, circuit: &Circuit) -> usize {
        match self {
            Self::TwoQubitGates => circuit.two_qubit_gate_count(),
            Self::Depth => circuit.depth(),
            Self::Custom(f) => f(circuit),
        }
    }
}

/// Turns Clifford representations on a subset of a device's qubits into
/// circuits of that device's native gates.
///
/// In all methods, `rep` acts on `qubits.len()` qubits, ordered as `qubits`,
/// and the returned circuit has `qubits` as its line labels.
pub trait Compiler {
    /// Compile a circuit implementing `rep` exactly.
    fn compile_clifford<R>(
        &self,
        rep: &CliffordRep,
        pspec: &ProcessorSpec,
        qubits: &[usize],
        rng: &mut R,
    ) -> RbResult<Circuit>
    where R: Rng + ?Sized;

    /// Compile a circuit mapping ∣0...0⟩ to the state `rep` maps ∣0...0⟩ to,
    /// up to global phase.
    fn compile_stabilizer_state<R>(
        &self,
        rep: &CliffordRep,
        pspec: &ProcessorSpec,
        qubits: &[usize],
        rng: &mut R,
    ) -> RbResult<Circuit>
    where R: Rng + ?Sized;

    /// Compile a circuit mapping the state `rep` maps ∣0...0⟩ to back to
    /// ∣0...0⟩, up to global phase.
    fn compile_stabilizer_measurement<R>(
        &self,
        rep: &CliffordRep,
        pspec: &ProcessorSpec,
        qubits: &[usize],
        rng: &mut R,
    ) -> RbResult<Circuit>
    where R: Rng + ?Sized;
}

/// Randomized elimination compiler.
#[derive(Copy, Clone, Debug)]
pub struct SynthesisCompiler {
    /// Number of random pivot orders to try.
    pub iterations: usize,
    /// Cost used to pick among candidates.
    pub cost: CostFunction,
}

impl Default for SynthesisCompiler {
    fn default() -> Self {
        Self { iterations: 20, cost: CostFunction::TwoQubitGates }
    }
}

impl SynthesisCompiler {
    /// Create a new compiler.
    ///
    /// *Panics* if `iterations` is zero.
    pub fn new(iterations: usize, cost: CostFunction) -> Self {
        if iterations == 0 {
            panic!("SynthesisCompiler: iterations must be at least 1");
        }
        Self { iterations, cost }
    }

    // run `build` on random pivot orders and keep the cheapest result
    fn best_of<R, F>(&self, n: usize, rng: &mut R, mut build: F)
        -> RbResult<Circuit>
    where
        R: Rng + ?Sized,
        F: FnMut(&[usize]) -> RbResult<Circuit>,
    {
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);
        let mut best = build(&order)?;
        let mut best_cost = self.cost.cost(&best);
        for _ in 1..self.iterations {
            order.shuffle(rng);
            let candidate = build(&order)?;
            let cost = self.cost.cost(&candidate);
            if cost < best_cost {
                best = candidate;
                best_cost = cost;
            }
        }
        debug!(
            qubits = n,
            cost = best_cost,
            depth = best.depth(),
            size = best.size(),
            "compiled candidate selected",
        );
        Ok(best)
    }
}

fn check_target(rep: &CliffordRep, pspec: &ProcessorSpec, qubits: &[usize])
    -> RbResult<()>
{
    pspec.check_qubits(qubits)?;
    if rep.num_qubits() != qubits.len() {
        return Err(RbError::SizeMismatch {
            rep: rep.num_qubits(),
            qubits: qubits.len(),
        });
    }
    Ok(())
}

impl Compiler for SynthesisCompiler {
    fn compile_clifford<R>(
        &self,
        rep: &CliffordRep,
        pspec: &ProcessorSpec,
        qubits: &[usize],
        rng: &mut R,
    ) -> RbResult<Circuit>
    where R: Rng + ?Sized
    {
        check_target(rep, pspec, qubits)?;
        let circuit = self.best_of(qubits.len(), rng, |order| {
            let ops = reduce_full(rep.s(), order);
            let mut natives = to_native(ops.iter().rev(), pspec, qubits)?;
            let raw = Circuit::parallelize(natives.clone(), qubits.to_vec());
            let (x, z) = pspec.rep_of_circuit(&raw).pauli_correction(rep);
            natives.append(&mut pauli_gates(pspec, qubits, &x, &z)?);
            Ok(Circuit::parallelize(natives, qubits.to_vec()))
        })?;
        assert_eq!(
            &pspec.rep_of_circuit(&circuit), rep,
            "compiled circuit does not implement the target Clifford",
        );
        Ok(circuit)
    }

    fn compile_stabilizer_state<R>(
        &self,
        rep: &CliffordRep,
        pspec: &ProcessorSpec,
        qubits: &[usize],
        rng: &mut R,
    ) -> RbResult<Circuit>
    where R: Rng + ?Sized
    {
        check_target(rep, pspec, qubits)?;
        let circuit = self.best_of(qubits.len(), rng, |order| {
            let ops = reduce_state(rep.s(), order);
            let unprep = to_native(ops.iter().rev(), pspec, qubits)?;
            let raw = Circuit::parallelize(unprep.clone(), qubits.to_vec());
            let inv = pspec.rep_of_circuit(&raw).inverse();
            let flips
                = StabilizerState::from_rep(rep.compose(&inv))
                .deterministic_outcome();
            let mut natives
                = pauli_gates(pspec, qubits, &flips, &vec![0; qubits.len()])?;
            natives.extend(unprep);
            Ok(Circuit::parallelize(natives, qubits.to_vec()))
        })?;
        let prepared = StabilizerState::from_rep(pspec.rep_of_circuit(&circuit));
        assert!(
            prepared.same_state(&StabilizerState::from_rep(rep.clone())),
            "compiled circuit does not prepare the target state",
        );
        Ok(circuit)
    }

    fn compile_stabilizer_measurement<R>(
        &self,
        rep: &CliffordRep,
        pspec: &ProcessorSpec,
        qubits: &[usize],
        rng: &mut R,
    ) -> RbResult<Circuit>
    where R: Rng + ?Sized
    {
        check_target(rep, pspec, qubits)?;
        let circuit = self.best_of(qubits.len(), rng, |order| {
            let ops = reduce_state(rep.s(), order);
            let mut natives = to_native(ops.iter(), pspec, qubits)?;
            let raw = Circuit::parallelize(natives.clone(), qubits.to_vec());
            let flips
                = StabilizerState::from_rep(rep.compose(&pspec.rep_of_circuit(&raw)))
                .deterministic_outcome();
            natives.append(
                &mut pauli_gates(pspec, qubits, &flips, &vec![0; qubits.len()])?);
            Ok(Circuit::parallelize(natives, qubits.to_vec()))
        })?;
        let out
            = StabilizerState::from_rep(rep.compose(&pspec.rep_of_circuit(&circuit)))
            .deterministic_outcome();
        assert!(
            out.iter().all(|b| *b == 0),
            "compiled circuit does not map the target state to all zeros",
        );
        Ok(circuit)
    }
}

/// Native gates implementing single-qubit Cliffords on the given qubits, one
/// per entry of `reps`, returned as a parallelized circuit over `qubits`.
pub fn compile_one_qubit_layer(
    pspec: &ProcessorSpec,
    qubits: &[usize],
    reps: &[(usize, &CliffordRep)],
) -> RbResult<Circuit>
{
    let mut gates: Vec<GateLabel> = Vec::new();
    for (q, rep) in reps.iter() {
        gates.extend(
            pspec.compile_one_qubit(rep)?.iter().map(|g| GateLabel::one(g.as_str(), *q)));
    }
    Ok(Circuit::parallelize(gates, qubits.to_vec()))
}

// native gates for X^x Z^z on the register `qubits`
fn pauli_gates(pspec: &ProcessorSpec, qubits: &[usize], x: &[u8], z: &[u8])
    -> RbResult<Vec<GateLabel>>
{
    let mut gates: Vec<GateLabel> = Vec::new();
    for (k, q) in qubits.iter().enumerate() {
        let pauli = Pauli::from_bits(x[k], z[k]);
        if pauli == Pauli::I { continue; }
        gates.extend(
            pspec.compile_one_qubit(&pauli.rep())?.iter()
                .map(|g| GateLabel::one(g.as_str(), *q))
        );
    }
    Ok(gates)
}

// row-operation elimination of a symplectic matrix
struct Reduction {
    s: DMatrix<u8>,
    n: usize,
    ops: Vec<Gate>,
}

impl Reduction {
    fn new(s: &DMatrix<u8>) -> Self {
        Self { s: s.clone(), n: s.nrows() / 2, ops: Vec::new() }
    }

    fn xor_row(&mut self, dst: usize, src: usize) {
        for j in 0..2 * self.n {
            let v = self.s[(src, j)];
            self.s[(dst, j)] ^= v;
        }
    }

    // left-multiply by the symplectic matrix of `gate`
    fn apply(&mut self, gate: Gate) {
        let n = self.n;
        match gate {
            Gate::H(q) => { self.s.swap_rows(q, n + q); },
            Gate::S(q) => { self.xor_row(n + q, q); },
            Gate::CX(c, t) => {
                self.xor_row(t, c);
                self.xor_row(n + c, n + t);
            },
            Gate::Swap(a, b) => {
                self.s.swap_rows(a, b);
                self.s.swap_rows(n + a, n + b);
            },
        }
        self.ops.push(gate);
    }

    // reduce column `col` to a single X on one of `rest`, returning it
    fn clear(&mut self, col: usize, rest: &[usize]) -> usize {
        let n = self.n;
        for &j in rest.iter() {
            if self.s[(n + j, col)] == 1 && self.s[(j, col)] == 0 {
                self.apply(Gate::H(j));
            }
        }
        for &j in rest.iter() {
            if self.s[(n + j, col)] == 1 && self.s[(j, col)] == 1 {
                self.apply(Gate::S(j));
            }
        }
        let mut idx: Vec<usize>
            = rest.iter().copied()
            .filter(|&j| self.s[(j, col)] == 1)
            .collect();
        assert!(!idx.is_empty(), "symplectic reduction: column {} vanished", col);
        while idx.len() > 1 {
            idx = idx.chunks(2)
                .map(|pair| {
                    if let [c, t] = *pair { self.apply(Gate::CX(c, t)); }
                    pair[0]
                })
                .collect();
        }
        idx[0]
    }

    fn is_unit_column(&self, col: usize) -> bool {
        (0..2 * self.n).all(|i| self.s[(i, col)] == u8::from(i == col))
    }
}

// operations taking `s` to the identity
fn reduce_full(s: &DMatrix<u8>, order: &[usize]) -> Vec<Gate> {
    let mut r = Reduction::new(s);
    let n = r.n;
    for (step, &k) in order.iter().enumerate() {
        let rest = &order[step..];
        let j = r.clear(k, rest);
        if j != k { r.apply(Gate::Swap(j, k)); }
        if !r.is_unit_column(n + k) {
            r.apply(Gate::H(k));
            let j = r.clear(n + k, rest);
            assert_eq!(j, k, "symplectic reduction: partner column misplaced");
            r.apply(Gate::H(k));
        }
    }
    assert!(
        r.s == DMatrix::identity(2 * n, 2 * n),
        "symplectic reduction did not reach the identity",
    );
    r.ops
}

// operations taking every stabilizer column of `s` to a product of Zs
fn reduce_state(s: &DMatrix<u8>, order: &[usize]) -> Vec<Gate> {
    let mut r = Reduction::new(s);
    let n = r.n;
    for (step, &k) in order.iter().enumerate() {
        let rest = &order[step..];
        let j = r.clear(n + k, rest);
        if j != k { r.apply(Gate::Swap(j, k)); }
        r.apply(Gate::H(k));
    }
    assert!(
        r.s.view((0, n), (n, n)).iter().all(|b| *b == 0),
        "stabilizer reduction left X components",
    );
    r.ops
}

fn one_qubit_natives(pspec: &ProcessorSpec, name: &str, q: usize)
    -> RbResult<Vec<GateLabel>>
{
    let rep
        = standard_rep(name)
        .ok_or_else(|| RbError::UnknownGate(name.to_string()))?;
    Ok(
        pspec.compile_one_qubit(rep)?.iter()
            .map(|g| GateLabel::one(g.as_str(), q))
            .collect()
    )
}

fn has_native(pspec: &ProcessorSpec, name: &str) -> bool {
    pspec.gate_names().iter().any(|g| g == name)
}

// CNOT between adjacent qubits
fn native_cx(pspec: &ProcessorSpec, c: usize, t: usize) -> RbResult<Vec<GateLabel>> {
    if has_native(pspec, "Gcnot") {
        Ok(vec![GateLabel::two("Gcnot", c, t)])
    } else if has_native(pspec, "Gcphase") {
        let mut gates = one_qubit_natives(pspec, "Gh", t)?;
        gates.push(GateLabel::two("Gcphase", c, t));
        gates.append(&mut one_qubit_natives(pspec, "Gh", t)?);
        Ok(gates)
    } else {
        Err(RbError::NoEntanglingGate(c, t))
    }
}

// swap between adjacent qubits
fn native_swap(pspec: &ProcessorSpec, a: usize, b: usize) -> RbResult<Vec<GateLabel>> {
    if has_native(pspec, "Gswap") {
        return Ok(vec![GateLabel::two("Gswap", a, b)]);
    }
    let mut gates = native_cx(pspec, a, b)?;
    gates.append(&mut native_cx(pspec, b, a)?);
    gates.append(&mut native_cx(pspec, a, b)?);
    Ok(gates)
}

// CNOT between any two qubits connected within `qubits`, moving the control
// next to the target with swaps and back again
fn routed_cx(pspec: &ProcessorSpec, qubits: &[usize], c: usize, t: usize)
    -> RbResult<Vec<GateLabel>>
{
    if pspec.graph().has_edge(c, t) { return native_cx(pspec, c, t); }
    let path
        = pspec.graph().shortest_path(c, t, Some(qubits))
        .ok_or(RbError::NoEntanglingGate(c, t))?;
    let hops = path.len() - 1;
    let mut gates: Vec<GateLabel> = Vec::new();
    for w in path[..hops].windows(2) {
        gates.append(&mut native_swap(pspec, w[0], w[1])?);
    }
    gates.append(&mut native_cx(pspec, path[hops - 1], t)?);
    let mut undo: Vec<GateLabel> = Vec::new();
    for w in path[..hops].windows(2).rev() {
        undo.append(&mut native_swap(pspec, w[0], w[1])?);
    }
    gates.append(&mut undo);
    Ok(gates)
}

// map elimination operations on register positions to native gates on labels
fn to_native<'a, I>(ops: I, pspec: &ProcessorSpec, qubits: &[usize])
    -> RbResult<Vec<GateLabel>>
where I: Iterator<Item = &'a Gate>
{
    let mut gates: Vec<GateLabel> = Vec::new();
    for op in ops {
        match *op {
            Gate::H(k) => gates.append(&mut one_qubit_natives(pspec, "Gh", qubits[k])?),
            Gate::S(k) => gates.append(&mut one_qubit_natives(pspec, "Gp", qubits[k])?),
            Gate::CX(c, t) => {
                gates.append(&mut routed_cx(pspec, qubits, qubits[c], qubits[t])?);
            },
            Gate::Swap(a, b) => {
                let (a, b) = (qubits[a], qubits[b]);
                if pspec.graph().has_edge(a, b) {
                    gates.append(&mut native_swap(pspec, a, b)?);
                } else {
                    gates.append(&mut routed_cx(pspec, qubits, a, b)?);
                    gates.append(&mut routed_cx(pspec, qubits, b, a)?);
                    gates.append(&mut routed_cx(pspec, qubits, a, b)?);
                }
            },
        }
    }
    Ok(gates)
}
