//! Randomized benchmarking circuit builders.
//!
//! Every builder samples its core layers, computes whatever inversion it
//! needs from the symplectic representation of what it has built so far,
//! compiles that inversion, and checks the assembled circuit against the
//! algebra before returning it together with its ideal outcome. A failed
//! check panics: it means the algebra or the compiler is broken, not the
//! caller's input.

use rand::Rng;
use tracing::debug;
use crate::{
    circuit::{ Circuit, CircuitBuilder, Layer },
    compiler::{ Compiler, compile_one_qubit_layer },
    device::ProcessorSpec,
    error::{ RbError, RbResult },
    gate::{ Pauli, one_qubit_cliffords },
    sampler::{ Local, QElimination, Sampler },
    stabilizer::{
        StabilizerState,
        apply_clifford_to_stabilizer_state,
        prep_stabilizer_state,
    },
    symplectic::{ CliffordRep, random_clifford, random_phase_vector },
};

/// A benchmarking circuit together with its error-free outcome.
#[derive(Clone, Debug, PartialEq)]
pub struct RbCircuit<O = Vec<u8>> {
    pub circuit: Circuit,
    /// Ideal outcome, ordered as the circuit's lines (or, for simultaneous
    /// circuits, by subset and then by qubit within each subset).
    pub ideal_out: O,
}

/// A disjoint partition of (some of) a device's qubits into subsets that are
/// benchmarked simultaneously.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Structure {
    /// Every device qubit on its own.
    #[default]
    OneQubit,
    /// Explicit subsets.
    Subsets(Vec<Vec<usize>>),
}

impl Structure {
    /// Expand into explicit subsets, checking that they are non-empty,
    /// disjoint, and made of device qubits.
    pub fn resolve(&self, pspec: &ProcessorSpec) -> RbResult<Vec<Vec<usize>>> {
        match self {
            Self::OneQubit => {
                Ok(pspec.qubit_labels().iter().map(|q| vec![*q]).collect())
            },
            Self::Subsets(subsets) => {
                if subsets.is_empty() {
                    return Err(RbError::InvalidStructure("no subsets".to_string()));
                }
                if subsets.iter().any(|s| s.is_empty()) {
                    return Err(RbError::InvalidStructure("empty subset".to_string()));
                }
                let all: Vec<usize> = subsets.iter().flatten().copied().collect();
                pspec.check_qubits(&all)?;
                Ok(subsets.clone())
            },
        }
    }
}

pub(crate) fn subset_or_all(pspec: &ProcessorSpec, qubits: Option<&[usize]>)
    -> RbResult<Vec<usize>>
{
    match qubits {
        Some([]) => Err(RbError::InvalidStructure("empty qubit subset".to_string())),
        Some(q) => {
            pspec.check_qubits(q)?;
            Ok(q.to_vec())
        },
        None => Ok(pspec.qubit_labels().to_vec()),
    }
}

/// Evolve ∣0...0⟩ through `rep` and read off the deterministic outcome.
///
/// *Panics* if any qubit's outcome is random.
pub(crate) fn ideal_outcome(rep: &CliffordRep) -> Vec<u8> {
    let input = prep_stabilizer_state(rep.num_qubits(), None);
    apply_clifford_to_stabilizer_state(rep, &input).deterministic_outcome()
}

fn check_all_zero(out: &[u8], what: &str) {
    assert!(
        out.iter().all(|b| *b == 0),
        "{}: ideal output {:?} is not the all-zeros basis state", what, out,
    );
}

/// Sample a random circuit of `length` layers from `sampler`.
///
/// If `local` is given, the circuit instead has `2 * length + 1` layers,
/// alternating between single-qubit layers drawn from `local` (at even
/// positions) and layers drawn from `sampler`.
pub fn random_circuit<R>(
    pspec: &ProcessorSpec,
    length: usize,
    qubits: Option<&[usize]>,
    sampler: &Sampler,
    local: Option<&Local>,
    rng: &mut R,
) -> RbResult<Circuit>
where R: Rng + ?Sized
{
    let qubits = subset_or_all(pspec, qubits)?;
    let mut builder = CircuitBuilder::new(qubits.clone());
    match local.cloned().map(Sampler::Local) {
        None => {
            for _ in 0..length {
                builder.append_layer(sampler.sample_layer(pspec, Some(&qubits), rng)?);
            }
        },
        Some(local) => {
            for i in 0..2 * length + 1 {
                let layer
                    = if i % 2 == 0 {
                        local.sample_layer(pspec, Some(&qubits), rng)?
                    } else {
                        sampler.sample_layer(pspec, Some(&qubits), rng)?
                    };
                builder.append_layer(layer);
            }
        },
    }
    Ok(builder.finalize())
}

/// Random circuits on each subset of `structure`, run side by side.
///
/// `lengths` holds either one length for every subset or one per subset. The
/// ideal outcome is the probability of measuring 1 on each qubit, grouped by
/// subset.
pub fn simultaneous_random_circuit<R>(
    pspec: &ProcessorSpec,
    lengths: &[usize],
    structure: &Structure,
    sampler: &Sampler,
    local: Option<&Local>,
    rng: &mut R,
) -> RbResult<RbCircuit<Vec<Vec<f64>>>>
where R: Rng + ?Sized
{
    let subsets = structure.resolve(pspec)?;
    let lengths: Vec<usize>
        = match lengths {
            [] => return Err(RbError::Empty("circuit lengths")),
            [l] => vec![*l; subsets.len()],
            ls if ls.len() == subsets.len() => ls.to_vec(),
            ls => {
                return Err(RbError::InvalidStructure(format!(
                    "{} lengths given for {} subsets", ls.len(), subsets.len())));
            },
        };
    let mut builder = CircuitBuilder::new(Vec::new());
    for (subset, length) in subsets.iter().zip(lengths) {
        let sub = random_circuit(pspec, length, Some(subset), sampler, local, rng)?;
        builder.tensor_circuit(&sub);
    }
    let circuit = builder.finalize();
    let state
        = apply_clifford_to_stabilizer_state(
            &pspec.rep_of_circuit(&circuit),
            &prep_stabilizer_state(circuit.num_lines(), None),
        );
    let ideal_out = subset_outcomes(&circuit, &subsets, |q| state.measure_z(q).prob_one());
    Ok(RbCircuit { circuit, ideal_out })
}

// per-subset values of `f` at each qubit's line index
fn subset_outcomes<T, F>(circuit: &Circuit, subsets: &[Vec<usize>], f: F) -> Vec<Vec<T>>
where F: Fn(usize) -> T
{
    let lines = circuit.line_labels();
    subsets.iter()
        .map(|subset| {
            subset.iter()
                .map(|q| {
                    let k = lines.iter().position(|l| l == q)
                        .expect("subset qubit is a circuit line");
                    f(k)
                })
                .collect()
        })
        .collect()
}

/// A layer of uniformly random Paulis on `qubits` (every device qubit if
/// `None`), compiled into native gates.
///
/// Identity Paulis compile to nothing, so the result may have depth zero;
/// with `keep_idle`, such a circuit gets a single idle layer instead.
pub fn pauli_layer_as_compiled_circuit<R>(
    pspec: &ProcessorSpec,
    qubits: Option<&[usize]>,
    keep_idle: bool,
    rng: &mut R,
) -> RbResult<Circuit>
where R: Rng + ?Sized
{
    let qubits = subset_or_all(pspec, qubits)?;
    let reps: Vec<CliffordRep>
        = Pauli::gen_nqubitd(qubits.len(), rng).into_iter()
        .map(|p| p.rep())
        .collect();
    let targets: Vec<(usize, &CliffordRep)>
        = qubits.iter().copied().zip(reps.iter()).collect();
    let circuit = compile_one_qubit_layer(pspec, &qubits, &targets)?;
    if keep_idle && circuit.depth() == 0 {
        let mut builder = circuit.to_builder();
        builder.append_layer(Layer::idle());
        Ok(builder.finalize())
    } else {
        Ok(circuit)
    }
}

/// A layer of uniformly random single-qubit Cliffords on `qubits` (every
/// device qubit if `None`), compiled into native gates.
pub fn one_qubit_clifford_layer_as_compiled_circuit<R>(
    pspec: &ProcessorSpec,
    qubits: Option<&[usize]>,
    rng: &mut R,
) -> RbResult<Circuit>
where R: Rng + ?Sized
{
    let qubits = subset_or_all(pspec, qubits)?;
    let cliffords = one_qubit_cliffords();
    let targets: Vec<(usize, &CliffordRep)>
        = qubits.iter()
        .map(|q| (*q, &cliffords[rng.gen_range(0..cliffords.len())]))
        .collect();
    compile_one_qubit_layer(pspec, &qubits, &targets)
}

/// Options for [`clifford_rb_circuit`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CliffordRbConfig {
    /// Randomize the ideal outcome over all bit strings instead of all
    /// zeros.
    pub randomize_out: bool,
}

impl Default for CliffordRbConfig {
    fn default() -> Self { Self { randomize_out: false } }
}

/// A Clifford RB circuit: `length + 1` uniformly random Cliffords on `qubits`
/// (every device qubit if `None`), each compiled separately, followed by the
/// compiled inverse of their product.
pub fn clifford_rb_circuit<C, R>(
    pspec: &ProcessorSpec,
    compiler: &C,
    length: usize,
    qubits: Option<&[usize]>,
    config: &CliffordRbConfig,
    rng: &mut R,
) -> RbResult<RbCircuit>
where
    C: Compiler,
    R: Rng + ?Sized,
{
    let qubits = subset_or_all(pspec, qubits)?;
    let n = qubits.len();
    let mut composite = CliffordRep::identity(n);
    let mut builder = CircuitBuilder::new(qubits.clone());
    for _ in 0..=length {
        let clifford = random_clifford(n, rng);
        builder.append_circuit(&compiler.compile_clifford(&clifford, pspec, &qubits, rng)?);
        composite = composite.compose(&clifford);
    }
    let inverse = composite.inverse();
    let target
        = if config.randomize_out {
            inverse.with_phases(random_phase_vector(inverse.s(), rng))
        } else {
            inverse
        };
    builder.append_circuit(&compiler.compile_clifford(&target, pspec, &qubits, rng)?);
    let circuit = builder.finalize();

    let out = pspec.rep_of_circuit(&circuit);
    assert!(out.preserves_z_basis(), "Clifford RB circuit does not invert to a Pauli");
    let ideal_out = ideal_outcome(&out);
    if !config.randomize_out { check_all_zero(&ideal_out, "Clifford RB"); }
    debug!(
        length,
        depth = circuit.depth(),
        two_qubit_gates = circuit.two_qubit_gate_count(),
        "sampled Clifford RB circuit",
    );
    Ok(RbCircuit { circuit, ideal_out })
}

/// Options for [`direct_rb_circuit`] and [`simultaneous_direct_rb_circuit`].
#[derive(Clone, Debug, PartialEq)]
pub struct DirectRbConfig {
    /// Sampler for the core layers.
    pub sampler: Sampler,
    /// If given, interleave the core layers with single-qubit layers drawn
    /// from this sampler (see [`random_circuit`]).
    pub local: Option<Local>,
    /// Randomize the ideal outcome over all bit strings instead of all
    /// zeros.
    pub randomize_out: bool,
    /// Start with a uniformly random Clifford.
    pub clifford_twirl: bool,
    /// Replace the initial Clifford with preparation of the stabilizer state
    /// it creates, and the final inversion with a measurement of the state
    /// reached. This only inverts the circuit on ∣0...0⟩, but compiles to
    /// far fewer gates.
    pub conditional_twirl: bool,
    /// Also return the twirl, core, and inversion sub-circuits separately.
    pub partitioned: bool,
}

impl Default for DirectRbConfig {
    fn default() -> Self {
        Self {
            sampler: QElimination::default().into(),
            local: None,
            randomize_out: true,
            clifford_twirl: true,
            conditional_twirl: true,
            partitioned: false,
        }
    }
}

/// The three stages of a direct RB circuit.
#[derive(Clone, Debug, PartialEq)]
pub struct DirectRbParts {
    /// Initial twirl, if any.
    pub twirl: Option<Circuit>,
    /// Sampled native-gate layers.
    pub core: Circuit,
    /// Compiled inversion.
    pub inversion: Circuit,
}

/// A direct RB circuit and its ideal outcome.
#[derive(Clone, Debug, PartialEq)]
pub struct DirectRbCircuit<O = Vec<u8>> {
    pub circuit: Circuit,
    /// Present if [`DirectRbConfig::partitioned`] is set.
    pub parts: Option<DirectRbParts>,
    pub ideal_out: O,
}

// compile the twirl and inversion for one subset given the representation of
// its core layers
fn direct_rb_wrap<C, R>(
    pspec: &ProcessorSpec,
    compiler: &C,
    qubits: &[usize],
    core: &CliffordRep,
    config: &DirectRbConfig,
    rng: &mut R,
) -> RbResult<(Option<Circuit>, Circuit)>
where
    C: Compiler,
    R: Rng + ?Sized,
{
    let n = qubits.len();
    let (twirl, composite)
        = if config.clifford_twirl {
            let initial = random_clifford(n, rng);
            let twirl
                = if config.conditional_twirl {
                    compiler.compile_stabilizer_state(&initial, pspec, qubits, rng)?
                } else {
                    compiler.compile_clifford(&initial, pspec, qubits, rng)?
                };
            (Some(twirl), initial.compose(core))
        } else {
            (None, core.clone())
        };
    let inversion
        = if config.conditional_twirl {
            let target
                = if config.randomize_out {
                    composite.with_phases(random_phase_vector(composite.s(), rng))
                } else {
                    composite
                };
            compiler.compile_stabilizer_measurement(&target, pspec, qubits, rng)?
        } else {
            let inverse = composite.inverse();
            let target
                = if config.randomize_out {
                    inverse.with_phases(random_phase_vector(inverse.s(), rng))
                } else {
                    inverse
                };
            compiler.compile_clifford(&target, pspec, qubits, rng)?
        };
    Ok((twirl, inversion))
}

// join the stages and check the composite against the algebra
fn direct_rb_assemble(
    pspec: &ProcessorSpec,
    twirl: Option<Circuit>,
    core: Circuit,
    inversion: Circuit,
    config: &DirectRbConfig,
) -> (Circuit, Option<DirectRbParts>, Vec<u8>)
{
    let mut builder
        = match &twirl {
            Some(t) => {
                let mut b = t.to_builder();
                b.append_circuit(&core);
                b
            },
            None => core.to_builder(),
        };
    builder.append_circuit(&inversion);
    let circuit = builder.finalize();

    let out = pspec.rep_of_circuit(&circuit);
    if config.conditional_twirl {
        assert!(out.preserves_z_basis(), "direct RB circuit does not map ∣0...0⟩ to a basis state");
    } else {
        assert!(out.is_pauli(), "direct RB circuit is not the identity up to a Pauli");
    }
    let ideal_out = ideal_outcome(&out);
    if !config.randomize_out { check_all_zero(&ideal_out, "direct RB"); }
    let parts
        = config.partitioned
        .then(|| DirectRbParts { twirl, core, inversion });
    (circuit, parts, ideal_out)
}

/// A direct RB circuit on `qubits` (every device qubit if `None`): an
/// optional Clifford twirl, `length` sampled layers of native gates, and a
/// compiled inversion.
pub fn direct_rb_circuit<C, R>(
    pspec: &ProcessorSpec,
    compiler: &C,
    length: usize,
    qubits: Option<&[usize]>,
    config: &DirectRbConfig,
    rng: &mut R,
) -> RbResult<DirectRbCircuit>
where
    C: Compiler,
    R: Rng + ?Sized,
{
    let qubits = subset_or_all(pspec, qubits)?;
    let core
        = random_circuit(
            pspec, length, Some(&qubits), &config.sampler, config.local.as_ref(), rng)?;
    let core_rep = pspec.rep_of_circuit(&core);
    let (twirl, inversion)
        = direct_rb_wrap(pspec, compiler, &qubits, &core_rep, config, rng)?;
    let (circuit, parts, ideal_out)
        = direct_rb_assemble(pspec, twirl, core, inversion, config);
    debug!(
        length,
        depth = circuit.depth(),
        two_qubit_gates = circuit.two_qubit_gate_count(),
        "sampled direct RB circuit",
    );
    Ok(DirectRbCircuit { circuit, parts, ideal_out })
}

/// Direct RB circuits on each subset of `structure`, run side by side, with
/// the ideal outcome grouped by subset.
///
/// Every subset must induce a connected subgraph of the device.
pub fn simultaneous_direct_rb_circuit<C, R>(
    pspec: &ProcessorSpec,
    compiler: &C,
    length: usize,
    structure: &Structure,
    config: &DirectRbConfig,
    rng: &mut R,
) -> RbResult<DirectRbCircuit<Vec<Vec<u8>>>>
where
    C: Compiler,
    R: Rng + ?Sized,
{
    let subsets = structure.resolve(pspec)?;
    check_connected(pspec, &subsets)?;
    let mut core = CircuitBuilder::new(Vec::new());
    let mut core_reps: Vec<CliffordRep> = Vec::with_capacity(subsets.len());
    for subset in subsets.iter() {
        let sub
            = random_circuit(
                pspec, length, Some(subset), &config.sampler, config.local.as_ref(), rng)?;
        core_reps.push(pspec.rep_of_circuit(&sub));
        core.tensor_circuit(&sub);
    }
    let mut twirl = CircuitBuilder::new(Vec::new());
    let mut inversion = CircuitBuilder::new(Vec::new());
    for (subset, rep) in subsets.iter().zip(core_reps.iter()) {
        let (sub_twirl, sub_inversion)
            = direct_rb_wrap(pspec, compiler, subset, rep, config, rng)?;
        if let Some(t) = sub_twirl { twirl.tensor_circuit(&t); }
        inversion.tensor_circuit(&sub_inversion);
    }
    let twirl = config.clifford_twirl.then(|| twirl.finalize());
    let (circuit, parts, flat)
        = direct_rb_assemble(pspec, twirl, core.finalize(), inversion.finalize(), config);
    let ideal_out = subset_outcomes(&circuit, &subsets, |k| flat[k]);
    debug!(
        length,
        subsets = subsets.len(),
        depth = circuit.depth(),
        "sampled simultaneous direct RB circuit",
    );
    Ok(DirectRbCircuit { circuit, parts, ideal_out })
}

pub(crate) fn check_connected(pspec: &ProcessorSpec, subsets: &[Vec<usize>])
    -> RbResult<()>
{
    match subsets.iter().find(|s| !pspec.graph().subgraph_is_connected(s)) {
        Some(s) => Err(RbError::DisconnectedSubset(s.clone())),
        None => Ok(()),
    }
}

/// Options for [`mirror_rb_circuit`].
#[derive(Clone, Debug, PartialEq)]
pub struct MirrorRbConfig {
    /// Sampler for the core layers.
    pub sampler: Sampler,
    /// Wrap the circuit in a random layer of single-qubit Cliffords and its
    /// inverse.
    pub local_clifford: bool,
    /// Insert random Pauli layers between the mirrored layers.
    pub pauli_randomize: bool,
}

impl Default for MirrorRbConfig {
    fn default() -> Self {
        Self {
            sampler: QElimination::default().into(),
            local_clifford: true,
            pauli_randomize: true,
        }
    }
}

/// Wrap a mirrored circuit in a random single-qubit Clifford layer: the
/// layer's structural inverse goes in front, the layer itself at the end.
pub(crate) fn wrap_local_clifford(
    pspec: &ProcessorSpec,
    builder: &mut CircuitBuilder,
    out: &Circuit,
) -> RbResult<()>
{
    let back = pspec.invert_circuit(out)?;
    builder.append_circuit(out);
    builder.prefix_circuit(&back);
    Ok(())
}

/// Check a mirrored circuit and compute its ideal outcome.
pub(crate) fn check_mirror(pspec: &ProcessorSpec, circuit: &Circuit, pauli_randomize: bool)
    -> Vec<u8>
{
    let out = pspec.rep_of_circuit(circuit);
    if pauli_randomize {
        assert!(out.is_pauli(), "mirror circuit is not the identity up to a Pauli");
    } else {
        assert!(out.is_identity(), "mirror circuit is not the identity");
    }
    let ideal_out = ideal_outcome(&out);
    if !pauli_randomize { check_all_zero(&ideal_out, "mirror RB"); }
    ideal_out
}

/// A mirror RB circuit on `qubits` (every device qubit if `None`):
/// `length / 2` sampled layers followed by their structural inverse, with
/// optional Pauli and single-qubit Clifford dressing.
///
/// Requires every native gate to have a native inverse and `length` to be
/// even.
pub fn mirror_rb_circuit<R>(
    pspec: &ProcessorSpec,
    length: usize,
    qubits: Option<&[usize]>,
    config: &MirrorRbConfig,
    rng: &mut R,
) -> RbResult<RbCircuit>
where R: Rng + ?Sized
{
    if length % 2 != 0 { return Err(RbError::OddLength(length)); }
    pspec.check_invertible()?;
    let qubits = subset_or_all(pspec, qubits)?;
    let half = length / 2;

    let core = random_circuit(pspec, half, Some(&qubits), &config.sampler, None, rng)?;
    let mut back = CircuitBuilder::from(pspec.invert_circuit(&core)?);
    let mut builder = CircuitBuilder::from(core);
    if config.pauli_randomize {
        for i in 0..half {
            let pauli = pauli_layer_as_compiled_circuit(pspec, Some(&qubits), true, rng)?;
            builder.insert_circuit(&pauli, half - i);
            let pauli = pauli_layer_as_compiled_circuit(pspec, Some(&qubits), true, rng)?;
            back.insert_circuit(&pauli, half - i);
        }
    }
    builder.append_circuit(&back.finalize());
    if config.pauli_randomize {
        let pauli = pauli_layer_as_compiled_circuit(pspec, Some(&qubits), true, rng)?;
        builder.prefix_circuit(&pauli);
    }
    if config.local_clifford {
        let out = one_qubit_clifford_layer_as_compiled_circuit(pspec, Some(&qubits), rng)?;
        wrap_local_clifford(pspec, &mut builder, &out)?;
    }
    let circuit = builder.finalize();
    let ideal_out = check_mirror(pspec, &circuit, config.pauli_randomize);
    debug!(
        length,
        depth = circuit.depth(),
        two_qubit_gates = circuit.two_qubit_gate_count(),
        "sampled mirror RB circuit",
    );
    Ok(RbCircuit { circuit, ideal_out })
}

/// Probability of measuring 1 on each qubit of a circuit's output, ordered
/// as its lines.
pub fn outcome_probabilities(pspec: &ProcessorSpec, circuit: &Circuit) -> Vec<f64> {
    StabilizerState::from_rep(pspec.rep_of_circuit(circuit)).outcome_probabilities()
}
