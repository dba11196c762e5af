//! Random germs and germ-power circuits.
//!
//! A germ here is a short circuit built from per-qubit single-qubit
//! "subgerms" of power-of-two lengths, repeated to a common depth, with
//! two-qubit gates injected along device edges at random positions to reach
//! a target density. Germ powers repeat a germ up to a requested depth, and
//! germ-power mirror circuits follow one with its structural inverse.

use std::iter;
use rand::Rng;
use tracing::debug;
use crate::{
    circuit::{ Circuit, CircuitBuilder, Layer },
    device::ProcessorSpec,
    error::{ RbError, RbResult },
    gate::GateLabel,
    rb::{
        RbCircuit,
        check_mirror,
        one_qubit_clifford_layer_as_compiled_circuit,
        pauli_layer_as_compiled_circuit,
        subset_or_all,
        wrap_local_clifford,
    },
    sampler::grab_edges,
};

/// Options for germ-power mirror circuits.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GermConfig {
    /// Expected fraction of qubit-layer slots occupied by two-qubit gates.
    pub interacting_density: f64,
    /// Wrap each circuit in a random single-qubit Clifford layer and its
    /// inverse.
    pub local_clifford: bool,
    /// Put a random Pauli layer between the germ power and its inverse.
    pub pauli_randomize: bool,
    /// Use one germ (and one set of dressing layers) for every depth instead
    /// of drawing new ones per depth.
    pub fixed_versus_depth: bool,
}

impl Default for GermConfig {
    fn default() -> Self {
        Self {
            interacting_density: 0.125,
            local_clifford: true,
            pauli_randomize: true,
            fixed_versus_depth: false,
        }
    }
}

// P(1) = 1/2, P(2) = 1/4, P(4) = 1/8, P(8) = 1/8
fn sample_max_subgerm_depth<R>(rng: &mut R) -> usize
where R: Rng + ?Sized
{
    let r: f64 = rng.gen();
    if r < 0.5 {
        1
    } else if r < 0.75 {
        2
    } else if r < 0.875 {
        4
    } else {
        8
    }
}

/// Sample a random germ on `qubits` (every device qubit if `None`).
///
/// With a positive `interacting_density`, the germ is made long enough to
/// hold at least one two-qubit gate and receives
/// ⌊depth × width × density / 2⌋ of them, each on a distinct (layer, edge)
/// slot. Fails with [`RbError::InfeasibleDensity`] if there are not enough
/// slots.
pub fn random_germ<R>(
    pspec: &ProcessorSpec,
    qubits: Option<&[usize]>,
    interacting_density: f64,
    rng: &mut R,
) -> RbResult<Circuit>
where R: Rng + ?Sized
{
    if !interacting_density.is_finite() || interacting_density < 0.0 {
        return Err(RbError::InvalidDistribution(format!(
            "interacting density must be non-negative, got {}", interacting_density)));
    }
    let qubits = subset_or_all(pspec, qubits)?;
    let width = qubits.len();
    let one = pspec.one_qubit_gate_names();

    let max_subgerm = sample_max_subgerm_depth(rng);
    let repeats
        = if interacting_density > 0.0 {
            let locations = (max_subgerm * width) as f64 * interacting_density;
            (2.0 / locations).ceil() as usize
        } else {
            1
        };
    let germ_depth = repeats * max_subgerm;

    let mut subgerms: Vec<Vec<&str>> = Vec::with_capacity(width);
    for &q in qubits.iter() {
        if one.is_empty() { return Err(RbError::NoOneQubitGates(q)); }
        let mut depth = 1;
        while depth < max_subgerm && rng.gen::<bool>() { depth *= 2; }
        subgerms.push((0..depth).map(|_| one[rng.gen_range(0..one.len())]).collect());
    }
    let mut layers: Vec<Layer>
        = (0..germ_depth)
        .map(|l| {
            qubits.iter().zip(subgerms.iter())
                .map(|(q, sub)| GateLabel::one(sub[l % sub.len()], *q))
                .collect()
        })
        .collect();

    if interacting_density > 0.0 {
        let num_two
            = (germ_depth as f64 * width as f64 * interacting_density / 2.0).floor() as usize;
        let edges: Vec<(usize, usize)>
            = pspec.graph().edges().into_iter()
            .filter(|(a, b)| qubits.contains(a) && qubits.contains(b))
            .collect();
        let mut slots: Vec<(usize, (usize, usize))>
            = (0..germ_depth)
            .flat_map(|l| {
                grab_edges(edges.clone(), rng).into_iter().map(move |e| (l, e))
            })
            .collect();
        if num_two > slots.len() {
            return Err(RbError::InfeasibleDensity(format!(
                "{} two-qubit gates needed in a germ of depth {} on {} qubits, \
                but only {} edge slots are available",
                num_two, germ_depth, width, slots.len(),
            )));
        }
        for _ in 0..num_two {
            let (l, (a, b)) = slots.swap_remove(rng.gen_range(0..slots.len()));
            let mut ops = pspec.ops_on_qubits(&[a, b]);
            ops.append(&mut pspec.ops_on_qubits(&[b, a]));
            if ops.is_empty() { return Err(RbError::NoEntanglingGate(a, b)); }
            let op = ops.swap_remove(rng.gen_range(0..ops.len()));
            let layer: Layer
                = iter::once(op)
                .chain(layers[l].iter().filter(|g| !g.acts_on(a) && !g.acts_on(b)).cloned())
                .collect();
            layers[l] = layer;
        }
    }
    let germ = Circuit::new(layers, qubits);
    debug!(
        depth = germ.depth(),
        max_subgerm,
        two_qubit_gates = germ.two_qubit_gate_count(),
        "sampled germ",
    );
    Ok(germ)
}

/// Germ powers and the germs they were built from.
#[derive(Clone, Debug, PartialEq)]
pub struct GermPowerCircuits {
    /// One circuit per requested depth.
    pub circuits: Vec<Circuit>,
    /// The germ behind each circuit (all equal for a fixed germ).
    pub germs: Vec<Circuit>,
}

/// For each depth, repeat a random germ end to end and truncate to exactly
/// that depth.
pub fn random_germpower_circuits<R>(
    pspec: &ProcessorSpec,
    depths: &[usize],
    qubits: Option<&[usize]>,
    interacting_density: f64,
    fixed_versus_depth: bool,
    rng: &mut R,
) -> RbResult<GermPowerCircuits>
where R: Rng + ?Sized
{
    let qubits = subset_or_all(pspec, qubits)?;
    let fixed
        = fixed_versus_depth
        .then(|| random_germ(pspec, Some(&qubits), interacting_density, rng))
        .transpose()?;
    let mut circuits: Vec<Circuit> = Vec::with_capacity(depths.len());
    let mut germs: Vec<Circuit> = Vec::with_capacity(depths.len());
    for &depth in depths.iter() {
        let germ
            = match &fixed {
                Some(g) => g.clone(),
                None => random_germ(pspec, Some(&qubits), interacting_density, rng)?,
            };
        let mut builder = germ.to_builder();
        builder.repeat_to_depth(depth);
        circuits.push(builder.finalize());
        germs.push(germ);
    }
    Ok(GermPowerCircuits { circuits, germs })
}

/// Germ-power mirror circuits and the germs they were built from.
#[derive(Clone, Debug, PartialEq)]
pub struct GermPowerMirrorCircuits {
    /// One circuit per requested depth.
    pub circuits: Vec<RbCircuit>,
    /// The germ behind each circuit.
    pub germs: Vec<Circuit>,
}

/// For each depth, a germ power followed by its structural inverse, with
/// optional Pauli and single-qubit Clifford dressing.
///
/// Requires every native gate to have a native inverse.
pub fn random_germpower_mirror_circuits<R>(
    pspec: &ProcessorSpec,
    depths: &[usize],
    qubits: Option<&[usize]>,
    config: &GermConfig,
    rng: &mut R,
) -> RbResult<GermPowerMirrorCircuits>
where R: Rng + ?Sized
{
    pspec.check_invertible()?;
    let qubits = subset_or_all(pspec, qubits)?;
    let powers
        = random_germpower_circuits(
            pspec,
            depths,
            Some(&qubits),
            config.interacting_density,
            config.fixed_versus_depth,
            rng,
        )?;

    let fixed = config.fixed_versus_depth;
    let fixed_pauli
        = (fixed && config.pauli_randomize)
        .then(|| pauli_layer_as_compiled_circuit(pspec, Some(&qubits), true, rng))
        .transpose()?;
    let fixed_local
        = (fixed && config.local_clifford)
        .then(|| one_qubit_clifford_layer_as_compiled_circuit(pspec, Some(&qubits), rng))
        .transpose()?;

    let mut circuits: Vec<RbCircuit> = Vec::with_capacity(depths.len());
    for power in powers.circuits.into_iter() {
        let back = pspec.invert_circuit(&power)?;
        let mut builder = CircuitBuilder::from(power);
        if config.pauli_randomize {
            let pauli
                = match &fixed_pauli {
                    Some(p) => p.clone(),
                    None => pauli_layer_as_compiled_circuit(pspec, Some(&qubits), true, rng)?,
                };
            builder.append_circuit(&pauli);
        }
        builder.append_circuit(&back);
        if config.local_clifford {
            let out
                = match &fixed_local {
                    Some(c) => c.clone(),
                    None => one_qubit_clifford_layer_as_compiled_circuit(
                        pspec, Some(&qubits), rng)?,
                };
            wrap_local_clifford(pspec, &mut builder, &out)?;
        }
        let circuit = builder.finalize();
        let ideal_out = check_mirror(pspec, &circuit, config.pauli_randomize);
        circuits.push(RbCircuit { circuit, ideal_out });
    }
    Ok(GermPowerMirrorCircuits { circuits, germs: powers.germs })
}
