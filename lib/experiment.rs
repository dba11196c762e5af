//! Experiment designs: builders iterated over depths, repetitions, and qubit
//! subsets.
//!
//! Simultaneous designs key their entries first by `(depth, repetition)` and
//! then by the *substructure* an entry benchmarks: the full structure, a
//! single subset with every other qubit idled ("set-isolated"), or the full
//! structure minus one subset, which is idled ("set-complement-isolated").
//! Each entry also records a *setting* per subset of the full structure:
//! subsets that are benchmarked in the entry get a setting unique to the
//! circuit, `depths.len() + depth_index * circuits_per_length + repetition`,
//! and idled subsets get `depth_index`.

use std::collections::BTreeMap;
use itertools::Itertools;
use rand::Rng;
use tracing::{ info, warn };
use crate::{
    circuit::{ Circuit, CircuitBuilder },
    compiler::Compiler,
    device::ProcessorSpec,
    error::{ RbError, RbResult },
    germ::{ GermConfig, random_germpower_mirror_circuits },
    rb::{
        CliffordRbConfig,
        DirectRbConfig,
        DirectRbParts,
        MirrorRbConfig,
        RbCircuit,
        Structure,
        check_connected,
        clifford_rb_circuit,
        mirror_rb_circuit,
        random_circuit,
        simultaneous_direct_rb_circuit,
        simultaneous_random_circuit,
        subset_or_all,
    },
    sampler::{ Local, Sampler },
};

/// Above this many circuits, an exhaustive design logs a warning.
const EXHAUSTIVE_WARN_THRESHOLD: usize = 10_000;

/// Which idled variants of each simultaneous circuit to include.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Isolation {
    /// Include each subset run alone.
    pub set_isolated: bool,
    /// Include everything but each subset.
    pub set_complement_isolated: bool,
}

impl Default for Isolation {
    fn default() -> Self {
        Self { set_isolated: true, set_complement_isolated: false }
    }
}

/// One circuit of a simultaneous design.
#[derive(Clone, Debug, PartialEq)]
pub struct ExperimentEntry<T> {
    pub circuit: Circuit,
    /// Sub-circuits of a partitioned direct RB circuit, idled like
    /// `circuit`.
    pub parts: Option<DirectRbParts>,
    /// Ideal outcome of each subset in the substructure, in order.
    pub target: Vec<T>,
    /// Setting of every subset of the full structure.
    pub settings: BTreeMap<Vec<usize>, usize>,
}

/// A simultaneous experiment design.
#[derive(Clone, Debug, PartialEq)]
pub struct Experiment<T> {
    pub depths: Vec<usize>,
    pub circuits_per_length: usize,
    /// The resolved structure.
    pub structure: Vec<Vec<usize>>,
    /// Entries keyed by `(depth, repetition)` and then by substructure.
    pub entries: BTreeMap<(usize, usize), BTreeMap<Vec<Vec<usize>>, ExperimentEntry<T>>>,
}

impl<T> Experiment<T> {
    /// Look up a single entry.
    pub fn get(&self, depth: usize, repetition: usize, substructure: &[Vec<usize>])
        -> Option<&ExperimentEntry<T>>
    {
        self.entries.get(&(depth, repetition))
            .and_then(|subs| subs.get(substructure))
    }

    /// Total number of entries.
    pub fn len(&self) -> usize { self.entries.values().map(|subs| subs.len()).sum() }

    /// Return `true` if there are no entries.
    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

fn check_grid(depths: &[usize], circuits_per_length: usize) -> RbResult<()> {
    if depths.is_empty() { return Err(RbError::Empty("depths")); }
    if circuits_per_length == 0 { return Err(RbError::Empty("circuits per length")); }
    if let Some(d) = depths.iter().duplicates().next() {
        return Err(RbError::DuplicateDepth(*d));
    }
    Ok(())
}

// position of one circuit in the (depth, repetition) grid
#[derive(Copy, Clone, Debug)]
struct GridPoint {
    depth_index: usize,
    repetition: usize,
    num_depths: usize,
    circuits_per_length: usize,
}

impl GridPoint {
    fn settings(&self, structure: &[Vec<usize>], substructure: &[Vec<usize>])
        -> BTreeMap<Vec<usize>, usize>
    {
        structure.iter()
            .map(|s| {
                let setting
                    = if substructure.contains(s) {
                        self.num_depths
                            + self.depth_index * self.circuits_per_length
                            + self.repetition
                    } else {
                        self.depth_index
                    };
                (s.clone(), setting)
            })
            .collect()
    }
}

// the circuit with every line outside `keep` idled
fn idle_all_but(circuit: &Circuit, keep: &[usize]) -> Circuit {
    let mut builder = circuit.to_builder();
    for &q in circuit.line_labels().iter().filter(|q| !keep.contains(q)) {
        builder.replace_with_idling_line(q);
    }
    builder.finalize()
}

fn idle_parts(parts: &Option<DirectRbParts>, keep: &[usize]) -> Option<DirectRbParts> {
    parts.as_ref()
        .map(|p| DirectRbParts {
            twirl: p.twirl.as_ref().map(|t| idle_all_but(t, keep)),
            core: idle_all_but(&p.core, keep),
            inversion: idle_all_but(&p.inversion, keep),
        })
}

// file one simultaneous circuit and its isolated variants
fn record<T>(
    slot: &mut BTreeMap<Vec<Vec<usize>>, ExperimentEntry<T>>,
    circuit: Circuit,
    parts: Option<DirectRbParts>,
    target: Vec<T>,
    structure: &[Vec<usize>],
    isolation: Isolation,
    point: GridPoint,
)
where T: Clone
{
    if isolation.set_isolated {
        for (k, subset) in structure.iter().enumerate() {
            let sub = vec![subset.clone()];
            let entry = ExperimentEntry {
                circuit: idle_all_but(&circuit, subset),
                parts: idle_parts(&parts, subset),
                target: vec![target[k].clone()],
                settings: point.settings(structure, &sub),
            };
            slot.insert(sub, entry);
        }
    }
    if isolation.set_complement_isolated && structure.len() > 1 {
        for k in 0..structure.len() {
            let sub: Vec<Vec<usize>>
                = structure.iter().enumerate()
                .filter(|(i, _)| *i != k)
                .map(|(_, s)| s.clone())
                .collect();
            let keep: Vec<usize> = sub.iter().flatten().copied().collect();
            let entry = ExperimentEntry {
                circuit: idle_all_but(&circuit, &keep),
                parts: idle_parts(&parts, &keep),
                target: target.iter().enumerate()
                    .filter(|(i, _)| *i != k)
                    .map(|(_, t)| t.clone())
                    .collect(),
                settings: point.settings(structure, &sub),
            };
            slot.insert(sub, entry);
        }
    }
    let entry = ExperimentEntry {
        circuit,
        parts,
        target,
        settings: point.settings(structure, structure),
    };
    slot.insert(structure.to_vec(), entry);
}

/// Simultaneous random circuits at every depth, `circuits_per_length` times
/// each, with targets holding the probability of measuring 1 per qubit.
#[allow(clippy::too_many_arguments)]
pub fn simultaneous_random_circuits_experiment<R>(
    pspec: &ProcessorSpec,
    depths: &[usize],
    circuits_per_length: usize,
    structure: &Structure,
    sampler: &Sampler,
    local: Option<&Local>,
    isolation: Isolation,
    rng: &mut R,
) -> RbResult<Experiment<Vec<f64>>>
where R: Rng + ?Sized
{
    check_grid(depths, circuits_per_length)?;
    let subsets = structure.resolve(pspec)?;
    let mut entries = BTreeMap::new();
    for (depth_index, &depth) in depths.iter().enumerate() {
        info!(
            "sampling {} circuits at length {} ({} of {} depths)",
            circuits_per_length, depth, depth_index + 1, depths.len(),
        );
        for repetition in 0..circuits_per_length {
            let RbCircuit { circuit, ideal_out }
                = simultaneous_random_circuit(
                    pspec, &[depth], &Structure::Subsets(subsets.clone()), sampler, local, rng)?;
            let point = GridPoint {
                depth_index,
                repetition,
                num_depths: depths.len(),
                circuits_per_length,
            };
            let slot = entries.entry((depth, repetition)).or_insert_with(BTreeMap::new);
            record(slot, circuit, None, ideal_out, &subsets, isolation, point);
        }
    }
    Ok(Experiment {
        depths: depths.to_vec(),
        circuits_per_length,
        structure: subsets,
        entries,
    })
}

/// Independent random circuits per subset, run side by side in every
/// combination.
#[derive(Clone, Debug, PartialEq)]
pub struct ExhaustiveExperiment {
    pub structure: Vec<Vec<usize>>,
    /// The circuits sampled for each subset.
    pub subset_circuits: Vec<Vec<Circuit>>,
    /// Parallel circuits keyed by the index chosen for each subset.
    pub circuits: BTreeMap<Vec<usize>, Circuit>,
}

/// Sample `circuits_per_subset` random circuits on each subset of
/// `structure`, each with a depth drawn uniformly from `allowed_depths`, and
/// tensor them together in every combination.
pub fn exhaustive_independent_random_circuits_experiment<R>(
    pspec: &ProcessorSpec,
    allowed_depths: &[usize],
    circuits_per_subset: usize,
    structure: &Structure,
    sampler: &Sampler,
    rng: &mut R,
) -> RbResult<ExhaustiveExperiment>
where R: Rng + ?Sized
{
    if allowed_depths.is_empty() { return Err(RbError::Empty("allowed depths")); }
    if circuits_per_subset == 0 { return Err(RbError::Empty("circuits per subset")); }
    let subsets = structure.resolve(pspec)?;
    let total
        = (0..subsets.len())
        .try_fold(1_usize, |acc, _| acc.checked_mul(circuits_per_subset));
    match total {
        Some(t) if t <= EXHAUSTIVE_WARN_THRESHOLD => { },
        Some(t) => warn!("{} circuits are going to be generated", t),
        None => warn!("more than {} circuits are going to be generated", usize::MAX),
    }

    let mut subset_circuits: Vec<Vec<Circuit>> = Vec::with_capacity(subsets.len());
    for subset in subsets.iter() {
        let mut circuits: Vec<Circuit> = Vec::with_capacity(circuits_per_subset);
        for _ in 0..circuits_per_subset {
            let depth = allowed_depths[rng.gen_range(0..allowed_depths.len())];
            circuits.push(random_circuit(pspec, depth, Some(subset), sampler, None, rng)?);
        }
        subset_circuits.push(circuits);
    }
    let circuits: BTreeMap<Vec<usize>, Circuit>
        = (0..subsets.len())
        .map(|_| 0..circuits_per_subset)
        .multi_cartesian_product()
        .map(|choice| {
            let mut builder = CircuitBuilder::new(Vec::new());
            for (k, c) in choice.iter().enumerate() {
                builder.tensor_circuit(&subset_circuits[k][*c]);
            }
            (choice, builder.finalize())
        })
        .collect();
    Ok(ExhaustiveExperiment { structure: subsets, subset_circuits, circuits })
}

/// Simultaneous direct RB circuits at every depth, `circuits_per_length`
/// times each.
///
/// Every subset must induce a connected subgraph of the device.
#[allow(clippy::too_many_arguments)]
pub fn simultaneous_direct_rb_experiment<C, R>(
    pspec: &ProcessorSpec,
    compiler: &C,
    depths: &[usize],
    circuits_per_length: usize,
    structure: &Structure,
    config: &DirectRbConfig,
    isolation: Isolation,
    rng: &mut R,
) -> RbResult<Experiment<Vec<u8>>>
where
    C: Compiler,
    R: Rng + ?Sized,
{
    check_grid(depths, circuits_per_length)?;
    let subsets = structure.resolve(pspec)?;
    check_connected(pspec, &subsets)?;
    let structure = Structure::Subsets(subsets.clone());
    let mut entries = BTreeMap::new();
    for (depth_index, &depth) in depths.iter().enumerate() {
        info!(
            "sampling {} circuits at DRB length {} ({} of {} depths)",
            circuits_per_length, depth, depth_index + 1, depths.len(),
        );
        for repetition in 0..circuits_per_length {
            let drb
                = simultaneous_direct_rb_circuit(
                    pspec, compiler, depth, &structure, config, rng)?;
            let point = GridPoint {
                depth_index,
                repetition,
                num_depths: depths.len(),
                circuits_per_length,
            };
            let slot = entries.entry((depth, repetition)).or_insert_with(BTreeMap::new);
            record(slot, drb.circuit, drb.parts, drb.ideal_out, &subsets, isolation, point);
        }
    }
    Ok(Experiment {
        depths: depths.to_vec(),
        circuits_per_length,
        structure: subsets,
        entries,
    })
}

/// A design of independent circuits on one set of qubits.
#[derive(Clone, Debug, PartialEq)]
pub struct RbExperiment {
    pub depths: Vec<usize>,
    pub circuits_per_length: usize,
    pub qubits: Vec<usize>,
    /// Circuits keyed by `(depth, repetition)`.
    pub circuits: BTreeMap<(usize, usize), RbCircuit>,
}

// run `build` over the (depth, repetition) grid
fn sample_grid<F>(
    depths: &[usize],
    circuits_per_length: usize,
    qubits: Vec<usize>,
    what: &str,
    mut build: F,
) -> RbResult<RbExperiment>
where F: FnMut(usize) -> RbResult<RbCircuit>
{
    check_grid(depths, circuits_per_length)?;
    let mut circuits = BTreeMap::new();
    for (depth_index, &depth) in depths.iter().enumerate() {
        info!(
            "sampling {} {} circuits at length {} ({} of {} depths)",
            circuits_per_length, what, depth, depth_index + 1, depths.len(),
        );
        for repetition in 0..circuits_per_length {
            circuits.insert((depth, repetition), build(depth)?);
        }
    }
    Ok(RbExperiment { depths: depths.to_vec(), circuits_per_length, qubits, circuits })
}

/// Clifford RB circuits at every length, `circuits_per_length` times each.
#[allow(clippy::too_many_arguments)]
pub fn clifford_rb_experiment<C, R>(
    pspec: &ProcessorSpec,
    compiler: &C,
    depths: &[usize],
    circuits_per_length: usize,
    qubits: Option<&[usize]>,
    config: &CliffordRbConfig,
    rng: &mut R,
) -> RbResult<RbExperiment>
where
    C: Compiler,
    R: Rng + ?Sized,
{
    let qubits = subset_or_all(pspec, qubits)?;
    sample_grid(depths, circuits_per_length, qubits.clone(), "CRB", |depth| {
        clifford_rb_circuit(pspec, compiler, depth, Some(&qubits), config, rng)
    })
}

/// Mirror RB circuits at every (even) length, `circuits_per_length` times
/// each.
pub fn mirror_rb_experiment<R>(
    pspec: &ProcessorSpec,
    depths: &[usize],
    circuits_per_length: usize,
    qubits: Option<&[usize]>,
    config: &MirrorRbConfig,
    rng: &mut R,
) -> RbResult<RbExperiment>
where R: Rng + ?Sized
{
    if let Some(d) = depths.iter().find(|d| **d % 2 != 0) {
        return Err(RbError::OddLength(*d));
    }
    let qubits = subset_or_all(pspec, qubits)?;
    sample_grid(depths, circuits_per_length, qubits.clone(), "MRB", |depth| {
        mirror_rb_circuit(pspec, depth, Some(&qubits), config, rng)
    })
}

/// Germ-power mirror circuits with their germs.
#[derive(Clone, Debug, PartialEq)]
pub struct GermExperiment {
    pub depths: Vec<usize>,
    pub circuits_per_length: usize,
    pub qubits: Vec<usize>,
    /// Circuits keyed by `(depth, repetition)`.
    pub circuits: BTreeMap<(usize, usize), RbCircuit>,
    /// The germ behind each circuit.
    pub germs: BTreeMap<(usize, usize), Circuit>,
}

/// `circuits_per_length` independent sets of germ-power mirror circuits
/// over all depths.
pub fn random_germpower_mirror_circuit_experiment<R>(
    pspec: &ProcessorSpec,
    depths: &[usize],
    circuits_per_length: usize,
    qubits: Option<&[usize]>,
    config: &GermConfig,
    rng: &mut R,
) -> RbResult<GermExperiment>
where R: Rng + ?Sized
{
    check_grid(depths, circuits_per_length)?;
    let qubits = subset_or_all(pspec, qubits)?;
    let mut circuits = BTreeMap::new();
    let mut germs = BTreeMap::new();
    for repetition in 0..circuits_per_length {
        info!("sampling germ-power mirror circuits {} of {}", repetition + 1, circuits_per_length);
        let set = random_germpower_mirror_circuits(pspec, depths, Some(&qubits), config, rng)?;
        for ((&depth, rb), germ) in depths.iter().zip(set.circuits).zip(set.germs) {
            circuits.insert((depth, repetition), rb);
            germs.insert((depth, repetition), germ);
        }
    }
    Ok(GermExperiment {
        depths: depths.to_vec(),
        circuits_per_length,
        qubits,
        circuits,
        germs,
    })
}
