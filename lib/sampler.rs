//! Random layer samplers.
//!
//! Every strategy produces one *complete* [`Layer`]: each qubit in the
//! sampled set is acted on by exactly one gate, and no two-qubit gates share
//! a qubit. The strategies differ in how two-qubit gates are placed:
//!
//! | Strategy | Placement | Two-qubit control |
//! |---|---|---|
//! | [`PairingQubits`] | random pairing, assumes all-to-all connectivity | probability per pair |
//! | [`EdgeGrab`] | random maximal set of disjoint edges, each kept by a coin flip | expected number per layer |
//! | [`QElimination`] | visit qubits in random order, drawing from the remaining gates | fixed or count-weighted probability |
//! | [`Co2QGates`] | pick a caller-supplied set of compatible gates | probability per gate |
//! | [`Local`] | single-qubit gates only | none |

use std::str::FromStr;
use itertools::Itertools;
use once_cell::sync::Lazy;
use rand::{
    Rng,
    distributions::WeightedIndex,
    seq::SliceRandom,
};
use rustc_hash::FxHashMap as HashMap;
use crate::{
    circuit::Layer,
    device::ProcessorSpec,
    error::{ RbError, RbResult },
    gate::GateLabel,
};

fn check_prob(p: f64, what: &str) -> RbResult<()> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(RbError::InvalidDistribution(
            format!("{} must be a probability, got {}", what, p)))
    }
}

fn weighted_index(weights: &[f64], expected_len: usize, what: &str)
    -> RbResult<WeightedIndex<f64>>
{
    if weights.len() != expected_len {
        return Err(RbError::InvalidDistribution(format!(
            "{} has {} weights for {} choices", what, weights.len(), expected_len)));
    }
    WeightedIndex::new(weights)
        .map_err(|e| RbError::InvalidDistribution(format!("{}: {}", what, e)))
}

// resolve an optional qubit subset against the device
fn target_qubits(pspec: &ProcessorSpec, qubits: Option<&[usize]>)
    -> RbResult<Vec<usize>>
{
    match qubits {
        Some(q) => {
            pspec.check_qubits(q)?;
            Ok(q.to_vec())
        },
        None => Ok(pspec.qubit_labels().to_vec()),
    }
}

// resolve an optional allow-list of native gate names of a given arity
fn gate_names(pspec: &ProcessorSpec, names: Option<&[String]>, arity: usize)
    -> RbResult<Vec<String>>
{
    match names {
        Some(names) => {
            if let Some(bad) = names.iter().find(|g| pspec.arity(g) != Some(arity)) {
                return Err(RbError::UnknownGate(bad.clone()));
            }
            Ok(names.to_vec())
        },
        None => {
            let all = match arity {
                1 => pspec.one_qubit_gate_names(),
                _ => pspec.two_qubit_gate_names(),
            };
            Ok(all.into_iter().map(String::from).collect())
        },
    }
}

// every label must name a native gate of the given arity
fn check_native(pspec: &ProcessorSpec, gates: &[GateLabel], arity: usize) -> RbResult<()> {
    match gates.iter().find(|g| pspec.arity(g.name()) != Some(arity)) {
        Some(bad) => Err(RbError::UnknownGate(bad.name().to_string())),
        None => Ok(()),
    }
}

// fill every qubit not yet in `layer` with a random single-qubit gate
fn fill_one_qubit<R>(layer: &mut Layer, qubits: &[usize], names: &[String], rng: &mut R)
    -> RbResult<()>
where R: Rng + ?Sized
{
    let free: Vec<usize>
        = qubits.iter().copied().filter(|q| layer.is_free(*q)).collect();
    for q in free {
        let name = names.choose(rng).ok_or(RbError::NoOneQubitGates(q))?;
        layer.push(GateLabel::one(name.as_str(), q));
    }
    Ok(())
}

/// Random pairing of qubits, with each pair getting a two-qubit gate with a
/// fixed probability.
///
/// Qubits are paired without reference to the connectivity graph, so this is
/// only meaningful for all-to-all devices. With an odd number of qubits, one
/// qubit chosen at random gets a single-qubit gate first.
#[derive(Clone, Debug, PartialEq)]
pub struct PairingQubits {
    /// Probability that a pair gets a two-qubit gate.
    pub two_qubit_prob: f64,
    /// Single-qubit gate names to draw from; all natives if `None`.
    pub one_qubit_gate_names: Option<Vec<String>>,
    /// Two-qubit gate names to draw from; all natives if `None`.
    pub two_qubit_gate_names: Option<Vec<String>>,
}

impl Default for PairingQubits {
    fn default() -> Self {
        Self {
            two_qubit_prob: 0.5,
            one_qubit_gate_names: None,
            two_qubit_gate_names: None,
        }
    }
}

impl PairingQubits {
    fn sample<R>(&self, pspec: &ProcessorSpec, qubits: &[usize], rng: &mut R)
        -> RbResult<Layer>
    where R: Rng + ?Sized
    {
        check_prob(self.two_qubit_prob, "two-qubit gate probability")?;
        let one = gate_names(pspec, self.one_qubit_gate_names.as_deref(), 1)?;
        let two = gate_names(pspec, self.two_qubit_gate_names.as_deref(), 2)?;
        let mut remaining: Vec<usize> = qubits.to_vec();
        let mut layer = Layer::idle();
        if remaining.len() % 2 == 1 {
            let k = rng.gen_range(0..remaining.len());
            let q = remaining.remove(k);
            let name = one.choose(rng).ok_or(RbError::NoOneQubitGates(q))?;
            layer.push(GateLabel::one(name.as_str(), q));
        }
        remaining.shuffle(rng);
        for pair in remaining.chunks(2) {
            let (a, b) = (pair[0], pair[1]);
            if rng.gen::<f64>() < self.two_qubit_prob {
                let name = two.choose(rng).ok_or(RbError::NoEntanglingGate(a, b))?;
                layer.push(GateLabel::two(name.as_str(), a, b));
            } else {
                for q in [a, b] {
                    let name = one.choose(rng).ok_or(RbError::NoOneQubitGates(q))?;
                    layer.push(GateLabel::one(name.as_str(), q));
                }
            }
        }
        Ok(layer)
    }
}

/// Greedy random selection of disjoint edges, each then kept with the
/// probability that makes the expected number of two-qubit gates equal to
/// `mean_two_qubit_gates`.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeGrab {
    /// Expected number of two-qubit gates per layer.
    pub mean_two_qubit_gates: f64,
}

impl Default for EdgeGrab {
    fn default() -> Self { Self { mean_two_qubit_gates: 1.0 } }
}

/// Choose a maximal set of disjoint edges among `edges` at random.
pub(crate) fn grab_edges<R>(mut edges: Vec<(usize, usize)>, rng: &mut R)
    -> Vec<(usize, usize)>
where R: Rng + ?Sized
{
    let mut selected: Vec<(usize, usize)> = Vec::new();
    while !edges.is_empty() {
        let (a, b) = edges[rng.gen_range(0..edges.len())];
        selected.push((a, b));
        edges = edges.into_iter()
            .filter(|&(c, d)| c != a && c != b && d != a && d != b)
            .collect();
    }
    selected
}

impl EdgeGrab {
    fn sample<R>(&self, pspec: &ProcessorSpec, qubits: &[usize], rng: &mut R)
        -> RbResult<Layer>
    where R: Rng + ?Sized
    {
        if !(self.mean_two_qubit_gates >= 0.0) {
            return Err(RbError::InvalidDistribution(format!(
                "mean number of two-qubit gates must be non-negative, got {}",
                self.mean_two_qubit_gates,
            )));
        }
        let edges: Vec<(usize, usize)>
            = pspec.graph().edges().into_iter()
            .filter(|(a, b)| qubits.contains(a) && qubits.contains(b))
            .collect();
        let selected = grab_edges(edges, rng);
        let available = selected.len();
        if (available as f64) < self.mean_two_qubit_gates {
            return Err(RbError::InsufficientConnectivity {
                available,
                requested: self.mean_two_qubit_gates,
            });
        }
        let two_qubit_prob
            = if available > 0 {
                self.mean_two_qubit_gates / available as f64
            } else {
                0.0
            };
        let mut layer = Layer::idle();
        for (a, b) in selected {
            if rng.gen::<f64>() < two_qubit_prob {
                let ops = pspec.ops_on_qubits(&[a, b]);
                let gate = ops.choose(rng).ok_or(RbError::NoEntanglingGate(a, b))?;
                layer.push(gate.clone());
            }
        }
        let one: Vec<String>
            = pspec.one_qubit_gate_names().into_iter().map(String::from).collect();
        fill_one_qubit(&mut layer, qubits, &one, rng)?;
        Ok(layer)
    }
}

/// Visit qubits in random order; each takes a single- or two-qubit gate from
/// the gates still available on it, and a two-qubit gate also claims its
/// partner.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QElimination {
    /// Probability of a two-qubit gate at each step (when one is possible).
    /// If `None`, the choice is weighted by the number of remaining
    /// single- and two-qubit candidates.
    pub two_qubit_prob: Option<f64>,
    /// Single-qubit gates to draw from; every native one if `None`.
    pub one_qubit_gates: Option<Vec<GateLabel>>,
    /// Two-qubit gates to draw from; every native one if `None`.
    pub two_qubit_gates: Option<Vec<GateLabel>>,
}

impl QElimination {
    fn sample<R>(&self, pspec: &ProcessorSpec, qubits: &[usize], rng: &mut R)
        -> RbResult<Layer>
    where R: Rng + ?Sized
    {
        if let Some(p) = self.two_qubit_prob {
            check_prob(p, "two-qubit gate probability")?;
        }
        if let Some(gates) = &self.one_qubit_gates { check_native(pspec, gates, 1)?; }
        if let Some(gates) = &self.two_qubit_gates { check_native(pspec, gates, 2)?; }
        let within = |g: &GateLabel| g.qubits().iter().all(|q| qubits.contains(q));
        let (prim_one, prim_two): (Vec<GateLabel>, Vec<GateLabel>)
            = pspec.primitive_ops().into_iter()
            .partition(|g| g.arity() == 1);
        let mut avail_one: Vec<GateLabel>
            = self.one_qubit_gates.clone().unwrap_or(prim_one)
            .into_iter()
            .filter(within)
            .collect();
        let mut avail_two: Vec<GateLabel>
            = self.two_qubit_gates.clone().unwrap_or(prim_two)
            .into_iter()
            .filter(within)
            .collect();

        let mut remaining: Vec<usize> = qubits.to_vec();
        let mut layer = Layer::idle();
        while !remaining.is_empty() {
            let q = remaining.remove(rng.gen_range(0..remaining.len()));
            let (one_on_q, rest_one): (Vec<GateLabel>, Vec<GateLabel>)
                = avail_one.into_iter().partition(|g| g.acts_on(q));
            let (two_on_q, rest_two): (Vec<GateLabel>, Vec<GateLabel>)
                = avail_two.into_iter().partition(|g| g.acts_on(q));
            avail_one = rest_one;
            avail_two = rest_two;
            assert!(
                !(one_on_q.is_empty() && two_on_q.is_empty()),
                "QElimination: no gates left for qubit {}", q,
            );
            let use_two
                = if two_on_q.is_empty() {
                    false
                } else if one_on_q.is_empty() {
                    true
                } else {
                    let p
                        = self.two_qubit_prob
                        .unwrap_or_else(|| {
                            two_on_q.len() as f64
                                / (one_on_q.len() + two_on_q.len()) as f64
                        });
                    rng.gen::<f64>() < p
                };
            if use_two {
                let gate = two_on_q[rng.gen_range(0..two_on_q.len())].clone();
                let other = gate.qubits().iter().copied().find(|p| *p != q);
                if let Some(other) = other {
                    remaining.retain(|p| *p != other);
                    avail_one.retain(|g| !g.acts_on(other));
                    avail_two.retain(|g| !g.acts_on(other));
                }
                layer.push(gate);
            } else {
                layer.push(one_on_q[rng.gen_range(0..one_on_q.len())].clone());
            }
        }
        Ok(layer)
    }
}

/// One entry of the candidate list for [`Co2QGates`].
#[derive(Clone, Debug, PartialEq)]
pub enum CompatibleGates {
    /// A set of two-qubit gates on disjoint qubits.
    Set(Vec<GateLabel>),
    /// Several such sets, one of which is picked uniformly.
    Nested(Vec<Vec<GateLabel>>),
}

/// Pick one of a list of caller-supplied compatible two-qubit gate sets,
/// keep each of its gates with a fixed probability, and fill the remaining
/// qubits with single-qubit gates.
#[derive(Clone, Debug, PartialEq)]
pub struct Co2QGates {
    /// Candidate sets.
    pub sets: Vec<CompatibleGates>,
    /// Weights for choosing among `sets`; uniform if `None`.
    pub set_weights: Option<Vec<f64>>,
    /// Probability that each gate of the chosen set is kept.
    pub two_qubit_prob: f64,
    /// Single-qubit gate names to draw from; all natives if `None`.
    pub one_qubit_gate_names: Option<Vec<String>>,
}

impl Co2QGates {
    /// Create a sampler that picks uniformly among `sets` and keeps every
    /// gate of the chosen set.
    pub fn new(sets: Vec<CompatibleGates>) -> Self {
        Self {
            sets,
            set_weights: None,
            two_qubit_prob: 1.0,
            one_qubit_gate_names: None,
        }
    }

    fn sample<R>(&self, pspec: &ProcessorSpec, qubits: &[usize], rng: &mut R)
        -> RbResult<Layer>
    where R: Rng + ?Sized
    {
        check_prob(self.two_qubit_prob, "two-qubit gate probability")?;
        if self.sets.is_empty() {
            return Err(RbError::Empty("compatible two-qubit gate sets"));
        }
        let one = gate_names(pspec, self.one_qubit_gate_names.as_deref(), 1)?;
        let k = match &self.set_weights {
            Some(w) => rng.sample(weighted_index(w, self.sets.len(), "set weights")?),
            None => rng.gen_range(0..self.sets.len()),
        };
        let chosen: &[GateLabel] = match &self.sets[k] {
            CompatibleGates::Set(gates) => gates,
            CompatibleGates::Nested(sub) => {
                if sub.is_empty() {
                    return Err(RbError::Empty("nested compatible gate set"));
                }
                &sub[rng.gen_range(0..sub.len())]
            },
        };
        check_native(pspec, chosen, 2)?;
        let mut claimed: Vec<usize> = Vec::new();
        let mut layer = Layer::idle();
        for gate in chosen.iter() {
            if let Some(q) = gate.qubits().iter().find(|q| !qubits.contains(q)) {
                return Err(RbError::InvalidStructure(format!(
                    "gate {} acts on qubit {} outside the sampled qubits", gate, q)));
            }
            if gate.qubits().iter().any(|q| claimed.contains(q)) {
                return Err(RbError::InvalidStructure(format!(
                    "gate {} overlaps another gate in its set", gate)));
            }
            claimed.extend_from_slice(gate.qubits());
            if rng.gen::<f64>() < self.two_qubit_prob {
                layer.push(gate.clone());
            }
        }
        fill_one_qubit(&mut layer, qubits, &one, rng)?;
        Ok(layer)
    }
}

/// Independent random single-qubit gates on every qubit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Local {
    /// Single-qubit gate names to draw from; all natives if `None`.
    pub gate_names: Option<Vec<String>>,
    /// Weights for `gate_names`; uniform if `None`.
    pub weights: Option<Vec<f64>>,
}

impl Local {
    fn sample<R>(&self, pspec: &ProcessorSpec, qubits: &[usize], rng: &mut R)
        -> RbResult<Layer>
    where R: Rng + ?Sized
    {
        let names = gate_names(pspec, self.gate_names.as_deref(), 1)?;
        let dist
            = self.weights.as_ref()
            .map(|w| weighted_index(w, names.len(), "single-qubit gate weights"))
            .transpose()?;
        let mut layer = Layer::idle();
        for &q in qubits.iter() {
            if names.is_empty() { return Err(RbError::NoOneQubitGates(q)); }
            let k = match &dist {
                Some(d) => rng.sample(d),
                None => rng.gen_range(0..names.len()),
            };
            layer.push(GateLabel::one(names[k].as_str(), q));
        }
        Ok(layer)
    }
}

/// A layer-sampling strategy together with its arguments.
#[derive(Clone, Debug, PartialEq)]
pub enum Sampler {
    PairingQubits(PairingQubits),
    EdgeGrab(EdgeGrab),
    QElimination(QElimination),
    Co2QGates(Co2QGates),
    Local(Local),
}

impl From<PairingQubits> for Sampler {
    fn from(s: PairingQubits) -> Self { Self::PairingQubits(s) }
}

impl From<EdgeGrab> for Sampler {
    fn from(s: EdgeGrab) -> Self { Self::EdgeGrab(s) }
}

impl From<QElimination> for Sampler {
    fn from(s: QElimination) -> Self { Self::QElimination(s) }
}

impl From<Co2QGates> for Sampler {
    fn from(s: Co2QGates) -> Self { Self::Co2QGates(s) }
}

impl From<Local> for Sampler {
    fn from(s: Local) -> Self { Self::Local(s) }
}

// strategies that can be built from a bare name; co2Qgates always needs its
// sets
static SAMPLERS_BY_NAME: Lazy<HashMap<&'static str, fn() -> Sampler>>
    = Lazy::new(|| {
        let mut table: HashMap<&'static str, fn() -> Sampler> = HashMap::default();
        table.insert("pairingQs", || PairingQubits::default().into());
        table.insert("edgegrab", || EdgeGrab::default().into());
        table.insert("Qelimination", || QElimination::default().into());
        table.insert("local", || Local::default().into());
        table
    });

impl FromStr for Sampler {
    type Err = RbError;

    /// Build a sampler with default arguments from its name: `"pairingQs"`,
    /// `"edgegrab"`, `"Qelimination"`, or `"local"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SAMPLERS_BY_NAME.get(s)
            .map(|build| build())
            .ok_or_else(|| RbError::UnknownSampler(s.to_string()))
    }
}

impl Sampler {
    /// Name of the strategy.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PairingQubits(_) => "pairingQs",
            Self::EdgeGrab(_) => "edgegrab",
            Self::QElimination(_) => "Qelimination",
            Self::Co2QGates(_) => "co2Qgates",
            Self::Local(_) => "local",
        }
    }

    /// Sample one complete layer on `qubits` (every device qubit if `None`).
    ///
    /// *Panics* if the sampled layer is not complete, which indicates a
    /// defect in the strategy rather than a bad configuration.
    pub fn sample_layer<R>(
        &self,
        pspec: &ProcessorSpec,
        qubits: Option<&[usize]>,
        rng: &mut R,
    ) -> RbResult<Layer>
    where R: Rng + ?Sized
    {
        let qubits = target_qubits(pspec, qubits)?;
        let layer = match self {
            Self::PairingQubits(s) => s.sample(pspec, &qubits, rng)?,
            Self::EdgeGrab(s) => s.sample(pspec, &qubits, rng)?,
            Self::QElimination(s) => s.sample(pspec, &qubits, rng)?,
            Self::Co2QGates(s) => s.sample(pspec, &qubits, rng)?,
            Self::Local(s) => s.sample(pspec, &qubits, rng)?,
        };
        assert!(
            layer.is_complete_on(&qubits),
            "{} sampler produced an incomplete layer {} on {:?}",
            self.name(), layer, qubits,
        );
        Ok(layer)
    }
}

/// Every set of `n` gates named `gate_name` on pairwise disjoint edges from
/// `edges`, with each gate oriented as its edge.
pub fn find_all_sets_of_compatible_two_qubit_gates(
    edges: &[(usize, usize)],
    n: usize,
    gate_name: &str,
) -> Vec<Vec<GateLabel>>
{
    edges.iter()
        .combinations(n)
        .filter(|set| {
            set.iter().flat_map(|(a, b)| [*a, *b]).all_unique()
        })
        .map(|set| {
            set.into_iter()
                .map(|&(a, b)| GateLabel::two(gate_name, a, b))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{ SeedableRng, rngs::StdRng };

    fn device(n: usize, edges: Option<&[(usize, usize)]>) -> ProcessorSpec {
        ProcessorSpec::new(
            (0..n).collect(),
            &["Gxpi2", "Gxmpi2", "Gypi2", "Gympi2", "Gcnot", "Gcphase"],
            edges,
        ).unwrap()
    }

    #[test]
    fn compatible_sets_are_disjoint() {
        let edges = [(0, 1), (1, 2), (2, 3), (3, 0)];
        let sets = find_all_sets_of_compatible_two_qubit_gates(&edges, 2, "Gcphase");
        assert_eq!(sets.len(), 2);
        for set in sets.iter() {
            assert_eq!(Layer::new(set.clone()).qubits().len(), 4);
        }
        assert_eq!(find_all_sets_of_compatible_two_qubit_gates(&edges, 1, "Gcnot").len(), 4);
        assert!(find_all_sets_of_compatible_two_qubit_gates(&edges, 3, "Gcnot").is_empty());
    }

    #[test]
    fn sampler_names_resolve() {
        for name in ["pairingQs", "edgegrab", "Qelimination", "local"] {
            assert_eq!(name.parse::<Sampler>().unwrap().name(), name);
        }
        assert_eq!(
            "co2Qgates".parse::<Sampler>().unwrap_err(),
            RbError::UnknownSampler("co2Qgates".to_string()),
        );
        assert!("random".parse::<Sampler>().is_err());
    }

    #[test]
    fn pairing_always_pairs_with_prob_one() {
        let pspec = device(2, None);
        let sampler: Sampler = PairingQubits { two_qubit_prob: 1.0, ..Default::default() }.into();
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..20 {
            let layer = sampler.sample_layer(&pspec, None, &mut rng).unwrap();
            assert_eq!(layer.len(), 1);
            assert_eq!(layer.gates()[0].arity(), 2);
        }
    }

    #[test]
    fn edgegrab_rejects_sparse_device() {
        let pspec = device(3, Some(&[(0, 1)]));
        let sampler: Sampler = EdgeGrab { mean_two_qubit_gates: 2.0 }.into();
        let mut rng = StdRng::seed_from_u64(1);
        let res = sampler.sample_layer(&pspec, None, &mut rng);
        assert!(matches!(res, Err(RbError::InsufficientConnectivity { available: 1, .. })));
    }

    #[test]
    fn edgegrab_single_qubit_has_no_edges() {
        let pspec = device(2, None);
        let sampler: Sampler = EdgeGrab { mean_two_qubit_gates: 0.5 }.into();
        let mut rng = StdRng::seed_from_u64(9);
        let res = sampler.sample_layer(&pspec, Some(&[1]), &mut rng);
        assert!(matches!(res, Err(RbError::InsufficientConnectivity { available: 0, .. })));

        let local: Sampler = EdgeGrab { mean_two_qubit_gates: 0.0 }.into();
        let layer = local.sample_layer(&pspec, Some(&[1]), &mut rng).unwrap();
        assert_eq!(layer.len(), 1);
    }

    #[test]
    fn edgegrab_respects_edges() {
        let edges = [(0, 1), (1, 2), (2, 3)];
        let pspec = device(4, Some(&edges));
        let sampler: Sampler = EdgeGrab { mean_two_qubit_gates: 1.0 }.into();
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..50 {
            let layer = sampler.sample_layer(&pspec, None, &mut rng).unwrap();
            for g in layer.iter().filter(|g| g.arity() == 2) {
                assert!(pspec.graph().has_edge(g.qubits()[0], g.qubits()[1]));
            }
        }
    }

    #[test]
    fn qelimination_on_subset() {
        let pspec = device(5, Some(&[(0, 1), (1, 2), (2, 3), (3, 4)]));
        let sampler: Sampler = QElimination::default().into();
        let mut rng = StdRng::seed_from_u64(3);
        let subset = [1, 2, 4];
        for _ in 0..30 {
            let layer = sampler.sample_layer(&pspec, Some(&subset), &mut rng).unwrap();
            assert!(layer.is_complete_on(&subset));
        }
    }

    #[test]
    fn qelimination_with_zero_prob_is_local() {
        let pspec = device(3, None);
        let sampler: Sampler
            = QElimination { two_qubit_prob: Some(0.0), ..Default::default() }.into();
        let mut rng = StdRng::seed_from_u64(4);
        let layer = sampler.sample_layer(&pspec, None, &mut rng).unwrap();
        assert_eq!(layer.two_qubit_gate_count(), 0);
    }

    #[test]
    fn co2q_uses_chosen_set() {
        let pspec = device(4, None);
        let set = vec![GateLabel::two("Gcnot", 0, 1), GateLabel::two("Gcnot", 3, 2)];
        let sampler: Sampler
            = Co2QGates::new(vec![CompatibleGates::Nested(vec![set.clone()])]).into();
        let mut rng = StdRng::seed_from_u64(5);
        let layer = sampler.sample_layer(&pspec, None, &mut rng).unwrap();
        assert_eq!(layer.two_qubit_gate_count(), 2);
        assert!(set.iter().all(|g| layer.gates().contains(g)));
    }

    #[test]
    #[should_panic(expected = "no gates left")]
    fn qelimination_panics_when_a_qubit_runs_out_of_gates() {
        let pspec = device(2, None);
        let sampler: Sampler = QElimination {
            one_qubit_gates: Some(vec![GateLabel::one("Gxpi2", 0)]),
            two_qubit_gates: Some(Vec::new()),
            ..Default::default()
        }.into();
        let mut rng = StdRng::seed_from_u64(10);
        let _ = sampler.sample_layer(&pspec, None, &mut rng);
    }

    #[test]
    fn non_native_labels_are_config_errors() {
        let pspec = device(2, None);
        let mut rng = StdRng::seed_from_u64(11);
        let qelim: Sampler = QElimination {
            one_qubit_gates: Some(vec![GateLabel::one("Gfoo", 0), GateLabel::one("Gxpi2", 1)]),
            ..Default::default()
        }.into();
        assert_eq!(
            qelim.sample_layer(&pspec, None, &mut rng).unwrap_err(),
            RbError::UnknownGate("Gfoo".to_string()),
        );
        let swapped: Sampler = QElimination {
            two_qubit_gates: Some(vec![GateLabel::one("Gxpi2", 0)]),
            ..Default::default()
        }.into();
        assert_eq!(
            swapped.sample_layer(&pspec, None, &mut rng).unwrap_err(),
            RbError::UnknownGate("Gxpi2".to_string()),
        );

        let no_cphase
            = ProcessorSpec::new(vec![0, 1], &["Gxpi2", "Gypi2", "Gcnot"], None).unwrap();
        let co2q: Sampler
            = Co2QGates::new(vec![CompatibleGates::Set(vec![GateLabel::two("Gcphase", 0, 1)])])
            .into();
        assert_eq!(
            co2q.sample_layer(&no_cphase, None, &mut rng).unwrap_err(),
            RbError::UnknownGate("Gcphase".to_string()),
        );
    }

    #[test]
    fn co2q_rejects_overlapping_sets_even_when_gates_are_dropped() {
        let pspec = device(3, None);
        let set = vec![GateLabel::two("Gcnot", 0, 1), GateLabel::two("Gcnot", 1, 2)];
        let sampler: Sampler = Co2QGates {
            two_qubit_prob: 0.0,
            ..Co2QGates::new(vec![CompatibleGates::Set(set)])
        }.into();
        let mut rng = StdRng::seed_from_u64(12);
        assert!(matches!(
            sampler.sample_layer(&pspec, None, &mut rng),
            Err(RbError::InvalidStructure(_)),
        ));
    }

    #[test]
    fn co2q_rejects_gates_outside_subset() {
        let pspec = device(4, None);
        let sampler: Sampler
            = Co2QGates::new(vec![CompatibleGates::Set(vec![GateLabel::two("Gcnot", 0, 3)])])
            .into();
        let mut rng = StdRng::seed_from_u64(6);
        let res = sampler.sample_layer(&pspec, Some(&[0, 1]), &mut rng);
        assert!(matches!(res, Err(RbError::InvalidStructure(_))));
    }

    #[test]
    fn local_with_weights() {
        let pspec = device(3, None);
        let sampler: Sampler = Local {
            gate_names: Some(vec!["Gxpi2".to_string(), "Gypi2".to_string()]),
            weights: Some(vec![0.0, 1.0]),
        }.into();
        let mut rng = StdRng::seed_from_u64(7);
        let layer = sampler.sample_layer(&pspec, None, &mut rng).unwrap();
        assert!(layer.iter().all(|g| g.name() == "Gypi2"));

        let bad: Sampler = Local {
            gate_names: None,
            weights: Some(vec![1.0]),
        }.into();
        assert!(matches!(
            bad.sample_layer(&pspec, None, &mut rng),
            Err(RbError::InvalidDistribution(_)),
        ));
    }

    #[test]
    fn unknown_qubit_is_config_error() {
        let pspec = device(2, None);
        let sampler: Sampler = Local::default().into();
        let mut rng = StdRng::seed_from_u64(8);
        assert_eq!(
            sampler.sample_layer(&pspec, Some(&[0, 7]), &mut rng).unwrap_err(),
            RbError::UnknownQubit(7),
        );
    }
}
