use std::cell::Cell;
use clifford_rb::{
    RbResult,
    circuit::Circuit,
    compiler::{ Compiler, CostFunction, SynthesisCompiler },
    device::ProcessorSpec,
    rb::{
        CliffordRbConfig,
        DirectRbConfig,
        MirrorRbConfig,
        clifford_rb_circuit,
        direct_rb_circuit,
        mirror_rb_circuit,
        outcome_probabilities,
        random_circuit,
    },
    sampler::{
        Co2QGates,
        CompatibleGates,
        EdgeGrab,
        Local,
        PairingQubits,
        QElimination,
        Sampler,
        find_all_sets_of_compatible_two_qubit_gates,
    },
    symplectic::CliffordRep,
};
use proptest::prelude::*;
use rand::{ Rng, SeedableRng, rngs::StdRng };

const NATIVES: &[&str]
    = &["Gxpi2", "Gxmpi2", "Gypi2", "Gympi2", "Gxpi", "Gypi", "Gzpi", "Gcnot"];

fn line_edges(n: usize) -> Vec<(usize, usize)> {
    (0..n.saturating_sub(1)).map(|k| (k, k + 1)).collect()
}

fn line(n: usize) -> ProcessorSpec {
    ProcessorSpec::new((0..n).collect(), NATIVES, Some(&line_edges(n))).unwrap()
}

// every set of one up to n / 2 disjoint CNOTs along the line
fn compatible_sets(n: usize) -> Vec<CompatibleGates> {
    let edges = line_edges(n);
    (1..=n / 2)
        .flat_map(|k| find_all_sets_of_compatible_two_qubit_gates(&edges, k, "Gcnot"))
        .map(CompatibleGates::Set)
        .collect()
}

fn compiler() -> SynthesisCompiler { SynthesisCompiler::new(4, CostFunction::TwoQubitGates) }

// counts full Clifford compilations
struct Counting {
    inner: SynthesisCompiler,
    cliffords: Cell<usize>,
}

impl Compiler for Counting {
    fn compile_clifford<R>(
        &self,
        rep: &CliffordRep,
        pspec: &ProcessorSpec,
        qubits: &[usize],
        rng: &mut R,
    ) -> RbResult<Circuit>
    where R: Rng + ?Sized
    {
        self.cliffords.set(self.cliffords.get() + 1);
        self.inner.compile_clifford(rep, pspec, qubits, rng)
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
        self.inner.compile_stabilizer_state(rep, pspec, qubits, rng)
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
        self.inner.compile_stabilizer_measurement(rep, pspec, qubits, rng)
    }
}

fn sampler_strategy(n: usize) -> impl Strategy<Value = Sampler> {
    prop_oneof![
        (0.0..=1.0_f64)
            .prop_map(move |p| {
                Sampler::from(Co2QGates { two_qubit_prob: p, ..Co2QGates::new(compatible_sets(n)) })
            }),
        (0.0..=1.0_f64)
            .prop_map(|p| Sampler::from(PairingQubits { two_qubit_prob: p, ..Default::default() })),
        (0.0..=1.0_f64)
            .prop_map(|m| Sampler::from(EdgeGrab { mean_two_qubit_gates: m })),
        Just(Sampler::from(QElimination::default())),
        Just(Sampler::from(Local::default())),
    ]
}

fn as_probabilities(bits: &[u8]) -> Vec<f64> { bits.iter().map(|b| f64::from(*b)).collect() }

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn sampled_layers_cover_every_qubit(
        (n, sampler) in (3..7_usize).prop_flat_map(|n| (Just(n), sampler_strategy(n))),
        seed in any::<u64>(),
    ) {
        let pspec = line(n);
        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..4 {
            let layer = sampler.sample_layer(&pspec, None, &mut rng).unwrap();
            prop_assert!(layer.is_complete_on(pspec.qubit_labels()));
        }
        let circuit = random_circuit(&pspec, 5, None, &sampler, None, &mut rng).unwrap();
        prop_assert_eq!(circuit.depth(), 5);
    }

    #[test]
    fn clifford_rb_inverts(n in 1..4_usize, length in 0..4_usize, seed in any::<u64>()) {
        let pspec = line(n);
        let mut rng = StdRng::seed_from_u64(seed);
        let crb
            = clifford_rb_circuit(
                &pspec, &compiler(), length, None, &CliffordRbConfig::default(), &mut rng)
            .unwrap();
        prop_assert_eq!(&crb.ideal_out, &vec![0; n]);
        prop_assert_eq!(outcome_probabilities(&pspec, &crb.circuit), vec![0.0; n]);
    }

    #[test]
    fn randomized_clifford_rb_outcome_is_deterministic(n in 1..4_usize, seed in any::<u64>()) {
        let pspec = line(n);
        let mut rng = StdRng::seed_from_u64(seed);
        let config = CliffordRbConfig { randomize_out: true };
        let crb = clifford_rb_circuit(&pspec, &compiler(), 2, None, &config, &mut rng).unwrap();
        prop_assert_eq!(
            outcome_probabilities(&pspec, &crb.circuit),
            as_probabilities(&crb.ideal_out),
        );
    }

    #[test]
    fn direct_rb_outcome_is_deterministic(
        n in 1..4_usize,
        length in 0..6_usize,
        clifford_twirl in any::<bool>(),
        conditional_twirl in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let pspec = line(n);
        let mut rng = StdRng::seed_from_u64(seed);
        let config = DirectRbConfig {
            clifford_twirl,
            conditional_twirl,
            partitioned: true,
            ..Default::default()
        };
        let drb
            = direct_rb_circuit(&pspec, &compiler(), length, None, &config, &mut rng)
            .unwrap();
        prop_assert_eq!(
            outcome_probabilities(&pspec, &drb.circuit),
            as_probabilities(&drb.ideal_out),
        );
        let parts = drb.parts.unwrap();
        prop_assert_eq!(parts.core.depth(), length);
        prop_assert_eq!(parts.twirl.is_some(), clifford_twirl);
    }

    #[test]
    fn mirror_rb_outcome_is_deterministic(
        n in 1..5_usize,
        half in 0..5_usize,
        local_clifford in any::<bool>(),
        pauli_randomize in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let pspec = line(n);
        let mut rng = StdRng::seed_from_u64(seed);
        let config = MirrorRbConfig { local_clifford, pauli_randomize, ..Default::default() };
        let mrb = mirror_rb_circuit(&pspec, 2 * half, None, &config, &mut rng).unwrap();
        prop_assert_eq!(
            outcome_probabilities(&pspec, &mrb.circuit),
            as_probabilities(&mrb.ideal_out),
        );
        if !pauli_randomize {
            prop_assert_eq!(&mrb.ideal_out, &vec![0; n]);
        }
    }
}

#[test]
fn two_qubit_pairing_always_entangles() {
    let pspec = line(2);
    let mut rng = StdRng::seed_from_u64(10546);
    let sampler: Sampler = PairingQubits { two_qubit_prob: 1.0, ..Default::default() }.into();
    let circuit = random_circuit(&pspec, 10, None, &sampler, None, &mut rng).unwrap();
    assert_eq!(circuit.depth(), 10);
    for layer in circuit.layers() {
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.two_qubit_gate_count(), 1);
    }
}

#[test]
fn shortest_clifford_rb_on_one_qubit() {
    let pspec = line(1);
    let mut rng = StdRng::seed_from_u64(2718);
    let counting = Counting { inner: compiler(), cliffords: Cell::new(0) };
    let crb
        = clifford_rb_circuit(
            &pspec, &counting, 0, Some(&[0]), &CliffordRbConfig::default(), &mut rng)
        .unwrap();
    assert_eq!(counting.cliffords.get(), 2);
    assert_eq!(crb.ideal_out, vec![0]);
    assert_eq!(crb.circuit.line_labels(), &[0]);
    assert_eq!(crb.circuit.two_qubit_gate_count(), 0);
}

#[test]
fn undressed_mirror_circuit() {
    let pspec = line(3);
    let mut rng = StdRng::seed_from_u64(31415);
    let config = MirrorRbConfig {
        local_clifford: false,
        pauli_randomize: false,
        ..Default::default()
    };
    let mrb = mirror_rb_circuit(&pspec, 4, None, &config, &mut rng).unwrap();
    assert_eq!(mrb.circuit.depth(), 4);
    assert_eq!(mrb.ideal_out, vec![0, 0, 0]);
    assert!(pspec.rep_of_circuit(&mrb.circuit).is_identity());
}
