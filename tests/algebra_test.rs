use clifford_rb::{
    circuit::CircuitBuilder,
    device::ProcessorSpec,
    rb::random_circuit,
    sampler::{ QElimination, Sampler },
    stabilizer::{ apply_clifford_to_stabilizer_state, prep_stabilizer_state },
    symplectic::{
        CliffordRep,
        compose,
        inverse,
        is_symplectic,
        random_clifford,
        random_phase_vector,
        symplectic_form,
    },
};
use proptest::prelude::*;
use rand::{ SeedableRng, rngs::StdRng };

prop_compose! {
    fn arbitrary_clifford(qubits: std::ops::Range<usize>)
        (n in qubits, seed in any::<u64>()) -> CliffordRep
    {
        random_clifford(n, &mut StdRng::seed_from_u64(seed))
    }
}

fn invertible_device(n: usize) -> ProcessorSpec {
    let edges: Vec<(usize, usize)> = (0..n.saturating_sub(1)).map(|k| (k, k + 1)).collect();
    ProcessorSpec::new(
        (0..n).collect(),
        &["Gxpi2", "Gxmpi2", "Gypi2", "Gympi2", "Gp", "Gpdag", "Gh", "Gcnot", "Gcphase"],
        Some(&edges),
    ).unwrap()
}

proptest! {
    #[test]
    fn random_cliffords_are_symplectic(clifford in arbitrary_clifford(1..8)) {
        prop_assert!(is_symplectic(clifford.s()));
        prop_assert!(clifford.is_valid());
    }

    #[test]
    fn compose_with_inverse_is_identity(clifford in arbitrary_clifford(1..7)) {
        let inv = inverse(&clifford);
        prop_assert!(compose(&clifford, &inv).is_identity());
        prop_assert!(compose(&inv, &clifford).is_identity());
    }

    #[test]
    fn composition_is_associative(
        a in arbitrary_clifford(3..4),
        b in arbitrary_clifford(3..4),
        c in arbitrary_clifford(3..4),
    ) {
        prop_assert_eq!(compose(&compose(&a, &b), &c), compose(&a, &compose(&b, &c)));
    }

    #[test]
    fn inverse_of_composition(a in arbitrary_clifford(2..3), b in arbitrary_clifford(2..3)) {
        prop_assert_eq!(inverse(&compose(&a, &b)), compose(&inverse(&b), &inverse(&a)));
    }

    #[test]
    fn random_phases_differ_by_a_pauli(clifford in arbitrary_clifford(1..6), seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let other = clifford.with_phases(random_phase_vector(clifford.s(), &mut rng));
        prop_assert!(other.is_valid());
        prop_assert!(compose(&other, &inverse(&clifford)).is_pauli());
    }

    #[test]
    fn structural_inverse_round_trip(n in 1..5_usize, length in 0..12_usize, seed in any::<u64>()) {
        let pspec = invertible_device(n);
        let mut rng = StdRng::seed_from_u64(seed);
        let sampler: Sampler = QElimination::default().into();
        let circuit = random_circuit(&pspec, length, None, &sampler, None, &mut rng).unwrap();
        let back = pspec.invert_circuit(&circuit).unwrap();
        let forward = pspec.rep_of_circuit(&circuit);
        prop_assert!(compose(&forward, &pspec.rep_of_circuit(&back)).is_identity());

        let mut builder = CircuitBuilder::from(circuit);
        builder.append_circuit(&back);
        prop_assert!(pspec.rep_of_circuit(&builder.finalize()).is_identity());
    }

    #[test]
    fn clifford_then_inverse_restores_basis_state(
        clifford in arbitrary_clifford(1..6),
        bits in prop::collection::vec(0..2_u8, 6),
    ) {
        let n = clifford.num_qubits();
        let input = prep_stabilizer_state(n, Some(&bits[..n]));
        let there = apply_clifford_to_stabilizer_state(&clifford, &input);
        let back = apply_clifford_to_stabilizer_state(&inverse(&clifford), &there);
        prop_assert_eq!(back.deterministic_outcome(), bits[..n].to_vec());
    }
}

#[test]
fn symplectic_form_shape() {
    let u = symplectic_form(2);
    assert_eq!(u.nrows(), 4);
    assert!(is_symplectic(&u));
    assert!(!is_symplectic(&nalgebra::DMatrix::zeros(4, 4)));
}
