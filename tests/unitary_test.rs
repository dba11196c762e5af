//! Checks of the symplectic gate representations against dense unitaries.
//!
//! A Clifford *C* is represented by *(S, p)* with
//! *C P(eⱼ) C† = i^pⱼ P(Seⱼ)*, where *P(x, z) = X^x Z^z* and qubit 0 is the
//! leftmost tensor factor.

use std::f64::consts::FRAC_PI_2;
use clifford_rb::{
    circuit::Circuit,
    device::ProcessorSpec,
    gate::{ GateLabel, one_qubit_cliffords, standard_rep },
    rb::{ outcome_probabilities, random_circuit },
    sampler::{ PairingQubits, Sampler },
    symplectic::CliffordRep,
};
use nalgebra::{ DMatrix, DVector };
use num_complex::Complex64 as C64;
use proptest::prelude::*;
use rand::{ SeedableRng, rngs::StdRng };

const EPSILON: f64 = 1e-9;

fn c(re: f64, im: f64) -> C64 { C64::new(re, im) }

fn mat2(a: C64, b: C64, cc: C64, d: C64) -> DMatrix<C64> {
    DMatrix::from_row_slice(2, 2, &[a, b, cc, d])
}

fn pauli_x() -> DMatrix<C64> { mat2(c(0.0, 0.0), c(1.0, 0.0), c(1.0, 0.0), c(0.0, 0.0)) }
fn pauli_y() -> DMatrix<C64> { mat2(c(0.0, 0.0), c(0.0, -1.0), c(0.0, 1.0), c(0.0, 0.0)) }
fn pauli_z() -> DMatrix<C64> { mat2(c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(-1.0, 0.0)) }

// exp(-iθP/2)
fn rot(p: DMatrix<C64>, theta: f64) -> DMatrix<C64> {
    DMatrix::identity(2, 2) * c((theta / 2.0).cos(), 0.0)
        - p * c(0.0, (theta / 2.0).sin())
}

fn unitary(name: &str) -> DMatrix<C64> {
    let zero = c(0.0, 0.0);
    let one = c(1.0, 0.0);
    let h = c(std::f64::consts::FRAC_1_SQRT_2, 0.0);
    match name {
        "Gi" => DMatrix::identity(2, 2),
        "Gxpi" => pauli_x(),
        "Gypi" => pauli_y(),
        "Gzpi" => pauli_z(),
        "Gh" => mat2(h, h, h, -h),
        "Gp" => mat2(one, zero, zero, c(0.0, 1.0)),
        "Gpdag" => mat2(one, zero, zero, c(0.0, -1.0)),
        "Gxpi2" => rot(pauli_x(), FRAC_PI_2),
        "Gxmpi2" => rot(pauli_x(), -FRAC_PI_2),
        "Gypi2" => rot(pauli_y(), FRAC_PI_2),
        "Gympi2" => rot(pauli_y(), -FRAC_PI_2),
        "Gzpi2" => rot(pauli_z(), FRAC_PI_2),
        "Gzmpi2" => rot(pauli_z(), -FRAC_PI_2),
        "Gcnot" => DMatrix::from_fn(4, 4, |i, j| {
            let image = if j >= 2 { j ^ 1 } else { j };
            if i == image { one } else { zero }
        }),
        "Gcphase" => DMatrix::from_diagonal(&DVector::from_vec(vec![one, one, one, -one])),
        "Gswap" => DMatrix::from_fn(4, 4, |i, j| {
            let image = ((j & 1) << 1) | (j >> 1);
            if i == image { one } else { zero }
        }),
        _ => panic!("no unitary for {}", name),
    }
}

// act with `g` on qubits `qs` (first listed qubit is the most significant
// factor of `g`) inside an `n`-qubit register
fn embed(g: &DMatrix<C64>, qs: &[usize], n: usize) -> DMatrix<C64> {
    let dim = 1 << n;
    let k = qs.len();
    let shift = |q: usize| n - 1 - q;
    let mut out = DMatrix::zeros(dim, dim);
    for i in 0..dim {
        let sub_in
            = qs.iter()
            .fold(0, |acc, &q| (acc << 1) | ((i >> shift(q)) & 1));
        let rest = qs.iter().fold(i, |acc, &q| acc & !(1 << shift(q)));
        for sub_out in 0..1 << k {
            let j
                = qs.iter().enumerate()
                .fold(rest, |acc, (m, &q)| {
                    acc | (((sub_out >> (k - 1 - m)) & 1) << shift(q))
                });
            out[(j, i)] = g[(sub_out, sub_in)];
        }
    }
    out
}

fn pauli_product(bits: &[u8]) -> DMatrix<C64> {
    let n = bits.len() / 2;
    (0..n).fold(DMatrix::identity(1 << n, 1 << n), |acc, q| {
        let mut local = DMatrix::identity(2, 2);
        if bits[q] == 1 { local = pauli_x(); }
        if bits[n + q] == 1 { local *= pauli_z(); }
        acc * embed(&local, &[q], n)
    })
}

fn close(a: &DMatrix<C64>, b: &DMatrix<C64>) -> bool { (a - b).norm() < EPSILON }

// recover (S, p) from a unitary by conjugating each generator
fn rep_of_unitary(u: &DMatrix<C64>, n: usize) -> CliffordRep {
    let candidates: Vec<(Vec<u8>, DMatrix<C64>)>
        = (0..1_usize << (2 * n))
        .map(|a| {
            let bits: Vec<u8> = (0..2 * n).map(|m| ((a >> m) & 1) as u8).collect();
            let p = pauli_product(&bits);
            (bits, p)
        })
        .collect();
    let phases = [c(1.0, 0.0), c(0.0, 1.0), c(-1.0, 0.0), c(0.0, -1.0)];
    let mut s = DMatrix::<u8>::zeros(2 * n, 2 * n);
    let mut p = DVector::<u8>::zeros(2 * n);
    for j in 0..2 * n {
        let mut e = vec![0; 2 * n];
        e[j] = 1;
        let image = u * pauli_product(&e) * u.adjoint();
        let (col, k)
            = candidates.iter()
            .find_map(|(bits, pm)| {
                phases.iter()
                    .position(|ph| close(&image, &(pm * *ph)))
                    .map(|k| (bits.clone(), k))
            })
            .expect("conjugated generator is not a Pauli");
        s.column_mut(j).copy_from_slice(&col);
        p[j] = k as u8;
    }
    CliffordRep::new(s, p)
}

fn unitary_of_circuit(circuit: &Circuit) -> DMatrix<C64> {
    let labels = circuit.line_labels();
    let n = labels.len();
    circuit.gates()
        .fold(DMatrix::identity(1 << n, 1 << n), |acc, gate| {
            let qs: Vec<usize>
                = gate.qubits().iter()
                .map(|q| labels.iter().position(|l| l == q).unwrap())
                .collect();
            embed(&unitary(gate.name()), &qs, n) * acc
        })
}

const LIBRARY: &[&str] = &[
    "Gi", "Gxpi", "Gypi", "Gzpi", "Gh", "Gp", "Gpdag",
    "Gxpi2", "Gxmpi2", "Gypi2", "Gympi2", "Gzpi2", "Gzmpi2",
    "Gcnot", "Gcphase", "Gswap",
];

#[test]
fn standard_library_matches_unitaries() {
    for name in LIBRARY.iter() {
        let u = unitary(name);
        let n = if u.nrows() == 2 { 1 } else { 2 };
        let rep = standard_rep(name).unwrap();
        assert_eq!(rep, &rep_of_unitary(&u, n), "{}", name);
    }
}

#[test]
fn one_qubit_cliffords_compile_to_matching_unitaries() {
    let pspec = ProcessorSpec::new(vec![0], &["Gh", "Gp"], None).unwrap();
    let cliffords = one_qubit_cliffords();
    assert_eq!(cliffords.len(), 24);
    for (k, rep) in cliffords.iter().enumerate() {
        let u
            = pspec.compile_one_qubit(rep).unwrap().iter()
            .fold(DMatrix::identity(2, 2), |acc, name| unitary(name) * acc);
        assert_eq!(rep, &rep_of_unitary(&u, 1), "C{}", k);
    }
}

#[test]
fn reversed_two_qubit_gates() {
    let pspec = ProcessorSpec::new(vec![0, 1], &["Gh", "Gcnot", "Gcphase"], None).unwrap();
    for name in ["Gcnot", "Gcphase"] {
        let circuit
            = Circuit::parallelize([GateLabel::two(name, 1, 0)], vec![0, 1]);
        assert_eq!(
            pspec.rep_of_circuit(&circuit),
            rep_of_unitary(&unitary_of_circuit(&circuit), 2),
        );
    }
}

// all-to-all, since qubit pairing ignores connectivity
fn device(n: usize) -> ProcessorSpec {
    ProcessorSpec::new(
        (0..n).collect(),
        &["Gxpi2", "Gympi2", "Gp", "Gh", "Gzpi", "Gcnot", "Gcphase", "Gswap"],
        None,
    ).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn circuit_reps_match_unitaries(n in 1..4_usize, length in 0..8_usize, seed in any::<u64>()) {
        let pspec = device(n);
        let mut rng = StdRng::seed_from_u64(seed);
        let sampler: Sampler = PairingQubits::default().into();
        let circuit = random_circuit(&pspec, length, None, &sampler, None, &mut rng).unwrap();
        let u = unitary_of_circuit(&circuit);
        prop_assert_eq!(pspec.rep_of_circuit(&circuit), rep_of_unitary(&u, n));
    }

    #[test]
    fn outcome_probabilities_match_state_vector(
        n in 1..4_usize,
        length in 0..8_usize,
        seed in any::<u64>(),
    ) {
        let pspec = device(n);
        let mut rng = StdRng::seed_from_u64(seed);
        let sampler: Sampler = PairingQubits::default().into();
        let circuit = random_circuit(&pspec, length, None, &sampler, None, &mut rng).unwrap();
        let psi = unitary_of_circuit(&circuit).column(0).into_owned();
        let expected: Vec<f64>
            = (0..n)
            .map(|q| {
                psi.iter().enumerate()
                    .filter(|(i, _)| (i >> (n - 1 - q)) & 1 == 1)
                    .map(|(_, a)| a.norm_sqr())
                    .sum()
            })
            .collect();
        let found = outcome_probabilities(&pspec, &circuit);
        for (f, e) in found.iter().zip(&expected) {
            prop_assert!((f - e).abs() < EPSILON, "{:?} != {:?}", found, expected);
        }
    }
}
