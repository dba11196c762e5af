//! Stabilizer states tracked through the symplectic representation.
//!
//! An *n*-qubit stabilizer state is stored as the Clifford that prepares it
//! from ∣0...0⟩. Columns *n..2n* of its matrix are the stabilizer generators
//! (images of the *Zⱼ*) and columns *0..n* are the matching destabilizers.
//! States are never mutated: evolving a state returns a new one.

use crate::symplectic::CliffordRep;

/// The result of a computational-basis measurement, generated by
/// [`pauli_z_measurement`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// A deterministic outcome resulting in ∣0⟩
    Det0,
    /// A deterministic outcome resulting in ∣1⟩
    Det1,
    /// A uniformly random outcome
    Random,
}

impl Outcome {
    /// Probability of observing ∣1⟩.
    pub fn prob_one(&self) -> f64 {
        match self {
            Self::Det0 => 0.0,
            Self::Det1 => 1.0,
            Self::Random => 0.5,
        }
    }

    /// The measured bit, if deterministic.
    pub fn bit(&self) -> Option<u8> {
        match self {
            Self::Det0 => Some(0),
            Self::Det1 => Some(1),
            Self::Random => None,
        }
    }

    /// Return `true` if the outcome is deterministic.
    pub fn is_deterministic(&self) -> bool { !matches!(self, Self::Random) }
}

/// A stabilizer state on *n* qubits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StabilizerState {
    rep: CliffordRep,
}

impl StabilizerState {
    /// Wrap the representation of the Clifford that prepares the state from
    /// ∣0...0⟩.
    pub fn from_rep(rep: CliffordRep) -> Self { Self { rep } }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize { self.rep.num_qubits() }

    /// The underlying representation.
    pub fn rep(&self) -> &CliffordRep { &self.rep }

    /// Apply a Clifford, returning the new state.
    pub fn evolve(&self, clifford: &CliffordRep) -> Self {
        Self { rep: self.rep.compose(clifford) }
    }

    /// Measure qubit `q` in the *Z* basis without collapsing the state.
    ///
    /// *Panics* if the state is inconsistent, i.e. the destabilizer
    /// decomposition of *Z_q* does not reproduce *±Z_q*.
    pub fn measure_z(&self, q: usize) -> Outcome {
        let n = self.num_qubits();
        assert!(q < n, "measure_z: qubit index {} out of range", q);
        let s = self.rep.s();
        let p = self.rep.p();
        if (0..n).any(|k| s[(q, n + k)] == 1) { return Outcome::Random; }

        // Z_q is (up to sign) the product of the stabilizers whose partner
        // destabilizers have an X on q
        let mut acc: Vec<u8> = vec![0; 2 * n];
        let mut ph: u32 = 0;
        for k in (0..n).filter(|&k| s[(q, k)] == 1) {
            let v = s.column(n + k);
            ph += u32::from(p[n + k]);
            ph += 2 * (0..n)
                .map(|i| u32::from(acc[n + i] & v[i]))
                .sum::<u32>();
            acc.iter_mut().zip(v.iter()).for_each(|(a, b)| *a ^= b);
        }
        let target_ok
            = acc.iter().enumerate()
            .all(|(i, b)| *b == u8::from(i == n + q));
        assert!(target_ok, "measure_z: stabilizer product is not Z_{}", q);
        match ph % 4 {
            0 => Outcome::Det0,
            2 => Outcome::Det1,
            x => panic!("measure_z: non-Hermitian stabilizer product phase i^{}", x),
        }
    }

    /// Measure every qubit and return the probabilities of ∣1⟩.
    pub fn outcome_probabilities(&self) -> Vec<f64> {
        (0..self.num_qubits()).map(|q| self.measure_z(q).prob_one()).collect()
    }

    /// Measure every qubit, requiring each outcome to be deterministic.
    ///
    /// *Panics* on any random outcome.
    pub fn deterministic_outcome(&self) -> Vec<u8> {
        (0..self.num_qubits())
            .map(|q| {
                self.measure_z(q).bit()
                    .unwrap_or_else(|| {
                        panic!("ideal outcome on qubit {} is not deterministic", q)
                    })
            })
            .collect()
    }

    /// Return `true` if both describe the same state, up to global phase.
    pub fn same_state(&self, other: &StabilizerState) -> bool {
        let diff = Self { rep: self.rep.compose(&other.rep.inverse()) };
        (0..self.num_qubits()).all(|q| diff.measure_z(q) == Outcome::Det0)
    }
}

/// Prepare the computational basis state with the given bits (all zero if
/// `zvals` is `None`).
pub fn prep_stabilizer_state(n: usize, zvals: Option<&[u8]>) -> StabilizerState {
    let mut x: Vec<u8> = vec![0; n];
    if let Some(z) = zvals {
        assert_eq!(z.len(), n, "prep_stabilizer_state: wrong number of bits");
        x.copy_from_slice(z);
    }
    // flipping a bit negates the matching Z stabilizer
    StabilizerState { rep: CliffordRep::pauli(&x, &vec![0; n]) }
}

/// Apply the Clifford `clifford` to `state`, returning the new state.
pub fn apply_clifford_to_stabilizer_state(
    clifford: &CliffordRep,
    state: &StabilizerState,
) -> StabilizerState
{
    state.evolve(clifford)
}

/// Measure qubit `q` of `state` in the computational basis.
pub fn pauli_z_measurement(state: &StabilizerState, q: usize) -> Outcome {
    state.measure_z(q)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{ SeedableRng, rngs::StdRng };
    use crate::symplectic::random_clifford;

    #[test]
    fn prep_reproduces_bits() {
        let bits = [1, 0, 1, 1];
        let state = prep_stabilizer_state(4, Some(&bits));
        assert_eq!(state.deterministic_outcome(), bits.to_vec());
        let zero = prep_stabilizer_state(3, None);
        assert_eq!(zero.deterministic_outcome(), vec![0, 0, 0]);
    }

    #[test]
    fn x_flips_measurement() {
        let state = prep_stabilizer_state(2, None);
        let x1 = CliffordRep::pauli(&[0, 1], &[0, 0]);
        let out = apply_clifford_to_stabilizer_state(&x1, &state);
        assert_eq!(pauli_z_measurement(&out, 0), Outcome::Det0);
        assert_eq!(pauli_z_measurement(&out, 1), Outcome::Det1);
    }

    #[test]
    fn hadamard_gives_random_outcome() {
        let h = CliffordRep::from_rows(&[&[0, 1], &[1, 0]], &[0, 0]);
        let out = prep_stabilizer_state(1, None).evolve(&h);
        assert_eq!(out.measure_z(0), Outcome::Random);
        assert_eq!(out.outcome_probabilities(), vec![0.5]);
    }

    #[test]
    fn clifford_then_inverse_returns_to_input() {
        let mut rng = StdRng::seed_from_u64(31415);
        for n in 1..=5 {
            let c = random_clifford(n, &mut rng);
            let bits: Vec<u8> = (0..n).map(|k| (k % 2) as u8).collect();
            let out
                = prep_stabilizer_state(n, Some(&bits))
                .evolve(&c)
                .evolve(&c.inverse());
            assert_eq!(out.deterministic_outcome(), bits);
        }
    }

    #[test]
    fn same_state_up_to_global_phase() {
        let mut rng = StdRng::seed_from_u64(5);
        let c = random_clifford(3, &mut rng);
        let a = prep_stabilizer_state(3, None).evolve(&c);
        // a Z on qubit 0 applied before c leaves c|000> unchanged
        let z0 = CliffordRep::pauli(&[0, 0, 0], &[1, 0, 0]);
        let b = prep_stabilizer_state(3, None).evolve(&z0).evolve(&c);
        assert!(a.same_state(&b));
        let x0 = CliffordRep::pauli(&[1, 0, 0], &[0, 0, 0]);
        let d = prep_stabilizer_state(3, None).evolve(&x0).evolve(&c);
        assert!(!a.same_state(&d));
    }
}
