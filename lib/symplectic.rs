//! Binary symplectic representation of *n*-qubit Clifford operations.
//!
//! A Clifford *C* is stored as a pair *(S, p)*, where *S* is a 2*n* × 2*n*
//! matrix over GF(2) and *p* is a length-2*n* vector of integers modulo 4.
//! Pauli operators are written as *P(a) = X^x Z^z* for a binary vector
//! *a = (x₀, ..., xₙ₋₁, z₀, ..., zₙ₋₁)*. Column *j* of *S* holds the image of
//! generator *j* (*Xⱼ* for *j* < *n*, *Zⱼ₋ₙ* otherwise) so that
//! ```text
//! C P(eⱼ) C† = i^pⱼ P(sⱼ)
//! ```
//! The phase picked up by an arbitrary Pauli is a quadratic form in *a*; see
//! [`CliffordRep::phase_of`].

use itertools::Itertools;
use nalgebra::{ DMatrix, DVector };
use rand::Rng;
use crate::circuit::Circuit;

/// Multiply two matrices over GF(2).
pub(crate) fn gf2_mul(a: &DMatrix<u8>, b: &DMatrix<u8>) -> DMatrix<u8> {
    assert_eq!(a.ncols(), b.nrows(), "gf2_mul: incompatible shapes");
    DMatrix::from_fn(a.nrows(), b.ncols(), |i, j| {
        a.row(i).iter().zip(b.column(j).iter())
            .fold(0, |acc, (x, y)| acc ^ (x & y))
    })
}

/// The 2*n* × 2*n* symplectic form *Ω = [[0, I], [I, 0]]*.
pub fn symplectic_form(n: usize) -> DMatrix<u8> {
    DMatrix::from_fn(2 * n, 2 * n, |i, j| u8::from(i + n == j || j + n == i))
}

/// Return `true` if `s` preserves the symplectic form, *Sᵀ Ω S = Ω*.
pub fn is_symplectic(s: &DMatrix<u8>) -> bool {
    if s.nrows() != s.ncols() || s.nrows() % 2 != 0 { return false; }
    let omega = symplectic_form(s.nrows() / 2);
    gf2_mul(&gf2_mul(&s.transpose(), &omega), s) == omega
}

// sum_{j in ones} p_j + 2 sum_{j < k in ones} m_jk  (mod 4)
fn phase_from(m: &DMatrix<u8>, p: &DVector<u8>, ones: &[usize]) -> u8 {
    let lin: u32 = ones.iter().map(|&j| u32::from(p[j])).sum();
    let quad: u32 = ones.iter()
        .tuple_combinations()
        .map(|(&j, &k)| u32::from(m[(j, k)]))
        .sum();
    ((lin + 2 * quad) % 4) as u8
}

fn column_support(s: &DMatrix<u8>, j: usize) -> Vec<usize> {
    s.column(j).iter().enumerate()
        .filter_map(|(i, b)| (*b == 1).then_some(i))
        .collect()
}

/// A Clifford operation as a symplectic matrix plus phase vector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CliffordRep {
    s: DMatrix<u8>,
    p: DVector<u8>,
}

impl CliffordRep {
    /// Create a new representation, reducing `s` modulo 2 and `p` modulo 4.
    ///
    /// *Panics* if `s` is not square with even dimension or if `p` has the
    /// wrong length.
    pub fn new(s: DMatrix<u8>, p: DVector<u8>) -> Self {
        let nn = s.nrows();
        if nn % 2 != 0 || s.ncols() != nn {
            panic!("CliffordRep::new: matrix must be square with even size");
        }
        if p.len() != nn {
            panic!("CliffordRep::new: phase vector must have length {}", nn);
        }
        Self { s: s.map(|b| b & 1), p: p.map(|v| v % 4) }
    }

    /// Create from row-major matrix entries and phases.
    pub fn from_rows(rows: &[&[u8]], p: &[u8]) -> Self {
        let nn = rows.len();
        let s = DMatrix::from_fn(nn, nn, |i, j| rows[i][j]);
        Self::new(s, DVector::from_column_slice(p))
    }

    /// The identity on `n` qubits.
    pub fn identity(n: usize) -> Self {
        Self {
            s: DMatrix::identity(2 * n, 2 * n),
            p: DVector::zeros(2 * n),
        }
    }

    /// The Pauli operator *X^x Z^z* (ignoring global phase).
    ///
    /// Its matrix is the identity and its phases are *2c* with
    /// *c = (z, x)*: generator *Xⱼ* flips sign exactly when *Zⱼ* is present
    /// and vice versa.
    pub fn pauli(x: &[u8], z: &[u8]) -> Self {
        assert_eq!(x.len(), z.len(), "CliffordRep::pauli: length mismatch");
        let n = x.len();
        let p = DVector::from_fn(2 * n, |j, _| {
            if j < n { 2 * (z[j] & 1) } else { 2 * (x[j - n] & 1) }
        });
        Self { s: DMatrix::identity(2 * n, 2 * n), p }
    }

    /// Number of qubits acted on.
    pub fn num_qubits(&self) -> usize { self.s.nrows() / 2 }

    /// The symplectic matrix.
    pub fn s(&self) -> &DMatrix<u8> { &self.s }

    /// The phase vector.
    pub fn p(&self) -> &DVector<u8> { &self.p }

    /// Split into matrix and phase vector.
    pub fn into_parts(self) -> (DMatrix<u8>, DVector<u8>) { (self.s, self.p) }

    /// Replace the phase vector, keeping the matrix.
    pub fn with_phases(&self, p: DVector<u8>) -> Self {
        Self::new(self.s.clone(), p)
    }

    /// Return `true` if the matrix is the identity, regardless of phases.
    ///
    /// For a valid representation this means the operation is a Pauli.
    pub fn is_pauli(&self) -> bool {
        self.s == DMatrix::identity(self.s.nrows(), self.s.ncols())
    }

    /// Return `true` if this is exactly the identity pair.
    pub fn is_identity(&self) -> bool {
        self.is_pauli() && self.p.iter().all(|v| *v == 0)
    }

    /// Return `true` if the upper-right *n* × *n* block of *S* is zero, i.e.
    /// every *Z* generator maps to a product of *Z*s alone.
    pub fn preserves_z_basis(&self) -> bool {
        let n = self.num_qubits();
        self.s.view((0, n), (n, n)).iter().all(|b| *b == 0)
    }

    /// The quadratic-form matrix *M = Sᵀ U S*, where *U* has the identity in
    /// its lower-left block.
    fn form_matrix(&self) -> DMatrix<u8> {
        let n = self.num_qubits();
        let nn = 2 * n;
        DMatrix::from_fn(nn, nn, |j, k| {
            (0..n).fold(0, |acc, m| acc ^ (self.s[(n + m, j)] & self.s[(m, k)]))
        })
    }

    /// Return `true` if *S* is symplectic and every phase has the parity
    /// required for the image of a Hermitian generator to be Hermitian.
    pub fn is_valid(&self) -> bool {
        if !is_symplectic(&self.s) { return false; }
        let m = self.form_matrix();
        (0..self.s.nrows()).all(|j| self.p[j] % 2 == m[(j, j)])
    }

    /// Phase exponent (mod 4) acquired by *P(a)* under conjugation:
    /// *C P(a) C† = i^φ(a) P(Sa)* with
    /// ```text
    /// φ(a) = p·a + 2 Σ_{j<k} aⱼ aₖ Mⱼₖ  (mod 4)
    /// ```
    pub fn phase_of(&self, a: &[u8]) -> u8 {
        assert_eq!(a.len(), self.s.nrows(), "phase_of: length mismatch");
        let ones: Vec<usize>
            = a.iter().enumerate()
            .filter_map(|(i, b)| (*b & 1 == 1).then_some(i))
            .collect();
        phase_from(&self.form_matrix(), &self.p, &ones)
    }

    /// Compose with `after`, applying `self` first.
    ///
    /// The result has matrix *S = S_after · S_self*.
    pub fn compose(&self, after: &CliffordRep) -> CliffordRep {
        assert_eq!(
            self.num_qubits(), after.num_qubits(),
            "compose: representations act on different numbers of qubits",
        );
        let nn = self.s.nrows();
        let s = gf2_mul(&after.s, &self.s);
        let m = after.form_matrix();
        let p = DVector::from_fn(nn, |j, _| {
            let ones = column_support(&self.s, j);
            (self.p[j] + phase_from(&m, &after.p, &ones)) % 4
        });
        CliffordRep { s, p }
    }

    /// The inverse operation.
    ///
    /// The matrix is *Ω Sᵀ Ω* and the phases are fixed by requiring the
    /// composition with `self` to be exactly the identity pair.
    pub fn inverse(&self) -> CliffordRep {
        let n = self.num_qubits();
        let nn = 2 * n;
        let flip = |i: usize| if i < n { i + n } else { i - n };
        let s_inv = DMatrix::from_fn(nn, nn, |i, j| self.s[(flip(j), flip(i))]);
        let m = self.form_matrix();
        let p_inv = DVector::from_fn(nn, |j, _| {
            let ones = column_support(&s_inv, j);
            (4 - phase_from(&m, &self.p, &ones)) % 4
        });
        CliffordRep { s: s_inv, p: p_inv }
    }

    /// Follow `self` by a *k*-qubit operation `gate` acting on the given
    /// qubit positions, in place.
    ///
    /// Equivalent to composing with `gate` embedded into the full register,
    /// but only touches the rows belonging to `qubits`.
    pub fn apply_local(&mut self, gate: &CliffordRep, qubits: &[usize])
        -> &mut Self
    {
        let n = self.num_qubits();
        let k = gate.num_qubits();
        assert_eq!(k, qubits.len(), "apply_local: gate arity mismatch");
        assert!(qubits.iter().all(|q| *q < n), "apply_local: qubit out of range");
        assert!(qubits.iter().all_unique(), "apply_local: repeated qubit");
        let loc = |a: usize| if a < k { qubits[a] } else { n + qubits[a - k] };
        let m = gate.form_matrix();
        let mut v: Vec<u8> = vec![0; 2 * k];
        for j in 0..2 * n {
            v.iter_mut().enumerate().for_each(|(a, va)| *va = self.s[(loc(a), j)]);
            let ones: Vec<usize>
                = v.iter().enumerate()
                .filter_map(|(a, b)| (*b == 1).then_some(a))
                .collect();
            self.p[j] = (self.p[j] + phase_from(&m, &gate.p, &ones)) % 4;
            for r in 0..2 * k {
                self.s[(loc(r), j)]
                    = ones.iter().fold(0, |acc, a| acc ^ gate.s[(r, *a)]);
            }
        }
        self
    }

    /// Embed a *k*-qubit operation into an `n`-qubit register on `qubits`.
    pub fn embed(&self, qubits: &[usize], n: usize) -> CliffordRep {
        let mut full = CliffordRep::identity(n);
        full.apply_local(self, qubits);
        full
    }

    /// Find the Pauli *P = X^x Z^z* such that composing `self` then *P*
    /// gives `target`. Returns `(x, z)`.
    ///
    /// *Panics* if the two matrices differ or the phases differ by an odd
    /// amount, either of which means the two operations are not related by
    /// a Pauli.
    pub fn pauli_correction(&self, target: &CliffordRep) -> (Vec<u8>, Vec<u8>) {
        assert_eq!(self.s, target.s, "pauli_correction: matrices differ");
        let n = self.num_qubits();
        let nn = 2 * n;
        let d: Vec<u8>
            = (0..nn)
            .map(|j| {
                let diff = (4 + target.p[j] - self.p[j]) % 4;
                assert!(diff % 2 == 0, "pauli_correction: odd phase difference");
                diff / 2
            })
            .collect();
        // c = (S^T)^-1 d = Ω S Ω d
        let flip = |i: usize| if i < n { i + n } else { i - n };
        let c: Vec<u8>
            = (0..nn)
            .map(|i| {
                (0..nn).fold(0, |acc, j| acc ^ (self.s[(flip(i), flip(j))] & d[j]))
            })
            .collect();
        let z = c[..n].to_vec();
        let x = c[n..].to_vec();
        (x, z)
    }
}

/// Compose two representations, applying `first` first.
pub fn compose(first: &CliffordRep, second: &CliffordRep) -> CliffordRep {
    first.compose(second)
}

/// Invert a representation.
pub fn inverse(rep: &CliffordRep) -> CliffordRep { rep.inverse() }

/// Draw a phase vector uniformly from those consistent with the matrix `s`.
///
/// Each entry has its parity fixed by `s`; the remaining bit is random, so
/// the resulting operations differ from one another only by a Pauli.
pub fn random_phase_vector<R>(s: &DMatrix<u8>, rng: &mut R) -> DVector<u8>
where R: Rng + ?Sized
{
    let n = s.nrows() / 2;
    DVector::from_fn(s.nrows(), |j, _| {
        let parity
            = (0..n).fold(0, |acc, m| acc ^ (s[(n + m, j)] & s[(m, j)]));
        parity + 2 * u8::from(rng.gen::<bool>())
    })
}

// symplectic inner product of vectors in interleaved (x0, z0, x1, z1, ...)
// ordering
fn inner(v: &[u8], w: &[u8]) -> u8 {
    v.chunks(2).zip(w.chunks(2))
        .fold(0, |acc, (a, b)| acc ^ (a[0] & b[1]) ^ (b[0] & a[1]))
}

fn transvection(k: &[u8], v: &mut [u8]) {
    if inner(k, v) == 1 {
        v.iter_mut().zip(k).for_each(|(vi, ki)| *vi ^= ki);
    }
}

fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b).map(|(x, y)| x ^ y).collect()
}

// two transvections taking x to y (both nonzero)
fn find_transvection(x: &[u8], y: &[u8]) -> [Vec<u8>; 2] {
    let m = x.len();
    if x == y { return [vec![0; m], vec![0; m]]; }
    if inner(x, y) == 1 { return [xor(x, y), vec![0; m]]; }
    let mut z: Vec<u8> = vec![0; m];
    let nonzero = |v: &[u8], i: usize| v[2 * i] | v[2 * i + 1] == 1;
    for i in 0..m / 2 {
        let ii = 2 * i;
        if nonzero(x, i) && nonzero(y, i) {
            z[ii] = x[ii] ^ y[ii];
            z[ii + 1] = x[ii + 1] ^ y[ii + 1];
            if z[ii] | z[ii + 1] == 0 {
                z[ii + 1] = 1;
                if x[ii] != x[ii + 1] { z[ii] = 1; }
            }
            return [xor(x, &z), xor(y, &z)];
        }
    }
    if let Some(i) = (0..m / 2).find(|&i| nonzero(x, i) && !nonzero(y, i)) {
        let ii = 2 * i;
        if x[ii] == x[ii + 1] {
            z[ii + 1] = 1;
        } else {
            z[ii + 1] = x[ii];
            z[ii] = x[ii + 1];
        }
    }
    if let Some(i) = (0..m / 2).find(|&i| !nonzero(x, i) && nonzero(y, i)) {
        let ii = 2 * i;
        if y[ii] == y[ii + 1] {
            z[ii + 1] = 1;
        } else {
            z[ii + 1] = y[ii];
            z[ii] = y[ii + 1];
        }
    }
    [xor(x, &z), xor(y, &z)]
}

// rows of a uniformly random symplectic matrix in interleaved ordering,
// built one qubit at a time from transvections
fn symplectic_interleaved<R>(n: usize, rng: &mut R) -> Vec<Vec<u8>>
where R: Rng + ?Sized
{
    let nn = 2 * n;
    let mut f1: Vec<u8>
        = loop {
            let v: Vec<u8> = (0..nn).map(|_| u8::from(rng.gen::<bool>())).collect();
            if v.iter().any(|b| *b == 1) { break v; }
        };
    let mut e1: Vec<u8> = vec![0; nn];
    e1[0] = 1;
    let t = find_transvection(&e1, &f1);
    let bits: Vec<u8>
        = (0..nn - 1).map(|_| u8::from(rng.gen::<bool>())).collect();
    let mut h0 = e1.clone();
    h0.iter_mut().enumerate().skip(2).for_each(|(j, hj)| *hj = bits[j - 1]);
    transvection(&t[0], &mut h0);
    transvection(&t[1], &mut h0);
    if bits[0] == 1 { f1.iter_mut().for_each(|b| *b = 0); }

    let mut g: Vec<Vec<u8>> = vec![vec![0; nn]; nn];
    g[0][0] = 1;
    g[1][1] = 1;
    if n > 1 {
        let sub = symplectic_interleaved(n - 1, rng);
        for (i, row) in sub.into_iter().enumerate() {
            g[i + 2][2..].copy_from_slice(&row);
        }
    }
    for row in g.iter_mut() {
        transvection(&t[0], row);
        transvection(&t[1], row);
        transvection(&h0, row);
        transvection(&f1, row);
    }
    g
}

/// Draw a uniformly random 2*n* × 2*n* symplectic matrix.
///
/// Uses the direct construction of Koenig and Smolin (J. Math. Phys. 55,
/// 122202), so every draw succeeds without rejection.
pub fn random_symplectic_matrix<R>(n: usize, rng: &mut R) -> DMatrix<u8>
where R: Rng + ?Sized
{
    if n == 0 { return DMatrix::zeros(0, 0); }
    let g = symplectic_interleaved(n, rng);
    let block = |i: usize| if i % 2 == 0 { i / 2 } else { n + i / 2 };
    let mut s: DMatrix<u8> = DMatrix::zeros(2 * n, 2 * n);
    for (j, row) in g.iter().enumerate() {
        for (i, b) in row.iter().enumerate() {
            s[(block(i), block(j))] = *b;
        }
    }
    s
}

/// Draw a uniformly random `n`-qubit Clifford.
pub fn random_clifford<R>(n: usize, rng: &mut R) -> CliffordRep
where R: Rng + ?Sized
{
    let s = random_symplectic_matrix(n, rng);
    let p = random_phase_vector(&s, rng);
    CliffordRep { s, p }
}

/// Fold every gate of `circuit` into a single representation, with qubits
/// ordered as the circuit's line labels.
///
/// `lookup` maps gate names to their representations. *Panics* if a gate
/// name is unknown or a gate acts outside the circuit's lines.
pub fn symplectic_rep_of_clifford_circuit<'a, F>(circuit: &Circuit, lookup: F)
    -> CliffordRep
where F: Fn(&str) -> Option<&'a CliffordRep>
{
    let lines = circuit.line_labels();
    let mut rep = CliffordRep::identity(lines.len());
    for layer in circuit.layers() {
        for gate in layer.iter() {
            let g
                = lookup(gate.name())
                .unwrap_or_else(|| {
                    panic!("no symplectic representation for gate '{}'", gate.name())
                });
            let pos: Vec<usize>
                = gate.qubits().iter()
                .map(|q| {
                    lines.iter().position(|l| l == q)
                        .unwrap_or_else(|| {
                            panic!("gate '{}' acts on qubit {} outside the circuit", gate, q)
                        })
                })
                .collect();
            rep.apply_local(g, &pos);
        }
    }
    assert!(is_symplectic(rep.s()), "circuit representation is not symplectic");
    rep
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{ SeedableRng, rngs::StdRng };

    fn h() -> CliffordRep { CliffordRep::from_rows(&[&[0, 1], &[1, 0]], &[0, 0]) }
    fn s_gate() -> CliffordRep { CliffordRep::from_rows(&[&[1, 0], &[1, 1]], &[1, 0]) }
    fn cnot() -> CliffordRep {
        CliffordRep::from_rows(
            &[&[1, 0, 0, 0], &[1, 1, 0, 0], &[0, 0, 1, 1], &[0, 0, 0, 1]],
            &[0, 0, 0, 0],
        )
    }

    #[test]
    fn s_squared_is_z() {
        let z = s_gate().compose(&s_gate());
        assert_eq!(z, CliffordRep::pauli(&[0], &[1]));
    }

    #[test]
    fn h_is_self_inverse() {
        assert!(h().compose(&h()).is_identity());
        assert_eq!(h().inverse(), h());
    }

    #[test]
    fn s_inverse_is_s_dagger() {
        let sdag = CliffordRep::from_rows(&[&[1, 0], &[1, 1]], &[3, 0]);
        assert_eq!(s_gate().inverse(), sdag);
    }

    #[test]
    fn random_cliffords_are_valid() {
        let mut rng = StdRng::seed_from_u64(10546);
        for n in 1..=6 {
            for _ in 0..20 {
                let c = random_clifford(n, &mut rng);
                assert!(c.is_valid());
                assert!(c.compose(&c.inverse()).is_identity());
                assert!(c.inverse().compose(&c).is_identity());
            }
        }
    }

    #[test]
    fn apply_local_matches_embedded_compose() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let c = random_clifford(3, &mut rng);
            let g = random_clifford(2, &mut rng);
            let mut local = c.clone();
            local.apply_local(&g, &[2, 0]);
            assert_eq!(local, c.compose(&g.embed(&[2, 0], 3)));
        }
    }

    #[test]
    fn embedded_cnot_reversed() {
        // CNOT(1 -> 0) = (H ⊗ H) CNOT(0 -> 1) (H ⊗ H)
        let mut rep = CliffordRep::identity(2);
        rep.apply_local(&h(), &[0]).apply_local(&h(), &[1])
            .apply_local(&cnot(), &[0, 1])
            .apply_local(&h(), &[0]).apply_local(&h(), &[1]);
        assert_eq!(rep, cnot().embed(&[1, 0], 2));
    }

    #[test]
    fn pauli_correction_recovers_target() {
        let mut rng = StdRng::seed_from_u64(99);
        for n in 1..=4 {
            let c = random_clifford(n, &mut rng);
            let other = c.with_phases(random_phase_vector(c.s(), &mut rng));
            let (x, z) = other.pauli_correction(&c);
            assert_eq!(other.compose(&CliffordRep::pauli(&x, &z)), c);
        }
    }

    #[test]
    fn symplectic_form_is_symplectic() {
        for n in 0..4 {
            assert!(is_symplectic(&symplectic_form(n)));
            assert!(is_symplectic(&DMatrix::identity(2 * n, 2 * n)));
        }
        assert!(!is_symplectic(&DMatrix::zeros(2, 2)));
    }
}
