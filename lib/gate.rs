//! Gate labels and the standard library of Clifford gate representations.
//!
//! Gates are identified by name (e.g. `"Gxpi2"`, `"Gcnot"`) and the ordered
//! qubits they act on. Names resolve to [`CliffordRep`]s through the standard
//! library, [`standard_rep`], which also contains the 24 single-qubit
//! Cliffords `"C0"`, ..., `"C23"`.
//!
//! See also: <https://en.wikipedia.org/wiki/Clifford_gates>

use std::fmt;
use once_cell::sync::Lazy;
use rand::Rng;
use rustc_hash::FxHashMap as HashMap;
use crate::symplectic::CliffordRep;

/// A named gate acting on an ordered list of qubit labels.
///
/// For two-qubit gates with a control, the control comes first.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GateLabel {
    name: String,
    qubits: Vec<usize>,
}

impl fmt::Display for GateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for q in self.qubits.iter() {
            write!(f, ":{}", q)?;
        }
        Ok(())
    }
}

impl GateLabel {
    /// Create a new label.
    ///
    /// *Panics* if `qubits` is empty or contains a repeated label.
    pub fn new<S>(name: S, qubits: &[usize]) -> Self
    where S: Into<String>
    {
        if qubits.is_empty() {
            panic!("GateLabel::new: a gate must act on at least one qubit");
        }
        if (1..qubits.len()).any(|k| qubits[..k].contains(&qubits[k])) {
            panic!("GateLabel::new: repeated qubit in {:?}", qubits);
        }
        Self { name: name.into(), qubits: qubits.to_vec() }
    }

    /// Shorthand for a single-qubit gate.
    pub fn one<S>(name: S, q: usize) -> Self
    where S: Into<String>
    {
        Self::new(name, &[q])
    }

    /// Shorthand for a two-qubit gate.
    pub fn two<S>(name: S, a: usize, b: usize) -> Self
    where S: Into<String>
    {
        Self::new(name, &[a, b])
    }

    /// The gate name.
    pub fn name(&self) -> &str { &self.name }

    /// The qubits acted on.
    pub fn qubits(&self) -> &[usize] { &self.qubits }

    /// Number of qubits acted on.
    pub fn arity(&self) -> usize { self.qubits.len() }

    /// Return `true` if the gate touches qubit `q`.
    pub fn acts_on(&self, q: usize) -> bool { self.qubits.contains(&q) }

    /// Return a copy with a different name but the same qubits.
    pub fn renamed<S>(&self, name: S) -> Self
    where S: Into<String>
    {
        Self { name: name.into(), qubits: self.qubits.clone() }
    }
}

/// Description of an elementary Clifford gate on register positions.
///
/// These are the gates produced by synthesis before they are mapped onto a
/// device's native gates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Gate {
    /// Hadamard
    H(usize),
    /// π/2 rotation about Z
    S(usize),
    /// Z-controlled π rotation about X.
    ///
    /// The first qubit index is the control.
    CX(usize, usize),
    /// Swap
    Swap(usize, usize),
}

impl Gate {
    /// Positions acted on.
    pub fn qubits(&self) -> Vec<usize> {
        match *self {
            Self::H(k) | Self::S(k) => vec![k],
            Self::CX(a, b) | Self::Swap(a, b) => vec![a, b],
        }
    }
}

/// A single-qubit Pauli operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Pauli {
    /// Identity
    I,
    /// σ<sub>*x*</sub>
    X,
    /// σ<sub>*y*</sub>
    Y,
    /// σ<sub>*z*</sub>
    Z,
}

impl fmt::Display for Pauli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::I => write!(f, "{}", if f.alternate() { "." } else { "I" }),
            _ => write!(f, "{:?}", self),
        }
    }
}

impl Pauli {
    /// Convert from an integer (modulo 4) in the order *I, X, Y, Z*.
    pub fn from_int(u: usize) -> Self {
        match u % 4 {
            0 => Self::I,
            1 => Self::X,
            2 => Self::Y,
            3 => Self::Z,
            _ => unreachable!(),
        }
    }

    /// The *(x, z)* bits of the operator.
    pub fn bits(self) -> (u8, u8) {
        match self {
            Self::I => (0, 0),
            Self::X => (1, 0),
            Self::Y => (1, 1),
            Self::Z => (0, 1),
        }
    }

    /// Convert from *(x, z)* bits.
    pub fn from_bits(x: u8, z: u8) -> Self {
        match (x & 1, z & 1) {
            (0, 0) => Self::I,
            (1, 0) => Self::X,
            (1, 1) => Self::Y,
            _ => Self::Z,
        }
    }

    /// Draw a uniformly random Pauli for each of `n` qubits.
    pub fn gen_nqubitd<R>(n: usize, rng: &mut R) -> Vec<Self>
    where R: Rng + ?Sized
    {
        (0..n).map(|_| Self::from_int(rng.gen_range(0..4))).collect()
    }

    /// Representation of the operator, up to global phase.
    pub fn rep(self) -> CliffordRep {
        let (x, z) = self.bits();
        CliffordRep::pauli(&[x], &[z])
    }
}

static STANDARD_GATES: Lazy<HashMap<String, CliffordRep>>
    = Lazy::new(|| {
        let one = |rows: [[u8; 2]; 2], p: [u8; 2]| {
            CliffordRep::from_rows(&[&rows[0], &rows[1]], &p)
        };
        let two = |rows: [[u8; 4]; 4]| {
            CliffordRep::from_rows(
                &[&rows[0], &rows[1], &rows[2], &rows[3]], &[0, 0, 0, 0])
        };
        let id = [[1, 0], [0, 1]];
        let swapxz = [[0, 1], [1, 0]];
        let xz = [[1, 1], [0, 1]];
        let zx = [[1, 0], [1, 1]];
        let mut lib: HashMap<String, CliffordRep> = [
            ("Gi",     one(id,     [0, 0])),
            ("Gxpi",   one(id,     [0, 2])),
            ("Gypi",   one(id,     [2, 2])),
            ("Gzpi",   one(id,     [2, 0])),
            ("Gh",     one(swapxz, [0, 0])),
            ("Gp",     one(zx,     [1, 0])),
            ("Gpdag",  one(zx,     [3, 0])),
            ("Gxpi2",  one(xz,     [0, 3])),
            ("Gypi2",  one(swapxz, [2, 0])),
            ("Gzpi2",  one(zx,     [1, 0])),
            ("Gxmpi2", one(xz,     [0, 1])),
            ("Gympi2", one(swapxz, [0, 2])),
            ("Gzmpi2", one(zx,     [3, 0])),
            ("Gcnot",  two([[1, 0, 0, 0], [1, 1, 0, 0], [0, 0, 1, 1], [0, 0, 0, 1]])),
            ("Gcphase", two([[1, 0, 0, 0], [0, 1, 0, 0], [0, 1, 1, 0], [1, 0, 0, 1]])),
            ("Gswap",  two([[0, 1, 0, 0], [1, 0, 0, 0], [0, 0, 0, 1], [0, 0, 1, 0]])),
        ]
        .into_iter()
        .map(|(name, rep)| (name.to_string(), rep))
        .collect();
        for (k, rep) in ONE_QUBIT_CLIFFORDS.iter().enumerate() {
            lib.insert(format!("C{}", k), rep.clone());
        }
        lib
    });

// breadth-first closure of {H, S} from the identity; the identity is C0
static ONE_QUBIT_CLIFFORDS: Lazy<Vec<CliffordRep>>
    = Lazy::new(|| {
        let h = CliffordRep::from_rows(&[&[0, 1], &[1, 0]], &[0, 0]);
        let s = CliffordRep::from_rows(&[&[1, 0], &[1, 1]], &[1, 0]);
        let mut elems: Vec<CliffordRep> = vec![CliffordRep::identity(1)];
        let mut k: usize = 0;
        while k < elems.len() {
            for g in [&h, &s] {
                let next = elems[k].compose(g);
                if !elems.contains(&next) { elems.push(next); }
            }
            k += 1;
        }
        assert_eq!(elems.len(), 24, "single-qubit Clifford group has 24 elements");
        elems
    });

/// Look up the representation of a gate in the standard library.
pub fn standard_rep(name: &str) -> Option<&'static CliffordRep> {
    STANDARD_GATES.get(name)
}

/// The 24 single-qubit Cliffords in the order of their names `"C0"`, ...,
/// `"C23"`.
pub fn one_qubit_cliffords() -> &'static [CliffordRep] {
    ONE_QUBIT_CLIFFORDS.as_slice()
}

/// Name of the `k`-th single-qubit Clifford.
pub fn one_qubit_clifford_name(k: usize) -> String { format!("C{}", k) }
