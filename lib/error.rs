//! Configuration errors raised by samplers, builders, and batchers.
//!
//! Only conditions that a caller can fix by changing their inputs live here.
//! Broken algebraic invariants (a composite circuit that is not the identity
//! up to a Pauli, a non-deterministic ideal measurement, a sampler running out
//! of candidate gates) are engine defects and panic instead.

use thiserror::Error;

/// Errors from invalid device, sampler, or builder configurations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RbError {
    /// A gate name has no entry in the gate library.
    #[error("unknown gate name '{0}'")]
    UnknownGate(String),

    /// A qubit label is not part of the device.
    #[error("qubit {0} is not in the device")]
    UnknownQubit(usize),

    /// A qubit label appears more than once where distinct labels are needed.
    #[error("qubit {0} appears more than once")]
    DuplicateQubit(usize),

    /// A qubit structure is not a set of disjoint, non-empty subsets of the
    /// device.
    #[error("invalid qubit structure: {0}")]
    InvalidStructure(String),

    /// A qubit subset does not induce a connected subgraph.
    #[error("qubit subset {0:?} is not connected")]
    DisconnectedSubset(Vec<usize>),

    /// A sampler name could not be resolved.
    #[error("sampler type '{0}' not understood")]
    UnknownSampler(String),

    /// Edge-grab selection found fewer disjoint edges than requested.
    #[error(
        "device has insufficient connectivity: {available} disjoint edges \
        found, mean of {requested} two-qubit gates requested"
    )]
    InsufficientConnectivity { available: usize, requested: f64 },

    /// A germ cannot hold the requested number of two-qubit gates.
    #[error("infeasible two-qubit gate density: {0}")]
    InfeasibleDensity(String),

    /// A native gate has no native inverse.
    #[error("gate '{0}' has no inverse in the native gate set")]
    MissingInverse(String),

    /// Mirror circuits need an even core length.
    #[error("mirror circuit length must be even, got {0}")]
    OddLength(usize),

    /// A probability or weight list is malformed.
    #[error("invalid probability distribution: {0}")]
    InvalidDistribution(String),

    /// A qubit has no single-qubit gates to draw from.
    #[error("there are no one-qubit gates on qubit {0}")]
    NoOneQubitGates(usize),

    /// The native single-qubit gates do not generate the Clifford group.
    #[error("native one-qubit gates cannot implement '{0}'")]
    NotUniversal(String),

    /// Compilation needs an entangling gate on a qubit pair.
    #[error("no native entangling gate between qubits {0} and {1}")]
    NoEntanglingGate(usize, usize),

    /// A representation has the wrong size for the qubits it is compiled onto.
    #[error("representation acts on {rep} qubits, but {qubits} were given")]
    SizeMismatch { rep: usize, qubits: usize },

    /// A depth appears more than once in a batcher's depth list.
    #[error("depth {0} is listed more than once")]
    DuplicateDepth(usize),

    /// A batcher was handed nothing to iterate over.
    #[error("empty parameter list: {0}")]
    Empty(&'static str),
}

/// Shorthand for results carrying an [`RbError`].
pub type RbResult<T> = Result<T, RbError>;
