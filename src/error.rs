//! Error types for wiring construction and cell configuration

/// Result type alias using NcpError
pub type Result<T> = std::result::Result<T, NcpError>;

/// Errors raised while building wirings, cells and layers
#[derive(Debug, thiserror::Error)]
pub enum NcpError {
    /// A fan-out/fan-in parameter asks for more neurons than the target layer has
    #[error("{parameter} {value} exceeds number of {layer} neurons {available}")]
    FanExceedsLayer {
        parameter: &'static str,
        value: usize,
        layer: &'static str,
        available: usize,
    },

    /// A wiring layer was declared with no neurons
    #[error("{0} layer must contain at least one neuron")]
    EmptyLayer(&'static str),

    /// Output dimension larger than the wiring allows
    #[error("output dimension {output_dim} is invalid for {units} units")]
    InvalidOutputDim { output_dim: usize, units: usize },

    /// Sparsity level outside of the accepted interval
    #[error("sparsity level must be in {range}, got {value}")]
    InvalidSparsity { value: f64, range: &'static str },

    /// `build` called twice with different input widths
    #[error("conflicting input dimensions: expected {expected}, got {got}")]
    ConflictingInputDim { expected: usize, got: usize },

    /// Operation needs a built wiring
    #[error("wiring is not built, call build(input_dim) first")]
    NotBuilt,

    /// Synapse endpoint outside of the neuron range
    #[error("invalid synapse {src} -> {dest}: {kind} source range is {sources}, destination range is {units}")]
    SynapseOutOfRange {
        kind: &'static str,
        src: usize,
        dest: usize,
        sources: usize,
        units: usize,
    },

    /// Stored adjacency matrix cannot be restored
    #[error("malformed {name} matrix: {reason}")]
    MalformedMatrix { name: &'static str, reason: String },

    /// Initialization range requested for a parameter the cell does not have
    #[error("unknown initialization parameter '{0}'")]
    UnknownInitParameter(String),

    /// Initialization range with min above max
    #[error("initialization range for '{name}' is inverted: [{min}, {max}]")]
    InvertedInitRange { name: String, min: f64, max: f64 },

    /// Mapping mode string not recognised
    #[error("unknown mapping mode '{0}', expected 'affine', 'linear' or 'none'")]
    UnknownMappingMode(String),

    /// Invalid cell or layer setting
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// File access error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
