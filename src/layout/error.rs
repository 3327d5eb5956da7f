use crate::ir::NodeAddress;
use serde::Serialize;
use thiserror::Error;

/// Fatal layout failures. Structural problems in the dataset reject the
/// whole computation rather than drawing a broken diagram.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("flow {flow} hop {hop} references missing node {address}")]
    FlowReference {
        flow: usize,
        hop: usize,
        address: NodeAddress,
    },

    #[error("flow {flow} has an empty path")]
    EmptyFlowPath { flow: usize },

    #[error("flow {flow} has non-positive magnitude {magnitude}")]
    InvalidMagnitude { flow: usize, magnitude: f32 },

    #[error("every layer has zero total size; scale calibration is undefined")]
    DegenerateScale,
}

/// Non-fatal diagnostics collected during a layout pass. Rendering
/// continues; callers decide whether to surface them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutWarning {
    /// Interior node with no upstream flow.
    MissingInbound { address: NodeAddress },
    /// Interior node with no downstream flow.
    MissingOutbound { address: NodeAddress },
    /// Color string that failed to parse; the node fell back to gray.
    InvalidColor { address: NodeAddress, value: String },
}

impl std::fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingInbound { address } => {
                write!(f, "node {address} in column {} has no source", address.layer)
            }
            Self::MissingOutbound { address } => {
                write!(f, "node {address} in column {} has no target", address.layer)
            }
            Self::InvalidColor { address, value } => {
                write!(f, "node {address} has unparseable color {value:?}")
            }
        }
    }
}
