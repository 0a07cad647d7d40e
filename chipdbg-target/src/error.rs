use std::{error::Error as StdError, fmt::Display, io};

use crate::target::TargetClass;

/// Errors that may occur when dispatching a bus operation through the tree.
#[derive(Debug)]
pub enum BusError {
    /// The underlying transport failed to transfer the expected bytes.
    Io(io::Error),
    /// The ancestor walk ran out of tree before finding the class: either a
    /// visited node has no bound target or the root was passed. This is a
    /// malformed device tree, not a recoverable condition.
    MalformedTree { node: String, class: TargetClass },
    /// The node was disabled by the probe pass; operating on it is a usage
    /// error.
    Disabled { node: String },
    /// The node's bound target is not an SBE FIFO.
    NotFifo { node: String },
    /// Indirect form 1 addresses (bit 60 set) are not supported.
    IndirectUnsupported,
    /// The hardware reported an error in the indirect status field.
    IndirectError { status: u8 },
    /// The indirect access never completed within the attempt limit.
    IndirectTimeout,
}

impl From<io::Error> for BusError {
    fn from(value: io::Error) -> Self {
        BusError::Io(value)
    }
}

impl Display for BusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BusError::Io(error) => write!(f, "{}", error),
            BusError::MalformedTree { node, class } => {
                write!(f, "No {} target found from node {}", class, node)
            }
            BusError::Disabled { node } => write!(f, "Node {} is disabled", node),
            BusError::NotFifo { node } => {
                write!(f, "Node {} is not bound to an SBE FIFO target", node)
            }
            BusError::IndirectUnsupported => write!(f, "Indirect form 1 not supported"),
            BusError::IndirectError { status } => {
                write!(f, "Indirect access failed, status={}", status)
            }
            BusError::IndirectTimeout => {
                write!(f, "Indirect access did not complete")
            }
        }
    }
}

impl StdError for BusError {}
