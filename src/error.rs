//! Crate-wide error type.

use thiserror::Error;

/// Errors returned by container operations.
///
/// Precondition violations (`Underflow`, `ReservedKey`) are reported through
/// the configured assertion hook before they are returned.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ContainerError {
    /// The array holds fewer elements than the operation removes or reads.
    #[error("array must contain at least {required} element{}", plural(.required))]
    Underflow {
        /// Minimum count the operation needs.
        required: u32,
        /// Count at the time of the call.
        count: u32,
    },
    /// Key `0` marks an empty slot and can not be inserted.
    #[error("key 0 is reserved for empty slots")]
    ReservedKey,
    /// The allocate callback returned no memory.
    #[error("allocation of {bytes} bytes failed")]
    OutOfMemory { bytes: usize },
    /// The requested element capacity does not fit the container's limits.
    #[error("capacity overflow")]
    CapacityOverflow,
}

fn plural(n: &u32) -> &'static str {
    if *n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::ContainerError;

    #[test]
    fn underflow_message_is_pluralized() {
        let one = ContainerError::Underflow {
            required: 1,
            count: 0,
        };
        let five = ContainerError::Underflow {
            required: 5,
            count: 4,
        };
        assert_eq!(one.to_string(), "array must contain at least 1 element");
        assert_eq!(five.to_string(), "array must contain at least 5 elements");
    }
}
