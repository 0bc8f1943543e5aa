//! Integer status codes for the command surface.
//!
//! [`NdStatus`] is a `repr(i32)` enum whose values match the status codes
//! transports have always exchanged with clients. Codes -3, -4, -6 and -7
//! belong to the transport layer (RPC, put framing, threading, unknown
//! request) and are never produced here.

use std::fmt;

use crate::error::StoreError;

/// Status code returned with every command reply.
///
/// `Ok` = 0, all errors are negative. Values are wire-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NdStatus {
    /// Success.
    Ok = 0,
    /// A chunk or output buffer could not be allocated.
    AllocationFailed = -1,
    /// Malformed request.
    InvalidArgument = -2,
    /// Payload or buffer size does not match the descriptor.
    SizeMismatch = -5,
    /// Nothing stored under the requested name and version overlaps the box.
    ObjectNotFound = -8,
    /// Stored data overlaps the box but does not cover it.
    PartialCoverage = -9,
}

impl NdStatus {
    /// The integer sent on the wire.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Parse a wire code. Unknown and transport-only codes yield `None`.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            -1 => Some(Self::AllocationFailed),
            -2 => Some(Self::InvalidArgument),
            -5 => Some(Self::SizeMismatch),
            -8 => Some(Self::ObjectNotFound),
            -9 => Some(Self::PartialCoverage),
            _ => None,
        }
    }

    /// Whether this is [`NdStatus::Ok`].
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl fmt::Display for NdStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

impl From<&StoreError> for NdStatus {
    fn from(e: &StoreError) -> Self {
        match e {
            StoreError::AllocationFailure { .. } => NdStatus::AllocationFailed,
            StoreError::InvalidArgument { .. } | StoreError::InvalidDescriptor(_) => {
                NdStatus::InvalidArgument
            }
            StoreError::SizeMismatch { .. } => NdStatus::SizeMismatch,
            StoreError::ObjectNotFound { .. } => NdStatus::ObjectNotFound,
            StoreError::PartialCoverage { .. } => NdStatus::PartialCoverage,
        }
    }
}

impl<T> From<&Result<T, StoreError>> for NdStatus {
    fn from(r: &Result<T, StoreError>) -> Self {
        r.as_ref().map_or_else(NdStatus::from, |_| NdStatus::Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndstore_core::{DescriptorError, Version};

    #[test]
    fn status_code_values_are_stable() {
        assert_eq!(NdStatus::Ok as i32, 0);
        assert_eq!(NdStatus::AllocationFailed as i32, -1);
        assert_eq!(NdStatus::InvalidArgument as i32, -2);
        assert_eq!(NdStatus::SizeMismatch as i32, -5);
        assert_eq!(NdStatus::ObjectNotFound as i32, -8);
        assert_eq!(NdStatus::PartialCoverage as i32, -9);
    }

    #[test]
    fn codes_round_trip_and_transport_codes_are_unknown() {
        for s in [
            NdStatus::Ok,
            NdStatus::AllocationFailed,
            NdStatus::InvalidArgument,
            NdStatus::SizeMismatch,
            NdStatus::ObjectNotFound,
            NdStatus::PartialCoverage,
        ] {
            assert_eq!(NdStatus::from_code(s.code()), Some(s));
        }
        for code in [-3, -4, -6, -7, 1, -10] {
            assert_eq!(NdStatus::from_code(code), None);
        }
    }

    #[test]
    fn store_errors_map_to_statuses() {
        let not_found = StoreError::ObjectNotFound {
            name: "temp".into(),
            version: Version(1),
        };
        assert_eq!(NdStatus::from(&not_found), NdStatus::ObjectNotFound);
        assert_eq!(
            NdStatus::from(&StoreError::InvalidDescriptor(DescriptorError::ZeroElementSize)),
            NdStatus::InvalidArgument
        );
        let ok: Result<(), StoreError> = Ok(());
        assert_eq!(NdStatus::from(&ok), NdStatus::Ok);
    }
}
