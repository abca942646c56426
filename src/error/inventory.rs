//! Booking errors

use super::CapgainsError;

/// Creates an error for a transaction that conflicts with position state
pub fn inconsistent(uniqueid: impl Into<String>, message: impl Into<String>) -> CapgainsError {
    CapgainsError::Inconsistent {
        uniqueid: uniqueid.into(),
        message: message.into(),
    }
}

/// Creates an error for a transaction that is malformed for booking
pub fn booking_invalid(uniqueid: impl Into<String>, message: impl Into<String>) -> CapgainsError {
    CapgainsError::BookingInvalid {
        uniqueid: uniqueid.into(),
        message: message.into(),
    }
}
