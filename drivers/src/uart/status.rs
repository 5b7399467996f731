//! Completion codes and errors of the UART adapter.

use crate::hal::serial::LineError;
use core::fmt;

/// Outcome codes reported through a [`CompletionSink`](super::CompletionSink).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Status {
    Success,
    TxBusy,
    RxBusy,
    /// A send finished; every byte has left the shift register.
    TxIdle,
    /// A receive finished (buffer full or line idle).
    RxIdle,
    BaudrateNotSupported,
    /// A receive stopped on a framing, parity, noise or overrun error.
    ProtocolError,
    Error,
}

/// UART adapter errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UartError {
    /// A non-blocking send is in flight.
    TxBusy,
    /// A non-blocking receive is in flight.
    RxBusy,
    /// No divisor reaches the requested baud rate from the source clock.
    BaudrateNotSupported,
    /// A receive line error.
    Protocol(LineError),
    /// The part has no LPUART with this index.
    InvalidInstance(u8),
    /// Another handle owns this LPUART.
    InstanceInUse(u8),
    /// The direction is disabled in the configuration.
    Disabled,
    /// Zero-length buffer handed to a non-blocking call.
    EmptyTransfer,
    /// No transfer has been started in this direction.
    NoTransfer,
    /// The port is in low-power mode.
    LowPower,
}

impl fmt::Display for UartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UartError::TxBusy => f.write_str("transmitter busy"),
            UartError::RxBusy => f.write_str("receiver busy"),
            UartError::BaudrateNotSupported => f.write_str("baud rate not supported"),
            UartError::Protocol(err) => write!(f, "protocol error: {err}"),
            UartError::InvalidInstance(n) => write!(f, "no LPUART instance {n}"),
            UartError::InstanceInUse(n) => write!(f, "LPUART{n} already in use"),
            UartError::Disabled => f.write_str("direction disabled"),
            UartError::EmptyTransfer => f.write_str("empty transfer"),
            UartError::NoTransfer => f.write_str("no transfer"),
            UartError::LowPower => f.write_str("in low-power mode"),
        }
    }
}

impl From<LineError> for UartError {
    fn from(err: LineError) -> Self {
        UartError::Protocol(err)
    }
}

impl From<UartError> for Status {
    fn from(err: UartError) -> Self {
        match err {
            UartError::TxBusy => Status::TxBusy,
            UartError::RxBusy => Status::RxBusy,
            UartError::BaudrateNotSupported => Status::BaudrateNotSupported,
            UartError::Protocol(_) => Status::ProtocolError,
            UartError::InvalidInstance(_)
            | UartError::InstanceInUse(_)
            | UartError::Disabled
            | UartError::EmptyTransfer
            | UartError::NoTransfer
            | UartError::LowPower => Status::Error,
        }
    }
}

impl<T> From<Result<T, UartError>> for Status {
    fn from(result: Result<T, UartError>) -> Self {
        match result {
            Ok(_) => Status::Success,
            Err(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_collapse_to_status_codes() {
        assert_eq!(Status::from(Ok::<(), UartError>(())), Status::Success);
        assert_eq!(Status::from(UartError::TxBusy), Status::TxBusy);
        assert_eq!(
            Status::from(UartError::Protocol(LineError::Framing)),
            Status::ProtocolError
        );
        assert_eq!(Status::from(UartError::InstanceInUse(1)), Status::Error);
        assert_eq!(
            Status::from(Err::<usize, _>(UartError::BaudrateNotSupported)),
            Status::BaudrateNotSupported
        );
    }

    #[test]
    fn display_names_the_instance() {
        assert_eq!(
            format!("{}", UartError::InvalidInstance(7)),
            "no LPUART instance 7"
        );
        assert_eq!(
            format!("{}", UartError::Protocol(LineError::Overrun)),
            "protocol error: receiver overrun"
        );
    }
}
