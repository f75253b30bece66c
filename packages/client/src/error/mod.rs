pub mod classification;
pub mod constructors;
pub mod helpers;
pub mod types;

pub use constructors::*;
pub use helpers::{ClientOnly, SocketClosed, UnsupportedAddressType, effective_timeout, timeout_from_millis};
pub use types::{Error, Kind, Result};

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn io_errors_round_trip_unchanged() {
        let original = io::Error::new(io::ErrorKind::ConnectionRefused, "refused by proxy");
        let error = Error::from(original);
        assert!(error.is_io());
        assert_eq!(
            error.io_error().map(io::Error::kind),
            Some(io::ErrorKind::ConnectionRefused)
        );

        let back = error.into_io();
        assert_eq!(back.kind(), io::ErrorKind::ConnectionRefused);
        assert_eq!(back.to_string(), "refused by proxy");
    }

    #[test]
    fn non_io_kinds_map_to_io_kinds() {
        let denied = io::Error::from(permission_denied("blocked"));
        assert_eq!(denied.kind(), io::ErrorKind::PermissionDenied);

        let state = io::Error::from(not_a_server_socket());
        assert_eq!(state.kind(), io::ErrorKind::Unsupported);
    }

    #[test]
    fn zero_millis_means_no_timeout() {
        assert_eq!(timeout_from_millis(0), None);
        assert_eq!(
            timeout_from_millis(5000),
            Some(std::time::Duration::from_secs(5))
        );
    }

    #[test]
    fn zero_duration_timeout_means_none() {
        use std::time::Duration;

        assert_eq!(effective_timeout(Some(Duration::ZERO)), None);
        assert_eq!(effective_timeout(None), None);
        assert_eq!(
            effective_timeout(Some(Duration::from_millis(250))),
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn display_includes_source() {
        let error = illegal_state("already connected");
        assert_eq!(error.to_string(), "illegal socket state: already connected");
    }
}
