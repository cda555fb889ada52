//! Failure triage: deciding which platform failures end the run, which
//! abandon the current action, and which are plain noise.

use crate::error::Failure;

/// What one failed platform call means for the run as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The account is in danger (dead token, suspension, lockout).
    /// The process must stop now.
    Fatal,
    /// The platform refused this particular call (rate limit, validation).
    /// Abandon the action and move on.
    Recoverable,
    /// Transient noise. Log it and treat the call as a plain failure.
    Ignorable,
}

/// Classify a platform failure. Total over every failure shape and free of
/// side effects, so the same failure always lands in the same class.
///
/// 401 and 403 mean the token is dead or the account is locked out, which
/// no amount of retrying fixes. 422 and 429 are the platform pushing back
/// on one call. Every other status, and anything that never produced a
/// status at all, is treated as noise; transient 5xx and transport errors
/// dominate that bucket and the account-threatening codes are already
/// enumerated.
pub fn classify(failure: &Failure) -> FailureClass {
    match failure {
        Failure::Authentication(_) => FailureClass::Fatal,
        Failure::Api {
            status: 401 | 403, ..
        } => FailureClass::Fatal,
        Failure::Api {
            status: 422 | 429, ..
        } => FailureClass::Recoverable,
        Failure::Api { .. } => FailureClass::Ignorable,
        Failure::Network(_) => FailureClass::Ignorable,
    }
}

/// Shorthand for the one class callers branch on most.
pub fn is_fatal(failure: &Failure) -> bool {
    classify(failure) == FailureClass::Fatal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_is_fatal() {
        assert_eq!(classify(&Failure::api(401, "bad token")), FailureClass::Fatal);
        assert_eq!(classify(&Failure::api(403, "locked")), FailureClass::Fatal);
    }

    #[test]
    fn test_authentication_failure_is_fatal() {
        let failure = Failure::Authentication("token file unreadable".to_string());
        assert_eq!(classify(&failure), FailureClass::Fatal);
        assert!(is_fatal(&failure));
    }

    #[test]
    fn test_rate_limit_is_recoverable() {
        assert_eq!(
            classify(&Failure::api(429, "slow down")),
            FailureClass::Recoverable
        );
        assert_eq!(
            classify(&Failure::api(422, "unprocessable")),
            FailureClass::Recoverable
        );
    }

    #[test]
    fn test_other_statuses_are_ignorable() {
        for status in [400, 404, 410, 500, 502, 503] {
            assert_eq!(
                classify(&Failure::api(status, "whatever")),
                FailureClass::Ignorable,
                "status {}",
                status
            );
        }
    }

    #[test]
    fn test_network_errors_are_ignorable() {
        let failure = Failure::Network("connection reset".to_string());
        assert_eq!(classify(&failure), FailureClass::Ignorable);
        assert!(!is_fatal(&failure));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let failure = Failure::api(429, "slow down");
        let first = classify(&failure);
        for _ in 0..10 {
            assert_eq!(classify(&failure), first);
        }
    }
}
