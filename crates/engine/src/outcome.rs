use serde::Serialize;

/// Why an operation failed, as far as the caller needs to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Cause {
    /// The request names something that can never be valid.
    InvalidInput,
    /// A path the request depends on does not exist.
    NotFound,
    /// Something already occupies the target.
    Conflict,
    /// A folder still has contents and cannot be removed.
    NotEmpty,
    /// A move copied the file but could not delete the original.
    PartialTransfer,
    /// The filesystem refused an operation.
    Storage,
    /// The operation stopped without reaching any of the above.
    Unknown,
}

/// The result of a public operation: a message for a person to read, plus
/// either a payload or a cause.
///
/// Operations never return errors. Anything that went wrong has already been
/// logged and summarized into a [`Failure`](Outcome::Failure).
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success { message: String, payload: T },
    Failure { message: String, cause: Cause },
}

impl<T> Outcome<T> {
    pub fn success(message: impl Into<String>, payload: T) -> Self {
        Self::Success {
            message: message.into(),
            payload,
        }
    }

    pub fn failure(cause: Cause, message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
            cause,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success { message, .. } | Self::Failure { message, .. } => message,
        }
    }

    pub fn cause(&self) -> Option<Cause> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { cause, .. } => Some(*cause),
        }
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            Self::Success { payload, .. } => Some(payload),
            Self::Failure { .. } => None,
        }
    }

    pub fn into_payload(self) -> Option<T> {
        match self {
            Self::Success { payload, .. } => Some(payload),
            Self::Failure { .. } => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Success { message, payload } => Outcome::Success {
                message,
                payload: f(payload),
            },
            Self::Failure { message, cause } => Outcome::Failure { message, cause },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let success = Outcome::success("Transfer Successful", 42);
        assert!(success.is_success());
        assert_eq!(success.message(), "Transfer Successful");
        assert_eq!(success.cause(), None);
        assert_eq!(success.payload(), Some(&42));
        assert_eq!(success.map(|n| n * 2).into_payload(), Some(84));

        let failure: Outcome<u32> = Outcome::failure(Cause::Conflict, "Directory already exists.");
        assert!(!failure.is_success());
        assert_eq!(failure.cause(), Some(Cause::Conflict));
        assert_eq!(failure.payload(), None);
        assert_eq!(failure.map(|n| n.to_string()).message(), "Directory already exists.");
    }

    #[test]
    fn test_cause_serialization() {
        assert_eq!(serde_json::to_value(Cause::PartialTransfer).unwrap(), "partialTransfer");
        assert_eq!(serde_json::to_value(Cause::NotEmpty).unwrap(), "notEmpty");
    }
}
