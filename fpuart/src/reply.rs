//! Status-qualified command results

use fpuart_core::Status;

/// Confirmation code plus the value that is only meaningful on success
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply<T> {
    pub status: Status,

    /// Present only when `status` is OK
    pub value: Option<T>,
}

impl<T> Reply<T> {
    pub fn ok(value: T) -> Self {
        Self {
            status: Status::Ok,
            value: Some(value),
        }
    }

    pub fn failed(status: Status) -> Self {
        Self {
            status,
            value: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    /// The value, or the status explaining why there is none
    pub fn into_result(self) -> std::result::Result<T, Status> {
        match self.value {
            Some(value) if self.status.is_ok() => Ok(value),
            _ => Err(self.status),
        }
    }
}
