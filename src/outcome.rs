use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Success,
    Failure,
}

/// What a mutation did, in words a visitor can read. Handlers return it to the
/// page they render instead of stashing it in a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub status: Status,
    pub message: String,
}

impl Outcome {
    pub fn success(message: impl Into<String>) -> Outcome {
        Outcome {
            status: Status::Success,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Outcome {
        Outcome {
            status: Status::Failure,
            message: message.into(),
        }
    }

    pub fn listed(kind: &str, name: &str) -> Outcome {
        Outcome::success(format!("{} {} was successfully listed!", kind, name))
    }

    pub fn not_listed(kind: &str, name: &str) -> Outcome {
        Outcome::failure(format!(
            "An error occurred. {} {} could not be listed.",
            kind, name
        ))
    }

    pub fn updated(kind: &str, name: &str) -> Outcome {
        Outcome::success(format!("{} {} was successfully updated!", kind, name))
    }

    pub fn not_updated(kind: &str, name: &str) -> Outcome {
        Outcome::failure(format!(
            "An error occurred. {} {} could not be updated.",
            kind, name
        ))
    }

    pub fn deleted(kind: &str, id: impl fmt::Display) -> Outcome {
        Outcome::success(format!("{} {} was successfully deleted", kind, id))
    }

    pub fn not_deleted(kind: &str, id: impl fmt::Display) -> Outcome {
        Outcome::failure(format!("{} {} could not be deleted", kind, id))
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    pub fn css_class(&self) -> &'static str {
        match self.status {
            Status::Success => "flash flash-success",
            Status::Failure => "flash flash-failure",
        }
    }
}
