use crate::domain_model::{UserId, ValueError};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("invalid user name: {0}")]
    InvalidName(ValueError),
    #[error("invalid mail address: {0}")]
    InvalidMail(ValueError),
    #[error("user already exists")]
    UserAlreadyExists,
    #[error("persistence error: {0}")]
    Persistence(String),
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub name: String,
    pub mail: Option<String>,
}

impl RegisterInput {
    pub fn name(name: impl Into<String>) -> Self {
        RegisterInput {
            name: name.into(),
            mail: None,
        }
    }

    pub fn with_mail(mut self, mail: impl Into<String>) -> Self {
        self.mail = Some(mail.into());
        self
    }
}

/// Where a registration got to. `Failed` is implied by an `Err` outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStage {
    Started,
    NameValidated,
    DuplicateChecked,
    Saved,
    Committed,
}

impl fmt::Display for RegistrationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            RegistrationStage::Started => "started",
            RegistrationStage::NameValidated => "name_validated",
            RegistrationStage::DuplicateChecked => "duplicate_checked",
            RegistrationStage::Saved => "saved",
            RegistrationStage::Committed => "committed",
        };
        f.write_str(stage)
    }
}

#[async_trait::async_trait]
pub trait RegistrationService: Send + Sync {
    /// Registers a new user and returns its id once committed.
    ///
    /// On `Err` nothing has been written.
    async fn register(&self, input: RegisterInput) -> Result<UserId, RegistrationError>;
}
