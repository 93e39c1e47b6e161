use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("user name must not be empty")]
    EmptyName,
    #[error("invalid mail address: {0:?}")]
    InvalidMail(String),
}

#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct UserId(pub uuid::Uuid);

impl UserId {
    pub fn generate() -> Self {
        UserId(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(UserId)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(String);

impl UserName {
    pub fn try_new(value: impl Into<String>) -> Result<Self, ValueError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValueError::EmptyName);
        }
        Ok(UserName(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserName {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        UserName::try_new(value)
    }
}

impl From<UserName> for String {
    fn from(name: UserName) -> Self {
        name.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MailAddress(String);

impl MailAddress {
    pub fn try_new(value: impl Into<String>) -> Result<Self, ValueError> {
        let value = value.into();
        match value.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(MailAddress(value))
            }
            _ => Err(ValueError::InvalidMail(value)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MailAddress {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        MailAddress::try_new(value)
    }
}

impl From<MailAddress> for String {
    fn from(mail: MailAddress) -> Self {
        mail.0
    }
}

impl fmt::Display for MailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered (or about to be registered) user.
///
/// `name` and `mail` are the human-facing attributes a store may put unique
/// constraints on; `id` is the primary key the upsert is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    name: UserName,
    mail: Option<MailAddress>,
    registered_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        id: UserId,
        name: UserName,
        mail: Option<MailAddress>,
        registered_at: DateTime<Utc>,
    ) -> Self {
        User {
            id,
            name,
            mail,
            registered_at,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn name(&self) -> &UserName {
        &self.name
    }

    pub fn mail(&self) -> Option<&MailAddress> {
        self.mail.as_ref()
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }
}

/// An attribute that can be designated as a uniqueness key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UniquenessKey {
    Name,
    Mail,
}

impl UniquenessKey {
    /// The lookup for this key's value on `user`, if the user carries it.
    pub fn lookup_for(self, user: &User) -> Option<UserLookup> {
        match self {
            UniquenessKey::Name => Some(UserLookup::Name(user.name().clone())),
            UniquenessKey::Mail => user.mail().cloned().map(UserLookup::Mail),
        }
    }
}

impl fmt::Display for UniquenessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniquenessKey::Name => f.write_str("name"),
            UniquenessKey::Mail => f.write_str("mail"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserLookup {
    Name(UserName),
    Mail(MailAddress),
}

impl UserLookup {
    pub fn key(&self) -> UniquenessKey {
        match self {
            UserLookup::Name(_) => UniquenessKey::Name,
            UserLookup::Mail(_) => UniquenessKey::Mail,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            UserLookup::Name(name) => name.as_str(),
            UserLookup::Mail(mail) => mail.as_str(),
        }
    }
}
