use super::{MailAddress, User, UserId, UserName};
use chrono::Utc;

/// Builds users that have not been persisted yet.
pub trait UserFactory: Send + Sync {
    fn create(&self, name: UserName, mail: Option<MailAddress>) -> User;
}

/// Assigns a random v4 UUID and stamps the current time.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidUserFactory;

impl UserFactory for UuidUserFactory {
    fn create(&self, name: UserName, mail: Option<MailAddress>) -> User {
        User::new(UserId::generate(), name, mail, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_user_gets_a_fresh_id() {
        let factory = UuidUserFactory;
        let name = UserName::try_new("alice").unwrap();

        let a = factory.create(name.clone(), None);
        let b = factory.create(name.clone(), None);

        assert_ne!(a.id(), b.id());
        assert_eq!(a.name(), &name);
        assert_eq!(a.mail(), None);
    }
}
