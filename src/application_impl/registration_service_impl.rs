use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::{StorageTx, StoreError, TxManager, UserRepo};
use crate::domain_service::DuplicateChecker;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Registration workflow.
///
/// The optional duplicate check only rejects early. Uniqueness is decided
/// by the store: a `ConstraintViolation` from `save_in_tx` or `commit` is the
/// rejection that holds under concurrent registrations.
pub struct RealRegistrationService {
    user_factory: Arc<dyn UserFactory>,
    user_repo: Arc<dyn UserRepo>,
    duplicate_checker: Option<Arc<dyn DuplicateChecker>>,
    tx_manager: Arc<dyn TxManager>,
}

impl RealRegistrationService {
    pub fn new(
        user_factory: Arc<dyn UserFactory>,
        user_repo: Arc<dyn UserRepo>,
        tx_manager: Arc<dyn TxManager>,
    ) -> RealRegistrationService {
        RealRegistrationService {
            user_factory,
            user_repo,
            duplicate_checker: None,
            tx_manager,
        }
    }

    pub fn with_duplicate_checker(mut self, checker: Arc<dyn DuplicateChecker>) -> Self {
        self.duplicate_checker = Some(checker);
        self
    }

    async fn check_and_save(
        &self,
        tx: &mut dyn StorageTx,
        user: &User,
    ) -> Result<(), RegistrationError> {
        if let Some(checker) = &self.duplicate_checker {
            if checker.exists_in_tx(tx, user).await.map_err(translate)? {
                debug!(user_id = %user.id(), "duplicate check hit");
                return Err(RegistrationError::UserAlreadyExists);
            }
            debug!(stage = %RegistrationStage::DuplicateChecked, user_id = %user.id());
        }

        self.user_repo
            .save_in_tx(tx, user)
            .await
            .map_err(translate)?;
        debug!(stage = %RegistrationStage::Saved, user_id = %user.id());
        Ok(())
    }
}

/// The only place storage failures become registration errors.
fn translate(error: StoreError) -> RegistrationError {
    match error {
        StoreError::ConstraintViolation { constraint } => {
            debug!(%constraint, "unique constraint rejected the write");
            RegistrationError::UserAlreadyExists
        }
        StoreError::Backend(e) => RegistrationError::Persistence(e),
    }
}

#[async_trait::async_trait]
impl RegistrationService for RealRegistrationService {
    async fn register(&self, input: RegisterInput) -> Result<UserId, RegistrationError> {
        debug!(stage = %RegistrationStage::Started, name = %input.name);

        let name = UserName::try_new(input.name).map_err(RegistrationError::InvalidName)?;
        let mail = input
            .mail
            .map(MailAddress::try_new)
            .transpose()
            .map_err(RegistrationError::InvalidMail)?;
        let user = self.user_factory.create(name, mail);
        debug!(stage = %RegistrationStage::NameValidated, user_id = %user.id());

        let mut tx = self.tx_manager.begin().await.map_err(translate)?;

        if let Err(e) = self.check_and_save(&mut *tx, &user).await {
            if let Err(rollback_err) = tx.rollback().await {
                error!(user_id = %user.id(), "rollback failed: {}", rollback_err);
            }
            warn!(user_id = %user.id(), name = %user.name(), "registration failed: {}", e);
            return Err(e);
        }

        if let Err(e) = tx.commit().await {
            let e = translate(e);
            warn!(user_id = %user.id(), name = %user.name(), "commit failed: {}", e);
            return Err(e);
        }

        info!(
            stage = %RegistrationStage::Committed,
            user_id = %user.id(),
            name = %user.name(),
            "user registered"
        );
        Ok(user.id())
    }
}
