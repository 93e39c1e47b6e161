//! Registrations racing each other through the in-memory store.

use futures_util::future::join_all;
use registrar::application_impl::RealRegistrationService;
use registrar::application_port::*;
use registrar::domain_model::*;
use registrar::domain_port::*;
use registrar::domain_service::*;
use registrar::infra_memory::*;
use rstest::{fixture, rstest};
use std::sync::{Arc, Mutex};
use tokio::sync::Barrier;

/// Runs the real check, then waits until every caller has checked too, so
/// all of them decide before anyone writes.
struct LockstepChecker {
    inner: RepoDuplicateChecker,
    barrier: Barrier,
    answers: Mutex<Vec<bool>>,
}

impl LockstepChecker {
    fn new(repo: Arc<dyn UserRepo>, callers: usize) -> Self {
        LockstepChecker {
            inner: RepoDuplicateChecker::new(repo, UniquenessKey::Name),
            barrier: Barrier::new(callers),
            answers: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl DuplicateChecker for LockstepChecker {
    async fn exists(&self, user: &User) -> Result<bool, StoreError> {
        self.inner.exists(user).await
    }

    async fn exists_in_tx(&self, tx: &mut dyn StorageTx, user: &User) -> Result<bool, StoreError> {
        let answer = self.inner.exists_in_tx(tx, user).await?;
        self.answers.lock().unwrap().push(answer);
        self.barrier.wait().await;
        Ok(answer)
    }
}

struct Store {
    db: Arc<MemoryDb>,
    repo: Arc<MemoryUserRepo>,
    tx_manager: Arc<MemoryTxManager>,
}

impl Store {
    fn service(&self) -> RealRegistrationService {
        RealRegistrationService::new(
            Arc::new(UuidUserFactory),
            self.repo.clone(),
            self.tx_manager.clone(),
        )
    }

    fn checked_service(&self) -> RealRegistrationService {
        self.service().with_duplicate_checker(Arc::new(RepoDuplicateChecker::new(
            self.repo.clone(),
            UniquenessKey::Name,
        )))
    }

    fn rows_named(&self, name: &str) -> usize {
        self.db
            .count_where(&UserLookup::Name(UserName::try_new(name).unwrap()))
    }
}

#[fixture]
fn store() -> Store {
    let db = MemoryDb::new();
    Store {
        repo: Arc::new(MemoryUserRepo::new(db.clone())),
        tx_manager: Arc::new(MemoryTxManager::new(db.clone())),
        db,
    }
}

async fn register_concurrently(
    service: Arc<dyn RegistrationService>,
    inputs: Vec<RegisterInput>,
) -> Vec<Result<UserId, RegistrationError>> {
    let handles = inputs.into_iter().map(|input| {
        let service = service.clone();
        tokio::spawn(async move { service.register(input).await })
    });
    join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect()
}

fn tally(outcomes: &[Result<UserId, RegistrationError>]) -> (usize, usize) {
    let committed = outcomes.iter().filter(|o| o.is_ok()).count();
    let duplicates = outcomes
        .iter()
        .filter(|o| **o == Err(RegistrationError::UserAlreadyExists))
        .count();
    (committed, duplicates)
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_concurrent_bobs_leave_one_row(store: Store) {
    let service: Arc<dyn RegistrationService> = Arc::new(store.checked_service());

    let outcomes = register_concurrently(
        service,
        vec![RegisterInput::name("bob"), RegisterInput::name("bob")],
    )
    .await;

    assert_eq!(tally(&outcomes), (1, 1));
    assert_eq!(store.rows_named("bob"), 1);
}

#[rstest]
#[case::with_duplicate_check(true)]
#[case::constraint_only(false)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn at_most_one_of_many_racing_registrations_wins(store: Store, #[case] checked: bool) {
    let service: Arc<dyn RegistrationService> = if checked {
        Arc::new(store.checked_service())
    } else {
        Arc::new(store.service())
    };

    let outcomes =
        register_concurrently(service, (0..32).map(|_| RegisterInput::name("zoe")).collect())
            .await;

    assert_eq!(tally(&outcomes), (1, 31));
    assert_eq!(store.rows_named("zoe"), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn distinct_names_do_not_interfere(store: Store) {
    let service: Arc<dyn RegistrationService> = Arc::new(store.checked_service());
    let inputs = (0..16)
        .map(|i| RegisterInput::name(format!("user-{i}")))
        .collect();

    let outcomes = register_concurrently(service, inputs).await;

    assert_eq!(tally(&outcomes), (16, 0));
    assert_eq!(store.db.snapshot().len(), 16);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn passing_the_duplicate_check_does_not_guarantee_the_insert(store: Store) {
    let checker = Arc::new(LockstepChecker::new(store.repo.clone(), 2));
    let service: Arc<dyn RegistrationService> =
        Arc::new(store.service().with_duplicate_checker(checker.clone()));

    let outcomes = register_concurrently(
        service,
        vec![RegisterInput::name("mallory"), RegisterInput::name("mallory")],
    )
    .await;

    // both callers were told the name was free
    assert_eq!(*checker.answers.lock().unwrap(), vec![false, false]);
    // the unique constraint still let only one through
    assert_eq!(tally(&outcomes), (1, 1));
    assert_eq!(store.rows_named("mallory"), 1);
}

#[rstest]
#[tokio::test]
async fn interleaved_transactions_collide_at_the_store(store: Store) {
    let factory = UuidUserFactory;
    let first_user = factory.create(UserName::try_new("oscar").unwrap(), None);
    let second_user = factory.create(UserName::try_new("oscar").unwrap(), None);
    let checker = RepoDuplicateChecker::new(store.repo.clone(), UniquenessKey::Name);

    let mut first = store.tx_manager.begin().await.unwrap();
    let mut second = store.tx_manager.begin().await.unwrap();
    assert!(!checker.exists_in_tx(&mut *first, &first_user).await.unwrap());
    assert!(!checker.exists_in_tx(&mut *second, &second_user).await.unwrap());

    let saved = store.repo.save_in_tx(&mut *first, &first_user).await;
    let rejected = store.repo.save_in_tx(&mut *second, &second_user).await;

    assert_eq!(saved, Ok(()));
    assert_eq!(
        rejected,
        Err(StoreError::ConstraintViolation {
            constraint: constraint_name(UniquenessKey::Name)
        })
    );
    second.rollback().await.unwrap();
    first.commit().await.unwrap();
    assert_eq!(store.db.snapshot(), vec![first_user]);
}

#[rstest]
#[tokio::test]
async fn sequential_registrations_of_one_name(store: Store) {
    let service = store.checked_service();

    assert!(service.register(RegisterInput::name("alice")).await.is_ok());
    assert_eq!(
        service.register(RegisterInput::name("alice")).await,
        Err(RegistrationError::UserAlreadyExists)
    );
    assert_eq!(store.rows_named("alice"), 1);
}
