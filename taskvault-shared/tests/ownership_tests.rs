/// Ownership scoping and account lifecycle tests
///
/// Covers registration validation, credential resolution, ownership-scoped
/// task access and the two-step cascade delete, all against the in-memory
/// store engine.

use std::sync::Arc;

use taskvault_shared::accounts::Accounts;
use taskvault_shared::error::CoreError;
use taskvault_shared::models::task::{NewTask, Task, TaskUpdate};
use taskvault_shared::models::user::{NewAccount, ProfileUpdate, User};
use taskvault_shared::query::{ListParams, TaskQuery};
use taskvault_shared::store::memory::MemStore;
use taskvault_shared::store::{TaskPredicate, TaskStore, UserStore};

struct Harness {
    store: Arc<MemStore>,
    accounts: Accounts,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemStore::new());
        let users: Arc<dyn UserStore> = store.clone();
        let tasks: Arc<dyn TaskStore> = store.clone();
        Self {
            store,
            accounts: Accounts::new(users, tasks),
        }
    }
}

fn account(email: &str) -> NewAccount {
    NewAccount {
        name: "Test".to_string(),
        email: email.to_string(),
        age: 30,
        password: "s3cret!!".to_string(),
    }
}

async fn seed_task(store: &MemStore, owner: &User, description: &str, done: bool) -> Task {
    let task = Task::create(
        owner.id,
        NewTask {
            description: description.to_string(),
            is_completed: done,
        },
    )
    .unwrap();
    store.save_task(&task).await.unwrap();
    task
}

#[tokio::test]
async fn test_register_hashes_and_discards_plaintext() {
    let h = Harness::new();
    let user = h.accounts.register(account("a@x.com")).await.unwrap();

    assert!(user.password_hash.starts_with("$argon2id$"));
    assert!(!user.password_hash.contains("s3cret!!"));

    let stored = h.store.find_user_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.password_hash, user.password_hash);
}

#[tokio::test]
async fn test_register_rejects_invalid_input() {
    let h = Harness::new();

    let mut bad_email = account("nonsense");
    bad_email.email = "nonsense".to_string();
    assert!(matches!(
        h.accounts.register(bad_email).await,
        Err(CoreError::Validation(_))
    ));

    let mut bad_age = account("b@x.com");
    bad_age.age = -4;
    assert!(matches!(
        h.accounts.register(bad_age).await,
        Err(CoreError::Validation(_))
    ));

    let mut bad_password = account("c@x.com");
    bad_password.password = "myPassword1".to_string();
    assert!(matches!(
        h.accounts.register(bad_password).await,
        Err(CoreError::Validation(_))
    ));
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() {
    let h = Harness::new();
    h.accounts.register(account("a@x.com")).await.unwrap();

    // Same address, different casing: normalization makes it collide
    let result = h.accounts.register(account("A@X.COM")).await;
    match result {
        Err(CoreError::Validation(fields)) => assert_eq!(fields[0].field, "email"),
        other => panic!("expected email validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_find_by_credentials_is_undifferentiated() {
    let h = Harness::new();
    h.accounts.register(account("a@x.com")).await.unwrap();

    let unknown = h.accounts.find_by_credentials("b@x.com", "s3cret!!").await;
    let wrong_pass = h.accounts.find_by_credentials("a@x.com", "wrong!!!").await;

    // Unknown email and wrong password are the same failure
    assert!(matches!(unknown, Err(CoreError::Unauthenticated)));
    assert!(matches!(wrong_pass, Err(CoreError::Unauthenticated)));

    let found = h
        .accounts
        .find_by_credentials("a@x.com", "s3cret!!")
        .await
        .unwrap();
    assert_eq!(found.email, "a@x.com");
}

#[tokio::test]
async fn test_update_profile_rehashes_only_when_password_changes() {
    let h = Harness::new();
    let user = h.accounts.register(account("a@x.com")).await.unwrap();
    let original_hash = user.password_hash.clone();

    // Changing the name must not touch the hash
    let user = h
        .accounts
        .update_profile(
            user,
            ProfileUpdate {
                name: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(user.password_hash, original_hash);
    assert_eq!(user.name, "Renamed");

    // Changing the password re-hashes
    let user = h
        .accounts
        .update_profile(
            user,
            ProfileUpdate {
                password: Some("n3w-secret!".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_ne!(user.password_hash, original_hash);

    assert!(h
        .accounts
        .find_by_credentials("a@x.com", "n3w-secret!")
        .await
        .is_ok());
}

#[tokio::test]
async fn test_foreign_task_is_indistinguishable_from_missing() {
    let h = Harness::new();
    let alice = h.accounts.register(account("a@x.com")).await.unwrap();
    let bob = h.accounts.register(account("b@x.com")).await.unwrap();
    let task = seed_task(&h.store, &alice, "buy milk", false).await;

    // Fetch
    let missing = h
        .store
        .find_task(&TaskPredicate::owned(task.id, bob.id))
        .await
        .unwrap();
    assert!(missing.is_none());

    // Delete
    let deleted = h
        .store
        .delete_task(&TaskPredicate::owned(task.id, bob.id))
        .await
        .unwrap();
    assert!(deleted.is_none());

    // The task itself is untouched for its real owner
    let still_there = h
        .store
        .find_task(&TaskPredicate::owned(task.id, alice.id))
        .await
        .unwrap();
    assert!(still_there.is_some());
}

#[tokio::test]
async fn test_list_tasks_filters_completion_within_owner_scope() {
    let h = Harness::new();
    let alice = h.accounts.register(account("a@x.com")).await.unwrap();
    let bob = h.accounts.register(account("b@x.com")).await.unwrap();

    seed_task(&h.store, &alice, "done one", true).await;
    seed_task(&h.store, &alice, "open one", false).await;
    seed_task(&h.store, &bob, "bob done", true).await;

    let params = ListParams {
        is_completed: Some("true".to_string()),
        ..Default::default()
    };
    let listed = h
        .store
        .list_tasks(&TaskQuery::from_params(alice.id, &params))
        .await
        .unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].description, "done one");
    assert_eq!(listed[0].owner_id, alice.id);
}

#[tokio::test]
async fn test_cascade_delete_spares_other_owners() {
    let h = Harness::new();
    let alice = h.accounts.register(account("a@x.com")).await.unwrap();
    let bob = h.accounts.register(account("b@x.com")).await.unwrap();

    seed_task(&h.store, &alice, "gone 1", false).await;
    seed_task(&h.store, &alice, "gone 2", true).await;
    let kept = seed_task(&h.store, &bob, "survives", false).await;

    h.accounts.delete_account(&alice).await.unwrap();

    // Alice and all her tasks are gone
    assert!(h.store.find_user_by_id(alice.id).await.unwrap().is_none());
    let alices = h
        .store
        .list_tasks(&TaskQuery::for_owner(alice.id))
        .await
        .unwrap();
    assert!(alices.is_empty());

    // Bob's task survives, field for field
    let survivor = h
        .store
        .find_task(&TaskPredicate::owned(kept.id, bob.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(survivor.id, kept.id);
    assert_eq!(survivor.description, kept.description);
    assert_eq!(survivor.is_completed, kept.is_completed);
    assert_eq!(survivor.owner_id, kept.owner_id);
    assert_eq!(survivor.created_at, kept.created_at);
    assert_eq!(survivor.updated_at, kept.updated_at);
}

#[tokio::test]
async fn test_cascade_delete_is_two_steps_not_atomic() {
    // The coordinator deletes tasks first, then the user. There is no
    // transaction around the pair: a crash in between leaves an orphaned
    // user with no tasks. This test pins the ordering that makes the
    // benign window possible rather than pretending the sequence is atomic.
    let h = Harness::new();
    let alice = h.accounts.register(account("a@x.com")).await.unwrap();
    seed_task(&h.store, &alice, "ephemeral", false).await;

    // Simulate the first step alone
    h.store.delete_tasks_by_owner(alice.id).await.unwrap();

    // Mid-window state: user still present, tasks already gone
    assert!(h.store.find_user_by_id(alice.id).await.unwrap().is_some());
    assert!(h
        .store
        .list_tasks(&TaskQuery::for_owner(alice.id))
        .await
        .unwrap()
        .is_empty());

    // The full sequence converges to the same terminal state
    h.accounts.delete_account(&alice).await.unwrap();
    assert!(h.store.find_user_by_id(alice.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_task_update_restricted_to_allowed_fields() {
    let h = Harness::new();
    let alice = h.accounts.register(account("a@x.com")).await.unwrap();
    let mut task = seed_task(&h.store, &alice, "buy milk", false).await;

    task.apply(TaskUpdate {
        description: None,
        is_completed: Some(true),
    })
    .unwrap();
    h.store.save_task(&task).await.unwrap();

    let stored = h
        .store
        .find_task(&TaskPredicate::owned(task.id, alice.id))
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_completed);
    assert_eq!(stored.description, "buy milk");
}
