//! Account command handler tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::account::{Account, ProfileFields};
use crate::domain::entities::verification_token::{TokenPurpose, VerificationToken};
use crate::errors::{CommandError, CommandResult};
use crate::repositories::store::{CredentialStore, InMemoryCredentialStore};
use crate::services::account::{AccountService, AccountServiceConfig};
use crate::services::token::{TokenService, TokenServiceConfig};

use super::mocks::{MockPasswordHasher, RecordingNotifier};

type TestService =
    AccountService<InMemoryCredentialStore, MockPasswordHasher, RecordingNotifier>;

struct Fixture {
    store: Arc<InMemoryCredentialStore>,
    notifier: Arc<RecordingNotifier>,
    service: TestService,
}

fn build(store: Arc<InMemoryCredentialStore>, notifier: Arc<RecordingNotifier>) -> TestService {
    AccountService::new(
        store.clone(),
        TokenService::new(store, TokenServiceConfig::default()),
        Arc::new(MockPasswordHasher),
        notifier,
        AccountServiceConfig::default(),
    )
}

async fn fixture() -> (Fixture, Account) {
    let store = Arc::new(InMemoryCredentialStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let account = store
        .insert_account(Account::new(
            "alice".to_string(),
            "alice@example.com".to_string(),
            "hashed:old-password".to_string(),
        ))
        .await
        .unwrap();
    let service = build(store.clone(), notifier.clone());
    (
        Fixture {
            store,
            notifier,
            service,
        },
        account,
    )
}

#[tokio::test]
async fn test_update_profile_applies_fields() {
    let (f, account) = fixture().await;
    let fields = ProfileFields {
        display_name: Some("Alice".to_string()),
        bio: Some("hello".to_string()),
    };

    f.service.update_profile(account.id, fields).await.unwrap();

    let stored = f.store.find_account_by_id(account.id).await.unwrap().unwrap();
    assert_eq!(stored.display_name.as_deref(), Some("Alice"));
    assert_eq!(stored.version, 2);
}

#[tokio::test]
async fn test_update_profile_is_idempotent() {
    let (f, account) = fixture().await;
    let fields = ProfileFields {
        display_name: Some("Alice".to_string()),
        bio: None,
    };

    f.service.update_profile(account.id, fields.clone()).await.unwrap();
    f.service.update_profile(account.id, fields).await.unwrap();

    // The second submission matched current state and wrote nothing
    let stored = f.store.find_account_by_id(account.id).await.unwrap().unwrap();
    assert_eq!(stored.version, 2);
}

#[tokio::test]
async fn test_update_profile_unknown_account() {
    let (f, _account) = fixture().await;
    let err = f
        .service
        .update_profile(Uuid::new_v4(), ProfileFields::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::NotFound));
}

#[tokio::test]
async fn test_change_username_success() {
    let (f, account) = fixture().await;

    f.service.change_username(account.id, "alice2").await.unwrap();

    let stored = f.store.find_account_by_id(account.id).await.unwrap().unwrap();
    assert_eq!(stored.username, "alice2");
    assert_eq!(stored.version, 2);
}

#[tokio::test]
async fn test_change_username_conflict() {
    let (f, account) = fixture().await;
    f.store
        .insert_account(Account::new(
            "bob".to_string(),
            "bob@example.com".to_string(),
            "hashed:x".to_string(),
        ))
        .await
        .unwrap();

    let err = f.service.change_username(account.id, "bob").await.unwrap_err();
    assert!(matches!(err, CommandError::Conflict { field: "username" }));
}

#[tokio::test]
async fn test_change_username_same_value_is_noop() {
    let (f, account) = fixture().await;

    f.service.change_username(account.id, "alice").await.unwrap();

    let stored = f.store.find_account_by_id(account.id).await.unwrap().unwrap();
    assert_eq!(stored.version, 1);
}

/// Store wrapper that commits a rival username write right before the
/// first compare-and-swap it sees, so the observed caller always loses
/// the race.
struct ContendedStore {
    inner: Arc<InMemoryCredentialStore>,
    contended: AtomicBool,
}

#[async_trait]
impl CredentialStore for ContendedStore {
    async fn find_account_by_id(&self, id: Uuid) -> CommandResult<Option<Account>> {
        self.inner.find_account_by_id(id).await
    }

    async fn find_account_by_username(&self, username: &str) -> CommandResult<Option<Account>> {
        self.inner.find_account_by_username(username).await
    }

    async fn find_account_by_email(&self, email: &str) -> CommandResult<Option<Account>> {
        self.inner.find_account_by_email(email).await
    }

    async fn insert_account(&self, account: Account) -> CommandResult<Account> {
        self.inner.insert_account(account).await
    }

    async fn update_account(
        &self,
        account: Account,
        expected_version: i64,
    ) -> CommandResult<Account> {
        if !self.contended.swap(true, Ordering::SeqCst) {
            let mut rival = self
                .inner
                .find_account_by_id(account.id)
                .await?
                .ok_or(CommandError::NotFound)?;
            let rival_version = rival.version;
            rival.set_username("rival".to_string());
            self.inner.update_account(rival, rival_version).await?;
        }
        self.inner.update_account(account, expected_version).await
    }

    async fn issue_token(&self, token: VerificationToken) -> CommandResult<u64> {
        self.inner.issue_token(token).await
    }

    async fn find_token_by_hash(
        &self,
        token_hash: &str,
    ) -> CommandResult<Option<VerificationToken>> {
        self.inner.find_token_by_hash(token_hash).await
    }

    async fn consume_token_and_verify_email(&self, token_id: Uuid) -> CommandResult<Account> {
        self.inner.consume_token_and_verify_email(token_id).await
    }

    async fn consume_token_and_set_password(
        &self,
        token_id: Uuid,
        new_password_hash: &str,
    ) -> CommandResult<Account> {
        self.inner
            .consume_token_and_set_password(token_id, new_password_hash)
            .await
    }
}

#[tokio::test]
async fn test_change_username_lost_race_surfaces_version_conflict() {
    let inner = Arc::new(InMemoryCredentialStore::new());
    let account = inner
        .insert_account(Account::new(
            "alice".to_string(),
            "alice@example.com".to_string(),
            "hashed:old-password".to_string(),
        ))
        .await
        .unwrap();
    let store = Arc::new(ContendedStore {
        inner: inner.clone(),
        contended: AtomicBool::new(false),
    });
    let service = AccountService::new(
        store.clone(),
        TokenService::new(store.clone(), TokenServiceConfig::default()),
        Arc::new(MockPasswordHasher),
        Arc::new(RecordingNotifier::new()),
        AccountServiceConfig::default(),
    );

    let err = service.change_username(account.id, "alice2").await.unwrap_err();
    assert!(matches!(err, CommandError::VersionConflict));

    // The winner's write landed whole; the loser changed nothing
    let stored = inner.find_account_by_id(account.id).await.unwrap().unwrap();
    assert_eq!(stored.username, "rival");
    assert_eq!(stored.version, 2);

    // A retry re-reads current state and succeeds
    service.change_username(account.id, "alice2").await.unwrap();
    let stored = inner.find_account_by_id(account.id).await.unwrap().unwrap();
    assert_eq!(stored.username, "alice2");
    assert_eq!(stored.version, 3);
}

#[tokio::test]
async fn test_change_username_rejects_bad_format() {
    let (f, account) = fixture().await;
    let err = f
        .service
        .change_username(account.id, "not a username!")
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::MalformedPayload { .. }));
}

#[tokio::test]
async fn test_change_password_rotates_and_invalidates_old_proof() {
    let (f, account) = fixture().await;

    f.service
        .change_password(account.id, "old-password", "NewPass1!")
        .await
        .unwrap();

    let stored = f.store.find_account_by_id(account.id).await.unwrap().unwrap();
    assert_eq!(stored.password_hash, "hashed:NewPass1!");
    assert_eq!(stored.version, 2);

    // The old proof no longer verifies
    let err = f
        .service
        .change_password(account.id, "old-password", "AnotherPass1!")
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::InvalidCredential));
}

#[tokio::test]
async fn test_change_password_uniform_error_for_unknown_account() {
    let (f, account) = fixture().await;

    let missing = f
        .service
        .change_password(Uuid::new_v4(), "whatever", "NewPass1!")
        .await
        .unwrap_err();
    let wrong = f
        .service
        .change_password(account.id, "wrong-proof", "NewPass1!")
        .await
        .unwrap_err();

    // Missing account and wrong password are indistinguishable
    assert_eq!(missing.kind(), wrong.kind());
    assert_eq!(missing.to_string(), wrong.to_string());
}

#[tokio::test]
async fn test_change_password_enforces_policy() {
    let (f, account) = fixture().await;
    let err = f
        .service
        .change_password(account.id, "old-password", "short")
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::MalformedPayload { .. }));
}

#[tokio::test]
async fn test_change_email_resets_verification_and_issues_token() {
    let (f, account) = fixture().await;

    f.service
        .change_email(account.id, "new@example.com")
        .await
        .unwrap();

    let stored = f.store.find_account_by_id(account.id).await.unwrap().unwrap();
    assert_eq!(stored.email, "new@example.com");
    assert!(!stored.email_verified);
    assert_eq!(f.store.active_tokens(account.id, TokenPurpose::EmailVerify).await, 1);

    let sent = f.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].email, "new@example.com");
    assert_eq!(sent[0].kind, "email-verification");
}

#[tokio::test]
async fn test_change_email_conflict() {
    let (f, account) = fixture().await;
    f.store
        .insert_account(Account::new(
            "bob".to_string(),
            "bob@example.com".to_string(),
            "hashed:x".to_string(),
        ))
        .await
        .unwrap();

    let err = f
        .service
        .change_email(account.id, "bob@example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::Conflict { field: "email" }));
}

#[tokio::test]
async fn test_change_email_redelivery_keeps_one_active_token() {
    let (f, account) = fixture().await;

    f.service.change_email(account.id, "new@example.com").await.unwrap();
    // Redelivered command: email already set, still exactly one active token
    f.service.change_email(account.id, "new@example.com").await.unwrap();

    assert_eq!(f.store.active_tokens(account.id, TokenPurpose::EmailVerify).await, 1);
    assert_eq!(f.notifier.sent().len(), 2);
}

#[tokio::test]
async fn test_change_email_unchanged_and_verified_is_noop_success() {
    let (f, account) = fixture().await;

    f.service.send_email_verification(account.id).await.unwrap();
    let raw = f.notifier.sent()[0].raw_token.clone();
    f.service.verify_email(&raw).await.unwrap();

    // Redelivery after verification completed: same address, no effect
    f.service
        .change_email(account.id, "alice@example.com")
        .await
        .unwrap();

    assert_eq!(f.store.active_tokens(account.id, TokenPurpose::EmailVerify).await, 0);
    assert_eq!(f.notifier.sent().len(), 1);
    let stored = f.store.find_account_by_id(account.id).await.unwrap().unwrap();
    assert!(stored.email_verified);
    assert_eq!(stored.version, 2);
}

#[tokio::test]
async fn test_send_verification_twice_supersedes_first_token() {
    let (f, account) = fixture().await;

    f.service.send_email_verification(account.id).await.unwrap();
    f.service.send_email_verification(account.id).await.unwrap();

    assert_eq!(f.store.active_tokens(account.id, TokenPurpose::EmailVerify).await, 1);

    // The first raw token no longer verifies; the second does
    let sent = f.notifier.sent();
    assert_eq!(sent.len(), 2);
    let err = f.service.verify_email(&sent[0].raw_token).await.unwrap_err();
    assert!(matches!(err, CommandError::InvalidOrExpiredToken));
    f.service.verify_email(&sent[1].raw_token).await.unwrap();
}

#[tokio::test]
async fn test_send_verification_on_verified_email_is_noop_success() {
    let (f, account) = fixture().await;

    f.service.send_email_verification(account.id).await.unwrap();
    let raw = f.notifier.sent()[0].raw_token.clone();
    f.service.verify_email(&raw).await.unwrap();

    f.service.send_email_verification(account.id).await.unwrap();

    // No new token, no new mail
    assert_eq!(f.store.active_tokens(account.id, TokenPurpose::EmailVerify).await, 0);
    assert_eq!(f.notifier.sent().len(), 1);
}

#[tokio::test]
async fn test_verify_email_sets_flag_exactly_once() {
    let (f, account) = fixture().await;

    f.service.send_email_verification(account.id).await.unwrap();
    let raw = f.notifier.sent()[0].raw_token.clone();

    f.service.verify_email(&raw).await.unwrap();
    let stored = f.store.find_account_by_id(account.id).await.unwrap().unwrap();
    assert!(stored.email_verified);

    let err = f.service.verify_email(&raw).await.unwrap_err();
    assert!(matches!(err, CommandError::InvalidOrExpiredToken));
}

#[tokio::test]
async fn test_forgot_password_constant_shape() {
    let (f, _account) = fixture().await;

    let known = f.service.forgot_password("alice@example.com").await;
    let unknown = f.service.forgot_password("nobody@example.com").await;

    // Structurally identical successes
    assert!(known.is_ok());
    assert!(unknown.is_ok());

    // But only the existing account got a token
    let sent = f.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].email, "alice@example.com");
    assert_eq!(sent[0].kind, "password-reset");
}

#[tokio::test]
async fn test_reset_password_consumes_token() {
    let (f, account) = fixture().await;

    f.service.forgot_password("alice@example.com").await.unwrap();
    let raw = f.notifier.sent()[0].raw_token.clone();

    f.service.reset_password(&raw, "BrandNewPass1").await.unwrap();

    let stored = f.store.find_account_by_id(account.id).await.unwrap().unwrap();
    assert_eq!(stored.password_hash, "hashed:BrandNewPass1");

    // Token is single-use
    let err = f.service.reset_password(&raw, "OtherPass123").await.unwrap_err();
    assert!(matches!(err, CommandError::InvalidOrExpiredToken));
}

#[tokio::test]
async fn test_reset_password_rejects_email_verify_token() {
    let (f, account) = fixture().await;

    f.service.send_email_verification(account.id).await.unwrap();
    let raw = f.notifier.sent()[0].raw_token.clone();

    let err = f.service.reset_password(&raw, "BrandNewPass1").await.unwrap_err();
    assert!(matches!(err, CommandError::InvalidOrExpiredToken));
}

#[tokio::test]
async fn test_notifier_outage_is_transient() {
    let store = Arc::new(InMemoryCredentialStore::new());
    let account = store
        .insert_account(Account::new(
            "alice".to_string(),
            "alice@example.com".to_string(),
            "hashed:old-password".to_string(),
        ))
        .await
        .unwrap();
    let service = build(store.clone(), Arc::new(RecordingNotifier::failing()));

    let err = service.send_email_verification(account.id).await.unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_concurrent_verify_email_applies_once() {
    let (f, account) = fixture().await;

    f.service.send_email_verification(account.id).await.unwrap();
    let raw = f.notifier.sent()[0].raw_token.clone();

    let service = Arc::new(f.service);
    let a = {
        let service = service.clone();
        let raw = raw.clone();
        tokio::spawn(async move { service.verify_email(&raw).await })
    };
    let b = {
        let service = service.clone();
        let raw = raw.clone();
        tokio::spawn(async move { service.verify_email(&raw).await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    for failure in results.iter().filter(|r| r.is_err()) {
        assert!(matches!(
            failure.as_ref().unwrap_err(),
            CommandError::InvalidOrExpiredToken
        ));
    }
}
