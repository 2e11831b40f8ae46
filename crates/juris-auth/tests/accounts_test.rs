//! Integration tests for account operations against in-memory SurrealDB.

use std::sync::Mutex;

use juris_auth::accounts::{
    NewAccount, create_client_profile, create_superuser, create_user, issue_tokens,
    set_profile_picture,
};
use juris_auth::error::AuthError;
use juris_auth::password::check_password;
use juris_auth::token::{Claims, TokenIssuer, TokenPair, TokenType};
use juris_core::email::Email;
use juris_core::error::{JurisError, JurisResult};
use juris_core::models::client::CreateClient;
use juris_core::models::user::{User, UserFields};
use juris_core::repository::{ClientRepository, Pagination, UserRepository};
use juris_db::{SurrealClientRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    juris_db::run_migrations(&db).await.unwrap();
    db
}

fn account(email: &str, password: Option<&str>) -> NewAccount {
    NewAccount {
        email: Some(email.into()),
        password: password.map(Into::into),
        fields: UserFields::default(),
    }
}

/// Issuer that records who it was asked to mint tokens for.
#[derive(Default)]
struct RecordingIssuer {
    issued_for: Mutex<Vec<Uuid>>,
}

impl TokenIssuer for RecordingIssuer {
    fn issue(&self, user: &User) -> Result<TokenPair, AuthError> {
        self.issued_for.lock().unwrap().push(user.id);
        Ok(TokenPair {
            refresh_token: format!("refresh-{}", user.id),
            access_token: format!("access-{}", user.id),
        })
    }

    fn verify(&self, _token: &str, _expected: TokenType) -> Result<Claims, AuthError> {
        Err(AuthError::TokenInvalid("not supported".into()))
    }

    fn access_token_lifetime_secs(&self) -> u64 {
        60
    }
}

/// Asset store that keeps uploads in memory.
#[derive(Default)]
struct MemoryAssetStore {
    uploads: Mutex<Vec<(String, Vec<u8>)>>,
}

impl juris_core::assets::AssetStore for MemoryAssetStore {
    async fn store(&self, prefix: &str, file_name: &str, bytes: Vec<u8>) -> JurisResult<String> {
        let reference = format!("{prefix}/{file_name}");
        self.uploads.lock().unwrap().push((reference.clone(), bytes));
        Ok(reference)
    }
}

#[tokio::test]
async fn created_user_verifies_only_its_password() {
    let repo = SurrealUserRepository::new(setup().await);

    let user = create_user(&repo, account("carol@example.com", Some("correct horse")))
        .await
        .unwrap();

    assert!(check_password(&user, "correct horse", None).unwrap());
    assert!(!check_password(&user, "Correct horse", None).unwrap());
    assert!(!check_password(&user, "", None).unwrap());
}

#[tokio::test]
async fn missing_email_creates_nothing() {
    let repo = SurrealUserRepository::new(setup().await);

    let err = create_user(
        &repo,
        NewAccount {
            email: None,
            password: Some("pw".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, JurisError::Validation { .. }));

    let err = create_user(&repo, account("   ", Some("pw"))).await.unwrap_err();
    assert!(matches!(err, JurisError::Validation { .. }));

    let err = create_user(&repo, account("no-at-sign", Some("pw")))
        .await
        .unwrap_err();
    assert!(matches!(err, JurisError::Validation { .. }));

    let page = repo.list(Pagination::default()).await.unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn email_uniqueness_is_case_insensitive_on_domain() {
    let repo = SurrealUserRepository::new(setup().await);

    let first = create_user(&repo, account("a@Example.COM", Some("pw-1")))
        .await
        .unwrap();
    assert_eq!(first.email, "a@example.com");

    let err = create_user(&repo, account("a@example.com", Some("pw-2")))
        .await
        .unwrap_err();
    assert!(matches!(err, JurisError::AlreadyExists { .. }));

    let page = repo.list(Pagination::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].email, "a@example.com");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_yield_one_account() {
    let repo = SurrealUserRepository::new(setup().await);

    let mut handles = Vec::new();
    for i in 0..8 {
        let repo = repo.clone();
        let email = if i % 2 == 0 {
            "race@example.com"
        } else {
            "race@Example.com"
        };
        handles.push(tokio::spawn(async move {
            create_user(&repo, account(email, Some("pw"))).await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(JurisError::AlreadyExists { .. }) => {}
            Err(other) => panic!("expected AlreadyExists, got {other:?}"),
        }
    }
    assert_eq!(created, 1);

    let page = repo.list(Pagination::default()).await.unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn passwordless_accounts_must_be_federated() {
    let repo = SurrealUserRepository::new(setup().await);

    let err = create_user(&repo, account("local@example.com", None))
        .await
        .unwrap_err();
    assert!(matches!(err, JurisError::Validation { .. }));

    let err = create_user(&repo, account("local@example.com", Some("")))
        .await
        .unwrap_err();
    assert!(matches!(err, JurisError::Validation { .. }));

    let user = create_user(
        &repo,
        NewAccount {
            email: Some("fed@example.com".into()),
            password: None,
            fields: UserFields {
                is_google_user: true,
                ..Default::default()
            },
        },
    )
    .await
    .unwrap();

    assert!(user.is_google_user);
    assert!(!user.has_usable_password());
    assert!(!check_password(&user, "", None).unwrap());
}

#[tokio::test]
async fn superuser_requires_password() {
    let repo = SurrealUserRepository::new(setup().await);

    let err = create_superuser(&repo, account("root@example.com", None))
        .await
        .unwrap_err();
    assert!(matches!(err, JurisError::Validation { .. }));

    let err = create_superuser(&repo, account("root@example.com", Some("")))
        .await
        .unwrap_err();
    assert!(matches!(err, JurisError::Validation { .. }));

    let email = Email::parse("root@example.com").unwrap();
    assert!(matches!(
        repo.get_by_email(&email).await,
        Err(JurisError::NotFound { .. })
    ));
}

#[tokio::test]
async fn superuser_has_staff_and_superuser_flags() {
    let repo = SurrealUserRepository::new(setup().await);

    let mut request = account("root@example.com", Some("adm1n-pass"));
    request.fields.is_staff = false;
    let admin = create_superuser(&repo, request).await.unwrap();

    assert!(admin.is_superuser);
    assert!(admin.is_staff);
    assert!(admin.is_active);

    let stored = repo.get_by_id(admin.id).await.unwrap();
    assert!(stored.is_superuser && stored.is_staff);
    assert!(check_password(&stored, "adm1n-pass", None).unwrap());
}

#[tokio::test]
async fn overlong_fields_are_rejected() {
    let repo = SurrealUserRepository::new(setup().await);

    let mut request = account("long@example.com", Some("pw"));
    request.fields.phone_number = Some("1".repeat(101));
    let err = create_user(&repo, request).await.unwrap_err();
    assert!(matches!(err, JurisError::Validation { .. }));
}

#[tokio::test]
async fn client_profile_lifecycle() {
    let db = setup().await;
    let users = SurrealUserRepository::new(db.clone());
    let clients = SurrealClientRepository::new(db);

    let owner = create_user(&users, account("firm@example.com", Some("pw")))
        .await
        .unwrap();

    let profile = create_client_profile(
        &clients,
        CreateClient {
            user_id: owner.id,
            name: Some("Acme Ltd".into()),
            account_type: Some("business".into()),
            account_usecase: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(profile.user_id, owner.id);
    assert_eq!(profile.to_string(), "Acme Ltd");

    let err = create_client_profile(
        &clients,
        CreateClient {
            user_id: owner.id,
            name: None,
            account_type: None,
            account_usecase: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, JurisError::AlreadyExists { .. }));

    let err = create_client_profile(
        &clients,
        CreateClient {
            user_id: Uuid::new_v4(),
            name: None,
            account_type: None,
            account_usecase: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, JurisError::MissingReference { .. }));

    users.delete(owner.id).await.unwrap();
    assert!(matches!(
        clients.get_by_id(profile.id).await,
        Err(JurisError::NotFound { .. })
    ));
}

#[tokio::test]
async fn tokens_go_through_injected_issuer() {
    let repo = SurrealUserRepository::new(setup().await);
    let issuer = RecordingIssuer::default();

    let user = create_user(&repo, account("tok@example.com", Some("pw")))
        .await
        .unwrap();
    let pair = issue_tokens(&issuer, &user).unwrap();

    assert_eq!(pair.access_token, format!("access-{}", user.id));
    assert_eq!(*issuer.issued_for.lock().unwrap(), vec![user.id]);
}

#[tokio::test]
async fn profile_picture_stores_reference_only() {
    let repo = SurrealUserRepository::new(setup().await);
    let store = MemoryAssetStore::default();

    let user = create_user(&repo, account("pic@example.com", Some("pw")))
        .await
        .unwrap();
    let updated = set_profile_picture(&repo, &store, user.id, "me.png", vec![0x89, 0x50])
        .await
        .unwrap();

    assert_eq!(
        updated.profile_picture.as_deref(),
        Some("upload/profile/me.png")
    );
    let uploads = store.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].1, vec![0x89, 0x50]);
}

#[tokio::test]
async fn profile_picture_for_unknown_user_uploads_nothing() {
    let repo = SurrealUserRepository::new(setup().await);
    let store = MemoryAssetStore::default();

    let err = set_profile_picture(&repo, &store, Uuid::new_v4(), "me.png", vec![1])
        .await
        .unwrap_err();
    assert!(matches!(err, JurisError::NotFound { .. }));
    assert!(store.uploads.lock().unwrap().is_empty());
}
