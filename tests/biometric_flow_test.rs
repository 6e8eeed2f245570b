//! End-to-end tests of the registration and assertion flows against an
//! in-memory database.

use std::collections::HashSet;

use bioauth::biometric::{BiometricError, ChallengeError, Operation};
use bioauth::store::{CredentialStore, StoreError};
use bioauth::testing::{
    AssertionCredentialBuilder, RegistrationCredentialBuilder, TestEnvironment, TestFixtures,
};
use chrono::{Duration, Utc};

#[actix_web::test]
async fn test_successive_challenges_never_repeat() {
    let env = TestEnvironment::new().await;

    let challenges: HashSet<String> = (0..64)
        .map(|_| env.challenges.issue(env.identity.id, Operation::Get).unwrap().challenge)
        .collect();
    assert_eq!(challenges.len(), 64);
}

#[actix_web::test]
async fn test_registration_end_to_end() {
    let env = TestEnvironment::new().await;
    assert_eq!(env.identity.id, 1);
    assert_eq!(env.identity.email, "a@x.com");

    let flow = env.service.registration();
    let start = flow.begin("a@x.com", None).await.unwrap();
    assert!(start.options.exclude_credentials.is_empty());

    let credential = RegistrationCredentialBuilder::new("cred-1")
        .challenge(&start.options.challenge)
        .build();
    let stored = flow
        .complete(Some(&start.binding), "a@x.com", &credential)
        .await
        .unwrap();
    assert_eq!(stored, "cred-1");

    let records = env.credentials_for_identity().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "cred-1");
    assert_eq!(records[0].user_id, 1);
}

#[actix_web::test]
async fn test_login_end_to_end() {
    let env = TestEnvironment::new().await;
    env.register_credential("cred-1").await;

    let flow = env.service.assertion();
    let start = flow.begin("a@x.com", None).await.unwrap();
    let allowed: Vec<&str> = start
        .options
        .allow_credentials
        .iter()
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(allowed, vec!["cred-1"]);

    let credential = AssertionCredentialBuilder::new("cred-1")
        .challenge(&start.options.challenge)
        .build();
    let verified = flow
        .complete(Some(&start.binding), "a@x.com", &credential)
        .await
        .unwrap();
    assert_eq!(verified.id, 1);
    assert_eq!(verified.name, "Alice");
    assert_eq!(verified.email, "a@x.com");
}

#[actix_web::test]
async fn test_assertion_without_credentials_fails_before_issuing() {
    let env = TestEnvironment::new().await;

    let err = env
        .service
        .assertion()
        .begin("a@x.com", None)
        .await
        .unwrap_err();
    assert!(matches!(err, BiometricError::NoCredentials));
}

#[actix_web::test]
async fn test_binding_is_single_use() {
    let env = TestEnvironment::new().await;
    env.register_credential("cred-1").await;
    let flow = env.service.assertion();

    let start = flow.begin("a@x.com", None).await.unwrap();
    let credential = AssertionCredentialBuilder::new("cred-1")
        .challenge(&start.options.challenge)
        .build();

    flow.complete(Some(&start.binding), "a@x.com", &credential)
        .await
        .unwrap();
    let replay = flow
        .complete(Some(&start.binding), "a@x.com", &credential)
        .await
        .unwrap_err();
    assert!(matches!(
        replay,
        BiometricError::ChallengeInvalid(ChallengeError::Replayed)
    ));
    assert!(replay.is_authentication_failure());
}

#[actix_web::test]
async fn test_failed_completion_spends_the_binding() {
    let env = TestEnvironment::new().await;
    let flow = env.service.registration();
    let start = flow.begin("a@x.com", None).await.unwrap();

    let wrong = RegistrationCredentialBuilder::new("cred-1")
        .challenge("not-the-issued-challenge")
        .build();
    let err = flow
        .complete(Some(&start.binding), "a@x.com", &wrong)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BiometricError::ChallengeInvalid(ChallengeError::ChallengeMismatch)
    ));

    // The right answer is too late now
    let right = RegistrationCredentialBuilder::new("cred-1")
        .challenge(&start.options.challenge)
        .build();
    let err = flow
        .complete(Some(&start.binding), "a@x.com", &right)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BiometricError::ChallengeInvalid(ChallengeError::Replayed)
    ));
    assert!(env.credentials_for_identity().await.is_empty());
}

#[actix_web::test]
async fn test_expired_challenge_is_rejected() {
    let env = TestEnvironment::new().await;
    let issued = env
        .challenges
        .issue_at(
            env.identity.id,
            Operation::Create,
            Utc::now() - Duration::minutes(6),
        )
        .unwrap();

    let credential = RegistrationCredentialBuilder::new("cred-1")
        .challenge(&issued.challenge)
        .build();
    let err = env
        .service
        .registration()
        .complete(Some(&issued.binding), "a@x.com", &credential)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BiometricError::ChallengeInvalid(ChallengeError::Expired)
    ));
}

#[actix_web::test]
async fn test_create_challenge_cannot_complete_assertion() {
    let env = TestEnvironment::new().await;
    env.register_credential("cred-1").await;

    let start = env
        .service
        .registration()
        .begin("a@x.com", None)
        .await
        .unwrap();
    let credential = AssertionCredentialBuilder::new("cred-1")
        .challenge(&start.options.challenge)
        .build();
    let err = env
        .service
        .assertion()
        .complete(Some(&start.binding), "a@x.com", &credential)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BiometricError::ChallengeInvalid(ChallengeError::OperationMismatch)
    ));
}

#[actix_web::test]
async fn test_get_challenge_cannot_complete_registration() {
    let env = TestEnvironment::new().await;
    env.register_credential("cred-1").await;

    let start = env
        .service
        .assertion()
        .begin("a@x.com", None)
        .await
        .unwrap();
    let credential = RegistrationCredentialBuilder::new("cred-2")
        .challenge(&start.options.challenge)
        .build();
    let err = env
        .service
        .registration()
        .complete(Some(&start.binding), "a@x.com", &credential)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BiometricError::ChallengeInvalid(ChallengeError::OperationMismatch)
    ));
    assert_eq!(env.credentials_for_identity().await.len(), 1);
}

#[actix_web::test]
async fn test_duplicate_credential_leaves_store_unchanged() {
    let env = TestEnvironment::new().await;
    let bob = env.create_identity("Bob", "b@x.com").await;
    env.register_credential("cred-1").await;

    let start = env
        .service
        .registration()
        .begin("b@x.com", None)
        .await
        .unwrap();
    let credential = RegistrationCredentialBuilder::new("cred-1")
        .challenge(&start.options.challenge)
        .build();
    let err = env
        .service
        .registration()
        .complete(Some(&start.binding), "b@x.com", &credential)
        .await
        .unwrap_err();
    assert!(matches!(err, BiometricError::DuplicateCredential));

    let owner = env.credentials.find_by_id("cred-1").await.unwrap();
    assert_eq!(owner.user_id, env.identity.id);
    assert!(env.credentials.list_by_identity(bob.id).await.unwrap().is_empty());

    let direct = env
        .credentials
        .put(&TestFixtures::credential_record("cred-1", bob.id))
        .await
        .unwrap_err();
    assert!(matches!(direct, StoreError::DuplicateCredential(_)));
}

#[actix_web::test]
async fn test_registered_credential_is_excluded_next_time() {
    let env = TestEnvironment::new().await;
    let flow = env.service.registration();

    let start = flow.begin("a@x.com", None).await.unwrap();
    let credential = RegistrationCredentialBuilder::new("cred-1")
        .raw_id("cred-1-raw")
        .transports(&["internal", "hybrid"])
        .challenge(&start.options.challenge)
        .build();
    flow.complete(Some(&start.binding), "a@x.com", &credential)
        .await
        .unwrap();

    let next = flow.begin("a@x.com", None).await.unwrap();
    assert_eq!(next.options.exclude_credentials.len(), 1);
    assert_eq!(next.options.exclude_credentials[0].id, "cred-1-raw");
    assert_eq!(
        next.options.exclude_credentials[0].transports,
        vec!["internal", "hybrid"]
    );
}
