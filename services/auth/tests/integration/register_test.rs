use cloudmail_auth::domain::repository::RegKeyRepository;
use cloudmail_auth::domain::types::{RegKey, Role};
use cloudmail_auth::error::AuthServiceError;
use cloudmail_auth::usecase::register::{RegisterInput, RegisterUseCase};

use crate::helpers::{
    MockAccountRepo, MockChallengeVerifier, MockRegKeyRepo, MockRoleRepo, MockVerifyCounterRepo,
    TEST_IP, default_role, far_future, far_past, test_account, test_reg_key, test_snapshot,
};

fn input(email: &str, password: &str) -> RegisterInput {
    RegisterInput {
        email: email.to_owned(),
        password: password.to_owned(),
        challenge_token: None,
        reg_key_code: None,
        source_ip: TEST_IP.to_owned(),
    }
}

fn usecase(
    accounts: MockAccountRepo,
    roles: Vec<Role>,
    keys: Vec<RegKey>,
) -> RegisterUseCase<
    MockAccountRepo,
    MockRoleRepo,
    MockRegKeyRepo,
    MockVerifyCounterRepo,
    MockChallengeVerifier,
> {
    RegisterUseCase {
        accounts,
        roles: MockRoleRepo::new(roles),
        reg_keys: MockRegKeyRepo::new(keys),
        counters: MockVerifyCounterRepo::empty(),
        challenge: MockChallengeVerifier::rejecting_all(),
    }
}

// ── Ordered validation ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_reject_when_registration_closed_before_any_other_check() {
    let mut snapshot = test_snapshot(&["example.com"]);
    snapshot.settings.register = 1;

    let usecase = usecase(MockAccountRepo::empty(), vec![default_role()], vec![]);
    // email is also invalid; the closed check still wins
    let result = usecase.execute(&snapshot, input("not-an-email", "pw")).await;
    assert!(
        matches!(result, Err(AuthServiceError::RegistrationClosed)),
        "expected RegistrationClosed, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_invalid_email() {
    let snapshot = test_snapshot(&["example.com"]);
    let usecase = usecase(MockAccountRepo::empty(), vec![default_role()], vec![]);

    for bad in ["no-at-sign", "@example.com", "alice@", "alice@nodot", ""] {
        let result = usecase.execute(&snapshot, input(bad, "password1")).await;
        assert!(
            matches!(result, Err(AuthServiceError::InvalidEmail)),
            "expected InvalidEmail for {bad:?}, got {result:?}"
        );
    }
}

#[tokio::test]
async fn should_enforce_password_length_bounds() {
    let snapshot = test_snapshot(&["example.com"]);
    let usecase = usecase(MockAccountRepo::empty(), vec![default_role()], vec![]);

    let result = usecase
        .execute(&snapshot, input("alice@example.com", "short"))
        .await;
    assert!(matches!(result, Err(AuthServiceError::PasswordTooShort)));

    let result = usecase
        .execute(&snapshot, input("alice@example.com", &"x".repeat(31)))
        .await;
    assert!(matches!(result, Err(AuthServiceError::PasswordTooLong)));

    // bounds are inclusive
    let ok = usecase
        .execute(&snapshot, input("alice@example.com", "sixsix"))
        .await;
    assert!(ok.is_ok(), "6-char password should pass, got {ok:?}");
}

#[tokio::test]
async fn should_reject_overlong_local_part() {
    let snapshot = test_snapshot(&["example.com"]);
    let usecase = usecase(MockAccountRepo::empty(), vec![default_role()], vec![]);

    let email = format!("{}@example.com", "a".repeat(31));
    let result = usecase.execute(&snapshot, input(&email, "password1")).await;
    assert!(
        matches!(result, Err(AuthServiceError::LocalPartTooLong)),
        "expected LocalPartTooLong, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_unpermitted_domain() {
    let snapshot = test_snapshot(&["example.com"]);
    let usecase = usecase(MockAccountRepo::empty(), vec![default_role()], vec![]);

    let result = usecase
        .execute(&snapshot, input("alice@other.com", "password1"))
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::DomainNotAllowed)),
        "expected DomainNotAllowed, got {result:?}"
    );
}

// ── Existing accounts ────────────────────────────────────────────────────────

#[tokio::test]
async fn should_reject_existing_account() {
    let snapshot = test_snapshot(&["example.com"]);
    let existing = test_account("alice@example.com", "password1");
    let usecase = usecase(
        MockAccountRepo::new(vec![existing]),
        vec![default_role()],
        vec![],
    );

    let result = usecase
        .execute(&snapshot, input("alice@example.com", "password1"))
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::AccountExists)),
        "expected AccountExists, got {result:?}"
    );
}

#[tokio::test]
async fn should_block_reregistration_of_deleted_mailbox() {
    let snapshot = test_snapshot(&["example.com"]);
    let mut deleted = test_account("alice@example.com", "password1");
    deleted.is_del = true;
    let usecase = usecase(
        MockAccountRepo::new(vec![deleted]),
        vec![default_role()],
        vec![],
    );

    let result = usecase
        .execute(&snapshot, input("alice@example.com", "password1"))
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::AccountDeleted)),
        "expected AccountDeleted, got {result:?}"
    );
}

// ── Registration keys: mandatory mode ────────────────────────────────────────

#[tokio::test]
async fn should_require_key_in_mandatory_mode() {
    let mut snapshot = test_snapshot(&["example.com"]);
    snapshot.settings.reg_key_mode = 1;
    let usecase = usecase(MockAccountRepo::empty(), vec![default_role()], vec![]);

    let result = usecase
        .execute(&snapshot, input("alice@example.com", "password1"))
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::RegKeyMissing)),
        "expected RegKeyMissing, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_unknown_key_in_mandatory_mode() {
    let mut snapshot = test_snapshot(&["example.com"]);
    snapshot.settings.reg_key_mode = 1;
    let usecase = usecase(MockAccountRepo::empty(), vec![default_role()], vec![]);

    let mut inp = input("alice@example.com", "password1");
    inp.reg_key_code = Some("NOSUCHKEY".to_owned());
    let result = usecase.execute(&snapshot, inp).await;
    assert!(
        matches!(result, Err(AuthServiceError::RegKeyNotFound)),
        "expected RegKeyNotFound, got {result:?}"
    );
}

#[tokio::test]
async fn should_report_expired_even_when_key_is_also_exhausted() {
    let mut snapshot = test_snapshot(&["example.com"]);
    snapshot.settings.reg_key_mode = 1;
    let key = test_reg_key("INVITE", 0, far_past());
    let usecase = usecase(MockAccountRepo::empty(), vec![default_role()], vec![key]);

    let mut inp = input("alice@example.com", "password1");
    inp.reg_key_code = Some("INVITE".to_owned());
    let result = usecase.execute(&snapshot, inp).await;
    assert!(
        matches!(result, Err(AuthServiceError::RegKeyExpired)),
        "expected RegKeyExpired, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_exhausted_key_in_mandatory_mode() {
    let mut snapshot = test_snapshot(&["example.com"]);
    snapshot.settings.reg_key_mode = 1;
    let key = test_reg_key("INVITE", 0, far_future());
    let usecase = usecase(MockAccountRepo::empty(), vec![default_role()], vec![key]);

    let mut inp = input("alice@example.com", "password1");
    inp.reg_key_code = Some("INVITE".to_owned());
    let result = usecase.execute(&snapshot, inp).await;
    assert!(
        matches!(result, Err(AuthServiceError::RegKeyExhausted)),
        "expected RegKeyExhausted, got {result:?}"
    );
}

#[tokio::test]
async fn should_grant_key_role_and_consume_one_use() {
    let mut snapshot = test_snapshot(&["example.com"]);
    snapshot.settings.reg_key_mode = 1;
    let key = test_reg_key("INVITE", 2, far_future());
    let key_role = Role {
        id: 2,
        name: "invited".to_owned(),
        avail_domains: vec![],
        is_default: false,
    };

    let accounts = MockAccountRepo::empty();
    let accounts_handle = accounts.accounts_handle();
    let reg_keys = MockRegKeyRepo::new(vec![key]);
    let keys_handle = reg_keys.keys_handle();
    let usecase = RegisterUseCase {
        accounts,
        roles: MockRoleRepo::new(vec![default_role(), key_role]),
        reg_keys,
        counters: MockVerifyCounterRepo::empty(),
        challenge: MockChallengeVerifier::rejecting_all(),
    };

    let mut inp = input("alice@example.com", "password1");
    inp.reg_key_code = Some("INVITE".to_owned());
    usecase.execute(&snapshot, inp).await.unwrap();

    let accounts = accounts_handle.lock().unwrap();
    let created = accounts.first().unwrap();
    assert_eq!(created.role_id, 2);
    assert_eq!(created.reg_key_id, Some(7));
    assert_eq!(created.name, "alice");

    let keys = keys_handle.lock().unwrap();
    assert_eq!(keys.first().unwrap().remaining, 1);
}

// ── Registration keys: optional mode ─────────────────────────────────────────

#[tokio::test]
async fn should_fall_back_to_default_role_on_bad_key_in_optional_mode() {
    let mut snapshot = test_snapshot(&["example.com"]);
    snapshot.settings.reg_key_mode = 2;
    let expired = test_reg_key("INVITE", 5, far_past());

    let accounts = MockAccountRepo::empty();
    let accounts_handle = accounts.accounts_handle();
    let usecase = RegisterUseCase {
        accounts,
        roles: MockRoleRepo::new(vec![default_role()]),
        reg_keys: MockRegKeyRepo::new(vec![expired]),
        counters: MockVerifyCounterRepo::empty(),
        challenge: MockChallengeVerifier::rejecting_all(),
    };

    let mut inp = input("alice@example.com", "password1");
    inp.reg_key_code = Some("INVITE".to_owned());
    usecase.execute(&snapshot, inp).await.unwrap();

    let accounts = accounts_handle.lock().unwrap();
    let created = accounts.first().unwrap();
    assert_eq!(created.role_id, default_role().id);
    assert_eq!(created.reg_key_id, None, "fallback must not reference the key");
}

#[tokio::test]
async fn should_use_valid_key_in_optional_mode() {
    let mut snapshot = test_snapshot(&["example.com"]);
    snapshot.settings.reg_key_mode = 2;
    let key = test_reg_key("INVITE", 1, far_future());
    let key_role = Role {
        id: 2,
        name: "invited".to_owned(),
        avail_domains: vec![],
        is_default: false,
    };

    let accounts = MockAccountRepo::empty();
    let accounts_handle = accounts.accounts_handle();
    let usecase = RegisterUseCase {
        accounts,
        roles: MockRoleRepo::new(vec![default_role(), key_role]),
        reg_keys: MockRegKeyRepo::new(vec![key]),
        counters: MockVerifyCounterRepo::empty(),
        challenge: MockChallengeVerifier::rejecting_all(),
    };

    let mut inp = input("alice@example.com", "password1");
    inp.reg_key_code = Some("INVITE".to_owned());
    usecase.execute(&snapshot, inp).await.unwrap();

    assert_eq!(accounts_handle.lock().unwrap()[0].role_id, 2);
}

// ── Role domain restrictions ─────────────────────────────────────────────────

#[tokio::test]
async fn should_reject_when_key_role_forbids_domain() {
    let mut snapshot = test_snapshot(&["example.com", "other.com"]);
    snapshot.settings.reg_key_mode = 1;
    let key = test_reg_key("INVITE", 5, far_future());
    let restricted_role = Role {
        id: 2,
        name: "invited".to_owned(),
        avail_domains: vec!["other.com".to_owned()],
        is_default: false,
    };
    let usecase = usecase(
        MockAccountRepo::empty(),
        vec![default_role(), restricted_role],
        vec![key],
    );

    let mut inp = input("alice@example.com", "password1");
    inp.reg_key_code = Some("INVITE".to_owned());
    let result = usecase.execute(&snapshot, inp).await;
    assert!(
        matches!(result, Err(AuthServiceError::RegKeyRoleDomainForbidden)),
        "expected RegKeyRoleDomainForbidden, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_when_default_role_forbids_domain() {
    let snapshot = test_snapshot(&["example.com", "other.com"]);
    let restricted_default = Role {
        id: 1,
        name: "user".to_owned(),
        avail_domains: vec!["other.com".to_owned()],
        is_default: true,
    };
    let usecase = usecase(MockAccountRepo::empty(), vec![restricted_default], vec![]);

    let result = usecase
        .execute(&snapshot, input("alice@example.com", "password1"))
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::DefaultRoleDomainForbidden)),
        "expected DefaultRoleDomainForbidden, got {result:?}"
    );
}

// ── Challenge gating ─────────────────────────────────────────────────────────

#[tokio::test]
async fn should_demand_challenge_when_always_mode_and_no_token() {
    let mut snapshot = test_snapshot(&["example.com"]);
    snapshot.settings.register_verify = 1;
    let usecase = usecase(MockAccountRepo::empty(), vec![default_role()], vec![]);

    let result = usecase
        .execute(&snapshot, input("alice@example.com", "password1"))
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::ChallengeRequired)),
        "expected ChallengeRequired, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_failed_challenge_solution() {
    let mut snapshot = test_snapshot(&["example.com"]);
    snapshot.settings.register_verify = 1;
    let usecase = RegisterUseCase {
        accounts: MockAccountRepo::empty(),
        roles: MockRoleRepo::new(vec![default_role()]),
        reg_keys: MockRegKeyRepo::empty(),
        counters: MockVerifyCounterRepo::empty(),
        challenge: MockChallengeVerifier::accepting("good-token"),
    };

    let mut inp = input("alice@example.com", "password1");
    inp.challenge_token = Some("bad-token".to_owned());
    let result = usecase.execute(&snapshot, inp).await;
    assert!(
        matches!(result, Err(AuthServiceError::ChallengeInvalid)),
        "expected ChallengeInvalid, got {result:?}"
    );
}

#[tokio::test]
async fn should_register_with_solved_challenge_in_always_mode() {
    let mut snapshot = test_snapshot(&["example.com"]);
    snapshot.settings.register_verify = 1;
    let challenge = MockChallengeVerifier::accepting("good-token");
    let seen_secret = std::sync::Arc::clone(&challenge.seen_secret);
    let usecase = RegisterUseCase {
        accounts: MockAccountRepo::empty(),
        roles: MockRoleRepo::new(vec![default_role()]),
        reg_keys: MockRegKeyRepo::empty(),
        counters: MockVerifyCounterRepo::empty(),
        challenge,
    };

    let mut inp = input("alice@example.com", "password1");
    inp.challenge_token = Some("good-token".to_owned());
    let out = usecase.execute(&snapshot, inp).await.unwrap();

    assert!(out.verification_now_required);
    assert_eq!(
        seen_secret.lock().unwrap().as_deref(),
        Some("secret-key"),
        "verifier must be handed the configured secret"
    );
}

#[tokio::test]
async fn should_skip_challenge_below_count_threshold_and_report_crossing() {
    let mut snapshot = test_snapshot(&["example.com"]);
    snapshot.settings.register_verify = 2;
    snapshot.settings.reg_verify_count = 3;

    // 2 prior attempts: this one passes unchallenged and lands the counter
    // exactly on the threshold, so the next attempt will be challenged.
    let usecase = RegisterUseCase {
        accounts: MockAccountRepo::empty(),
        roles: MockRoleRepo::new(vec![default_role()]),
        reg_keys: MockRegKeyRepo::empty(),
        counters: MockVerifyCounterRepo::new(vec![(
            TEST_IP,
            cloudmail_auth::domain::types::VerifyPurpose::Register,
            2,
        )]),
        challenge: MockChallengeVerifier::rejecting_all(),
    };

    let out = usecase
        .execute(&snapshot, input("alice@example.com", "password1"))
        .await
        .unwrap();
    assert!(out.verification_now_required);
}

#[tokio::test]
async fn should_not_require_verification_well_below_threshold() {
    let mut snapshot = test_snapshot(&["example.com"]);
    snapshot.settings.register_verify = 2;
    snapshot.settings.reg_verify_count = 3;

    let usecase = usecase(MockAccountRepo::empty(), vec![default_role()], vec![]);
    let out = usecase
        .execute(&snapshot, input("alice@example.com", "password1"))
        .await
        .unwrap();
    assert!(!out.verification_now_required);
}

#[tokio::test]
async fn should_demand_challenge_at_count_threshold() {
    let mut snapshot = test_snapshot(&["example.com"]);
    snapshot.settings.register_verify = 2;
    snapshot.settings.reg_verify_count = 3;

    let usecase = RegisterUseCase {
        accounts: MockAccountRepo::empty(),
        roles: MockRoleRepo::new(vec![default_role()]),
        reg_keys: MockRegKeyRepo::empty(),
        counters: MockVerifyCounterRepo::new(vec![(
            TEST_IP,
            cloudmail_auth::domain::types::VerifyPurpose::Register,
            3,
        )]),
        challenge: MockChallengeVerifier::rejecting_all(),
    };

    let result = usecase
        .execute(&snapshot, input("alice@example.com", "password1"))
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::ChallengeRequired)),
        "expected ChallengeRequired, got {result:?}"
    );
}

// ── Key consumption race ─────────────────────────────────────────────────────

/// Reports one remaining use at lookup time but refuses the decrement, as if
/// a concurrent registration consumed the last use in between.
struct RacedRegKeyRepo {
    key: RegKey,
}

impl RegKeyRepository for RacedRegKeyRepo {
    async fn find_by_code(&self, code: &str) -> Result<Option<RegKey>, AuthServiceError> {
        Ok((self.key.code == code).then(|| self.key.clone()))
    }

    async fn consume(&self, _key_id: i64, _amount: i32) -> Result<bool, AuthServiceError> {
        Ok(false)
    }
}

#[tokio::test]
async fn should_fail_when_losing_race_for_last_key_use() {
    let mut snapshot = test_snapshot(&["example.com"]);
    snapshot.settings.reg_key_mode = 1;
    let key_role = Role {
        id: 2,
        name: "invited".to_owned(),
        avail_domains: vec![],
        is_default: false,
    };
    let usecase = RegisterUseCase {
        accounts: MockAccountRepo::empty(),
        roles: MockRoleRepo::new(vec![default_role(), key_role]),
        reg_keys: RacedRegKeyRepo {
            key: test_reg_key("INVITE", 1, far_future()),
        },
        counters: MockVerifyCounterRepo::empty(),
        challenge: MockChallengeVerifier::rejecting_all(),
    };

    let mut inp = input("alice@example.com", "password1");
    inp.reg_key_code = Some("INVITE".to_owned());
    let result = usecase.execute(&snapshot, inp).await;
    assert!(
        matches!(result, Err(AuthServiceError::RegKeyExhausted)),
        "expected RegKeyExhausted, got {result:?}"
    );
}

#[tokio::test]
async fn should_exhaust_key_across_sequential_registrations() {
    let mut snapshot = test_snapshot(&["example.com"]);
    snapshot.settings.reg_key_mode = 1;
    let key_role = Role {
        id: 2,
        name: "invited".to_owned(),
        avail_domains: vec![],
        is_default: false,
    };
    let usecase = RegisterUseCase {
        accounts: MockAccountRepo::empty(),
        roles: MockRoleRepo::new(vec![default_role(), key_role]),
        reg_keys: MockRegKeyRepo::new(vec![test_reg_key("INVITE", 1, far_future())]),
        counters: MockVerifyCounterRepo::empty(),
        challenge: MockChallengeVerifier::rejecting_all(),
    };

    let mut first = input("alice@example.com", "password1");
    first.reg_key_code = Some("INVITE".to_owned());
    usecase.execute(&snapshot, first).await.unwrap();

    let mut second = input("bob@example.com", "password1");
    second.reg_key_code = Some("INVITE".to_owned());
    let result = usecase.execute(&snapshot, second).await;
    assert!(
        matches!(result, Err(AuthServiceError::RegKeyExhausted)),
        "expected RegKeyExhausted, got {result:?}"
    );
}
