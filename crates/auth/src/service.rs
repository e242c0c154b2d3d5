use super::*;
use std::sync::Arc;
use std::sync::OnceLock;
use warden_core::ID;
use warden_core::Unique;

/// Registration, login and profile maintenance.
///
/// Holds no mutable state of its own: everything shared lives in the store.
/// Username and email pre-checks only exist to give a fast, friendly error;
/// two racing writers are separated by the store's uniqueness guarantee,
/// which surfaces here as the same conflict errors.
pub struct Identity<S, H> {
    store: S,
    hasher: Arc<H>,
    crypto: Crypto,
    decoy: OnceLock<String>,
}

impl<S, H> Identity<S, H>
where
    S: UserStore,
    H: Hasher,
{
    pub fn new(store: S, hasher: H, crypto: Crypto) -> Self {
        Self {
            store,
            hasher: Arc::new(hasher),
            crypto,
            decoy: OnceLock::new(),
        }
    }
    pub fn store(&self) -> &S {
        &self.store
    }
    pub fn crypto(&self) -> &Crypto {
        &self.crypto
    }

    pub async fn register(&self, scope: &Scope, req: RegisterRequest) -> Result<UserResponse, Error> {
        req.validate()?;
        if scope.guard(self.store.find_by_username(&req.username)).await?.is_some() {
            return Err(Error::UsernameExists);
        }
        if scope.guard(self.store.find_by_email(&req.email)).await?.is_some() {
            return Err(Error::EmailExists);
        }
        if req.password != req.confirm_password {
            return Err(Error::PasswordMismatch);
        }
        let hashword = self.hash(scope, req.password).await?;
        let account = Account::new(
            ID::default(),
            req.name,
            req.username,
            req.email,
            req.phone,
            hashword,
            Role::Customer,
        );
        let account = scope.guard(self.store.create(&account)).await?;
        log::info!("registered account {} ({})", account.id(), account.username());
        Ok(UserResponse::from(&account))
    }

    /// Unknown usernames and wrong passwords are indistinguishable here,
    /// in the error and in the time taken: both pay for one verification.
    pub async fn login(&self, scope: &Scope, req: LoginRequest) -> Result<LoginResponse, Error> {
        req.validate()?;
        let Some(account) = scope.guard(self.store.find_by_username(&req.username)).await? else {
            let decoy = self.decoy(scope).await?;
            self.verify(scope, req.password, &decoy).await?;
            log::debug!("login rejected for {}", req.username);
            return Err(Error::InvalidCredentials);
        };
        if !self.verify(scope, req.password, account.hashword()).await? {
            log::debug!("login rejected for {}", req.username);
            return Err(Error::InvalidCredentials);
        }
        let user = UserResponse::from(&account);
        let token = self.crypto.issue(&user, account.role())?;
        log::info!("issued session for {}", account.id());
        Ok(LoginResponse { user, token })
    }

    pub async fn update(
        &self,
        scope: &Scope,
        req: UpdateRequest,
        target: ID<Account>,
    ) -> Result<UserResponse, Error> {
        req.validate()?;
        let current = scope
            .guard(self.store.find_by_uuid(target))
            .await?
            .ok_or(Error::UserNotFound)?;
        if req.username != current.username() {
            if let Some(owner) = scope.guard(self.store.find_by_username(&req.username)).await? {
                if owner.id() != target {
                    return Err(Error::UsernameExists);
                }
            }
        }
        if req.email != current.email() {
            if let Some(owner) = scope.guard(self.store.find_by_email(&req.email)).await? {
                if owner.id() != target {
                    return Err(Error::EmailExists);
                }
            }
        }
        let hashword = match req.password {
            None => None,
            Some(password) => match req.confirm_password {
                Some(ref confirm) if *confirm == password => Some(self.hash(scope, password).await?),
                _ => return Err(Error::PasswordMismatch),
            },
        };
        let changes = Changes {
            name: req.name,
            username: req.username,
            email: req.email,
            phone: req.phone,
            hashword,
        };
        let account = scope
            .guard(self.store.update_fields(target, &changes))
            .await?
            .ok_or(Error::UserNotFound)?;
        log::info!("updated account {}", account.id());
        Ok(UserResponse::from(&account))
    }

    /// The identity the session gate already resolved for this request.
    pub fn user_login(&self, identity: &UserResponse) -> UserResponse {
        identity.clone()
    }

    pub async fn user_by_uuid(&self, scope: &Scope, id: ID<Account>) -> Result<UserResponse, Error> {
        scope
            .guard(self.store.find_by_uuid(id))
            .await?
            .map(|account| UserResponse::from(&account))
            .ok_or(Error::UserNotFound)
    }

    /// Hash verified against when the username is unknown. Computed once.
    async fn decoy(&self, scope: &Scope) -> Result<String, Error> {
        if let Some(decoy) = self.decoy.get() {
            return Ok(decoy.clone());
        }
        let decoy = self.hash(scope, String::from("decoy-credential")).await?;
        Ok(self.decoy.get_or_init(|| decoy).clone())
    }

    async fn hash(&self, scope: &Scope, password: String) -> Result<String, Error> {
        let hasher = self.hasher.clone();
        scope
            .guard(async move {
                Ok::<_, Error>(tokio::task::spawn_blocking(move || hasher.hash(&password)).await??)
            })
            .await
    }

    async fn verify(&self, scope: &Scope, password: String, hashword: &str) -> Result<bool, Error> {
        let hasher = self.hasher.clone();
        let hashword = hashword.to_string();
        scope
            .guard(async move {
                Ok::<_, Error>(
                    tokio::task::spawn_blocking(move || hasher.verify(&password, &hashword))
                        .await??,
                )
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    type Service = Identity<MemoryStore, Argon>;

    fn service() -> Service {
        Identity::new(
            MemoryStore::new(),
            Argon::with_params(8, 1, 1).unwrap(),
            Crypto::new(b"identity-test-secret-0123456789ab", Duration::from_secs(600)),
        )
    }
    fn ann() -> RegisterRequest {
        RegisterRequest {
            name: "Ann".into(),
            email: "ann@x.com".into(),
            phone: "111".into(),
            username: "ann".into(),
            password: "p1".into(),
            confirm_password: "p1".into(),
        }
    }
    fn bob() -> RegisterRequest {
        RegisterRequest {
            name: "Bob".into(),
            email: "bob@x.com".into(),
            phone: "222".into(),
            username: "bob".into(),
            password: "p2".into(),
            confirm_password: "p2".into(),
        }
    }
    fn login(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.into(),
            password: password.into(),
        }
    }
    fn update_of(user: &UserResponse) -> UpdateRequest {
        UpdateRequest {
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            username: user.username.clone(),
            password: None,
            confirm_password: None,
        }
    }

    #[tokio::test]
    async fn register_returns_customer_snapshot() {
        let svc = service();
        let ref scope = Scope::new();
        let user = svc.register(scope, ann()).await.unwrap();
        assert_eq!(user.username, "ann");
        assert_eq!(user.role, "customer");
        let stored = svc.store().find_by_username("ann").await.unwrap().unwrap();
        assert_eq!(stored.id().inner(), user.uuid);
        assert!(!stored.hashword().is_empty());
        assert_ne!(stored.hashword(), "p1");
    }

    #[tokio::test]
    async fn register_rejects_username_in_any_case() {
        let svc = service();
        let ref scope = Scope::new();
        svc.register(scope, ann()).await.unwrap();
        let again = RegisterRequest {
            username: "ANN".into(),
            email: "other@x.com".into(),
            ..ann()
        };
        assert!(matches!(svc.register(scope, again).await, Err(Error::UsernameExists)));
    }

    #[tokio::test]
    async fn register_rejects_taken_email() {
        let svc = service();
        let ref scope = Scope::new();
        svc.register(scope, ann()).await.unwrap();
        let again = RegisterRequest {
            email: "Ann@X.com".into(),
            ..bob()
        };
        assert!(matches!(svc.register(scope, again).await, Err(Error::EmailExists)));
    }

    #[tokio::test]
    async fn register_rejects_mismatched_confirmation() {
        let svc = service();
        let req = RegisterRequest {
            confirm_password: "p2".into(),
            ..ann()
        };
        assert!(matches!(
            svc.register(&Scope::new(), req).await,
            Err(Error::PasswordMismatch)
        ));
        assert!(svc.store().is_empty());
    }

    #[tokio::test]
    async fn register_rejects_invalid_input() {
        let svc = service();
        let req = RegisterRequest {
            email: "not-an-email".into(),
            ..ann()
        };
        let err = svc.register(&Scope::new(), req).await.unwrap_err();
        assert_eq!(err.kind(), Kind::Validation);
    }

    #[tokio::test]
    async fn login_issues_verifiable_token() {
        let svc = service();
        let ref scope = Scope::new();
        let registered = svc.register(scope, ann()).await.unwrap();
        let session = svc.login(scope, login("ANN", "p1")).await.unwrap();
        assert_eq!(session.user, registered);
        let claims = svc.crypto().verify(&session.token).unwrap();
        assert_eq!(claims.user(), &registered);
        assert_eq!(claims.role(), Role::Customer);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let svc = service();
        let ref scope = Scope::new();
        svc.register(scope, ann()).await.unwrap();
        let wrong = svc.login(scope, login("ann", "wrong")).await.unwrap_err();
        let ghost = svc.login(scope, login("ghost", "x")).await.unwrap_err();
        assert!(matches!(wrong, Error::InvalidCredentials));
        assert!(matches!(ghost, Error::InvalidCredentials));
        assert_eq!(wrong.to_string(), ghost.to_string());
        assert_eq!(wrong.kind(), ghost.kind());
    }

    #[tokio::test]
    async fn update_of_name_and_phone_keeps_identity() {
        let svc = service();
        let ref scope = Scope::new();
        let user = svc.register(scope, ann()).await.unwrap();
        let id = ID::from(user.uuid);
        let req = UpdateRequest {
            name: "Ann Smith".into(),
            phone: "999".into(),
            ..update_of(&user)
        };
        let updated = svc.update(scope, req, id).await.unwrap();
        assert_eq!(updated.name, "Ann Smith");
        assert_eq!(updated.phone, "999");
        assert_eq!(updated.uuid, user.uuid);
        assert!(svc.login(scope, login("ann", "p1")).await.is_ok());
    }

    #[tokio::test]
    async fn update_may_recase_own_username() {
        let svc = service();
        let ref scope = Scope::new();
        let user = svc.register(scope, ann()).await.unwrap();
        let req = UpdateRequest {
            username: "Ann".into(),
            email: "ANN@x.com".into(),
            ..update_of(&user)
        };
        let updated = svc.update(scope, req, ID::from(user.uuid)).await.unwrap();
        assert_eq!(updated.username, "Ann");
    }

    #[tokio::test]
    async fn update_rejects_values_owned_by_others() {
        let svc = service();
        let ref scope = Scope::new();
        let user = svc.register(scope, ann()).await.unwrap();
        svc.register(scope, bob()).await.unwrap();
        let id = ID::from(user.uuid);
        let req = UpdateRequest {
            username: "BOB".into(),
            ..update_of(&user)
        };
        assert!(matches!(svc.update(scope, req, id).await, Err(Error::UsernameExists)));
        let req = UpdateRequest {
            email: "bob@x.com".into(),
            ..update_of(&user)
        };
        assert!(matches!(svc.update(scope, req, id).await, Err(Error::EmailExists)));
    }

    #[tokio::test]
    async fn update_changes_password() {
        let svc = service();
        let ref scope = Scope::new();
        let user = svc.register(scope, ann()).await.unwrap();
        let id = ID::from(user.uuid);
        let mismatch = UpdateRequest {
            password: Some("p9".into()),
            confirm_password: Some("p8".into()),
            ..update_of(&user)
        };
        assert!(matches!(svc.update(scope, mismatch, id).await, Err(Error::PasswordMismatch)));
        let missing = UpdateRequest {
            password: Some("p9".into()),
            ..update_of(&user)
        };
        assert!(matches!(svc.update(scope, missing, id).await, Err(Error::PasswordMismatch)));
        let req = UpdateRequest {
            password: Some("p9".into()),
            confirm_password: Some("p9".into()),
            ..update_of(&user)
        };
        svc.update(scope, req, id).await.unwrap();
        assert!(svc.login(scope, login("ann", "p9")).await.is_ok());
        assert!(matches!(
            svc.login(scope, login("ann", "p1")).await,
            Err(Error::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn update_of_unknown_account() {
        let svc = service();
        let req = UpdateRequest {
            name: "X".into(),
            email: "x@x.com".into(),
            phone: "0".into(),
            username: "x".into(),
            password: None,
            confirm_password: None,
        };
        let result = svc.update(&Scope::new(), req, ID::default()).await;
        assert!(matches!(result, Err(Error::UserNotFound)));
    }

    #[tokio::test]
    async fn lookup_by_uuid() {
        let svc = service();
        let ref scope = Scope::new();
        let user = svc.register(scope, ann()).await.unwrap();
        assert_eq!(svc.user_by_uuid(scope, ID::from(user.uuid)).await.unwrap(), user);
        assert!(matches!(
            svc.user_by_uuid(scope, ID::default()).await,
            Err(Error::UserNotFound)
        ));
        assert_eq!(svc.user_login(&user), user);
    }

    #[tokio::test]
    async fn cancelled_scope_stops_registration() {
        let svc = service();
        let scope = Scope::new();
        scope.cancel();
        assert!(matches!(svc.register(&scope, ann()).await, Err(Error::Cancelled)));
        assert!(svc.store().is_empty());
    }

    /// Hides existing rows from lookups, like a concurrent writer that
    /// committed between the pre-check and the insert.
    struct Racing(MemoryStore);

    impl UserStore for Racing {
        async fn find_by_username(&self, _: &str) -> Result<Option<Account>, StoreError> {
            Ok(None)
        }
        async fn find_by_email(&self, _: &str) -> Result<Option<Account>, StoreError> {
            Ok(None)
        }
        async fn find_by_uuid(&self, id: ID<Account>) -> Result<Option<Account>, StoreError> {
            self.0.find_by_uuid(id).await
        }
        async fn create(&self, account: &Account) -> Result<Account, StoreError> {
            self.0.create(account).await
        }
        async fn update_fields(
            &self,
            id: ID<Account>,
            changes: &Changes,
        ) -> Result<Option<Account>, StoreError> {
            self.0.update_fields(id, changes).await
        }
    }

    #[tokio::test]
    async fn lost_race_surfaces_as_conflict() {
        let svc = Identity::new(
            Racing(MemoryStore::new()),
            Argon::with_params(8, 1, 1).unwrap(),
            Crypto::new(b"identity-test-secret-0123456789ab", Duration::from_secs(600)),
        );
        let ref scope = Scope::new();
        let first = svc.register(scope, ann()).await.unwrap();
        let dup_name = RegisterRequest {
            email: "fresh@x.com".into(),
            ..ann()
        };
        assert!(matches!(svc.register(scope, dup_name).await, Err(Error::UsernameExists)));
        let dup_mail = RegisterRequest {
            username: "fresh".into(),
            ..ann()
        };
        assert!(matches!(svc.register(scope, dup_mail).await, Err(Error::EmailExists)));
        let bob = svc.register(scope, bob()).await.unwrap();
        let steal = UpdateRequest {
            username: "ann".into(),
            ..update_of(&bob)
        };
        let result = svc.update(scope, steal, ID::from(bob.uuid)).await;
        assert!(matches!(result, Err(Error::UsernameExists)));
        assert_ne!(first.uuid, bob.uuid);
    }

    /// Fails every call, as an unreachable database would.
    struct Down;

    impl UserStore for Down {
        async fn find_by_username(&self, _: &str) -> Result<Option<Account>, StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
        async fn find_by_email(&self, _: &str) -> Result<Option<Account>, StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
        async fn find_by_uuid(&self, _: ID<Account>) -> Result<Option<Account>, StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
        async fn create(&self, _: &Account) -> Result<Account, StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
        async fn update_fields(
            &self,
            _: ID<Account>,
            _: &Changes,
        ) -> Result<Option<Account>, StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn storage_failures_stay_distinct_from_bad_input() {
        let svc = Identity::new(
            Down,
            Argon::with_params(8, 1, 1).unwrap(),
            Crypto::new(b"identity-test-secret-0123456789ab", Duration::from_secs(600)),
        );
        let ref scope = Scope::new();
        let err = svc.register(scope, ann()).await.unwrap_err();
        assert_eq!(err.kind(), Kind::Storage);
        assert_eq!(err.detail(), Some("connection refused"));
        let err = svc.login(scope, login("ann", "p1")).await.unwrap_err();
        assert_eq!(err.kind(), Kind::Storage);
    }

    /// Counts calls through to a real hasher.
    struct Counting {
        inner: Argon,
        hashes: Arc<std::sync::atomic::AtomicUsize>,
        verifies: Arc<std::sync::atomic::AtomicUsize>,
    }

    impl Hasher for Counting {
        fn hash(&self, password: &str) -> Result<String, HashError> {
            self.hashes.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.inner.hash(password)
        }
        fn verify(&self, password: &str, hashword: &str) -> Result<bool, HashError> {
            self.verifies.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.inner.verify(password, hashword)
        }
    }

    #[tokio::test]
    async fn unknown_username_still_pays_for_verification() {
        use std::sync::atomic::Ordering;
        let hashes = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let verifies = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let svc = Identity::new(
            MemoryStore::new(),
            Counting {
                inner: Argon::with_params(8, 1, 1).unwrap(),
                hashes: hashes.clone(),
                verifies: verifies.clone(),
            },
            Crypto::new(b"identity-test-secret-0123456789ab", Duration::from_secs(600)),
        );
        let ref scope = Scope::new();
        for _ in 0..2 {
            let err = svc.login(scope, login("ghost", "x")).await.unwrap_err();
            assert!(matches!(err, Error::InvalidCredentials));
        }
        assert_eq!(verifies.load(Ordering::SeqCst), 2);
        assert_eq!(hashes.load(Ordering::SeqCst), 1);
    }
}
