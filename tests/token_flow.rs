use secrecy::SecretString;
use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};
use tessera::{
    Claims, Clock, CookieProtector, CryptoProvider, Error, HmacAlgorithm, Privilege,
    RegistryError, Session, SessionRegistry, SessionTokenCodec, SystemRole, TokenConfig,
    crypto::seal_private_key, hash_password, session::RegistryFuture, verify_password,
};

const MASTER_SECRET: &str = "integration-master-secret";
const SIGNING_SECRET: &str = "integration-signing-secret";
const PRIVATE_KEY_PEM: &str = include_str!("fixtures/rsa_test_key.pem");
const NOW: i64 = 1_760_000_000;

#[derive(Debug)]
struct FixedClock(AtomicI64);

impl FixedClock {
    fn advance(&self, seconds: i64) {
        self.0.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

fn config() -> TokenConfig {
    let sealed = seal_private_key(MASTER_SECRET, PRIVATE_KEY_PEM.as_bytes())
        .unwrap_or_else(|err| panic!("seal: {err}"));
    TokenConfig::new(
        SecretString::from(MASTER_SECRET.to_string()),
        SecretString::from(SIGNING_SECRET.to_string()),
        sealed,
    )
}

fn codec(clock: &Arc<FixedClock>) -> SessionTokenCodec {
    let config = config();
    let crypto = CryptoProvider::from_config(&config).unwrap_or_else(|err| panic!("{err}"));
    SessionTokenCodec::new(Arc::new(crypto), &config)
        .unwrap_or_else(|err| panic!("{err}"))
        .with_clock(Arc::clone(clock) as Arc<dyn Clock>)
}

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(AtomicI64::new(NOW)))
}

fn editor() -> Claims {
    Claims::new("u1", SystemRole::Authenticated)
        .with_roles(["editor"])
        .with_privileges(vec![Privilege::new("books", "Moderator")])
}

#[tokio::test]
async fn issued_token_round_trips_across_processes() {
    let clock = clock();
    let token = codec(&clock).encode("sess-42", &editor()).unwrap_or_else(|err| panic!("{err}"));

    // A second, independently built codec with the same secrets reads it.
    let validated = codec(&clock)
        .validate(&token, None)
        .await
        .unwrap_or_else(|err| panic!("{err}"));
    assert_eq!(validated.session_id, "sess-42");
    assert_eq!(validated.claims, editor());
    assert_eq!(
        validated.claims.effective_roles(),
        vec!["editor", "All", "Authenticated"]
    );
}

#[tokio::test]
async fn token_expires_after_window() {
    let clock = clock();
    let codec = codec(&clock);
    let token = codec.encode("sess-42", &editor()).unwrap_or_else(|err| panic!("{err}"));

    clock.advance(30);
    assert!(codec.validate(&token, None).await.is_ok());
    clock.advance(1);
    assert!(matches!(
        codec.validate(&token, None).await,
        Err(Error::TokenExpired)
    ));
}

#[tokio::test]
async fn longer_configured_window_is_honored() {
    let clock = clock();
    let config = config().with_token_ttl_seconds(1800);
    let crypto = Arc::new(CryptoProvider::from_config(&config).unwrap_or_else(|err| panic!("{err}")));
    let codec = SessionTokenCodec::new(crypto, &config)
        .unwrap_or_else(|err| panic!("{err}"))
        .with_clock(Arc::clone(&clock) as Arc<dyn Clock>);
    let token = codec.encode("sess-42", &editor()).unwrap_or_else(|err| panic!("{err}"));

    clock.advance(1800);
    assert!(codec.validate(&token, None).await.is_ok());
}

#[tokio::test]
async fn tampered_payload_is_rejected() {
    let clock = clock();
    let codec = codec(&clock);
    let token = codec.encode("sess-42", &editor()).unwrap_or_else(|err| panic!("{err}"));

    let parts: Vec<&str> = token.split('.').collect();
    assert_eq!(parts.len(), 3);
    let other = codec.encode("sess-43", &editor()).unwrap_or_else(|err| panic!("{err}"));
    let other_payload = other.split('.').nth(1).unwrap_or_default();
    let spliced = format!("{}.{}.{}", parts[0], other_payload, parts[2]);
    assert!(matches!(
        codec.validate(&spliced, None).await,
        Err(Error::InvalidSignature)
    ));

    assert!(matches!(
        codec.validate("not-a-token", None).await,
        Err(Error::InvalidToken(_))
    ));
}

#[tokio::test]
async fn other_master_secret_cannot_read_tokens() {
    let clock = clock();
    let token = codec(&clock).encode("sess-42", &editor()).unwrap_or_else(|err| panic!("{err}"));

    let other_master = "another-master-secret";
    let sealed = seal_private_key(other_master, PRIVATE_KEY_PEM.as_bytes())
        .unwrap_or_else(|err| panic!("{err}"));
    let config = TokenConfig::new(
        SecretString::from(other_master.to_string()),
        SecretString::from(SIGNING_SECRET.to_string()),
        sealed,
    );
    let crypto = Arc::new(CryptoProvider::from_config(&config).unwrap_or_else(|err| panic!("{err}")));
    let other = SessionTokenCodec::new(crypto, &config)
        .unwrap_or_else(|err| panic!("{err}"))
        .with_clock(Arc::clone(&clock) as Arc<dyn Clock>);

    let err = other.validate(&token, None).await.err();
    assert!(matches!(
        err,
        Some(Error::InvalidSignature | Error::InvalidToken(_))
    ));
}

#[derive(Debug)]
struct Store(Option<RegistryError>);

impl SessionRegistry for Store {
    fn check<'a>(&'a self, session: &'a Session) -> RegistryFuture<'a> {
        let outcome = match &self.0 {
            None if session.session_id == "sess-42" => Ok(()),
            None => Err(RegistryError::NotRegistered),
            Some(RegistryError::Revoked) => Err(RegistryError::Revoked),
            Some(_) => Err(RegistryError::Unavailable("store offline".to_string())),
        };
        Box::pin(async move { outcome })
    }
}

#[tokio::test]
async fn registry_decides_liveness() {
    let clock = clock();
    let codec = codec(&clock);
    let live = codec.encode("sess-42", &editor()).unwrap_or_else(|err| panic!("{err}"));
    let unknown = codec.encode("sess-99", &editor()).unwrap_or_else(|err| panic!("{err}"));

    let store = Store(None);
    assert!(codec.validate(&live, Some(&store)).await.is_ok());
    assert!(matches!(
        codec.validate(&unknown, Some(&store)).await,
        Err(Error::Session(RegistryError::NotRegistered))
    ));
    assert!(matches!(
        codec.validate(&live, Some(&Store(Some(RegistryError::Revoked)))).await,
        Err(Error::Session(RegistryError::Revoked))
    ));
}

#[tokio::test]
async fn decode_fills_caller_session() {
    let clock = clock();
    let codec = codec(&clock);
    let token = codec.encode("sess-42", &editor()).unwrap_or_else(|err| panic!("{err}"));

    let mut session = Session::new("placeholder");
    session.ip = Some("10.0.0.1".to_string());
    let access_token = codec
        .decode(&token, &mut session, None)
        .await
        .unwrap_or_else(|err| panic!("{err}"));

    assert_eq!(session.session_id, "sess-42");
    assert_eq!(session.ip.as_deref(), Some("10.0.0.1"));
    assert_eq!(session.user.as_ref().map(|u| u.user_id.as_str()), Some("u1"));
    assert_eq!(
        codec.access_tokens().decode(&access_token).ok(),
        Some(editor())
    );
}

#[test]
fn cookie_survives_protect_and_unprotect() {
    let config = config();
    let crypto = Arc::new(CryptoProvider::from_config(&config).unwrap_or_else(|err| panic!("{err}")));
    let cookies = CookieProtector::from_config(Arc::clone(&crypto), &config);

    let protected = cookies.protect_cookie("sess-42").unwrap_or_else(|err| panic!("{err}"));
    assert!(protected.starts_with(&format!("{}|", cookies.marker())));
    assert_eq!(cookies.unprotect_cookie(&protected), "sess-42");
    assert_eq!(cookies.unprotect_cookie("sess-42"), "sess-42");

    let signature = protected.rsplit('|').next().unwrap_or_default();
    assert_eq!(
        Some(signature.to_string()),
        crypto.sign("sess-42", HmacAlgorithm::Sha256).ok()
    );
}

#[test]
fn password_hash_is_stable_and_verifiable() {
    let id = "0F8FAD5B-D9CB-469F-A165-70867728950E";
    let stored = hash_password(id, "correct horse").unwrap_or_else(|err| panic!("{err}"));
    assert_eq!(
        hash_password(&id.to_lowercase(), "correct horse").ok(),
        Some(stored.clone())
    );
    assert_eq!(verify_password(id, "correct horse", &stored).ok(), Some(true));
    assert_eq!(verify_password(id, "wrong", &stored).ok(), Some(false));
    assert!(matches!(
        hash_password("not-a-uuid", "pw"),
        Err(Error::InvalidInput(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn one_codec_serves_concurrent_tasks() {
    let clock = clock();
    let codec = Arc::new(codec(&clock));

    let tasks: Vec<_> = (0..16)
        .map(|n| {
            let codec = Arc::clone(&codec);
            tokio::spawn(async move {
                let session_id = format!("sess-{n}");
                let claims = Claims::new(format!("user-{n}"), SystemRole::Authenticated);
                let token = codec.encode(&session_id, &claims)?;
                let validated = codec.validate(&token, None).await?;
                Ok::<_, Error>((session_id, claims, validated))
            })
        })
        .collect();

    for task in tasks {
        let (session_id, claims, validated) = task
            .await
            .unwrap_or_else(|err| panic!("task: {err}"))
            .unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(validated.session_id, session_id);
        assert_eq!(validated.claims, claims);
    }
}
