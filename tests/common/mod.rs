#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use notes_portal::{
    AppConfig, AppState,
    auth::Claims,
    models::{Credentials, Note},
    note_api::{NoteApi, NoteApiError, NoteLookup},
    repository::NoteRepository,
    session::{
        ACCESS_TOKEN_COOKIE, AuthError, ProviderUser, SessionStore, SessionTokens, SessionUser,
    },
};
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::SystemTime,
};
use tokio::net::TcpListener;
use uuid::Uuid;

pub const TEST_USER_ID: Uuid = Uuid::from_u128(1);
pub const BASE_URL: &str = "http://localhost:3000";

// --- Tokens ---

/// Signs an HS256 access token; a negative offset yields an expired token.
pub fn create_token(user_id: Uuid, secret: &str, exp_offset: i64) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = Claims {
        sub: user_id,
        email: Some("user@example.com".to_string()),
        iat: now as usize,
        exp: (now + exp_offset) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

// --- Mock Session Store ---

/// Session client stub. A request is signed in when it carries any
/// `sb-access-token` cookie.
#[derive(Default)]
pub struct MockSessionStore {
    pub user: Option<SessionUser>,
    /// Every call fails with a provider rejection.
    pub fail: bool,
    /// When set, `get_user` rotates the access token to this value.
    pub refreshed_token: Option<String>,
    pub get_user_calls: AtomicUsize,
    pub sign_out_calls: AtomicUsize,
}

impl MockSessionStore {
    pub fn signed_in() -> Self {
        Self {
            user: Some(SessionUser {
                id: TEST_USER_ID,
                email: Some("user@example.com".to_string()),
            }),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn get_user_calls(&self) -> usize {
        self.get_user_calls.load(Ordering::SeqCst)
    }

    fn rejection() -> AuthError {
        AuthError::Rejected {
            status: 400,
            message: "Invalid login credentials".to_string(),
        }
    }
}

#[async_trait]
impl SessionStore for MockSessionStore {
    async fn get_user(&self, jar: CookieJar) -> Result<(CookieJar, Option<SessionUser>), AuthError> {
        self.get_user_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Self::rejection());
        }
        if jar.get(ACCESS_TOKEN_COOKIE).is_none() {
            return Ok((jar, None));
        }

        let jar = match &self.refreshed_token {
            Some(token) => jar.add(Cookie::new(ACCESS_TOKEN_COOKIE, token.clone())),
            None => jar,
        };
        Ok((jar, self.user.clone()))
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<SessionTokens, AuthError> {
        if self.fail {
            return Err(Self::rejection());
        }
        Ok(SessionTokens {
            access_token: "issued-access".to_string(),
            refresh_token: "issued-refresh".to_string(),
            user: ProviderUser {
                id: TEST_USER_ID,
                email: Some(credentials.email.clone()),
            },
        })
    }

    async fn sign_up(&self, _credentials: &Credentials) -> Result<(), AuthError> {
        if self.fail {
            return Err(Self::rejection());
        }
        Ok(())
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AuthError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Self::rejection());
        }
        Ok(())
    }
}

// --- Mock Note API ---

#[derive(Clone)]
pub enum LookupBehavior {
    Found(String),
    NotFound,
    FailStatus(u16),
}

/// Counts lookups and creations so tests can assert on call counts.
pub struct MockNoteApi {
    pub lookup: LookupBehavior,
    /// `Err(status)` makes creation fail.
    pub create: Result<String, u16>,
    pub lookups: AtomicUsize,
    pub creates: AtomicUsize,
}

impl MockNoteApi {
    pub fn new(lookup: LookupBehavior, create: Result<String, u16>) -> Self {
        Self {
            lookup,
            create,
            lookups: AtomicUsize::new(0),
            creates: AtomicUsize::new(0),
        }
    }

    pub fn found(id: &str) -> Self {
        Self::new(LookupBehavior::Found(id.to_string()), Err(500))
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NoteApi for MockNoteApi {
    async fn fetch_newest_note(&self, _user_id: Uuid) -> Result<NoteLookup, NoteApiError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        match &self.lookup {
            LookupBehavior::Found(id) => Ok(NoteLookup::Found(id.clone())),
            LookupBehavior::NotFound => Ok(NoteLookup::NotFound),
            LookupBehavior::FailStatus(status) => Err(NoteApiError::Status(*status)),
        }
    }

    async fn create_note(&self, _user_id: Uuid) -> Result<String, NoteApiError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.create.clone().map_err(NoteApiError::Status)
    }
}

// --- In-Memory Repository ---

#[derive(Default)]
pub struct InMemoryRepo {
    pub notes: Mutex<Vec<Note>>,
}

impl InMemoryRepo {
    /// Seeds a note updated `minutes_ago` minutes in the past.
    pub fn with_note(self, author_id: Uuid, text: &str, minutes_ago: i64) -> Self {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        self.notes.lock().unwrap().push(Note {
            id: Uuid::new_v4(),
            author_id,
            text: text.to_string(),
            created_at: at,
            updated_at: at,
        });
        self
    }

    pub fn all(&self) -> Vec<Note> {
        self.notes.lock().unwrap().clone()
    }
}

#[async_trait]
impl NoteRepository for InMemoryRepo {
    async fn get_notes(&self, user_id: Uuid) -> Vec<Note> {
        let mut notes: Vec<Note> = self
            .all()
            .into_iter()
            .filter(|n| n.author_id == user_id)
            .collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        notes
    }

    async fn get_newest_note(&self, user_id: Uuid) -> Option<Note> {
        self.get_notes(user_id).await.into_iter().next()
    }

    async fn get_note(&self, id: Uuid, user_id: Uuid) -> Option<Note> {
        self.all()
            .into_iter()
            .find(|n| n.id == id && n.author_id == user_id)
    }

    async fn create_note(&self, user_id: Uuid) -> Option<Note> {
        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4(),
            author_id: user_id,
            text: String::new(),
            created_at: now,
            updated_at: now,
        };
        self.notes.lock().unwrap().push(note.clone());
        Some(note)
    }

    async fn update_note(&self, id: Uuid, user_id: Uuid, text: String) -> Option<Note> {
        let mut notes = self.notes.lock().unwrap();
        let note = notes
            .iter_mut()
            .find(|n| n.id == id && n.author_id == user_id)?;
        note.text = text;
        note.updated_at = Utc::now();
        Some(note.clone())
    }

    async fn delete_note(&self, id: Uuid, user_id: Uuid) -> bool {
        let mut notes = self.notes.lock().unwrap();
        let before = notes.len();
        notes.retain(|n| !(n.id == id && n.author_id == user_id));
        notes.len() < before
    }
}

// --- State & Servers ---

pub fn create_app_state(
    repo: Arc<InMemoryRepo>,
    sessions: Arc<MockSessionStore>,
    notes_api: Arc<MockNoteApi>,
) -> AppState {
    AppState {
        repo,
        sessions,
        notes_api,
        config: AppConfig::default(),
    }
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}
