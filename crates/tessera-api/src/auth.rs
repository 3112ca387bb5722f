use std::sync::Arc;
use std::time::Duration;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use tessera_core::assets::AssetCatalog;
use tessera_core::design_manager::Canvas;
use tessera_core::designs::DesignRepository;
use tessera_core::leaderboard::LeaderboardIndex;
use tessera_core::submissions::SubmissionService;
use tessera_core::themes::ThemeManager;
use tessera_core::voting::VotingService;
use tessera_db::{RecordStore, keys};
use tessera_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::{ApiError, ApiResult};
use crate::workspace::Workspace;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: Arc<dyn RecordStore>,
    pub jwt_secret: String,
    pub designs: Arc<DesignRepository>,
    pub themes: Arc<ThemeManager>,
    pub leaderboard: Arc<LeaderboardIndex>,
    pub voting: VotingService,
    pub submissions: SubmissionService,
    pub catalog: AssetCatalog,
    pub workspace: Workspace,
}

/// Knobs the services are built with.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub jwt_secret: String,
    pub canvas: Canvas,
    pub autosave_debounce: Duration,
    pub theme_duration: chrono::Duration,
}

impl AppStateInner {
    /// Wires every service onto one store.
    pub fn new(store: Arc<dyn RecordStore>, catalog: AssetCatalog, settings: ServiceSettings) -> Self {
        let designs = Arc::new(DesignRepository::new(store.clone()));
        let themes = Arc::new(ThemeManager::new(store.clone(), settings.theme_duration));
        let leaderboard = Arc::new(LeaderboardIndex::new(store.clone(), designs.clone()));
        let voting = VotingService::new(store.clone(), designs.clone(), leaderboard.clone());
        let submissions = SubmissionService::new(designs.clone(), themes.clone(), leaderboard.clone());
        let workspace = Workspace::new(designs.clone(), settings.canvas, settings.autosave_debounce);

        Self {
            store,
            jwt_secret: settings.jwt_secret,
            designs,
            themes,
            leaderboard,
            voting,
            submissions,
            catalog,
            workspace,
        }
    }
}

/// Stored under `account:{lowercased username}`.
#[derive(Debug, Serialize, Deserialize)]
struct Account {
    id: Uuid,
    username: String,
    password_hash: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    // Validate input
    let username = req.username.trim();
    if username.len() < 3 || username.len() > 32 {
        return Err(ApiError::BadRequest("username must be 3 to 32 characters".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest("password must be at least 8 characters".into()));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();

    let account = Account {
        id: Uuid::new_v4(),
        username: username.to_string(),
        password_hash,
    };
    let raw = serde_json::to_string(&account).map_err(anyhow::Error::from)?;

    // Claim the name atomically so two registrations cannot both win.
    let mut taken = false;
    state.store.update(&keys::account(username), &mut |current| {
        taken = current.is_some();
        Ok((!taken).then(|| raw.clone()))
    })?;
    if taken {
        return Err(ApiError::UsernameTaken);
    }

    let token = create_token(&state.jwt_secret, account.id, &account.username)?;
    info!("Registered user {}", account.username);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: account.id,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let raw = state
        .store
        .get(&keys::account(req.username.trim()))?
        .ok_or(ApiError::InvalidCredentials)?;
    let account: Account = serde_json::from_str(&raw).map_err(anyhow::Error::from)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&account.password_hash)
        .map_err(|e| anyhow::anyhow!("corrupt password hash: {}", e))?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::InvalidCredentials)?;

    let token = create_token(&state.jwt_secret, account.id, &account.username)?;

    Ok(Json(LoginResponse {
        user_id: account.id,
        username: account.username,
        token,
    }))
}

pub fn create_token(secret: &str, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
