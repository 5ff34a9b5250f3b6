//! User service: registration, login and session tokens.

use std::sync::LazyLock;

use anifeed_common::{AppError, AppResult, IdGenerator};
use anifeed_db::{
    entities::user,
    repositories::{UserProfileRepository, UserRepository},
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use regex::Regex;
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;

/// Minimum password length accepted at signup.
pub const MIN_PASSWORD_LENGTH: usize = 8;

static EMAIL_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[^@]+@[^@]+\.[^@]+"));

static DIGIT_RE: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| Regex::new(r"\d"));

static SPECIAL_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"[^\w\s]"));

fn pattern(re: &'static LazyLock<Result<Regex, regex::Error>>) -> AppResult<&'static Regex> {
    re.as_ref()
        .map_err(|e| AppError::Internal(format!("Invalid pattern: {e}")))
}

/// Signup form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl SignupInput {
    fn has_all_fields(&self) -> bool {
        [
            &self.username,
            &self.email,
            &self.password,
            &self.confirm_password,
        ]
        .iter()
        .all(|f| !f.trim().is_empty())
    }
}

/// Check email format and password rules, in the order they are reported.
///
/// Returns the first failing rule's message.
pub fn check_credentials(input: &SignupInput) -> AppResult<Option<&'static str>> {
    if !pattern(&EMAIL_RE)?.is_match(&input.email) {
        return Ok(Some("Invalid email format."));
    }
    if input.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Ok(Some("Password must be at least 8 characters long."));
    }
    if !pattern(&DIGIT_RE)?.is_match(&input.password) {
        return Ok(Some("Password must include at least one number."));
    }
    if !pattern(&SPECIAL_RE)?.is_match(&input.password) {
        return Ok(Some("Password must include at least one special character."));
    }
    if input.password != input.confirm_password {
        return Ok(Some("Passwords do not match."));
    }
    Ok(None)
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    profile_repo: UserProfileRepository,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, profile_repo: UserProfileRepository) -> Self {
        Self {
            user_repo,
            profile_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new account and its empty profile.
    ///
    /// Rule violations are reported as [`AppError::Validation`] carrying the
    /// message shown to the user.
    pub async fn signup(&self, input: SignupInput) -> AppResult<user::Model> {
        if !input.has_all_fields() {
            return Err(AppError::Validation("All fields are required.".to_string()));
        }

        let username = input.username.trim().to_string();
        if self.user_repo.is_username_taken(&username, None).await? {
            return Err(AppError::Validation("Username already taken.".to_string()));
        }

        if let Some(message) = check_credentials(&input)? {
            return Err(AppError::Validation(message.to_string()));
        }

        let email = input.email.trim().to_string();
        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Validation("Email already registered.".to_string()));
        }

        let password_hash = hash_password(&input.password)?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username_lower: Set(username.to_lowercase()),
            username: Set(username),
            email: Set(email),
            password_hash: Set(password_hash),
            name: Set(None),
            token: Set(None),
            is_admin: Set(false),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let user = self.user_repo.create(model).await?;
        self.profile_repo.find_or_create(&user.id).await?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Look up an account by email (identifier containing `@`) or username
    /// and check its password.
    ///
    /// An unknown account is [`AppError::UserNotFound`]; a wrong password is
    /// [`AppError::Unauthorized`].
    pub async fn authenticate(&self, identifier: &str, password: &str) -> AppResult<user::Model> {
        let identifier = identifier.trim();
        let user = if identifier.contains('@') {
            self.user_repo.find_by_email(identifier).await?
        } else {
            self.user_repo.find_by_username(identifier).await?
        };

        let user = user.ok_or_else(|| AppError::UserNotFound(identifier.to_string()))?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    /// Issue a fresh session token for the user.
    pub async fn start_session(&self, user: user::Model) -> AppResult<String> {
        let token = self.id_gen.generate_token();
        let user_id = user.id.clone();

        let mut model: user::ActiveModel = user.into();
        model.token = Set(Some(token.clone()));
        model.updated_at = Set(Some(Utc::now().into()));
        self.user_repo.update(model).await?;

        info!(user_id = %user_id, "Session started");
        Ok(token)
    }

    /// Rotate the user's token so the current session stops resolving.
    pub async fn end_session(&self, user: user::Model) -> AppResult<()> {
        let user_id = user.id.clone();

        let mut model: user::ActiveModel = user.into();
        model.token = Set(Some(self.id_gen.generate_token()));
        model.updated_at = Set(Some(Utc::now().into()));
        self.user_repo.update(model).await?;

        info!(user_id = %user_id, "Session ended");
        Ok(())
    }

    /// Resolve a session token to its user.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        if token.is_empty() {
            return Ok(None);
        }
        self.user_repo.find_by_token(token).await
    }

    /// Whether nobody has registered `username` yet (case-insensitive).
    pub async fn is_username_available(&self, username: &str) -> AppResult<bool> {
        Ok(!self
            .user_repo
            .is_username_taken(username.trim(), None)
            .await?)
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
