use crate::{
    error::{AppError, AppResult},
    models::{refresh_token, user, RefreshToken, User, UserModel},
    services::email::EmailService,
    services::user::{NewUser, UserService},
    utils::{encode_access_token, encode_refresh_token, verify_password},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    TransactionTrait,
};

const RESET_TOKEN_TTL_HOURS: i64 = 1;

pub struct AuthService {
    db: DatabaseConnection,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register a new account through the user lifecycle pipeline.
    /// Returns (user_model, access_token, refresh_token).
    pub async fn register(
        &self,
        name: &str,
        email: Option<&str>,
        password: &str,
    ) -> AppResult<(UserModel, String, String)> {
        let users = UserService::new(self.db.clone());
        let user = users
            .create(NewUser {
                name: name.to_string(),
                email: email.map(str::to_string),
                password: password.to_string(),
                role_id: None,
            })
            .await?;

        let (access_token, refresh_token) = self.issue_tokens_for_user(user.id).await?;
        Ok((user, access_token, refresh_token))
    }

    /// Login by name or email. Records sign-in tracking columns on success.
    /// Returns (user_model, access_token, refresh_token).
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        client_ip: Option<String>,
    ) -> AppResult<(UserModel, String, String)> {
        let user = self
            .find_by_identifier(identifier)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !can_authenticate(&user, password)? {
            return Err(AppError::Unauthorized);
        }

        let user = self.track_sign_in(user, client_ip).await?;
        let (access_token, refresh_token) = self.issue_tokens_for_user(user.id).await?;

        Ok((user, access_token, refresh_token))
    }

    pub async fn rotate_refresh_token(
        &self,
        user_id: i32,
        current_refresh_token: &str,
    ) -> AppResult<(String, String)> {
        let token_hash = crate::utils::jwt::hash_refresh_token(current_refresh_token);
        let now = chrono::Utc::now().naive_utc();

        let existing = RefreshToken::find()
            .filter(refresh_token::Column::UserId.eq(user_id))
            .filter(refresh_token::Column::Token.eq(token_hash))
            .one(&self.db)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if existing.expires_at <= now {
            let _ = RefreshToken::delete_by_id(existing.id).exec(&self.db).await;
            return Err(AppError::Unauthorized);
        }

        let txn = self.db.begin().await?;
        RefreshToken::delete_by_id(existing.id).exec(&txn).await?;
        let (access_token, refresh_token) = self.issue_tokens_for_user_txn(&txn, user_id).await?;
        txn.commit().await?;
        Ok((access_token, refresh_token))
    }

    pub async fn revoke_refresh_token(&self, refresh_token: &str) -> AppResult<()> {
        let token_hash = crate::utils::jwt::hash_refresh_token(refresh_token);
        RefreshToken::delete_many()
            .filter(refresh_token::Column::Token.eq(token_hash))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    pub async fn revoke_all_user_refresh_tokens(&self, user_id: i32) -> AppResult<()> {
        RefreshToken::delete_many()
            .filter(refresh_token::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    pub async fn get_user_by_id(&self, id: i32) -> AppResult<UserModel> {
        let user = User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok(user)
    }

    /// Change password for an authenticated user; revokes open sessions.
    pub async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let user = self.get_user_by_id(user_id).await?;
        let is_valid = verify_password(current_password, &user.password_hash)?;
        if !is_valid {
            return Err(AppError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }
        let new_hash = crate::utils::hash_password(new_password)?;
        let now = chrono::Utc::now().naive_utc();
        let mut active: user::ActiveModel = user.into();
        active.password_hash = sea_orm::ActiveValue::Set(new_hash);
        active.updated_at = sea_orm::ActiveValue::Set(now);
        active.update(&self.db).await?;
        self.revoke_all_user_refresh_tokens(user_id).await?;
        Ok(())
    }

    /// Request a password reset. Silently succeeds if no account matches,
    /// so callers cannot probe which emails exist.
    pub async fn forgot_password(
        &self,
        email: &str,
        email_service: &EmailService,
    ) -> AppResult<()> {
        let email = crate::lifecycle::normalize_email(email);
        let user = User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;

        let Some(user) = user else {
            return Ok(());
        };

        let token = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().naive_utc();

        let user_email = user.email.clone();
        let mut active: user::ActiveModel = user.into();
        active.reset_password_token = sea_orm::ActiveValue::Set(Some(token.clone()));
        active.reset_password_sent_at = sea_orm::ActiveValue::Set(Some(now));
        active.updated_at = sea_orm::ActiveValue::Set(now);
        active.update(&self.db).await?;

        if let Some(user_email) = user_email {
            if let Err(e) = email_service
                .send_password_reset_email(&user_email, &token)
                .await
            {
                tracing::warn!("Failed to send password reset email: {e}");
            }
        }

        Ok(())
    }

    /// Reset password using a reset token.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        let user = User::find()
            .filter(user::Column::ResetPasswordToken.eq(token))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::Validation("Invalid reset token".to_string()))?;
        let user_id = user.id;

        let now = chrono::Utc::now().naive_utc();
        match user.reset_password_sent_at {
            Some(sent_at) if now <= sent_at + chrono::Duration::hours(RESET_TOKEN_TTL_HOURS) => {}
            _ => return Err(AppError::Validation("Reset token has expired".to_string())),
        }

        let new_hash = crate::utils::hash_password(new_password)?;
        let mut active: user::ActiveModel = user.into();
        active.password_hash = sea_orm::ActiveValue::Set(new_hash);
        active.reset_password_token = sea_orm::ActiveValue::Set(None);
        active.reset_password_sent_at = sea_orm::ActiveValue::Set(None);
        active.updated_at = sea_orm::ActiveValue::Set(now);
        active.update(&self.db).await?;
        self.revoke_all_user_refresh_tokens(user_id).await?;

        Ok(())
    }

    async fn find_by_identifier(&self, identifier: &str) -> AppResult<Option<UserModel>> {
        let user = User::find()
            .filter(
                sea_orm::Condition::any()
                    .add(user::Column::Name.eq(identifier))
                    .add(user::Column::Email.eq(identifier.to_lowercase())),
            )
            .one(&self.db)
            .await?;
        Ok(user)
    }

    /// Shift current sign-in data to the last-sign-in columns and stamp the
    /// new sign-in.
    async fn track_sign_in(
        &self,
        user: UserModel,
        client_ip: Option<String>,
    ) -> AppResult<UserModel> {
        let now = chrono::Utc::now().naive_utc();
        let previous_at = user.current_sign_in_at;
        let previous_ip = user.current_sign_in_ip.clone();
        let count = user.sign_in_count;

        let mut active: user::ActiveModel = user.into();
        active.last_sign_in_at = sea_orm::ActiveValue::Set(previous_at);
        active.last_sign_in_ip = sea_orm::ActiveValue::Set(previous_ip);
        active.current_sign_in_at = sea_orm::ActiveValue::Set(Some(now));
        active.current_sign_in_ip = sea_orm::ActiveValue::Set(client_ip);
        active.sign_in_count = sea_orm::ActiveValue::Set(count + 1);
        active.updated_at = sea_orm::ActiveValue::Set(now);

        Ok(active.update(&self.db).await?)
    }

    async fn issue_tokens_for_user(&self, user_id: i32) -> AppResult<(String, String)> {
        self.issue_tokens_for_user_txn(&self.db, user_id).await
    }

    async fn issue_tokens_for_user_txn<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: i32,
    ) -> AppResult<(String, String)> {
        let user_id_str = user_id.to_string();
        let access_token = encode_access_token(&user_id_str)?;
        let refresh_token = encode_refresh_token(&user_id_str)?;
        self.persist_refresh_token(conn, user_id, &refresh_token)
            .await?;
        Ok((access_token, refresh_token))
    }

    async fn persist_refresh_token<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: i32,
        refresh_token: &str,
    ) -> AppResult<()> {
        let now = chrono::Utc::now().naive_utc();
        let expires_at = now
            + chrono::Duration::seconds(crate::utils::jwt::refresh_token_expiry_seconds() as i64);

        let model = refresh_token::ActiveModel {
            user_id: sea_orm::ActiveValue::Set(user_id),
            token: sea_orm::ActiveValue::Set(crate::utils::jwt::hash_refresh_token(refresh_token)),
            expires_at: sea_orm::ActiveValue::Set(expires_at),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };
        model.insert(conn).await?;
        Ok(())
    }
}

/// The credential check gated by the active flag: an inactive account can
/// never authenticate, whatever the password.
pub fn can_authenticate(user: &UserModel, password: &str) -> AppResult<bool> {
    if !user.active {
        return Ok(false);
    }
    Ok(verify_password(password, &user.password_hash)?)
}
