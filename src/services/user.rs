use crate::{
    error::{AppError, AppResult},
    lifecycle::{
        self,
        audit::{SharedAuditSink, TracingAuditSink, UserAuditEvent},
        FieldErrors,
    },
    models::{
        comment, event, item, role, user, Comment, CommentModel, CommentTarget, Event, EventModel,
        Item, ItemModel, Role, User, UserModel, UserWithRole,
    },
    services::role::RoleRegistry,
    utils::hash_password,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, TransactionTrait,
};
use std::sync::Arc;

/// Input for the registration write path, before normalization.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Option<String>,
    pub password: String,
    pub role_id: Option<i32>,
}

/// Profile changes; `None` leaves a field untouched, `Some("")` for the
/// email clears it.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
}

pub struct UserService {
    db: DatabaseConnection,
    roles: RoleRegistry,
    audit: SharedAuditSink,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            roles: RoleRegistry::new(db.clone()),
            db,
            audit: Arc::new(TracingAuditSink),
        }
    }

    pub fn with_audit(mut self, audit: SharedAuditSink) -> Self {
        self.audit = audit;
        self
    }

    /// Registration write path: normalize, then validate, then persist.
    /// Normalization runs first because validation reads normalized values.
    pub async fn create(&self, input: NewUser) -> AppResult<UserModel> {
        let name = lifecycle::normalize_name(&input.name);
        let email = normalized_email(input.email.as_deref());

        let mut errors = FieldErrors::new();
        let role_id = self.resolve_role_id(input.role_id, &mut errors).await?;

        lifecycle::validate_name(&name, &mut errors);
        if errors.get("name").is_none() && self.name_taken(&name, None).await? {
            errors.add("name", "has already been taken");
        }
        if let Some(email) = &email {
            if self.email_taken(email, None).await? {
                errors.add("email", "has already been taken");
            }
        }
        // role_id is None only when resolve_role_id recorded a field error
        let (Some(role_id), true) = (role_id, errors.is_empty()) else {
            return Err(AppError::Invalid(errors));
        };

        let password_hash = hash_password(&input.password)?;
        let now = chrono::Utc::now().naive_utc();

        let new_user = user::ActiveModel {
            name: sea_orm::ActiveValue::Set(name),
            email: sea_orm::ActiveValue::Set(email),
            password_hash: sea_orm::ActiveValue::Set(password_hash),
            active: sea_orm::ActiveValue::Set(true),
            sign_in_count: sea_orm::ActiveValue::Set(0),
            role_id: sea_orm::ActiveValue::Set(role_id),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let user = new_user.insert(&self.db).await.map_err(map_unique_violation)?;
        self.audit.record(UserAuditEvent::Created {
            id: user.id,
            name: user.name.clone(),
        });
        Ok(user)
    }

    /// Profile update write path. The name is validated but not re-title-cased
    /// (that normalization is creation-only); the email is renormalized, and
    /// the role assignment is re-validated.
    pub async fn update(&self, user_id: i32, changes: UserChanges) -> AppResult<UserModel> {
        let existing = self.get(user_id).await?;

        let name = changes.name.unwrap_or_else(|| existing.name.clone());
        let email = match changes.email {
            Some(raw) => normalized_email(Some(&raw)),
            None => existing.email.clone(),
        };

        let mut errors = FieldErrors::new();
        let role_id = self
            .resolve_role_id(Some(existing.role_id), &mut errors)
            .await?;

        lifecycle::validate_name(&name, &mut errors);
        if errors.get("name").is_none()
            && name != existing.name
            && self.name_taken(&name, Some(user_id)).await?
        {
            errors.add("name", "has already been taken");
        }
        if let Some(email) = &email {
            if existing.email.as_deref() != Some(email)
                && self.email_taken(email, Some(user_id)).await?
            {
                errors.add("email", "has already been taken");
            }
        }
        // role_id is None only when resolve_role_id recorded a field error
        let (Some(role_id), true) = (role_id, errors.is_empty()) else {
            return Err(AppError::Invalid(errors));
        };

        let now = chrono::Utc::now().naive_utc();
        let mut active: user::ActiveModel = existing.into();
        active.name = sea_orm::ActiveValue::Set(name);
        active.email = sea_orm::ActiveValue::Set(email);
        active.role_id = sea_orm::ActiveValue::Set(role_id);
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await.map_err(map_unique_violation)?;
        self.audit.record(UserAuditEvent::Updated {
            id: updated.id,
            name: updated.name.clone(),
        });
        Ok(updated)
    }

    /// Remove a user and, through the storage layer's cascade, their events
    /// and comments. The completion audit event fires only once the delete
    /// transaction has committed; an aborted cascade suppresses it.
    pub async fn destroy(&self, user_id: i32) -> AppResult<()> {
        let user = self.get(user_id).await?;

        self.audit.record(UserAuditEvent::DestroyStarted {
            id: user.id,
            name: user.name.clone(),
        });

        let txn = self.db.begin().await?;
        User::delete_by_id(user.id).exec(&txn).await?;
        txn.commit().await?;

        self.audit.record(UserAuditEvent::Destroyed {
            id: user.id,
            name: user.name,
        });
        Ok(())
    }

    /// Flip the active flag; inactive users cannot authenticate.
    pub async fn toggle_active(&self, user_id: i32) -> AppResult<UserModel> {
        let existing = self.get(user_id).await?;
        let now = chrono::Utc::now().naive_utc();

        let was_active = existing.active;
        let mut active: user::ActiveModel = existing.into();
        active.active = sea_orm::ActiveValue::Set(!was_active);
        active.updated_at = sea_orm::ActiveValue::Set(now);

        Ok(active.update(&self.db).await?)
    }

    pub async fn get(&self, user_id: i32) -> AppResult<UserModel> {
        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn get_by_name(&self, name: &str) -> AppResult<UserModel> {
        User::find()
            .filter(user::Column::Name.eq(name))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// User row plus resolved role, for `HasRole` checks.
    pub async fn get_with_role(&self, user_id: i32) -> AppResult<UserWithRole> {
        let (user, role) = User::find_by_id(user_id)
            .find_also_related(Role)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok(UserWithRole { user, role })
    }

    pub async fn update_avatar(
        &self,
        user_id: i32,
        url: &str,
        thumb_url: &str,
    ) -> AppResult<UserModel> {
        let existing = self.get(user_id).await?;
        let now = chrono::Utc::now().naive_utc();

        let mut active: user::ActiveModel = existing.into();
        active.avatar_url = sea_orm::ActiveValue::Set(Some(url.to_string()));
        active.avatar_thumb_url = sea_orm::ActiveValue::Set(Some(thumb_url.to_string()));
        active.updated_at = sea_orm::ActiveValue::Set(now);

        Ok(active.update(&self.db).await?)
    }

    pub async fn list(&self, page: u64, per_page: u64) -> AppResult<(Vec<UserModel>, u64)> {
        let paginator = User::find()
            .order_by_asc(user::Column::Id)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let users = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((users, total))
    }

    // --- query scopes ---

    /// Users holding the role coded `default`. A registry without that role
    /// matches nobody.
    pub async fn default_users(&self) -> AppResult<Vec<UserModel>> {
        let Some(role) = self.roles.find_by_code(role::ROLE_DEFAULT).await? else {
            return Ok(vec![]);
        };
        Ok(scope_default(User::find(), role.id).all(&self.db).await?)
    }

    /// Users created strictly after `since`.
    pub async fn fresh_users(&self, since: chrono::NaiveDateTime) -> AppResult<Vec<UserModel>> {
        Ok(scope_fresh(User::find(), since).all(&self.db).await?)
    }

    /// Intersection of the two scopes above, composed from the same builders.
    pub async fn default_fresh_users(
        &self,
        since: chrono::NaiveDateTime,
    ) -> AppResult<Vec<UserModel>> {
        let Some(role) = self.roles.find_by_code(role::ROLE_DEFAULT).await? else {
            return Ok(vec![]);
        };
        let query = scope_fresh(scope_default(User::find(), role.id), since);
        Ok(query.all(&self.db).await?)
    }

    // --- association resolver ---

    pub async fn events_for(&self, user_id: i32) -> AppResult<Vec<EventModel>> {
        let events = Event::find()
            .filter(event::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?;
        Ok(events)
    }

    /// Distinct items reachable through the user's events.
    pub async fn items_for(&self, user_id: i32) -> AppResult<Vec<ItemModel>> {
        let items = Item::find()
            .join(JoinType::InnerJoin, item::Relation::Event.def())
            .filter(event::Column::UserId.eq(user_id))
            .distinct()
            .all(&self.db)
            .await?;
        Ok(items)
    }

    pub async fn comments_for(&self, user_id: i32) -> AppResult<Vec<CommentModel>> {
        let comments = Comment::find()
            .filter(comment::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?;
        Ok(comments)
    }

    /// Events the user has commented on, resolved from the tagged targets of
    /// their comments.
    pub async fn commented_events_for(&self, user_id: i32) -> AppResult<Vec<EventModel>> {
        let ids = self
            .commented_target_ids(user_id, |target| match target {
                CommentTarget::Event(id) => Some(id),
                CommentTarget::User(_) => None,
            })
            .await?;
        if ids.is_empty() {
            return Ok(vec![]);
        }
        Ok(Event::find()
            .filter(event::Column::Id.is_in(ids))
            .all(&self.db)
            .await?)
    }

    /// Users the user has commented on.
    pub async fn commented_users_for(&self, user_id: i32) -> AppResult<Vec<UserModel>> {
        let ids = self
            .commented_target_ids(user_id, |target| match target {
                CommentTarget::User(id) => Some(id),
                CommentTarget::Event(_) => None,
            })
            .await?;
        if ids.is_empty() {
            return Ok(vec![]);
        }
        Ok(User::find()
            .filter(user::Column::Id.is_in(ids))
            .all(&self.db)
            .await?)
    }

    async fn commented_target_ids(
        &self,
        user_id: i32,
        pick: impl Fn(CommentTarget) -> Option<i32>,
    ) -> AppResult<Vec<i32>> {
        let comments = self.comments_for(user_id).await?;
        let mut ids: Vec<i32> = comments
            .iter()
            .filter_map(|c| c.target().and_then(&pick))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    // --- internals ---

    /// The `set_role` step: an explicit role is kept as-is (after an
    /// existence check), a missing one falls back to the role coded
    /// `default`. A registry without that role is a validation failure on
    /// `role`, never a crash.
    async fn resolve_role_id(
        &self,
        requested: Option<i32>,
        errors: &mut FieldErrors,
    ) -> AppResult<Option<i32>> {
        match requested {
            Some(id) => {
                if self.roles.find_by_id(id).await?.is_none() {
                    errors.add("role", "must exist");
                    return Ok(None);
                }
                Ok(Some(id))
            }
            None => match self.roles.find_by_code(role::ROLE_DEFAULT).await? {
                Some(role) => Ok(Some(role.id)),
                None => {
                    errors.add("role", "must exist");
                    Ok(None)
                }
            },
        }
    }

    async fn name_taken(&self, name: &str, excluding: Option<i32>) -> AppResult<bool> {
        let mut query = User::find().filter(user::Column::Name.eq(name));
        if let Some(id) = excluding {
            query = query.filter(user::Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }

    async fn email_taken(&self, email: &str, excluding: Option<i32>) -> AppResult<bool> {
        let mut query = User::find().filter(user::Column::Email.eq(email));
        if let Some(id) = excluding {
            query = query.filter(user::Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }
}

fn scope_default(query: Select<User>, default_role_id: i32) -> Select<User> {
    query.filter(user::Column::RoleId.eq(default_role_id))
}

fn scope_fresh(query: Select<User>, since: chrono::NaiveDateTime) -> Select<User> {
    query.filter(user::Column::CreatedAt.gt(since))
}

fn normalized_email(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|e| !e.is_empty())
        .map(lifecycle::normalize_email)
}

/// The storage unique index is the backstop against concurrent writes; a
/// violation surfaces as the same field-keyed failure the pre-insert check
/// produces.
fn map_unique_violation(err: DbErr) -> AppError {
    if let Some(sea_orm::SqlErr::UniqueConstraintViolation(constraint)) = err.sql_err() {
        let field = if constraint.contains("email") {
            "email"
        } else {
            "name"
        };
        let mut errors = FieldErrors::new();
        errors.add(field, "has already been taken");
        return AppError::Invalid(errors);
    }
    AppError::Database(err)
}
