use crate::{
    error::AppResult,
    models::{role, Role, RoleModel},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Read-side of the pre-seeded role lookup table.
pub struct RoleRegistry {
    db: DatabaseConnection,
}

impl RoleRegistry {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_code(&self, code: &str) -> AppResult<Option<RoleModel>> {
        let found = Role::find()
            .filter(role::Column::Code.eq(code))
            .one(&self.db)
            .await?;
        Ok(found)
    }

    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<RoleModel>> {
        Ok(Role::find_by_id(id).one(&self.db).await?)
    }
}

/// Seed the role lookup at startup. Existing rows are left untouched, so the
/// seed is safe to run on every boot.
pub async fn ensure_seed_roles(db: &DatabaseConnection) -> AppResult<()> {
    for (code, name) in [
        (role::ROLE_DEFAULT, "Member"),
        (role::ROLE_ADMIN, "Administrator"),
    ] {
        let exists = Role::find()
            .filter(role::Column::Code.eq(code))
            .one(db)
            .await?
            .is_some();
        if exists {
            continue;
        }

        let seeded = role::ActiveModel {
            code: sea_orm::ActiveValue::Set(code.to_string()),
            name: sea_orm::ActiveValue::Set(name.to_string()),
            ..Default::default()
        };
        seeded.insert(db).await?;
        tracing::info!(code, "seeded role");
    }
    Ok(())
}
