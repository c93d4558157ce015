use crate::{
    error::{AppError, AppResult},
    models::{event, item, Event, EventModel, Item, ItemModel},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

pub struct EventService {
    db: DatabaseConnection,
}

impl EventService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self, page: u64, per_page: u64) -> AppResult<(Vec<EventModel>, u64)> {
        let paginator = Event::find()
            .order_by_desc(event::Column::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let events = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((events, total))
    }

    pub async fn get(&self, id: i32) -> AppResult<EventModel> {
        Event::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(
        &self,
        user_id: i32,
        title: &str,
        description: &str,
        location: Option<String>,
        starts_at: Option<chrono::NaiveDateTime>,
    ) -> AppResult<EventModel> {
        let now = chrono::Utc::now().naive_utc();

        let new_event = event::ActiveModel {
            user_id: sea_orm::ActiveValue::Set(user_id),
            title: sea_orm::ActiveValue::Set(title.to_string()),
            description: sea_orm::ActiveValue::Set(description.to_string()),
            location: sea_orm::ActiveValue::Set(location),
            starts_at: sea_orm::ActiveValue::Set(starts_at),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        Ok(new_event.insert(&self.db).await?)
    }

    pub async fn update(
        &self,
        id: i32,
        user_id: i32,
        title: &str,
        description: &str,
        location: Option<String>,
        starts_at: Option<chrono::NaiveDateTime>,
    ) -> AppResult<EventModel> {
        let existing = self.get_owned(id, user_id).await?;
        let now = chrono::Utc::now().naive_utc();

        let mut active: event::ActiveModel = existing.into();
        active.title = sea_orm::ActiveValue::Set(title.to_string());
        active.description = sea_orm::ActiveValue::Set(description.to_string());
        active.location = sea_orm::ActiveValue::Set(location);
        active.starts_at = sea_orm::ActiveValue::Set(starts_at);
        active.updated_at = sea_orm::ActiveValue::Set(now);

        Ok(active.update(&self.db).await?)
    }

    /// Owner-only delete; items cascade through the storage layer.
    pub async fn delete(&self, id: i32, user_id: i32) -> AppResult<()> {
        let existing = self.get_owned(id, user_id).await?;
        Event::delete_by_id(existing.id).exec(&self.db).await?;
        Ok(())
    }

    pub async fn list_items(&self, event_id: i32) -> AppResult<Vec<ItemModel>> {
        self.get(event_id).await?;
        let items = Item::find()
            .filter(item::Column::EventId.eq(event_id))
            .order_by_asc(item::Column::Id)
            .all(&self.db)
            .await?;
        Ok(items)
    }

    pub async fn add_item(
        &self,
        event_id: i32,
        user_id: i32,
        name: &str,
        quantity: i32,
    ) -> AppResult<ItemModel> {
        self.get_owned(event_id, user_id).await?;

        if quantity < 1 {
            return Err(AppError::Validation("Quantity must be at least 1".to_string()));
        }

        let now = chrono::Utc::now().naive_utc();
        let new_item = item::ActiveModel {
            event_id: sea_orm::ActiveValue::Set(event_id),
            name: sea_orm::ActiveValue::Set(name.to_string()),
            quantity: sea_orm::ActiveValue::Set(quantity),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        Ok(new_item.insert(&self.db).await?)
    }

    pub async fn remove_item(&self, event_id: i32, item_id: i32, user_id: i32) -> AppResult<()> {
        self.get_owned(event_id, user_id).await?;

        let item = Item::find_by_id(item_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        if item.event_id != event_id {
            return Err(AppError::NotFound);
        }

        Item::delete_by_id(item_id).exec(&self.db).await?;
        Ok(())
    }

    async fn get_owned(&self, id: i32, user_id: i32) -> AppResult<EventModel> {
        let existing = self.get(id).await?;
        if existing.user_id != user_id {
            return Err(AppError::Forbidden);
        }
        Ok(existing)
    }
}
