use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

pub use crate::types::TicketStatus;

use crate::{
    entities::support_ticket,
    events::{
        EVENT_SUPPORT_TICKET_CREATED, EVENT_SUPPORT_TICKET_DELETED, EVENT_SUPPORT_TICKET_UPDATED,
        SupportTicketEventPayload,
    },
    models::event_outbox::EventOutbox,
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct SupportTicket {
    pub id: Uuid,
    pub subject: String,
    pub body: String,
    pub requester_email: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateSupportTicket {
    pub subject: String,
    pub body: String,
    pub requester_email: String,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct UpdateSupportTicket {
    pub subject: Option<String>,
    pub body: Option<String>,
    pub status: Option<TicketStatus>,
}

impl SupportTicket {
    fn from_model(model: support_ticket::Model) -> Self {
        Self {
            id: model.uuid,
            subject: model.subject,
            body: model.body,
            requester_email: model.requester_email,
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let models = support_ticket::Entity::find()
            .order_by_desc(support_ticket::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(models.into_iter().map(Self::from_model).collect())
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = support_ticket::Entity::find()
            .filter(support_ticket::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateSupportTicket,
        ticket_id: Uuid,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        let active = support_ticket::ActiveModel {
            uuid: Set(ticket_id),
            subject: Set(data.subject.clone()),
            body: Set(data.body.clone()),
            requester_email: Set(data.requester_email.clone()),
            status: Set(TicketStatus::Open),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active.insert(db).await?;
        let payload = serde_json::to_value(SupportTicketEventPayload { ticket_id })
            .map_err(|err| DbErr::Custom(err.to_string()))?;
        EventOutbox::enqueue(
            db,
            EVENT_SUPPORT_TICKET_CREATED,
            "support_ticket",
            ticket_id,
            payload,
        )
        .await?;
        Ok(Self::from_model(model))
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        data: &UpdateSupportTicket,
    ) -> Result<Self, DbErr> {
        let record = support_ticket::Entity::find()
            .filter(support_ticket::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Support ticket not found".to_string()))?;

        let mut active: support_ticket::ActiveModel = record.into();
        if let Some(subject) = &data.subject {
            active.subject = Set(subject.clone());
        }
        if let Some(body) = &data.body {
            active.body = Set(body.clone());
        }
        if let Some(status) = &data.status {
            active.status = Set(status.clone());
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await?;
        let payload = serde_json::to_value(SupportTicketEventPayload { ticket_id: id })
            .map_err(|err| DbErr::Custom(err.to_string()))?;
        EventOutbox::enqueue(
            db,
            EVENT_SUPPORT_TICKET_UPDATED,
            "support_ticket",
            id,
            payload,
        )
        .await?;
        Ok(Self::from_model(updated))
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<(), DbErr> {
        let record = support_ticket::Entity::find()
            .filter(support_ticket::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Support ticket not found".to_string()))?;

        record.delete(db).await?;
        let payload = serde_json::to_value(SupportTicketEventPayload { ticket_id: id })
            .map_err(|err| DbErr::Custom(err.to_string()))?;
        EventOutbox::enqueue(
            db,
            EVENT_SUPPORT_TICKET_DELETED,
            "support_ticket",
            id,
            payload,
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn ticket_lifecycle() {
        let db = setup_db().await;
        let id = Uuid::new_v4();

        let ticket = SupportTicket::create(
            &db,
            &CreateSupportTicket {
                subject: "Container stuck at Madrid Port".to_string(),
                body: "Shipment FLIP000042 has been held for a week.".to_string(),
                requester_email: "customer@example.com".to_string(),
            },
            id,
        )
        .await
        .unwrap();
        assert_eq!(ticket.status, TicketStatus::Open);

        let updated = SupportTicket::update(
            &db,
            id,
            &UpdateSupportTicket {
                subject: None,
                body: None,
                status: Some(TicketStatus::Resolved),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.status, TicketStatus::Resolved);
        assert_eq!(updated.subject, "Container stuck at Madrid Port");

        assert_eq!(SupportTicket::find_all(&db).await.unwrap().len(), 1);
        SupportTicket::delete(&db, id).await.unwrap();
        assert!(SupportTicket::find_by_id(&db, id).await.unwrap().is_none());
    }
}
