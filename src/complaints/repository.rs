use sqlx::PgPool;

use crate::complaints::error::ComplaintError;
use crate::complaints::models::{
    Complaint, ComplaintAttachment, ComplaintQuery, ComplaintReply, ComplaintStatus,
    CreateComplaintRequest, CreateReplyRequest,
};

/// Repository for complaint aggregate operations
#[derive(Clone)]
pub struct ComplaintsRepository {
    pool: PgPool,
}

impl ComplaintsRepository {
    /// Create a new ComplaintsRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// File a complaint with its attachments in one transaction
    pub async fn create(
        &self,
        request: &CreateComplaintRequest,
    ) -> Result<Complaint, ComplaintError> {
        let mut tx = self.pool.begin().await?;

        let complaint = sqlx::query_as::<_, Complaint>(
            r#"
            INSERT INTO complaints (user_id, subject, description, category, priority)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, subject, description, category, priority, status,
                      created_at, updated_at
            "#,
        )
        .bind(request.user_id)
        .bind(&request.subject)
        .bind(&request.description)
        .bind(request.category)
        .bind(request.priority)
        .fetch_one(&mut *tx)
        .await?;

        for attachment in &request.attachments {
            sqlx::query(
                "INSERT INTO complaint_attachments (complaint_id, file_name, file_path) \
                 VALUES ($1, $2, $3)",
            )
            .bind(complaint.id)
            .bind(&attachment.file_name)
            .bind(&attachment.file_path)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(complaint)
    }

    /// Find a complaint by ID
    pub async fn find_by_id(&self, id: i32) -> Result<Option<Complaint>, ComplaintError> {
        let complaint = sqlx::query_as::<_, Complaint>(
            "SELECT id, user_id, subject, description, category, priority, status, \
             created_at, updated_at FROM complaints WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(complaint)
    }

    /// List complaints with optional conjunctive filters, newest first
    pub async fn list(&self, query: &ComplaintQuery) -> Result<Vec<Complaint>, ComplaintError> {
        let search_pattern = query.search.as_ref().map(|s| format!("%{}%", s));

        let complaints = sqlx::query_as::<_, Complaint>(
            r#"
            SELECT id, user_id, subject, description, category, priority, status,
                   created_at, updated_at
            FROM complaints
            WHERE ($1::int4 IS NULL OR user_id = $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR category = $3)
              AND ($4::text IS NULL OR priority = $4)
              AND ($5::text IS NULL OR subject ILIKE $5 OR description ILIKE $5)
            ORDER BY created_at DESC
            "#,
        )
        .bind(query.user_id)
        .bind(query.status.map(|s| s.as_str()))
        .bind(query.category.map(|c| c.as_str()))
        .bind(query.priority.map(|p| p.as_str()))
        .bind(search_pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(complaints)
    }

    /// Update complaint workflow status; updated_at moves with it
    pub async fn update_status(
        &self,
        id: i32,
        status: ComplaintStatus,
    ) -> Result<Complaint, ComplaintError> {
        let complaint = sqlx::query_as::<_, Complaint>(
            r#"
            UPDATE complaints
            SET status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, user_id, subject, description, category, priority, status,
                      created_at, updated_at
            "#,
        )
        .bind(status)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ComplaintError::NotFound)?;

        Ok(complaint)
    }

    /// Append a reply to a complaint thread
    pub async fn create_reply(
        &self,
        complaint_id: i32,
        request: &CreateReplyRequest,
    ) -> Result<ComplaintReply, ComplaintError> {
        let reply = sqlx::query_as::<_, ComplaintReply>(
            r#"
            INSERT INTO complaint_replies (complaint_id, replied_by, reply_message,
                                           attachment_name, attachment_path)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, complaint_id, replied_by, reply_message,
                      attachment_name, attachment_path, created_at
            "#,
        )
        .bind(complaint_id)
        .bind(request.replied_by)
        .bind(&request.reply_message)
        .bind(&request.attachment_name)
        .bind(&request.attachment_path)
        .fetch_one(&self.pool)
        .await?;

        Ok(reply)
    }

    /// Replies on a complaint in thread order
    pub async fn replies(&self, complaint_id: i32) -> Result<Vec<ComplaintReply>, ComplaintError> {
        let replies = sqlx::query_as::<_, ComplaintReply>(
            "SELECT id, complaint_id, replied_by, reply_message, attachment_name, \
             attachment_path, created_at FROM complaint_replies \
             WHERE complaint_id = $1 ORDER BY created_at",
        )
        .bind(complaint_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(replies)
    }

    /// Attachments filed with a complaint, newest first
    pub async fn attachments(
        &self,
        complaint_id: i32,
    ) -> Result<Vec<ComplaintAttachment>, ComplaintError> {
        let attachments = sqlx::query_as::<_, ComplaintAttachment>(
            "SELECT id, complaint_id, file_name, file_path, uploaded_at \
             FROM complaint_attachments WHERE complaint_id = $1 ORDER BY uploaded_at DESC",
        )
        .bind(complaint_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attachments)
    }
}

#[cfg(test)]
mod tests {
    // Repository methods run against a live database; request validation
    // and the closed-thread rule are unit-tested in the models module.
}
