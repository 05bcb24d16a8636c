use async_trait::async_trait;
use sqlx::{query_as, QueryBuilder};
use uuid::Uuid;

use crate::{
    application::{
        dto::media_dto::MediaDTO, error::ApplicationError, repositories::MediaRepository,
    },
    domain::models::media::MediaAsset,
};

pub struct PgMediaRepository {
    pool: sqlx::PgPool,
}

impl PgMediaRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

fn map_sqlx_error(error: sqlx::Error) -> ApplicationError {
    match error {
        sqlx::Error::RowNotFound => ApplicationError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ApplicationError::Conflict(db.message().to_string())
        }
        e => ApplicationError::DatabaseError(e.to_string()),
    }
}

#[async_trait]
impl MediaRepository for PgMediaRepository {
    async fn create_media(&self, media: MediaDTO) -> Result<MediaAsset, ApplicationError> {
        let mut media = media;
        media.sanitize();

        let query = r#"
            INSERT INTO media.assets (
                id, alt, filename, mime_type, filesize,
                url, enable_webp, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
        "#;

        let new_media: MediaAsset = media.into();

        let created: MediaDTO = query_as::<_, MediaDTO>(query)
            .bind(new_media.id)
            .bind(&new_media.alt)
            .bind(&new_media.filename)
            .bind(&new_media.mime_type)
            .bind(new_media.filesize as i64)
            .bind(&new_media.url)
            .bind(new_media.enable_webp)
            .bind(new_media.created_at)
            .bind(new_media.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(created.into())
    }

    async fn get_media(&self, id: Uuid) -> Result<MediaAsset, ApplicationError> {
        let query = "SELECT * FROM media.assets WHERE id = $1";

        let fetched: MediaDTO = query_as::<_, MediaDTO>(query)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(fetched.into())
    }

    async fn list_media(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<MediaAsset>, ApplicationError> {
        let query = "SELECT * FROM media.assets ORDER BY created_at ASC, id ASC LIMIT $1 OFFSET $2";

        let rows: Vec<MediaDTO> = query_as::<_, MediaDTO>(query)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(MediaAsset::from).collect())
    }

    async fn update_media(&self, media: MediaDTO) -> Result<MediaAsset, ApplicationError> {
        let mut media = media;
        media.sanitize();

        let id = media
            .id
            .ok_or_else(|| ApplicationError::BadRequest("media id is required".to_string()))?;

        if media.has_no_changes() {
            return self.get_media(id).await;
        }

        let mut builder = QueryBuilder::new("UPDATE media.assets SET ");
        let mut separated = builder.separated(", ");

        if let Some(alt) = &media.alt {
            separated.push("alt = ");
            separated.push_bind_unseparated(alt);
        }
        if let Some(filename) = &media.filename {
            separated.push("filename = ");
            separated.push_bind_unseparated(filename);
        }
        if let Some(mime_type) = &media.mime_type {
            separated.push("mime_type = ");
            separated.push_bind_unseparated(mime_type);
        }
        if let Some(filesize) = media.filesize {
            separated.push("filesize = ");
            separated.push_bind_unseparated(filesize as i64);
        }
        if let Some(url) = &media.url {
            separated.push("url = ");
            separated.push_bind_unseparated(url);
        }
        if let Some(enable_webp) = media.enable_webp {
            separated.push("enable_webp = ");
            separated.push_bind_unseparated(enable_webp);
        }
        separated.push("updated_at = now()");

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(" RETURNING *");

        let query = builder.build_query_as::<MediaDTO>();

        let updated = query
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(updated.into())
    }

    async fn delete_media(&self, id: Uuid) -> Result<MediaAsset, ApplicationError> {
        let query = "DELETE FROM media.assets WHERE id = $1 RETURNING *";

        let deleted: MediaDTO = query_as::<_, MediaDTO>(query)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(deleted.into())
    }
}
