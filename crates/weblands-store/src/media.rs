//! Media rows and analyzer write-backs.

use chrono::Utc;
use rusqlite::{params, Row};
use weblands_types::{Media, MediaAnalysis, MediaKind};

use crate::error::StoreError;
use crate::store::{from_column, to_column, Store};

const MEDIA_COLUMNS: &str = "id, expression_id, url, type, width, height, file_size, format, \
     color_mode, dominant_colors, has_transparency, aspect_ratio, exif_data, image_hash, \
     analyzed_at, analysis_error";

fn media_from_row(row: &Row<'_>) -> rusqlite::Result<Media> {
    let kind: String = row.get(3)?;
    Ok(Media {
        id: row.get(0)?,
        expression_id: row.get(1)?,
        url: row.get(2)?,
        kind: MediaKind::parse(&kind).unwrap_or(MediaKind::Img),
        width: row.get(4)?,
        height: row.get(5)?,
        file_size: row.get(6)?,
        format: row.get(7)?,
        color_mode: row.get(8)?,
        dominant_colors: row.get(9)?,
        has_transparency: row.get(10)?,
        aspect_ratio: row.get(11)?,
        exif_data: row.get(12)?,
        image_hash: row.get(13)?,
        analyzed_at: from_column(row.get(14)?),
        analysis_error: row.get(15)?,
    })
}

impl Store {
    /// Records one media reference, deduplicated per `(expression, url)`.
    pub fn insert_media(
        &self,
        expression_id: i64,
        url: &str,
        kind: MediaKind,
    ) -> Result<bool, StoreError> {
        let conn = self.lock();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO media (expression_id, url, type) VALUES (?1, ?2, ?3)",
            params![expression_id, url, kind.as_str()],
        )?;
        Ok(inserted > 0)
    }

    pub fn delete_media_for(&self, expression_id: i64) -> Result<usize, StoreError> {
        let conn = self.lock();
        Ok(conn.execute(
            "DELETE FROM media WHERE expression_id = ?1",
            [expression_id],
        )?)
    }

    pub fn media_for_expression(&self, expression_id: i64) -> Result<Vec<Media>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media WHERE expression_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt.query_map([expression_id], media_from_row)?;
        let mut media = Vec::new();
        for item in rows {
            media.push(item?);
        }
        Ok(media)
    }

    /// Applies an analyzer verdict to one media row; `analyzed_at` is
    /// always stamped.
    pub fn save_media_analysis(
        &self,
        media_id: i64,
        analysis: &MediaAnalysis,
    ) -> Result<(), StoreError> {
        let conn = self.lock();
        conn.execute(
            "UPDATE media SET width = ?1, height = ?2, file_size = ?3, format = ?4, \
                 color_mode = ?5, dominant_colors = ?6, has_transparency = ?7, \
                 aspect_ratio = ?8, exif_data = ?9, image_hash = ?10, \
                 analyzed_at = ?11, analysis_error = ?12 \
             WHERE id = ?13",
            params![
                analysis.width,
                analysis.height,
                analysis.file_size,
                analysis.format,
                analysis.color_mode,
                analysis.dominant_colors,
                analysis.has_transparency,
                analysis.aspect_ratio,
                analysis.exif_data,
                analysis.image_hash,
                to_column(Utc::now()),
                analysis.error,
                media_id,
            ],
        )?;
        Ok(())
    }
}
