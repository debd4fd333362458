//! Per-user settings.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use jotter_core::{
    AccentColor, Error, Result, SettingsRepository, TimeFormat, UpdateSettingsRequest,
    UserSettings,
};

/// PostgreSQL implementation of SettingsRepository.
#[derive(Clone)]
pub struct PgSettingsRepository {
    pool: Pool<Postgres>,
}

impl PgSettingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Apply a partial update on top of the current settings.
fn merge(mut current: UserSettings, req: &UpdateSettingsRequest) -> Result<UserSettings> {
    if let Some(format) = req.time_format {
        current.time_format = format;
    }
    if req.clear_accent {
        current.accent = None;
    } else if let Some(accent) = req.accent {
        accent.validate()?;
        current.accent = Some(accent);
    }
    Ok(current)
}

#[async_trait]
impl SettingsRepository for PgSettingsRepository {
    async fn get(&self, user_id: Uuid) -> Result<UserSettings> {
        let row = sqlx::query(
            r#"
            SELECT user_id, time_format, accent_lightness, accent_chroma, accent_hue, updated_at
            FROM user_settings WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        let Some(row) = row else {
            return Ok(UserSettings::defaults_for(user_id));
        };

        let time_format: String = row.get("time_format");
        let lightness: Option<f64> = row.get("accent_lightness");
        let chroma: Option<f64> = row.get("accent_chroma");
        let hue: Option<f64> = row.get("accent_hue");
        let accent = match (lightness, chroma, hue) {
            (Some(lightness), Some(chroma), Some(hue)) => Some(AccentColor {
                lightness,
                chroma,
                hue,
            }),
            _ => None,
        };

        Ok(UserSettings {
            user_id: row.get("user_id"),
            time_format: time_format.parse::<TimeFormat>()?,
            accent,
            updated_at: row.get("updated_at"),
        })
    }

    async fn update(&self, user_id: Uuid, req: UpdateSettingsRequest) -> Result<UserSettings> {
        let settings = merge(self.get(user_id).await?, &req)?;

        sqlx::query(
            r#"
            INSERT INTO user_settings
                (user_id, time_format, accent_lightness, accent_chroma, accent_hue, updated_at)
            VALUES ($1, $2, $3, $4, $5, now())
            ON CONFLICT (user_id) DO UPDATE SET
                time_format = EXCLUDED.time_format,
                accent_lightness = EXCLUDED.accent_lightness,
                accent_chroma = EXCLUDED.accent_chroma,
                accent_hue = EXCLUDED.accent_hue,
                updated_at = now()
            "#,
        )
        .bind(user_id)
        .bind(settings.time_format.as_str())
        .bind(settings.accent.map(|a| a.lightness))
        .bind(settings.accent.map(|a| a.chroma))
        .bind(settings.accent.map(|a| a.hue))
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        self.get(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accent() -> AccentColor {
        AccentColor {
            lightness: 0.65,
            chroma: 0.2,
            hue: 140.0,
        }
    }

    #[test]
    fn merge_keeps_unspecified_fields() {
        let mut current = UserSettings::defaults_for(Uuid::nil());
        current.accent = Some(accent());

        let merged = merge(
            current,
            &UpdateSettingsRequest {
                time_format: Some(TimeFormat::TwelveHour),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(merged.time_format, TimeFormat::TwelveHour);
        assert_eq!(merged.accent, Some(accent()));
    }

    #[test]
    fn clear_accent_wins_over_new_accent() {
        let merged = merge(
            UserSettings::defaults_for(Uuid::nil()),
            &UpdateSettingsRequest {
                accent: Some(accent()),
                clear_accent: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(merged.accent.is_none());
    }

    #[test]
    fn out_of_range_accent_is_rejected() {
        let result = merge(
            UserSettings::defaults_for(Uuid::nil()),
            &UpdateSettingsRequest {
                accent: Some(AccentColor {
                    chroma: 0.9,
                    ..accent()
                }),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
