//! Key vault persistence on the `keys` table.

use async_trait::async_trait;
use bshop_core::ContentId;
use bshop_crypto::KeyAlgorithm;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::vault::{ContentKeyRecord, KeyVault, VaultError};

// Key fields keep their camelCase column names so rows written by earlier
// deployments stay readable.
const SELECT_KEY: &str =
    r#"SELECT cid, alg, "ivB64", "keyB64", "createdAt" FROM keys WHERE cid = $1"#;

const UPSERT_KEY: &str = r#"INSERT INTO keys (cid, alg, "ivB64", "keyB64", "createdAt")
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT (cid) DO UPDATE SET
        alg = EXCLUDED.alg,
        "ivB64" = EXCLUDED."ivB64",
        "keyB64" = EXCLUDED."keyB64",
        "createdAt" = EXCLUDED."createdAt""#;

/// Postgres-backed [`KeyVault`].
#[derive(Debug, Clone)]
pub struct PgKeyVault {
    pool: PgPool,
}

impl PgKeyVault {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeyVault for PgKeyVault {
    async fn lookup(&self, cid: &ContentId) -> Result<Option<ContentKeyRecord>, VaultError> {
        let row = sqlx::query_as::<_, KeyRow>(SELECT_KEY)
            .bind(cid.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(KeyRow::into_record).transpose()
    }

    async fn store(&self, record: ContentKeyRecord) -> Result<(), VaultError> {
        sqlx::query(UPSERT_KEY)
            .bind(record.content_id.as_str())
            .bind(record.algorithm.as_str())
            .bind(&record.iv_b64)
            .bind(&record.key_b64)
            .bind(record.created_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), VaultError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct KeyRow {
    cid: String,
    alg: String,
    #[sqlx(rename = "ivB64")]
    iv_b64: String,
    #[sqlx(rename = "keyB64")]
    key_b64: String,
    #[sqlx(rename = "createdAt")]
    created_at: DateTime<Utc>,
}

impl KeyRow {
    fn into_record(self) -> Result<ContentKeyRecord, VaultError> {
        let content_id = ContentId::new(&self.cid).map_err(|e| VaultError::Corrupt {
            cid: self.cid.clone(),
            reason: e.to_string(),
        })?;
        Ok(ContentKeyRecord {
            content_id,
            algorithm: KeyAlgorithm::parse(&self.alg),
            key_b64: self.key_b64,
            iv_b64: self.iv_b64,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cid: &str, alg: &str) -> KeyRow {
        KeyRow {
            cid: cid.into(),
            alg: alg.into(),
            iv_b64: "AAAAAAAAAAAAAAAA".into(),
            key_b64: "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn row_maps_to_record() {
        let record = row("Qm123", "aes-256-gcm").into_record().unwrap();
        assert_eq!(record.content_id.as_str(), "Qm123");
        assert_eq!(record.algorithm, KeyAlgorithm::Aes256Gcm);
    }

    #[test]
    fn legacy_uppercase_tag_is_recognized() {
        let record = row("Qm123", "AES-256-GCM").into_record().unwrap();
        assert_eq!(record.algorithm, KeyAlgorithm::Aes256Gcm);
    }

    const KEY_COLUMNS: [&str; 5] = ["cid", "alg", "ivB64", "keyB64", "createdAt"];

    #[test]
    fn queries_and_migration_use_stored_column_names() {
        let migration = include_str!("../../migrations/0001_create_keys.sql");
        for column in KEY_COLUMNS {
            let quoted = format!("\"{column}\"");
            let needle = if column.chars().any(|c| c.is_ascii_uppercase()) {
                quoted.as_str()
            } else {
                column
            };
            assert!(migration.contains(needle), "migration lacks {needle}");
            assert!(SELECT_KEY.contains(needle), "select lacks {needle}");
            assert!(UPSERT_KEY.contains(needle), "upsert lacks {needle}");
        }
        assert!(!migration.contains("iv_b64"));
    }

    #[test]
    fn invalid_cid_is_corrupt() {
        assert!(matches!(
            row("not/a/cid", "aes-256-gcm").into_record(),
            Err(VaultError::Corrupt { .. })
        ));
    }
}
