//! Stored personality-test results.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct PersonalityResultStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PersonalityResult {
    pub id: i64,
    pub account_id: i64,
    pub pet_id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub type_code: String,
    pub introversion_extroversion: i64,
    pub dependence_leadership: i64,
    pub rationality_emotionality: i64,
    pub created_at: String,
}

const SELECT_RESULT: &str = "SELECT id, account_id, pet_id, type, introversion_extroversion, \
     dependence_leadership, rationality_emotionality, created_at FROM personality_results";

impl PersonalityResultStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a new result. Returns the result id.
    pub async fn create(
        &self,
        account_id: i64,
        pet_id: i64,
        type_code: &str,
        ie: i64,
        dl: i64,
        re: i64,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO personality_results \
                (account_id, pet_id, type, introversion_extroversion, \
                 dependence_leadership, rationality_emotionality) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(account_id)
        .bind(pet_id)
        .bind(type_code)
        .bind(ie)
        .bind(dl)
        .bind(re)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Overwrite an owned result with retest scores.
    pub async fn update(
        &self,
        account_id: i64,
        id: i64,
        type_code: &str,
        ie: i64,
        dl: i64,
        re: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE personality_results SET \
                type = ?, introversion_extroversion = ?, dependence_leadership = ?, \
                rationality_emotionality = ?, created_at = datetime('now') \
             WHERE id = ? AND account_id = ?",
        )
        .bind(type_code)
        .bind(ie)
        .bind(dl)
        .bind(re)
        .bind(id)
        .bind(account_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get(&self, id: i64) -> Result<Option<PersonalityResult>, sqlx::Error> {
        sqlx::query_as(&format!("{} WHERE id = ?", SELECT_RESULT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// All results belonging to an account, newest first.
    pub async fn list_by_account(
        &self,
        account_id: i64,
    ) -> Result<Vec<PersonalityResult>, sqlx::Error> {
        sqlx::query_as(&format!(
            "{} WHERE account_id = ? ORDER BY created_at DESC, id DESC",
            SELECT_RESULT
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn delete(&self, account_id: i64, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM personality_results WHERE id = ? AND account_id = ?")
            .bind(id)
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
