//! Pet profile storage. All mutations are owner-scoped.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct PetStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: i64,
    pub account_id: i64,
    pub name: String,
    pub breed: Option<String>,
    pub age: Option<i64>,
    pub birth: Option<String>,
    pub created_at: String,
}

#[derive(sqlx::FromRow)]
struct PetRow {
    id: i64,
    account_id: i64,
    name: String,
    breed: Option<String>,
    age: Option<i64>,
    birth: Option<String>,
    created_at: String,
}

impl From<PetRow> for Pet {
    fn from(row: PetRow) -> Self {
        Self {
            id: row.id,
            account_id: row.account_id,
            name: row.name,
            breed: row.breed,
            age: row.age,
            birth: row.birth,
            created_at: row.created_at,
        }
    }
}

const SELECT_PET: &str =
    "SELECT id, account_id, name, breed, age, birth, created_at FROM pets";

impl PetStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a new pet. Returns the pet id.
    pub async fn create(
        &self,
        account_id: i64,
        name: &str,
        breed: Option<&str>,
        age: Option<i64>,
        birth: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO pets (account_id, name, breed, age, birth) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(account_id)
        .bind(name)
        .bind(breed)
        .bind(age)
        .bind(birth)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a pet by id.
    pub async fn get(&self, id: i64) -> Result<Option<Pet>, sqlx::Error> {
        let row: Option<PetRow> = sqlx::query_as(&format!("{} WHERE id = ?", SELECT_PET))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Pet::from))
    }

    /// List all pets owned by an account, oldest first.
    pub async fn list_by_account(&self, account_id: i64) -> Result<Vec<Pet>, sqlx::Error> {
        let rows: Vec<PetRow> =
            sqlx::query_as(&format!("{} WHERE account_id = ? ORDER BY id", SELECT_PET))
                .bind(account_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Pet::from).collect())
    }

    /// Update a pet owned by the given account. Returns false when the pet
    /// does not exist or belongs to someone else.
    pub async fn update(
        &self,
        account_id: i64,
        pet_id: i64,
        name: &str,
        breed: Option<&str>,
        age: Option<i64>,
        birth: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE pets SET name = ?, breed = ?, age = ?, birth = ? \
             WHERE id = ? AND account_id = ?",
        )
        .bind(name)
        .bind(breed)
        .bind(age)
        .bind(birth)
        .bind(pet_id)
        .bind(account_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a pet owned by the given account.
    pub async fn delete(&self, account_id: i64, pet_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM pets WHERE id = ? AND account_id = ?")
            .bind(pet_id)
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
