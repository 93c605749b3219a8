//! Account and profile storage.
//!
//! Accounts are created on first login from a given identity origin and
//! are never deleted by this service. The (email, origin) pair is unique,
//! so one person can hold a native account and a federated account side
//! by side.

use sqlx::sqlite::SqlitePool;
use tracing::error;

#[derive(Clone)]
pub struct AccountStore {
    pool: SqlitePool,
}

/// Identity provider that created an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Native,
    Kakao,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Native => "native",
            Origin::Kakao => "kakao",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "kakao" => Origin::Kakao,
            _ => Origin::Native,
        }
    }
}

/// Account role for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub origin: Origin,
    pub role: Role,
    pub gender: Option<String>,
    pub age_range: Option<String>,
    pub birthday: Option<String>,
    pub created_at: String,
    pub nickname: String,
    pub image_url: Option<String>,
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    email: String,
    origin: String,
    role: String,
    gender: Option<String>,
    age_range: Option<String>,
    birthday: Option<String>,
    created_at: String,
    nickname: String,
    image_url: Option<String>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            origin: Origin::from_str(&row.origin),
            role: Role::from_str(&row.role),
            gender: row.gender,
            age_range: row.age_range,
            birthday: row.birthday,
            created_at: row.created_at,
            nickname: row.nickname,
            image_url: row.image_url,
        }
    }
}

/// Input for resolving or creating an account.
#[derive(Debug, Clone)]
pub struct NewAccount<'a> {
    pub email: &'a str,
    pub origin: Origin,
    pub role: Role,
    pub nickname: &'a str,
    pub gender: Option<&'a str>,
    pub age_range: Option<&'a str>,
    pub birthday: Option<&'a str>,
}

/// Errors from account resolution.
#[derive(Debug)]
pub enum ResolveError {
    /// The account row was created but its companion profile could not be;
    /// both inserts were rolled back together.
    Provisioning,
    Database(sqlx::Error),
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::Provisioning => write!(f, "Failed to provision account with profile"),
            ResolveError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for ResolveError {}

impl From<sqlx::Error> for ResolveError {
    fn from(e: sqlx::Error) -> Self {
        ResolveError::Database(e)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(e) if e.is_unique_violation())
}

const SELECT_ACCOUNT: &str = "SELECT a.id, a.email, a.origin, a.role, a.gender, a.age_range, \
     a.birthday, a.created_at, p.nickname, p.image_url \
     FROM accounts a JOIN profiles p ON p.account_id = a.id";

impl AccountStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Look up an account by (email, origin).
    pub async fn get_by_email_origin(
        &self,
        email: &str,
        origin: Origin,
    ) -> Result<Option<Account>, sqlx::Error> {
        let row: Option<AccountRow> =
            sqlx::query_as(&format!("{} WHERE a.email = ? AND a.origin = ?", SELECT_ACCOUNT))
                .bind(email)
                .bind(origin.as_str())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Account::from))
    }

    /// Get an account by id.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Account>, sqlx::Error> {
        let row: Option<AccountRow> =
            sqlx::query_as(&format!("{} WHERE a.id = ?", SELECT_ACCOUNT))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Account::from))
    }

    /// Resolve an external identity to a local account, creating the
    /// account and its companion profile together on first sight.
    ///
    /// Idempotent under concurrency: the insert relies on the
    /// UNIQUE(email, origin) constraint and re-reads the winner's row when
    /// it loses the race.
    pub async fn resolve_or_create(&self, new: &NewAccount<'_>) -> Result<Account, ResolveError> {
        if let Some(account) = self.get_by_email_origin(new.email, new.origin).await? {
            return Ok(account);
        }

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO accounts (email, origin, role, gender, age_range, birthday) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(new.email)
        .bind(new.origin.as_str())
        .bind(new.role.as_str())
        .bind(new.gender)
        .bind(new.age_range)
        .bind(new.birthday)
        .execute(&mut *tx)
        .await;

        let account_id = match inserted {
            Ok(result) => result.last_insert_rowid(),
            Err(e) if is_unique_violation(&e) => {
                // Lost the creation race; the winner's row is authoritative.
                drop(tx);
                return self
                    .get_by_email_origin(new.email, new.origin)
                    .await?
                    .ok_or(ResolveError::Database(sqlx::Error::RowNotFound));
            }
            Err(e) => return Err(ResolveError::Database(e)),
        };

        let profile = sqlx::query("INSERT INTO profiles (account_id, nickname) VALUES (?, ?)")
            .bind(account_id)
            .bind(new.nickname)
            .execute(&mut *tx)
            .await;

        if let Err(e) = profile {
            error!(error = %e, email = %new.email, "Profile creation failed, rolling back account");
            tx.rollback().await.ok();
            return Err(ResolveError::Provisioning);
        }

        tx.commit().await?;

        self.get_by_id(account_id)
            .await?
            .ok_or(ResolveError::Database(sqlx::Error::RowNotFound))
    }

    /// Update the profile nickname. Returns false if the account has no profile.
    pub async fn update_nickname(&self, account_id: i64, nickname: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE profiles SET nickname = ? WHERE account_id = ?")
            .bind(nickname)
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set or clear the profile image URL.
    pub async fn update_image_url(
        &self,
        account_id: i64,
        image_url: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE profiles SET image_url = ? WHERE account_id = ?")
            .bind(image_url)
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
