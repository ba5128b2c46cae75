use chrono::{DateTime, Utc};
use sqlx::Row;

use roster_core::domain::user::{NewUser, User, UserId, UserPatch};

use super::{RepositoryError, UserRepository};
use crate::DbPool;

const USER_COLUMNS: &str = "id, name, email, age, phone_number, address, role, is_active,
                            last_login, created_at, updated_at";

pub struct SqlUserRepository {
    pool: DbPool,
}

impl SqlUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode<T>(result: Result<T, sqlx::Error>) -> Result<T, RepositoryError> {
    result.map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn parse_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User, RepositoryError> {
    let id: i64 = decode(row.try_get("id"))?;
    let age: Option<i64> = decode(row.try_get("age"))?;
    let age = age
        .map(u32::try_from)
        .transpose()
        .map_err(|e| RepositoryError::Decode(format!("age: {e}")))?;
    let last_login: Option<String> = decode(row.try_get("last_login"))?;
    let created_at: String = decode(row.try_get("created_at"))?;
    let updated_at: String = decode(row.try_get("updated_at"))?;

    Ok(User {
        id: UserId(id),
        name: decode(row.try_get("name"))?,
        email: decode(row.try_get("email"))?,
        age,
        phone_number: decode(row.try_get("phone_number"))?,
        address: decode(row.try_get("address"))?,
        role: decode(row.try_get("role"))?,
        is_active: decode(row.try_get("is_active"))?,
        last_login: last_login.map(|raw| parse_timestamp("last_login", &raw)).transpose()?,
        created_at: parse_timestamp("created_at", &created_at)?,
        updated_at: parse_timestamp("updated_at", &updated_at)?,
    })
}

fn map_write_error(error: sqlx::Error, email: Option<&str>) -> RepositoryError {
    let unique_violation = error
        .as_database_error()
        .map(|db_error| db_error.is_unique_violation())
        .unwrap_or(false);

    match (unique_violation, email) {
        (true, Some(email)) => {
            RepositoryError::Conflict { entity: "user", key: format!("email {email}") }
        }
        _ => RepositoryError::Database(error),
    }
}

#[async_trait::async_trait]
impl UserRepository for SqlUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let now = Utc::now().to_rfc3339();
        let sql = format!(
            "INSERT INTO users (name, email, age, phone_number, address, role, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {USER_COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.age.map(i64::from))
            .bind(&user.phone_number)
            .bind(&user.address)
            .bind(&user.role)
            .bind(&now)
            .bind(&now)
            .fetch_one(&self.pool)
            .await
            .map_err(|error| map_write_error(error, Some(&user.email)))?;

        row_to_user(&row)
    }

    async fn find_by_id(&self, id: UserId) -> Result<User, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let row = sqlx::query(&sql).bind(id.0).fetch_optional(&self.pool).await?;

        match row {
            Some(ref r) => row_to_user(r),
            None => Err(RepositoryError::user_not_found_by_id(id)),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<User, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        let row = sqlx::query(&sql).bind(email).fetch_optional(&self.pool).await?;

        match row {
            Some(ref r) => row_to_user(r),
            None => Err(RepositoryError::user_not_found_by_email(email)),
        }
    }

    async fn update(&self, id: UserId, patch: UserPatch) -> Result<User, RepositoryError> {
        let sql = format!(
            "UPDATE users
             SET name = COALESCE(?, name),
                 email = COALESCE(?, email),
                 updated_at = ?
             WHERE id = ?
             RETURNING {USER_COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(&patch.name)
            .bind(&patch.email)
            .bind(Utc::now().to_rfc3339())
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| map_write_error(error, patch.email.as_deref()))?;

        match row {
            Some(ref r) => row_to_user(r),
            None => Err(RepositoryError::user_not_found_by_id(id)),
        }
    }

    async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM users WHERE id = ?").bind(id.0).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::user_not_found_by_id(id));
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(row_to_user).collect()
    }
}

#[cfg(test)]
mod tests {
    use roster_core::domain::user::{NewUser, UserId, UserPatch};

    use super::SqlUserRepository;
    use crate::repositories::{RepositoryError, UserRepository};
    use crate::{connect_with_settings, migrations};

    async fn repository() -> SqlUserRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        SqlUserRepository::new(pool)
    }

    fn jane() -> NewUser {
        NewUser {
            age: Some(30),
            phone_number: Some("+1-555-0100".to_string()),
            role: Some("admin".to_string()),
            ..NewUser::new("Jane Doe", "jane@x.com")
        }
    }

    #[tokio::test]
    async fn create_assigns_ids_from_one_and_round_trips_fields() {
        let repo = repository().await;

        let created = repo.create(jane()).await.expect("create");
        assert_eq!(created.id, UserId(1));
        assert_eq!(created.name, "Jane Doe");
        assert_eq!(created.age, Some(30));
        assert_eq!(created.phone_number.as_deref(), Some("+1-555-0100"));
        assert_eq!(created.address, None);
        assert!(created.is_active);

        let found = repo.find_by_id(created.id).await.expect("find by id");
        assert_eq!(found, created);

        let by_email = repo.find_by_email("jane@x.com").await.expect("find by email");
        assert_eq!(by_email.id, created.id);
    }

    #[tokio::test]
    async fn missing_rows_report_not_found() {
        let repo = repository().await;

        assert!(repo.find_by_id(UserId(7)).await.expect_err("no row").is_not_found());
        assert!(repo.find_by_email("ghost@x.com").await.expect_err("no row").is_not_found());
        assert!(repo.delete(UserId(7)).await.expect_err("no row").is_not_found());
        assert!(repo
            .update(UserId(7), UserPatch::default())
            .await
            .expect_err("no row")
            .is_not_found());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let repo = repository().await;
        repo.create(jane()).await.expect("first create");

        let error = repo.create(jane()).await.expect_err("duplicate email");
        assert!(matches!(error, RepositoryError::Conflict { .. }));
    }

    #[tokio::test]
    async fn update_keeps_fields_absent_from_patch() {
        let repo = repository().await;
        let created = repo.create(jane()).await.expect("create");

        let updated = repo
            .update(
                created.id,
                UserPatch { name: None, email: Some("jane.doe@x.com".to_string()) },
            )
            .await
            .expect("update");

        assert_eq!(updated.name, "Jane Doe");
        assert_eq!(updated.email, "jane.doe@x.com");
        assert_eq!(updated.age, Some(30));
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn empty_patch_is_a_no_op_write() {
        let repo = repository().await;
        let created = repo.create(jane()).await.expect("create");

        let updated = repo.update(created.id, UserPatch::default()).await.expect("update");

        assert_eq!(updated.name, created.name);
        assert_eq!(updated.email, created.email);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn delete_removes_row_and_list_is_ordered_by_id() {
        let repo = repository().await;
        let first = repo.create(jane()).await.expect("create first");
        let second =
            repo.create(NewUser::new("Bob", "bob@y.com")).await.expect("create second");

        let listed = repo.list().await.expect("list");
        assert_eq!(listed.iter().map(|user| user.id).collect::<Vec<_>>(), vec![first.id, second.id]);

        repo.delete(first.id).await.expect("delete");
        let listed = repo.list().await.expect("list after delete");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].email, "bob@y.com");
    }
}
