use super::{is_unique_violation, Database, DbError};
use crate::models::{NewUser, User};
use jobclock_common::domain::Favorite;
use time::OffsetDateTime;
use uuid::Uuid;

/// Input for the favorites upsert; timestamps are assigned here.
#[derive(Debug, Clone)]
pub struct NewFavorite {
    pub job_no: String,
    pub job_name: String,
    pub acc_no: Option<String>,
    pub acc_name: Option<String>,
}

impl Database {
    pub async fn add_user(&self, user: NewUser) -> Result<User, DbError> {
        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc().unix_timestamp();

        sqlx::query(
            r#"
            insert into users(id, emp_code, emp_name, password, verified, favorites, created, updated)
            values(?1, ?2, ?3, ?4, 0, '[]', ?5, ?5)
            "#,
        )
        .bind(id.to_string())
        .bind(user.emp_code.as_str())
        .bind(user.emp_name.as_deref())
        .bind(user.password.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                DbError::Conflict("An account with this employee code already exists".to_string())
            } else {
                err.into()
            }
        })?;

        self.user(&user.emp_code).await
    }

    pub async fn user(&self, emp_code: &str) -> Result<User, DbError> {
        let user: User = sqlx::query_as("select * from users where emp_code = ?1")
            .bind(emp_code)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    /// Administrative action: make the account eligible for login.
    pub async fn verify_user(&self, emp_code: &str) -> Result<(), DbError> {
        let res = sqlx::query("update users set verified = 1, updated = ?2 where emp_code = ?1")
            .bind(emp_code)
            .bind(OffsetDateTime::now_utc().unix_timestamp())
            .execute(&self.pool)
            .await?;

        if res.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    pub async fn update_password(&self, emp_code: &str, password_hash: &str) -> Result<(), DbError> {
        let res = sqlx::query("update users set password = ?2, updated = ?3 where emp_code = ?1")
            .bind(emp_code)
            .bind(password_hash)
            .bind(OffsetDateTime::now_utc().unix_timestamp())
            .execute(&self.pool)
            .await?;

        if res.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    pub async fn delete_user(&self, emp_code: &str) -> Result<(), DbError> {
        let res = sqlx::query("delete from users where emp_code = ?1")
            .bind(emp_code)
            .execute(&self.pool)
            .await?;

        if res.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    pub async fn favorites(&self, emp_code: &str) -> Result<Vec<Favorite>, DbError> {
        Ok(self.user(emp_code).await?.favorites)
    }

    async fn write_favorites(
        &self,
        emp_code: &str,
        favorites: &[Favorite],
    ) -> Result<(), DbError> {
        let json = serde_json::to_string(favorites).map_err(|e| DbError::Other(e.into()))?;
        let res = sqlx::query("update users set favorites = ?2, updated = ?3 where emp_code = ?1")
            .bind(emp_code)
            .bind(json)
            .bind(OffsetDateTime::now_utc().unix_timestamp())
            .execute(&self.pool)
            .await?;

        if res.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    /// Upsert keyed by job_no: a repeat add overwrites the account pairing
    /// and stamps updated_at; a first add stamps added_at.
    pub async fn add_favorite(
        &self,
        emp_code: &str,
        fav: NewFavorite,
    ) -> Result<Vec<Favorite>, DbError> {
        let mut favorites = self.favorites(emp_code).await?;
        let now = OffsetDateTime::now_utc();

        match favorites.iter_mut().find(|f| f.job_no == fav.job_no) {
            Some(existing) => {
                existing.job_name = fav.job_name;
                existing.acc_no = fav.acc_no;
                existing.acc_name = fav.acc_name;
                existing.updated_at = Some(now);
            }
            None => favorites.push(Favorite {
                job_no: fav.job_no,
                job_name: fav.job_name,
                acc_no: fav.acc_no,
                acc_name: fav.acc_name,
                added_at: Some(now),
                updated_at: None,
            }),
        }

        self.write_favorites(emp_code, &favorites).await?;
        Ok(favorites)
    }

    pub async fn remove_favorite(
        &self,
        emp_code: &str,
        job_no: &str,
    ) -> Result<Vec<Favorite>, DbError> {
        let mut favorites = self.favorites(emp_code).await?;
        favorites.retain(|f| f.job_no != job_no);
        self.write_favorites(emp_code, &favorites).await?;
        Ok(favorites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        Database::new("sqlite::memory:").await.unwrap()
    }

    fn new_user(emp_code: &str) -> NewUser {
        NewUser {
            emp_code: emp_code.to_string(),
            emp_name: Some("Test User".to_string()),
            password: "$argon2id$fake".to_string(),
        }
    }

    #[tokio::test]
    async fn duplicate_emp_code_is_a_domain_conflict() {
        let db = test_db().await;
        db.add_user(new_user("E1")).await.unwrap();

        let err = db.add_user(new_user("E1")).await.unwrap_err();
        match err {
            DbError::Conflict(msg) => assert!(msg.contains("already exists")),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn users_start_unverified() {
        let db = test_db().await;
        let user = db.add_user(new_user("E1")).await.unwrap();
        assert!(!user.verified);

        db.verify_user("E1").await.unwrap();
        assert!(db.user("E1").await.unwrap().verified);

        let err = db.verify_user("nobody").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[tokio::test]
    async fn favorite_add_is_an_upsert_by_job_no() {
        let db = test_db().await;
        db.add_user(new_user("E1")).await.unwrap();

        db.add_favorite(
            "E1",
            NewFavorite {
                job_no: "J1".to_string(),
                job_name: "First".to_string(),
                acc_no: Some("A1".to_string()),
                acc_name: Some("Labour".to_string()),
            },
        )
        .await
        .unwrap();

        let favorites = db
            .add_favorite(
                "E1",
                NewFavorite {
                    job_no: "J1".to_string(),
                    job_name: "First".to_string(),
                    acc_no: Some("A2".to_string()),
                    acc_name: Some("Equipment".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(favorites.len(), 1);
        let fav = &favorites[0];
        assert_eq!(fav.acc_no.as_deref(), Some("A2"));
        assert_eq!(fav.acc_name.as_deref(), Some("Equipment"));
        assert!(fav.added_at.is_some());
        assert!(fav.updated_at.is_some());
    }

    #[tokio::test]
    async fn favorite_remove_and_persistence() {
        let db = test_db().await;
        db.add_user(new_user("E1")).await.unwrap();

        db.add_favorite(
            "E1",
            NewFavorite {
                job_no: "J1".to_string(),
                job_name: "First".to_string(),
                acc_no: None,
                acc_name: None,
            },
        )
        .await
        .unwrap();
        db.add_favorite(
            "E1",
            NewFavorite {
                job_no: "J2".to_string(),
                job_name: "Second".to_string(),
                acc_no: None,
                acc_name: None,
            },
        )
        .await
        .unwrap();

        let favorites = db.remove_favorite("E1", "J1").await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].job_no, "J2");

        // round-trips through the json column
        let reread = db.favorites("E1").await.unwrap();
        assert_eq!(reread.len(), 1);
        assert_eq!(reread[0].job_no, "J2");
    }

    #[tokio::test]
    async fn deleted_user_is_gone() {
        let db = test_db().await;
        db.add_user(new_user("E1")).await.unwrap();
        db.delete_user("E1").await.unwrap();

        let err = db.user("E1").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }
}
