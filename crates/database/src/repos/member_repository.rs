//! Member repository for database operations.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool};
use tracing::debug;

use roster_members::{
    MemberFilter, MemberId, MemberPatch, MemberRecord, MemberStore, Money, NewMember, StoreError,
    StoreResult,
};

const MEMBER_COLUMNS: &str = "id, first_name, middle_name, last_name, email, phone_number, \
     date_of_birth, status, positions, member_groups, mentor_id, mentees, balance_cents, \
     total_donation_cents, settings, metadata, join_date, last_login, created_at, updated_at, \
     json_extract(authentication, '$.lockUntil') AS lock_until";

// Column order matches `bind_member`; the id always comes last.
const INSERT_MEMBER: &str = "INSERT INTO members (first_name, middle_name, last_name, email, \
     phone_number, date_of_birth, status, positions, member_groups, mentor_id, mentees, \
     balance_cents, total_donation_cents, authentication, settings, metadata, join_date, \
     last_login, created_at, updated_at, id) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

const UPDATE_MEMBER: &str = "UPDATE members SET first_name = ?, middle_name = ?, last_name = ?, \
     email = ?, phone_number = ?, date_of_birth = ?, status = ?, positions = ?, \
     member_groups = ?, mentor_id = ?, mentees = ?, balance_cents = ?, \
     total_donation_cents = ?, authentication = ?, settings = ?, metadata = ?, join_date = ?, \
     last_login = ?, created_at = ?, updated_at = ? WHERE id = ?";

/// Repository for member database operations
#[derive(Clone)]
pub struct SqliteMemberStore {
    pool: SqlitePool,
}

impl SqliteMemberStore {
    /// Create a new member repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch(&self, id: &MemberId, with_authentication: bool) -> StoreResult<Option<MemberRecord>> {
        let sql = format!("{} WHERE id = ?", select_members(with_authentication));
        let row = sqlx::query(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        row.map(|row| member_from_row(&row, with_authentication))
            .transpose()
    }
}

impl MemberStore for SqliteMemberStore {
    async fn find_by_id(&self, id: &MemberId) -> StoreResult<Option<MemberRecord>> {
        self.fetch(id, false).await
    }

    async fn find_by_id_with_authentication(&self, id: &MemberId) -> StoreResult<Option<MemberRecord>> {
        self.fetch(id, true).await
    }

    async fn find_all(&self, filter: &MemberFilter) -> StoreResult<Vec<MemberRecord>> {
        let sql = format!(
            "{} WHERE (?1 IS NULL OR lower(status) = lower(?1)) \
             AND (?2 IS NULL OR EXISTS (SELECT 1 FROM json_each(members.positions) WHERE json_each.value = ?2)) \
             AND (?3 IS NULL OR EXISTS (SELECT 1 FROM json_each(members.member_groups) WHERE json_each.value = ?3)) \
             ORDER BY rowid",
            select_members(false)
        );

        let rows = sqlx::query(&sql)
            .bind(filter.status.as_deref())
            .bind(filter.position.as_deref())
            .bind(filter.group.as_deref())
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        rows.iter().map(|row| member_from_row(row, false)).collect()
    }

    async fn insert(&self, member: NewMember) -> StoreResult<MemberRecord> {
        let record = member.into_record(MemberId::generate(), Utc::now());

        bind_member(sqlx::query(INSERT_MEMBER), &record)?
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        debug!(member_id = %record.id, "inserted member row");
        Ok(record.without_authentication())
    }

    async fn update(&self, id: &MemberId, patch: MemberPatch) -> StoreResult<MemberRecord> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let sql = format!("{} WHERE id = ?", select_members(true));
        let row = sqlx::query(&sql)
            .bind(id.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(store_error)?
            .ok_or(StoreError::NotFound)?;

        let mut record = member_from_row(&row, true)?;
        patch
            .apply_to(&mut record)
            .map_err(|error| StoreError::Backend(format!("failed to apply member patch: {error}")))?;
        record.updated_at = Utc::now();

        bind_member(sqlx::query(UPDATE_MEMBER), &record)?
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;
        tx.commit().await.map_err(store_error)?;

        debug!(member_id = %record.id, fields = patch.fields().len(), "updated member row");
        Ok(record.without_authentication())
    }

    async fn delete(&self, id: &MemberId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM members WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

fn select_members(with_authentication: bool) -> String {
    if with_authentication {
        format!("SELECT {MEMBER_COLUMNS}, authentication FROM members")
    } else {
        format!("SELECT {MEMBER_COLUMNS} FROM members")
    }
}

fn bind_member<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    record: &'q MemberRecord,
) -> StoreResult<Query<'q, Sqlite, SqliteArguments<'q>>> {
    let authentication = record
        .authentication
        .as_ref()
        .ok_or_else(|| StoreError::Backend("member written without authentication".to_string()))?;

    Ok(query
        .bind(record.first_name.as_str())
        .bind(record.middle_name.as_deref())
        .bind(record.last_name.as_str())
        .bind(record.email.as_str())
        .bind(record.phone_number.as_deref())
        .bind(record.date_of_birth)
        .bind(record.status.as_str())
        .bind(to_json(&record.positions)?)
        .bind(to_json(&record.groups)?)
        .bind(record.mentor.as_ref().map(MemberId::as_str))
        .bind(to_json(&record.mentees)?)
        .bind(record.balance.cents())
        .bind(record.total_donation.cents())
        .bind(to_json(authentication)?)
        .bind(to_json(&record.settings)?)
        .bind(to_json(&record.metadata)?)
        .bind(record.join_date)
        .bind(record.last_login)
        .bind(record.created_at)
        .bind(record.updated_at)
        .bind(record.id.as_str()))
}

fn member_from_row(row: &SqliteRow, with_authentication: bool) -> StoreResult<MemberRecord> {
    let (authentication, lock_until) = if with_authentication {
        (Some(json_column(row, "authentication")?), None)
    } else {
        (None, instant_column(row, "lock_until")?)
    };

    let mentor = column::<Option<String>>(row, "mentor_id")?
        .map(|raw| MemberId::parse(&raw))
        .transpose()
        .map_err(|error| StoreError::Backend(error.to_string()))?;

    Ok(MemberRecord {
        id: MemberId::parse(&column::<String>(row, "id")?)
            .map_err(|error| StoreError::Backend(error.to_string()))?,
        first_name: column(row, "first_name")?,
        middle_name: column(row, "middle_name")?,
        last_name: column(row, "last_name")?,
        email: column(row, "email")?,
        phone_number: column(row, "phone_number")?,
        date_of_birth: column::<Option<DateTime<Utc>>>(row, "date_of_birth")?,
        status: column(row, "status")?,
        positions: json_column(row, "positions")?,
        groups: json_column(row, "member_groups")?,
        mentor,
        mentees: json_column(row, "mentees")?,
        join_date: column(row, "join_date")?,
        last_login: column(row, "last_login")?,
        balance: Money::from_cents(column(row, "balance_cents")?),
        total_donation: Money::from_cents(column(row, "total_donation_cents")?),
        authentication,
        lock_until,
        settings: json_column(row, "settings")?,
        metadata: json_column(row, "metadata")?,
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
    })
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(name).map_err(store_error)
}

fn json_column<T: DeserializeOwned>(row: &SqliteRow, name: &str) -> StoreResult<T> {
    let raw: String = column(row, name)?;
    serde_json::from_str(&raw)
        .map_err(|error| StoreError::Backend(format!("corrupt {name} column: {error}")))
}

/// An RFC 3339 instant extracted from a JSON column.
fn instant_column(row: &SqliteRow, name: &str) -> StoreResult<Option<DateTime<Utc>>> {
    column::<Option<String>>(row, name)?
        .map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|instant| instant.with_timezone(&Utc))
                .map_err(|error| StoreError::Backend(format!("corrupt {name} value: {error}")))
        })
        .transpose()
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> StoreResult<String> {
    serde_json::to_string(value).map_err(|error| StoreError::Backend(error.to_string()))
}

fn store_error(error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.is_unique_violation() {
            let field = if db_error.message().contains("members.email") {
                "email"
            } else {
                "id"
            };
            return StoreError::DuplicateKey {
                field: field.to_string(),
            };
        }
    }
    StoreError::Backend(error.to_string())
}
