use super::model::{
    AdminRecord, EventSummary, EventTrainerLink, EventWithTrainers, NewInvoice, ReviewWithSummary,
    UserSummary,
};
use crate::model::{Event, EventReview, Invoice, InvoiceStatus, ReviewStatus, User};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{instrument, warn};

pub type Pool = SqlitePool;

const EVENT_COLUMNS: &str = "e.id, e.title, e.description, e.category, e.event_date, e.price, \
     e.registration_deadline, e.location, e.created_at";

const REVIEW_WITH_SUMMARY_SELECT: &str = "SELECT r.id, r.rating, r.comment, r.status, r.user_id, \
     r.event_id, r.created_at, u.name AS user_name, u.email AS user_email, e.title AS event_title \
     FROM event_reviews r \
     JOIN users u ON u.id = r.user_id \
     JOIN events e ON e.id = r.event_id";

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let options = SqliteConnectOptions::from_str(&normalized)
        .with_context(|| format!("invalid database url: {normalized}"))?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    // Enable WAL and stricter durability.
    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous=FULL;")
        .execute(&pool)
        .await?;
    Ok(pool)
}

/// If using a file-backed SQLite URL, expand a leading `~/` and ensure the parent
/// directory exists. Leaves in-memory URLs untouched. Returns possibly-updated URL.
fn prepare_sqlite_url(url: &str) -> String {
    if !url.starts_with("sqlite:") || url.starts_with("sqlite::memory") {
        return url.to_string();
    }

    let rest = &url["sqlite:".len()..];
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);

    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };

    if path_part.is_empty() {
        return url.to_string();
    }

    let expanded_path = match (path_part.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => path_part.to_string(),
    };

    if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                warn!(?err, dir = %parent.display(), "failed to create database directory");
            }
        }
    }

    let mut rebuilt = String::from("sqlite://");
    rebuilt.push_str(&expanded_path);
    if let Some(q) = query_part {
        rebuilt.push('?');
        rebuilt.push_str(q);
    }
    rebuilt
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[instrument(skip_all)]
pub async fn find_user_by_mobile(pool: &Pool, mobile_number: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, mobile_number, address_line1, city, state, pincode, referred_by, created_at \
         FROM users WHERE mobile_number = ?",
    )
    .bind(mobile_number)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

#[instrument(skip_all)]
pub async fn find_event(pool: &Pool, event_id: i64) -> Result<Option<Event>> {
    let event = sqlx::query_as::<_, Event>(&format!(
        "SELECT {EVENT_COLUMNS} FROM events e WHERE e.id = ?"
    ))
    .bind(event_id)
    .fetch_optional(pool)
    .await?;
    Ok(event)
}

/// Events of `category` that start after `now` and still accept registrations,
/// soonest first, each with its trainer join rows.
#[instrument(skip_all, fields(category = %category))]
pub async fn upcoming_events_by_category(
    pool: &Pool,
    category: &str,
    now: DateTime<Utc>,
) -> Result<Vec<EventWithTrainers>> {
    let events = sqlx::query_as::<_, Event>(&format!(
        "SELECT {EVENT_COLUMNS} FROM events e \
         WHERE e.category = ? \
           AND datetime(e.event_date) > datetime(?) \
           AND (e.registration_deadline IS NULL OR datetime(e.registration_deadline) > datetime(?)) \
         ORDER BY datetime(e.event_date) ASC"
    ))
    .bind(category)
    .bind(now)
    .bind(now)
    .fetch_all(pool)
    .await?;

    let links = sqlx::query_as::<_, EventTrainerLink>(
        "SELECT et.event_id, t.name AS trainer_name \
         FROM event_trainers et \
         JOIN trainers t ON t.id = et.trainer_id \
         JOIN events e ON e.id = et.event_id \
         WHERE e.category = ? \
         ORDER BY et.event_id, t.id",
    )
    .bind(category)
    .fetch_all(pool)
    .await?;

    let mut by_event: HashMap<i64, Vec<EventTrainerLink>> = HashMap::new();
    for link in links {
        by_event.entry(link.event_id).or_default().push(link);
    }

    Ok(events
        .into_iter()
        .map(|event| EventWithTrainers {
            trainer_links: by_event.remove(&event.id).unwrap_or_default(),
            event,
        })
        .collect())
}

#[instrument(skip_all)]
pub async fn list_all_reviews(pool: &Pool) -> Result<Vec<ReviewWithSummary>> {
    let rows = sqlx::query(&format!(
        "{REVIEW_WITH_SUMMARY_SELECT} ORDER BY datetime(r.created_at) DESC, r.id DESC"
    ))
    .fetch_all(pool)
    .await?;
    rows.iter().map(review_with_summary_from_row).collect()
}

#[instrument(skip_all, fields(event_id = event_id))]
pub async fn completed_reviews_for_event(
    pool: &Pool,
    event_id: i64,
) -> Result<Vec<ReviewWithSummary>> {
    let rows = sqlx::query(&format!(
        "{REVIEW_WITH_SUMMARY_SELECT} WHERE r.event_id = ? AND r.status = ? \
         ORDER BY datetime(r.created_at) DESC, r.id DESC"
    ))
    .bind(event_id)
    .bind(ReviewStatus::Completed.as_str())
    .fetch_all(pool)
    .await?;
    rows.iter().map(review_with_summary_from_row).collect()
}

fn review_with_summary_from_row(row: &SqliteRow) -> Result<ReviewWithSummary> {
    let review = EventReview {
        id: row.try_get("id")?,
        rating: row.try_get("rating")?,
        comment: row.try_get("comment")?,
        status: row.try_get("status")?,
        user_id: row.try_get("user_id")?,
        event_id: row.try_get("event_id")?,
        created_at: row.try_get("created_at")?,
    };
    Ok(ReviewWithSummary {
        user: UserSummary {
            id: review.user_id,
            name: row.try_get("user_name")?,
            email: row.try_get("user_email")?,
        },
        event: EventSummary {
            id: review.event_id,
            title: row.try_get("event_title")?,
        },
        review,
    })
}

#[instrument(skip_all)]
pub async fn insert_invoice(pool: &Pool, new: &NewInvoice) -> Result<Invoice> {
    let created_at = Utc::now();
    let id: i64 = sqlx::query(
        "INSERT INTO invoices (invoice_id, amount, status, user_id, event_id, gateway_invoice_id, short_url, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(&new.invoice_id)
    .bind(new.amount)
    .bind(InvoiceStatus::Created.as_str())
    .bind(new.user_id)
    .bind(new.event_id)
    .bind(&new.gateway_invoice_id)
    .bind(&new.short_url)
    .bind(created_at)
    .fetch_one(pool)
    .await?
    .get("id");

    Ok(Invoice {
        id,
        invoice_id: new.invoice_id.clone(),
        amount: new.amount,
        status: InvoiceStatus::Created,
        user_id: new.user_id,
        event_id: new.event_id,
        gateway_invoice_id: new.gateway_invoice_id.clone(),
        short_url: new.short_url.clone(),
        created_at,
    })
}

#[instrument(skip_all)]
pub async fn list_invoices(pool: &Pool) -> Result<Vec<Invoice>> {
    let rows = sqlx::query(
        "SELECT id, invoice_id, amount, status, user_id, event_id, gateway_invoice_id, short_url, created_at \
         FROM invoices ORDER BY id ASC",
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let status: String = row.try_get("status")?;
            Ok(Invoice {
                id: row.try_get("id")?,
                invoice_id: row.try_get("invoice_id")?,
                amount: row.try_get("amount")?,
                status: InvoiceStatus::parse_state(&status)
                    .ok_or_else(|| anyhow!("unknown invoice status '{status}'"))?,
                user_id: row.try_get("user_id")?,
                event_id: row.try_get("event_id")?,
                gateway_invoice_id: row.try_get("gateway_invoice_id")?,
                short_url: row.try_get("short_url")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .collect()
}

#[instrument(skip_all)]
pub async fn list_users(pool: &Pool) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        "SELECT id, name, email, mobile_number, address_line1, city, state, pincode, referred_by, created_at \
         FROM users ORDER BY id ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(users)
}

#[instrument(skip_all)]
pub async fn list_events(pool: &Pool) -> Result<Vec<Event>> {
    let events = sqlx::query_as::<_, Event>(&format!(
        "SELECT {EVENT_COLUMNS} FROM events e ORDER BY datetime(e.event_date) ASC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(events)
}

#[instrument(skip_all)]
pub async fn find_admin_by_username(pool: &Pool, username: &str) -> Result<Option<AdminRecord>> {
    let admin = sqlx::query_as::<_, AdminRecord>(
        "SELECT id, username, password_hash, created_at FROM admins WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(admin)
}

#[instrument(skip_all)]
pub async fn insert_admin(pool: &Pool, username: &str, password_hash: &str) -> Result<i64> {
    let rec = sqlx::query("INSERT INTO admins (username, password_hash) VALUES (?, ?) RETURNING id")
        .bind(username)
        .bind(password_hash)
        .fetch_one(pool)
        .await?;
    Ok(rec.get::<i64, _>("id"))
}

#[instrument(skip_all)]
pub async fn insert_admin_session(
    pool: &Pool,
    token: &str,
    admin_id: i64,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query("INSERT INTO admin_sessions (token, admin_id, expires_at) VALUES (?, ?, ?)")
        .bind(token)
        .bind(admin_id)
        .bind(expires_at)
        .execute(pool)
        .await?;
    Ok(())
}

/// Returns the admin id owning `token` if the session has not expired at `now`.
#[instrument(skip_all)]
pub async fn find_live_admin_session(
    pool: &Pool,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<i64>> {
    let admin_id = sqlx::query_scalar::<_, i64>(
        "SELECT admin_id FROM admin_sessions WHERE token = ? AND datetime(expires_at) > datetime(?)",
    )
    .bind(token)
    .bind(now)
    .fetch_optional(pool)
    .await?;
    Ok(admin_id)
}

// Fixture writers. Users, events and reviews are owned by the registration
// flow of the main application; these exist for seeding and tests.

#[instrument(skip_all)]
#[allow(clippy::too_many_arguments)]
pub async fn insert_user(
    pool: &Pool,
    name: &str,
    email: Option<&str>,
    mobile_number: &str,
    address_line1: Option<&str>,
    city: Option<&str>,
    state: Option<&str>,
    pincode: Option<&str>,
    referred_by: Option<&str>,
) -> Result<i64> {
    let rec = sqlx::query(
        "INSERT INTO users (name, email, mobile_number, address_line1, city, state, pincode, referred_by) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(name)
    .bind(email)
    .bind(mobile_number)
    .bind(address_line1)
    .bind(city)
    .bind(state)
    .bind(pincode)
    .bind(referred_by)
    .fetch_one(pool)
    .await?;
    Ok(rec.get::<i64, _>("id"))
}

#[instrument(skip_all)]
pub async fn insert_event(
    pool: &Pool,
    title: &str,
    category: &str,
    event_date: DateTime<Utc>,
    price: f64,
    registration_deadline: Option<DateTime<Utc>>,
) -> Result<i64> {
    let rec = sqlx::query(
        "INSERT INTO events (title, category, event_date, price, registration_deadline, created_at) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(title)
    .bind(category)
    .bind(event_date)
    .bind(price)
    .bind(registration_deadline)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    Ok(rec.get::<i64, _>("id"))
}

#[instrument(skip_all)]
pub async fn assign_trainer(pool: &Pool, event_id: i64, trainer_name: &str) -> Result<i64> {
    let mut tx = pool.begin().await?;
    let trainer_id = match sqlx::query_scalar::<_, i64>("SELECT id FROM trainers WHERE name = ?")
        .bind(trainer_name)
        .fetch_optional(&mut *tx)
        .await?
    {
        Some(id) => id,
        None => sqlx::query("INSERT INTO trainers (name) VALUES (?) RETURNING id")
            .bind(trainer_name)
            .fetch_one(&mut *tx)
            .await?
            .get("id"),
    };
    sqlx::query("INSERT OR IGNORE INTO event_trainers (event_id, trainer_id) VALUES (?, ?)")
        .bind(event_id)
        .bind(trainer_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(trainer_id)
}

#[instrument(skip_all)]
pub async fn insert_review(
    pool: &Pool,
    user_id: i64,
    event_id: i64,
    rating: Option<f64>,
    comment: Option<&str>,
    status: ReviewStatus,
    created_at: DateTime<Utc>,
) -> Result<i64> {
    let rec = sqlx::query(
        "INSERT INTO event_reviews (rating, comment, status, user_id, event_id, created_at) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(rating)
    .bind(comment)
    .bind(status.as_str())
    .bind(user_id)
    .bind(event_id)
    .bind(created_at)
    .fetch_one(pool)
    .await?;
    Ok(rec.get::<i64, _>("id"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn setup_pool() -> Pool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    #[test]
    fn prepare_sqlite_url_leaves_memory_and_other_schemes() {
        assert_eq!(prepare_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            prepare_sqlite_url("postgres://localhost/db"),
            "postgres://localhost/db"
        );
    }

    #[test]
    fn prepare_sqlite_url_keeps_query_string() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("nested").join("app.db");
        let url = format!("sqlite://{}?mode=rwc", path.display());
        assert_eq!(prepare_sqlite_url(&url), url);
        assert!(path.parent().unwrap().exists());
    }

    #[test]
    fn prepare_sqlite_url_survives_uncreatable_parent() {
        let td = tempfile::tempdir().unwrap();
        let blocker = td.path().join("blocker");
        std::fs::write(&blocker, b"not a dir").unwrap();
        let url = format!("sqlite://{}", blocker.join("app.db").display());
        assert_eq!(prepare_sqlite_url(&url), url);
        assert!(blocker.is_file());
    }

    #[tokio::test]
    async fn upcoming_events_groups_trainers_per_event() {
        let pool = setup_pool().await;
        let now = Utc::now();
        let later = insert_event(&pool, "Later", "yoga", now + Duration::days(10), 500.0, None)
            .await
            .unwrap();
        let sooner = insert_event(&pool, "Sooner", "yoga", now + Duration::days(2), 500.0, None)
            .await
            .unwrap();
        assign_trainer(&pool, later, "Asha").await.unwrap();
        assign_trainer(&pool, later, "Ravi").await.unwrap();
        assign_trainer(&pool, sooner, "Asha").await.unwrap();

        let events = upcoming_events_by_category(&pool, "yoga", now).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event.id, sooner);
        assert_eq!(events[0].trainer_links.len(), 1);
        assert_eq!(events[1].event.id, later);
        let names: Vec<_> = events[1]
            .trainer_links
            .iter()
            .map(|l| l.trainer_name.as_str())
            .collect();
        assert_eq!(names, vec!["Asha", "Ravi"]);
    }

    #[tokio::test]
    async fn admin_session_expiry_is_respected() {
        let pool = setup_pool().await;
        let admin_id = insert_admin(&pool, "root", "hash").await.unwrap();
        let now = Utc::now();
        insert_admin_session(&pool, "live", admin_id, now + Duration::hours(1))
            .await
            .unwrap();
        insert_admin_session(&pool, "stale", admin_id, now - Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(
            find_live_admin_session(&pool, "live", now).await.unwrap(),
            Some(admin_id)
        );
        assert!(find_live_admin_session(&pool, "stale", now)
            .await
            .unwrap()
            .is_none());
        assert!(find_live_admin_session(&pool, "missing", now)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn insert_invoice_roundtrips_through_listing() {
        let pool = setup_pool().await;
        let uid = insert_user(&pool, "Meera", None, "9876543210", None, None, None, None, None)
            .await
            .unwrap();
        let eid = insert_event(&pool, "Retreat", "yoga", Utc::now(), 1500.0, None)
            .await
            .unwrap();
        insert_invoice(
            &pool,
            &NewInvoice {
                invoice_id: "inv-local-1".into(),
                amount: 1500.0,
                user_id: uid,
                event_id: eid,
                gateway_invoice_id: "inv_gw_1".into(),
                short_url: "https://rzp.io/i/abc".into(),
            },
        )
        .await
        .unwrap();

        let invoices = list_invoices(&pool).await.unwrap();
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].status, InvoiceStatus::Created);
        assert_eq!(invoices[0].gateway_invoice_id, "inv_gw_1");
    }
}
