//! SQLite persistence for the dashboard records

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    Announcement, AnnouncementImport, Enterprise, JobPosting, MyApplication, NewApplication, RegulatoryUnit,
    PRIORITY_OPTIONS, STATUS_OPTIONS,
};
use crate::table::OrderChange;

/// Application fields that may be changed one at a time
pub const EDITABLE_FIELDS: [&str; 15] = [
    "company",
    "position",
    "status",
    "priority",
    "progress",
    "status_updated_at",
    "location",
    "industry",
    "applied_at",
    "tags",
    "referral_code",
    "remarks",
    "apply_url",
    "apply_url2",
    "apply_url3",
];

/// Tables other than my applications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordTable {
    Postings,
    Announcements,
    Enterprises,
    RegulatoryUnits,
}

impl RecordTable {
    fn sql_name(&self) -> &'static str {
        match self {
            RecordTable::Postings => "job_postings",
            RecordTable::Announcements => "announcements",
            RecordTable::Enterprises => "enterprises",
            RecordTable::RegulatoryUnits => "regulatory_units",
        }
    }

    /// Columns that may be set one at a time
    pub fn editable_fields(&self) -> &'static [&'static str] {
        match self {
            RecordTable::Postings => &[
                "company_name",
                "announcement_url",
                "apply_url",
                "industry",
                "tags",
                "batch",
                "position",
                "location",
                "deadline",
            ],
            RecordTable::Announcements => &["title", "url", "source", "category", "publish_date"],
            RecordTable::Enterprises => &["name", "website", "category", "regulatory_unit_id", "comment"],
            RecordTable::RegulatoryUnits => &["name", "level", "description"],
        }
    }

    /// Fields that may not be cleared
    fn required_fields(&self) -> &'static [&'static str] {
        match self {
            RecordTable::Postings => &["company_name"],
            RecordTable::Announcements => &["title", "url"],
            RecordTable::Enterprises | RecordTable::RegulatoryUnits => &["name"],
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Field '{0}' cannot be edited")]
    NotEditable(String),

    #[error("Invalid value for '{field}': {value}")]
    InvalidValue { field: String, value: String },

    #[error("Record '{0}' not found")]
    NotFound(String),
}

/// Persistence used by the tracker screen
#[async_trait]
pub trait TrackerStore: Send + Sync {
    /// Applications ordered by `order ASC, updated_at DESC`
    async fn list_applications(&self) -> Result<Vec<MyApplication>, StoreError>;

    async fn add_application(&self, new: &NewApplication) -> Result<MyApplication, StoreError>;

    /// Set a single field; `None` clears it
    async fn update_application_field(
        &self,
        id: &str,
        field: &str,
        value: Option<&str>,
    ) -> Result<MyApplication, StoreError>;

    /// Write the new order values in one transaction
    async fn persist_order(&self, changes: &[OrderChange]) -> Result<(), StoreError>;

    /// Returns how many rows were removed
    async fn delete_applications(&self, ids: &[String]) -> Result<u64, StoreError>;
}

pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(database_path: &str) -> Result<Self, StoreError> {
        // Create database if it doesn't exist
        if !Path::new(database_path).exists() {
            std::fs::File::create(database_path)?;
        }

        let database_url = format!("sqlite://{}", database_path);
        let pool = SqlitePool::connect(&database_url).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS my_applications (
                id TEXT PRIMARY KEY,
                company TEXT NOT NULL,
                position TEXT,
                status TEXT NOT NULL,
                priority TEXT NOT NULL,
                progress TEXT,
                status_updated_at TEXT,
                location TEXT,
                industry TEXT,
                applied_at TEXT,
                tags TEXT,
                referral_code TEXT,
                remarks TEXT,
                apply_url TEXT,
                apply_url2 TEXT,
                apply_url3 TEXT,
                sort_order INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS job_postings (
                id TEXT PRIMARY KEY,
                company_name TEXT NOT NULL,
                announcement_url TEXT,
                apply_url TEXT,
                industry TEXT,
                tags TEXT,
                batch TEXT,
                position TEXT,
                location TEXT,
                deadline TEXT,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS announcements (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                url TEXT NOT NULL,
                source TEXT,
                category TEXT,
                publish_date TEXT
            );

            CREATE TABLE IF NOT EXISTS regulatory_units (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                level TEXT,
                description TEXT
            );

            CREATE TABLE IF NOT EXISTS enterprises (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                website TEXT,
                category TEXT,
                regulatory_unit_id TEXT REFERENCES regulatory_units(id),
                comment TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_applications_order ON my_applications(sort_order);
            CREATE INDEX IF NOT EXISTS idx_announcements_url ON announcements(url);
            CREATE INDEX IF NOT EXISTS idx_enterprises_unit ON enterprises(regulatory_unit_id);
            "#,
        )
        .execute(&pool)
        .await?;

        debug!("Opened database {}", database_path);
        Ok(Storage { pool })
    }

    pub async fn get_application(&self, id: &str) -> Result<Option<MyApplication>, StoreError> {
        let row = sqlx::query("SELECT * FROM my_applications WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| application_from_row(&r)))
    }

    pub async fn list_postings(&self) -> Result<Vec<JobPosting>, StoreError> {
        let rows = sqlx::query("SELECT * FROM job_postings ORDER BY updated_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| JobPosting {
                id: row.get("id"),
                company_name: row.get("company_name"),
                announcement_url: row.get("announcement_url"),
                apply_url: row.get("apply_url"),
                industry: row.get("industry"),
                tags: row.get("tags"),
                batch: row.get("batch"),
                position: row.get("position"),
                location: row.get("location"),
                deadline: row.get("deadline"),
                updated_at: row.get("updated_at"),
            })
            .collect())
    }

    pub async fn insert_posting(&self, posting: &JobPosting) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO job_postings
            (id, company_name, announcement_url, apply_url, industry, tags, batch, position, location, deadline, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&posting.id)
        .bind(&posting.company_name)
        .bind(&posting.announcement_url)
        .bind(&posting.apply_url)
        .bind(&posting.industry)
        .bind(&posting.tags)
        .bind(&posting.batch)
        .bind(&posting.position)
        .bind(&posting.location)
        .bind(&posting.deadline)
        .bind(posting.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_announcements(&self) -> Result<Vec<Announcement>, StoreError> {
        let rows = sqlx::query("SELECT * FROM announcements ORDER BY publish_date DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| Announcement {
                id: row.get("id"),
                title: row.get("title"),
                url: row.get("url"),
                source: row.get("source"),
                category: row.get("category"),
                publish_date: row.get("publish_date"),
            })
            .collect())
    }

    /// Insert crawler items whose URL is not stored yet.
    /// Returns how many were imported.
    pub async fn import_announcements(&self, items: &[AnnouncementImport]) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut imported = 0;
        for item in items {
            let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM announcements WHERE url = ?")
                .bind(&item.url)
                .fetch_optional(&mut *tx)
                .await?;
            if existing.is_some() {
                debug!("Skipping known announcement {}", item.url);
                continue;
            }
            sqlx::query(
                "INSERT INTO announcements (id, title, url, source, category, publish_date) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&item.title)
            .bind(&item.url)
            .bind(&item.source)
            .bind(&item.category)
            .bind(&item.publish_date)
            .execute(&mut *tx)
            .await?;
            imported += 1;
        }
        tx.commit().await?;
        info!("Imported {} of {} announcements", imported, items.len());
        Ok(imported)
    }

    pub async fn list_enterprises(&self) -> Result<Vec<Enterprise>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT e.*, u.name AS regulatory_unit_name
            FROM enterprises e
            LEFT JOIN regulatory_units u ON u.id = e.regulatory_unit_id
            ORDER BY e.created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(|row| Enterprise {
                id: row.get("id"),
                name: row.get("name"),
                website: row.get("website"),
                category: row.get("category"),
                regulatory_unit_id: row.get("regulatory_unit_id"),
                regulatory_unit_name: row.get("regulatory_unit_name"),
                comment: row.get("comment"),
            })
            .collect())
    }

    pub async fn insert_enterprise(&self, enterprise: &Enterprise) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO enterprises (id, name, website, category, regulatory_unit_id, comment, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&enterprise.id)
        .bind(&enterprise.name)
        .bind(&enterprise.website)
        .bind(&enterprise.category)
        .bind(&enterprise.regulatory_unit_id)
        .bind(&enterprise.comment)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_regulatory_units(&self) -> Result<Vec<RegulatoryUnit>, StoreError> {
        let rows = sqlx::query("SELECT * FROM regulatory_units ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| RegulatoryUnit {
                id: row.get("id"),
                name: row.get("name"),
                level: row.get("level"),
                description: row.get("description"),
            })
            .collect())
    }

    pub async fn insert_regulatory_unit(&self, unit: &RegulatoryUnit) -> Result<(), StoreError> {
        sqlx::query("INSERT OR REPLACE INTO regulatory_units (id, name, level, description) VALUES (?, ?, ?, ?)")
            .bind(&unit.id)
            .bind(&unit.name)
            .bind(&unit.level)
            .bind(&unit.description)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Unit matching an id or an exact name
    pub async fn find_regulatory_unit(&self, key: &str) -> Result<Option<RegulatoryUnit>, StoreError> {
        let row = sqlx::query("SELECT * FROM regulatory_units WHERE id = ? OR name = ? LIMIT 1")
            .bind(key)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| RegulatoryUnit {
            id: row.get("id"),
            name: row.get("name"),
            level: row.get("level"),
            description: row.get("description"),
        }))
    }

    /// Set a single field of a posting, announcement, enterprise or unit; `None` clears it
    pub async fn update_record_field(
        &self,
        table: RecordTable,
        id: &str,
        field: &str,
        value: Option<&str>,
    ) -> Result<(), StoreError> {
        if !table.editable_fields().contains(&field) {
            return Err(StoreError::NotEditable(field.to_string()));
        }
        if table.required_fields().contains(&field) && value.map_or(true, |v| v.trim().is_empty()) {
            return Err(StoreError::InvalidValue {
                field: field.to_string(),
                value: value.unwrap_or_default().to_string(),
            });
        }
        // Units may be given by name; the id is what gets stored
        let unit_id;
        let value = match value {
            Some(key) if field == "regulatory_unit_id" => {
                unit_id = self
                    .find_regulatory_unit(key)
                    .await?
                    .ok_or_else(|| StoreError::NotFound(key.to_string()))?
                    .id;
                Some(unit_id.as_str())
            }
            other => other,
        };

        // Table and field names come from RecordTable, never user text
        let result = if table == RecordTable::Postings {
            sqlx::query(&format!(
                "UPDATE {} SET {} = ?, updated_at = ? WHERE id = ?",
                table.sql_name(),
                field
            ))
            .bind(value)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?
        } else {
            sqlx::query(&format!("UPDATE {} SET {} = ? WHERE id = ?", table.sql_name(), field))
                .bind(value)
                .bind(id)
                .execute(&self.pool)
                .await?
        };
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        debug!("Updated {} of {} {}", field, table.sql_name(), id);
        Ok(())
    }

    /// Returns how many rows were removed. Enterprises of a removed unit keep
    /// their record without a unit.
    pub async fn delete_records(&self, table: RecordTable, ids: &[String]) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut deleted = 0;
        for id in ids {
            if table == RecordTable::RegulatoryUnits {
                sqlx::query("UPDATE enterprises SET regulatory_unit_id = NULL WHERE regulatory_unit_id = ?")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
            deleted += sqlx::query(&format!("DELETE FROM {} WHERE id = ?", table.sql_name()))
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;
        info!("Deleted {} rows from {}", deleted, table.sql_name());
        Ok(deleted)
    }

    /// Demo records for a fresh database. Tables that already hold rows are left alone.
    pub async fn seed_demo_data(&self) -> Result<usize, StoreError> {
        let mut inserted = 0;

        if self.list_regulatory_units().await?.is_empty() {
            let units = [
                ("sasac", "国务院国资委", "中央", "负责监管中央企业"),
                ("bj-sasac", "北京市国资委", "地方", "负责监管北京市属国有企业"),
            ];
            for (id, name, level, description) in units {
                self.insert_regulatory_unit(&RegulatoryUnit {
                    id: id.to_string(),
                    name: name.to_string(),
                    level: Some(level.to_string()),
                    description: Some(description.to_string()),
                })
                .await?;
                inserted += 1;
            }
        }

        if self.list_enterprises().await?.is_empty() {
            let enterprises = [
                ("国家电网有限公司", "https://www.sgcc.com.cn", "能源", "sasac", "体量大，岗位多，地域分配需提前了解"),
                ("中国移动通信集团", "https://www.10086.cn", "通信", "sasac", "研发岗竞争激烈"),
                ("北京首都创业集团", "https://www.bcgroup.com.cn", "综合", "bj-sasac", ""),
            ];
            for (name, website, category, unit, comment) in enterprises {
                self.insert_enterprise(&Enterprise {
                    id: Uuid::new_v4().to_string(),
                    name: name.to_string(),
                    website: Some(website.to_string()),
                    category: Some(category.to_string()),
                    regulatory_unit_id: Some(unit.to_string()),
                    regulatory_unit_name: None,
                    comment: (!comment.is_empty()).then(|| comment.to_string()),
                })
                .await?;
                inserted += 1;
            }
        }

        if self.list_postings().await?.is_empty() {
            let postings = [
                ("中国航天科技集团", "航天", "央企,校招,研发", "2025秋招", "软件工程师", "北京", "2024-10-31T23:59:00"),
                ("中国银行", "金融", "国有银行,管培生", "2025秋招", "综合管理培训生", "上海,北京,深圳", "2024-11-15"),
                ("中国中车", "制造", "央企,校招", "2025春招", "机械设计工程师", "株洲", "2025-03-20"),
            ];
            for (company, industry, tags, batch, position, location, deadline) in postings {
                self.insert_posting(&JobPosting {
                    id: Uuid::new_v4().to_string(),
                    company_name: company.to_string(),
                    announcement_url: None,
                    apply_url: Some(format!("https://campus.example.com/{}", inserted)),
                    industry: Some(industry.to_string()),
                    tags: Some(tags.to_string()),
                    batch: Some(batch.to_string()),
                    position: Some(position.to_string()),
                    location: Some(location.to_string()),
                    deadline: Some(deadline.to_string()),
                    updated_at: Utc::now(),
                })
                .await?;
                inserted += 1;
            }
        }

        if self.list_announcements().await?.is_empty() {
            let items = vec![
                AnnouncementImport {
                    title: "2025年度中央企业校园招聘公告汇总".to_string(),
                    url: "https://www.mohrss.example.gov.cn/notice/1".to_string(),
                    publish_date: Some("2024-09-01".to_string()),
                    source: Some("人社部".to_string()),
                    category: Some("校园招聘".to_string()),
                },
                AnnouncementImport {
                    title: "北京市属国有企业2025届高校毕业生招聘".to_string(),
                    url: "https://rsj.beijing.example.gov.cn/notice/2".to_string(),
                    publish_date: Some("2024-09-12 09:30:00".to_string()),
                    source: Some("北京市人社局".to_string()),
                    category: Some("国企招聘".to_string()),
                },
            ];
            inserted += self.import_announcements(&items).await?;
        }

        if self.list_applications().await?.is_empty() {
            let mut first = NewApplication::new("中国移动通信集团");
            first.position = Some("网络运维工程师".to_string());
            first.status = "已投递".to_string();
            first.priority = "高".to_string();
            first.applied_at = Some("2024-09-20".to_string());
            first.tags = Some("央企,通信".to_string());
            let mut second = NewApplication::new("国家电网有限公司");
            second.position = Some("电气工程".to_string());
            second.progress = Some("已完成一面，等待二面通知，HR说两周内会有结果".to_string());
            for new in [first, second] {
                self.add_application(&new).await?;
                inserted += 1;
            }
        }

        info!("Seeded {} demo records", inserted);
        Ok(inserted)
    }
}

#[async_trait]
impl TrackerStore for Storage {
    async fn list_applications(&self) -> Result<Vec<MyApplication>, StoreError> {
        let rows = sqlx::query("SELECT * FROM my_applications ORDER BY sort_order ASC, updated_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(application_from_row).collect())
    }

    async fn add_application(&self, new: &NewApplication) -> Result<MyApplication, StoreError> {
        validate_field("company", Some(&new.company))?;
        validate_field("status", Some(&new.status))?;
        validate_field("priority", Some(&new.priority))?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO my_applications
            (id, company, position, status, priority, progress, status_updated_at, location, industry,
             applied_at, tags, referral_code, remarks, apply_url, sort_order, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                    (SELECT COALESCE(MIN(sort_order), 1) - 1 FROM my_applications), ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&new.company)
        .bind(&new.position)
        .bind(&new.status)
        .bind(&new.priority)
        .bind(&new.progress)
        .bind(now.to_rfc3339())
        .bind(&new.location)
        .bind(&new.industry)
        .bind(&new.applied_at)
        .bind(&new.tags)
        .bind(&new.referral_code)
        .bind(&new.remarks)
        .bind(&new.apply_url)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!("Added application {} for {}", id, new.company);
        self.get_application(&id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn update_application_field(
        &self,
        id: &str,
        field: &str,
        value: Option<&str>,
    ) -> Result<MyApplication, StoreError> {
        if !EDITABLE_FIELDS.contains(&field) {
            return Err(StoreError::NotEditable(field.to_string()));
        }
        validate_field(field, value)?;

        let now = Utc::now();
        // `field` is one of EDITABLE_FIELDS, never user text
        let sql = if field == "status" {
            format!(
                "UPDATE my_applications SET {} = ?, updated_at = ?, status_updated_at = ? WHERE id = ?",
                field
            )
        } else {
            format!("UPDATE my_applications SET {} = ?, updated_at = ? WHERE id = ?", field)
        };

        let mut query = sqlx::query(&sql).bind(value).bind(now);
        if field == "status" {
            query = query.bind(now.to_rfc3339());
        }
        let result = query.bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }

        debug!("Updated {} of application {}", field, id);
        self.get_application(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn persist_order(&self, changes: &[OrderChange]) -> Result<(), StoreError> {
        if changes.is_empty() {
            return Ok(());
        }
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        for change in changes {
            sqlx::query("UPDATE my_applications SET sort_order = ?, updated_at = ? WHERE id = ?")
                .bind(change.order)
                .bind(now)
                .bind(&change.id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        debug!("Persisted order of {} applications", changes.len());
        Ok(())
    }

    async fn delete_applications(&self, ids: &[String]) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut deleted = 0;
        for id in ids {
            deleted += sqlx::query("DELETE FROM my_applications WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;
        info!("Deleted {} applications", deleted);
        Ok(deleted)
    }
}

fn application_from_row(row: &SqliteRow) -> MyApplication {
    MyApplication {
        id: row.get("id"),
        company: row.get("company"),
        position: row.get("position"),
        status: row.get("status"),
        priority: row.get("priority"),
        progress: row.get("progress"),
        status_updated_at: row.get("status_updated_at"),
        location: row.get("location"),
        industry: row.get("industry"),
        applied_at: row.get("applied_at"),
        tags: row.get("tags"),
        referral_code: row.get("referral_code"),
        remarks: row.get("remarks"),
        apply_url: row.get("apply_url"),
        apply_url2: row.get("apply_url2"),
        apply_url3: row.get("apply_url3"),
        order: row.get("sort_order"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
    }
}

/// Values the store refuses for a field
fn validate_field(field: &str, value: Option<&str>) -> Result<(), StoreError> {
    let invalid = || StoreError::InvalidValue {
        field: field.to_string(),
        value: value.unwrap_or_default().to_string(),
    };
    match field {
        "company" if value.map_or(true, |v| v.trim().is_empty()) => Err(invalid()),
        "status" if !value.map_or(false, |v| STATUS_OPTIONS.contains(&v)) => Err(invalid()),
        "priority" if !value.map_or(false, |v| PRIORITY_OPTIONS.contains(&v)) => Err(invalid()),
        _ => Ok(()),
    }
}
