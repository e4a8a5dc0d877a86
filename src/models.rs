use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::table::{CellValue, Row, RowSchema, TableRecord};

/// Progress states accepted for a tracked application
pub const STATUS_OPTIONS: [&str; 7] = ["未投递", "已投递", "笔试", "面试", "Offer", "感谢信", "已结束"];
pub const PRIORITY_OPTIONS: [&str; 3] = ["高", "中", "低"];
pub const DEFAULT_STATUS: &str = "未投递";
pub const DEFAULT_PRIORITY: &str = "中";

/// A tracked application (我的进展)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MyApplication {
    pub id: String,
    pub company: String,
    pub position: Option<String>,
    pub status: String,
    pub priority: String,
    pub progress: Option<String>,
    pub status_updated_at: Option<String>,
    pub location: Option<String>,
    pub industry: Option<String>,
    pub applied_at: Option<String>,
    pub tags: Option<String>,
    pub referral_code: Option<String>,
    pub remarks: Option<String>,
    pub apply_url: Option<String>,
    pub apply_url2: Option<String>,
    pub apply_url3: Option<String>,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MyApplication {
    /// Non-empty application links in display order
    pub fn links(&self) -> Vec<&str> {
        [&self.apply_url, &self.apply_url2, &self.apply_url3]
            .into_iter()
            .filter_map(|u| u.as_deref())
            .filter(|u| !u.is_empty())
            .collect()
    }
}

impl TableRecord for MyApplication {
    fn row_id(&self) -> String {
        self.id.clone()
    }

    fn to_row(&self) -> Row {
        Row::new(&self.id)
            .with("company", CellValue::text(Some(&self.company)))
            .with("position", CellValue::text(self.position.as_deref()))
            .with("status", CellValue::choice(Some(&self.status)))
            .with("priority", CellValue::choice(Some(&self.priority)))
            .with("progress", CellValue::text(self.progress.as_deref()))
            .with("status_updated_at", CellValue::date(self.status_updated_at.as_deref()))
            .with("location", CellValue::text(self.location.as_deref()))
            .with("industry", CellValue::text(self.industry.as_deref()))
            .with("applied_at", CellValue::date(self.applied_at.as_deref()))
            .with("tags", CellValue::text(self.tags.as_deref()))
            .with("referral_code", CellValue::text(self.referral_code.as_deref()))
            .with("remarks", CellValue::text(self.remarks.as_deref()))
            .with("apply_url", CellValue::text(self.apply_url.as_deref()))
            .with("apply_url2", CellValue::text(self.apply_url2.as_deref()))
            .with("apply_url3", CellValue::text(self.apply_url3.as_deref()))
            .with("updated_at", CellValue::Date(self.updated_at.to_rfc3339()))
    }

    fn schema() -> RowSchema {
        RowSchema::new(&[
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
            "updated_at",
        ])
    }
}

/// Fields of an application about to be created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewApplication {
    pub company: String,
    pub position: Option<String>,
    pub status: String,
    pub priority: String,
    pub progress: Option<String>,
    pub location: Option<String>,
    pub industry: Option<String>,
    pub applied_at: Option<String>,
    pub tags: Option<String>,
    pub referral_code: Option<String>,
    pub remarks: Option<String>,
    pub apply_url: Option<String>,
}

impl NewApplication {
    pub fn new(company: &str) -> Self {
        Self {
            company: company.to_string(),
            position: None,
            status: DEFAULT_STATUS.to_string(),
            priority: DEFAULT_PRIORITY.to_string(),
            progress: None,
            location: None,
            industry: None,
            applied_at: None,
            tags: None,
            referral_code: None,
            remarks: None,
            apply_url: None,
        }
    }

    pub fn from_posting(posting: &JobPosting) -> Self {
        Self {
            position: posting.position.clone(),
            location: posting.location.clone(),
            industry: posting.industry.clone(),
            tags: posting.tags.clone(),
            apply_url: posting.apply_url.clone(),
            ..Self::new(&posting.company_name)
        }
    }

    pub fn from_announcement(announcement: &Announcement) -> Self {
        Self {
            industry: announcement.category.clone(),
            apply_url: Some(announcement.url.clone()),
            ..Self::new(&announcement.title)
        }
    }
}

/// Published application form (网申表格)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    pub company_name: String,
    pub announcement_url: Option<String>,
    pub apply_url: Option<String>,
    pub industry: Option<String>,
    pub tags: Option<String>,
    pub batch: Option<String>,
    pub position: Option<String>,
    pub location: Option<String>,
    pub deadline: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl JobPosting {
    pub fn new(company_name: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            company_name: company_name.to_string(),
            announcement_url: None,
            apply_url: None,
            industry: None,
            tags: None,
            batch: None,
            position: None,
            location: None,
            deadline: None,
            updated_at: Utc::now(),
        }
    }
}

impl TableRecord for JobPosting {
    fn row_id(&self) -> String {
        self.id.clone()
    }

    fn to_row(&self) -> Row {
        Row::new(&self.id)
            .with("updated_at", CellValue::Date(self.updated_at.to_rfc3339()))
            .with("company_name", CellValue::text(Some(&self.company_name)))
            .with("announcement_url", CellValue::text(self.announcement_url.as_deref()))
            .with("apply_url", CellValue::text(self.apply_url.as_deref()))
            .with("industry", CellValue::text(self.industry.as_deref()))
            .with("tags", CellValue::text(self.tags.as_deref()))
            .with("batch", CellValue::text(self.batch.as_deref()))
            .with("position", CellValue::text(self.position.as_deref()))
            .with("location", CellValue::text(self.location.as_deref()))
            .with("deadline", CellValue::date(self.deadline.as_deref()))
    }

    fn schema() -> RowSchema {
        RowSchema::new(&[
            "updated_at",
            "company_name",
            "announcement_url",
            "apply_url",
            "industry",
            "tags",
            "batch",
            "position",
            "location",
            "deadline",
        ])
    }
}

/// Recruitment announcement (招聘公告)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub url: String,
    pub source: Option<String>,
    pub category: Option<String>,
    pub publish_date: Option<String>,
}

impl TableRecord for Announcement {
    fn row_id(&self) -> String {
        self.id.clone()
    }

    fn to_row(&self) -> Row {
        Row::new(&self.id)
            .with("title", CellValue::text(Some(&self.title)))
            .with("url", CellValue::text(Some(&self.url)))
            .with("source", CellValue::text(self.source.as_deref()))
            .with("category", CellValue::text(self.category.as_deref()))
            .with("publish_date", CellValue::date(self.publish_date.as_deref()))
    }

    fn schema() -> RowSchema {
        RowSchema::new(&["title", "url", "source", "category", "publish_date"])
    }
}

/// One item of a crawler export file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnnouncementImport {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub publish_date: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// State-owned enterprise (央国企名录)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enterprise {
    pub id: String,
    pub name: String,
    pub website: Option<String>,
    pub category: Option<String>,
    pub regulatory_unit_id: Option<String>,
    /// Resolved from `regulatory_unit_id` when listing
    pub regulatory_unit_name: Option<String>,
    pub comment: Option<String>,
}

impl Enterprise {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            website: None,
            category: None,
            regulatory_unit_id: None,
            regulatory_unit_name: None,
            comment: None,
        }
    }
}

impl TableRecord for Enterprise {
    fn row_id(&self) -> String {
        self.id.clone()
    }

    fn to_row(&self) -> Row {
        Row::new(&self.id)
            .with("name", CellValue::text(Some(&self.name)))
            .with("website", CellValue::text(self.website.as_deref()))
            .with("category", CellValue::text(self.category.as_deref()))
            .with("regulatory_unit_name", CellValue::text(self.regulatory_unit_name.as_deref()))
            .with("comment", CellValue::text(self.comment.as_deref()))
    }

    fn schema() -> RowSchema {
        RowSchema::new(&["name", "website", "category", "regulatory_unit_name", "comment"])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulatoryUnit {
    pub id: String,
    pub name: String,
    pub level: Option<String>,
    pub description: Option<String>,
}

impl RegulatoryUnit {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            level: None,
            description: None,
        }
    }
}

impl TableRecord for RegulatoryUnit {
    fn row_id(&self) -> String {
        self.id.clone()
    }

    fn to_row(&self) -> Row {
        Row::new(&self.id)
            .with("name", CellValue::text(Some(&self.name)))
            .with("level", CellValue::text(self.level.as_deref()))
            .with("description", CellValue::text(self.description.as_deref()))
    }

    fn schema() -> RowSchema {
        RowSchema::new(&["name", "level", "description"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting() -> JobPosting {
        JobPosting {
            id: "p1".to_string(),
            company_name: "国家电网".to_string(),
            announcement_url: None,
            apply_url: Some("https://zhaopin.example.com/apply".to_string()),
            industry: Some("能源".to_string()),
            tags: Some("国企,校招".to_string()),
            batch: Some("2025秋招".to_string()),
            position: Some("电气工程师".to_string()),
            location: Some("北京".to_string()),
            deadline: Some("2024-10-31T23:59:00".to_string()),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_new_application_defaults() {
        let app = NewApplication::new("中国移动");
        assert_eq!(app.status, "未投递");
        assert_eq!(app.priority, "中");
        assert!(STATUS_OPTIONS.contains(&app.status.as_str()));
        assert!(PRIORITY_OPTIONS.contains(&app.priority.as_str()));
    }

    #[test]
    fn test_application_from_posting() {
        let app = NewApplication::from_posting(&posting());
        assert_eq!(app.company, "国家电网");
        assert_eq!(app.position.as_deref(), Some("电气工程师"));
        assert_eq!(app.apply_url.as_deref(), Some("https://zhaopin.example.com/apply"));
        assert_eq!(app.status, DEFAULT_STATUS);
    }

    #[test]
    fn test_application_from_announcement() {
        let announcement = Announcement {
            id: "a1".to_string(),
            title: "中国航天科技集团2025校园招聘".to_string(),
            url: "https://example.com/notice".to_string(),
            source: Some("人社部".to_string()),
            category: Some("航天".to_string()),
            publish_date: Some("2024-09-01".to_string()),
        };
        let app = NewApplication::from_announcement(&announcement);
        assert_eq!(app.company, announcement.title);
        assert_eq!(app.industry.as_deref(), Some("航天"));
        assert_eq!(app.apply_url.as_deref(), Some("https://example.com/notice"));
    }

    #[test]
    fn test_rows_carry_every_schema_field() {
        let row = posting().to_row();
        for field in JobPosting::schema().fields() {
            assert!(row.get(field).is_some(), "missing field {}", field);
        }
        assert_eq!(row.value("announcement_url"), CellValue::Empty);
        assert!(row.value("deadline").is_date());
    }

    #[test]
    fn test_import_item_optional_fields() {
        let item: AnnouncementImport =
            serde_json::from_str(r#"{"title": "公告", "url": "https://example.com/1"}"#).unwrap();
        assert_eq!(item.publish_date, None);
        assert_eq!(item.url, "https://example.com/1");
    }
}
