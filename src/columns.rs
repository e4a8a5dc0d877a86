//! Column lists of each dashboard table

use crate::models::{
    Announcement, Enterprise, JobPosting, MyApplication, RegulatoryUnit, PRIORITY_OPTIONS, STATUS_OPTIONS,
};
use crate::table::{ColumnDef, ColumnSet, EditKind, Presentation, TableError, TableRecord};

/// 我的进展: every field except the links is editable in place
pub fn application_columns(long_text_max: usize) -> Result<ColumnSet, TableError> {
    ColumnSet::new(
        vec![
            ColumnDef::field("company", "公司").editable(EditKind::Text).width(16),
            ColumnDef::field("position", "职位").editable(EditKind::Text).width(16),
            ColumnDef::field("status", "进展状态")
                .editable(EditKind::select_from(&STATUS_OPTIONS))
                .presentation(Presentation::Badge)
                .width(8),
            ColumnDef::field("priority", "重视度")
                .editable(EditKind::select_from(&PRIORITY_OPTIONS))
                .presentation(Presentation::Badge)
                .width(6),
            ColumnDef::field("progress", "当前进展")
                .editable(EditKind::Text)
                .truncate(long_text_max)
                .width(16),
            ColumnDef::field("status_updated_at", "进展时间").editable(EditKind::Date).width(11),
            ColumnDef::field("location", "地点")
                .editable(EditKind::Text)
                .truncate(long_text_max)
                .width(10),
            ColumnDef::field("industry", "行业").editable(EditKind::Text).width(8),
            ColumnDef::field("applied_at", "投递时间").editable(EditKind::Date).width(11),
            ColumnDef::field("tags", "标签")
                .editable(EditKind::Text)
                .truncate(long_text_max)
                .width(12),
            ColumnDef::field("referral_code", "内推码").editable(EditKind::Text).width(10),
            ColumnDef::field("remarks", "备注")
                .editable(EditKind::Text)
                .truncate(long_text_max)
                .width(16),
            ColumnDef::computed("links", "相关链接", |row| {
                let urls: Vec<String> = ["apply_url", "apply_url2", "apply_url3"]
                    .iter()
                    .filter_map(|field| row.value(field).into_option())
                    .collect();
                Ok(urls.join("\n"))
            })
            .presentation(Presentation::Link { label: "打开" })
            .not_filterable()
            .width(8),
        ],
        &MyApplication::schema(),
    )
}

/// 网申表格
pub fn posting_columns(long_text_max: usize) -> Result<ColumnSet, TableError> {
    ColumnSet::new(
        vec![
            ColumnDef::field("updated_at", "更新时间")
                .presentation(Presentation::Date)
                .not_filterable()
                .width(11),
            ColumnDef::field("company_name", "公司名称").width(16),
            ColumnDef::field("announcement_url", "公告链接")
                .presentation(Presentation::Link { label: "公告" })
                .not_filterable()
                .width(6),
            ColumnDef::field("apply_url", "投递链接")
                .presentation(Presentation::Link { label: "投递" })
                .not_filterable()
                .width(6),
            ColumnDef::field("industry", "行业").presentation(Presentation::Badge).width(8),
            ColumnDef::field("tags", "标签")
                .presentation(Presentation::Tags { max_shown: 3 })
                .width(16),
            ColumnDef::field("batch", "批次").width(10),
            ColumnDef::field("position", "职位").truncate(long_text_max).width(16),
            ColumnDef::field("location", "地点").truncate(long_text_max).width(10),
            ColumnDef::field("deadline", "投递截止")
                .presentation(Presentation::Deadline)
                .width(11),
        ],
        &JobPosting::schema(),
    )
}

/// 招聘公告
pub fn announcement_columns(long_text_max: usize) -> Result<ColumnSet, TableError> {
    ColumnSet::new(
        vec![
            ColumnDef::field("title", "公告标题")
                .truncate(long_text_max * 2)
                .width(40),
            ColumnDef::field("source", "来源").width(12),
            ColumnDef::field("category", "分类").presentation(Presentation::Badge).width(8),
            ColumnDef::field("publish_date", "发布日期").width(11),
            ColumnDef::field("url", "链接")
                .presentation(Presentation::Link { label: "查看" })
                .not_filterable()
                .width(6),
        ],
        &Announcement::schema(),
    )
}

/// 央国企名录
pub fn enterprise_columns(long_text_max: usize) -> Result<ColumnSet, TableError> {
    ColumnSet::new(
        vec![
            ColumnDef::field("name", "企业名称").width(20),
            ColumnDef::field("website", "官网")
                .presentation(Presentation::Link { label: "官网" })
                .not_filterable()
                .width(6),
            ColumnDef::field("category", "行业分类").presentation(Presentation::Badge).width(10),
            ColumnDef::field("regulatory_unit_name", "所属监管单位").width(16),
            ColumnDef::field("comment", "点评").truncate(long_text_max).width(24),
        ],
        &Enterprise::schema(),
    )
}

pub fn regulatory_unit_columns(long_text_max: usize) -> Result<ColumnSet, TableError> {
    ColumnSet::new(
        vec![
            ColumnDef::field("name", "单位名称").width(24),
            ColumnDef::field("level", "级别").presentation(Presentation::Badge).width(8),
            ColumnDef::field("description", "描述").truncate(long_text_max).width(30),
        ],
        &RegulatoryUnit::schema(),
    )
}
