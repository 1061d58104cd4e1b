//! Storefront content: banners, pages and FAQ entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use solera_core::{BannerId, FaqId, PageId};

/// A home page hero banner.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
    pub position: i32,
    pub is_active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl Banner {
    /// Whether the banner should be shown at `now`.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.starts_at.is_none_or(|start| start <= now)
            && self.ends_at.is_none_or(|end| now <= end)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BannerInput {
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
    pub position: i32,
    pub is_active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

/// A markdown page such as shipping or returns information.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Page {
    pub id: PageId,
    pub slug: String,
    pub title: String,
    pub body_markdown: String,
    pub is_published: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageInput {
    pub slug: String,
    pub title: String,
    pub body_markdown: String,
    pub is_published: bool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Faq {
    pub id: FaqId,
    pub question: String,
    pub answer: String,
    pub sort_order: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FaqInput {
    pub question: String,
    pub answer: String,
    pub sort_order: i32,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn banner() -> Banner {
        Banner {
            id: BannerId::new(1),
            title: "Summer".to_string(),
            subtitle: None,
            image_url: "/static/img/summer.jpg".to_string(),
            link_url: None,
            position: 0,
            is_active: true,
            starts_at: None,
            ends_at: None,
        }
    }

    #[test]
    fn test_banner_schedule() {
        let now = Utc::now();
        assert!(banner().is_live(now));

        let mut scheduled = banner();
        scheduled.starts_at = Some(now + Duration::hours(1));
        assert!(!scheduled.is_live(now));

        let mut ended = banner();
        ended.ends_at = Some(now - Duration::hours(1));
        assert!(!ended.is_live(now));

        let mut hidden = banner();
        hidden.is_active = false;
        assert!(!hidden.is_live(now));
    }
}
