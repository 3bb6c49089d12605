//! Time windows controlling when course content and announcements are shown.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Course material that is hidden from students outside of its window.
pub trait Scheduled {
    fn window(&self) -> VisibilityWindow;
    fn course_id(&self) -> Uuid;
}

/// An optional `[start, end]` range. Open ends are unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct VisibilityWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl VisibilityWindow {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// Both bounds are inclusive.
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= now && now <= end,
            (Some(start), None) => now >= start,
            (None, Some(end)) => now <= end,
            (None, None) => true,
        }
    }

    pub fn is_visible_now(&self) -> bool {
        self.is_visible_at(Utc::now())
    }

    /// A window whose start lies after its end can never be visible.
    pub fn is_valid(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        }
    }
}
