use serde::{Deserialize, Serialize};

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Parse priority from its display name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// Display name, also used as the filter tag and the stored value
    pub fn name(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Badge glyph for list rows
    pub fn badge(&self) -> &'static str {
        match self {
            Self::Low => "▁",
            Self::Medium => "▄",
            Self::High => "█",
        }
    }

    pub fn all() -> &'static [Priority] {
        &[Priority::Low, Priority::Medium, Priority::High]
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

/// Task category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Personal,
    Work,
    Study,
    Health,
    Shopping,
    Other,
}

impl Category {
    /// Parse category from its display name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "personal" => Some(Self::Personal),
            "work" => Some(Self::Work),
            "study" => Some(Self::Study),
            "health" => Some(Self::Health),
            "shopping" => Some(Self::Shopping),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Personal => "Personal",
            Self::Work => "Work",
            Self::Study => "Study",
            Self::Health => "Health",
            Self::Shopping => "Shopping",
            Self::Other => "Other",
        }
    }

    /// Icon shown next to the task title
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Personal => "👤",
            Self::Work => "💼",
            Self::Study => "📚",
            Self::Health => "💓",
            Self::Shopping => "🛒",
            Self::Other => "…",
        }
    }

    pub fn all() -> &'static [Category] {
        &[
            Category::Personal,
            Category::Work,
            Category::Study,
            Category::Health,
            Category::Shopping,
            Category::Other,
        ]
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::Personal
    }
}

/// Bucket a task is listed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Today,
    Overdue,
    Completed,
    All,
}

impl Bucket {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "today" => Some(Self::Today),
            "overdue" => Some(Self::Overdue),
            "completed" | "done" => Some(Self::Completed),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Overdue => "Overdue",
            Self::Completed => "Completed",
            Self::All => "All",
        }
    }

    /// Tab order on the task list screen
    pub fn all() -> &'static [Bucket] {
        &[Bucket::Today, Bucket::Overdue, Bucket::Completed, Bucket::All]
    }

    pub fn next(&self) -> Self {
        match self {
            Self::Today => Self::Overdue,
            Self::Overdue => Self::Completed,
            Self::Completed => Self::All,
            Self::All => Self::Today,
        }
    }
}

/// Screen currently shown by the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Tasks,
    Search,
    Focus,
}

/// UI mode for the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMode {
    Normal,
    AddingTask,
    EditingTask,
    EditingQuery,
    FocusSettings,
    Modal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_from_name() {
        assert_eq!(Priority::from_name("High"), Some(Priority::High));
        assert_eq!(Priority::from_name("low"), Some(Priority::Low));
        assert_eq!(Priority::from_name(" MEDIUM "), Some(Priority::Medium));
        assert_eq!(Priority::from_name("urgent"), None);
    }

    #[test]
    fn test_category_names_round_trip() {
        for category in Category::all() {
            assert_eq!(Category::from_name(category.name()), Some(*category));
        }
        assert_eq!(Category::from_name("hobby"), None);
    }

    #[test]
    fn test_bucket_cycle() {
        let mut bucket = Bucket::Today;
        for _ in 0..Bucket::all().len() {
            bucket = bucket.next();
        }
        assert_eq!(bucket, Bucket::Today);
        assert_eq!(Bucket::from_name("done"), Some(Bucket::Completed));
    }
}
