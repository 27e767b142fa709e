use super::enums::{Category, Priority};
use super::task::Task;
use std::collections::BTreeSet;

/// Filter toggle: a priority or a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    Priority(PriorityTag),
    Category(CategoryTag),
}

/// Orderable wrappers so tags sort in chip order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PriorityTag(u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryTag(u8);

impl Tag {
    /// Resolve a tag name; priorities are tried before categories
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(priority) = Priority::from_name(name) {
            return Some(Self::from(priority));
        }
        Category::from_name(name).map(Self::from)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Priority(p) => Priority::all()[p.0 as usize].name(),
            Self::Category(c) => Category::all()[c.0 as usize].name(),
        }
    }

    /// Every tag in chip order: priorities, then categories
    pub fn all() -> Vec<Tag> {
        Priority::all()
            .iter()
            .copied()
            .map(Tag::from)
            .chain(Category::all().iter().copied().map(Tag::from))
            .collect()
    }
}

impl From<Priority> for Tag {
    fn from(priority: Priority) -> Self {
        let index = Priority::all().iter().position(|p| *p == priority).unwrap_or(0);
        Tag::Priority(PriorityTag(index as u8))
    }
}

impl From<Category> for Tag {
    fn from(category: Category) -> Self {
        let index = Category::all().iter().position(|c| *c == category).unwrap_or(0);
        Tag::Category(CategoryTag(index as u8))
    }
}

/// Set of active filter tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: BTreeSet<Tag>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from tag names, ignoring names that are not priorities or categories
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tags: names
                .into_iter()
                .filter_map(|name| Tag::from_name(name.as_ref()))
                .collect(),
        }
    }

    /// Activate the tag if inactive, deactivate it otherwise
    pub fn toggle(&mut self, tag: Tag) {
        if !self.tags.remove(&tag) {
            self.tags.insert(tag);
        }
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = Tag> + '_ {
        self.tags.iter().copied()
    }

    fn has_priorities(&self) -> bool {
        self.iter().any(|t| matches!(t, Tag::Priority(_)))
    }

    fn has_categories(&self) -> bool {
        self.iter().any(|t| matches!(t, Tag::Category(_)))
    }

    /// OR within a field, AND across fields; a field with no active tag
    /// places no constraint.
    pub fn matches(&self, task: &Task) -> bool {
        if self.is_empty() {
            return true;
        }
        let priority_ok = !self.has_priorities() || self.contains(Tag::from(task.priority));
        let category_ok = !self.has_categories() || self.contains(Tag::from(task.category));
        priority_ok && category_ok
    }
}

/// Case-insensitive substring match on the title, query taken as typed;
/// only the empty query matches all
pub fn title_matches(task: &Task, query: &str) -> bool {
    query.is_empty() || task.title.to_lowercase().contains(&query.to_lowercase())
}

/// Tasks matching both the title query and the active tags, in input order
pub fn filter(tasks: &[Task], query: &str, tags: &TagSet) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| title_matches(task, query) && tags.matches(task))
        .cloned()
        .collect()
}
