//! Habit lifecycle: create, list, fetch, update, delete
//!
//! Every operation is scoped to the owning user. A habit owned by someone
//! else reads as `Forbidden`, which the HTTP layer reports as 401.

use std::sync::Arc;

use bson::oid::ObjectId;

use crate::db::{Frequency, HabitDoc};
use crate::habits::store::{HabitStore, HabitUpdate};
use crate::types::{CadenceError, Result};

/// Fixed page size for habit listings
pub const PAGE_SIZE: u64 = 10;

/// Input for creating a habit
#[derive(Debug, Clone)]
pub struct NewHabit {
    pub title: String,
    pub description: Option<String>,
    pub frequency: String,
    pub tags: Vec<String>,
    pub reminder_time: Option<String>,
}

/// Partial update as received from the client. `None` means the field was
/// omitted; a present value overwrites, even when empty.
#[derive(Debug, Clone, Default)]
pub struct HabitPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<String>,
    pub tags: Option<Vec<String>>,
    pub reminder_time: Option<String>,
}

/// One page of a habit listing
#[derive(Debug)]
pub struct HabitPage {
    pub habits: Vec<HabitDoc>,
    pub page: u64,
    pub pages: u64,
}

/// Owner-scoped habit CRUD over an injected store
pub struct HabitLifecycle {
    habits: Arc<dyn HabitStore>,
}

impl HabitLifecycle {
    pub fn new(habits: Arc<dyn HabitStore>) -> Self {
        Self { habits }
    }

    /// Create a habit with zeroed streaks
    pub async fn create(&self, owner: ObjectId, input: NewHabit) -> Result<HabitDoc> {
        if input.title.trim().is_empty() {
            return Err(CadenceError::Validation("Title is required".into()));
        }

        let frequency = parse_frequency(&input.frequency)?;

        let habit = HabitDoc::new(
            owner,
            input.title,
            input.description,
            frequency,
            input.tags,
            input.reminder_time,
        );

        let id = self.habits.insert(habit).await?;
        self.habits
            .find_by_id(id)
            .await?
            .ok_or_else(|| CadenceError::Internal("Habit vanished after insert".into()))
    }

    /// One page of the caller's habits, optionally filtered by tag
    pub async fn list(&self, owner: ObjectId, page: u64, tag: Option<&str>) -> Result<HabitPage> {
        let page = page.max(1);
        let total = self.habits.count_for_owner(owner, tag).await?;
        let habits = self
            .habits
            .list_for_owner(owner, tag, PAGE_SIZE * (page - 1), PAGE_SIZE as i64)
            .await?;

        Ok(HabitPage {
            habits,
            page,
            pages: total.div_ceil(PAGE_SIZE),
        })
    }

    /// Fetch one habit, enforcing ownership
    pub async fn get(&self, owner: ObjectId, habit_id: ObjectId) -> Result<HabitDoc> {
        owned_habit(self.habits.as_ref(), owner, habit_id).await
    }

    /// Apply a partial update, enforcing ownership and field validation
    pub async fn update(
        &self,
        owner: ObjectId,
        habit_id: ObjectId,
        patch: HabitPatch,
    ) -> Result<HabitDoc> {
        owned_habit(self.habits.as_ref(), owner, habit_id).await?;

        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(CadenceError::Validation("Title is required".into()));
            }
        }

        let frequency = match &patch.frequency {
            Some(raw) => Some(parse_frequency(raw)?),
            None => None,
        };

        let update = HabitUpdate {
            title: patch.title,
            description: patch.description,
            frequency,
            tags: patch.tags,
            reminder_time: patch.reminder_time,
        };

        self.habits.update_fields(habit_id, &update).await?;
        self.habits
            .find_by_id(habit_id)
            .await?
            .ok_or_else(|| CadenceError::NotFound("Habit not found".into()))
    }

    /// Delete a habit. Its tracking logs remain in place.
    pub async fn delete(&self, owner: ObjectId, habit_id: ObjectId) -> Result<()> {
        owned_habit(self.habits.as_ref(), owner, habit_id).await?;
        self.habits.remove(habit_id).await
    }
}

/// Load a habit and verify the caller owns it
pub(crate) async fn owned_habit(
    habits: &dyn HabitStore,
    owner: ObjectId,
    habit_id: ObjectId,
) -> Result<HabitDoc> {
    let habit = habits
        .find_by_id(habit_id)
        .await?
        .ok_or_else(|| CadenceError::NotFound("Habit not found".into()))?;

    if habit.user != owner {
        return Err(CadenceError::Forbidden);
    }

    Ok(habit)
}

fn parse_frequency(raw: &str) -> Result<Frequency> {
    Frequency::parse(raw).ok_or_else(|| {
        CadenceError::Validation("Frequency must be either 'daily' or 'weekly'".into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habits::store::memory::MemoryHabitStore;

    fn lifecycle() -> HabitLifecycle {
        HabitLifecycle::new(Arc::new(MemoryHabitStore::new()))
    }

    fn new_habit(title: &str, tags: &[&str]) -> NewHabit {
        NewHabit {
            title: title.into(),
            description: None,
            frequency: "daily".into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            reminder_time: None,
        }
    }

    #[tokio::test]
    async fn test_create_initializes_streaks() {
        let lifecycle = lifecycle();
        let owner = ObjectId::new();

        let habit = lifecycle
            .create(owner, new_habit("Exercise", &["health"]))
            .await
            .unwrap();

        assert_eq!(habit.title, "Exercise");
        assert_eq!(habit.frequency, Frequency::Daily);
        assert_eq!(habit.streak, 0);
        assert_eq!(habit.longest_streak, 0);
        assert_eq!(habit.tags, vec!["health"]);
        assert!(habit._id.is_some());
    }

    #[tokio::test]
    async fn test_create_rejects_empty_title() {
        let lifecycle = lifecycle();
        let err = lifecycle
            .create(ObjectId::new(), new_habit("   ", &[]))
            .await
            .unwrap_err();

        assert!(matches!(err, CadenceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_frequency() {
        let lifecycle = lifecycle();
        let mut input = new_habit("Exercise", &[]);
        input.frequency = "fortnightly".into();

        let err = lifecycle.create(ObjectId::new(), input).await.unwrap_err();
        assert!(matches!(err, CadenceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_paginates_with_fixed_page_size() {
        let lifecycle = lifecycle();
        let owner = ObjectId::new();

        for i in 0..23 {
            lifecycle
                .create(owner, new_habit(&format!("Habit {i}"), &[]))
                .await
                .unwrap();
        }

        let page1 = lifecycle.list(owner, 1, None).await.unwrap();
        assert_eq!(page1.habits.len(), 10);
        assert_eq!(page1.page, 1);
        assert_eq!(page1.pages, 3);

        let page3 = lifecycle.list(owner, 3, None).await.unwrap();
        assert_eq!(page3.habits.len(), 3);

        let page4 = lifecycle.list(owner, 4, None).await.unwrap();
        assert!(page4.habits.is_empty());
        assert_eq!(page4.pages, 3);
    }

    #[tokio::test]
    async fn test_list_page_zero_reads_as_first_page() {
        let lifecycle = lifecycle();
        let owner = ObjectId::new();
        lifecycle.create(owner, new_habit("Habit", &[])).await.unwrap();

        let page = lifecycle.list(owner, 0, None).await.unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.habits.len(), 1);
    }

    #[tokio::test]
    async fn test_list_filters_by_tag_containment() {
        let lifecycle = lifecycle();
        let owner = ObjectId::new();

        lifecycle
            .create(owner, new_habit("Habit 1", &["health", "morning"]))
            .await
            .unwrap();
        lifecycle
            .create(owner, new_habit("Habit 2", &["work"]))
            .await
            .unwrap();

        let page = lifecycle.list(owner, 1, Some("health")).await.unwrap();
        assert_eq!(page.habits.len(), 1);
        assert_eq!(page.habits[0].title, "Habit 1");
        assert_eq!(page.pages, 1);

        let none = lifecycle.list(owner, 1, Some("sleep")).await.unwrap();
        assert!(none.habits.is_empty());
        assert_eq!(none.pages, 0);
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_owner() {
        let lifecycle = lifecycle();
        let alice = ObjectId::new();
        let bob = ObjectId::new();

        lifecycle.create(alice, new_habit("Alice's", &[])).await.unwrap();
        lifecycle.create(bob, new_habit("Bob's", &[])).await.unwrap();

        let page = lifecycle.list(alice, 1, None).await.unwrap();
        assert_eq!(page.habits.len(), 1);
        assert_eq!(page.habits[0].title, "Alice's");
    }

    #[tokio::test]
    async fn test_get_enforces_ownership() {
        let lifecycle = lifecycle();
        let owner = ObjectId::new();
        let habit = lifecycle.create(owner, new_habit("Exercise", &[])).await.unwrap();
        let id = habit._id.unwrap();

        assert!(lifecycle.get(owner, id).await.is_ok());

        let err = lifecycle.get(ObjectId::new(), id).await.unwrap_err();
        assert!(matches!(err, CadenceError::Forbidden));

        let err = lifecycle.get(owner, ObjectId::new()).await.unwrap_err();
        assert!(matches!(err, CadenceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_overwrites_only_present_fields() {
        let lifecycle = lifecycle();
        let owner = ObjectId::new();
        let mut input = new_habit("Exercise", &["health"]);
        input.description = Some("Daily workout".into());
        let habit = lifecycle.create(owner, input).await.unwrap();
        let id = habit._id.unwrap();

        let updated = lifecycle
            .update(
                owner,
                id,
                HabitPatch {
                    title: Some("Morning Jog".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Morning Jog");
        assert_eq!(updated.description.as_deref(), Some("Daily workout"));
        assert_eq!(updated.tags, vec!["health"]);
    }

    #[tokio::test]
    async fn test_update_clears_tags_when_empty_list_is_sent() {
        let lifecycle = lifecycle();
        let owner = ObjectId::new();
        let habit = lifecycle
            .create(owner, new_habit("Exercise", &["health"]))
            .await
            .unwrap();

        let updated = lifecycle
            .update(
                owner,
                habit._id.unwrap(),
                HabitPatch {
                    tags: Some(vec![]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(updated.tags.is_empty());
    }

    #[tokio::test]
    async fn test_update_validates_title_and_frequency() {
        let lifecycle = lifecycle();
        let owner = ObjectId::new();
        let habit = lifecycle.create(owner, new_habit("Exercise", &[])).await.unwrap();
        let id = habit._id.unwrap();

        let err = lifecycle
            .update(
                owner,
                id,
                HabitPatch {
                    title: Some("".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CadenceError::Validation(_)));

        let err = lifecycle
            .update(
                owner,
                id,
                HabitPatch {
                    frequency: Some("hourly".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CadenceError::Validation(_)));

        let updated = lifecycle
            .update(
                owner,
                id,
                HabitPatch {
                    frequency: Some("weekly".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.frequency, Frequency::Weekly);
    }

    #[tokio::test]
    async fn test_update_rejects_other_owner() {
        let lifecycle = lifecycle();
        let owner = ObjectId::new();
        let habit = lifecycle.create(owner, new_habit("Exercise", &[])).await.unwrap();

        let err = lifecycle
            .update(
                ObjectId::new(),
                habit._id.unwrap(),
                HabitPatch {
                    title: Some("Stolen".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CadenceError::Forbidden));
    }

    #[tokio::test]
    async fn test_delete_removes_habit_for_owner_only() {
        let lifecycle = lifecycle();
        let owner = ObjectId::new();
        let habit = lifecycle.create(owner, new_habit("Exercise", &[])).await.unwrap();
        let id = habit._id.unwrap();

        let err = lifecycle.delete(ObjectId::new(), id).await.unwrap_err();
        assert!(matches!(err, CadenceError::Forbidden));

        lifecycle.delete(owner, id).await.unwrap();

        let err = lifecycle.get(owner, id).await.unwrap_err();
        assert!(matches!(err, CadenceError::NotFound(_)));
    }
}
