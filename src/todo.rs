use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToDoItem {
    pub id: Uuid,
    pub task: String,
    pub done: bool,
    pub due: Option<Date>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoList {
    items: Vec<ToDoItem>,
}

impl TodoList {
    pub fn items(&self) -> &[ToDoItem] {
        &self.items
    }

    /// Empty or whitespace-only tasks are ignored.
    pub fn add(&mut self, task: &str, due: Option<Date>) -> Option<Uuid> {
        let task = task.trim();
        if task.is_empty() {
            return None;
        }

        let id = Uuid::new_v4();
        self.items.push(ToDoItem {
            id,
            task: task.to_owned(),
            done: false,
            due,
        });
        Some(id)
    }

    /// Flips the item's done flag and returns the new value.
    pub fn toggle(&mut self, id: Uuid) -> Option<bool> {
        let item = self.items.iter_mut().find(|item| item.id == id)?;
        item.done = !item.done;
        Some(item.done)
    }

    pub fn clear_completed(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !item.done);
        before - self.items.len()
    }

    /// Insertion order, or dated items first by ascending due date when `by_due`.
    pub fn sorted(&self, by_due: bool) -> Vec<&ToDoItem> {
        let mut items: Vec<&ToDoItem> = self.items.iter().collect();
        if by_due {
            items.sort_by(|a, b| match (a.due, b.due) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            });
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn ignores_blank_tasks() {
        let mut todos = TodoList::default();
        assert!(todos.add("   ", None).is_none());
        assert!(todos.items().is_empty());
    }

    #[test]
    fn toggle_and_clear() {
        let mut todos = TodoList::default();
        let water = todos.add("water plants", None).unwrap();
        todos.add("call mum", None).unwrap();

        assert_eq!(todos.toggle(water), Some(true));
        assert_eq!(todos.toggle(Uuid::new_v4()), None);
        assert_eq!(todos.clear_completed(), 1);
        assert_eq!(todos.clear_completed(), 0);
        assert_eq!(todos.items().len(), 1);
        assert_eq!(todos.items()[0].task, "call mum");
    }

    #[test]
    fn sorts_dated_items_first() {
        let mut todos = TodoList::default();
        todos.add("undated", None);
        todos.add("later", Some(date!(2026 - 11 - 02)));
        todos.add("sooner", Some(date!(2026 - 10 - 20)));
        todos.add("also undated", None);

        let tasks = |by_due| {
            todos
                .sorted(by_due)
                .into_iter()
                .map(|item| item.task.as_str())
                .collect::<Vec<_>>()
        };
        assert_eq!(tasks(false), ["undated", "later", "sooner", "also undated"]);
        assert_eq!(tasks(true), ["sooner", "later", "undated", "also undated"]);
    }
}
