use crate::model::Task;

/// Display grouping for a task collection: incomplete tasks render first,
/// completed tasks after a labeled separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedTasks {
    pub incomplete: Vec<Task>,
    pub completed: Vec<Task>,
}

impl OrderedTasks {
    /// `Completed (N)` when any completed tasks exist.
    pub fn separator_label(&self) -> Option<String> {
        if self.completed.is_empty() {
            None
        } else {
            Some(format!("Completed ({})", self.completed.len()))
        }
    }

    /// The full display sequence, incomplete group first.
    pub fn flatten(&self) -> Vec<&Task> {
        self.incomplete.iter().chain(self.completed.iter()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.incomplete.is_empty() && self.completed.is_empty()
    }
}

/// Derives the display order from a task collection snapshot. Pure: the
/// input is never mutated and re-running on its own output changes nothing.
pub fn order_tasks(tasks: &[Task]) -> OrderedTasks {
    let mut incomplete: Vec<Task> = tasks.iter().filter(|t| !t.completed).cloned().collect();
    let mut completed: Vec<Task> = tasks.iter().filter(|t| t.completed).cloned().collect();

    sort_group(&mut incomplete);
    sort_group(&mut completed);

    OrderedTasks {
        incomplete,
        completed,
    }
}

// Stable: priority rank first, then most recently created.
fn sort_group(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        a.priority
            .rank()
            .cmp(&b.priority.rank())
            .then(b.created_at.cmp(&a.created_at))
    });
}
