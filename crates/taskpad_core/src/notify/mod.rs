use crate::error::AppError;
use crate::model::Task;
use serde::{Deserialize, Serialize};

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsNotifier;

/// How reminder notifications present themselves. Configured once at app
/// start and passed into whatever backend gets constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayPolicy {
    pub show_banner: bool,
    pub play_sound: bool,
}

impl Default for DisplayPolicy {
    fn default() -> Self {
        Self {
            show_banner: true,
            play_sound: true,
        }
    }
}

pub trait Notifier: Send {
    fn notify(&self, task: &Task) -> Result<(), AppError>;
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _task: &Task) -> Result<(), AppError> {
        Ok(())
    }
}

/// Picks the platform backend, honoring the opt-out variable. Unsupported
/// platforms silently degrade to the noop backend.
pub fn notifier_from_env(policy: &DisplayPolicy) -> Box<dyn Notifier> {
    if std::env::var("TASKPAD_DISABLE_NOTIFICATIONS").is_ok() {
        return Box::new(NoopNotifier);
    }

    platform_notifier(policy)
}

pub fn reminder_body(task: &Task) -> String {
    format!("{} ({} priority)", task.text, task.priority)
}

#[cfg(target_os = "linux")]
fn platform_notifier(policy: &DisplayPolicy) -> Box<dyn Notifier> {
    Box::new(LinuxNotifier::new(policy.clone()))
}

#[cfg(windows)]
fn platform_notifier(policy: &DisplayPolicy) -> Box<dyn Notifier> {
    Box::new(WindowsNotifier::new(policy.clone()))
}

#[cfg(not(any(target_os = "linux", windows)))]
fn platform_notifier(_policy: &DisplayPolicy) -> Box<dyn Notifier> {
    Box::new(NoopNotifier)
}

#[cfg(test)]
mod tests {
    use super::{DisplayPolicy, reminder_body};
    use crate::model::{Priority, Task};

    #[test]
    fn display_policy_defaults_to_banner_and_sound() {
        let policy = DisplayPolicy::default();
        assert!(policy.show_banner);
        assert!(policy.play_sound);
    }

    #[test]
    fn reminder_body_includes_text_and_priority() {
        let task = Task {
            id: "task-1".to_string(),
            text: "Buy milk".to_string(),
            completed: false,
            priority: Priority::High,
            created_at: 1,
            completed_at: None,
        };

        assert_eq!(reminder_body(&task), "Buy milk (high priority)");
    }
}
