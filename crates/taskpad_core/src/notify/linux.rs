use crate::error::AppError;
use crate::model::Task;
use crate::notify::{DisplayPolicy, Notifier, reminder_body};
use notify_rust::{Hint, Notification, Urgency};

pub struct LinuxNotifier {
    policy: DisplayPolicy,
}

impl LinuxNotifier {
    pub fn new(policy: DisplayPolicy) -> Self {
        Self { policy }
    }
}

impl Notifier for LinuxNotifier {
    fn notify(&self, task: &Task) -> Result<(), AppError> {
        let mut notification = Notification::new();
        notification.summary("taskpad");
        notification.body(&reminder_body(task));

        let urgency = if self.policy.show_banner {
            Urgency::Normal
        } else {
            Urgency::Low
        };
        notification.hint(Hint::Urgency(urgency));

        if !self.policy.play_sound {
            notification.hint(Hint::SuppressSound(true));
        }

        notification
            .show()
            .map_err(|err| AppError::notify(err.to_string()))?;

        Ok(())
    }
}
