use crate::error::AppError;
use crate::model::Task;
use crate::notify::{DisplayPolicy, Notifier};
use tauri_winrt_notification::Toast;

pub struct WindowsNotifier {
    policy: DisplayPolicy,
}

impl WindowsNotifier {
    pub fn new(policy: DisplayPolicy) -> Self {
        Self { policy }
    }
}

impl Notifier for WindowsNotifier {
    fn notify(&self, task: &Task) -> Result<(), AppError> {
        let mut toast = Toast::new(Toast::POWERSHELL_APP_ID)
            .title("taskpad")
            .text1(&task.text)
            .text2(&format!("{} priority", task.priority));

        if !self.policy.play_sound {
            toast = toast.sound(None);
        }

        toast
            .show()
            .map_err(|err| AppError::notify(err.to_string()))?;

        Ok(())
    }
}
