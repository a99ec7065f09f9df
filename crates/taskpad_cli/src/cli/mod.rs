use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "taskpad", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: taskpad add "Buy milk" --priority high
    Add {
        text: Option<String>,
        #[arg(long, default_value = "medium")]
        priority: String,
    },
    /// Toggle a task between incomplete and completed
    ///
    /// Example: taskpad toggle task-1
    Toggle {
        id: String,
    },
    /// Replace a task's text and priority
    ///
    /// Example: taskpad edit task-1 "Buy oat milk" --priority low
    Edit {
        id: String,
        new_text: String,
        #[arg(long)]
        priority: String,
    },
    /// Delete a task
    ///
    /// Example: taskpad delete task-1
    Delete {
        id: String,
    },
    /// List tasks in display order
    ///
    /// Example: taskpad list
    List,
    /// Deliver reminders for incomplete tasks
    ///
    /// Example: taskpad remind
    /// Example: taskpad remind --watch
    Remind {
        /// Keep running and remind on the configured interval
        #[arg(long)]
        watch: bool,
    },
    /// Register a device push token with the configured endpoint
    ///
    /// Example: taskpad register-token ExponentPushToken[xxx]
    RegisterToken {
        token: String,
    },
}
