mod task;

pub use task::{MAX_TEXT_LEN, Priority, Task};
