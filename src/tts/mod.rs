pub mod narrator;
pub mod queue;

pub use narrator::{NarrationBackend, NarrationCommand, NarrationEnv, Narrator};
pub use queue::{LockRecord, TtsQueueLock};
