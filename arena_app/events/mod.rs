pub mod event;
pub mod fence;
pub mod handler;
pub mod processor;
pub mod user_locks;

pub use event::{GameEvent, GameEventKind, GameEventPayload, LiveMatchSnapshot};
pub use fence::MatchFence;
pub use handler::{EventHandler, EventHandlerContext, EventRegistry};
pub use processor::{EventProcessor, EventSender, EventSlot};
pub use user_locks::UserLocks;
