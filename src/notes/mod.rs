pub mod player;
pub mod slot;
pub mod timer;

pub use player::NoteEventPlayer;
pub use slot::NoteSlot;
pub use timer::{TimerHandle, TimerQueue};
