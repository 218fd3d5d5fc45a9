mod checkpoint;
mod machine;
mod observer;
mod state;

pub use checkpoint::{Checkpoint, CheckpointRecorder, CheckpointStore};
pub use machine::{EventCreationMachine, MachineResult, MachineSnapshot, StateResult};
pub use observer::{MachineObserver, NoopObserver, Observers};
pub use state::{EventState, STATE_FLOW, StateConfig};
