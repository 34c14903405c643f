mod deletion_sweeper;

pub use deletion_sweeper::{DeletionSweeper, SweepReport, SweeperHandle};
