pub mod assets;
pub mod cookies;
pub mod engine;
pub mod report;
pub mod steps;

pub use engine::{CleanOutcome, VersionGatedCleaner};
pub use report::{ClearReport, Step, StepOutcome, StepReport};
