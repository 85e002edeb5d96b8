pub mod progress;

pub use progress::{markup, render, Indicator};
