pub mod classifier;
pub mod grid;
pub mod line;

pub use classifier::{ClassifiedLine, LineClassifier, LineRole};
pub use grid::ColumnGrid;
pub use line::{assemble_lines, LineFragment, TextLine};
