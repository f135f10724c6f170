mod error;
mod sample;
mod series;
mod store;
mod window;

pub use error::SeriesError;
pub use sample::{Admission, ScalarSample};
pub use series::ScalarSeries;
pub use store::{SeriesStore, SeriesView};
pub use window::{parse_bound, AxisRange, ViewWindow, YRange};
