//! 🦵欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, PixPoint, Pt2d};

pub use crate::config::{DetectConfig, PeakParams, RecommendConfig};

pub use crate::data::{
    parse_slice_number, windowed_display, CtWindow, DisplayImage, RawSlice, Region, Rescale,
};

pub use crate::geom::{angle_between, least_squares_circle, Circle};

pub use crate::detect::{detect_regions, Detection};

pub use crate::metrics::{region_metrics, PixelClassMetrics, SliceMetricsRecord};

pub use crate::recommend::{recommend, NoRecommendation, Recommendation};

pub use crate::refine::{Landmark, LandmarkSet, RefineSession, Side};

pub use crate::stack::{process_stack, SliceOutcome, StackOutcome};

#[cfg(feature = "serde")]
pub use crate::cache::StackCache;

pub use crate::dataset::{self, home_dataset_dir_with, load_stack, StackLoader};
