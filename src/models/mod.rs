pub mod image;
pub mod job;
pub mod loaders;
pub mod slide;
pub mod style;

pub use image::SlideImage;
pub use job::{BatchContext, BatchSummary, JobOutcome, JobStatus, SlideJob};
pub use loaders::{load_deck_from_toml, load_template_image};
pub use slide::{PresentationAnalysis, SlideDescriptor, TextContent};
pub use style::{SlideCountOption, StylePreset, TextRichness};
