//! 业务能力层：文本分析、图像生成、结果写入

pub mod analysis;
pub mod gemini_generator;
pub mod generator;
pub mod llm_analysis;
pub mod output_writer;

pub use analysis::{AnalysisOptions, AnalysisService, TomlDeckAnalysis};
pub use gemini_generator::GeminiImageGenerator;
pub use generator::{GenerationRequest, ImageGenerator};
pub use llm_analysis::LlmAnalysisService;
pub use output_writer::OutputWriter;
