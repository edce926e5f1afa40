//! Plot Module
//!
//! Domain model for plot outlines, the deterministic template generator and
//! the parser that turns gateway output into validated structures.

pub mod parser;
pub mod templates;
pub mod types;

pub use parser::{extract_json_object, parse_plot_response, ParseError, ParsedPlot};
pub use templates::{
    distribute_chapters, generate_default_suggestions, generate_template_alternatives,
    generate_template_plot, template_for, StructureTemplate,
};
pub use types::{
    GenerationMetadata, PlotAct, PlotGenerationRequest, PlotGenerationRequestBuilder,
    PlotGenerationResult, PlotPoint, PlotPointType, PlotStructure, PlotSuggestion, RequestError,
    ResultSource, StructureType, StructureViolation, SuggestionCategory, TaskType, AI_CONFIDENCE,
    FALLBACK_CONFIDENCE,
};
