pub mod category;
pub mod error;
pub mod form;
pub mod ingest;
pub mod normalize;
pub mod record;
pub mod report;
pub mod seed;

pub use category::{Category, Frequency, WorkshopCategory, UNCATEGORIZED};
pub use error::{FormError, IngestError, ShapeError};
pub use form::{
    blank_draft, AgendaPatch, CategorySelection, Direction, ExpenseField, ListField, NestedField,
    ScalarField, SpeakerField, WorkshopForm, CREATE_NEW,
};
pub use ingest::{extraction_prompt, parse_extraction, record_from_extraction, response_schema};
pub use normalize::{from_remote, to_remote};
pub use record::{
    generate_id, AgendaItem, Budget, Draft, Expense, Feedback, Metrics, Speaker, WorkshopDetails,
    WorkshopRecord,
};
pub use report::{
    comparison, dashboard, dashboard_years, export_file_name, filter_inventory, format_date,
    inventory_categories, Comparison, ComparisonRow, DashboardRow, DashboardSummary, RatingBand,
    ALL_CATEGORIES,
};
pub use seed::seed_records;
