/// Failures while deriving a `Task` from a work item. Any of these aborts the batch.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("work item #{id}: missing field {field}")]
    MissingField { id: u32, field: &'static str },

    #[error("work item #{id}: cannot parse {field} as a date: {value:?}")]
    DateParse {
        id: u32,
        field: &'static str,
        value: String,
    },
}
