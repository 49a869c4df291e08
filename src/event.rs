use crate::error::GenerationError;
use crate::generation::GenerationReply;

#[derive(Debug, Clone)]
pub enum AppEvent {
    GenerationFinished {
        request_id: u64,
        outcome: Result<GenerationReply, GenerationError>,
    },
}
