pub mod client;
pub mod error;
pub mod types;

pub use client::{ExerciseApi, ExerciseClient, Operation};
pub use error::ExerciseError;
pub use types::{
    CreateExerciseEventRequest, CreateExerciseEventResponse, EventStatus, ExerciseEvent,
    Extensions, UploadUrl,
};
