/// Feedback stage: coupled SDE integration
pub mod feedback;

/// Receiver stage: decoding from source and feedback
pub mod receiver;
