pub mod frame_processor;
pub mod replay;

pub use frame_processor::{Annotation, FrameProcessor, FrameReport};
pub use replay::{read_replay, ReplayDetection, ReplayFrame};
