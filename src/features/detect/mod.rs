pub mod handler;
mod preprocess;
mod score;
mod service;

pub use handler::create_detect_router;
pub use preprocess::{INPUT_HEIGHT, INPUT_WIDTH, TENSOR_LEN, image_to_tensor_data};
pub use score::{FACE_THRESHOLD, probability};
pub use service::{FaceVerifier, OnnxScoreModel, ScoreModel};
