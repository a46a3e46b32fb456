//! 人脸判定服务：持有推理计划，串起预处理 → 推理 → 判定。

use std::path::Path;

use tract_onnx::prelude::*;

use crate::error::DetectError;

use super::preprocess::{self, INPUT_HEIGHT, INPUT_WIDTH};
use super::score;

/// tract 优化后的可执行推理计划
pub type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// 打分模型抽象：输入展平后的归一化张量数据，输出单个原始分值。
///
/// 生产实现是 ONNX 推理计划；测试里可以注入固定分值的替身，
/// 让 HTTP 契约测试不依赖模型文件。
pub trait ScoreModel: Send + Sync {
    fn raw_score(&self, tensor_data: Vec<f32>) -> Result<f32, DetectError>;
}

/// 基于 tract-onnx 的打分模型
pub struct OnnxScoreModel {
    plan: OnnxPlan,
}

impl OnnxScoreModel {
    /// 从 ONNX 文件构建推理计划。
    ///
    /// 模型唯一输入名为 `input`，形状 [1,3,64,64]，f32。
    pub fn load(path: &Path) -> Result<Self, DetectError> {
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| DetectError::ModelLoad(e.to_string()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, 64, 64)),
            )
            .map_err(|e| DetectError::ModelLoad(e.to_string()))?
            .into_optimized()
            .map_err(|e| DetectError::ModelLoad(e.to_string()))?
            .into_runnable()
            .map_err(|e| DetectError::ModelLoad(e.to_string()))?;

        Ok(Self { plan })
    }
}

impl ScoreModel for OnnxScoreModel {
    fn raw_score(&self, tensor_data: Vec<f32>) -> Result<f32, DetectError> {
        let input = tract_ndarray::Array4::from_shape_vec(
            (1, 3, INPUT_HEIGHT as usize, INPUT_WIDTH as usize),
            tensor_data,
        )
        .map_err(|e| DetectError::Inference(e.to_string()))?;

        // SimplePlan::run 是不可变借用，计划可被并发请求共享，无需加锁。
        let outputs = self
            .plan
            .run(tvec!(input.into_tensor().into()))
            .map_err(|e| DetectError::Inference(e.to_string()))?;

        let view = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| DetectError::Inference(e.to_string()))?;

        // 输出形状为 [1,1]，取 [0][0] 作为原始分值。
        view.iter()
            .copied()
            .next()
            .ok_or_else(|| DetectError::Inference("model produced empty output".to_string()))
    }
}

/// 人脸判定服务
///
/// 进程启动时构建一次，以只读方式被所有请求共享。
pub struct FaceVerifier {
    model: Box<dyn ScoreModel>,
}

impl FaceVerifier {
    /// 从 ONNX 模型文件构建（启动期调用一次，失败应使启动中止）。
    pub fn load(path: &Path) -> Result<Self, DetectError> {
        Ok(Self {
            model: Box::new(OnnxScoreModel::load(path)?),
        })
    }

    /// 注入自定义打分模型（测试用）。
    pub fn with_model(model: Box<dyn ScoreModel>) -> Self {
        Self { model }
    }

    /// 判定一段编码图片字节是否包含人脸。
    ///
    /// 预处理 → 推理 → 概率解释 → 阈值判定，整条流水线无副作用。
    pub fn is_face(&self, image_bytes: &[u8]) -> Result<bool, DetectError> {
        let tensor_data = preprocess::image_to_tensor_data(image_bytes)?;
        let raw = self.model.raw_score(tensor_data)?;
        let probability = score::probability(raw);
        Ok(probability >= score::FACE_THRESHOLD)
    }
}
