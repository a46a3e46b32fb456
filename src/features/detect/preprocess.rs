//! 图片到模型输入张量的预处理。
//!
//! 纯函数实现，不依赖推理引擎，可独立测试。

use std::io::Cursor;

use image::{GenericImageView, ImageReader, imageops::FilterType};

use crate::error::DetectError;

/// 模型输入宽度（像素）
pub const INPUT_WIDTH: u32 = 64;
/// 模型输入高度（像素）
pub const INPUT_HEIGHT: u32 = 64;
/// 展平后的张量长度：3 通道 × 64 × 64
pub const TENSOR_LEN: usize = 3 * (INPUT_WIDTH as usize) * (INPUT_HEIGHT as usize);

/// 将编码图片字节转换为模型输入张量数据。
///
/// 流程：解码 → 强制缩放到 64×64（平滑重采样，不保留宽高比）→
/// 逐像素取 RGB → 线性映射 `[0,255]` 到 `[-1,1]` → 按通道平面排布
/// （先整个 R 平面、再 G 平面、再 B 平面，平面内按行主序）。
///
/// 张量长度与通道顺序必须与模型训练时一致；不一致不会报错，
/// 只会产出无意义的分值。
pub fn image_to_tensor_data(image_bytes: &[u8]) -> Result<Vec<f32>, DetectError> {
    let decoded = ImageReader::new(Cursor::new(image_bytes))
        .with_guessed_format()
        .map_err(|_| DetectError::InvalidImage)?
        .decode()
        .map_err(|_| DetectError::InvalidImage)?;

    // 尺寸已匹配时跳过重采样，直接取像素。
    let resized = if decoded.width() == INPUT_WIDTH && decoded.height() == INPUT_HEIGHT {
        decoded.into_rgb8()
    } else {
        decoded
            .resize_exact(INPUT_WIDTH, INPUT_HEIGHT, FilterType::CatmullRom)
            .into_rgb8()
    };

    let plane = (INPUT_WIDTH * INPUT_HEIGHT) as usize;
    let mut data = vec![0.0f32; TENSOR_LEN];

    for (idx, pixel) in resized.pixels().enumerate() {
        data[idx] = normalize(pixel[0]);
        data[plane + idx] = normalize(pixel[1]);
        data[2 * plane + idx] = normalize(pixel[2]);
    }

    Ok(data)
}

/// 将单通道强度 `[0,255]` 线性映射到 `[-1.0, 1.0]`。
fn normalize(value: u8) -> f32 {
    (f32::from(value) / 255.0 - 0.5) * 2.0
}

#[cfg(test)]
mod tests {
    use super::{INPUT_HEIGHT, INPUT_WIDTH, TENSOR_LEN, image_to_tensor_data};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png)
            .expect("encode png");
        buf.into_inner()
    }

    #[test]
    fn any_dimensions_produce_fixed_length_tensor_in_range() {
        let bytes = png_bytes(3, 5, [10, 128, 250]);
        let data = image_to_tensor_data(&bytes).expect("preprocess");
        assert_eq!(data.len(), TENSOR_LEN);
        assert!(data.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn pure_black_maps_to_minus_one() {
        let bytes = png_bytes(INPUT_WIDTH, INPUT_HEIGHT, [0, 0, 0]);
        let data = image_to_tensor_data(&bytes).expect("preprocess");
        assert!(data.iter().all(|v| *v == -1.0));
    }

    #[test]
    fn pure_white_maps_to_plus_one() {
        let bytes = png_bytes(INPUT_WIDTH, INPUT_HEIGHT, [255, 255, 255]);
        let data = image_to_tensor_data(&bytes).expect("preprocess");
        assert!(data.iter().all(|v| *v == 1.0));
    }

    #[test]
    fn channels_are_laid_out_as_planes() {
        // 纯红图：R 平面全 1.0，G/B 平面全 -1.0。
        let bytes = png_bytes(INPUT_WIDTH, INPUT_HEIGHT, [255, 0, 0]);
        let data = image_to_tensor_data(&bytes).expect("preprocess");

        let plane = (INPUT_WIDTH * INPUT_HEIGHT) as usize;
        assert!(data[..plane].iter().all(|v| *v == 1.0));
        assert!(data[plane..2 * plane].iter().all(|v| *v == -1.0));
        assert!(data[2 * plane..].iter().all(|v| *v == -1.0));
    }

    #[test]
    fn same_bytes_produce_identical_tensor() {
        let bytes = png_bytes(30, 40, [12, 200, 77]);
        let first = image_to_tensor_data(&bytes).expect("preprocess");
        let second = image_to_tensor_data(&bytes).expect("preprocess");
        assert_eq!(first, second);
    }

    #[test]
    fn corrupt_bytes_yield_invalid_image_error() {
        let result = image_to_tensor_data(b"definitely not an image");
        assert!(matches!(
            result,
            Err(crate::error::DetectError::InvalidImage)
        ));
    }

    #[test]
    fn empty_bytes_yield_invalid_image_error() {
        let result = image_to_tensor_data(&[]);
        assert!(matches!(
            result,
            Err(crate::error::DetectError::InvalidImage)
        ));
    }
}
