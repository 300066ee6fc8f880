//! Offline backend that renders a placeholder frame.
//!
//! The frame is a vertical gradient with an inset teal border. The shot
//! number is drawn as a row of tally bars a third of the way down.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};

use crate::backend::{
    BackendError, BackendKind, GeneratedImage, ImageBackend, ImageToImageRequest, TextToImageRequest,
};

const CONSISTENCY_SCORE: f64 = 0.85;

const ACCENT: Rgb<u8> = Rgb([0x4e, 0xcd, 0xc4]);
const BORDER_INSET: u32 = 10;
const BORDER_WIDTH: u32 = 2;

const BAR_WIDTH: u32 = 6;
const BAR_GAP: u32 = 6;
const BAR_HEIGHT: u32 = 40;
const MAX_BARS: u32 = 40;

#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    delay: Duration,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long per image to mimic a real backend.
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

fn gradient(y: u32, height: u32) -> Rgb<u8> {
    let t = f64::from(y) / f64::from(height.max(1));
    Rgb([
        (26.0 + t * 20.0) as u8,
        (26.0 + t * 10.0) as u8,
        (46.0 + t * 30.0) as u8,
    ])
}

fn on_border(x: u32, y: u32, width: u32, height: u32) -> bool {
    if width <= 2 * BORDER_INSET || height <= 2 * BORDER_INSET {
        return false;
    }
    let (left, top) = (BORDER_INSET, BORDER_INSET);
    let (right, bottom) = (width - BORDER_INSET, height - BORDER_INSET);
    let within_x = (left..=right).contains(&x);
    let within_y = (top..=bottom).contains(&y);
    let near_vertical = x < left + BORDER_WIDTH || x + BORDER_WIDTH > right;
    let near_horizontal = y < top + BORDER_WIDTH || y + BORDER_WIDTH > bottom;
    within_x && within_y && (near_vertical || near_horizontal)
}

/// Render the placeholder for `shot_number` at `width` x `height`.
pub fn render_placeholder(shot_number: u32, width: u32, height: u32) -> RgbImage {
    let mut img = RgbImage::from_fn(width, height, |x, y| {
        if on_border(x, y, width, height) {
            ACCENT
        } else {
            gradient(y, height)
        }
    });

    let bars = shot_number.clamp(1, MAX_BARS);
    let row_width = bars * BAR_WIDTH + (bars - 1) * BAR_GAP;
    let start_x = width.saturating_sub(row_width) / 2;
    let start_y = height / 3;
    for bar in 0..bars {
        let x0 = start_x + bar * (BAR_WIDTH + BAR_GAP);
        for x in x0..(x0 + BAR_WIDTH).min(width) {
            for y in start_y..(start_y + BAR_HEIGHT).min(height) {
                img.put_pixel(x, y, ACCENT);
            }
        }
    }
    img
}

fn encode_png(img: &RgbImage) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| BackendError::Api(format!("Mock generation failed: {e}")))?;
    Ok(buf)
}

#[async_trait]
impl ImageBackend for MockBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Mock
    }

    async fn check_availability(&self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn text_to_image(&self, request: &TextToImageRequest) -> Result<GeneratedImage, BackendError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let (shot_number, width, height) = (request.shot_number, request.width, request.height);
        request.on_step.report(1, 1);

        let bytes = tokio::task::spawn_blocking(move || encode_png(&render_placeholder(shot_number, width, height)))
            .await
            .map_err(|e| BackendError::Api(format!("Mock generation failed: {e}")))??;

        Ok(GeneratedImage {
            bytes,
            consistency_score: CONSISTENCY_SCORE,
        })
    }

    async fn image_to_image(&self, request: &ImageToImageRequest) -> Result<GeneratedImage, BackendError> {
        self.text_to_image(&request.base).await
    }
}

#[cfg(test)]
mod tests {
    use crate::backend::SamplerDefaults;

    use super::*;

    #[test]
    fn gradient_runs_from_top_to_bottom() {
        let img = render_placeholder(1, 200, 100);
        assert_eq!(*img.get_pixel(50, 0), Rgb([26, 26, 46]));
        assert_eq!(*img.get_pixel(50, 99), Rgb([45, 35, 75]));
    }

    #[test]
    fn border_is_inset_and_two_pixels_wide() {
        let img = render_placeholder(1, 200, 100);
        assert_eq!(*img.get_pixel(10, 50), ACCENT);
        assert_eq!(*img.get_pixel(11, 50), ACCENT);
        assert_ne!(*img.get_pixel(12, 50), ACCENT);
        assert_ne!(*img.get_pixel(9, 50), ACCENT);
        assert_eq!(*img.get_pixel(100, 90), ACCENT);
    }

    #[test]
    fn shot_number_sets_bar_count() {
        let count_bars = |img: &RgbImage| {
            let y = img.height() / 3 + 1;
            let mut bars = 0;
            let mut inside = false;
            for x in 20..img.width() - 20 {
                let lit = *img.get_pixel(x, y) == ACCENT;
                if lit && !inside {
                    bars += 1;
                }
                inside = lit;
            }
            bars
        };
        assert_eq!(count_bars(&render_placeholder(3, 400, 200)), 3);
        assert_eq!(count_bars(&render_placeholder(7, 400, 200)), 7);
    }

    #[tokio::test]
    async fn produces_decodable_png_at_requested_size() {
        let backend = MockBackend::new();
        let mut request = TextToImageRequest::new("anything", 576, 1024, &SamplerDefaults::default());
        request.shot_number = 2;
        let image = backend.text_to_image(&request).await.unwrap();
        assert_eq!(image.consistency_score, 0.85);

        let decoded = image::load_from_memory(&image.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (576, 1024));
    }
}
