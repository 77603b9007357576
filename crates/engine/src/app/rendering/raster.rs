use crate::app::geometry::{PixelRect, Rect};

use super::canvas::DrawParams;

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RgbaImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl RgbaImage {
    fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let bytes = self.rgba.get(offset..offset + 4)?;
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

pub(crate) fn fill(frame: &mut [u8], color: [u8; 4]) {
    for chunk in frame.chunks_exact_mut(4) {
        chunk.copy_from_slice(&color);
    }
}

/// Nearest-neighbour copy of `source` (texture pixels) into `destination`
/// (screen pixels). Fully transparent texels are skipped.
pub(crate) fn blit(
    frame: &mut [u8],
    frame_width: u32,
    frame_height: u32,
    image: &RgbaImage,
    source: PixelRect,
    destination: Rect,
    params: DrawParams,
) {
    if source.width == 0
        || source.height == 0
        || !source.fits_within(image.width, image.height)
        || !(destination.width > 0.0 && destination.height > 0.0)
    {
        return;
    }

    let pivot = params
        .rotation
        .map(|rotation| {
            (
                destination.x + rotation.pivot.x,
                destination.y + rotation.pivot.y,
            )
        })
        .unwrap_or((destination.x, destination.y));
    let (sin, cos) = params
        .rotation
        .map(|rotation| rotation.degrees.to_radians().sin_cos())
        .unwrap_or((0.0, 1.0));

    let (min_x, min_y, max_x, max_y) = rotated_bounds(destination, pivot, sin, cos);
    let draw_left = min_x.floor().max(0.0) as i64;
    let draw_top = min_y.floor().max(0.0) as i64;
    let draw_right = (max_x.ceil() as i64).min(i64::from(frame_width));
    let draw_bottom = (max_y.ceil() as i64).min(i64::from(frame_height));
    if draw_left >= draw_right || draw_top >= draw_bottom {
        return;
    }

    let scale_x = source.width as f32 / destination.width;
    let scale_y = source.height as f32 / destination.height;
    let frame_width = frame_width as usize;

    for out_y in draw_top..draw_bottom {
        for out_x in draw_left..draw_right {
            // Sample at the pixel center, undoing the rotation about the pivot.
            let px = out_x as f32 + 0.5 - pivot.0;
            let py = out_y as f32 + 0.5 - pivot.1;
            let local_x = px * cos + py * sin + pivot.0 - destination.x;
            let local_y = -px * sin + py * cos + pivot.1 - destination.y;
            if local_x < 0.0
                || local_y < 0.0
                || local_x >= destination.width
                || local_y >= destination.height
            {
                continue;
            }
            let mut texel_x = ((local_x * scale_x) as u32).min(source.width - 1);
            let mut texel_y = ((local_y * scale_y) as u32).min(source.height - 1);
            if params.flip.horizontal {
                texel_x = source.width - 1 - texel_x;
            }
            if params.flip.vertical {
                texel_y = source.height - 1 - texel_y;
            }
            let Some(color) = image.pixel(source.x + texel_x, source.y + texel_y) else {
                continue;
            };
            if color[3] == 0 {
                continue;
            }
            let offset = (out_y as usize * frame_width + out_x as usize) * 4;
            if let Some(target) = frame.get_mut(offset..offset + 4) {
                target.copy_from_slice(&color);
            }
        }
    }
}

fn rotated_bounds(rect: Rect, pivot: (f32, f32), sin: f32, cos: f32) -> (f32, f32, f32, f32) {
    let corners = [
        (rect.x, rect.y),
        (rect.right(), rect.y),
        (rect.x, rect.bottom()),
        (rect.right(), rect.bottom()),
    ];
    corners.iter().fold(
        (f32::MAX, f32::MAX, f32::MIN, f32::MIN),
        |(min_x, min_y, max_x, max_y), &(x, y)| {
            let dx = x - pivot.0;
            let dy = y - pivot.1;
            let rx = dx * cos - dy * sin + pivot.0;
            let ry = dx * sin + dy * cos + pivot.1;
            (min_x.min(rx), min_y.min(ry), max_x.max(rx), max_y.max(ry))
        },
    )
}
