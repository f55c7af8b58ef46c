// SPDX-License-Identifier: GPL-3.0-only

//! Planar YUV 4:2:0 to packed RGBA conversion
//!
//! Runs synchronously on the capture thread. The planes are first gathered
//! into a single semi-planar buffer with the two chroma planes interleaved in
//! swapped order (V sample before U, the NV21 convention the color transform
//! below expects), then converted to RGBA with full-range BT.601 integer
//! arithmetic.

use crate::capture::{PackedFrame, PlaneView, RawFrame};
use crate::errors::{PipelineError, PipelineResult};

/// Convert one raw 4:2:0 frame into a packed RGBA buffer
///
/// Pure function with no shared state. Fails with
/// [`PipelineError::MalformedFrame`] when the plane geometry is inconsistent
/// with the declared dimensions; the caller drops that frame and continues.
pub fn convert(frame: &RawFrame<'_>) -> PipelineResult<PackedFrame> {
    check_geometry(frame)?;

    let width = frame.width as usize;
    let height = frame.height as usize;

    let semi_planar = pack_semi_planar(frame);
    let y_plane = &semi_planar[..width * height];
    let vu_plane = &semi_planar[width * height..];

    let stride = frame.width * 4;
    let mut rgba = vec![0u8; stride as usize * height];

    for row in 0..height {
        convert_row(y_plane, vu_plane, &mut rgba, row, width, stride as usize);
    }

    Ok(PackedFrame {
        width: frame.width,
        height: frame.height,
        stride,
        rotation: frame.rotation,
        data: rgba,
    })
}

/// Validate 4:2:0 geometry: even dimensions, chroma planes at half size,
/// every plane long enough for its declared stride grid.
fn check_geometry(frame: &RawFrame<'_>) -> PipelineResult<()> {
    let width = frame.width as usize;
    let height = frame.height as usize;

    if width == 0 || height == 0 {
        return Err(PipelineError::MalformedFrame(format!(
            "zero dimension {}x{}",
            frame.width, frame.height
        )));
    }
    if width % 2 != 0 || height % 2 != 0 {
        return Err(PipelineError::MalformedFrame(format!(
            "odd dimensions {}x{} not representable in 4:2:0",
            frame.width, frame.height
        )));
    }

    check_plane("luma", &frame.luma, height, width)?;
    check_plane("chroma-u", &frame.chroma_u, height / 2, width / 2)?;
    check_plane("chroma-v", &frame.chroma_v, height / 2, width / 2)?;
    Ok(())
}

fn check_plane(name: &str, plane: &PlaneView<'_>, rows: usize, cols: usize) -> PipelineResult<()> {
    if plane.pixel_stride == 0 || plane.row_stride == 0 {
        return Err(PipelineError::MalformedFrame(format!(
            "{} plane has zero stride",
            name
        )));
    }
    let required = plane.required_len(rows, cols);
    if plane.data.len() < required {
        return Err(PipelineError::MalformedFrame(format!(
            "{} plane holds {} bytes, needs {} for {}x{}",
            name,
            plane.data.len(),
            required,
            cols,
            rows
        )));
    }
    Ok(())
}

/// Gather the three planes into one buffer: full luma plane first, then the
/// chroma samples interleaved V-before-U. The swap is deliberate; the row
/// converter reads the first chroma byte of each pair as V.
fn pack_semi_planar(frame: &RawFrame<'_>) -> Vec<u8> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let chroma_rows = height / 2;
    let chroma_cols = width / 2;

    let mut out = Vec::with_capacity(width * height + chroma_rows * chroma_cols * 2);

    for row in 0..height {
        for col in 0..width {
            out.push(frame.luma.sample(row, col));
        }
    }
    for row in 0..chroma_rows {
        for col in 0..chroma_cols {
            out.push(frame.chroma_v.sample(row, col));
            out.push(frame.chroma_u.sample(row, col));
        }
    }
    out
}

/// Convert one row of the semi-planar buffer to RGBA
///
/// Full-range BT.601, fixed-point with 7 fractional bits. Pixels are handled
/// in pairs so each chroma sample is read once.
#[inline]
fn convert_row(
    y_plane: &[u8],
    vu_plane: &[u8],
    rgba: &mut [u8],
    row: usize,
    width: usize,
    stride: usize,
) {
    let y_row_start = row * width;
    let vu_row_start = (row / 2) * width;
    let rgba_row_start = row * stride;

    for col in (0..width).step_by(2) {
        let vu_offset = vu_row_start + (col / 2) * 2;
        let v = vu_plane[vu_offset] as i32 - 128;
        let u = vu_plane[vu_offset + 1] as i32 - 128;

        let r_v = (179 * v) >> 7;
        let g_u = (44 * u) >> 7;
        let g_v = (91 * v) >> 7;
        let b_u = (227 * u) >> 7;

        for sub in 0..2 {
            let x = col + sub;
            if x >= width {
                break;
            }
            let y = y_plane[y_row_start + x] as i32;
            let offset = rgba_row_start + x * 4;
            rgba[offset] = (y + r_v).clamp(0, 255) as u8;
            rgba[offset + 1] = (y - g_u - g_v).clamp(0, 255) as u8;
            rgba[offset + 2] = (y + b_u).clamp(0, 255) as u8;
            rgba[offset + 3] = 255;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{Rotation, TestPatternSource};
    use crate::capture::FrameSource;

    fn packed_frame<'a>(
        width: u32,
        height: u32,
        luma: &'a [u8],
        chroma_u: &'a [u8],
        chroma_v: &'a [u8],
    ) -> RawFrame<'a> {
        RawFrame {
            width,
            height,
            luma: PlaneView::packed(luma, width as usize),
            chroma_u: PlaneView::packed(chroma_u, width as usize / 2),
            chroma_v: PlaneView::packed(chroma_v, width as usize / 2),
            rotation: Rotation::Deg0,
        }
    }

    #[test]
    fn test_output_dimensions_match_input() {
        let mut source = TestPatternSource::moving_gradient(32, 16, Rotation::Deg180);
        source
            .next_frame(&mut |frame| {
                let packed = convert(frame).unwrap();
                assert_eq!(packed.width, 32);
                assert_eq!(packed.height, 16);
                assert_eq!(packed.data.len(), 32 * 16 * 4);
                assert_eq!(packed.rotation, Rotation::Deg180);
            })
            .unwrap();
    }

    #[test]
    fn test_neutral_gray_round_trip() {
        // 640x480 all-128 planes must come out approximately mid-gray
        let mut source = TestPatternSource::solid(640, 480, 128, 128, 128);
        source
            .next_frame(&mut |frame| {
                let packed = convert(frame).unwrap();
                assert_eq!(packed.data.len(), 640 * 480 * 4);
                for chunk in packed.data.chunks_exact(4) {
                    for channel in &chunk[..3] {
                        assert!((*channel as i32 - 128).abs() <= 2, "channel {}", channel);
                    }
                    assert_eq!(chunk[3], 255);
                }
            })
            .unwrap();
    }

    #[test]
    fn test_high_v_reads_red() {
        let luma = vec![81u8; 4 * 4];
        let chroma_u = vec![90u8; 2 * 2];
        let chroma_v = vec![240u8; 2 * 2];
        let frame = packed_frame(4, 4, &luma, &chroma_u, &chroma_v);

        let packed = convert(&frame).unwrap();
        let [r, g, b, a] = packed.pixel(1, 1);
        assert!(r > 200, "r = {}", r);
        assert!(g < 40, "g = {}", g);
        assert!(b < 40, "b = {}", b);
        assert_eq!(a, 255);
    }

    #[test]
    fn test_mismatched_chroma_rejected() {
        let luma = vec![0u8; 8 * 8];
        let chroma_short = vec![0u8; 3]; // needs 4x4 = 16
        let chroma_ok = vec![0u8; 16];
        let frame = packed_frame(8, 8, &luma, &chroma_short, &chroma_ok);

        assert!(matches!(
            convert(&frame),
            Err(PipelineError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_odd_dimensions_rejected() {
        let luma = vec![0u8; 7 * 5];
        let chroma = vec![0u8; 12];
        let frame = RawFrame {
            width: 7,
            height: 5,
            luma: PlaneView::packed(&luma, 7),
            chroma_u: PlaneView::packed(&chroma, 3),
            chroma_v: PlaneView::packed(&chroma, 3),
            rotation: Rotation::Deg0,
        };
        assert!(matches!(
            convert(&frame),
            Err(PipelineError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_interleaved_chroma_matches_planar() {
        // Android-style semi-planar: U and V views alias one interleaved
        // buffer with pixel stride 2. Must decode identically to packed planes.
        let width = 4u32;
        let height = 4u32;
        let luma = vec![100u8; 16];
        let planar_u = vec![90u8, 110, 130, 150];
        let planar_v = vec![200u8, 180, 160, 140];

        let mut interleaved = Vec::new();
        for i in 0..4 {
            interleaved.push(planar_u[i]);
            interleaved.push(planar_v[i]);
        }

        let planar_frame = packed_frame(width, height, &luma, &planar_u, &planar_v);
        let semi_frame = RawFrame {
            width,
            height,
            luma: PlaneView::packed(&luma, 4),
            chroma_u: PlaneView {
                data: &interleaved,
                row_stride: 4,
                pixel_stride: 2,
            },
            chroma_v: PlaneView {
                data: &interleaved[1..],
                row_stride: 4,
                pixel_stride: 2,
            },
            rotation: Rotation::Deg0,
        };

        let from_planar = convert(&planar_frame).unwrap();
        let from_semi = convert(&semi_frame).unwrap();
        assert_eq!(from_planar.data, from_semi.data);
    }
}
