use serde::{Deserialize, Serialize};

use crate::{
    config::{EditConfig, WatermarkConfig},
    error::{ConfigError, Result},
    filter::graph::{FilterGraph, FilterStage},
};

/// Watermarks are display elements; past this height they stop being a
/// stamp and start being content.
pub const WATERMARK_MAX_HEIGHT_PX: u32 = 80;

/// Margin between a watermark and its anchoring corner, in pixels.
const WATERMARK_MARGIN_PX: u32 = 5;

/// Orientation policy for the crop/pad decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Portrait if the probed height exceeds the width, else landscape
    Auto,
    Portrait,
    Landscape,
}

impl Orientation {
    /// Resolve `auto` against the probed frame dimensions
    pub fn resolve(self, width: u32, height: u32) -> Orientation {
        match self {
            Orientation::Auto => {
                if height > width {
                    Orientation::Portrait
                } else {
                    Orientation::Landscape
                }
            }
            other => other,
        }
    }
}

/// Named corner for watermark placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkCorner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl WatermarkCorner {
    /// Overlay coordinate expressions relative to frame (W/H) and
    /// watermark (w/h) dimensions
    pub fn coords(self) -> String {
        let m = WATERMARK_MARGIN_PX;
        match self {
            WatermarkCorner::TopLeft => format!("{m}:{m}"),
            WatermarkCorner::TopRight => format!("W-w-{m}:{m}"),
            WatermarkCorner::BottomLeft => format!("{m}:H-h-{m}"),
            WatermarkCorner::BottomRight => format!("W-w-{m}:H-h-{m}"),
        }
    }
}

/// Watermark height for a given source frame, capped at the display
/// clamp
pub fn watermark_target_height(scale: f64, frame_height: u32) -> u32 {
    let target = (scale * frame_height as f64).round() as u32;
    target.min(WATERMARK_MAX_HEIGHT_PX)
}

/// Build the crop / pad / slow-down graph, optionally watermarked
///
/// Sources are positional: input 0 is the footage, input 1 (when a
/// watermark config is passed) the watermark image. The terminal label
/// is `outv` in every variant, including the pass-through case.
pub fn build_edit_graph(
    width: u32,
    height: u32,
    edit: &EditConfig,
    watermark: Option<&WatermarkConfig>,
) -> Result<FilterGraph> {
    let orientation = edit.orientation.resolve(width, height);
    let total_cut = edit.remove_top + edit.remove_bottom;

    if total_cut >= height {
        return Err(ConfigError::InvalidValue {
            key: "edit.remove_top+remove_bottom".to_string(),
            value: format!("{} (frame is only {} tall)", total_cut, height),
        }
        .into());
    }

    let mut chain: Vec<String> = Vec::new();

    match orientation {
        Orientation::Portrait => {
            let cropped_height = height - total_cut;
            let pad_top = (height - cropped_height) / 2;
            chain.push(format!("crop={}:{}:0:{}", width, cropped_height, edit.remove_top));
            chain.push(format!("pad={}:{}:0:{}", width, height, pad_top));
        }
        Orientation::Landscape => {
            if total_cut > 0 {
                let cropped_height = height - total_cut;
                chain.push(format!("crop={}:{}:0:{}", width, cropped_height, edit.remove_top));
            }
        }
        Orientation::Auto => unreachable!("resolved above"),
    }

    if edit.slow_down {
        chain.push(format!("setpts={}*PTS", edit.slow_down_factor));
    }

    let base_body = if chain.is_empty() {
        "null".to_string()
    } else {
        chain.join(",")
    };

    let graph = match watermark {
        Some(wm) => {
            let wm_height = watermark_target_height(wm.scale, height);
            let mut graph = FilterGraph::new(vec!["0:v".to_string(), "1:v".to_string()]);
            graph.push(FilterStage::new(vec!["0:v".to_string()], base_body, "v1".to_string()));
            graph.push(FilterStage::new(
                vec!["1:v".to_string()],
                format!("scale=-1:{}", wm_height),
                "wm".to_string(),
            ));
            graph.push(FilterStage::new(
                vec!["v1".to_string(), "wm".to_string()],
                format!("overlay={}", wm.position.coords()),
                "outv".to_string(),
            ));
            graph
        }
        None => {
            let mut graph = FilterGraph::new(vec!["0:v".to_string()]);
            graph.push(FilterStage::new(vec!["0:v".to_string()], base_body, "outv".to_string()));
            graph
        }
    };

    graph.validate()?;
    Ok(graph)
}

/// Build the looping-overlay compositing graph
///
/// Overlay inputs occupy positions 1..=count; each is composited atop
/// the previous label in order. Zero overlays collapse to a
/// pass-through `copy` stage.
pub fn build_overlay_graph(overlay_count: usize, position: (i64, i64)) -> Result<FilterGraph> {
    let mut sources = vec!["0:v".to_string()];
    for i in 1..=overlay_count {
        sources.push(format!("{}:v", i));
    }

    let mut graph = FilterGraph::new(sources);
    graph.push(FilterStage::new(
        vec!["0:v".to_string()],
        "null".to_string(),
        "base".to_string(),
    ));

    let mut label = "base".to_string();
    for i in 1..=overlay_count {
        let output = if i == overlay_count {
            "outv".to_string()
        } else {
            format!("tmp{}", i)
        };
        graph.push(FilterStage::new(
            vec![label.clone(), format!("{}:v", i)],
            format!("overlay={}:{}", position.0, position.1),
            output.clone(),
        ));
        label = output;
    }

    if overlay_count == 0 {
        graph.push(FilterStage::new(
            vec!["base".to_string()],
            "copy".to_string(),
            "outv".to_string(),
        ));
    }

    graph.validate()?;
    Ok(graph)
}

/// Build the N-way repeat graph
///
/// Splits the footage into `repeat_factor` branches, resets each
/// branch's timestamps, and concatenates them back to back.
pub fn build_multiply_graph(repeat_factor: u32) -> Result<FilterGraph> {
    let n = repeat_factor as usize;

    let mut graph = FilterGraph::new(vec!["0:v".to_string()]);
    graph.push(FilterStage::new(
        vec!["0:v".to_string()],
        "null".to_string(),
        "base".to_string(),
    ));

    let branches: Vec<String> = (0..n).map(|i| format!("m{}", i)).collect();
    graph.push(FilterStage::with_outputs(
        vec!["base".to_string()],
        format!("split={}", n),
        branches.clone(),
    ));

    let mut reset: Vec<String> = Vec::with_capacity(n);
    for (i, branch) in branches.iter().enumerate() {
        let output = format!("p{}", i);
        graph.push(FilterStage::new(
            vec![branch.clone()],
            "setpts=N/FRAME_RATE/TB".to_string(),
            output.clone(),
        ));
        reset.push(output);
    }

    graph.push(FilterStage::new(
        reset,
        format!("concat=n={}:v=1:a=0", n),
        "outv".to_string(),
    ));

    graph.validate()?;
    Ok(graph)
}

/// Build the re-encode concatenation graph for the assembly fallback
///
/// Each input is normalized to the reference geometry (fit inside,
/// pad to size, constant frame rate, square pixels) before the concat
/// stage joins them.
pub fn build_assembly_concat_graph(
    input_count: usize,
    width: u32,
    height: u32,
    fps: u32,
) -> Result<FilterGraph> {
    let sources: Vec<String> = (0..input_count).map(|i| format!("{}:v", i)).collect();
    let mut graph = FilterGraph::new(sources.clone());

    let mut normalized = Vec::with_capacity(input_count);
    for (i, source) in sources.iter().enumerate() {
        let output = format!("c{}", i);
        graph.push(FilterStage::new(
            vec![source.clone()],
            format!(
                "scale={w}:{h}:force_original_aspect_ratio=decrease,\
                 pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,fps={fps},setsar=1",
                w = width,
                h = height,
                fps = fps,
            ),
            output.clone(),
        ));
        normalized.push(output);
    }

    graph.push(FilterStage::new(
        normalized,
        format!("concat=n={}:v=1:a=0", input_count),
        "outv".to_string(),
    ));

    graph.validate()?;
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EditConfig, WatermarkConfig};

    fn edit_config(top: u32, bottom: u32, orientation: Orientation, slow: Option<f64>) -> EditConfig {
        EditConfig {
            remove_top: top,
            remove_bottom: bottom,
            orientation,
            slow_down: slow.is_some(),
            slow_down_factor: slow.unwrap_or(2.0),
            add_music: false,
        }
    }

    #[test]
    fn test_portrait_crops_and_repads() {
        let cfg = edit_config(50, 0, Orientation::Portrait, None);
        let graph = build_edit_graph(1080, 1920, &cfg, None).unwrap();

        assert_eq!(graph.render(), "[0:v]crop=1080:1870:0:50,pad=1080:1920:0:25[outv]");
    }

    #[test]
    fn test_landscape_crops_without_padding() {
        let cfg = edit_config(50, 30, Orientation::Landscape, None);
        let graph = build_edit_graph(1920, 1080, &cfg, None).unwrap();

        assert_eq!(graph.render(), "[0:v]crop=1920:1000:0:50[outv]");
    }

    #[test]
    fn test_landscape_without_cuts_is_passthrough() {
        let cfg = edit_config(0, 0, Orientation::Landscape, None);
        let graph = build_edit_graph(1920, 1080, &cfg, None).unwrap();

        assert_eq!(graph.render(), "[0:v]null[outv]");
    }

    #[test]
    fn test_auto_resolves_from_probed_dimensions() {
        assert_eq!(Orientation::Auto.resolve(1080, 1920), Orientation::Portrait);
        assert_eq!(Orientation::Auto.resolve(1920, 1080), Orientation::Landscape);
        // Square frames count as landscape
        assert_eq!(Orientation::Auto.resolve(1080, 1080), Orientation::Landscape);
        assert_eq!(Orientation::Portrait.resolve(1920, 1080), Orientation::Portrait);
    }

    #[test]
    fn test_slow_down_appends_timestamp_rescale() {
        let cfg = edit_config(50, 0, Orientation::Landscape, Some(2.0));
        let graph = build_edit_graph(1920, 1080, &cfg, None).unwrap();

        assert_eq!(graph.render(), "[0:v]crop=1920:1030:0:50,setpts=2*PTS[outv]");

        // Applied even when nothing else is
        let cfg = edit_config(0, 0, Orientation::Landscape, Some(1.5));
        let graph = build_edit_graph(1920, 1080, &cfg, None).unwrap();
        assert_eq!(graph.render(), "[0:v]setpts=1.5*PTS[outv]");
    }

    #[test]
    fn test_watermark_height_is_capped() {
        // 0.15 of 1080 is 162, the display clamp wins
        assert_eq!(watermark_target_height(0.15, 1080), 80);
        assert_eq!(watermark_target_height(0.05, 1080), 54);
        assert_eq!(watermark_target_height(0.1, 720), 72);
    }

    #[test]
    fn test_watermarked_graph_wires_both_inputs() {
        let cfg = edit_config(0, 0, Orientation::Landscape, None);
        let wm = WatermarkConfig {
            enabled: true,
            image: "logo.png".into(),
            position: WatermarkCorner::BottomRight,
            scale: 0.15,
        };
        let graph = build_edit_graph(1920, 1080, &cfg, Some(&wm)).unwrap();

        assert_eq!(
            graph.render(),
            "[0:v]null[v1];[1:v]scale=-1:80[wm];[v1][wm]overlay=W-w-5:H-h-5[outv]"
        );
        assert_eq!(graph.sources().len(), 2);
    }

    #[test]
    fn test_corner_coordinates() {
        assert_eq!(WatermarkCorner::TopLeft.coords(), "5:5");
        assert_eq!(WatermarkCorner::TopRight.coords(), "W-w-5:5");
        assert_eq!(WatermarkCorner::BottomLeft.coords(), "5:H-h-5");
        assert_eq!(WatermarkCorner::BottomRight.coords(), "W-w-5:H-h-5");
    }

    #[test]
    fn test_excessive_crop_is_rejected() {
        let cfg = edit_config(600, 600, Orientation::Portrait, None);
        assert!(build_edit_graph(1080, 1080, &cfg, None).is_err());
    }

    #[test]
    fn test_overlay_chain() {
        let graph = build_overlay_graph(2, (0, 0)).unwrap();
        assert_eq!(
            graph.render(),
            "[0:v]null[base];[base][1:v]overlay=0:0[tmp1];[tmp1][2:v]overlay=0:0[outv]"
        );
    }

    #[test]
    fn test_no_overlays_collapses_to_copy() {
        let graph = build_overlay_graph(0, (0, 0)).unwrap();
        assert_eq!(graph.render(), "[0:v]null[base];[base]copy[outv]");
    }

    #[test]
    fn test_multiply_graph_honors_factor() {
        let graph = build_multiply_graph(3).unwrap();
        assert_eq!(
            graph.render(),
            "[0:v]null[base];[base]split=3[m0][m1][m2];\
             [m0]setpts=N/FRAME_RATE/TB[p0];[m1]setpts=N/FRAME_RATE/TB[p1];\
             [m2]setpts=N/FRAME_RATE/TB[p2];[p0][p1][p2]concat=n=3:v=1:a=0[outv]"
        );
    }

    #[test]
    fn test_assembly_concat_graph() {
        let graph = build_assembly_concat_graph(2, 1920, 1080, 30).unwrap();
        let rendered = graph.render();

        assert!(rendered.starts_with("[0:v]scale=1920:1080:force_original_aspect_ratio=decrease"));
        assert!(rendered.contains("fps=30"));
        assert!(rendered.ends_with("[c0][c1]concat=n=2:v=1:a=0[outv]"));
        assert_eq!(graph.output_label(), Some("outv"));
    }
}
