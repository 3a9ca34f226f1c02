use crate::error::{FilterError, Result};

/// One named filter stage
///
/// Reads the labeled `inputs`, applies `body`, and defines the labeled
/// `outputs`. Most stages have exactly one output; `split` is the
/// exception.
#[derive(Debug, Clone)]
pub struct FilterStage {
    pub inputs: Vec<String>,
    pub body: String,
    pub outputs: Vec<String>,
}

impl FilterStage {
    /// Single-output stage
    pub fn new<S: Into<String>>(inputs: Vec<S>, body: S, output: S) -> Self {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            body: body.into(),
            outputs: vec![output.into()],
        }
    }

    /// Multi-output stage (e.g. `split`)
    pub fn with_outputs<S: Into<String>>(inputs: Vec<S>, body: S, outputs: Vec<S>) -> Self {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            body: body.into(),
            outputs: outputs.into_iter().map(Into::into).collect(),
        }
    }
}

/// An ordered filter graph with declared source labels
///
/// Sources are the stream specifiers of the command's inputs
/// (`0:v`, `1:v`, ...); the graph must form a connected chain from
/// them to one terminal output label consumed by the mux `-map`.
#[derive(Debug, Clone)]
pub struct FilterGraph {
    sources: Vec<String>,
    stages: Vec<FilterStage>,
}

impl FilterGraph {
    pub fn new<S: Into<String>>(sources: Vec<S>) -> Self {
        Self {
            sources: sources.into_iter().map(Into::into).collect(),
            stages: Vec::new(),
        }
    }

    /// Declared sources for the graph's positional inputs
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn push(&mut self, stage: FilterStage) {
        self.stages.push(stage);
    }

    /// The terminal label, named by the mux step's `-map`
    pub fn output_label(&self) -> Option<&str> {
        self.stages
            .last()
            .and_then(|s| s.outputs.last())
            .map(String::as_str)
    }

    /// Check label connectivity
    ///
    /// Every label a stage reads must have been produced by an earlier
    /// stage or be a declared source, and no label may be defined
    /// twice. An empty graph is rejected.
    pub fn validate(&self) -> Result<()> {
        if self.stages.is_empty() {
            return Err(FilterError::EmptyGraph.into());
        }

        let mut defined: Vec<&str> = self.sources.iter().map(String::as_str).collect();

        for stage in &self.stages {
            for input in &stage.inputs {
                if !defined.contains(&input.as_str()) {
                    return Err(FilterError::UndefinedLabel { label: input.clone() }.into());
                }
            }
            for output in &stage.outputs {
                if defined.contains(&output.as_str()) {
                    return Err(FilterError::DuplicateLabel { label: output.clone() }.into());
                }
                defined.push(output);
            }
        }

        Ok(())
    }

    /// Serialize to the external tool's `-filter_complex` syntax
    ///
    /// Call [`validate`](Self::validate) first; rendering does not
    /// re-check connectivity.
    pub fn render(&self) -> String {
        self.stages
            .iter()
            .map(|stage| {
                let inputs: String = stage
                    .inputs
                    .iter()
                    .map(|l| format!("[{}]", l))
                    .collect();
                let outputs: String = stage
                    .outputs
                    .iter()
                    .map(|l| format!("[{}]", l))
                    .collect();
                format!("{}{}{}", inputs, stage.body, outputs)
            })
            .collect::<Vec<_>>()
            .join(";")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connected_chain_validates() {
        let mut graph = FilterGraph::new(vec!["0:v", "1:v"]);
        graph.push(FilterStage::new(vec!["0:v"], "crop=1920:980:0:50", "v1"));
        graph.push(FilterStage::new(vec!["1:v"], "scale=-1:80", "wm"));
        graph.push(FilterStage::new(vec!["v1", "wm"], "overlay=W-w-5:H-h-5", "outv"));

        assert!(graph.validate().is_ok());
        assert_eq!(graph.output_label(), Some("outv"));
    }

    #[test]
    fn test_render_syntax() {
        let mut graph = FilterGraph::new(vec!["0:v"]);
        graph.push(FilterStage::new(vec!["0:v"], "null", "base"));
        graph.push(FilterStage::new(vec!["base"], "copy", "outv"));

        assert_eq!(graph.render(), "[0:v]null[base];[base]copy[outv]");
    }

    #[test]
    fn test_undefined_input_label_is_rejected() {
        let mut graph = FilterGraph::new(vec!["0:v"]);
        graph.push(FilterStage::new(vec!["nope"], "null", "outv"));

        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_forward_reference_is_rejected() {
        // [late] is produced by a later stage; referencing it early must fail
        let mut graph = FilterGraph::new(vec!["0:v"]);
        graph.push(FilterStage::new(vec!["late"], "copy", "outv"));
        graph.push(FilterStage::new(vec!["0:v"], "null", "late"));

        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_duplicate_label_is_rejected() {
        let mut graph = FilterGraph::new(vec!["0:v"]);
        graph.push(FilterStage::new(vec!["0:v"], "null", "x"));
        graph.push(FilterStage::new(vec!["x"], "copy", "x"));

        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_empty_graph_is_rejected() {
        let graph = FilterGraph::new(vec!["0:v"]);
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_multi_output_stage() {
        let mut graph = FilterGraph::new(vec!["0:v"]);
        graph.push(FilterStage::with_outputs(vec!["0:v"], "split=2", vec!["a", "b"]));
        graph.push(FilterStage::new(vec!["a", "b"], "concat=n=2:v=1:a=0", "outv"));

        assert!(graph.validate().is_ok());
        assert_eq!(graph.render(), "[0:v]split=2[a][b];[a][b]concat=n=2:v=1:a=0[outv]");
    }
}
