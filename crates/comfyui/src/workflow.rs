//! Workflow graphs and typed parameter injection.
//!
//! A workflow is ComfyUI's API-format graph: node id -> `{class_type, inputs}`.
//! Nodes are classified into a closed set of [`NodeKind`]s and a
//! [`NodeVisitor`] rewrites their inputs; unknown kinds are left alone.

use std::path::Path;

use serde_json::{json, Map, Value};

/// Placeholder texts marking which encoder receives which prompt.
pub const POSITIVE_PLACEHOLDER: &str = "positive";
pub const NEGATIVE_PLACEHOLDER: &str = "negative";

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("failed to read workflow file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid workflow JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("workflow must be a JSON object of nodes")]
    NotAnObject,
}

/// Node kinds the injector understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// `CLIPTextEncode`.
    TextEncoder,
    /// `PrimitiveStringMultiline`, a prompt fed into an encoder elsewhere.
    PromptText,
    /// `EmptyLatentImage` or `EmptySD3LatentImage`.
    ImageSize,
    /// `KSampler`.
    Sampler,
    /// `LoadImage`.
    ImageLoader,
    /// `CheckpointLoaderSimple`.
    Checkpoint,
    Unknown,
}

impl NodeKind {
    pub fn classify(class_type: &str) -> Self {
        match class_type {
            "CLIPTextEncode" => Self::TextEncoder,
            "PrimitiveStringMultiline" => Self::PromptText,
            "EmptyLatentImage" | "EmptySD3LatentImage" => Self::ImageSize,
            "KSampler" => Self::Sampler,
            "LoadImage" => Self::ImageLoader,
            "CheckpointLoaderSimple" => Self::Checkpoint,
            _ => Self::Unknown,
        }
    }
}

pub trait NodeVisitor {
    fn visit(&mut self, node_id: &str, kind: NodeKind, inputs: &mut Map<String, Value>);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
    nodes: Map<String, Value>,
}

impl Workflow {
    pub fn from_value(value: Value) -> Result<Self, WorkflowError> {
        match value {
            Value::Object(nodes) => Ok(Self { nodes }),
            _ => Err(WorkflowError::NotAnObject),
        }
    }

    pub fn load(path: &Path) -> Result<Self, WorkflowError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_value(serde_json::from_str(&text)?)
    }

    /// Built-in text-to-image graph: checkpoint, two encoders, empty latent,
    /// sampler, VAE decode, save.
    pub fn text_to_image() -> Self {
        let mut nodes = base_nodes();
        nodes.insert(
            "5".into(),
            json!({
                "class_type": "EmptyLatentImage",
                "inputs": {"width": 1024, "height": 576, "batch_size": 1}
            }),
        );
        nodes.insert("3".into(), sampler_node(1.0, json!(["5", 0])));
        Self { nodes }
    }

    /// Built-in image-to-image graph: the uploaded reference is VAE-encoded
    /// into the sampler's latent input.
    pub fn image_to_image() -> Self {
        let mut nodes = base_nodes();
        nodes.insert(
            "1".into(),
            json!({"class_type": "LoadImage", "inputs": {"image": "", "upload": "image"}}),
        );
        nodes.insert(
            "2".into(),
            json!({"class_type": "VAEEncode", "inputs": {"pixels": ["1", 0], "vae": ["4", 2]}}),
        );
        nodes.insert("3".into(), sampler_node(0.75, json!(["2", 0])));
        Self { nodes }
    }

    /// Visit every node in id order.
    pub fn accept<V: NodeVisitor>(&mut self, visitor: &mut V) {
        for (node_id, node) in self.nodes.iter_mut() {
            let kind = node
                .get("class_type")
                .and_then(Value::as_str)
                .map(NodeKind::classify)
                .unwrap_or(NodeKind::Unknown);
            if let Some(Value::Object(inputs)) = node.get_mut("inputs") {
                visitor.visit(node_id, kind, inputs);
            }
        }
    }

    pub fn node(&self, node_id: &str) -> Option<&Value> {
        self.nodes.get(node_id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn count(&self, kind: NodeKind) -> usize {
        self.nodes
            .values()
            .filter(|n| n.get("class_type").and_then(Value::as_str).map(NodeKind::classify) == Some(kind))
            .count()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.nodes.clone())
    }
}

fn base_nodes() -> Map<String, Value> {
    let mut nodes = Map::new();
    nodes.insert(
        "4".into(),
        json!({"class_type": "CheckpointLoaderSimple", "inputs": {"ckpt_name": "sd_xl_base_1.0.safetensors"}}),
    );
    nodes.insert(
        "6".into(),
        json!({"class_type": "CLIPTextEncode", "inputs": {"text": POSITIVE_PLACEHOLDER, "clip": ["4", 1]}}),
    );
    nodes.insert(
        "7".into(),
        json!({"class_type": "CLIPTextEncode", "inputs": {"text": NEGATIVE_PLACEHOLDER, "clip": ["4", 1]}}),
    );
    nodes.insert(
        "8".into(),
        json!({"class_type": "VAEDecode", "inputs": {"samples": ["3", 0], "vae": ["4", 2]}}),
    );
    nodes.insert(
        "9".into(),
        json!({"class_type": "SaveImage", "inputs": {"filename_prefix": "storyboard", "images": ["8", 0]}}),
    );
    nodes
}

fn sampler_node(denoise: f64, latent: Value) -> Value {
    json!({
        "class_type": "KSampler",
        "inputs": {
            "seed": 0,
            "steps": 20,
            "cfg": 7.0,
            "sampler_name": "euler",
            "scheduler": "normal",
            "denoise": denoise,
            "model": ["4", 0],
            "positive": ["6", 0],
            "negative": ["7", 0],
            "latent_image": latent
        }
    })
}

// ---------------------------------------------------------------------------
// Parameter injection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowParams {
    pub prompt: String,
    pub negative_prompt: String,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub cfg_scale: f64,
    pub sampler: String,
    pub scheduler: String,
    /// Negative means pick one at random.
    pub seed: i64,
    pub denoise: f64,
    /// Checkpoint name; empty keeps the graph's own.
    pub model: String,
    /// Uploaded image name for `LoadImage` nodes.
    pub reference_image: Option<String>,
}

impl Default for WorkflowParams {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            negative_prompt: String::new(),
            width: 1024,
            height: 576,
            steps: 20,
            cfg_scale: 7.0,
            sampler: "euler".to_string(),
            scheduler: "normal".to_string(),
            seed: -1,
            denoise: 1.0,
            model: String::new(),
            reference_image: None,
        }
    }
}

impl WorkflowParams {
    /// The seed to send: the configured one, or a fresh 32-bit value.
    pub fn resolved_seed(&self) -> u64 {
        if self.seed >= 0 {
            self.seed as u64
        } else {
            u64::from(rand::random::<u32>())
        }
    }
}

/// Writes [`WorkflowParams`] into a graph.
///
/// With `preserve_tuning` (custom workflows) only prompts, size, seed and the
/// reference image are set; sampler settings and the checkpoint are kept.
pub struct ParamInjector<'a> {
    params: &'a WorkflowParams,
    seed: u64,
    preserve_tuning: bool,
    prompt_injected: bool,
}

impl<'a> ParamInjector<'a> {
    pub fn new(params: &'a WorkflowParams, preserve_tuning: bool) -> Self {
        Self {
            params,
            seed: params.resolved_seed(),
            preserve_tuning,
            prompt_injected: false,
        }
    }

    /// Whether any node received the positive prompt.
    pub fn prompt_injected(&self) -> bool {
        self.prompt_injected
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl NodeVisitor for ParamInjector<'_> {
    fn visit(&mut self, node_id: &str, kind: NodeKind, inputs: &mut Map<String, Value>) {
        let p = self.params;
        match kind {
            NodeKind::PromptText => {
                if inputs.contains_key("value") {
                    inputs.insert("value".into(), Value::from(p.prompt.as_str()));
                    self.prompt_injected = true;
                }
            }
            NodeKind::TextEncoder => {
                // Linked inputs are arrays; only literal text is replaced.
                match inputs.get("text").and_then(Value::as_str) {
                    Some("") | Some(POSITIVE_PLACEHOLDER) => {
                        inputs.insert("text".into(), Value::from(p.prompt.as_str()));
                        self.prompt_injected = true;
                    }
                    Some(NEGATIVE_PLACEHOLDER) => {
                        inputs.insert("text".into(), Value::from(p.negative_prompt.as_str()));
                    }
                    _ => {}
                }
            }
            NodeKind::ImageSize => {
                if inputs.contains_key("width") {
                    inputs.insert("width".into(), Value::from(p.width));
                }
                if inputs.contains_key("height") {
                    inputs.insert("height".into(), Value::from(p.height));
                }
            }
            NodeKind::Sampler => {
                if inputs.contains_key("seed") {
                    inputs.insert("seed".into(), Value::from(self.seed));
                }
                if !self.preserve_tuning {
                    inputs.insert("steps".into(), Value::from(p.steps));
                    inputs.insert("cfg".into(), Value::from(p.cfg_scale));
                    inputs.insert("sampler_name".into(), Value::from(p.sampler.as_str()));
                    inputs.insert("scheduler".into(), Value::from(p.scheduler.as_str()));
                    inputs.insert("denoise".into(), Value::from(p.denoise));
                }
            }
            NodeKind::ImageLoader => {
                if let Some(name) = &p.reference_image {
                    inputs.insert("image".into(), Value::from(name.as_str()));
                }
            }
            NodeKind::Checkpoint => {
                if !self.preserve_tuning && !p.model.is_empty() {
                    inputs.insert("ckpt_name".into(), Value::from(p.model.as_str()));
                }
            }
            NodeKind::Unknown => {
                tracing::trace!(node_id, "Skipping node of unknown kind");
            }
        }
    }
}

/// Build the graph for one generation call.
///
/// A custom workflow is used with sampler tuning preserved; otherwise the
/// built-in image-to-image graph when a reference image is set, else
/// text-to-image.
pub fn prepare(custom: Option<&Workflow>, params: &WorkflowParams) -> (Workflow, u64) {
    let (mut workflow, preserve_tuning) = match custom {
        Some(custom) => (custom.clone(), true),
        None if params.reference_image.is_some() => (Workflow::image_to_image(), false),
        None => (Workflow::text_to_image(), false),
    };
    let mut injector = ParamInjector::new(params, preserve_tuning);
    workflow.accept(&mut injector);
    if !injector.prompt_injected() {
        tracing::warn!("Workflow has no prompt input the injector recognises");
    }
    (workflow, injector.seed())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn params() -> WorkflowParams {
        WorkflowParams {
            prompt: "a cafe".into(),
            negative_prompt: "blurry".into(),
            width: 768,
            height: 1344,
            seed: 42,
            model: "custom.safetensors".into(),
            ..Default::default()
        }
    }

    fn input<'a>(workflow: &'a Workflow, node: &str, key: &str) -> &'a Value {
        &workflow.node(node).unwrap()["inputs"][key]
    }

    // -- built-in graphs --

    #[test]
    fn text_to_image_receives_every_parameter() {
        let (workflow, seed) = prepare(None, &params());
        assert_eq!(seed, 42);
        assert_eq!(input(&workflow, "6", "text"), "a cafe");
        assert_eq!(input(&workflow, "7", "text"), "blurry");
        assert_eq!(input(&workflow, "5", "width"), 768);
        assert_eq!(input(&workflow, "5", "height"), 1344);
        assert_eq!(input(&workflow, "3", "seed"), 42);
        assert_eq!(input(&workflow, "3", "denoise"), 1.0);
        assert_eq!(input(&workflow, "4", "ckpt_name"), "custom.safetensors");
        assert_eq!(workflow.count(NodeKind::ImageLoader), 0);
    }

    #[test]
    fn reference_image_selects_image_to_image_graph() {
        let p = WorkflowParams {
            reference_image: Some("ref.png".into()),
            denoise: 0.7,
            ..params()
        };
        let (workflow, _) = prepare(None, &p);
        assert_eq!(input(&workflow, "1", "image"), "ref.png");
        assert_eq!(input(&workflow, "3", "denoise"), 0.7);
        assert_eq!(input(&workflow, "3", "latent_image"), &json!(["2", 0]));
    }

    #[test]
    fn random_seed_fits_in_32_bits() {
        let p = WorkflowParams { seed: -1, ..params() };
        assert!(p.resolved_seed() <= u64::from(u32::MAX));
    }

    // -- custom graphs --

    #[test]
    fn custom_workflow_keeps_tuning_and_linked_inputs() {
        let custom = Workflow::from_value(json!({
            "10": {"class_type": "PrimitiveStringMultiline", "inputs": {"value": "old"}},
            "11": {"class_type": "CLIPTextEncode", "inputs": {"text": ["10", 0]}},
            "12": {"class_type": "EmptySD3LatentImage", "inputs": {"width": 1, "height": 1}},
            "13": {"class_type": "KSampler", "inputs": {"seed": 0, "steps": 8, "cfg": 1.0}},
            "14": {"class_type": "CheckpointLoaderSimple", "inputs": {"ckpt_name": "turbo"}},
            "15": {"class_type": "UpscaleModelLoader", "inputs": {"model_name": "x4"}}
        }))
        .unwrap();

        let (workflow, _) = prepare(Some(&custom), &params());
        assert_eq!(input(&workflow, "10", "value"), "a cafe");
        assert_eq!(input(&workflow, "11", "text"), &json!(["10", 0]));
        assert_eq!(input(&workflow, "12", "width"), 768);
        assert_eq!(input(&workflow, "13", "seed"), 42);
        assert_eq!(input(&workflow, "13", "steps"), 8);
        assert_eq!(input(&workflow, "14", "ckpt_name"), "turbo");
        assert_eq!(input(&workflow, "15", "model_name"), "x4");
    }

    #[test]
    fn non_object_workflow_is_rejected() {
        assert_matches!(Workflow::from_value(json!([1, 2])), Err(WorkflowError::NotAnObject));
    }

    #[test]
    fn workflow_loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flow.json");
        std::fs::write(&path, r#"{"1": {"class_type": "KSampler", "inputs": {}}}"#).unwrap();
        assert_eq!(Workflow::load(&path).unwrap().count(NodeKind::Sampler), 1);
        assert_matches!(
            Workflow::load(&dir.path().join("missing.json")),
            Err(WorkflowError::Io(_))
        );
    }
}
