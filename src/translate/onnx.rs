//! Encoder/decoder translation model on ONNX Runtime.
//!
//! Expects an Optimum-style export: `encoder_model.onnx`
//! (`input_ids`, `attention_mask` -> `last_hidden_state`), `decoder_model.onnx`
//! (`input_ids`, `encoder_hidden_states`, `encoder_attention_mask` -> `logits`)
//! and a `tokenizer.json`. Decoding is greedy and re-runs the full decoder prefix
//! each step; there is no KV cache.

use super::{ModelLoader, Seq2SeqModel};
use crate::config::Config;
use crate::error::{ModelLoadError, TranslationError};
use ndarray::{Array2, Array3};
use ort::execution_providers::{
    CPUExecutionProvider, CUDAExecutionProvider, CoreMLExecutionProvider,
    DirectMLExecutionProvider, ExecutionProvider, ExecutionProviderDispatch,
};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

pub const ENCODER_FILE: &str = "encoder_model.onnx";
pub const DECODER_FILE: &str = "decoder_model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cpu,
    Cuda,
    CoreMl,
    DirectMl,
}

impl Device {
    /// `None` asks for automatic selection.
    pub fn from_preference(preference: &str) -> Option<Device> {
        match preference.trim().to_ascii_lowercase().as_str() {
            "cpu" => Some(Device::Cpu),
            "cuda" | "gpu" => Some(Device::Cuda),
            "coreml" | "mps" => Some(Device::CoreMl),
            "directml" | "dml" => Some(Device::DirectMl),
            "" | "auto" => None,
            other => {
                warn!("unknown device_preference '{other}', using auto");
                None
            }
        }
    }

    pub fn is_available(self) -> bool {
        let probe = match self {
            Device::Cpu => return true,
            Device::Cuda => CUDAExecutionProvider::default().is_available(),
            Device::CoreMl => CoreMLExecutionProvider::default().is_available(),
            Device::DirectMl => DirectMLExecutionProvider::default().is_available(),
        };
        probe.unwrap_or(false)
    }

    fn providers(self) -> Vec<ExecutionProviderDispatch> {
        let cpu = CPUExecutionProvider::default().build();
        match self {
            Device::Cpu => vec![cpu],
            Device::Cuda => vec![CUDAExecutionProvider::default().build(), cpu],
            Device::CoreMl => vec![CoreMLExecutionProvider::default().build(), cpu],
            Device::DirectMl => vec![DirectMLExecutionProvider::default().build(), cpu],
        }
    }
}

/// The preferred accelerator when present at runtime, otherwise CPU.
pub fn select_device(preference: &str) -> Device {
    match Device::from_preference(preference) {
        Some(device) if device.is_available() => device,
        Some(device) => {
            info!("{device:?} not available, falling back to cpu");
            Device::Cpu
        }
        None => [Device::Cuda, Device::CoreMl]
            .into_iter()
            .find(|d| d.is_available())
            .unwrap_or(Device::Cpu),
    }
}

/// Paths a model directory must provide, in load order.
pub fn required_files(model_dir: &Path) -> [PathBuf; 3] {
    [
        model_dir.join(TOKENIZER_FILE),
        model_dir.join(ENCODER_FILE),
        model_dir.join(DECODER_FILE),
    ]
}

pub struct OnnxLoader {
    model_dir: Option<PathBuf>,
    device_preference: String,
    max_input_tokens: usize,
}

impl OnnxLoader {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            model_dir: cfg.translation.model_dir(&cfg.paths.models_dir),
            device_preference: cfg.translation.device_preference.clone(),
            max_input_tokens: cfg.translation.max_input_tokens,
        }
    }
}

impl ModelLoader for OnnxLoader {
    fn load(&self) -> Result<Box<dyn Seq2SeqModel>, ModelLoadError> {
        let dir = self.model_dir.as_deref().ok_or(ModelLoadError::NotConfigured)?;
        let [tokenizer_path, encoder_path, decoder_path] = required_files(dir);
        for path in [&tokenizer_path, &encoder_path, &decoder_path] {
            if !path.exists() {
                return Err(ModelLoadError::MissingFile(path.clone()));
            }
        }

        let device = select_device(&self.device_preference);
        info!("loading translation model {} on {:?}", dir.display(), device);

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| ModelLoadError::Tokenizer(e.to_string()))?;
        let encoder = build_session(&encoder_path, device)?;
        let decoder = build_session(&decoder_path, device)?;

        let pad_id = tokenizer.token_to_id("<pad>").unwrap_or(1) as i64;
        let eos_id = tokenizer.token_to_id("</s>").unwrap_or(2) as i64;
        debug!("special tokens: pad={pad_id} eos={eos_id}");

        Ok(Box::new(OnnxSeq2Seq {
            tokenizer,
            encoder,
            decoder,
            pad_id,
            eos_id,
            // Decoding starts from EOS, as in Marian-family models.
            decoder_start_id: eos_id,
            max_input_tokens: self.max_input_tokens.max(2),
        }))
    }
}

fn build_session(path: &Path, device: Device) -> Result<Session, ModelLoadError> {
    Session::builder()
        .map_err(|e| session_error(path, e))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| session_error(path, e))?
        .with_execution_providers(device.providers())
        .map_err(|e| session_error(path, e))?
        .commit_from_file(path)
        .map_err(|e| session_error(path, e))
}

fn session_error(path: &Path, e: impl std::fmt::Display) -> ModelLoadError {
    ModelLoadError::Session {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

pub struct OnnxSeq2Seq {
    tokenizer: Tokenizer,
    encoder: Session,
    decoder: Session,
    pad_id: i64,
    eos_id: i64,
    decoder_start_id: i64,
    max_input_tokens: usize,
}

fn inference(e: impl std::fmt::Display) -> TranslationError {
    TranslationError::Inference(e.to_string())
}

fn output(e: impl std::fmt::Display) -> TranslationError {
    TranslationError::Output(e.to_string())
}

impl OnnxSeq2Seq {
    fn tokenize(&self, inputs: &[String]) -> Result<(Array2<i64>, Array2<i64>), TranslationError> {
        let encodings = self
            .tokenizer
            .encode_batch(inputs.to_vec(), true)
            .map_err(|e| TranslationError::Tokenize(e.to_string()))?;

        let rows: Vec<Vec<i64>> = encodings
            .iter()
            .map(|enc| {
                let mut ids: Vec<i64> = enc.get_ids().iter().map(|&id| id as i64).collect();
                if ids.len() > self.max_input_tokens {
                    ids.truncate(self.max_input_tokens - 1);
                    ids.push(self.eos_id);
                }
                ids
            })
            .collect();

        let width = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let mut input_ids = Array2::<i64>::from_elem((rows.len(), width), self.pad_id);
        let mut attention = Array2::<i64>::zeros((rows.len(), width));
        for (r, row) in rows.iter().enumerate() {
            for (c, &id) in row.iter().enumerate() {
                input_ids[[r, c]] = id;
                attention[[r, c]] = 1;
            }
        }
        Ok((input_ids, attention))
    }

    fn encode(
        &mut self,
        input_ids: Array2<i64>,
        attention: Array2<i64>,
    ) -> Result<Array3<f32>, TranslationError> {
        let outputs = self
            .encoder
            .run(ort::inputs![
                "input_ids" => Tensor::from_array(input_ids).map_err(inference)?,
                "attention_mask" => Tensor::from_array(attention).map_err(inference)?,
            ])
            .map_err(inference)?;

        let (shape, data) = outputs["last_hidden_state"]
            .try_extract_tensor::<f32>()
            .map_err(inference)?;
        if shape.len() != 3 {
            return Err(output(format!("encoder output shape {shape:?}")));
        }
        Array3::from_shape_vec(
            (shape[0] as usize, shape[1] as usize, shape[2] as usize),
            data.to_vec(),
        )
        .map_err(output)
    }

    /// Argmax token at the last decoder position, per row.
    fn next_tokens(
        &mut self,
        decoded: &[Vec<i64>],
        hidden: &Array3<f32>,
        attention: &Array2<i64>,
    ) -> Result<Vec<i64>, TranslationError> {
        let batch = decoded.len();
        let steps = decoded.first().map_or(0, Vec::len);
        let flat: Vec<i64> = decoded.iter().flatten().copied().collect();
        let ids = Array2::from_shape_vec((batch, steps), flat).map_err(output)?;

        let outputs = self
            .decoder
            .run(ort::inputs![
                "input_ids" => Tensor::from_array(ids).map_err(inference)?,
                "encoder_hidden_states" => Tensor::from_array(hidden.clone()).map_err(inference)?,
                "encoder_attention_mask" => Tensor::from_array(attention.clone()).map_err(inference)?,
            ])
            .map_err(inference)?;

        let (shape, logits) = outputs["logits"]
            .try_extract_tensor::<f32>()
            .map_err(inference)?;
        if shape.len() != 3 {
            return Err(output(format!("decoder logits shape {shape:?}")));
        }
        let seq = shape[1] as usize;
        let vocab = shape[2] as usize;

        (0..batch)
            .map(|row| {
                let offset = (row * seq + seq - 1) * vocab;
                let last = logits
                    .get(offset..offset + vocab)
                    .ok_or_else(|| output("logits shorter than declared shape"))?;
                last.iter()
                    .enumerate()
                    .max_by(|(_, a), (_, b)| a.total_cmp(b))
                    .map(|(idx, _)| idx as i64)
                    .ok_or_else(|| output("empty vocabulary"))
            })
            .collect()
    }
}

impl Seq2SeqModel for OnnxSeq2Seq {
    fn generate(
        &mut self,
        inputs: &[String],
        max_new_tokens: usize,
    ) -> Result<Vec<String>, TranslationError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let (input_ids, attention) = self.tokenize(inputs)?;
        let hidden = self.encode(input_ids, attention.clone())?;

        let batch = inputs.len();
        let mut decoded = vec![vec![self.decoder_start_id]; batch];
        let mut finished = vec![false; batch];

        for step in 0..max_new_tokens {
            let next = self.next_tokens(&decoded, &hidden, &attention)?;
            for (row, token) in next.into_iter().enumerate() {
                if finished[row] {
                    decoded[row].push(self.pad_id);
                    continue;
                }
                if token == self.eos_id {
                    finished[row] = true;
                }
                decoded[row].push(token);
            }
            if finished.iter().all(|&f| f) {
                debug!("all rows finished after {} steps", step + 1);
                break;
            }
        }

        decoded
            .iter()
            .map(|ids| {
                let ids: Vec<u32> = ids.iter().skip(1).map(|&id| id as u32).collect();
                self.tokenizer
                    .decode(&ids, true)
                    .map(|s| s.trim().to_string())
                    .map_err(|e| TranslationError::Tokenize(e.to_string()))
            })
            .collect()
    }
}
