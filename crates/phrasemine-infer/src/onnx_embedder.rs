//! ONNX-based sentence embedding engine.
//!
//! Loads a SentenceTransformers ONNX export and its tokenizer, runs padded
//! batch inference and mean-pools token embeddings into unit-length
//! sentence vectors. Requires the `onnx` feature.

#[cfg(feature = "onnx")]
mod inner {
    use std::path::Path;

    use ndarray::Array1;
    use ort::session::Session;
    use ort::value::Tensor;
    use parking_lot::Mutex;
    use tokenizers::Tokenizer;
    use tracing::info;

    use crate::embedder::{l2_normalize, EmbedderBackend};
    use phrasemine_core::{EmbeddingModel, Error, Result};

    /// Maximum sequence length for the model.
    const MAX_SEQ_LEN: usize = 256;

    /// ONNX embedding engine.
    pub struct OnnxEmbedder {
        session: Mutex<Session>,
        tokenizer: Tokenizer,
        dimension: usize,
        name: String,
    }

    impl OnnxEmbedder {
        /// Load an ONNX model and tokenizer from the given directory.
        ///
        /// Expects:
        /// - `model_dir/model.onnx`: the ONNX model file
        /// - `model_dir/tokenizer.json`: the HuggingFace tokenizer
        pub fn load(model_dir: &Path, model: EmbeddingModel) -> Result<Self> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");

            if !model_path.exists() {
                return Err(Error::Inference(format!(
                    "Model not found: {}",
                    model_path.display()
                )));
            }
            if !tokenizer_path.exists() {
                return Err(Error::Inference(format!(
                    "Tokenizer not found: {}",
                    tokenizer_path.display()
                )));
            }

            // With load-dynamic, ORT_DYLIB_PATH must point to libonnxruntime.so
            ort::init().commit();

            let session = Session::builder()
                .map_err(|e| Error::Inference(format!("Failed to create session builder: {}", e)))?
                .commit_from_file(&model_path)
                .map_err(|e| Error::Inference(format!("Failed to load ONNX model: {}", e)))?;

            let tokenizer = Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| Error::Inference(format!("Failed to load tokenizer: {}", e)))?;

            info!(
                "ONNX embedder loaded: model={}, dim={}, path={}",
                model,
                model.dimension(),
                model_path.display()
            );

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
                dimension: model.dimension(),
                name: format!("onnx:{}", model),
            })
        }

        /// Run one padded batch through the model.
        fn infer(&self, texts: &[&str]) -> Result<Vec<Array1<f32>>> {
            let encodings = self
                .tokenizer
                .encode_batch(texts.to_vec(), true)
                .map_err(|e| Error::Inference(format!("Tokenization failed: {}", e)))?;

            let batch = encodings.len();
            let seq_len = encodings
                .iter()
                .map(|e| e.get_ids().len().min(MAX_SEQ_LEN))
                .max()
                .unwrap_or(0)
                .max(1);

            let mut ids = vec![0i64; batch * seq_len];
            let mut mask = vec![0i64; batch * seq_len];
            for (row, encoding) in encodings.iter().enumerate() {
                let n = encoding.get_ids().len().min(MAX_SEQ_LEN);
                for col in 0..n {
                    ids[row * seq_len + col] = encoding.get_ids()[col] as i64;
                    mask[row * seq_len + col] = encoding.get_attention_mask()[col] as i64;
                }
            }
            let type_ids = vec![0i64; batch * seq_len];

            let ids_tensor = Tensor::from_array(([batch, seq_len], ids.clone()))
                .map_err(|e| Error::Inference(format!("ids tensor: {}", e)))?;
            let mask_tensor = Tensor::from_array(([batch, seq_len], mask.clone()))
                .map_err(|e| Error::Inference(format!("mask tensor: {}", e)))?;
            let type_ids_tensor = Tensor::from_array(([batch, seq_len], type_ids))
                .map_err(|e| Error::Inference(format!("type_ids tensor: {}", e)))?;

            let mut session = self.session.lock();
            let outputs = session
                .run(ort::inputs![ids_tensor, mask_tensor, type_ids_tensor])
                .map_err(|e| Error::Inference(format!("ONNX inference failed: {}", e)))?;

            let (shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| Error::Inference(format!("Failed to extract output: {}", e)))?;
            let dims: Vec<i64> = shape.iter().copied().collect();

            let mut out = Vec::with_capacity(batch);
            match dims.as_slice() {
                // Token embeddings [batch, seq, dim] → masked mean pooling
                [_, s, d] => {
                    let (s, d) = (*s as usize, *d as usize);
                    for row in 0..batch {
                        let mut pooled = Array1::<f32>::zeros(d);
                        let mut count = 0.0f32;
                        for tok in 0..s.min(seq_len) {
                            if mask[row * seq_len + tok] == 0 {
                                continue;
                            }
                            count += 1.0;
                            let offset = (row * s + tok) * d;
                            for k in 0..d {
                                pooled[k] += data[offset + k];
                            }
                        }
                        if count > 0.0 {
                            pooled /= count;
                        }
                        l2_normalize(&mut pooled);
                        out.push(pooled);
                    }
                }
                // Already pooled [batch, dim]
                [_, d] => {
                    let d = *d as usize;
                    for row in 0..batch {
                        let mut v = Array1::from_vec(data[row * d..(row + 1) * d].to_vec());
                        l2_normalize(&mut v);
                        out.push(v);
                    }
                }
                other => {
                    return Err(Error::Inference(format!("Unexpected output shape: {:?}", other)))
                }
            }
            Ok(out)
        }
    }

    impl EmbedderBackend for OnnxEmbedder {
        fn embed(&self, text: &str) -> Result<Array1<f32>> {
            self.infer(&[text])?
                .pop()
                .ok_or_else(|| Error::Inference("empty model output".into()))
        }

        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Array1<f32>>> {
            const CHUNK: usize = 64;
            let mut out = Vec::with_capacity(texts.len());
            for chunk in texts.chunks(CHUNK) {
                out.extend(self.infer(chunk)?);
            }
            Ok(out)
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn name(&self) -> &str {
            &self.name
        }
    }
}

#[cfg(feature = "onnx")]
pub use inner::OnnxEmbedder;
