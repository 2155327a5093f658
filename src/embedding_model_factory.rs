use anyhow::{Context, Result};
use fastembed::{
    read_file_to_bytes, InitOptionsUserDefined, Pooling, TextEmbedding, TokenizerFiles,
    UserDefinedEmbeddingModel,
};
use std::path::Path;
use tracing::info;

use crate::all_minilm_l6_v2::MODEL_NAME;

/// Loads the sentence-transformer exported to ONNX from `model_dir`.
///
/// The directory is expected to hold `onnx/model.onnx` next to the Hugging Face
/// tokenizer files.
pub fn get_model(model_dir: &Path) -> Result<TextEmbedding> {
    info!(model = MODEL_NAME, model_dir = %model_dir.display(), "loading embedding model");

    let onnx_path = model_dir.join("onnx").join("model.onnx");
    let tokenizer_path = model_dir.join("tokenizer.json");
    let config_path = model_dir.join("config.json");
    let special_tokens_map_path = model_dir.join("special_tokens_map.json");
    let tokenizer_config_path = model_dir.join("tokenizer_config.json");

    let onnx_bytes = read_file_to_bytes(&onnx_path)
        .with_context(|| format!("reading {}", onnx_path.display()))?;
    let tokenizer_file = read_file_to_bytes(&tokenizer_path)
        .with_context(|| format!("reading {}", tokenizer_path.display()))?;
    let config_file = read_file_to_bytes(&config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;
    let special_tokens_map_file = read_file_to_bytes(&special_tokens_map_path)
        .with_context(|| format!("reading {}", special_tokens_map_path.display()))?;
    let tokenizer_config_file = read_file_to_bytes(&tokenizer_config_path)
        .with_context(|| format!("reading {}", tokenizer_config_path.display()))?;

    let tokenizer_files: TokenizerFiles = TokenizerFiles {
        tokenizer_file,
        config_file,
        special_tokens_map_file,
        tokenizer_config_file,
    };

    let user_model =
        UserDefinedEmbeddingModel::new(onnx_bytes, tokenizer_files).with_pooling(Pooling::Mean);

    let model =
        TextEmbedding::try_new_from_user_defined(user_model, InitOptionsUserDefined::default())
            .context("initializing ONNX session")?;
    info!("embedding model ready");
    Ok(model)
}
