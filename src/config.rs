//! Configuração do promptbatch carregada a partir de `promptbatch.toml`.
//!
//! A struct [`BatchConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis. Precedência:
//! flags da CLI > variáveis de ambiente (`INPUT_DIR`, `OUTPUT_DIR`,
//! `GEMINI_MODEL`, `GOOGLE_PROJECT_ID`, `GOOGLE_ACCESS_TOKEN`, `MAX_TOKENS`)
//! > arquivo de configuração > defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cli::RunArgs;
use crate::error::BatchError;
use crate::gemini::{GenerationParams, SafetySetting};

/// Configuração de nível superior carregada de `promptbatch.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    /// Diretório com os arquivos `.prompt` de entrada.
    #[serde(default)]
    pub input_dir: PathBuf,

    /// Diretório onde as saídas são gravadas (criado se não existir).
    #[serde(default)]
    pub output_dir: PathBuf,

    /// Identificador do modelo Gemini (ex.: "gemini-pro").
    #[serde(default)]
    pub model: String,

    /// Projeto Google Cloud que hospeda o endpoint.
    #[serde(default)]
    pub project_id: String,

    /// Token de acesso OAuth (ex.: saída de `gcloud auth print-access-token`).
    #[serde(default)]
    pub access_token: String,

    /// Número máximo de tokens por resposta gerada.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Temperatura de amostragem. `None` usa o padrão do provedor.
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Overrides de limiar de segurança por categoria.
    #[serde(default)]
    pub safety_settings: Vec<SafetySetting>,

    /// Máximo de jobs simultaneamente em voo.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Orçamento de requisições por minuto por região, usado para derivar o
    /// intervalo de admissão quando `interval_ms` não é definido.
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,

    /// Intervalo mínimo entre admissões, em milissegundos. Quando presente,
    /// tem precedência sobre o valor derivado de `requests_per_minute`.
    #[serde(default)]
    pub interval_ms: Option<u64>,

    /// Timeout de parede por job, em segundos.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Aborta novas admissões após este número de falhas. 0 = sem limite.
    #[serde(default)]
    pub fail_limit: u32,

    /// Trata resposta sem conteúdo como falha do job. O padrão (`false`)
    /// grava um arquivo de saída vazio, reproduzindo o comportamento
    /// historicamente observado.
    #[serde(default)]
    pub fail_on_empty: bool,

    /// Regiões entre as quais as requisições são distribuídas (round-robin).
    #[serde(default = "default_regions")]
    pub regions: Vec<String>,
}

// Valor padrão para tokens de saída: 8000.
fn default_max_output_tokens() -> u32 {
    8000
}

// Valor padrão para jobs em voo: 500.
fn default_workers() -> usize {
    500
}

// Orçamento padrão por região: 5 requisições por minuto.
fn default_requests_per_minute() -> u32 {
    5
}

// Timeout padrão por job: 5 minutos.
fn default_timeout_secs() -> u64 {
    300
}

// Regiões padrão: todas as localizações Vertex AI com Gemini disponível.
fn default_regions() -> Vec<String> {
    [
        "us-south1",
        "us-central1",
        "us-west4",
        "us-east1",
        "us-east4",
        "us-west1",
        "northamerica-northeast1",
        "southamerica-east1",
        "europe-west1",
        "europe-north1",
        "europe-west3",
        "europe-west2",
        "europe-southwest1",
        "europe-west8",
        "europe-west4",
        "europe-west9",
        "europe-central2",
        "europe-west6",
        "asia-east1",
        "asia-east2",
        "asia-south1",
        "asia-northeast3",
        "asia-southeast1",
        "australia-southeast1",
        "asia-northeast1",
        "me-west1",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::new(),
            output_dir: PathBuf::new(),
            model: String::new(),
            project_id: String::new(),
            access_token: String::new(),
            max_output_tokens: default_max_output_tokens(),
            temperature: None,
            safety_settings: Vec::new(),
            workers: default_workers(),
            requests_per_minute: default_requests_per_minute(),
            interval_ms: None,
            timeout_secs: default_timeout_secs(),
            fail_limit: 0,
            fail_on_empty: false,
            regions: default_regions(),
        }
    }
}

impl BatchConfig {
    /// Carrega a configuração de `promptbatch.toml` no diretório atual e
    /// aplica as variáveis de ambiente. Usa defaults se o arquivo não existir.
    pub fn load() -> Result<Self, BatchError> {
        Self::load_from(Path::new("promptbatch.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self, BatchError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<BatchConfig>(&contents)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    // Variáveis de ambiente têm precedência sobre o arquivo de configuração.
    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("INPUT_DIR")
            && !v.is_empty()
        {
            self.input_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("OUTPUT_DIR")
            && !v.is_empty()
        {
            self.output_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("GEMINI_MODEL")
            && !v.is_empty()
        {
            self.model = v;
        }
        if let Ok(v) = std::env::var("GOOGLE_PROJECT_ID")
            && !v.is_empty()
        {
            self.project_id = v;
        }
        if let Ok(v) = std::env::var("GOOGLE_ACCESS_TOKEN")
            && !v.is_empty()
        {
            self.access_token = v;
        }
        if let Ok(v) = std::env::var("MAX_TOKENS")
            && let Ok(tokens) = v.parse::<u32>()
        {
            self.max_output_tokens = tokens;
        }
    }

    /// Flags da CLI têm precedência sobre ambiente e arquivo.
    pub fn apply_run_args(&mut self, args: &RunArgs) {
        if let Some(dir) = &args.input_dir {
            self.input_dir = dir.clone();
        }
        if let Some(dir) = &args.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(model) = &args.model {
            self.model = model.clone();
        }
        if let Some(project) = &args.project {
            self.project_id = project.clone();
        }
        if let Some(workers) = args.workers {
            self.workers = workers;
        }
        if let Some(tokens) = args.max_tokens {
            self.max_output_tokens = tokens;
        }
        if let Some(temperature) = args.temperature {
            self.temperature = Some(temperature);
        }
        if let Some(interval) = args.interval_ms {
            self.interval_ms = Some(interval);
        }
        if let Some(rpm) = args.rpm {
            self.requests_per_minute = rpm;
        }
        if let Some(timeout) = args.timeout_secs {
            self.timeout_secs = timeout;
        }
        if let Some(limit) = args.fail_limit {
            self.fail_limit = limit;
        }
        if args.fail_on_empty {
            self.fail_on_empty = true;
        }
    }

    /// Valida os campos obrigatórios para uma execução real.
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.input_dir.as_os_str().is_empty() {
            return Err(BatchError::Config(
                "input directory not set (use --input-dir or INPUT_DIR)".into(),
            ));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(BatchError::Config(
                "output directory not set (use --output-dir or OUTPUT_DIR)".into(),
            ));
        }
        if self.model.is_empty() {
            return Err(BatchError::Config(
                "model not set (use --model or GEMINI_MODEL)".into(),
            ));
        }
        if self.project_id.is_empty() {
            return Err(BatchError::Config(
                "project not set (use --project or GOOGLE_PROJECT_ID)".into(),
            ));
        }
        if self.access_token.is_empty() {
            return Err(BatchError::Config(
                "access token not set (use GOOGLE_ACCESS_TOKEN)".into(),
            ));
        }
        if self.workers == 0 {
            return Err(BatchError::Config("workers must be at least 1".into()));
        }
        if self.regions.is_empty() {
            return Err(BatchError::Config(
                "at least one region must be configured".into(),
            ));
        }
        Ok(())
    }

    /// Espaçamento mínimo entre admissões: `interval_ms` quando definido,
    /// senão o orçamento por minuto dividido entre as regiões.
    pub fn admission_interval(&self) -> Duration {
        let ms = self.interval_ms.unwrap_or_else(|| {
            let per_minute = self.requests_per_minute as u64 * self.regions.len().max(1) as u64;
            60_000 / per_minute.max(1)
        });
        Duration::from_millis(ms.max(1))
    }

    /// Timeout de parede por job.
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parâmetros de geração compartilhados por todos os jobs do batch.
    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            max_output_tokens: self.max_output_tokens,
            temperature: self.temperature,
            safety_settings: self.safety_settings.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = BatchConfig::default();
        assert_eq!(config.max_output_tokens, 8000);
        assert_eq!(config.workers, 500);
        assert_eq!(config.requests_per_minute, 5);
        assert_eq!(config.timeout_secs, 300);
        assert_eq!(config.fail_limit, 0);
        assert!(!config.fail_on_empty);
        assert_eq!(config.regions.len(), 26);
        assert!(config.model.is_empty());
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            model = "gemini-pro"
            project_id = "my-project"
            workers = 8
            regions = ["us-central1", "europe-west4"]
        "#;
        let config: BatchConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.model, "gemini-pro");
        assert_eq!(config.workers, 8);
        assert_eq!(config.regions, vec!["us-central1", "europe-west4"]);
        // Campos omitidos mantêm os defaults.
        assert_eq!(config.max_output_tokens, 8000);
        assert_eq!(config.timeout_secs, 300);
    }

    #[test]
    fn deserialize_safety_settings() {
        let toml_str = r#"
            [[safety_settings]]
            category = "HARM_CATEGORY_HARASSMENT"
            threshold = "BLOCK_ONLY_HIGH"
        "#;
        let config: BatchConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.safety_settings.len(), 1);
        assert_eq!(config.safety_settings[0].threshold, "BLOCK_ONLY_HIGH");
    }

    #[test]
    fn admission_interval_derived_from_rpm_and_regions() {
        let config = BatchConfig::default();
        // 60000ms / (5 rpm * 26 regiões) = 461ms
        assert_eq!(config.admission_interval(), Duration::from_millis(461));
    }

    #[test]
    fn admission_interval_explicit_override() {
        let config = BatchConfig {
            interval_ms: Some(50),
            ..Default::default()
        };
        assert_eq!(config.admission_interval(), Duration::from_millis(50));
    }

    #[test]
    fn validate_rejects_missing_fields() {
        let config = BatchConfig::default();
        assert!(matches!(config.validate(), Err(BatchError::Config(_))));

        let config = BatchConfig {
            input_dir: "/in".into(),
            output_dir: "/out".into(),
            model: "gemini-pro".into(),
            project_id: "proj".into(),
            access_token: "tok".into(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let config = BatchConfig {
            input_dir: "/in".into(),
            output_dir: "/out".into(),
            model: "m".into(),
            project_id: "p".into(),
            access_token: "t".into(),
            workers: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(BatchError::Config(_))));
    }

    #[test]
    fn run_args_take_precedence() {
        let mut config = BatchConfig {
            model: "from-file".into(),
            ..Default::default()
        };
        let args = RunArgs {
            model: Some("from-cli".into()),
            workers: Some(3),
            fail_limit: Some(10),
            ..RunArgs::default()
        };
        config.apply_run_args(&args);
        assert_eq!(config.model, "from-cli");
        assert_eq!(config.workers, 3);
        assert_eq!(config.fail_limit, 10);
    }
}
