//! Tipos de dados para requisições e respostas do endpoint `generateContent`
//! do Vertex AI (modelos Gemini).
//!
//! Todas as structs derivam `Serialize` e `Deserialize` com nomes de campo
//! em camelCase, conforme o formato REST do Vertex AI.

use serde::{Deserialize, Serialize};

/// Parâmetros de geração de um job, independentes do formato de rede.
///
/// Convertidos em [`GenerateContentRequest`] no momento da chamada.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    /// Número máximo de tokens na resposta gerada.
    pub max_output_tokens: u32,
    /// Temperatura de amostragem. `None` usa o padrão do provedor.
    pub temperature: Option<f32>,
    /// Limiares de segurança por categoria. Vazio usa os padrões do provedor.
    pub safety_settings: Vec<SafetySetting>,
}

impl GenerationParams {
    /// Monta o corpo da requisição `generateContent` para o prompt dado.
    pub fn to_request(&self, prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: Some(GenerationConfig {
                max_output_tokens: self.max_output_tokens,
                temperature: self.temperature,
            }),
            safety_settings: if self.safety_settings.is_empty() {
                None
            } else {
                Some(self.safety_settings.clone())
            },
        }
    }
}

/// Corpo da requisição para `models/{model}:generateContent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Conteúdo da conversa; aqui sempre uma única mensagem de usuário.
    pub contents: Vec<Content>,
    /// Configuração de geração (tokens, temperatura).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    /// Limiares de segurança. Omitido quando não há overrides.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_settings: Option<Vec<SafetySetting>>,
}

/// Um turno de conversa (papel + partes de conteúdo).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    /// Papel do remetente: "user" ou "model".
    #[serde(default)]
    pub role: String,
    /// Partes textuais deste turno.
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Uma parte textual de um turno.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// Configuração de geração enviada na requisição.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Par categoria/limiar de segurança (ex.: `HARM_CATEGORY_HARASSMENT` /
/// `BLOCK_ONLY_HIGH`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

/// Resposta do endpoint `generateContent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidatos gerados. Pode vir vazio quando o prompt é bloqueado.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Diagnóstico sobre o prompt (motivo de bloqueio, se houver).
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
    /// Contagem de tokens consumidos, quando informada.
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

/// Um candidato de resposta.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Conteúdo gerado. Ausente quando a geração foi bloqueada.
    #[serde(default)]
    pub content: Option<Content>,
    /// Motivo do término da geração (ex.: "STOP", "MAX_TOKENS").
    #[serde(default)]
    pub finish_reason: Option<String>,
    /// Mensagem legível sobre um término antecipado, quando presente.
    #[serde(default)]
    pub finish_message: Option<String>,
}

/// Diagnóstico do prompt retornado pela API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
    #[serde(default)]
    pub block_reason_message: Option<String>,
}

/// Estatísticas de consumo de tokens de uma chamada.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
    #[serde(default)]
    pub total_token_count: u32,
}

/// Resultado já destilado de uma chamada de geração: o texto concatenado do
/// primeiro candidato e avisos não-fatais (bloqueio de prompt, término
/// antecipado) a serem exibidos pelo chamador.
#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    pub warnings: Vec<String>,
}

impl GenerateContentResponse {
    /// Extrai o texto do primeiro candidato e coleta avisos de diagnóstico.
    ///
    /// Uma resposta sem candidatos ou sem conteúdo produz texto vazio — a
    /// política sobre respostas vazias é decidida pelo executor do job, não
    /// aqui.
    pub fn into_generation(self) -> Generation {
        let mut warnings = Vec::new();

        if let Some(feedback) = &self.prompt_feedback {
            let reason = feedback
                .block_reason_message
                .as_deref()
                .or(feedback.block_reason.as_deref());
            if let Some(reason) = reason {
                warnings.push(format!("prompt blocked: {reason}"));
            }
        }

        let mut text = String::new();
        if let Some(candidate) = self.candidates.into_iter().next() {
            if let Some(message) = candidate.finish_message {
                warnings.push(format!("generation finished early: {message}"));
            }
            if let Some(content) = candidate.content {
                for part in content.parts {
                    text.push_str(&part.text);
                }
            }
        }

        Generation { text, warnings }
    }
}
