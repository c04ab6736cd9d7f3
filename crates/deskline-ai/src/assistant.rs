use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use deskline_db::Database;
use deskline_types::models::KnowledgeItem;

use crate::provider::{CompletionProvider, CompletionRequest};

/// Display name stored on messages the assistant writes.
pub const AI_SENDER_NAME: &str = "Assistente IA";

/// Reply used whenever the provider cannot answer.
pub const FALLBACK_MESSAGE: &str = "Desculpe, estou enfrentando dificuldades técnicas no momento. Por favor, aguarde que um de nossos agentes irá atendê-lo em breve.";

const FALLBACK_CONFIDENCE: f32 = 0.1;
const KNOWLEDGE_CONFIDENCE: f32 = 0.8;
const GENERAL_CONFIDENCE: f32 = 0.6;

const HISTORY_WINDOW: usize = 10;
const MAX_SOURCES: usize = 3;

const SYSTEM_PROMPT: &str = "Você é um assistente de atendimento ao cliente inteligente e prestativo.

Suas responsabilidades:
1. Responder perguntas dos clientes com base no conhecimento fornecido
2. Ser cordial, profissional e útil
3. Se não souber a resposta, admitir e sugerir entrar em contato com um agente humano
4. Manter respostas concisas mas completas
5. Usar um tom amigável e profissional

Instruções importantes:
- Sempre priorize a informação da base de conhecimento do cliente
- Se a pergunta não estiver relacionada à base de conhecimento, responda de forma geral mas sugira falar com um agente
- Mantenha as respostas em português brasileiro
- Seja direto e objetivo, mas sempre educado";

const ANALYSIS_PROMPT: &str = "Analise a conversa e retorne um JSON com: sentiment (positive/neutral/negative), topics (array de tópicos principais), e summary (resumo em uma frase).";

/// Result of a provider-backed operation. `Fallback` carries the substitute
/// value together with the reason the provider was not used.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Provided(T),
    Fallback { value: T, reason: String },
}

impl<T> Outcome<T> {
    pub fn value(&self) -> &T {
        match self {
            Self::Provided(value) | Self::Fallback { value, .. } => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Provided(value) | Self::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiResponse {
    pub message: String,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_knowledge: Option<Vec<String>>,
}

impl AiResponse {
    fn fallback() -> Self {
        Self {
            message: FALLBACK_MESSAGE.to_string(),
            confidence: FALLBACK_CONFIDENCE,
            source_knowledge: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationAnalysis {
    pub sentiment: Sentiment,
    pub topics: Vec<String>,
    pub summary: String,
}

impl ConversationAnalysis {
    /// Substitute when the provider answered with something that is not the
    /// expected JSON object.
    pub fn unparseable() -> Self {
        Self::neutral("not available")
    }

    /// Substitute when the provider call itself failed.
    pub fn unavailable() -> Self {
        Self::neutral("")
    }

    fn neutral(summary: &str) -> Self {
        Self {
            sentiment: Sentiment::Neutral,
            topics: Vec::new(),
            summary: summary.to_string(),
        }
    }
}

/// Knowledge-grounded reply generation. Constructed with `None` as provider
/// when no API key is configured, in which case every call falls back.
pub struct Assistant {
    db: Arc<Database>,
    provider: Option<Arc<dyn CompletionProvider>>,
}

impl fmt::Debug for Assistant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assistant")
            .field("configured", &self.provider.is_some())
            .finish()
    }
}

impl Assistant {
    pub fn new(db: Arc<Database>, provider: Option<Arc<dyn CompletionProvider>>) -> Self {
        if provider.is_none() {
            warn!("OpenAI API key not configured");
        }
        Self { db, provider }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn generate_response(
        &self,
        message: &str,
        tenant_id: &str,
        history: &[String],
    ) -> Outcome<AiResponse> {
        let Some(provider) = &self.provider else {
            return fallback_response("provider not configured".into());
        };

        let knowledge = self.knowledge_for(tenant_id).await;
        let knowledge_context = knowledge
            .iter()
            .map(|item| format!("{}: {}", item.title, item.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        let recent = &history[history.len().saturating_sub(HISTORY_WINDOW)..];
        let request = CompletionRequest {
            system: SYSTEM_PROMPT.to_string(),
            user: user_content(&knowledge_context, recent, message),
            max_tokens: 500,
            temperature: 0.7,
        };

        let answer = match provider.complete(request).await {
            Ok(answer) if !answer.trim().is_empty() => answer,
            Ok(_) => {
                error!("Failed to generate AI response: empty completion");
                return fallback_response("empty completion".into());
            }
            Err(e) => {
                error!("Failed to generate AI response: {}", e);
                return fallback_response(e.to_string());
            }
        };

        let confidence = if knowledge.is_empty() {
            GENERAL_CONFIDENCE
        } else {
            KNOWLEDGE_CONFIDENCE
        };
        let sources = relevant_sources(message, &knowledge)
            .map(|item| item.title.clone())
            .collect();

        info!("AI response generated for client {}", tenant_id);
        Outcome::Provided(AiResponse {
            message: answer,
            confidence,
            source_knowledge: Some(sources),
        })
    }

    pub async fn analyze_conversation(&self, messages: &[String]) -> Outcome<ConversationAnalysis> {
        let Some(provider) = &self.provider else {
            return Outcome::Fallback {
                value: ConversationAnalysis::unavailable(),
                reason: "provider not configured".into(),
            };
        };

        let request = CompletionRequest {
            system: ANALYSIS_PROMPT.to_string(),
            user: messages.join("\n"),
            max_tokens: 300,
            temperature: 0.3,
        };

        let raw = match provider.complete(request).await {
            Ok(raw) if !raw.trim().is_empty() => raw,
            Ok(_) => {
                error!("Failed to analyze conversation: empty completion");
                return Outcome::Fallback {
                    value: ConversationAnalysis::unavailable(),
                    reason: "empty completion".into(),
                };
            }
            Err(e) => {
                error!("Failed to analyze conversation: {}", e);
                return Outcome::Fallback {
                    value: ConversationAnalysis::unavailable(),
                    reason: e.to_string(),
                };
            }
        };

        match serde_json::from_str::<ConversationAnalysis>(raw.trim()) {
            Ok(analysis) => Outcome::Provided(analysis),
            Err(e) => {
                warn!("Analysis response is not valid JSON: {}", e);
                Outcome::Fallback {
                    value: ConversationAnalysis::unparseable(),
                    reason: format!("unparseable analysis: {e}"),
                }
            }
        }
    }

    async fn knowledge_for(&self, tenant_id: &str) -> Vec<KnowledgeItem> {
        let tenant = tenant_id.to_string();
        match deskline_db::blocking(&self.db, move |db| db.active_knowledge(&tenant)).await {
            Ok(items) => items,
            Err(e) => {
                error!("Failed to get client knowledge: {}", e);
                Vec::new()
            }
        }
    }
}

fn fallback_response(reason: String) -> Outcome<AiResponse> {
    Outcome::Fallback {
        value: AiResponse::fallback(),
        reason,
    }
}

fn user_content(knowledge_context: &str, history: &[String], message: &str) -> String {
    let mut content = format!("Base de Conhecimento:\n{knowledge_context}\n\n");
    if !history.is_empty() {
        content.push_str("Histórico da conversa:\n");
        content.push_str(&history.join("\n"));
        content.push_str("\n\n");
    }
    content.push_str("Pergunta: ");
    content.push_str(message);
    content
}

/// Items whose title or content contains the message, or whose title the
/// message contains. Case-insensitive, at most three, in knowledge order.
fn relevant_sources<'a>(
    message: &str,
    knowledge: &'a [KnowledgeItem],
) -> impl Iterator<Item = &'a KnowledgeItem> {
    let needle = message.to_lowercase();
    knowledge
        .iter()
        .filter(move |item| {
            let title = item.title.to_lowercase();
            title.contains(&needle)
                || item.content.to_lowercase().contains(&needle)
                || needle.contains(&title)
        })
        .take(MAX_SOURCES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use deskline_types::models::KnowledgeType;

    use crate::openai::OpenAiProvider;
    use crate::provider::ProviderError;

    /// Replies with a fixed answer (or a failure) and records every request.
    struct ScriptedProvider {
        reply: Option<String>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn answering(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(reply.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn last_request(&self) -> CompletionRequest {
            self.seen.lock().unwrap().last().cloned().expect("no request")
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
            self.seen.lock().unwrap().push(request);
            self.reply.clone().ok_or(ProviderError::Status {
                status: 500,
                body: "boom".into(),
            })
        }
    }

    fn tenant_db() -> (Arc<Database>, String) {
        let db = Database::open_in_memory().unwrap();
        let owner = db.create_user("ai@example.com", "hash", "AI").unwrap();
        let tenant = db.create_tenant("Loja", None, owner.id).unwrap();
        (Arc::new(db), tenant.id)
    }

    fn assistant(db: &Arc<Database>, provider: Arc<ScriptedProvider>) -> Assistant {
        Assistant::new(Arc::clone(db), Some(provider))
    }

    #[tokio::test]
    async fn unreachable_provider_falls_back_without_error() {
        let (db, tenant) = tenant_db();
        // Nothing listens on port 1.
        let provider =
            OpenAiProvider::new("k", "m", "http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let assistant = Assistant::new(db, Some(Arc::new(provider)));

        let outcome = assistant.generate_response("Oi", &tenant, &[]).await;
        assert!(outcome.is_fallback());

        let response = outcome.into_inner();
        assert_eq!(response.message, FALLBACK_MESSAGE);
        assert_eq!(response.confidence, 0.1);
        assert_eq!(response.source_knowledge, None);
    }

    #[tokio::test]
    async fn missing_provider_falls_back() {
        let (db, tenant) = tenant_db();
        let assistant = Assistant::new(db, None);

        let outcome = assistant.generate_response("Oi", &tenant, &[]).await;
        assert!(
            matches!(&outcome, Outcome::Fallback { reason, .. } if reason == "provider not configured")
        );
        assert_eq!(outcome.value().confidence, 0.1);
    }

    #[tokio::test]
    async fn blank_completion_falls_back() {
        let (db, tenant) = tenant_db();
        let assistant = assistant(&db, ScriptedProvider::answering("   "));

        let response = assistant.generate_response("Oi", &tenant, &[]).await;
        assert!(response.is_fallback());
        assert_eq!(response.value().message, FALLBACK_MESSAGE);
    }

    #[tokio::test]
    async fn knowledge_raises_confidence_and_names_sources() {
        let (db, tenant) = tenant_db();
        for (title, content) in [
            ("Frete", "Frete grátis acima de R$100"),
            ("Trocas", "Trocas em até 7 dias"),
            ("Pagamento", "Aceitamos pix e cartão"),
        ] {
            db.add_knowledge(&tenant, title, content, KnowledgeType::Faq, None)
                .unwrap();
        }
        let provider = ScriptedProvider::answering("O frete é grátis acima de R$100.");
        let assistant = assistant(&db, provider.clone());

        let outcome = assistant
            .generate_response("Como funciona o FRETE?", &tenant, &[])
            .await;
        let Outcome::Provided(response) = outcome else {
            panic!("expected provider answer");
        };

        assert_eq!(response.message, "O frete é grátis acima de R$100.");
        assert_eq!(response.confidence, 0.8);
        assert_eq!(response.source_knowledge, Some(vec!["Frete".to_string()]));

        let request = provider.last_request();
        assert_eq!(request.system, SYSTEM_PROMPT);
        assert_eq!(request.max_tokens, 500);
        assert!(request.user.contains("Frete: Frete grátis acima de R$100"));
        assert!(request.user.ends_with("Pergunta: Como funciona o FRETE?"));
    }

    #[tokio::test]
    async fn no_knowledge_means_general_confidence() {
        let (db, tenant) = tenant_db();
        let assistant = assistant(&db, ScriptedProvider::answering("Olá!"));

        let response = assistant
            .generate_response("Oi", &tenant, &[])
            .await
            .into_inner();
        assert_eq!(response.confidence, 0.6);
        assert_eq!(response.source_knowledge, Some(Vec::new()));
    }

    #[tokio::test]
    async fn sources_are_capped_at_three() {
        let (db, tenant) = tenant_db();
        for i in 0..5 {
            db.add_knowledge(&tenant, &format!("Prazo {i}"), "prazo de entrega", KnowledgeType::Text, None)
                .unwrap();
        }
        let assistant = assistant(&db, ScriptedProvider::answering("Depende."));

        let response = assistant
            .generate_response("prazo", &tenant, &[])
            .await
            .into_inner();
        assert_eq!(response.source_knowledge.map(|s| s.len()), Some(3));
    }

    #[tokio::test]
    async fn only_last_ten_history_entries_are_sent() {
        let (db, tenant) = tenant_db();
        let provider = ScriptedProvider::answering("ok");
        let assistant = assistant(&db, provider.clone());

        let history: Vec<String> = (0..12).map(|i| format!("linha-{i:02}")).collect();
        assistant.generate_response("Oi", &tenant, &history).await;

        let user = provider.last_request().user;
        assert!(!user.contains("linha-00"));
        assert!(!user.contains("linha-01"));
        assert!(user.contains("linha-02"));
        assert!(user.contains("linha-11"));
    }

    #[tokio::test]
    async fn analysis_parses_provider_json() {
        let (db, _) = tenant_db();
        let provider = ScriptedProvider::answering(
            r#"{"sentiment": "negative", "topics": ["entrega"], "summary": "Cliente reclama do atraso."}"#,
        );
        let assistant = assistant(&db, provider.clone());

        let outcome = assistant
            .analyze_conversation(&["Meu pedido atrasou".into(), "Vamos verificar".into()])
            .await;
        assert_eq!(
            outcome,
            Outcome::Provided(ConversationAnalysis {
                sentiment: Sentiment::Negative,
                topics: vec!["entrega".into()],
                summary: "Cliente reclama do atraso.".into(),
            })
        );

        let request = provider.last_request();
        assert_eq!(request.user, "Meu pedido atrasou\nVamos verificar");
        assert_eq!(request.max_tokens, 300);
    }

    #[tokio::test]
    async fn analysis_that_is_not_json_uses_not_available() {
        let (db, _) = tenant_db();
        let assistant = assistant(&db, ScriptedProvider::answering("O cliente parece feliz."));

        let analysis = assistant.analyze_conversation(&["Obrigado!".into()]).await;
        assert!(analysis.is_fallback());
        assert_eq!(
            serde_json::to_value(analysis.into_inner()).unwrap(),
            serde_json::json!({"sentiment": "neutral", "topics": [], "summary": "not available"})
        );
    }

    #[tokio::test]
    async fn failed_analysis_call_uses_empty_summary() {
        let (db, _) = tenant_db();
        let assistant = assistant(&db, ScriptedProvider::failing());

        let analysis = assistant
            .analyze_conversation(&["Oi".into()])
            .await
            .into_inner();
        assert_eq!(analysis, ConversationAnalysis::unavailable());
        assert_eq!(analysis.summary, "");
    }
}
