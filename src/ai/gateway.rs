use std::{fmt::Write, sync::Arc};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
    fallback,
    provider::{CompletionRequest, ModelProvider, ProviderError},
};

/// Built-in preference order, tried after any operator-supplied models.
pub const DEFAULT_MODELS: [&str; 3] = ["llama-3.3-70b", "llama3.1-8b", "qwen-3-32b"];

pub const QUOTA_APOLOGY: &str = "🔄 L'assistant est temporairement indisponible en raison d'un trop grand nombre de requêtes. Veuillez réessayer dans quelques instants.";
pub const AUTH_APOLOGY: &str =
    "🔑 Configuration de l'assistant en cours. Veuillez contacter l'administrateur.";

const PERSONA: &str = "Tu es l'assistant intelligent de ManiocAgri, une plateforme agricole. \
Tu aides les utilisateurs (producteurs, clients, livreurs, administrateurs) sur des sujets comme \
le prix du manioc et de ses dérivés, les commandes, les livraisons et l'utilisation de la plateforme. \
Réponds de manière concise et professionnelle en français.";

pub const CATALOG_LIMIT: usize = 20;
const HISTORY_LIMIT: usize = 10;
const TEMPERATURE: f32 = 0.3;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

/// Snapshot of store state used to ground answers.
#[derive(Debug, Clone, Default)]
pub struct StoreDigest {
    pub products: Vec<ProductDigest>,
    pub recent_orders: usize,
}

#[derive(Debug, Clone)]
pub struct ProductDigest {
    pub name: String,
    pub price: i64,
    pub stock_quantity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Rate limited or out of quota: every other model shares the same account.
    Quota,
    /// Rejected credentials: no model will accept them either.
    Auth,
    /// Anything else; the next model may still answer.
    Transient,
}

pub fn classify(err: &ProviderError) -> FailureClass {
    if let ProviderError::Status { status, .. } = err {
        match status {
            429 => return FailureClass::Quota,
            401 | 403 => return FailureClass::Auth,
            _ => {}
        }
    }

    let text = err.to_string().to_lowercase();
    const QUOTA_PATTERNS: [&str; 4] = ["429", "quota", "ratelimit", "too many requests"];
    const QUOTA_WORDS: [&str; 1] = ["rate"];
    const AUTH_PATTERNS: [&str; 5] = [
        "401",
        "403",
        "invalid api key",
        "invalid_api_key",
        "unauthorized",
    ];

    let has_word = |word: &str| text.split(|c: char| !c.is_alphanumeric()).any(|w| w == word);

    if QUOTA_PATTERNS.iter().any(|p| text.contains(p))
        || QUOTA_WORDS.iter().any(|w| has_word(w))
    {
        FailureClass::Quota
    } else if AUTH_PATTERNS.iter().any(|p| text.contains(p)) {
        FailureClass::Auth
    } else {
        FailureClass::Transient
    }
}

/// Operator models first, then the defaults, without duplicates.
pub fn candidate_models(preferred: &[String]) -> Vec<String> {
    let mut models: Vec<String> = Vec::new();
    let defaults = DEFAULT_MODELS.iter().map(|m| m.to_string());
    for model in preferred.iter().cloned().chain(defaults) {
        let model = model.trim().to_string();
        if !model.is_empty() && !models.contains(&model) {
            models.push(model);
        }
    }
    models
}

/// Move currently served models ahead of the rest, keeping preference order
/// within each group.
pub fn prefer_available(candidates: Vec<String>, available: &[String]) -> Vec<String> {
    let (mut served, rest): (Vec<String>, Vec<String>) = candidates
        .into_iter()
        .partition(|model| available.iter().any(|a| a == model));
    served.extend(rest);
    served
}

pub fn build_system_prompt(digest: Option<&StoreDigest>) -> String {
    let mut system = String::from(PERSONA);
    let Some(digest) = digest else {
        return system;
    };

    if !digest.products.is_empty() {
        system.push_str("\n\nCatalogue actuel (nom / prix / stock) :\n");
        for product in digest.products.iter().take(CATALOG_LIMIT) {
            let _ = writeln!(
                system,
                "- {} : {} FCFA, stock {}",
                product.name, product.price, product.stock_quantity
            );
        }
    }
    let _ = write!(
        system,
        "\nNombre de commandes récentes : {}",
        digest.recent_orders
    );
    system
}

fn build_user_message(prompt: &str, history: &[ChatTurn]) -> String {
    let mut user = String::new();
    if !history.is_empty() {
        user.push_str("Historique :\n");
        let skip = history.len().saturating_sub(HISTORY_LIMIT);
        for turn in history.iter().skip(skip) {
            let _ = writeln!(user, "- {}: {}", turn.role, turn.content);
        }
        user.push('\n');
    }
    let _ = write!(user, "Utilisateur : {prompt}");
    user
}

/// Resilient entry point to the assistant. Tries each candidate model in
/// turn and never fails: provider trouble ends in a fixed apology or a local
/// degraded answer.
pub struct AiGateway {
    provider: Option<Arc<dyn ModelProvider>>,
    models: Vec<String>,
}

impl AiGateway {
    pub fn new(provider: Option<Arc<dyn ModelProvider>>, preferred: &[String]) -> Self {
        Self {
            provider,
            models: candidate_models(preferred),
        }
    }

    /// Gateway with no provider; every answer comes from the local responder.
    pub fn offline() -> Self {
        Self::new(None, &[])
    }

    async fn ordered_candidates(&self, provider: &dyn ModelProvider) -> Vec<String> {
        match provider.list_models().await {
            Ok(Some(available)) if !available.is_empty() => {
                prefer_available(self.models.clone(), &available)
            }
            Ok(_) => self.models.clone(),
            Err(err) => {
                tracing::debug!(error = %err, "model listing unavailable, keeping configured order");
                self.models.clone()
            }
        }
    }

    pub async fn ask(
        &self,
        prompt: &str,
        history: &[ChatTurn],
        digest: Option<&StoreDigest>,
    ) -> String {
        let Some(provider) = self.provider.as_deref() else {
            return fallback::degraded_reply(prompt, digest);
        };

        let system = build_system_prompt(digest);
        let user = build_user_message(prompt, history);

        for model in self.ordered_candidates(provider).await {
            let request = CompletionRequest {
                model: model.clone(),
                system: system.clone(),
                user: user.clone(),
                temperature: TEMPERATURE,
            };

            match provider.complete(request).await {
                Ok(text) if !text.trim().is_empty() => {
                    tracing::debug!(%model, "assistant answered");
                    return text;
                }
                Ok(_) => tracing::warn!(%model, "empty completion, trying next model"),
                Err(err) => match classify(&err) {
                    FailureClass::Quota => {
                        tracing::warn!(%model, error = %err, "provider quota exhausted");
                        return QUOTA_APOLOGY.to_string();
                    }
                    FailureClass::Auth => {
                        tracing::warn!(%model, error = %err, "provider rejected credentials");
                        return AUTH_APOLOGY.to_string();
                    }
                    FailureClass::Transient => {
                        tracing::warn!(%model, error = %err, "model call failed, trying next model");
                    }
                },
            }
        }

        tracing::warn!("no model answered, replying in degraded mode");
        fallback::degraded_reply(prompt, digest)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::ai::fallback::{DEGRADED_MARKER, SUMMARY_REPLY};

    enum Script {
        Answer(&'static str),
        Fail(fn() -> ProviderError),
        /// Fails for every model except the named one.
        OnlyFrom(&'static str),
    }

    struct ScriptedProvider {
        script: Script,
        listing: Option<Vec<String>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(script: Script) -> Self {
            Self {
                script,
                listing: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelProvider for ScriptedProvider {
        async fn list_models(&self) -> Result<Option<Vec<String>>, ProviderError> {
            Ok(self.listing.clone())
        }

        async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
            self.calls.lock().unwrap().push(request.model.clone());
            match &self.script {
                Script::Answer(text) => Ok(text.to_string()),
                Script::Fail(make) => Err(make()),
                Script::OnlyFrom(model) if request.model == *model => Ok("réponse".into()),
                Script::OnlyFrom(_) => Err(ProviderError::Http("connection reset".into())),
            }
        }
    }

    fn gateway(provider: Arc<ScriptedProvider>, preferred: &[&str]) -> AiGateway {
        let preferred: Vec<String> = preferred.iter().map(|m| m.to_string()).collect();
        AiGateway::new(Some(provider), &preferred)
    }

    #[test]
    fn override_models_lead_and_duplicates_drop() {
        let models = candidate_models(&["custom".into(), "llama3.1-8b".into(), "custom".into()]);
        assert_eq!(models, vec!["custom", "llama3.1-8b", "llama-3.3-70b", "qwen-3-32b"]);
    }

    #[test]
    fn available_models_move_first() {
        let ordered = prefer_available(
            vec!["a".into(), "b".into(), "c".into()],
            &["c".into(), "b".into()],
        );
        assert_eq!(ordered, vec!["b", "c", "a"]);
    }

    #[test]
    fn error_classes() {
        let quota = ProviderError::Status {
            status: 429,
            body: String::new(),
        };
        assert_eq!(classify(&quota), FailureClass::Quota);
        assert_eq!(
            classify(&ProviderError::Response("Quota exceeded for model".into())),
            FailureClass::Quota
        );
        assert_eq!(
            classify(&ProviderError::Response("Invalid API key provided".into())),
            FailureClass::Auth
        );
        assert_eq!(
            classify(&ProviderError::Status {
                status: 500,
                body: "internal".into()
            }),
            FailureClass::Transient
        );
        assert_eq!(
            classify(&ProviderError::Response("could not generate output".into())),
            FailureClass::Transient
        );
    }

    #[test]
    fn rate_as_a_word_is_a_quota_error() {
        for message in [
            "Request rate exceeded, slow down",
            "rate_limit_exceeded",
            "Rate-limited by upstream",
        ] {
            assert_eq!(
                classify(&ProviderError::Response(message.into())),
                FailureClass::Quota,
                "{message}"
            );
        }
        assert_eq!(
            classify(&ProviderError::Response("moderate load, accurate retry".into())),
            FailureClass::Transient
        );
    }

    #[tokio::test]
    async fn rate_exceeded_stops_the_model_chain() {
        let provider = Arc::new(ScriptedProvider::new(Script::Fail(|| {
            ProviderError::Response("Request rate exceeded, slow down".into())
        })));
        let reply = gateway(provider.clone(), &[]).ask("Salut", &[], None).await;
        assert_eq!(reply, QUOTA_APOLOGY);
        assert_eq!(provider.calls().len(), 1);
    }

    #[test]
    fn system_prompt_caps_catalog() {
        let digest = StoreDigest {
            products: (0..30)
                .map(|i| ProductDigest {
                    name: format!("Produit {i}"),
                    price: 100 + i,
                    stock_quantity: 5,
                })
                .collect(),
            recent_orders: 12,
        };
        let system = build_system_prompt(Some(&digest));
        assert!(system.contains("Produit 19 : 119 FCFA"));
        assert!(!system.contains("Produit 20 "));
        assert!(system.contains("commandes récentes : 12"));
    }

    #[tokio::test]
    async fn offline_gateway_answers_summary_locally() {
        let reply = AiGateway::offline()
            .ask("Donne-moi un résumé de la plateforme", &[], None)
            .await;
        assert_eq!(reply, SUMMARY_REPLY);
    }

    #[tokio::test]
    async fn first_success_wins() {
        let provider = Arc::new(ScriptedProvider::new(Script::Answer("Bonjour !")));
        let reply = gateway(provider.clone(), &[]).ask("Salut", &[], None).await;
        assert_eq!(reply, "Bonjour !");
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test]
    async fn quota_error_stops_after_first_model() {
        let provider = Arc::new(ScriptedProvider::new(Script::Fail(|| {
            ProviderError::Response("429 You exceeded your current quota".into())
        })));
        let reply = gateway(provider.clone(), &[]).ask("Salut", &[], None).await;
        assert_eq!(reply, QUOTA_APOLOGY);
        assert_eq!(provider.calls(), vec![DEFAULT_MODELS[0].to_string()]);
    }

    #[tokio::test]
    async fn auth_error_stops_immediately() {
        let provider = Arc::new(ScriptedProvider::new(Script::Fail(|| {
            ProviderError::Status {
                status: 401,
                body: "invalid api key".into(),
            }
        })));
        let reply = gateway(provider.clone(), &[]).ask("Salut", &[], None).await;
        assert_eq!(reply, AUTH_APOLOGY);
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test]
    async fn transient_errors_fall_through_to_next_model() {
        let provider = Arc::new(ScriptedProvider::new(Script::OnlyFrom("qwen-3-32b")));
        let reply = gateway(provider.clone(), &[]).ask("Salut", &[], None).await;
        assert_eq!(reply, "réponse");
        assert_eq!(
            provider.calls(),
            vec!["llama-3.3-70b", "llama3.1-8b", "qwen-3-32b"]
        );
    }

    #[tokio::test]
    async fn exhausted_models_degrade_locally() {
        let provider = Arc::new(ScriptedProvider::new(Script::Fail(|| {
            ProviderError::Http("timeout".into())
        })));
        let reply = gateway(provider.clone(), &["extra"])
            .ask("Quel temps fait-il ?", &[], None)
            .await;
        assert!(reply.starts_with(DEGRADED_MARKER));
        assert_eq!(provider.calls().len(), 4);
    }

    #[tokio::test]
    async fn listing_reorders_candidates() {
        let mut provider = ScriptedProvider::new(Script::Answer("ok"));
        provider.listing = Some(vec!["qwen-3-32b".into()]);
        let provider = Arc::new(provider);
        gateway(provider.clone(), &[]).ask("Salut", &[], None).await;
        assert_eq!(provider.calls(), vec!["qwen-3-32b"]);
    }
}
