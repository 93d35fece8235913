//! The Gemini provider adapter.
//!
//! One instance serves one logical provider configuration. The cached
//! client, cached API key, and system directive are instance state;
//! [`GeminiProvider::set_authentication`] invalidates the cached client so
//! the next operation rebuilds it under the new credential. The adapter is
//! not a concurrency primitive: callers needing parallel chat requests use
//! independent instances.

use std::collections::BTreeMap;
use std::sync::Arc;

use secrecy::SecretString;
use serde_json::{Map, Value};

use crate::auth::KeyRepository;
use crate::client::GeminiClient;
use crate::config::{GenerationOptions, SettingsStore};
use crate::definition::{self, ApiDefinition};
use crate::types::{ChatMessage, ChatOutput, ChatPayload, ChatRole, OperationType};
use crate::wire::Content;
use crate::{Error, Result};

/// Setting under which the host stores the name of the API key to resolve.
const API_KEY_SETTING: &str = "api_key";

const SUPPORTED_OPERATIONS: &[OperationType] = &[OperationType::Chat];

/// Adapter between the host chat contract and the Gemini API.
pub struct GeminiProvider {
    http: reqwest::Client,
    settings: Arc<dyn SettingsStore>,
    keys: Arc<dyn KeyRepository>,
    options: GenerationOptions,
    api_key: Option<SecretString>,
    client: Option<GeminiClient>,
    system_directive: Option<Content>,
    moderation: bool,
    base_url: Option<String>,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("settings", &self.settings.name())
            .field("keys", &self.keys.name())
            .field("options", &self.options)
            .field("client", &self.client)
            .field("moderation", &self.moderation)
            .finish()
    }
}

impl GeminiProvider {
    /// Create an adapter over the shared transport and the host's
    /// configuration and key collaborators.
    pub fn new(
        http: reqwest::Client,
        settings: Arc<dyn SettingsStore>,
        keys: Arc<dyn KeyRepository>,
    ) -> Self {
        Self {
            http,
            settings,
            keys,
            options: GenerationOptions::default(),
            api_key: None,
            client: None,
            system_directive: None,
            moderation: true,
            base_url: None,
        }
    }

    /// Point every client this adapter builds at a different endpoint.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Whether this provider can serve requests. Fails closed: false
    /// whenever no API key is configured.
    pub fn is_usable(&self, operation_type: Option<OperationType>) -> bool {
        let configured = self
            .settings
            .get(API_KEY_SETTING)
            .is_some_and(|name| !name.is_empty());
        if !configured {
            return false;
        }

        match operation_type {
            Some(op) => SUPPORTED_OPERATIONS.contains(&op),
            None => true,
        }
    }

    pub fn supported_operation_types(&self) -> &'static [OperationType] {
        SUPPORTED_OPERATIONS
    }

    /// Store the host configuration, normalized for Gemini.
    pub fn set_configuration(&mut self, configuration: Map<String, Value>) {
        self.options = GenerationOptions::from_map(configuration);
    }

    /// The normalized configuration currently in effect.
    pub fn configuration(&self) -> &GenerationOptions {
        &self.options
    }

    /// Swap the API key. The cached client is dropped so the next operation
    /// builds one under the new credential; a client built under a stale key
    /// is never reused.
    pub fn set_authentication(&mut self, api_key: SecretString) {
        self.api_key = Some(api_key);
        self.client = None;
    }

    /// Store the chat system directive, tagged with the provider's role
    /// marker for system text. `None` or an empty string clears it; the
    /// most-recently-set directive wins.
    pub fn set_chat_system_role(&mut self, message: Option<&str>) {
        self.system_directive = match message {
            Some(text) if !text.is_empty() => Some(Content::model(text)),
            _ => None,
        };
    }

    /// Run a moderation check before coming generation calls.
    pub fn enable_moderation(&mut self) {
        self.moderation = true;
    }

    /// Skip the moderation check for coming generation calls.
    pub fn disable_moderation(&mut self) {
        self.moderation = false;
    }

    pub fn moderation_enabled(&self) -> bool {
        self.moderation
    }

    /// Per-model settings; Gemini applies the general configuration as-is.
    pub fn model_settings(
        &self,
        _model_id: &str,
        general_config: Map<String, Value>,
    ) -> Map<String, Value> {
        general_config
    }

    /// The packaged API-capability definition.
    pub fn api_definition(&self) -> Result<ApiDefinition> {
        definition::api_defaults()
    }

    /// The raw provider client, building one if needed. A supplied key is a
    /// hot-swap: equivalent to [`set_authentication`](Self::set_authentication)
    /// followed by ensuring a client exists.
    pub async fn client(&mut self, api_key: Option<SecretString>) -> Result<&GeminiClient> {
        if let Some(key) = api_key {
            self.set_authentication(key);
        }
        self.load_client().await
    }

    /// Send a conversation and return the normalized reply.
    ///
    /// Structured conversations are validated and translated before any
    /// provider call: a turn with an unrecognized role fails the whole
    /// operation, a `system` turn becomes the stored directive and is
    /// prepended to the outgoing sequence, and `user`/`model` turns map
    /// one-to-one in order. An empty provider response is not an error; the
    /// result text is the empty string.
    pub async fn chat(
        &mut self,
        input: impl Into<ChatPayload>,
        model_id: &str,
        _tags: &[String],
    ) -> Result<ChatOutput> {
        self.load_client().await?;

        let contents = self.translate(input.into())?;
        let config = self.options.to_generation_config()?;
        let config = if config.is_empty() { None } else { Some(config) };

        let client = self
            .client
            .as_ref()
            .ok_or_else(|| Error::auth("client not initialized"))?;
        let response = client.generate_content(model_id, contents, config).await?;

        let text = response.text();
        Ok(ChatOutput {
            message: ChatMessage::model(text),
            raw: response,
            metadata: Vec::new(),
        })
    }

    /// Model catalog as a map of model identifier to display name.
    ///
    /// A malformed catalog payload fails loudly with a provider-response
    /// error; callers populate selection UI from this map and an empty
    /// result must mean the provider really has no models.
    pub async fn configured_models(
        &mut self,
        _operation_type: Option<OperationType>,
    ) -> Result<BTreeMap<String, String>> {
        let client = self.load_client().await?;
        let catalog = client.list_models().await?;

        let mut models = BTreeMap::new();
        for model in catalog.models {
            let display = model.display_name.unwrap_or_else(|| model.name.clone());
            models.insert(model.name, display);
        }
        Ok(models)
    }

    /// Ensure an authenticated client exists. Idempotent; resolves the key
    /// through the key repository only when none was set explicitly.
    async fn load_client(&mut self) -> Result<&GeminiClient> {
        if self.client.is_none() {
            let api_key = match &self.api_key {
                Some(key) => key.clone(),
                None => {
                    let key_name = self
                        .settings
                        .get(API_KEY_SETTING)
                        .filter(|name| !name.is_empty())
                        .ok_or_else(|| Error::auth("no API key configured"))?;
                    let key = self.keys.key_value(&key_name).await?;
                    tracing::debug!(repository = self.keys.name(), "resolved API key");
                    self.api_key = Some(key.clone());
                    key
                }
            };

            let mut client = GeminiClient::new(self.http.clone(), api_key);
            if let Some(url) = &self.base_url {
                client = client.with_base_url(url.clone());
            }
            tracing::debug!(base_url = client.base_url(), "built Gemini client");
            self.client = Some(client);
        }

        self.client
            .as_ref()
            .ok_or_else(|| Error::auth("client not initialized"))
    }

    /// Turn a chat payload into the provider's content sequence.
    fn translate(&mut self, input: ChatPayload) -> Result<Vec<Content>> {
        match input {
            ChatPayload::Contents(contents) => Ok(contents),
            ChatPayload::Text(text) => {
                let mut contents = Vec::new();
                if let Some(directive) = &self.system_directive {
                    contents.push(directive.clone());
                }
                contents.push(Content::user(text));
                Ok(contents)
            }
            ChatPayload::Conversation(conversation) => {
                // Validate every role before touching adapter state or the
                // network; a bad turn must never partially send.
                for message in conversation.messages() {
                    if let ChatRole::Other(role) = &message.role {
                        return Err(Error::UnsupportedRole(role.clone()));
                    }
                }

                let mut turns = Vec::new();
                for message in conversation.messages() {
                    match &message.role {
                        ChatRole::System => {
                            // Most recent system turn becomes the directive.
                            self.system_directive = Some(Content::model(message.text.clone()));
                        }
                        ChatRole::User => turns.push(Content::user(message.text.clone())),
                        ChatRole::Model => turns.push(Content::model(message.text.clone())),
                        ChatRole::Other(role) => {
                            return Err(Error::UnsupportedRole(role.clone()));
                        }
                    }
                }

                let mut contents = Vec::new();
                if let Some(directive) = &self.system_directive {
                    contents.push(directive.clone());
                }
                contents.extend(turns);
                Ok(contents)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticKeys;
    use crate::config::StaticSettings;
    use crate::types::ChatInput;
    use crate::wire::Role;
    use serde_json::json;

    fn provider_with(settings: StaticSettings) -> GeminiProvider {
        GeminiProvider::new(
            reqwest::Client::new(),
            Arc::new(settings),
            Arc::new(StaticKeys::new([("gemini_key", "AI-test")])),
        )
    }

    fn provider() -> GeminiProvider {
        provider_with(StaticSettings::new([("api_key", "gemini_key")]))
    }

    #[test]
    fn test_not_usable_without_api_key_setting() {
        let provider = provider_with(StaticSettings::default());
        assert!(!provider.is_usable(None));
        assert!(!provider.is_usable(Some(OperationType::Chat)));
    }

    #[test]
    fn test_not_usable_with_empty_api_key_setting() {
        let provider = provider_with(StaticSettings::new([("api_key", "")]));
        assert!(!provider.is_usable(None));
    }

    #[test]
    fn test_usable_for_chat_only() {
        let provider = provider();
        assert!(provider.is_usable(None));
        assert!(provider.is_usable(Some(OperationType::Chat)));
        assert_eq!(provider.supported_operation_types(), [OperationType::Chat]);
    }

    #[test]
    fn test_moderation_default_on_and_toggles() {
        let mut provider = provider();
        assert!(provider.moderation_enabled());
        provider.disable_moderation();
        assert!(!provider.moderation_enabled());
        provider.enable_moderation();
        assert!(provider.moderation_enabled());
    }

    #[test]
    fn test_configuration_is_normalized_on_set() {
        let mut provider = provider();
        let raw = match json!({
            "stopSequences": "a,b,c",
            "responseSchema": {"type": "object"},
            "responseMimeType": "application/json"
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        provider.set_configuration(raw);

        let options = provider.configuration();
        assert_eq!(options.get("stopSequences"), Some(&json!(["a", "b", "c"])));
        assert!(options.get("responseSchema").is_none());
        assert!(options.get("responseMimeType").is_none());
    }

    #[test]
    fn test_system_turn_prepended_with_model_marker() {
        let mut provider = provider();
        let input = ChatInput::new(vec![
            ChatMessage::system("Be terse"),
            ChatMessage::user("Hi"),
        ]);

        let contents = provider.translate(ChatPayload::Conversation(input)).unwrap();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0].role, Role::Model);
        assert_eq!(contents[0].parts[0].text, "Be terse");
        assert_eq!(contents[1].role, Role::User);
        assert_eq!(contents[1].parts[0].text, "Hi");
    }

    #[test]
    fn test_multi_turn_order_preserved() {
        let mut provider = provider();
        let input = ChatInput::new(vec![
            ChatMessage::user("one"),
            ChatMessage::model("two"),
            ChatMessage::user("three"),
        ]);

        let contents = provider.translate(ChatPayload::Conversation(input)).unwrap();
        let roles: Vec<_> = contents.iter().map(|c| c.role).collect();
        assert_eq!(roles, [Role::User, Role::Model, Role::User]);
        assert_eq!(contents[2].parts[0].text, "three");
    }

    #[test]
    fn test_unsupported_role_rejected_before_state_changes() {
        let mut provider = provider();
        let input = ChatInput::new(vec![
            ChatMessage::system("reset me not"),
            ChatMessage::new(ChatRole::Other("tool".into()), "payload"),
        ]);

        let err = provider
            .translate(ChatPayload::Conversation(input))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedRole(ref role) if role == "tool"));
        // The invalid conversation must not have installed a directive.
        assert!(provider.system_directive.is_none());
    }

    #[test]
    fn test_set_chat_system_role_replaces_and_clears() {
        let mut provider = provider();
        provider.set_chat_system_role(Some("first"));
        provider.set_chat_system_role(Some("second"));
        let directive = provider.system_directive.clone().unwrap();
        assert_eq!(directive.parts[0].text, "second");
        assert_eq!(directive.role, Role::Model);

        provider.set_chat_system_role(None);
        assert!(provider.system_directive.is_none());

        provider.set_chat_system_role(Some(""));
        assert!(provider.system_directive.is_none());
    }

    #[test]
    fn test_text_payload_becomes_user_turn_with_directive() {
        let mut provider = provider();
        provider.set_chat_system_role(Some("Be terse"));
        let contents = provider.translate(ChatPayload::from("Hi")).unwrap();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0].parts[0].text, "Be terse");
        assert_eq!(contents[1].role, Role::User);
    }

    #[tokio::test]
    async fn test_load_client_fails_without_configured_key() {
        let mut provider = provider_with(StaticSettings::default());
        let err = provider.client(None).await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[tokio::test]
    async fn test_load_client_is_idempotent() {
        let mut provider = provider();
        provider.client(None).await.unwrap();
        assert!(provider.client.is_some());
        // Repeated ensures are no-ops.
        provider.client(None).await.unwrap();
        assert!(provider.client.is_some());
    }

    #[tokio::test]
    async fn test_set_authentication_invalidates_cached_client() {
        let mut provider = provider();
        provider.client(None).await.unwrap();
        assert!(provider.client.is_some());

        provider.set_authentication(SecretString::from("new-key"));
        assert!(provider.client.is_none());
    }
}
