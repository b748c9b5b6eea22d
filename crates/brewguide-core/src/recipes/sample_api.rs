//! Remote coffee recipes from the public SampleAPIs service.
//!
//! Each record becomes a two-step simple recipe (ingredients, then brew).
//! Titles and descriptions go through an optional LibreTranslate-style
//! endpoint; a failed translation keeps the original text. Recipes
//! without a picture can borrow one from Pixabay through [`ImageProvider`].

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::error::CatalogError;
use crate::i18n::Language;

use super::source::RecipeSource;
use super::{AnyRecipe, Recipe, RecipeIngredient, Step, StepKind};

pub const DEFAULT_API_URL: &str = "https://api.sampleapis.com/coffee/hot";
pub const DEFAULT_LIMIT: usize = 12;
pub const DEFAULT_IMAGE_URL: &str = "https://pixabay.com/api/";

/// Languages Pixabay accepts for `lang`; anything else is searched in English.
const PIXABAY_LANGS: [&str; 26] = [
    "cs", "da", "de", "en", "es", "fr", "id", "it", "hu", "nl", "no", "pl", "pt", "ro", "sk", "fi",
    "sv", "tr", "vi", "th", "bg", "ru", "el", "ja", "ko", "zh",
];

/// Id range for records whose upstream id is missing or not numeric.
const FALLBACK_ID_BASE: u32 = 9000;

#[derive(Debug, Deserialize)]
struct CoffeeRecord {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    ingredients: Vec<String>,
}

/// LibreTranslate-compatible client.
#[derive(Debug, Clone)]
pub struct Translator {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

impl Translator {
    pub fn new(endpoint: Url, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            api_key,
        }
    }

    /// Translate `text` into `target`; returns `text` unchanged on any failure.
    pub async fn translate(&self, text: &str, target: Language) -> String {
        if text.is_empty() {
            return String::new();
        }
        let body = json!({
            "q": text,
            "source": "auto",
            "target": target.code(),
            "format": "text",
        });
        let mut request = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = match request.send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                tracing::debug!(status = %resp.status(), "translation endpoint refused");
                return text.to_string();
            }
            Err(e) => {
                tracing::debug!(error = %e, "translation request failed");
                return text.to_string();
            }
        };

        match response.json::<TranslateResponse>().await {
            Ok(TranslateResponse {
                translated_text: Some(t),
            }) if !t.is_empty() => t,
            _ => text.to_string(),
        }
    }
}

/// Pixabay image search, used to give recipes a photo.
#[derive(Debug, Clone)]
pub struct ImageProvider {
    client: Client,
    endpoint: Url,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ImageSearch {
    #[serde(default)]
    hits: Vec<ImageHit>,
}

#[derive(Debug, Deserialize)]
struct ImageHit {
    #[serde(rename = "webformatURL", default)]
    webformat_url: Option<String>,
    #[serde(rename = "largeImageURL", default)]
    large_image_url: Option<String>,
}

pub fn pixabay_lang(language: Language) -> &'static str {
    let code = language.code();
    if PIXABAY_LANGS.contains(&code) {
        code
    } else {
        "en"
    }
}

impl ImageProvider {
    pub fn new(endpoint: Url, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            api_key: api_key.into(),
        }
    }

    fn search_url(&self, query: &str, language: Language) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("q", &format!("{query} coffee"))
            .append_pair("image_type", "photo")
            .append_pair("orientation", "horizontal")
            .append_pair("category", "food")
            .append_pair("per_page", "3")
            .append_pair("lang", pixabay_lang(language));
        url
    }

    /// URL of the first matching photo, or `None` on any failure.
    pub async fn find(&self, query: &str, language: Language) -> Option<String> {
        let response = match self.client.get(self.search_url(query, language)).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                tracing::debug!(status = %resp.status(), "image search refused");
                return None;
            }
            Err(e) => {
                tracing::debug!(error = %e, "image search failed");
                return None;
            }
        };
        let search: ImageSearch = response.json().await.ok()?;
        let hit = search.hits.into_iter().next()?;
        hit.webformat_url
            .filter(|u| !u.is_empty())
            .or(hit.large_image_url.filter(|u| !u.is_empty()))
    }
}

/// Coffee recipes from `https://api.sampleapis.com/coffee/hot`.
#[derive(Debug, Clone)]
pub struct SampleApiSource {
    client: Client,
    url: Url,
    limit: usize,
    language: Language,
    translator: Option<Translator>,
}

impl SampleApiSource {
    pub fn new(url: Url, language: Language) -> Self {
        Self {
            client: Client::new(),
            url,
            limit: DEFAULT_LIMIT,
            language,
            translator: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_translator(mut self, translator: Translator) -> Self {
        self.translator = Some(translator);
        self
    }

    async fn localize(&self, text: String) -> String {
        match &self.translator {
            Some(t) => t.translate(&text, self.language).await,
            None => text,
        }
    }

    async fn to_recipe(&self, index: usize, record: CoffeeRecord) -> Recipe {
        let id = record
            .id
            .as_ref()
            .and_then(|v| match v {
                serde_json::Value::Number(n) => n.as_u64(),
                serde_json::Value::String(s) => s.parse().ok(),
                _ => None,
            })
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(FALLBACK_ID_BASE + index as u32);

        let title = self
            .localize(record.title.unwrap_or_else(|| "Coffee".to_string()))
            .await;
        let description = self.localize(record.description.unwrap_or_default()).await;

        let ingredients = record
            .ingredients
            .into_iter()
            .map(|name| RecipeIngredient {
                name,
                amount: None,
                icon: "🫘".to_string(),
            })
            .collect();

        Recipe {
            id,
            steps: vec![
                Step {
                    id: 1,
                    kind: StepKind::Ingredients,
                    text: "Ingredients".to_string(),
                    ingredients,
                    timer_seconds: None,
                    fire_level: None,
                    buttons: vec!["OK".to_string()],
                    parallel_group: None,
                    auto_start_timer: false,
                },
                Step {
                    id: 2,
                    kind: StepKind::Instruction,
                    text: title.clone(),
                    ingredients: Vec::new(),
                    timer_seconds: None,
                    fire_level: None,
                    buttons: vec!["OK".to_string()],
                    parallel_group: None,
                    auto_start_timer: false,
                },
            ],
            title,
            description,
            image: record.image.unwrap_or_else(|| "☕".to_string()),
        }
    }
}

impl RecipeSource for SampleApiSource {
    fn name(&self) -> &str {
        "sampleapis"
    }

    async fn fetch_recipes(&self) -> Result<Vec<AnyRecipe>, CatalogError> {
        let resp = self.client.get(self.url.clone()).send().await?;
        if !resp.status().is_success() {
            return Err(CatalogError::UpstreamStatus {
                url: self.url.to_string(),
                status: resp.status().as_u16(),
            });
        }
        let records: Vec<CoffeeRecord> = resp.json().await?;

        let mut recipes = Vec::with_capacity(records.len().min(self.limit));
        for (index, record) in records.into_iter().take(self.limit).enumerate() {
            recipes.push(AnyRecipe::Simple(self.to_recipe(index, record).await));
        }
        tracing::debug!(count = recipes.len(), "fetched remote recipes");
        Ok(recipes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> String {
        let items: Vec<_> = (1..=n)
            .map(|i| {
                json!({
                    "id": i,
                    "title": format!("Coffee {i}"),
                    "description": "Hot",
                    "image": "https://example.com/c.jpg",
                    "ingredients": ["Espresso", "Milk"],
                })
            })
            .collect();
        serde_json::to_string(&items).unwrap()
    }

    #[tokio::test]
    async fn maps_records_to_two_step_recipes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/coffee/hot")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(records(2))
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/coffee/hot", server.url())).unwrap();
        let source = SampleApiSource::new(url, Language::En);
        let recipes = source.fetch_recipes().await.unwrap();

        mock.assert_async().await;
        assert_eq!(recipes.len(), 2);
        match &recipes[0] {
            AnyRecipe::Simple(r) => {
                assert_eq!(r.id, 1);
                assert_eq!(r.title, "Coffee 1");
                assert_eq!(r.steps.len(), 2);
                assert_eq!(r.steps[0].ingredients.len(), 2);
                assert_eq!(r.steps[0].ingredients[0].icon, "🫘");
                assert_eq!(r.steps[1].buttons, vec!["OK"]);
            }
            other => panic!("expected simple recipe, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn respects_limit() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/coffee/hot")
            .with_status(200)
            .with_body(records(20))
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/coffee/hot", server.url())).unwrap();
        let recipes = SampleApiSource::new(url, Language::En)
            .fetch_recipes()
            .await
            .unwrap();
        assert_eq!(recipes.len(), DEFAULT_LIMIT);
    }

    #[tokio::test]
    async fn upstream_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/coffee/hot")
            .with_status(503)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/coffee/hot", server.url())).unwrap();
        let result = SampleApiSource::new(url, Language::En).fetch_recipes().await;
        assert!(matches!(
            result,
            Err(CatalogError::UpstreamStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn image_search_takes_first_hit() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("key".into(), "k1".into()),
                mockito::Matcher::UrlEncoded("q".into(), "Latte coffee".into()),
                mockito::Matcher::UrlEncoded("lang".into(), "en".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"hits":[{"largeImageURL":"https://img/l1.jpg"},{"webformatURL":"https://img/w2.jpg"}]}"#,
            )
            .create_async()
            .await;

        let endpoint = Url::parse(&format!("{}/api/", server.url())).unwrap();
        let provider = ImageProvider::new(endpoint, "k1");
        // Kazakh is not a Pixabay language.
        assert_eq!(
            provider.find("Latte", Language::Kk).await.as_deref(),
            Some("https://img/l1.jpg")
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn image_search_failures_give_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/")
            .match_query(mockito::Matcher::UrlEncoded("q".into(), "Mocha coffee".into()))
            .with_status(429)
            .create_async()
            .await;
        server
            .mock("GET", "/api/")
            .match_query(mockito::Matcher::UrlEncoded("q".into(), "Flat white coffee".into()))
            .with_status(200)
            .with_body(r#"{"total":0,"hits":[]}"#)
            .create_async()
            .await;

        let endpoint = Url::parse(&format!("{}/api/", server.url())).unwrap();
        let provider = ImageProvider::new(endpoint, "k1");
        assert_eq!(provider.find("Mocha", Language::Ru).await, None);
        assert_eq!(provider.find("Flat white", Language::Ru).await, None);
    }

    #[test]
    fn pixabay_language_mapping() {
        assert_eq!(pixabay_lang(Language::Ru), "ru");
        assert_eq!(pixabay_lang(Language::Sv), "sv");
        assert_eq!(pixabay_lang(Language::Uk), "en");
    }

    #[tokio::test]
    async fn translation_applies_and_falls_back() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/translate")
            .match_body(mockito::Matcher::PartialJson(json!({ "q": "Latte", "target": "ru" })))
            .with_status(200)
            .with_body(r#"{"translatedText":"Латте"}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/translate")
            .match_body(mockito::Matcher::PartialJson(json!({ "q": "Mocha" })))
            .with_status(500)
            .create_async()
            .await;

        let endpoint = Url::parse(&format!("{}/translate", server.url())).unwrap();
        let translator = Translator::new(endpoint, None);
        assert_eq!(translator.translate("Latte", Language::Ru).await, "Латте");
        assert_eq!(translator.translate("Mocha", Language::Ru).await, "Mocha");
    }
}
