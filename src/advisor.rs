//! Advisory client: provider abstraction + file cache + daily limit.
//!
//! A generative model may look at a scored session and suggest its own
//! stress score plus a one-line note. The suggestion is untrusted input: the
//! engine only ever consumes it through [`blend_with_suggestion`]
//! (±10 bound, 30% weight), so a wild reply cannot move the displayed score
//! by more than three points.
//!
//! [`blend_with_suggestion`]: crate::blend::blend_with_suggestion

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::result::StressResult;

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

/// What a provider returns for one session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdvisorHint {
    /// Suggested 0–100 stress score. Bounded downstream by the blend.
    pub suggested_score: f64,
    /// Short ASCII note (<=160 chars) shown alongside the reading.
    pub note: String,
}

/// Trait object used by the API handlers and tests.
pub trait ScoreAdvisor: Send + Sync {
    /// Look at a deterministic result and (optionally) suggest an adjustment.
    fn suggest<'a>(
        &'a self,
        result: &'a StressResult,
    ) -> Pin<Box<dyn Future<Output = Option<AdvisorHint>> + Send + 'a>>;
    fn provider_name(&self) -> &'static str;
}

pub type DynAdvisor = Arc<dyn ScoreAdvisor>;

/// Config loaded from `config/advisor.json`. Missing or malformed config
/// means the advisor stays disabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    pub enabled: bool,
    /// "openai" is the only live provider for now.
    pub provider: Option<String>,
    /// Optional per-day call limit; defaults to 20 if absent.
    pub daily_limit: Option<u32>,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: None,
            daily_limit: Some(20),
        }
    }
}

pub fn load_advisor_config() -> AdvisorConfig {
    let path = Path::new("config/advisor.json");
    match fs::read_to_string(path) {
        Ok(s) => serde_json::from_str(&s).unwrap_or_default(),
        Err(_) => AdvisorConfig::default(),
    }
}

/// Factory: build an advisor according to config and environment.
///
/// * If `AI_TEST_MODE=mock`, returns a deterministic mock.
/// * Else if `config.enabled == false`, returns a disabled advisor.
/// * Else builds the real provider wrapped with caching + daily limit.
pub fn build_advisor_from_config(config: &AdvisorConfig) -> DynAdvisor {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        let mock = MockProvider {
            fixed: AdvisorHint {
                suggested_score: 50.0,
                note: "Neutral advisory (mock)".to_string(),
            },
        };
        return Arc::new(CachingAdvisor::new(
            mock,
            default_cache_dir(),
            config.daily_limit.unwrap_or(20),
        ));
    }

    if !config.enabled {
        return Arc::new(DisabledAdvisor);
    }

    match config.provider.as_deref() {
        Some("openai") => {
            let provider = OpenAiProvider::new(None);
            Arc::new(CachingAdvisor::new(
                provider,
                default_cache_dir(),
                config.daily_limit.unwrap_or(20),
            ))
        }
        _ => Arc::new(DisabledAdvisor),
    }
}

// ------------------------------------------------------------
// Provider abstraction + concrete providers
// ------------------------------------------------------------

/// Low-level provider: does the real remote call. Separated so the same
/// caching wrapper serves production and tests.
pub trait Provider: Send + Sync + 'static {
    fn fetch<'a>(
        &'a self,
        input: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<AdvisorHint>> + Send + 'a>>;
    fn name(&self) -> &'static str;
}

/// OpenAI provider (Chat Completions). Requires `OPENAI_API_KEY`.
pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(model_override: Option<&str>) -> Self {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        let http = reqwest::Client::builder()
            .user_agent("voice-stress-analyzer/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        let model = model_override.unwrap_or("gpt-4o-mini").to_string();
        Self {
            http,
            api_key,
            model,
        }
    }
}

impl Provider for OpenAiProvider {
    fn fetch<'a>(
        &'a self,
        input: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<AdvisorHint>> + Send + 'a>> {
        Box::pin(async move {
            if self.api_key.is_empty() {
                return None;
            }

            #[derive(Serialize)]
            struct Msg<'a> {
                role: &'a str,
                content: &'a str,
            }
            #[derive(Serialize)]
            struct Req<'a> {
                model: &'a str,
                messages: Vec<Msg<'a>>,
                temperature: f32,
                max_tokens: u32,
            }
            #[derive(Deserialize)]
            struct Resp {
                choices: Vec<Choice>,
            }
            #[derive(Deserialize)]
            struct Choice {
                message: ChoiceMsg,
            }
            #[derive(Deserialize)]
            struct ChoiceMsg {
                content: String,
            }

            let sys = "You review voice-stress readings for a student wellbeing app. \
                       Reply with exactly one line: SCORE: <0-100 integer> | NOTE: <one neutral \
                       ASCII sentence, <=120 chars>. No other output.";
            let req = Req {
                model: &self.model,
                messages: vec![
                    Msg {
                        role: "system",
                        content: sys,
                    },
                    Msg {
                        role: "user",
                        content: input,
                    },
                ],
                temperature: 0.2,
                max_tokens: 80,
            };

            let resp = self
                .http
                .post("https://api.openai.com/v1/chat/completions")
                .bearer_auth(&self.api_key)
                .json(&req)
                .send()
                .await
                .ok()?;

            if !resp.status().is_success() {
                return None;
            }
            let body: Resp = resp.json().await.ok()?;
            let content = body
                .choices
                .first()
                .map(|c| c.message.content.as_str())
                .unwrap_or("");
            parse_hint(content)
        })
    }
    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Returns `None` always; used when the advisor is disabled.
pub struct DisabledAdvisor;

impl ScoreAdvisor for DisabledAdvisor {
    fn suggest<'a>(
        &'a self,
        _result: &'a StressResult,
    ) -> Pin<Box<dyn Future<Output = Option<AdvisorHint>> + Send + 'a>> {
        Box::pin(async { None })
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic provider for tests/local runs.
#[derive(Clone)]
pub struct MockProvider {
    pub fixed: AdvisorHint,
}

impl Provider for MockProvider {
    fn fetch<'a>(
        &'a self,
        _input: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<AdvisorHint>> + Send + 'a>> {
        let out = self.fixed.clone();
        Box::pin(async move { Some(out) })
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}

// ------------------------------------------------------------
// Caching wrapper (file cache + daily limit)
// ------------------------------------------------------------

pub struct CachingAdvisor<P: Provider> {
    inner: P,
    cache_dir: PathBuf,
    daily_limit_max: u32,
    counter: Arc<Mutex<DailyCounter>>,
}

impl<P: Provider> CachingAdvisor<P> {
    pub fn new(inner: P, cache_dir: PathBuf, daily_limit_max: u32) -> Self {
        let _ = fs::create_dir_all(&cache_dir); // best-effort
        let counter = Arc::new(Mutex::new(
            load_daily_counter(&cache_dir).unwrap_or_default(),
        ));
        Self {
            inner,
            cache_dir,
            daily_limit_max,
            counter,
        }
    }

    async fn suggest_impl(&self, input: &str) -> Option<AdvisorHint> {
        // 1) Daily limit: only real API calls increment; cache hits do not.
        {
            let mut g = self.counter.lock().expect("poisoned counter");
            if g.is_expired() {
                g.reset_to_today();
                let _ = save_daily_counter(&self.cache_dir, &g);
            }
            if g.count >= self.daily_limit_max {
                return None;
            }
        }

        // 2) Cache lookup.
        let key = cache_key(input);
        if let Some(hit) = read_cache_file(&self.cache_dir, &key) {
            return Some(hit);
        }

        // 3) Real call.
        if let Some(mut fresh) = self.inner.fetch(input).await {
            fresh.note = sanitize_note(&fresh.note);
            if fresh.suggested_score.is_finite() {
                fresh.suggested_score = fresh.suggested_score.clamp(0.0, 100.0);
                let _ = write_cache_file(&self.cache_dir, &key, &fresh);
                let mut g = self.counter.lock().expect("poisoned counter");
                g.count = g.count.saturating_add(1);
                let _ = save_daily_counter(&self.cache_dir, &g);
                return Some(fresh);
            }
        }
        None
    }
}

impl<P: Provider> ScoreAdvisor for CachingAdvisor<P> {
    fn suggest<'a>(
        &'a self,
        result: &'a StressResult,
    ) -> Pin<Box<dyn Future<Output = Option<AdvisorHint>> + Send + 'a>> {
        Box::pin(async move {
            let input = format!(
                "level={:?} score={:.1} explanation={}",
                result.level, result.score, result.explanation
            );
            self.suggest_impl(&input).await
        })
    }
    fn provider_name(&self) -> &'static str {
        self.inner.name()
    }
}

// ------------------------------------------------------------
// Reply parsing and sanitization
// ------------------------------------------------------------

/// Parse "SCORE: 62 | NOTE: ..." replies. Tolerates missing NOTE; rejects
/// anything without a usable number.
fn parse_hint(content: &str) -> Option<AdvisorHint> {
    let upper = content.to_ascii_uppercase();
    let score_at = upper.find("SCORE:")?;
    let after = &content[score_at + "SCORE:".len()..];
    let digits: String = after
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let score: f64 = digits.parse().ok()?;
    if !(0.0..=100.0).contains(&score) {
        return None;
    }

    let note = upper
        .find("NOTE:")
        .map(|i| sanitize_note(&content[i + "NOTE:".len()..]))
        .unwrap_or_default();

    Some(AdvisorHint {
        suggested_score: score,
        note,
    })
}

/// Ensure ASCII-only, single line, and <=160 chars. Collapses whitespace.
fn sanitize_note(input: &str) -> String {
    let mut out = String::with_capacity(160);
    let mut prev_space = false;
    for ch in input.chars() {
        let c = match ch {
            '\r' | '\n' | '\t' => ' ',
            c if c.is_ascii() => c,
            _ => ' ',
        };
        if c == ' ' {
            if !prev_space && !out.is_empty() {
                out.push(' ');
            }
            prev_space = true;
        } else {
            out.push(c);
            prev_space = false;
        }
        if out.len() >= 160 {
            break;
        }
    }
    out.trim().to_string()
}

// ------------------------------------------------------------
// File cache helpers
// ------------------------------------------------------------

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache/advisor")
}

fn cache_key(input: &str) -> String {
    let mut hasher = DefaultHasher::new();
    input.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

fn cache_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.json"))
}

fn read_cache_file(dir: &Path, key: &str) -> Option<AdvisorHint> {
    let path = cache_path(dir, key);
    let mut file = fs::File::open(path).ok()?;
    let mut buf = String::new();
    file.read_to_string(&mut buf).ok()?;
    serde_json::from_str(&buf).ok()
}

fn write_cache_file(dir: &Path, key: &str, value: &AdvisorHint) -> io::Result<()> {
    let path = cache_path(dir, key);
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string());
    let mut f = fs::File::create(&tmp)?;
    f.write_all(json.as_bytes())?;
    fs::rename(tmp, path)?;
    Ok(())
}

// ------------------------------------------------------------
// Daily counter helpers
// ------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DailyCounter {
    date: String,
    count: u32,
}
impl Default for DailyCounter {
    fn default() -> Self {
        Self {
            date: today(),
            count: 0,
        }
    }
}
impl DailyCounter {
    fn is_expired(&self) -> bool {
        self.date != today()
    }
    fn reset_to_today(&mut self) {
        self.date = today();
        self.count = 0;
    }
}

fn today() -> String {
    // UTC calendar date; the counter resets at midnight UTC.
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

fn counter_path(dir: &Path) -> PathBuf {
    dir.join("daily_count.json")
}

fn load_daily_counter(dir: &Path) -> io::Result<DailyCounter> {
    let p = counter_path(dir);
    let s = fs::read_to_string(p)?;
    serde_json::from_str(&s).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn save_daily_counter(dir: &Path, dc: &DailyCounter) -> io::Result<()> {
    let p = counter_path(dir);
    let tmp = p.with_extension("json.tmp");
    let s = serde_json::to_string(dc).unwrap_or_else(|_| "{}".to_string());
    let mut f = fs::File::create(&tmp)?;
    f.write_all(s.as_bytes())?;
    fs::rename(tmp, p)?;
    Ok(())
}
