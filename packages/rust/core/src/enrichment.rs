//! Enrichment orchestrator: fan out provider lookups for every extracted
//! entity, bound the whole batch by one deadline, then dedupe and cap.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, instrument, warn};

use screenlens_providers::{Provider, ProviderSet};
use screenlens_shared::{EnrichmentConfig, Entity, MAX_SOURCES_LIMIT, Source};

use crate::classifier::{Category, classify};

/// Domains searched for perfume entities, with their source labels.
const PERFUME_SITES: &[(&str, &str)] = &[
    ("www.fragrantica.com", "fragrantica"),
    ("www.sephora.com", "sephora"),
    ("www.notino.com", "notino"),
];

/// Domains searched for electronics entities, with their source labels.
const ELECTRONICS_SITES: &[(&str, &str)] = &[
    ("www.gsmarena.com", "gsmarena"),
    ("www.amazon.com", "amazon"),
];

pub const DEFAULT_BUDGET: Duration = Duration::from_millis(7000);
pub const DEFAULT_MAX_SOURCES: usize = MAX_SOURCES_LIMIT;

/// One provider call: which adapter, with which query.
#[derive(Clone)]
pub struct PlannedCall {
    pub provider: Arc<dyn Provider>,
    pub query: String,
}

impl std::fmt::Debug for PlannedCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlannedCall")
            .field("provider", &self.provider.name())
            .field("query", &self.query)
            .finish()
    }
}

#[derive(Clone)]
pub struct Enricher {
    providers: ProviderSet,
    budget: Duration,
    max_sources: usize,
}

impl Enricher {
    pub fn new(providers: ProviderSet) -> Self {
        Self {
            providers,
            budget: DEFAULT_BUDGET,
            max_sources: DEFAULT_MAX_SOURCES,
        }
    }

    pub fn from_config(providers: ProviderSet, config: &EnrichmentConfig) -> Self {
        Self {
            providers,
            budget: config.budget(),
            max_sources: config.max_sources.min(DEFAULT_MAX_SOURCES),
        }
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Lower the source cap. Values above [`DEFAULT_MAX_SOURCES`] are clamped.
    pub fn with_max_sources(mut self, max_sources: usize) -> Self {
        self.max_sources = max_sources.min(DEFAULT_MAX_SOURCES);
        self
    }

    /// Provider calls for one entity, in issue order.
    ///
    /// Category-specific calls come first, then the encyclopedia and the
    /// unscoped web search, which every named entity gets. An entity with a
    /// blank name gets no calls at all.
    pub fn plan(&self, entity: &Entity, summary_text: &str) -> Vec<PlannedCall> {
        if entity.name.trim().is_empty() {
            return Vec::new();
        }

        let query = entity.query().to_string();
        let call = |provider: Arc<dyn Provider>| PlannedCall {
            provider,
            query: query.clone(),
        };

        let mut calls = Vec::new();
        for category in classify(entity, summary_text) {
            match category {
                Category::MovieTv => calls.push(call(self.providers.movies.clone())),
                Category::Book => calls.push(call(self.providers.books.clone())),
                Category::Music => calls.push(call(self.providers.music.clone())),
                Category::Perfume => calls.extend(
                    PERFUME_SITES
                        .iter()
                        .map(|(site, label)| call(self.providers.site_web(site, label))),
                ),
                Category::Electronics => calls.extend(
                    ELECTRONICS_SITES
                        .iter()
                        .map(|(site, label)| call(self.providers.site_web(site, label))),
                ),
            }
        }
        calls.push(call(self.providers.encyclopedia.clone()));
        calls.push(call(self.providers.open_web()));
        calls
    }

    /// Look up sources for `entities`.
    ///
    /// Every call for every entity runs concurrently. When the budget runs
    /// out, outstanding calls are aborted and whatever already finished is
    /// used. The result is deduplicated by [`Source::dedup_key`] in issue
    /// order and capped at `max_sources`. Never fails.
    #[instrument(skip_all, fields(entities = entities.len()))]
    pub async fn enrich(&self, entities: &[Entity], summary_text: &str) -> Vec<Source> {
        let calls: Vec<PlannedCall> = entities
            .iter()
            .flat_map(|e| self.plan(e, summary_text))
            .collect();
        if calls.is_empty() {
            return Vec::new();
        }

        let total = calls.len();
        let deadline = Instant::now() + self.budget;
        let mut set = JoinSet::new();
        for (order, call) in calls.into_iter().enumerate() {
            set.spawn(async move {
                let source = call.provider.lookup(&call.query).await;
                (order, source)
            });
        }

        let mut finished: Vec<(usize, Source)> = Vec::new();
        let mut settled = 0usize;
        let mut timed_out = false;
        loop {
            match timeout_at(deadline, set.join_next()).await {
                Ok(Some(Ok((order, source)))) => {
                    settled += 1;
                    if let Some(source) = source {
                        finished.push((order, source));
                    }
                }
                Ok(Some(Err(e))) => {
                    settled += 1;
                    warn!(error = %e, "provider task failed");
                }
                Ok(None) => break,
                Err(_) => {
                    timed_out = true;
                    set.abort_all();
                    break;
                }
            }
        }

        finished.sort_by_key(|(order, _)| *order);
        let sources = dedup_and_cap(finished.into_iter().map(|(_, s)| s), self.max_sources);

        if timed_out {
            warn!(
                settled,
                total,
                budget_ms = self.budget.as_millis() as u64,
                "enrichment budget exhausted"
            );
        }
        info!(calls = total, sources = sources.len(), "enrichment complete");
        sources
    }
}

/// Drop repeated `(provider, url-or-title)` keys, keeping the first, then truncate.
pub fn dedup_and_cap(sources: impl IntoIterator<Item = Source>, max: usize) -> Vec<Source> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for source in sources {
        if out.len() >= max {
            break;
        }
        if seen.insert(source.dedup_key()) {
            out.push(source);
        } else {
            debug!(key = %source.dedup_key(), "duplicate source dropped");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use screenlens_providers::{SearchHit, WebSearch};
    use screenlens_shared::EntityType;

    use super::*;

    /// Answers every query after `delay`, counting calls.
    struct FakeProvider {
        label: &'static str,
        delay: Duration,
        answer: bool,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new(label: &'static str, delay: Duration, answer: bool) -> Arc<Self> {
            Arc::new(Self {
                label,
                delay,
                answer,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Provider for FakeProvider {
        fn name(&self) -> &str {
            self.label
        }

        async fn lookup(&self, query: &str) -> Option<Source> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.answer.then(|| {
                Source::link(
                    self.label,
                    query,
                    format!("https://{}.example/{}", self.label, query.replace(' ', "_")),
                )
            })
        }
    }

    struct FakeSearch {
        delay: Duration,
    }

    #[async_trait]
    impl WebSearch for FakeSearch {
        async fn top_hit(&self, query: &str, site: Option<&str>) -> Option<SearchHit> {
            tokio::time::sleep(self.delay).await;
            let host = site.unwrap_or("search.example");
            Some(SearchHit {
                title: query.to_string(),
                url: format!("https://{host}/{}", query.replace(' ', "_")),
            })
        }
    }

    fn providers(delay: Duration) -> ProviderSet {
        ProviderSet {
            encyclopedia: FakeProvider::new("wikipedia", delay, true),
            movies: FakeProvider::new("omdb", delay, true),
            books: FakeProvider::new("openlibrary", delay, true),
            music: FakeProvider::new("itunes", delay, true),
            web: Arc::new(FakeSearch { delay }),
        }
    }

    fn names(calls: &[PlannedCall]) -> Vec<&str> {
        calls.iter().map(|c| c.provider.name()).collect()
    }

    fn nikon() -> Entity {
        let mut e = Entity::new(EntityType::ProductElectronics, "Nikon Z50");
        e.search_query = "Nikon Z50 camera".into();
        e
    }

    #[test]
    fn electronics_plan_order_and_query() {
        let enricher = Enricher::new(providers(Duration::ZERO));
        let calls = enricher.plan(&nikon(), "Buy Nikon Z50 camera, $799");
        assert_eq!(names(&calls), vec!["gsmarena", "amazon", "wikipedia", "web"]);
        assert!(calls.iter().all(|c| c.query == "Nikon Z50 camera"));
    }

    #[test]
    fn perfume_plan_has_three_site_searches() {
        let enricher = Enricher::new(providers(Duration::ZERO));
        let e = Entity::new(EntityType::ProductPerfume, "Bleu de Chanel");
        assert_eq!(
            names(&enricher.plan(&e, "")),
            vec!["fragrantica", "sephora", "notino", "wikipedia", "web"]
        );
    }

    #[test]
    fn blank_name_gets_no_calls() {
        let enricher = Enricher::new(providers(Duration::ZERO));
        let mut e = Entity::new(EntityType::Movie, "  ");
        e.search_query = "something".into();
        assert!(enricher.plan(&e, "").is_empty());
    }

    #[tokio::test]
    async fn blank_name_only_entity_yields_no_sources() {
        let set = providers(Duration::ZERO);
        let wiki = FakeProvider::new("wikipedia", Duration::ZERO, true);
        let set = ProviderSet {
            encyclopedia: wiki.clone(),
            ..set
        };
        let sources = Enricher::new(set)
            .enrich(&[Entity::new(EntityType::Book, "")], "")
            .await;
        assert!(sources.is_empty());
        assert_eq!(wiki.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn nikon_scenario_returns_all_four_sources() {
        let sources = Enricher::new(providers(Duration::ZERO))
            .enrich(&[nikon()], "Buy Nikon Z50 camera, $799")
            .await;
        let labels: Vec<_> = sources.iter().map(|s| s.provider.as_str()).collect();
        assert_eq!(labels, vec!["gsmarena", "amazon", "wikipedia", "web"]);
        assert_eq!(
            sources[0].url.as_deref(),
            Some("https://www.gsmarena.com/Nikon_Z50_camera")
        );
    }

    #[tokio::test]
    async fn oversized_config_cap_still_returns_at_most_five() {
        let config = EnrichmentConfig {
            max_sources: 50,
            ..EnrichmentConfig::default()
        };
        let mut perfume_phone = Entity::new(EntityType::ProductPerfume, "Scent Phone");
        perfume_phone.model = Some("android".into());
        let entities = vec![perfume_phone, Entity::new(EntityType::Movie, "Up")];

        let sources = Enricher::from_config(providers(Duration::ZERO), &config)
            .enrich(&entities, "")
            .await;
        assert_eq!(sources.len(), DEFAULT_MAX_SOURCES);

        let sources = Enricher::new(providers(Duration::ZERO))
            .with_max_sources(usize::MAX)
            .enrich(&entities, "")
            .await;
        assert_eq!(sources.len(), DEFAULT_MAX_SOURCES);
    }

    #[tokio::test]
    async fn results_are_capped_and_unique() {
        let mut perfume_phone = Entity::new(EntityType::ProductPerfume, "Scent Phone");
        perfume_phone.model = Some("Android".into());
        // Same query twice: every source of the second entity duplicates the first.
        let entities = vec![
            perfume_phone.clone(),
            perfume_phone,
            Entity::new(EntityType::Movie, "Up"),
        ];

        let sources = Enricher::new(providers(Duration::ZERO))
            .enrich(&entities, "")
            .await;
        assert_eq!(sources.len(), 5);

        let keys: HashSet<_> = sources.iter().map(Source::dedup_key).collect();
        assert_eq!(keys.len(), sources.len());
        let labels: Vec<_> = sources.iter().map(|s| s.provider.as_str()).collect();
        assert_eq!(
            labels,
            vec!["fragrantica", "sephora", "notino", "gsmarena", "amazon"]
        );
    }

    #[tokio::test]
    async fn duplicates_across_entities_are_dropped() {
        let entities = vec![
            Entity::new(EntityType::Person, "Ada Lovelace"),
            Entity::new(EntityType::Person, "Ada Lovelace"),
        ];
        let sources = Enricher::new(providers(Duration::ZERO))
            .enrich(&entities, "")
            .await;
        let labels: Vec<_> = sources.iter().map(|s| s.provider.as_str()).collect();
        assert_eq!(labels, vec!["wikipedia", "web"]);
    }

    #[tokio::test]
    async fn hanging_providers_return_empty_within_budget() {
        let budget = Duration::from_millis(200);
        let enricher = Enricher::new(providers(Duration::from_secs(30))).with_budget(budget);

        let started = std::time::Instant::now();
        let sources = enricher
            .enrich(&[nikon(), Entity::new(EntityType::Movie, "Dune")], "")
            .await;
        assert!(sources.is_empty());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn deadline_keeps_completed_results() {
        let set = ProviderSet {
            encyclopedia: FakeProvider::new("wikipedia", Duration::ZERO, true),
            ..providers(Duration::from_secs(30))
        };
        let sources = Enricher::new(set)
            .with_budget(Duration::from_millis(300))
            .enrich(&[Entity::new(EntityType::Person, "Grace Hopper")], "")
            .await;
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].provider, "wikipedia");
    }

    #[tokio::test]
    async fn empty_results_are_skipped() {
        let set = ProviderSet {
            encyclopedia: FakeProvider::new("wikipedia", Duration::ZERO, false),
            ..providers(Duration::ZERO)
        };
        let sources = Enricher::new(set)
            .enrich(&[Entity::new(EntityType::Other, "Rust")], "")
            .await;
        let labels: Vec<_> = sources.iter().map(|s| s.provider.as_str()).collect();
        assert_eq!(labels, vec!["web"]);
    }

    #[test]
    fn dedup_prefers_first_and_caps() {
        let a = Source::link("web", "A", "https://a.example");
        let mut a_again = a.clone();
        a_again.title = "A (again)".into();
        let b = Source::link("wikipedia", "B", "https://a.example");
        let out = dedup_and_cap(vec![a.clone(), a_again, b.clone()], 5);
        assert_eq!(out, vec![a.clone(), b]);
        assert!(dedup_and_cap(vec![a], 0).is_empty());
    }
}
