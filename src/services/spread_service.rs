use std::time::Duration;

use tracing::{info, warn};

use crate::config::LandingConfig;
use crate::database::ProfileRepository;
use crate::error::Result;
use crate::models::{ProfilePoint, ProfileRecord};
use crate::services::cache_service::TtlCache;
use crate::services::geo_service::Coordinates;
use crate::services::privacy_service::VisibilityScope;

pub const SPREAD_CACHE_KEY: &str = "landing-map_spread-profiles_v1";
pub const DEFAULT_SPREAD_TTL: Duration = Duration::from_secs(60 * 60 * 24);

/// Pin counts a landing request may ask for, besides the configured one.
pub const LANDING_COUNTS: [usize; 4] = [10, 20, 50, 100];
const MAX_LANDING_COUNT: usize = 100;
const MAX_LANDING_SAMPLE: usize = 1000;

impl From<&ProfileRecord> for ProfilePoint {
    fn from(record: &ProfileRecord) -> Self {
        ProfilePoint {
            id: record.id.clone(),
            latitude: record.latitude,
            longitude: record.longitude,
            avatar: record.avatar.clone(),
        }
    }
}

struct Spread {
    coords: Vec<Option<Coordinates>>,
    // Distance from each candidate to its nearest selected point.
    nearest: Vec<f64>,
    remaining: Vec<usize>,
    selected: Vec<usize>,
}

impl Spread {
    fn new(pool: &[ProfilePoint]) -> Self {
        let coords: Vec<Option<Coordinates>> =
            pool.iter().map(ProfilePoint::coordinates).collect();
        // Points without coordinates can only win once nothing else is left.
        let nearest = coords
            .iter()
            .map(|c| if c.is_some() { f64::INFINITY } else { f64::NEG_INFINITY })
            .collect();
        Self {
            coords,
            nearest,
            remaining: (0..pool.len()).collect(),
            selected: Vec::new(),
        }
    }

    fn take(&mut self, pos: usize) {
        let chosen = self.remaining.remove(pos);
        self.selected.push(chosen);
        let Some(anchor) = self.coords[chosen] else {
            return;
        };
        for &i in &self.remaining {
            if let Some(c) = self.coords[i] {
                let d = anchor.distance_km(&c);
                if d < self.nearest[i] {
                    self.nearest[i] = d;
                }
            }
        }
    }

    // First maximal candidate wins.
    fn farthest(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (pos, &i) in self.remaining.iter().enumerate() {
            let d = self.nearest[i];
            if best.map_or(true, |(_, best_d)| d > best_d) {
                best = Some((pos, d));
            }
        }
        best.map(|(pos, _)| pos)
    }
}

/// Greedy farthest-point (max-min) selection of `count` points.
///
/// Pools no larger than `count` come back unchanged. Otherwise the point
/// with `required_id` (when present) is taken first, then each round takes
/// the remaining point whose nearest already-selected neighbour is the
/// farthest away; ties go to the earliest point in `pool`.
///
/// A running nearest-distance per candidate keeps the pass at O(N·K)
/// haversine evaluations.
pub fn select_spread(
    pool: &[ProfilePoint],
    count: usize,
    required_id: Option<&str>,
) -> Vec<ProfilePoint> {
    if pool.len() <= count {
        return pool.to_vec();
    }

    let mut spread = Spread::new(pool);

    if let Some(required_id) = required_id {
        if let Some(pos) = spread
            .remaining
            .iter()
            .position(|&i| pool[i].id == required_id)
        {
            spread.take(pos);
        }
    }

    while spread.selected.len() < count {
        let Some(pos) = spread.farthest() else {
            break;
        };
        spread.take(pos);
    }

    spread
        .selected
        .into_iter()
        .take(count)
        .map(|i| pool[i].clone())
        .collect()
}

/// Cached landing-globe selection: random sample, optional required
/// profile, spread selection. Failed loads are not cached.
pub async fn get_spread_profiles(
    repo: &dyn ProfileRepository,
    cache: &TtlCache<Vec<ProfilePoint>>,
    ttl: Duration,
    required_id: Option<&str>,
    sample_size: usize,
    count: usize,
) -> Result<Vec<ProfilePoint>> {
    let key = vec![
        SPREAD_CACHE_KEY.to_string(),
        required_id.unwrap_or_default().to_string(),
        sample_size.to_string(),
        count.to_string(),
    ];
    cache
        .get_or_compute(&key, ttl, || {
            load_spread_profiles(repo, required_id, sample_size, count)
        })
        .await
}

/// Parameters of one landing selection. The required profile and the sample
/// size always come from configuration; a caller may only pick the pin count
/// from `LANDING_COUNTS`, so the landing cache holds a handful of keys at most.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandingRequest {
    pub required_id: Option<String>,
    pub sample_size: usize,
    pub count: usize,
}

impl LandingRequest {
    pub fn resolve(landing: &LandingConfig, requested_count: Option<usize>) -> Self {
        let count = match requested_count {
            Some(n) if LANDING_COUNTS.contains(&n) => n,
            _ => landing.count.min(MAX_LANDING_COUNT),
        };
        Self {
            required_id: landing.required_profile_id.clone(),
            sample_size: landing.sample.min(MAX_LANDING_SAMPLE),
            count,
        }
    }
}

pub async fn get_landing_spread(
    repo: &dyn ProfileRepository,
    cache: &TtlCache<Vec<ProfilePoint>>,
    landing: &LandingConfig,
    requested_count: Option<usize>,
) -> Result<Vec<ProfilePoint>> {
    let request = LandingRequest::resolve(landing, requested_count);
    get_spread_profiles(
        repo,
        cache,
        landing.cache_ttl,
        request.required_id.as_deref(),
        request.sample_size,
        request.count,
    )
    .await
}

pub async fn load_spread_profiles(
    repo: &dyn ProfileRepository,
    required_id: Option<&str>,
    sample_size: usize,
    count: usize,
) -> Result<Vec<ProfilePoint>> {
    let mut pool = repo.sample_mappable_points(sample_size).await?;

    if let Some(required_id) = required_id {
        if !pool.iter().any(|p| p.id == required_id) {
            match load_required_point(repo, required_id).await? {
                Some(point) => {
                    // Keep the pool at the sample cap.
                    if !pool.is_empty() && pool.len() >= sample_size {
                        pool.pop();
                    }
                    pool.push(point);
                }
                None => warn!(
                    "🗺️ Required profile {} is not mappable or not public, skipping",
                    required_id
                ),
            }
        }
    }

    let sampled = pool.len();
    pool.retain(ProfilePoint::is_mappable);
    let selected = select_spread(&pool, count, required_id);

    info!(
        "🗺️ Spread selection: sampled={}, mappable={}, selected={}",
        sampled,
        pool.len(),
        selected.len()
    );
    Ok(selected)
}

async fn load_required_point(
    repo: &dyn ProfileRepository,
    required_id: &str,
) -> Result<Option<ProfilePoint>> {
    let Some(record) = repo.find_unique(required_id).await? else {
        return Ok(None);
    };
    if !VisibilityScope::Anonymous.allows(record.privacy, &record.user_id) {
        return Ok(None);
    }
    let point = ProfilePoint::from(&record);
    Ok(point.is_mappable().then_some(point))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::Ordering;

    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    use crate::database::memory_repository::{record, InMemoryProfileRepository};
    use crate::models::Privacy;
    use crate::services::geo_service::haversine_km;

    fn point(id: &str, lat: f64, lon: f64) -> ProfilePoint {
        ProfilePoint {
            id: id.to_string(),
            latitude: Some(lat),
            longitude: Some(lon),
            avatar: Some(format!("{id}.webp")),
        }
    }

    fn random_pool(rng: &mut StdRng, n: usize) -> Vec<ProfilePoint> {
        (0..n)
            .map(|i| {
                point(
                    &format!("p{i}"),
                    rng.gen_range(-90.0..=90.0),
                    rng.gen_range(-180.0..=180.0),
                )
            })
            .collect()
    }

    fn ids(points: &[ProfilePoint]) -> HashSet<String> {
        points.iter().map(|p| p.id.clone()).collect()
    }

    fn mean_pairwise_km(points: &[ProfilePoint]) -> f64 {
        let mut total = 0.0;
        let mut pairs = 0.0;
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                total += haversine_km(
                    a.latitude.unwrap(),
                    a.longitude.unwrap(),
                    b.latitude.unwrap(),
                    b.longitude.unwrap(),
                );
                pairs += 1.0;
            }
        }
        total / pairs
    }

    #[test]
    fn small_pool_is_returned_unchanged() {
        let pool = vec![point("a", 1.0, 1.0), point("b", 2.0, 2.0)];
        assert_eq!(select_spread(&pool, 2, None), pool);
        assert_eq!(select_spread(&pool, 10, Some("zzz")), pool);
    }

    #[test]
    fn degenerate_inputs_give_empty_results() {
        assert!(select_spread(&[], 5, None).is_empty());
        let pool = vec![point("a", 1.0, 1.0), point("b", 2.0, 2.0)];
        assert!(select_spread(&pool, 0, None).is_empty());
        assert!(select_spread(&pool, 0, Some("a")).is_empty());
    }

    #[test]
    fn exact_size_without_duplicates() {
        let mut rng = StdRng::seed_from_u64(11);
        for n in [21, 50, 120] {
            let pool = random_pool(&mut rng, n);
            let picked = select_spread(&pool, 20, None);
            assert_eq!(picked.len(), 20);
            assert_eq!(ids(&picked).len(), 20);
            assert!(ids(&picked).is_subset(&ids(&pool)));
        }
    }

    #[test]
    fn first_pick_is_first_in_pool_then_farthest() {
        let pool = vec![
            point("origin", 0.0, 0.0),
            point("near", 0.0, 1.0),
            point("antipode", 0.0, 180.0),
            point("quarter", 0.0, 90.0),
        ];
        let picked = select_spread(&pool, 3, None);
        let order: Vec<&str> = picked.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(order, vec!["origin", "antipode", "quarter"]);
    }

    #[test]
    fn ties_go_to_the_earliest_candidate() {
        let pool = vec![
            point("seed", 0.0, 0.0),
            point("east", 0.0, 90.0),
            point("west", 0.0, -90.0),
        ];
        let picked = select_spread(&pool, 2, None);
        assert_eq!(picked[1].id, "east");
    }

    #[test]
    fn required_point_is_seeded_first() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut pool = random_pool(&mut rng, 299);
        pool.push(point("required", 0.0, 0.0));

        let picked = select_spread(&pool, 20, Some("required"));
        assert_eq!(picked.len(), 20);
        assert_eq!(picked[0].id, "required");
        assert_eq!(ids(&picked).len(), 20);
    }

    #[test]
    fn unknown_required_id_is_ignored() {
        let mut rng = StdRng::seed_from_u64(5);
        let pool = random_pool(&mut rng, 40);
        assert_eq!(
            select_spread(&pool, 10, Some("missing")),
            select_spread(&pool, 10, None)
        );
    }

    #[test]
    fn selection_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(99);
        let pool = random_pool(&mut rng, 200);
        assert_eq!(
            select_spread(&pool, 15, Some("p17")),
            select_spread(&pool, 15, Some("p17"))
        );
    }

    #[test]
    fn spreads_wider_than_a_random_sample_on_average() {
        let mut rng = StdRng::seed_from_u64(2024);
        let mut spread_total = 0.0;
        let mut random_total = 0.0;
        for _ in 0..20 {
            let pool = random_pool(&mut rng, 150);
            let spread = select_spread(&pool, 12, None);
            let random: Vec<ProfilePoint> =
                pool.choose_multiple(&mut rng, 12).cloned().collect();
            spread_total += mean_pairwise_km(&spread);
            random_total += mean_pairwise_km(&random);
        }
        assert!(spread_total > random_total);
    }

    #[test]
    fn points_without_coordinates_are_picked_last() {
        let mut blank = point("blank", 0.0, 0.0);
        blank.latitude = None;
        let pool = vec![
            blank,
            point("a", 10.0, 10.0),
            point("b", -10.0, -10.0),
        ];
        let picked = select_spread(&pool, 2, None);
        assert!(picked.iter().all(|p| p.id != "blank"));
    }

    fn mappable_record(id: &str, privacy: Privacy, lat: f64, lon: f64) -> ProfileRecord {
        let mut r = record(id, &format!("user-{id}"), privacy);
        r.latitude = Some(lat);
        r.longitude = Some(lon);
        r
    }

    #[tokio::test]
    async fn injects_required_profile_missing_from_the_sample() {
        let mut rng = StdRng::seed_from_u64(3);
        let sample = random_pool(&mut rng, 50);
        let repo = InMemoryProfileRepository::with_sample(sample);
        repo.profiles
            .lock()
            .unwrap()
            .push(mappable_record("required", Privacy::Unlisted, 0.0, 0.0));

        let picked = load_spread_profiles(&repo, Some("required"), 50, 20)
            .await
            .unwrap();
        assert_eq!(picked.len(), 20);
        assert_eq!(picked[0].id, "required");
    }

    #[tokio::test]
    async fn hidden_required_profile_is_not_injected() {
        let mut rng = StdRng::seed_from_u64(4);
        let repo = InMemoryProfileRepository::with_sample(random_pool(&mut rng, 30));
        repo.profiles
            .lock()
            .unwrap()
            .push(mappable_record("secret", Privacy::Hidden, 0.0, 0.0));

        let picked = load_spread_profiles(&repo, Some("secret"), 30, 10)
            .await
            .unwrap();
        assert_eq!(picked.len(), 10);
        assert!(picked.iter().all(|p| p.id != "secret"));
    }

    #[tokio::test]
    async fn drops_unmappable_sample_entries() {
        let repo = InMemoryProfileRepository::with_sample(vec![
            point("bad", 95.0, 0.0),
            point("good", 10.0, 10.0),
        ]);
        let picked = load_spread_profiles(&repo, None, 10, 5).await.unwrap();
        assert_eq!(ids(&picked), HashSet::from(["good".to_string()]));
    }

    #[tokio::test]
    async fn cached_selection_skips_the_repository() {
        let mut rng = StdRng::seed_from_u64(8);
        let repo = InMemoryProfileRepository::with_sample(random_pool(&mut rng, 40));
        let cache = TtlCache::new();

        let first = get_spread_profiles(&repo, &cache, DEFAULT_SPREAD_TTL, None, 40, 8)
            .await
            .unwrap();
        let second = get_spread_profiles(&repo, &cache, DEFAULT_SPREAD_TTL, None, 40, 8)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(repo.sample_calls.load(Ordering::SeqCst), 1);

        get_spread_profiles(&repo, &cache, DEFAULT_SPREAD_TTL, None, 40, 9)
            .await
            .unwrap();
        assert_eq!(repo.sample_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn repository_failure_propagates_and_is_not_cached() {
        let mut rng = StdRng::seed_from_u64(9);
        let repo = InMemoryProfileRepository::with_sample(random_pool(&mut rng, 10));
        let cache = TtlCache::new();

        repo.fail.store(true, Ordering::SeqCst);
        let err = get_spread_profiles(&repo, &cache, DEFAULT_SPREAD_TTL, None, 10, 5).await;
        assert!(err.is_err());

        repo.fail.store(false, Ordering::SeqCst);
        let ok = get_spread_profiles(&repo, &cache, DEFAULT_SPREAD_TTL, None, 10, 5)
            .await
            .unwrap();
        assert_eq!(ok.len(), 5);
    }

    fn landing_config(required: Option<&str>) -> LandingConfig {
        LandingConfig {
            required_profile_id: required.map(str::to_string),
            count: 8,
            sample: 40,
            cache_ttl: DEFAULT_SPREAD_TTL,
        }
    }

    #[test]
    fn landing_request_only_takes_listed_counts() {
        let landing = landing_config(Some("keeper"));

        let default = LandingRequest::resolve(&landing, None);
        assert_eq!(
            default,
            LandingRequest {
                required_id: Some("keeper".into()),
                sample_size: 40,
                count: 8,
            }
        );
        assert_eq!(LandingRequest::resolve(&landing, Some(50)).count, 50);
        assert_eq!(LandingRequest::resolve(&landing, Some(7)).count, 8);
        assert_eq!(LandingRequest::resolve(&landing, Some(usize::MAX)).count, 8);
    }

    #[test]
    fn landing_request_clamps_configured_sizes() {
        let landing = LandingConfig {
            count: 5_000,
            sample: 50_000,
            ..landing_config(None)
        };
        let request = LandingRequest::resolve(&landing, None);
        assert_eq!(request.count, 100);
        assert_eq!(request.sample_size, 1000);
    }

    #[tokio::test]
    async fn arbitrary_landing_counts_share_a_few_cache_entries() {
        let mut rng = StdRng::seed_from_u64(10);
        let repo = InMemoryProfileRepository::with_sample(random_pool(&mut rng, 40));
        let cache = TtlCache::new();
        let landing = landing_config(None);

        for requested in 0..500 {
            get_landing_spread(&repo, &cache, &landing, Some(requested))
                .await
                .unwrap();
        }
        // The configured count plus the four listed ones.
        assert_eq!(repo.sample_calls.load(Ordering::SeqCst), 5);
        assert_eq!(cache.len().await, 5);

        get_landing_spread(&repo, &cache, &landing, None).await.unwrap();
        assert_eq!(repo.sample_calls.load(Ordering::SeqCst), 5);
    }
}
