//! In-memory store, cache and fixtures for service tests

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::{
    cache::CacheBackend,
    config::{CacheConfig, Config, DatabaseConfig, JoinConfig, JwtConfig, RedisConfig, ServerConfig},
    constants::{DISQUALIFIED_SCORE, results},
    db::{ContestStore, ParticipationFilter},
    error::{AppError, AppResult},
    formats::FormatRegistry,
    models::{
        AttemptedProblem, Contest, ContestParticipation, ContestProblem, ContestSubmission,
        ContestSubmissionScore, NewParticipation, ParticipationResults, Profile, RankingRow,
        Submission,
    },
    state::AppState,
    tasks::JobStatus,
};

pub mod fixtures {
    use super::*;

    pub fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    /// A visible, virtualable three hour contest using the default format
    pub fn contest(id: i64, key: &str) -> Contest {
        let start = base_time();
        Contest {
            id,
            key: key.to_string(),
            name: format!("Round {}", id),
            description: String::new(),
            summary: String::new(),
            start_time: start,
            end_time: start + chrono::Duration::hours(3),
            time_limit_secs: None,
            is_visible: true,
            is_virtualable: true,
            hide_scoreboard: false,
            is_locked: false,
            points_precision: 3,
            user_count: 0,
            format_name: "default".to_string(),
            format_config: None,
            problem_labels: None,
            created_at: start - chrono::Duration::days(1),
            updated_at: start - chrono::Duration::days(1),
        }
    }

    pub fn participation(id: i64, contest_id: i64, user_id: i64, virtual_id: i32) -> ContestParticipation {
        ContestParticipation {
            id,
            contest_id,
            user_id,
            real_start: base_time(),
            score: 0.0,
            cumtime: 0,
            tiebreaker: 0.0,
            is_disqualified: false,
            virtual_id,
            format_data: None,
        }
    }

    /// Contest problem `id` wrapping problem `100 + id` with code `p{id}`
    pub fn contest_problem(id: i64, contest_id: i64, points: i32) -> ContestProblem {
        ContestProblem {
            id,
            contest_id,
            problem_id: 100 + id,
            problem_code: format!("p{}", id),
            problem_name: format!("Problem {}", id),
            points,
            partial: true,
            is_pretested: false,
            order: id as i32,
            max_submissions: None,
        }
    }

    pub fn contest_submission(
        id: i64,
        problem_id: i64,
        problem_points: i32,
        points: f64,
        date: DateTime<Utc>,
    ) -> ContestSubmission {
        ContestSubmission {
            id,
            submission_id: id,
            problem_id,
            participation_id: 1,
            points,
            is_pretest: false,
            bonus: 0,
            updated_frozen: false,
            is_disqualified: false,
            date,
            problem_points,
        }
    }

    pub fn submission(
        id: i64,
        user_id: i64,
        problem_id: i64,
        points: f64,
        total: f64,
        result: &str,
        date: DateTime<Utc>,
    ) -> Submission {
        Submission {
            id,
            user_id,
            problem_id,
            points: Some(points),
            total: Some(total),
            result: Some(result.to_string()),
            date,
            is_pretested: false,
        }
    }

    pub fn profile(id: i64, username: &str) -> Profile {
        Profile {
            id,
            username: username.to_string(),
            display_rank: "user".to_string(),
            is_unlisted: false,
            current_contest: None,
        }
    }

    pub fn ranking_row(participation: ContestParticipation, username: &str) -> RankingRow {
        RankingRow {
            participation,
            username: username.to_string(),
            display_rank: "user".to_string(),
            submission_count: 0,
        }
    }

    pub fn config(cache_ttl_secs: u64) -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                rust_log: "debug".to_string(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/judgeboard_test".to_string(),
                max_connections: 1,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
            },
            jwt: JwtConfig {
                secret: "test-secret".to_string(),
            },
            cache: CacheConfig {
                ttl_secs: cache_ttl_secs,
            },
            join: JoinConfig {
                max_retries: 8,
                retry_base_delay_ms: 1,
            },
        }
    }
}

#[derive(Default)]
struct Tables {
    contests: BTreeMap<i64, Contest>,
    organizers: BTreeSet<(i64, i64)>,
    bans: HashSet<(i64, i64)>,
    contest_problems: BTreeMap<i64, ContestProblem>,
    problem_points: HashMap<i64, f64>,
    participations: BTreeMap<i64, ContestParticipation>,
    submissions: BTreeMap<i64, Submission>,
    contest_submissions: BTreeMap<i64, ContestSubmission>,
    profiles: BTreeMap<i64, Profile>,
    failing_results: HashSet<i64>,
    failing_scores: HashSet<i64>,
}

impl Tables {
    fn contest_mut(&mut self, id: i64) -> AppResult<&mut Contest> {
        self.contests
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Contest not found".to_string()))
    }

    fn participation_mut(&mut self, id: i64) -> AppResult<&mut ContestParticipation> {
        self.participations
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Participation not found".to_string()))
    }

    fn save_results(
        &mut self,
        participation_id: i64,
        results: &ParticipationResults,
    ) -> AppResult<ContestParticipation> {
        if self.failing_results.contains(&participation_id) {
            return Err(AppError::Database("injected failure".to_string()));
        }
        let participation = self.participation_mut(participation_id)?;
        participation.apply_results(results);
        if participation.is_disqualified {
            participation.score = DISQUALIFIED_SCORE;
        }
        Ok(participation.clone())
    }

    fn contest_submissions_of(&self, participation_id: i64) -> Vec<&ContestSubmission> {
        self.contest_submissions
            .values()
            .filter(|cs| cs.participation_id == participation_id)
            .collect()
    }
}

/// [`ContestStore`] over plain maps
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    yield_on_read: Mutex<bool>,
}

impl MemoryStore {
    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn insert_contest(&self, contest: Contest) {
        self.tables().contests.insert(contest.id, contest);
    }

    pub fn insert_contest_problem(&self, problem: ContestProblem) {
        let mut tables = self.tables();
        tables
            .problem_points
            .insert(problem.problem_id, problem.points as f64);
        tables.contest_problems.insert(problem.id, problem);
    }

    pub fn set_problem_points(&self, problem_id: i64, points: f64) {
        self.tables().problem_points.insert(problem_id, points);
    }

    pub fn insert_submission(&self, submission: Submission) {
        self.tables().submissions.insert(submission.id, submission);
    }

    pub fn insert_contest_submission(&self, submission: ContestSubmission) {
        self.tables()
            .contest_submissions
            .insert(submission.id, submission);
    }

    pub fn insert_participation(&self, participation: ContestParticipation) -> ContestParticipation {
        self.tables()
            .participations
            .insert(participation.id, participation.clone());
        participation
    }

    pub fn insert_profile(&self, profile: Profile) {
        self.tables().profiles.insert(profile.id, profile);
    }

    pub fn add_organizer(&self, contest_id: i64, profile_id: i64) {
        self.tables().organizers.insert((contest_id, profile_id));
    }

    pub fn profile_sync(&self, id: i64) -> Profile {
        self.tables().profiles[&id].clone()
    }

    pub fn participation_sync(&self, id: i64) -> ContestParticipation {
        self.tables().participations[&id].clone()
    }

    pub fn contest_sync(&self, id: i64) -> Contest {
        self.tables().contests[&id].clone()
    }

    pub fn update_contest_sync(&self, id: i64, update: impl FnOnce(&mut Contest)) {
        update(self.tables().contests.get_mut(&id).unwrap());
    }

    pub fn unlock_sync(&self, contest_id: i64) {
        self.update_contest_sync(contest_id, |c| c.is_locked = false);
    }

    pub fn is_banned_sync(&self, contest_id: i64, profile_id: i64) -> bool {
        self.tables().bans.contains(&(contest_id, profile_id))
    }

    pub fn set_current_contest_sync(&self, profile_id: i64, participation_id: Option<i64>) {
        self.tables()
            .profiles
            .get_mut(&profile_id)
            .unwrap()
            .current_contest = participation_id;
    }

    pub fn set_unlisted(&self, profile_id: i64, unlisted: bool) {
        self.tables().profiles.get_mut(&profile_id).unwrap().is_unlisted = unlisted;
    }

    /// Make every result write for `participation_id` fail
    pub fn fail_results_for(&self, participation_id: i64) {
        self.tables().failing_results.insert(participation_id);
    }

    /// Make every score write for contest submission `id` fail
    pub fn fail_scores_for(&self, id: i64) {
        self.tables().failing_scores.insert(id);
    }

    /// Record the judge's verdict on a submission
    pub fn judge(&self, submission_id: i64, points: f64, total: f64, result: &str) {
        let mut tables = self.tables();
        let submission = tables.submissions.get_mut(&submission_id).unwrap();
        submission.points = Some(points);
        submission.total = Some(total);
        submission.result = Some(result.to_string());
    }

    pub fn frozen_count(&self, contest_id: i64) -> usize {
        let tables = self.tables();
        tables
            .contest_submissions
            .values()
            .filter(|cs| cs.updated_frozen)
            .filter(|cs| {
                tables
                    .participations
                    .get(&cs.participation_id)
                    .is_some_and(|p| p.contest_id == contest_id)
            })
            .count()
    }

    /// Yield to the scheduler after reading the highest virtual id, so that
    /// concurrent joins interleave between the read and the insert
    pub fn set_yield_on_read(&self, enabled: bool) {
        *self.yield_on_read.lock().unwrap() = enabled;
    }

    pub fn next_submission_id(&self) -> i64 {
        self.tables().submissions.keys().next_back().map_or(1, |id| id + 1)
    }

    pub fn next_contest_submission_id(&self) -> i64 {
        self.tables()
            .contest_submissions
            .keys()
            .next_back()
            .map_or(1, |id| id + 1)
    }
}

#[async_trait]
impl ContestStore for MemoryStore {
    async fn contest_by_key(&self, key: &str) -> AppResult<Option<Contest>> {
        Ok(self.tables().contests.values().find(|c| c.key == key).cloned())
    }

    async fn contest_by_id(&self, id: i64) -> AppResult<Option<Contest>> {
        Ok(self.tables().contests.get(&id).cloned())
    }

    async fn contest_organizers(&self, contest_id: i64) -> AppResult<Vec<i64>> {
        Ok(self
            .tables()
            .organizers
            .iter()
            .filter(|(contest, _)| *contest == contest_id)
            .map(|(_, profile)| *profile)
            .collect())
    }

    async fn contest_problems(&self, contest_id: i64) -> AppResult<Vec<ContestProblem>> {
        let mut problems: Vec<ContestProblem> = self
            .tables()
            .contest_problems
            .values()
            .filter(|p| p.contest_id == contest_id)
            .cloned()
            .collect();
        problems.sort_by_key(|p| (p.order, p.id));
        Ok(problems)
    }

    async fn contest_problem(&self, id: i64) -> AppResult<Option<ContestProblem>> {
        Ok(self.tables().contest_problems.get(&id).cloned())
    }

    async fn update_contest_format(
        &self,
        contest_id: i64,
        format_name: &str,
        format_config: Option<&serde_json::Value>,
    ) -> AppResult<Contest> {
        let mut tables = self.tables();
        let contest = tables.contest_mut(contest_id)?;
        contest.format_name = format_name.to_string();
        contest.format_config = format_config.cloned();
        Ok(contest.clone())
    }

    async fn set_contest_locked(&self, contest_id: i64, locked: bool) -> AppResult<Contest> {
        let mut tables = self.tables();
        let contest = tables.contest_mut(contest_id)?;
        contest.is_locked = locked;
        Ok(contest.clone())
    }

    async fn update_user_count(&self, contest_id: i64) -> AppResult<i32> {
        let mut tables = self.tables();
        let count = tables
            .participations
            .values()
            .filter(|p| p.contest_id == contest_id && p.is_live())
            .count() as i32;
        tables.contest_mut(contest_id)?.user_count = count;
        Ok(count)
    }

    async fn participation(&self, id: i64) -> AppResult<Option<ContestParticipation>> {
        Ok(self.tables().participations.get(&id).cloned())
    }

    async fn find_participation(
        &self,
        contest_id: i64,
        user_id: i64,
        virtual_id: i32,
    ) -> AppResult<Option<ContestParticipation>> {
        Ok(self
            .tables()
            .participations
            .values()
            .find(|p| p.contest_id == contest_id && p.user_id == user_id && p.virtual_id == virtual_id)
            .cloned())
    }

    async fn max_virtual_id(&self, contest_id: i64, user_id: i64) -> AppResult<i32> {
        let max = self
            .tables()
            .participations
            .values()
            .filter(|p| p.contest_id == contest_id && p.user_id == user_id)
            .map(|p| p.virtual_id)
            .max()
            .unwrap_or(0)
            .max(0);

        let yield_now = *self.yield_on_read.lock().unwrap();
        if yield_now {
            tokio::task::yield_now().await;
        }
        Ok(max)
    }

    async fn create_participation(&self, new: &NewParticipation) -> AppResult<ContestParticipation> {
        let mut tables = self.tables();
        let taken = tables.participations.values().any(|p| {
            p.contest_id == new.contest_id && p.user_id == new.user_id && p.virtual_id == new.virtual_id
        });
        if taken {
            return Err(AppError::DataIntegrity(
                "duplicate key value violates unique constraint".to_string(),
            ));
        }

        let id = tables.participations.keys().next_back().map_or(1, |id| id + 1);
        let mut participation = fixtures::participation(id, new.contest_id, new.user_id, new.virtual_id);
        participation.real_start = new.real_start;
        tables.participations.insert(id, participation.clone());
        Ok(participation)
    }

    async fn participation_ids(&self, contest_id: i64) -> AppResult<Vec<i64>> {
        Ok(self
            .tables()
            .participations
            .values()
            .filter(|p| p.contest_id == contest_id)
            .map(|p| p.id)
            .collect())
    }

    async fn ranking_rows(
        &self,
        contest_id: i64,
        filter: ParticipationFilter,
    ) -> AppResult<Vec<RankingRow>> {
        let tables = self.tables();
        let mut rows: Vec<RankingRow> = tables
            .participations
            .values()
            .filter(|p| p.contest_id == contest_id)
            .filter_map(|p| {
                let profile = tables.profiles.get(&p.user_id)?;
                let keep = match filter {
                    ParticipationFilter::Live => p.is_live() && !profile.is_unlisted,
                    ParticipationFilter::UserLive(id) => p.is_live() && p.user_id == id,
                    ParticipationFilter::UserHistory(id) => p.virtual_id >= 0 && p.user_id == id,
                };
                keep.then(|| RankingRow {
                    participation: p.clone(),
                    username: profile.username.clone(),
                    display_rank: profile.display_rank.clone(),
                    submission_count: tables.contest_submissions_of(p.id).len() as i64,
                })
            })
            .collect();

        if let ParticipationFilter::UserHistory(_) = filter {
            rows.sort_by(|a, b| b.participation.virtual_id.cmp(&a.participation.virtual_id));
        }
        Ok(rows)
    }

    async fn contest_submissions(&self, participation_id: i64) -> AppResult<Vec<ContestSubmission>> {
        let tables = self.tables();
        let mut submissions: Vec<ContestSubmission> = tables
            .contest_submissions_of(participation_id)
            .into_iter()
            .cloned()
            .collect();
        submissions.sort_by_key(|s| (s.date, s.id));
        Ok(submissions)
    }

    async fn save_results(
        &self,
        participation_id: i64,
        results: &ParticipationResults,
    ) -> AppResult<ContestParticipation> {
        self.tables().save_results(participation_id, results)
    }

    async fn apply_disqualification(
        &self,
        participation_id: i64,
        disqualified: bool,
        results: &ParticipationResults,
    ) -> AppResult<ContestParticipation> {
        let mut tables = self.tables();
        tables.participation_mut(participation_id)?.is_disqualified = disqualified;
        let participation = tables.save_results(participation_id, results)?;

        let ban = (participation.contest_id, participation.user_id);
        if disqualified {
            if let Some(profile) = tables.profiles.get_mut(&participation.user_id) {
                if profile.current_contest == Some(participation.id) {
                    profile.current_contest = None;
                }
            }
            tables.bans.insert(ban);
        } else {
            tables.bans.remove(&ban);
        }

        Ok(participation)
    }

    async fn submission(&self, id: i64) -> AppResult<Option<Submission>> {
        Ok(self.tables().submissions.get(&id).cloned())
    }

    async fn contest_submission_by_submission(
        &self,
        submission_id: i64,
    ) -> AppResult<Option<ContestSubmission>> {
        Ok(self
            .tables()
            .contest_submissions
            .values()
            .find(|cs| cs.submission_id == submission_id)
            .cloned())
    }

    async fn update_contest_submission(&self, id: i64, score: &ContestSubmissionScore) -> AppResult<()> {
        let mut tables = self.tables();
        if tables.failing_scores.contains(&id) {
            return Err(AppError::Database("injected failure".to_string()));
        }
        let submission = tables
            .contest_submissions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Contest submission not found".to_string()))?;
        submission.points = score.points;
        submission.bonus = score.bonus;
        submission.is_pretest = score.is_pretest;
        submission.updated_frozen = false;
        Ok(())
    }

    async fn mark_frozen(&self, id: i64) -> AppResult<()> {
        let mut tables = self.tables();
        let submission = tables
            .contest_submissions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Contest submission not found".to_string()))?;
        submission.updated_frozen = true;
        Ok(())
    }

    async fn frozen_submissions(&self, contest_id: i64) -> AppResult<Vec<ContestSubmission>> {
        let tables = self.tables();
        Ok(tables
            .contest_submissions
            .values()
            .filter(|cs| cs.updated_frozen)
            .filter(|cs| {
                tables
                    .participations
                    .get(&cs.participation_id)
                    .is_some_and(|p| p.contest_id == contest_id)
            })
            .cloned()
            .collect())
    }

    async fn profile(&self, id: i64) -> AppResult<Option<Profile>> {
        Ok(self.tables().profiles.get(&id).cloned())
    }

    async fn profile_by_username(&self, username: &str) -> AppResult<Option<Profile>> {
        Ok(self
            .tables()
            .profiles
            .values()
            .find(|p| p.username == username)
            .cloned())
    }

    async fn set_current_contest(&self, profile_id: i64, participation_id: Option<i64>) -> AppResult<()> {
        let mut tables = self.tables();
        let profile = tables
            .profiles
            .get_mut(&profile_id)
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
        profile.current_contest = participation_id;
        Ok(())
    }

    async fn is_banned(&self, contest_id: i64, profile_id: i64) -> AppResult<bool> {
        Ok(self.tables().bans.contains(&(contest_id, profile_id)))
    }

    async fn user_completed_ids(&self, profile_id: i64) -> AppResult<BTreeSet<i64>> {
        let tables = self.tables();
        Ok(tables
            .submissions
            .values()
            .filter(|s| s.user_id == profile_id && s.is_fully_solved())
            .filter(|s| tables.problem_points.contains_key(&s.problem_id))
            .map(|s| s.problem_id)
            .collect())
    }

    async fn user_attempted(&self, profile_id: i64) -> AppResult<BTreeMap<i64, AttemptedProblem>> {
        let tables = self.tables();
        let mut best: BTreeMap<i64, f64> = BTreeMap::new();
        for submission in tables.submissions.values().filter(|s| s.user_id == profile_id) {
            let Some(max) = tables.problem_points.get(&submission.problem_id) else {
                continue;
            };
            if let Some(points) = submission.scaled_points(*max) {
                let entry = best.entry(submission.problem_id).or_insert(points);
                *entry = entry.max(points);
            }
        }

        Ok(best
            .into_iter()
            .filter_map(|(problem_id, achieved)| {
                let max = *tables.problem_points.get(&problem_id)?;
                (achieved < max).then_some((
                    problem_id,
                    AttemptedProblem {
                        achieved_points: achieved,
                        max_points: max,
                    },
                ))
            })
            .collect())
    }

    async fn participation_completed_ids(&self, participation_id: i64) -> AppResult<BTreeSet<i64>> {
        let tables = self.tables();
        Ok(tables
            .contest_submissions_of(participation_id)
            .into_iter()
            .filter(|cs| {
                tables
                    .submissions
                    .get(&cs.submission_id)
                    .is_some_and(|s| s.result.as_deref() == Some(results::ACCEPTED))
            })
            .filter_map(|cs| {
                let problem = tables.contest_problems.get(&cs.problem_id)?;
                (cs.points == problem.points as f64).then_some(problem.problem_id)
            })
            .collect())
    }

    async fn participation_attempted(
        &self,
        participation_id: i64,
    ) -> AppResult<BTreeMap<i64, AttemptedProblem>> {
        let tables = self.tables();
        let mut best: BTreeMap<i64, f64> = BTreeMap::new();
        for cs in tables.contest_submissions_of(participation_id) {
            let entry = best.entry(cs.problem_id).or_insert(cs.points);
            *entry = entry.max(cs.points);
        }

        Ok(best
            .into_iter()
            .filter_map(|(contest_problem_id, achieved)| {
                let problem = tables.contest_problems.get(&contest_problem_id)?;
                let max = problem.points as f64;
                (achieved < max).then_some((
                    problem.problem_id,
                    AttemptedProblem {
                        achieved_points: achieved,
                        max_points: max,
                    },
                ))
            })
            .collect())
    }
}

/// [`CacheBackend`] with real expiry and an outage switch
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
    failing: Mutex<bool>,
}

impl MemoryCache {
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    /// Whether `key` holds an unexpired entry
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .is_some_and(|(_, expires)| Instant::now() < *expires)
    }

    fn check(&self) -> AppResult<()> {
        if *self.failing.lock().unwrap() {
            Err(AppError::Redis("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get_raw(&self, key: &str) -> AppResult<Option<String>> {
        self.check()?;
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(key)
            .filter(|(_, expires)| Instant::now() < *expires)
            .map(|(value, _)| value.clone()))
    }

    async fn set_raw(&self, key: &str, value: &str, ttl_secs: u64) -> AppResult<()> {
        self.check()?;
        let expires = Instant::now() + Duration::from_secs(ttl_secs);
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), expires));
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.check()?;
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Application state wired to the in-memory backends
pub struct Harness {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MemoryCache>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_cache_ttl(crate::constants::DEFAULT_CACHE_TTL_SECS)
    }

    pub fn with_cache_ttl(ttl_secs: u64) -> Self {
        let store = Arc::new(MemoryStore::default());
        let cache = Arc::new(MemoryCache::default());
        let state = AppState::new(
            store.clone(),
            cache.clone(),
            FormatRegistry::builtin(),
            fixtures::config(ttl_secs),
        );
        Self {
            state,
            store,
            cache,
        }
    }

    pub fn add_contest(&self, contest: Contest) -> Contest {
        self.store.insert_contest(contest.clone());
        contest
    }

    pub fn add_problem(&self, problem: ContestProblem) -> ContestProblem {
        self.store.insert_contest_problem(problem.clone());
        problem
    }

    /// Store a submission worth `points` contest points on `problem`
    pub fn submit(
        &self,
        participation: &ContestParticipation,
        problem: &ContestProblem,
        points: f64,
        result: &str,
        date: DateTime<Utc>,
    ) -> ContestSubmission {
        let submission_id = self.store.next_submission_id();
        let submission = fixtures::submission(
            submission_id,
            participation.user_id,
            problem.problem_id,
            points,
            problem.points as f64,
            result,
            date,
        );
        self.store.insert_submission(submission);

        let mut contest_submission = fixtures::contest_submission(
            self.store.next_contest_submission_id(),
            problem.id,
            problem.points,
            points,
            date,
        );
        contest_submission.submission_id = submission_id;
        contest_submission.participation_id = participation.id;
        self.store.insert_contest_submission(contest_submission.clone());
        contest_submission
    }

    pub async fn wait_for_job(&self, id: Uuid) -> JobStatus {
        for _ in 0..500 {
            if let Some(status) = self.state.tasks().status(&id) {
                if status.is_finished() {
                    return status;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} did not finish", id);
    }
}
