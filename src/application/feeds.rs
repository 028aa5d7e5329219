use chrono::{Local, NaiveDate};
use dashmap::DashMap;
use std::sync::Arc;

use crate::domain::{Task, TaskId};
use crate::ports::TaskRepository;

/// The independently paginated task lists the client tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    /// All upcoming tasks assigned to the current user.
    Mine,
    /// Upcoming tasks assigned to everyone else (manager view, today-scoped).
    OthersIncoming,
    /// Past tasks.
    History,
    /// Current user's tasks for the selected date.
    DateMine,
    /// Everyone else's tasks for the selected date.
    DateOthers,
}

impl FeedKind {
    /// The two date sub-feeds share one combined fetch.
    fn sibling(self) -> Option<FeedKind> {
        match self {
            FeedKind::DateMine => Some(FeedKind::DateOthers),
            FeedKind::DateOthers => Some(FeedKind::DateMine),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedState {
    pub items: Vec<Task>,
    /// Last server page applied; `None` until the first page lands.
    pub page: Option<u32>,
    pub has_more: bool,
    pub loading: bool,
    pub param: Option<NaiveDate>,
    generation: u64,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page: None,
            has_more: true,
            loading: false,
            param: None,
            generation: 0,
        }
    }
}

struct LoadTicket {
    generation: u64,
    next_page: u32,
    param: Option<NaiveDate>,
}

/// Accumulates server pages per feed and guards against the interleaving
/// hazards of independently-issued async responses: no concurrent loads for
/// one feed, append only when the returned page advances the stored cursor,
/// and a per-feed generation counter so a response computed for a parameter
/// that has since been reset is dropped instead of applied.
pub struct FeedBoard {
    repo: Arc<dyn TaskRepository>,
    page_size: u32,
    feeds: DashMap<FeedKind, FeedState>,
}

impl FeedBoard {
    pub fn new(repo: Arc<dyn TaskRepository>, page_size: u32) -> Self {
        Self {
            repo,
            page_size,
            feeds: DashMap::new(),
        }
    }

    /// Clears a feed back to its unloaded state. Any response still in
    /// flight for the previous parameter will arrive with an outdated
    /// generation and be ignored.
    pub fn reset(&self, kind: FeedKind, param: Option<NaiveDate>) {
        let mut state = self.feeds.entry(kind).or_default();
        let generation = state.generation + 1;
        *state = FeedState {
            param,
            generation,
            ..FeedState::default()
        };
    }

    pub fn state(&self, kind: FeedKind) -> FeedState {
        self.feeds
            .get(&kind)
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn tasks(&self, kind: FeedKind) -> Vec<Task> {
        self.state(kind).items
    }

    /// Fetches and appends the next page. Returns whether the feed changed.
    /// A call while a load is in flight or the feed is exhausted is a no-op;
    /// a fetch failure is logged and leaves the feed untouched (the UI
    /// degrades to whatever was already loaded).
    pub async fn load_next(&self, kind: FeedKind) -> bool {
        match kind {
            FeedKind::DateMine | FeedKind::DateOthers => self.load_next_date(kind).await,
            _ => self.load_next_single(kind).await,
        }
    }

    /// Drains a feed to exhaustion.
    pub async fn load_all(&self, kind: FeedKind) {
        while self.state(kind).has_more {
            if !self.load_next(kind).await {
                break;
            }
        }
    }

    /// Delete reconciliation: drop the task from every feed that holds it.
    /// An absent id is a no-op.
    pub fn remove_task(&self, id: TaskId) {
        for mut entry in self.feeds.iter_mut() {
            entry.value_mut().items.retain(|t| t.id != id);
        }
    }

    async fn load_next_single(&self, kind: FeedKind) -> bool {
        let Some(ticket) = self.begin(kind) else {
            return false;
        };

        let result = match kind {
            FeedKind::Mine => self.repo.user_tasks(ticket.next_page, self.page_size).await,
            FeedKind::OthersIncoming => {
                let date = ticket.param.unwrap_or_else(today);
                self.repo
                    .others_incoming(date, ticket.next_page, self.page_size)
                    .await
            }
            FeedKind::History => self.repo.history(ticket.next_page, self.page_size).await,
            _ => unreachable!("date feeds handled separately"),
        };

        match result {
            Ok(page) => {
                let has_more = page.has_more();
                self.apply(kind, ticket.generation, page.items, page.page, has_more, true)
            }
            Err(e) => {
                tracing::warn!(feed = ?kind, error = %e, "feed page fetch failed");
                self.abort(kind, ticket.generation);
                false
            }
        }
    }

    /// The date-scoped view has two sub-feeds behind one combined endpoint:
    /// advancing one passes the other's current cursor along, and each side
    /// of the response is applied against its own cursor and generation.
    async fn load_next_date(&self, kind: FeedKind) -> bool {
        let sibling = kind.sibling().expect("date feed has a sibling");

        let Some(ticket) = self.begin(kind) else {
            return false;
        };
        let Some(date) = ticket.param else {
            tracing::warn!(feed = ?kind, "date feed loaded without a selected date");
            self.abort(kind, ticket.generation);
            return false;
        };

        let (sibling_generation, sibling_page) = {
            let state = self.feeds.entry(sibling).or_default();
            (state.generation, state.page)
        };

        let (user_page, other_page) = match kind {
            FeedKind::DateMine => (ticket.next_page, sibling_page.unwrap_or(0)),
            _ => (sibling_page.unwrap_or(0), ticket.next_page),
        };

        match self
            .repo
            .by_date_detailed(date, user_page, other_page, self.page_size)
            .await
        {
            Ok(combined) => {
                let (active, passive) = match kind {
                    FeedKind::DateMine => (combined.user_tasks, combined.other_tasks),
                    _ => (combined.other_tasks, combined.user_tasks),
                };
                self.apply(
                    sibling,
                    sibling_generation,
                    passive.items,
                    passive.page,
                    passive.has_more,
                    false,
                );
                self.apply(
                    kind,
                    ticket.generation,
                    active.items,
                    active.page,
                    active.has_more,
                    true,
                )
            }
            Err(e) => {
                tracing::warn!(feed = ?kind, %date, error = %e, "date feed fetch failed");
                self.abort(kind, ticket.generation);
                false
            }
        }
    }

    fn begin(&self, kind: FeedKind) -> Option<LoadTicket> {
        let mut state = self.feeds.entry(kind).or_default();
        if state.loading || !state.has_more {
            return None;
        }
        state.loading = true;
        Some(LoadTicket {
            generation: state.generation,
            next_page: state.page.map_or(0, |p| p + 1),
            param: state.param,
        })
    }

    /// Applies one page to a feed. A first page lands on a fresh feed as a
    /// replacement; afterwards only a strictly newer page number appends,
    /// which drops duplicate or out-of-order responses. The cursor and
    /// has-more flag only move when the page is accepted.
    fn apply(
        &self,
        kind: FeedKind,
        generation: u64,
        items: Vec<Task>,
        page: u32,
        has_more: bool,
        active: bool,
    ) -> bool {
        let mut state = self.feeds.entry(kind).or_default();

        if state.generation != generation {
            // The feed was reset while this request was in flight; the reset
            // already cleared the loading flag.
            tracing::debug!(feed = ?kind, page, "dropping response for stale feed generation");
            return false;
        }

        if active {
            state.loading = false;
        }

        let accepted = match state.page {
            None if page == 0 => {
                state.items = items;
                true
            }
            Some(current) if page > current => {
                state.items.extend(items);
                true
            }
            _ => false,
        };

        if accepted {
            state.page = Some(page);
            state.has_more = has_more;
        }
        accepted
    }

    fn abort(&self, kind: FeedKind, generation: u64) {
        let mut state = self.feeds.entry(kind).or_default();
        if state.generation == generation {
            state.loading = false;
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TaskPriority, TaskStatus};
    use crate::ports::{
        DatePage, MockTaskRepository, RepositoryError, RepositoryResult, SubFeedPage, TaskPage,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::Notify;

    fn task(id: i64) -> Task {
        Task {
            id: TaskId(id),
            assigned_user: "alice".to_string(),
            assigned_by: None,
            date: "2024-03-05".parse().unwrap(),
            description: format!("task {id}"),
            status: TaskStatus::Pending,
            priority: TaskPriority::Medium,
        }
    }

    fn page(ids: &[i64], page: u32, total_pages: u32) -> TaskPage {
        TaskPage {
            items: ids.iter().map(|&id| task(id)).collect(),
            page,
            total_pages,
        }
    }

    fn sub(ids: &[i64], page: u32, has_more: bool) -> SubFeedPage {
        SubFeedPage {
            items: ids.iter().map(|&id| task(id)).collect(),
            page,
            has_more,
        }
    }

    #[tokio::test]
    async fn aggregates_pages_in_order_and_stops_at_the_end() {
        let mut repo = MockTaskRepository::new();
        repo.expect_user_tasks()
            .withf(|page, size| *page == 0 && *size == 10)
            .times(1)
            .returning(|_, _| Ok(page(&[1, 2], 0, 2)));
        repo.expect_user_tasks()
            .withf(|page, _| *page == 1)
            .times(1)
            .returning(|_, _| Ok(page(&[3], 1, 2)));

        let board = FeedBoard::new(Arc::new(repo), 10);
        board.reset(FeedKind::Mine, None);

        assert!(board.load_next(FeedKind::Mine).await);
        assert!(board.load_next(FeedKind::Mine).await);
        // Exhausted: no further fetch is issued (the mock would panic).
        assert!(!board.load_next(FeedKind::Mine).await);

        let state = board.state(FeedKind::Mine);
        assert_eq!(
            state.items.iter().map(|t| t.id.0).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(state.page, Some(1));
        assert!(!state.has_more);
    }

    #[tokio::test]
    async fn duplicate_page_response_is_not_appended() {
        let mut repo = MockTaskRepository::new();
        // Server bug: both requests answered with page 0.
        repo.expect_history()
            .times(2)
            .returning(|_, _| Ok(page(&[1, 2], 0, 2)));

        let board = FeedBoard::new(Arc::new(repo), 10);
        board.reset(FeedKind::History, None);

        assert!(board.load_next(FeedKind::History).await);
        assert!(!board.load_next(FeedKind::History).await);

        let state = board.state(FeedKind::History);
        assert_eq!(state.items.len(), 2);
        assert_eq!(state.page, Some(0));
    }

    #[tokio::test]
    async fn fetch_failure_degrades_and_allows_retry() {
        let mut repo = MockTaskRepository::new();
        let mut seq = mockall::Sequence::new();
        repo.expect_history()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(RepositoryError::Network("connection refused".into())));
        repo.expect_history()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(page(&[5], 0, 1)));

        let board = FeedBoard::new(Arc::new(repo), 10);
        board.reset(FeedKind::History, None);

        assert!(!board.load_next(FeedKind::History).await);
        let state = board.state(FeedKind::History);
        assert!(state.items.is_empty());
        assert!(!state.loading);
        assert!(state.has_more);

        // Explicit user-initiated retry succeeds.
        assert!(board.load_next(FeedKind::History).await);
        assert_eq!(board.tasks(FeedKind::History).len(), 1);
    }

    #[tokio::test]
    async fn date_sub_feeds_advance_independently() {
        let date: NaiveDate = "2024-03-05".parse().unwrap();
        let mut repo = MockTaskRepository::new();
        repo.expect_by_date_detailed()
            .withf(|_, user_page, other_page, _| *user_page == 0 && *other_page == 0)
            .times(1)
            .returning(|_, _, _, _| {
                Ok(DatePage {
                    user_tasks: sub(&[1], 0, true),
                    other_tasks: sub(&[2], 0, false),
                })
            });
        repo.expect_by_date_detailed()
            .withf(|_, user_page, other_page, _| *user_page == 1 && *other_page == 0)
            .times(1)
            .returning(|_, _, _, _| {
                Ok(DatePage {
                    user_tasks: sub(&[3], 1, false),
                    // Combined call re-sends the sibling's current page.
                    other_tasks: sub(&[2], 0, false),
                })
            });

        let board = FeedBoard::new(Arc::new(repo), 10);
        board.reset(FeedKind::DateMine, Some(date));
        board.reset(FeedKind::DateOthers, Some(date));

        assert!(board.load_next(FeedKind::DateMine).await);
        assert!(board.load_next(FeedKind::DateMine).await);

        let mine = board.state(FeedKind::DateMine);
        assert_eq!(
            mine.items.iter().map(|t| t.id.0).collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert!(!mine.has_more);

        // The re-sent page 0 did not duplicate into the sibling feed.
        let others = board.state(FeedKind::DateOthers);
        assert_eq!(
            others.items.iter().map(|t| t.id.0).collect::<Vec<_>>(),
            vec![2]
        );
        assert!(!others.has_more);

        // Exhausted sibling issues no fetch of its own.
        assert!(!board.load_next(FeedKind::DateOthers).await);
    }

    #[tokio::test]
    async fn remove_task_drops_id_from_every_feed() {
        let mut repo = MockTaskRepository::new();
        repo.expect_user_tasks()
            .returning(|_, _| Ok(page(&[3, 7, 9], 0, 1)));
        repo.expect_history()
            .returning(|_, _| Ok(page(&[7], 0, 1)));

        let board = FeedBoard::new(Arc::new(repo), 10);
        board.reset(FeedKind::Mine, None);
        board.reset(FeedKind::History, None);
        board.load_next(FeedKind::Mine).await;
        board.load_next(FeedKind::History).await;

        board.remove_task(TaskId(7));
        assert_eq!(
            board
                .tasks(FeedKind::Mine)
                .iter()
                .map(|t| t.id.0)
                .collect::<Vec<_>>(),
            vec![3, 9]
        );
        assert!(board.tasks(FeedKind::History).is_empty());

        // Absent id is a no-op.
        board.remove_task(TaskId(42));
        assert_eq!(board.tasks(FeedKind::Mine).len(), 2);
    }

    /// Repository stub whose `user_tasks` blocks until released, to
    /// interleave a reset with an in-flight load.
    struct GatedRepo {
        started: Notify,
        release: Notify,
        calls: AtomicU32,
    }

    #[async_trait]
    impl TaskRepository for GatedRepo {
        async fn user_tasks(&self, _page: u32, _size: u32) -> RepositoryResult<TaskPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.started.notify_one();
            self.release.notified().await;
            Ok(page(&[99], 0, 1))
        }

        async fn others_incoming(
            &self,
            _date: NaiveDate,
            _page: u32,
            _size: u32,
        ) -> RepositoryResult<TaskPage> {
            unimplemented!()
        }

        async fn history(&self, _page: u32, _size: u32) -> RepositoryResult<TaskPage> {
            unimplemented!()
        }

        async fn by_date_detailed(
            &self,
            _date: NaiveDate,
            _user_page: u32,
            _other_page: u32,
            _size: u32,
        ) -> RepositoryResult<DatePage> {
            unimplemented!()
        }

        async fn by_date(&self, _date: NaiveDate) -> RepositoryResult<Vec<Task>> {
            unimplemented!()
        }

        async fn calendar(
            &self,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> RepositoryResult<Vec<Task>> {
            unimplemented!()
        }

        async fn assign(
            &self,
            _draft: &crate::domain::TaskDraft,
        ) -> RepositoryResult<Task> {
            unimplemented!()
        }

        async fn get_task(&self, _id: TaskId) -> RepositoryResult<Task> {
            unimplemented!()
        }

        async fn update_task(
            &self,
            _id: TaskId,
            _patch: &crate::domain::TaskPatch,
        ) -> RepositoryResult<Task> {
            unimplemented!()
        }

        async fn delete_task(&self, _id: TaskId) -> RepositoryResult<()> {
            unimplemented!()
        }

        async fn staff(&self) -> RepositoryResult<Vec<crate::domain::StaffMember>> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn concurrent_load_for_same_feed_is_a_noop() {
        let repo = Arc::new(GatedRepo {
            started: Notify::new(),
            release: Notify::new(),
            calls: AtomicU32::new(0),
        });
        let board = Arc::new(FeedBoard::new(repo.clone(), 10));
        board.reset(FeedKind::Mine, None);

        let in_flight = {
            let board = board.clone();
            tokio::spawn(async move { board.load_next(FeedKind::Mine).await })
        };
        repo.started.notified().await;

        // Second call while the first is in flight: no fetch, no change.
        assert!(!board.load_next(FeedKind::Mine).await);
        assert_eq!(repo.calls.load(Ordering::SeqCst), 1);

        repo.release.notify_one();
        assert!(in_flight.await.unwrap());
        assert_eq!(board.tasks(FeedKind::Mine).len(), 1);
    }

    #[tokio::test]
    async fn reset_mid_flight_discards_the_stale_response() {
        let repo = Arc::new(GatedRepo {
            started: Notify::new(),
            release: Notify::new(),
            calls: AtomicU32::new(0),
        });
        let board = Arc::new(FeedBoard::new(repo.clone(), 10));
        board.reset(FeedKind::Mine, None);

        let in_flight = {
            let board = board.clone();
            tokio::spawn(async move { board.load_next(FeedKind::Mine).await })
        };
        repo.started.notified().await;

        // Parameter changes while the response is still in flight.
        board.reset(FeedKind::Mine, None);
        repo.release.notify_one();

        assert!(!in_flight.await.unwrap());
        let state = board.state(FeedKind::Mine);
        assert!(state.items.is_empty());
        assert_eq!(state.page, None);
        assert!(state.has_more);
        assert!(!state.loading);
    }
}
