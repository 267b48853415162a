use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::models::{
    DisplayState, FilterSelection, Question, QueryWindow, SlotStatus, StatisticsSummary,
};
use crate::service::{SearchError, SearchService};

pub const MSG_SELECT_FILTER: &str = "Por favor, selecione alguma FASE e ATIVIDADE!";
pub const MSG_NO_RESULTS: &str =
    "Nenhuma resposta encontrada para a FASE e ATIVIDADE especificadas.";
pub const MSG_NO_RESULTS_DATED: &str =
    "Nenhuma respostas encontrada para essa FASE, ATIVIDADE e DATA especificados.";
pub const MSG_LIST_FAILED: &str = "Ocorreu um erro ao buscar as respostas dessa questão específica. Por favor, tente novamente mais tarde.";
pub const MSG_LIST_FAILED_DATED: &str =
    "Ocorreu um erro ao buscar as respostas da questão. Por favor, tente novamente mais tarde.";
pub const MSG_STATISTICS_FAILED: &str = "Ocorreu um erro ao buscar as estatísticas da questão específicada. Por favor, tente novamente mais tarde.";

#[derive(Default)]
struct FormState {
    filters: FilterSelection,
    display: DisplayState,
}

/// Search form: filter selection plus the display state fed by the backend.
///
/// Every `request_search` fans out into two independent tasks, one for the
/// question list and one for the statistics. Each task writes only its own
/// slice of the display state when it completes.
#[derive(Clone)]
pub struct SearchForm {
    service: Arc<dyn SearchService>,
    state: Arc<Mutex<FormState>>,
    discard_stale: bool,
}

pub enum SearchOutcome {
    /// No phase or activity selected; nothing was sent
    Rejected,
    Dispatched(SearchHandle),
}

/// In-flight queries of one search
pub struct SearchHandle {
    pub generation: u64,
    pub window: QueryWindow,
    list: JoinHandle<()>,
    statistics: JoinHandle<()>,
}

impl SearchHandle {
    /// Wait until both queries have applied their results
    pub async fn settled(self) {
        let (list, statistics) = tokio::join!(self.list, self.statistics);
        if let Err(err) = list {
            warn!(generation = self.generation, %err, "list query task aborted");
        }
        if let Err(err) = statistics {
            warn!(generation = self.generation, %err, "statistics query task aborted");
        }
    }
}

impl SearchForm {
    pub fn new(service: Arc<dyn SearchService>) -> Self {
        Self {
            service,
            state: Arc::new(Mutex::new(FormState::default())),
            discard_stale: true,
        }
    }

    /// When disabled, completions of superseded searches still land
    /// (last one to finish wins its slice).
    pub fn with_stale_discard(mut self, enabled: bool) -> Self {
        self.discard_stale = enabled;
        self
    }

    pub fn filters(&self) -> FilterSelection {
        self.state.lock().filters.clone()
    }

    pub fn set_filters(&self, filters: FilterSelection) {
        self.state.lock().filters = filters;
    }

    pub fn display(&self) -> DisplayState {
        self.state.lock().display.clone()
    }

    pub fn request_search(&self) -> SearchOutcome {
        let (filters, generation) = {
            let mut state = self.state.lock();
            state.display.generation += 1;
            let generation = state.display.generation;

            if !state.filters.has_filter() {
                state.display.results.clear();
                state.display.validation_error = Some(MSG_SELECT_FILTER.to_string());
                info!(generation, "search rejected: no phase or activity selected");
                return SearchOutcome::Rejected;
            }

            state.display.validation_error = None;
            state.display.list_status = SlotStatus::Pending;
            state.display.statistics_status = SlotStatus::Pending;
            (state.filters.clone(), generation)
        };

        let window = filters.window();
        info!(
            generation,
            phase = %filters.phase,
            activity = %filters.activity,
            ?window,
            "dispatching search"
        );

        let list = tokio::spawn(
            self.clone()
                .run_list_query(filters.clone(), window, generation),
        );
        let statistics = tokio::spawn(
            self.clone()
                .run_statistics_query(filters, window, generation),
        );

        SearchOutcome::Dispatched(SearchHandle {
            generation,
            window,
            list,
            statistics,
        })
    }

    async fn run_list_query(self, filters: FilterSelection, window: QueryWindow, generation: u64) {
        let outcome = match window {
            QueryWindow::Unbounded => {
                self.service
                    .search_by_filter(&filters.activity, &filters.phase)
                    .await
            }
            QueryWindow::Dated { start, end } => {
                self.service
                    .search_by_filter_and_date(&filters.activity, &filters.phase, start, end)
                    .await
            }
        };
        self.apply_list(outcome, window, generation);
    }

    async fn run_statistics_query(
        self,
        filters: FilterSelection,
        window: QueryWindow,
        generation: u64,
    ) {
        let outcome = match window {
            QueryWindow::Unbounded => {
                self.service
                    .statistics_by_filter(&filters.activity, &filters.phase)
                    .await
            }
            QueryWindow::Dated { start, end } => {
                self.service
                    .statistics_by_filter_and_date(&filters.activity, &filters.phase, start, end)
                    .await
            }
        };
        self.apply_statistics(outcome, generation);
    }

    fn is_stale(&self, display: &DisplayState, generation: u64) -> bool {
        self.discard_stale && display.generation != generation
    }

    fn apply_list(
        &self,
        outcome: Result<Vec<Question>, SearchError>,
        window: QueryWindow,
        generation: u64,
    ) {
        let mut state = self.state.lock();
        let view = &mut state.display;
        if self.is_stale(view, generation) {
            debug!(generation, current = view.generation, "dropping stale list result");
            return;
        }

        match outcome {
            Ok(questions) if !questions.is_empty() => {
                debug!(
                    generation,
                    count = questions.len(),
                    results = ?questions,
                    "questions loaded"
                );
                view.results = questions;
                view.list_error = None;
                view.list_status = SlotStatus::Loaded;
            }
            Ok(_) => {
                info!(generation, "search returned no questions");
                view.results.clear();
                let message = if window.is_dated() {
                    MSG_NO_RESULTS_DATED
                } else {
                    MSG_NO_RESULTS
                };
                view.list_error = Some(message.to_string());
                view.list_status = SlotStatus::Empty;
            }
            Err(err) => {
                error!(generation, %err, "failed to fetch question responses");
                view.results.clear();
                let message = if window.is_dated() {
                    MSG_LIST_FAILED_DATED
                } else {
                    MSG_LIST_FAILED
                };
                view.list_error = Some(message.to_string());
                view.list_status = SlotStatus::Failed;
            }
        }
    }

    fn apply_statistics(&self, outcome: Result<StatisticsSummary, SearchError>, generation: u64) {
        let mut state = self.state.lock();
        let view = &mut state.display;
        if self.is_stale(view, generation) {
            debug!(generation, current = view.generation, "dropping stale statistics");
            return;
        }

        match outcome {
            Ok(summary) => {
                debug!(
                    generation,
                    empty = summary.is_empty(),
                    statistics = ?summary,
                    "statistics loaded"
                );
                view.statistics = summary;
                view.statistics_error = None;
                view.statistics_status = SlotStatus::Loaded;
            }
            Err(err) => {
                error!(generation, %err, "failed to fetch question statistics");
                view.statistics = StatisticsSummary::default();
                view.statistics_error = Some(MSG_STATISTICS_FAILED.to_string());
                view.statistics_status = SlotStatus::Failed;
            }
        }
    }
}
