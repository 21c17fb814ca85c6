//! The solver collaborator and the solve-then-load flow.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::DiscBounds;
use crate::error::{Error, Result};
use crate::request::{DiscCount, SolveRequest};
use crate::session::PlaybackSession;
use crate::solution::{SequenceStore, Solution, SolveResponse};

/// Anything that can produce a solution payload for a disc count.
#[async_trait]
pub trait Solver: Send + Sync {
    /// Request a solution. Transport problems are [`Error::Transport`];
    /// a solver-side refusal comes back as a failure payload.
    async fn solve(&self, discs: DiscCount) -> Result<SolveResponse>;
}

/// Solver reached over HTTP: `POST {base_url}/solve` with `{"discs": n}`.
#[derive(Debug, Clone)]
pub struct HttpSolver {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Solver for HttpSolver {
    async fn solve(&self, discs: DiscCount) -> Result<SolveResponse> {
        let url = format!("{}/solve", self.base_url.trim_end_matches('/'));
        debug!(%url, discs = discs.get(), "Requesting solution");

        let response = self
            .client
            .post(&url)
            .json(&SolveRequest::from(discs))
            .send()
            .await?;

        // Refusals arrive as 4xx with an `error` body, so parse regardless.
        let status = response.status();
        let body: SolveResponse = response.json().await?;
        if !status.is_success() && body.error.is_none() {
            return Err(Error::Transport(format!("solver answered {status}")));
        }
        Ok(body)
    }
}

/// Validate `requested`, ask `solver`, install the result and load it.
///
/// A previous error is cleared before the request goes out. Any failure is
/// shown on the session's render target and returned; the store and session
/// keep whatever they had before.
pub async fn solve_and_load(
    solver: &dyn Solver,
    store: &RwLock<SequenceStore>,
    session: &PlaybackSession,
    requested: i64,
    bounds: DiscBounds,
) -> Result<Arc<Solution>> {
    session.clear_error()?;

    let outcome: Result<Arc<Solution>> = async {
        let discs = DiscCount::new(requested, bounds)?;
        let response = solver.solve(discs).await?;
        // load under the lock so the store and session agree on the solution
        let mut store = store.write().await;
        let solution = store.accept(response)?;
        session.load(Arc::clone(&solution))?;
        Ok::<_, Error>(solution)
    }
    .await;

    match &outcome {
        Ok(solution) => info!(
            discs = solution.disc_count(),
            total_moves = solution.total_moves(),
            "Solved and loaded"
        ),
        Err(e) => {
            warn!(requested, "Solve failed: {}", e);
            if !matches!(e, Error::SessionClosed) {
                let _ = session.show_error(e.to_string());
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlaybackConfig;
    use crate::render::RenderCommand;
    use crate::solution::fixtures::solved;
    use crate::solution::Position;

    enum FakeSolver {
        Solves,
        Refuses(&'static str),
        Unreachable,
    }

    #[async_trait]
    impl Solver for FakeSolver {
        async fn solve(&self, discs: DiscCount) -> Result<SolveResponse> {
            match self {
                FakeSolver::Solves => Ok(SolveResponse::from(&solved(discs.get()))),
                FakeSolver::Refuses(msg) => Ok(SolveResponse::failure(*msg)),
                FakeSolver::Unreachable => Err(Error::Transport("connection refused".into())),
            }
        }
    }

    fn errors(rx: &mut tokio::sync::broadcast::Receiver<RenderCommand>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(command) = rx.try_recv() {
            if let RenderCommand::Error {
                message: Some(message),
            } = command
            {
                out.push(message);
            }
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn solves_and_loads() {
        let store = RwLock::new(SequenceStore::new());
        let session = PlaybackSession::spawn(PlaybackConfig::default());

        let solution = solve_and_load(&FakeSolver::Solves, &store, &session, 3, DiscBounds::default())
            .await
            .unwrap();
        assert_eq!(solution.total_moves(), 7);
        assert!(store.read().await.current().is_some());

        let status = session.status().await.unwrap().unwrap();
        assert_eq!(status.position, Position::Initial);
        assert_eq!(status.total_moves, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_request_never_reaches_solver() {
        let store = RwLock::new(SequenceStore::new());
        let session = PlaybackSession::spawn(PlaybackConfig::default());
        let mut rx = session.subscribe();

        let err = solve_and_load(&FakeSolver::Unreachable, &store, &session, 11, DiscBounds::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));

        session.status().await.unwrap();
        assert_eq!(errors(&mut rx), vec!["Please enter a number between 1 and 10"]);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_leave_previous_solution_loaded() {
        let store = RwLock::new(SequenceStore::new());
        let session = PlaybackSession::spawn(PlaybackConfig::default());
        solve_and_load(&FakeSolver::Solves, &store, &session, 2, DiscBounds::default())
            .await
            .unwrap();
        session.advance().unwrap();

        let mut rx = session.subscribe();
        let refused = solve_and_load(
            &FakeSolver::Refuses("Number of discs must be between 1 and 10"),
            &store,
            &session,
            4,
            DiscBounds::default(),
        )
        .await;
        assert!(matches!(refused, Err(Error::SolverFailure(_))));

        let unreachable =
            solve_and_load(&FakeSolver::Unreachable, &store, &session, 4, DiscBounds::default()).await;
        assert!(matches!(unreachable, Err(Error::Transport(_))));

        let status = session.status().await.unwrap().unwrap();
        assert_eq!(status.total_moves, 3);
        assert_eq!(status.position, Position::At(0));
        assert_eq!(store.read().await.current().unwrap().total_moves(), 3);

        assert_eq!(
            errors(&mut rx),
            vec![
                "Number of discs must be between 1 and 10".to_string(),
                "Error connecting to server: connection refused".to_string(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn new_request_hides_previous_error() {
        let store = RwLock::new(SequenceStore::new());
        let session = PlaybackSession::spawn(PlaybackConfig::default());
        let mut rx = session.subscribe();

        solve_and_load(&FakeSolver::Solves, &store, &session, 0, DiscBounds::default())
            .await
            .unwrap_err();
        solve_and_load(&FakeSolver::Solves, &store, &session, 2, DiscBounds::default())
            .await
            .unwrap();
        session.status().await.unwrap();

        let shown: Vec<Option<String>> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|command| match command {
                RenderCommand::Error { message } => Some(message),
                _ => None,
            })
            .collect();
        assert_eq!(
            shown,
            vec![
                None,
                Some("Please enter a number between 1 and 10".to_string()),
                None,
            ]
        );
    }

    /// Answers after a delay that shrinks with the disc count.
    struct SlowSolver;

    #[async_trait]
    impl Solver for SlowSolver {
        async fn solve(&self, discs: DiscCount) -> Result<SolveResponse> {
            let delay = 5u64.saturating_sub(u64::from(discs.get()));
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            Ok(SolveResponse::from(&solved(discs.get())))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_solves_keep_store_and_session_in_step() {
        for _ in 0..20 {
            let store = Arc::new(RwLock::new(SequenceStore::new()));
            let session = PlaybackSession::spawn(PlaybackConfig::default());

            let tasks: Vec<_> = (1..=4)
                .map(|discs| {
                    let store = Arc::clone(&store);
                    let session = session.clone();
                    tokio::spawn(async move {
                        solve_and_load(&SlowSolver, &store, &session, discs, DiscBounds::default()).await
                    })
                })
                .collect();
            for task in tasks {
                task.await.unwrap().unwrap();
            }

            let stored = store.read().await.current().unwrap().total_moves();
            let status = session.status().await.unwrap().unwrap();
            assert_eq!(status.total_moves, stored);
        }
    }

    #[tokio::test]
    async fn http_solver_reports_transport_failure() {
        // nothing listens on the discard port
        let solver = HttpSolver::new("http://127.0.0.1:9/");
        let discs = DiscCount::new(3, DiscBounds::default()).unwrap();

        match solver.solve(discs).await {
            Err(Error::Transport(_)) => {}
            other => panic!("unexpected: {other:?}"),
        }
    }
}
