//! End-to-end orchestration of one harvesting run.
//!
//! 1. **Load**: read candidate URLs from the input dataset
//! 2. **Sample**: draw the configured fraction of distinct candidates
//! 3. **Resume**: drop every sampled URL already present in the record store
//! 4. **Harvest**: run the worker pool over what is left
//!
//! URLs that fail every strategy are never written, so the next run will
//! attempt them again if they are sampled.

use crate::config::PipelineConfig;
use crate::dataset::load_candidates;
use crate::extractors::{FallbackChain, ParagraphExtractor, StructuralExtractor};
use crate::http::FetchContext;
use crate::pool::{FetchWorkerPool, RunSummary};
use crate::selection::{pending_urls, sample_urls};
use crate::store::RecordStore;
use crate::utils::ensure_writable_parent;
use std::error::Error;
use std::future::Future;
use tracing::{info, instrument, warn};

/// How a run ended. None of these is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every sampled URL was already in the store; nothing was fetched.
    NothingToDo,
    Completed(RunSummary),
    /// Stopped by an interrupt; everything saved so far is valid.
    Interrupted(RunSummary),
}

/// Resolves on Ctrl-C.
///
/// If the signal handler cannot be installed the run continues without
/// interrupt support instead of being cancelled immediately.
pub async fn interrupt_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for Ctrl-C; interruption disabled");
        std::future::pending::<()>().await;
    }
}

/// Run one full load, sample, resume and harvest cycle.
#[instrument(level = "info", skip_all, fields(input = %config.input_path.display(), output = %config.output_path.display()))]
pub async fn run_pipeline<F>(config: &PipelineConfig, shutdown: F) -> Result<RunOutcome, Box<dyn Error>>
where
    F: Future<Output = ()>,
{
    let candidates = load_candidates(&config.input_path, &config.url_column)?;
    let sampled = sample_urls(&candidates, config.sample_fraction, config.seed);

    let store = RecordStore::open(&config.output_path);
    let done = store.existing_keys();
    let pending = pending_urls(&sampled, &done);

    if pending.is_empty() {
        info!(sampled = sampled.len(), "All sampled URLs are already processed");
        return Ok(RunOutcome::NothingToDo);
    }
    info!(
        pending = pending.len(),
        already_done = sampled.len() - pending.len(),
        "Resuming from last stop"
    );

    ensure_writable_parent(&config.output_path)?;
    let context = FetchContext::new(config)?;
    let chain = FallbackChain::new(
        ParagraphExtractor::new(&config.article)?,
        StructuralExtractor::new(&context),
    );
    info!(?chain, concurrency = config.concurrency, "Starting worker pool");

    let pool = FetchWorkerPool::new(chain, &store, config.concurrency)
        .with_progress_every(config.progress_every);
    let summary = pool.run(pending, shutdown).await?;

    Ok(if summary.interrupted {
        RunOutcome::Interrupted(summary)
    } else {
        RunOutcome::Completed(summary)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ARTICLE_PAGE: &str = "<html><head><title>Harbour reopens</title></head><body>\
        <div><p>The harbour reopened on Friday after the repairs were finished.</p></div></body></html>";

    async fn serve_article(server: &MockServer, route: &str, expected_hits: u64) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(ARTICLE_PAGE))
            .expect(expected_hits)
            .mount(server)
            .await;
    }

    fn write_dataset(dir: &Path, urls: &[String]) -> std::path::PathBuf {
        let path = dir.join("events.csv");
        let mut contents = String::from("GLOBALEVENTID,SOURCEURL\n");
        for (i, url) in urls.iter().enumerate() {
            contents.push_str(&format!("{i},{url}\n"));
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn config_for(dir: &Path, input: std::path::PathBuf) -> PipelineConfig {
        PipelineConfig {
            input_path: input,
            output_path: dir.join("out/articles.csv"),
            sample_fraction: 1.0,
            seed: Some(3),
            ..PipelineConfig::default()
        }
    }

    #[tokio::test]
    async fn test_second_run_has_nothing_to_do() {
        let server = MockServer::start().await;
        serve_article(&server, "/a", 1).await;
        serve_article(&server, "/b", 1).await;
        let urls = vec![format!("{}/a", server.uri()), format!("{}/b", server.uri())];

        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path(), write_dataset(dir.path(), &urls));

        let first = run_pipeline(&config, std::future::pending()).await.unwrap();
        match first {
            RunOutcome::Completed(summary) => assert_eq!(summary.saved, 2),
            other => panic!("unexpected outcome: {other:?}"),
        }

        let second = run_pipeline(&config, std::future::pending()).await.unwrap();
        assert_eq!(second, RunOutcome::NothingToDo);
        assert_eq!(RecordStore::open(&config.output_path).read_all().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_resume_only_fetches_missing_urls() {
        let server = MockServer::start().await;
        serve_article(&server, "/a", 0).await;
        serve_article(&server, "/b", 0).await;
        serve_article(&server, "/c", 1).await;
        let url = |p: &str| format!("{}/{p}", server.uri());
        let urls = vec![url("a"), url("b"), url("c")];

        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path(), write_dataset(dir.path(), &urls));
        std::fs::create_dir_all(dir.path().join("out")).unwrap();
        std::fs::write(
            &config.output_path,
            format!("URL,Title,Text\n{},A,alpha\n{},B,beta\n", url("a"), url("b")),
        )
        .unwrap();

        let outcome = run_pipeline(&config, std::future::pending()).await.unwrap();
        match outcome {
            RunOutcome::Completed(summary) => {
                assert_eq!(summary.total, 1);
                assert_eq!(summary.saved, 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        let keys = RecordStore::open(&config.output_path).existing_keys();
        assert_eq!(keys.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_urls_are_retried_next_run() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let urls = vec![format!("{}/broken", server.uri())];

        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path(), write_dataset(dir.path(), &urls));

        for _ in 0..2 {
            match run_pipeline(&config, std::future::pending()).await.unwrap() {
                RunOutcome::Completed(summary) => {
                    assert_eq!(summary.attempted, 1);
                    assert_eq!(summary.saved, 0);
                }
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
        assert!(!config.output_path.exists());
    }

    #[tokio::test]
    async fn test_interrupted_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let urls = vec!["http://127.0.0.1:9/a".to_string()];
        let config = config_for(dir.path(), write_dataset(dir.path(), &urls));

        let outcome = run_pipeline(&config, std::future::ready(())).await.unwrap();
        match outcome {
            RunOutcome::Interrupted(summary) => assert_eq!(summary.attempted, 0),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_dataset_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path(), dir.path().join("missing.csv"));
        assert!(run_pipeline(&config, std::future::pending()).await.is_err());
    }
}
