//! HTTP endpoint that renders a simulation per request.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::config::SimConfig;
use crate::error::Result;
use crate::video;

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

#[derive(Debug, Clone)]
pub struct ServerState {
    /// Directory each rendered GIF is also saved to.
    pub output_dir: PathBuf,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/gen", get(generate))
        .with_state(Arc::new(state))
}

pub async fn run_server(bind: SocketAddr, state: ServerState) -> Result<()> {
    let app = router(state);

    log::info!("listening on http://{bind}/gen");
    let listener = tokio::net::TcpListener::bind(bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Maps query parameters onto a fresh config. Unparseable values keep
/// their defaults.
pub fn config_from_query(params: &HashMap<String, String>) -> SimConfig {
    let mut config = SimConfig::default();
    config.apply_params(params);
    config
}

async fn generate(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    // A resolved seed gives every distinct run its own artifact name
    let config = config_from_query(&params).with_resolved_seed();
    let path = state.output_dir.join(config.artifact_name());
    log::info!("rendering {}", path.display());

    let rendered = tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
        let bytes = crate::render_gif(&config)?;
        video::save_artifact(&path, &bytes)?;
        Ok(bytes)
    })
    .await;

    match rendered {
        Ok(Ok(bytes)) => ([(header::CONTENT_TYPE, "image/gif")], bytes).into_response(),
        Ok(Err(err)) => internal_error(err.to_string()),
        Err(err) => internal_error(format!("render task failed: {err}")),
    }
}

fn internal_error(message: String) -> Response {
    log::error!("{message}");
    (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_query() {
        let params: HashMap<String, String> = [
            ("width", "64"),
            ("height", "abc"),
            ("sensorDistance", "4"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = config_from_query(&params);
        assert_eq!(config.width, 64);
        assert_eq!(config.height, 500);
        assert_eq!(config.sensor_distance, 4);
        assert_eq!(config.artifact_name(), "w64h500nF500d2lc1000sDe45sDi4srandom.gif");
    }

    fn query(pairs: &[(&str, &str)]) -> Query<HashMap<String, String>> {
        Query(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    async fn body(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn test_generate_returns_gif() {
        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(ServerState {
            output_dir: dir.path().to_path_buf(),
        });
        let params = query(&[("width", "16"), ("height", "12"), ("nFrames", "3"), ("seed", "5")]);

        let response = generate(State(state), params).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/gif"
        );
        let bytes = body(response).await;
        assert!(bytes.starts_with(b"GIF89a"));

        let saved = std::fs::read(dir.path().join("w16h12nF3d2lc1000sDe45sDi9s5.gif")).unwrap();
        assert_eq!(saved, bytes);
    }

    #[tokio::test]
    async fn test_generate_narrow_grid() {
        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(ServerState {
            output_dir: dir.path().to_path_buf(),
        });

        let response = generate(State(state), query(&[("width", "2"), ("nFrames", "2")])).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body(response).await.starts_with(b"GIF89a"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_get_their_own_gif() {
        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(ServerState {
            output_dir: dir.path().to_path_buf(),
        });
        let mut tasks = Vec::new();
        for seed in 1..=4u64 {
            let state = Arc::clone(&state);
            let seed = seed.to_string();
            let params = query(&[("width", "40"), ("height", "30"), ("nFrames", "6"), ("seed", seed.as_str())]);
            tasks.push(tokio::spawn(async move {
                body(generate(State(state), params).await).await
            }));
        }

        for (seed, task) in (1..=4u64).zip(tasks) {
            let bytes = task.await.unwrap();
            let config = SimConfig {
                width: 40,
                height: 30,
                n_frames: 6,
                seed: Some(seed),
                ..SimConfig::default()
            };
            assert_eq!(bytes, crate::render_gif(&config).unwrap(), "seed {seed}");
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unseeded_requests_do_not_share_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(ServerState {
            output_dir: dir.path().to_path_buf(),
        });
        let pairs = [("width", "20"), ("height", "20"), ("nFrames", "2")];

        let (a, b) = tokio::join!(
            generate(State(Arc::clone(&state)), query(&pairs)),
            generate(State(Arc::clone(&state)), query(&pairs)),
        );

        assert_eq!(a.status(), StatusCode::OK);
        assert_eq!(b.status(), StatusCode::OK);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }
}
