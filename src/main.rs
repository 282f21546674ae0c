use anyhow::Result;
use planscraper::analyze::{analyze_planning, AnalysisReport};
use planscraper::fetch;
use planscraper::process::PipelineConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::{env, sync::Arc, time::Instant};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;
use warp::{http::StatusCode, reject::Rejection, reply::Reply, Filter};

#[derive(Deserialize)]
struct AnalyzeRequest {
    url: Option<String>,
}

/// Envelope every API answer uses: `data` on success, `message` otherwise.
#[derive(Serialize)]
struct AnalyzeResponse {
    ok: bool,
    data: Option<AnalysisReport>,
    message: Option<String>,
}

impl AnalyzeResponse {
    fn success(report: AnalysisReport) -> Self {
        AnalyzeResponse {
            ok: true,
            data: Some(report),
            message: None,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        AnalyzeResponse {
            ok: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

async fn health_check(started: Instant) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_s": started.elapsed().as_secs(),
    })))
}

async fn analyze_handler(
    req: AnalyzeRequest,
    client: Client,
    cfg: Arc<PipelineConfig>,
) -> Result<impl Reply, Rejection> {
    let url = match validate_url(req.url.as_deref()) {
        Ok(url) => url,
        Err(message) => {
            return Ok(warp::reply::with_status(
                warp::reply::json(&AnalyzeResponse::failure(message)),
                StatusCode::BAD_REQUEST,
            ));
        }
    };

    match analyze_planning(&client, &cfg, url).await {
        Ok(report) => Ok(warp::reply::with_status(
            warp::reply::json(&AnalyzeResponse::success(report)),
            StatusCode::OK,
        )),
        Err(e) => {
            warn!(%url, error = %e, "analysis failed");
            Ok(warp::reply::with_status(
                warp::reply::json(&AnalyzeResponse::failure(e.user_message())),
                StatusCode::OK,
            ))
        }
    }
}

/// The request must carry an absolute http(s) URL. Returns the trimmed
/// input so the report echoes what the caller sent, not a re-serialized
/// form.
fn validate_url(raw: Option<&str>) -> Result<&str, String> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty());
    let Some(raw) = raw else {
        return Err("Missing 'url' field.".to_string());
    };
    let parsed = Url::parse(raw).map_err(|_| format!("Invalid 'url' field: {}", raw))?;
    match parsed.scheme() {
        "http" | "https" => Ok(raw),
        other => Err(format!("Unsupported URL scheme '{}'.", other)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) shared state ─────────────────────────────────────────────
    let client = fetch::build_client();
    let cfg = Arc::new(PipelineConfig::default());
    let started = Instant::now();

    let with_client = {
        let client = client.clone();
        warp::any().map(move || client.clone())
    };
    let with_cfg = {
        let cfg = cfg.clone();
        warp::any().map(move || cfg.clone())
    };

    // ─── 3) routes ───────────────────────────────────────────────────
    // Landing page
    let home = warp::path::end()
        .and(warp::get())
        .map(|| warp::reply::html(HOME_HTML));

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::any().map(move || started))
        .and_then(health_check);

    // Main analysis endpoint
    let analyze = warp::path!("plannings" / "analyze")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_client)
        .and(with_cfg)
        .and_then(analyze_handler);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST"])
        .allow_headers(vec!["content-type"]);

    let routes = home.or(health).or(analyze).with(cors);

    // Get port from environment or default to 8080
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);

    info!("Server starting on port {}", port);
    info!("Health check: http://localhost:{}/health", port);
    info!("Analyze endpoint: POST http://localhost:{}/plannings/analyze", port);

    warp::serve(routes).run(([0, 0, 0, 0], port)).await;

    Ok(())
}

/// Minimal landing page wired to the analyze endpoint. The JSON API is the
/// real surface; this exists so a browser hit on the service root shows
/// something usable.
const HOME_HTML: &str = r##"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Planning analyzer</title>
<style>
  body { font: 15px/1.5 system-ui, sans-serif; max-width: 860px; margin: 40px auto; padding: 0 16px; }
  input { width: 70%; padding: 8px; }
  button { padding: 8px 14px; }
  table { border-collapse: collapse; margin-top: 12px; width: 100%; }
  th, td { border: 1px solid #bbb; padding: 4px 8px; text-align: left; }
  .err { color: #b00020; }
  .muted { color: #666; }
</style>
</head>
<body>
<h1>Planning analyzer</h1>
<p class="muted">Paste the URL of a planning page, then analyze its schedule table.</p>
<input id="url" type="url" placeholder="https://example.tld/planning">
<button id="go">Analyze</button>
<div id="out"></div>
<script>
const out = document.getElementById('out');
document.getElementById('go').addEventListener('click', async () => {
  out.textContent = 'Analyzing...';
  try {
    const resp = await fetch('/plannings/analyze', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ url: document.getElementById('url').value.trim() })
    });
    const json = await resp.json();
    if (!json.ok) {
      out.innerHTML = '<p class="err"></p>';
      out.firstChild.textContent = json.message || 'Analysis failed.';
      return;
    }
    const d = json.data;
    let html = '<p>Rows: ' + d.meta.rows + '</p><ul>';
    for (const f of d.findings) html += '<li>[' + f.type + '] ' + f.message + '</li>';
    if (!d.findings.length) html += '<li>No findings.</li>';
    html += '</ul>';
    if (d.preview.length) {
      const cols = Object.keys(d.preview[0]);
      html += '<table><tr>' + cols.map(c => '<th>' + c + '</th>').join('') + '</tr>';
      for (const r of d.preview) {
        html += '<tr>' + cols.map(c => '<td>' + (r[c] ?? '') + '</td>').join('') + '</tr>';
      }
      html += '</table>';
    }
    out.innerHTML = html;
  } catch (e) {
    out.innerHTML = '<p class="err">Request failed.</p>';
  }
});
</script>
</body>
</html>
"##;
