//! Companion web form
//!
//! Serves a single-page code form; submissions are forwarded to the
//! configured chat through the Bot API with the marker line the bot
//! classifies as a web-code submission.

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::{Form, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Must stay in sync with the marker the bot matches in the menu state
const WEB_CODE_MARKER: &str = "Code reçu depuis l'interface web";

const PAGE: &str = include_str!("../../assets/web/index.html");

#[derive(Clone)]
struct WebState {
    client: reqwest::Client,
    token: String,
    chat_id: i64,
}

#[derive(Debug, Deserialize)]
struct CodeForm {
    code: String,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pytutor_web=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let token = std::env::var("PYTUTOR_BOT_TOKEN")
        .map_err(|_| "PYTUTOR_BOT_TOKEN is not set".to_string())?;
    let chat_id: i64 = std::env::var("PYTUTOR_WEB_CHAT_ID")
        .map_err(|_| "PYTUTOR_WEB_CHAT_ID is not set".to_string())?
        .parse()
        .map_err(|_| "PYTUTOR_WEB_CHAT_ID is not a chat id".to_string())?;
    let port: u16 = std::env::var("PYTUTOR_WEB_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let state = WebState {
        client: reqwest::Client::new(),
        token,
        chat_id,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(show_form).post(submit))
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("web form listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn show_form() -> Html<String> {
    Html(render_page(""))
}

async fn submit(State(state): State<WebState>, Form(form): Form<CodeForm>) -> Html<String> {
    match forward(&state, &form.code).await {
        Ok(()) => Html(render_page("✅ Code envoyé au bot avec succès !")),
        Err(e) => {
            tracing::error!(error = %e, "forward to bot failed");
            Html(render_page("❌ Échec de l'envoi du code. Réessayez."))
        }
    }
}

async fn forward(state: &WebState, code: &str) -> Result<(), reqwest::Error> {
    let text = format!("{WEB_CODE_MARKER} :\n{code}");
    let url = format!("https://api.telegram.org/bot{}/sendMessage", state.token);
    state
        .client
        .post(url)
        .json(&SendMessageRequest {
            chat_id: state.chat_id,
            text: &text,
        })
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}

fn render_page(message: &str) -> String {
    PAGE.replace("<!--MESSAGE-->", message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_embeds_the_status_message() {
        let page = render_page("✅ ok");
        assert!(page.contains("✅ ok"));
        assert!(page.contains("<form"));
    }

    #[test]
    fn empty_message_leaves_no_placeholder() {
        let page = render_page("");
        assert!(!page.contains("<!--MESSAGE-->"));
    }

    #[test]
    fn forwarded_text_carries_the_marker_line() {
        let text = format!("{WEB_CODE_MARKER} :\nprint(1)");
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with(WEB_CODE_MARKER));
        assert_eq!(lines.next(), Some("print(1)"));
    }
}
