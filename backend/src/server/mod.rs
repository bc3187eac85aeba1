//! Server construction and middleware wiring.

mod config;
pub mod settings;
mod state_builders;

pub use config::ServerConfig;

use state_builders::build_http_state;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use careline::Trace;
#[cfg(debug_assertions)]
use careline::doc::ApiDoc;
use careline::inbound::http::api_scope_with;
use careline::middleware::ClientRateLimit;
use careline::inbound::http::health::{HealthState, live, ready};
use careline::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    ai_limit: ClientRateLimit,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api_scope_with(ai_limit))
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// Readiness is marked once the listener is bound. One per-client rate
/// limiter guards the `/ai` routes across all workers. With the `metrics`
/// feature the app also exposes Prometheus counters at `/metrics`.
///
/// # Errors
/// Propagates [`std::io::Error`] when the AI client cannot be built or
/// binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let http_state = build_http_state(&config)?;
    let server_health_state = health_state.clone();
    let bind_addr = config.bind_addr();
    let ai_limit = config.ai_rate_limit.clone();

    #[cfg(feature = "metrics")]
    let prometheus = actix_web_prom::PrometheusMetricsBuilder::new("careline")
        .endpoint("/metrics")
        .build()
        .map_err(|err| std::io::Error::other(format!("metrics setup failed: {err}")))?;

    let server = HttpServer::new(move || {
        let app = build_app(
            server_health_state.clone(),
            http_state.clone(),
            ai_limit.clone(),
        );

        #[cfg(feature = "metrics")]
        let app = app.wrap(prometheus.clone());

        app
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;

    use settings::{BuildMode, ServerSettings};

    fn config() -> ServerConfig {
        let settings = ServerSettings {
            bind_addr: "127.0.0.1:0".to_owned(),
            ..ServerSettings::unconfigured()
        };
        ServerConfig::from_settings(settings.resolve(BuildMode::Debug).expect("resolves"))
    }

    #[rstest]
    #[actix_web::test]
    async fn app_serves_probes_and_guards_the_api() {
        let health = web::Data::new(HealthState::new());
        health.mark_ready();
        let http_state = build_http_state(&config()).expect("state");
        let app = test::init_service(build_app(
            health,
            http_state,
            config().ai_rate_limit,
        ))
        .await;

        let ready_res =
            test::call_service(&app, test::TestRequest::get().uri("/health/ready").to_request())
                .await;
        assert_eq!(ready_res.status(), StatusCode::OK);

        let usage_res =
            test::call_service(&app, test::TestRequest::get().uri("/api/v1/ai/usage-stats").to_request())
                .await;
        assert_eq!(usage_res.status(), StatusCode::UNAUTHORIZED);
        assert!(usage_res.headers().contains_key("trace-id"));
    }

    #[rstest]
    #[actix_web::test]
    async fn server_marks_ready_once_bound() {
        let health = web::Data::new(HealthState::new());
        let server = create_server(health.clone(), config()).expect("server binds");
        assert!(health.is_ready());
        let handle = server.handle();
        actix_web::rt::spawn(server);
        handle.stop(false).await;
    }
}
