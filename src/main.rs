use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use log::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use pow_ledger::api::{self, NodeState};
use pow_ledger::blockchain::{self, Ledger, DIFFICULTY};
use pow_ledger::config::NodeConfig;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::mine,
        api::handlers::full_chain,
        api::handlers::last_block,
        api::handlers::validate_chain,
        api::handlers::get_pending_transactions
    ),
    components(
        schemas(
            blockchain::Block,
            api::handlers::MineRequest,
            api::handlers::MineResponse,
            api::handlers::ChainResponse,
            api::handlers::LastBlockResponse,
            api::handlers::ValidateResponse,
            api::handlers::PendingTransactionsResponse,
            api::error::ErrorResponse
        )
    ),
    tags(
        (name = "ledger", description = "Proof-of-work ledger endpoints")
    ),
    info(
        title = "Proof-of-Work Ledger API",
        version = "0.1.0",
        description = "Submit proofs of work and read the chain",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
struct ApiDoc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = NodeConfig::from_env().context("failed to load node configuration")?;

    // The ledger lives for the whole process and is shared with every worker
    let state = web::Data::new(NodeState::new(Ledger::new()));

    info!("Node identifier: {}", state.node_id);
    info!("Mining difficulty: {} leading zeroes", DIFFICULTY);
    info!("Starting HTTP server at http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        // Configure CORS
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(state.clone())
            .configure(api::configure_routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((config.host.as_str(), config.port))
    .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?
    .run()
    .await
    .context("HTTP server terminated with an error")
}
