use picguard_core::Config;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (directories, pipeline, routes)
    let (_state, router) = picguard_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    picguard_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
