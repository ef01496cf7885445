use dotenvy::dotenv;
use migration::MigratorTrait;
use tracing::{error, info};

const DEFAULT_ADMIN_PASSWORD: &str = "Admin#2024";
const DEFAULT_SAMPLE_PASSWORD: &str = "Sample#2024";

async fn seed() -> anyhow::Result<()> {
    let cfg = configs::AppConfig::load_or_env()?;
    let db = models::db::connect_with_config(&cfg.database).await?;
    migration::Migrator::up(&db, None).await?;

    let admin_password = std::env::var("SEED_ADMIN_PASSWORD").unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string());
    let sample_password = std::env::var("SEED_SAMPLE_PASSWORD").unwrap_or_else(|_| DEFAULT_SAMPLE_PASSWORD.to_string());

    let report = service::seed::seed_sample_data(&db, &admin_password, &sample_password).await?;
    info!(
        service = "seed",
        event = "seed_done",
        users = report.users_created,
        categories = report.categories_created,
        services = report.services_created,
        admin = service::seed::ADMIN_EMAIL,
        "sample data loaded"
    );
    Ok(())
}

fn main() -> std::process::ExitCode {
    dotenv().ok();
    common::utils::logging::init_logging_from_env();

    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "seed", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return std::process::ExitCode::FAILURE;
        }
    };

    match rt.block_on(seed()) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            error!(service = "seed", event = "seed_failed", error = %e, "seeding failed");
            std::process::ExitCode::FAILURE
        }
    }
}
