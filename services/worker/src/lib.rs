mod cli;
mod infra;
mod process;
mod routes;
mod server;

use rehab_discharge::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
