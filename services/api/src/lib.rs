mod cli;
mod client;
mod commands;
mod infra;
mod routes;
mod server;

use store_dr::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
