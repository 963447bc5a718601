mod app;
mod config;
mod dispatcher;
mod error;
mod gateway;
mod library;
mod mirror;
mod model;
mod mpris;
mod notice;
mod poller;
mod runtime;
mod ui;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run().await?;
    Ok(())
}
