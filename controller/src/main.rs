mod actuator;
mod cloud;
mod hardware;
mod host;
mod network;
mod state;
mod store;
mod timesync;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run().await
}
